//! First-fit placement shared by the backtracking and greedy strategies.
//!
//! Both walk the sessions once in a course order, try every grid start
//! point in order and, for each point, every room in a room order. The
//! first (point, room) that fits the window, seats everyone and clashes
//! with nothing already booked is committed. Committed choices are never
//! revisited.

use log::{debug, trace};
use std::cmp::Reverse;

use super::{Outcome, Problem, SchedulingStrategy, Strategy, session_interval};
use crate::data::{Room, ScheduleEntry};
use crate::error::SolveError;
use crate::occupancy::OccupancyIndex;
use crate::session::Session;
use crate::stats::Rejection;

/// Small, short courses first; rooms smallest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Backtracking;

/// Largest courses first; rooms closest in size to the session first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl SchedulingStrategy for Backtracking {
    fn strategy(&self) -> Strategy {
        Strategy::Backtracking
    }

    fn schedule(&self, problem: &Problem<'_>) -> Result<Outcome, SolveError> {
        let courses = &problem.dataset.courses;
        let mut order: Vec<usize> = (0..courses.len()).collect();
        order.sort_by_key(|&i| (courses[i].credit_weight, courses[i].enrollment));

        let mut rooms: Vec<&Room> = problem.dataset.rooms.iter().collect();
        rooms.sort_by_key(|r| r.capacity);

        first_fit(problem, &order, |_| rooms.clone())
    }
}

impl SchedulingStrategy for Greedy {
    fn strategy(&self) -> Strategy {
        Strategy::Greedy
    }

    fn schedule(&self, problem: &Problem<'_>) -> Result<Outcome, SolveError> {
        let courses = &problem.dataset.courses;
        let mut order: Vec<usize> = (0..courses.len()).collect();
        order.sort_by_key(|&i| Reverse(courses[i].enrollment));

        first_fit(problem, &order, |session| {
            let mut rooms: Vec<&Room> = problem.dataset.rooms.iter().collect();
            rooms.sort_by_key(|r| r.capacity.abs_diff(session.seats));
            rooms
        })
    }
}

fn first_fit<'p>(
    problem: &Problem<'p>,
    course_order: &[usize],
    room_order: impl Fn(&Session) -> Vec<&'p Room>,
) -> Result<Outcome, SolveError> {
    let mut occupancy = OccupancyIndex::new();
    let mut outcome = Outcome::default();

    for &course_index in course_order {
        for session in problem.sessions_of(course_index) {
            let rooms = room_order(session);
            match place(problem, &mut occupancy, session, &rooms)? {
                Ok(entry) => {
                    trace!(
                        "placed {} in {} on {} {}",
                        session.id, entry.room, entry.day, entry.start_time
                    );
                    outcome.schedule.push(entry);
                }
                Err(rejection) => {
                    debug!("could not place {}: {rejection}", session.id);
                    outcome.failures.push(problem.failure(session, rejection));
                }
            }
        }
    }

    Ok(outcome)
}

/// Commits the first fitting (point, room) for `session`, or returns the
/// last rejection seen while searching.
fn place(
    problem: &Problem<'_>,
    occupancy: &mut OccupancyIndex,
    session: &Session,
    rooms: &[&Room],
) -> Result<Result<ScheduleEntry, Rejection>, SolveError> {
    let mut rejection = Rejection::NoCandidate;

    for point in problem.grid.points() {
        if !point.fits(session.duration) {
            rejection = Rejection::DurationOverflow;
            continue;
        }
        let interval = session_interval(point, session);

        for room in rooms {
            if room.capacity < session.seats {
                rejection = Rejection::Capacity {
                    room: room.name.clone(),
                    capacity: room.capacity,
                    seats: session.seats,
                };
                continue;
            }

            match occupancy.conflict(point.day, interval, room.id, session.lecturer_id) {
                None => {
                    occupancy.book(point.day, interval, room.id, session.lecturer_id);
                    let entry = problem.entry(session, session.id.ordinal, room, point)?;
                    return Ok(Ok(entry));
                }
                Some(kind) => {
                    rejection = Rejection::Clash {
                        kind,
                        day: point.day,
                        start: interval.start,
                        end: interval.end,
                        room: room.name.clone(),
                        lecturer: problem.lecturer_name(session).to_string(),
                    };
                }
            }
        }
    }

    Ok(Err(rejection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::detect_conflicts;
    use crate::data::{Course, Dataset, Lecturer, TimeSlotWindow};
    use crate::time::Day;
    use pretty_assertions::assert_eq;

    fn course(id: u32, name: &str, credit_weight: u32, lecturer_id: u32, enrollment: u32) -> Course {
        Course {
            id,
            name: name.to_string(),
            credit_weight,
            lecturer_id,
            enrollment,
        }
    }

    fn room(id: u32, name: &str, capacity: u32) -> Room {
        Room {
            id,
            name: name.to_string(),
            capacity,
        }
    }

    fn window(day: Day, start: &str, end: &str) -> TimeSlotWindow {
        TimeSlotWindow {
            day,
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
        }
    }

    fn lecturers() -> Vec<Lecturer> {
        (1..=3)
            .map(|id| Lecturer {
                id,
                name: format!("Dosen {id}"),
            })
            .collect()
    }

    #[test]
    fn backtracking_prefers_the_smallest_room() {
        let data = Dataset {
            courses: vec![course(1, "Etika", 2, 1, 20)],
            lecturers: lecturers(),
            rooms: vec![room(1, "Aula", 100), room(2, "Kelas", 25), room(3, "Lab", 30)],
            time_windows: vec![window(Day::Senin, "08:00", "12:00")],
        };
        let problem = Problem::new(&data).unwrap();
        let outcome = Backtracking.schedule(&problem).unwrap();
        assert_eq!(outcome.schedule.len(), 1);
        assert_eq!(outcome.schedule[0].room, "Kelas");
        assert_eq!(outcome.schedule[0].start_time.to_string(), "08:00");
        assert_eq!(outcome.schedule[0].end_time.to_string(), "09:30");
    }

    #[test]
    fn greedy_prefers_the_closest_room() {
        let data = Dataset {
            courses: vec![course(1, "Etika", 2, 1, 20)],
            lecturers: lecturers(),
            rooms: vec![room(1, "Aula", 100), room(2, "Kecil", 19), room(3, "Pas", 22)],
            time_windows: vec![window(Day::Senin, "08:00", "12:00")],
        };
        let problem = Problem::new(&data).unwrap();
        let outcome = Greedy.schedule(&problem).unwrap();
        // Kecil is closer in size but too small
        assert_eq!(outcome.schedule[0].room, "Pas");
    }

    #[test]
    fn course_order_differs_between_strategies() {
        let data = Dataset {
            courses: vec![
                course(1, "Besar", 3, 1, 40),
                course(2, "Kecil", 2, 2, 10),
            ],
            lecturers: lecturers(),
            rooms: vec![room(1, "R1", 40)],
            // room for exactly one of them
            time_windows: vec![window(Day::Senin, "08:00", "10:15")],
        };
        let problem = Problem::new(&data).unwrap();

        let backtracking = Backtracking.schedule(&problem).unwrap();
        assert_eq!(backtracking.schedule[0].course, "Kecil");
        assert_eq!(backtracking.failures[0].course, "Besar");

        let greedy = Greedy.schedule(&problem).unwrap();
        assert_eq!(greedy.schedule[0].course, "Besar");
        assert_eq!(greedy.failures[0].course, "Kecil");
    }

    #[test]
    fn sessions_of_one_course_do_not_share_the_lecturer() {
        let data = Dataset {
            courses: vec![course(1, "Statistika", 2, 1, 90)],
            lecturers: lecturers(),
            rooms: vec![room(1, "R1", 30), room(2, "R2", 30), room(3, "R3", 30)],
            time_windows: vec![window(Day::Senin, "08:00", "11:00")],
        };
        let problem = Problem::new(&data).unwrap();
        let outcome = Backtracking.schedule(&problem).unwrap();
        // three sessions of 30, one lecturer, two 90-minute blocks
        assert_eq!(outcome.schedule.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].session, 3);
        // the last start point probed overruns the window
        assert_eq!(
            outcome.failures[0].reason,
            "Course duration exceeds the available time slot."
        );
        assert!(detect_conflicts(&outcome.schedule).is_empty());
    }

    #[test]
    fn failure_keeps_the_last_rejection() {
        let data = Dataset {
            courses: vec![course(1, "Panjang", 3, 1, 10)],
            lecturers: lecturers(),
            rooms: vec![room(1, "R1", 40)],
            time_windows: vec![window(Day::Senin, "08:00", "09:30")],
        };
        let problem = Problem::new(&data).unwrap();
        let outcome = Greedy.schedule(&problem).unwrap();
        assert!(outcome.schedule.is_empty());
        assert_eq!(
            outcome.failures[0].reason,
            "Course duration exceeds the available time slot."
        );
    }

    #[test]
    fn no_windows_reports_no_candidate() {
        let data = Dataset {
            courses: vec![course(1, "Tanpa Slot", 2, 1, 10)],
            lecturers: lecturers(),
            rooms: vec![room(1, "R1", 40)],
            time_windows: vec![],
        };
        let problem = Problem::new(&data).unwrap();
        let outcome = Backtracking.schedule(&problem).unwrap();
        assert_eq!(
            outcome.failures[0].reason,
            "No suitable time slot or room was found."
        );
    }
}
