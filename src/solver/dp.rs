//! Exact session-count maximization over occupancy states.
//!
//! Every (tick, resource) pair gets a bit. A state is the set of occupied
//! bits; each layer maps the states reachable after deciding the first k
//! sessions to the longest placement path reaching them. A session is
//! either placed (if none of its bits are taken) or left out.
//!
//! The number of states grows with the number of distinct reachable
//! occupancy sets, which is exponential in the worst case. Layers larger
//! than `state_limit` abort the run with [`SolveError::StateSpaceExceeded`].

use indexmap::IndexMap;
use indexmap::map::Entry;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{Outcome, Problem, SchedulingStrategy, Strategy};
use crate::conflict::detect_conflicts;
use crate::data::LecturerId;
use crate::error::SolveError;
use crate::session::Session;
use crate::stats::explain_unplaced;

#[derive(Debug, Clone, Copy)]
pub struct DynamicProgramming {
    pub state_limit: usize,
    pub time_limit: Option<Duration>,
}

impl Default for DynamicProgramming {
    fn default() -> Self {
        Self {
            state_limit: super::DEFAULT_DP_STATE_LIMIT,
            time_limit: None,
        }
    }
}

/// Fixed-size bit set of occupied (tick, resource) cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CellSet(Box<[u64]>);

impl CellSet {
    fn empty(cells: usize) -> Self {
        Self(vec![0; cells.div_ceil(64)].into_boxed_slice())
    }

    fn contains_any(&self, cells: &[usize]) -> bool {
        cells.iter().any(|&c| self.0[c / 64] & (1 << (c % 64)) != 0)
    }

    fn with(&self, cells: &[usize]) -> Self {
        let mut words = self.0.clone();
        for &c in cells {
            words[c / 64] |= 1 << (c % 64);
        }
        Self(words)
    }
}

/// Maps (tick, room) and (tick, lecturer) to bit positions.
struct CellLayout {
    per_tick: usize,
    rooms: usize,
    lecturers: HashMap<LecturerId, usize>,
    len: usize,
}

impl CellLayout {
    fn new(problem: &Problem<'_>) -> Self {
        let mut lecturers = HashMap::new();
        let listed = problem.dataset.lecturers.iter().map(|l| l.id);
        let referenced = problem.dataset.courses.iter().map(|c| c.lecturer_id);
        for id in listed.chain(referenced) {
            let next = lecturers.len();
            lecturers.entry(id).or_insert(next);
        }
        let rooms = problem.dataset.rooms.len();
        let per_tick = rooms + lecturers.len();
        Self {
            per_tick,
            rooms,
            len: per_tick * problem.grid.ticks().len(),
            lecturers,
        }
    }

    fn room(&self, tick: usize, room: usize) -> usize {
        tick * self.per_tick + room
    }

    fn lecturer(&self, tick: usize, lecturer: LecturerId) -> usize {
        tick * self.per_tick + self.rooms + self.lecturers[&lecturer]
    }
}

/// One legal (point, room) for a session and the cells it would occupy.
struct Placement {
    point: usize,
    room: usize,
    cells: Vec<usize>,
}

fn placements(problem: &Problem<'_>, layout: &CellLayout, session: &Session) -> Vec<Placement> {
    let mut out = Vec::new();
    for (point_index, point) in problem.grid.points().iter().enumerate() {
        if !point.fits(session.duration) {
            continue;
        }
        let ticks = problem
            .grid
            .covered_ticks(point.day, point.start, point.start + session.duration);
        for (room_index, room) in problem.dataset.rooms.iter().enumerate() {
            if room.capacity < session.seats {
                continue;
            }
            let cells = ticks
                .clone()
                .flat_map(|t| [layout.room(t, room_index), layout.lecturer(t, session.lecturer_id)])
                .collect();
            out.push(Placement {
                point: point_index,
                room: room_index,
                cells,
            });
        }
    }
    out
}

/// (session index, placement index) pairs in decision order.
type Path = Vec<(usize, usize)>;

fn relax(layer: &mut IndexMap<CellSet, Path>, state: CellSet, path: Path) {
    match layer.entry(state) {
        Entry::Vacant(slot) => {
            slot.insert(path);
        }
        Entry::Occupied(mut slot) => {
            if path.len() > slot.get().len() {
                slot.insert(path);
            }
        }
    }
}

impl SchedulingStrategy for DynamicProgramming {
    fn strategy(&self) -> Strategy {
        Strategy::DynamicProgramming
    }

    fn schedule(&self, problem: &Problem<'_>) -> Result<Outcome, SolveError> {
        let deadline = self.time_limit.map(|limit| Instant::now() + limit);
        let layout = CellLayout::new(problem);
        let candidates: Vec<Vec<Placement>> = problem
            .sessions
            .iter()
            .map(|s| placements(problem, &layout, s))
            .collect();
        info!(
            "dynamic programming over {} cells, {} candidate placements",
            layout.len,
            candidates.iter().map(Vec::len).sum::<usize>()
        );

        let mut layer: IndexMap<CellSet, Path> = IndexMap::new();
        layer.insert(CellSet::empty(layout.len), Vec::new());

        for (k, session) in problem.sessions.iter().enumerate() {
            let mut next: IndexMap<CellSet, Path> = IndexMap::with_capacity(layer.len());
            for (state, path) in &layer {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return Err(SolveError::TimeLimitExceeded {
                        strategy: Strategy::DynamicProgramming,
                    });
                }
                for (p, placement) in candidates[k].iter().enumerate() {
                    if state.contains_any(&placement.cells) {
                        continue;
                    }
                    let mut extended = path.clone();
                    extended.push((k, p));
                    relax(&mut next, state.with(&placement.cells), extended);
                }
                relax(&mut next, state.clone(), path.clone());

                if next.len() > self.state_limit {
                    return Err(SolveError::StateSpaceExceeded {
                        limit: self.state_limit,
                        session: session.id.to_string(),
                    });
                }
            }
            debug!("after session {}: {} states", session.id, next.len());
            layer = next;
        }

        // first longest path wins ties
        let best = layer
            .values()
            .fold(None::<&Path>, |best, path| match best {
                Some(b) if b.len() >= path.len() => Some(b),
                _ => Some(path),
            })
            .cloned()
            .unwrap_or_default();

        let mut outcome = Outcome::default();
        let mut placed = vec![false; problem.sessions.len()];
        for &(k, p) in &best {
            let session = &problem.sessions[k];
            let placement = &candidates[k][p];
            let room = &problem.dataset.rooms[placement.room];
            let point = &problem.grid.points()[placement.point];
            outcome
                .schedule
                .push(problem.entry(session, session.id.ordinal, room, point)?);
            placed[k] = true;
        }

        let internal = detect_conflicts(&outcome.schedule);
        if !internal.is_empty() {
            warn!(
                "dynamic programming produced {} internal conflict(s): {}",
                internal.len(),
                internal.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
            );
        }

        for (session, _) in problem.sessions.iter().zip(&placed).filter(|(_, p)| !**p) {
            let reason = explain_unplaced(problem, &outcome.schedule, session)?;
            outcome.failures.push(problem.failure(session, reason));
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Course, Dataset, Lecturer, Room, TimeSlotWindow};
    use crate::stats::GLOBALLY_SUBOPTIMAL;
    use crate::time::Day;

    fn course(id: u32, credit_weight: u32, lecturer_id: u32, enrollment: u32) -> Course {
        Course {
            id,
            name: format!("MK{id}"),
            credit_weight,
            lecturer_id,
            enrollment,
        }
    }

    fn dataset(courses: Vec<Course>, window_end: &str) -> Dataset {
        Dataset {
            courses,
            lecturers: (1..=3)
                .map(|id| Lecturer {
                    id,
                    name: format!("L{id}"),
                })
                .collect(),
            rooms: vec![Room {
                id: 1,
                name: "R1".into(),
                capacity: 40,
            }],
            time_windows: vec![TimeSlotWindow {
                day: Day::Senin,
                start_time: "08:00".parse().unwrap(),
                end_time: window_end.parse().unwrap(),
            }],
        }
    }

    #[test]
    fn cell_set_tracks_bits_across_words() {
        let empty = CellSet::empty(130);
        assert_eq!(empty.0.len(), 3);
        let set = empty.with(&[0, 64, 129]);
        assert!(set.contains_any(&[129]));
        assert!(set.contains_any(&[5, 64]));
        assert!(!set.contains_any(&[1, 63, 65, 128]));
        assert!(!empty.contains_any(&[0]));
    }

    #[test]
    fn skips_a_blocking_session_to_place_the_rest() {
        // MK1 leaves no room for a second session; MK2 and MK3 fit back to back
        let data = dataset(
            vec![course(1, 3, 1, 30), course(2, 2, 2, 30), course(3, 2, 3, 30)],
            "11:00",
        );
        let problem = Problem::new(&data).unwrap();
        let outcome = DynamicProgramming::default().schedule(&problem).unwrap();

        let mut courses: Vec<&str> = outcome.schedule.iter().map(|e| e.course.as_str()).collect();
        courses.sort_unstable();
        assert_eq!(courses, vec!["MK2", "MK3"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].course, "MK1");
        assert!(
            outcome.failures[0].reason.contains("Room 'R1' clashes"),
            "{}",
            outcome.failures[0].reason
        );
        assert!(detect_conflicts(&outcome.schedule).is_empty());
    }

    #[test]
    fn sessions_with_free_capacity_are_all_placed() {
        let data = dataset(vec![course(1, 2, 1, 30), course(2, 2, 2, 30)], "12:00");
        let problem = Problem::new(&data).unwrap();
        let outcome = DynamicProgramming::default().schedule(&problem).unwrap();
        assert_eq!(outcome.schedule.len(), 2);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn unplaced_session_with_room_left_is_suboptimal() {
        // nothing else is booked, so any fitting probe succeeds
        let data = dataset(vec![course(1, 2, 1, 30)], "12:00");
        let problem = Problem::new(&data).unwrap();
        let reason = explain_unplaced(&problem, &[], &problem.sessions[0]).unwrap();
        assert_eq!(reason, GLOBALLY_SUBOPTIMAL);
    }

    #[test]
    fn state_limit_aborts() {
        let data = dataset(
            vec![course(1, 2, 1, 30), course(2, 2, 2, 30), course(3, 2, 3, 30)],
            "17:00",
        );
        let problem = Problem::new(&data).unwrap();
        let dp = DynamicProgramming {
            state_limit: 10,
            time_limit: None,
        };
        assert!(matches!(
            dp.schedule(&problem),
            Err(SolveError::StateSpaceExceeded { limit: 10, .. })
        ));
    }

    #[test]
    fn zero_time_limit_aborts() {
        let data = dataset(vec![course(1, 2, 1, 30)], "12:00");
        let problem = Problem::new(&data).unwrap();
        let dp = DynamicProgramming {
            state_limit: 1_000,
            time_limit: Some(Duration::ZERO),
        };
        assert_eq!(
            dp.schedule(&problem).unwrap_err(),
            SolveError::TimeLimitExceeded {
                strategy: Strategy::DynamicProgramming
            }
        );
    }

    #[test]
    fn lecturers_missing_from_the_list_still_get_cells() {
        let data = dataset(vec![course(1, 2, 99, 30), course(2, 2, 99, 30)], "11:00");
        let problem = Problem::new(&data).unwrap();
        let outcome = DynamicProgramming::default().schedule(&problem).unwrap();
        assert_eq!(outcome.schedule.len(), 2);
        assert!(outcome.schedule.iter().all(|e| e.lecturer == "Unknown lecturer"));
        assert!(detect_conflicts(&outcome.schedule).is_empty());
    }

    #[test]
    fn identical_runs_give_identical_schedules() {
        let data = dataset(
            vec![course(1, 3, 1, 30), course(2, 2, 2, 30), course(3, 2, 1, 30)],
            "12:00",
        );
        let problem = Problem::new(&data).unwrap();
        let first = DynamicProgramming::default().schedule(&problem).unwrap();
        let second = DynamicProgramming::default().schedule(&problem).unwrap();
        assert_eq!(first, second);
    }
}
