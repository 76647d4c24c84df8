//! Result statistics and human-readable failure reasons.

use log::debug;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use crate::conflict::{ConflictKind, detect_conflicts};
use crate::data::{ScheduleEntry, ScheduleResult, Statistics};
use crate::error::SolveError;
use crate::grid::TimePoint;
use crate::session::Session;
use crate::solver::{Outcome, Problem};
use crate::time::{Day, format_minutes};

/// Why a session could not be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NoCandidate,
    DurationOverflow,
    Capacity {
        room: String,
        capacity: u32,
        seats: u32,
    },
    Clash {
        kind: ConflictKind,
        day: Day,
        start: u16,
        end: u16,
        room: String,
        lecturer: String,
    },
    SolverFailed {
        status: String,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoCandidate => f.write_str("No suitable time slot or room was found."),
            Rejection::DurationOverflow => {
                f.write_str("Course duration exceeds the available time slot.")
            }
            Rejection::Capacity {
                room,
                capacity,
                seats,
            } => write!(
                f,
                "Room '{room}' ({capacity}) is too small for {seats} students."
            ),
            Rejection::Clash {
                kind,
                day,
                start,
                end,
                room,
                lecturer,
            } => write!(
                f,
                "{kind} on {day} {}-{} in {room} or with lecturer {lecturer}.",
                format_minutes(*start),
                format_minutes(*end)
            ),
            Rejection::SolverFailed { status } => write!(
                f,
                "The ILP solver found no schedule satisfying every constraint ({status}). \
                 The constraints may be too tight or the input cannot be scheduled."
            ),
        }
    }
}

pub const GLOBALLY_SUBOPTIMAL: &str =
    "Cannot be scheduled: not globally optimal against higher-priority sessions.";
pub const NO_FEASIBLE_PLACEMENT: &str =
    "Cannot be scheduled: no time slot or room satisfies all criteria.";

/// Builds the reported result: schedule sorted by (day, start, course) and
/// the attempted/scheduled/failed counts.
pub fn aggregate(problem: &Problem<'_>, outcome: Outcome, elapsed: Duration) -> ScheduleResult {
    let Outcome {
        mut schedule,
        failures,
    } = outcome;
    schedule.sort_by(|a, b| a.report_key().cmp(&b.report_key()));
    for failure in &failures {
        debug!("unplaced: {failure}");
    }

    ScheduleResult {
        stats: Statistics {
            total_slots_attempted: problem.sessions.len(),
            scheduled_slots: schedule.len(),
            conflicts: failures.len(),
            failed_details: failures,
            execution_time: elapsed.as_secs_f64(),
        },
        schedule,
    }
}

/// Best-effort reason for a session left out of a finished schedule.
///
/// Probes the start of every window against every room. If some probe
/// fits without clashing with `schedule`, the session was displaced by
/// the strategy's choices rather than being impossible. This is a
/// heuristic: only window starts are probed, so a session that could not
/// have been placed anywhere may still be reported as suboptimal, and the
/// reverse.
pub fn explain_unplaced(
    problem: &Problem<'_>,
    schedule: &[ScheduleEntry],
    session: &Session,
) -> Result<String, SolveError> {
    let mut reasons = BTreeSet::new();
    let lecturer = problem.lecturer_name(session);

    for window in &problem.dataset.time_windows {
        let probe = TimePoint {
            day: window.day,
            start: window.start_time.minutes(),
            window_end: window.end_time.minutes(),
        };
        if !probe.fits(session.duration) {
            continue;
        }
        let span = format!(
            "{} {}-{}",
            probe.day,
            format_minutes(probe.start),
            format_minutes(probe.start + session.duration)
        );

        for room in &problem.dataset.rooms {
            if room.capacity < session.seats {
                reasons.insert(format!(
                    "Room '{}' is too small ({} < {} students).",
                    room.name, room.capacity, session.seats
                ));
                continue;
            }

            let mut trial = schedule.to_vec();
            trial.push(problem.entry(session, session.id.ordinal, room, &probe)?);
            let conflicts = detect_conflicts(&trial);
            if conflicts.is_empty() {
                return Ok(GLOBALLY_SUBOPTIMAL.to_string());
            }
            for conflict in conflicts {
                match conflict.kind {
                    ConflictKind::Room if conflict.resource_id == room.id => {
                        reasons.insert(format!("Room '{}' clashes on {span}.", room.name));
                    }
                    ConflictKind::Lecturer if conflict.resource_id == session.lecturer_id => {
                        reasons.insert(format!("Lecturer '{lecturer}' clashes on {span}."));
                    }
                    _ => {}
                }
            }
        }
    }

    if reasons.is_empty() {
        return Ok(NO_FEASIBLE_PLACEMENT.to_string());
    }
    Ok(format!(
        "Cannot be scheduled: {}",
        reasons.into_iter().collect::<Vec<_>>().join("; ")
    ))
}
