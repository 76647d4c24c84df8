//! Shared problem model and the four interchangeable strategies.

mod dp;
mod first_fit;
pub mod ilp;

pub use dp::DynamicProgramming;
pub use first_fit::{Backtracking, Greedy};
pub use ilp::{HighsSolver, Ilp};

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::data::{Course, Dataset, FailureRecord, Room, ScheduleEntry, ScheduleResult};
use crate::error::SolveError;
use crate::grid::{TimeGrid, TimePoint};
use crate::occupancy::Interval;
use crate::session::{Session, generate_sessions};
use crate::stats;
use crate::time::ClockTime;

pub const DEFAULT_DP_STATE_LIMIT: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Backtracking,
    Greedy,
    DynamicProgramming,
    Ilp,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Backtracking,
        Strategy::Greedy,
        Strategy::DynamicProgramming,
        Strategy::Ilp,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Strategy::Backtracking => "backtracking",
            Strategy::Greedy => "greedy",
            Strategy::DynamicProgramming => "dynamic_programming",
            Strategy::Ilp => "ilp",
        }
    }

    pub fn scheduler(self, options: &SolveOptions) -> Box<dyn SchedulingStrategy> {
        match self {
            Strategy::Backtracking => Box::new(Backtracking),
            Strategy::Greedy => Box::new(Greedy),
            Strategy::DynamicProgramming => Box::new(DynamicProgramming {
                state_limit: options.dp_state_limit,
                time_limit: options.time_limit,
            }),
            Strategy::Ilp => Box::new(Ilp::new(HighsSolver {
                time_limit: options.time_limit,
                log_to_console: options.solver_log,
            })),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "backtracking" => Ok(Strategy::Backtracking),
            "greedy" => Ok(Strategy::Greedy),
            "dynamic_programming" | "dp" => Ok(Strategy::DynamicProgramming),
            "ilp" => Ok(Strategy::Ilp),
            _ => Err(SolveError::UnknownStrategy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    /// Abort the dynamic-programming strategy once a layer holds more states than this.
    pub dp_state_limit: usize,
    /// Wall-clock budget for the dynamic-programming and ILP strategies.
    pub time_limit: Option<Duration>,
    /// Let the MIP backend print its own progress log.
    pub solver_log: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            dp_state_limit: DEFAULT_DP_STATE_LIMIT,
            time_limit: None,
            solver_log: false,
        }
    }
}

/// What a strategy produces before statistics are attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub schedule: Vec<ScheduleEntry>,
    pub failures: Vec<FailureRecord>,
}

pub trait SchedulingStrategy {
    fn strategy(&self) -> Strategy;

    fn schedule(&self, problem: &Problem<'_>) -> Result<Outcome, SolveError>;
}

/// Read-only model shared by every strategy: the dataset, its time grid
/// and the generated sessions.
#[derive(Debug)]
pub struct Problem<'a> {
    pub dataset: &'a Dataset,
    pub grid: TimeGrid,
    pub sessions: Vec<Session>,
    course_sessions: Vec<Range<usize>>,
}

impl<'a> Problem<'a> {
    pub fn new(dataset: &'a Dataset) -> Result<Self, SolveError> {
        if dataset.rooms.is_empty() {
            let enrolled = dataset.courses.iter().filter(|c| c.enrollment > 0).count();
            if enrolled > 0 {
                return Err(SolveError::NoRooms { courses: enrolled });
            }
        }

        let sessions = generate_sessions(&dataset.courses, dataset.max_room_capacity());
        let mut course_sessions = vec![0..0; dataset.courses.len()];
        for (index, session) in sessions.iter().enumerate() {
            let range = &mut course_sessions[session.course_index];
            if range.start == range.end {
                range.start = index;
            }
            range.end = index + 1;
        }

        Ok(Self {
            dataset,
            grid: TimeGrid::new(&dataset.time_windows),
            sessions,
            course_sessions,
        })
    }

    pub fn course(&self, session: &Session) -> &'a Course {
        &self.dataset.courses[session.course_index]
    }

    /// Sessions of the course at `course_index`, in ordinal order.
    pub fn sessions_of(&self, course_index: usize) -> &[Session] {
        &self.sessions[self.course_sessions[course_index].clone()]
    }

    pub fn lecturer_name(&self, session: &Session) -> &'a str {
        self.dataset.lecturer_name(session.lecturer_id)
    }

    pub fn entry(
        &self,
        session: &Session,
        ordinal: u32,
        room: &Room,
        point: &TimePoint,
    ) -> Result<ScheduleEntry, SolveError> {
        let course = self.course(session);
        Ok(ScheduleEntry {
            course_id: course.id,
            course: course.name.clone(),
            lecturer_id: session.lecturer_id,
            lecturer: self.lecturer_name(session).to_string(),
            room_id: room.id,
            room: room.name.clone(),
            day: point.day,
            start_time: ClockTime::from_minutes(point.start)?,
            end_time: ClockTime::from_minutes(point.start + session.duration)?,
            attendees: session.seats,
            session: ordinal,
        })
    }

    pub fn failure(&self, session: &Session, reason: impl fmt::Display) -> FailureRecord {
        FailureRecord {
            course: self.course(session).name.clone(),
            lecturer: self.lecturer_name(session).to_string(),
            session: session.id.ordinal,
            attendees: session.seats,
            reason: reason.to_string(),
        }
    }
}

pub(crate) fn session_interval(point: &TimePoint, session: &Session) -> Interval {
    Interval::new(point.start, point.start + session.duration)
}

/// Runs one strategy over `dataset` and attaches statistics.
pub fn solve(
    dataset: &Dataset,
    strategy: Strategy,
    options: &SolveOptions,
) -> Result<ScheduleResult, SolveError> {
    let started = Instant::now();
    let problem = Problem::new(dataset)?;
    info!(
        "{strategy}: scheduling {} sessions from {} courses over {} rooms and {} start points",
        problem.sessions.len(),
        dataset.courses.len(),
        dataset.rooms.len(),
        problem.grid.points().len()
    );

    let scheduler = strategy.scheduler(options);
    let outcome = scheduler.schedule(&problem)?;
    let result = stats::aggregate(&problem, outcome, started.elapsed());
    info!(
        "{}: scheduled {}/{} sessions in {:.2?}",
        scheduler.strategy(),
        result.stats.scheduled_slots,
        result.stats.total_slots_attempted,
        started.elapsed()
    );
    Ok(result)
}

/// One strategy's part of a multi-strategy run: its result, or the error
/// that aborted that strategy alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrategyOutcome {
    Solved(ScheduleResult),
    Failed { error: String },
}

impl StrategyOutcome {
    pub fn result(&self) -> Option<&ScheduleResult> {
        match self {
            StrategyOutcome::Solved(result) => Some(result),
            StrategyOutcome::Failed { .. } => None,
        }
    }
}

impl From<Result<ScheduleResult, SolveError>> for StrategyOutcome {
    fn from(result: Result<ScheduleResult, SolveError>) -> Self {
        match result {
            Ok(result) => StrategyOutcome::Solved(result),
            Err(e) => StrategyOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Runs every strategy in parallel. Results come back in [`Strategy::ALL`]
/// order; an error aborts only the strategy that raised it.
pub fn solve_all(
    dataset: &Dataset,
    options: &SolveOptions,
) -> Vec<(Strategy, Result<ScheduleResult, SolveError>)> {
    Strategy::ALL
        .par_iter()
        .map(|&strategy| {
            let result = solve(dataset, strategy, options);
            if let Err(e) = &result {
                warn!("{strategy}: aborted: {e}");
            }
            (strategy, result)
        })
        .collect()
}
