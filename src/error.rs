use thiserror::Error;

use crate::solver::Strategy;

/// Conditions that abort a solve instead of producing a result.
///
/// Sessions that cannot be placed are not errors; they are reported as
/// [`FailureRecord`](crate::data::FailureRecord)s inside the result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("no rooms configured while {courses} course(s) have enrolled students")]
    NoRooms { courses: usize },

    #[error("invalid time value: {0}")]
    InvalidTime(String),

    #[error("unknown day: {0}")]
    UnknownDay(String),

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("state space exceeded the limit of {limit} states while placing session {session}")]
    StateSpaceExceeded { limit: usize, session: String },

    #[error("{strategy} exceeded its time limit")]
    TimeLimitExceeded { strategy: Strategy },
}
