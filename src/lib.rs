pub mod conflict;
pub mod data;
pub mod error;
pub mod grid;
pub mod occupancy;
pub mod server;
pub mod session;
pub mod solver;
pub mod stats;
pub mod time;

pub use conflict::{Conflict, ConflictKind, detect_conflicts};
pub use data::{Dataset, FailureRecord, ScheduleEntry, ScheduleResult, Statistics};
pub use error::SolveError;
pub use solver::{SolveOptions, Strategy, StrategyOutcome, solve, solve_all};
