use good_lp::{
    Expression, ProblemVariables, Solution, SolverModel, Variable, constraint, default_solver,
    variable,
};
use log::{info, trace, warn};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{Outcome, Problem, SchedulingStrategy, Strategy};
use crate::data::LecturerId;
use crate::error::SolveError;
use crate::session::SessionPlan;
use crate::stats::Rejection;
use crate::time::credit_minutes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    AtMost,
    Exactly,
}

/// `sum(vars) <relation> rhs` over binary variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub vars: Vec<usize>,
    pub relation: Relation,
    pub rhs: u32,
}

/// A 0/1 program whose objective is to maximise the number of selected
/// variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryProgram {
    pub num_vars: usize,
    pub constraints: Vec<LinearConstraint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MipOutcome {
    /// Optimal or feasible; one flag per variable.
    Solved(Vec<bool>),
    NotSolved { status: String },
}

/// What the ILP strategy needs from a mixed-integer solver.
pub trait MipSolver {
    fn maximise_selected(&self, program: &BinaryProgram) -> MipOutcome;
}

/// HiGHS through good_lp.
#[derive(Debug, Clone, Default)]
pub struct HighsSolver {
    pub time_limit: Option<Duration>,
    pub log_to_console: bool,
}

impl MipSolver for HighsSolver {
    fn maximise_selected(&self, program: &BinaryProgram) -> MipOutcome {
        let mut problem = ProblemVariables::new();
        let vars: Vec<Variable> = problem.add_vector(variable().binary(), program.num_vars);
        let objective: Expression = vars.iter().copied().sum();

        let mut model = problem
            .maximise(objective)
            .using(default_solver)
            .set_option("threads", 1) // limit to 1 thread for reproducibility
            .set_option("random_seed", 1234) // fixed seed for reproducibility
            .set_option(
                "log_to_console",
                if self.log_to_console { "true" } else { "false" },
            );
        if let Some(limit) = self.time_limit {
            model = model.set_option("time_limit", limit.as_secs_f64());
        }

        for c in &program.constraints {
            let lhs: Expression = c.vars.iter().map(|&i| vars[i]).sum();
            let rhs = f64::from(c.rhs);
            match c.relation {
                Relation::AtMost => model.add_constraint(constraint!(lhs <= rhs)),
                Relation::Exactly => model.add_constraint(constraint!(lhs == rhs)),
            };
        }

        match model.solve() {
            Ok(solution) => {
                MipOutcome::Solved(vars.iter().map(|&v| solution.value(v) > 0.9).collect())
            }
            Err(e) => MipOutcome::NotSolved {
                status: e.to_string(),
            },
        }
    }
}

/// x_crp = 1 if course c meets in room r starting at grid point p.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    course: usize,
    room: usize,
    point: usize,
}

/// The exact-optimization strategy, generic over the MIP backend.
#[derive(Debug, Clone, Default)]
pub struct Ilp<S = HighsSolver> {
    solver: S,
}

impl<S: MipSolver> Ilp<S> {
    pub fn new(solver: S) -> Self {
        Self { solver }
    }
}

struct Model {
    candidates: Vec<Candidate>,
    program: BinaryProgram,
    plans: Vec<SessionPlan>,
}

impl Model {
    fn build(problem: &Problem<'_>) -> Result<Self, String> {
        let data = problem.dataset;
        let max_capacity = data.max_room_capacity();
        let plans: Vec<SessionPlan> = data
            .courses
            .iter()
            .map(|c| SessionPlan::for_enrollment(c.enrollment, max_capacity))
            .collect();

        // pre-filter for capacity and window fit
        let mut candidates = Vec::new();
        for (ci, course) in data.courses.iter().enumerate() {
            let duration = credit_minutes(course.credit_weight);
            if plans[ci].count == 0 || duration == 0 {
                continue;
            }
            for (ri, room) in data.rooms.iter().enumerate() {
                if room.capacity < plans[ci].seats {
                    continue;
                }
                for (pi, point) in problem.grid.points().iter().enumerate() {
                    if point.fits(duration) {
                        candidates.push(Candidate {
                            course: ci,
                            room: ri,
                            point: pi,
                        });
                    }
                }
            }
        }
        trace!(
            "Generated {} assignment variables out of a theoretical maximum of {}.",
            candidates.len(),
            data.courses.len() * data.rooms.len() * problem.grid.points().len()
        );

        let mut room_ticks: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
        let mut lecturer_ticks: BTreeMap<(LecturerId, usize), Vec<usize>> = BTreeMap::new();
        let mut by_course: Vec<Vec<usize>> = vec![Vec::new(); data.courses.len()];
        for (var, c) in candidates.iter().enumerate() {
            let course = &data.courses[c.course];
            let point = &problem.grid.points()[c.point];
            let end = point.start + credit_minutes(course.credit_weight);
            for tick in problem.grid.covered_ticks(point.day, point.start, end) {
                room_ticks.entry((c.room, tick)).or_default().push(var);
                lecturer_ticks
                    .entry((course.lecturer_id, tick))
                    .or_default()
                    .push(var);
            }
            by_course[c.course].push(var);
        }

        let mut constraints = Vec::new();

        // no room double-booking
        // no lecturer overlap
        for vars in room_ticks.into_values().chain(lecturer_ticks.into_values()) {
            if vars.len() > 1 {
                constraints.push(LinearConstraint {
                    vars,
                    relation: Relation::AtMost,
                    rhs: 1,
                });
            }
        }

        // every course gets exactly its required number of sessions
        for (ci, vars) in by_course.into_iter().enumerate() {
            let required = plans[ci].count;
            if required == 0 {
                continue;
            }
            if vars.is_empty() {
                return Err(format!(
                    "infeasible: no candidate placement for course '{}'",
                    data.courses[ci].name
                ));
            }
            constraints.push(LinearConstraint {
                vars,
                relation: Relation::Exactly,
                rhs: required,
            });
        }

        Ok(Self {
            program: BinaryProgram {
                num_vars: candidates.len(),
                constraints,
            },
            candidates,
            plans,
        })
    }
}

impl<S: MipSolver> SchedulingStrategy for Ilp<S> {
    fn strategy(&self) -> Strategy {
        Strategy::Ilp
    }

    fn schedule(&self, problem: &Problem<'_>) -> Result<Outcome, SolveError> {
        if problem.sessions.is_empty() {
            return Ok(Outcome::default());
        }

        info!(
            "Setting up ILP model with {} courses, {} rooms, and {} start points...",
            problem.dataset.courses.len(),
            problem.dataset.rooms.len(),
            problem.grid.points().len()
        );
        let outcome = match Model::build(problem) {
            Ok(model) => {
                info!(
                    "Starting ILP solver with {} variables and {} constraints...",
                    model.program.num_vars,
                    model.program.constraints.len()
                );
                match self.solver.maximise_selected(&model.program) {
                    MipOutcome::Solved(selected) => decode(problem, &model, &selected)?,
                    MipOutcome::NotSolved { status } => all_failed(problem, status),
                }
            }
            Err(status) => all_failed(problem, status),
        };
        Ok(outcome)
    }
}

/// Turns selected variables into entries, numbering each course's
/// sessions in variable order.
fn decode(problem: &Problem<'_>, model: &Model, selected: &[bool]) -> Result<Outcome, SolveError> {
    let mut outcome = Outcome::default();
    let mut numbered = vec![0u32; model.plans.len()];

    for (c, _) in model
        .candidates
        .iter()
        .zip(selected)
        .filter(|(_, chosen)| **chosen)
    {
        if numbered[c.course] >= model.plans[c.course].count {
            continue;
        }
        numbered[c.course] += 1;
        let Some(session) = problem.sessions_of(c.course).first() else {
            continue;
        };
        let room = &problem.dataset.rooms[c.room];
        let point = &problem.grid.points()[c.point];
        outcome
            .schedule
            .push(problem.entry(session, numbered[c.course], room, point)?);
    }

    // a backend that under-selects must not make sessions disappear
    for (ci, &placed) in numbered.iter().enumerate() {
        for session in problem.sessions_of(ci).iter().skip(placed as usize) {
            outcome
                .failures
                .push(problem.failure(session, Rejection::NoCandidate));
        }
    }
    Ok(outcome)
}

fn all_failed(problem: &Problem<'_>, status: String) -> Outcome {
    warn!("ILP solver status: {status}. No optimal or feasible solution found.");
    let rejection = Rejection::SolverFailed { status };
    Outcome {
        schedule: Vec::new(),
        failures: problem
            .sessions
            .iter()
            .map(|s| problem.failure(s, &rejection))
            .collect(),
    }
}
