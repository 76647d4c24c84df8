use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use log::{error, info};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;

use crate::conflict::{Conflict, detect_conflicts};
use crate::data::{Dataset, ScheduleEntry, ScheduleResult};
use crate::error::SolveError;
use crate::solver::{self, SolveOptions, Strategy, StrategyOutcome};

type HandlerError = (StatusCode, String);

#[derive(Clone)]
struct AppState {
    options: Arc<SolveOptions>,
}

fn rejection(e: SolveError) -> HandlerError {
    let status = match e {
        SolveError::StateSpaceExceeded { .. } | SolveError::TimeLimitExceeded { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::BAD_REQUEST,
    };
    (status, e.to_string())
}

/// Runs CPU-bound solving on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, HandlerError>
where
    F: FnOnce() -> Result<T, SolveError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(rejection),
        Err(e) => {
            error!("solver task failed: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Every strategy's outcome; a strategy that aborts reports its error in
/// place of a result.
async fn solve_all_handler(
    State(state): State<AppState>,
    Json(dataset): Json<Dataset>,
) -> Result<Json<BTreeMap<Strategy, StrategyOutcome>>, HandlerError> {
    let results = blocking(move || Ok(solver::solve_all(&dataset, &state.options))).await?;
    Ok(Json(
        results
            .into_iter()
            .map(|(strategy, result)| (strategy, result.into()))
            .collect(),
    ))
}

async fn solve_handler(
    State(state): State<AppState>,
    Path(strategy): Path<String>,
    Json(dataset): Json<Dataset>,
) -> Result<Json<ScheduleResult>, HandlerError> {
    let strategy: Strategy = strategy.parse().map_err(rejection)?;
    let result = blocking(move || solver::solve(&dataset, strategy, &state.options)).await?;
    Ok(Json(result))
}

async fn conflicts_handler(Json(entries): Json<Vec<ScheduleEntry>>) -> Json<Vec<Conflict>> {
    Json(detect_conflicts(&entries))
}

/// The service's routes. At most `max_concurrent_solves` requests are
/// handled at once.
pub fn app(options: SolveOptions, max_concurrent_solves: usize) -> Router {
    let state = AppState {
        options: Arc::new(options),
    };
    Router::new()
        .route("/v1/schedule/solve", post(solve_all_handler))
        .route("/v1/schedule/solve/:strategy", post(solve_handler))
        .route("/v1/schedule/conflicts", post(conflicts_handler))
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent_solves.max(1)))
        .with_state(state)
}

pub async fn run_server(
    addr: SocketAddr,
    options: SolveOptions,
    max_concurrent_solves: usize,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app(options, max_concurrent_solves)).await?;
    Ok(())
}
