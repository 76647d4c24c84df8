use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use session_scheduler::data::Dataset;
use session_scheduler::server;
use session_scheduler::solver::{
    self, DEFAULT_DP_STATE_LIMIT, SolveOptions, Strategy, StrategyOutcome,
};

#[derive(Debug, Parser)]
#[command(name = "session-scheduler", version, about = "Course session scheduling engine")]
struct Cli {
    /// Maximum number of occupancy states per layer in the dynamic-programming strategy
    #[arg(long, global = true, env = "SCHEDULER_DP_STATE_LIMIT", default_value_t = DEFAULT_DP_STATE_LIMIT)]
    dp_state_limit: usize,

    /// Wall-clock budget in seconds for the dynamic-programming and ILP strategies
    #[arg(long, global = true, env = "SCHEDULER_TIME_LIMIT_SECS")]
    time_limit_secs: Option<f64>,

    /// Print the MIP solver's own log
    #[arg(long, global = true)]
    solver_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Schedule a dataset file and print the results as JSON
    Solve {
        /// Dataset JSON file
        dataset: PathBuf,

        /// Run only this strategy (backtracking, greedy, dp, ilp); all four by default
        #[arg(short, long)]
        strategy: Option<Strategy>,

        #[arg(long)]
        pretty: bool,
    },
    /// Serve the scheduling HTTP API
    Serve {
        #[arg(long, env = "SCHEDULER_ADDR", default_value = "127.0.0.1:8080")]
        addr: SocketAddr,

        #[arg(long, default_value_t = 4)]
        max_concurrent_solves: usize,
    },
}

impl Cli {
    fn options(&self) -> anyhow::Result<SolveOptions> {
        let time_limit = self
            .time_limit_secs
            .map(Duration::try_from_secs_f64)
            .transpose()
            .context("invalid --time-limit-secs")?;
        Ok(SolveOptions {
            dp_state_limit: self.dp_state_limit,
            time_limit,
            solver_log: self.solver_log,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let options = cli.options()?;

    match cli.command {
        Command::Solve {
            dataset,
            strategy,
            pretty,
        } => {
            let dataset = Dataset::from_path(&dataset)?;
            let json = tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
                let value = match strategy {
                    Some(strategy) => {
                        serde_json::to_value(solver::solve(&dataset, strategy, &options)?)?
                    }
                    None => {
                        let results: BTreeMap<Strategy, StrategyOutcome> =
                            solver::solve_all(&dataset, &options)
                                .into_iter()
                                .map(|(strategy, result)| (strategy, result.into()))
                                .collect();
                        serde_json::to_value(results)?
                    }
                };
                Ok(if pretty {
                    serde_json::to_string_pretty(&value)?
                } else {
                    serde_json::to_string(&value)?
                })
            })
            .await??;
            println!("{json}");
        }
        Command::Serve {
            addr,
            max_concurrent_solves,
        } => server::run_server(addr, options, max_concurrent_solves).await?,
    }
    Ok(())
}
