//! Command-line entry point for the task board core.
//!
//! # Responsibility
//! - Open a board database, optionally start file logging, and run one
//!   rebalancing or reporting command.
//! - Print results as JSON on stdout and failures as one stderr line.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use taskboard_core::db::open_db;
use taskboard_core::{
    default_log_level, init_logging, ActivityRepository, RebalanceError, RebalanceService,
    SqliteActivityRepository, SqliteWorkloadRepository, WorkloadService,
};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "taskboard", version, about = "Task board workload tools")]
struct Cli {
    /// Path to the board SQLite database.
    #[arg(long, env = "TASKBOARD_DB")]
    db: PathBuf,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "TASKBOARD_LOG_DIR")]
    log_dir: Option<String>,

    /// One of trace|debug|info|warn|error.
    #[arg(long, default_value = default_log_level())]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Move lower-priority work off overloaded members.
    Rebalance {
        #[arg(long)]
        owner: Uuid,
        /// Limit the run to one project; all projects when omitted.
        #[arg(long)]
        project: Option<Uuid>,
    },
    /// Show capacity and current load per project member.
    Overview {
        #[arg(long)]
        owner: Uuid,
    },
    /// List the most recent reassignments.
    Activity {
        #[arg(long)]
        owner: Uuid,
        #[arg(long)]
        limit: Option<u32>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("taskboard: {}", failure.message);
            ExitCode::from(failure.code)
        }
    }
}

struct Failure {
    code: u8,
    message: String,
}

impl Failure {
    fn general(message: impl ToString) -> Self {
        Self {
            code: 1,
            message: message.to_string(),
        }
    }
}

fn run(cli: Cli) -> Result<String, Failure> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, log_dir).map_err(Failure::general)?;
    }

    let conn = open_db(&cli.db).map_err(Failure::general)?;
    let workload_repo = SqliteWorkloadRepository::try_new(&conn).map_err(Failure::general)?;

    match cli.command {
        Command::Rebalance { owner, project } => {
            let service = RebalanceService::new(workload_repo);
            let outcome = match project {
                Some(project_id) => service.rebalance_project(owner, project_id),
                None => service.rebalance_all_projects(owner),
            }
            .map_err(|err| match err {
                RebalanceError::ScopeNotFound { .. } => Failure {
                    code: 2,
                    message: err.to_string(),
                },
                other => Failure::general(other),
            })?;
            to_json(&outcome)
        }
        Command::Overview { owner } => {
            let service = WorkloadService::new(workload_repo);
            let overview = service.workload_overview(owner).map_err(Failure::general)?;
            to_json(&overview)
        }
        Command::Activity { owner, limit } => {
            let repo = SqliteActivityRepository::try_new(&conn).map_err(Failure::general)?;
            let activities = repo
                .list_recent_reassignments(owner, limit)
                .map_err(Failure::general)?;
            to_json(&activities)
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, Failure> {
    serde_json::to_string_pretty(value).map_err(Failure::general)
}
