//! Core domain logic for the task board.
//! This crate owns the workload rebalancing engine and the storage it runs on.

pub mod db;
pub mod logging;
pub mod model;
pub mod rebalance;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use model::activity::{Activity, ActivityKind};
pub use model::project::{Project, User};
pub use model::task::{Task, TaskPriority, TaskStatus};
pub use model::team::{Team, TeamMember};
pub use model::workload::Reassignment;
pub use model::{MemberId, ModelValidationError, ProjectId, TaskId, TeamId, UserId};
pub use rebalance::RebalanceScope;
pub use repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
pub use repo::board_repo::{BoardRepository, SqliteBoardRepository};
pub use repo::workload_repo::{ProjectScope, SqliteWorkloadRepository, WorkloadRepository};
pub use repo::{RepoError, RepoResult};
pub use service::rebalance_service::{
    RebalanceError, RebalanceOutcome, RebalanceReport, RebalanceService, ResidualOverload,
};
pub use service::workload_service::{MemberWorkload, ProjectWorkload, WorkloadService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
