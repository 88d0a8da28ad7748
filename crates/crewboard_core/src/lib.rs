//! Core domain logic for crewboard.
//! This crate is the single source of truth for directory, project and task
//! invariants; chat front-ends only translate requests and replies.

pub mod binding;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod platform;
pub mod policy;
pub mod repo;
pub mod service;

pub use binding::{BindingConfig, BindingError, ChannelBinding, TaskRequest};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbTarget};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::access::AccessLevel;
pub use model::ids::{ChannelId, EmployeeId, MessageId, ProjectId, TaskId, UserId};
pub use model::selector::Selector;
pub use model::validation::ValidationError;
pub use platform::{ChatPlatform, InMemoryPlatform, PlatformError};
pub use policy::command::CommandKind;
pub use repo::{EntityStore, RepoError, RepoResult, SqliteEntityStore};
pub use service::{CommandReply, CommandService, ServiceError, ServiceResult};

/// Liveness probe printed by the CLI smoke run.
pub fn ping() -> &'static str {
    "pong"
}

/// Version of this crate as compiled.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
