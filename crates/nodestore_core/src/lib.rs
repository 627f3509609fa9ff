//! Kind-scoped node store.
//!
//! A single SQLite collection holds every node kind. Lookups go through a
//! kind, which intersects its fixed predicate with the caller's filter and
//! decides which kind-specific operations the results expose.

pub mod capability;
pub mod config;
pub mod db;
pub mod kind;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use capability::{
    allowed_operations, is_operation_allowed, CapabilityError, FoundNode, LookAtMe, NodeOperation,
    FOLDER_DESCRIPTION,
};
pub use config::{ConfigError, CoreConfig};
pub use kind::{registry, KindRegistry, KindSpec, NodeKind};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::node::{NodeFields, NodeId, NodeRecord, NodeValidationError, DEFAULT_NUMBER};
pub use query::predicate::{compose, Field, Literal, Operator, Predicate, PredicateError};
pub use repo::node_repo::{NodeRepository, RepoError, RepoResult, SqliteNodeRepository};
pub use service::demo::{seed_demo_nodes, DemoSeed};
pub use service::node_service::{NodeQuery, NodeService, NodeServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
