//! Repository layer over the node collection.
//!
//! # Responsibility
//! - Define the store contract consumed by the node service.
//! - Keep SQL and constraint details out of service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `SingletonConflict`)
//!   in addition to transport errors.

pub mod node_repo;
