//! Node domain model.
//!
//! # Responsibility
//! - Define the single record shape shared by every node kind.
//! - Keep in-memory construction separate from persistence.
//!
//! # Invariants
//! - Every record is identified by a stable, non-nil `NodeId`.
//! - `category` is stamped by the creating kind and never changes afterward.

pub mod node;
