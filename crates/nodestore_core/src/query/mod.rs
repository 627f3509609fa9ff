//! Query dialect for kind-scoped lookups.
//!
//! # Responsibility
//! - Express filters over node fields independent of the storage engine.
//! - Compose per-kind fixed predicates with caller predicates.

pub mod predicate;
