//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into kind-scoped lookup and creation APIs.
//! - Keep callers decoupled from SQL and constraint details.

pub mod demo;
pub mod node_service;
