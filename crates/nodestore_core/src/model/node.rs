//! Node record model.
//!
//! # Responsibility
//! - Define the canonical record stored for every kind in the hierarchy.
//! - Apply field defaults (`name = ""`, `number = 1`) at construction.
//!
//! # Invariants
//! - `id` is never nil and never reused for another record.
//! - `category` equals the kind used to build the record.

use crate::kind::NodeKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier generated when a record is built.
pub type NodeId = Uuid;

/// Default value of `NodeRecord::number`.
pub const DEFAULT_NUMBER: i64 = 1;

/// Validation failures for node records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValidationError {
    NilId,
}

impl Display for NodeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "node id must not be nil"),
        }
    }
}

impl Error for NodeValidationError {}

/// Caller overrides applied on top of kind defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFields {
    pub name: Option<String>,
    pub number: Option<i64>,
}

impl NodeFields {
    /// Fields with only `name` set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            number: None,
        }
    }

    pub fn with_number(mut self, number: i64) -> Self {
        self.number = Some(number);
        self
    }
}

/// Canonical stored record for all node kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NodeRecordWire")]
pub struct NodeRecord {
    pub id: NodeId,
    /// Discriminator; serialized as the kind's snake_case name.
    pub category: NodeKind,
    pub name: String,
    pub number: i64,
}

impl NodeRecord {
    /// Builds a record in memory with a generated id.
    ///
    /// Does not persist and does not run the singleton guard.
    pub fn new(kind: NodeKind, fields: NodeFields) -> Self {
        Self::build(Uuid::new_v4(), kind, fields)
    }

    /// Builds a record with a caller-provided id (import paths).
    pub fn with_id(
        id: NodeId,
        kind: NodeKind,
        fields: NodeFields,
    ) -> Result<Self, NodeValidationError> {
        let record = Self::build(id, kind, fields);
        record.validate()?;
        Ok(record)
    }

    fn build(id: NodeId, kind: NodeKind, fields: NodeFields) -> Self {
        Self {
            id,
            category: kind,
            name: fields.name.unwrap_or_default(),
            number: fields.number.unwrap_or(DEFAULT_NUMBER),
        }
    }

    pub fn validate(&self) -> Result<(), NodeValidationError> {
        if self.id.is_nil() {
            return Err(NodeValidationError::NilId);
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct NodeRecordWire {
    id: NodeId,
    category: NodeKind,
    #[serde(default)]
    name: String,
    #[serde(default = "default_number")]
    number: i64,
}

fn default_number() -> i64 {
    DEFAULT_NUMBER
}

impl TryFrom<NodeRecordWire> for NodeRecord {
    type Error = NodeValidationError;

    fn try_from(value: NodeRecordWire) -> Result<Self, Self::Error> {
        let record = Self {
            id: value.id,
            category: value.category,
            name: value.name,
            number: value.number,
        };
        record.validate()?;
        Ok(record)
    }
}
