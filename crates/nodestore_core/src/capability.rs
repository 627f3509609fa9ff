//! Operation visibility by lookup kind.
//!
//! # Responsibility
//! - Declare kind-specific operations and the kind that introduces each one.
//! - Decide, per (lookup kind, stored category), which operations a found
//!   record exposes.
//! - Wrap query results with the lookup kind they were resolved through.
//!
//! # Invariants
//! - An operation is exposed only when its owning kind is the lookup kind or
//!   one of its ancestors. The stored category never widens the set: a
//!   dashboard found through `Folder` cannot `look_at_me`.
//! - Nothing is exposed for a category outside the lookup kind's family.

use crate::kind::{registry, NodeKind};
use crate::model::node::{NodeId, NodeRecord};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Literal returned by [`FoundNode::describe_folder`].
pub const FOLDER_DESCRIPTION: &str = "I am a folder.";

const LOOK_AT_ME_PREFIX: &str = "Look at me! I am";
const LOOK_AT_ME_SUFFIX: &str = "!";

/// Kind-specific operation on a found record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeOperation {
    DescribeFolder,
    LookAtMe,
}

impl NodeOperation {
    pub const ALL: [NodeOperation; 2] = [NodeOperation::DescribeFolder, NodeOperation::LookAtMe];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DescribeFolder => "describe_folder",
            Self::LookAtMe => "look_at_me",
        }
    }

    /// Kind that introduces this operation.
    pub fn owner(self) -> NodeKind {
        match self {
            Self::DescribeFolder => NodeKind::Folder,
            Self::LookAtMe => NodeKind::Dashboard,
        }
    }
}

/// Returns whether `operation` is exposed on a `category` record found
/// through `lookup_kind`.
pub fn is_operation_allowed(
    lookup_kind: NodeKind,
    category: NodeKind,
    operation: NodeOperation,
) -> bool {
    let registry = registry();
    registry.is_subkind_of(category, lookup_kind)
        && registry.is_subkind_of(lookup_kind, operation.owner())
}

/// Every operation exposed for the (lookup kind, category) pair.
pub fn allowed_operations(lookup_kind: NodeKind, category: NodeKind) -> Vec<NodeOperation> {
    NodeOperation::ALL
        .iter()
        .copied()
        .filter(|operation| is_operation_allowed(lookup_kind, category, *operation))
        .collect()
}

/// Operation denied by the lookup-kind table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    UnsupportedOperation {
        lookup_kind: NodeKind,
        category: NodeKind,
        operation: NodeOperation,
    },
}

impl Display for CapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedOperation {
                lookup_kind,
                category,
                operation,
            } => write!(
                f,
                "operation `{}` is not available on a {category} node found as {lookup_kind}",
                operation.as_str()
            ),
        }
    }
}

impl Error for CapabilityError {}

/// Output of the dashboard-only `look_at_me` operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookAtMe {
    pub prefix: &'static str,
    pub name: String,
    pub suffix: &'static str,
}

impl LookAtMe {
    pub fn parts(&self) -> (&str, &str, &str) {
        (self.prefix, self.name.as_str(), self.suffix)
    }
}

impl Display for LookAtMe {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.prefix, self.name, self.suffix)
    }
}

/// A record together with the kind it was looked up through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundNode {
    record: NodeRecord,
    lookup_kind: NodeKind,
}

impl FoundNode {
    pub fn new(record: NodeRecord, lookup_kind: NodeKind) -> Self {
        Self {
            record,
            lookup_kind,
        }
    }

    pub fn id(&self) -> NodeId {
        self.record.id
    }

    pub fn category(&self) -> NodeKind {
        self.record.category
    }

    pub fn name(&self) -> &str {
        self.record.name.as_str()
    }

    pub fn number(&self) -> i64 {
        self.record.number
    }

    pub fn lookup_kind(&self) -> NodeKind {
        self.lookup_kind
    }

    pub fn record(&self) -> &NodeRecord {
        &self.record
    }

    pub fn into_record(self) -> NodeRecord {
        self.record
    }

    pub fn supports(&self, operation: NodeOperation) -> bool {
        is_operation_allowed(self.lookup_kind, self.record.category, operation)
    }

    pub fn operations(&self) -> Vec<NodeOperation> {
        allowed_operations(self.lookup_kind, self.record.category)
    }

    /// Folder-level description. Requires a `Folder` or `Dashboard` lookup.
    pub fn describe_folder(&self) -> Result<&'static str, CapabilityError> {
        self.ensure(NodeOperation::DescribeFolder)?;
        Ok(FOLDER_DESCRIPTION)
    }

    /// Dashboard-only greeting. Requires a `Dashboard` lookup.
    pub fn look_at_me(&self) -> Result<LookAtMe, CapabilityError> {
        self.ensure(NodeOperation::LookAtMe)?;
        Ok(LookAtMe {
            prefix: LOOK_AT_ME_PREFIX,
            name: self.record.name.clone(),
            suffix: LOOK_AT_ME_SUFFIX,
        })
    }

    fn ensure(&self, operation: NodeOperation) -> Result<(), CapabilityError> {
        if self.supports(operation) {
            return Ok(());
        }
        Err(CapabilityError::UnsupportedOperation {
            lookup_kind: self.lookup_kind,
            category: self.record.category,
            operation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        allowed_operations, is_operation_allowed, CapabilityError, FoundNode, NodeOperation,
    };
    use crate::kind::NodeKind;
    use crate::model::node::{NodeFields, NodeRecord};

    #[test]
    fn dashboard_lookup_exposes_all_folder_and_dashboard_operations() {
        assert_eq!(
            allowed_operations(NodeKind::Dashboard, NodeKind::Dashboard),
            vec![NodeOperation::DescribeFolder, NodeOperation::LookAtMe]
        );
    }

    #[test]
    fn folder_lookup_hides_dashboard_operation_on_dashboard_records() {
        assert!(is_operation_allowed(
            NodeKind::Folder,
            NodeKind::Dashboard,
            NodeOperation::DescribeFolder
        ));
        assert!(!is_operation_allowed(
            NodeKind::Folder,
            NodeKind::Dashboard,
            NodeOperation::LookAtMe
        ));
    }

    #[test]
    fn base_and_unrelated_lookups_expose_nothing() {
        for category in NodeKind::ALL {
            assert!(allowed_operations(NodeKind::Node, category).is_empty());
        }
        assert!(allowed_operations(NodeKind::Data, NodeKind::Data).is_empty());
        assert!(allowed_operations(NodeKind::Data, NodeKind::Dashboard).is_empty());
    }

    #[test]
    fn category_outside_lookup_family_is_denied() {
        assert!(!is_operation_allowed(
            NodeKind::Dashboard,
            NodeKind::Folder,
            NodeOperation::DescribeFolder
        ));
    }

    #[test]
    fn found_node_reports_denied_operation() {
        let record = NodeRecord::new(NodeKind::Dashboard, NodeFields::named("Dashboard"));
        let as_folder = FoundNode::new(record.clone(), NodeKind::Folder);

        assert_eq!(as_folder.describe_folder(), Ok("I am a folder."));
        assert_eq!(
            as_folder.look_at_me().unwrap_err(),
            CapabilityError::UnsupportedOperation {
                lookup_kind: NodeKind::Folder,
                category: NodeKind::Dashboard,
                operation: NodeOperation::LookAtMe,
            }
        );

        let as_dashboard = FoundNode::new(record, NodeKind::Dashboard);
        let excitement = as_dashboard.look_at_me().expect("dashboard lookup");
        assert_eq!(excitement.parts(), ("Look at me! I am", "Dashboard", "!"));
        assert_eq!(excitement.to_string(), "Look at me! I am Dashboard !");
    }
}
