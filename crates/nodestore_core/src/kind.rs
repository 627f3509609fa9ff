//! Node kind hierarchy and per-kind query configuration.
//!
//! # Responsibility
//! - Define the closed set of node kinds and their discriminator strings.
//! - Own the kind hierarchy (`Node -> Folder -> Dashboard`, `Node -> Project|Data|Analysis`).
//! - Derive each kind's fixed predicate from the hierarchy.
//!
//! # Invariants
//! - Every kind except `Node` has exactly one parent.
//! - A kind's fixed predicate matches its own discriminator and every
//!   descendant discriminator, and nothing else.
//! - `Node` has no fixed predicate and therefore matches all records.
//! - `Dashboard` is the only singleton kind.

use crate::query::predicate::{Field, Predicate};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Discriminator of a stored node and entry point for kind-scoped lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Base kind. Lookups through it are unscoped.
    Node,
    /// Grouping kind; also matches dashboards.
    Folder,
    /// Singleton folder specialization.
    Dashboard,
    Project,
    Data,
    Analysis,
}

impl NodeKind {
    /// Every kind, parents before children.
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Node,
        NodeKind::Folder,
        NodeKind::Dashboard,
        NodeKind::Project,
        NodeKind::Data,
        NodeKind::Analysis,
    ];

    /// Stable discriminator persisted in `nodes.category`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Folder => "folder",
            Self::Dashboard => "dashboard",
            Self::Project => "project",
            Self::Data => "data",
            Self::Analysis => "analysis",
        }
    }

    /// Parses a persisted discriminator. Matching is exact.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "node" => Some(Self::Node),
            "folder" => Some(Self::Folder),
            "dashboard" => Some(Self::Dashboard),
            "project" => Some(Self::Project),
            "data" => Some(Self::Data),
            "analysis" => Some(Self::Analysis),
            _ => None,
        }
    }

    /// Direct parent in the hierarchy.
    pub fn parent(self) -> Option<Self> {
        match self {
            Self::Node => None,
            Self::Dashboard => Some(Self::Folder),
            Self::Folder | Self::Project | Self::Data | Self::Analysis => Some(Self::Node),
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query and creation configuration for one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct KindSpec {
    pub kind: NodeKind,
    /// Value stamped into `category` by this kind's constructor.
    pub discriminator: &'static str,
    pub parent: Option<NodeKind>,
    /// Filter intersected with every query issued through this kind.
    pub fixed_predicate: Option<Predicate>,
    /// At most one persisted record of this kind may exist.
    pub singleton: bool,
}

/// Registry of all kind specs, resolved once per process.
#[derive(Debug)]
pub struct KindRegistry {
    specs: Vec<KindSpec>,
}

static KIND_REGISTRY: Lazy<KindRegistry> = Lazy::new(KindRegistry::build);

/// Returns the process-wide kind registry.
pub fn registry() -> &'static KindRegistry {
    &KIND_REGISTRY
}

impl KindRegistry {
    fn build() -> Self {
        let mut registry = Self {
            specs: NodeKind::ALL
                .iter()
                .map(|&kind| KindSpec {
                    kind,
                    discriminator: kind.as_str(),
                    parent: kind.parent(),
                    fixed_predicate: None,
                    singleton: kind == NodeKind::Dashboard,
                })
                .collect(),
        };

        let fixed: Vec<Option<Predicate>> = NodeKind::ALL
            .iter()
            .map(|&kind| registry.derive_fixed_predicate(kind))
            .collect();
        for (spec, predicate) in registry.specs.iter_mut().zip(fixed) {
            spec.fixed_predicate = predicate;
        }
        registry
    }

    // Root kinds are unscoped; any other kind matches its family's discriminators.
    fn derive_fixed_predicate(&self, kind: NodeKind) -> Option<Predicate> {
        if self.spec(kind).parent.is_none() {
            return None;
        }
        self.family(kind)
            .into_iter()
            .map(|member| Predicate::eq(Field::Category, self.spec(member).discriminator))
            .reduce(|acc, next| acc | next)
    }

    /// Returns the spec for `kind`.
    pub fn spec(&self, kind: NodeKind) -> &KindSpec {
        // `specs` follows `NodeKind::ALL`, which follows declaration order.
        &self.specs[kind as usize]
    }

    /// Fixed predicate for `kind`; `None` means unscoped.
    pub fn fixed_predicate(&self, kind: NodeKind) -> Option<&Predicate> {
        self.spec(kind).fixed_predicate.as_ref()
    }

    /// Kinds whose creation is guarded by the singleton invariant.
    pub fn singleton_kinds(&self) -> impl Iterator<Item = NodeKind> + '_ {
        self.specs
            .iter()
            .filter(|spec| spec.singleton)
            .map(|spec| spec.kind)
    }

    /// Ancestors of `kind`, nearest first. Does not include `kind` itself.
    pub fn ancestors(&self, kind: NodeKind) -> Vec<NodeKind> {
        let mut chain = Vec::new();
        let mut current = self.spec(kind).parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.spec(parent).parent;
        }
        chain
    }

    /// Whether `kind` is `ancestor` or one of its descendants.
    pub fn is_subkind_of(&self, kind: NodeKind, ancestor: NodeKind) -> bool {
        kind == ancestor || self.ancestors(kind).contains(&ancestor)
    }

    /// `kind` plus every descendant kind, in declaration order.
    pub fn family(&self, kind: NodeKind) -> Vec<NodeKind> {
        NodeKind::ALL
            .iter()
            .copied()
            .filter(|candidate| self.is_subkind_of(*candidate, kind))
            .collect()
    }
}
