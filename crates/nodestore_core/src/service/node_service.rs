//! Kind-scoped node use-cases.
//!
//! # Responsibility
//! - Resolve `find`/`find_one` through a lookup kind, intersecting the kind's
//!   fixed predicate with the caller's predicate.
//! - Enforce the singleton invariant before persisting singleton kinds.
//! - Return results typed with the lookup kind (see `capability`).
//!
//! # Invariants
//! - A record excluded by a kind's fixed predicate is unreachable through that
//!   kind, even when an ancestor kind can reach it.
//! - `create` builds, guards and persists in one call; nothing is persisted
//!   when the guard fails.
//! - The guard count and the store's unique index agree: either rejection
//!   surfaces as `DuplicateSingleton`.

use crate::capability::{CapabilityError, FoundNode};
use crate::kind::{registry, NodeKind};
use crate::model::node::{NodeFields, NodeId, NodeRecord};
use crate::query::predicate::{compose, Field, Predicate};
use crate::repo::node_repo::{NodeRepository, RepoError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, NodeServiceError>;

/// Service error for node use-cases.
#[derive(Debug)]
pub enum NodeServiceError {
    /// Second instance of a singleton kind.
    DuplicateSingleton(String),
    /// Single-result lookup matched nothing.
    NotFound(NodeKind),
    /// Single-result lookup matched more than one record.
    MultipleResults { kind: NodeKind, count: usize },
    /// Operation not exposed through the lookup kind.
    UnsupportedOperation(CapabilityError),
    Repo(RepoError),
}

impl Display for NodeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSingleton(message) => write!(f, "{message}"),
            Self::NotFound(kind) => write!(f, "no {kind} node matches the query"),
            Self::MultipleResults { kind, count } => {
                write!(f, "expected one {kind} node, query matched {count}")
            }
            Self::UnsupportedOperation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NodeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnsupportedOperation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NodeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::SingletonConflict(kind) => {
                Self::DuplicateSingleton(singleton_message(kind))
            }
            other => Self::Repo(other),
        }
    }
}

impl From<CapabilityError> for NodeServiceError {
    fn from(value: CapabilityError) -> Self {
        Self::UnsupportedOperation(value)
    }
}

/// Lazy, restartable result of `NodeService::find`.
///
/// Holds only the composed predicate; every accessor re-executes against the
/// store, so repeated calls observe the store's current state.
pub struct NodeQuery<'s, R: NodeRepository> {
    repo: &'s R,
    kind: NodeKind,
    predicate: Option<Predicate>,
}

impl<'s, R: NodeRepository> NodeQuery<'s, R> {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Effective predicate sent to the store. `None` is unconstrained.
    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// Narrows the query with another predicate (AND).
    pub fn and(self, predicate: Predicate) -> Self {
        let predicate = compose(self.predicate.as_ref(), Some(predicate));
        Self {
            repo: self.repo,
            kind: self.kind,
            predicate,
        }
    }

    pub fn fetch(&self) -> ServiceResult<Vec<FoundNode>> {
        let records = self.repo.query_nodes(self.predicate.as_ref())?;
        debug!(
            "event=node_find module=service status=ok kind={} filtered={} matched={}",
            self.kind,
            self.predicate.is_some(),
            records.len()
        );
        Ok(records
            .into_iter()
            .map(|record| FoundNode::new(record, self.kind))
            .collect())
    }

    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.repo.count_nodes(self.predicate.as_ref())?)
    }

    pub fn ids(&self) -> ServiceResult<Vec<NodeId>> {
        Ok(self
            .repo
            .query_nodes(self.predicate.as_ref())?
            .into_iter()
            .map(|record| record.id)
            .collect())
    }

    /// First match in insertion order, if any.
    pub fn first(&self) -> ServiceResult<Option<FoundNode>> {
        Ok(self.fetch()?.into_iter().next())
    }
}

/// Node service over an injected store handle.
pub struct NodeService<R: NodeRepository> {
    repo: R,
}

impl<R: NodeRepository> NodeService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Builds a `kind` record from `fields` and persists it.
    ///
    /// # Errors
    /// - `DuplicateSingleton` when `kind` is a singleton kind with a live
    ///   instance.
    pub fn create(&self, kind: NodeKind, fields: NodeFields) -> ServiceResult<FoundNode> {
        let record = NodeRecord::new(kind, fields);
        self.save(&record)?;
        Ok(FoundNode::new(record, kind))
    }

    /// Persists a record built in memory, running the singleton guard first.
    pub fn save(&self, record: &NodeRecord) -> ServiceResult<NodeId> {
        self.ensure_singleton_free(record.category)?;
        let id = match self.repo.insert_node(record) {
            Ok(id) => id,
            Err(err) => {
                if matches!(err, RepoError::SingletonConflict(_)) {
                    warn!(
                        "event=singleton_guard module=service status=rejected kind={} source=store",
                        record.category
                    );
                }
                return Err(err.into());
            }
        };
        info!(
            "event=node_create module=service status=ok kind={} id={id}",
            record.category
        );
        Ok(id)
    }

    /// Rewrites `name` and `number` of a persisted record.
    pub fn update(&self, record: &NodeRecord) -> ServiceResult<()> {
        Ok(self.repo.update_node(record)?)
    }

    /// Records reachable through `kind`, optionally narrowed by `predicate`.
    pub fn find(&self, kind: NodeKind, predicate: Option<Predicate>) -> NodeQuery<'_, R> {
        NodeQuery {
            repo: &self.repo,
            kind,
            predicate: compose(registry().fixed_predicate(kind), predicate),
        }
    }

    /// Exactly one record reachable through `kind`.
    ///
    /// # Errors
    /// - `NotFound` when nothing matches.
    /// - `MultipleResults` when more than one record matches.
    pub fn find_one(
        &self,
        kind: NodeKind,
        predicate: Option<Predicate>,
    ) -> ServiceResult<FoundNode> {
        let mut matches = self.find(kind, predicate).fetch()?;
        debug!(
            "event=node_find_one module=service kind={} matched={}",
            kind,
            matches.len()
        );
        match matches.len() {
            0 => Err(NodeServiceError::NotFound(kind)),
            1 => Ok(matches.remove(0)),
            count => Err(NodeServiceError::MultipleResults { kind, count }),
        }
    }

    /// Record `id`, if it is reachable through `kind`.
    pub fn get(&self, kind: NodeKind, id: NodeId) -> ServiceResult<FoundNode> {
        self.find_one(kind, Some(Predicate::eq(Field::Id, id.to_string())))
    }

    /// Removes every record from the collection.
    pub fn clear(&self) -> ServiceResult<usize> {
        let removed = self.repo.clear_nodes()?;
        info!("event=node_clear module=service status=ok removed={removed}");
        Ok(removed)
    }

    fn ensure_singleton_free(&self, kind: NodeKind) -> ServiceResult<()> {
        let spec = registry().spec(kind);
        if !spec.singleton {
            return Ok(());
        }

        let existing = self.repo.count_nodes(spec.fixed_predicate.as_ref())?;
        if existing != 0 {
            warn!(
                "event=singleton_guard module=service status=rejected kind={kind} existing={existing}"
            );
            return Err(NodeServiceError::DuplicateSingleton(singleton_message(kind)));
        }
        Ok(())
    }
}

fn singleton_message(kind: NodeKind) -> String {
    format!("only one {kind} may exist; a {kind} node is already stored")
}
