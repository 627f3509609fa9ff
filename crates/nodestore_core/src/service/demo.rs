//! Demo hierarchy used by the CLI smoke run and integration tests.
//!
//! Seeds one record per folder-like kind plus a few leaf records, matching the
//! fixture the kind-scoped query behavior is specified against.

use crate::kind::NodeKind;
use crate::model::node::{NodeFields, NodeId};
use crate::repo::node_repo::NodeRepository;
use crate::service::node_service::{NodeService, ServiceResult};

/// Ids of the seeded demo records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSeed {
    pub folder: NodeId,
    pub dashboard: NodeId,
    pub projects: [NodeId; 2],
    pub data: [NodeId; 2],
    pub analysis: NodeId,
}

/// Seeds the demo hierarchy. Fails with `DuplicateSingleton` when a dashboard
/// already exists.
pub fn seed_demo_nodes<R: NodeRepository>(service: &NodeService<R>) -> ServiceResult<DemoSeed> {
    let folder = service.create(NodeKind::Folder, NodeFields::named("New Folder"))?;
    let dashboard = service.create(NodeKind::Dashboard, NodeFields::named("Dashboard"))?;
    let smarty = service.create(NodeKind::Project, NodeFields::named("Smarty"))?;
    let test_project = service.create(NodeKind::Project, NodeFields::named("Test Project"))?;
    let cool_data = service.create(NodeKind::Data, NodeFields::named("My Cool Data"))?;
    let raw_data = service.create(
        NodeKind::Data,
        NodeFields::named("My Raw Data").with_number(31),
    )?;
    let analysis = service.create(NodeKind::Analysis, NodeFields::default())?;

    Ok(DemoSeed {
        folder: folder.id(),
        dashboard: dashboard.id(),
        projects: [smarty.id(), test_project.id()],
        data: [cool_data.id(), raw_data.id()],
        analysis: analysis.id(),
    })
}
