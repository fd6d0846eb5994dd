use crate::types::{Cluster, ClusterLoadAssignment, Listener, RouteConfiguration};
use serde::Serialize;
use std::collections::BTreeMap;

pub const CLUSTER_TYPE: &str = "type.googleapis.com/envoy.config.cluster.v3.Cluster";
pub const ENDPOINT_TYPE: &str =
    "type.googleapis.com/envoy.config.endpoint.v3.ClusterLoadAssignment";
pub const ROUTE_TYPE: &str = "type.googleapis.com/envoy.config.route.v3.RouteConfiguration";
pub const LISTENER_TYPE: &str = "type.googleapis.com/envoy.config.listener.v3.Listener";

/// A single protocol resource, tagged by family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Cluster(Cluster),
    LoadAssignment(ClusterLoadAssignment),
    RouteConfiguration(RouteConfiguration),
    Listener(Listener),
}

/// An internally consistent, versioned set of resource families.
///
/// Snapshots are fully-built, cache-independent values: once published they
/// share nothing with the index's live entity maps, so concurrent readers
/// can hold one while the writer compiles the next.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub version: String,
    pub clusters: Vec<Cluster>,
    pub load_assignments: Vec<ClusterLoadAssignment>,
    pub route_configs: Vec<RouteConfiguration>,
    pub listeners: Vec<Listener>,
}

// === impl Snapshot ===

impl Snapshot {
    /// A snapshot with no resources, as published after a `delete` event.
    pub fn empty(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            clusters: vec![],
            load_assignments: vec![],
            route_configs: vec![],
            listeners: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
            && self.load_assignments.is_empty()
            && self.route_configs.is_empty()
            && self.listeners.is_empty()
    }

    /// The resource families keyed by type identifier, in the shape consumed
    /// by the discovery protocol engine.
    pub fn resources(&self) -> BTreeMap<&'static str, Vec<Resource>> {
        let mut families = BTreeMap::new();
        families.insert(
            CLUSTER_TYPE,
            self.clusters.iter().cloned().map(Resource::Cluster).collect(),
        );
        families.insert(
            ENDPOINT_TYPE,
            self.load_assignments
                .iter()
                .cloned()
                .map(Resource::LoadAssignment)
                .collect(),
        );
        families.insert(
            ROUTE_TYPE,
            self.route_configs
                .iter()
                .cloned()
                .map(Resource::RouteConfiguration)
                .collect(),
        );
        families.insert(
            LISTENER_TYPE,
            self.listeners.iter().cloned().map(Resource::Listener).collect(),
        );
        families
    }
}
