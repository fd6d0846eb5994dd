use ahash::AHashMap as HashMap;
use xds_controller_core::{
    Authenticator, Cluster, Endpoint, EntitySet, Listener, Revision, Route,
};
use xds_controller_envoy::types::JwtAuthentication;
use xds_controller_envoy::{auth, cluster, listener, route, KeyError, Snapshot};

/// Holds the complete entity set between reloads.
///
/// The index is owned by a single writer and entirely reconstructed on each
/// reload; it is not designed for incremental mutation while serving.
/// [`Index::materialize`] is a pure function over the current contents: it
/// never retains references past the call and the returned snapshot shares
/// nothing with the live maps.
#[derive(Debug, Default)]
pub struct Index {
    listeners: HashMap<String, Listener>,
    routes: HashMap<String, Route>,
    clusters: HashMap<String, Cluster>,
    authenticators: HashMap<String, Authenticator>,
    with_access_log: bool,
}

/// A reference-integrity or key-material failure found while compiling the
/// entity set into resources.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("route {route} targets unknown cluster {cluster}")]
    UnknownCluster { route: String, cluster: String },

    #[error("listener {listener} references unknown route {route}")]
    UnknownRoute { listener: String, route: String },

    #[error(transparent)]
    Key(#[from] KeyError),
}

#[derive(Debug, thiserror::Error)]
#[error("endpoint {host}:{port} added to unknown cluster {cluster}")]
pub struct UnknownClusterError {
    pub cluster: String,
    pub host: String,
    pub port: u32,
}

// === impl Index ===

impl Index {
    pub fn new(with_access_log: bool) -> Self {
        Self {
            with_access_log,
            ..Self::default()
        }
    }

    /// Builds a fresh index from a parsed entity set.
    ///
    /// Endpoints run through [`Index::add_endpoint`] so they take the same
    /// existence-checked path as ad-hoc additions.
    pub fn from_entities(
        entities: EntitySet,
        with_access_log: bool,
    ) -> Result<Self, UnknownClusterError> {
        let mut index = Self::new(with_access_log);
        for mut c in entities.clusters {
            let endpoints = std::mem::take(&mut c.endpoints);
            let name = c.name.clone();
            index.add_cluster(c);
            for ep in endpoints {
                index.add_endpoint(&name, ep)?;
            }
        }
        for r in entities.routes {
            index.add_route(r);
        }
        for l in entities.listeners {
            index.add_listener(l);
        }
        for a in entities.authenticators {
            index.add_authenticator(a);
        }
        Ok(index)
    }

    pub fn add_listener(&mut self, listener: Listener) {
        self.listeners.insert(listener.name.clone(), listener);
    }

    pub fn remove_listener(&mut self, name: &str) {
        self.listeners.remove(name);
    }

    pub fn add_route(&mut self, route: Route) {
        self.routes.insert(route.name.clone(), route);
    }

    pub fn remove_route(&mut self, name: &str) {
        self.routes.remove(name);
    }

    pub fn add_cluster(&mut self, cluster: Cluster) {
        self.clusters.insert(cluster.name.clone(), cluster);
    }

    pub fn remove_cluster(&mut self, name: &str) {
        self.clusters.remove(name);
    }

    /// Appends an endpoint to an existing cluster's endpoint list.
    pub fn add_endpoint(
        &mut self,
        cluster: &str,
        endpoint: Endpoint,
    ) -> Result<(), UnknownClusterError> {
        match self.clusters.get_mut(cluster) {
            Some(c) => {
                c.endpoints.push(endpoint);
                Ok(())
            }
            None => Err(UnknownClusterError {
                cluster: cluster.to_string(),
                host: endpoint.host,
                port: endpoint.port,
            }),
        }
    }

    pub fn add_authenticator(&mut self, authenticator: Authenticator) {
        self.authenticators
            .insert(authenticator.name.clone(), authenticator);
    }

    pub fn remove_authenticator(&mut self, name: &str) {
        self.authenticators.remove(name);
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
        self.routes.clear();
        self.clusters.clear();
        self.authenticators.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
            && self.routes.is_empty()
            && self.clusters.is_empty()
            && self.authenticators.is_empty()
    }

    /// Entity counts per kind: (listeners, routes, clusters, endpoints,
    /// authenticators).
    pub fn counts(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.listeners.len(),
            self.routes.len(),
            self.clusters.len(),
            self.clusters.values().map(|c| c.endpoints.len()).sum(),
            self.authenticators.len(),
        )
    }

    /// Compiles the current entity set into the four resource families,
    /// tagged with `revision`.
    ///
    /// Entities are emitted sorted by name so recompiling an unchanged set
    /// yields identical output. Reference integrity is checked up front;
    /// nothing is emitted on failure.
    pub fn materialize(&self, revision: Revision) -> Result<Snapshot, CompileError> {
        let mut routes: Vec<&Route> = self.routes.values().collect();
        routes.sort_by(|a, b| a.name.cmp(&b.name));
        for r in &routes {
            if !self.clusters.contains_key(&r.cluster) {
                return Err(CompileError::UnknownCluster {
                    route: r.name.clone(),
                    cluster: r.cluster.clone(),
                });
            }
        }

        let mut listeners: Vec<&Listener> = self.listeners.values().collect();
        listeners.sort_by(|a, b| a.name.cmp(&b.name));
        for l in &listeners {
            for name in &l.route_names {
                if !self.routes.contains_key(name) {
                    return Err(CompileError::UnknownRoute {
                        listener: l.name.clone(),
                        route: name.clone(),
                    });
                }
            }
        }

        let mut clusters: Vec<&Cluster> = self.clusters.values().collect();
        clusters.sort_by(|a, b| a.name.cmp(&b.name));

        let authenticators: Vec<Authenticator> = {
            let mut auths: Vec<&Authenticator> = self.authenticators.values().collect();
            auths.sort_by(|a, b| a.name.cmp(&b.name));
            auths.into_iter().cloned().collect()
        };

        let jwt = JwtAuthentication {
            providers: auth::build_providers(&authenticators)?,
            rules: auth::build_rules(&authenticators),
        };

        Ok(Snapshot {
            version: revision.to_string(),
            clusters: clusters.iter().map(|c| cluster::make_cluster(c)).collect(),
            load_assignments: clusters
                .iter()
                .map(|c| cluster::make_load_assignment(&c.name, &c.endpoints))
                .collect(),
            route_configs: vec![route::make_route_config(&routes)],
            listeners: listeners
                .iter()
                .map(|l| {
                    listener::make_listener(l, route::ROUTE_CONFIG_NAME, self.with_access_log, &jwt)
                })
                .collect(),
        })
    }
}
