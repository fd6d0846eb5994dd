//! The declarative configuration document consumed by the reload
//! orchestrator.
//!
//! This crate owns the on-disk schema only: deserializing the YAML document
//! and checking the constraints that can be verified without looking at any
//! other document (unique names, a usable key source per authenticator, at
//! least one target cluster per route). Cross-entity reference integrity is
//! the index's job, since it is a property of the assembled entity set.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use xds_controller_core as model;
use xds_controller_core::{RequestMatch, Rewrite};

/// Top-level configuration document.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub name: String,
    pub spec: Spec,
    #[serde(default)]
    pub authenticators: Vec<AuthenticatorSpec>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Spec {
    #[serde(default)]
    pub listeners: Vec<ListenerSpec>,
    #[serde(default)]
    pub clusters: Vec<ClusterSpec>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenerSpec {
    pub name: String,
    pub address: String,
    pub port: u32,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    pub name: String,
    #[serde(default, rename = "match")]
    pub matches: RequestMatch,

    /// Target clusters. The current design routes to the first entry only.
    pub clusters: Vec<String>,

    #[serde(default)]
    pub grpc: bool,
    #[serde(default)]
    pub rewrite: Option<Rewrite>,
    #[serde(default)]
    pub external_auth: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterSpec {
    pub name: String,
    #[serde(default)]
    pub grpc: bool,
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointSpec {
    pub address: String,
    pub port: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthenticatorSpec {
    pub name: String,
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "aud", default)]
    pub audiences: Vec<String>,
    #[serde(default)]
    pub forward: bool,

    /// Symmetric secret for a locally inlined key set.
    #[serde(default)]
    pub secret: Option<String>,

    /// JWKS endpoint for proxy-side key fetching. Exactly one of `secret`
    /// and `jwks_url` must be set.
    #[serde(default)]
    pub jwks_url: Option<String>,

    #[serde(default, rename = "match")]
    pub matches: RequestMatch,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("duplicate listener name: {0}")]
    DuplicateListener(String),

    #[error("duplicate route name: {0}")]
    DuplicateRoute(String),

    #[error("duplicate cluster name: {0}")]
    DuplicateCluster(String),

    #[error("duplicate authenticator name: {0}")]
    DuplicateAuthenticator(String),

    #[error("route {0} has no target cluster")]
    RouteWithoutCluster(String),

    #[error("authenticator {0} must set exactly one of `secret` and `jwks_url`")]
    AmbiguousKeySource(String),
}

/// Reads and parses the configuration document at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// === impl Config ===

impl Config {
    /// Validates the document and flattens it into the core entity set.
    ///
    /// Routes declared inline under listeners are lifted into the global
    /// route collection; the listener keeps their names as references.
    pub fn into_entities(self) -> Result<model::EntitySet, ConfigError> {
        let mut entities = model::EntitySet::default();

        let mut listener_names = BTreeSet::new();
        let mut route_names = BTreeSet::new();
        for l in self.spec.listeners {
            if !listener_names.insert(l.name.clone()) {
                return Err(ConfigError::DuplicateListener(l.name));
            }

            let mut names = Vec::with_capacity(l.routes.len());
            for r in l.routes {
                if !route_names.insert(r.name.clone()) {
                    return Err(ConfigError::DuplicateRoute(r.name));
                }
                let cluster = r
                    .clusters
                    .into_iter()
                    .next()
                    .ok_or_else(|| ConfigError::RouteWithoutCluster(r.name.clone()))?;
                names.push(r.name.clone());
                entities.routes.push(model::Route {
                    name: r.name,
                    matches: r.matches,
                    cluster,
                    is_grpc: r.grpc,
                    rewrite: r.rewrite,
                    external_auth: r.external_auth.unwrap_or(false),
                });
            }

            entities.listeners.push(model::Listener {
                name: l.name,
                address: l.address,
                port: l.port,
                route_names: names,
            });
        }

        let mut cluster_names = BTreeSet::new();
        for c in self.spec.clusters {
            if !cluster_names.insert(c.name.clone()) {
                return Err(ConfigError::DuplicateCluster(c.name));
            }
            entities.clusters.push(model::Cluster {
                name: c.name,
                is_grpc: c.grpc,
                endpoints: c
                    .endpoints
                    .into_iter()
                    .map(|e| model::Endpoint {
                        host: e.address,
                        port: e.port,
                    })
                    .collect(),
            });
        }

        let mut auth_names = BTreeSet::new();
        for a in self.authenticators {
            if !auth_names.insert(a.name.clone()) {
                return Err(ConfigError::DuplicateAuthenticator(a.name));
            }
            let keys = match (a.secret, a.jwks_url) {
                (Some(secret), None) => model::JwksSource::Local { secret },
                (None, Some(url)) => model::JwksSource::Remote { url },
                _ => return Err(ConfigError::AmbiguousKeySource(a.name)),
            };
            entities.authenticators.push(model::Authenticator {
                name: a.name,
                issuer: a.issuer,
                audiences: a.audiences,
                forward: a.forward,
                keys,
                matches: a.matches,
            });
        }

        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
name: edge
spec:
  listeners:
    - name: l1
      address: 0.0.0.0
      port: 10000
      routes:
        - name: r1
          match:
            prefix: /api/
          clusters: [svcA]
        - name: r2
          match:
            path: /health
            headers:
              - name: x-canary
                value: "true"
          clusters: [svcB]
          grpc: true
          rewrite:
            prefix: /
          external_auth: true
  clusters:
    - name: svcA
      endpoints:
        - address: 10.0.0.1
          port: 8080
    - name: svcB
      grpc: true
      endpoints: []
authenticators:
  - name: partners
    iss: https://issuer.example.com
    aud: [edge]
    forward: true
    secret: super-secret
    match:
      prefix: /api/
"#;

    #[test]
    fn parses_and_flattens() {
        let config: Config = serde_yaml::from_str(DOC).unwrap();
        let entities = config.into_entities().unwrap();

        assert_eq!(entities.listeners.len(), 1);
        assert_eq!(
            entities.listeners[0].route_names,
            vec!["r1".to_string(), "r2".to_string()]
        );
        assert_eq!(entities.routes.len(), 2);
        assert_eq!(entities.routes[0].cluster, "svcA");
        assert!(!entities.routes[0].external_auth);
        assert!(entities.routes[1].external_auth);
        assert!(entities.routes[1].is_grpc);
        assert_eq!(entities.clusters.len(), 2);
        assert_eq!(entities.clusters[0].endpoints.len(), 1);
        assert_eq!(
            entities.authenticators[0].keys,
            model::JwksSource::Local {
                secret: "super-secret".to_string()
            }
        );
    }

    #[test]
    fn duplicate_route_names_rejected() {
        let mut config: Config = serde_yaml::from_str(DOC).unwrap();
        let dup = config.spec.listeners[0].routes[0].clone();
        config.spec.listeners[0].routes.push(dup);
        assert!(matches!(
            config.into_entities(),
            Err(ConfigError::DuplicateRoute(name)) if name == "r1"
        ));
    }

    #[test]
    fn route_without_cluster_rejected() {
        let mut config: Config = serde_yaml::from_str(DOC).unwrap();
        config.spec.listeners[0].routes[0].clusters.clear();
        assert!(matches!(
            config.into_entities(),
            Err(ConfigError::RouteWithoutCluster(name)) if name == "r1"
        ));
    }

    #[test]
    fn authenticator_needs_exactly_one_key_source() {
        let mut config: Config = serde_yaml::from_str(DOC).unwrap();
        config.authenticators[0].jwks_url = Some("https://keys.example.com/jwks".to_string());
        assert!(matches!(
            config.clone().into_entities(),
            Err(ConfigError::AmbiguousKeySource(_))
        ));

        config.authenticators[0].secret = None;
        let entities = config.into_entities().unwrap();
        assert!(matches!(
            entities.authenticators[0].keys,
            model::JwksSource::Remote { .. }
        ));
    }
}
