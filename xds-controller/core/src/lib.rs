//! Core data model for the xDS controller.
//!
//! These types describe the *desired* proxy configuration -- listeners,
//! routes, clusters, endpoints, and authenticators -- independently of how
//! that configuration is expressed on disk and of the Envoy resource
//! representation it compiles into. The configuration schema
//! (`xds-controller-config`) produces these entities and the index
//! (`xds-controller-index`) owns them between reloads.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod entity;
mod request_match;
mod revision;

pub use self::{
    entity::{Authenticator, Cluster, Endpoint, EntitySet, JwksSource, Listener, Route},
    request_match::{HeaderMatch, RequestMatch, Rewrite},
    revision::Revision,
};
