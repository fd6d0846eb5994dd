//! Envoy v3 resource representation and the compiler producing it.
//!
//! The wire-level discovery engine is an external collaborator, so resources
//! here are plain serde-serializable values laid out like Envoy's proto-JSON
//! rather than generated protobuf messages. Every filter configuration is a
//! closed variant set validated at construction; nothing on the compile path
//! can fail at serialization time.
//!
//! The compiler functions are pure: they borrow entity views owned by the
//! index and return fully-built resource values with no aliasing back into
//! the caller's state.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod cluster;
pub mod listener;
pub mod matcher;
pub mod route;
mod snapshot;
pub mod types;

pub use self::{
    auth::KeyError,
    snapshot::{Resource, Snapshot, CLUSTER_TYPE, ENDPOINT_TYPE, LISTENER_TYPE, ROUTE_TYPE},
};
