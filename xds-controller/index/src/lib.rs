//! The resource cache and reload orchestration.
//!
//! The [`Index`] owns the entity maps between reloads and materializes them
//! into versioned Envoy resource snapshots. The [`Reloader`] owns an index
//! and drives the reload lifecycle: it consumes file events one at a time,
//! parses the referenced configuration, rebuilds a fresh index, and swaps the
//! published snapshot atomically over a watch channel. A failed reload of any
//! kind leaves the previously published snapshot authoritative.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod index;
mod metrics;
mod reload;


pub use self::{
    index::{CompileError, Index, UnknownClusterError},
    metrics::ReloadMetrics,
    reload::{EventKind, ReloadError, ReloadEvent, ReloadState, Reloader, SnapshotRx},
};
