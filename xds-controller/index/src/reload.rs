use crate::{CompileError, Index, ReloadMetrics, UnknownClusterError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use xds_controller_config::ConfigError;
use xds_controller_core::Revision;
use xds_controller_envoy::Snapshot;

/// A reload trigger. Only the path is consumed for create/update; delete
/// clears the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReloadEvent {
    pub kind: EventKind,
    pub path: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    Create,
    Update,
    Delete,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReloadState {
    Idle,
    Loading,
    Published,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Endpoint(#[from] UnknownClusterError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Receiver side of the snapshot store: always holds the most recently
/// published snapshot.
pub type SnapshotRx = watch::Receiver<Arc<Snapshot>>;

/// Owns the index and drives reloads: one event at a time, parse then
/// compile then publish, previous snapshot retained on any failure.
pub struct Reloader {
    index: Index,
    revision: Revision,
    state: ReloadState,
    with_access_log: bool,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    ready_tx: watch::Sender<bool>,
    metrics: ReloadMetrics,
}

// === impl EventKind ===

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

// === impl Reloader ===

impl Reloader {
    pub fn new(
        with_access_log: bool,
        metrics: ReloadMetrics,
    ) -> (Self, SnapshotRx, watch::Receiver<bool>) {
        let revision = Revision::default();
        let (snapshot_tx, snapshot_rx) =
            watch::channel(Arc::new(Snapshot::empty(revision.to_string())));
        let (ready_tx, ready_rx) = watch::channel(false);
        let reloader = Self {
            index: Index::new(with_access_log),
            revision,
            state: ReloadState::Idle,
            with_access_log,
            snapshot_tx,
            ready_tx,
            metrics,
        };
        (reloader, snapshot_rx, ready_rx)
    }

    pub fn state(&self) -> ReloadState {
        self.state
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Runs the reload loop until the event stream closes or shutdown is
    /// signaled. Events queued behind an in-flight reload are processed in
    /// order, never interleaved.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<ReloadEvent>,
        drain: drain::Watch,
    ) {
        let shutdown = drain.signaled();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let _ = self.handle_event(event);
                    }
                    None => {
                        tracing::debug!("event stream closed");
                        return;
                    }
                },

                _ = &mut shutdown => {
                    tracing::debug!("shutdown signaled");
                    return;
                }
            }
        }
    }

    /// Processes a single reload event, publishing the new snapshot on
    /// success.
    pub fn handle_event(&mut self, event: ReloadEvent) -> Result<Arc<Snapshot>, ReloadError> {
        self.state = ReloadState::Loading;
        self.metrics.attempt(event.kind);

        match self.try_reload(&event) {
            Ok(snapshot) => {
                self.state = ReloadState::Published;
                self.metrics.published(self.revision, self.index.counts());
                self.snapshot_tx.send_replace(snapshot.clone());
                self.ready_tx.send_replace(true);
                tracing::info!(
                    version = %snapshot.version,
                    kind = event.kind.as_str(),
                    path = %event.path.display(),
                    "published snapshot"
                );
                Ok(snapshot)
            }
            Err(error) => {
                self.state = ReloadState::Failed;
                self.metrics.failed(event.kind);
                tracing::warn!(
                    %error,
                    kind = event.kind.as_str(),
                    path = %event.path.display(),
                    "reload failed; previous snapshot retained"
                );
                Err(error)
            }
        }
    }

    fn try_reload(&mut self, event: &ReloadEvent) -> Result<Arc<Snapshot>, ReloadError> {
        let next = self.revision.next();

        match event.kind {
            // A removed configuration file empties the proxy rather than
            // failing the reload.
            EventKind::Delete => {
                self.index = Index::new(self.with_access_log);
                self.revision = next;
                Ok(Arc::new(Snapshot::empty(next.to_string())))
            }

            EventKind::Create | EventKind::Update => {
                let entities = xds_controller_config::load(&event.path)?.into_entities()?;
                for a in &entities.authenticators {
                    if a.matches.is_unconstrained() {
                        tracing::warn!(
                            authenticator = %a.name,
                            "authenticator match is unconstrained and applies to every request"
                        );
                    }
                }

                let index = Index::from_entities(entities, self.with_access_log)?;
                let snapshot = Arc::new(index.materialize(next)?);

                // The new entity set and revision only become current once
                // the whole reload has succeeded.
                self.index = index;
                self.revision = next;
                Ok(snapshot)
            }
        }
    }
}
