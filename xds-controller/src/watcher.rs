use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::mpsc;
use xds_controller_index::{EventKind, ReloadEvent};

/// Starts watching the configuration file, translating filesystem
/// notifications into reload events on `tx`.
///
/// The returned watcher must be kept alive for as long as events are wanted;
/// dropping it (or the sender side closing) ends the stream.
pub fn spawn(
    path: &Path,
    tx: mpsc::UnboundedSender<ReloadEvent>,
) -> Result<RecommendedWatcher, notify::Error> {
    let target = path.to_path_buf();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let kind = if event.kind.is_create() {
                    EventKind::Create
                } else if event.kind.is_modify() {
                    EventKind::Update
                } else if event.kind.is_remove() {
                    EventKind::Delete
                } else {
                    return;
                };
                let _ = tx.send(ReloadEvent {
                    kind,
                    path: target.clone(),
                });
            }
            Err(error) => tracing::warn!(%error, "configuration watch error"),
        },
        Config::default(),
    )?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    tracing::info!(path = %path.display(), "watching configuration");
    Ok(watcher)
}
