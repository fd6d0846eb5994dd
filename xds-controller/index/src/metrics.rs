use crate::reload::EventKind;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, gauge::Gauge},
    registry::Registry,
};
use xds_controller_core::Revision;

/// Reload and index metrics, registered once at startup and updated by the
/// reloader.
pub struct ReloadMetrics {
    reloads: Family<EventLabels, Counter>,
    reload_errors: Family<EventLabels, Counter>,
    revision: Gauge,
    index_size: Family<KindLabels, Gauge>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct EventLabels {
    event: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    kind: String,
}

// === impl ReloadMetrics ===

impl ReloadMetrics {
    pub fn register(prom: &mut Registry) -> Self {
        let reloads = Family::default();
        prom.register(
            "reloads",
            "Count of attempted configuration reloads",
            reloads.clone(),
        );

        let reload_errors = Family::default();
        prom.register(
            "reload_errors",
            "Count of configuration reloads that failed",
            reload_errors.clone(),
        );

        let revision = Gauge::default();
        prom.register(
            "snapshot_revision",
            "Revision of the most recently published snapshot",
            revision.clone(),
        );

        let index_size = Family::default();
        prom.register(
            "index_size",
            "Gauge of the number of entities in the index",
            index_size.clone(),
        );

        Self {
            reloads,
            reload_errors,
            revision,
            index_size,
        }
    }

    pub(crate) fn attempt(&self, kind: EventKind) {
        self.reloads
            .get_or_create(&EventLabels {
                event: kind.as_str().to_string(),
            })
            .inc();
    }

    pub(crate) fn failed(&self, kind: EventKind) {
        self.reload_errors
            .get_or_create(&EventLabels {
                event: kind.as_str().to_string(),
            })
            .inc();
    }

    pub(crate) fn published(
        &self,
        revision: Revision,
        (listeners, routes, clusters, endpoints, authenticators): (
            usize,
            usize,
            usize,
            usize,
            usize,
        ),
    ) {
        self.revision.set(revision.as_u64() as i64);
        for (kind, size) in [
            ("listener", listeners),
            ("route", routes),
            ("cluster", clusters),
            ("endpoint", endpoints),
            ("authenticator", authenticators),
        ] {
            self.index_size
                .get_or_create(&KindLabels {
                    kind: kind.to_string(),
                })
                .set(size as i64);
        }
    }
}
