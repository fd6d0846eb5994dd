use crate::{admin, watcher};
use anyhow::Result;
use clap::Parser;
use prometheus_client::registry::Registry;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use xds_controller_index::{EventKind, ReloadEvent, ReloadMetrics, Reloader};

/// xDS control plane serving Envoy configuration compiled from a declarative
/// configuration file.
#[derive(Debug, Parser)]
#[clap(name = "xds-controller", version, about)]
pub struct Args {
    #[clap(long, env = "XDS_CONTROLLER_LOG", default_value = "xds_controller=info,warn")]
    log_level: String,

    #[clap(long, env = "XDS_CONTROLLER_LOG_FORMAT", default_value = "plain")]
    log_format: LogFormat,

    /// Configuration file to load and watch for changes.
    #[clap(long, env = "XDS_CONTROLLER_CONFIG", default_value = "config/xds.yaml")]
    config: PathBuf,

    /// Address of the HTTP admin server (readiness, snapshot version,
    /// metrics).
    #[clap(long, default_value = "0.0.0.0:9090")]
    admin_addr: SocketAddr,

    /// Attach a stdout access logger to every listener's connection manager.
    #[clap(long)]
    with_access_log: bool,
}

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Plain,
    Json,
}

// === impl Args ===

impl Args {
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    async fn run(self) -> Result<()> {
        self.init_logging()?;

        let mut registry = Registry::with_prefix("xds_controller");
        let metrics = ReloadMetrics::register(&mut registry);
        let registry = Arc::new(registry);

        let (reloader, snapshots, ready) = Reloader::new(self.with_access_log, metrics);

        // Seed the initial load, then watch the file for changes. The
        // watcher handle must outlive the loop.
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        events_tx
            .send(ReloadEvent {
                kind: EventKind::Create,
                path: self.config.clone(),
            })
            .expect("receiver is held by the reloader");
        let _watcher = watcher::spawn(&self.config, events_tx)?;

        let (close, drain) = drain::channel();
        let reload_task = tokio::spawn(reloader.run(events_rx, drain));

        let admin_addr = self.admin_addr;
        tokio::spawn(async move {
            if let Err(error) = admin::serve(admin_addr, ready, snapshots, registry).await {
                tracing::error!(%error, "admin server failed");
            }
        });

        let mut term =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT; shutting down"),
            _ = term.recv() => tracing::info!("received SIGTERM; shutting down"),
        }

        close.drain().await;
        reload_task.await?;
        Ok(())
    }

    fn init_logging(&self) -> Result<()> {
        let filter = tracing_subscriber::EnvFilter::try_new(&self.log_level)?;
        match self.log_format {
            LogFormat::Plain => tracing_subscriber::fmt().with_env_filter(filter).init(),
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init(),
        }
        Ok(())
    }
}
