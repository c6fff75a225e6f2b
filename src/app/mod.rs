use crate::{cli, context, rest, storage};
use anyhow::{Context as AnyhowContext, Result};
use std::path::Path;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The running service: resolved configuration plus the storage handed to the REST layer.
pub struct App<S: storage::Storage = storage::SqliteStorage> {
    config: context::Context,
    storage: S,
    shutdown: CancellationToken,
}

impl App {
    /// Builds the app from CLI arguments, attaching the log file and preparing the database.
    pub fn from_cli() -> Result<App> {
        let cli = cli::parse();
        let ctx = context::Context::from_cli(&cli);

        crate::tracing::set_log_file(ctx.log_file.as_deref())
            .context("opening log file")?;
        log_startup_info(&ctx);

        let storage = init_storage(&ctx.data_dir, &ctx.db_path(), ctx.reset)?;

        Ok(App::new(ctx, storage))
    }
}

impl<S: storage::Storage + Clone + Send + Sync + 'static> App<S> {
    fn new(config: context::Context, storage: S) -> Self {
        Self {
            config,
            storage,
            shutdown: CancellationToken::new(),
        }
    }

    pub async fn run_daemon(&self) -> Result<()> {
        let mut rest_handle = self.spawn_rest_server();
        self.wait_for_shutdown(&mut rest_handle).await
    }

    fn spawn_rest_server(&self) -> JoinHandle<()> {
        let addr = self.config.api_listen;
        let store = self.storage.clone();
        let token = self.shutdown.clone();

        tokio::spawn(async move {
            if let Err(e) = rest::serve(addr, store, token).await {
                log::error!("REST server failed: {:#}", e);
            }
        })
    }

    async fn wait_for_shutdown(&self, rest_task: &mut JoinHandle<()>) -> Result<()> {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => log::info!("🧨 Ctrl-C received, shutting down..."),
            _ = &mut *rest_task => log::error!("REST task exited unexpectedly"),
        }

        self.shutdown.cancel();

        // A JoinHandle that already completed inside select! must not be polled again.
        if !rest_task.is_finished() {
            let _ = rest_task.await;
        }

        log::info!("✅ Shutdown complete");
        Ok(())
    }
}

fn log_startup_info(ctx: &context::Context) {
    log::info!("🚀 Starting autoservice");
    log::info!("📂 Data dir: {}", ctx.data_dir.to_string_lossy());
    log::info!("🌐 REST API: http://{}", ctx.api_listen);
    if let Some(path) = ctx.log_file.as_deref() {
        log::info!("📝 Log file: {}", path.to_string_lossy());
    }
}

fn init_storage(data_dir: &Path, db_path: &Path, reset: bool) -> Result<storage::SqliteStorage> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let sqlite = storage::SqliteStorage::new(db_path);
    if reset {
        log::warn!("♻️ Resetting database {}", db_path.display());
        sqlite.reset_all().context("resetting storage")?;
    }
    sqlite.init().context("initializing storage")?;

    Ok(sqlite)
}

pub async fn run() -> Result<()> {
    let app = App::from_cli()?;
    app.run_daemon().await
}
