//! Process bootstrap: wire the store, run the module lifecycle, serve HTTP.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use catalog_db::{Database, DbModule};
use catalog_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use tokio::signal;

use crate::books::store::{BookStore, MemoryBookStore, MySqlBookStore};
use crate::modules;

/// Where book rows live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// MySQL at `database.url`
    #[default]
    MySql,
    /// Process memory; nothing survives a restart
    Memory,
}

/// Run until Ctrl+C or SIGTERM.
pub async fn run(settings: Settings, backend: Backend) -> anyhow::Result<()> {
    run_until(settings, backend, wait_for_shutdown()).await
}

/// Run until `shutdown` resolves, then stop modules and release the pool.
pub async fn run_until<F>(settings: Settings, backend: Backend, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (registry, database) = build_registry(&settings, backend)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;

    if let Some(database) = &database {
        if settings.database.auto_schema {
            database
                .ensure_schema(&registry.collect_schema())
                .await
                .context("schema bootstrap failed; set database.auto_schema = false to skip")?;
        }
    }

    registry.start_all(&ctx).await?;

    let served = catalog_http::start_server(&registry, &settings, shutdown).await;
    let stopped = registry.stop_all().await;

    served?;
    stopped?;
    tracing::info!("catalog-app shut down cleanly");
    Ok(())
}

/// Build the registry for `backend`, returning the pool when one was opened.
pub fn build_registry(
    settings: &Settings,
    backend: Backend,
) -> anyhow::Result<(ModuleRegistry, Option<Database>)> {
    let mut registry = ModuleRegistry::new();

    let (store, database): (Arc<dyn BookStore>, Option<Database>) = match backend {
        Backend::MySql => {
            let database = Database::connect_lazy(&settings.database)?;
            registry.register_core(Arc::new(DbModule::new(database.clone())));
            (Arc::new(MySqlBookStore::new(database.clone())), Some(database))
        }
        Backend::Memory => {
            tracing::warn!("using in-memory book store; data is lost on exit");
            (Arc::new(MemoryBookStore::new()), None)
        }
    };

    modules::register_all(&mut registry, store);
    Ok((registry, database))
}

/// Wait for termination signals (Ctrl+C, SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(%e, "Error handling Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut handler) => {
                handler.recv().await;
            }
            Err(e) => {
                tracing::error!(%e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, initiating graceful shutdown");
}
