//! MySQL connection handle, schema bootstrap and the `db` core module.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use catalog_kernel::settings::DatabaseSettings;
use catalog_kernel::{InitCtx, Module, SchemaStatement};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

/// Shared database handle.
///
/// Cloning is cheap; all clones share the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: MySqlPool,
}

impl Database {
    /// Build the pool without opening a connection.
    ///
    /// Connections are established on first use, so the service can come up
    /// while MySQL is still unreachable and report that per request.
    pub fn connect_lazy(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
            .connect_lazy(&settings.url)
            .with_context(|| "invalid database url")?;

        tracing::info!(
            target: "catalog-db",
            max_connections = settings.max_connections,
            "database pool configured"
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database ping failed")?;
        Ok(())
    }

    /// Run every statement in order, one DDL statement per entry.
    /// Statements are expected to be idempotent.
    pub async fn ensure_schema(
        &self,
        statements: &[(String, SchemaStatement)],
    ) -> anyhow::Result<()> {
        for (module, statement) in statements {
            tracing::info!(
                target: "catalog-db",
                module = %module,
                statement = statement.id,
                "applying schema statement"
            );

            sqlx::query(statement.ddl)
                .execute(&self.pool)
                .await
                .with_context(|| {
                    format!(
                        "failed to apply schema '{}' for module '{}'",
                        statement.id, module
                    )
                })?;
        }
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Whether the error means the database could not be reached, as opposed to
/// a query the database rejected.
pub fn is_unavailable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
    )
}

/// Core module owning the database pool lifecycle.
pub struct DbModule {
    database: Database,
}

impl DbModule {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Module for DbModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        match self.database.ping().await {
            Ok(()) => tracing::info!(target: "catalog-db", "database reachable"),
            Err(err) => tracing::warn!(
                target: "catalog-db",
                error = %err,
                "database unreachable at startup; requests will fail until it recovers"
            ),
        }
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.database.close().await;
        tracing::info!(target: "catalog-db", "database pool closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_settings() -> DatabaseSettings {
        DatabaseSettings {
            url: "mysql://root@127.0.0.1:1/catalog".to_string(),
            acquire_timeout_ms: 300,
            ..DatabaseSettings::default()
        }
    }

    #[test]
    fn malformed_url_is_rejected() {
        let settings = DatabaseSettings {
            url: "not a url".to_string(),
            ..DatabaseSettings::default()
        };
        assert!(Database::connect_lazy(&settings).is_err());
    }

    #[tokio::test]
    async fn ping_fails_against_unreachable_server() {
        let database = Database::connect_lazy(&unreachable_settings()).unwrap();
        assert!(database.ping().await.is_err());
    }

    #[tokio::test]
    async fn module_init_tolerates_unreachable_server() {
        let module = DbModule::new(Database::connect_lazy(&unreachable_settings()).unwrap());
        let settings = catalog_kernel::settings::Settings::default();
        let ctx = InitCtx { settings: &settings };

        module.init(&ctx).await.unwrap();
        module.stop().await.unwrap();
        assert!(module.database.pool().is_closed());
    }

    #[test]
    fn connectivity_errors_are_classified_as_unavailable() {
        assert!(is_unavailable(&sqlx::Error::PoolTimedOut));
        assert!(is_unavailable(&sqlx::Error::PoolClosed));
        assert!(!is_unavailable(&sqlx::Error::RowNotFound));
    }
}
