//! Wiring: build the configured backend and both stores on top of it.

use std::sync::Arc;

use anyhow::Context;
use configs::{AppConfig, LoggingConfig, StoreBackend, StoreConfig};
use migration::MigratorTrait;
use tracing::info;

use crate::expense_store::ExpenseStore;
use crate::pagination::PageLimits;
use crate::storage::{DocumentStore, JsonFileDocumentStore, MemoryDocumentStore, SeaOrmDocumentStore};
use crate::user_store::UserStore;

/// Both stores sharing one backend.
pub struct Stores {
    pub expenses: ExpenseStore<dyn DocumentStore>,
    pub users: UserStore<dyn DocumentStore>,
}

impl Stores {
    pub fn new(backend: Arc<dyn DocumentStore>, limits: PageLimits) -> Self {
        Self {
            expenses: ExpenseStore::new(backend.clone()).with_limits(limits),
            users: UserStore::new(backend).with_limits(limits),
        }
    }

    /// Load the configuration at `CONFIG_PATH` (defaults when absent) and
    /// build the stores from it.
    pub async fn from_env() -> anyhow::Result<Self> {
        let cfg = AppConfig::load_or_default().context("load configuration")?;
        Self::from_config(&cfg).await
    }

    /// Open the configured backend and build the stores on it.
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let backend = open_backend(&cfg.store).await?;
        Ok(Self::new(backend, PageLimits::from(&cfg.pagination)))
    }
}

/// Open the configured document store. Postgres is migrated before use.
pub async fn open_backend(cfg: &StoreConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let backend: Arc<dyn DocumentStore> = match cfg.backend {
        StoreBackend::Memory => Arc::new(MemoryDocumentStore::new()),
        StoreBackend::Json => JsonFileDocumentStore::new(&cfg.data_file)
            .await
            .with_context(|| format!("open json store {}", cfg.data_file))?,
        StoreBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            migration::Migrator::up(&db, None).await.context("migrate documents table")?;
            Arc::new(SeaOrmDocumentStore::new(db))
        }
    };
    info!(backend = ?cfg.backend, "document_store_ready");
    Ok(backend)
}

/// Install the tracing subscriber described by `cfg`.
pub fn init_logging(cfg: &LoggingConfig) {
    common::logging::init_logging(&cfg.format, cfg.level.as_deref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, new_expense};

    #[tokio::test]
    async fn memory_backend_from_default_config() -> Result<(), anyhow::Error> {
        let cfg = AppConfig::default();
        init_logging(&cfg.logging);
        let stores = Stores::from_config(&cfg).await?;
        let added = stores.expenses.add(new_expense("a@x.com", "2024-10-27", 10.0)).await?;
        assert_eq!(stores.expenses.get_by_user_email("a@x.com").await?, vec![added.strosek]);
        assert!(stores.users.get_by_email("a@x.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn config_file_from_env_selects_backend_and_limits() -> Result<(), anyhow::Error> {
        let id = uuid::Uuid::new_v4();
        let data = std::env::temp_dir().join(format!("stores_env_{id}.json"));
        let config = std::env::temp_dir().join(format!("stores_env_{id}.toml"));
        let toml = format!(
            "[store]\nbackend = \"json\"\ndata_file = \"{}\"\n[pagination]\ndefault_per_page = 2\nmax_per_page = 3\n",
            data.display()
        );
        tokio::fs::write(&config, toml).await?;
        std::env::set_var("CONFIG_PATH", &config);

        let stores = Stores::from_env().await?;
        for (i, day) in ["2024-10-01", "2024-10-02", "2024-10-03", "2024-10-04"].into_iter().enumerate() {
            stores.expenses.add_at(new_expense("a@x.com", day, 1.0), at(i as i64)).await?;
        }
        assert_eq!(stores.expenses.get_all(0, 0).await?.len(), 2);
        assert_eq!(stores.expenses.get_all(10, 0).await?.len(), 3);
        assert!(tokio::fs::metadata(&data).await.is_ok());

        std::env::remove_var("CONFIG_PATH");
        let _ = tokio::fs::remove_file(&data).await;
        let _ = tokio::fs::remove_file(&config).await;
        Ok(())
    }

    #[tokio::test]
    async fn json_backend_uses_the_configured_file() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("stores_{}.json", uuid::Uuid::new_v4()));
        let mut cfg = AppConfig::default();
        cfg.store.backend = StoreBackend::Json;
        cfg.store.data_file = tmp.display().to_string();

        let stores = Stores::from_config(&cfg).await?;
        stores.expenses.add(new_expense("a@x.com", "2024-10-27", 10.0)).await?;
        drop(stores);

        let reopened = Stores::from_config(&cfg).await?;
        assert_eq!(reopened.expenses.get_all(10, 0).await?.len(), 1);
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
