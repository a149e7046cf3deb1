use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::db::KeyValueStore;

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Directory for the file-backed store
    #[arg(long, global = true, env = "ATTENDANCE_DATA_DIR", default_value = ".attendance")]
    pub data_dir: PathBuf,
    /// Keep subjects in Postgres instead of the data directory
    #[arg(long, global = true, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

impl Settings {
    pub async fn connect_pool(&self) -> anyhow::Result<PgPool> {
        let database_url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set to use the Postgres store")?;

        PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")
    }

    pub async fn backend(&self) -> anyhow::Result<KeyValueStore> {
        if self.database_url.is_some() {
            info!("using postgres store");
            return Ok(KeyValueStore::Postgres(self.connect_pool().await?));
        }
        info!(dir = %self.data_dir.display(), "using file store");
        Ok(KeyValueStore::file(&self.data_dir))
    }
}
