//! Per-tenant connection pools
//!
//! Each company keeps its ledger in its own MySQL database. The request
//! names the database; the registry hands out one lazily created pool per
//! database name and reuses it for every later request.

use std::{collections::HashMap, str::FromStr, time::Duration};

use shared::validate_dbase;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tokio::sync::RwLock;

use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
};

pub struct PoolRegistry {
    base: MySqlConnectOptions,
    settings: DatabaseConfig,
    pools: RwLock<HashMap<String, MySqlPool>>,
}

impl PoolRegistry {
    pub fn new(settings: &DatabaseConfig) -> AppResult<Self> {
        let base = MySqlConnectOptions::from_str(&settings.url)
            .map_err(|e| AppError::Configuration(format!("invalid database url: {}", e)))?;

        Ok(Self {
            base,
            settings: settings.clone(),
            pools: RwLock::new(HashMap::new()),
        })
    }

    /// Pool for a tenant database, created on first use
    pub async fn pool_for(&self, dbase: &str) -> AppResult<MySqlPool> {
        validate_dbase(dbase).map_err(|reason| {
            AppError::Configuration(format!("tenant database '{}': {}", dbase, reason))
        })?;

        if let Some(pool) = self.pools.read().await.get(dbase) {
            return Ok(pool.clone());
        }

        let mut pools = self.pools.write().await;
        // Another request may have created it while we waited for the lock
        if let Some(pool) = pools.get(dbase) {
            return Ok(pool.clone());
        }

        tracing::info!(dbase, "Creating tenant connection pool");
        let pool = MySqlPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .min_connections(self.settings.min_connections)
            .acquire_timeout(Duration::from_secs(self.settings.acquire_timeout_secs))
            .connect_lazy_with(self.base.clone().database(dbase));

        pools.insert(dbase.to_string(), pool.clone());
        Ok(pool)
    }

    /// Number of tenant pools created so far
    pub async fn tenant_count(&self) -> usize {
        self.pools.read().await.len()
    }
}
