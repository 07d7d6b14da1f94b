//! # Storage Module
//!
//! Persistence for expenses and savings goals behind the [`ExpenseStore`]
//! trait. Two adapters exist and configuration picks one at startup:
//!
//! - **remote**: hosted PostgREST tables, the normal multi-device mode
//! - **local**: per-user CSV/YAML snapshot files for local-only use
//!
//! The domain layer never knows which one it is talking to.

pub mod local;
pub mod remote;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub use local::LocalSnapshotStore;
pub use remote::RestStore;
pub use traits::ExpenseStore;

use crate::backend::domain::{BudgetError, CalendarTimezone};
use crate::config::StorageConfig;

/// Build the store selected by `config`
pub fn build_store(
    config: &StorageConfig,
    timezone: CalendarTimezone,
) -> Result<Arc<dyn ExpenseStore>, BudgetError> {
    match config {
        StorageConfig::Local { data_dir } => {
            info!("Using local snapshot storage in {}", data_dir.display());
            let store = LocalSnapshotStore::new(data_dir)
                .map_err(|e| BudgetError::Config(format!("Cannot open data directory: {}", e)))?;
            Ok(Arc::new(store))
        }
        StorageConfig::Remote {
            base_url,
            api_key,
            timeout_secs,
        } => {
            info!("Using remote storage at {}", base_url);
            let store = RestStore::new(base_url, api_key, Duration::from_secs(*timeout_secs), timezone)?;
            Ok(Arc::new(store))
        }
    }
}
