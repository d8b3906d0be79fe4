//! Client configuration
//!
//! Values come from command-line flags, falling back to `ELEMENTS_*` environment
//! variables (a `.env` file is loaded at startup) and then to defaults.

use crate::http::{HttpStore, DEFAULT_BASE_URL};
use anyhow::Result;
use clap::Args;
use element_manager_core::{ElementManager, Notifier, ValidationProfile};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Args)]
pub struct ClientArgs {
    /// Collection endpoint of the object catalog
    #[arg(long, env = "ELEMENTS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "ELEMENTS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Draft validation profile: price-only or strict
    #[arg(long, env = "ELEMENTS_VALIDATION", default_value = "price-only")]
    pub validation: ValidationProfile,

    /// Delete without asking for confirmation
    #[arg(long, short = 'y', env = "ELEMENTS_ASSUME_YES")]
    pub assume_yes: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub validation: ValidationProfile,
    pub confirm_deletes: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            validation: ValidationProfile::default(),
            confirm_deletes: true,
        }
    }
}

impl From<ClientArgs> for ClientConfig {
    fn from(args: ClientArgs) -> Self {
        Self {
            base_url: args.base_url,
            timeout: Duration::from_secs(args.timeout_secs),
            validation: args.validation,
            confirm_deletes: !args.assume_yes,
        }
    }
}

impl ClientConfig {
    /// Manager over the HTTP catalog described by this config.
    pub fn build_manager(&self, notifier: Arc<dyn Notifier>) -> Result<ElementManager> {
        let store = HttpStore::new(&self.base_url, self.timeout)?;
        debug!(base_url = %store.base_url(), timeout = ?self.timeout, "catalog client ready");
        Ok(
            ElementManager::new(Arc::new(store), notifier, self.validation)
                .with_confirm_deletes(self.confirm_deletes),
        )
    }
}
