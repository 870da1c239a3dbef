//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `TILL_DATA_DIR` - Directory for the file-backed cart store (default: `.till`)
//! - `TILL_CART_KEY` - Storage key of the cart snapshot (default: `cart`)
//! - `TILL_TAX_RATE` - Tax rate as a fraction, `0` to `1` (default: `0`)
//! - `TILL_CATALOG_PATH` - JSON file with the product list
//! - `TILL_CATALOG_TTL_SECS` - Lifetime of cached product snapshots (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use till_core::TaxRate;

use crate::catalog::DEFAULT_CATALOG_TTL;
use crate::storage::DEFAULT_CART_KEY;

const DEFAULT_DATA_DIR: &str = ".till";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Directory holding the stored cart
    pub data_dir: PathBuf,
    /// Storage key of the cart snapshot
    pub cart_key: String,
    /// Tax applied to the subtotal
    pub tax_rate: TaxRate,
    /// Product list backing the catalog cache
    pub catalog_path: Option<PathBuf>,
    /// Lifetime of cached product snapshots
    pub catalog_ttl: Duration,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            cart_key: DEFAULT_CART_KEY.to_string(),
            tax_rate: TaxRate::ZERO,
            catalog_path: None,
            catalog_ttl: DEFAULT_CATALOG_TTL,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = PathBuf::from(
            lookup("TILL_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );
        let cart_key = lookup("TILL_CART_KEY").unwrap_or_else(|| DEFAULT_CART_KEY.to_string());
        if cart_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "TILL_CART_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let tax_rate = match lookup("TILL_TAX_RATE") {
            Some(raw) => raw.parse::<TaxRate>().map_err(|e| {
                ConfigError::InvalidEnvVar("TILL_TAX_RATE".to_string(), e.to_string())
            })?,
            None => TaxRate::ZERO,
        };

        let catalog_path = lookup("TILL_CATALOG_PATH").map(PathBuf::from);

        let catalog_ttl = match lookup("TILL_CATALOG_TTL_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|e| {
                ConfigError::InvalidEnvVar("TILL_CATALOG_TTL_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_CATALOG_TTL,
        };

        Ok(Self {
            data_dir,
            cart_key,
            tax_rate,
            catalog_path,
            catalog_ttl,
        })
    }

    /// The configured catalog path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `TILL_CATALOG_PATH` is unset.
    pub fn require_catalog_path(&self) -> Result<&PathBuf, ConfigError> {
        self.catalog_path
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("TILL_CATALOG_PATH".to_string()))
    }
}
