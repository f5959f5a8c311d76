//! Relay configuration
//!
//! Loaded from a TOML file; every section and field has a default so a
//! missing file or empty document yields a runnable local configuration.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use courier_audit::{AuditStore, FileAuditStore, MemoryAuditStore};
use courier_common::audit::AuditConfig;
use courier_metrics::MetricsConfig;
use courier_publish::PublisherConfig;
use serde::Deserialize;
use thiserror::Error;

/// Top-level relay configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Batch publisher (target queue, group size, retry, breaker)
    #[serde(default)]
    pub publisher: PublisherConfig,

    /// Durable audit store backend
    #[serde(default)]
    pub audit_store: AuditStoreConfig,

    /// Audit event logging (mirrored to the log stream)
    #[serde(default)]
    pub audit_log: AuditConfig,

    /// Metrics collection and export
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Audit store backend selection
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum AuditStoreConfig {
    /// In-memory store (transient; for local runs and tests)
    Memory {
        /// Optional record cap
        #[serde(default)]
        capacity: Option<usize>,
    },
    /// JSON-lines file store
    File {
        /// Path of the audit log file
        path: PathBuf,
    },
}

impl Default for AuditStoreConfig {
    fn default() -> Self {
        Self::Memory { capacity: None }
    }
}

impl AuditStoreConfig {
    /// Build the configured audit store
    ///
    /// # Errors
    /// If a file store's path cannot be prepared
    pub async fn build(&self) -> courier_audit::Result<Arc<dyn AuditStore>> {
        match self {
            Self::Memory { capacity: None } => Ok(Arc::new(MemoryAuditStore::new())),
            Self::Memory {
                capacity: Some(capacity),
            } => Ok(Arc::new(MemoryAuditStore::with_capacity(*capacity))),
            Self::File { path } => Ok(Arc::new(FileAuditStore::open(path.clone()).await?)),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// If the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }
}
