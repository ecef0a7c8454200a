//! Configuration for Qdrant virtual users and load runs.
//!
//! Configuration is plain data passed at construction time; there is no global
//! state. A [`LoadConfig`] can be read from a TOML file:
//!
//! ```toml
//! [qdrant]
//! url = "http://localhost:6334"
//! collection_name = "load_test_collection"
//! timeout_secs = 60
//!
//! [qdrant.vectors]
//! size = 128
//! distance = "cosine"
//!
//! [run]
//! users = 10
//! run_time_secs = 60
//! ```
//!
//! Environment variables listed in the `ENV_*` constants override file values.

use crate::error::{LoadgenError, Result};
use qdrant_client::qdrant::Distance;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Default Qdrant endpoint. The client speaks gRPC, served on 6334.
pub const DEFAULT_URL: &str = "http://localhost:6334";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// Environment variable names
pub const ENV_QDRANT_URL: &str = "QDRANT_URL";
pub const ENV_QDRANT_API_KEY: &str = "QDRANT_API_KEY";
pub const ENV_QDRANT_COLLECTION: &str = "QDRANT_COLLECTION";
pub const ENV_QDRANT_TIMEOUT_SECS: &str = "QDRANT_TIMEOUT_SECS";
pub const ENV_USERS: &str = "LOADGEN_USERS";
pub const ENV_RUN_TIME_SECS: &str = "LOADGEN_RUN_TIME_SECS";

/// Distance metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    Euclid,
    Dot,
    Manhattan,
}

impl From<DistanceMetric> for Distance {
    fn from(metric: DistanceMetric) -> Self {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Euclid => Distance::Euclid,
            DistanceMetric::Dot => Distance::Dot,
            DistanceMetric::Manhattan => Distance::Manhattan,
        }
    }
}

/// Vector-space parameters used when provisioning a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorSpace {
    /// Vector dimensionality
    pub size: u64,
    /// Distance metric
    pub distance: DistanceMetric,
}

impl VectorSpace {
    pub fn new(size: u64, distance: DistanceMetric) -> Self {
        Self { size, distance }
    }
}

/// Extra options forwarded to the Qdrant client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Connection establishment timeout
    pub connect_timeout_secs: Option<u64>,
    /// Keep the gRPC channel alive while idle
    pub keep_alive_while_idle: bool,
    /// Check client/server version compatibility on connect
    pub check_compatibility: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: None,
            keep_alive_while_idle: false,
            check_compatibility: true,
        }
    }
}

/// HNSW index overrides for collection creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Number of edges per node
    pub m: u64,
    /// Number of neighbors to consider during construction
    pub ef_construct: u64,
    /// Switch to HNSW after this many vectors
    pub full_scan_threshold: u64,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construct: 100,
            full_scan_threshold: 10000,
        }
    }
}

/// Extra options forwarded to collection creation. Unset fields keep the
/// server defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionOptions {
    pub shard_number: Option<u32>,
    pub replication_factor: Option<u32>,
    pub on_disk_payload: Option<bool>,
    /// Keep original vectors on disk instead of in memory
    pub on_disk_vectors: Option<bool>,
    pub hnsw: Option<HnswConfig>,
}

/// Connection configuration for a Qdrant virtual user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantUserConfig {
    /// Qdrant endpoint URL
    pub url: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Collection every operation targets
    pub collection_name: Option<String>,
    /// Provision the collection with these parameters when set
    pub vectors: Option<VectorSpace>,
    pub client: ClientOptions,
    pub collection: CollectionOptions,
}

impl Default for QdrantUserConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            collection_name: None,
            vectors: None,
            client: ClientOptions::default(),
            collection: CollectionOptions::default(),
        }
    }
}

impl QdrantUserConfig {
    pub fn new(url: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            collection_name: Some(collection_name.into()),
            ..Default::default()
        }
    }

    pub fn with_vectors(mut self, vectors: VectorSpace) -> Self {
        self.vectors = Some(vectors);
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Collection name, rejecting a missing or blank value.
    ///
    /// # Errors
    ///
    /// Returns [`LoadgenError::Config`] if no collection name is configured
    pub fn require_collection(&self) -> Result<&str> {
        match self.collection_name.as_deref() {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(LoadgenError::Config(
                "'collection_name' must be provided for QdrantUser".to_string(),
            )),
        }
    }
}

/// Run-level settings for the bundled runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Number of concurrent virtual users
    pub users: usize,
    /// Total run time in seconds
    pub run_time_secs: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            users: 1,
            run_time_secs: 30,
        }
    }
}

impl RunSettings {
    pub fn run_time(&self) -> Duration {
        Duration::from_secs(self.run_time_secs)
    }
}

/// Complete configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub qdrant: QdrantUserConfig,
    pub run: RunSettings,
}

impl LoadConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = tokio::fs::read_to_string(path).await?;
        let mut config: Self = toml::from_str(&content)?;

        config.merge_env_vars()?;
        config.validate()?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save configuration as pretty TOML
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or written
    pub async fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Merge environment variable overrides into the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn merge_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_QDRANT_URL) {
            debug!("Overriding Qdrant URL from environment: {}", url);
            self.qdrant.url = url;
        }

        if let Some(api_key) = lookup(ENV_QDRANT_API_KEY) {
            debug!("Overriding Qdrant API key from environment");
            self.qdrant.api_key = Some(api_key);
        }

        if let Some(collection) = lookup(ENV_QDRANT_COLLECTION) {
            debug!("Overriding collection from environment: {}", collection);
            self.qdrant.collection_name = Some(collection);
        }

        if let Some(timeout) = lookup(ENV_QDRANT_TIMEOUT_SECS) {
            self.qdrant.timeout_secs = timeout.parse().map_err(|e| {
                LoadgenError::Config(format!("Invalid {} in environment: {}", ENV_QDRANT_TIMEOUT_SECS, e))
            })?;
        }

        if let Some(users) = lookup(ENV_USERS) {
            self.run.users = users.parse().map_err(|e| {
                LoadgenError::Config(format!("Invalid {} in environment: {}", ENV_USERS, e))
            })?;
        }

        if let Some(run_time) = lookup(ENV_RUN_TIME_SECS) {
            self.run.run_time_secs = run_time.parse().map_err(|e| {
                LoadgenError::Config(format!("Invalid {} in environment: {}", ENV_RUN_TIME_SECS, e))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration
    ///
    /// The collection name is checked later, at user construction, so a
    /// file may leave it to the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<()> {
        if self.qdrant.url.trim().is_empty() {
            return Err(LoadgenError::Config("Qdrant URL must not be empty".to_string()));
        }

        if self.qdrant.timeout_secs == 0 {
            return Err(LoadgenError::Config("timeout_secs must be greater than 0".to_string()));
        }

        if let Some(vectors) = &self.qdrant.vectors {
            if vectors.size == 0 {
                return Err(LoadgenError::Config("vector size must be greater than 0".to_string()));
            }
        }

        if self.run.users == 0 {
            return Err(LoadgenError::Config("users must be at least 1".to_string()));
        }

        Ok(())
    }
}
