//! Configuration schema and loading.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main SnapList configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Embedding generation settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Similarity search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Peer replication settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Local storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Embedding generation section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Fixed embedding dimension; every record in one index shares it.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Optional remote feature-extraction model. Absent means the
    /// deterministic fallback is always used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteEmbeddingConfig>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            remote: None,
        }
    }
}

/// Remote embedding model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEmbeddingConfig {
    /// Base URL of the embedding service.
    pub endpoint: String,

    /// Model identifier sent with each request.
    pub model: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_remote_timeout_ms")]
    pub timeout_ms: u64,
}

/// Similarity search section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of neighbors returned per search.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Similarity floor; results scoring below it are dropped.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
        }
    }
}

/// Peer replication section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Stable pseudonymous peer identity. Generated when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<String>,

    /// Upper bound on a single propagation attempt, in milliseconds.
    #[serde(default = "default_propagation_timeout_ms")]
    pub propagation_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            peer_id: None,
            propagation_timeout_ms: default_propagation_timeout_ms(),
        }
    }
}

/// Local storage section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the vector index snapshot blob.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
        }
    }
}

fn default_dimension() -> usize {
    1280
}

fn default_remote_timeout_ms() -> u64 {
    2000
}

fn default_top_k() -> usize {
    3
}

fn default_min_score() -> f32 {
    0.6
}

fn default_propagation_timeout_ms() -> u64 {
    2000
}

fn default_index_path() -> PathBuf {
    PathBuf::from("snaplist-vectors.json")
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Load configuration from a path, falling back to defaults when the
    /// file does not exist or cannot be read.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unusable config file, using defaults");
                Self::default()
            }
        }
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.embedding.dimension == 0 {
            errors.push("Embedding dimension must be greater than 0".to_string());
        }

        if let Some(remote) = &self.embedding.remote {
            if remote.endpoint.is_empty() {
                errors.push("Remote embedding endpoint must not be empty".to_string());
            }
            if remote.timeout_ms == 0 {
                errors.push("Remote embedding timeout_ms must be greater than 0".to_string());
            }
        }

        if self.search.top_k == 0 {
            errors.push("Search top_k must be greater than 0".to_string());
        }

        if !(-1.0..=1.0).contains(&self.search.min_score) {
            errors.push(format!(
                "Search min_score must be in [-1, 1], got {}",
                self.search.min_score
            ));
        }

        if self.sync.propagation_timeout_ms == 0 {
            errors.push("Sync propagation_timeout_ms must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Resolve the peer id, generating a stable random one when unset.
    pub fn peer_id(&self) -> String {
        self.sync
            .peer_id
            .clone()
            .unwrap_or_else(crate::id::short_id)
    }
}
