use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub vault_dir: PathBuf,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub connector: ConnectorConfig,
    pub consolidator: ConsolidatorConfig,
    pub ingest_queue: IngestQueueConfig,
    pub search: SearchConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub dimension: usize,
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatorConfig {
    pub max_note_len: usize,
    pub similarity_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestQueueConfig {
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub candidate_multiplier: usize,
    pub session_window: usize,
}

impl Config {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.embedding.dimension == 0 {
            return Err("embedding.dimension must be > 0".into());
        }
        if self.chunking.chunk_size < 50 {
            return Err("chunking.chunk_size must be >= 50".into());
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err("chunking.chunk_overlap must be < chunk_size".into());
        }
        if !(0.0..=1.0).contains(&self.connector.threshold) {
            return Err("connector.threshold must be in [0.0, 1.0]".into());
        }
        if !(0.0..=1.0).contains(&self.consolidator.similarity_threshold) {
            return Err("consolidator.similarity_threshold must be in [0.0, 1.0]".into());
        }
        if self.ingest_queue.workers == 0 {
            return Err("ingest_queue.workers must be > 0".into());
        }
        if self.search.candidate_multiplier == 0 {
            return Err("search.candidate_multiplier must be > 0".into());
        }
        Ok(())
    }

    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Layer defaults, an optional `black_vault.toml` next to the data dir, then
    /// environment variables. `BLACK_VAULT_DB` and `BLACK_VAULT_DATA_DIR` win over
    /// both when set.
    pub fn from_env_and_file() -> Result<Self, String> {
        let mut config = Self::default();

        let toml_path = config.data_dir.join("black_vault.toml");
        if toml_path.exists() {
            config = Self::from_file(&toml_path)?;
        }

        if let Ok(data_dir) = std::env::var("BLACK_VAULT_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
            config.vault_dir = config.data_dir.join("blackvault_data").join("files");
        }
        if let Ok(db_path) = std::env::var("BLACK_VAULT_DB") {
            config.db_path = PathBuf::from(db_path);
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("black-vault");

        Self {
            db_path: data_dir.join("vault.duckdb"),
            vault_dir: data_dir.join("blackvault_data").join("files"),
            data_dir,
            embedding: EmbeddingConfig {
                dimension: 768,
                endpoint: "http://localhost:11434/api/embeddings".to_string(),
            },
            chunking: ChunkingConfig {
                chunk_size: 1000,
                chunk_overlap: 150,
            },
            connector: ConnectorConfig { threshold: 0.75 },
            consolidator: ConsolidatorConfig {
                max_note_len: 300,
                similarity_threshold: 0.70,
            },
            ingest_queue: IngestQueueConfig { workers: 4 },
            search: SearchConfig {
                candidate_multiplier: 2,
                session_window: 5,
            },
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_overlap_larger_than_chunk_size() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(config.validate().is_err());
    }
}
