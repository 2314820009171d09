//! Black Vault — a personal content repository with hybrid vector+BM25
//! retrieval. `BlackVault` is the single facade a caller (the CLI or the
//! HTTP server) needs: it owns the store, the embedding/chat clients, and
//! wires the ingestion and search pipelines.

pub mod chat_model;
pub mod config;
pub mod connector;
pub mod consolidator;
pub mod embedder;
pub mod enricher;
pub mod error;
pub mod ingest_queue;
pub mod ingester;
pub mod intent;
pub mod processing;
pub mod search;
pub mod searcher;
pub mod store;
pub mod types;

use std::sync::Arc;

use chat_model::{ChatModel, HttpChatModel};
use config::Config;
use consolidator::Consolidator;
use embedder::{Embedder, HttpEmbedder};
use error::Result;
use ingest_queue::IngestQueue;
use ingester::Ingester;
use searcher::Searcher;
use store::Store;

pub use error::Error;
pub use types::{
    Chunk, ChunkMetadata, Connection, IngestOutcome, Item, QueryFilters, QueryIntent,
    SearchResult, SourceType,
};

/// Top-level handle wiring every subsystem together. Construct once per
/// process (CLI invocation or server startup) and share it behind an `Arc`
/// if the caller needs concurrent access beyond what `IngestQueue`/`Store`
/// already serialize internally.
pub struct BlackVault {
    pub store: Arc<Store>,
    pub searcher: Searcher,
    pub ingest_queue: IngestQueue,
    pub consolidator: Consolidator,
    ingester: Ingester,
    config: Config,
}

impl BlackVault {
    /// Open (or create) a vault at the paths in `config`, wiring the HTTP
    /// embedding/chat clients and spawning the ingest worker pool.
    pub fn open(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(error::Error::StoreError)?;

        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(&config.vault_dir)?;

        let store = Arc::new(Store::open(&config)?);

        let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(
            &config.embedding.endpoint,
            "nomic-embed-text",
            config.embedding.dimension,
        ));
        let chat: Arc<dyn ChatModel> = Arc::new(HttpChatModel::new(
            "http://localhost:11434/api/generate",
            "llama3.1",
        ));

        let ingester = Ingester::new(
            store.clone(),
            embedder.clone(),
            chat.clone(),
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
            config.connector.threshold,
        );
        let ingest_queue = IngestQueue::spawn(store.clone(), config.ingest_queue.workers, ingester.clone());
        let direct_ingester = ingester.clone();

        let searcher = Searcher::new(
            store.clone(),
            embedder.clone(),
            chat.clone(),
            config.search.candidate_multiplier,
            config.search.session_window,
        );

        let consolidator = Consolidator::new(
            store.clone(),
            chat,
            ingester,
            config.consolidator.max_note_len,
            config.consolidator.similarity_threshold,
        );

        Ok(Self {
            store,
            searcher,
            ingest_queue,
            consolidator,
            ingester: direct_ingester,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        self.searcher.search(query, k).await
    }

    /// Ingest a single file directly, bypassing the worker queue — used by
    /// the CLI's one-shot `ingest` command, where there is no batch to fan
    /// out across workers.
    pub async fn ingest_file(&self, path: &std::path::Path, extracted_text: &str) -> IngestOutcome {
        let outcome = self.ingester.ingest_file(path, extracted_text).await;
        self.rebuild_indexes_if(&outcome).await;
        outcome
    }

    /// Ingest already-extracted text under an explicit `source_type` — used
    /// by the HTTP surface's URL/YouTube endpoints, which have no filesystem
    /// path to classify from.
    pub async fn ingest_text(&self, source_path: &str, source_type: &str, text: &str) -> IngestOutcome {
        let outcome = self
            .ingester
            .ingest_text(source_path, source_type, text, chrono::Utc::now().timestamp())
            .await;
        self.rebuild_indexes_if(&outcome).await;
        outcome
    }

    async fn rebuild_indexes_if(&self, outcome: &IngestOutcome) {
        if outcome.success {
            let _ = self.store.rebuild_vector_index(false).await;
            let _ = self.store.rebuild_text_index().await;
        }
    }

    pub async fn consolidate(&self) -> Result<usize> {
        self.consolidator.consolidate().await
    }
}
