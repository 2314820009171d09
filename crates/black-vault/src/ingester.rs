//! Ingester — the single-file ingestion protocol (§4.4 steps 1-9): classify,
//! hash, dedup, chunk, embed, persist, enrich, connect, index.

use std::path::Path;
use std::sync::Arc;

use crate::connector::Connector;
use crate::embedder::Embedder;
use crate::enricher::Enricher;
use crate::error::{Error, Result};
use crate::processing::{detect_source_type, Chunker};
use crate::store::{NewItem, Store};
use crate::types::IngestOutcome;

#[derive(Clone)]
pub struct Ingester {
    store: Arc<Store>,
    embedder: Arc<dyn Embedder>,
    enricher: Enricher,
    connector: Connector,
    chunker: Arc<Chunker>,
}

impl Ingester {
    pub fn new(
        store: Arc<Store>,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn crate::chat_model::ChatModel>,
        chunk_size: usize,
        chunk_overlap: usize,
        connector_threshold: f32,
    ) -> Self {
        Self {
            connector: Connector::new(store.clone(), connector_threshold),
            enricher: Enricher::new(chat),
            chunker: Arc::new(Chunker::new(chunk_size, chunk_overlap)),
            store,
            embedder,
        }
    }

    /// Ingest one already-extracted piece of text. `source_path` is a
    /// display/dedup identifier, not necessarily a filesystem path — the
    /// HTTP surface's URL/YouTube endpoints call this with the fetched
    /// page's URL and a pre-extracted transcript respectively.
    pub async fn ingest_text(
        &self,
        source_path: &str,
        source_type: &str,
        text: &str,
        source_mtime: i64,
    ) -> IngestOutcome {
        match self.try_ingest(source_path, source_type, text, source_mtime).await {
            Ok(item_id) => IngestOutcome {
                path: source_path.to_string(),
                success: true,
                item_id: Some(item_id),
                is_duplicate: false,
                duplicate_id: None,
                error: None,
            },
            Err(Error::DuplicateHash(existing_id)) => IngestOutcome {
                path: source_path.to_string(),
                success: true,
                item_id: None,
                is_duplicate: true,
                duplicate_id: Some(existing_id),
                error: None,
            },
            Err(e) => IngestOutcome {
                path: source_path.to_string(),
                success: false,
                item_id: None,
                is_duplicate: false,
                duplicate_id: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Ingest a file from disk, classifying its source type from the path
    /// suffix. Extraction of non-text formats (PDF, image, audio) happens
    /// upstream via an external collaborator; this entry point expects
    /// `text` to already be extracted.
    pub async fn ingest_file(&self, path: &Path, extracted_text: &str) -> IngestOutcome {
        let source_type = detect_source_type(path)
            .map(|t| t.as_str())
            .unwrap_or("text");
        let mtime = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        self.ingest_text(&path.to_string_lossy(), source_type, extracted_text, mtime)
            .await
    }

    async fn try_ingest(
        &self,
        source_path: &str,
        source_type: &str,
        text: &str,
        source_mtime: i64,
    ) -> Result<i64> {
        if text.trim().is_empty() {
            return Err(Error::EmptyContent);
        }

        let content_hash = format!("{:x}", md5::compute(text.as_bytes()));

        // Chunk and embed before taking the store lock — neither touches the
        // store, and the embedder call is a remote round trip that must not
        // hold the lock open (§5).
        let spans = self.chunker.chunk(text);
        if spans.is_empty() {
            return Err(Error::EmptyContent);
        }
        let bodies: Vec<String> = spans.iter().map(|s| s.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&bodies).await?;
        let mean_vector = crate::embedder::mean_vector(&vectors);

        // The dedup check, item insert, and per-chunk/embedding inserts run
        // as one critical section: another concurrent ingest of the same
        // content cannot slip between the check and the insert while this
        // transaction holds the lock.
        let (item_id, chunk_ids) = {
            let txn = self.store.transaction().await;

            if let Some(existing) = txn.get_item_by_hash(&content_hash)? {
                return Err(Error::DuplicateHash(existing.id));
            }

            let item_id = match txn.put_item(NewItem {
                source_path,
                source_type,
                content_hash: &content_hash,
                source_mtime,
            }) {
                Ok(id) => id,
                Err(Error::DuplicateHashRace) => {
                    // Lost a race with a concurrent ingest of the same
                    // content between our check and our insert; the winner
                    // is visible within this same transaction.
                    let existing = txn
                        .get_item_by_hash(&content_hash)?
                        .ok_or_else(|| Error::StoreError("unique constraint violated but no matching row found".into()))?;
                    return Err(Error::DuplicateHash(existing.id));
                }
                Err(e) => return Err(e),
            };

            let mut chunk_ids = Vec::with_capacity(spans.len());
            for (span, vector) in spans.iter().zip(vectors.iter()) {
                let chunk_id = txn.put_chunk(item_id, span.index as i32, &span.text)?;
                txn.put_embedding(chunk_id, item_id, vector)?;
                chunk_ids.push(chunk_id);
            }

            if let Some(mean) = &mean_vector {
                txn.put_item_embedding(item_id, mean)?;
            }

            (item_id, chunk_ids)
        };

        let total = chunk_ids.len();
        let mut chunk_metas = Vec::with_capacity(total);
        for (i, (chunk_id, span)) in chunk_ids.iter().zip(spans.iter()).enumerate() {
            let meta = self.enricher.enrich_chunk(*chunk_id, &span.text, i, total).await;
            self.store.put_chunk_metadata(&meta).await?;
            chunk_metas.push(meta);
        }

        let (title, tags, summary) = self.enricher.aggregate_item(&chunk_metas);
        self.store
            .update_item_enrichment(item_id, &title, &tags.join(","), &summary)
            .await?;

        self.connector.connect(item_id).await?;

        for (chunk_id, span) in chunk_ids.iter().zip(spans.iter()) {
            self.store
                .text_index()
                .index_chunk(*chunk_id, item_id, &span.text, &title)?;
        }
        self.store.text_index().commit()?;

        Ok(item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_model::ChatModel;
    use crate::config::Config;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 0.0, 0.0])
        }
        fn dimension(&self) -> usize {
            3
        }
    }

    struct StubChat;

    #[async_trait]
    impl ChatModel for StubChat {
        async fn generate(&self, _prompt: &str, _json_mode: bool) -> Result<String> {
            Ok(r#"{"title":"t","summary":"s","content_type":"narrative","language":"en",
                   "tags":["x"],"key_terms":[],"entities":{},"questions_answered":[],
                   "contextual_dependence":"standalone","positional_role":"body",
                   "density_score":0.5,"relevance_score":0.5}"#
                .to_string())
        }
    }

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.data_dir = dir.to_path_buf();
        config.db_path = dir.join("vault.duckdb");
        config.embedding.dimension = 3;
        config.chunking.chunk_size = 50;
        config.chunking.chunk_overlap = 5;
        config
    }

    fn test_ingester(dir: &std::path::Path) -> Ingester {
        let store = Arc::new(Store::open(&test_config(dir)).unwrap());
        Ingester::new(store, Arc::new(StubEmbedder), Arc::new(StubChat), 50, 5, 0.75)
    }

    #[tokio::test]
    async fn ingests_new_text_and_rejects_duplicate() {
        let dir = tempdir().unwrap();
        let ingester = test_ingester(dir.path());

        let outcome = ingester.ingest_text("note.txt", "text", "hello world, this is a test note", 0).await;
        assert!(outcome.success);
        assert!(outcome.item_id.is_some());

        let dup = ingester.ingest_text("note2.txt", "text", "hello world, this is a test note", 0).await;
        assert!(dup.success);
        assert!(dup.is_duplicate);
        assert_eq!(dup.duplicate_id, outcome.item_id);
    }

    #[tokio::test]
    async fn rejects_empty_content() {
        let dir = tempdir().unwrap();
        let ingester = test_ingester(dir.path());

        let outcome = ingester.ingest_text("empty.txt", "text", "   ", 0).await;
        assert!(!outcome.success);
        assert!(!outcome.is_duplicate);
    }
}
