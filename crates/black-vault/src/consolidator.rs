//! Consolidator — merges clusters of short, similar notes into single
//! richer items (§4.9). Runs on demand (CLI `consolidate` command / HTTP
//! `POST /consolidate`), not automatically after every ingest.

use std::collections::HashSet;
use std::sync::Arc;

use crate::chat_model::ChatModel;
use crate::embedder::cosine_similarity;
use crate::error::Result;
use crate::ingester::Ingester;
use crate::store::Store;
use crate::types::Item;

pub struct Consolidator {
    store: Arc<Store>,
    chat: Arc<dyn ChatModel>,
    ingester: Ingester,
    max_note_len: usize,
    similarity_threshold: f32,
}

impl Consolidator {
    pub fn new(
        store: Arc<Store>,
        chat: Arc<dyn ChatModel>,
        ingester: Ingester,
        max_note_len: usize,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            store,
            chat,
            ingester,
            max_note_len,
            similarity_threshold,
        }
    }

    /// Run one consolidation pass. Returns the number of clusters merged.
    pub async fn consolidate(&self) -> Result<usize> {
        let short_items = self.find_short_items().await?;
        if short_items.len() < 2 {
            return Ok(0);
        }

        let clusters = self.cluster(&short_items).await?;
        let mut merged = 0usize;
        for cluster in clusters {
            if self.merge_cluster(cluster).await? {
                merged += 1;
            }
        }
        Ok(merged)
    }

    async fn find_short_items(&self) -> Result<Vec<Item>> {
        let items = self.store.list_items(usize::MAX / 2, 0).await?;
        let mut short = Vec::new();
        for item in items {
            if item.source_type != "text" {
                continue;
            }
            let chunks = self.store.get_chunks(item.id).await?;
            let total_len: usize = chunks.iter().map(|(_, _, body)| body.len()).sum();
            if total_len > 0 && total_len <= self.max_note_len {
                short.push(item);
            }
        }
        Ok(short)
    }

    /// Greedy single-link clustering: each unclustered item seeds a new
    /// cluster and pulls in every remaining item whose first-chunk embedding
    /// is at or above the similarity threshold against the seed's.
    async fn cluster(&self, items: &[Item]) -> Result<Vec<Vec<Item>>> {
        let mut vectors = Vec::with_capacity(items.len());
        for item in items {
            let first_chunk_vector = self.store.get_embeddings_for_item(item.id).await?.into_iter().next();
            vectors.push(first_chunk_vector);
        }

        let mut used: HashSet<usize> = HashSet::new();
        let mut clusters = Vec::new();

        for i in 0..items.len() {
            if used.contains(&i) {
                continue;
            }
            let Some(seed_vector) = &vectors[i] else {
                continue;
            };

            let mut cluster = vec![items[i].clone()];
            used.insert(i);

            for j in (i + 1)..items.len() {
                if used.contains(&j) {
                    continue;
                }
                let Some(candidate_vector) = &vectors[j] else {
                    continue;
                };
                if cosine_similarity(seed_vector, candidate_vector) >= self.similarity_threshold {
                    cluster.push(items[j].clone());
                    used.insert(j);
                }
            }

            if cluster.len() > 1 {
                clusters.push(cluster);
            }
        }

        Ok(clusters)
    }

    /// Ask the chat model to merge a cluster's bodies into one note, ingest
    /// the result as a fresh item, and only then delete the originals — if
    /// the merge or re-ingest fails, the originals are left untouched rather
    /// than losing content.
    async fn merge_cluster(&self, cluster: Vec<Item>) -> Result<bool> {
        let mut sections = Vec::with_capacity(cluster.len());
        for item in &cluster {
            let chunks = self.store.get_chunks(item.id).await?;
            let body = chunks
                .into_iter()
                .map(|(_, _, body)| body)
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("Note \"{}\":\n{}", item.title, body));
        }

        let prompt = format!(
            "Merge the following related short notes into a single consolidated note. \
             Preserve every distinct fact; remove redundancy. Respond with just the merged text.\n\n{}",
            sections.join("\n\n---\n\n")
        );

        let merged_text = self.chat.generate(&prompt, false).await?;
        if merged_text.trim().is_empty() {
            tracing::warn!("consolidation merge returned empty text, leaving originals");
            return Ok(false);
        }

        let source_path = format!(
            "consolidated:{}",
            cluster.iter().map(|i| i.id.to_string()).collect::<Vec<_>>().join("+")
        );
        let outcome = self
            .ingester
            .ingest_text(&source_path, "text", &merged_text, chrono::Utc::now().timestamp())
            .await;

        if !outcome.success {
            tracing::warn!(error = ?outcome.error, "consolidation re-ingest failed, leaving originals");
            return Ok(false);
        }

        for item in cluster {
            self.store.delete_item(item.id).await?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::embedder::Embedder;
    use crate::store::NewItem;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0, 0.0])
        }
        fn dimension(&self) -> usize {
            3
        }
    }

    struct StubChat;

    #[async_trait]
    impl ChatModel for StubChat {
        async fn generate(&self, _prompt: &str, _json_mode: bool) -> Result<String> {
            Ok("merged note content".to_string())
        }
    }

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.data_dir = dir.to_path_buf();
        config.db_path = dir.join("vault.duckdb");
        config.embedding.dimension = 3;
        config.chunking.chunk_size = 500;
        config.chunking.chunk_overlap = 10;
        config
    }

    #[tokio::test]
    async fn merges_similar_short_notes_and_deletes_originals() {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::open(&test_config(dir.path())).unwrap());

        let a = store
            .put_item(NewItem {
                source_path: "a",
                source_type: "text",
                content_hash: "a",
                source_mtime: 0,
            })
            .await
            .unwrap();
        let chunk_a = store.put_chunk(a, 0, "short note a").await.unwrap();
        store.put_embedding(chunk_a, a, &[1.0, 0.0, 0.0]).await.unwrap();

        let b = store
            .put_item(NewItem {
                source_path: "b",
                source_type: "text",
                content_hash: "b",
                source_mtime: 0,
            })
            .await
            .unwrap();
        let chunk_b = store.put_chunk(b, 0, "short note b").await.unwrap();
        store.put_embedding(chunk_b, b, &[1.0, 0.0, 0.0]).await.unwrap();

        let chat: Arc<dyn ChatModel> = Arc::new(StubChat);
        let ingester = Ingester::new(store.clone(), Arc::new(StubEmbedder), chat.clone(), 500, 10, 0.75);
        let consolidator = Consolidator::new(store.clone(), chat, ingester, 300, 0.9);

        let merged = consolidator.consolidate().await.unwrap();
        assert_eq!(merged, 1);
        assert!(store.get_item(a).await.unwrap().is_none());
        assert!(store.get_item(b).await.unwrap().is_none());
        assert_eq!(store.count_items().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn non_text_items_are_excluded_from_consolidation() {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::open(&test_config(dir.path())).unwrap());

        let pdf = store
            .put_item(NewItem {
                source_path: "scan.pdf",
                source_type: "pdf",
                content_hash: "pdf1",
                source_mtime: 0,
            })
            .await
            .unwrap();
        let chunk = store.put_chunk(pdf, 0, "short pdf note").await.unwrap();
        store.put_embedding(chunk, pdf, &[1.0, 0.0, 0.0]).await.unwrap();

        let pdf2 = store
            .put_item(NewItem {
                source_path: "scan2.pdf",
                source_type: "pdf",
                content_hash: "pdf2",
                source_mtime: 0,
            })
            .await
            .unwrap();
        let chunk2 = store.put_chunk(pdf2, 0, "short pdf note").await.unwrap();
        store.put_embedding(chunk2, pdf2, &[1.0, 0.0, 0.0]).await.unwrap();

        let chat: Arc<dyn ChatModel> = Arc::new(StubChat);
        let ingester = Ingester::new(store.clone(), Arc::new(StubEmbedder), chat.clone(), 500, 10, 0.75);
        let consolidator = Consolidator::new(store.clone(), chat, ingester, 300, 0.9);

        let merged = consolidator.consolidate().await.unwrap();
        assert_eq!(merged, 0);
        assert!(store.get_item(pdf).await.unwrap().is_some());
        assert!(store.get_item(pdf2).await.unwrap().is_some());
    }
}
