//! Connector — links items whose mean embeddings are similar enough to be
//! worth surfacing as related content (§4.6).

use std::sync::Arc;

use crate::embedder::cosine_similarity;
use crate::error::Result;
use crate::store::Store;

#[derive(Clone)]
pub struct Connector {
    store: Arc<Store>,
    threshold: f32,
}

impl Connector {
    pub fn new(store: Arc<Store>, threshold: f32) -> Self {
        Self { store, threshold }
    }

    /// Compare `item_id`'s mean embedding against every other item with one,
    /// persisting a connection for each pair scoring at or above the
    /// configured threshold. Called once per ingested item, after its
    /// item-level embedding has been written.
    pub async fn connect(&self, item_id: i64) -> Result<usize> {
        let Some(target_vector) = self.store.get_item_embedding(item_id).await? else {
            return Ok(0);
        };

        let candidates = self.store.list_items(usize::MAX / 2, 0).await?;
        let mut connected = 0usize;

        for candidate in candidates {
            if candidate.id == item_id {
                continue;
            }
            let Some(candidate_vector) = self.store.get_item_embedding(candidate.id).await? else {
                continue;
            };
            let score = cosine_similarity(&target_vector, &candidate_vector);
            if score >= self.threshold {
                self.store.put_connection(item_id, candidate.id, score).await?;
                connected += 1;
            }
        }

        Ok(connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::NewItem;
    use tempfile::tempdir;

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.data_dir = dir.to_path_buf();
        config.db_path = dir.join("vault.duckdb");
        config.embedding.dimension = 3;
        config
    }

    #[tokio::test]
    async fn connects_items_above_threshold_only() {
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
        let b = store
            .put_item(NewItem {
                source_path: "b",
                source_type: "text",
                content_hash: "b",
                source_mtime: 0,
            })
            .await
            .unwrap();
        let c = store
            .put_item(NewItem {
                source_path: "c",
                source_type: "text",
                content_hash: "c",
                source_mtime: 0,
            })
            .await
            .unwrap();

        store.put_item_embedding(a, &[1.0, 0.0, 0.0]).await.unwrap();
        store.put_item_embedding(b, &[0.99, 0.01, 0.0]).await.unwrap();
        store.put_item_embedding(c, &[0.0, 1.0, 0.0]).await.unwrap();

        let connector = Connector::new(store.clone(), 0.9);
        let connected = connector.connect(a).await.unwrap();
        assert_eq!(connected, 1);

        let conns = store.get_connections_for_item(a).await.unwrap();
        assert_eq!(conns.len(), 1);
        assert!(conns[0].item_a == b || conns[0].item_b == b);
    }
}
