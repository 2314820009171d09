//! `Store` — the single embedded datastore (§3, §4.1, §5).
//!
//! All access goes through one `tokio::sync::Mutex`-guarded DuckDB
//! connection, matching the single `store_lock` concurrency model: callers
//! take the lock, run the (synchronous) DuckDB calls, and release it before
//! doing any further async work such as calling out to the embedder. A
//! sibling Tantivy index mirrors the `chunks` table for BM25 retrieval.

mod schema;
mod vector;

use std::path::Path;

use chrono::Utc;
use duckdb::{params, Connection, Row};
use tokio::sync::{Mutex, MutexGuard};

use crate::config::Config;
use crate::embedder::mean_vector;
use crate::error::{Error, Result};
use crate::search::TextIndex;
use crate::types::{
    ChunkContentType, ChunkMetadata, Connection as ConnectionRecord, ContextualDependence, Item,
    PositionalRole,
};

/// Fields needed to insert a new item before enrichment has run.
pub struct NewItem<'a> {
    pub source_path: &'a str,
    pub source_type: &'a str,
    pub content_hash: &'a str,
    pub source_mtime: i64,
}

pub struct Store {
    conn: Mutex<Connection>,
    text_index: TextIndex,
    dimension: usize,
}

/// A single locked `Connection` held across a multi-step write sequence.
/// `Ingester::try_ingest` uses this to run its dedup check, item insert, and
/// per-chunk inserts as one critical section (§5) — holding the lock across
/// separate `Store` method calls would otherwise let another task's writes
/// interleave mid-ingest.
pub struct StoreTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    dimension: usize,
}

impl StoreTransaction<'_> {
    pub fn get_item_by_hash(&self, content_hash: &str) -> Result<Option<Item>> {
        db_get_item_by_hash(&self.conn, content_hash)
    }

    /// Insert an item, distinguishing a dedup race lost at the
    /// `items_content_hash_idx` unique constraint (`Error::DuplicateHashRace`)
    /// from any other storage failure so the caller can resolve it by
    /// looking up the winning row within this same transaction.
    pub fn put_item(&self, new_item: NewItem<'_>) -> Result<i64> {
        db_put_item(&self.conn, &new_item)
    }

    pub fn put_chunk(&self, item_id: i64, chunk_index: i32, body: &str) -> Result<i64> {
        db_put_chunk(&self.conn, item_id, chunk_index, body)
    }

    pub fn put_embedding(&self, chunk_id: i64, item_id: i64, vector: &[f32]) -> Result<i64> {
        db_put_embedding(&self.conn, self.dimension, chunk_id, item_id, vector)
    }

    pub fn put_item_embedding(&self, item_id: i64, vector: &[f32]) -> Result<()> {
        db_put_item_embedding(&self.conn, self.dimension, item_id, vector)
    }
}

impl Store {
    pub fn open(config: &Config) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&config.data_dir)?;

        let conn = Connection::open(&config.db_path)?;
        conn.execute_batch(
            "INSTALL vss; LOAD vss; SET hnsw_enable_experimental_persistence = true;",
        )?;
        schema::init(&conn, config.embedding.dimension)?;

        let text_index = TextIndex::open(&config.data_dir)?;

        Ok(Self {
            conn: Mutex::new(conn),
            text_index,
            dimension: config.embedding.dimension,
        })
    }

    pub fn text_index(&self) -> &TextIndex {
        &self.text_index
    }

    /// Acquire the store lock for a whole multi-step write sequence. The
    /// returned `StoreTransaction` holds the lock until dropped, so callers
    /// must keep its scope tight around the writes that need to be atomic
    /// with respect to other tasks (per spec §5) and drop it before doing
    /// any further async work (embedding/LLM calls).
    pub async fn transaction(&self) -> StoreTransaction<'_> {
        StoreTransaction {
            conn: self.conn.lock().await,
            dimension: self.dimension,
        }
    }

    // ---- items -------------------------------------------------------

    pub async fn put_item(&self, new_item: NewItem<'_>) -> Result<i64> {
        let conn = self.conn.lock().await;
        db_put_item(&conn, &new_item)
    }

    pub async fn get_item_by_hash(&self, content_hash: &str) -> Result<Option<Item>> {
        let conn = self.conn.lock().await;
        db_get_item_by_hash(&conn, content_hash)
    }

    pub async fn get_item(&self, id: i64) -> Result<Option<Item>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, source_path, source_type, content_hash, title, tags, summary,
                    source_mtime, created_at, enriched
             FROM items WHERE id = ?",
        )?;
        let mut rows = stmt.query_map(params![id], row_to_item)?;
        Ok(rows.next().transpose()?)
    }

    pub async fn get_items(&self, ids: &[i64]) -> Result<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().await;
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT id, source_path, source_type, content_hash, title, tags, summary,
                    source_mtime, created_at, enriched
             FROM items WHERE id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn duckdb::ToSql> = ids.iter().map(|i| i as &dyn duckdb::ToSql).collect();
        let rows = stmt.query_map(params.as_slice(), row_to_item)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub async fn list_items(&self, limit: usize, offset: usize) -> Result<Vec<Item>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, source_path, source_type, content_hash, title, tags, summary,
                    source_mtime, created_at, enriched
             FROM items ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], row_to_item)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub async fn update_item_enrichment(
        &self,
        item_id: i64,
        title: &str,
        tags: &str,
        summary: &str,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE items SET title = ?, tags = ?, summary = ?, enriched = TRUE WHERE id = ?",
            params![title, tags, summary, item_id],
        )?;
        Ok(())
    }

    // ---- chunks --------------------------------------------------------

    pub async fn put_chunk(&self, item_id: i64, chunk_index: i32, body: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        db_put_chunk(&conn, item_id, chunk_index, body)
    }

    pub async fn get_chunks(&self, item_id: i64) -> Result<Vec<(i64, i32, String)>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, chunk_index, body FROM chunks WHERE item_id = ? ORDER BY chunk_index",
        )?;
        let rows = stmt.query_map(params![item_id], |row: &Row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i32>(1)?, row.get::<_, String>(2)?))
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// `(item_id, body)` for a single chunk — used by the Searcher to build
    /// a snippet and resolve which item a BM25 hit belongs to.
    pub async fn get_chunk(&self, chunk_id: i64) -> Result<Option<(i64, String)>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT item_id, body FROM chunks WHERE id = ?")?;
        let mut rows = stmt.query_map(params![chunk_id], |row: &Row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.next().transpose()?)
    }

    // ---- embeddings ----------------------------------------------------

    pub async fn put_embedding(&self, chunk_id: i64, item_id: i64, vector: &[f32]) -> Result<i64> {
        let conn = self.conn.lock().await;
        db_put_embedding(&conn, self.dimension, chunk_id, item_id, vector)
    }

    /// Chunk embeddings for an item, in chunk order — the first element is
    /// always the first chunk's embedding.
    pub async fn get_embeddings_for_item(&self, item_id: i64) -> Result<Vec<Vec<f32>>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT embeddings.vector FROM embeddings
             JOIN chunks ON chunks.id = embeddings.chunk_id
             WHERE embeddings.item_id = ?
             ORDER BY chunks.chunk_index",
        )?;
        let rows = stmt.query_map(params![item_id], |row: &Row| row.get::<_, Vec<f32>>(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub async fn put_item_embedding(&self, item_id: i64, vector: &[f32]) -> Result<()> {
        let conn = self.conn.lock().await;
        db_put_item_embedding(&conn, self.dimension, item_id, vector)
    }

    pub async fn get_item_embedding(&self, item_id: i64) -> Result<Option<Vec<f32>>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT vector FROM item_embeddings WHERE item_id = ?")?;
        let mut rows = stmt.query_map(params![item_id], |row: &Row| row.get::<_, Vec<f32>>(0))?;
        Ok(rows.next().transpose()?)
    }

    // ---- chunk metadata -------------------------------------------------

    pub async fn put_chunk_metadata(&self, meta: &ChunkMetadata) -> Result<()> {
        let conn = self.conn.lock().await;
        let key_terms_json = serde_json::to_string(&meta.key_terms)
            .map_err(|e| Error::StoreError(e.to_string()))?;
        let entities_json = serde_json::to_string(&meta.entities)
            .map_err(|e| Error::StoreError(e.to_string()))?;
        let questions_json = serde_json::to_string(&meta.questions_answered)
            .map_err(|e| Error::StoreError(e.to_string()))?;
        let tags_csv = meta.tags.join(",");

        conn.execute(
            "INSERT INTO chunk_metadata
                (chunk_id, title, summary, content_type, language, tags, key_terms_json,
                 entities_json, questions_answered_json, contextual_dependence,
                 positional_role, density_score, relevance_score)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (chunk_id) DO UPDATE SET
                title = EXCLUDED.title, summary = EXCLUDED.summary,
                content_type = EXCLUDED.content_type, language = EXCLUDED.language,
                tags = EXCLUDED.tags, key_terms_json = EXCLUDED.key_terms_json,
                entities_json = EXCLUDED.entities_json,
                questions_answered_json = EXCLUDED.questions_answered_json,
                contextual_dependence = EXCLUDED.contextual_dependence,
                positional_role = EXCLUDED.positional_role,
                density_score = EXCLUDED.density_score,
                relevance_score = EXCLUDED.relevance_score",
            params![
                meta.chunk_id,
                meta.title,
                meta.summary,
                content_type_str(meta.content_type),
                meta.language,
                tags_csv,
                key_terms_json,
                entities_json,
                questions_json,
                dependence_str(meta.contextual_dependence),
                role_str(meta.positional_role),
                meta.density_score,
                meta.relevance_score,
            ],
        )?;
        Ok(())
    }

    pub async fn get_chunk_metadata(&self, chunk_id: i64) -> Result<Option<ChunkMetadata>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT chunk_id, title, summary, content_type, language, tags, key_terms_json,
                    entities_json, questions_answered_json, contextual_dependence,
                    positional_role, density_score, relevance_score
             FROM chunk_metadata WHERE chunk_id = ?",
        )?;
        let mut rows = stmt.query_map(params![chunk_id], row_to_chunk_metadata)?;
        Ok(rows.next().transpose()?)
    }

    // ---- connections -----------------------------------------------------

    pub async fn put_connection(&self, item_a: i64, item_b: i64, score: f32) -> Result<()> {
        let (a, b) = if item_a <= item_b {
            (item_a, item_b)
        } else {
            (item_b, item_a)
        };
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO connections (item_a, item_b, score) VALUES (?, ?, ?)
             ON CONFLICT (item_a, item_b) DO UPDATE SET score = EXCLUDED.score",
            params![a, b, score],
        )?;
        Ok(())
    }

    pub async fn get_connections_for_item(&self, item_id: i64) -> Result<Vec<ConnectionRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT item_a, item_b, score FROM connections WHERE item_a = ? OR item_b = ?",
        )?;
        let rows = stmt.query_map(params![item_id, item_id], |row: &Row| {
            Ok(ConnectionRecord {
                item_a: row.get(0)?,
                item_b: row.get(1)?,
                score: row.get(2)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // ---- retrieval ---------------------------------------------------------

    /// Cosine-ranked chunk hits against the HNSW index. Retries once after a
    /// forced index rebuild if the first attempt reports index corruption.
    pub async fn search_vector(&self, query_vector: &[f32], k: usize) -> Result<Vec<(i64, i64, f32)>> {
        match self.search_vector_once(query_vector, k).await {
            Ok(hits) => Ok(hits),
            Err(Error::StoreError(msg)) if looks_like_index_corruption(&msg) => {
                tracing::warn!("vector index looks corrupt, rebuilding: {}", msg);
                self.rebuild_vector_index(true).await?;
                self.search_vector_once(query_vector, k)
                    .await
                    .map_err(|e| Error::IndexCorruption(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn search_vector_once(&self, query_vector: &[f32], k: usize) -> Result<Vec<(i64, i64, f32)>> {
        let conn = self.conn.lock().await;
        let literal = vector::literal(query_vector);
        let dim = self.dimension;
        let sql = format!(
            "SELECT chunk_id, item_id, array_cosine_similarity(vector, {literal}::FLOAT[{dim}]) AS score
             FROM embeddings ORDER BY score DESC LIMIT ?"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![k as i64], |row: &Row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, f32>(2)?))
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub async fn rebuild_vector_index(&self, force: bool) -> Result<()> {
        let conn = self.conn.lock().await;
        if force {
            conn.execute_batch("DROP INDEX IF EXISTS emb_idx;")?;
        }
        match conn.execute_batch(schema::hnsw_index_ddl()) {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().to_lowercase().contains("already exists") => Ok(()),
            Err(e) => Err(Error::from(e)),
        }
    }

    pub async fn rebuild_text_index(&self) -> Result<()> {
        self.text_index.clear()?;
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT chunks.id, chunks.item_id, chunks.body, items.title
             FROM chunks JOIN items ON items.id = chunks.item_id",
        )?;
        let rows = stmt.query_map([], |row: &Row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        for row in rows {
            let (chunk_id, item_id, body, title) = row?;
            self.text_index.index_chunk(chunk_id, item_id, &body, &title)?;
        }
        self.text_index.commit()?;
        Ok(())
    }

    // ---- session recency --------------------------------------------------

    pub async fn log_view(&self, item_id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        let id: i64 = conn.query_row("SELECT nextval('session_seq')", [], |r| r.get(0))?;
        conn.execute(
            "INSERT INTO session_views (id, item_id, viewed_at) VALUES (?, ?, ?)",
            params![id, item_id, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// Mean of the item-level embeddings for the `window` most recently
    /// viewed distinct items. `None` if no views have been logged yet.
    pub async fn recent_session_vector(&self, window: usize) -> Result<Option<Vec<f32>>> {
        let item_ids: Vec<i64> = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                "SELECT DISTINCT item_id FROM (
                     SELECT item_id, viewed_at FROM session_views ORDER BY viewed_at DESC
                 ) LIMIT ?",
            )?;
            let rows = stmt.query_map(params![window as i64], |row: &Row| row.get::<_, i64>(0))?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };

        if item_ids.is_empty() {
            return Ok(None);
        }

        let mut vectors = Vec::with_capacity(item_ids.len());
        for id in item_ids {
            if let Some(v) = self.get_item_embedding(id).await? {
                vectors.push(v);
            }
        }
        Ok(mean_vector(&vectors))
    }

    // ---- deletion -----------------------------------------------------------

    /// Cascading delete of an item and everything that references it (§4.1).
    pub async fn delete_item(&self, item_id: i64) -> Result<()> {
        {
            let conn = self.conn.lock().await;
            conn.execute_batch(&format!(
                "DELETE FROM chunk_metadata WHERE chunk_id IN (SELECT id FROM chunks WHERE item_id = {item_id});
                 DELETE FROM embeddings WHERE item_id = {item_id};
                 DELETE FROM chunks WHERE item_id = {item_id};
                 DELETE FROM connections WHERE item_a = {item_id} OR item_b = {item_id};
                 DELETE FROM item_embeddings WHERE item_id = {item_id};
                 DELETE FROM session_views WHERE item_id = {item_id};
                 DELETE FROM items WHERE id = {item_id};"
            ))?;
        }
        self.text_index.delete_by_item(item_id)?;
        Ok(())
    }

    pub async fn count_items(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        Ok(conn.query_row("SELECT count(*) FROM items", [], |r| r.get(0))?)
    }

    pub async fn count_chunks(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        Ok(conn.query_row("SELECT count(*) FROM chunks", [], |r| r.get(0))?)
    }
}

fn db_get_item_by_hash(conn: &Connection, content_hash: &str) -> Result<Option<Item>> {
    let mut stmt = conn.prepare(
        "SELECT id, source_path, source_type, content_hash, title, tags, summary,
                source_mtime, created_at, enriched
         FROM items WHERE content_hash = ?",
    )?;
    let mut rows = stmt.query_map(params![content_hash], row_to_item)?;
    Ok(rows.next().transpose()?)
}

fn db_put_item(conn: &Connection, new_item: &NewItem<'_>) -> Result<i64> {
    let id: i64 = conn.query_row("SELECT nextval('item_seq')", [], |r| r.get(0))?;
    conn.execute(
        "INSERT INTO items (id, source_path, source_type, content_hash, source_mtime, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            id,
            new_item.source_path,
            new_item.source_type,
            new_item.content_hash,
            new_item.source_mtime,
            Utc::now().timestamp(),
        ],
    )?;
    Ok(id)
}

fn db_put_chunk(conn: &Connection, item_id: i64, chunk_index: i32, body: &str) -> Result<i64> {
    let id: i64 = conn.query_row("SELECT nextval('chunk_seq')", [], |r| r.get(0))?;
    conn.execute(
        "INSERT INTO chunks (id, item_id, chunk_index, body) VALUES (?, ?, ?, ?)",
        params![id, item_id, chunk_index, body],
    )?;
    Ok(id)
}

fn db_put_embedding(conn: &Connection, dim: usize, chunk_id: i64, item_id: i64, vector: &[f32]) -> Result<i64> {
    let id: i64 = conn.query_row("SELECT nextval('emb_seq')", [], |r| r.get(0))?;
    let literal = vector::literal(vector);
    conn.execute(
        &format!(
            "INSERT INTO embeddings (id, chunk_id, item_id, vector) VALUES (?, ?, ?, {literal}::FLOAT[{dim}])"
        ),
        params![id, chunk_id, item_id],
    )?;
    Ok(id)
}

fn db_put_item_embedding(conn: &Connection, dim: usize, item_id: i64, vector: &[f32]) -> Result<()> {
    let literal = vector::literal(vector);
    conn.execute(
        &format!(
            "INSERT INTO item_embeddings (item_id, vector) VALUES (?, {literal}::FLOAT[{dim}])
             ON CONFLICT (item_id) DO UPDATE SET vector = EXCLUDED.vector"
        ),
        params![item_id],
    )?;
    Ok(())
}

fn looks_like_index_corruption(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("hnsw") && (lower.contains("corrupt") || lower.contains("invalid"))
}

fn row_to_item(row: &Row) -> duckdb::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        source_path: row.get(1)?,
        source_type: row.get(2)?,
        content_hash: row.get(3)?,
        title: row.get(4)?,
        tags: row.get(5)?,
        summary: row.get(6)?,
        source_mtime: row.get(7)?,
        created_at: row.get(8)?,
        enriched: row.get(9)?,
    })
}

fn row_to_chunk_metadata(row: &Row) -> duckdb::Result<ChunkMetadata> {
    let key_terms_json: String = row.get(6)?;
    let entities_json: String = row.get(7)?;
    let questions_json: String = row.get(8)?;
    let tags_csv: String = row.get(5)?;

    Ok(ChunkMetadata {
        chunk_id: row.get(0)?,
        title: row.get(1)?,
        summary: row.get(2)?,
        content_type: content_type_from_str(&row.get::<_, String>(3)?),
        language: row.get(4)?,
        tags: tags_csv
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        key_terms: serde_json::from_str(&key_terms_json).unwrap_or_default(),
        entities: serde_json::from_str(&entities_json).unwrap_or_default(),
        questions_answered: serde_json::from_str(&questions_json).unwrap_or_default(),
        contextual_dependence: dependence_from_str(&row.get::<_, String>(9)?),
        positional_role: role_from_str(&row.get::<_, String>(10)?),
        density_score: row.get(11)?,
        relevance_score: row.get(12)?,
    })
}

fn content_type_str(v: ChunkContentType) -> &'static str {
    match v {
        ChunkContentType::Narrative => "narrative",
        ChunkContentType::Code => "code",
        ChunkContentType::Table => "table",
        ChunkContentType::List => "list",
        ChunkContentType::Dialogue => "dialogue",
        ChunkContentType::Reference => "reference",
        ChunkContentType::Other => "other",
    }
}

fn content_type_from_str(s: &str) -> ChunkContentType {
    match s {
        "narrative" => ChunkContentType::Narrative,
        "code" => ChunkContentType::Code,
        "table" => ChunkContentType::Table,
        "list" => ChunkContentType::List,
        "dialogue" => ChunkContentType::Dialogue,
        "reference" => ChunkContentType::Reference,
        _ => ChunkContentType::Other,
    }
}

fn dependence_str(v: ContextualDependence) -> &'static str {
    match v {
        ContextualDependence::Standalone => "standalone",
        ContextualDependence::NeedsPrevious => "needs_previous",
        ContextualDependence::NeedsNext => "needs_next",
        ContextualDependence::NeedsBoth => "needs_both",
    }
}

fn dependence_from_str(s: &str) -> ContextualDependence {
    match s {
        "needs_previous" => ContextualDependence::NeedsPrevious,
        "needs_next" => ContextualDependence::NeedsNext,
        "needs_both" => ContextualDependence::NeedsBoth,
        _ => ContextualDependence::Standalone,
    }
}

fn role_str(v: PositionalRole) -> &'static str {
    match v {
        PositionalRole::Introduction => "introduction",
        PositionalRole::Body => "body",
        PositionalRole::Conclusion => "conclusion",
        PositionalRole::Aside => "aside",
    }
}

fn role_from_str(s: &str) -> PositionalRole {
    match s {
        "introduction" => PositionalRole::Introduction,
        "conclusion" => PositionalRole::Conclusion,
        "aside" => PositionalRole::Aside,
        _ => PositionalRole::Body,
    }
}
