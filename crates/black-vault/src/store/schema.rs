//! DuckDB schema (§3). Extends the three-table layout in the original
//! prototype (`items` / `content` / `embeddings` / `connections`) with the
//! columns and tables the full data model needs: `content_hash` and
//! `source_mtime` on `items` for dedup, `item_embeddings` for the
//! item-level mean vector used by the Connector and session boost,
//! `chunk_metadata` for the Enricher's per-chunk output, and
//! `session_views` for the recency side channel.

use duckdb::Connection;

use crate::error::Result;

pub fn embeddings_ddl(dimension: usize) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS embeddings (
            id       INTEGER PRIMARY KEY DEFAULT nextval('emb_seq'),
            chunk_id INTEGER REFERENCES chunks(id),
            item_id  INTEGER REFERENCES items(id),
            vector   FLOAT[{dimension}]
        );"
    )
}

pub fn item_embeddings_ddl(dimension: usize) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS item_embeddings (
            item_id INTEGER PRIMARY KEY REFERENCES items(id),
            vector  FLOAT[{dimension}]
        );"
    )
}

/// Run all schema-creation statements. Idempotent — every statement is
/// `IF NOT EXISTS`, so this is safe to call on every `Store::open`.
pub fn init(conn: &Connection, dimension: usize) -> Result<()> {
    conn.execute_batch(
        "CREATE SEQUENCE IF NOT EXISTS item_seq START 1;
         CREATE SEQUENCE IF NOT EXISTS chunk_seq START 1;
         CREATE SEQUENCE IF NOT EXISTS emb_seq START 1;
         CREATE SEQUENCE IF NOT EXISTS session_seq START 1;

         CREATE TABLE IF NOT EXISTS items (
             id            INTEGER PRIMARY KEY DEFAULT nextval('item_seq'),
             source_path   TEXT NOT NULL,
             source_type   TEXT NOT NULL DEFAULT 'text',
             content_hash  TEXT NOT NULL,
             title         TEXT NOT NULL DEFAULT '',
             tags          TEXT NOT NULL DEFAULT '',
             summary       TEXT NOT NULL DEFAULT '',
             source_mtime  BIGINT NOT NULL DEFAULT 0,
             created_at    BIGINT NOT NULL,
             enriched      BOOLEAN NOT NULL DEFAULT FALSE
         );

         CREATE UNIQUE INDEX IF NOT EXISTS items_content_hash_idx ON items(content_hash);

         CREATE TABLE IF NOT EXISTS chunks (
             id          INTEGER PRIMARY KEY DEFAULT nextval('chunk_seq'),
             item_id     INTEGER REFERENCES items(id),
             chunk_index INTEGER NOT NULL,
             body        TEXT NOT NULL
         );

         CREATE TABLE IF NOT EXISTS chunk_metadata (
             chunk_id               INTEGER PRIMARY KEY REFERENCES chunks(id),
             title                  TEXT NOT NULL DEFAULT '',
             summary                TEXT NOT NULL DEFAULT '',
             content_type           TEXT NOT NULL DEFAULT 'other',
             language               TEXT NOT NULL DEFAULT '',
             tags                   TEXT NOT NULL DEFAULT '',
             key_terms_json         TEXT NOT NULL DEFAULT '[]',
             entities_json          TEXT NOT NULL DEFAULT '{}',
             questions_answered_json TEXT NOT NULL DEFAULT '[]',
             contextual_dependence  TEXT NOT NULL DEFAULT 'standalone',
             positional_role        TEXT NOT NULL DEFAULT 'body',
             density_score          FLOAT NOT NULL DEFAULT 0,
             relevance_score        FLOAT NOT NULL DEFAULT 0
         );

         CREATE TABLE IF NOT EXISTS connections (
             item_a INTEGER REFERENCES items(id),
             item_b INTEGER REFERENCES items(id),
             score  FLOAT NOT NULL,
             PRIMARY KEY (item_a, item_b)
         );

         CREATE TABLE IF NOT EXISTS session_views (
             id        INTEGER PRIMARY KEY DEFAULT nextval('session_seq'),
             item_id   INTEGER REFERENCES items(id),
             viewed_at BIGINT NOT NULL
         );",
    )?;

    conn.execute_batch(&embeddings_ddl(dimension))?;
    conn.execute_batch(&item_embeddings_ddl(dimension))?;

    Ok(())
}

/// `CREATE INDEX IF NOT EXISTS` on the HNSW vector index. Safe to call
/// repeatedly; DuckDB's vss extension rejects a duplicate name quietly via
/// `CatalogException` in the Python prototype — here it surfaces as
/// `duckdb::Error`, which the caller (`Store::rebuild_vector_index`) treats
/// as success when `force` is false.
pub fn hnsw_index_ddl() -> &'static str {
    "CREATE INDEX IF NOT EXISTS emb_idx ON embeddings USING HNSW(vector) WITH (metric = 'cosine');"
}
