use thiserror::Error;

/// The one error type returned by every public `black_vault` operation.
///
/// Variants map directly to the error kinds in the design doc: `DuplicateHash`
/// is a success path for ingestion (the caller surfaces the existing id) but
/// still prevents a second insertion; `LLMParseError` degrades callers to a
/// fallback rather than aborting; `IndexCorruption` is caught and retried once
/// inside the store before it would ever reach a caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("extracted content was empty")]
    EmptyContent,

    #[error("duplicate content, existing item id {0}")]
    DuplicateHash(i64),

    /// A write lost a race at the `items_content_hash_idx` unique
    /// constraint. Distinguished from `StoreError` so a caller that holds
    /// the store lock across its own dedup check (see `store::StoreTransaction`)
    /// can still detect a concurrent winner and resolve it to `DuplicateHash`
    /// with the winning row's id, instead of surfacing a generic storage
    /// failure.
    #[error("duplicate content hash rejected by unique constraint")]
    DuplicateHashRace,

    #[error("failed to decode content: {0}")]
    DecodeError(String),

    #[error("embedding service failed: {0}")]
    EmbedError(String),

    #[error("LLM response could not be parsed: {0}")]
    LLMParseError(String),

    #[error("store error: {0}")]
    StoreError(String),

    #[error("vector index corruption: {0}")]
    IndexCorruption(String),
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        let msg = e.to_string();
        if is_content_hash_constraint_violation(&msg) {
            Error::DuplicateHashRace
        } else {
            Error::StoreError(msg)
        }
    }
}

fn is_content_hash_constraint_violation(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("items_content_hash_idx")
        || (lower.contains("constraint") && lower.contains("content_hash"))
}

impl From<tantivy::TantivyError> for Error {
    fn from(e: tantivy::TantivyError) -> Self {
        Error::StoreError(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StoreError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
