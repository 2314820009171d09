use serde::{Deserialize, Serialize};

/// `source_type` discriminant for an [`Item`]. Stored as lowercase text in DuckDB
/// so ad-hoc filter fragments can compare it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Text,
    Image,
    Pdf,
    Audio,
    Url,
    Youtube,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Text => "text",
            SourceType::Image => "image",
            SourceType::Pdf => "pdf",
            SourceType::Audio => "audio",
            SourceType::Url => "url",
            SourceType::Youtube => "youtube",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(SourceType::Text),
            "image" => Some(SourceType::Image),
            "pdf" => Some(SourceType::Pdf),
            "audio" => Some(SourceType::Audio),
            "url" => Some(SourceType::Url),
            "youtube" => Some(SourceType::Youtube),
            _ => None,
        }
    }

    /// MIME family -> SourceType, used by the ingester to classify a path suffix.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime == "application/pdf" {
            return Some(SourceType::Pdf);
        }
        let family = mime.split('/').next().unwrap_or("");
        match family {
            "text" => Some(SourceType::Text),
            "image" => Some(SourceType::Image),
            "audio" => Some(SourceType::Audio),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub source_path: String,
    pub source_type: String,
    pub content_hash: String,
    pub title: String,
    pub tags: String,
    pub summary: String,
    pub source_mtime: i64,
    pub created_at: i64,
    pub enriched: bool,
}

impl Item {
    /// Comma-separated tags as an owned list, empty entries dropped.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: i64,
    pub item_id: i64,
    pub chunk_index: i32,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub id: i64,
    pub chunk_id: i64,
    pub item_id: i64,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEmbedding {
    pub item_id: i64,
    pub vector: Vec<f32>,
}

/// Content-type classification produced by the Enricher for a single chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkContentType {
    Narrative,
    Code,
    Table,
    List,
    Dialogue,
    Reference,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextualDependence {
    Standalone,
    NeedsPrevious,
    NeedsNext,
    NeedsBoth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionalRole {
    Introduction,
    Body,
    Conclusion,
    Aside,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_id: i64,
    pub title: String,
    pub summary: String,
    pub content_type: ChunkContentType,
    pub language: String,
    pub tags: Vec<String>,
    /// Key terms with an LLM-assigned importance weight in [0, 1].
    pub key_terms: Vec<(String, f32)>,
    pub entities: std::collections::HashMap<String, Vec<String>>,
    pub questions_answered: Vec<String>,
    pub contextual_dependence: ContextualDependence,
    pub positional_role: PositionalRole,
    /// Information density in [0, 1].
    pub density_score: f32,
    /// Estimated retrieval relevance in [0, 1].
    pub relevance_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub item_a: i64,
    pub item_b: i64,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub id: i64,
    pub item_id: i64,
    pub viewed_at: i64,
}

/// Structured parse of a natural-language query (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryIntent {
    pub semantic_query: String,
    pub lexical_synonyms: Vec<String>,
    pub filters: QueryFilters,
    pub intent: IntentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    MetadataFilter,
    SemanticSearch,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryFilters {
    /// Unix timestamp; items created strictly after this pass.
    pub created_after: Option<i64>,
    pub source_type: Option<String>,
    pub tags: Vec<String>,
}

impl QueryFilters {
    pub fn is_empty(&self) -> bool {
        self.created_after.is_none() && self.source_type.is_none() && self.tags.is_empty()
    }
}

impl QueryIntent {
    pub fn fallback(query: &str) -> Self {
        Self {
            semantic_query: query.to_string(),
            lexical_synonyms: Vec::new(),
            filters: QueryFilters::default(),
            intent: IntentKind::SemanticSearch,
        }
    }
}

/// One fused, ready-to-render search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub item_id: i64,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub snippet: String,
    pub score: f32,
    pub source_type: String,
    pub source_path: String,
}

/// Outcome record for one file submitted to the ingest queue (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub path: String,
    pub success: bool,
    pub item_id: Option<i64>,
    pub is_duplicate: bool,
    pub duplicate_id: Option<i64>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_list_trims_and_drops_empty() {
        let item = Item {
            id: 1,
            source_path: "x".into(),
            source_type: "text".into(),
            content_hash: "h".into(),
            title: "t".into(),
            tags: " a, b ,,c".into(),
            summary: "s".into(),
            source_mtime: 0,
            created_at: 0,
            enriched: false,
        };
        assert_eq!(item.tag_list(), vec!["a", "b", "c"]);
    }

    #[test]
    fn source_type_from_mime() {
        assert_eq!(SourceType::from_mime("text/plain"), Some(SourceType::Text));
        assert_eq!(
            SourceType::from_mime("application/pdf"),
            Some(SourceType::Pdf)
        );
        assert_eq!(SourceType::from_mime("application/zip"), None);
    }
}
