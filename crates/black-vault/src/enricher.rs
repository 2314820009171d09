//! Enricher — turns raw chunks into structured per-chunk metadata and rolls
//! it up into item-level title/tags/summary (§4.5).

use std::collections::HashMap;
use std::sync::Arc;

use crate::chat_model::{extract_json_object, ChatModel};
use crate::error::{Error, Result};
use crate::types::{ChunkContentType, ChunkMetadata, ContextualDependence, PositionalRole};

const CHUNK_PROMPT_TEMPLATE: &str = r#"Analyze the following text chunk and respond with a single JSON object
with these exact keys: title, summary, content_type (one of narrative, code,
table, list, dialogue, reference, other), language, tags (array of strings),
key_terms (array of [term, weight] pairs, weight in 0..1), entities (object
mapping entity type to array of names), questions_answered (array of strings),
contextual_dependence (one of standalone, needs_previous, needs_next,
needs_both), positional_role (one of introduction, body, conclusion, aside),
density_score (0..1), relevance_score (0..1).

Chunk {index} of {total}:
---
{body}
---
"#;

#[derive(Clone)]
pub struct Enricher {
    chat: Arc<dyn ChatModel>,
}

impl Enricher {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Produce metadata for one chunk. On any parse failure this degrades to
    /// a conservative fallback rather than aborting ingestion — an
    /// unenriched chunk is still searchable lexically and semantically, just
    /// without the metadata-driven ranking boosts.
    pub async fn enrich_chunk(
        &self,
        chunk_id: i64,
        body: &str,
        index: usize,
        total: usize,
    ) -> ChunkMetadata {
        match self.try_enrich_chunk(chunk_id, body, index, total).await {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(chunk_id, error = %e, "chunk enrichment failed, using fallback");
                fallback_metadata(chunk_id)
            }
        }
    }

    async fn try_enrich_chunk(
        &self,
        chunk_id: i64,
        body: &str,
        index: usize,
        total: usize,
    ) -> Result<ChunkMetadata> {
        let prompt = CHUNK_PROMPT_TEMPLATE
            .replace("{index}", &(index + 1).to_string())
            .replace("{total}", &total.to_string())
            .replace("{body}", body);

        let reply = self.chat.generate(&prompt, true).await?;
        let json = extract_json_object(&reply)
            .ok_or_else(|| Error::LLMParseError("no JSON object in enrichment reply".into()))?;

        let parsed: RawChunkMetadata = serde_json::from_str(json)
            .map_err(|e| Error::LLMParseError(format!("malformed enrichment JSON: {}", e)))?;

        Ok(parsed.into_chunk_metadata(chunk_id))
    }

    /// Aggregate title/tags/summary for an item from its chunks' metadata,
    /// in chunk order. Matches the Python prototype's `enrich_item`
    /// aggregation exactly: the title is the first non-empty chunk title
    /// (falling back to "Untitled Document"), tags are lowercased and
    /// counted down to the top 5 by frequency (ties broken by first
    /// appearance), and the summary is a deterministic count string rather
    /// than any one chunk's own summary, so two vaults ingesting the same
    /// document under different chunking produce the same summary.
    pub fn aggregate_item(&self, chunk_metas: &[ChunkMetadata]) -> (String, Vec<String>, String) {
        if chunk_metas.is_empty() {
            return ("Untitled Document".to_string(), Vec::new(), "Doc aggregated from 0 chunk(s).".to_string());
        }

        let title = chunk_metas
            .iter()
            .map(|m| m.title.trim())
            .find(|t| !t.is_empty())
            .map(String::from)
            .unwrap_or_else(|| "Untitled Document".to_string());

        let mut tag_order: Vec<String> = Vec::new();
        let mut tag_counts: HashMap<String, usize> = HashMap::new();
        for meta in chunk_metas {
            for tag in &meta.tags {
                let lower = tag.to_lowercase();
                if !tag_counts.contains_key(&lower) {
                    tag_order.push(lower.clone());
                }
                *tag_counts.entry(lower).or_insert(0) += 1;
            }
        }
        // Stable sort by descending frequency; ties keep first-seen order,
        // matching Python's `Counter.most_common` over an insertion-ordered dict.
        tag_order.sort_by_key(|t| std::cmp::Reverse(tag_counts[t]));
        tag_order.truncate(5);

        let summary = format!("Doc aggregated from {} chunk(s).", chunk_metas.len());

        (title, tag_order, summary)
    }
}

fn fallback_metadata(chunk_id: i64) -> ChunkMetadata {
    ChunkMetadata {
        chunk_id,
        title: String::new(),
        summary: String::new(),
        content_type: ChunkContentType::Other,
        language: String::new(),
        tags: Vec::new(),
        key_terms: Vec::new(),
        entities: HashMap::new(),
        questions_answered: Vec::new(),
        contextual_dependence: ContextualDependence::Standalone,
        positional_role: PositionalRole::Body,
        density_score: 0.0,
        relevance_score: 0.0,
    }
}

#[derive(Debug, serde::Deserialize)]
struct RawChunkMetadata {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    content_type: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    key_terms: Vec<(String, f32)>,
    #[serde(default)]
    entities: HashMap<String, Vec<String>>,
    #[serde(default)]
    questions_answered: Vec<String>,
    #[serde(default)]
    contextual_dependence: String,
    #[serde(default)]
    positional_role: String,
    #[serde(default)]
    density_score: f32,
    #[serde(default)]
    relevance_score: f32,
}

impl RawChunkMetadata {
    fn into_chunk_metadata(self, chunk_id: i64) -> ChunkMetadata {
        ChunkMetadata {
            chunk_id,
            title: self.title,
            summary: self.summary,
            content_type: match self.content_type.as_str() {
                "code" => ChunkContentType::Code,
                "table" => ChunkContentType::Table,
                "list" => ChunkContentType::List,
                "dialogue" => ChunkContentType::Dialogue,
                "reference" => ChunkContentType::Reference,
                "narrative" => ChunkContentType::Narrative,
                _ => ChunkContentType::Other,
            },
            language: self.language,
            tags: self.tags,
            key_terms: self.key_terms,
            entities: self.entities,
            questions_answered: self.questions_answered,
            contextual_dependence: match self.contextual_dependence.as_str() {
                "needs_previous" => ContextualDependence::NeedsPrevious,
                "needs_next" => ContextualDependence::NeedsNext,
                "needs_both" => ContextualDependence::NeedsBoth,
                _ => ContextualDependence::Standalone,
            },
            positional_role: match self.positional_role.as_str() {
                "introduction" => PositionalRole::Introduction,
                "conclusion" => PositionalRole::Conclusion,
                "aside" => PositionalRole::Aside,
                _ => PositionalRole::Body,
            },
            density_score: self.density_score.clamp(0.0, 1.0),
            relevance_score: self.relevance_score.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubChat(String);

    #[async_trait]
    impl ChatModel for StubChat {
        async fn generate(&self, _prompt: &str, _json_mode: bool) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn enrich_chunk_parses_valid_json() {
        let chat = StubChat(
            r#"{"title":"Intro","summary":"An intro","content_type":"narrative",
               "language":"en","tags":["a","b"],"key_terms":[["foo",0.9]],
               "entities":{},"questions_answered":[],"contextual_dependence":"standalone",
               "positional_role":"introduction","density_score":0.5,"relevance_score":0.8}"#
                .to_string(),
        );
        let enricher = Enricher::new(Arc::new(chat));
        let meta = enricher.enrich_chunk(1, "some text", 0, 1).await;
        assert_eq!(meta.title, "Intro");
        assert_eq!(meta.positional_role, PositionalRole::Introduction);
        assert_eq!(meta.relevance_score, 0.8);
    }

    #[tokio::test]
    async fn enrich_chunk_falls_back_on_garbage() {
        let chat = StubChat("not json at all".to_string());
        let enricher = Enricher::new(Arc::new(chat));
        let meta = enricher.enrich_chunk(2, "some text", 0, 1).await;
        assert_eq!(meta.chunk_id, 2);
        assert_eq!(meta.relevance_score, 0.0);
    }

    #[test]
    fn aggregate_uses_first_nonempty_title_and_lowercased_top_tags() {
        let chat = StubChat(String::new());
        let enricher = Enricher::new(Arc::new(chat));
        let metas = vec![
            ChunkMetadata {
                relevance_score: 0.2,
                title: String::new(),
                tags: vec!["X".into()],
                ..fallback_metadata(1)
            },
            ChunkMetadata {
                relevance_score: 0.9,
                title: "second chunk title".into(),
                tags: vec!["x".into(), "y".into()],
                ..fallback_metadata(2)
            },
        ];
        let (title, tags, summary) = enricher.aggregate_item(&metas);
        assert_eq!(title, "second chunk title");
        assert_eq!(tags, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(summary, "Doc aggregated from 2 chunk(s).");
    }

    #[test]
    fn aggregate_falls_back_to_untitled_when_no_chunk_has_a_title() {
        let chat = StubChat(String::new());
        let enricher = Enricher::new(Arc::new(chat));
        let metas = vec![ChunkMetadata { title: String::new(), ..fallback_metadata(1) }];
        let (title, _tags, _summary) = enricher.aggregate_item(&metas);
        assert_eq!(title, "Untitled Document");
    }
}
