//! IntentParser — turns a natural-language query into structured filters
//! plus a cleaned-up semantic/lexical query (§4.7).

use std::sync::Arc;

use crate::chat_model::{extract_json_object, ChatModel};
use crate::types::{IntentKind, QueryFilters, QueryIntent};

const INTENT_PROMPT_TEMPLATE: &str = r#"Parse the following search query into a JSON object with keys:
semantic_query (string, the core information need), lexical_synonyms (array
of alternate keywords), filters (object with optional created_after as a unix
timestamp, optional source_type as one of text/image/pdf/audio/url/youtube,
and tags as an array of strings), intent (one of metadata_filter or
semantic_search — metadata_filter when the query is purely about filtering by
type/tag/date with no topical content, semantic_search otherwise).

Query: {query}
"#;

#[derive(Clone)]
pub struct IntentParser {
    chat: Arc<dyn ChatModel>,
}

impl IntentParser {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Parse `query`. Any LLM or JSON failure falls back to treating the raw
    /// query as a semantic search with no filters (§7) — search degrades
    /// gracefully rather than failing.
    pub async fn parse(&self, query: &str) -> QueryIntent {
        match self.try_parse(query).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(error = %e, "intent parse failed, falling back to raw query");
                QueryIntent::fallback(query)
            }
        }
    }

    async fn try_parse(&self, query: &str) -> crate::error::Result<QueryIntent> {
        let prompt = INTENT_PROMPT_TEMPLATE.replace("{query}", query);
        let reply = self.chat.generate(&prompt, true).await?;
        let json = extract_json_object(&reply).ok_or_else(|| {
            crate::error::Error::LLMParseError("no JSON object in intent reply".into())
        })?;
        let parsed: RawIntent = serde_json::from_str(json)
            .map_err(|e| crate::error::Error::LLMParseError(format!("malformed intent JSON: {}", e)))?;
        Ok(parsed.into_query_intent())
    }
}

#[derive(Debug, serde::Deserialize)]
struct RawIntent {
    semantic_query: String,
    #[serde(default)]
    lexical_synonyms: Vec<String>,
    #[serde(default)]
    filters: RawFilters,
    #[serde(default)]
    intent: String,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawFilters {
    created_after: Option<i64>,
    source_type: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl RawIntent {
    fn into_query_intent(self) -> QueryIntent {
        QueryIntent {
            semantic_query: self.semantic_query,
            lexical_synonyms: self.lexical_synonyms,
            filters: QueryFilters {
                created_after: self.filters.created_after,
                source_type: self.filters.source_type,
                tags: self.filters.tags,
            },
            intent: if self.intent == "metadata_filter" {
                IntentKind::MetadataFilter
            } else {
                IntentKind::SemanticSearch
            },
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
        async fn generate(&self, _prompt: &str, _json_mode: bool) -> crate::error::Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn parses_well_formed_intent() {
        let chat = StubChat(
            r#"{"semantic_query":"rust async patterns","lexical_synonyms":["tokio","futures"],
               "filters":{"source_type":"pdf","tags":["rust"]},"intent":"semantic_search"}"#
                .to_string(),
        );
        let parser = IntentParser::new(Arc::new(chat));
        let intent = parser.parse("pdfs about rust async tagged rust").await;
        assert_eq!(intent.semantic_query, "rust async patterns");
        assert_eq!(intent.filters.source_type.as_deref(), Some("pdf"));
        assert_eq!(intent.intent, IntentKind::SemanticSearch);
    }

    #[tokio::test]
    async fn falls_back_on_malformed_reply() {
        let chat = StubChat("garbage".to_string());
        let parser = IntentParser::new(Arc::new(chat));
        let intent = parser.parse("find my notes").await;
        assert_eq!(intent.semantic_query, "find my notes");
        assert!(intent.filters.is_empty());
    }
}
