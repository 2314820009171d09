//! Searcher — the query-time facade: intent parse, temporal bypass, hybrid
//! vector+BM25 retrieval, score fusion, and the recent-session boost (§4.8).

use std::collections::HashMap;
use std::sync::Arc;

use crate::chat_model::ChatModel;
use crate::embedder::{cosine_similarity, Embedder};
use crate::error::Result;
use crate::intent::IntentParser;
use crate::search::weighted_fusion;
use crate::store::Store;
use crate::types::{IntentKind, Item, QueryFilters, SearchResult};

/// Weight given to the semantic (vector) arm of fusion; the lexical arm gets
/// `1.0 - SEMANTIC_WEIGHT`. Fixed per §4.8's fusion formula.
const SEMANTIC_WEIGHT: f32 = 0.6;

/// Blend weights for `sem_score = CHUNK_WEIGHT * chunk + META_WEIGHT * meta`
/// when an item has a metadata vector; chunk-only otherwise (§4.8 step 3).
const CHUNK_WEIGHT: f32 = 0.7;
const META_WEIGHT: f32 = 0.3;

/// The recent-session mean vector only boosts a candidate once its cosine
/// similarity against the item's metadata vector clears this threshold; below
/// it the session contributes nothing (§4.8 step 3).
const SESSION_BOOST_THRESHOLD: f32 = 0.4;
const SESSION_BOOST_SCALE: f32 = 0.4;

const SNIPPET_LEN: usize = 240;

pub struct Searcher {
    store: Arc<Store>,
    embedder: Arc<dyn Embedder>,
    intent_parser: IntentParser,
    candidate_multiplier: usize,
    session_window: usize,
}

impl Searcher {
    pub fn new(
        store: Arc<Store>,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        candidate_multiplier: usize,
        session_window: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            intent_parser: IntentParser::new(chat),
            candidate_multiplier: candidate_multiplier.max(1),
            session_window,
        }
    }

    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let intent = self.intent_parser.parse(query).await;

        // Bypass hybrid retrieval whenever there's no topical query to embed:
        // either the intent classifier said so, or a date filter was set
        // directly (§4.8 step 1 — "if `created_after` is set, or if intent is
        // `metadata_filter`").
        if intent.intent == IntentKind::MetadataFilter || intent.filters.created_after.is_some() {
            return self.metadata_filter_search(&intent.filters, k).await;
        }

        let candidate_k = k * self.candidate_multiplier;

        let query_vector = self.embedder.embed(&intent.semantic_query).await?;
        let vector_hits = self.store.search_vector(&query_vector, candidate_k).await?;

        let lexical_query = if intent.lexical_synonyms.is_empty() {
            intent.semantic_query.clone()
        } else {
            format!("{} {}", intent.semantic_query, intent.lexical_synonyms.join(" "))
        };
        let bm25_hits = self.store.text_index().search(&lexical_query, candidate_k)?;

        let mut chunk_to_item: HashMap<i64, i64> = HashMap::new();
        for (chunk_id, item_id, _) in &vector_hits {
            chunk_to_item.insert(*chunk_id, *item_id);
        }
        for (chunk_id, _) in &bm25_hits {
            if !chunk_to_item.contains_key(chunk_id) {
                if let Some((item_id, _)) = self.store.get_chunk(*chunk_id).await? {
                    chunk_to_item.insert(*chunk_id, item_id);
                }
            }
        }

        let session_vector = self.store.recent_session_vector(self.session_window).await?;

        // Collapse chunk-level vector hits to a per-item semantic score,
        // blending chunk similarity with the item's metadata-vector
        // similarity to the query (when one exists) and folding in the
        // threshold-gated recency boost (§4.8 step 3).
        let mut best_chunk_per_item: HashMap<i64, (i64, f32)> = HashMap::new();
        for (chunk_id, item_id, chunk_score) in &vector_hits {
            let item_vector = self.store.get_item_embedding(*item_id).await?;
            let mut sem_score = match &item_vector {
                Some(meta_vec) => {
                    let meta_score = cosine_similarity(&query_vector, meta_vec);
                    CHUNK_WEIGHT * chunk_score + META_WEIGHT * meta_score
                }
                None => *chunk_score,
            };
            if let (Some(session), Some(meta_vec)) = (&session_vector, &item_vector) {
                let session_score = cosine_similarity(session, meta_vec);
                if session_score > SESSION_BOOST_THRESHOLD {
                    sem_score += (session_score - SESSION_BOOST_THRESHOLD) * SESSION_BOOST_SCALE;
                }
            }
            best_chunk_per_item
                .entry(*item_id)
                .and_modify(|(best_chunk, best_score)| {
                    if sem_score > *best_score {
                        *best_chunk = *chunk_id;
                        *best_score = sem_score;
                    }
                })
                .or_insert((*chunk_id, sem_score));
        }

        // Collapse chunk-level BM25 hits to a per-item best lexical score.
        let mut best_bm25_per_item: HashMap<i64, (i64, f32)> = HashMap::new();
        for (chunk_id, score) in &bm25_hits {
            let Some(&item_id) = chunk_to_item.get(chunk_id) else {
                continue;
            };
            best_bm25_per_item
                .entry(item_id)
                .and_modify(|(best_chunk, best_score)| {
                    if score > best_score {
                        *best_chunk = *chunk_id;
                        *best_score = *score;
                    }
                })
                .or_insert((*chunk_id, *score));
        }

        let vector_pairs: Vec<(String, f32)> = best_chunk_per_item
            .iter()
            .map(|(item_id, (_, score))| (item_id.to_string(), *score))
            .collect();
        let bm25_pairs: Vec<(String, f32)> = best_bm25_per_item
            .iter()
            .map(|(item_id, (_, score))| (item_id.to_string(), *score))
            .collect();

        let fused = weighted_fusion(vector_pairs, bm25_pairs, SEMANTIC_WEIGHT, candidate_k);

        let mut chunk_for_item: HashMap<i64, i64> = HashMap::new();
        for (item_id, (chunk_id, _)) in &best_chunk_per_item {
            chunk_for_item.insert(*item_id, *chunk_id);
        }
        for (item_id, (chunk_id, _)) in &best_bm25_per_item {
            chunk_for_item.entry(*item_id).or_insert(*chunk_id);
        }

        let mut scored: Vec<(i64, i64, f32)> = Vec::with_capacity(fused.len());
        for (item_id_str, score, _source) in fused {
            let Ok(item_id) = item_id_str.parse::<i64>() else {
                continue;
            };
            let Some(&chunk_id) = chunk_for_item.get(&item_id) else {
                continue;
            };
            scored.push((item_id, chunk_id, score));
        }
        scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

        // Fetch every candidate's item up front and apply filters before
        // truncating to `k` — truncating first could discard a
        // filter-matching candidate in favor of one that gets rejected,
        // silently returning fewer than `k` results.
        let item_ids: Vec<i64> = scored.iter().map(|(id, _, _)| *id).collect();
        let items = self.store.get_items(&item_ids).await?;
        let items_by_id: HashMap<i64, Item> = items.into_iter().map(|i| (i.id, i)).collect();

        let mut results = Vec::with_capacity(k);
        for (item_id, chunk_id, score) in scored {
            if results.len() >= k {
                break;
            }
            let Some(item) = items_by_id.get(&item_id) else {
                continue;
            };
            if !matches_filters(item, &intent.filters) {
                continue;
            }
            let snippet = self
                .store
                .get_chunk(chunk_id)
                .await?
                .map(|(_, body)| truncate_snippet(&body))
                .unwrap_or_default();

            results.push(SearchResult {
                item_id,
                title: item.title.clone(),
                summary: item.summary.clone(),
                tags: item.tag_list(),
                snippet,
                score,
                source_type: item.source_type.clone(),
                source_path: item.source_path.clone(),
            });
        }

        Ok(results)
    }

    /// Temporal/metadata-only bypass: skip retrieval entirely and filter the
    /// item list directly (§4.8) — there is no topical query to embed.
    async fn metadata_filter_search(&self, filters: &QueryFilters, k: usize) -> Result<Vec<SearchResult>> {
        let items = self.store.list_items(k.max(100), 0).await?;
        let results = items
            .into_iter()
            .filter(|item| matches_filters(item, filters))
            .take(k)
            .map(|item| SearchResult {
                item_id: item.id,
                title: item.title.clone(),
                summary: item.summary.clone(),
                tags: item.tag_list(),
                snippet: item.summary.clone(),
                score: 1.0,
                source_type: item.source_type.clone(),
                source_path: item.source_path.clone(),
            })
            .collect();
        Ok(results)
    }

    pub async fn log_view(&self, item_id: i64) -> Result<()> {
        self.store.log_view(item_id).await
    }
}

fn matches_filters(item: &Item, filters: &QueryFilters) -> bool {
    if let Some(after) = filters.created_after {
        if item.created_at <= after {
            return false;
        }
    }
    if let Some(source_type) = &filters.source_type {
        if &item.source_type != source_type {
            return false;
        }
    }
    if !filters.tags.is_empty() {
        let item_tags = item.tag_list();
        if !filters.tags.iter().all(|t| item_tags.contains(t)) {
            return false;
        }
    }
    true
}

fn truncate_snippet(body: &str) -> String {
    if body.len() <= SNIPPET_LEN {
        return body.to_string();
    }
    let mut end = SNIPPET_LEN;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_reject_wrong_source_type() {
        let item = Item {
            id: 1,
            source_path: "p".into(),
            source_type: "pdf".into(),
            content_hash: "h".into(),
            title: "t".into(),
            tags: "a,b".into(),
            summary: "s".into(),
            source_mtime: 0,
            created_at: 100,
            enriched: true,
        };
        let mut filters = QueryFilters::default();
        filters.source_type = Some("text".to_string());
        assert!(!matches_filters(&item, &filters));

        filters.source_type = Some("pdf".to_string());
        assert!(matches_filters(&item, &filters));
    }

    #[test]
    fn filters_require_all_tags_present() {
        let item = Item {
            id: 1,
            source_path: "p".into(),
            source_type: "text".into(),
            content_hash: "h".into(),
            title: "t".into(),
            tags: "a,b".into(),
            summary: "s".into(),
            source_mtime: 0,
            created_at: 100,
            enriched: true,
        };
        let mut filters = QueryFilters::default();
        filters.tags = vec!["a".to_string(), "c".to_string()];
        assert!(!matches_filters(&item, &filters));
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let body = "a".repeat(500);
        let snippet = truncate_snippet(&body);
        assert!(snippet.len() <= SNIPPET_LEN + "…".len());
    }
}
