//! End-to-end scenarios from the design doc's §8 ("S1"-"S6"), exercised
//! through the public facade types directly (no HTTP/CLI layer) with stub
//! embedding/chat clients so the suite needs no network access.

use std::sync::Arc;

use async_trait::async_trait;
use tempfile::tempdir;

use black_vault::chat_model::ChatModel;
use black_vault::config::Config;
use black_vault::connector::Connector;
use black_vault::consolidator::Consolidator;
use black_vault::embedder::Embedder;
use black_vault::enricher::Enricher;
use black_vault::error::Result;
use black_vault::ingester::Ingester;
use black_vault::intent::IntentParser;
use black_vault::searcher::Searcher;
use black_vault::store::Store;

/// Deterministic bag-of-words embedder: each known keyword owns a fixed
/// axis so cosine similarity reflects shared vocabulary, which is all
/// these scenarios need.
struct KeywordEmbedder;

const VOCAB: &[&str] = &["python", "javascript", "tutorial", "advanced", "notes", "buy", "eggs", "milk", "bread", "rocket"];

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut vector = vec![0.0f32; VOCAB.len()];
        for (i, word) in VOCAB.iter().enumerate() {
            if lower.contains(word) {
                vector[i] = 1.0;
            }
        }
        if vector.iter().all(|&v| v == 0.0) {
            vector[0] = 0.01;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        VOCAB.len()
    }
}

/// Chat stub that returns fixed, schema-conformant enrichment JSON
/// regardless of prompt, and passes through a trivial "merge" for
/// consolidation prompts by concatenating whatever note titles it's given.
struct StubChat;

#[async_trait]
impl ChatModel for StubChat {
    async fn generate(&self, prompt: &str, _json_mode: bool) -> Result<String> {
        if prompt.contains("Merge the following") {
            return Ok("Consolidated shopping note: eggs, milk, bread.".to_string());
        }
        // The one query this suite needs classified as something other than
        // a raw fallback: a temporal query that the classifier still calls
        // "semantic_search" rather than "metadata_filter", so s6 can exercise
        // the bypass's `created_after.is_some()` half independently of the
        // `intent == MetadataFilter` half. Every other query falls through
        // to the enrichment-shaped reply below, which fails to parse as an
        // intent and degrades to `QueryIntent::fallback`, same as before.
        if prompt.contains("Parse the following search query") && prompt.contains("last week") {
            return Ok(r#"{"semantic_query":"images","lexical_synonyms":[],
                   "filters":{"created_after":0,"source_type":"image"},
                   "intent":"semantic_search"}"#
                .to_string());
        }
        Ok(r#"{"title":"t","summary":"s","content_type":"narrative","language":"en",
               "tags":["x"],"key_terms":[],"entities":{},"questions_answered":[],
               "contextual_dependence":"standalone","positional_role":"body",
               "density_score":0.5,"relevance_score":0.5}"#
            .to_string())
    }
}

struct Harness {
    store: Arc<Store>,
    ingester: Ingester,
    searcher: Searcher,
    consolidator: Consolidator,
    _dir: tempfile::TempDir,
}

fn build_harness() -> Harness {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = dir.path().to_path_buf();
    config.db_path = dir.path().join("vault.duckdb");
    config.embedding.dimension = VOCAB.len();
    config.chunking.chunk_size = 2000;
    config.chunking.chunk_overlap = 20;
    config.connector.threshold = 0.75;

    let store = Arc::new(Store::open(&config).unwrap());
    let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder);
    let chat: Arc<dyn ChatModel> = Arc::new(StubChat);

    let ingester = Ingester::new(
        store.clone(),
        embedder.clone(),
        chat.clone(),
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
        config.connector.threshold,
    );
    let searcher = Searcher::new(store.clone(), embedder.clone(), chat.clone(), 2, 5);
    let consolidator = Consolidator::new(store.clone(), chat.clone(), ingester.clone(), 30, 0.70);

    Harness {
        store,
        ingester,
        searcher,
        consolidator,
        _dir: dir,
    }
}

#[tokio::test]
async fn s1_duplicate_ingestion_is_rejected_with_existing_id() {
    let h = build_harness();

    let first = h.ingester.ingest_text("a.txt", "text", "hello world testing", 0).await;
    assert!(first.success);
    let id = first.item_id.unwrap();

    let second = h.ingester.ingest_text("a.txt", "text", "hello world testing", 0).await;
    assert!(second.success);
    assert!(second.is_duplicate);
    assert_eq!(second.duplicate_id, Some(id));
}

#[tokio::test]
async fn s2_modified_content_produces_distinct_retrievable_items() {
    let h = build_harness();

    let original = h.ingester.ingest_text("a.txt", "text", "hello world testing one", 0).await;
    let modified = h.ingester.ingest_text("a.txt", "text", "hello world testing two", 0).await;

    assert!(original.success && modified.success);
    let id1 = original.item_id.unwrap();
    let id2 = modified.item_id.unwrap();
    assert_ne!(id1, id2);

    assert!(h.store.get_item(id1).await.unwrap().is_some());
    assert!(h.store.get_item(id2).await.unwrap().is_some());
}

#[tokio::test]
async fn s3_hybrid_search_ranks_matching_topic_first() {
    let h = build_harness();

    h.ingester.ingest_text("p1.txt", "text", "python tutorial for beginners", 0).await;
    h.ingester.ingest_text("js.txt", "text", "javascript notes and tips", 0).await;
    h.ingester.ingest_text("p2.txt", "text", "python advanced techniques", 0).await;

    let results = h.searcher.search("python", 5).await.unwrap();
    assert!(results.len() >= 2);
    let top_titles: Vec<&str> = results.iter().take(2).map(|r| r.source_path.as_str()).collect();
    assert!(top_titles.contains(&"p1.txt"));
    assert!(top_titles.contains(&"p2.txt"));
    for result in &results {
        assert!(result.score >= 0.0 && result.score <= 1.1);
    }
}

#[tokio::test]
async fn s4_consolidation_merges_similar_short_notes_and_spares_unrelated() {
    let h = build_harness();

    h.ingester.ingest_text("n1.txt", "text", "buy eggs", 0).await;
    h.ingester.ingest_text("n2.txt", "text", "buy milk", 0).await;
    h.ingester.ingest_text("n3.txt", "text", "buy bread", 0).await;
    let unrelated = h.ingester.ingest_text("n4.txt", "text", "rocket launch schedule", 0).await;
    let unrelated_id = unrelated.item_id.unwrap();

    let merged = h.consolidator.consolidate().await.unwrap();
    assert_eq!(merged, 1);

    assert!(h.store.get_item(unrelated_id).await.unwrap().is_some());
    assert_eq!(h.store.count_items().await.unwrap(), 2); // unrelated + consolidated note
}

#[tokio::test]
async fn s5_batch_failure_isolation() {
    let h = build_harness();

    let bodies = ["one", "two", "", "four", "five"];
    let mut outcomes = Vec::new();
    for (i, body) in bodies.iter().enumerate() {
        outcomes.push(h.ingester.ingest_text(&format!("f{}.txt", i), "text", body, 0).await);
    }

    assert_eq!(outcomes.len(), 5);
    assert!(!outcomes[2].success);
    for (i, outcome) in outcomes.iter().enumerate() {
        if i != 2 {
            assert!(outcome.success, "file {} should have ingested", i);
        }
    }
}

#[tokio::test]
async fn s6_temporal_query_bypasses_hybrid_retrieval_without_metadata_filter_intent() {
    let h = build_harness();

    let image = h.ingester.ingest_text("photo.png", "image", "rocket launch schedule photo", 0).await;
    assert!(image.success);
    let note = h.ingester.ingest_text("note.txt", "text", "rocket launch schedule notes", 0).await;
    assert!(note.success);

    // The classifier reports "semantic_search" for this query (see StubChat),
    // not "metadata_filter" — only `filters.created_after.is_some()` can be
    // triggering the bypass here. If it didn't, this would run through
    // hybrid retrieval and not every hit would carry a flat 1.0 score.
    let results = h.searcher.search("show me images from last week", 5).await.unwrap();

    assert!(!results.is_empty());
    for r in &results {
        assert_eq!(r.source_type, "image");
        assert_eq!(r.score, 1.0);
    }
    assert!(h.store.get_item(note.item_id.unwrap()).await.unwrap().is_some());
}

#[tokio::test]
async fn connection_is_symmetric_and_never_self_referential() {
    let h = build_harness();

    let a = h.ingester.ingest_text("a.txt", "text", "python tutorial for beginners", 0).await;
    let b = h.ingester.ingest_text("b.txt", "text", "python tutorial for beginners extended", 0).await;
    assert!(a.success && b.success);

    let connections = h.store.get_connections_for_item(a.item_id.unwrap()).await.unwrap();
    for conn in connections {
        assert_ne!(conn.item_a, conn.item_b);
        assert!(conn.item_a < conn.item_b);
    }
}

#[tokio::test]
async fn cascade_delete_removes_all_dependents() {
    let h = build_harness();

    let outcome = h.ingester.ingest_text("a.txt", "text", "hello world testing", 0).await;
    let id = outcome.item_id.unwrap();
    assert!(!h.store.get_chunks(id).await.unwrap().is_empty());

    h.store.delete_item(id).await.unwrap();

    assert!(h.store.get_item(id).await.unwrap().is_none());
    assert!(h.store.get_chunks(id).await.unwrap().is_empty());
    assert!(h.store.get_connections_for_item(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn filter_safety_against_sql_injection_style_queries() {
    let h = build_harness();
    h.ingester.ingest_text("a.txt", "text", "python tutorial for beginners", 0).await;

    for hostile in ["'; DROP TABLE items; --", "python' OR '1'='1", "-- comment"] {
        let results = h.searcher.search(hostile, 5).await;
        assert!(results.is_ok());
    }

    assert!(h.store.get_item(1).await.unwrap().is_some());
}

#[tokio::test]
async fn enricher_and_connector_wired_end_to_end_via_ingester() {
    let h = build_harness();
    let chat: Arc<dyn ChatModel> = Arc::new(StubChat);
    let _enricher = Enricher::new(chat.clone());
    let _connector = Connector::new(h.store.clone(), 0.75);
    let _intent = IntentParser::new(chat);

    let outcome = h.ingester.ingest_text("a.txt", "text", "hello world testing", 0).await;
    assert!(outcome.success);
    let item = h.store.get_item(outcome.item_id.unwrap()).await.unwrap().unwrap();
    assert!(item.enriched);
}
