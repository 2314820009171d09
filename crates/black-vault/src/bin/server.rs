//! HTTP surface for Black Vault: search, ingest, document management, and
//! on-demand consolidation.

use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, Query, State as AxumState},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use black_vault::config::Config;
use black_vault::BlackVault;

#[derive(Clone)]
struct AppState {
    vault: Arc<BlackVault>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
    #[serde(default = "default_k")]
    k: usize,
}

fn default_k() -> usize {
    10
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: e.to_string() }),
    )
}

async fn search(
    AxumState(state): AxumState<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Vec<black_vault::SearchResult>> {
    let results = state
        .vault
        .search(&params.q, params.k)
        .await
        .map_err(internal_error)?;
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
struct IngestTextRequest {
    source_path: String,
    text: String,
}

async fn ingest_text(
    AxumState(state): AxumState<AppState>,
    Json(payload): Json<IngestTextRequest>,
) -> ApiResult<black_vault::IngestOutcome> {
    let path = std::path::PathBuf::from(&payload.source_path);
    let outcome = state.vault.ingest_file(&path, &payload.text).await;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct IngestUrlRequest {
    url: String,
}

async fn ingest_url(
    AxumState(state): AxumState<AppState>,
    Json(payload): Json<IngestUrlRequest>,
) -> ApiResult<black_vault::IngestOutcome> {
    // Page fetching/extraction is an external collaborator outside this
    // crate's scope (§2 Non-goals); the body here is a placeholder for the
    // already-extracted page text.
    let text = fetch_and_extract(&payload.url).await.map_err(internal_error)?;
    let outcome = state.vault.ingest_text(&payload.url, "url", &text).await;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct IngestYoutubeRequest {
    url: String,
    transcript: String,
}

async fn ingest_youtube(
    AxumState(state): AxumState<AppState>,
    Json(payload): Json<IngestYoutubeRequest>,
) -> ApiResult<black_vault::IngestOutcome> {
    // Transcript fetching is an external collaborator (`original_source`'s
    // youtube.py equivalent); the caller supplies the transcript already
    // extracted.
    let outcome = state
        .vault
        .ingest_text(&payload.url, "youtube", &payload.transcript)
        .await;
    Ok(Json(outcome))
}

async fn fetch_and_extract(url: &str) -> Result<String, String> {
    let response = reqwest::get(url).await.map_err(|e| e.to_string())?;
    let body = response.text().await.map_err(|e| e.to_string())?;
    Ok(strip_html(&body))
}

/// Drop `<script>`/`<style>` blocks and remaining tags from a fetched page.
/// Real-world HTML parsing (entity decoding, malformed markup recovery) is
/// an external collaborator's job (§1 Non-goals); this is the thin
/// best-effort cleanup the HTTP router itself is responsible for.
fn strip_html(html: &str) -> String {
    let without_scripts = regex::Regex::new(r"(?is)<(script|style)[^>]*>.*?</\1>")
        .unwrap()
        .replace_all(html, "");
    let without_tags = regex::Regex::new(r"(?s)<[^>]+>").unwrap().replace_all(&without_scripts, " ");
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Deserialize)]
struct IngestBatchRequest {
    items: Vec<IngestTextRequest>,
}

async fn ingest_batch(
    AxumState(state): AxumState<AppState>,
    Json(payload): Json<IngestBatchRequest>,
) -> ApiResult<Vec<black_vault::IngestOutcome>> {
    let jobs = payload
        .items
        .into_iter()
        .map(|item| black_vault::ingest_queue::IngestJob {
            source_path: item.source_path,
            source_type: "text".to_string(),
            text: item.text,
            source_mtime: chrono::Utc::now().timestamp(),
        })
        .collect();

    let outcomes = state
        .vault
        .ingest_queue
        .submit_batch(jobs)
        .await
        .map_err(internal_error)?;
    Ok(Json(outcomes))
}

#[derive(Debug, Serialize)]
struct DocumentDetail {
    #[serde(flatten)]
    item: black_vault::Item,
    full_text: String,
    connections: Vec<i64>,
}

async fn get_document(
    AxumState(state): AxumState<AppState>,
    AxumPath(id): AxumPath<i64>,
) -> ApiResult<DocumentDetail> {
    let item = state.vault.store.get_item(id).await.map_err(internal_error)?;
    match item {
        Some(item) => {
            let chunks = state.vault.store.get_chunks(id).await.map_err(internal_error)?;
            let full_text = chunks
                .into_iter()
                .map(|(_, _, body)| body)
                .collect::<Vec<_>>()
                .join("\n");
            let connections = state
                .vault
                .store
                .get_connections_for_item(id)
                .await
                .map_err(internal_error)?
                .into_iter()
                .map(|c| if c.item_a == id { c.item_b } else { c.item_a })
                .collect();
            Ok(Json(DocumentDetail { item, full_text, connections }))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no item with id {}", id),
            }),
        )),
    }
}

async fn delete_document(
    AxumState(state): AxumState<AppState>,
    AxumPath(id): AxumPath<i64>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    state.vault.store.delete_item(id).await.map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct TagRequest {
    tags: Vec<String>,
}

async fn set_document_tags(
    AxumState(state): AxumState<AppState>,
    AxumPath(id): AxumPath<i64>,
    Json(payload): Json<TagRequest>,
) -> ApiResult<black_vault::Item> {
    let item = state
        .vault
        .store
        .get_item(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("no item with id {}", id),
                }),
            )
        })?;

    state
        .vault
        .store
        .update_item_enrichment(id, &item.title, &payload.tags.join(","), &item.summary)
        .await
        .map_err(internal_error)?;

    let updated = state
        .vault
        .store
        .get_item(id)
        .await
        .map_err(internal_error)?
        .expect("item just updated must still exist");
    Ok(Json(updated))
}

#[derive(Debug, Serialize)]
struct ConsolidateResponse {
    merged_clusters: usize,
}

async fn consolidate(AxumState(state): AxumState<AppState>) -> ApiResult<ConsolidateResponse> {
    let merged = state.vault.consolidate().await.map_err(internal_error)?;
    Ok(Json(ConsolidateResponse { merged_clusters: merged }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env_and_file().map_err(|e| format!("config error: {}", e))?;
    let vault = Arc::new(BlackVault::open(config)?);
    let state = AppState { vault };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = Router::new()
        .route("/search", get(search))
        .route("/ingest", post(ingest_text))
        .route("/ingest/url", post(ingest_url))
        .route("/ingest/youtube", post(ingest_youtube))
        .route("/ingest/batch", post(ingest_batch))
        .route("/document/{id}", get(get_document))
        .route("/document/{id}", delete(delete_document))
        .route("/document/{id}/tags", post(set_document_tags))
        .route("/consolidate", post(consolidate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:7420").await?;
    tracing::info!("black-vault server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
