// src/api.rs
//! JSON HTTP surface over the analyzer for the dashboard.
//!
//! One analyzer per process: every analyze endpoint replaces the stored
//! collection, and the read endpoints aggregate whatever is stored now.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::analyzer::{BatchAnalyzer, RecordCollection};
use crate::config::AppConfig;
use crate::export;
use crate::ingest::{self, PostSource, RedditClient};
use crate::keywords::{keyword_breakdown, top_words, KeywordBreakdown};
use crate::sentiment::{Sentiment, Verdict};
use crate::stats::{compute_statistics, Statistics};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<BatchAnalyzer>,
    pub source: Arc<dyn PostSource>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, source: Arc<dyn PostSource>) -> Self {
        Self {
            analyzer: Arc::new(BatchAnalyzer::default()),
            source,
            config: Arc::new(config),
        }
    }

    /// Config via `AppConfig::load_default`, Reddit credentials from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = AppConfig::load_default()?;
        let reddit = RedditClient::from_env(config.reddit.clone())?;
        Ok(Self::new(config, Arc::new(reddit)))
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/sample", get(sample))
        .route("/analyze", post(analyze))
        .route("/analyze/text", post(analyze_text))
        .route("/analyze/csv", post(analyze_csv))
        .route("/analyze/reddit", post(analyze_reddit))
        .route("/csv/columns", post(csv_columns))
        .route("/results", get(results))
        .route("/statistics", get(statistics))
        .route("/keywords", get(keywords))
        .route("/keywords/breakdown", get(breakdown))
        .route("/export/csv", get(export_csv))
        .route("/export/summary", get(export_summary))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

type ApiError = (StatusCode, String);

fn bad_request(e: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

/// Comma-separated labels; blank means no filter.
fn parse_labels(raw: Option<&str>) -> Result<Vec<Sentiment>, ApiError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Sentiment>().map_err(bad_request))
        .collect()
}

async fn sample() -> Json<Vec<&'static str>> {
    Json(ingest::SAMPLE_REVIEWS.to_vec())
}

#[derive(Deserialize)]
struct AnalyzeReq {
    texts: Vec<String>,
}

async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeReq>,
) -> Json<RecordCollection> {
    Json(state.analyzer.analyze_batch(&body.texts))
}

#[derive(Deserialize)]
struct AnalyzeTextReq {
    text: String,
}

async fn analyze_text(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeTextReq>,
) -> Result<Json<RecordCollection>, ApiError> {
    let lines = ingest::lines_from_text(&body.text);
    if lines.is_empty() {
        return Err(bad_request("no text to analyze"));
    }
    Ok(Json(state.analyzer.analyze_batch(&lines)))
}

#[derive(Deserialize)]
struct CsvReq {
    csv: String,
    #[serde(default)]
    column: String,
}

async fn csv_columns(Json(body): Json<CsvReq>) -> Result<Json<Vec<String>>, ApiError> {
    ingest::csv_columns(&body.csv).map(Json).map_err(bad_request)
}

async fn analyze_csv(
    State(state): State<AppState>,
    Json(body): Json<CsvReq>,
) -> Result<Json<RecordCollection>, ApiError> {
    let texts = ingest::texts_from_csv_column(&body.csv, &body.column).map_err(|e| {
        warn!(error = ?e, "csv upload rejected");
        bad_request(format!("{e:#}"))
    })?;
    Ok(Json(state.analyzer.analyze_batch(&texts)))
}

#[derive(Deserialize)]
struct RedditReq {
    query: String,
    #[serde(default)]
    subreddit: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct RedditResp {
    fetched: usize,
    records: RecordCollection,
}

/// When nothing is fetched the stored collection is left untouched.
async fn analyze_reddit(
    State(state): State<AppState>,
    Json(body): Json<RedditReq>,
) -> Result<Json<RedditResp>, ApiError> {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    let settings = &state.config.reddit;
    let subreddit = settings.subreddit_or_default(body.subreddit.as_deref());
    if !ingest::is_valid_subreddit(subreddit) {
        return Err(bad_request(format!("invalid subreddit name: {subreddit:?}")));
    }
    let limit = settings.clamp_limit(body.limit);

    let posts = state.source.search(query, subreddit, limit).await;
    info!(source = state.source.name(), %subreddit, limit, fetched = posts.len(), "search finished");
    if posts.is_empty() {
        return Ok(Json(RedditResp {
            fetched: 0,
            records: RecordCollection::default(),
        }));
    }
    Ok(Json(RedditResp {
        fetched: posts.len(),
        records: state.analyzer.analyze_batch(&posts),
    }))
}

#[derive(Deserialize)]
struct FilterQuery {
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    top_n: Option<usize>,
}

#[derive(Serialize)]
struct ResultsResp {
    shown: usize,
    total: usize,
    records: RecordCollection,
}

async fn results(
    State(state): State<AppState>,
    Query(q): Query<FilterQuery>,
) -> Result<Json<ResultsResp>, ApiError> {
    let labels = parse_labels(q.sentiment.as_deref())?;
    let all = state.analyzer.current_records();
    let shown = all.filter_by(&labels);
    Ok(Json(ResultsResp {
        shown: shown.len(),
        total: all.len(),
        records: shown,
    }))
}

#[derive(Serialize)]
struct StatisticsOut {
    #[serde(flatten)]
    stats: Statistics,
    verdict: Verdict,
}

async fn statistics(State(state): State<AppState>) -> Json<Option<StatisticsOut>> {
    let out = compute_statistics(&state.analyzer.current_records()).map(|stats| StatisticsOut {
        verdict: stats.verdict(),
        stats,
    });
    Json(out)
}

async fn keywords(
    State(state): State<AppState>,
    Query(q): Query<FilterQuery>,
) -> Result<Json<Vec<(String, usize)>>, ApiError> {
    let labels = parse_labels(q.sentiment.as_deref())?;
    if labels.len() > 1 {
        return Err(bad_request("at most one sentiment filter"));
    }
    let top_n = q.top_n.unwrap_or(state.config.keywords.list_top_n);
    let records = state.analyzer.current_records();
    Ok(Json(top_words(&records, labels.first().copied(), top_n)))
}

async fn breakdown(
    State(state): State<AppState>,
    Query(q): Query<FilterQuery>,
) -> Json<KeywordBreakdown> {
    let top_n = q.top_n.unwrap_or(state.config.keywords.cloud_top_n);
    Json(keyword_breakdown(&state.analyzer.current_records(), top_n))
}

fn attachment(content_type: &str, file_name: String, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}

async fn export_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let now = chrono::Local::now().naive_local();
    let csv = export::to_csv(&state.analyzer.current_records()).map_err(|e| {
        warn!(error = ?e, "csv export failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "csv export failed".to_string())
    })?;
    Ok(attachment(
        "text/csv; charset=utf-8",
        export::csv_file_name(now),
        csv,
    ))
}

async fn export_summary(State(state): State<AppState>) -> Response {
    let now = chrono::Local::now().naive_local();
    match export::summary_report(&state.analyzer.current_records(), now) {
        Some(report) => attachment(
            "text/plain; charset=utf-8",
            export::summary_file_name(now),
            report,
        ),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_list_parsing() {
        assert!(parse_labels(None).unwrap().is_empty());
        assert!(parse_labels(Some(" , ")).unwrap().is_empty());
        assert_eq!(
            parse_labels(Some("positive, Neutral")).unwrap(),
            vec![Sentiment::Positive, Sentiment::Neutral]
        );
        let err = parse_labels(Some("Positive,angry")).unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }
}
