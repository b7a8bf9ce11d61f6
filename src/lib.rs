// src/lib.rs
// Public library surface for the binary, integration tests and reuse outside the HTTP layer.

pub mod analyzer;
pub mod api;
pub mod clean;
pub mod config;
pub mod export;
pub mod ingest;
pub mod keywords;
pub mod lexicon;
pub mod metrics;
pub mod sentiment;
pub mod stats;

// ---- Re-exports for stable public API ----
pub use crate::analyzer::{AnalysisRecord, BatchAnalyzer, RecordCollection};
pub use crate::api::{create_router, AppState};
pub use crate::clean::clean_text;
pub use crate::config::AppConfig;
pub use crate::keywords::{keyword_breakdown, top_words};
pub use crate::lexicon::{LexiconScorer, Scores, SentimentScorer};
pub use crate::sentiment::{classify, Sentiment, Verdict};
pub use crate::stats::{compute_statistics, Statistics};

use tracing::info;

/// Build the full router the binary serves (config + Reddit client from the environment).
/// Does not install the metrics recorder; the binary does that once per process.
pub fn app() -> anyhow::Result<axum::Router> {
    let state = AppState::from_env()?;
    info!(
        reddit_configured = ingest::RedditCredentials::from_env().is_some(),
        default_subreddit = %state.config.reddit.default_subreddit,
        "app state ready"
    );
    Ok(create_router(state))
}
