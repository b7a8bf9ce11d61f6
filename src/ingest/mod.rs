// src/ingest/mod.rs
//! Everything that turns outside input into a list of documents for the analyzer.

pub mod file;
pub mod reddit;
pub mod types;

pub use file::{csv_columns, lines_from_text, texts_from_csv_column};
pub use reddit::{is_valid_subreddit, RedditClient, RedditCredentials};
pub use types::PostSource;

/// Built-in sample reviews for trying the analyzer without any input.
pub const SAMPLE_REVIEWS: [&str; 10] = [
    "This product exceeded my expectations!",
    "Worst purchase I've ever made",
    "Arrived on time, good packaging",
    "Amazing quality for the price",
    "Customer support was unhelpful",
    "Great design and features",
    "Too expensive for what you get",
    "Fast shipping, very satisfied",
    "Product stopped working after one week",
    "Highly recommend to everyone",
];

pub fn sample_reviews() -> Vec<String> {
    SAMPLE_REVIEWS.iter().map(|s| s.to_string()).collect()
}
