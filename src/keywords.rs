// src/keywords.rs
//! Word-frequency rankings over cleaned text, optionally per sentiment label.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::analyzer::RecordCollection;
use crate::sentiment::Sentiment;

/// Functional words excluded from rankings.
pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "is",
        "was", "are", "been", "be", "have", "has", "had", "do", "does", "did", "will", "would",
        "could", "should", "may", "might", "i", "you", "he", "she", "it", "we", "they", "this",
        "that", "these", "those",
    ]
    .into_iter()
    .collect()
});

/// Tokens this short (in characters) or shorter are never ranked.
pub const MIN_TOKEN_LEN_EXCLUSIVE: usize = 2;

fn is_keyword(token: &str) -> bool {
    token.chars().count() > MIN_TOKEN_LEN_EXCLUSIVE && !STOPWORDS.contains(token)
}

/// Top `top_n` (word, count) pairs, by count descending. Equal counts keep the
/// order in which the words first appear in the concatenated cleaned text.
pub fn top_words(
    records: &RecordCollection,
    filter: Option<Sentiment>,
    top_n: usize,
) -> Vec<(String, usize)> {
    if top_n == 0 {
        return Vec::new();
    }

    // word -> (count, first position)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut position = 0usize;

    let matching = records
        .iter()
        .filter(|r| filter.map_or(true, |f| r.sentiment == f));
    for rec in matching {
        for raw in rec.cleaned_text.split_whitespace() {
            let word = raw.to_lowercase();
            if !is_keyword(&word) {
                continue;
            }
            let entry = counts.entry(word).or_insert((0, position));
            entry.0 += 1;
            position += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(w, (count, first))| (w, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(w, count, _)| (w, count))
        .collect()
}

/// Top words for every label, in `Sentiment::ALL` order.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordBreakdown {
    pub positive: Vec<(String, usize)>,
    pub negative: Vec<(String, usize)>,
    pub neutral: Vec<(String, usize)>,
}

pub fn keyword_breakdown(records: &RecordCollection, top_n: usize) -> KeywordBreakdown {
    KeywordBreakdown {
        positive: top_words(records, Some(Sentiment::Positive), top_n),
        negative: top_words(records, Some(Sentiment::Negative), top_n),
        neutral: top_words(records, Some(Sentiment::Neutral), top_n),
    }
}
