// src/analyzer.rs
//! Batch analysis: clean → score → classify for every non-blank document.
//!
//! The analyzer owns the most recent `RecordCollection`. A new batch is built
//! completely off to the side and swapped in with a single write, so readers
//! see either the previous collection or the new one.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::clean::clean_text;
use crate::lexicon::{LexiconScorer, SentimentScorer};
use crate::sentiment::{classify, Sentiment};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("analyzer_batches_total", "Analysis batches run.");
        describe_counter!(
            "analyzer_documents_total",
            "Documents turned into analysis records."
        );
        describe_counter!(
            "analyzer_skipped_blank_total",
            "Empty or whitespace-only documents skipped."
        );
        describe_counter!(
            "analyzer_scoring_errors_total",
            "Documents skipped because the scoring backend failed."
        );
        describe_histogram!("analyzer_batch_ms", "Batch analysis time in milliseconds.");
    });
}

/// One analyzed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Verbatim input.
    #[serde(rename = "text")]
    pub original_text: String,
    pub cleaned_text: String,
    pub sentiment: Sentiment,
    pub polarity: f64,
    pub subjectivity: f64,
}

/// Ordered records from one batch, in input order. Cloning is cheap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCollection(Arc<Vec<AnalysisRecord>>);

impl RecordCollection {
    pub fn new(records: Vec<AnalysisRecord>) -> Self {
        Self(Arc::new(records))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[AnalysisRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnalysisRecord> {
        self.0.iter()
    }

    /// Records whose label is in `labels`, order preserved. An empty filter keeps everything.
    pub fn filter_by(&self, labels: &[Sentiment]) -> RecordCollection {
        if labels.is_empty() {
            return self.clone();
        }
        let kept = self
            .iter()
            .filter(|r| labels.contains(&r.sentiment))
            .cloned()
            .collect();
        RecordCollection::new(kept)
    }
}

impl From<Vec<AnalysisRecord>> for RecordCollection {
    fn from(records: Vec<AnalysisRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a AnalysisRecord;
    type IntoIter = std::slice::Iter<'a, AnalysisRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for RecordCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

/// Short anonymized id for logs; raw document text is never logged.
pub(crate) fn anon_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub struct BatchAnalyzer<S = LexiconScorer> {
    scorer: S,
    current: RwLock<RecordCollection>,
}

impl Default for BatchAnalyzer<LexiconScorer> {
    fn default() -> Self {
        Self::new(LexiconScorer::new())
    }
}

impl<S: SentimentScorer> BatchAnalyzer<S> {
    pub fn new(scorer: S) -> Self {
        Self {
            scorer,
            current: RwLock::new(RecordCollection::default()),
        }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Analyze a single document without touching the stored collection.
    pub fn analyze_one(&self, text: &str) -> anyhow::Result<AnalysisRecord> {
        let cleaned = clean_text(text);
        let scores = self
            .scorer
            .score(&cleaned)
            .with_context(|| format!("scoring backend '{}' failed", self.scorer.name()))?;
        Ok(AnalysisRecord {
            original_text: text.to_string(),
            cleaned_text: cleaned,
            sentiment: classify(scores.polarity),
            polarity: scores.polarity,
            subjectivity: scores.subjectivity,
        })
    }

    /// Analyze `documents` in order and replace the stored collection with the result.
    ///
    /// Blank documents are skipped silently. Documents the scorer fails on are
    /// skipped with a warning; the rest of the batch still completes.
    pub fn analyze_batch<I, T>(&self, documents: I) -> RecordCollection
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        ensure_metrics_described();
        let t0 = Instant::now();

        let mut records = Vec::new();
        let mut blank = 0usize;
        let mut failed = 0usize;

        for doc in documents {
            let text = doc.as_ref();
            if text.trim().is_empty() {
                blank += 1;
                continue;
            }
            match self.analyze_one(text) {
                Ok(rec) => {
                    debug!(
                        target: "analyzer",
                        id = %anon_id(text),
                        sentiment = %rec.sentiment,
                        polarity = rec.polarity,
                        "document scored"
                    );
                    records.push(rec);
                }
                Err(e) => {
                    failed += 1;
                    warn!(target: "analyzer", id = %anon_id(text), error = ?e, "skipping document");
                }
            }
        }

        let collection = RecordCollection::new(records);
        *self.current.write() = collection.clone();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        counter!("analyzer_batches_total").increment(1);
        counter!("analyzer_documents_total").increment(collection.len() as u64);
        counter!("analyzer_skipped_blank_total").increment(blank as u64);
        counter!("analyzer_scoring_errors_total").increment(failed as u64);
        histogram!("analyzer_batch_ms").record(ms);

        info!(
            target: "analyzer",
            scorer = self.scorer.name(),
            records = collection.len(),
            blank,
            failed,
            ms,
            "batch analyzed"
        );

        collection
    }

    /// Snapshot of the collection from the last `analyze_batch` (empty before the first run).
    pub fn current_records(&self) -> RecordCollection {
        self.current.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Scores;

    /// Fails on any text containing "boom"; otherwise polarity = +0.5.
    struct FlakyScorer;

    impl SentimentScorer for FlakyScorer {
        fn score(&self, text: &str) -> anyhow::Result<Scores> {
            if text.contains("boom") {
                anyhow::bail!("backend exploded");
            }
            Ok(Scores::normalized(0.5, 0.25))
        }
        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[test]
    fn skips_blank_documents_and_keeps_order() {
        let a = BatchAnalyzer::default();
        let out = a.analyze_batch(["first", "", "   ", "\n\t", "second", "third"]);
        let texts: Vec<_> = out.iter().map(|r| r.original_text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn original_text_is_kept_verbatim() {
        let a = BatchAnalyzer::default();
        let raw = "  Loving it #great @shop http://x.co  ";
        let out = a.analyze_batch([raw]);
        assert_eq!(out.as_slice()[0].original_text, raw);
        assert_eq!(out.as_slice()[0].cleaned_text, "Loving it great");
    }

    #[test]
    fn new_batch_replaces_previous() {
        let a = BatchAnalyzer::default();
        assert!(a.current_records().is_empty());
        a.analyze_batch(["one", "two", "three"]);
        assert_eq!(a.current_records().len(), 3);
        let second = a.analyze_batch(vec!["only".to_string()]);
        assert_eq!(second.len(), 1);
        assert_eq!(a.current_records(), second);
    }

    #[test]
    fn scoring_failures_are_skipped() {
        let a = BatchAnalyzer::new(FlakyScorer);
        let out = a.analyze_batch(["fine", "boom here", "also fine"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.as_slice()[1].original_text, "also fine");
        assert!(a.analyze_one("boom").is_err());
    }

    #[test]
    fn filter_by_labels() {
        let a = BatchAnalyzer::default();
        let out = a.analyze_batch(["I love this!", "I hate this.", "It is okay."]);
        assert_eq!(out.filter_by(&[]).len(), 3);
        let neg = out.filter_by(&[Sentiment::Negative]);
        assert_eq!(neg.len(), 1);
        assert_eq!(neg.as_slice()[0].original_text, "I hate this.");
        assert_eq!(
            out.filter_by(&[Sentiment::Positive, Sentiment::Neutral]).len(),
            2
        );
    }

    #[test]
    fn record_serializes_with_text_column() {
        let a = BatchAnalyzer::default();
        let rec = a.analyze_one("great").unwrap();
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["text"], "great");
        assert_eq!(v["sentiment"], "Positive");
        assert!(v.get("original_text").is_none());
    }

    #[test]
    fn anon_id_is_short_hex() {
        let id = anon_id("secret text");
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
