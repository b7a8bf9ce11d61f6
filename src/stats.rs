// src/stats.rs
//! Summary statistics over a record collection.
//!
//! Rounding is half-away-from-zero everywhere (`f64::round` on the scaled value):
//! percentages to 1 decimal, means to 3 decimals.

use serde::Serialize;

use crate::analyzer::RecordCollection;
use crate::sentiment::{Sentiment, Verdict};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub neutral_pct: f64,
    pub avg_polarity: f64,
    pub avg_subjectivity: f64,
}

impl Statistics {
    pub fn count(&self, label: Sentiment) -> usize {
        match label {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    pub fn percentage(&self, label: Sentiment) -> f64 {
        match label {
            Sentiment::Positive => self.positive_pct,
            Sentiment::Negative => self.negative_pct,
            Sentiment::Neutral => self.neutral_pct,
        }
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_percentages(self.positive_pct, self.negative_pct)
    }
}

pub fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}

/// `None` when there are no records; "no data" is never reported as zeros.
pub fn compute_statistics(records: &RecordCollection) -> Option<Statistics> {
    if records.is_empty() {
        return None;
    }

    let total = records.len();
    let (mut positive, mut negative, mut neutral) = (0usize, 0usize, 0usize);
    let mut pol_sum = 0.0;
    let mut subj_sum = 0.0;

    for r in records {
        match r.sentiment {
            Sentiment::Positive => positive += 1,
            Sentiment::Negative => negative += 1,
            Sentiment::Neutral => neutral += 1,
        }
        pol_sum += r.polarity;
        subj_sum += r.subjectivity;
    }

    let pct = |n: usize| round_to(n as f64 / total as f64 * 100.0, 1);
    let n = total as f64;

    Some(Statistics {
        total,
        positive,
        negative,
        neutral,
        positive_pct: pct(positive),
        negative_pct: pct(negative),
        neutral_pct: pct(neutral),
        avg_polarity: round_to(pol_sum / n, 3),
        avg_subjectivity: round_to(subj_sum / n, 3),
    })
}
