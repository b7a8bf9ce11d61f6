// src/sentiment.rs
//! Sentiment labels and the polarity → label classifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Polarity strictly above this is Positive.
pub const POSITIVE_THRESHOLD: f64 = 0.1;
/// Polarity strictly below this is Negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// All labels in display order.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = anyhow::Error;

    /// Case-insensitive; used for query parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            other => anyhow::bail!("unknown sentiment label: {other:?}"),
        }
    }
}

/// Map polarity to a label. Both thresholds are exclusive, so exactly ±0.1 is Neutral.
pub fn classify(polarity: f64) -> Sentiment {
    if polarity > POSITIVE_THRESHOLD {
        Sentiment::Positive
    } else if polarity < NEGATIVE_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Overall verdict for a batch: a label wins only with a strict majority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Positive,
    Negative,
    Mixed,
}

impl Verdict {
    pub fn from_percentages(positive_pct: f64, negative_pct: f64) -> Self {
        if positive_pct > 50.0 {
            Verdict::Positive
        } else if negative_pct > 50.0 {
            Verdict::Negative
        } else {
            Verdict::Mixed
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Positive => "POSITIVE",
            Verdict::Negative => "NEGATIVE",
            Verdict::Mixed => "MIXED",
        };
        f.write_str(s)
    }
}
