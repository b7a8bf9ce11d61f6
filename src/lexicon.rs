// src/lexicon.rs
//! Polarity/subjectivity scoring.
//!
//! `SentimentScorer` is the seam for scoring backends; `LexiconScorer` is the
//! built-in one. It averages per-word (polarity, subjectivity) entries from
//! `sentiment_lexicon.json`:
//! - an intensifier right before a hit scales both values by its factor
//! - a negator within the previous 1..=3 tokens flips polarity at half strength
//!
//! Texts with no lexicon hits (including `""`) score `(0.0, 0.0)`.

use anyhow::Context;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

static DEFAULT_LEXICON: Lazy<Arc<Lexicon>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    Arc::new(Lexicon::from_json(raw).expect("valid sentiment lexicon"))
});

/// Multiplier applied to polarity when a negator precedes the word.
const NEGATION_FACTOR: f64 = -0.5;
/// How many tokens back a negator still applies.
const NEGATION_WINDOW: usize = 3;

/// Scores for one document. polarity ∈ [-1, 1], subjectivity ∈ [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub polarity: f64,
    pub subjectivity: f64,
}

impl Scores {
    /// Clamp into the contract ranges and round to 3 decimals.
    pub fn normalized(polarity: f64, subjectivity: f64) -> Self {
        Self {
            polarity: round3(polarity.clamp(-1.0, 1.0)),
            subjectivity: round3(subjectivity.clamp(0.0, 1.0)),
        }
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// A scoring backend. Implementations must be deterministic for a given text.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> anyhow::Result<Scores>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Lexicon {
    /// word -> (polarity, subjectivity)
    #[serde(default)]
    pub words: HashMap<String, (f64, f64)>,
    #[serde(default)]
    pub intensifiers: HashMap<String, f64>,
    #[serde(default)]
    pub negators: HashSet<String>,
}

impl Lexicon {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let mut lex: Lexicon = serde_json::from_str(raw).context("parsing sentiment lexicon")?;
        lex.words = lex
            .words
            .into_iter()
            .map(|(w, v)| (w.to_lowercase(), v))
            .collect();
        lex.intensifiers = lex
            .intensifiers
            .into_iter()
            .map(|(w, v)| (w.to_lowercase(), v))
            .collect();
        lex.negators = lex.negators.into_iter().map(|w| w.to_lowercase()).collect();
        Ok(lex)
    }
}

#[derive(Debug, Clone)]
pub struct LexiconScorer {
    lexicon: Arc<Lexicon>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconScorer {
    /// Scorer over the bundled lexicon.
    pub fn new() -> Self {
        Self {
            lexicon: Arc::clone(&DEFAULT_LEXICON),
        }
    }

    pub fn with_lexicon(lexicon: Lexicon) -> Self {
        Self {
            lexicon: Arc::new(lexicon),
        }
    }

    fn score_tokens(&self, tokens: &[String]) -> Scores {
        let lex = &self.lexicon;
        let mut pol_sum = 0.0;
        let mut subj_sum = 0.0;
        let mut hits = 0usize;

        for (i, tok) in tokens.iter().enumerate() {
            let Some(&(mut pol, mut subj)) = lex.words.get(tok.as_str()) else {
                continue;
            };

            if let Some(prev) = i.checked_sub(1).map(|j| tokens[j].as_str()) {
                if let Some(&factor) = lex.intensifiers.get(prev) {
                    pol *= factor;
                    subj = (subj * factor).min(1.0);
                }
            }

            let negated = (1..=NEGATION_WINDOW)
                .any(|k| i >= k && lex.negators.contains(tokens[i - k].as_str()));
            if negated {
                pol *= NEGATION_FACTOR;
            }

            pol_sum += pol;
            subj_sum += subj;
            hits += 1;
        }

        if hits == 0 {
            return Scores::default();
        }
        let n = hits as f64;
        Scores::normalized(pol_sum / n, subj_sum / n)
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> anyhow::Result<Scores> {
        let tokens: Vec<String> = tokenize(text).collect();
        Ok(self.score_tokens(&tokens))
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

/// Lower-cased word tokens; apostrophes stay inside words so "isn't" survives.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|t| t.trim_matches(|c| c == '\'' || c == '\u{2019}'))
        .filter(|t| !t.is_empty())
        .map(|t| t.replace('\u{2019}', "'").to_lowercase())
}
