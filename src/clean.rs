// src/clean.rs
//! Text cleaning applied before scoring and keyword extraction.
//!
//! Steps, in order:
//! 1) drop URL-like runs: `http…` anywhere (so `foo_http://x` loses the URL too), and
//!    `www…` at a word start so words like "awwwesome" survive; each runs to the next whitespace
//! 2) drop mentions (`@` + word characters, the username goes too)
//! 3) drop the `#` symbol but keep the hashtag word
//! 4) collapse whitespace runs to one space and trim
//!
//! The steps are re-applied until the text stops changing, so `clean_text` is
//! idempotent even for inputs like `h#ttp://x` where step 3 uncovers a URL.

use once_cell::sync::OnceCell;
use regex::Regex;

fn re_url() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?:http|\bwww)\S+").expect("valid url regex"))
}

fn re_mention() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"@\w+").expect("valid mention regex"))
}

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Normalize a raw document into the canonical form used by the scorer and the
/// keyword ranker. Never fails; `""` maps to `""`.
pub fn clean_text(text: &str) -> String {
    let mut current = clean_pass(text);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(text: &str) -> String {
    let out = re_url().replace_all(text, "");
    let out = re_mention().replace_all(&out, "");
    let out = out.replace('#', "");
    re_ws().replace_all(&out, " ").trim().to_string()
}
