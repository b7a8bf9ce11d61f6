// src/export.rs
//! Exports: full records as CSV and a plain-text summary report.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use std::fmt::Write as _;

use crate::analyzer::RecordCollection;
use crate::keywords::top_words;
use crate::sentiment::Sentiment;
use crate::stats::compute_statistics;

/// Keywords listed per label in the summary report.
pub const REPORT_TOP_WORDS: usize = 10;

/// CSV with header `text,cleaned_text,sentiment,polarity,subjectivity`.
/// An empty collection yields just the header.
pub fn to_csv(records: &RecordCollection) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    if records.is_empty() {
        wtr.write_record(["text", "cleaned_text", "sentiment", "polarity", "subjectivity"])
            .context("writing csv header")?;
    }
    for rec in records {
        wtr.serialize(rec).context("writing csv row")?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow!("flushing csv buffer: {}", e.error()))?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

pub fn csv_file_name(at: NaiveDateTime) -> String {
    format!("sentiment_analysis_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

pub fn summary_file_name(at: NaiveDateTime) -> String {
    format!("summary_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

/// Plain-text summary; `None` when there is nothing to summarize.
pub fn summary_report(records: &RecordCollection, generated_at: NaiveDateTime) -> Option<String> {
    let stats = compute_statistics(records)?;
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "SENTIMENT ANALYSIS SUMMARY");
    let _ = writeln!(out, "=========================");
    let _ = writeln!(out, "Date: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out);
    let _ = writeln!(out, "OVERVIEW");
    let _ = writeln!(out, "--------");
    let _ = writeln!(out, "Total Posts Analyzed: {}", stats.total);
    let _ = writeln!(out);
    let _ = writeln!(out, "SENTIMENT BREAKDOWN");
    let _ = writeln!(out, "------------------");
    for label in Sentiment::ALL {
        let _ = writeln!(
            out,
            "{}: {} ({:.1}%)",
            label,
            stats.count(label),
            stats.percentage(label)
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "METRICS");
    let _ = writeln!(out, "-------");
    let _ = writeln!(out, "Average Polarity: {}", stats.avg_polarity);
    let _ = writeln!(out, "Average Subjectivity: {}", stats.avg_subjectivity);
    let _ = writeln!(out);
    let _ = writeln!(out, "OVERALL SENTIMENT");
    let _ = writeln!(out, "----------------");
    let _ = writeln!(out, "{}", stats.verdict());

    for (title, label) in [
        ("TOP POSITIVE WORDS", Sentiment::Positive),
        ("TOP NEGATIVE WORDS", Sentiment::Negative),
    ] {
        let _ = writeln!(out);
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "-----------------");
        for (word, count) in top_words(records, Some(label), REPORT_TOP_WORDS) {
            let _ = writeln!(out, "- {word}: {count}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "---");
    let _ = writeln!(out, "Generated by Social Media Sentiment Analyzer");
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::BatchAnalyzer;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let a = BatchAnalyzer::default();
        let rc = a.analyze_batch(["great, really great", "awful"]);
        let csv = to_csv(&rc).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "text,cleaned_text,sentiment,polarity,subjectivity"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"great, really great\",\"great, really great\",Positive,"));
        assert!(lines.next().unwrap().starts_with("awful,awful,Negative,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn csv_of_empty_collection_is_header_only() {
        let csv = to_csv(&RecordCollection::default()).unwrap();
        assert_eq!(csv.trim_end(), "text,cleaned_text,sentiment,polarity,subjectivity");
    }

    #[test]
    fn file_names_carry_timestamp() {
        assert_eq!(csv_file_name(at()), "sentiment_analysis_20240309_140507.csv");
        assert_eq!(summary_file_name(at()), "summary_20240309_140507.txt");
    }

    #[test]
    fn summary_is_absent_without_records() {
        assert!(summary_report(&RecordCollection::default(), at()).is_none());
    }

    #[test]
    fn summary_contains_all_sections() {
        let a = BatchAnalyzer::default();
        let rc = a.analyze_batch([
            "great battery great screen",
            "amazing battery",
            "terrible support",
        ]);
        let s = summary_report(&rc, at()).unwrap();
        assert!(s.contains("Date: 2024-03-09 14:05:07"));
        assert!(s.contains("Total Posts Analyzed: 3"));
        assert!(s.contains("Positive: 2 (66.7%)"));
        assert!(s.contains("Negative: 1 (33.3%)"));
        assert!(s.contains("Neutral: 0 (0.0%)"));
        assert!(s.contains("OVERALL SENTIMENT\n----------------\nPOSITIVE"));
        assert!(s.contains("- great: 2"));
        assert!(s.contains("- battery: 2"));
        assert!(s.contains("- terrible: 1"));
        assert!(s.contains("Average Polarity: "));
    }
}
