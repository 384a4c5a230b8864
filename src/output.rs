//! Output formatting for detection results (JSON, CSV, terminal).

use crate::models::{CorpusStats, DetectionResult, Match, MatchKind, PairReport};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write a detection result as JSON.
pub fn write_json<W: Write>(result: &DetectionResult, writer: &mut W) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(result)?;
    writer.write_all(json.as_bytes())?;
    writeln!(writer)?;
    Ok(())
}

/// Write a detection result as JSON to a file.
pub fn write_json_file(result: &DetectionResult, path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_json(result, &mut file)
}

/// Write matches as CSV. Passage columns are empty unless text was attached.
pub fn write_csv<W: Write>(matches: &[Match], writer: &mut W) -> Result<(), OutputError> {
    writeln!(
        writer,
        "id,doc_a,doc_b,start_a,end_a,start_b,end_b,byte_start_a,byte_end_a,\
         byte_start_b,byte_end_b,covered_len,seed_count,score,kind,text_a,text_b"
    )?;

    for m in matches {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{:.4},{},{},{}",
            m.id,
            csv_field(&m.name_a),
            csv_field(&m.name_b),
            m.span_a.start,
            m.span_a.end,
            m.span_b.start,
            m.span_b.end,
            m.bytes_a.0,
            m.bytes_a.1,
            m.bytes_b.0,
            m.bytes_b.1,
            m.covered_len,
            m.seed_count,
            m.score,
            kind_label(m.kind),
            csv_field(m.text_a.as_ref().map(|t| t.matched.as_str()).unwrap_or("")),
            csv_field(m.text_b.as_ref().map(|t| t.matched.as_str()).unwrap_or("")),
        )?;
    }

    Ok(())
}

/// Write matches as CSV to a file.
pub fn write_csv_file(matches: &[Match], path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_csv(matches, &mut file)
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn kind_label(kind: MatchKind) -> &'static str {
    match kind {
        MatchKind::Verbatim => "verbatim",
        MatchKind::Modified => "modified",
    }
}

/// Print a summary of the detection run.
pub fn print_summary(result: &DetectionResult) {
    let summary = &result.summary;
    let params = &result.parameters;

    println!("\n=== Detection Summary ===");
    println!("Version: {}", result.version);
    println!();
    println!(
        "Documents: {} ({} tokens), common: {}",
        summary.document_count, summary.total_tokens, summary.common_document_count
    );
    if !summary.skipped.is_empty() {
        println!("Skipped: {}", summary.skipped.len());
        for skipped in &summary.skipped {
            println!("  {}: {}", skipped.name, skipped.reason);
        }
    }
    println!();
    println!("Parameters:");
    println!("  Window size: {}", params.window_size);
    println!("  Gap tolerance: {}", params.gap_tolerance);
    println!("  Min fragment length: {}", params.min_fragment_length);
    println!("  Min similarity: {:.1}%", params.min_similarity * 100.0);
    println!("  Normalization: {:?}", params.length_normalization);
    println!("  Brute force: {}", params.brute_force);
    println!();
    println!("Results:");
    println!(
        "  Pairs compared: {}/{}{}",
        summary.pairs_compared,
        summary.candidate_pairs,
        if summary.partial { " (partial)" } else { "" }
    );
    println!("  Suspicious pairs: {}", summary.suspicious_pairs);
    println!("  Matches: {}", summary.match_count);

    if !result.pairs.is_empty() {
        println!();
        println!("Top pairs:");
        for pair in result.pairs.iter().take(10) {
            println!("  {}", format_pair(pair));
        }
    }
}

/// Format a pair report as a single line.
pub fn format_pair(pair: &PairReport) -> String {
    format!(
        "{} <-> {}: {:.1}% ({} matches, {}/{} tokens)",
        pair.name_a,
        pair.name_b,
        pair.similarity * 100.0,
        pair.match_count,
        pair.covered_a,
        pair.covered_b
    )
}

/// Format a match as a human-readable string.
pub fn format_match(m: &Match) -> String {
    let mut out = format!(
        "Match {}: {} covered={} seeds={} score={:.1}%\n\
         \x20 {} [{}..{}] <-> {} [{}..{}]",
        m.id,
        kind_label(m.kind),
        m.covered_len,
        m.seed_count,
        m.score * 100.0,
        m.name_a,
        m.span_a.start,
        m.span_a.end,
        m.name_b,
        m.span_b.start,
        m.span_b.end,
    );
    if let (Some(a), Some(b)) = (&m.text_a, &m.text_b) {
        out.push_str(&format!(
            "\n  A: {}\n  B: {}",
            truncate_text(&a.matched, 100),
            truncate_text(&b.matched, 100)
        ));
    }
    out
}

/// Print matches in a human-readable format.
pub fn print_matches(matches: &[Match], limit: Option<usize>) {
    let to_print = match limit {
        Some(n) => &matches[..n.min(matches.len())],
        None => matches,
    };

    for m in to_print {
        println!("{}", format_match(m));
    }

    if let Some(n) = limit {
        if matches.len() > n {
            println!("... and {} more matches", matches.len() - n);
        }
    }
}

/// Print corpus statistics.
pub fn print_stats(stats: &CorpusStats) {
    println!("\n=== Corpus Statistics ===");
    println!("Documents: {}", stats.document_count);
    println!("Common documents: {}", stats.common_document_count);
    println!("Skipped: {}", stats.skipped_count);
    println!("Total tokens: {}", stats.total_tokens);
    println!("Fingerprints: {}", stats.total_fingerprints);
    println!("Distinct hashes: {}", stats.distinct_hashes);
    println!("Masked hashes: {}", stats.masked_hashes);
    println!("Candidate pairs: {}", stats.candidate_pairs);
}

/// Truncate text to a maximum length, adding ellipsis if needed.
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComparisonParams, PassageText, RunSummary, Span};

    fn create_test_match() -> Match {
        Match {
            id: 1,
            doc_a: 0,
            doc_b: 1,
            name_a: "alice.txt".to_string(),
            name_b: "bob, jr.txt".to_string(),
            span_a: Span::new(10, 30),
            span_b: Span::new(12, 33),
            bytes_a: (55, 170),
            bytes_b: (60, 181),
            covered_len: 19,
            covered_ranges_a: vec![(10, 20), (21, 30)],
            covered_ranges_b: vec![(12, 22), (24, 33)],
            seed_count: 14,
            score: 0.925,
            kind: MatchKind::Modified,
            text_a: None,
            text_b: None,
        }
    }

    fn create_test_result() -> DetectionResult {
        DetectionResult {
            version: "0.1.0".to_string(),
            parameters: ComparisonParams::default(),
            summary: RunSummary {
                document_count: 2,
                common_document_count: 0,
                skipped: Vec::new(),
                total_tokens: 400,
                candidate_pairs: 1,
                pairs_compared: 1,
                suspicious_pairs: 1,
                match_count: 1,
                partial: false,
            },
            pairs: Vec::new(),
            matches: vec![create_test_match()],
        }
    }

    #[test]
    fn test_format_match() {
        let formatted = format_match(&create_test_match());
        assert!(formatted.contains("Match 1"));
        assert!(formatted.contains("modified"));
        assert!(formatted.contains("covered=19"));
        assert!(formatted.contains("score=92.5%"));
        assert!(formatted.contains("alice.txt [10..30]"));
        assert!(!formatted.contains("A: "));
    }

    #[test]
    fn test_format_match_with_text() {
        let mut m = create_test_match();
        let passage = PassageText {
            before: String::new(),
            matched: "copied words".to_string(),
            after: String::new(),
        };
        m.text_a = Some(passage.clone());
        m.text_b = Some(passage);
        let formatted = format_match(&m);
        assert!(formatted.contains("A: copied words"));
        assert!(formatted.contains("B: copied words"));
    }

    #[test]
    fn test_write_csv() {
        let matches = vec![create_test_match()];
        let mut output = Vec::new();
        write_csv(&matches, &mut output).unwrap();

        let csv = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id,doc_a,doc_b"));
        assert!(lines[1].starts_with("1,alice.txt,\"bob, jr.txt\",10,30,12,33"));
        assert!(lines[1].contains("0.9250,modified"));
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_write_json() {
        let result = create_test_result();
        let mut output = Vec::new();
        write_json(&result, &mut output).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["summary"]["match_count"], 1);
        assert_eq!(json["matches"][0]["kind"], "modified");
        assert_eq!(json["parameters"]["length_normalization"], "combined");
        assert!(json["matches"][0].get("text_a").is_none());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate_text("äöüäöüäöü", 6), "äöü...");
    }
}
