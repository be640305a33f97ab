//! Document cleaning pipeline
//!
//! Normalizes raw scraped markup before chunking. The pipeline is a pure,
//! deterministic function of its input: markup stripping, artifact cleanup,
//! noise-pattern normalization, and noise-line removal, applied in that
//! fixed order. An LLM-based final pass is an extension point and currently
//! an identity transform.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Per-document report of what cleaning did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Input length in characters
    pub original_length: usize,
    /// Output length in characters
    pub final_length: usize,
    /// Size reduction in percent, rounded to two decimals (0 for empty input)
    pub reduction_percentage: f64,
    /// Pipeline stages applied, in order
    pub steps_applied: Vec<String>,
    /// Whether the LLM final pass ran (extension point, always false)
    pub llm_used: bool,
}

/// Cleans documents by removing markup artifacts and noise
pub struct DocumentCleaner {
    entity_re: Regex,
    tag_re: Regex,
    blank_run_re: Regex,
    line_number_re: Regex,
    exclamation_re: Regex,
    question_re: Regex,
    newline_run_re: Regex,
    symbol_line_re: Regex,
    digit_line_re: Regex,
}

impl Default for DocumentCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCleaner {
    pub fn new() -> Self {
        // The patterns are fixed literals, so compilation cannot fail.
        Self {
            entity_re: Regex::new(r"&(#x?[0-9a-fA-F]+|[a-zA-Z]+);").unwrap(),
            tag_re: Regex::new(r"<[^>]+>").unwrap(),
            blank_run_re: Regex::new(r"\n\s*\n\s*\n+").unwrap(),
            line_number_re: Regex::new(r"(?m)^\s*\d+\.\s*$").unwrap(),
            exclamation_re: Regex::new(r"!{4,}").unwrap(),
            question_re: Regex::new(r"\?{4,}").unwrap(),
            newline_run_re: Regex::new(r"\n\s*\n\s*\n\s*\n+").unwrap(),
            symbol_line_re: Regex::new(r"^\W*$").unwrap(),
            digit_line_re: Regex::new(r"^\d+$").unwrap(),
        }
    }

    /// Run the full cleaning pipeline and report what it did.
    pub fn clean(&self, text: &str) -> (String, CleaningReport) {
        let original_length = text.chars().count();
        let mut steps_applied = Vec::new();

        let text = self.strip_markup(text);
        steps_applied.push("markup_removal".to_string());

        let text = self.clean_artifacts(&text);
        steps_applied.push("artifact_cleanup".to_string());

        let text = self.normalize_noise(&text);
        steps_applied.push("noise_normalization".to_string());

        let text = self.drop_noise_lines(&text);
        steps_applied.push("noise_line_removal".to_string());

        let final_length = text.chars().count();
        let reduction_percentage = if original_length == 0 {
            0.0
        } else {
            let raw = (original_length - final_length) as f64 / original_length as f64 * 100.0;
            (raw * 100.0).round() / 100.0
        };

        let report = CleaningReport {
            original_length,
            final_length,
            reduction_percentage,
            steps_applied,
            llm_used: false,
        };

        (text, report)
    }

    /// Decode HTML entities, then remove all markup tags.
    fn strip_markup(&self, text: &str) -> String {
        let decoded = self.entity_re.replace_all(text, |caps: &Captures| {
            decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        });
        self.tag_re.replace_all(&decoded, "").into_owned()
    }

    /// Collapse runs of blank lines and delete copy-paste line-number residue.
    fn clean_artifacts(&self, text: &str) -> String {
        let text = self.blank_run_re.replace_all(text, "\n\n");
        let text = self.line_number_re.replace_all(&text, "");
        text.trim().to_string()
    }

    /// Clamp excessive punctuation and extreme newline runs.
    fn normalize_noise(&self, text: &str) -> String {
        let text = self.exclamation_re.replace_all(text, "!!!");
        let text = self.question_re.replace_all(&text, "???");
        let text = self.newline_run_re.replace_all(&text, "\n\n\n");
        text.trim().to_string()
    }

    /// Remove lines that carry no real content.
    fn drop_noise_lines(&self, text: &str) -> String {
        let kept: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !self.is_noise_line(line))
            .collect();
        kept.join("\n")
    }

    fn is_noise_line(&self, line: &str) -> bool {
        let char_count = line.chars().count();

        // Too short to carry meaning
        if char_count < 3 {
            return true;
        }
        // Only punctuation or symbols
        if self.symbol_line_re.is_match(line) {
            return true;
        }
        // Only digits
        if self.digit_line_re.is_match(line) {
            return true;
        }
        // Repeated-character noise
        let distinct: HashSet<char> = line.chars().collect();
        if distinct.len() <= 2 && char_count > 5 {
            return true;
        }

        false
    }
}

/// Decode a single HTML entity body (without `&`/`;`).
fn decode_entity(body: &str) -> Option<String> {
    let decoded = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)?
        }
    };
    Some(decoded.to_string())
}
