// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Tolerant decoding of judge replies
//!
//! The judge is asked to answer in the shape
//!
//! ```text
//! Score (out of 10): 7
//! Explanation: Covers ownership but skips borrowing.
//! ```
//!
//! Models drift from that shape (markdown emphasis, `7/10`, missing lines),
//! so decoding never fails: when the score cannot be read the parser returns
//! [`NEUTRAL_JUDGE_SCORE`] and flags the result as not decoded.

use answergrade_core::{JudgeVerdict, ScoreSource, NEUTRAL_JUDGE_SCORE};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Highest score the judge is asked to give
pub const JUDGE_SCALE_MAX: f64 = 10.0;

/// Outcome of a tolerant decode: always a value, plus whether the required
/// field was actually found
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub ok: bool,
}

impl<T> Decoded<T> {
    pub fn parsed(value: T) -> Self {
        Self { value, ok: true }
    }

    pub fn fallback(value: T) -> Self {
        Self { value, ok: false }
    }
}

/// Line-oriented decoder for semi-structured model output
pub trait TolerantParser {
    type Output;

    /// Decode `raw`; never fails
    fn decode(&self, raw: &str) -> Decoded<Self::Output>;
}

/// Score and rationale extracted from a judge reply
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedJudgeOutput {
    /// Judge score scaled into `[0, 1]`
    pub score: f64,
    pub rationale: String,
}

/// Parser for `Score (out of 10): N` / `Explanation: ...` replies
#[derive(Debug, Clone, Copy, Default)]
pub struct JudgeScoreParser;

// A line opening with a marker word, after optional markdown decoration
const SCORE_MARKER_PATTERN: &str = r"(?i)^[\s*#_>\-]*score\b";
const EXPLANATION_MARKER_PATTERN: &str = r"(?i)^[\s*#_>\-]*explanation\b";

static SCORE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(SCORE_MARKER_PATTERN).expect("valid score marker pattern"));

static EXPLANATION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(EXPLANATION_MARKER_PATTERN).expect("valid explanation marker pattern")
});

/// Text after the first colon, with surrounding markdown emphasis removed
fn after_colon(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once(':')?;
    Some(rest.trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '_'))
}

impl JudgeScoreParser {
    pub fn new() -> Self {
        Self
    }

    fn read_score(&self, lines: &[&str]) -> Option<(usize, f64)> {
        let (index, line) = lines
            .iter()
            .enumerate()
            .find(|(_, line)| SCORE_MARKER.is_match(line))?;

        let value = after_colon(line)?;
        let numerator = value.split('/').next().unwrap_or(value);
        let numerator = numerator.trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '_');

        let score: f64 = numerator.parse().ok()?;
        if !score.is_finite() || !(0.0..=JUDGE_SCALE_MAX).contains(&score) {
            return None;
        }

        Some((index, score / JUDGE_SCALE_MAX))
    }

    fn read_rationale(&self, lines: &[&str], score_line: Option<usize>) -> String {
        if let Some(start) = lines
            .iter()
            .position(|line| EXPLANATION_MARKER.is_match(line))
        {
            let mut parts = Vec::new();
            if let Some(first) = after_colon(lines[start]) {
                parts.push(first);
            }
            parts.extend(
                lines[start + 1..]
                    .iter()
                    .filter(|line| !SCORE_MARKER.is_match(line))
                    .map(|line| line.trim()),
            );
            return parts.join("\n").trim().to_string();
        }

        lines
            .iter()
            .enumerate()
            .filter(|(i, line)| match score_line {
                Some(idx) => *i != idx,
                None => !SCORE_MARKER.is_match(line),
            })
            .map(|(_, line)| line.trim())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Decode `raw` into a verdict, tagging it parsed or fallback
    pub fn verdict(&self, raw: &str) -> JudgeVerdict {
        let decoded = self.decode(raw);
        let source = if decoded.ok {
            ScoreSource::Parsed
        } else {
            ScoreSource::Fallback
        };
        JudgeVerdict::new(raw, decoded.value.score, source, decoded.value.rationale)
    }
}

impl TolerantParser for JudgeScoreParser {
    type Output = ParsedJudgeOutput;

    fn decode(&self, raw: &str) -> Decoded<ParsedJudgeOutput> {
        let lines: Vec<&str> = raw.lines().collect();

        match self.read_score(&lines) {
            Some((index, score)) => Decoded::parsed(ParsedJudgeOutput {
                score,
                rationale: self.read_rationale(&lines, Some(index)),
            }),
            None => {
                warn!(
                    raw_len = raw.len(),
                    fallback = NEUTRAL_JUDGE_SCORE,
                    "Could not read judge score, using neutral fallback"
                );
                Decoded::fallback(ParsedJudgeOutput {
                    score: NEUTRAL_JUDGE_SCORE,
                    rationale: self.read_rationale(&lines, None),
                })
            }
        }
    }
}

/// Judge score in `[0, 1]` and whether it was actually decoded
pub fn parse_score(raw: &str) -> (f64, bool) {
    let decoded = JudgeScoreParser::new().decode(raw);
    (decoded.value.score, decoded.ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_patterns_compile_and_match() {
        assert!(Regex::new(SCORE_MARKER_PATTERN).is_ok());
        assert!(Regex::new(EXPLANATION_MARKER_PATTERN).is_ok());

        assert!(SCORE_MARKER.is_match("Score (out of 10): 7"));
        assert!(SCORE_MARKER.is_match("**score**: 7"));
        assert!(SCORE_MARKER.is_match("## Score: 7"));
        assert!(!SCORE_MARKER.is_match("Scores vary: 7"));
        assert!(!SCORE_MARKER.is_match("The score: 7"));

        assert!(EXPLANATION_MARKER.is_match("- Explanation: concise"));
        assert!(!EXPLANATION_MARKER.is_match("No explanation given"));
    }

    #[test]
    fn test_canonical_reply() {
        let (score, ok) = parse_score("Score (out of 10): 7\nExplanation: solid answer");
        assert!(ok);
        assert!((score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_slash_form() {
        let (score, ok) = parse_score("Score: 8/10\nExplanation: good");
        assert!(ok);
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_markdown_decoration() {
        let (score, ok) = parse_score("**Score:** 7\n**Explanation:** fine");
        assert!(ok);
        assert!((score - 0.7).abs() < 1e-9);

        let (score, ok) = parse_score("## score (out of 10): 9.5");
        assert!(ok);
        assert!((score - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_score_line_not_first() {
        let raw = "Here is my assessment.\n\nScore (out of 10): 6\nExplanation: partial";
        let (score, ok) = parse_score(raw);
        assert!(ok);
        assert!((score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_missing_marker_falls_back() {
        assert_eq!(parse_score("The answer was quite good overall."), (0.5, false));
        assert_eq!(parse_score(""), (0.5, false));
    }

    #[test]
    fn test_non_numeric_falls_back() {
        assert_eq!(parse_score("Score (out of 10): seven"), (0.5, false));
        assert_eq!(parse_score("Score (out of 10):"), (0.5, false));
        assert_eq!(parse_score("Score 7"), (0.5, false));
    }

    #[test]
    fn test_out_of_range_and_non_finite_fall_back() {
        assert_eq!(parse_score("Score: 11"), (0.5, false));
        assert_eq!(parse_score("Score: -1"), (0.5, false));
        assert_eq!(parse_score("Score: NaN"), (0.5, false));
        assert_eq!(parse_score("Score: inf"), (0.5, false));
    }

    #[test]
    fn test_scoring_word_is_not_marker() {
        assert_eq!(parse_score("Scoring: 9"), (0.5, false));
    }

    #[test]
    fn test_rationale_from_explanation() {
        let decoded = JudgeScoreParser::new().decode(
            "Score (out of 10): 7\nExplanation: Covers ownership.\nMisses borrowing rules.",
        );
        assert!(decoded.ok);
        assert_eq!(
            decoded.value.rationale,
            "Covers ownership.\nMisses borrowing rules."
        );
    }

    #[test]
    fn test_rationale_without_explanation_marker() {
        let decoded =
            JudgeScoreParser::new().decode("Score (out of 10): 4\nToo vague to be useful.");
        assert_eq!(decoded.value.rationale, "Too vague to be useful.");

        let fallback = JudgeScoreParser::new().decode("Score: n/a\nCould not judge.");
        assert!(!fallback.ok);
        assert_eq!(fallback.value.rationale, "Could not judge.");
    }

    #[test]
    fn test_verdict_keeps_raw_text() {
        let raw = "I cannot grade this.";
        let verdict = JudgeScoreParser::new().verdict(raw);
        assert_eq!(verdict.raw_text(), raw);
        assert_eq!(verdict.score_source(), ScoreSource::Fallback);
        assert_eq!(verdict.parsed_score(), NEUTRAL_JUDGE_SCORE);
        assert_eq!(verdict.rationale(), raw);

        let verdict = JudgeScoreParser::new().verdict("Score (out of 10): 10\nExplanation: perfect");
        assert_eq!(verdict.score_source(), ScoreSource::Parsed);
        assert_eq!(verdict.parsed_score(), 1.0);
        assert_eq!(verdict.rationale(), "perfect");
    }
}
