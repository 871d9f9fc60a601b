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

//! Score records produced by a scoring call
//!
//! Everything here is built once per request and is read-only afterwards.
//! Scores are kept in `[0, 1]`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::{FusionPreset, FusionWeights};

/// Clamp a score into `[0, 1]`, mapping NaN to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Lexical overlap variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LexicalVariant {
    /// Unigram overlap
    #[serde(rename = "rouge-1")]
    Rouge1,
    /// Bigram overlap
    #[serde(rename = "rouge-2")]
    Rouge2,
    /// Longest common subsequence overlap
    #[serde(rename = "rouge-l")]
    RougeL,
}

impl LexicalVariant {
    pub const ALL: [LexicalVariant; 3] = [
        LexicalVariant::Rouge1,
        LexicalVariant::Rouge2,
        LexicalVariant::RougeL,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LexicalVariant::Rouge1 => "rouge-1",
            LexicalVariant::Rouge2 => "rouge-2",
            LexicalVariant::RougeL => "rouge-l",
        }
    }
}

impl fmt::Display for LexicalVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// F-measure per lexical variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<LexicalVariant, f64>",
    into = "BTreeMap<LexicalVariant, f64>"
)]
pub struct LexicalScoreSet {
    scores: BTreeMap<LexicalVariant, f64>,
}

impl From<BTreeMap<LexicalVariant, f64>> for LexicalScoreSet {
    fn from(scores: BTreeMap<LexicalVariant, f64>) -> Self {
        let get = |variant| scores.get(&variant).copied().unwrap_or(0.0);
        Self::new(
            get(LexicalVariant::Rouge1),
            get(LexicalVariant::Rouge2),
            get(LexicalVariant::RougeL),
        )
    }
}

impl From<LexicalScoreSet> for BTreeMap<LexicalVariant, f64> {
    fn from(set: LexicalScoreSet) -> Self {
        set.scores
    }
}

impl LexicalScoreSet {
    pub fn new(rouge_1: f64, rouge_2: f64, rouge_l: f64) -> Self {
        let mut scores = BTreeMap::new();
        scores.insert(LexicalVariant::Rouge1, clamp_unit(rouge_1));
        scores.insert(LexicalVariant::Rouge2, clamp_unit(rouge_2));
        scores.insert(LexicalVariant::RougeL, clamp_unit(rouge_l));
        Self { scores }
    }

    /// A set where every variant scored 0
    pub fn zeros() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn get(&self, variant: LexicalVariant) -> f64 {
        self.scores.get(&variant).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LexicalVariant, f64)> + '_ {
        self.scores.iter().map(|(variant, score)| (*variant, *score))
    }

    /// True when no variant found any overlap
    pub fn all_zero(&self) -> bool {
        self.scores.values().all(|score| *score == 0.0)
    }
}

/// Cosine similarity between reference and candidate embeddings, clamped to `[0, 1]`
///
/// Raw cosine lives in `[-1, 1]`; opposing directions carry no credit, so
/// negative values are stored as 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct SemanticScore(f64);

impl From<f64> for SemanticScore {
    fn from(cosine: f64) -> Self {
        Self::from_cosine(cosine)
    }
}

impl From<SemanticScore> for f64 {
    fn from(score: SemanticScore) -> Self {
        score.0
    }
}

impl SemanticScore {
    pub fn from_cosine(cosine: f64) -> Self {
        Self(clamp_unit(cosine))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Where a judge verdict's numeric score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Decoded from the judge's response
    Parsed,
    /// Judge responded but the score could not be decoded
    Fallback,
    /// Judge could not be reached; neutral score substituted
    Unavailable,
}

/// The rubric judge's output and the score derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawJudgeVerdict")]
pub struct JudgeVerdict {
    raw_text: String,
    parsed_score: f64,
    score_source: ScoreSource,
    rationale: String,
}

#[derive(Deserialize)]
struct RawJudgeVerdict {
    raw_text: String,
    parsed_score: f64,
    score_source: ScoreSource,
    #[serde(default)]
    rationale: String,
}

impl From<RawJudgeVerdict> for JudgeVerdict {
    fn from(raw: RawJudgeVerdict) -> Self {
        Self::new(raw.raw_text, raw.parsed_score, raw.score_source, raw.rationale)
    }
}

impl JudgeVerdict {
    pub fn new(
        raw_text: impl Into<String>,
        parsed_score: f64,
        score_source: ScoreSource,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            parsed_score: clamp_unit(parsed_score),
            score_source,
            rationale: rationale.into(),
        }
    }

    /// Unmodified judge output
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn parsed_score(&self) -> f64 {
        self.parsed_score
    }

    pub fn score_source(&self) -> ScoreSource {
        self.score_source
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    /// True when the score was decoded from the judge's text
    pub fn is_parsed(&self) -> bool {
        self.score_source == ScoreSource::Parsed
    }
}

/// Independent scoring signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Lexical,
    Semantic,
    Judge,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Lexical => f.write_str("lexical"),
            Signal::Semantic => f.write_str("semantic"),
            Signal::Judge => f.write_str("judge"),
        }
    }
}

/// A signal that could not be produced, and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalFailure {
    pub signal: Signal,
    pub reason: String,
}

impl SignalFailure {
    pub fn new(signal: Signal, reason: impl Into<String>) -> Self {
        Self {
            signal,
            reason: reason.into(),
        }
    }
}

/// The weighting that produced a final score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedFusion {
    /// Configured preset
    pub preset: FusionPreset,
    /// Weights actually used, after redistribution for missing signals
    pub weights: FusionWeights,
    /// Lexical scalar fed into the blend (mean of non-zero variants, or the floor)
    pub lexical_scalar: f64,
}

/// Final, serializable outcome of scoring one answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEvaluationResult")]
pub struct EvaluationResult {
    final_score: f64,
    lexical_scores: LexicalScoreSet,
    semantic_score: Option<SemanticScore>,
    judge_verdict: Option<JudgeVerdict>,
    fusion: AppliedFusion,
    degraded_signals: Vec<SignalFailure>,
}

#[derive(Deserialize)]
struct RawEvaluationResult {
    final_score: f64,
    lexical_scores: LexicalScoreSet,
    semantic_score: Option<SemanticScore>,
    judge_verdict: Option<JudgeVerdict>,
    fusion: AppliedFusion,
    #[serde(default)]
    degraded_signals: Vec<SignalFailure>,
}

impl From<RawEvaluationResult> for EvaluationResult {
    fn from(raw: RawEvaluationResult) -> Self {
        Self::new(
            raw.final_score,
            raw.lexical_scores,
            raw.semantic_score,
            raw.judge_verdict,
            raw.fusion,
            raw.degraded_signals,
        )
    }
}

impl EvaluationResult {
    pub fn new(
        final_score: f64,
        lexical_scores: LexicalScoreSet,
        semantic_score: Option<SemanticScore>,
        judge_verdict: Option<JudgeVerdict>,
        fusion: AppliedFusion,
        degraded_signals: Vec<SignalFailure>,
    ) -> Self {
        Self {
            final_score: clamp_unit(final_score),
            lexical_scores,
            semantic_score,
            judge_verdict,
            fusion,
            degraded_signals,
        }
    }

    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    pub fn lexical_scores(&self) -> &LexicalScoreSet {
        &self.lexical_scores
    }

    pub fn semantic_score(&self) -> Option<SemanticScore> {
        self.semantic_score
    }

    pub fn judge_verdict(&self) -> Option<&JudgeVerdict> {
        self.judge_verdict.as_ref()
    }

    pub fn fusion(&self) -> &AppliedFusion {
        &self.fusion
    }

    pub fn degraded_signals(&self) -> &[SignalFailure] {
        &self.degraded_signals
    }

    /// True if any signal was missing or the judge score is a fallback
    pub fn is_degraded(&self) -> bool {
        !self.degraded_signals.is_empty()
            || self
                .judge_verdict
                .as_ref()
                .map(|v| !v.is_parsed())
                .unwrap_or(false)
    }

    /// Flat view of every component score, keyed by name
    pub fn component_scores(&self) -> BTreeMap<String, f64> {
        let mut components: BTreeMap<String, f64> = self
            .lexical_scores
            .iter()
            .map(|(variant, score)| (variant.as_str().to_string(), score))
            .collect();

        if let Some(semantic) = self.semantic_score {
            components.insert("semantic".to_string(), semantic.value());
        }
        if let Some(verdict) = &self.judge_verdict {
            components.insert("judge".to_string(), verdict.parsed_score());
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_set_serializes_as_map() {
        let set = LexicalScoreSet::new(0.5, 0.25, 0.4);
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["rouge-1"], 0.5);
        assert_eq!(json["rouge-2"], 0.25);
        assert_eq!(json["rouge-l"], 0.4);
    }

    #[test]
    fn test_lexical_set_clamps() {
        let set = LexicalScoreSet::new(1.5, -0.2, f64::NAN);
        assert_eq!(set.get(LexicalVariant::Rouge1), 1.0);
        assert_eq!(set.get(LexicalVariant::Rouge2), 0.0);
        assert_eq!(set.get(LexicalVariant::RougeL), 0.0);
        assert!(!set.all_zero());
        assert!(LexicalScoreSet::zeros().all_zero());
    }

    #[test]
    fn test_semantic_score_clamps_negative_cosine() {
        assert_eq!(SemanticScore::from_cosine(-0.3).value(), 0.0);
        assert_eq!(SemanticScore::from_cosine(0.72).value(), 0.72);
    }

    #[test]
    fn test_verdict_flags() {
        let parsed = JudgeVerdict::new("Score: 7", 0.7, ScoreSource::Parsed, "ok");
        assert!(parsed.is_parsed());

        let fallback = JudgeVerdict::new("garbled", 0.5, ScoreSource::Fallback, "garbled");
        assert!(!fallback.is_parsed());
        let json = serde_json::to_value(&fallback).unwrap();
        assert_eq!(json["score_source"], "fallback");
        assert_eq!(json["raw_text"], "garbled");
    }

    #[test]
    fn test_result_component_scores_and_degraded() {
        let result = EvaluationResult::new(
            0.66,
            LexicalScoreSet::new(0.8, 0.8, 0.8),
            None,
            Some(JudgeVerdict::new("Score: 6", 0.6, ScoreSource::Parsed, "")),
            AppliedFusion {
                preset: FusionPreset::LexicalJudge,
                weights: FusionPreset::LexicalJudge.weights().unwrap(),
                lexical_scalar: 0.8,
            },
            vec![SignalFailure::new(Signal::Semantic, "no embedding client")],
        );

        let components = result.component_scores();
        assert_eq!(components.len(), 4);
        assert_eq!(components["judge"], 0.6);
        assert!(!components.contains_key("semantic"));
        assert!(result.is_degraded());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["final_score"], 0.66);
        assert_eq!(json["degraded_signals"][0]["signal"], "semantic");
    }

    #[test]
    fn test_deserialized_scores_are_clamped() {
        let json = serde_json::json!({
            "final_score": 1.7,
            "lexical_scores": {"rouge-1": 2.0, "rouge-l": -0.5},
            "semantic_score": -0.4,
            "judge_verdict": {
                "raw_text": "Score: 14",
                "parsed_score": 1.4,
                "score_source": "parsed",
                "rationale": "generous"
            },
            "fusion": {
                "preset": "lexical_judge",
                "weights": {"lexical": 0.3, "semantic": 0.0, "judge": 0.7},
                "lexical_scalar": 0.5
            }
        });

        let result: EvaluationResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.final_score(), 1.0);
        assert_eq!(result.lexical_scores().get(LexicalVariant::Rouge1), 1.0);
        assert_eq!(result.lexical_scores().get(LexicalVariant::Rouge2), 0.0);
        assert_eq!(result.lexical_scores().get(LexicalVariant::RougeL), 0.0);
        assert_eq!(result.semantic_score().unwrap().value(), 0.0);
        assert_eq!(result.judge_verdict().unwrap().parsed_score(), 1.0);
        assert!(result.degraded_signals().is_empty());
    }

    #[test]
    fn test_result_json_round_trip_is_stable() {
        let result = EvaluationResult::new(
            0.42,
            LexicalScoreSet::new(0.5, 0.25, 0.4),
            Some(SemanticScore::from_cosine(0.8)),
            None,
            AppliedFusion {
                preset: FusionPreset::SimilarityJudge,
                weights: FusionPreset::SimilarityJudge.weights().unwrap(),
                lexical_scalar: 0.38,
            },
            Vec::new(),
        );
        let json = serde_json::to_string(&result).unwrap();
        let back: EvaluationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    proptest::proptest! {
        #[test]
        fn prop_scores_clamped_into_unit_range(
            r1 in proptest::num::f64::ANY,
            r2 in -5.0f64..5.0,
            rl in -5.0f64..5.0,
            cosine in -1.0f64..=1.0,
        ) {
            let set = LexicalScoreSet::new(r1, r2, rl);
            for (_, score) in set.iter() {
                proptest::prop_assert!((0.0..=1.0).contains(&score));
            }

            let semantic = SemanticScore::from_cosine(cosine).value();
            proptest::prop_assert!((0.0..=1.0).contains(&semantic));
            if cosine >= 0.0 {
                proptest::prop_assert_eq!(semantic, cosine);
            }
        }
    }
}
