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

//! Configuration for answer scoring
//!
//! Holds the fusion weighting regime, the rubric variant sent to the judge,
//! and the judge call budget. A config is owned by the caller and handed to
//! the scorer at construction; scoring never mutates it.
//!
//! ```toml
//! evaluation_mode = "interview_answer"
//! judge_timeout_secs = 30
//!
//! [fusion]
//! preset = "lexical_judge"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CoreError, Result};
use crate::eval_result::Signal;

/// Lexical scalar used when every lexical variant scored exactly 0
pub const LEXICAL_FLOOR: f64 = 0.01;

/// Judge score substituted when the judge's output cannot be decoded
pub const NEUTRAL_JUDGE_SCORE: f64 = 0.5;

/// Allowed distance between the sum of fusion weights and 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

pub const DEFAULT_JUDGE_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_JUDGE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Per-signal weights of the final blend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    #[serde(default)]
    pub lexical: f64,
    #[serde(default)]
    pub semantic: f64,
    #[serde(default)]
    pub judge: f64,
}

impl FusionWeights {
    /// Build a validated weight triple
    pub fn new(lexical: f64, semantic: f64, judge: f64) -> Result<Self> {
        let weights = Self {
            lexical,
            semantic,
            judge,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Each weight must be in `[0, 1]` and the three must sum to 1
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("lexical", self.lexical),
            ("semantic", self.semantic),
            ("judge", self.judge),
        ] {
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(CoreError::InvalidConfig(format!(
                    "{} weight must be within [0, 1], got {}",
                    name, weight
                )));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CoreError::InvalidConfig(format!(
                "fusion weights must sum to 1.0, got {}",
                sum
            )));
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.lexical + self.semantic + self.judge
    }

    pub fn get(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Lexical => self.lexical,
            Signal::Semantic => self.semantic,
            Signal::Judge => self.judge,
        }
    }

    /// Signals carrying non-zero weight
    pub fn active_signals(&self) -> Vec<Signal> {
        [Signal::Lexical, Signal::Semantic, Signal::Judge]
            .into_iter()
            .filter(|signal| self.get(*signal) > 0.0)
            .collect()
    }
}

/// Named weighting regimes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionPreset {
    /// Semantic similarity 0.4, judge 0.6
    SimilarityJudge,
    /// Lexical 0.5, judge 0.5
    BalancedLexicalJudge,
    /// Lexical 0.3, judge 0.7
    #[default]
    LexicalJudge,
    /// Caller-supplied weights
    Custom,
}

impl FusionPreset {
    pub const ALL: [FusionPreset; 4] = [
        FusionPreset::SimilarityJudge,
        FusionPreset::BalancedLexicalJudge,
        FusionPreset::LexicalJudge,
        FusionPreset::Custom,
    ];

    /// Fixed weights of a named preset; `None` for [`FusionPreset::Custom`]
    pub fn weights(&self) -> Option<FusionWeights> {
        let (lexical, semantic, judge) = match self {
            FusionPreset::SimilarityJudge => (0.0, 0.4, 0.6),
            FusionPreset::BalancedLexicalJudge => (0.5, 0.0, 0.5),
            FusionPreset::LexicalJudge => (0.3, 0.0, 0.7),
            FusionPreset::Custom => return None,
        };
        Some(FusionWeights {
            lexical,
            semantic,
            judge,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FusionPreset::SimilarityJudge => "similarity_judge",
            FusionPreset::BalancedLexicalJudge => "balanced_lexical_judge",
            FusionPreset::LexicalJudge => "lexical_judge",
            FusionPreset::Custom => "custom",
        }
    }
}

impl fmt::Display for FusionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FusionPreset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        FusionPreset::ALL
            .into_iter()
            .find(|preset| preset.as_str() == s)
            .ok_or_else(|| CoreError::InvalidConfig(format!("unknown fusion preset: {}", s)))
    }
}

/// Fusion section of [`ScoringConfig`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub preset: FusionPreset,

    /// Only read when `preset = "custom"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<FusionWeights>,
}

impl FusionConfig {
    pub fn preset(preset: FusionPreset) -> Self {
        Self {
            preset,
            weights: None,
        }
    }

    pub fn custom(weights: FusionWeights) -> Self {
        Self {
            preset: FusionPreset::Custom,
            weights: Some(weights),
        }
    }

    /// Resolve the effective weights, validating them
    pub fn resolve(&self) -> Result<FusionWeights> {
        let weights = match (self.preset, self.weights) {
            (FusionPreset::Custom, Some(weights)) => weights,
            (FusionPreset::Custom, None) => {
                return Err(CoreError::InvalidConfig(
                    "preset \"custom\" requires fusion.weights".to_string(),
                ))
            }
            (preset, Some(_)) => {
                return Err(CoreError::InvalidConfig(format!(
                    "fusion.weights is only accepted with preset \"custom\", not \"{}\"",
                    preset
                )))
            }
            (preset, None) => match preset.weights() {
                Some(weights) => weights,
                None => {
                    return Err(CoreError::InvalidConfig(format!(
                        "preset \"{}\" has no built-in weights",
                        preset
                    )))
                }
            },
        };
        weights.validate()?;
        Ok(weights)
    }
}

/// Which rubric the judge is asked to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Relevance, accuracy, completeness, clarity
    #[default]
    InterviewAnswer,
    /// Greeting, name clarity, enthusiasm, professionalism
    Introduction,
}

/// What to do when the judge call fails or times out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeUnavailablePolicy {
    /// Drop the judge signal and spread its weight over the remaining signals
    #[default]
    Renormalize,
    /// Keep the judge weight and use [`NEUTRAL_JUDGE_SCORE`]
    Neutral,
}

/// Top-level scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub evaluation_mode: EvaluationMode,
    pub judge_temperature: f32,
    pub judge_timeout_secs: u64,
    pub judge_unavailable: JudgeUnavailablePolicy,
    /// Upper bound on concurrently scored requests in a batch
    pub max_concurrent: usize,
    pub fusion: FusionConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            evaluation_mode: EvaluationMode::default(),
            judge_temperature: DEFAULT_JUDGE_TEMPERATURE,
            judge_timeout_secs: DEFAULT_JUDGE_TIMEOUT_SECS,
            judge_unavailable: JudgeUnavailablePolicy::default(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            fusion: FusionConfig::default(),
        }
    }
}

impl ScoringConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded scoring config");
        Self::from_toml_str(&content)
    }

    pub fn with_fusion(mut self, fusion: FusionConfig) -> Self {
        self.fusion = fusion;
        self
    }

    pub fn with_evaluation_mode(mut self, mode: EvaluationMode) -> Self {
        self.evaluation_mode = mode;
        self
    }

    /// Set the judge budget, rounding a partial second up
    pub fn with_judge_timeout(mut self, timeout: Duration) -> Self {
        let partial = u64::from(timeout.subsec_nanos() > 0);
        self.judge_timeout_secs = timeout.as_secs().saturating_add(partial);
        self
    }

    pub fn with_judge_unavailable(mut self, policy: JudgeUnavailablePolicy) -> Self {
        self.judge_unavailable = policy;
        self
    }

    pub fn judge_timeout(&self) -> Duration {
        Duration::from_secs(self.judge_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.judge_temperature) {
            return Err(CoreError::InvalidConfig(format!(
                "judge_temperature must be within [0, 2], got {}",
                self.judge_temperature
            )));
        }
        if self.judge_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "judge_timeout_secs must be positive".to_string(),
            ));
        }
        if self.max_concurrent == 0 {
            return Err(CoreError::InvalidConfig(
                "max_concurrent must be positive".to_string(),
            ));
        }
        self.fusion.resolve()?;
        Ok(())
    }
}
