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

//! Weighted fusion of lexical, semantic and judge signals
//!
//! ```text
//! final = w_lexical * lexical + w_semantic * semantic + w_judge * judge
//! ```
//!
//! When a weighted signal is unavailable its weight is shared among the
//! remaining weighted signals in proportion to their own weights.

use crate::EvalError;
use answergrade_core::{
    clamp_unit, AppliedFusion, FusionConfig, FusionPreset, FusionWeights, LexicalScoreSet, Signal,
    SignalFailure, LEXICAL_FLOOR,
};
use tracing::debug;

/// Outcome of one fusion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedScore {
    pub final_score: f64,
    /// Weights actually applied, after redistribution
    pub weights: FusionWeights,
    pub lexical_scalar: f64,
}

impl FusedScore {
    pub fn applied(&self, preset: FusionPreset) -> AppliedFusion {
        AppliedFusion {
            preset,
            weights: self.weights,
            lexical_scalar: self.lexical_scalar,
        }
    }
}

/// Validated weighting policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionPolicy {
    preset: FusionPreset,
    weights: FusionWeights,
}

impl FusionPolicy {
    /// Policy with caller-supplied weights
    pub fn new(weights: FusionWeights) -> Result<Self, EvalError> {
        weights.validate()?;
        Ok(Self {
            preset: FusionPreset::Custom,
            weights,
        })
    }

    pub fn from_config(config: &FusionConfig) -> Result<Self, EvalError> {
        Ok(Self {
            preset: config.preset,
            weights: config.resolve()?,
        })
    }

    pub fn from_preset(preset: FusionPreset) -> Result<Self, EvalError> {
        Self::from_config(&FusionConfig::preset(preset))
    }

    pub fn preset(&self) -> FusionPreset {
        self.preset
    }

    pub fn weights(&self) -> FusionWeights {
        self.weights
    }

    /// Whether `signal` contributes to the blend
    pub fn uses(&self, signal: Signal) -> bool {
        self.weights.get(signal) > 0.0
    }

    /// Mean of the variants strictly above zero, or [`LEXICAL_FLOOR`] if none
    pub fn lexical_scalar(scores: &LexicalScoreSet) -> f64 {
        let positive: Vec<f64> = scores
            .iter()
            .map(|(_, score)| score)
            .filter(|score| *score > 0.0)
            .collect();

        if positive.is_empty() {
            LEXICAL_FLOOR
        } else {
            positive.iter().sum::<f64>() / positive.len() as f64
        }
    }

    /// Weights renormalised over the available signals
    fn redistribute(&self, semantic: bool, judge: bool) -> Option<FusionWeights> {
        let keep = |signal: Signal, available: bool| {
            if available {
                self.weights.get(signal)
            } else {
                0.0
            }
        };

        let lexical = self.weights.lexical;
        let semantic = keep(Signal::Semantic, semantic);
        let judge = keep(Signal::Judge, judge);

        let total = lexical + semantic + judge;
        if total <= 0.0 {
            return None;
        }

        Some(FusionWeights {
            lexical: lexical / total,
            semantic: semantic / total,
            judge: judge / total,
        })
    }

    /// Blend the available signals into a final score in `[0, 1]`
    ///
    /// `semantic` and `judge` are `None` when their provider failed; present
    /// values are clamped into `[0, 1]` before blending. Fails with
    /// [`EvalError::AllSignalsUnavailable`] only when every weighted signal is
    /// missing.
    pub fn fuse(
        &self,
        lexical: &LexicalScoreSet,
        semantic: Option<f64>,
        judge: Option<f64>,
    ) -> Result<FusedScore, EvalError> {
        let lexical_scalar = Self::lexical_scalar(lexical);
        let semantic = semantic.map(clamp_unit);
        let judge = judge.map(clamp_unit);

        let weights = self
            .redistribute(semantic.is_some(), judge.is_some())
            .ok_or_else(|| {
                EvalError::AllSignalsUnavailable(
                    self.weights
                        .active_signals()
                        .into_iter()
                        .map(|signal| SignalFailure::new(signal, "no value"))
                        .collect(),
                )
            })?;

        let final_score = weights.lexical * lexical_scalar
            + weights.semantic * semantic.unwrap_or(0.0)
            + weights.judge * judge.unwrap_or(0.0);

        debug!(
            preset = %self.preset,
            lexical_scalar,
            semantic = ?semantic,
            judge = ?judge,
            final_score,
            "Fused signals"
        );

        Ok(FusedScore {
            final_score,
            weights,
            lexical_scalar,
        })
    }
}

impl Default for FusionPolicy {
    fn default() -> Self {
        let preset = FusionPreset::default();
        Self {
            preset,
            weights: preset.weights().unwrap_or(FusionWeights {
                lexical: 0.3,
                semantic: 0.0,
                judge: 0.7,
            }),
        }
    }
}
