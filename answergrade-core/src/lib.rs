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

//! Answergrade Core
//!
//! Request and result types shared by the scoring engine and its callers,
//! plus the scoring configuration (fusion presets, rubric mode, judge budget).

pub mod config;
pub mod error;
pub mod eval_result;
pub mod request;

pub use config::{
    EvaluationMode, FusionConfig, FusionPreset, FusionWeights, JudgeUnavailablePolicy,
    ScoringConfig, DEFAULT_JUDGE_TEMPERATURE, DEFAULT_JUDGE_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENT,
    LEXICAL_FLOOR, NEUTRAL_JUDGE_SCORE, WEIGHT_SUM_TOLERANCE,
};
pub use error::{CoreError, Result};
pub use eval_result::{
    clamp_unit, AppliedFusion, EvaluationResult, JudgeVerdict, LexicalScoreSet, LexicalVariant,
    ScoreSource, SemanticScore, Signal, SignalFailure,
};
pub use request::EvaluationRequest;
