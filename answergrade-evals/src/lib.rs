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

//! # Answergrade Scoring Engine
//!
//! Scores a candidate interview answer against a reference answer by fusing
//! three independent signals:
//!
//! - **Lexical overlap**: ROUGE-1, ROUGE-2 and ROUGE-L F-measures
//! - **Semantic similarity**: cosine similarity of embeddings
//! - **Rubric judge**: an LLM asked for a score out of 10 plus an explanation
//!
//! The judge's free-form reply is decoded by a tolerant parser that falls back
//! to a neutral score instead of failing, and the fusion policy redistributes
//! weight when a provider is unavailable.
//!
//! ## Example
//!
//! ```rust,ignore
//! use answergrade_core::{EvaluationRequest, ScoringConfig};
//! use answergrade_evals::llm_client::{OpenAIClient, ProviderConfig};
//! use answergrade_evals::AnswerScorer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let judge = Arc::new(OpenAIClient::new(ProviderConfig::groq(
//!         "gsk-...",
//!         "mixtral-8x7b-32768",
//!     )));
//!
//!     let scorer = AnswerScorer::builder(judge)
//!         .config(ScoringConfig::default())
//!         .build()
//!         .unwrap();
//!
//!     let request = EvaluationRequest::new(
//!         "What is ownership in Rust?",
//!         "Each value has a single owner that frees it when it goes out of scope.",
//!         "Every value has one owner, and it is dropped when the owner leaves scope.",
//!     )
//!     .unwrap();
//!
//!     let result = scorer.score(&request).await.unwrap();
//!     println!("{}", result.final_score());
//! }
//! ```

use answergrade_core::{CoreError, Signal, SignalFailure};
use std::time::Duration;
use thiserror::Error;

pub mod evaluators;
pub mod fusion;
pub mod llm_client;
pub mod score_parser;
pub mod scorer;

pub use evaluators::{
    compute_overlap, cosine_similarity, LexicalOverlap, LocalEmbeddingClient, RougeScore,
    RubricJudge, SemanticSimilarity,
};
pub use fusion::{FusedScore, FusionPolicy};
pub use llm_client::{
    AnthropicClient, EmbedError, EmbeddingClient, LLMClient, LLMError, LLMResponse, OpenAIClient,
    Prompt, ProviderConfig, TokenUsage,
};
pub use score_parser::{parse_score, Decoded, JudgeScoreParser, ParsedJudgeOutput, TolerantParser};
pub use scorer::{AnswerScorer, AnswerScorerBuilder};

/// Errors that can occur during scoring
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(#[from] EmbedError),

    #[error("Judge unavailable: {0}")]
    JudgeUnavailable(#[from] LLMError),

    #[error("Judge did not respond within {0:?}")]
    JudgeTimeout(Duration),

    #[error("All weighted signals unavailable: {}", describe_failures(.0))]
    AllSignalsUnavailable(Vec<SignalFailure>),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl EvalError {
    /// The signal whose provider failed, if this error came from a provider
    pub fn signal(&self) -> Option<Signal> {
        match self {
            EvalError::EmbeddingUnavailable(_) => Some(Signal::Semantic),
            EvalError::JudgeUnavailable(_) | EvalError::JudgeTimeout(_) => Some(Signal::Judge),
            _ => None,
        }
    }
}

fn describe_failures(failures: &[SignalFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.signal, f.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names_failing_signal() {
        let err = EvalError::JudgeTimeout(Duration::from_secs(30));
        assert_eq!(err.signal(), Some(Signal::Judge));

        let err = EvalError::EmbeddingUnavailable(EmbedError::RateLimitExceeded);
        assert_eq!(err.signal(), Some(Signal::Semantic));

        let err = EvalError::InvalidInput("x".to_string());
        assert_eq!(err.signal(), None);
    }

    #[test]
    fn test_all_signals_unavailable_message() {
        let err = EvalError::AllSignalsUnavailable(vec![
            SignalFailure::new(Signal::Semantic, "rate limited"),
            SignalFailure::new(Signal::Judge, "timeout"),
        ]);
        assert_eq!(
            err.to_string(),
            "All weighted signals unavailable: semantic (rate limited), judge (timeout)"
        );
    }
}
