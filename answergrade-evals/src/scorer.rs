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

//! Answer scorer: runs every signal for a request and fuses the results

use crate::evaluators::{LexicalOverlap, RubricJudge, SemanticSimilarity};
use crate::fusion::FusionPolicy;
use crate::llm_client::{EmbeddingClient, LLMClient};
use crate::score_parser::JudgeScoreParser;
use crate::EvalError;
use answergrade_core::{
    EvaluationRequest, EvaluationResult, JudgeUnavailablePolicy, JudgeVerdict, ScoreSource,
    ScoringConfig, SemanticScore, Signal, SignalFailure, NEUTRAL_JUDGE_SCORE,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Scores candidate answers against reference answers
///
/// Holds no mutable state; share it behind an `Arc` to score from many tasks.
pub struct AnswerScorer {
    lexical: LexicalOverlap,
    semantic: Option<SemanticSimilarity>,
    judge: RubricJudge,
    parser: JudgeScoreParser,
    policy: FusionPolicy,
    config: ScoringConfig,
    judge_timeout: Duration,
}

/// Builder for [`AnswerScorer`]
pub struct AnswerScorerBuilder {
    judge_client: Arc<dyn LLMClient>,
    embedding_client: Option<Arc<dyn EmbeddingClient>>,
    config: ScoringConfig,
    judge_timeout: Option<Duration>,
}

impl AnswerScorerBuilder {
    pub fn config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn embedding_client(mut self, client: Arc<dyn EmbeddingClient>) -> Self {
        self.embedding_client = Some(client);
        self
    }

    /// Override `judge_timeout_secs` with a finer-grained budget
    pub fn judge_timeout(mut self, timeout: Duration) -> Self {
        self.judge_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<AnswerScorer, EvalError> {
        self.config.validate()?;
        let policy = FusionPolicy::from_config(&self.config.fusion)?;

        if policy.uses(Signal::Semantic) && self.embedding_client.is_none() {
            return Err(EvalError::InvalidConfig(format!(
                "fusion preset \"{}\" weights semantic similarity but no embedding client is configured",
                policy.preset()
            )));
        }

        if let Some(timeout) = self.judge_timeout {
            if timeout.is_zero() {
                return Err(EvalError::InvalidConfig(
                    "judge timeout must be positive".to_string(),
                ));
            }
        }

        let judge = RubricJudge::new(self.judge_client)
            .with_mode(self.config.evaluation_mode)
            .with_temperature(self.config.judge_temperature);

        Ok(AnswerScorer {
            lexical: LexicalOverlap::new(),
            semantic: self.embedding_client.map(SemanticSimilarity::new),
            judge,
            parser: JudgeScoreParser::new(),
            policy,
            judge_timeout: self.judge_timeout.unwrap_or_else(|| self.config.judge_timeout()),
            config: self.config,
        })
    }
}

impl AnswerScorer {
    pub fn builder(judge_client: Arc<dyn LLMClient>) -> AnswerScorerBuilder {
        AnswerScorerBuilder {
            judge_client,
            embedding_client: None,
            config: ScoringConfig::default(),
            judge_timeout: None,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn policy(&self) -> &FusionPolicy {
        &self.policy
    }

    async fn run_semantic(&self, request: &EvaluationRequest) -> Option<Result<SemanticScore, EvalError>> {
        let semantic = self.semantic.as_ref()?;
        Some(
            semantic
                .compute_similarity(request.reference_answer(), request.candidate_answer())
                .await,
        )
    }

    async fn run_judge(&self, request: &EvaluationRequest) -> Result<String, EvalError> {
        let call = self.judge.evaluate(
            request.question(),
            request.reference_answer(),
            request.candidate_answer(),
        );

        match tokio::time::timeout(self.judge_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(EvalError::JudgeTimeout(self.judge_timeout)),
        }
    }

    /// Record a provider failure if the signal carries weight
    fn note_failure(&self, failures: &mut Vec<SignalFailure>, signal: Signal, err: &EvalError) {
        if self.policy.uses(signal) {
            warn!(%signal, error = %err, "Signal unavailable, degrading fusion");
            failures.push(SignalFailure::new(signal, err.to_string()));
        } else {
            debug!(%signal, error = %err, "Unweighted signal unavailable");
        }
    }

    /// Score one answer
    ///
    /// Provider failures degrade the result rather than failing it; an error
    /// is returned only when no weighted signal could be computed.
    pub async fn score(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvalError> {
        let start = Instant::now();
        let mut failures = Vec::new();

        let lexical_scores = self
            .lexical
            .compute(request.reference_answer(), request.candidate_answer());
        debug!(lexical = ?lexical_scores, "Lexical overlap computed");

        let (semantic_outcome, judge_outcome) =
            tokio::join!(self.run_semantic(request), self.run_judge(request));

        let semantic_score = match semantic_outcome {
            Some(Ok(score)) => Some(score),
            Some(Err(err)) => {
                self.note_failure(&mut failures, Signal::Semantic, &err);
                None
            }
            None => None,
        };

        let judge_verdict = match judge_outcome {
            Ok(raw) => Some(self.parser.verdict(&raw)),
            Err(err) => {
                self.note_failure(&mut failures, Signal::Judge, &err);
                match self.config.judge_unavailable {
                    JudgeUnavailablePolicy::Renormalize => None,
                    JudgeUnavailablePolicy::Neutral => Some(JudgeVerdict::new(
                        "",
                        NEUTRAL_JUDGE_SCORE,
                        ScoreSource::Unavailable,
                        err.to_string(),
                    )),
                }
            }
        };

        let fused = self
            .policy
            .fuse(
                &lexical_scores,
                semantic_score.map(|s| s.value()),
                judge_verdict.as_ref().map(|v| v.parsed_score()),
            )
            .map_err(|err| match err {
                EvalError::AllSignalsUnavailable(_) => {
                    EvalError::AllSignalsUnavailable(failures.clone())
                }
                other => other,
            })?;

        info!(
            final_score = fused.final_score,
            preset = %self.policy.preset(),
            judge_source = ?judge_verdict.as_ref().map(|v| v.score_source()),
            degraded = failures.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Answer scored"
        );

        Ok(EvaluationResult::new(
            fused.final_score,
            lexical_scores,
            semantic_score,
            judge_verdict,
            fused.applied(self.policy.preset()),
            failures,
        ))
    }

    /// Score many answers, at most `max_concurrent` in flight, preserving order
    pub async fn score_batch(
        &self,
        requests: &[EvaluationRequest],
    ) -> Vec<Result<EvaluationResult, EvalError>> {
        stream::iter(requests)
            .map(|request| self.score(request))
            .buffered(self.config.max_concurrent)
            .collect()
            .await
    }
}
