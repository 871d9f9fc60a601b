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

//! Rubric judge: criteria-based grading with LLM-as-judge
//!
//! The judge is asked for a score out of 10 followed by an explanation. Its
//! reply is returned verbatim; decoding the score is the job of
//! [`crate::score_parser`], which never fails on malformed text.

use crate::llm_client::{LLMClient, Prompt};
use crate::EvalError;
use answergrade_core::{EvaluationMode, DEFAULT_JUDGE_TEMPERATURE};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

pub const JUDGE_SYSTEM_PROMPT: &str = "You are an expert evaluator of interview answers.";

const INTERVIEW_CRITERIA: [&str; 4] = [
    "Relevance to the question",
    "Accuracy of information",
    "Completeness of the response",
    "Clarity and articulation",
];

const INTRODUCTION_CRITERIA: [&str; 4] = [
    "Appropriateness of the greeting",
    "Clarity of the candidate's name",
    "Expressed enthusiasm for the role",
    "Professionalism of tone",
];

/// Criteria the judge grades against for a given mode
pub fn criteria_for(mode: EvaluationMode) -> &'static [&'static str] {
    match mode {
        EvaluationMode::InterviewAnswer => &INTERVIEW_CRITERIA,
        EvaluationMode::Introduction => &INTRODUCTION_CRITERIA,
    }
}

/// LLM judge that grades a candidate answer against a fixed rubric
pub struct RubricJudge {
    llm_client: Arc<dyn LLMClient>,
    mode: EvaluationMode,
    temperature: f32,
}

impl RubricJudge {
    pub fn new(llm_client: Arc<dyn LLMClient>) -> Self {
        Self {
            llm_client,
            mode: EvaluationMode::default(),
            temperature: DEFAULT_JUDGE_TEMPERATURE,
        }
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    pub fn model_name(&self) -> &str {
        self.llm_client.model_name()
    }

    /// Build the rubric prompt for one answer
    pub fn build_prompt(&self, question: &str, reference: &str, candidate: &str) -> Prompt {
        let mut user = format!(
            "Question: {question}\nIdeal Answer: {reference}\nActual Answer: {candidate}\n\n\
             Evaluate the actual answer based on the following criteria:\n"
        );

        for (i, criterion) in criteria_for(self.mode).iter().enumerate() {
            user.push_str(&format!("{}. {}\n", i + 1, criterion));
        }

        user.push_str(
            "\nProvide a score out of 10 and a brief explanation for your scoring.\n\n\
             Score (out of 10):\n\
             Explanation:\n",
        );

        Prompt::new(JUDGE_SYSTEM_PROMPT, user)
    }

    /// Ask the judge to grade `candidate`, returning its raw reply
    ///
    /// Provider failures surface as [`EvalError::JudgeUnavailable`]; there is
    /// no retry.
    pub async fn evaluate(
        &self,
        question: &str,
        reference: &str,
        candidate: &str,
    ) -> Result<String, EvalError> {
        let start = Instant::now();
        let prompt = self.build_prompt(question, reference, candidate);

        let response = self.llm_client.complete(&prompt, self.temperature).await?;

        debug!(
            model = %response.model,
            mode = ?self.mode,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            duration_ms = start.elapsed().as_millis() as u64,
            "Judge responded"
        );

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{LLMError, LLMResponse, TokenUsage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockLLMClient {
        reply: Result<String, String>,
        seen: Mutex<Vec<(Prompt, f32)>>,
    }

    impl MockLLMClient {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                reply: Err(msg.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMClient for MockLLMClient {
        async fn complete(&self, prompt: &Prompt, temperature: f32) -> Result<LLMResponse, LLMError> {
            self.seen.lock().unwrap().push((prompt.clone(), temperature));
            match &self.reply {
                Ok(text) => Ok(LLMResponse {
                    content: text.clone(),
                    usage: TokenUsage::default(),
                    model: "mock".to_string(),
                }),
                Err(msg) => Err(LLMError::ApiError(msg.clone())),
            }
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn test_interview_prompt_names_criteria() {
        let judge = RubricJudge::new(Arc::new(MockLLMClient::replying("")));
        let prompt = judge.build_prompt("What is a trait?", "Shared behavior.", "An interface.");

        assert_eq!(prompt.system, JUDGE_SYSTEM_PROMPT);
        assert!(prompt.user.contains("Question: What is a trait?"));
        assert!(prompt.user.contains("Ideal Answer: Shared behavior."));
        assert!(prompt.user.contains("Actual Answer: An interface."));
        for criterion in INTERVIEW_CRITERIA {
            assert!(prompt.user.contains(criterion));
        }
        assert!(prompt.user.contains("Score (out of 10):"));
        assert!(prompt.user.contains("Explanation:"));
    }

    #[test]
    fn test_introduction_mode_swaps_criteria() {
        let judge = RubricJudge::new(Arc::new(MockLLMClient::replying("")))
            .with_mode(EvaluationMode::Introduction);
        let prompt = judge.build_prompt("Introduce yourself", "Hi, I'm Sam.", "Hello, Sam here.");

        assert!(prompt.user.contains("greeting"));
        assert!(prompt.user.contains("enthusiasm"));
        assert!(!prompt.user.contains("Accuracy of information"));
    }

    #[tokio::test]
    async fn test_evaluate_returns_raw_text_and_uses_temperature() {
        let client = Arc::new(MockLLMClient::replying(
            "Score (out of 10): 8\nExplanation: Clear and accurate.",
        ));
        let judge = RubricJudge::new(client.clone()).with_temperature(0.5);

        let raw = judge.evaluate("q", "r", "c").await.unwrap();
        assert_eq!(raw, "Score (out of 10): 8\nExplanation: Clear and accurate.");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, 0.5);
    }

    #[tokio::test]
    async fn test_provider_failure_is_judge_unavailable() {
        let judge = RubricJudge::new(Arc::new(MockLLMClient::failing("model overloaded")));
        let err = judge.evaluate("q", "r", "c").await.unwrap_err();
        assert!(matches!(err, EvalError::JudgeUnavailable(_)));
    }
}
