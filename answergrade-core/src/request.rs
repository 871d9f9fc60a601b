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

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A single answer to be scored against its reference answer
///
/// Fields are private so a request can only be obtained through
/// [`EvaluationRequest::new`] (or deserialization, which goes through the
/// same validation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEvaluationRequest")]
pub struct EvaluationRequest {
    question: String,
    reference_answer: String,
    candidate_answer: String,
}

#[derive(Deserialize)]
struct RawEvaluationRequest {
    question: String,
    reference_answer: String,
    #[serde(default)]
    candidate_answer: String,
}

impl TryFrom<RawEvaluationRequest> for EvaluationRequest {
    type Error = CoreError;

    fn try_from(raw: RawEvaluationRequest) -> Result<Self> {
        Self::new(raw.question, raw.reference_answer, raw.candidate_answer)
    }
}

impl EvaluationRequest {
    /// Build a request.
    ///
    /// The question and reference answer must contain non-whitespace text.
    /// An empty candidate answer is accepted and simply scores low.
    pub fn new(
        question: impl Into<String>,
        reference_answer: impl Into<String>,
        candidate_answer: impl Into<String>,
    ) -> Result<Self> {
        let question = question.into();
        let reference_answer = reference_answer.into();

        if question.trim().is_empty() {
            return Err(CoreError::InvalidInput("question is empty".to_string()));
        }
        if reference_answer.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "reference_answer is empty".to_string(),
            ));
        }

        Ok(Self {
            question,
            reference_answer,
            candidate_answer: candidate_answer.into(),
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn reference_answer(&self) -> &str {
        &self.reference_answer
    }

    pub fn candidate_answer(&self) -> &str {
        &self.candidate_answer
    }
}
