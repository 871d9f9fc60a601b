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

// Shared mock providers for scorer integration tests

#![allow(dead_code)]

use answergrade_core::EvaluationRequest;
use answergrade_evals::{
    EmbedError, EmbeddingClient, LLMClient, LLMError, LLMResponse, LocalEmbeddingClient, Prompt,
    TokenUsage,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Judge that always replies with the same text
pub struct ScriptedJudge {
    reply: String,
    calls: AtomicUsize,
}

impl ScriptedJudge {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMClient for ScriptedJudge {
    async fn complete(&self, _prompt: &Prompt, _temperature: f32) -> Result<LLMResponse, LLMError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(LLMResponse {
            content: self.reply.clone(),
            usage: TokenUsage::default(),
            model: "scripted".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Judge whose provider always errors
pub struct FailingJudge;

#[async_trait]
impl LLMClient for FailingJudge {
    async fn complete(&self, _prompt: &Prompt, _temperature: f32) -> Result<LLMResponse, LLMError> {
        Err(LLMError::RateLimitExceeded)
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Judge that answers only after `delay`
pub struct SlowJudge {
    pub delay: Duration,
}

#[async_trait]
impl LLMClient for SlowJudge {
    async fn complete(&self, _prompt: &Prompt, _temperature: f32) -> Result<LLMResponse, LLMError> {
        tokio::time::sleep(self.delay).await;
        Ok(LLMResponse {
            content: "Score (out of 10): 9\nExplanation: late".to_string(),
            usage: TokenUsage::default(),
            model: "slow".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "slow"
    }
}

/// Embedder whose provider always errors
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingClient for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f64>, EmbedError> {
        Err(EmbedError::ApiError("embedding service down".to_string()))
    }
}

/// Embedder that rejects blank input the way hosted embedding APIs do
pub struct RejectsBlankEmbedder {
    inner: LocalEmbeddingClient,
    calls: AtomicUsize,
}

impl RejectsBlankEmbedder {
    pub fn new() -> Self {
        Self {
            inner: LocalEmbeddingClient::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingClient for RejectsBlankEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.trim().is_empty() {
            return Err(EmbedError::ApiError("400: '$.input' is invalid".to_string()));
        }
        self.inner.embed(text).await
    }
}

pub fn ownership_request(candidate: &str) -> EvaluationRequest {
    EvaluationRequest::new(
        "What is ownership in Rust?",
        "Each value has a single owner and is dropped when the owner goes out of scope",
        candidate,
    )
    .expect("valid request")
}
