// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Semantic similarity between reference and candidate answers

use super::lexical::LexicalOverlap;
use crate::llm_client::{EmbedError, EmbeddingClient};
use crate::EvalError;
use answergrade_core::SemanticScore;
use std::sync::Arc;
use tracing::debug;

/// Compute cosine similarity between two vectors
///
/// Returns 0 for empty or mismatched vectors and when either has zero magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a < 1e-10 || norm_b < 1e-10 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Embeds both answers and compares them
pub struct SemanticSimilarity {
    embedding_client: Arc<dyn EmbeddingClient>,
    tokenizer: LexicalOverlap,
}

impl SemanticSimilarity {
    pub fn new(embedding_client: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            embedding_client,
            tokenizer: LexicalOverlap::new(),
        }
    }

    /// Similarity of `candidate` to `reference`, clamped to `[0, 1]`
    ///
    /// A side with no tokens scores 0 without calling the provider. Embedding
    /// failures surface as [`EvalError::EmbeddingUnavailable`].
    pub async fn compute_similarity(
        &self,
        reference: &str,
        candidate: &str,
    ) -> Result<SemanticScore, EvalError> {
        if self.tokenizer.tokenize(reference).is_empty()
            || self.tokenizer.tokenize(candidate).is_empty()
        {
            debug!("No tokens to embed, semantic similarity is 0");
            return Ok(SemanticScore::from_cosine(0.0));
        }

        let texts = [reference.to_string(), candidate.to_string()];
        let embeddings = self.embedding_client.embed_batch(&texts).await?;

        let [reference_vec, candidate_vec] = embeddings.as_slice() else {
            return Err(EvalError::EmbeddingUnavailable(EmbedError::InvalidResponse(
                format!("Expected 2 embeddings, got {}", embeddings.len()),
            )));
        };

        let cosine = cosine_similarity(reference_vec, candidate_vec);
        debug!(cosine, dimensions = reference_vec.len(), "Semantic similarity computed");

        Ok(SemanticScore::from_cosine(cosine))
    }
}
