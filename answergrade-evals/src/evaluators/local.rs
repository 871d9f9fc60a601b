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

//! Local/offline embedding support
//!
//! A deterministic embedder for tests and offline runs where no embedding
//! API is configured. It is a hashed bag-of-words, so it captures shared
//! vocabulary rather than meaning.

use crate::evaluators::lexical::LexicalOverlap;
use crate::llm_client::{EmbedError, EmbeddingClient};
use async_trait::async_trait;

/// Standard size for small sentence-embedding models
pub const LOCAL_EMBEDDING_DIM: usize = 384;

/// Local embedding client using feature hashing over word tokens
#[derive(Debug, Clone)]
pub struct LocalEmbeddingClient {
    dimensions: usize,
    tokenizer: LexicalOverlap,
}

impl LocalEmbeddingClient {
    pub fn new() -> Self {
        Self::with_dimensions(LOCAL_EMBEDDING_DIM)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            tokenizer: LexicalOverlap::new(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn bucket(&self, token: &str) -> usize {
        let hash = blake3::hash(token.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&hash.as_bytes()[..8]);
        (u64::from_le_bytes(prefix) % self.dimensions as u64) as usize
    }

    fn embed_sync(&self, text: &str) -> Vec<f64> {
        let mut vec = vec![0.0; self.dimensions];
        for token in self.tokenizer.tokenize(text) {
            vec[self.bucket(&token)] += 1.0;
        }

        let norm = vec.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            vec.iter_mut().for_each(|x| *x /= norm);
        }
        vec
    }
}

impl Default for LocalEmbeddingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingClient for LocalEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, EmbedError> {
        Ok(self.embed_sync(text))
    }
}
