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

//! Lexical Overlap Metrics
//!
//! Deterministic word-overlap scores between a candidate answer and its
//! reference answer. No network, no model, sub-millisecond.
//!
//! ## Metrics Implemented
//!
//! - **ROUGE-1**: unigram overlap F-measure
//! - **ROUGE-2**: bigram overlap F-measure
//! - **ROUGE-L**: longest common subsequence F-measure
//!
//! Each F-measure is the harmonic mean of precision (overlap / candidate
//! length) and recall (overlap / reference length). Texts with no tokens, or
//! fewer tokens than the n-gram size, score 0.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use answergrade_evals::evaluators::lexical::compute_overlap;
//!
//! let scores = compute_overlap(
//!     "The capital of France is Paris.",
//!     "Paris is the capital city of France.",
//! );
//! ```

use answergrade_core::LexicalScoreSet;
use std::collections::HashMap;

/// ROUGE score components (precision, recall, F1)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl RougeScore {
    fn from_overlap(overlap: usize, candidate_len: usize, reference_len: usize) -> Self {
        if overlap == 0 || candidate_len == 0 || reference_len == 0 {
            return Self::default();
        }

        let precision = overlap as f64 / candidate_len as f64;
        let recall = overlap as f64 / reference_len as f64;
        let f1 = 2.0 * precision * recall / (precision + recall);

        Self {
            precision,
            recall,
            f1,
        }
    }
}

/// Computes ROUGE-style overlap between reference and candidate answers
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalOverlap;

impl LexicalOverlap {
    pub fn new() -> Self {
        Self
    }

    /// Tokenize text into words (lowercase)
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(|s| {
                // Remove punctuation from ends
                s.trim_matches(|c: char| !c.is_alphanumeric()).to_string()
            })
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn ngram_counts<'a>(&self, tokens: &'a [String], n: usize) -> HashMap<&'a [String], usize> {
        let mut counts = HashMap::new();
        if n == 0 || tokens.len() < n {
            return counts;
        }
        for window in tokens.windows(n) {
            *counts.entry(window).or_insert(0) += 1;
        }
        counts
    }

    /// Compute ROUGE-N with clipped n-gram counts
    pub fn rouge_n(&self, reference: &str, candidate: &str, n: usize) -> RougeScore {
        let ref_tokens = self.tokenize(reference);
        let cand_tokens = self.tokenize(candidate);
        self.rouge_n_tokens(&ref_tokens, &cand_tokens, n)
    }

    fn rouge_n_tokens(&self, ref_tokens: &[String], cand_tokens: &[String], n: usize) -> RougeScore {
        let ref_counts = self.ngram_counts(ref_tokens, n);
        let cand_counts = self.ngram_counts(cand_tokens, n);

        if ref_counts.is_empty() || cand_counts.is_empty() {
            return RougeScore::default();
        }

        // Clipped count: min(cand_count, ref_count) for each n-gram
        let overlap: usize = cand_counts
            .iter()
            .filter_map(|(ng, cand_count)| {
                ref_counts
                    .get(ng)
                    .map(|ref_count| (*cand_count).min(*ref_count))
            })
            .sum();

        let ref_total = ref_tokens.len() + 1 - n;
        let cand_total = cand_tokens.len() + 1 - n;

        RougeScore::from_overlap(overlap, cand_total, ref_total)
    }

    /// Compute ROUGE-L using the longest common subsequence
    pub fn rouge_l(&self, reference: &str, candidate: &str) -> RougeScore {
        let ref_tokens = self.tokenize(reference);
        let cand_tokens = self.tokenize(candidate);
        self.rouge_l_tokens(&ref_tokens, &cand_tokens)
    }

    fn rouge_l_tokens(&self, ref_tokens: &[String], cand_tokens: &[String]) -> RougeScore {
        if ref_tokens.is_empty() || cand_tokens.is_empty() {
            return RougeScore::default();
        }

        let lcs_len = self.lcs_length(ref_tokens, cand_tokens);
        RougeScore::from_overlap(lcs_len, cand_tokens.len(), ref_tokens.len())
    }

    /// Compute LCS length using DP with space optimization
    fn lcs_length(&self, a: &[String], b: &[String]) -> usize {
        // Use shorter sequence for the DP array
        let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };

        let mut prev = vec![0usize; short.len() + 1];
        let mut curr = vec![0usize; short.len() + 1];

        for i in 1..=long.len() {
            for j in 1..=short.len() {
                curr[j] = if long[i - 1] == short[j - 1] {
                    prev[j - 1] + 1
                } else {
                    prev[j].max(curr[j - 1])
                };
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        prev[short.len()]
    }

    /// Compute every lexical variant, tokenizing each text once
    pub fn compute(&self, reference: &str, candidate: &str) -> LexicalScoreSet {
        let ref_tokens = self.tokenize(reference);
        let cand_tokens = self.tokenize(candidate);

        LexicalScoreSet::new(
            self.rouge_n_tokens(&ref_tokens, &cand_tokens, 1).f1,
            self.rouge_n_tokens(&ref_tokens, &cand_tokens, 2).f1,
            self.rouge_l_tokens(&ref_tokens, &cand_tokens).f1,
        )
    }
}

/// Lexical overlap scores of `candidate` against `reference`
pub fn compute_overlap(reference: &str, candidate: &str) -> LexicalScoreSet {
    LexicalOverlap::new().compute(reference, candidate)
}
