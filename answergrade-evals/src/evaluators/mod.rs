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

//! Signal evaluators: lexical overlap, semantic similarity and the rubric judge

pub mod lexical;
pub mod local;
pub mod rubric_judge;
pub mod semantic;

pub use lexical::{compute_overlap, LexicalOverlap, RougeScore};
pub use local::{LocalEmbeddingClient, LOCAL_EMBEDDING_DIM};
pub use rubric_judge::{criteria_for, RubricJudge, JUDGE_SYSTEM_PROMPT};
pub use semantic::{cosine_similarity, SemanticSimilarity};
