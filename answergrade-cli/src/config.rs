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

//! CLI configuration
//!
//! The scoring section is a plain [`ScoringConfig`]; `[judge]` and
//! `[embedding]` select providers. API keys are only ever read from the
//! environment.

use answergrade_core::{FusionConfig, FusionPreset, ScoringConfig};
use answergrade_evals::llm_client::{
    ProviderConfig, DEFAULT_ANTHROPIC_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_GROQ_MODEL,
    DEFAULT_OPENAI_MODEL,
};
use answergrade_evals::{
    AnthropicClient, EmbeddingClient, LLMClient, LocalEmbeddingClient, OpenAIClient,
};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeProvider {
    OpenAI,
    #[default]
    Groq,
    Anthropic,
}

impl JudgeProvider {
    fn key_var(&self) -> &'static str {
        match self {
            JudgeProvider::OpenAI => "OPENAI_API_KEY",
            JudgeProvider::Groq => "GROQ_API_KEY",
            JudgeProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            JudgeProvider::OpenAI => DEFAULT_OPENAI_MODEL,
            JudgeProvider::Groq => DEFAULT_GROQ_MODEL,
            JudgeProvider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
        }
    }
}

impl FromStr for JudgeProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(JudgeProvider::OpenAI),
            "groq" => Ok(JudgeProvider::Groq),
            "anthropic" => Ok(JudgeProvider::Anthropic),
            other => bail!("unknown judge provider: {} (expected openai, groq or anthropic)", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Local,
    OpenAI,
}

impl FromStr for EmbeddingProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(EmbeddingProvider::Local),
            "openai" => Ok(EmbeddingProvider::OpenAI),
            other => bail!("unknown embedding provider: {} (expected local or openai)", other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeSettings {
    pub provider: JudgeProvider,
    pub model: Option<String>,
    pub base_url: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub model: Option<String>,
    pub base_url: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Everything the CLI needs to build a scorer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    #[serde(flatten)]
    pub scoring: ScoringConfig,
    pub judge: JudgeSettings,
    pub embedding: EmbeddingSettings,
}

impl CliConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load configuration: file first, then explicitly set environment
    /// variables, then defaults for anything left
    pub fn load(config_file: Option<&PathBuf>) -> Result<Self> {
        let config = match config_file {
            Some(path) if path.exists() => {
                tracing::info!(path = %path.display(), "Loading configuration from file");
                Self::from_file(path)?
            }
            Some(path) => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        let config = config.merge_with_env(|key| std::env::var(key).ok())?;
        config.scoring.validate().context("Invalid scoring configuration")?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    pub fn merge_with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("ANSWERGRADE_JUDGE_PROVIDER") {
            self.judge.provider = provider.parse()?;
        }
        if let Some(model) = lookup("ANSWERGRADE_JUDGE_MODEL") {
            self.judge.model = Some(model);
        }
        self.judge.api_key = lookup(self.judge.provider.key_var());

        if let Some(provider) = lookup("ANSWERGRADE_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider.parse()?;
        }
        if let Some(model) = lookup("ANSWERGRADE_EMBEDDING_MODEL") {
            self.embedding.model = Some(model);
        }
        if self.embedding.provider == EmbeddingProvider::OpenAI {
            self.embedding.api_key = lookup("OPENAI_API_KEY");
        }

        if let Some(preset) = lookup("ANSWERGRADE_FUSION_PRESET") {
            let preset: FusionPreset = preset.parse()?;
            if preset != self.scoring.fusion.preset {
                self.scoring.fusion = FusionConfig::preset(preset);
            }
        }
        if let Some(timeout) = lookup("ANSWERGRADE_JUDGE_TIMEOUT_SECS") {
            self.scoring.judge_timeout_secs = timeout
                .parse()
                .with_context(|| format!("ANSWERGRADE_JUDGE_TIMEOUT_SECS is not a number: {}", timeout))?;
        }

        Ok(self)
    }

    pub fn judge_provider_config(&self) -> Result<ProviderConfig> {
        let provider = self.judge.provider;
        let api_key = self
            .judge
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("{} is not set", provider.key_var()))?;
        let model = self
            .judge
            .model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string());

        let config = match provider {
            JudgeProvider::OpenAI => ProviderConfig::openai(api_key, model),
            JudgeProvider::Groq => ProviderConfig::groq(api_key, model),
            JudgeProvider::Anthropic => ProviderConfig::anthropic(api_key, model),
        };

        Ok(match &self.judge.base_url {
            Some(url) => config.with_base_url(url.clone()),
            None => config,
        })
    }

    pub fn judge_client(&self) -> Result<Arc<dyn LLMClient>> {
        let config = self.judge_provider_config()?;
        Ok(match self.judge.provider {
            JudgeProvider::OpenAI | JudgeProvider::Groq => Arc::new(OpenAIClient::new(config)),
            JudgeProvider::Anthropic => Arc::new(AnthropicClient::new(config)),
        })
    }

    pub fn embedding_client(&self) -> Result<Arc<dyn EmbeddingClient>> {
        match self.embedding.provider {
            EmbeddingProvider::Local => Ok(Arc::new(LocalEmbeddingClient::new())),
            EmbeddingProvider::OpenAI => {
                let api_key = self
                    .embedding
                    .api_key
                    .clone()
                    .ok_or_else(|| anyhow!("OPENAI_API_KEY is not set"))?;
                let model = self
                    .embedding
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
                let mut config = ProviderConfig::openai(api_key, model);
                if let Some(url) = &self.embedding.base_url {
                    config = config.with_base_url(url.clone());
                }
                Ok(Arc::new(OpenAIClient::new(config)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use answergrade_core::{EvaluationMode, FusionWeights};
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CliConfig::default().merge_with_env(env(&[])).unwrap();
        assert_eq!(config.judge.provider, JudgeProvider::Groq);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Local);
        assert_eq!(config.scoring, ScoringConfig::default());
        assert!(config.judge_provider_config().is_err());
    }

    #[test]
    fn test_file_with_provider_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
evaluation_mode = "introduction"
judge_timeout_secs = 12

[fusion]
preset = "custom"
weights = {{ lexical = 0.2, semantic = 0.2, judge = 0.6 }}

[judge]
provider = "anthropic"
model = "claude-3-5-sonnet-latest"

[embedding]
provider = "openai"
"#
        )
        .unwrap();

        let config = CliConfig::from_file(file.path()).unwrap();
        assert_eq!(config.scoring.evaluation_mode, EvaluationMode::Introduction);
        assert_eq!(config.scoring.judge_timeout_secs, 12);
        assert_eq!(
            config.scoring.fusion.resolve().unwrap(),
            FusionWeights::new(0.2, 0.2, 0.6).unwrap()
        );
        assert_eq!(config.judge.provider, JudgeProvider::Anthropic);
        assert_eq!(config.embedding.provider, EmbeddingProvider::OpenAI);
    }

    #[test]
    fn test_env_overrides_and_keys() {
        let config = CliConfig::default()
            .merge_with_env(env(&[
                ("ANSWERGRADE_JUDGE_PROVIDER", "openai"),
                ("ANSWERGRADE_JUDGE_MODEL", "gpt-4o"),
                ("OPENAI_API_KEY", "sk-test"),
                ("GROQ_API_KEY", "gsk-ignored"),
                ("ANSWERGRADE_FUSION_PRESET", "balanced_lexical_judge"),
            ]))
            .unwrap();

        let provider = config.judge_provider_config().unwrap();
        assert_eq!(provider.api_key, "sk-test");
        assert_eq!(provider.model, "gpt-4o");
        assert_eq!(
            config.scoring.fusion.preset,
            FusionPreset::BalancedLexicalJudge
        );
    }

    #[test]
    fn test_groq_defaults_to_groq_endpoint() {
        let config = CliConfig::default()
            .merge_with_env(env(&[("GROQ_API_KEY", "gsk-test")]))
            .unwrap();
        let provider = config.judge_provider_config().unwrap();
        assert!(provider.base_url.contains("groq.com"));
        assert_eq!(provider.model, DEFAULT_GROQ_MODEL);
    }

    #[test]
    fn test_bad_env_values_rejected() {
        assert!(CliConfig::default()
            .merge_with_env(env(&[("ANSWERGRADE_JUDGE_PROVIDER", "palm")]))
            .is_err());
        assert!(CliConfig::default()
            .merge_with_env(env(&[("ANSWERGRADE_FUSION_PRESET", "weighted")]))
            .is_err());
        assert!(CliConfig::default()
            .merge_with_env(env(&[("ANSWERGRADE_JUDGE_TIMEOUT_SECS", "soon")]))
            .is_err());
    }

    #[test]
    fn test_openai_embedding_needs_key() {
        let config = CliConfig::default()
            .merge_with_env(env(&[("ANSWERGRADE_EMBEDDING_PROVIDER", "openai")]))
            .unwrap();
        assert!(config.embedding_client().is_err());

        let local = CliConfig::default();
        assert!(local.embedding_client().is_ok());
    }
}
