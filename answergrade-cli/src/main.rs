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

//! Answergrade CLI
//!
//! Command-line interface for scoring interview answers.

mod config;

use answergrade_core::{EvaluationMode, EvaluationRequest, FusionConfig, FusionPreset, Signal};
use answergrade_evals::{
    compute_overlap, AnswerScorer, FusionPolicy, JudgeScoreParser, TolerantParser,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::CliConfig;
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "answergrade")]
#[command(about = "Answergrade - multi-signal interview answer scoring", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "ANSWERGRADE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose mode
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    InterviewAnswer,
    Introduction,
}

impl From<ModeArg> for EvaluationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::InterviewAnswer => EvaluationMode::InterviewAnswer,
            ModeArg::Introduction => EvaluationMode::Introduction,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score a candidate answer against a reference answer
    Score {
        /// Interview question
        #[arg(long, required_unless_present = "input")]
        question: Option<String>,

        /// Reference ("ideal") answer
        #[arg(long, required_unless_present = "input")]
        reference: Option<String>,

        /// Candidate answer (may be empty)
        #[arg(long)]
        candidate: Option<String>,

        /// Read the request from a JSON file instead
        #[arg(long, conflicts_with_all = ["question", "reference", "candidate"])]
        input: Option<PathBuf>,

        /// Fusion preset override
        #[arg(long)]
        preset: Option<String>,

        /// Rubric mode override
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Parse judge output read from stdin
    ParseJudge,

    /// Lexical overlap only (no providers needed)
    Overlap {
        #[arg(long)]
        reference: String,

        #[arg(long)]
        candidate: String,
    },

    /// List fusion presets and their weights
    Presets,
}

fn init_tracing(verbose: bool, log_json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_request(
    question: Option<String>,
    reference: Option<String>,
    candidate: Option<String>,
    input: Option<PathBuf>,
) -> Result<EvaluationRequest> {
    if let Some(path) = input {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read request file {}", path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("Invalid request in {}", path.display()));
    }

    match (question, reference) {
        (Some(question), Some(reference)) => Ok(EvaluationRequest::new(
            question,
            reference,
            candidate.unwrap_or_default(),
        )?),
        _ => bail!("--question and --reference are required without --input"),
    }
}

async fn score(
    mut config: CliConfig,
    request: EvaluationRequest,
    preset: Option<String>,
    mode: Option<ModeArg>,
) -> Result<()> {
    if let Some(preset) = preset {
        let preset: FusionPreset = preset.parse()?;
        if preset != config.scoring.fusion.preset {
            config.scoring.fusion = FusionConfig::preset(preset);
        }
    }
    if let Some(mode) = mode {
        config.scoring.evaluation_mode = mode.into();
    }

    let policy = FusionPolicy::from_config(&config.scoring.fusion)?;
    let mut builder = AnswerScorer::builder(config.judge_client()?).config(config.scoring.clone());
    if policy.uses(Signal::Semantic) {
        builder = builder.embedding_client(config.embedding_client()?);
    }
    let scorer = builder.build().context("Failed to build scorer")?;

    let result = scorer.score(&request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn parse_judge() -> Result<()> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("Failed to read judge output from stdin")?;

    let decoded = JudgeScoreParser::new().decode(&raw);
    let output = json!({
        "score": decoded.value.score,
        "ok": decoded.ok,
        "rationale": decoded.value.rationale,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn overlap(reference: &str, candidate: &str) -> Result<()> {
    let scores = compute_overlap(reference, candidate);
    let output = json!({
        "lexical_scores": scores,
        "lexical_scalar": FusionPolicy::lexical_scalar(&scores),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn presets(config: &CliConfig) {
    for preset in FusionPreset::ALL {
        let weights = match preset.weights() {
            Some(weights) => Some(weights),
            None => config.scoring.fusion.weights,
        };
        match weights {
            Some(w) => println!(
                "{:<24} lexical={:.2} semantic={:.2} judge={:.2}",
                preset.as_str(),
                w.lexical,
                w.semantic,
                w.judge
            ),
            None => println!("{:<24} weights from [fusion] in the config file", preset.as_str()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::ParseJudge => parse_judge(),
        Commands::Overlap {
            reference,
            candidate,
        } => overlap(&reference, &candidate),
        Commands::Presets => {
            let config = CliConfig::load(cli.config.as_ref())?;
            presets(&config);
            Ok(())
        }
        Commands::Score {
            question,
            reference,
            candidate,
            input,
            preset,
            mode,
        } => {
            let config = CliConfig::load(cli.config.as_ref())?;
            let request = load_request(question, reference, candidate, input)?;
            score(config, request, preset, mode).await
        }
    }
}
