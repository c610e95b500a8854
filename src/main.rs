use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use revisor::io::MarginOverrides;
use revisor::scoring::evaluate;
use revisor::server;
use revisor::{
    Analyzer, AnthropicClient, AnthropicConfig, AppState, Collaborators, HttpAnalyzer,
    RevisionConfig, RevisionController, ReviseRequest, TargetMetrics,
    ToleranceSpec, TracingObserver,
};

#[derive(Parser)]
#[command(name = "revisor")]
#[command(author, version, about = "Readability-targeted passage revision", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to bind the server to
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,

        /// Port to listen on
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Revise one passage toward target metrics
    Revise {
        /// Passage to revise (plain text)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        targets: TargetArgs,

        /// Absolute margin for average sentence length
        #[arg(long)]
        structural_len_abs: Option<f64>,

        /// Relative margin for the embedded clause ratio
        #[arg(long)]
        clause_ratio_rel: Option<f64>,

        /// Relative margin for the lexical ratio
        #[arg(long)]
        lexical_ratio_rel: Option<f64>,

        /// Write the full response (JSON) here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze a passage, optionally evaluating it against targets
    Analyze {
        /// Passage to analyze (plain text)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        targets: OptionalTargetArgs,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Target average sentence length
    #[arg(long)]
    target_len: f64,

    /// Target embedded clause ratio
    #[arg(long)]
    target_clause: f64,

    /// Target lexical (A1/A2 content word) ratio
    #[arg(long)]
    target_lexical: f64,
}

impl TargetArgs {
    fn metrics(&self) -> TargetMetrics {
        TargetMetrics {
            structural_len: self.target_len,
            clause_ratio: self.target_clause,
            lexical_ratio: self.target_lexical,
        }
    }
}

#[derive(Args)]
struct OptionalTargetArgs {
    /// Target average sentence length
    #[arg(long)]
    target_len: Option<f64>,

    /// Target embedded clause ratio
    #[arg(long)]
    target_clause: Option<f64>,

    /// Target lexical (A1/A2 content word) ratio
    #[arg(long)]
    target_lexical: Option<f64>,
}

impl OptionalTargetArgs {
    /// Targets, when all three were given
    fn metrics(&self) -> Option<TargetMetrics> {
        Some(TargetMetrics {
            structural_len: self.target_len?,
            clause_ratio: self.target_clause?,
            lexical_ratio: self.target_lexical?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            port,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            let config = load_config(config.as_deref())?;
            let state = AppState::new(build_controller(config)?);
            server::serve(state, &format!("{bind}:{port}")).await
        }
        Commands::Revise {
            input,
            targets,
            structural_len_abs,
            clause_ratio_rel,
            lexical_ratio_rel,
            output,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            let overrides = MarginOverrides {
                structural_len_abs,
                clause_ratio_rel,
                lexical_ratio_rel,
            };
            revise_passage(&input, targets.metrics(), overrides, output, config.as_deref()).await
        }
        Commands::Analyze {
            input,
            targets,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_passage(&input, targets.metrics(), config.as_deref()).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "revisor=debug" } else { "revisor=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<&Path>) -> Result<RevisionConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            RevisionConfig::from_file(path)
        }
        None => Ok(RevisionConfig::default()),
    }
}

fn read_passage(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read passage: {:?}", path))
}

fn build_controller(config: RevisionConfig) -> Result<RevisionController> {
    let mut api_config = AnthropicConfig::from_env()?;
    api_config.tie_break_temperature = config.tie_break_temperature;
    let client = Arc::new(AnthropicClient::new(api_config));

    let analyzer = HttpAnalyzer::new(config.analyzer.clone(), config.call_timeout())
        .context("Failed to build analyzer client")?;

    let collaborators = Collaborators {
        analyzer: Arc::new(analyzer),
        generator: client.clone(),
        tie_breaker: client,
    };

    RevisionController::new(config, collaborators, Arc::new(TracingObserver))
        .context("Invalid configuration")
}

async fn revise_passage(
    input: &Path,
    targets: TargetMetrics,
    overrides: MarginOverrides,
    output: Option<PathBuf>,
    config: Option<&Path>,
) -> Result<()> {
    let text = read_passage(input)?;
    let config = load_config(config)?;
    let controller = build_controller(config)?;

    let request = ReviseRequest {
        request_id: None,
        text,
        target_metrics: targets,
        tolerance: overrides,
    };
    let response = server::revise_one(&controller, request).await?;

    println!("Revision {}", response.request_id);
    println!("==================");
    println!("Status: {:?}", response.status);
    println!(
        "Candidates: {} generated, {} passed",
        response.candidates_generated, response.candidates_passed
    );
    if let Some(detail) = &response.detailed_result {
        println!("{detail}");
    }
    if let Some(error) = &response.error_message {
        println!("Error: {error}");
    }
    println!();
    println!("{}", response.final_text);

    if let Some(path) = output {
        response.write_json(&path)?;
        info!("Response written to {:?}", path);
    }

    Ok(())
}

async fn analyze_passage(
    input: &Path,
    targets: Option<TargetMetrics>,
    config: Option<&Path>,
) -> Result<()> {
    let text = read_passage(input)?;
    let config = load_config(config)?;
    let analyzer = HttpAnalyzer::new(config.analyzer.clone(), config.call_timeout())
        .context("Failed to build analyzer client")?;

    let metrics = analyzer
        .analyze(&text)
        .await
        .context("Failed to analyze passage")?;

    println!("Passage Analysis");
    println!("================");
    println!("Average sentence length: {:.3}", metrics.structural_len);
    println!("Embedded clause ratio: {:.3}", metrics.clause_ratio);
    println!("A1/A2 content word ratio: {:.3}", metrics.lexical_ratio);

    let counts = &metrics.counts;
    let show = |count: Option<u32>| count.map_or_else(|| "n/a".to_string(), |c| c.to_string());
    println!();
    println!("Sentences: {}", show(counts.sentence_count));
    println!("Tokens: {}", show(counts.token_count));
    println!("Sentences with embedded clauses: {}", show(counts.clause_sentence_count));
    println!("Content lemmas (no proper nouns): {}", show(counts.nvjd_total));
    println!("A1/A2 content lemmas: {}", show(counts.nvjd_simple_count));

    if let Some(targets) = targets {
        let tolerance = ToleranceSpec::new(targets, config.default_margins)?;
        let evaluation = evaluate(&metrics, &tolerance)?;
        println!();
        println!("Evaluation");
        println!("----------");
        println!("{}", evaluation.summary());
    }

    Ok(())
}
