//! voiceguard: submit an audio clip for voice-authenticity analysis.
//!
//! Usage:
//!   voiceguard analyze <FILE> [--base-url <url>] [--api-key <key>] [--json]
//!   voiceguard validate <FILE>

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use voiceguard_client::client::{classify, AudioValidator, Failure};
use voiceguard_client::progress::TracingProgressSink;
use voiceguard_client::types::format_size;
use voiceguard_client::{
    AnalysisClientBuilder, AnalysisResult, AnalysisSession, AudioPayload, ClientConfig,
};

#[derive(Parser)]
#[command(name = "voiceguard")]
#[command(about = "Voice-authenticity analysis client")]
#[command(version)]
struct Cli {
    /// YAML config file; VOICEGUARD_* variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (same as RUST_LOG=debug)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a clip and print the verdict
    Analyze(AnalyzeArgs),
    /// Run the pre-flight checks only
    Validate {
        /// Audio file
        file: PathBuf,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Audio file
    file: PathBuf,

    /// Analysis service base URL
    #[arg(long, env = "VOICEGUARD_BACKEND_URL")]
    base_url: Option<String>,

    /// API key sent as x-api-key
    #[arg(long, env = "VOICEGUARD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Maximum number of attempts
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Give up after the first failure
    #[arg(long)]
    no_auto_retry: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze(args) => analyze(config, args).await,
        Commands::Validate { file } => validate(config, file),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    let config = match path {
        Some(p) => ClientConfig::from_yaml_file(p)
            .with_context(|| format!("reading config {}", p.display()))?,
        None => ClientConfig::default(),
    };
    Ok(config.apply_env()?)
}

fn read_payload(file: &Path) -> anyhow::Result<AudioPayload> {
    AudioPayload::from_path(file).with_context(|| format!("reading {}", file.display()))
}

fn validate(config: ClientConfig, file: PathBuf) -> anyhow::Result<()> {
    let payload = read_payload(&file)?;
    // pre-flight only: no HTTP client, so the endpoint settings are irrelevant
    let validator = AudioValidator::new(config.validator_config());
    match validator.validate(&payload) {
        Ok(()) => {
            println!(
                "{}: OK ({}, {}, ~{}s)",
                file.display(),
                format_size(payload.len() as u64),
                payload.effective_media_type(),
                payload.estimated_duration_secs()
            );
            Ok(())
        }
        Err(e) => {
            let info = classify(&Failure::Validation(e));
            eprintln!("{}: {}", file.display(), info.format_user_message());
            std::process::exit(1);
        }
    }
}

async fn analyze(config: ClientConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let mut builder = AnalysisClientBuilder::from_config(config);
    if let Some(url) = args.base_url {
        builder = builder.base_url(url);
    }
    if let Some(key) = args.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ms) = args.timeout_ms {
        builder = builder.timeout(Duration::from_millis(ms));
    }
    if let Some(n) = args.max_attempts {
        builder = builder.max_attempts(n);
    }
    if args.no_auto_retry {
        builder = builder.auto_retry(false);
    }
    let client = Arc::new(builder.build()?);

    let payload = read_payload(&args.file)?;
    let options = client
        .default_options()
        .with_progress(Arc::new(TracingProgressSink::new("voiceguard")));

    let session = AnalysisSession::new(client);
    let state = session.analyze(payload, options).await?;

    if let Some(result) = &state.data {
        if args.json {
            println!("{}", serde_json::to_string_pretty(result)?);
        } else {
            print_result(result, state.retry_count);
        }
        return Ok(());
    }

    if let Some(err) = &state.error {
        if args.json {
            println!("{}", serde_json::to_string_pretty(err)?);
        }
        eprintln!("{}", err.format_user_message());
    }
    std::process::exit(1);
}

fn print_result(result: &AnalysisResult, retries: u32) {
    println!("Decision:              {:?}", result.decision);
    println!("Authenticity score:    {:.4}", result.scores.authenticity_score);
    println!("Confidence:            {:.1}%", result.scores.confidence * 100.0);
    if let Some(t) = result.scores.trust_index {
        println!("Trust index:           {:.4}", t);
    }
    println!(
        "Human / synthetic:     {:.1}% / {:.1}%",
        result.provenance.human_probability * 100.0,
        result.provenance.synthetic_probability * 100.0
    );
    for (name, s) in &result.signals {
        println!(
            "  {:<20} confidence {:>5.1}%  weight {:>5.1}%",
            name,
            s.confidence * 100.0,
            s.weight * 100.0
        );
    }
    println!();
    println!("{}", result.explanation);
    if retries > 0 {
        println!("(succeeded after {} retr{})", retries, if retries == 1 { "y" } else { "ies" });
    }
}
