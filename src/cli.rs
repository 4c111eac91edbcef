use crate::{
    config::Config,
    extract::{CommandOcr, Extractor},
    model::{Model, Vendor},
    reader::Reader,
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "speedread")]
#[command(about = "Summarize PDF and text documents with an LLM")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./speedread.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report external tool availability and which API key variables are set.
    Doctor {},
    /// Print the text extracted from a document.
    Extract {
        #[arg(long)]
        input: PathBuf,
    },
    /// Summarize a document.
    Summarize {
        #[arg(long)]
        input: PathBuf,
        /// Model identifier, e.g. claude-3-opus-20240229 or gpt-4o.
        #[arg(long)]
        model: Option<String>,
        /// Instruction placed after the document text.
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Print the summary with model and usage metadata as JSON.
        #[arg(long)]
        json: bool,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let _guard = init_logging(&args, &cfg)?;

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Extract { input } => extract(&cfg, input),
        Command::Summarize {
            input,
            model,
            prompt,
            max_tokens,
            json,
        } => summarize(
            &cfg,
            input,
            model.as_deref(),
            prompt.as_deref(),
            *max_tokens,
            *json,
        ),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("speedread.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the summary; logs go to stderr.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = match resolve_log_path(cfg) {
        Some(path) => {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            ensure_dir(parent)?;
            let file = std::fs::File::create(&path)
                .with_context(|| format!("create log file: {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from("speedread.log"))
}

fn doctor(cfg: &Config) -> Result<()> {
    let tools = CommandOcr::new(&cfg.ocr).doctor();
    let keys: Vec<_> = [Vendor::Anthropic, Vendor::OpenAi]
        .into_iter()
        .map(|vendor| {
            let env_var = &cfg.provider(vendor).api_key_env;
            serde_json::json!({
                "vendor": vendor,
                "env_var": env_var,
                "set": std::env::var(env_var).map(|v| !v.trim().is_empty()).unwrap_or(false),
            })
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "ocr_enabled": cfg.ocr.enabled,
            "tools": tools,
            "api_keys": keys,
        }))?
    );
    Ok(())
}

fn extract(cfg: &Config, input: &Path) -> Result<()> {
    let doc = Extractor::new(cfg)
        .extract(input)
        .with_context(|| format!("extracting {}", input.display()))?;
    info!(
        "extracted {} via {:?} pages={:?}",
        doc.path, doc.method, doc.page_count
    );
    println!("{}", doc.text());
    Ok(())
}

fn summarize(
    cfg: &Config,
    input: &Path,
    model: Option<&str>,
    prompt: Option<&str>,
    max_tokens: Option<u32>,
    json: bool,
) -> Result<()> {
    let model_id = model.unwrap_or(cfg.model.default.as_str());
    let model = Model::parse(model_id)?;
    debug!("model={} vendor={}", model.id, model.vendor);

    let mut reader = Reader::from_config(cfg, &model.id, None)?;
    if let Some(n) = max_tokens {
        reader = reader.with_max_tokens(n);
    }

    let started = now_rfc3339();
    let summary = reader
        .summarize_file(input, prompt)
        .with_context(|| format!("summarizing {}", input.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "input": input,
                "started": started,
                "finished": now_rfc3339(),
                "summary": summary,
            }))?
        );
    } else {
        println!("{}", summary.text);
    }
    Ok(())
}
