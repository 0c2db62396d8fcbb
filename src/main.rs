//! CLI entry point for the text.ru client.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use textru::{CheckClient, CheckOptions, CheckResult, ReqwestHttpClient, parse_check_result};
use tracing::{debug, info};

mod cli;
mod config;

use cli::{Args, Command, ParseArgs, ResultArgs, SubmitArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    init_tracing(default_level);

    debug!(command = args.command.name(), "CLI arguments parsed");

    match &args.command {
        Command::Submit(submit_args) => run_submit(&args, submit_args).await,
        Command::Result(result_args) => run_result(&args, result_args).await,
        // Parsing needs neither network access nor configuration.
        Command::Parse(parse_args) => run_parse(parse_args),
        Command::Balance => run_balance(&args).await,
    }
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn build_client(args: &Args) -> Result<CheckClient> {
    let settings = config::resolve_settings(args)?;
    let api_key = settings.require_api_key()?;
    let http = Arc::new(
        ReqwestHttpClient::with_timeouts(settings.timeouts)
            .context("Failed to initialize HTTP client")?,
    );
    match settings.base_url.as_deref() {
        Some(base_url) => CheckClient::with_base_url(api_key, http, base_url)
            .with_context(|| format!("Invalid API base URL '{base_url}'")),
        None => Ok(CheckClient::new(api_key, http)),
    }
}

async fn run_submit(global: &Args, args: &SubmitArgs) -> Result<()> {
    let client = build_client(global)?;
    let text = match (&args.text, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => read_file(path)?,
        (None, None) => read_stdin("text to check")?,
    };
    if text.trim().is_empty() {
        bail!("Refusing to submit an empty text");
    }

    let mut options = CheckOptions::new()
        .public(args.public)
        .visual_report(args.visual_report)
        .exclude_domains(args.exclude_domains.iter().cloned());
    if let Some(callback) = &args.callback {
        options = options.callback(callback.clone());
    }

    let text_id = client
        .submit(&text, &options)
        .await
        .context("Submission failed")?;
    info!(text_id = %text_id, "Text submitted");
    println!("{text_id}");
    Ok(())
}

async fn run_result(global: &Args, args: &ResultArgs) -> Result<()> {
    let client = build_client(global)?;
    let result = client
        .poll_result(&args.uid)
        .await
        .with_context(|| format!("Failed to fetch result for '{}'", args.uid))?;
    print_result(&result, args.json)
}

fn run_parse(args: &ParseArgs) -> Result<()> {
    let body = match &args.file {
        Some(path) => read_file(path)?,
        None => read_stdin("result body")?,
    };
    let result =
        parse_check_result(&body, args.uid.as_deref()).context("Failed to parse result body")?;
    print_result(&result, args.json)
}

async fn run_balance(global: &Args) -> Result<()> {
    let client = build_client(global)?;
    let symbols = client
        .available_symbols()
        .await
        .context("Failed to fetch account balance")?;
    println!("{symbols}");
    Ok(())
}

fn print_result(result: &CheckResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(result)?);
    } else {
        println!("text_uid: {}", result.text_id());
        println!("unique: {}", result.unique_percent());
        println!("water: {}", result.water_percent());
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))
}

fn read_stdin(what: &str) -> Result<String> {
    if io::stdin().is_terminal() {
        bail!("No {what} provided. Pass it as an argument, a file, or pipe it via stdin.");
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}
