//! `notegraph` command line.
//!
//! ```text
//! notegraph [--root DIR] tools
//! notegraph [--root DIR] <tool> [JSON-ARGS]
//! ```
//!
//! Tool results are printed to stdout as JSON; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use serde_json::Value;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use notegraph_core::Config;
use notegraph_store::NoteStore;

mod tools;

use tools::{ToolContext, ToolManager};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("usage: notegraph [--root DIR] tools | <tool> [JSON-ARGS]")]
    Usage,

    #[error("invalid JSON arguments: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Tool(String),
}

/// Parsed command line.
#[derive(Debug)]
struct Invocation {
    root: Option<PathBuf>,
    command: String,
    args: Value,
}

fn parse_invocation(mut argv: impl Iterator<Item = String>) -> Result<Invocation, CliError> {
    let mut root = None;
    let mut command = argv.next().ok_or(CliError::Usage)?;
    if command == "--root" {
        root = Some(PathBuf::from(argv.next().ok_or(CliError::Usage)?));
        command = argv.next().ok_or(CliError::Usage)?;
    }
    let args = match argv.next() {
        Some(raw) => serde_json::from_str(&raw)?,
        None => Value::Object(Default::default()),
    };
    if argv.next().is_some() {
        return Err(CliError::Usage);
    }
    Ok(Invocation {
        root,
        command,
        args,
    })
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: Config, invocation: Invocation) -> Result<(), Box<dyn std::error::Error>> {
    let manager = ToolManager::new();

    if invocation.command == "tools" {
        for tool in manager.get_tools() {
            println!("{:<24} {}", tool.name(), tool.description());
        }
        return Ok(());
    }

    let mut settings = config.store;
    if let Some(root) = invocation.root {
        settings.root_override = Some(root);
    }
    let store = NoteStore::open(settings).await?;
    let context = ToolContext::new(store);

    debug!(tool = %invocation.command, "executing tool");
    let output = manager
        .execute_with_context(&invocation.command, invocation.args, &context)
        .await
        .map_err(CliError::Tool)?;
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_level());

    let invocation = match parse_invocation(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    match run(config, invocation).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
