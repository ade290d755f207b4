//! warden: policy-enforcement hook runner
//!
//! The host invokes `warden --hook <kind>` around each tool call with one
//! JSON event on stdin; warden answers with one aggregate JSON response on
//! stdout. The exit code is always zero when the runner functions; the
//! verdict travels entirely in the response body.

mod dispatcher;
mod io;
mod tasks;

use clap::Parser;
use dispatcher::Dispatcher;
use io::StdinProcessor;
use std::path::PathBuf;
use warden_core::config::{GlobalConfig, HooksConfig, Project};
use warden_core::{AggregateResponse, ExitCode, HookEvent, HookKind};

/// Policy-enforcement hook runner
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(about = "Policy-enforcement hook runner for AI coding agents")]
#[command(version)]
struct Cli {
    /// The hook kind to run (e.g. pre_tool_use, session_start)
    #[arg(long)]
    hook: HookKind,

    /// Configuration directory; discovered from the working directory when
    /// not given
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    std::process::exit(run(cli).await as i32);
}

async fn run(cli: Cli) -> ExitCode {
    let project = match cli.config_dir {
        Some(dir) => Project::with_config_dir(dir),
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            Project::discover(&cwd)
        }
    };

    let global = match GlobalConfig::load(&project.global_config_file()) {
        Ok(global) => global,
        Err(e) => {
            // A broken global config falls back to defaults; the event still
            // gets a response
            eprintln!("warden: global config unusable, using defaults: {e}");
            GlobalConfig::default()
        }
    };

    warden_core::logging::init_tracing(global.verbose_logging);

    let hooks = match HooksConfig::load(&project.hooks_file()) {
        Ok(hooks) => hooks,
        Err(e) => {
            tracing::warn!("hooks config unusable, treating as empty: {e}");
            HooksConfig::default()
        }
    };

    let mut processor = StdinProcessor::new();
    let response = match processor.read_json::<HookEvent>().await {
        Ok(event) => {
            let dispatcher = Dispatcher::new(project, global, hooks);
            dispatcher.dispatch(cli.hook, &event).await
        }
        Err(e) => {
            tracing::warn!("unreadable event on stdin: {e}");
            AggregateResponse::with_message(format!("Could not read hook event: {e}"))
        }
    };

    match serde_json::to_string(&response) {
        Ok(body) => {
            println!("{body}");
            ExitCode::Success
        }
        Err(e) => {
            tracing::error!("failed to serialize response: {e}");
            ExitCode::InternalError
        }
    }
}
