//! `scriptrelay` -- submit scripts to a remote scene worker.
//!
//! Without a subcommand the interactive menu starts. Every submission is
//! recorded in a per-session JSON log under `SESSION_DIR`.
//!
//! # Environment variables
//!
//! | Variable                 | Default               | Description                        |
//! |--------------------------|-----------------------|------------------------------------|
//! | `WORKER_WS_URL`          | `ws://127.0.0.1:9876` | Worker WebSocket endpoint          |
//! | `SCRIPT_TIMEOUT_SECS`    | `30`                  | Per-job timeout                    |
//! | `CONNECT_TIMEOUT_SECS`   | `5`                   | Per-attempt connect timeout        |
//! | `RETRY_MAX_ATTEMPTS`     | `3`                   | Connection attempts per submission |
//! | `RETRY_INITIAL_DELAY_MS` | `500`                 | First backoff delay                |
//! | `RETRY_MAX_DELAY_MS`     | `5000`                | Backoff cap                        |
//! | `SESSION_DIR`            | `sessions`            | Session log directory              |
//!
//! Exit codes: `0` success, `1` fatal error, `2` a composite step failed.

use std::io::Write;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scriptrelay_cli::app::App;
use scriptrelay_cli::cli::{Cli, Command};
use scriptrelay_cli::config::CliConfig;
use scriptrelay_cli::{menu, report, steps};

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "scriptrelay=info,scriptrelay_cli=info,scriptrelay_client=info,\
                                  scriptrelay_pipeline=info,scriptrelay_store=info";

/// Exit code for a composite run that stopped at a failed step.
const EXIT_STEP_FAILED: i32 = 2;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = CliConfig::from_env()?;
    config.apply_overrides(&cli)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let code = match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => {
            let app = App::start(config).await?;
            menu::run_menu(&app, BufReader::new(tokio::io::stdin()), &mut out).await?;
            0
        }
        Command::Run { paths } => {
            let steps = steps::load_steps(&paths).await?;
            let app = App::start(config).await?;
            tracing::info!(
                worker = %app.config().client.worker_url,
                steps = steps.len(),
                "Starting one-shot composite run",
            );
            let result = app.run_steps(steps, &mut out).await?;
            if result.is_success() {
                0
            } else {
                EXIT_STEP_FAILED
            }
        }
        Command::Sessions => {
            let listings = scriptrelay_store::list_sessions(&config.session_dir).await?;
            write!(out, "{}", report::session_listing(&listings))?;
            0
        }
        Command::Show { file } => {
            let log = scriptrelay_store::load(&file).await?;
            write!(out, "{}", report::session_view(&log))?;
            write!(out, "\n{}", report::session_report(&log, &file))?;
            0
        }
    };

    out.flush()?;
    Ok(code)
}
