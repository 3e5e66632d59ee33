//! taskboard - task board CLI and HTTP server

use clap::Parser;
use taskboard::cli::Cli;
use taskboard::output::{emit_error, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used by `serve` when RUST_LOG is unset
const SERVE_DEFAULT_FILTER: &str = "taskboard=info,tower_http=info";

fn main() {
    let command = infer_command_name_from_args();

    // Tracing is opt-in via RUST_LOG, except for the server.
    // Keep startup robust in CI/robot envs: ignore invalid/huge filters.
    let fallback = if command == "serve" {
        SERVE_DEFAULT_FILTER
    } else {
        "off"
    };
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    if let Err(err) = cli.run() {
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
