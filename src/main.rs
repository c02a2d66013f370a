//! MCP server entrypoint.
//!
//! Serves the memory tools over stdio (default) or the HTTP event-stream transport, selected by
//! `--transport` / `TRANSPORT`. Everything else is configured through environment variables,
//! optionally loaded from a `.env` file.
use std::process::ExitCode;

use clap::Parser;
use mcp_mem0::{
    config::{Settings, Transport},
    database::PostgresProbe,
    lifecycle::{self, ServeOptions},
    logging,
    memory::resolve_memory_config,
};

#[derive(Debug, Parser)]
#[command(name = "mcp-mem0", version, about = "Long-term memory MCP server backed by Mem0")]
struct Cli {
    /// `stdio`, or `sse` for the HTTP event-stream transport.
    #[arg(long, env = "TRANSPORT", default_value = "stdio")]
    transport: String,
    /// Host name or address the HTTP transport binds to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port the HTTP transport binds to.
    #[arg(long, env = "PORT", default_value_t = 8050)]
    port: u16,
}

/// Exit status for a command line that did not parse: 0 for `--help`/`--version`, 1 otherwise.
fn parse_failure_status(error: &clap::Error) -> u8 {
    if error.use_stderr() { 1 } else { 0 }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return ExitCode::from(parse_failure_status(&error));
        }
    };

    let loaded = Settings::from_env().map(|settings| {
        let resolved = resolve_memory_config(&settings);
        (settings, resolved)
    });

    // SAFETY: no other thread exists yet; the log writer and the runtime start below.
    let exported = match &loaded {
        Ok((_, resolved)) => unsafe { resolved.export_credentials() },
        Err(_) => Vec::new(),
    };

    logging::init_tracing();
    tracing::debug!("Starting application");
    for variable in exported {
        tracing::debug!(variable, "Exported provider credential");
    }

    let (settings, resolved) = match loaded {
        Ok(pair) => pair,
        Err(error) => {
            tracing::error!(error = %error, "Environment check failed");
            return ExitCode::FAILURE;
        }
    };

    let options = ServeOptions {
        transport: Transport::from_selector(&cli.transport),
        host: cli.host,
        port: cli.port,
    };

    let run = lifecycle::run(&settings, &resolved, options, &PostgresProbe);
    match lifecycle::block_on_detached(run) {
        Ok(status) => {
            tracing::debug!(status, "Application finished");
            ExitCode::from(status)
        }
        Err(error) => {
            tracing::error!(error = %error, "Failed to start async runtime");
            ExitCode::FAILURE
        }
    }
}
