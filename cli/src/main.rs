//! ssefetch CLI: open a line-delimited event stream from the terminal.
//!
//! # Commands
//! ```text
//! ssefetch listen  --url <URL> [--method M] [--header K:V]... [--body JSON]
//!                  [--retry-ms N] [--config FILE] [--flush-trailing]
//!                  [--json] [--max-events N]
//! ssefetch version
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd_listen;
mod logging;

#[derive(Parser)]
#[command(
    name = "ssefetch",
    about = "Reconnecting event-stream client",
    long_about = "
ssefetch: issue an HTTP request with any method, headers and body, then
print every line of the streamed response. Reconnects at a fixed interval
when the connection fails or the server ends the stream.

ENVIRONMENT VARIABLES:
  RUST_LOG    tracing filter, overrides --log-level
",
    version
)]
struct Cli {
    /// Log filter (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and print every message until Ctrl-C
    Listen {
        /// Stream endpoint
        #[arg(short, long)]
        url: String,
        /// HTTP method (default: POST, or the config file's)
        #[arg(short = 'X', long)]
        method: Option<String>,
        /// Extra request header as `Name: value`; repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Request body sent verbatim
        #[arg(short, long)]
        body: Option<String>,
        /// Send no request body
        #[arg(long, conflicts_with = "body")]
        no_body: bool,
        /// Delay between reconnection attempts in milliseconds
        #[arg(long)]
        retry_ms: Option<u64>,
        /// JSON file holding client options
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Deliver an unterminated last line when the stream ends
        #[arg(long)]
        flush_trailing: bool,
        /// Print each message record as a JSON line
        #[arg(long)]
        json: bool,
        /// Exit after this many messages
        #[arg(short = 'n', long)]
        max_events: Option<u64>,
    },

    /// Print version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level, cli.log_json);

    match cli.command {
        Commands::Listen {
            url,
            method,
            headers,
            body,
            no_body,
            retry_ms,
            config,
            flush_trailing,
            json,
            max_events,
        } => {
            let args = cmd_listen::ListenArgs {
                url,
                method,
                headers,
                body,
                no_body,
                retry_ms,
                config,
                flush_trailing,
                json,
                max_events,
            };
            cmd_listen::run(args).await
        }
        Commands::Version => {
            println!("ssefetch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
