//! crash-relay CLI
//!
//! Drives the two lifecycle phases of the relay (startup sweep over old
//! dumps, shutdown check for a fresh one) plus single-file diagnostics.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use crash_relay::{
    sweeper, CrashDumpReader, CrashTester, DiscordHandler, DiscordOptions, RelayConfig,
    WebhookClient, WebhookConfig,
};

#[derive(Parser)]
#[command(name = "crash-relay")]
#[command(about = "Extract framed crash dumps from server logs and relay them to a Discord webhook")]
#[command(version)]
struct Cli {
    /// Path to the JSON config file (default: ./crash-relay.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check old crash dumps, deleting expired ones when configured
    Sweep,
    /// Check for crash dumps newer than the server start time and report them
    Report {
        /// Server start time, seconds since epoch (default: report every valid dump)
        #[arg(long)]
        start_time: Option<f64>,
    },
    /// Decode one dump file and submit it to the webhook
    Send {
        /// Crash dump log file
        file: PathBuf,
    },
    /// Decode one dump file and print the record as JSON
    Decode {
        /// Crash dump log file
        file: PathBuf,
    },
    /// Deliberately crash this process when given the matching code
    TestCrash {
        /// Secret code printed by a run without arguments
        code: Option<u32>,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crash_relay=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = RelayConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Sweep => {
            sweeper::check_old_dumps(&cfg)?;
        }
        Commands::Report { start_time } => {
            sweeper::check_new_dump(&cfg, start_time.unwrap_or(0.0))?;
        }
        Commands::Send { file } => {
            let reader = CrashDumpReader::read(&file)?;
            if !reader.has_read() {
                warn!(file = %file.display(), "not a valid crash dump, nothing to send");
                return Ok(());
            }

            let client = WebhookClient::new(WebhookConfig {
                url: cfg.webhook_url.clone(),
                timeout_secs: cfg.timeout_secs,
            })?;
            let handler = DiscordHandler::new(
                client,
                DiscordOptions {
                    announce_crash: cfg.announce_crash_report,
                    full_path: cfg.announce_full_path,
                    date_format: cfg.date_format.clone(),
                    attach_dump_file: cfg.attach_dump_file,
                    data_dir: cfg.data_dir.clone(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            );
            handler.submit(&reader)?;
        }
        Commands::Decode { file } => {
            let reader = CrashDumpReader::read(&file)?;
            match reader.data() {
                Some(data) => println!("{}", serde_json::to_string_pretty(data)?),
                None => warn!(file = %file.display(), "not a valid crash dump"),
            }
        }
        Commands::TestCrash { code } => {
            let tester = CrashTester::new();
            println!("{}", tester.trigger(code));
        }
    }

    Ok(())
}
