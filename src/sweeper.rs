//! Crash dump sweeps
//!
//! Two distinct lifecycle phases, never interleaved: the startup sweep over
//! old dumps (optionally deleting expired ones) and the shutdown check for a
//! dump produced by the current run. Failure isolation is per-file: nothing
//! a single file does may abort the sweep over the rest.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::dump::CrashDumpReader;
use crate::notification::{DiscordHandler, DiscordOptions, WebhookClient, WebhookConfig};

/// Candidate dump files: `*.log` directly under `dir`, sorted by name. A
/// missing directory means no candidates, not an error.
pub fn crash_dump_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "log"))
        .collect();
    files.sort();
    Ok(files)
}

/// Startup sweep: decode every candidate and, when deletion is enabled,
/// remove dumps older than the validity window.
pub fn check_old_dumps(cfg: &RelayConfig) -> Result<()> {
    let files = crash_dump_files(&cfg.crashdump_dir())?;
    info!(files = files.len(), "checking old crash dumps");

    let now = Utc::now().timestamp() as f64;
    let mut removed = 0usize;

    for path in &files {
        match check_one_old_dump(cfg, path, now) {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(
                    file = %file_label(path),
                    error = %e,
                    "error during file check"
                );
            }
        }
    }

    let percentage = if files.is_empty() {
        "NAN".to_string()
    } else {
        format!("{:.2}", removed as f64 * 100.0 / files.len() as f64)
    };
    info!(removed, percentage = %percentage, "checks finished");
    Ok(())
}

fn check_one_old_dump(cfg: &RelayConfig, path: &Path, now: f64) -> Result<bool> {
    let reader = CrashDumpReader::read(path)?;
    if !reader.has_read() {
        return Ok(false);
    }

    if cfg.delete_files && now - reader.creation_time()? >= cfg.validity_secs() {
        fs::remove_file(path)?;
        debug!(file = %file_label(path), "deleted expired crash dump");
        return Ok(true);
    }
    Ok(false)
}

/// Shutdown check: submit any dump whose creation time is at or after
/// `start_time` (the server start epoch). Requires `report_crash` and a
/// configured webhook URL.
pub fn check_new_dump(cfg: &RelayConfig, start_time: f64) -> Result<()> {
    if !cfg.report_crash {
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

    debug!("checking for new crash dump");
    for path in crash_dump_files(&cfg.crashdump_dir())? {
        if let Err(e) = check_one_new_dump(&handler, &path, start_time) {
            warn!(
                file = %file_label(&path),
                error = %e,
                "error while checking potentially new crash dump"
            );
        }
    }
    debug!("checks finished");
    Ok(())
}

fn check_one_new_dump(handler: &DiscordHandler, path: &Path, start_time: f64) -> Result<()> {
    let reader = CrashDumpReader::read(path)?;
    if !reader.has_read() || reader.creation_time()? < start_time {
        return Ok(());
    }

    info!(file = %file_label(path), "new crash dump found, sending now");
    handler.submit(&reader)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
