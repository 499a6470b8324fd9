//! Discord webhook submission for decoded crash dumps
//!
//! One attempt per dump per invocation: optional pre-announcement, then the
//! embed payload with an optional raw-file attachment. A non-204 status
//! means the delivery is uncertain, which is a warning, not a failure.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, error, warn};

use super::embed;
use super::webhook::{WebhookClient, ACCEPTED_STATUS};
use crate::dump::CrashDumpReader;

/// Formatting and behavior options; all ambient state (data dir, version) is
/// passed in explicitly so the handler is testable without a running server.
#[derive(Debug, Clone)]
pub struct DiscordOptions {
    /// Send a short crash announcement before the detailed embed
    pub announce_crash: bool,
    /// Identify the server by its full data path instead of the last segment
    pub full_path: bool,
    /// strftime format for the dump creation time
    pub date_format: String,
    /// Attach the raw dump file to the webhook payload
    pub attach_dump_file: bool,
    /// Server data directory, used to derive the identity label
    pub data_dir: PathBuf,
    /// Relay version, rendered in the embed footer
    pub version: String,
}

impl Default for DiscordOptions {
    fn default() -> Self {
        Self {
            announce_crash: true,
            full_path: false,
            date_format: "%d.%m.%Y (%A): %H:%M:%S [%z]".to_string(),
            attach_dump_file: true,
            data_dir: PathBuf::from("."),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

pub struct DiscordHandler {
    client: WebhookClient,
    options: DiscordOptions,
}

impl DiscordHandler {
    pub fn new(client: WebhookClient, options: DiscordOptions) -> Self {
        Self { client, options }
    }

    /// Submit one decoded dump. A reader without a record is a no-op; no
    /// transport call is made.
    pub fn submit(&self, reader: &CrashDumpReader) -> Result<()> {
        let Some(record) = reader.record() else {
            return Ok(());
        };

        let server_label = self.server_label();
        if self.options.announce_crash {
            // Announcement failures must never abort the main submission.
            if let Err(e) = self.announce(&server_label) {
                error!(error = %e, "error during crash announcement");
            }
        }

        let payload = json!({
            "content": format!("Server \"{}\" crashed 👺", server_label),
            "embeds": [embed::build_embed(
                &record,
                &self.options.date_format,
                &self.options.version,
            )],
        });

        let status = if self.options.attach_dump_file {
            self.client.post_with_attachment(
                payload.to_string(),
                reader.file_name(),
                attachment_bytes(reader.path())?,
            )?
        } else {
            self.client.post_json(&payload)?
        };

        if status != ACCEPTED_STATUS {
            warn!(
                status = status.as_u16(),
                file = reader.file_name(),
                "crash dump possibly not sent; webhook api returned an unexpected http status"
            );
        } else {
            debug!(file = reader.file_name(), "crash dump sent");
        }

        Ok(())
    }

    fn announce(&self, server_label: &str) -> Result<()> {
        let payload = json!({
            "content": format!("Crash detected in \"{}\"", server_label),
        });
        let status = self.client.post_json(&payload)?;
        debug!(status = status.as_u16(), "crash announcement sent");
        Ok(())
    }

    /// Which server instance this is, per the `full_path` option.
    fn server_label(&self) -> String {
        if self.options.full_path {
            self.options.data_dir.display().to_string()
        } else {
            self.options
                .data_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.options.data_dir.display().to_string())
        }
    }
}

/// Raw dump bytes for the attachment, whitespace-trimmed. Dump files may
/// carry stray non-UTF-8 bytes around the framed payload, so this stays
/// binary-safe like the reader itself.
fn attachment_bytes(path: &Path) -> Result<Vec<u8>> {
    let contents = fs::read(path)
        .with_context(|| format!("failed to re-read {}", path.display()))?;
    Ok(contents.trim_ascii().to_vec())
}
