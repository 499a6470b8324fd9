//! Embed assembly and truncation
//!
//! Discord enforces hard limits per embed: 256 characters for the title and
//! 1024 per field value. Free-form fields (title, code window, trace) are
//! truncated independently against those budgets; the fenced blocks truncate
//! their body first and append the closing fence afterwards, so the fence
//! always survives.

use std::collections::BTreeMap;

use chrono::{Local, TimeZone};
use rand::seq::SliceRandom;
use serde_json::{json, Value};

use crate::dump::CrashRecord;

/// Per-field value budget, characters.
pub const FIELD_BUDGET: usize = 1024;
/// Title budget, characters.
pub const TITLE_BUDGET: usize = 256;

/// Fixed accent palette; one entry is picked uniformly at random per embed.
pub const PALETTE: [u32; 5] = [16761035, 346726, 15680081, 6277471, 16439902];

const FENCE_OPEN: &str = "```\n";
const CODE_FENCE_OPEN: &str = "```php\n";
const FENCE_CLOSE: &str = "\n```";

/// Render `uptime` seconds in the coarsest readable unit.
pub fn humanize_uptime(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{} seconds", (seconds * 100.0).round() / 100.0)
    } else if seconds < 3600.0 {
        format!("{} minutes", (seconds / 60.0).round())
    } else if seconds < 86400.0 {
        format!("{} hours", (seconds / 3600.0).round())
    } else {
        format!("{} days", (seconds / 86400.0).round())
    }
}

/// Wrap `body` in a code fence, truncating the body so the whole block fits
/// `FIELD_BUDGET`. The closing fence is appended after truncation, never cut.
pub fn fenced_block(body: &str) -> String {
    fenced(FENCE_OPEN, body)
}

fn fenced(open: &str, body: &str) -> String {
    let room = FIELD_BUDGET - open.len() - FENCE_CLOSE.len();
    format!("{}{}{}", open, truncate_chars(body, room), FENCE_CLOSE)
}

/// Source window with the fault line prefixed by `>`, in a php-highlighted
/// fence. The longer opening fence eats into the same overall budget.
pub fn render_code_window(code: &BTreeMap<i64, String>, fault_line: i64) -> String {
    let lines: Vec<String> = code
        .iter()
        .map(|(line, text)| {
            let prefix = if *line == fault_line { '>' } else { ' ' };
            format!("{}[{}] {}", prefix, line, text)
        })
        .collect();
    fenced(CODE_FENCE_OPEN, &lines.join("\n"))
}

pub fn render_trace(trace: &[String]) -> String {
    fenced_block(&trace.join("\n"))
}

/// Embed title: the error message (or a fallback when absent or empty)
/// truncated to the title budget, behind an `Error: ` prefix.
pub fn build_title(message: Option<&str>) -> String {
    let message = match message {
        Some(m) if !m.trim().is_empty() => m,
        _ => "Unknown error",
    };
    format!("Error: {}", truncate_chars(message, TITLE_BUDGET))
}

/// Uniformly random accent color. Cosmetic; callers only rely on the value
/// being a member of `PALETTE`.
pub fn pick_color() -> u32 {
    *PALETTE.choose(&mut rand::thread_rng()).unwrap_or(&PALETTE[0])
}

/// Render the creation timestamp through the configured strftime format, in
/// local time.
pub fn format_server_time(epoch_seconds: f64, format: &str) -> String {
    Local
        .timestamp_opt(epoch_seconds as i64, 0)
        .single()
        .map(|t| t.format(format).to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Assemble the full embed for one crash record.
///
/// Field order is fixed; structured fields (type, line, revision) cannot
/// plausibly exceed the budget and are not truncated.
pub fn build_embed(record: &CrashRecord<'_>, date_format: &str, version: &str) -> Value {
    let fault_line = record.fault_line();

    let fields = [
        ("Exception Class", record.error_type().to_string()),
        ("File", format!("**{}**", record.error_file())),
        ("Line", format!("**{}**", fault_line)),
        ("Plugin involved", record.plugin_involvement().to_string()),
        ("Plugin", format!("**{}**", record.plugin().unwrap_or("?"))),
        ("Code", render_code_window(&record.code(), fault_line)),
        ("Trace", render_trace(&record.trace())),
        ("Server Time", format_server_time(record.time(), date_format)),
        ("Server Uptime", humanize_uptime(record.uptime())),
        ("Server Git Commit", format!("__{}__", record.git_revision())),
    ];

    json!({
        "color": pick_color(),
        "title": build_title(record.error_message()),
        "fields": fields
            .iter()
            .map(|(name, value)| json!({"name": name, "value": value}))
            .collect::<Vec<_>>(),
        "footer": {
            "text": format!("Sent by crash-relay v{}", version)
        }
    })
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
