//! Crash dump file reader
//!
//! Scans a log file for the framed crash dump payload and runs it through
//! the decode chain: base64 -> zlib -> JSON object. A file that is not a
//! valid dump (missing markers, empty body, corrupt payload, wrong top-level
//! shape) is a normal outcome and yields `has_read() == false`; only the
//! I/O error on open/read propagates.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::ZlibDecoder;
use serde_json::{Map, Value};
use tracing::debug;

use super::record::CrashRecord;

/// Exact literal line opening the framed payload
pub const BEGIN_MARKER: &str = "===BEGIN CRASH DUMP===";
/// Exact literal line closing the framed payload
pub const END_MARKER: &str = "===END CRASH DUMP===";

/// One decode attempt over one file. No state is retained between files.
pub struct CrashDumpReader {
    path: PathBuf,
    data: Option<Map<String, Value>>,
}

impl CrashDumpReader {
    /// Open `path` and decode the framed payload, if any.
    ///
    /// An unreadable path is an operational problem and propagates; malformed
    /// content of every other kind is absorbed into `has_read() == false`.
    pub fn read(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        let body = scan_framed_body(BufReader::new(file))?;

        let data = match body {
            Some(body) => decode_chain(&body),
            None => None,
        };
        if data.is_none() {
            debug!(path = %path.display(), "no crash record in file");
        }

        Ok(Self { path, data })
    }

    /// Whether the file contained a decodable crash record.
    pub fn has_read(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    /// Typed view over the decoded record.
    pub fn record(&self) -> Option<CrashRecord<'_>> {
        self.data.as_ref().map(CrashRecord::new)
    }

    /// Creation timestamp of the dump, seconds since epoch.
    ///
    /// Calling this without checking `has_read()` first is a programmer
    /// error and fails, unlike framing/decode problems which never do.
    pub fn creation_time(&self) -> Result<f64> {
        match self.record() {
            Some(record) => Ok(record.time()),
            None => bail!("no crash record was read from {}", self.path.display()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the source file, used to tag the webhook attachment.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Collect the trimmed lines strictly between the first begin marker and the
/// first end marker after it, concatenated with no separator.
///
/// The end-marker check happens before a line is treated as body content, so
/// a line is never both. Lines before the begin marker and after the end
/// marker are ignored, not buffered.
fn scan_framed_body(mut reader: impl BufRead) -> std::io::Result<Option<String>> {
    let mut started = false;
    let mut ended = false;
    let mut body = String::new();

    // Raw byte lines with lossy conversion: a binary junk file must look
    // like "not a dump", not like an I/O failure.
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim();

        if started {
            if line == END_MARKER {
                ended = true;
                break;
            }
            body.push_str(line);
        } else if line == BEGIN_MARKER {
            started = true;
        }
    }

    if started && ended && !body.trim().is_empty() {
        Ok(Some(body))
    } else {
        Ok(None)
    }
}

/// base64 -> zlib -> JSON object. Any stage failure, or a top-level value
/// that is not an object, yields None; the failing stage is deliberately not
/// distinguishable to callers.
fn decode_chain(body: &str) -> Option<Map<String, Value>> {
    let compressed = match BASE64.decode(body) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "crash dump body is not valid base64");
            return None;
        }
    };

    let mut decompressed = Vec::new();
    if let Err(e) = ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut decompressed) {
        debug!(error = %e, "crash dump payload failed zlib decompression");
        return None;
    }

    match serde_json::from_slice::<Value>(&decompressed) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            debug!(kind = json_kind(&other), "crash dump decoded to a non-object value");
            None
        }
        Err(e) => {
            debug!(error = %e, "crash dump payload is not valid JSON");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
