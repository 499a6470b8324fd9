//! End-to-end pipeline tests: framed fixture file -> decode -> embed.

use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use tempfile::TempDir;

use crash_relay::notification::embed;
use crash_relay::{CrashDumpReader, CrashRecord, BEGIN_MARKER, END_MARKER};

/// Inverse of the production decode chain, used only to build fixtures.
fn encode_payload(record: &Value) -> String {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(record.to_string().as_bytes())
        .unwrap();
    BASE64.encode(encoder.finish().unwrap())
}

fn write_framed(dir: &Path, name: &str, body_lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "Some preamble the server wrote").unwrap();
    writeln!(file, "{}", BEGIN_MARKER).unwrap();
    for line in body_lines {
        writeln!(file, "{}", line).unwrap();
    }
    writeln!(file, "{}", END_MARKER).unwrap();
    writeln!(file, "Trailing log output").unwrap();
    path
}

fn full_record() -> Value {
    json!({
        "time": 1700000000,
        "uptime": 125,
        "error": {
            "message": "Undefined offset: 3",
            "type": "ErrorException",
            "file": "src/world/World.php",
            "line": 581
        },
        "code": {
            "579": "$chunk = $this->chunks[$index];",
            "580": "if($chunk === null){",
            "581": "    return $chunk->getBlock($x, $y, $z);",
            "582": "}"
        },
        "trace": [
            "#0 src/world/World.php(581): World->getChunk()",
            "#1 src/Server.php(2110): World->getBlock()"
        ],
        "plugin_involvement": "None",
        "general": {"git": "deadbeef1234"}
    })
}

#[test]
fn decode_roundtrips_a_full_record() {
    let dir = TempDir::new().unwrap();
    let record = full_record();
    let payload = encode_payload(&record);
    let path = write_framed(dir.path(), "crash.log", &[&payload]);

    let reader = CrashDumpReader::read(&path).unwrap();
    assert!(reader.has_read());
    assert_eq!(reader.creation_time().unwrap(), 1700000000.0);

    // The decoded mapping is equivalent to what was encoded.
    let decoded = Value::Object(reader.data().unwrap().clone());
    assert_eq!(decoded, record);
}

#[test]
fn decode_handles_wrapped_base64() {
    let dir = TempDir::new().unwrap();
    let payload = encode_payload(&full_record());
    let chunks: Vec<String> = payload
        .as_bytes()
        .chunks(16)
        .map(|c| format!("  {}", String::from_utf8_lossy(c)))
        .collect();
    let refs: Vec<&str> = chunks.iter().map(|s| s.as_str()).collect();
    let path = write_framed(dir.path(), "crash.log", &refs);

    let reader = CrashDumpReader::read(&path).unwrap();
    assert!(reader.has_read());
}

#[test]
fn markers_with_only_an_empty_line_between_yield_absent() {
    let dir = TempDir::new().unwrap();
    let path = write_framed(dir.path(), "crash.log", &[""]);

    let reader = CrashDumpReader::read(&path).unwrap();
    assert!(!reader.has_read());
    assert!(reader.creation_time().is_err());
}

#[test]
fn missing_end_marker_yields_absent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("crash.log");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", BEGIN_MARKER).unwrap();
    writeln!(file, "{}", encode_payload(&full_record())).unwrap();

    let reader = CrashDumpReader::read(&path).unwrap();
    assert!(!reader.has_read());
}

#[test]
fn non_object_payload_yields_absent() {
    let dir = TempDir::new().unwrap();
    let payload = encode_payload(&json!(["not", "an", "object"]));
    let path = write_framed(dir.path(), "crash.log", &[&payload]);

    let reader = CrashDumpReader::read(&path).unwrap();
    assert!(!reader.has_read());
}

#[test]
fn embed_from_decoded_record_respects_budgets() {
    let dir = TempDir::new().unwrap();

    // Oversized free-form fields: long message, wide code window, deep trace.
    let mut record = full_record();
    record["error"]["message"] = json!("boom ".repeat(200));
    let code: serde_json::Map<String, Value> = (1..=200)
        .map(|i| (i.to_string(), json!(format!("statement_{}();", i))))
        .collect();
    record["code"] = Value::Object(code);
    record["trace"] = json!((0..200)
        .map(|i| format!("#{} some/very/long/path/Frame.php({}): call()", i, i))
        .collect::<Vec<_>>());

    let payload = encode_payload(&record);
    let path = write_framed(dir.path(), "crash.log", &[&payload]);
    let reader = CrashDumpReader::read(&path).unwrap();
    let decoded = reader.record().unwrap();

    let built = embed::build_embed(&decoded, "%d.%m.%Y %H:%M:%S", "0.1.0");

    let title = built["title"].as_str().unwrap();
    assert!(title.chars().count() <= "Error: ".len() + embed::TITLE_BUDGET);

    for field in built["fields"].as_array().unwrap() {
        let value = field["value"].as_str().unwrap();
        assert!(
            value.chars().count() <= embed::FIELD_BUDGET,
            "field {} exceeds budget",
            field["name"]
        );
    }

    // The closing fence survives truncation on both fenced fields.
    for name in ["Code", "Trace"] {
        let value = built["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == name)
            .unwrap()["value"]
            .as_str()
            .unwrap();
        assert!(value.ends_with("\n```"), "{} lost its closing fence", name);
    }

    assert!(embed::PALETTE.contains(&(built["color"].as_u64().unwrap() as u32)));
}

#[test]
fn embed_marks_fault_line_and_falls_back_for_missing_plugin() {
    let dir = TempDir::new().unwrap();
    let payload = encode_payload(&full_record());
    let path = write_framed(dir.path(), "crash.log", &[&payload]);
    let reader = CrashDumpReader::read(&path).unwrap();
    let record = reader.record().unwrap();

    let built = embed::build_embed(&record, "%Y-%m-%d", "0.1.0");
    let fields = built["fields"].as_array().unwrap();

    let code = fields.iter().find(|f| f["name"] == "Code").unwrap()["value"]
        .as_str()
        .unwrap();
    assert!(code.contains(">[581]"));
    assert!(code.contains(" [580]"));

    let plugin = fields.iter().find(|f| f["name"] == "Plugin").unwrap();
    assert_eq!(plugin["value"], "**?**");

    let uptime = fields.iter().find(|f| f["name"] == "Server Uptime").unwrap();
    assert_eq!(uptime["value"], "2 minutes");
}

#[test]
fn weakly_typed_record_survives_string_numbers() {
    let dir = TempDir::new().unwrap();
    let payload = encode_payload(&json!({"time": "1234.5", "uptime": "45.5"}));
    let path = write_framed(dir.path(), "crash.log", &[&payload]);

    let reader = CrashDumpReader::read(&path).unwrap();
    assert_eq!(reader.creation_time().unwrap(), 1234.5);

    let data = reader.data().unwrap();
    let record = CrashRecord::new(data);
    assert_eq!(embed::humanize_uptime(record.uptime()), "45.5 seconds");
}
