//! Typed view over a decoded crash record
//!
//! The record comes from an external file on disk, so every field access is
//! defensive: wrong types degrade to a fallback instead of panicking.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Borrowed, weakly-typed accessors over the decoded JSON object.
#[derive(Debug, Clone, Copy)]
pub struct CrashRecord<'a> {
    data: &'a Map<String, Value>,
}

impl<'a> CrashRecord<'a> {
    pub fn new(data: &'a Map<String, Value>) -> Self {
        Self { data }
    }

    /// Creation timestamp, seconds since epoch.
    pub fn time(&self) -> f64 {
        self.num(self.data.get("time"))
    }

    /// Seconds the server had run before crashing.
    pub fn uptime(&self) -> f64 {
        self.num(self.data.get("uptime"))
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_field("message")
    }

    pub fn error_type(&self) -> &str {
        self.error_field("type").unwrap_or("?")
    }

    pub fn error_file(&self) -> &str {
        self.error_field("file").unwrap_or("?")
    }

    /// Line number the fault occurred on.
    pub fn fault_line(&self) -> i64 {
        self.num(self.data.get("error").and_then(|e| e.get("line"))) as i64
    }

    /// Source window around the fault, keyed by line number in ascending
    /// numeric order. Entries with unparsable keys are dropped.
    pub fn code(&self) -> BTreeMap<i64, String> {
        let mut window = BTreeMap::new();
        if let Some(Value::Object(lines)) = self.data.get("code") {
            for (key, text) in lines {
                if let Ok(number) = key.trim().parse::<i64>() {
                    window.insert(number, text_of(text));
                }
            }
        }
        window
    }

    /// Stack frames, in dump order.
    pub fn trace(&self) -> Vec<String> {
        match self.data.get("trace") {
            Some(Value::Array(frames)) => frames.iter().map(text_of).collect(),
            _ => Vec::new(),
        }
    }

    pub fn plugin_involvement(&self) -> &str {
        self.data
            .get("plugin_involvement")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
    }

    /// Name of the implicated plugin; absent is a valid state.
    pub fn plugin(&self) -> Option<&str> {
        self.data.get("plugin").and_then(|v| v.as_str())
    }

    /// Build revision the server was running.
    pub fn git_revision(&self) -> &str {
        self.data
            .get("general")
            .and_then(|g| g.get("git"))
            .and_then(|v| v.as_str())
            .unwrap_or("?")
    }

    fn error_field(&self, key: &str) -> Option<&'a str> {
        self.data
            .get("error")
            .and_then(|e| e.get(key))
            .and_then(|v| v.as_str())
    }

    // Numbers in dumps occasionally arrive as strings.
    fn num(&self, value: Option<&Value>) -> f64 {
        match value {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
