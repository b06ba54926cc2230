//! Structured logging with request context.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use stats_core::{Environment, RequestId};

/// Log level for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A structured log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Log level.
    pub level: LogLevel,
    /// Log message.
    pub message: String,
    /// Request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Additional structured fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }

    /// Format as human-readable string.
    pub fn to_human(&self) -> String {
        let mut s = format!("[{}] {}", self.level, self.message);

        if let Some(id) = &self.request_id {
            s.push_str(&format!(" (request {})", id));
        }

        if !self.fields.is_empty() {
            s.push_str(" | ");
            let fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(text) => format!("{}={}", k, text),
                    other => format!("{}={}", k, other),
                })
                .collect();
            s.push_str(&fields.join(" "));
        }

        s
    }

    /// Look up a field value.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

/// Where rendered entries go.
#[derive(Debug, Clone, Default)]
pub enum LogSink {
    /// Write rendered lines to stderr.
    #[default]
    Stderr,
    /// Forward to the `tracing` dispatcher at the matching level.
    Tracing,
    /// Keep entries in memory.
    Memory(MemorySink),
}

/// In-memory capture of log entries, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of captured entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captured entries at `level`.
    pub fn at_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .collect()
    }

    /// Number of captured entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, entry: LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

/// Structured logger for gateway diagnostics.
///
/// The environment decides the minimum level once, at construction:
/// development emits everything from debug up in human-readable form,
/// production emits errors only, as JSON. Nothing is read from the process
/// environment while logging.
#[derive(Debug, Clone)]
pub struct Logger {
    request_id: Option<RequestId>,
    min_level: LogLevel,
    format: LogFormat,
    sink: LogSink,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Environment::default())
    }
}

impl Logger {
    /// Create a logger for an environment.
    pub fn new(environment: Environment) -> Self {
        let (min_level, format) = if environment.is_development() {
            (LogLevel::Debug, LogFormat::Human)
        } else {
            (LogLevel::Error, LogFormat::Json)
        };

        Self {
            request_id: None,
            min_level,
            format,
            sink: LogSink::Stderr,
        }
    }

    /// Create a development logger capturing into memory.
    pub fn capture(environment: Environment) -> (Self, MemorySink) {
        let sink = MemorySink::new();
        let logger = Self::new(environment).with_sink(LogSink::Memory(sink.clone()));
        (logger, sink)
    }

    /// Set minimum log level.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Set output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the sink.
    pub fn with_sink(mut self, sink: LogSink) -> Self {
        self.sink = sink;
        self
    }

    /// A copy of this logger that tags every entry with `request_id`.
    pub fn for_request(&self, request_id: RequestId) -> Self {
        Self {
            request_id: Some(request_id),
            ..self.clone()
        }
    }

    /// Get the request ID, if bound.
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Check whether entries at `level` are emitted.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Log at debug level.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, BTreeMap::new());
    }

    /// Log at info level.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, BTreeMap::new());
    }

    /// Log at warn level.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, BTreeMap::new());
    }

    /// Log at error level.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, BTreeMap::new());
    }

    /// Log at info level with fields.
    pub fn info_with(&self, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        self.log(LogLevel::Info, message, display_fields(fields));
    }

    /// Log at warn level with fields.
    pub fn warn_with(&self, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        self.log(LogLevel::Warn, message, display_fields(fields));
    }

    /// Log at error level with fields.
    pub fn error_with(&self, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        self.log(LogLevel::Error, message, display_fields(fields));
    }

    fn log(&self, level: LogLevel, message: &str, fields: BTreeMap<String, serde_json::Value>) {
        if !self.enabled(level) {
            return;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            request_id: self.request_id.as_ref().map(ToString::to_string),
            fields,
        };

        match &self.sink {
            LogSink::Stderr => eprintln!("{}", self.render(&entry)),
            LogSink::Tracing => {
                let line = self.render(&entry);
                match level {
                    LogLevel::Debug => tracing::debug!(target: "stats", "{}", line),
                    LogLevel::Info => tracing::info!(target: "stats", "{}", line),
                    LogLevel::Warn => tracing::warn!(target: "stats", "{}", line),
                    LogLevel::Error => tracing::error!(target: "stats", "{}", line),
                }
            }
            LogSink::Memory(sink) => sink.push(entry),
        }
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Json => entry.to_json(),
            LogFormat::Human => entry.to_human(),
        }
    }
}

fn display_fields(fields: &[(&str, &dyn fmt::Display)]) -> BTreeMap<String, serde_json::Value> {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect()
}

/// Builder for log entries with fluent API.
pub struct LogBuilder<'a> {
    logger: &'a Logger,
    level: LogLevel,
    message: String,
    fields: BTreeMap<String, serde_json::Value>,
}

impl<'a> LogBuilder<'a> {
    /// Create a new log builder.
    pub fn new(logger: &'a Logger, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            logger,
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a string field.
    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(value.into()));
        self
    }

    /// Add an integer field.
    pub fn field_u64(mut self, key: &str, value: u64) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Add a boolean field.
    pub fn field_bool(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Add a duration field (in milliseconds).
    pub fn duration_ms(mut self, key: &str, duration: std::time::Duration) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(duration.as_millis() as u64));
        self
    }

    /// Emit the log entry.
    pub fn emit(self) {
        self.logger.log(self.level, &self.message, self.fields);
    }
}

impl Logger {
    /// Start building an info log entry.
    pub fn info_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Info, message)
    }

    /// Start building an error log entry.
    pub fn error_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Error, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Gating Tests ===

    #[test]
    fn test_production_drops_info() {
        let (logger, sink) = Logger::capture(Environment::Production);
        logger.info("cache hit");
        logger.warn("slow");
        logger.error("endpoint unreachable");

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Error);
        assert_eq!(entries[0].message, "endpoint unreachable");
    }

    #[test]
    fn test_development_emits_info() {
        let (logger, sink) = Logger::capture(Environment::Development);
        logger.debug("resolving");
        logger.info("cache hit");
        logger.error("boom");

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.at_level(LogLevel::Info).len(), 1);
    }

    #[test]
    fn test_formats_follow_environment() {
        assert_eq!(Logger::new(Environment::Development).format, LogFormat::Human);
        assert_eq!(Logger::new(Environment::Production).format, LogFormat::Json);
    }

    #[test]
    fn test_min_level_override() {
        let (logger, sink) = Logger::capture(Environment::Production);
        let logger = logger.with_min_level(LogLevel::Info);
        logger.info("visible now");
        assert_eq!(sink.len(), 1);
    }

    // === Entry Tests ===

    #[test]
    fn test_request_id_and_fields() {
        let (logger, sink) = Logger::capture(Environment::Development);
        let logger = logger.for_request(RequestId::from_string("req-1"));

        logger.info_with("fetched", &[("query_id", &"totalArticles"), ("status", &200)]);

        let entry = &sink.entries()[0];
        assert_eq!(entry.request_id.as_deref(), Some("req-1"));
        assert_eq!(entry.field("query_id"), Some(&serde_json::json!("totalArticles")));
        assert_eq!(entry.field("status"), Some(&serde_json::json!("200")));
    }

    #[test]
    fn test_builder_fields() {
        let (logger, sink) = Logger::capture(Environment::Development);
        logger
            .info_builder("fetch complete")
            .field("query_id", "topAuthors")
            .field_u64("rows", 10)
            .field_bool("from_cache", false)
            .duration_ms("elapsed_ms", std::time::Duration::from_millis(12))
            .emit();

        let entry = &sink.entries()[0];
        assert_eq!(entry.field("rows"), Some(&serde_json::json!(10)));
        assert_eq!(entry.field("from_cache"), Some(&serde_json::json!(false)));
        assert_eq!(entry.field("elapsed_ms"), Some(&serde_json::json!(12)));
    }

    #[test]
    fn test_json_rendering() {
        let mut fields = BTreeMap::new();
        fields.insert("query_id".to_string(), serde_json::json!("dateRange"));
        let entry = LogEntry {
            level: LogLevel::Error,
            message: "timeout".to_string(),
            request_id: None,
            fields,
        };

        let json: serde_json::Value = serde_json::from_str(&entry.to_json()).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["message"], "timeout");
        assert_eq!(json["query_id"], "dateRange");
        assert!(json.get("request_id").is_none());
    }

    #[test]
    fn test_human_rendering() {
        let mut fields = BTreeMap::new();
        fields.insert("query_id".to_string(), serde_json::json!("dateRange"));
        let entry = LogEntry {
            level: LogLevel::Info,
            message: "cache hit".to_string(),
            request_id: Some("abc".to_string()),
            fields,
        };

        assert_eq!(entry.to_human(), "[INFO] cache hit (request abc) | query_id=dateRange");
    }
}
