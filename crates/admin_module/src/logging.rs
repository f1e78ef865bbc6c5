use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Critical,
}

pub trait ModuleLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, context: &[(&str, &str)]);

    /// Writes a labelled value to the debug output channel.
    fn debug_dump(&self, label: &str, value: &Value);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ModuleLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &[(&str, &str)]) {
        let context = render_context(context);
        match level {
            LogLevel::Info => info!(%context, "{message}"),
            LogLevel::Warning => warn!(%context, "{message}"),
            LogLevel::Error => error!(%context, "{message}"),
            LogLevel::Critical => error!(severity = "critical", %context, "{message}"),
        }
    }

    fn debug_dump(&self, label: &str, value: &Value) {
        debug!(label, value = %value, "debug dump");
    }
}

fn render_context(context: &[(&str, &str)]) -> Value {
    Value::Object(
        context
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub context: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
    dumps: Mutex<Vec<(String, Value)>>,
}

impl RecordingLogger {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn dumps(&self) -> Vec<(String, Value)> {
        self.dumps
            .lock()
            .map(|dumps| dumps.clone())
            .unwrap_or_default()
    }
}

impl ModuleLogger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &[(&str, &str)]) {
        if let Ok(mut records) = self.records.lock() {
            records.push(LogRecord {
                level,
                message: message.to_string(),
                context: context
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });
        }
    }

    fn debug_dump(&self, label: &str, value: &Value) {
        if let Ok(mut dumps) = self.dumps.lock() {
            dumps.push((label.to_string(), value.clone()));
        }
    }
}
