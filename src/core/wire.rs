//! Versioned JSON wire form for records
//!
//! Records cross process boundaries as a flat JSON object that leads with a
//! format version, so readers can reject incompatible input before looking
//! at anything else. Only the live parameters are written; buffer slack and
//! the reservation flag never leave the process.

use super::error::{RecordError, Result};
use super::log_context::ContextMap;
use super::log_level::LogLevel;
use super::log_record::LogRecord;
use super::marker::Marker;
use super::params::ParamValue;
use super::thrown::ErrorCell;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Current wire format version.
pub const WIRE_VERSION: u32 = 1;

// A decoded cause is opaque: only its rendered text survives the wire.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct SerializedCause(String);

// Field declaration order is the wire order. New fields go at the end so
// version-1 readers keep working on version-1 input.
#[derive(Serialize, Deserialize)]
struct WireRecord {
    version: u32,
    timestamp_millis: i64,
    logger_name: String,
    message: String,
    source_module: String,
    source_function: String,
    thread_id: u64,
    thrown: Option<String>,
    parameters: Vec<ParamValue>,
    context: ContextMap,
    level: LogLevel,
    thread_name: String,
    marker: Option<Marker>,
    source_line: u32,
    parameter_count: u32,
}

impl WireRecord {
    fn from_record(record: &LogRecord) -> WireRecord {
        WireRecord {
            version: WIRE_VERSION,
            timestamp_millis: record.timestamp().timestamp_millis(),
            logger_name: record.logger_name().to_string(),
            message: record.message().to_string(),
            source_module: record.source_module().to_string(),
            source_function: record.source_function().to_string(),
            thread_id: record.thread_id(),
            thrown: record.thrown().map(|e| e.to_string()),
            parameters: record.parameters().to_vec(),
            context: record.context().clone(),
            level: record.level(),
            thread_name: record.thread_name().to_string(),
            marker: if record.marker().is_none() {
                None
            } else {
                Some(record.marker().clone())
            },
            source_line: record.source_line(),
            parameter_count: record.parameter_count() as u32,
        }
    }

    fn into_record(self) -> Result<LogRecord> {
        if self.version != WIRE_VERSION {
            return Err(RecordError::unsupported_version(self.version, WIRE_VERSION));
        }
        if self.parameter_count as usize != self.parameters.len() {
            return Err(RecordError::malformed(format!(
                "parameter count {} does not match {} serialized parameters",
                self.parameter_count,
                self.parameters.len()
            )));
        }
        let timestamp = DateTime::from_timestamp_millis(self.timestamp_millis).ok_or_else(|| {
            RecordError::malformed(format!("timestamp {} out of range", self.timestamp_millis))
        })?;
        let param_count = self.parameters.len();
        Ok(LogRecord {
            level: self.level,
            message: self.message,
            marker: self.marker.unwrap_or_else(Marker::none),
            timestamp,
            logger_name: self.logger_name,
            thread_name: self.thread_name,
            thread_id: self.thread_id,
            source_module: self.source_module,
            source_function: self.source_function,
            source_line: self.source_line,
            params: self.parameters,
            param_count,
            context: self.context,
            thrown: self
                .thrown
                .map(|text| ErrorCell::new(Arc::new(SerializedCause(text)))),
            reserved: false,
        })
    }
}

impl LogRecord {
    /// Serialize to the versioned JSON wire form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&WireRecord::from_record(self)).map_err(RecordError::from)
    }

    /// Deserialize from the versioned JSON wire form.
    ///
    /// Rejects unknown versions and records whose declared parameter count
    /// disagrees with the serialized parameter list. The result is never
    /// reserved; it belongs to the caller, not to any thread's slot.
    pub fn from_json(json: &str) -> Result<LogRecord> {
        let wire: WireRecord = serde_json::from_str(json)?;
        wire.into_record()
    }
}
