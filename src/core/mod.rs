//! Core record types

pub mod error;
pub mod log_context;
pub mod log_level;
pub mod log_record;
pub mod marker;
pub mod params;
pub mod thrown;
pub mod wire;

pub use error::{RecordError, Result};
pub use log_context::ContextMap;
pub use log_level::{HostLevel, LogLevel};
pub use log_record::{LogRecord, PooledRecord, SourceLocation};
pub use marker::Marker;
pub use params::ParamValue;
pub use thrown::{ErrorCell, ThrownError};
pub use wire::WIRE_VERSION;
