//! # reclog
//!
//! An in-memory log record core: severity levels with host-platform
//! mapping, shareable marker trees, replaceable causal errors, and a
//! mutable record type reused through a per-thread pool.
//!
//! ## Features
//!
//! - **Low-allocation hot path**: each thread reuses a single record across log calls
//! - **Severity mapping**: bidirectional translation to the host platform's level scale
//! - **Marker trees**: shareable, cycle-tolerant tags for routing and filtering
//! - **Versioned wire form**: records serialize to flat JSON led by a format version

pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        ContextMap, ErrorCell, HostLevel, LogLevel, LogRecord, Marker, ParamValue, PooledRecord,
        RecordError, Result, SourceLocation, ThrownError, WIRE_VERSION,
    };
}

pub use core::{
    ContextMap, ErrorCell, HostLevel, LogLevel, LogRecord, Marker, ParamValue, PooledRecord,
    RecordError, Result, SourceLocation, ThrownError, WIRE_VERSION,
};
