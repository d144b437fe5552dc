//! Log level definitions and the host-scale mapping

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log record.
///
/// Variants are declared from most to least verbose. `All` and `Off` are
/// threshold sentinels: `All` ranks below every real severity and `Off`
/// above every one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    All,
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
    Off,
}

impl LogLevel {
    /// Ordering rank. Lower means more verbose; the sentinels sit at the
    /// integer extremes.
    pub const fn rank(self) -> i32 {
        match self {
            LogLevel::All => i32::MIN,
            LogLevel::Trace => 1000,
            LogLevel::Debug => 2000,
            LogLevel::Info => 3000,
            LogLevel::Warn => 4000,
            LogLevel::Error => 5000,
            LogLevel::Critical => 6000,
            LogLevel::Off => i32::MAX,
        }
    }

    /// True when `self` is at least as severe as `other`.
    pub fn is_at_least(self, other: LogLevel) -> bool {
        self.rank() >= other.rank()
    }

    /// The equivalent value on the host facility's level scale.
    pub const fn to_host(self) -> HostLevel {
        match self {
            LogLevel::All => HostLevel::ALL,
            LogLevel::Trace => HostLevel::TRACE,
            LogLevel::Debug => HostLevel::DEBUG,
            LogLevel::Info => HostLevel::INFO,
            LogLevel::Warn => HostLevel::WARNING,
            LogLevel::Error => HostLevel::SEVERE,
            LogLevel::Critical => HostLevel::CRITICAL,
            LogLevel::Off => HostLevel::OFF,
        }
    }

    /// Maps a host-scale value back to a level. Total: host values with no
    /// mapping resolve to `Off` rather than an error, so an unrecognized
    /// threshold logs nothing instead of misrouting.
    pub fn from_host(host: HostLevel) -> LogLevel {
        match host {
            HostLevel::ALL => LogLevel::All,
            HostLevel::TRACE => LogLevel::Trace,
            HostLevel::DEBUG => LogLevel::Debug,
            HostLevel::INFO => LogLevel::Info,
            HostLevel::WARNING => LogLevel::Warn,
            HostLevel::SEVERE => LogLevel::Error,
            HostLevel::CRITICAL => LogLevel::Critical,
            HostLevel::OFF => LogLevel::Off,
            _ => LogLevel::Off,
        }
    }

    /// True when a record at this level must not be emitted under the given
    /// host-scale threshold.
    ///
    /// The rank is compared against the raw host value, and an `OFF`
    /// threshold suppresses everything, even `Off`-ranked records whose
    /// rank alone would never compare below a threshold. Threshold-off
    /// always wins.
    pub fn suppressed_by(self, threshold: HostLevel) -> bool {
        self.rank() < threshold.value() || threshold == HostLevel::OFF
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::All => "ALL",
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
            LogLevel::Off => "OFF",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ALL" => Ok(LogLevel::All),
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" | "FATAL" => Ok(LogLevel::Critical),
            "OFF" | "NONE" => Ok(LogLevel::Off),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// A severity value on the host logging facility's integer scale.
///
/// The named constants are the values the facility defines; arbitrary
/// values are legal (`HostLevel::new`). Only a subset has a `LogLevel`
/// mapping; `CONFIG` and `NOTICE`, for example, resolve to `LogLevel::Off`
/// through `LogLevel::from_host`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostLevel(i32);

impl HostLevel {
    pub const ALL: HostLevel = HostLevel(i32::MIN);
    pub const TRACE: HostLevel = HostLevel(300);
    pub const DEBUG: HostLevel = HostLevel(400);
    pub const INFO: HostLevel = HostLevel(500);
    pub const CONFIG: HostLevel = HostLevel(700);
    pub const NOTICE: HostLevel = HostLevel(800);
    pub const WARNING: HostLevel = HostLevel(900);
    pub const SEVERE: HostLevel = HostLevel(1000);
    pub const CRITICAL: HostLevel = HostLevel(1100);
    pub const OFF: HostLevel = HostLevel(i32::MAX);

    pub const fn new(value: i32) -> HostLevel {
        HostLevel(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for HostLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HostLevel::ALL => write!(f, "ALL"),
            HostLevel::TRACE => write!(f, "TRACE"),
            HostLevel::DEBUG => write!(f, "DEBUG"),
            HostLevel::INFO => write!(f, "INFO"),
            HostLevel::CONFIG => write!(f, "CONFIG"),
            HostLevel::NOTICE => write!(f, "NOTICE"),
            HostLevel::WARNING => write!(f, "WARNING"),
            HostLevel::SEVERE => write!(f, "SEVERE"),
            HostLevel::CRITICAL => write!(f, "CRITICAL"),
            HostLevel::OFF => write!(f, "OFF"),
            HostLevel(value) => write!(f, "{}", value),
        }
    }
}
