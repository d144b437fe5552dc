//! Mutable, reusable log record and its thread-confined pool
//!
//! Each thread owns a single lazily-created record slot. `acquire` hands
//! out the cached record when it is free, a fresh one when the slot is
//! already in flight (re-entrant logging), and the guard returns the pooled
//! instance on drop. The hot path allocates nothing: level and message are
//! written into the existing buffers.

use super::log_context::ContextMap;
use super::log_level::LogLevel;
use super::marker::Marker;
use super::params::ParamValue;
use super::thrown::{ErrorCell, ThrownError};
use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

// The standard library has no stable numeric thread id, so threads draw one
// from a process-wide counter on first use.
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

// Thread-local caches for thread information to avoid repeated lookups
thread_local! {
    static THREAD_ID_CACHE: Cell<Option<u64>> = const { Cell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static RECORD_SLOT: RefCell<RecordSlot> = const { RefCell::new(RecordSlot::new()) };
}

/// Get this thread's id, assigning and caching it on first access
fn current_thread_id() -> u64 {
    THREAD_ID_CACHE.with(|cache| match cache.get() {
        Some(id) => id,
        None => {
            let id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
            cache.set(Some(id));
            id
        }
    })
}

/// Get this thread's name, computing and caching it on first access
fn current_thread_name() -> String {
    THREAD_NAME_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.is_none() {
            let name = std::thread::current()
                .name()
                .map(String::from)
                .unwrap_or_else(|| format!("thread-{}", current_thread_id()));
            *cache = Some(name);
        }
        cache
            .as_ref()
            .expect("thread_name cache initialized above")
            .clone()
    })
}

/// Call-site metadata attached to a record.
///
/// `function` may be empty when the capture site cannot determine it; line
/// 0 means unknown. The [`source_location!`](crate::source_location) macro
/// fills module path and line automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub module_path: &'static str,
    pub function: &'static str,
    pub line: u32,
}

impl SourceLocation {
    pub const fn new(module_path: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            module_path,
            function,
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.function.is_empty() {
            write!(f, "{}:{}", self.module_path, self.line)
        } else {
            write!(f, "{}::{}:{}", self.module_path, self.function, self.line)
        }
    }
}

struct RecordSlot {
    cached: Option<LogRecord>,
    in_flight: bool,
}

impl RecordSlot {
    const fn new() -> Self {
        RecordSlot {
            cached: None,
            in_flight: false,
        }
    }
}

/// A single log record.
///
/// Records are mutable so one instance per thread can be reused across log
/// calls; handlers read them through the accessors. Stale state from a
/// previous reservation is only overwritten, never cleared eagerly, so a
/// released record must not be read until it has been reacquired and
/// populated.
///
/// # Example
///
/// ```
/// use reclog::{params, LogLevel, LogRecord};
///
/// let mut record = LogRecord::acquire(LogLevel::Info, "user {0} logged in");
/// record.populate("app::auth", None, None, &params!["alice"]);
///
/// assert_eq!(record.level(), LogLevel::Info);
/// assert_eq!(record.parameters().len(), 1);
/// // Dropping the guard releases the record for reuse on this thread.
/// ```
#[derive(Debug)]
pub struct LogRecord {
    pub(crate) level: LogLevel,
    pub(crate) message: String,
    pub(crate) marker: Marker,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) logger_name: String,
    pub(crate) thread_name: String,
    pub(crate) thread_id: u64,
    pub(crate) source_module: String,
    pub(crate) source_function: String,
    pub(crate) source_line: u32,
    pub(crate) params: Vec<ParamValue>,
    pub(crate) param_count: usize,
    pub(crate) context: ContextMap,
    pub(crate) thrown: Option<ErrorCell>,
    pub(crate) reserved: bool,
}

impl LogRecord {
    /// Construct a record directly, bypassing the pool.
    pub fn new(level: LogLevel, message: &str) -> LogRecord {
        LogRecord {
            level,
            message: message.to_string(),
            marker: Marker::none(),
            timestamp: Utc::now(),
            logger_name: String::new(),
            thread_name: current_thread_name(),
            thread_id: current_thread_id(),
            source_module: String::new(),
            source_function: String::new(),
            source_line: 0,
            params: Vec::new(),
            param_count: 0,
            context: ContextMap::new(),
            thrown: None,
            reserved: false,
        }
    }

    /// Acquire a reserved record from this thread's slot.
    ///
    /// The cached instance is handed out with its level and message
    /// overwritten and its timestamp refreshed; nothing else is touched
    /// until [`populate`](Self::populate) or the setters run. When the slot
    /// is already in flight (a log call re-entered from within handling of
    /// another), a fresh instance is returned instead so the outer record
    /// cannot be corrupted; that instance is dropped rather than pooled on
    /// release.
    pub fn acquire(level: LogLevel, message: &str) -> PooledRecord {
        RECORD_SLOT.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.in_flight {
                let mut record = LogRecord::new(level, message);
                record.reserved = true;
                return PooledRecord::unpooled(record);
            }
            let mut record = slot
                .cached
                .take()
                .unwrap_or_else(|| LogRecord::new(level, message));
            record.reserve(level, message);
            slot.in_flight = true;
            PooledRecord::pooled(record)
        })
    }

    fn reserve(&mut self, level: LogLevel, message: &str) {
        self.reserved = true;
        self.level = level;
        self.message.clear();
        self.message.push_str(message);
        self.timestamp = Utc::now();
    }

    /// Fill in everything the acquisition left untouched: thread metadata
    /// from the current thread, the logger name, call-site metadata (reset
    /// to defaults when absent, so a reused record cannot attribute this
    /// event to the previous event's call site), the thrown error, and the
    /// parameters. The diagnostic context is cleared.
    pub fn populate(
        &mut self,
        logger_name: &str,
        location: Option<SourceLocation>,
        thrown: Option<ThrownError>,
        parameters: &[ParamValue],
    ) {
        self.thread_name = current_thread_name();
        self.thread_id = current_thread_id();
        self.logger_name.clear();
        self.logger_name.push_str(logger_name);
        self.set_source_location(location);
        self.set_thrown(thrown);
        self.set_parameters(parameters);
        self.context.clear();
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: &str) {
        self.message.clear();
        self.message.push_str(message);
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    /// `None` resets to the shared "no marker" sentinel.
    pub fn set_marker(&mut self, marker: Option<Marker>) {
        self.marker = marker.unwrap_or_else(Marker::none);
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn set_logger_name(&mut self, logger_name: &str) {
        self.logger_name.clear();
        self.logger_name.push_str(logger_name);
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }

    pub fn source_module(&self) -> &str {
        &self.source_module
    }

    pub fn source_function(&self) -> &str {
        &self.source_function
    }

    pub fn source_line(&self) -> u32 {
        self.source_line
    }

    pub fn set_source_location(&mut self, location: Option<SourceLocation>) {
        self.source_module.clear();
        self.source_function.clear();
        match location {
            Some(loc) => {
                self.source_module.push_str(loc.module_path);
                self.source_function.push_str(loc.function);
                self.source_line = loc.line;
            }
            None => {
                self.source_line = 0;
            }
        }
    }

    /// The live parameters. Never exposes buffer slots at or beyond the
    /// logical count.
    pub fn parameters(&self) -> &[ParamValue] {
        &self.params[..self.param_count]
    }

    pub fn parameter_count(&self) -> usize {
        self.param_count
    }

    /// Length of the underlying buffer, which may exceed the logical count
    /// after a shrinking reuse.
    pub fn parameter_capacity(&self) -> usize {
        self.params.len()
    }

    /// Set the parameters through the buffer reuse rule: when the existing
    /// buffer is large enough the values are copied in place and the stale
    /// tail is overwritten with `ParamValue::Null`; otherwise a new buffer
    /// is allocated sized exactly to the new count.
    pub fn set_parameters(&mut self, values: &[ParamValue]) {
        if values.len() <= self.params.len() {
            self.params[..values.len()].clone_from_slice(values);
            for slot in &mut self.params[values.len()..] {
                *slot = ParamValue::Null;
            }
        } else {
            self.params = values.to_vec();
        }
        self.param_count = values.len();
    }

    pub fn context(&self) -> &ContextMap {
        &self.context
    }

    pub fn set_context(&mut self, context: ContextMap) {
        self.context = context;
    }

    pub fn add_context<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.context.insert(key, value);
    }

    /// The current causal error, if any.
    pub fn thrown(&self) -> Option<ThrownError> {
        self.thrown.as_ref().and_then(ErrorCell::current)
    }

    /// The error cell itself; its identity survives `set_thrown`.
    pub fn thrown_cell(&self) -> Option<&ErrorCell> {
        self.thrown.as_ref()
    }

    /// Set the causal error through the cell reuse rule: an existing cell
    /// is refilled in place (same identity), a missing one is allocated,
    /// and `None` empties the cell while retaining it for later reuse.
    pub fn set_thrown(&mut self, thrown: Option<ThrownError>) {
        match (&self.thrown, thrown) {
            (Some(cell), thrown) => {
                cell.set(thrown);
            }
            (None, Some(error)) => {
                self.thrown = Some(ErrorCell::new(error));
            }
            (None, None) => {}
        }
    }

    /// True while the record is held by a caller between acquisition and
    /// release. Detects same-thread re-entrancy only; it is not a lock.
    pub fn is_reserved(&self) -> bool {
        self.reserved
    }
}

// Hand-written so a snapshot gets its own error cell: later reuse of the
// pooled record must not retarget the clone's cause.
impl Clone for LogRecord {
    fn clone(&self) -> Self {
        LogRecord {
            level: self.level,
            message: self.message.clone(),
            marker: self.marker.clone(),
            timestamp: self.timestamp,
            logger_name: self.logger_name.clone(),
            thread_name: self.thread_name.clone(),
            thread_id: self.thread_id,
            source_module: self.source_module.clone(),
            source_function: self.source_function.clone(),
            source_line: self.source_line,
            params: self.params.clone(),
            param_count: self.param_count,
            context: self.context.clone(),
            thrown: self.thrown.as_ref().map(ErrorCell::detached),
            reserved: self.reserved,
        }
    }
}

fn release(mut record: LogRecord, pooled: bool) {
    record.reserved = false;
    if !pooled {
        return;
    }
    // try_with: the slot may already be gone during thread teardown.
    let _ = RECORD_SLOT.try_with(|slot| {
        let mut slot = slot.borrow_mut();
        slot.cached = Some(record);
        slot.in_flight = false;
    });
}

/// RAII handle to an acquired [`LogRecord`].
///
/// Dereferences to the record; dropping it clears the reservation and
/// returns the pooled instance to this thread's slot, on every exit path
/// including panics. The guard is `!Send`, which pins the release to the
/// acquiring thread.
pub struct PooledRecord {
    record: Option<LogRecord>,
    pooled: bool,
    _confined: PhantomData<*const ()>,
}

impl PooledRecord {
    fn pooled(record: LogRecord) -> Self {
        Self {
            record: Some(record),
            pooled: true,
            _confined: PhantomData,
        }
    }

    fn unpooled(record: LogRecord) -> Self {
        Self {
            record: Some(record),
            pooled: false,
            _confined: PhantomData,
        }
    }
}

impl Deref for PooledRecord {
    type Target = LogRecord;

    fn deref(&self) -> &LogRecord {
        self.record.as_ref().expect("record present until drop")
    }
}

impl DerefMut for PooledRecord {
    fn deref_mut(&mut self) -> &mut LogRecord {
        self.record.as_mut().expect("record present until drop")
    }
}

impl Drop for PooledRecord {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            release(record, self.pooled);
        }
    }
}

impl fmt::Debug for PooledRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record {
            Some(record) => record.fmt(f),
            None => f.write_str("PooledRecord(released)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct TestError(&'static str);

    fn thrown(text: &'static str) -> ThrownError {
        Arc::new(TestError(text))
    }

    fn values(texts: &[&str]) -> Vec<ParamValue> {
        texts.iter().map(|t| ParamValue::from(*t)).collect()
    }

    #[test]
    fn test_new_defaults() {
        let record = LogRecord::new(LogLevel::Debug, "hello");
        assert_eq!(record.level(), LogLevel::Debug);
        assert_eq!(record.message(), "hello");
        assert!(record.marker().is_none());
        assert_eq!(record.logger_name(), "");
        assert_eq!(record.source_line(), 0);
        assert!(record.parameters().is_empty());
        assert!(record.context().is_empty());
        assert!(record.thrown().is_none());
        assert!(!record.is_reserved());
        assert!(record.thread_id() > 0);
        assert!(!record.thread_name().is_empty());
    }

    #[test]
    fn test_set_parameters_reuses_buffer_and_nulls_tail() {
        let mut record = LogRecord::new(LogLevel::Info, "msg");

        record.set_parameters(&values(&["a", "b", "c"]));
        assert_eq!(record.parameter_count(), 3);
        assert_eq!(record.parameter_capacity(), 3);

        record.set_parameters(&values(&["x", "y"]));
        assert_eq!(record.parameter_count(), 2);
        assert_eq!(record.parameter_capacity(), 3);
        assert_eq!(record.parameters(), values(&["x", "y"]).as_slice());
        // The stale third slot is nulled out, not left holding "c".
        assert!(record.params[2].is_null());
    }

    #[test]
    fn test_set_parameters_grows_exactly() {
        let mut record = LogRecord::new(LogLevel::Info, "msg");
        record.set_parameters(&values(&["a"]));
        record.set_parameters(&values(&["1", "2", "3", "4"]));
        assert_eq!(record.parameter_count(), 4);
        assert_eq!(record.parameter_capacity(), 4);
        assert_eq!(record.parameters().len(), 4);
    }

    #[test]
    fn test_parameters_never_expose_stale_slots() {
        let mut record = LogRecord::new(LogLevel::Info, "msg");
        record.set_parameters(&values(&["a", "b", "c"]));
        record.set_parameters(&values(&["x", "y"]));

        let live = record.parameters();
        assert_eq!(live.len(), 2);
        assert!(!live.iter().any(|v| *v == ParamValue::from("c")));
    }

    #[test]
    fn test_set_thrown_preserves_cell_identity() {
        let mut record = LogRecord::new(LogLevel::Error, "msg");
        assert!(record.thrown_cell().is_none());

        record.set_thrown(Some(thrown("first")));
        let cell = record.thrown_cell().unwrap().clone();

        record.set_thrown(Some(thrown("second")));
        assert!(cell.same_cell(record.thrown_cell().unwrap()));
        assert_eq!(record.thrown().unwrap().to_string(), "second");
    }

    #[test]
    fn test_set_thrown_none_clears_but_keeps_cell() {
        let mut record = LogRecord::new(LogLevel::Error, "msg");
        record.set_thrown(Some(thrown("boom")));
        let cell = record.thrown_cell().unwrap().clone();

        record.set_thrown(None);
        assert!(record.thrown().is_none());
        assert!(cell.same_cell(record.thrown_cell().unwrap()));

        // None with no cell stays absent.
        let mut bare = LogRecord::new(LogLevel::Error, "msg");
        bare.set_thrown(None);
        assert!(bare.thrown_cell().is_none());
    }

    #[test]
    fn test_set_marker_none_resets_to_sentinel() {
        let mut record = LogRecord::new(LogLevel::Info, "msg");
        let marker = Marker::new("net");
        record.set_marker(Some(marker.clone()));
        assert!(record.marker().same_marker(&marker));

        record.set_marker(None);
        assert!(record.marker().is_none());
    }

    #[test]
    fn test_populate_sets_and_resets() {
        let mut record = LogRecord::new(LogLevel::Info, "msg");
        record.add_context("stale", "value");
        record.set_source_location(Some(SourceLocation::new("old::module", "old_fn", 10)));

        record.populate(
            "app::db",
            Some(SourceLocation::new("app::db", "query", 42)),
            Some(thrown("timeout")),
            &values(&["users"]),
        );
        assert_eq!(record.logger_name(), "app::db");
        assert_eq!(record.source_module(), "app::db");
        assert_eq!(record.source_function(), "query");
        assert_eq!(record.source_line(), 42);
        assert_eq!(record.thrown().unwrap().to_string(), "timeout");
        assert_eq!(record.parameters(), values(&["users"]).as_slice());
        assert!(record.context().is_empty());

        // Absent call-site metadata resets attribution to defaults.
        record.populate("app::db", None, None, &[]);
        assert_eq!(record.source_module(), "");
        assert_eq!(record.source_function(), "");
        assert_eq!(record.source_line(), 0);
        assert!(record.thrown().is_none());
        assert!(record.parameters().is_empty());
    }

    #[test]
    fn test_acquire_reuses_the_thread_instance() {
        {
            let mut record = LogRecord::acquire(LogLevel::Info, "first");
            assert!(record.is_reserved());
            record.set_parameters(&values(&["a", "b", "c"]));
        }

        let record = LogRecord::acquire(LogLevel::Warn, "second");
        assert_eq!(record.level(), LogLevel::Warn);
        assert_eq!(record.message(), "second");
        // Same instance: the parameter buffer from the previous cycle is
        // still there, proving no reallocation took place.
        assert_eq!(record.parameter_capacity(), 3);
    }

    #[test]
    fn test_reentrant_acquire_yields_distinct_instances() {
        let mut outer = LogRecord::acquire(LogLevel::Info, "outer");
        outer.set_parameters(&values(&["outer-param"]));

        {
            let mut inner = LogRecord::acquire(LogLevel::Debug, "inner");
            assert!(inner.is_reserved());
            inner.set_parameters(&values(&["inner-param", "two"]));

            assert_eq!(outer.message(), "outer");
            assert_eq!(outer.parameters(), values(&["outer-param"]).as_slice());
            assert_eq!(inner.message(), "inner");
            assert_eq!(inner.parameters().len(), 2);
        }

        // Releasing the inner record leaves the outer reservation intact.
        assert!(outer.is_reserved());
        assert_eq!(outer.message(), "outer");
        outer.set_message("still writable");
        assert_eq!(outer.message(), "still writable");
    }

    #[test]
    fn test_reentrant_extra_is_not_pooled() {
        let outer_capacity = {
            let mut outer = LogRecord::acquire(LogLevel::Info, "outer");
            outer.set_parameters(&values(&["a", "b", "c", "d", "e"]));
            {
                let mut inner = LogRecord::acquire(LogLevel::Debug, "inner");
                inner.set_parameters(&values(&["x"]));
            }
            outer.parameter_capacity()
        };

        // The pooled instance is the outer one, not the re-entrant extra.
        let record = LogRecord::acquire(LogLevel::Info, "next");
        assert_eq!(record.parameter_capacity(), outer_capacity);
    }

    #[test]
    fn test_each_thread_gets_its_own_slot() {
        let main_id = {
            let record = LogRecord::acquire(LogLevel::Info, "main");
            record.thread_id()
        };

        let handle = std::thread::Builder::new()
            .name("worker".to_string())
            .spawn(move || {
                let record = LogRecord::acquire(LogLevel::Info, "worker");
                assert_eq!(record.thread_name(), "worker");
                assert_ne!(record.thread_id(), main_id);
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_clone_detaches_the_error_cell() {
        let mut record = LogRecord::new(LogLevel::Error, "msg");
        record.set_thrown(Some(thrown("original")));

        let snapshot = record.clone();
        record.set_thrown(Some(thrown("changed")));

        assert_eq!(snapshot.thrown().unwrap().to_string(), "original");
        assert_eq!(record.thrown().unwrap().to_string(), "changed");
        assert!(!snapshot
            .thrown_cell()
            .unwrap()
            .same_cell(record.thrown_cell().unwrap()));
    }

    #[test]
    fn test_reserve_refreshes_timestamp_and_overwrites_header() {
        let first_timestamp = {
            let record = LogRecord::acquire(LogLevel::Info, "first");
            record.timestamp()
        };

        let record = LogRecord::acquire(LogLevel::Error, "second");
        assert_eq!(record.level(), LogLevel::Error);
        assert_eq!(record.message(), "second");
        assert!(record.timestamp() >= first_timestamp);
    }

    #[test]
    fn test_source_location_display() {
        let with_function = SourceLocation::new("app::db", "query", 42);
        assert_eq!(with_function.to_string(), "app::db::query:42");

        let without_function = SourceLocation::new("app::db", "", 42);
        assert_eq!(without_function.to_string(), "app::db:42");
    }
}
