//! Macros for call-site capture and parameter lists.
//!
//! `source_location!` records where a log call was made without the caller
//! spelling out module paths and line numbers; `params!` builds a
//! fixed-size parameter array from mixed value types.
//!
//! # Examples
//!
//! ```
//! use reclog::{params, source_location, LogLevel, LogRecord};
//!
//! let mut record = LogRecord::acquire(LogLevel::Info, "user {0} logged in from {1}");
//! record.populate(
//!     "app::auth",
//!     Some(source_location!("handle_login")),
//!     None,
//!     &params!["alice", "10.0.0.7"],
//! );
//!
//! assert_eq!(record.source_function(), "handle_login");
//! assert_eq!(record.parameter_count(), 2);
//! ```

/// Capture the call site as a [`SourceLocation`](crate::SourceLocation).
///
/// The module path and line number come from the invocation site. The
/// function name cannot be captured automatically; pass it as the optional
/// argument or leave it empty.
///
/// # Examples
///
/// ```
/// use reclog::source_location;
///
/// let here = source_location!();
/// assert!(!here.module_path.is_empty());
/// assert!(here.function.is_empty());
/// assert!(here.line > 0);
///
/// let named = source_location!("reconnect");
/// assert_eq!(named.function, "reconnect");
/// ```
#[macro_export]
macro_rules! source_location {
    () => {
        $crate::SourceLocation::new(module_path!(), "", line!())
    };
    ($function:expr) => {
        $crate::SourceLocation::new(module_path!(), $function, line!())
    };
}

/// Build a fixed-size [`ParamValue`](crate::ParamValue) array from mixed
/// value types.
///
/// Expands to an array rather than a `Vec` so the caller can borrow it
/// without allocating.
///
/// # Examples
///
/// ```
/// use reclog::{params, ParamValue};
///
/// let values = params!["alice", 42, true];
/// assert_eq!(values[0], ParamValue::from("alice"));
/// assert_eq!(values[1], ParamValue::Int(42));
/// assert_eq!(values[2], ParamValue::Bool(true));
///
/// let none = params![];
/// assert!(none.is_empty());
/// ```
#[macro_export]
macro_rules! params {
    () => {{
        let empty: [$crate::ParamValue; 0] = [];
        empty
    }};
    ($($value:expr),+ $(,)?) => {
        [$($crate::ParamValue::from($value)),+]
    };
}
