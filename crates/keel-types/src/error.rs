//! Unified error interface for Keel.
//!
//! Every error type in the workspace implements [`ErrorCode`] so that the
//! transport layer can map failures without matching on concrete enums.
//!
//! # Example
//!
//! ```
//! use keel_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum LookupError {
//!     Missing(String),
//!     Busy,
//! }
//!
//! impl ErrorCode for LookupError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Missing(_) => "LOOKUP_MISSING",
//!             Self::Busy => "LOOKUP_BUSY",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//! }
//!
//! assert_eq!(LookupError::Busy.code(), "LOOKUP_BUSY");
//! assert!(!LookupError::Missing("web".into()).is_recoverable());
//! ```

/// Machine-readable error classification.
///
/// # Code Format
///
/// - UPPER_SNAKE_CASE, prefixed by the owning area
///   (`"AUTH_"`, `"CONFIG_"`, `"BOOTSTRAP_"`, ...)
/// - Stable once published; the transport layer keys on them
pub trait ErrorCode {
    /// Returns the stable error code.
    fn code(&self) -> &'static str;

    /// Returns `true` if the caller can fix the condition and retry.
    ///
    /// A denied context or a failed security filter is never recoverable
    /// by retrying the same request.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code is non-empty, prefixed and UPPER_SNAKE_CASE.
///
/// # Panics
///
/// Panics with a descriptive message when any check fails. Meant for tests.
///
/// ```
/// use keel_types::{assert_error_code, ErrorCode};
///
/// struct Denied;
/// impl ErrorCode for Denied {
///     fn code(&self) -> &'static str { "AUTH_DENIED" }
///     fn is_recoverable(&self) -> bool { false }
/// }
///
/// assert_error_code(&Denied, "AUTH_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Runs [`assert_error_code`] over every given error.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('_')
        && !s.ends_with('_')
        && !s.contains("__")
        && s
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
