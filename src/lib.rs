//! # sqlwarden: runtime SQL query guard
//!
//! > **Check the query before it reaches the database.**
//!
//! sqlwarden reads a SQL statement and its bound parameters and reports
//! unsafe construction: unbound literals, placeholder and parameter
//! mismatches, mutations without `WHERE`, and values that look like
//! injection attempts. It never executes SQL.
//!
//! ## Quick Example
//!
//! ```rust
//! use sqlwarden::prelude::*;
//!
//! let query = Query::prepared(
//!     "INSERT INTO users (name, email, age) VALUES (?, ?, ?)",
//!     Params::positional(["John", "john@example.com"]),
//! );
//! let report = Guard::default().validate(&query);
//!
//! assert_eq!(report.status, Status::Error);
//! assert!(report.errors()[0].contains("3 expected, 2 given"));
//! ```
//!
//! ## Findings
//!
//! | Code                   | Severity |
//! |------------------------|----------|
//! | `NOT_PREPARED`         | error    |
//! | `PARAM_COUNT_MISMATCH` | error    |
//! | `PARAM_NAME_MISMATCH`  | error    |
//! | `FIELD_COUNT_MISMATCH` | error    |
//! | `MIXED_PLACEHOLDERS`   | error    |
//! | `MALFORMED_BINDINGS`   | error    |
//! | `MISSING_WHERE`        | warning  |
//! | `INJECTION_SUSPECTED`  | warning  |
//! | `SELECT_STAR`          | info     |
//! | `HARDCODED_VALUE`      | info     |

pub mod bindings;
pub mod classifier;
pub mod config;
pub mod error;
pub mod finding;
pub mod guard;
pub mod heuristics;
pub mod placeholder;
pub mod reconciler;
pub mod report;
pub mod scanner;
pub mod suggest;

pub mod prelude {
    pub use crate::bindings::{BoundValue, Params, Query};
    pub use crate::config::{GuardConfig, Policy};
    pub use crate::error::*;
    pub use crate::finding::{Finding, FindingCode, Severity, Span};
    pub use crate::guard::{Guard, Notifier, NotifyError};
    pub use crate::report::{Report, Status};
    pub use crate::scanner::Dialect;
    pub use crate::suggest::Suggestion;
    pub use crate::{is_valid, validate};
}

/// Validate a query with explicit flags and default policy.
///
/// # Example
///
/// ```
/// use sqlwarden::{validate, bindings::Query, report::Status};
///
/// let report = validate(&Query::raw("DELETE FROM users"), false, false);
/// assert_eq!(report.status, Status::Bypassed);
/// ```
pub fn validate(query: &bindings::Query, enabled: bool, verbose: bool) -> report::Report {
    guard::Guard::new(config::GuardConfig::new(enabled, verbose)).validate(query)
}

/// True unless the query produces an error-status report.
pub fn is_valid(query: &bindings::Query) -> bool {
    validate(query, true, false).status != report::Status::Error
}
