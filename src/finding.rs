//! Findings: one detected condition each, with a severity and a stable code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WardenError;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Stable identifier of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    /// Raw SQL string with neither placeholders nor a params container.
    NotPrepared,
    ParamCountMismatch,
    ParamNameMismatch,
    /// INSERT column list and VALUES row disagree.
    FieldCountMismatch,
    MixedPlaceholders,
    /// Params container that cannot be resolved into bindings.
    MalformedBindings,
    MissingWhere,
    SelectStar,
    HardcodedValue,
    InjectionSuspected,
}

impl FindingCode {
    /// Every code, in documentation order.
    pub const ALL: [FindingCode; 10] = [
        FindingCode::NotPrepared,
        FindingCode::ParamCountMismatch,
        FindingCode::ParamNameMismatch,
        FindingCode::FieldCountMismatch,
        FindingCode::MixedPlaceholders,
        FindingCode::MalformedBindings,
        FindingCode::MissingWhere,
        FindingCode::SelectStar,
        FindingCode::HardcodedValue,
        FindingCode::InjectionSuspected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCode::NotPrepared => "NOT_PREPARED",
            FindingCode::ParamCountMismatch => "PARAM_COUNT_MISMATCH",
            FindingCode::ParamNameMismatch => "PARAM_NAME_MISMATCH",
            FindingCode::FieldCountMismatch => "FIELD_COUNT_MISMATCH",
            FindingCode::MixedPlaceholders => "MIXED_PLACEHOLDERS",
            FindingCode::MalformedBindings => "MALFORMED_BINDINGS",
            FindingCode::MissingWhere => "MISSING_WHERE",
            FindingCode::SelectStar => "SELECT_STAR",
            FindingCode::HardcodedValue => "HARDCODED_VALUE",
            FindingCode::InjectionSuspected => "INJECTION_SUSPECTED",
        }
    }

    /// Severity a finding with this code is raised at.
    pub fn severity(&self) -> Severity {
        match self {
            FindingCode::MissingWhere | FindingCode::InjectionSuspected => Severity::Warning,
            FindingCode::SelectStar | FindingCode::HardcodedValue => Severity::Info,
            _ => Severity::Error,
        }
    }

    /// One-line description for the code reference.
    pub fn describe(&self) -> &'static str {
        match self {
            FindingCode::NotPrepared => "raw SQL without placeholders or bound parameters",
            FindingCode::ParamCountMismatch => "positional placeholder count differs from bound values",
            FindingCode::ParamNameMismatch => "named placeholders and bound names differ",
            FindingCode::FieldCountMismatch => "INSERT column list and VALUES row differ in length",
            FindingCode::MixedPlaceholders => "positional and named placeholders in one statement",
            FindingCode::MalformedBindings => "params mix sequential and named keys, or repeat a name",
            FindingCode::MissingWhere => "UPDATE or DELETE without a top-level WHERE clause",
            FindingCode::SelectStar => "SELECT * instead of an explicit column list",
            FindingCode::HardcodedValue => "literal value next to bound placeholders",
            FindingCode::InjectionSuspected => "bound value matches a known injection pattern",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FindingCode {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FindingCode::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WardenError::UnknownCode(s.to_string()))
    }
}

/// Half-open byte range into the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// One detected condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub code: FindingCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Finding {
    /// Create a finding at the code's default severity.
    pub fn new(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: code.severity(),
            code,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
