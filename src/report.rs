//! Validation reports.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::error::WardenResult;
use crate::finding::{Finding, Severity};
use crate::suggest::Suggestion;

/// Outcome of a validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
    /// The guard is disabled; nothing was analysed.
    Bypassed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::Error => write!(f, "error"),
            Status::Bypassed => write!(f, "bypassed"),
        }
    }
}

/// Findings of one validation with the derived status.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub status: Status,
    findings: Vec<Finding>,
    pub suggestion: Option<Suggestion>,
    /// Caller-supplied execution context, passed through untouched.
    pub context: Option<Value>,
}

impl Report {
    /// A successful report holding `findings` in order, exact duplicates
    /// (same code and message) dropped.
    pub fn new(findings: impl IntoIterator<Item = Finding>) -> Self {
        let mut report = Self {
            status: Status::Success,
            findings: Vec::new(),
            suggestion: None,
            context: None,
        };
        for finding in findings {
            report.push(finding);
        }
        report
    }

    pub fn bypassed() -> Self {
        Self {
            status: Status::Bypassed,
            ..Self::new(Vec::new())
        }
    }

    pub fn push(&mut self, finding: Finding) {
        let duplicate = self
            .findings
            .iter()
            .any(|f| f.code == finding.code && f.message == finding.message);
        if !duplicate {
            self.findings.push(finding);
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_context(mut self, context: Option<Value>) -> Self {
        self.context = context;
        self
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    fn messages(&self, severity: Severity) -> Vec<&str> {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .map(|f| f.message.as_str())
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.messages(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.messages(Severity::Warning)
    }

    pub fn infos(&self) -> Vec<&str> {
        self.messages(Severity::Info)
    }

    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings.iter().filter(|f| f.severity == Severity::Warning).count()
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    pub fn to_json(&self) -> WardenResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text rendering, used for notifications.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "SQL validation {}: {} error(s), {} warning(s)\n",
            self.status,
            self.error_count(),
            self.warning_count()
        );

        for (title, severity) in [
            ("Errors", Severity::Error),
            ("Warnings", Severity::Warning),
            ("Info", Severity::Info),
        ] {
            let section: Vec<&Finding> = self.findings.iter().filter(|f| f.severity == severity).collect();
            if section.is_empty() {
                continue;
            }
            out.push_str(&format!("\n{}:\n", title));
            for finding in section {
                out.push_str(&format!("  - {}\n", finding));
            }
        }

        if let Some(suggestion) = &self.suggestion {
            out.push_str(&format!("\nSuggested query:\n  {}\n", suggestion.secure_sql));
            out.push_str(&format!("\n{}\n", suggestion.explanation));
        }

        if let Some(context) = &self.context {
            let rendered = serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string());
            out.push_str(&format!("\nContext:\n{}\n", rendered));
        }

        out
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportJson<'a> {
    status: Status,
    errors: Vec<&'a str>,
    warnings: Vec<&'a str>,
    infos: Vec<&'a str>,
    error_count: usize,
    warning_count: usize,
    findings: &'a [Finding],
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'a Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a Value>,
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReportJson {
            status: self.status,
            errors: self.errors(),
            warnings: self.warnings(),
            infos: self.infos(),
            error_count: self.error_count(),
            warning_count: self.warning_count(),
            findings: &self.findings,
            suggestion: self.suggestion.as_ref(),
            context: self.context.as_ref(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::FindingCode;
    use serde_json::json;

    fn sample() -> Report {
        Report::new([
            Finding::new(FindingCode::ParamCountMismatch, "Missing parameters"),
            Finding::new(FindingCode::MissingWhere, "no where"),
            Finding::new(FindingCode::SelectStar, "star"),
        ])
        .with_status(Status::Error)
    }

    #[test]
    fn test_duplicates_suppressed() {
        let mut report = Report::new([Finding::new(FindingCode::SelectStar, "star")]);
        report.push(Finding::new(FindingCode::SelectStar, "star"));
        report.push(Finding::new(FindingCode::SelectStar, "other star"));
        assert_eq!(report.findings().len(), 2);
    }

    #[test]
    fn test_partitions_by_severity() {
        let report = sample();
        assert_eq!(report.errors(), vec!["Missing parameters"]);
        assert_eq!(report.warnings(), vec!["no where"]);
        assert_eq!(report.infos(), vec!["star"]);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample().with_context(Some(json!({"script": "app"})))).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["errors"], json!(["Missing parameters"]));
        assert_eq!(json["errorCount"], 1);
        assert_eq!(json["warningCount"], 1);
        assert_eq!(json["findings"][0]["code"], "PARAM_COUNT_MISMATCH");
        assert_eq!(json["findings"][1]["severity"], "warning");
        assert_eq!(json["context"]["script"], "app");
        assert!(json.get("suggestion").is_none());
    }

    #[test]
    fn test_bypassed_json() {
        let json = serde_json::to_value(Report::bypassed()).unwrap();
        assert_eq!(json["status"], "bypassed");
        assert_eq!(json["errors"], json!([]));
        assert_eq!(json["warnings"], json!([]));
    }

    #[test]
    fn test_summary_sections() {
        let summary = sample().summary();
        assert!(summary.starts_with("SQL validation error: 1 error(s), 1 warning(s)"));
        assert!(summary.contains("Errors:\n  - [PARAM_COUNT_MISMATCH] Missing parameters"));
        assert!(summary.contains("Warnings:\n  - [MISSING_WHERE] no where"));
        assert!(!summary.contains("Context:"));
    }
}
