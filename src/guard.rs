//! The guard: runs every stage over a query and builds the report.

use serde_json::Value;
use std::error::Error;

use crate::bindings::{Query, Supplied};
use crate::classifier;
use crate::config::GuardConfig;
use crate::heuristics;
use crate::placeholder;
use crate::reconciler;
use crate::report::{Report, Status};
use crate::scanner::SqlText;
use crate::suggest::{self, Analysis};

pub type NotifyError = Box<dyn Error + Send + Sync>;

/// Receives failed reports.
///
/// Delivery (mail, chat, logs) is up to the implementation. A failing
/// notifier is logged and never changes the report.
pub trait Notifier {
    fn notify(&self, error_count: usize, summary: &str, report: &Report) -> Result<(), NotifyError>;
}

impl<F> Notifier for F
where
    F: Fn(usize, &str, &Report) -> Result<(), NotifyError>,
{
    fn notify(&self, error_count: usize, summary: &str, report: &Report) -> Result<(), NotifyError> {
        self(error_count, summary, report)
    }
}

/// Validates queries against one configuration.
pub struct Guard {
    config: GuardConfig,
    notifier: Option<Box<dyn Notifier + Send + Sync>>,
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("config", &self.config)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

impl Guard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config, notifier: None }
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + Send + Sync + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn validate(&self, query: &Query) -> Report {
        self.validate_with_context(query, None)
    }

    /// Validate `query`, embedding `context` in the report as is.
    pub fn validate_with_context(&self, query: &Query, context: Option<Value>) -> Report {
        if !self.config.enabled {
            return Report::bypassed().with_context(context);
        }

        let text = SqlText::new(query.sql(), self.config.dialect);
        let placeholders = placeholder::extract(&text);
        let classification = classifier::classify(&text);
        let (supplied, malformed) = Supplied::from_query(query);

        let mut report = Report::new(malformed);
        for finding in reconciler::reconcile(&placeholders, &supplied, &classification.statement) {
            report.push(finding);
        }
        for finding in classification.findings.iter().cloned() {
            report.push(finding);
        }
        if let Some(params) = query.params() {
            for finding in heuristics::scan(params) {
                report.push(finding);
            }
        }

        let blocked = report.findings().iter().any(|f| self.config.policy.blocks(f));
        let status = if blocked { Status::Error } else { Status::Success };
        let mut report = report.with_status(status).with_context(context);

        if self.config.verbose {
            let analysis = Analysis {
                text: &text,
                placeholders: &placeholders,
                statement: &classification.statement,
                supplied: &supplied,
            };
            report.suggestion = suggest::primary(report.findings()).map(|f| suggest::synthesize(f, &analysis));
        }

        tracing::debug!(
            kind = %classification.statement.kind,
            placeholders = placeholders.len(),
            findings = report.findings().len(),
            status = %report.status,
            "validated query"
        );

        if report.is_error() {
            self.notify(&report);
        }
        report
    }

    pub fn is_valid(&self, query: &Query) -> bool {
        !self.validate(query).is_error()
    }

    fn notify(&self, report: &Report) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(e) = notifier.notify(report.error_count(), &report.summary(), report) {
            tracing::warn!(error = %e, "notifier failed");
        }
    }
}
