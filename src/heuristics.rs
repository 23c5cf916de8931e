//! Injection heuristics over bound string values.
//!
//! Bound values are never spliced into SQL by a prepared statement, so these
//! checks do not make a query unsafe. They surface input that would be
//! dangerous if some other call site concatenated it.
//!
//! Each heuristic is a pure function of one value. New checks are added by
//! appending to [`BATTERY`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::bindings::{BoundValue, ParamKey, Params};
use crate::finding::{Finding, FindingCode};

/// A bound value under inspection.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub key: &'a ParamKey,
    pub text: &'a str,
}

pub type Heuristic = fn(&Subject<'_>) -> Option<Finding>;

/// The fixed, ordered battery.
pub const BATTERY: &[Heuristic] = &[tautology, stacked_statement, comment_injection, union_select];

static TAUTOLOGY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)['"]\s*\)?\s*\bor\b\s*\(?\s*(?:(?:['"](\w*)['"]|(\w+))\s*(=|<>|!=|like)\s*(?:['"](\w*)['"]?|(\w+))|true\b|not\s+false\b)"#,
    )
    .expect("Invalid regex: tautology pattern")
});

static STACKED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i);\s*(select|insert|update|delete|drop|create|alter|truncate|grant|revoke|exec|execute|merge|replace|shutdown|declare)\b",
    )
    .expect("Invalid regex: stacked statement pattern")
});

static UNION_SELECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bunion\s+(all\s+)?select\b").expect("Invalid regex: UNION SELECT pattern"));

fn excerpt(text: &str) -> String {
    const MAX: usize = 60;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}

fn suspected(subject: &Subject<'_>, pattern: &str) -> Finding {
    Finding::new(
        FindingCode::InjectionSuspected,
        format!(
            "Parameter {} looks like SQL injection ({}): {:?}",
            subject.key,
            pattern,
            excerpt(subject.text)
        ),
    )
}

/// Quote, `OR`, then a comparison that is always true: `' OR '1'='1`,
/// `' OR ''='`, `' OR 'a'<>'b`.
pub fn tautology(subject: &Subject<'_>) -> Option<Finding> {
    let always_true = TAUTOLOGY.captures_iter(subject.text).any(|caps| {
        let lhs = caps.get(1).or_else(|| caps.get(2));
        let rhs = caps.get(4).or_else(|| caps.get(5));
        match (lhs, caps.get(3), rhs) {
            (Some(lhs), Some(op), Some(rhs)) => {
                let same = lhs.as_str().eq_ignore_ascii_case(rhs.as_str());
                match op.as_str() {
                    "<>" | "!=" => !same,
                    _ => same,
                }
            }
            // `OR TRUE`, `OR NOT FALSE`
            _ => true,
        }
    });
    always_true.then(|| suspected(subject, "tautology"))
}

/// `;` followed by another statement keyword.
pub fn stacked_statement(subject: &Subject<'_>) -> Option<Finding> {
    STACKED
        .is_match(subject.text)
        .then(|| suspected(subject, "stacked statement"))
}

/// `--` or `/*` that would truncate a concatenated query.
pub fn comment_injection(subject: &Subject<'_>) -> Option<Finding> {
    (subject.text.contains("--") || subject.text.contains("/*"))
        .then(|| suspected(subject, "comment injection"))
}

/// `UNION [ALL] SELECT`
pub fn union_select(subject: &Subject<'_>) -> Option<Finding> {
    UNION_SELECT
        .is_match(subject.text)
        .then(|| suspected(subject, "UNION SELECT"))
}

/// Run the battery over every string-typed parameter.
///
/// Every match is its own finding, in parameter order then battery order.
pub fn scan(params: &Params) -> Vec<Finding> {
    params
        .iter()
        .filter_map(|(key, value)| match value {
            BoundValue::String(text) => Some(Subject { key, text }),
            _ => None,
        })
        .flat_map(|subject| BATTERY.iter().filter_map(move |check| check(&subject)))
        .collect()
}
