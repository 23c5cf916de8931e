//! Binding reconciliation: placeholders against supplied parameters.

use std::collections::BTreeSet;

use crate::bindings::{Bindings, BoundValue, Supplied};
use crate::classifier::{Statement, StatementKind};
use crate::finding::{Finding, FindingCode};
use crate::placeholder::{self, Placeholder, StyleSummary};

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

fn name_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(|n| format!(":{}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compare placeholders with the supplied parameters.
///
/// Rules run independently and in a fixed order: mixed styles, unprepared
/// raw SQL, positional count, named set equality, INSERT column count.
pub fn reconcile(placeholders: &[Placeholder], supplied: &Supplied, statement: &Statement) -> Vec<Finding> {
    let mut findings = Vec::new();
    let style = StyleSummary::of(placeholders);

    if let Some(mixed) = placeholder::mixed_style(placeholders) {
        findings.push(mixed);
    }

    if style == StyleSummary::None && *supplied == Supplied::Raw {
        findings.push(Finding::new(
            FindingCode::NotPrepared,
            "Query is not a prepared statement: it has no placeholders and no bound parameters. \
             Use placeholders (?) and pass values separately",
        ));
    }

    let empty = Bindings::Positional(Vec::new());
    let bindings = match supplied {
        Supplied::Bound(bindings) => Some(bindings),
        Supplied::Raw => Some(&empty),
        Supplied::Malformed => None,
    };

    if let Some(bindings) = bindings {
        match style {
            StyleSummary::Positional => match bindings {
                Bindings::Named(pairs) => findings.push(named_for_positional(placeholders.len(), pairs)),
                Bindings::Positional(_) => findings.extend(check_count(placeholders.len(), bindings.len())),
            },
            StyleSummary::None if *supplied != Supplied::Raw => {
                findings.extend(check_count(0, bindings.len()))
            }
            StyleSummary::Named => findings.extend(check_names(placeholders, bindings)),
            _ => {}
        }
    }

    if statement.kind == StatementKind::Insert {
        findings.extend(check_fields(statement));
    }

    findings
}

fn check_count(expected: usize, given: usize) -> Option<Finding> {
    let message = if given < expected {
        format!(
            "Missing parameters: the query has {} but only {} bound ({} expected, {} given)",
            plural(expected, "placeholder"),
            plural(given, "value"),
            expected,
            given
        )
    } else if given > expected {
        format!(
            "Extra parameters: the query has {} but {} bound ({} expected, {} given)",
            plural(expected, "placeholder"),
            plural(given, "value"),
            expected,
            given
        )
    } else {
        return None;
    };
    Some(Finding::new(FindingCode::ParamCountMismatch, message))
}

fn named_for_positional(expected: usize, pairs: &[(String, BoundValue)]) -> Finding {
    Finding::new(
        FindingCode::ParamNameMismatch,
        format!(
            "Named parameters supplied for positional placeholders: the query has {} but {} were bound by name. \
             Pass a list of values instead",
            plural(expected, "placeholder"),
            name_list(pairs.iter().map(|(n, _)| n.as_str()))
        ),
    )
}

fn check_names(placeholders: &[Placeholder], bindings: &Bindings) -> Vec<Finding> {
    // Keep first-occurrence order for messages; duplicates consume one binding.
    let mut seen = BTreeSet::new();
    let wanted: Vec<&str> = placeholders
        .iter()
        .filter_map(Placeholder::name)
        .filter(|n| seen.insert(*n))
        .collect();
    let given = bindings.names();

    let missing: Vec<&str> = wanted.iter().copied().filter(|n| !given.contains(n)).collect();
    let extra: Vec<&str> = match bindings {
        Bindings::Named(pairs) => pairs
            .iter()
            .map(|(n, _)| n.as_str())
            .filter(|n| !seen.contains(n))
            .collect(),
        Bindings::Positional(_) => Vec::new(),
    };

    let mut findings = Vec::new();
    if !missing.is_empty() {
        let mut message = format!("Missing named parameters: {}", name_list(missing));
        if let Bindings::Positional(values) = bindings {
            if !values.is_empty() {
                message.push_str(&format!(
                    " ({} supplied by position; named placeholders need named parameters)",
                    plural(values.len(), "value")
                ));
            }
        }
        findings.push(Finding::new(FindingCode::ParamNameMismatch, message));
    }
    if !extra.is_empty() {
        findings.push(Finding::new(
            FindingCode::ParamNameMismatch,
            format!("Unexpected named parameters: {}", name_list(extra)),
        ));
    }
    findings
}

fn check_fields(statement: &Statement) -> Vec<Finding> {
    let Some(columns) = &statement.columns else {
        return Vec::new();
    };
    let table = statement.table.as_deref().unwrap_or("the table");

    statement
        .value_rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.entries.len() != columns.len())
        .map(|(i, row)| {
            let what = if row.is_all_placeholders() { "placeholder" } else { "value" };
            let row_label = if statement.value_rows.len() > 1 {
                format!("VALUES row {}", i + 1)
            } else {
                "VALUES".to_string()
            };
            Finding::new(
                FindingCode::FieldCountMismatch,
                format!(
                    "INSERT into {} lists {} but {} has {}",
                    table,
                    plural(columns.len(), "column"),
                    row_label,
                    plural(row.entries.len(), what)
                ),
            )
            .with_span(row.span)
        })
        .collect()
}
