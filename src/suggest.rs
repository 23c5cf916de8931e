//! Suggestion synthesis.
//!
//! Turns the primary finding of a report into a corrected SQL template, a
//! short `sqlx` snippet binding the values, and a one-paragraph explanation.
//! Only computed in verbose mode.

use serde::Serialize;

use crate::bindings::{BoundValue, Supplied};
use crate::classifier::{Statement, StatementKind, TokenKind, tokenize};
use crate::finding::{Finding, FindingCode, Severity, Span};
use crate::placeholder::{self, Placeholder, PlaceholderStyle, StyleSummary};
use crate::scanner::{Dialect, SqlText};

/// A corrected query with an example of how to run it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "query")]
    pub secure_sql: String,
    #[serde(rename = "code")]
    pub code_example: String,
    pub explanation: String,
}

/// Everything the engine learned about one query.
#[derive(Debug, Clone, Copy)]
pub struct Analysis<'a> {
    pub text: &'a SqlText,
    pub placeholders: &'a [Placeholder],
    pub statement: &'a Statement,
    pub supplied: &'a Supplied,
}

/// The finding a suggestion is built for: first error, else first warning,
/// else first info.
pub fn primary(findings: &[Finding]) -> Option<&Finding> {
    [Severity::Error, Severity::Warning, Severity::Info]
        .into_iter()
        .find_map(|severity| findings.iter().find(|f| f.severity == severity))
}

/// Build the suggestion for one finding.
pub fn synthesize(finding: &Finding, analysis: &Analysis<'_>) -> Suggestion {
    let sql = analysis.text.as_str();

    let (secure_sql, binds, explanation) = match finding.code {
        FindingCode::NotPrepared => not_prepared(analysis),
        FindingCode::MissingWhere => missing_where(analysis),
        FindingCode::MixedPlaceholders => (
            all_positional(analysis),
            placeholder_binds(analysis),
            "A statement must use one placeholder style. Every placeholder was rewritten to ? \
             and is bound in the order it appears."
                .to_string(),
        ),
        FindingCode::ParamNameMismatch => (
            all_positional(analysis),
            placeholder_binds(analysis),
            "Every :name placeholder needs a parameter with the same name, and every parameter \
             needs a placeholder. Binding positionally in placeholder order removes the mismatch."
                .to_string(),
        ),
        FindingCode::SelectStar => {
            let secure = match analysis.statement.star {
                Some(star) => rewrite(
                    sql,
                    vec![(star, "column_a, column_b /* list only the columns you need */".to_string())],
                ),
                None => sql.to_string(),
            };
            (
                secure,
                placeholder_binds(analysis),
                "SELECT * returns every column, including ones added later. An explicit column list \
                 keeps the result shape stable and avoids fetching data you do not use."
                    .to_string(),
            )
        }
        FindingCode::ParamCountMismatch => param_count(analysis),
        FindingCode::FieldCountMismatch => field_count(finding, analysis),
        FindingCode::HardcodedValue => hardcoded(finding, analysis),
        FindingCode::InjectionSuspected => (
            sql.to_string(),
            placeholder_binds(analysis),
            "The flagged value contains SQL syntax. Binding keeps it from changing this statement, \
             but the same value is dangerous anywhere it is concatenated into SQL. Validate or \
             reject it where it enters the application."
                .to_string(),
        ),
        FindingCode::MalformedBindings => (
            all_positional(analysis),
            placeholder_binds(analysis),
            "Parameters must be either a list bound to ? in order or a map bound to :name \
             placeholders, never both, and each name may be given once."
                .to_string(),
        ),
    };

    let snippet_sql = positional_text(&secure_sql, analysis.text.dialect());
    Suggestion {
        code_example: code_example(&snippet_sql, &binds, analysis.statement.kind),
        secure_sql,
        explanation,
    }
}

// ============================================================================
// Templates
// ============================================================================

type Template = (String, Vec<Bind>, String);

fn not_prepared(analysis: &Analysis<'_>) -> Template {
    let sql = analysis.text.as_str();
    let literals: Vec<(Span, BoundValue)> = tokenize(analysis.text)
        .into_iter()
        .filter(|t| t.start < analysis.statement.end && matches!(t.kind, TokenKind::Str | TokenKind::Number))
        .map(|t| (Span::new(t.start, t.end), literal_value(&sql[t.start..t.end])))
        .collect();

    let explanation = if literals.is_empty() {
        "The query is sent as plain text. Write every value as a ? placeholder and pass it \
         with bind() so the driver sends it separately from the statement."
    } else {
        "Values are written into the SQL text. Bound parameters travel separately from the \
         statement, so they can never change its structure."
    };

    let edits = literals.iter().map(|(span, _)| (*span, "?".to_string())).collect();
    let binds = literals.iter().map(|(_, value)| Bind::value(value)).collect();
    (rewrite(sql, edits), binds, explanation.to_string())
}

fn missing_where(analysis: &Analysis<'_>) -> Template {
    let sql = analysis.text.as_str();
    let statement = analysis.statement;
    let column = id_column(analysis);
    let named = StyleSummary::of(analysis.placeholders) == StyleSummary::Named;
    let placeholder = if named { format!(":{}", column) } else { "?".to_string() };

    let anchor = statement.where_anchor;
    // The anchor is either the start of ORDER/LIMIT/RETURNING or the end of the last token.
    let before_keyword = sql[anchor..].starts_with(|c: char| c.is_alphabetic());
    let clause = if before_keyword {
        format!("WHERE {} = {} ", column, placeholder)
    } else {
        format!(" WHERE {} = {}", column, placeholder)
    };

    let mut binds = placeholder_binds(analysis);
    let existing = analysis
        .supplied
        .bindings()
        .and_then(|b| b.get_named(&column))
        .map(Bind::value);
    // Placeholders after the anchor (`LIMIT ?`) bind after the new one.
    let position = analysis
        .placeholders
        .iter()
        .filter(|p| p.span().start < anchor)
        .count();
    binds.insert(position, existing.unwrap_or_else(|| Bind::variable(&column, None)));

    let explanation = format!(
        "Without a WHERE clause the {} touches every row of {}. Restrict it to the rows you \
         mean to change, or write WHERE TRUE when a full-table change is intended.",
        statement.kind,
        statement.table.as_deref().unwrap_or("the table")
    );
    (rewrite(sql, vec![(Span::new(anchor, anchor), clause)]), binds, explanation)
}

fn param_count(analysis: &Analysis<'_>) -> Template {
    let binds = placeholder_binds(analysis);
    let missing = binds.iter().filter(|b| b.note.is_some()).count();
    let given = analysis.supplied.bindings().map_or(0, |b| b.len());
    let extra = given.saturating_sub(binds.len() - missing);

    let mut explanation = "Every ? needs exactly one bound value, in order.".to_string();
    if missing > 0 {
        explanation.push_str(&format!(" {} still missing a value.", count(missing, "bind")));
    }
    if extra > 0 {
        explanation.push_str(&format!(
            " {} had no placeholder and {} dropped.",
            count(extra, "value"),
            if extra == 1 { "was" } else { "were" }
        ));
    }
    (analysis.text.as_str().to_string(), binds, explanation)
}

fn field_count(finding: &Finding, analysis: &Analysis<'_>) -> Template {
    let sql = analysis.text.as_str();
    let columns = analysis.statement.columns.clone().unwrap_or_default();
    let row = format!("({})", vec!["?"; columns.len()].join(", "));
    let secure = match finding.span {
        Some(span) => rewrite(sql, vec![(span, row)]),
        None => sql.to_string(),
    };
    let binds = columns.iter().map(|c| Bind::variable(c, None)).collect();
    (
        secure,
        binds,
        format!(
            "Each VALUES row needs one entry per listed column ({}). The row was rebuilt with one \
             placeholder per column.",
            columns.join(", ")
        ),
    )
}

fn hardcoded(finding: &Finding, analysis: &Analysis<'_>) -> Template {
    let sql = analysis.text.as_str();
    let Some(span) = finding.span else {
        return (sql.to_string(), placeholder_binds(analysis), String::new());
    };

    let mut ordered: Vec<(usize, Bind)> = analysis
        .placeholders
        .iter()
        .map(|p| p.offset)
        .zip(placeholder_binds(analysis))
        .collect();
    ordered.push((span.start, Bind::value(&literal_value(&sql[span.start..span.end]))));
    ordered.sort_by_key(|(offset, _)| *offset);

    (
        rewrite(sql, vec![(span, "?".to_string())]),
        ordered.into_iter().map(|(_, bind)| bind).collect(),
        format!(
            "The literal {} sits next to bound values. Bind it like the others so it cannot turn \
             into concatenated input later.",
            &sql[span.start..span.end]
        ),
    )
}

// ============================================================================
// Helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Bind {
    expr: String,
    note: Option<String>,
}

impl Bind {
    fn value(value: &BoundValue) -> Self {
        Self {
            expr: rust_literal(value),
            note: None,
        }
    }

    fn variable(name: &str, note: Option<String>) -> Self {
        Self {
            expr: rust_ident(name),
            note,
        }
    }
}

/// One bind per placeholder, taking values from the supplied bindings.
fn placeholder_binds(analysis: &Analysis<'_>) -> Vec<Bind> {
    let bindings = analysis.supplied.bindings();
    let mut next = 0;

    analysis
        .placeholders
        .iter()
        .map(|p| match &p.style {
            PlaceholderStyle::Positional => {
                let index = next;
                next += 1;
                match bindings.and_then(|b| b.get_positional(index)) {
                    Some(value) => Bind::value(value),
                    None => Bind::variable(&format!("param_{}", index + 1), Some("missing".to_string())),
                }
            }
            PlaceholderStyle::Named(name) => match bindings.and_then(|b| b.get_named(name)) {
                Some(value) => Bind::value(value),
                None => Bind::variable(name, Some(format!("missing :{}", name))),
            },
        })
        .collect()
}

/// Column for a generated `WHERE`: an id-like named parameter the statement
/// never uses, else `id`.
fn id_column(analysis: &Analysis<'_>) -> String {
    let used: Vec<&str> = analysis.placeholders.iter().filter_map(Placeholder::name).collect();
    analysis
        .supplied
        .bindings()
        .map(|b| b.names())
        .unwrap_or_default()
        .into_iter()
        .find(|name| {
            let lower = name.to_ascii_lowercase();
            (lower == "id" || lower.ends_with("_id")) && !used.contains(name)
        })
        .unwrap_or("id")
        .to_string()
}

fn all_positional(analysis: &Analysis<'_>) -> String {
    let edits = analysis
        .placeholders
        .iter()
        .map(|p| (p.span(), "?".to_string()))
        .collect();
    rewrite(analysis.text.as_str(), edits)
}

/// `sqlx` binds by position only, so snippets get `?` for every `:name`.
fn positional_text(sql: &str, dialect: Dialect) -> String {
    let text = SqlText::new(sql, dialect);
    let edits = placeholder::extract(&text)
        .iter()
        .filter(|p| p.name().is_some())
        .map(|p| (p.span(), "?".to_string()))
        .collect();
    rewrite(sql, edits)
}

/// Apply non-overlapping replacements; an empty span inserts.
fn rewrite(sql: &str, mut edits: Vec<(Span, String)>) -> String {
    edits.sort_by_key(|(span, _)| span.start);
    let mut out = String::with_capacity(sql.len() + 16);
    let mut at = 0;
    for (span, replacement) in edits {
        if span.start < at {
            continue;
        }
        out.push_str(&sql[at..span.start]);
        out.push_str(&replacement);
        at = span.end;
    }
    out.push_str(&sql[at..]);
    out
}

/// Value of a quoted string or number token.
fn literal_value(raw: &str) -> BoundValue {
    if let Some(quote) = raw.chars().next().filter(|c| *c == '\'' || *c == '"') {
        let inner = raw.strip_prefix(quote).unwrap_or(raw);
        let inner = inner.strip_suffix(quote).unwrap_or(inner);
        let doubled: String = [quote, quote].iter().collect();
        return BoundValue::String(inner.replace(&doubled, &quote.to_string()));
    }
    raw.parse::<i64>()
        .map(BoundValue::Int)
        .or_else(|_| raw.parse::<f64>().map(BoundValue::Float))
        .unwrap_or_else(|_| BoundValue::String(raw.to_string()))
}

fn rust_literal(value: &BoundValue) -> String {
    match value {
        BoundValue::Null => "None::<String>".to_string(),
        BoundValue::Bool(b) => b.to_string(),
        BoundValue::Int(i) => i.to_string(),
        BoundValue::Float(x) => format!("{:?}", x),
        BoundValue::String(s) => format!("{:?}", s),
    }
}

fn rust_ident(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

fn count(n: usize, word: &str) -> String {
    if n == 1 {
        format!("1 {}", word)
    } else {
        format!("{} {}s", n, word)
    }
}

fn code_example(sql: &str, binds: &[Bind], kind: StatementKind) -> String {
    let (binding, finish) = match kind {
        StatementKind::Select => ("rows", "fetch_all"),
        _ => ("result", "execute"),
    };
    let mut out = format!("let {} = sqlx::query({:?})\n", binding, sql.trim());
    for bind in binds {
        out.push_str("    .bind(");
        out.push_str(&bind.expr);
        out.push(')');
        if let Some(note) = &bind.note {
            out.push_str(" // ");
            out.push_str(note);
        }
        out.push('\n');
    }
    out.push_str(&format!("    .{}(&pool)\n    .await?;", finish));
    out
}
