//! Placeholder extraction from bare SQL.

use serde::Serialize;
use std::fmt;

use crate::finding::{Finding, FindingCode, Span};
use crate::scanner::SqlText;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", content = "name", rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `?`
    Positional,
    /// `:name`
    Named(String),
}

/// A placeholder found in bare SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub style: PlaceholderStyle,
    /// 1-based position among all placeholders of the statement.
    pub ordinal: usize,
    /// Byte offset of the `?` or `:`.
    pub offset: usize,
}

impl Placeholder {
    pub fn name(&self) -> Option<&str> {
        match &self.style {
            PlaceholderStyle::Named(name) => Some(name),
            PlaceholderStyle::Positional => None,
        }
    }

    pub fn is_named(&self) -> bool {
        self.name().is_some()
    }

    /// Byte length of the placeholder text.
    pub fn len(&self) -> usize {
        match &self.style {
            PlaceholderStyle::Positional => 1,
            PlaceholderStyle::Named(name) => 1 + name.len(),
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.offset, self.offset + self.len())
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.style {
            PlaceholderStyle::Positional => write!(f, "?"),
            PlaceholderStyle::Named(name) => write!(f, ":{}", name),
        }
    }
}

/// Which binding protocol the placeholders of a statement ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleSummary {
    None,
    Positional,
    Named,
    Mixed,
}

impl StyleSummary {
    pub fn of(placeholders: &[Placeholder]) -> Self {
        let named = placeholders.iter().filter(|p| p.is_named()).count();
        match (placeholders.len() - named, named) {
            (0, 0) => StyleSummary::None,
            (_, 0) => StyleSummary::Positional,
            (0, _) => StyleSummary::Named,
            _ => StyleSummary::Mixed,
        }
    }
}

/// Recognise a placeholder starting at byte `i` of a bare run.
///
/// Returns the style and its byte length. `prev` is the character right
/// before `i` within the same bare run, if any.
pub(crate) fn placeholder_at(run: &str, i: usize, prev: Option<char>) -> Option<(PlaceholderStyle, usize)> {
    let rest = &run[i..];
    let mut chars = rest.chars();
    let first = chars.next()?;
    let forms_placeholder = |c: Option<char>| matches!(c, Some('?') | Some(':'));

    match first {
        '?' if !forms_placeholder(prev) => Some((PlaceholderStyle::Positional, 1)),
        ':' if prev != Some(':') => {
            let after = chars.next()?;
            if !(after.is_alphabetic() || after == '_') {
                return None;
            }
            let name_len = rest[1..]
                .char_indices()
                .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
                .map(|(idx, _)| idx)
                .unwrap_or(rest.len() - 1);
            let name = &rest[1..1 + name_len];
            Some((PlaceholderStyle::Named(name.to_string()), 1 + name_len))
        }
        _ => None,
    }
}

/// Extract placeholders from the bare segments of `text`, in order.
pub fn extract(text: &SqlText) -> Vec<Placeholder> {
    let mut placeholders = Vec::new();

    for segment in text.bare_segments() {
        let run = text.slice(segment);
        let mut prev = None;
        let mut i = 0;

        while i < run.len() {
            if let Some((style, len)) = placeholder_at(run, i, prev) {
                placeholders.push(Placeholder {
                    style,
                    ordinal: placeholders.len() + 1,
                    offset: segment.start + i,
                });
                prev = run[..i + len].chars().next_back();
                i += len;
                continue;
            }
            let Some(c) = run[i..].chars().next() else {
                break;
            };
            prev = Some(c);
            i += c.len_utf8();
        }
    }

    placeholders
}

/// The single `MIXED_PLACEHOLDERS` finding, if both styles occur.
pub fn mixed_style(placeholders: &[Placeholder]) -> Option<Finding> {
    if StyleSummary::of(placeholders) != StyleSummary::Mixed {
        return None;
    }
    let named = placeholders.iter().filter(|p| p.is_named()).count();
    let positional = placeholders.len() - named;
    let first_named = placeholders
        .iter()
        .find(|p| p.is_named())
        .map(|p| p.to_string())
        .unwrap_or_default();

    Some(Finding::new(
        FindingCode::MixedPlaceholders,
        format!(
            "Mixed placeholder styles: {} positional (?) and {} named (e.g. {}). Use a single style per statement",
            positional, named, first_named
        ),
    ))
}
