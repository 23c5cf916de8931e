//! Statement classification.
//!
//! Works on two views of the same segment stream:
//!
//! - the comment-masked text, where a small `nom` grammar reads the
//!   statement head (`INSERT INTO t (cols)`, `UPDATE t`, `DELETE FROM t`,
//!   `SELECT [DISTINCT] *`);
//! - a flat token stream, used for everything that depends on parenthesis
//!   depth (top-level `WHERE`, `VALUES` rows, literal items in lists).
//!
//! Only the first statement, up to a top-level `;`, is looked at. Anything
//! the grammar does not recognise is `Other` and produces no kind-specific
//! findings.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{char, multispace0, multispace1, satisfy},
    combinator::{map, not, opt, peek},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};
use serde::Serialize;
use std::fmt;

use crate::finding::{Finding, FindingCode, Span};
use crate::placeholder::placeholder_at;
use crate::scanner::{Dialect, SegmentKind, SqlText};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Select => write!(f, "SELECT"),
            StatementKind::Insert => write!(f, "INSERT"),
            StatementKind::Update => write!(f, "UPDATE"),
            StatementKind::Delete => write!(f, "DELETE"),
            StatementKind::Other => write!(f, "OTHER"),
        }
    }
}

/// One item of a parenthesized list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Entry {
    Placeholder,
    /// Quoted string or number.
    Literal,
    Expression,
}

/// One `( ... )` tuple of a `VALUES` clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueRow {
    pub entries: Vec<Entry>,
    pub span: Span,
}

impl ValueRow {
    pub fn placeholder_count(&self) -> usize {
        self.entries.iter().filter(|e| **e == Entry::Placeholder).count()
    }

    pub fn is_all_placeholders(&self) -> bool {
        self.placeholder_count() == self.entries.len()
    }
}

/// Structural facts about the first statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub kind: StatementKind,
    /// Leading keyword as written, if the statement starts with a word.
    pub keyword: Option<String>,
    pub table: Option<String>,
    /// `INSERT` column list, when present and parseable.
    pub columns: Option<Vec<String>>,
    pub value_rows: Vec<ValueRow>,
    /// Columns assigned in an `UPDATE ... SET`.
    pub set_columns: Vec<String>,
    /// Top-level `WHERE` present.
    pub has_where: bool,
    /// Position of the `*` in `SELECT *`.
    pub star: Option<Span>,
    /// Where a `WHERE` clause would go: before a top-level `ORDER BY`,
    /// `LIMIT` or `RETURNING`, else after the last token.
    pub where_anchor: usize,
    /// End of the first statement (a top-level `;` or end of input).
    pub end: usize,
}

/// Result of classifying a statement.
#[derive(Debug, Clone)]
pub struct Classification {
    pub statement: Statement,
    pub findings: Vec<Finding>,
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Word,
    Number,
    Str,
    /// Quoted identifier.
    Ident,
    Placeholder,
    LParen,
    RParen,
    Comma,
    Star,
    Semicolon,
    Equals,
    Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Flatten segments into tokens. Comments are dropped.
pub(crate) fn tokenize(text: &SqlText) -> Vec<Token> {
    let mut tokens = Vec::new();

    for segment in text.segments() {
        match segment.kind {
            SegmentKind::Comment => {}
            SegmentKind::Literal => {
                let kind = match text.as_str().as_bytes()[segment.start] {
                    b'\'' => TokenKind::Str,
                    b'"' if text.dialect() == Dialect::MySql => TokenKind::Str,
                    _ => TokenKind::Ident,
                };
                tokens.push(Token {
                    kind,
                    start: segment.start,
                    end: segment.end,
                });
            }
            SegmentKind::Bare => tokenize_bare(text.slice(segment), segment.start, &mut tokens),
        }
    }

    tokens
}

fn tokenize_bare(run: &str, base: usize, tokens: &mut Vec<Token>) {
    let mut prev = None;
    let mut i = 0;

    while i < run.len() {
        if let Some((_, len)) = placeholder_at(run, i, prev) {
            tokens.push(Token {
                kind: TokenKind::Placeholder,
                start: base + i,
                end: base + i + len,
            });
            prev = run[..i + len].chars().next_back();
            i += len;
            continue;
        }

        let Some(c) = run[i..].chars().next() else {
            break;
        };
        let rest = &run[i..];
        let starts_number = c.is_ascii_digit()
            || (c == '.' && rest[1..].starts_with(|d: char| d.is_ascii_digit()));

        let (kind, len) = if c.is_whitespace() {
            prev = Some(c);
            i += c.len_utf8();
            continue;
        } else if c.is_alphabetic() || c == '_' {
            let len = rest.find(|ch: char| !is_word_char(ch)).unwrap_or(rest.len());
            (TokenKind::Word, len)
        } else if starts_number {
            (TokenKind::Number, number_len(rest))
        } else {
            let kind = match c {
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                ',' => TokenKind::Comma,
                '*' => TokenKind::Star,
                ';' => TokenKind::Semicolon,
                '=' => TokenKind::Equals,
                _ => TokenKind::Symbol,
            };
            (kind, c.len_utf8())
        };

        tokens.push(Token {
            kind,
            start: base + i,
            end: base + i + len,
        });
        prev = rest[..len].chars().next_back();
        i += len;
    }
}

fn number_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}

// ============================================================================
// Statement head grammar
// ============================================================================

/// A keyword that is not the prefix of a longer word.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(word), not(satisfy(is_word_char)))
}

/// Bare, quoted (`"x"`, `` `x` ``) or bracketed (`[x]`) identifier.
fn identifier(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('`'), take_while(|c: char| c != '`'), char('`')),
        delimited(char('['), take_while(|c: char| c != ']'), char(']')),
        take_while1(is_word_char),
    ))(input)
}

/// Possibly schema-qualified table name.
fn table_name(input: &str) -> IResult<&str, String> {
    map(separated_list1(char('.'), identifier), |parts: Vec<&str>| parts.join("."))(input)
}

fn column_list(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(
        pair(char('('), multispace0),
        separated_list1(tuple((multispace0, char(','), multispace0)), identifier),
        pair(multispace0, char(')')),
    )(input)
}

fn modifiers<'a>(words: &'static [&'static str]) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<&'a str>> {
    many0(preceded(multispace1, move |input: &'a str| {
        for word in words {
            if let Ok(done) = keyword(*word)(input) {
                return Ok(done);
            }
        }
        Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)))
    }))
}

/// `INSERT [IGNORE] [INTO] table [(col, ...)]`
fn insert_head(input: &str) -> IResult<&str, (String, Option<Vec<&str>>)> {
    let (input, _) = multispace0(input)?;
    let (input, _) = alt((keyword("insert"), keyword("replace")))(input)?;
    let (input, _) = modifiers(&["low_priority", "delayed", "high_priority", "ignore"])(input)?;
    let (input, _) = opt(preceded(multispace1, keyword("into")))(input)?;
    let (input, _) = multispace1(input)?;
    let (input, table) = table_name(input)?;
    let (input, _) = multispace0(input)?;
    let (input, columns) = opt(column_list)(input)?;
    Ok((input, (table, columns)))
}

/// `UPDATE [ONLY] table`
fn update_head(input: &str) -> IResult<&str, String> {
    let (input, _) = multispace0(input)?;
    let (input, _) = keyword("update")(input)?;
    let (input, _) = modifiers(&["low_priority", "ignore", "only"])(input)?;
    let (input, _) = multispace1(input)?;
    table_name(input)
}

/// `DELETE FROM [ONLY] table`
fn delete_head(input: &str) -> IResult<&str, String> {
    let (input, _) = multispace0(input)?;
    let (input, _) = keyword("delete")(input)?;
    let (input, _) = modifiers(&["low_priority", "quick", "ignore"])(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = keyword("from")(input)?;
    let (input, _) = modifiers(&["only"])(input)?;
    let (input, _) = multispace1(input)?;
    table_name(input)
}

/// `SELECT [DISTINCT | ALL] *`, returning the input starting at the `*`.
fn select_star(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    let (input, _) = keyword("select")(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = opt(terminated(alt((keyword("distinct"), keyword("all"))), multispace0))(input)?;
    let (input, _) = peek(char('*'))(input)?;
    Ok((input, ()))
}

fn leading_word(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, take_while1(|c: char| c.is_alphabetic()))(input)
}

// ============================================================================
// Parenthesized lists
// ============================================================================

#[derive(Debug, Default)]
struct Item {
    /// Indexes of the tokens directly inside this item.
    tokens: Vec<usize>,
    nested: bool,
}

#[derive(Debug)]
struct ParenList {
    open: usize,
    close: usize,
    items: Vec<(Entry, Option<Span>)>,
}

fn entry_of(item: &Item, tokens: &[Token], sql: &str) -> (Entry, Option<Span>) {
    let kinds: Vec<TokenKind> = item.tokens.iter().map(|&i| tokens[i].kind).collect();
    let span = match (item.tokens.first(), item.tokens.last()) {
        (Some(&first), Some(&last)) => Some(Span::new(tokens[first].start, tokens[last].end)),
        _ => None,
    };
    if item.nested {
        return (Entry::Expression, span);
    }
    let signed = |i: usize| matches!(&sql[tokens[item.tokens[i]].start..tokens[item.tokens[i]].end], "-" | "+");
    let entry = match kinds.as_slice() {
        [TokenKind::Placeholder] => Entry::Placeholder,
        [TokenKind::Str] | [TokenKind::Number] => Entry::Literal,
        [TokenKind::Symbol, TokenKind::Number] if signed(0) => Entry::Literal,
        _ => Entry::Expression,
    };
    (entry, span)
}

/// Every closed `( ... )` in the token range, innermost first.
fn paren_lists(tokens: &[Token], sql: &str) -> Vec<ParenList> {
    let mut stack: Vec<(usize, Vec<Item>, Item)> = Vec::new();
    let mut lists = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => {
                if let Some((_, _, current)) = stack.last_mut() {
                    current.nested = true;
                }
                stack.push((idx, Vec::new(), Item::default()));
            }
            TokenKind::RParen => {
                if let Some((open, mut items, current)) = stack.pop() {
                    if !current.tokens.is_empty() || current.nested || !items.is_empty() {
                        items.push(current);
                    }
                    lists.push(ParenList {
                        open,
                        close: idx,
                        items: items.iter().map(|item| entry_of(item, tokens, sql)).collect(),
                    });
                }
            }
            TokenKind::Comma => {
                if let Some((_, items, current)) = stack.last_mut() {
                    items.push(std::mem::take(current));
                }
            }
            _ => {
                if let Some((_, _, current)) = stack.last_mut() {
                    current.tokens.push(idx);
                }
            }
        }
    }

    lists
}

// ============================================================================
// Classification
// ============================================================================

fn word_is(sql: &str, token: &Token, word: &str) -> bool {
    token.kind == TokenKind::Word && sql[token.start..token.end].eq_ignore_ascii_case(word)
}

/// Classify the first statement of `text` and collect the classifier's findings.
pub fn classify(text: &SqlText) -> Classification {
    let sql = text.as_str();
    let all_tokens = tokenize(text);

    // Limit to the first statement.
    let mut depth = 0usize;
    let mut stmt_len = all_tokens.len();
    for (idx, token) in all_tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Semicolon if depth == 0 => {
                stmt_len = idx;
                break;
            }
            _ => {}
        }
    }
    let tokens = &all_tokens[..stmt_len];
    let end = all_tokens.get(stmt_len).map(|t| t.start).unwrap_or(sql.len());

    let masked = text.masked();
    let head = &masked[..end];

    let keyword = leading_word(head).ok().map(|(_, w)| w.to_string());
    let kind = match keyword.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("select") => StatementKind::Select,
        Some("insert") | Some("replace") => StatementKind::Insert,
        Some("update") => StatementKind::Update,
        Some("delete") => StatementKind::Delete,
        _ => StatementKind::Other,
    };

    // Depth of each token, and top-level keyword positions.
    let mut depths = Vec::with_capacity(tokens.len());
    let mut depth = 0usize;
    for token in tokens {
        if token.kind == TokenKind::RParen {
            depth = depth.saturating_sub(1);
        }
        depths.push(depth);
        if token.kind == TokenKind::LParen {
            depth += 1;
        }
    }
    let top_level = |word: &str| {
        tokens
            .iter()
            .zip(&depths)
            .position(|(t, d)| *d == 0 && word_is(sql, t, word))
    };

    let has_where = top_level("where").is_some();
    // `ORDER BY`, `LIMIT`, `RETURNING`; never a SET target such as `limit = ?`.
    let opens_tail = |idx: usize| {
        let next = tokens.get(idx + 1);
        if word_is(sql, &tokens[idx], "order") {
            next.is_some_and(|t| word_is(sql, t, "by"))
        } else {
            (word_is(sql, &tokens[idx], "limit") || word_is(sql, &tokens[idx], "returning"))
                && next.is_none_or(|t| t.kind != TokenKind::Equals)
        }
    };
    let where_anchor = (0..tokens.len())
        .find(|&idx| depths[idx] == 0 && opens_tail(idx))
        .map(|idx| tokens[idx].start)
        .or_else(|| tokens.last().map(|t| t.end))
        .unwrap_or(0);

    let lists = paren_lists(tokens, sql);

    let mut statement = Statement {
        kind,
        keyword,
        table: None,
        columns: None,
        value_rows: Vec::new(),
        set_columns: Vec::new(),
        has_where,
        star: None,
        where_anchor,
        end,
    };

    match kind {
        StatementKind::Insert => {
            if let Ok((_, (table, columns))) = insert_head(head) {
                statement.table = Some(table);
                statement.columns = columns.map(|cols| cols.into_iter().map(str::to_string).collect());
            }
            statement.value_rows = value_rows(tokens, &depths, &lists, sql);
        }
        StatementKind::Update => {
            statement.table = update_head(head).ok().map(|(_, t)| t);
            statement.set_columns = set_columns(tokens, &depths, sql);
        }
        StatementKind::Delete => {
            statement.table = delete_head(head).ok().map(|(_, t)| t);
        }
        StatementKind::Select => {
            if let Ok((rest, ())) = select_star(head) {
                let at = head.len() - rest.len();
                statement.star = Some(Span::new(at, at + 1));
            }
        }
        StatementKind::Other => {}
    }

    let findings = review(&statement, &lists, sql);
    Classification { statement, findings }
}

/// Rows of the top-level `VALUES` clause.
fn value_rows(tokens: &[Token], depths: &[usize], lists: &[ParenList], sql: &str) -> Vec<ValueRow> {
    let Some(values_at) = tokens
        .iter()
        .zip(depths)
        .position(|(t, d)| *d == 0 && (word_is(sql, t, "values") || word_is(sql, t, "value")))
    else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    let mut idx = values_at + 1;
    while let Some(token) = tokens.get(idx) {
        match token.kind {
            TokenKind::LParen => {
                let Some(list) = lists.iter().find(|l| l.open == idx) else {
                    break;
                };
                rows.push(ValueRow {
                    entries: list.items.iter().map(|(e, _)| *e).collect(),
                    span: Span::new(token.start, tokens[list.close].end),
                });
                idx = list.close + 1;
            }
            TokenKind::Comma => idx += 1,
            _ => break,
        }
    }
    rows
}

/// Targets of `SET a = ..., b = ...` at the top level.
fn set_columns(tokens: &[Token], depths: &[usize], sql: &str) -> Vec<String> {
    let Some(set_at) = tokens.iter().zip(depths).position(|(t, d)| *d == 0 && word_is(sql, t, "set")) else {
        return Vec::new();
    };
    tokens[set_at + 1..]
        .windows(2)
        .zip(&depths[set_at + 1..])
        .take_while(|(pair, _)| !word_is(sql, &pair[0], "where") && !word_is(sql, &pair[0], "from"))
        .filter(|(pair, depth)| **depth == 0 && pair[0].kind == TokenKind::Word && pair[1].kind == TokenKind::Equals)
        .map(|(pair, _)| sql[pair[0].start..pair[0].end].to_string())
        .collect()
}

fn review(statement: &Statement, lists: &[ParenList], sql: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let target = statement.table.as_deref().unwrap_or("the target table");

    match statement.kind {
        StatementKind::Update if !statement.has_where => findings.push(Finding::new(
            FindingCode::MissingWhere,
            format!("UPDATE without a WHERE clause modifies every row in {}", target),
        )),
        StatementKind::Delete if !statement.has_where => findings.push(Finding::new(
            FindingCode::MissingWhere,
            format!("DELETE without a WHERE clause removes every row from {}", target),
        )),
        _ => {}
    }

    if let Some(star) = statement.star {
        findings.push(
            Finding::new(
                FindingCode::SelectStar,
                "SELECT * fetches every column; list the columns you need explicitly",
            )
            .with_span(star),
        );
    }

    let mut ordered: Vec<&ParenList> = lists.iter().collect();
    ordered.sort_by_key(|l| l.open);
    for list in ordered {
        let has_placeholder = list.items.iter().any(|(e, _)| *e == Entry::Placeholder);
        if !has_placeholder {
            continue;
        }
        for (entry, span) in &list.items {
            if let (Entry::Literal, Some(span)) = (entry, span) {
                findings.push(
                    Finding::new(
                        FindingCode::HardcodedValue,
                        format!(
                            "Hardcoded value {} next to bound placeholders; bind it as a parameter instead",
                            &sql[span.start..span.end]
                        ),
                    )
                    .with_span(*span),
                );
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_sql(sql: &str) -> Classification {
        classify(&SqlText::new(sql, Dialect::Standard))
    }

    fn codes(sql: &str) -> Vec<FindingCode> {
        classify_sql(sql).findings.iter().map(|f| f.code).collect()
    }

    #[test]
    fn test_kinds() {
        assert_eq!(classify_sql("select 1").statement.kind, StatementKind::Select);
        assert_eq!(classify_sql("  Insert into t values (1)").statement.kind, StatementKind::Insert);
        assert_eq!(classify_sql("/* hi */ UPDATE t SET a = 1").statement.kind, StatementKind::Update);
        assert_eq!(classify_sql("DELETE FROM t").statement.kind, StatementKind::Delete);
        assert_eq!(classify_sql("WITH x AS (SELECT 1) SELECT * FROM x").statement.kind, StatementKind::Other);
        assert_eq!(classify_sql("").statement.kind, StatementKind::Other);
        assert_eq!(classify_sql("'just a string'").statement.kind, StatementKind::Other);
    }

    #[test]
    fn test_insert_head() {
        let stmt = classify_sql("INSERT INTO users (name, email, age) VALUES (?, ?, ?)").statement;
        assert_eq!(stmt.table.as_deref(), Some("users"));
        assert_eq!(
            stmt.columns,
            Some(vec!["name".to_string(), "email".to_string(), "age".to_string()])
        );
        assert_eq!(stmt.value_rows.len(), 1);
        assert_eq!(stmt.value_rows[0].placeholder_count(), 3);
    }

    #[test]
    fn test_insert_quoted_and_qualified() {
        let stmt = classify_sql("INSERT IGNORE INTO app.\"Users\"(\"name\", `age`) VALUES (?, 1), (?, ?)").statement;
        assert_eq!(stmt.table.as_deref(), Some("app.Users"));
        assert_eq!(stmt.columns.as_ref().map(Vec::len), Some(2));
        assert_eq!(stmt.value_rows.len(), 2);
        assert_eq!(stmt.value_rows[0].entries, vec![Entry::Placeholder, Entry::Literal]);
    }

    #[test]
    fn test_insert_without_column_list() {
        let stmt = classify_sql("INSERT INTO logs VALUES (?, ?)").statement;
        assert_eq!(stmt.table.as_deref(), Some("logs"));
        assert_eq!(stmt.columns, None);
    }

    #[test]
    fn test_missing_where() {
        assert_eq!(codes("DELETE FROM users"), vec![FindingCode::MissingWhere]);
        assert_eq!(codes("UPDATE users SET status = ?"), vec![FindingCode::MissingWhere]);
        assert!(codes("DELETE FROM users WHERE id = ?").is_empty());
        assert!(codes("update users set a = ? where id = ?").is_empty());
    }

    #[test]
    fn test_where_must_be_top_level() {
        let sql = "UPDATE t SET a = (SELECT b FROM u WHERE u.id = t.id)";
        assert_eq!(codes(sql), vec![FindingCode::MissingWhere]);
        // Inside a string or a comment it does not count either.
        assert_eq!(codes("DELETE FROM t -- WHERE id = 1"), vec![FindingCode::MissingWhere]);
        assert_eq!(codes("DELETE FROM \"where\""), vec![FindingCode::MissingWhere]);
    }

    #[test]
    fn test_only_first_statement() {
        assert_eq!(codes("DELETE FROM a; SELECT * FROM b WHERE x = 1"), vec![FindingCode::MissingWhere]);
    }

    #[test]
    fn test_missing_where_names_table() {
        let findings = classify_sql("DELETE FROM sessions").findings;
        assert_eq!(
            findings[0].message,
            "DELETE without a WHERE clause removes every row from sessions"
        );
    }

    #[test]
    fn test_select_star() {
        let c = classify_sql("SELECT * FROM products WHERE category = ?");
        assert_eq!(c.statement.star, Some(Span::new(7, 8)));
        assert_eq!(codes("select distinct * from t"), vec![FindingCode::SelectStar]);
        assert!(codes("SELECT COUNT(*) FROM t").is_empty());
        assert!(codes("SELECT id, name FROM t").is_empty());
    }

    #[test]
    fn test_hardcoded_value_next_to_placeholder() {
        let c = classify_sql("INSERT INTO logs (message, level) VALUES (?, 'ERROR')");
        assert_eq!(c.findings.len(), 1);
        assert_eq!(c.findings[0].code, FindingCode::HardcodedValue);
        assert!(c.findings[0].message.contains("'ERROR'"));
        assert_eq!(c.findings[0].span, Some(Span::new(45, 52)));
    }

    #[test]
    fn test_hardcoded_numbers_and_in_lists() {
        assert_eq!(
            codes("SELECT id FROM t WHERE id IN (?, -5)"),
            vec![FindingCode::HardcodedValue]
        );
        // Literals alone, or function calls beside placeholders, are fine.
        assert!(codes("INSERT INTO t (a, b) VALUES (1, 'x')").is_empty());
        assert!(codes("INSERT INTO t (a, b) VALUES (?, NOW())").is_empty());
    }

    #[test]
    fn test_set_columns() {
        let stmt = classify_sql("UPDATE users SET status = ?, t.user_id = ? WHERE id = ?").statement;
        assert_eq!(stmt.set_columns, vec!["status".to_string(), "user_id".to_string()]);
    }

    #[test]
    fn test_where_anchor_before_limit() {
        let sql = "DELETE FROM logs ORDER BY id LIMIT 10";
        let stmt = classify_sql(sql).statement;
        assert_eq!(&sql[stmt.where_anchor..], "ORDER BY id LIMIT 10");

        let sql = "DELETE FROM logs;";
        let stmt = classify_sql(sql).statement;
        assert_eq!(stmt.where_anchor, "DELETE FROM logs".len());
        assert_eq!(stmt.end, "DELETE FROM logs".len());
    }

    #[test]
    fn test_where_anchor_skips_set_targets() {
        let sql = "UPDATE items SET order = ?, limit = ? LIMIT 5";
        let stmt = classify_sql(sql).statement;
        assert_eq!(&sql[stmt.where_anchor..], "LIMIT 5");

        let sql = "UPDATE items SET order = 1";
        let stmt = classify_sql(sql).statement;
        assert_eq!(stmt.where_anchor, sql.len());
    }

    #[test]
    fn test_tokenizer_numbers_and_words() {
        let text = SqlText::new("a1 = 1.5e3 AND b = .5", Dialect::Standard);
        let kinds: Vec<TokenKind> = tokenize(&text).iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Word,
                TokenKind::Equals,
                TokenKind::Number,
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Equals,
                TokenKind::Number,
            ]
        );
    }
}
