//! Lexical scanner.
//!
//! Splits SQL text into bare SQL, quoted literals and comments so later
//! stages never look for placeholders or keywords inside a string or a
//! comment.
//!
//! ```text
//! SELECT * FROM t WHERE a = 'x?' -- why?
//! └──────── Bare ──────────┘└Lit┘└Comment┘
//! ```

use serde::{Deserialize, Serialize};

/// SQL flavour that decides quoting and comment rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// ANSI quoting: `"..."` is an identifier, quotes escape by doubling.
    #[default]
    Standard,
    /// `"..."` is a string, backslash escapes inside quotes, `#` starts a comment.
    #[serde(alias = "mariadb")]
    MySql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Bare,
    /// Quoted string or quoted identifier, quotes included.
    Literal,
    /// Line or block comment, delimiters included.
    Comment,
}

/// A half-open byte range of the input with a single lexical kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// SQL text together with its segmentation.
#[derive(Debug, Clone)]
pub struct SqlText {
    text: String,
    dialect: Dialect,
    segments: Vec<Segment>,
}

impl SqlText {
    pub fn new(text: impl Into<String>, dialect: Dialect) -> Self {
        let text = text.into();
        let segments = scan(&text, dialect);
        Self {
            text,
            dialect,
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Text covered by a segment.
    pub fn slice(&self, segment: &Segment) -> &str {
        &self.text[segment.start..segment.end]
    }

    pub fn bare_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Bare)
    }

    /// The text with every comment blanked out byte for byte, so offsets
    /// into the result are offsets into the original.
    pub fn masked(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        for segment in &self.segments {
            match segment.kind {
                SegmentKind::Comment => out.extend(std::iter::repeat_n(' ', segment.len())),
                _ => out.push_str(self.slice(segment)),
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Bare,
    Quoted(u8),
    LineComment,
    BlockComment,
}

impl State {
    fn kind(self) -> SegmentKind {
        match self {
            State::Bare => SegmentKind::Bare,
            State::Quoted(_) => SegmentKind::Literal,
            State::LineComment | State::BlockComment => SegmentKind::Comment,
        }
    }
}

/// Partition `sql` into segments.
///
/// Never fails: an unterminated literal or comment simply runs to the end
/// of the input.
pub fn scan(sql: &str, dialect: Dialect) -> Vec<Segment> {
    // All delimiters are ASCII, and UTF-8 continuation bytes never collide
    // with ASCII, so walking bytes keeps every boundary on a char boundary.
    let bytes = sql.as_bytes();
    let mut segments = Vec::new();
    let mut state = State::Bare;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        match state {
            State::Bare => {
                let opened = match (b, next) {
                    (b'\'' | b'"' | b'`', _) => Some((State::Quoted(b), 1)),
                    (b'-', Some(b'-')) => Some((State::LineComment, 2)),
                    (b'/', Some(b'*')) => Some((State::BlockComment, 2)),
                    (b'#', _) if dialect == Dialect::MySql => Some((State::LineComment, 1)),
                    _ => None,
                };
                match opened {
                    Some((new_state, width)) => {
                        close(&mut segments, SegmentKind::Bare, start, i);
                        start = i;
                        state = new_state;
                        i += width;
                    }
                    None => i += 1,
                }
            }
            State::Quoted(quote) => {
                if b == b'\\' && dialect == Dialect::MySql && quote != b'`' {
                    i += 2;
                } else if b == quote && next == Some(quote) {
                    i += 2;
                } else if b == quote {
                    i += 1;
                    close(&mut segments, SegmentKind::Literal, start, i);
                    start = i;
                    state = State::Bare;
                } else {
                    i += 1;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    close(&mut segments, SegmentKind::Comment, start, i);
                    start = i;
                    state = State::Bare;
                }
                i += 1;
            }
            State::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    i += 2;
                    close(&mut segments, SegmentKind::Comment, start, i);
                    start = i;
                    state = State::Bare;
                } else {
                    i += 1;
                }
            }
        }
    }

    // A trailing backslash escape can step past the end.
    close(&mut segments, state.kind(), start, bytes.len());
    segments
}

fn close(segments: &mut Vec<Segment>, kind: SegmentKind, start: usize, end: usize) {
    if end > start {
        segments.push(Segment { kind, start, end });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str, dialect: Dialect) -> Vec<(SegmentKind, &str)> {
        scan(sql, dialect)
            .iter()
            .map(|s| (s.kind, &sql[s.start..s.end]))
            .collect()
    }

    fn assert_partition(sql: &str, dialect: Dialect) {
        let segments = scan(sql, dialect);
        let mut expected_start = 0;
        for segment in &segments {
            assert_eq!(segment.start, expected_start, "gap or overlap in {sql:?}");
            assert!(segment.end > segment.start);
            expected_start = segment.end;
        }
        assert_eq!(expected_start, sql.len());
    }

    #[test]
    fn test_plain_statement_is_one_bare_segment() {
        assert_eq!(
            kinds("SELECT id FROM users", Dialect::Standard),
            vec![(SegmentKind::Bare, "SELECT id FROM users")]
        );
    }

    #[test]
    fn test_string_and_comments() {
        let sql = "SELECT 'a?' /* :x */ FROM t -- ?\nWHERE 1";
        assert_eq!(
            kinds(sql, Dialect::Standard),
            vec![
                (SegmentKind::Bare, "SELECT "),
                (SegmentKind::Literal, "'a?'"),
                (SegmentKind::Bare, " "),
                (SegmentKind::Comment, "/* :x */"),
                (SegmentKind::Bare, " FROM t "),
                (SegmentKind::Comment, "-- ?"),
                (SegmentKind::Bare, "\nWHERE 1"),
            ]
        );
    }

    #[test]
    fn test_doubled_quote_does_not_terminate() {
        let sql = "SELECT 'it''s ?' , ?";
        assert_eq!(
            kinds(sql, Dialect::Standard),
            vec![
                (SegmentKind::Bare, "SELECT "),
                (SegmentKind::Literal, "'it''s ?'"),
                (SegmentKind::Bare, " , ?"),
            ]
        );
    }

    #[test]
    fn test_backslash_escape_only_in_mysql() {
        let sql = r"SELECT 'a\' ?' x";
        assert_eq!(
            kinds(sql, Dialect::MySql),
            vec![
                (SegmentKind::Bare, "SELECT "),
                (SegmentKind::Literal, r"'a\' ?'"),
                (SegmentKind::Bare, " x"),
            ]
        );
        // Standard SQL closes the literal at the second quote.
        assert_eq!(kinds(sql, Dialect::Standard)[1], (SegmentKind::Literal, r"'a\'"));
    }

    #[test]
    fn test_hash_comment_only_in_mysql() {
        let sql = "SELECT 1 # note ?\n";
        assert_eq!(kinds(sql, Dialect::MySql)[1], (SegmentKind::Comment, "# note ?"));
        assert_eq!(kinds(sql, Dialect::Standard).len(), 1);
    }

    #[test]
    fn test_unterminated_literal_runs_to_end() {
        let sql = "SELECT 'oops";
        assert_eq!(
            kinds(sql, Dialect::Standard),
            vec![(SegmentKind::Bare, "SELECT "), (SegmentKind::Literal, "'oops")]
        );
        assert_partition("SELECT /* never closed", Dialect::Standard);
        assert_partition(r"SELECT 'trailing\", Dialect::MySql);
    }

    #[test]
    fn test_partition_holds_for_awkward_inputs() {
        for sql in [
            "",
            "'",
            "--",
            "/*/",
            "\"a\"\"b\"",
            "`x`` y` ?",
            "SELECT 'é?' FROM \"tàble\" -- ünïcode",
            "a'b\"c`d/*e--f*/g",
        ] {
            assert_partition(sql, Dialect::Standard);
            assert_partition(sql, Dialect::MySql);
        }
    }

    #[test]
    fn test_masked_blanks_comments_only() {
        let text = SqlText::new("DELETE /* WHERE */ FROM t -- WHERE", Dialect::Standard);
        let masked = text.masked();
        assert_eq!(masked.len(), text.as_str().len());
        assert!(!masked.contains("WHERE"));
        assert!(masked.starts_with("DELETE "));
    }
}
