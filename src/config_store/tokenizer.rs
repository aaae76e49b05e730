use std::sync::OnceLock;

use regex::Regex;

/// One structural record of a settings document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A `[Section]` header line.
    Section(String),
    /// A `key=value //comment` line.
    Entry(Entry),
}

/// A key/value/comment triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// On-disk key, dots denote nesting (e.g. `WebApp.Port`)
    pub key: String,
    /// Raw value token, quotes and braces included
    pub value: Option<String>,
    /// Trailing comment text after the `//` or `#` introducer
    pub comment: Option<String>,
}

#[allow(clippy::expect_used)]
fn section_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\[([A-Za-z0-9 ]+)\]").expect("literal pattern"))
}

#[allow(clippy::expect_used)]
fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([^=/#\s]+)[ \t]*=[ \t]*").expect("literal pattern"))
}

/// Splits settings text into sections and entries in document order.
///
/// Parsing is lenient: lines that match neither form are skipped. Brace
/// delimited values may span several lines.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let (token, consumed) = next_record(&text[pos..]);
        if let Some(token) = token {
            tokens.push(token);
        }
        pos += consumed.max(1);
    }

    tokens
}

/// Reads one record from the start of `input`, returning it together with
/// the number of bytes consumed.
fn next_record(input: &str) -> (Option<Token>, usize) {
    let first_end = line_end(input, 0);
    let line = &input[..first_end];
    let indent = line.len() - line.trim_start_matches([' ', '\t', '\r']).len();
    let trimmed = &line[indent..];

    if is_comment_start(trimmed) {
        return (None, first_end);
    }

    if let Some(caps) = section_pattern().captures(trimmed) {
        return (Some(Token::Section(caps[1].to_string())), first_end);
    }

    let Some(caps) = key_pattern().captures(trimmed) else {
        return (None, first_end);
    };
    let key = caps[1].to_string();
    let value_start = indent + caps.get(0).map_or(0, |m| m.end());

    let value_len = scan_value(&input[value_start..]);
    let value = (value_len > 0).then(|| input[value_start..value_start + value_len].to_string());

    let tail_start = value_start + value_len;
    let record_end = line_end(input, tail_start);
    let comment = scan_comment(&input[tail_start..record_end]);

    (Some(Token::Entry(Entry { key, value, comment })), record_end)
}

fn line_end(input: &str, from: usize) -> usize {
    input[from..].find('\n').map_or(input.len(), |i| from + i + 1)
}

fn is_comment_start(text: &str) -> bool {
    text.starts_with("//") || text.starts_with('#')
}

/// Length in bytes of the value token at the start of `input`, zero if none.
fn scan_value(input: &str) -> usize {
    if input.is_empty() || is_comment_start(input) {
        return 0;
    }

    match input.as_bytes()[0] {
        b'"' => scan_quoted(input).unwrap_or_else(|| scan_bare(input)),
        b'{' => scan_braced(input).unwrap_or_else(|| scan_bare(input)),
        _ => scan_bare(input),
    }
}

/// A quoted string runs to the last quote on the line and holds at least one character.
fn scan_quoted(input: &str) -> Option<usize> {
    let line = &input[..input.find('\n').unwrap_or(input.len())];
    let last = line.rfind('"')?;
    (last >= 2).then_some(last + 1)
}

/// Balanced braces, ignoring braces inside JSON string literals.
fn scan_braced(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

fn scan_bare(input: &str) -> usize {
    input.find(char::is_whitespace).unwrap_or(input.len())
}

fn scan_comment(tail: &str) -> Option<String> {
    let tail = tail.trim_start_matches([' ', '\t']);
    let body = tail
        .strip_prefix("//")
        .or_else(|| tail.strip_prefix('#'))?
        .trim_end_matches(['\n', '\r']);

    (!body.is_empty()).then(|| body.to_string())
}

/// Maps an on-disk key to the field name used by the schema.
pub fn key_to_field(key: &str) -> String {
    key.replace('.', "_")
}

/// Maps a schema field name to its on-disk key.
pub fn field_to_key(field: &str) -> String {
    field.replace('_', ".")
}
