//! Named placeholder handling.
//!
//! Statements reference parameters as `:name`. Before execution the names are
//! rewritten into PostgreSQL positional placeholders (`$1`, `$2`, ...) and the
//! values are collected in matching order, so the driver binds them natively.
//! Text inside string literals (including `E'...'` escape strings), quoted
//! identifiers, comments and dollar-quoted bodies is left alone, as are `::`
//! casts and `:=`.

use std::collections::HashMap;

use crate::error::{PgPatternsError, Result};
use crate::types::{Params, SqlValue};

#[derive(Debug, Clone, Copy)]
enum ScanState {
    Normal,
    SingleQuote,
    /// `E'...'` literal, where a backslash escapes the next byte.
    EscapeString,
    DoubleQuote,
    LineComment,
    BlockComment,
    DollarQuote { tag_start: usize, tag_len: usize },
}

/// Rewrites `:name` placeholders into `$n` and returns the values in positional order.
/// A name used several times maps to the same position.
pub(crate) fn bind_named(sql: &str, params: &Params) -> Result<(String, Vec<SqlValue>)> {
    let mut ordered: Vec<SqlValue> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    let rewritten = rewrite_placeholders(sql, |name| {
        let position = match positions.get(name) {
            Some(position) => *position,
            None => {
                let value = params
                    .get(name)
                    .ok_or_else(|| PgPatternsError::MissingParameter(name.to_string()))?;
                ordered.push(value.clone());
                positions.insert(name.to_string(), ordered.len());
                ordered.len()
            }
        };
        Ok(format!("${position}"))
    })?;

    Ok((rewritten, ordered))
}

/// Renders a statement with its parameters substituted as SQL literals, for logging.
/// Placeholders without a value are left as written.
pub(crate) fn render(sql: &str, params: Option<&Params>) -> String {
    let Some(params) = params else {
        return sql.to_string();
    };

    rewrite_placeholders(sql, |name| {
        Ok(params
            .get(name)
            .map(SqlValue::to_literal)
            .unwrap_or_else(|| format!(":{name}")))
    })
    .unwrap_or_else(|_| sql.to_string())
}

fn rewrite_placeholders<F>(sql: &str, mut replace: F) -> Result<String>
where
    F: FnMut(&str) -> Result<String>,
{
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut state = ScanState::Normal;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();
        match state {
            ScanState::Normal => match bytes[i] {
                b'\'' if starts_escape_string(bytes, i) => {
                    state = ScanState::EscapeString;
                    i += 1;
                }
                b'\'' => {
                    state = ScanState::SingleQuote;
                    i += 1;
                }
                b'"' => {
                    state = ScanState::DoubleQuote;
                    i += 1;
                }
                b'-' if next == Some(b'-') => {
                    state = ScanState::LineComment;
                    i += 2;
                }
                b'/' if next == Some(b'*') => {
                    state = ScanState::BlockComment;
                    i += 2;
                }
                b'$' => match dollar_tag_len(bytes, i) {
                    Some(tag_len) => {
                        state = ScanState::DollarQuote {
                            tag_start: i,
                            tag_len,
                        };
                        i += tag_len;
                    }
                    None => i += 1,
                },
                b':' => match next {
                    Some(b':') | Some(b'=') => i += 2,
                    Some(c) if is_ident_start(c) => {
                        let start = i + 1;
                        let mut end = start + 1;
                        while end < bytes.len() && is_ident_continue(bytes[end]) {
                            end += 1;
                        }
                        out.push_str(&sql[copied..i]);
                        out.push_str(&replace(&sql[start..end])?);
                        i = end;
                        copied = end;
                    }
                    _ => i += 1,
                },
                _ => i += 1,
            },
            ScanState::SingleQuote | ScanState::DoubleQuote => {
                let quote = if matches!(state, ScanState::SingleQuote) {
                    b'\''
                } else {
                    b'"'
                };
                if bytes[i] == quote {
                    if next == Some(quote) {
                        i += 2;
                    } else {
                        state = ScanState::Normal;
                        i += 1;
                    }
                } else {
                    i += 1;
                }
            }
            ScanState::EscapeString => match bytes[i] {
                b'\\' => i += 2,
                b'\'' if next == Some(b'\'') => i += 2,
                b'\'' => {
                    state = ScanState::Normal;
                    i += 1;
                }
                _ => i += 1,
            },
            ScanState::LineComment => {
                if bytes[i] == b'\n' {
                    state = ScanState::Normal;
                }
                i += 1;
            }
            ScanState::BlockComment => {
                if bytes[i] == b'*' && next == Some(b'/') {
                    state = ScanState::Normal;
                    i += 2;
                } else {
                    i += 1;
                }
            }
            ScanState::DollarQuote { tag_start, tag_len } => {
                let tag = &bytes[tag_start..tag_start + tag_len];
                if bytes[i..].starts_with(tag) {
                    state = ScanState::Normal;
                    i += tag_len;
                } else {
                    i += 1;
                }
            }
        }
    }

    out.push_str(&sql[copied..]);
    Ok(out)
}

/// True when the quote at `quote` opens an escape string: it directly follows a
/// lone `E` or `e`, not the tail of a longer identifier.
fn starts_escape_string(bytes: &[u8], quote: usize) -> bool {
    match quote.checked_sub(1).map(|prefix| (prefix, bytes[prefix])) {
        Some((prefix, b'E' | b'e')) => prefix == 0 || !is_ident_continue(bytes[prefix - 1]),
        _ => false,
    }
}

/// Length of a dollar-quote tag (`$$` or `$tag$`) starting at `start`.
fn dollar_tag_len(bytes: &[u8], start: usize) -> Option<usize> {
    let mut end = start + 1;
    if end < bytes.len() && bytes[end].is_ascii_digit() {
        // `$1` is a positional parameter, not a tag
        return None;
    }
    while end < bytes.len() && bytes[end] != b'$' {
        if !is_ident_continue(bytes[end]) {
            return None;
        }
        end += 1;
    }
    if end >= bytes.len() {
        return None;
    }
    Some(end - start + 1)
}

fn is_ident_start(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphabetic()
}

fn is_ident_continue(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}
