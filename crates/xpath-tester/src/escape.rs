//! Quoted display form of text results.
//!
//! Only backslash, CR, LF and the double quote are escaped; everything else,
//! including non-ASCII and other control characters, is copied through.

use thiserror::Error;

/// Wraps `text` in double quotes with `\\`, `\r`, `\n` and `\"` escaped.
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnescapeError {
    #[error("literal is not wrapped in double quotes")]
    Unquoted,
    #[error("unknown escape sequence `\\{0}`")]
    UnknownEscape(char),
    #[error("literal ends inside an escape sequence")]
    Truncated,
    #[error("unescaped double quote inside literal")]
    StrayQuote,
}

/// Inverse of [`escape_string`].
pub fn unescape(literal: &str) -> Result<String, UnescapeError> {
    let inner = literal
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or(UnescapeError::Unquoted)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('\\') => out.push('\\'),
                Some('r') => out.push('\r'),
                Some('n') => out.push('\n'),
                Some('"') => out.push('"'),
                Some(other) => return Err(UnescapeError::UnknownEscape(other)),
                None => return Err(UnescapeError::Truncated),
            },
            '"' => return Err(UnescapeError::StrayQuote),
            other => out.push(other),
        }
    }
    Ok(out)
}
