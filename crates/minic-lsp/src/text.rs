//! Plain-text helpers shared by quick fixes and deferred commands
//!
//! Positions use byte columns, the same as published diagnostics.

use minic_core::lexer::tokenize;
use minic_core::span::{LineCol, LineIndex, Span};
use minic_core::token::TokenKind;
use std::collections::HashSet;
use tower_lsp::lsp_types::{Position, Range};

pub fn offset_to_position(index: &LineIndex, offset: usize) -> Position {
    let LineCol { line, col } = index.line_col(offset);
    Position {
        line,
        character: col,
    }
}

pub fn position_to_offset(index: &LineIndex, position: Position) -> Option<usize> {
    index.offset(LineCol {
        line: position.line,
        col: position.character,
    })
}

pub fn span_to_range(index: &LineIndex, span: Span) -> Range {
    Range {
        start: offset_to_position(index, span.start),
        end: offset_to_position(index, span.end),
    }
}

pub fn range_to_span(index: &LineIndex, range: Range) -> Option<Span> {
    let start = position_to_offset(index, range.start)?;
    let end = position_to_offset(index, range.end)?;
    Some(Span::new(start, end.max(start)))
}

/// Byte span covering every line the range touches, newlines excluded
pub fn lines_span(index: &LineIndex, range: Range) -> Option<Span> {
    let first = index.line_span(range.start.line)?;
    let last = index.line_span(range.end.line.max(range.start.line))?;
    Some(first.merge(last))
}

/// Indentation of a line
pub fn line_indent(line: &str) -> &str {
    let indent_len = line.len() - line.trim_start().len();
    &line[..indent_len]
}

/// Text within a range
pub fn extract_text_in_range<'t>(text: &'t str, index: &LineIndex, range: Range) -> &'t str {
    range_to_span(index, range)
        .and_then(|span| text.get(span.start..span.end))
        .unwrap_or_default()
}

/// Offset of the bracket closing the one at `open`.
///
/// String/char literals and comments are skipped.
pub fn find_matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let open_byte = *bytes.get(open)?;
    let close_byte = match open_byte {
        b'(' => b')',
        b'[' => b']',
        b'{' => b'}',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_quoted(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') || bytes.get(i + 1) == Some(&b'*') => {
                i = skip_comment(bytes, i);
                continue;
            }
            b if b == open_byte => depth += 1,
            b if b == close_byte => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    let block = bytes.get(start + 1) == Some(&b'*');
    let mut i = start + 2;
    while i < bytes.len() {
        if block && bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
            return i + 2;
        }
        if !block && bytes[i] == b'\n' {
            return i;
        }
        i += 1;
    }
    bytes.len()
}

/// Top-level comma-separated items between a bracket pair, trimmed
pub fn split_top_level(text: &str, open: usize, close: usize) -> Vec<Span> {
    let bytes = text.as_bytes();
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut item_start = open + 1;
    let mut i = open + 1;

    while i < close {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_quoted(bytes, i);
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                items.push(Span::new(item_start, i));
                item_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    items.push(Span::new(item_start, close));

    let trimmed: Vec<Span> = items
        .into_iter()
        .filter_map(|span| trim_span(text, span))
        .collect();
    trimmed
}

fn trim_span(text: &str, span: Span) -> Option<Span> {
    let slice = text.get(span.start..span.end)?;
    let leading = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    let start = span.start + leading;
    Some(Span::new(start, start + trimmed.len()))
}

/// Pad with `0` or truncate the items between a bracket pair.
///
/// Returns the span between the brackets and its replacement, or `None` when
/// the count already matches.
pub fn rewrite_items(text: &str, open: usize, close: usize, expected: usize) -> Option<(Span, String)> {
    let items = split_top_level(text, open, close);
    if items.len() == expected {
        return None;
    }

    let mut kept: Vec<&str> = items
        .iter()
        .take(expected)
        .filter_map(|span| text.get(span.start..span.end))
        .collect();
    while kept.len() < expected {
        kept.push("0");
    }

    Some((Span::new(open + 1, close), kept.join(", ")))
}

/// Default value literal for a MiniC type name
pub fn typed_default(ty: &str) -> Option<&'static str> {
    match ty {
        "int" => Some("0"),
        "float" => Some("0.0"),
        "char" => Some("'\\0'"),
        _ => None,
    }
}

/// Levenshtein distance over chars
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Identifier lexemes appearing anywhere in the text
pub fn identifiers(text: &str) -> HashSet<String> {
    let (tokens, _) = tokenize(text);
    tokens
        .into_iter()
        .filter(|token| token.kind == TokenKind::Identifier)
        .map(|token| token.lexeme)
        .collect()
}

/// `base_2`, `base_3`, ... whichever is first unused in the text
pub fn fresh_name(text: &str, base: &str) -> String {
    let taken = identifiers(text);
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| format!("{}_new", base))
}

pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
