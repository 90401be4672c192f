//! Deferred repair commands
//!
//! A quick fix whose edit target is not local to the diagnostic range is sent
//! to the client as a named command. The client sends it back through
//! `workspace/executeCommand`, and the edit is computed then against the
//! document text current at that moment.

use crate::text::{
    extract_text_in_range, find_matching_close, line_indent, range_to_span, rewrite_items,
    split_top_level, typed_default,
};
use minic_core::span::{LineIndex, Span};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;
use tower_lsp::lsp_types::{Command, Range, TextEdit, Url};

pub const FIX_ARRAY_SIZE: &str = "fixArraySize";
pub const ADJUST_PARAMETERS: &str = "adjustParameters";
pub const ADD_RETURN_STATEMENT: &str = "addReturnStatement";
pub const EXTRACT_FUNCTION: &str = "extractFunction";
pub const GENERIC_FIX: &str = "genericFix";

/// Every command the server executes
pub const COMMANDS: [&str; 5] = [
    FIX_ARRAY_SIZE,
    ADJUST_PARAMETERS,
    ADD_RETURN_STATEMENT,
    EXTRACT_FUNCTION,
    GENERIC_FIX,
];

/// Name of the function created by `extractFunction`
const EXTRACTED_FUNCTION: &str = "extracted_function";

/// Command parsing and execution failures
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("command '{command}' is missing argument {index}")]
    MissingArgument { command: &'static str, index: usize },

    #[error("command '{command}' has an invalid argument {index}: {source}")]
    InvalidArgument {
        command: &'static str,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("no default value for return type '{0}'")]
    UnsupportedReturnType(String),

    #[error("range {0:?} is outside the document")]
    RangeOutsideDocument(Range),
}

/// A repair computed when executed, not when offered
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredCommand {
    FixArraySize {
        uri: Url,
        array_name: String,
        range: Range,
    },
    AdjustParameters {
        uri: Url,
        range: Range,
        expected_count: usize,
    },
    AddReturnStatement {
        uri: Url,
        range: Range,
        return_type: String,
    },
    ExtractFunction {
        uri: Url,
        range: Range,
    },
    GenericFix {
        uri: Url,
        range: Range,
    },
}

impl DeferredCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DeferredCommand::FixArraySize { .. } => FIX_ARRAY_SIZE,
            DeferredCommand::AdjustParameters { .. } => ADJUST_PARAMETERS,
            DeferredCommand::AddReturnStatement { .. } => ADD_RETURN_STATEMENT,
            DeferredCommand::ExtractFunction { .. } => EXTRACT_FUNCTION,
            DeferredCommand::GenericFix { .. } => GENERIC_FIX,
        }
    }

    pub fn uri(&self) -> &Url {
        match self {
            DeferredCommand::FixArraySize { uri, .. }
            | DeferredCommand::AdjustParameters { uri, .. }
            | DeferredCommand::AddReturnStatement { uri, .. }
            | DeferredCommand::ExtractFunction { uri, .. }
            | DeferredCommand::GenericFix { uri, .. } => uri,
        }
    }

    /// Positional arguments, in the order [`parse`](Self::parse) reads them
    pub fn arguments(&self) -> Result<Vec<Value>, serde_json::Error> {
        let uri = serde_json::to_value(self.uri().as_str())?;
        Ok(match self {
            DeferredCommand::FixArraySize {
                array_name, range, ..
            } => vec![uri, serde_json::to_value(array_name)?, serde_json::to_value(range)?],
            DeferredCommand::AdjustParameters {
                range,
                expected_count,
                ..
            } => vec![uri, serde_json::to_value(range)?, serde_json::to_value(expected_count)?],
            DeferredCommand::AddReturnStatement {
                range, return_type, ..
            } => vec![uri, serde_json::to_value(range)?, serde_json::to_value(return_type)?],
            DeferredCommand::ExtractFunction { range, .. }
            | DeferredCommand::GenericFix { range, .. } => {
                vec![uri, serde_json::to_value(range)?]
            }
        })
    }

    /// LSP command carrying this repair
    pub fn to_command(&self, title: impl Into<String>) -> Result<Command, serde_json::Error> {
        Ok(Command {
            title: title.into(),
            command: self.name().to_string(),
            arguments: Some(self.arguments()?),
        })
    }

    /// Rebuild a command from its name and positional arguments
    pub fn parse(command: &str, arguments: &[Value]) -> Result<Self, CommandError> {
        let args = Arguments {
            command: match COMMANDS.iter().find(|name| **name == command) {
                Some(name) => *name,
                None => return Err(CommandError::UnknownCommand(command.to_string())),
            },
            values: arguments,
        };

        Ok(match args.command {
            FIX_ARRAY_SIZE => DeferredCommand::FixArraySize {
                uri: args.get(0)?,
                array_name: args.get(1)?,
                range: args.get(2)?,
            },
            ADJUST_PARAMETERS => DeferredCommand::AdjustParameters {
                uri: args.get(0)?,
                range: args.get(1)?,
                expected_count: args.get(2)?,
            },
            ADD_RETURN_STATEMENT => DeferredCommand::AddReturnStatement {
                uri: args.get(0)?,
                range: args.get(1)?,
                return_type: args.get(2)?,
            },
            EXTRACT_FUNCTION => DeferredCommand::ExtractFunction {
                uri: args.get(0)?,
                range: args.get(1)?,
            },
            _ => DeferredCommand::GenericFix {
                uri: args.get(0)?,
                range: args.get(1)?,
            },
        })
    }

    /// Compute the edits against the current document text.
    ///
    /// An empty result means there is nothing to change.
    pub fn execute(&self, text: &str) -> Result<Vec<TextEdit>, CommandError> {
        let index = LineIndex::new(text);
        let edits = match self {
            DeferredCommand::FixArraySize {
                array_name, range, ..
            } => {
                let start = self.start_offset(&index, *range)?;
                array_size_edit(text, start, array_name)
                    .map(|(span, size)| vec![edit(&index, span, size.to_string())])
            }
            DeferredCommand::AdjustParameters {
                range,
                expected_count,
                ..
            } => {
                let span = range_to_span(&index, *range)
                    .ok_or(CommandError::RangeOutsideDocument(*range))?;
                call_arguments_edit(text, span, *expected_count)
                    .map(|(span, new_text)| vec![edit(&index, span, new_text)])
            }
            DeferredCommand::AddReturnStatement {
                range, return_type, ..
            } => {
                let default = typed_default(return_type)
                    .ok_or_else(|| CommandError::UnsupportedReturnType(return_type.clone()))?;
                let start = self.start_offset(&index, *range)?;
                return_statement_edit(text, &index, start, default)
                    .map(|(offset, new_text)| vec![edit(&index, Span::point(offset), new_text)])
            }
            DeferredCommand::ExtractFunction { range, .. } => {
                extract_function_edits(text, &index, *range)
            }
            DeferredCommand::GenericFix { range, .. } => {
                generic_fix_edit(text, &index, *range).map(|offset| {
                    vec![edit(&index, Span::point(offset), ";".to_string())]
                })
            }
        };

        tracing::debug!(command = self.name(), applied = edits.is_some(), "executed command");
        Ok(edits.unwrap_or_default())
    }

    fn start_offset(&self, index: &LineIndex, range: Range) -> Result<usize, CommandError> {
        range_to_span(index, range)
            .map(|span| span.start)
            .ok_or(CommandError::RangeOutsideDocument(range))
    }
}

struct Arguments<'a> {
    command: &'static str,
    values: &'a [Value],
}

impl Arguments<'_> {
    fn get<T: serde::de::DeserializeOwned>(&self, index: usize) -> Result<T, CommandError> {
        let value = self.values.get(index).ok_or(CommandError::MissingArgument {
            command: self.command,
            index,
        })?;
        serde_json::from_value(value.clone()).map_err(|source| CommandError::InvalidArgument {
            command: self.command,
            index,
            source,
        })
    }
}

fn edit(index: &LineIndex, span: Span, new_text: String) -> TextEdit {
    TextEdit {
        range: crate::text::span_to_range(index, span),
        new_text,
    }
}

/// Location of `name[...]... = {...}` in the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayDeclarator {
    /// Between the first dimension's brackets
    pub first_dim: Span,
    pub list_open: usize,
    pub list_close: usize,
}

impl ArrayDeclarator {
    /// Top-level initializer elements
    pub fn element_count(&self, text: &str) -> usize {
        split_top_level(text, self.list_open, self.list_close).len()
    }
}

/// First array declarator named `name` at or after `from` with a list
/// initializer
pub fn find_array_declarator(text: &str, from: usize, name: &str) -> Option<ArrayDeclarator> {
    let tail = text.get(from..)?;
    let pattern = Regex::new(&format!(r"\b{}\s*\[", regex::escape(name))).ok()?;
    let found = pattern.find(tail)?;

    let open = from + found.end() - 1;
    let close = find_matching_close(text, open)?;

    let mut after = close + 1;
    // Skip further dimensions
    while let Some(next) = text.get(after..)?.trim_start().strip_prefix('[') {
        let next_open = text.len() - next.len() - 1;
        after = find_matching_close(text, next_open)? + 1;
    }

    let rest = text.get(after..)?.trim_start().strip_prefix('=')?.trim_start();
    if !rest.starts_with('{') {
        return None;
    }
    let list_open = text.len() - rest.len();
    let list_close = find_matching_close(text, list_open)?;

    Some(ArrayDeclarator {
        first_dim: Span::new(open + 1, close),
        list_open,
        list_close,
    })
}

/// First-dimension span of the array declarator with the number of
/// initializer elements
pub fn array_size_edit(text: &str, from: usize, name: &str) -> Option<(Span, usize)> {
    let declarator = find_array_declarator(text, from, name)?;
    Some((declarator.first_dim, declarator.element_count(text)))
}

/// Opening parenthesis of the first call starting inside `span`
pub fn find_call_open(text: &str, span: Span) -> Option<usize> {
    const NOT_CALLS: [&str; 4] = ["if", "while", "return", "sizeof"];

    let tail = text.get(span.start..)?;
    call_pattern()?
        .captures_iter(tail)
        .filter_map(|caps| Some((caps.get(0)?, caps.get(1)?)))
        .take_while(|(whole, _)| span.start + whole.start() <= span.end)
        .find(|(_, name)| !NOT_CALLS.contains(&name.as_str()))
        .map(|(whole, _)| span.start + whole.end() - 1)
}

fn call_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").ok())
        .as_ref()
}

/// Argument list rewrite for the first call starting inside `span`
pub fn call_arguments_edit(text: &str, span: Span, expected: usize) -> Option<(Span, String)> {
    let open = find_call_open(text, span)?;
    let close = find_matching_close(text, open)?;
    rewrite_items(text, open, close, expected)
}

/// Insertion point and text for `return <default>;` before the closing brace
/// of the function body that starts at or after `from`
pub fn return_statement_edit(
    text: &str,
    index: &LineIndex,
    from: usize,
    default: &str,
) -> Option<(usize, String)> {
    let open = from + text.get(from..)?.find('{')?;
    let close = find_matching_close(text, open)?;

    let close_line = index.line_col(close).line;
    let line_span = index.line_span(close_line)?;
    let line = text.get(line_span.start..line_span.end)?;
    let indent = line_indent(line);
    let statement = format!("{}    return {};", indent, default);

    if line_span.start + indent.len() == close {
        // The brace opens its own line
        Some((line_span.start, format!("{}\n", statement)))
    } else {
        Some((close, format!("\n{}\n{}", statement, indent)))
    }
}

fn extract_function_edits(text: &str, index: &LineIndex, range: Range) -> Option<Vec<TextEdit>> {
    if range.start.line != range.end.line {
        return None;
    }
    let selection = range_to_span(index, range)?;
    let selected = extract_text_in_range(text, index, range).trim();
    if selected.is_empty() {
        return None;
    }

    let function_end = enclosing_function_end(text, selection.start)?;

    let is_statement = selected.ends_with(';') || selected.ends_with('}');
    let body = if is_statement {
        selected.to_string()
    } else {
        format!("{};", selected)
    };
    let call = if selected.ends_with(';') {
        format!("{}();", EXTRACTED_FUNCTION)
    } else {
        format!("{}()", EXTRACTED_FUNCTION)
    };
    let function = format!("\n\nvoid {}() {{\n    {}\n}}", EXTRACTED_FUNCTION, body);

    Some(vec![
        edit(index, selection, call),
        edit(index, Span::point(function_end + 1), function),
    ])
}

/// Offset of the top-level `}` closing the function around `offset`
fn enclosing_function_end(text: &str, offset: usize) -> Option<usize> {
    let mut open = None;
    let mut i = 0;
    while i < offset {
        let Some(next) = text.get(i..offset)?.find('{') else {
            break;
        };
        let candidate = i + next;
        let close = find_matching_close(text, candidate)?;
        if close >= offset {
            open = Some(candidate);
            break;
        }
        i = close + 1;
    }
    find_matching_close(text, open?)
}

/// Offset at which a missing `;` belongs on the range's first line
fn generic_fix_edit(text: &str, index: &LineIndex, range: Range) -> Option<usize> {
    let line_span = index.line_span(range.start.line)?;
    let line = text.get(line_span.start..line_span.end)?;
    let content = line.trim_end();
    if content.trim().is_empty() || content.ends_with([';', '{', '}']) {
        return None;
    }
    Some(line_span.start + content.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::span_to_range;
    use pretty_assertions::assert_eq;

    fn uri() -> Url {
        Url::parse("file:///main.c").unwrap()
    }

    fn apply(text: &str, edits: &[TextEdit]) -> String {
        let index = LineIndex::new(text);
        let mut spans: Vec<(Span, &str)> = edits
            .iter()
            .map(|e| (range_to_span(&index, e.range).unwrap(), e.new_text.as_str()))
            .collect();
        spans.sort_by_key(|(span, _)| std::cmp::Reverse(span.start));
        let mut out = text.to_string();
        for (span, new_text) in spans {
            out.replace_range(span.start..span.end, new_text);
        }
        out
    }

    fn range_of(text: &str, needle: &str) -> Range {
        let start = text.find(needle).unwrap();
        span_to_range(&LineIndex::new(text), Span::new(start, start + needle.len()))
    }

    #[test]
    fn test_add_return_statement_before_closing_brace() {
        let text = "int f() {\n    int x = 1;\n}\n";
        let command = DeferredCommand::AddReturnStatement {
            uri: uri(),
            range: range_of(text, "f"),
            return_type: "int".to_string(),
        };
        let edits = command.execute(text).unwrap();
        assert_eq!(apply(text, &edits), "int f() {\n    int x = 1;\n    return 0;\n}\n");
    }

    #[test]
    fn test_add_return_statement_single_line_body() {
        let text = "int f() { int x = 1; }";
        let command = DeferredCommand::AddReturnStatement {
            uri: uri(),
            range: range_of(text, "f"),
            return_type: "float".to_string(),
        };
        let fixed = apply(text, &command.execute(text).unwrap());
        assert_eq!(fixed, "int f() { int x = 1; \n    return 0.0;\n}");
        assert!(fixed.trim_end_matches('}').trim_end().ends_with("return 0.0;"));
    }

    #[test]
    fn test_add_return_statement_rejects_void() {
        let command = DeferredCommand::AddReturnStatement {
            uri: uri(),
            range: Range::default(),
            return_type: "void".to_string(),
        };
        assert!(matches!(
            command.execute("void f() {}"),
            Err(CommandError::UnsupportedReturnType(_))
        ));
    }

    #[test]
    fn test_fix_array_size_counts_multiline_initializer() {
        let text = "int arr[3] = {\n    1, 2,\n    3, 4, 5\n};\n";
        let command = DeferredCommand::FixArraySize {
            uri: uri(),
            array_name: "arr".to_string(),
            range: range_of(text, "arr"),
        };
        let fixed = apply(text, &command.execute(text).unwrap());
        assert!(fixed.starts_with("int arr[5] = {"));
    }

    #[test]
    fn test_fix_array_size_nested_lists() {
        let text = "int m[1][2] = {{1, 2}, {3, 4}};";
        let command = DeferredCommand::FixArraySize {
            uri: uri(),
            array_name: "m".to_string(),
            range: range_of(text, "m"),
        };
        assert_eq!(
            apply(text, &command.execute(text).unwrap()),
            "int m[2][2] = {{1, 2}, {3, 4}};"
        );
    }

    #[test]
    fn test_adjust_parameters_spanning_lines() {
        let text = "int main() {\n    return foo(1,\n               2);\n}";
        let command = DeferredCommand::AdjustParameters {
            uri: uri(),
            range: range_of(text, "foo(1,"),
            expected_count: 3,
        };
        assert_eq!(
            apply(text, &command.execute(text).unwrap()),
            "int main() {\n    return foo(1, 2, 0);\n}"
        );
    }

    #[test]
    fn test_find_call_open_skips_keywords() {
        let text = "    return if_ok(x) + g(1);";
        let span = Span::new(4, text.len());
        assert_eq!(find_call_open(text, span), Some(text.find("(x)").unwrap()));

        let keyword_only = "    while (x) { }";
        assert_eq!(find_call_open(keyword_only, Span::new(4, keyword_only.len())), None);
    }

    #[test]
    fn test_extract_function() {
        let text = "int main() {\n    printf(\"hi\");\n    return 0;\n}\n";
        let command = DeferredCommand::ExtractFunction {
            uri: uri(),
            range: range_of(text, "printf(\"hi\");"),
        };
        assert_eq!(
            apply(text, &command.execute(text).unwrap()),
            "int main() {\n    extracted_function();\n    return 0;\n}\n\nvoid extracted_function() {\n    printf(\"hi\");\n}\n"
        );
    }

    #[test]
    fn test_generic_fix_appends_semicolon() {
        let text = "int main() {\n    int x = 1\n    return x;\n}";
        let command = DeferredCommand::GenericFix {
            uri: uri(),
            range: range_of(text, "int x"),
        };
        assert_eq!(
            apply(text, &command.execute(text).unwrap()),
            "int main() {\n    int x = 1;\n    return x;\n}"
        );

        let complete = DeferredCommand::GenericFix {
            uri: uri(),
            range: range_of(text, "return"),
        };
        assert!(complete.execute(text).unwrap().is_empty());
    }

    #[test]
    fn test_arguments_round_trip_through_parse() {
        let command = DeferredCommand::AdjustParameters {
            uri: uri(),
            range: Range::default(),
            expected_count: 2,
        };
        let lsp = command.to_command("Adjust").unwrap();
        let parsed = DeferredCommand::parse(&lsp.command, &lsp.arguments.unwrap()).unwrap();
        assert_eq!(parsed, command);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            DeferredCommand::parse("explode", &[]),
            Err(CommandError::UnknownCommand(_))
        ));
        assert!(matches!(
            DeferredCommand::parse(GENERIC_FIX, &[Value::from("file:///a.c")]),
            Err(CommandError::MissingArgument { index: 1, .. })
        ));
        assert!(matches!(
            DeferredCommand::parse(GENERIC_FIX, &[Value::from("not a uri"), Value::Null]),
            Err(CommandError::InvalidArgument { index: 0, .. })
        ));
    }
}
