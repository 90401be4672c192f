//! What a resolver knows about the diagnostic it repairs

use crate::text::{lines_span, range_to_span};
use minic_core::span::{LineIndex, Span};
use minic_core::DiagnosticData;
use regex::Regex;
use std::sync::OnceLock;
use tower_lsp::lsp_types::{Diagnostic, NumberOrString, Url};

pub struct FixContext<'a> {
    pub uri: &'a Url,
    pub text: &'a str,
    pub index: &'a LineIndex,
    pub diagnostic: &'a Diagnostic,
    /// Structured payload carried in `Diagnostic::data`
    pub data: Option<DiagnosticData>,
}

impl<'a> FixContext<'a> {
    pub fn new(uri: &'a Url, text: &'a str, index: &'a LineIndex, diagnostic: &'a Diagnostic) -> Self {
        let data = diagnostic
            .data
            .clone()
            .and_then(|value| serde_json::from_value(value).ok());
        Self {
            uri,
            text,
            index,
            diagnostic,
            data,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self.diagnostic.code.as_ref()? {
            NumberOrString::String(code) => Some(code),
            NumberOrString::Number(_) => None,
        }
    }

    /// Message without the enrichment appended after a blank line
    pub fn headline(&self) -> &str {
        let message = self.diagnostic.message.as_str();
        message.split("\n\n").next().unwrap_or(message)
    }

    /// Byte span of the diagnostic range
    pub fn span(&self) -> Option<Span> {
        range_to_span(self.index, self.diagnostic.range)
    }

    /// Every line the diagnostic range touches, newlines excluded
    pub fn lines(&self) -> Option<Span> {
        lines_span(self.index, self.diagnostic.range)
    }

    pub fn slice(&self, span: Span) -> Option<&'a str> {
        self.text.get(span.start..span.end)
    }

    /// Text inside the diagnostic range
    pub fn range_text(&self) -> Option<&'a str> {
        self.slice(self.span()?)
    }

    pub fn variable_name(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|d| d.variable_name.clone())
            .or_else(|| self.quoted_name())
    }

    pub fn function_name(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|d| d.function_name.clone())
            .or_else(|| self.quoted_name())
    }

    pub fn array_name(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|d| d.array_name.clone())
            .or_else(|| self.quoted_name())
    }

    /// Declared and actual array sizes
    pub fn array_sizes(&self) -> Option<(usize, usize)> {
        let from_data = self
            .data
            .as_ref()
            .and_then(|d| Some((d.declared_size?, d.actual_size?)));
        from_data.or_else(|| self.number_pair(size_pattern()))
    }

    /// Expected and actual argument counts
    pub fn argument_counts(&self) -> Option<(usize, usize)> {
        let from_data = self
            .data
            .as_ref()
            .and_then(|d| Some((d.expected_count?, d.actual_count?)));
        from_data.or_else(|| self.number_pair(arity_pattern()))
    }

    pub fn return_type(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|d| d.return_type.clone())
            .or_else(|| self.quoted_names().into_iter().nth(1))
    }

    // Fallback: diagnostics without a payload still carry names and counts in
    // their message text.

    fn quoted_name(&self) -> Option<String> {
        self.quoted_names().into_iter().next()
    }

    fn quoted_names(&self) -> Vec<String> {
        let Some(pattern) = quoted_pattern() else {
            return Vec::new();
        };
        pattern
            .captures_iter(self.headline())
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// The two counts captured by a message-shape pattern
    fn number_pair(&self, pattern: Option<&Regex>) -> Option<(usize, usize)> {
        let caps = pattern?.captures(self.headline())?;
        let first = caps.get(1)?.as_str().parse().ok()?;
        let second = caps.get(2)?.as_str().parse().ok()?;
        Some((first, second))
    }
}

fn quoted_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"'([^']*)'").ok()).as_ref()
}

fn size_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"declared with size (\d+) but initialized with (\d+)").ok())
        .as_ref()
}

fn arity_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"expects (\d+) arguments? but got (\d+)").ok())
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn context_for(message: &str, data: Option<serde_json::Value>, f: impl FnOnce(&FixContext<'_>)) {
        let uri = Url::parse("file:///t.c").unwrap();
        let index = LineIndex::new("");
        let diagnostic = Diagnostic {
            message: message.to_string(),
            data,
            ..Default::default()
        };
        f(&FixContext::new(&uri, "", &index, &diagnostic));
    }

    #[test]
    fn test_payload_wins_over_message() {
        context_for(
            "Undefined variable 'shown'",
            Some(serde_json::json!({ "variableName": "real" })),
            |ctx| assert_eq!(ctx.variable_name().as_deref(), Some("real")),
        );
    }

    #[rstest]
    #[case("Function 'foo' expects 3 arguments but got 2", Some((3, 2)))]
    #[case("Function 'foo' expects 3 arguments", None)]
    #[case("Function 'f1' expects 3 arguments but got 2", Some((3, 2)))]
    #[case("Function 'p2p' expects 1 argument but got 0", Some((1, 0)))]
    fn test_counts_from_message(#[case] message: &str, #[case] expected: Option<(usize, usize)>) {
        context_for(message, None, |ctx| assert_eq!(ctx.argument_counts(), expected));
    }

    #[test]
    fn test_headline_drops_enrichment() {
        context_for(
            "Array 'arr' declared with size 3 but initialized with 5 elements\n\nExplanation: ...",
            None,
            |ctx| {
                assert_eq!(ctx.array_name().as_deref(), Some("arr"));
                assert_eq!(ctx.array_sizes(), Some((3, 5)));
            },
        );
    }

    #[test]
    fn test_digits_in_names_do_not_leak_into_sizes() {
        context_for(
            "Array 'buf2' declared with size 3 but initialized with 5 elements",
            None,
            |ctx| {
                assert_eq!(ctx.array_name().as_deref(), Some("buf2"));
                assert_eq!(ctx.array_sizes(), Some((3, 5)));
            },
        );
    }

    #[test]
    fn test_return_type_fallback() {
        context_for(
            "Function 'f' with return type 'float' is missing a return statement",
            None,
            |ctx| assert_eq!(ctx.return_type().as_deref(), Some("float")),
        );
    }
}
