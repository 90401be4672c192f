//! Diagnostic system for errors and warnings
//!
//! Every problem the front end or the validators find flows through the
//! unified [`Diagnostic`] type. Validators attach a structured
//! [`DiagnosticData`] payload so that quick fixes never have to re-parse the
//! human-readable message.

pub mod enrichment;
pub mod error_codes;
pub mod formatter;

use crate::span::{LineIndex, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic schema version
pub const DIAG_VERSION: u32 = 1;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Hint,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Hint => write!(f, "hint"),
        }
    }
}

/// Broad error category shown to learners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Variable,
    Function,
    Array,
    Type,
    Control,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Category::Variable => "VARIABLE",
            Category::Function => "FUNCTION",
            Category::Array => "ARRAY",
            Category::Type => "TYPE",
            Category::Control => "CONTROL",
            Category::Other => "OTHER",
        };
        f.write_str(text)
    }
}

/// Machine-readable payload attached by validators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticData {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub variable_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub function_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub array_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expected_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub actual_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub declared_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub actual_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub return_type: Option<String>,
}

impl DiagnosticData {
    pub fn variable(name: impl Into<String>) -> Self {
        Self {
            variable_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self {
            function_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn array_size(name: impl Into<String>, declared: usize, actual: usize) -> Self {
        Self {
            array_name: Some(name.into()),
            declared_size: Some(declared),
            actual_size: Some(actual),
            ..Self::default()
        }
    }

    pub fn arity(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self {
            function_name: Some(name.into()),
            expected_count: Some(expected),
            actual_count: Some(actual),
            ..Self::default()
        }
    }

    pub fn with_return_type(mut self, ty: impl Into<String>) -> Self {
        self.return_type = Some(ty.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A diagnostic message (error, warning or hint)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub diag_version: u32,
    pub level: DiagnosticLevel,
    /// Stable code (e.g., "UNDEFINED_VARIABLE")
    pub code: String,
    pub category: Category,
    /// Main message, enriched after validation
    pub message: String,
    pub span: Span,
    pub file: String,
    /// Line number (1-based), filled by [`Diagnostic::locate`]
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    pub length: usize,
    /// Source line string
    pub snippet: String,
    /// Short label for caret range
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<DiagnosticData>,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, code: String, message: String, span: Span) -> Self {
        let category = error_codes::category_for(&code).unwrap_or(Category::Other);
        let help = error_codes::help_for(&code).map(str::to_string);
        Self {
            diag_version: DIAG_VERSION,
            level,
            code,
            category,
            message,
            span,
            file: "<unknown>".to_string(),
            line: 1,
            column: span.start + 1,
            length: span.len(),
            snippet: String::new(),
            label: String::new(),
            notes: Vec::new(),
            help,
            data: None,
        }
    }

    /// Create a new error diagnostic with code
    pub fn error_with_code(code: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticLevel::Error, code.into(), message.into(), span)
    }

    /// Create a new warning diagnostic with code
    pub fn warning_with_code(
        code: impl Into<String>,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::new(DiagnosticLevel::Warning, code.into(), message.into(), span)
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attach the structured payload
    pub fn with_data(mut self, data: DiagnosticData) -> Self {
        self.data = Some(data);
        self
    }

    /// Resolve line, column and snippet against the source text
    pub fn locate(mut self, index: &LineIndex, source: &str) -> Self {
        let pos = index.line_col(self.span.start);
        self.line = pos.line as usize + 1;
        self.column = pos.col as usize + 1;
        self.length = self.span.len();
        self.snippet = index
            .line_span(pos.line)
            .and_then(|line| source.get(line.start..line.end))
            .unwrap_or_default()
            .to_string();
        self
    }

    /// Payload field accessors used by quick fixes
    pub fn data(&self) -> Option<&DiagnosticData> {
        self.data.as_ref()
    }

    /// Format as human-readable string
    pub fn to_human_string(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}[{}]: {}\n",
            self.level, self.code, self.message
        ));
        output.push_str(&format!(
            "  --> {}:{}:{}\n",
            self.file, self.line, self.column
        ));

        if !self.snippet.is_empty() {
            output.push_str("   |\n");
            output.push_str(&format!("{:>2} | {}\n", self.line, self.snippet));

            let padding = " ".repeat(self.column.saturating_sub(1));
            let carets = "^".repeat(self.length.max(1));
            output.push_str(&format!("   | {}{}", padding, carets));
            if !self.label.is_empty() {
                output.push_str(&format!(" {}", self.label));
            }
            output.push('\n');
        }

        for note in &self.notes {
            output.push_str(&format!("   = note: {}\n", note));
        }
        if let Some(help) = &self.help {
            output.push_str(&format!("   = help: {}\n", help));
        }

        output
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Sort diagnostics by position, errors before warnings at the same spot.
///
/// The sort is stable, so diagnostics at the same span and level keep the
/// order the validators produced them in.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then(level_rank(a.level).cmp(&level_rank(b.level)))
    });
}

fn level_rank(level: DiagnosticLevel) -> u8 {
    match level {
        DiagnosticLevel::Error => 0,
        DiagnosticLevel::Warning => 1,
        DiagnosticLevel::Hint => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_follows_code_registry() {
        let diag = Diagnostic::error_with_code(
            error_codes::ARRAY_SIZE_OVERFLOW,
            "Array 'a' declared with size 1 but initialized with 2 elements",
            Span::new(4, 5),
        );
        assert_eq!(diag.category, Category::Array);

        let unknown = Diagnostic::error_with_code("SOMETHING_ELSE", "x", Span::new(0, 1));
        assert_eq!(unknown.category, Category::Other);
    }

    #[test]
    fn test_help_defaults_from_code_registry() {
        let diag = Diagnostic::error_with_code(
            error_codes::INVALID_BREAK_CONTINUE,
            "'break' statement is only allowed inside a loop",
            Span::new(0, 6),
        );
        assert_eq!(
            diag.help.as_deref(),
            error_codes::help_for(error_codes::INVALID_BREAK_CONTINUE)
        );
        assert!(diag.help.is_some());

        let custom = diag.with_help("wrap it in a while loop");
        assert_eq!(custom.help.as_deref(), Some("wrap it in a while loop"));
    }

    #[test]
    fn test_builder_pattern() {
        let diag = Diagnostic::warning_with_code(error_codes::UNUSED_VARIABLE, "unused", Span::new(0, 4))
            .with_file("main.c")
            .with_label("never read")
            .with_note("declared here")
            .with_help("remove it")
            .with_data(DiagnosticData::variable("temp"));

        assert_eq!(diag.file, "main.c");
        assert_eq!(diag.level, DiagnosticLevel::Warning);
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(
            diag.data().and_then(|d| d.variable_name.as_deref()),
            Some("temp")
        );
    }

    #[test]
    fn test_locate_sets_line_and_snippet() {
        let source = "int main() {\n    return y;\n}";
        let start = source.find('y').unwrap();
        let diag = Diagnostic::error_with_code(
            error_codes::UNDEFINED_VARIABLE,
            "Undefined variable 'y'",
            Span::new(start, start + 1),
        )
        .locate(&LineIndex::new(source), source);

        assert_eq!(diag.line, 2);
        assert_eq!(diag.column, 12);
        assert_eq!(diag.snippet, "    return y;");
    }

    #[test]
    fn test_human_format() {
        let source = "int arr[3] = {1, 2, 3, 4};";
        let diag = Diagnostic::error_with_code(
            error_codes::ARRAY_SIZE_OVERFLOW,
            "Array 'arr' declared with size 3 but initialized with 4 elements",
            Span::new(4, 7),
        )
        .with_file("demo.c")
        .with_label("too many initializers")
        .locate(&LineIndex::new(source), source);

        let output = diag.to_human_string();
        assert!(output.contains("error[ARRAY_SIZE_OVERFLOW]"));
        assert!(output.contains("demo.c:1:5"));
        assert!(output.contains("^^^ too many initializers"));
    }

    #[test]
    fn test_data_serializes_camel_case() {
        let data = DiagnosticData::arity("foo", 3, 2);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"functionName": "foo", "expectedCount": 3, "actualCount": 2})
        );
    }

    #[test]
    fn test_sort_is_positional_and_stable() {
        let mut diags = vec![
            Diagnostic::warning_with_code("B", "b", Span::new(10, 11)),
            Diagnostic::error_with_code("A", "a", Span::new(2, 3)),
            Diagnostic::error_with_code("C", "c", Span::new(10, 11)),
        ];
        sort_diagnostics(&mut diags);
        let codes: Vec<_> = diags.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "C", "B"]);
    }
}
