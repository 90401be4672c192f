//! Learner-facing message enrichment
//!
//! Maps raw diagnostic messages to an explanation, a suggestion and a
//! category. Lookup runs in two passes over the table: plain substring
//! containment first, then regex patterns. The first hit wins.
//!
//! Regex patterns are compiled once when the table is built. A pattern that
//! fails to compile is an internal fault surfaced as [`EnrichError`]; the
//! `_safe` functions absorb every such fault and fall back to the raw message.

use crate::diagnostic::{Category, Diagnostic};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Internal enrichment failure
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("invalid enrichment pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// How an entry matches a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePattern {
    Substring(&'static str),
    Regex(&'static str),
}

/// One row of the enrichment table
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub pattern: MessagePattern,
    pub explanation: &'static str,
    pub suggestion: &'static str,
    pub category: Category,
}

/// Enrichment table with its regex patterns precompiled
#[derive(Debug)]
pub struct EnrichmentTable {
    entries: Vec<Enrichment>,
    compiled: Vec<Option<Result<Regex, regex::Error>>>,
}

impl EnrichmentTable {
    pub fn new(entries: Vec<Enrichment>) -> Self {
        let compiled = entries
            .iter()
            .map(|entry| match entry.pattern {
                MessagePattern::Substring(_) => None,
                MessagePattern::Regex(pattern) => Some(Regex::new(pattern)),
            })
            .collect();
        Self { entries, compiled }
    }

    /// The built-in table, built on first use
    pub fn standard() -> &'static EnrichmentTable {
        static TABLE: OnceLock<EnrichmentTable> = OnceLock::new();
        TABLE.get_or_init(|| EnrichmentTable::new(standard_entries()))
    }

    /// Find the entry for a message: substrings first, then regexes
    pub fn find(&self, message: &str) -> Result<Option<&Enrichment>, EnrichError> {
        for entry in &self.entries {
            if let MessagePattern::Substring(needle) = entry.pattern {
                if message.contains(needle) {
                    return Ok(Some(entry));
                }
            }
        }

        for (entry, compiled) in self.entries.iter().zip(&self.compiled) {
            let Some(compiled) = compiled else {
                continue;
            };
            let regex = compiled.as_ref().map_err(|err| EnrichError::InvalidPattern {
                pattern: pattern_text(entry.pattern).to_string(),
                source: err.clone(),
            })?;
            if regex.is_match(message) {
                return Ok(Some(entry));
            }
        }

        Ok(None)
    }

    /// Append explanation and suggestion to a message.
    ///
    /// Messages without a matching entry are returned unchanged.
    pub fn enrich(&self, message: &str) -> Result<String, EnrichError> {
        Ok(match self.find(message)? {
            Some(entry) => format!(
                "{}\n\n{}\nSuggestion: {}",
                message, entry.explanation, entry.suggestion
            ),
            None => message.to_string(),
        })
    }

    /// Category for a message, `OTHER` when nothing matches
    pub fn category_of(&self, message: &str) -> Result<Category, EnrichError> {
        Ok(self
            .find(message)?
            .map(|entry| entry.category)
            .unwrap_or(Category::Other))
    }

    /// [`enrich`](Self::enrich) that never fails
    pub fn enrich_safe(&self, message: &str) -> String {
        match self.enrich(message) {
            Ok(enriched) => enriched,
            Err(err) => {
                tracing::warn!(error = %err, "message enrichment failed; keeping raw message");
                message.to_string()
            }
        }
    }

    /// [`category_of`](Self::category_of) that never fails
    pub fn category_of_safe(&self, message: &str) -> Category {
        self.category_of(message).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "category lookup failed; using OTHER");
            Category::Other
        })
    }

    /// Enrich a diagnostic in place of its raw message.
    ///
    /// The category is only taken from the table when the error-code registry
    /// did not already assign one.
    pub fn enrich_diagnostic(&self, mut diag: Diagnostic) -> Diagnostic {
        if diag.category == Category::Other {
            diag.category = self.category_of_safe(&diag.message);
        }
        diag.message = self.enrich_safe(&diag.message);
        diag
    }
}

fn pattern_text(pattern: MessagePattern) -> &'static str {
    match pattern {
        MessagePattern::Substring(text) | MessagePattern::Regex(text) => text,
    }
}

/// Enrich a message with the standard table, never failing
pub fn enrich_message_safe(message: &str) -> String {
    EnrichmentTable::standard().enrich_safe(message)
}

/// Category of a message from the standard table, never failing
pub fn category_of_safe(message: &str) -> Category {
    EnrichmentTable::standard().category_of_safe(message)
}

fn standard_entries() -> Vec<Enrichment> {
    use MessagePattern::{Regex, Substring};

    vec![
        Enrichment {
            pattern: Substring("Undefined variable"),
            explanation: "This name is used before any variable with that name has been declared, or the name is misspelled.",
            suggestion: "Declare the variable first, for example `int x = 0;`, or fix the spelling.",
            category: Category::Variable,
        },
        Enrichment {
            pattern: Substring("Undefined function"),
            explanation: "The program calls a function that is never defined.",
            suggestion: "Define the function, or check that the name matches its definition.",
            category: Category::Function,
        },
        Enrichment {
            pattern: Substring("Duplicate declaration"),
            explanation: "The same name is declared twice in one declaration, so the second one can never be referred to.",
            suggestion: "Give the second variable a different name.",
            category: Category::Variable,
        },
        Enrichment {
            pattern: Substring("Duplicate function"),
            explanation: "Two functions share the same name; calls always reach the first one.",
            suggestion: "Rename or remove one of the definitions.",
            category: Category::Function,
        },
        Enrichment {
            pattern: Substring("declared with size"),
            explanation: "An array cannot hold more initial values than its declared size.",
            suggestion: "Make the array larger or remove some of the values.",
            category: Category::Array,
        },
        Enrichment {
            pattern: Substring("arguments but got"),
            explanation: "A call must pass exactly one argument for every parameter the function declares.",
            suggestion: "Add or remove arguments so the call matches the definition.",
            category: Category::Function,
        },
        Enrichment {
            pattern: Substring("only allowed inside a loop"),
            explanation: "'break' and 'continue' jump out of or back to the start of a loop, so they mean nothing outside one.",
            suggestion: "Move the statement into a while loop, or remove it.",
            category: Category::Control,
        },
        Enrichment {
            pattern: Substring("is missing a return statement"),
            explanation: "A function with a non-void return type must end by returning a value.",
            suggestion: "Add a return statement before the closing brace, for example `return 0;`.",
            category: Category::Function,
        },
        Enrichment {
            pattern: Substring("must return a value"),
            explanation: "A bare `return;` gives the caller nothing, but this function promises a value.",
            suggestion: "Return a value of the declared type.",
            category: Category::Function,
        },
        Enrichment {
            pattern: Substring("should not return a value"),
            explanation: "A void function has no result, so `return` cannot carry a value.",
            suggestion: "Use `return;` or change the function's return type.",
            category: Category::Function,
        },
        Enrichment {
            pattern: Substring("cannot be used in an expression"),
            explanation: "Calling a void function produces no value to assign or compute with.",
            suggestion: "Call the function as a statement on its own.",
            category: Category::Type,
        },
        Enrichment {
            pattern: Substring("Type mismatch"),
            explanation: "The value does not fit the type the variable was declared with.",
            suggestion: "Change the value or the declared type so they agree.",
            category: Category::Type,
        },
        Enrichment {
            pattern: Substring("is declared but never used"),
            explanation: "The variable is never read, which often points to a typo or leftover code.",
            suggestion: "Remove it, or start its name with '_' if it is intentionally unused.",
            category: Category::Variable,
        },
        Enrichment {
            pattern: Substring("Expected ';'"),
            explanation: "Every statement and declaration must end with a semicolon.",
            suggestion: "Add ';' at the end of the statement.",
            category: Category::Other,
        },
        Enrichment {
            pattern: Regex(r"^Unmatched '[(\[{)\]}]'$"),
            explanation: "Brackets must come in pairs: every opening bracket needs a closing bracket of the same kind.",
            suggestion: "Add the missing bracket or remove the extra one.",
            category: Category::Other,
        },
        Enrichment {
            pattern: Regex(r"^Unexpected character '.+'$"),
            explanation: "This character is not part of the language.",
            suggestion: "Remove it or replace it with a valid operator.",
            category: Category::Other,
        },
        Enrichment {
            pattern: Regex(r"^Expected (expression|a type|'[^']+')"),
            explanation: "The code does not follow the language grammar at this point.",
            suggestion: "Check for a missing or extra token just before this position.",
            category: Category::Other,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::error_codes;
    use crate::span::Span;
    use rstest::rstest;

    #[rstest]
    #[case("Undefined variable 'x'", Category::Variable)]
    #[case("Function 'foo' expects 3 arguments but got 2", Category::Function)]
    #[case("Array 'a' declared with size 3 but initialized with 5 elements", Category::Array)]
    #[case("'break' statement is only allowed inside a loop", Category::Control)]
    #[case("Unmatched '{'", Category::Other)]
    #[case("something nobody has seen", Category::Other)]
    fn test_category_lookup(#[case] message: &str, #[case] expected: Category) {
        assert_eq!(category_of_safe(message), expected);
    }

    #[test]
    fn test_enrich_appends_explanation_and_suggestion() {
        let enriched = enrich_message_safe("Undefined variable 'count'");
        let mut parts = enriched.splitn(2, "\n\n");
        assert_eq!(parts.next(), Some("Undefined variable 'count'"));
        let rest = parts.next().unwrap();
        assert!(rest.contains("\nSuggestion: Declare the variable first"));
    }

    #[test]
    fn test_unknown_message_is_unchanged() {
        assert_eq!(enrich_message_safe("weird"), "weird");
        assert_eq!(enrich_message_safe(""), "");
    }

    #[test]
    fn test_substring_pass_wins_over_regex_pass() {
        let table = EnrichmentTable::new(vec![
            Enrichment {
                pattern: MessagePattern::Regex("^Undefined"),
                explanation: "regex",
                suggestion: "regex",
                category: Category::Type,
            },
            Enrichment {
                pattern: MessagePattern::Substring("variable"),
                explanation: "substring",
                suggestion: "substring",
                category: Category::Variable,
            },
        ]);
        assert_eq!(
            table.category_of("Undefined variable 'x'").unwrap(),
            Category::Variable
        );
    }

    #[test]
    fn test_invalid_pattern_is_an_error_but_safe_variant_recovers() {
        let table = EnrichmentTable::new(vec![Enrichment {
            pattern: MessagePattern::Regex("(unclosed"),
            explanation: "never",
            suggestion: "never",
            category: Category::Type,
        }]);

        assert!(matches!(
            table.enrich("anything"),
            Err(EnrichError::InvalidPattern { .. })
        ));
        assert_eq!(table.enrich_safe("anything"), "anything");
        assert_eq!(table.category_of_safe("anything"), Category::Other);
    }

    #[test]
    fn test_enrich_diagnostic_keeps_registry_category() {
        let diag = Diagnostic::error_with_code(
            error_codes::VOID_ASSIGNMENT,
            "Void function 'log' does not return a value and cannot be used in an expression",
            Span::new(0, 3),
        );
        let enriched = EnrichmentTable::standard().enrich_diagnostic(diag);
        assert_eq!(enriched.category, Category::Type);
        assert!(enriched.message.contains("Suggestion:"));
    }

    #[test]
    fn test_enrich_diagnostic_fills_category_for_unregistered_code() {
        let diag = Diagnostic::error_with_code("CUSTOM", "Undefined function 'go'", Span::new(0, 2));
        let enriched = EnrichmentTable::standard().enrich_diagnostic(diag);
        assert_eq!(enriched.category, Category::Function);
    }
}
