//! Fix bindings keyed by diagnostic code and by message pattern

use super::context::FixContext;
use super::resolvers;
use super::QuickFixResult;
use minic_core::error_codes;
use std::collections::HashMap;
use tower_lsp::lsp_types::CodeAction;

/// Produces the preferred repair for a diagnostic, if one can be computed
pub type PrimaryFix = fn(&FixContext<'_>) -> QuickFixResult<Option<CodeAction>>;

/// Produces extra repairs offered next to a primary one
pub type SupplementaryFixes = fn(&FixContext<'_>) -> QuickFixResult<Vec<CodeAction>>;

#[derive(Clone, Copy)]
pub struct FixBinding {
    pub primary: PrimaryFix,
    pub additional: Option<SupplementaryFixes>,
}

impl FixBinding {
    pub fn new(primary: PrimaryFix) -> Self {
        Self {
            primary,
            additional: None,
        }
    }

    pub fn with_additional(mut self, additional: SupplementaryFixes) -> Self {
        self.additional = Some(additional);
        self
    }
}

/// Immutable fix lookup tables
pub struct FixRegistry {
    by_code: HashMap<String, FixBinding>,
    /// Consulted in insertion order
    by_pattern: Vec<(String, FixBinding)>,
}

impl FixRegistry {
    pub fn builder() -> FixRegistryBuilder {
        FixRegistryBuilder::default()
    }

    /// Every built-in binding
    pub fn standard() -> Self {
        let undefined_variable = FixBinding::new(resolvers::declare_variable)
            .with_additional(resolvers::rename_to_similar);
        let undefined_function = FixBinding::new(resolvers::create_function_stub);
        let array_size =
            FixBinding::new(resolvers::resize_array).with_additional(resolvers::trim_initializer);
        let parameters = FixBinding::new(resolvers::adjust_arguments);
        let missing_return = FixBinding::new(resolvers::add_return_statement);
        let missing_semicolon = FixBinding::new(resolvers::insert_semicolon);

        Self::builder()
            .bind_code(error_codes::UNDEFINED_VARIABLE, undefined_variable)
            .bind_code(error_codes::UNDEFINED_FUNCTION, undefined_function)
            .bind_code(
                error_codes::DUPLICATE_DECLARATION,
                FixBinding::new(resolvers::rename_duplicate),
            )
            .bind_code(
                error_codes::DUPLICATE_FUNCTION,
                FixBinding::new(resolvers::rename_duplicate),
            )
            .bind_code(error_codes::ARRAY_SIZE_OVERFLOW, array_size)
            .bind_code(error_codes::PARAMETER_MISMATCH, parameters)
            .bind_code(error_codes::MISSING_RETURN, missing_return)
            .bind_code(
                error_codes::EMPTY_RETURN,
                FixBinding::new(resolvers::return_default_value),
            )
            .bind_code(
                error_codes::VOID_RETURN_VALUE,
                FixBinding::new(resolvers::drop_return_value),
            )
            .bind_code(
                error_codes::VOID_ASSIGNMENT,
                FixBinding::new(resolvers::keep_bare_call),
            )
            .bind_code(
                error_codes::INVALID_BREAK_CONTINUE,
                FixBinding::new(resolvers::remove_statement),
            )
            .bind_code(error_codes::MISSING_SEMICOLON, missing_semicolon)
            .bind_code(
                error_codes::UNMATCHED_BRACKETS,
                FixBinding::new(resolvers::balance_bracket),
            )
            .bind_code(
                error_codes::UNUSED_VARIABLE,
                FixBinding::new(resolvers::remove_unused_declaration)
                    .with_additional(resolvers::prefix_underscore),
            )
            .bind_pattern("Undefined variable", undefined_variable)
            .bind_pattern("Undefined function", undefined_function)
            .bind_pattern("declared with size", array_size)
            .bind_pattern("arguments but got", parameters)
            .bind_pattern("missing a return statement", missing_return)
            .bind_pattern("Expected ';'", missing_semicolon)
            .build()
    }

    /// Binding for a diagnostic: by code first, then the first pattern
    /// contained in the message
    pub fn lookup(&self, code: Option<&str>, message: &str) -> Option<&FixBinding> {
        code.and_then(|code| self.by_code.get(code)).or_else(|| {
            self.by_pattern
                .iter()
                .find(|(pattern, _)| message.contains(pattern.as_str()))
                .map(|(_, binding)| binding)
        })
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.by_code.keys().map(String::as_str)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.by_pattern.iter().map(|(pattern, _)| pattern.as_str())
    }
}

#[derive(Default)]
pub struct FixRegistryBuilder {
    by_code: HashMap<String, FixBinding>,
    by_pattern: Vec<(String, FixBinding)>,
}

impl FixRegistryBuilder {
    /// Later bindings for the same code replace earlier ones
    pub fn bind_code(mut self, code: impl Into<String>, binding: FixBinding) -> Self {
        self.by_code.insert(code.into(), binding);
        self
    }

    pub fn bind_pattern(mut self, pattern: impl Into<String>, binding: FixBinding) -> Self {
        self.by_pattern.push((pattern.into(), binding));
        self
    }

    pub fn build(self) -> FixRegistry {
        FixRegistry {
            by_code: self.by_code,
            by_pattern: self.by_pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minic_core::span::LineIndex;
    use pretty_assertions::assert_eq;
    use tower_lsp::lsp_types::{Diagnostic, Url};

    fn first(_: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
        Ok(Some(CodeAction {
            title: "first".to_string(),
            ..Default::default()
        }))
    }

    fn second(_: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
        Ok(Some(CodeAction {
            title: "second".to_string(),
            ..Default::default()
        }))
    }

    fn title_of(binding: &FixBinding) -> String {
        let uri = Url::parse("file:///t.c").unwrap();
        let index = LineIndex::new("");
        let diagnostic = Diagnostic::default();
        let context = FixContext::new(&uri, "", &index, &diagnostic);
        (binding.primary)(&context).unwrap().unwrap().title
    }

    #[test]
    fn test_code_wins_over_pattern() {
        let registry = FixRegistry::builder()
            .bind_code("CODE", FixBinding::new(first))
            .bind_pattern("Undefined", FixBinding::new(second))
            .build();
        let binding = registry.lookup(Some("CODE"), "Undefined variable 'x'").unwrap();
        assert_eq!(title_of(binding), "first");
    }

    #[test]
    fn test_first_matching_pattern() {
        let registry = FixRegistry::builder()
            .bind_pattern("size", FixBinding::new(first))
            .bind_pattern("declared with size", FixBinding::new(second))
            .build();
        let binding = registry
            .lookup(None, "Array 'a' declared with size 1 but initialized with 2 elements")
            .unwrap();
        assert_eq!(title_of(binding), "first");
    }

    #[test]
    fn test_unknown_code_falls_back_to_pattern() {
        let registry = FixRegistry::standard();
        assert!(registry.lookup(Some("LEGACY"), "Expected ';' after expression").is_some());
        assert!(registry.lookup(Some("LEGACY"), "Something else").is_none());
        assert!(registry.lookup(None, "").is_none());
    }

    #[test]
    fn test_standard_covers_every_fixable_code() {
        let registry = FixRegistry::standard();
        let codes: Vec<&str> = registry.codes().collect();
        assert_eq!(codes.len(), 14);
        assert!(!codes.contains(&error_codes::TYPE_MISMATCH));
        assert_eq!(
            registry.patterns().collect::<Vec<_>>(),
            vec![
                "Undefined variable",
                "Undefined function",
                "declared with size",
                "arguments but got",
                "missing a return statement",
                "Expected ';'",
            ]
        );
    }
}
