//! Quick fixes for MiniC diagnostics
//!
//! Provides:
//! - One primary repair per diagnostic, found by code or message pattern
//! - Supplementary repairs once a primary repair exists
//! - A generic fallback when nothing else applies
//! - Extract-to-function and extract-to-variable refactorings

mod context;
mod registry;
mod resolvers;

pub use context::FixContext;
pub use registry::{FixBinding, FixRegistry, FixRegistryBuilder, PrimaryFix, SupplementaryFixes};

use crate::commands::DeferredCommand;
use crate::text::{extract_text_in_range, line_indent, lines_span, span_to_range};
use minic_core::span::{LineIndex, Span};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Diagnostic, Range, TextEdit, Url,
    WorkspaceEdit,
};

/// Code action kind constants
pub mod action_kinds {
    use tower_lsp::lsp_types::CodeActionKind;

    pub fn quick_fix() -> CodeActionKind {
        CodeActionKind::QUICKFIX
    }

    pub fn refactor_extract() -> CodeActionKind {
        CodeActionKind::REFACTOR_EXTRACT
    }
}

/// Internal resolver faults
#[derive(Debug, Error)]
pub enum QuickFixError {
    #[error("failed to serialize command arguments: {0}")]
    ArgumentSerialization(#[from] serde_json::Error),
}

pub type QuickFixResult<T> = Result<T, QuickFixError>;

/// Engine switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickFixOptions {
    pub generic_fallback: bool,
    pub extract_actions: bool,
}

impl Default for QuickFixOptions {
    fn default() -> Self {
        Self {
            generic_fallback: true,
            extract_actions: true,
        }
    }
}

/// One `textDocument/codeAction` request against a document snapshot
#[derive(Debug, Clone, Copy)]
pub struct CodeActionRequest<'a> {
    pub uri: &'a Url,
    pub range: Range,
    pub diagnostics: &'a [Diagnostic],
    pub text: &'a str,
}

/// Request cancellation flag shared with the transport
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Guard that cancels this token when dropped
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop(self.clone())
    }
}

/// Cancels its token on drop, so an aborted request future stops the
/// worker computing its answer
#[derive(Debug)]
pub struct CancelOnDrop(Cancellation);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Maps diagnostics to code actions through an injected registry
pub struct QuickFixEngine {
    registry: FixRegistry,
    options: QuickFixOptions,
}

impl QuickFixEngine {
    pub fn new(registry: FixRegistry, options: QuickFixOptions) -> Self {
        Self { registry, options }
    }

    /// Engine over every built-in fix
    pub fn standard(options: QuickFixOptions) -> Self {
        Self::new(FixRegistry::standard(), options)
    }

    pub fn registry(&self) -> &FixRegistry {
        &self.registry
    }

    /// Code actions for the diagnostics and selection in a request.
    ///
    /// The token is checked before each diagnostic; a request cancelled at
    /// any point yields no actions.
    pub fn code_actions(
        &self,
        request: &CodeActionRequest<'_>,
        cancel: &Cancellation,
    ) -> Vec<CodeActionOrCommand> {
        let index = LineIndex::new(request.text);
        let mut actions = Vec::new();

        for diagnostic in request.diagnostics {
            if cancel.is_cancelled() {
                return cancelled(request);
            }
            let context = FixContext::new(request.uri, request.text, &index, diagnostic);
            actions.extend(self.fixes_for(&context));
        }

        if actions.is_empty() && !request.diagnostics.is_empty() && self.options.generic_fallback {
            match generic_action(request) {
                Ok(action) => actions.push(action),
                Err(err) => tracing::warn!(error = %err, "generic fix unavailable"),
            }
        }

        if cancel.is_cancelled() {
            return cancelled(request);
        }

        if self.options.extract_actions {
            match extract_actions(request, &index) {
                Ok(extracts) => actions.extend(extracts),
                Err(err) => tracing::warn!(error = %err, "extract actions unavailable"),
            }
        }

        tracing::debug!(
            uri = %request.uri,
            diagnostics = request.diagnostics.len(),
            actions = actions.len(),
            "code actions computed"
        );
        actions
    }

    fn fixes_for(&self, context: &FixContext<'_>) -> Vec<CodeActionOrCommand> {
        let Some(binding) = self.registry.lookup(context.code(), context.headline()) else {
            return Vec::new();
        };

        let primary = match (binding.primary)(context) {
            Ok(Some(action)) => action,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(code = context.code().unwrap_or_default(), error = %err, "quick fix failed");
                return Vec::new();
            }
        };

        let mut actions = vec![CodeActionOrCommand::CodeAction(CodeAction {
            is_preferred: Some(true),
            ..primary
        })];

        if let Some(additional) = binding.additional {
            match additional(context) {
                Ok(extra) => actions.extend(extra.into_iter().map(CodeActionOrCommand::CodeAction)),
                Err(err) => {
                    tracing::warn!(code = context.code().unwrap_or_default(), error = %err, "supplementary fix failed")
                }
            }
        }

        actions
    }
}

fn cancelled(request: &CodeActionRequest<'_>) -> Vec<CodeActionOrCommand> {
    tracing::debug!(uri = %request.uri, "code action request cancelled");
    Vec::new()
}

/// Create a code action with text edits
pub(crate) fn create_code_action(
    title: impl Into<String>,
    uri: &Url,
    edits: Vec<TextEdit>,
    kind: CodeActionKind,
    diagnostic: Option<&Diagnostic>,
) -> CodeAction {
    let mut changes = HashMap::new();
    changes.insert(uri.clone(), edits);

    CodeAction {
        title: title.into(),
        kind: Some(kind),
        diagnostics: diagnostic.map(|d| vec![d.clone()]),
        edit: Some(WorkspaceEdit {
            changes: Some(changes),
            document_changes: None,
            change_annotations: None,
        }),
        command: None,
        is_preferred: Some(false),
        disabled: None,
        data: None,
    }
}

/// Create a code action that defers its edit to a server command
pub(crate) fn create_command_action(
    title: impl Into<String>,
    command: &DeferredCommand,
    kind: CodeActionKind,
    diagnostic: Option<&Diagnostic>,
) -> QuickFixResult<CodeAction> {
    let title = title.into();
    Ok(CodeAction {
        command: Some(command.to_command(title.clone())?),
        title,
        kind: Some(kind),
        diagnostics: diagnostic.map(|d| vec![d.clone()]),
        edit: None,
        is_preferred: Some(false),
        disabled: None,
        data: None,
    })
}

fn generic_action(request: &CodeActionRequest<'_>) -> QuickFixResult<CodeActionOrCommand> {
    let range = request
        .diagnostics
        .first()
        .map(|d| d.range)
        .unwrap_or(request.range);
    let command = DeferredCommand::GenericFix {
        uri: request.uri.clone(),
        range,
    };
    let action = create_command_action(
        "Try to fix this problem",
        &command,
        action_kinds::quick_fix(),
        None,
    )?;
    Ok(CodeActionOrCommand::CodeAction(CodeAction {
        diagnostics: Some(request.diagnostics.to_vec()),
        ..action
    }))
}

fn extract_actions(
    request: &CodeActionRequest<'_>,
    index: &LineIndex,
) -> QuickFixResult<Vec<CodeActionOrCommand>> {
    let range = request.range;
    let selected = extract_text_in_range(request.text, index, range).trim();
    if range.start.line != range.end.line || selected.is_empty() {
        return Ok(Vec::new());
    }

    let function = create_command_action(
        "Extract to function",
        &DeferredCommand::ExtractFunction {
            uri: request.uri.clone(),
            range,
        },
        action_kinds::refactor_extract(),
        None,
    )?;

    let expression = selected.trim_end_matches(';').trim_end();
    let Some(selection) = crate::text::range_to_span(index, range) else {
        return Ok(vec![CodeActionOrCommand::CodeAction(function)]);
    };
    let line_start = lines_span(index, range).map_or(selection.start, |span| span.start);
    let indent = line_indent(request.text.get(line_start..selection.start).unwrap_or_default());
    let variable = create_code_action(
        "Extract to variable",
        request.uri,
        vec![
            TextEdit {
                range: span_to_range(index, Span::point(line_start)),
                new_text: format!("{}int extracted = {};\n", indent, expression),
            },
            TextEdit {
                range,
                new_text: if selected.ends_with(';') {
                    "extracted;".to_string()
                } else {
                    "extracted".to_string()
                },
            },
        ],
        action_kinds::refactor_extract(),
        None,
    );

    Ok(vec![
        CodeActionOrCommand::CodeAction(function),
        CodeActionOrCommand::CodeAction(variable),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tower_lsp::lsp_types::{NumberOrString, Position};

    fn uri() -> Url {
        Url::parse("file:///test.c").unwrap()
    }

    fn diagnostic(code: Option<&str>, message: &str, range: Range) -> Diagnostic {
        Diagnostic {
            range,
            code: code.map(|c| NumberOrString::String(c.to_string())),
            message: message.to_string(),
            ..Default::default()
        }
    }

    fn titles(actions: &[CodeActionOrCommand]) -> Vec<String> {
        actions
            .iter()
            .map(|a| match a {
                CodeActionOrCommand::CodeAction(action) => action.title.clone(),
                CodeActionOrCommand::Command(command) => command.title.clone(),
            })
            .collect()
    }

    #[test]
    fn test_cancelled_request_is_empty() {
        let uri = uri();
        let diags = [diagnostic(Some("UNDEFINED_VARIABLE"), "Undefined variable 'x'", Range::default())];
        let request = CodeActionRequest {
            uri: &uri,
            range: Range::default(),
            diagnostics: &diags,
            text: "x;",
        };
        let cancel = Cancellation::new();
        cancel.cancel();

        let engine = QuickFixEngine::standard(QuickFixOptions::default());
        assert!(engine.code_actions(&request, &cancel).is_empty());
    }

    #[test]
    fn test_unknown_diagnostic_gets_generic_fix() {
        let uri = uri();
        let range = Range::new(Position::new(0, 0), Position::new(0, 3));
        let diags = [diagnostic(Some("SOMETHING_ELSE"), "Odd", range)];
        let request = CodeActionRequest {
            uri: &uri,
            range,
            diagnostics: &diags,
            text: "int",
        };

        let engine = QuickFixEngine::standard(QuickFixOptions {
            extract_actions: false,
            ..QuickFixOptions::default()
        });
        let actions = engine.code_actions(&request, &Cancellation::new());

        assert_eq!(titles(&actions), vec!["Try to fix this problem"]);
        let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
            panic!("expected a code action");
        };
        assert!(action.edit.is_none());
        assert_eq!(
            action.command.as_ref().map(|c| c.command.as_str()),
            Some(crate::commands::GENERIC_FIX)
        );
    }

    #[test]
    fn test_generic_fallback_can_be_disabled() {
        let uri = uri();
        let diags = [diagnostic(None, "Odd", Range::default())];
        let request = CodeActionRequest {
            uri: &uri,
            range: Range::default(),
            diagnostics: &diags,
            text: "int",
        };
        let engine = QuickFixEngine::standard(QuickFixOptions {
            generic_fallback: false,
            extract_actions: true,
        });
        assert!(engine.code_actions(&request, &Cancellation::new()).is_empty());
    }

    #[test]
    fn test_selection_offers_extract_actions() {
        let uri = uri();
        let text = "int main() {\n    return 1 + 2;\n}";
        let range = Range::new(Position::new(1, 11), Position::new(1, 16));
        let request = CodeActionRequest {
            uri: &uri,
            range,
            diagnostics: &[],
            text,
        };

        let engine = QuickFixEngine::standard(QuickFixOptions::default());
        let actions = engine.code_actions(&request, &Cancellation::new());
        assert_eq!(titles(&actions), vec!["Extract to function", "Extract to variable"]);

        let CodeActionOrCommand::CodeAction(variable) = &actions[1] else {
            panic!("expected a code action");
        };
        let edits = &variable.edit.as_ref().unwrap().changes.as_ref().unwrap()[&uri];
        assert_eq!(edits[0].new_text, "    int extracted = 1 + 2;\n");
        assert_eq!(edits[1].new_text, "extracted");
        assert_eq!(variable.kind, Some(CodeActionKind::REFACTOR_EXTRACT));
    }

    #[test]
    fn test_multiline_or_empty_selection_has_no_extract() {
        let uri = uri();
        let text = "int main() {\n    return 1;\n}";
        let engine = QuickFixEngine::standard(QuickFixOptions::default());

        for range in [
            Range::new(Position::new(0, 0), Position::new(1, 4)),
            Range::new(Position::new(1, 4), Position::new(1, 4)),
        ] {
            let request = CodeActionRequest {
                uri: &uri,
                range,
                diagnostics: &[],
                text,
            };
            assert!(engine.code_actions(&request, &Cancellation::new()).is_empty());
        }
    }

    fn serialization_failure() -> QuickFixError {
        QuickFixError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
    }

    fn failing_primary(_: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
        Err(serialization_failure())
    }

    fn titled_primary(context: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
        Ok(Some(CodeAction {
            title: format!("Fix {}", context.code().unwrap_or_default()),
            ..Default::default()
        }))
    }

    fn failing_additional(_: &FixContext<'_>) -> QuickFixResult<Vec<CodeAction>> {
        Err(serialization_failure())
    }

    #[test]
    fn test_failing_fix_does_not_stop_the_batch() {
        let registry = FixRegistry::builder()
            .bind_code("FIRST", FixBinding::new(failing_primary))
            .bind_code("SECOND", FixBinding::new(titled_primary))
            .build();
        let engine = QuickFixEngine::new(
            registry,
            QuickFixOptions {
                generic_fallback: false,
                extract_actions: false,
            },
        );

        let uri = uri();
        let diags = [
            diagnostic(Some("FIRST"), "first", Range::default()),
            diagnostic(Some("SECOND"), "second", Range::default()),
        ];
        let request = CodeActionRequest {
            uri: &uri,
            range: Range::default(),
            diagnostics: &diags,
            text: "int",
        };

        let actions = engine.code_actions(&request, &Cancellation::new());
        assert_eq!(titles(&actions), vec!["Fix SECOND"]);
    }

    #[test]
    fn test_failing_additional_keeps_primary() {
        let registry = FixRegistry::builder()
            .bind_code(
                "ONLY",
                FixBinding::new(titled_primary).with_additional(failing_additional),
            )
            .build();
        let engine = QuickFixEngine::new(
            registry,
            QuickFixOptions {
                generic_fallback: false,
                extract_actions: false,
            },
        );

        let uri = uri();
        let diags = [diagnostic(Some("ONLY"), "only", Range::default())];
        let request = CodeActionRequest {
            uri: &uri,
            range: Range::default(),
            diagnostics: &diags,
            text: "int",
        };

        let actions = engine.code_actions(&request, &Cancellation::new());
        assert_eq!(titles(&actions), vec!["Fix ONLY"]);
        let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
            panic!("expected a code action");
        };
        assert_eq!(action.is_preferred, Some(true));
    }

    thread_local! {
        static CANCEL_DURING_FIX: Cancellation = Cancellation::new();
    }

    fn cancelling_primary(context: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
        CANCEL_DURING_FIX.with(Cancellation::cancel);
        titled_primary(context)
    }

    #[test]
    fn test_cancellation_mid_request_discards_actions() {
        let registry = FixRegistry::builder()
            .bind_code("FIRST", FixBinding::new(cancelling_primary))
            .bind_code("SECOND", FixBinding::new(titled_primary))
            .build();
        let engine = QuickFixEngine::new(registry, QuickFixOptions::default());

        let uri = uri();
        let diags = [
            diagnostic(Some("FIRST"), "first", Range::default()),
            diagnostic(Some("SECOND"), "second", Range::default()),
        ];
        let request = CodeActionRequest {
            uri: &uri,
            range: Range::default(),
            diagnostics: &diags,
            text: "int",
        };

        let cancel = CANCEL_DURING_FIX.with(Cancellation::clone);
        assert!(engine.code_actions(&request, &cancel).is_empty());
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_dropped_guard_cancels_token() {
        let cancel = Cancellation::new();
        let guard = cancel.cancel_on_drop();
        assert!(!cancel.is_cancelled());
        drop(guard);
        assert!(cancel.is_cancelled());
    }
}
