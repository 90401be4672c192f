//! Type conversions between MiniC and LSP types

use crate::text::span_to_range;
use minic_core::span::LineIndex;
use minic_core::{Diagnostic, DiagnosticLevel};
use tower_lsp::lsp_types;

/// Convert a MiniC diagnostic to an LSP diagnostic.
///
/// The structured payload travels in `data` so quick fixes can read it back.
pub fn diagnostic_to_lsp(diag: &Diagnostic, index: &LineIndex, source: &str) -> lsp_types::Diagnostic {
    lsp_types::Diagnostic {
        range: span_to_range(index, diag.span),
        severity: Some(severity_to_lsp(diag.level)),
        code: Some(lsp_types::NumberOrString::String(diag.code.clone())),
        source: Some(source.to_string()),
        message: diag.message.clone(),
        data: diag
            .data()
            .filter(|data| !data.is_empty())
            .and_then(|data| serde_json::to_value(data).ok()),
        ..Default::default()
    }
}

pub fn severity_to_lsp(level: DiagnosticLevel) -> lsp_types::DiagnosticSeverity {
    match level {
        DiagnosticLevel::Error => lsp_types::DiagnosticSeverity::ERROR,
        DiagnosticLevel::Warning => lsp_types::DiagnosticSeverity::WARNING,
        DiagnosticLevel::Hint => lsp_types::DiagnosticSeverity::HINT,
    }
}
