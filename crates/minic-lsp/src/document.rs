//! Document state management

use minic_core::span::LineIndex;
use minic_core::{analyze, Analysis, AnalysisOptions};
use tower_lsp::lsp_types::{self, Url};

/// State of a single document in the LSP server
pub struct DocumentState {
    pub uri: Url,
    pub text: String,
    pub version: i32,
    pub analysis: Analysis,
    pub line_index: LineIndex,
    options: AnalysisOptions,
}

impl DocumentState {
    /// Create a new document and analyze it
    pub fn new(uri: Url, text: String, version: i32, options: AnalysisOptions) -> Self {
        let analysis = analyze(&text, options);
        let line_index = LineIndex::new(&text);
        tracing::debug!(%uri, version, diagnostics = analysis.diagnostics.len(), "document opened");
        Self {
            uri,
            text,
            version,
            analysis,
            line_index,
            options,
        }
    }

    /// Update document text and re-analyze
    pub fn update(&mut self, text: String, version: i32) {
        self.analysis = analyze(&text, self.options);
        self.line_index = LineIndex::new(&text);
        self.text = text;
        self.version = version;
        tracing::debug!(uri = %self.uri, version, "document reanalyzed");
    }

    /// Diagnostics ready to publish, capped at `max_problems`
    pub fn lsp_diagnostics(&self, source: &str, max_problems: usize) -> Vec<lsp_types::Diagnostic> {
        self.analysis
            .diagnostics
            .iter()
            .take(max_problems)
            .map(|diag| crate::convert::diagnostic_to_lsp(diag, &self.line_index, source))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("file:///test.c").unwrap()
    }

    #[test]
    fn test_update_reanalyzes() {
        let mut doc = DocumentState::new(
            uri(),
            "int main() { return x; }".to_string(),
            1,
            AnalysisOptions::default(),
        );
        assert_eq!(doc.lsp_diagnostics("minic", 100).len(), 1);

        doc.update("int main() { return 0; }".to_string(), 2);
        assert_eq!(doc.version, 2);
        assert!(doc.lsp_diagnostics("minic", 100).is_empty());
    }

    #[test]
    fn test_max_problems_caps_output() {
        let doc = DocumentState::new(
            uri(),
            "int main() { return a + b + c; }".to_string(),
            1,
            AnalysisOptions::default(),
        );
        assert_eq!(doc.analysis.diagnostics.len(), 3);
        assert_eq!(doc.lsp_diagnostics("minic", 2).len(), 2);
    }
}
