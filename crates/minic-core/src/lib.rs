//! MiniC core - front end, semantic validation and diagnostics
//!
//! This library provides:
//! - Lexing, bracket balancing, parsing and name linking
//! - Declaration, function-contract, control-flow and usage validation
//! - The diagnostic taxonomy, message enrichment and terminal formatting
//! - Innermost-node lookup for editor features

/// MiniC core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod analysis;
pub mod ast;
pub mod diagnostic;
pub mod lexer;
pub mod linker;
pub mod locator;
pub mod parser;
pub mod span;
pub mod symbol;
pub mod token;
pub mod validation;

pub use analysis::{analyze, Analysis, AnalysisOptions};
pub use diagnostic::{
    error_codes, sort_diagnostics, Category, Diagnostic, DiagnosticData, DiagnosticLevel,
    DIAG_VERSION,
};
pub use lexer::Lexer;
pub use linker::Linker;
pub use locator::{locate, Node, NodePath};
pub use parser::Parser;
pub use span::{LineCol, LineIndex, Span};
pub use symbol::{Symbol, SymbolId, SymbolKind, SymbolTable};
pub use token::{Token, TokenKind};
pub use validation::{validate, ValidationOptions, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke() {
        assert_eq!(VERSION, "0.1.0");
    }
}
