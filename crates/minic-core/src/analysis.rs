//! End-to-end analysis of one source text

use crate::ast::Program;
use crate::diagnostic::enrichment::EnrichmentTable;
use crate::diagnostic::{error_codes, sort_diagnostics, Diagnostic};
use crate::lexer::Lexer;
use crate::linker::Linker;
use crate::parser::{check_brackets, Parser};
use crate::symbol::SymbolTable;
use crate::validation::{ValidationOptions, Validator};

/// Analysis switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Append explanation and suggestion to each message
    pub enrich: bool,
    pub unused_variables: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            enrich: true,
            unused_variables: true,
        }
    }
}

/// Result of analyzing a source text
#[derive(Debug)]
pub struct Analysis {
    pub program: Program,
    /// Empty unless the program was linked
    pub symbols: SymbolTable,
    /// Sorted by position
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level == crate::diagnostic::DiagnosticLevel::Error)
    }
}

/// Lex, parse, link and validate.
///
/// Front-end errors stop the pipeline: with unbalanced brackets only the
/// lexer and bracket diagnostics are reported, and a program with lexer or
/// parser errors is not validated. Missing semicolons are the exception;
/// the parser recovers from them in place, so the program is still linked
/// and validated.
pub fn analyze(source: &str, options: AnalysisOptions) -> Analysis {
    let (tokens, mut diagnostics) = Lexer::new(source).tokenize();

    let bracket_diagnostics = check_brackets(&tokens);
    if !bracket_diagnostics.is_empty() {
        diagnostics.extend(bracket_diagnostics);
        return finish(Program::default(), SymbolTable::new(), diagnostics, options);
    }

    let (mut program, parse_diagnostics) = Parser::new(tokens).parse();
    diagnostics.extend(parse_diagnostics);
    if !diagnostics.iter().all(is_recovered) {
        return finish(program, SymbolTable::new(), diagnostics, options);
    }

    let symbols = Linker::new().link(&mut program);
    let validator = Validator::new(&symbols).with_options(ValidationOptions {
        unused_variables: options.unused_variables,
    });
    validator.validate_with(&program, &mut |diag| diagnostics.push(diag));

    finish(program, symbols, diagnostics, options)
}

fn is_recovered(diag: &Diagnostic) -> bool {
    diag.code == error_codes::MISSING_SEMICOLON
}

fn finish(
    program: Program,
    symbols: SymbolTable,
    mut diagnostics: Vec<Diagnostic>,
    options: AnalysisOptions,
) -> Analysis {
    sort_diagnostics(&mut diagnostics);
    if options.enrich {
        let table = EnrichmentTable::standard();
        diagnostics = diagnostics
            .into_iter()
            .map(|diag| table.enrich_diagnostic(diag))
            .collect();
    }

    tracing::debug!(
        diagnostics = diagnostics.len(),
        items = program.items.len(),
        "analysis finished"
    );

    Analysis {
        program,
        symbols,
        diagnostics,
    }
}
