//! AST dump command - output the linked AST as JSON

use anyhow::{Context, Result};
use minic_core::ast::VersionedProgram;
use minic_core::{Lexer, Linker, Parser};
use std::fs;

/// Parse and link a source file, then print its AST as JSON.
///
/// Name references carry the symbol id the linker resolved them to.
pub fn run(file_path: &str) -> Result<()> {
    let source = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read source file: {}", file_path))?;

    println!("{}", dump(&source)?);
    Ok(())
}

fn dump(source: &str) -> Result<String> {
    let (tokens, mut diagnostics) = Lexer::new(source).tokenize();
    diagnostics.extend(minic_core::parser::check_brackets(&tokens));
    if !diagnostics.is_empty() {
        return Err(front_end_failure(&diagnostics));
    }

    let (mut program, parse_diagnostics) = Parser::new(tokens).parse();
    if !parse_diagnostics.is_empty() {
        return Err(front_end_failure(&parse_diagnostics));
    }

    Linker::new().link(&mut program);
    Ok(VersionedProgram::new(program).to_json()?)
}

fn front_end_failure(diagnostics: &[minic_core::Diagnostic]) -> anyhow::Error {
    for diag in diagnostics {
        eprintln!("{}", diag.to_human_string());
    }
    anyhow::anyhow!("Parse errors")
}
