//! Check command - validate MiniC source files

use anyhow::{Context, Result};
use minic_config::{Config, ConfigLoader};
use minic_core::diagnostic::formatter::{ColorMode, DiagnosticFormatter};
use minic_core::{analyze, AnalysisOptions, Diagnostic, DiagnosticLevel, LineIndex};
use std::fs;
use std::path::Path;

/// Arguments for the check command
#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub file: String,
    pub json: bool,
    /// Cleared by --no-enrich; otherwise the configured value applies
    pub enrich: bool,
    pub color: ColorMode,
}

/// Validate a MiniC source file and print its diagnostics
pub fn run(args: &CheckArgs) -> Result<()> {
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read source file: {}", args.file))?;

    let config = load_config(Path::new(&args.file))?;
    let options = AnalysisOptions {
        enrich: args.enrich && config.enrich(),
        unused_variables: config.unused_variable_warnings(),
    };

    let diagnostics = collect_diagnostics(&args.file, &source, options);
    let has_errors = diagnostics
        .iter()
        .any(|diag| diag.level == DiagnosticLevel::Error);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        let formatter = DiagnosticFormatter::new(args.color);
        for diag in &diagnostics {
            formatter.emit(diag)?;
        }
    }

    if has_errors {
        return Err(anyhow::anyhow!("Validation failed"));
    }

    if !args.json {
        println!("{}: No errors found", args.file);
    }
    Ok(())
}

/// Configuration for the directory holding the file
fn load_config(file: &Path) -> Result<Config> {
    let dir = match file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    ConfigLoader::new()
        .load_from_directory(&dir)
        .with_context(|| format!("Failed to load configuration for {}", file.display()))
}

/// Analyze a source text and attach file, line and snippet to each diagnostic
pub fn collect_diagnostics(file: &str, source: &str, options: AnalysisOptions) -> Vec<Diagnostic> {
    let index = LineIndex::new(source);
    analyze(source, options)
        .diagnostics
        .into_iter()
        .map(|diag| diag.with_file(file).locate(&index, source))
        .collect()
}
