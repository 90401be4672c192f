//! Semantic validation
//!
//! Validators walk a linked AST and hand every problem they find to an
//! accept callback. They only read the tree and the symbol table, keep no
//! state between runs and never iterate a hash map when emitting, so the same
//! input always yields the same diagnostics in the same order.

mod control_flow;
mod declarations;
mod functions;
mod usage;

use crate::ast::{Expr, Item, Program, Stmt};
use crate::diagnostic::Diagnostic;
use crate::symbol::SymbolTable;

/// Validation switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Report locals that are never referenced
    pub unused_variables: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            unused_variables: true,
        }
    }
}

/// Runs every validation pass over one program
pub struct Validator<'a> {
    symbols: &'a SymbolTable,
    options: ValidationOptions,
}

impl<'a> Validator<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            options: ValidationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate and collect diagnostics in emission order
    pub fn validate(&self, program: &Program) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.validate_with(program, &mut |diag| diagnostics.push(diag));
        diagnostics
    }

    /// Validate, handing each diagnostic to `accept` as it is found.
    ///
    /// Passes run in a fixed order: declarations, function contracts,
    /// control flow, then usage.
    pub fn validate_with(&self, program: &Program, accept: &mut dyn FnMut(Diagnostic)) {
        declarations::check(program, accept);
        functions::check(program, self.symbols, accept);
        control_flow::check(program, accept);
        if self.options.unused_variables {
            usage::check(program, accept);
        }
    }
}

/// Every statement in a list, pre-order, including nested statements
pub(crate) fn walk_stmts<'a>(stmts: &'a [Stmt], f: &mut dyn FnMut(&'a Stmt)) {
    for stmt in stmts {
        walk_stmt(stmt, f);
    }
}

fn walk_stmt<'a>(stmt: &'a Stmt, f: &mut dyn FnMut(&'a Stmt)) {
    f(stmt);
    for nested in stmt.nested_statements() {
        walk_stmt(nested, f);
    }
}

/// An expression and all of its subexpressions, pre-order
pub(crate) fn walk_expr<'a>(expr: &'a Expr, f: &mut dyn FnMut(&'a Expr)) {
    f(expr);
    for sub in expr.subexpressions() {
        walk_expr(sub, f);
    }
}

/// Every expression in the program, in source order
pub(crate) fn walk_program_exprs<'a>(program: &'a Program, f: &mut dyn FnMut(&'a Expr)) {
    for item in &program.items {
        match item {
            Item::Declaration(group) => {
                for expr in group.expressions() {
                    walk_expr(expr, f);
                }
            }
            Item::Function(func) => {
                walk_stmts(&func.body.statements, &mut |stmt| {
                    for expr in stmt.expressions() {
                        walk_expr(expr, f);
                    }
                });
            }
        }
    }
}

/// Validate with default options
pub fn validate(program: &Program, symbols: &SymbolTable) -> Vec<Diagnostic> {
    Validator::new(symbols).validate(program)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::ast::Program;
    use crate::diagnostic::Diagnostic;
    use crate::lexer::tokenize;
    use crate::linker::link;
    use crate::parser::parse;
    use crate::symbol::SymbolTable;

    /// Parse and link a snippet that must be syntactically valid
    pub fn linked(source: &str) -> (Program, SymbolTable) {
        let (tokens, lex_diags) = tokenize(source);
        assert!(lex_diags.is_empty(), "{:?}", lex_diags);
        let (mut program, parse_diags) = parse(tokens);
        assert!(parse_diags.is_empty(), "{:?}", parse_diags);
        let symbols = link(&mut program);
        (program, symbols)
    }

    pub fn with_code<'a>(diags: &'a [Diagnostic], code: &str) -> Vec<&'a Diagnostic> {
        diags.iter().filter(|d| d.code == code).collect()
    }
}
