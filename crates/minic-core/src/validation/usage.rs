//! Unused local variables

use super::{walk_expr, walk_stmts};
use crate::ast::{Declarator, Expr, FunctionDecl, Item, Program, Stmt};
use crate::diagnostic::{error_codes, Diagnostic, DiagnosticData};
use crate::symbol::SymbolId;
use std::collections::HashSet;

pub(super) fn check(program: &Program, accept: &mut dyn FnMut(Diagnostic)) {
    for item in &program.items {
        if let Item::Function(func) = item {
            check_function(func, accept);
        }
    }
}

fn check_function(func: &FunctionDecl, accept: &mut dyn FnMut(Diagnostic)) {
    let mut locals: Vec<&Declarator> = Vec::new();
    let mut used: HashSet<SymbolId> = HashSet::new();

    walk_stmts(&func.body.statements, &mut |stmt| {
        if let Stmt::Declaration(group) = stmt {
            locals.extend(group.declarators.iter());
        }
        for expr in stmt.expressions() {
            walk_expr(expr, &mut |sub| {
                if let Expr::Name(name) = sub {
                    used.extend(name.resolved);
                }
            });
        }
    });

    for declarator in locals {
        let Some(id) = declarator.symbol else {
            continue;
        };
        let name = &declarator.name.name;
        if name.starts_with('_') || used.contains(&id) {
            continue;
        }
        accept(
            Diagnostic::warning_with_code(
                error_codes::UNUSED_VARIABLE,
                format!("Variable '{}' is declared but never used", name),
                declarator.name.span,
            )
            .with_label("never read or written after declaration")
            .with_help(format!("remove it or rename it to '_{}'", name))
            .with_data(DiagnosticData::variable(name.as_str())),
        );
    }
}
