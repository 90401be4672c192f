//! `break` / `continue` placement

use crate::ast::{Item, Program, Stmt};
use crate::diagnostic::{error_codes, Diagnostic};

pub(super) fn check(program: &Program, accept: &mut dyn FnMut(Diagnostic)) {
    for item in &program.items {
        if let Item::Function(func) = item {
            for stmt in &func.body.statements {
                check_stmt(stmt, false, accept);
            }
        }
    }
}

fn check_stmt(stmt: &Stmt, in_loop: bool, accept: &mut dyn FnMut(Diagnostic)) {
    let keyword = match stmt {
        Stmt::Break(_) => Some("break"),
        Stmt::Continue(_) => Some("continue"),
        _ => None,
    };

    if let Some(keyword) = keyword {
        if !in_loop {
            accept(
                Diagnostic::error_with_code(
                    error_codes::INVALID_BREAK_CONTINUE,
                    format!("'{}' statement is only allowed inside a loop", keyword),
                    stmt.span(),
                )
                .with_label(format!("'{}' outside of a loop", keyword)),
            );
        }
        return;
    }

    let nested_in_loop = in_loop || matches!(stmt, Stmt::While(_));
    for nested in stmt.nested_statements() {
        check_stmt(nested, nested_in_loop, accept);
    }
}
