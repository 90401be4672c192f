//! Function contract checks

use super::{walk_expr, walk_program_exprs, walk_stmts};
use crate::ast::*;
use crate::diagnostic::{error_codes, Diagnostic, DiagnosticData};
use crate::symbol::SymbolTable;
use std::collections::HashSet;

pub(super) fn check(program: &Program, symbols: &SymbolTable, accept: &mut dyn FnMut(Diagnostic)) {
    check_unique_functions(program, accept);

    walk_program_exprs(program, &mut |expr| {
        if let Expr::Call(call) = expr {
            check_arity(call, symbols, accept);
        }
    });

    for item in &program.items {
        if let Item::Function(func) = item {
            check_return_shape(func, accept);
        }
    }

    check_void_values(program, symbols, accept);
}

fn check_unique_functions(program: &Program, accept: &mut dyn FnMut(Diagnostic)) {
    let mut seen: HashSet<&str> = HashSet::new();

    for item in &program.items {
        let Item::Function(func) = item else {
            continue;
        };
        let name = func.name.name.as_str();
        if !seen.insert(name) {
            accept(
                Diagnostic::error_with_code(
                    error_codes::DUPLICATE_FUNCTION,
                    format!("Duplicate function '{}'", name),
                    func.name.span,
                )
                .with_label("redefined here")
                .with_data(DiagnosticData::function(name)),
            );
        }
    }
}

fn check_arity(call: &CallExpr, symbols: &SymbolTable, accept: &mut dyn FnMut(Diagnostic)) {
    let Some(symbol) = call.callee.resolved.and_then(|id| symbols.get(id)) else {
        return;
    };
    if symbol.variadic {
        return;
    }

    let expected = symbol.params.len();
    let actual = call.args.len();
    if expected == actual {
        return;
    }

    let name = &call.callee.ident.name;
    accept(
        Diagnostic::error_with_code(
            error_codes::PARAMETER_MISMATCH,
            format!(
                "Function '{}' expects {} arguments but got {}",
                name, expected, actual
            ),
            call.span,
        )
        .with_label(format!("{} argument(s) supplied", actual))
        .with_data(DiagnosticData::arity(name.as_str(), expected, actual)),
    );
}

/// Only the top-level statement list is scanned; a return nested in an
/// `if` or `while` does not count.
fn check_return_shape(func: &FunctionDecl, accept: &mut dyn FnMut(Diagnostic)) {
    let name = &func.name.name;
    let ty = func.return_type.name;

    let first_return = func.body.statements.iter().find_map(|stmt| match stmt {
        Stmt::Return(ret) => Some(ret),
        _ => None,
    });

    match (ty.is_void(), first_return) {
        (false, None) => accept(
            Diagnostic::error_with_code(
                error_codes::MISSING_RETURN,
                format!(
                    "Function '{}' with return type '{}' is missing a return statement",
                    name, ty
                ),
                func.name.span,
            )
            .with_label(format!("expected to return '{}'", ty))
            .with_data(DiagnosticData::function(name.as_str()).with_return_type(ty.as_str())),
        ),
        (false, Some(ret)) if ret.value.is_none() => accept(
            Diagnostic::error_with_code(
                error_codes::EMPTY_RETURN,
                format!("Function '{}' must return a value of type '{}'", name, ty),
                ret.span,
            )
            .with_label("missing return value")
            .with_data(DiagnosticData::function(name.as_str()).with_return_type(ty.as_str())),
        ),
        (true, Some(ret)) if ret.value.is_some() => accept(
            Diagnostic::error_with_code(
                error_codes::VOID_RETURN_VALUE,
                format!("Void function '{}' should not return a value", name),
                ret.span,
            )
            .with_label("value returned here")
            .with_help("remove the returned expression")
            .with_data(DiagnosticData::function(name.as_str())),
        ),
        _ => {}
    }
}

fn check_void_values(program: &Program, symbols: &SymbolTable, accept: &mut dyn FnMut(Diagnostic)) {
    let mut visit = |expr: &Expr| {
        walk_expr(expr, &mut |sub| report_void_call(sub, symbols, accept));
    };

    for item in &program.items {
        match item {
            Item::Declaration(group) => group.expressions().into_iter().for_each(&mut visit),
            Item::Function(func) => walk_stmts(&func.body.statements, &mut |stmt| {
                match stmt {
                    // A bare call statement discards its result
                    Stmt::Expr(ExprStmt {
                        expr: Expr::Call(call),
                        ..
                    }) => call.args.iter().for_each(&mut visit),
                    _ => stmt.expressions().into_iter().for_each(&mut visit),
                }
            }),
        }
    }
}

fn report_void_call(expr: &Expr, symbols: &SymbolTable, accept: &mut dyn FnMut(Diagnostic)) {
    let Expr::Call(call) = expr else {
        return;
    };
    let Some(symbol) = call.callee.resolved.and_then(|id| symbols.get(id)) else {
        return;
    };
    if !symbol.ty.is_void() {
        return;
    }

    let name = &call.callee.ident.name;
    accept(
        Diagnostic::error_with_code(
            error_codes::VOID_ASSIGNMENT,
            format!(
                "Void function '{}' does not return a value and cannot be used in an expression",
                name
            ),
            call.span,
        )
        .with_label("this call has no value")
        .with_data(DiagnosticData::function(name.as_str())),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::test_support::{linked, with_code};
    use crate::validation::validate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_duplicate_function_on_second_definition() {
        let source = "void f() {}\nvoid g() {}\nvoid f() {}";
        let (program, symbols) = linked(source);
        let diags = validate(&program, &symbols);
        let dups = with_code(&diags, error_codes::DUPLICATE_FUNCTION);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].span.start, source.rfind('f').unwrap());
    }

    #[test]
    fn test_arity_payload() {
        let source = "int foo(int a, int b, int c) { return a + b + c; }\nint main() { return foo(1, 2); }";
        let (program, symbols) = linked(source);
        let diags = validate(&program, &symbols);
        let mismatch = with_code(&diags, error_codes::PARAMETER_MISMATCH);
        assert_eq!(mismatch.len(), 1);
        assert_eq!(mismatch[0].message, "Function 'foo' expects 3 arguments but got 2");
        let data = mismatch[0].data().unwrap();
        assert_eq!(data.function_name.as_deref(), Some("foo"));
        assert_eq!(data.expected_count, Some(3));
        assert_eq!(data.actual_count, Some(2));
        let call = "foo(1, 2)";
        let start = source.find(call).unwrap();
        assert_eq!((mismatch[0].span.start, mismatch[0].span.end), (start, start + call.len()));
    }

    #[test]
    fn test_builtins_skip_arity() {
        let (program, symbols) = linked("int main() { printf(\"%d %d\", 1, 2); return 0; }");
        let diags = validate(&program, &symbols);
        assert!(with_code(&diags, error_codes::PARAMETER_MISMATCH).is_empty());
    }

    #[rstest]
    #[case("int f() { int x = 1; x = x; }", Some(error_codes::MISSING_RETURN))]
    #[case("int f() { return; }", Some(error_codes::EMPTY_RETURN))]
    #[case("void f() { return 1; }", Some(error_codes::VOID_RETURN_VALUE))]
    #[case("int f() { return 1; }", None)]
    #[case("void f() { return; }", None)]
    #[case("void f() { }", None)]
    fn test_return_shape(#[case] source: &str, #[case] expected: Option<&str>) {
        let (program, symbols) = linked(source);
        let diags = validate(&program, &symbols);
        let codes: Vec<&str> = diags
            .iter()
            .map(|d| d.code.as_str())
            .filter(|code| {
                [
                    error_codes::MISSING_RETURN,
                    error_codes::EMPTY_RETURN,
                    error_codes::VOID_RETURN_VALUE,
                ]
                .contains(code)
            })
            .collect();
        assert_eq!(codes, expected.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_nested_return_does_not_satisfy_requirement() {
        let (program, symbols) = linked("int f(int a) { if (a) { return 1; } }");
        let diags = validate(&program, &symbols);
        let missing = with_code(&diags, error_codes::MISSING_RETURN);
        assert_eq!(missing.len(), 1);
        assert_eq!(
            missing[0].data().and_then(|d| d.return_type.as_deref()),
            Some("int")
        );
    }

    #[test]
    fn test_void_call_in_value_position() {
        let source = "void log() {}\nint main() { int x = log(); log(); x = x + log(); return x; }";
        let (program, symbols) = linked(source);
        let diags = validate(&program, &symbols);
        let voids = with_code(&diags, error_codes::VOID_ASSIGNMENT);
        assert_eq!(voids.len(), 2);
        assert!(voids
            .iter()
            .all(|d| d.data().and_then(|data| data.function_name.as_deref()) == Some("log")));
    }

    #[test]
    fn test_void_call_as_argument_is_a_value() {
        let (program, symbols) = linked("void log() {}\nint main() { putchar(log()); return 0; }");
        let diags = validate(&program, &symbols);
        assert_eq!(with_code(&diags, error_codes::VOID_ASSIGNMENT).len(), 1);
    }
}
