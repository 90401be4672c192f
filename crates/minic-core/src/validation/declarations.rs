//! Declaration and reference checks
//!
//! - duplicate names inside one declaration group
//! - uses whose reference slot stayed empty after linking
//! - array initializers longer than the literal first dimension
//! - `void` variables and string literals bound to non-`char` arrays

use super::{walk_program_exprs, walk_stmts};
use crate::ast::*;
use crate::diagnostic::{error_codes, Diagnostic, DiagnosticData};
use std::collections::HashSet;

pub(super) fn check(program: &Program, accept: &mut dyn FnMut(Diagnostic)) {
    for item in &program.items {
        match item {
            Item::Declaration(group) => check_group(group, accept),
            Item::Function(func) => walk_stmts(&func.body.statements, &mut |stmt| {
                if let Stmt::Declaration(group) = stmt {
                    check_group(group, accept);
                }
            }),
        }
    }

    walk_program_exprs(program, &mut |expr| check_reference(expr, accept));
}

fn check_group(group: &DeclGroup, accept: &mut dyn FnMut(Diagnostic)) {
    let mut seen: HashSet<&str> = HashSet::new();

    for declarator in &group.declarators {
        let name = declarator.name.name.as_str();
        if !seen.insert(name) {
            accept(
                Diagnostic::error_with_code(
                    error_codes::DUPLICATE_DECLARATION,
                    format!("Duplicate declaration of '{}'", name),
                    declarator.name.span,
                )
                .with_label("already declared in this declaration")
                .with_data(DiagnosticData::variable(name)),
            );
        }

        check_array_bound(declarator, accept);
        check_literal_type(group.type_ref.name, declarator, accept);
    }
}

fn check_array_bound(declarator: &Declarator, accept: &mut dyn FnMut(Diagnostic)) {
    let (Some(declared), Some(Initializer::List(list))) =
        (declarator.declared_size(), &declarator.init)
    else {
        return;
    };

    let actual = list.elements.len();
    if actual <= declared {
        return;
    }

    let name = &declarator.name.name;
    accept(
        Diagnostic::error_with_code(
            error_codes::ARRAY_SIZE_OVERFLOW,
            format!(
                "Array '{}' declared with size {} but initialized with {} elements",
                name, declared, actual
            ),
            declarator.span,
        )
        .with_label(format!("{} elements do not fit in {}", actual, declared))
        .with_help(format!(
            "declare the array as '{}[{}]' or remove {} element(s)",
            name,
            actual,
            actual - declared
        ))
        .with_data(DiagnosticData::array_size(name.as_str(), declared, actual)),
    );
}

fn check_literal_type(ty: TypeName, declarator: &Declarator, accept: &mut dyn FnMut(Diagnostic)) {
    let name = &declarator.name.name;

    if ty.is_void() {
        accept(
            Diagnostic::error_with_code(
                error_codes::TYPE_MISMATCH,
                format!("Type mismatch: variable '{}' cannot have type 'void'", name),
                declarator.name.span,
            )
            .with_label("void has no values")
            .with_data(DiagnosticData::variable(name.as_str())),
        );
        return;
    }

    let Some(Initializer::Expr(Expr::Literal(Literal {
        kind: LiteralKind::String,
        span,
        ..
    }))) = &declarator.init
    else {
        return;
    };

    let char_array = ty == TypeName::Char && declarator.is_array();
    if !char_array {
        let target = if declarator.is_array() {
            format!("'{}' array", ty)
        } else {
            format!("'{}' variable", ty)
        };
        accept(
            Diagnostic::error_with_code(
                error_codes::TYPE_MISMATCH,
                format!(
                    "Type mismatch: cannot initialize {} '{}' with a string literal",
                    target, name
                ),
                *span,
            )
            .with_label("string literal")
            .with_help("only 'char' arrays can hold strings")
            .with_data(DiagnosticData::variable(name.as_str())),
        );
    }
}

fn check_reference(expr: &Expr, accept: &mut dyn FnMut(Diagnostic)) {
    match expr {
        Expr::Name(name) if name.resolved.is_none() => {
            let used = &name.ident.name;
            accept(
                Diagnostic::error_with_code(
                    error_codes::UNDEFINED_VARIABLE,
                    format!("Undefined variable '{}'", used),
                    name.ident.span,
                )
                .with_label("not declared before this use")
                .with_data(DiagnosticData::variable(used.as_str())),
            );
        }
        Expr::Call(call) if call.callee.resolved.is_none() => {
            let used = &call.callee.ident.name;
            accept(
                Diagnostic::error_with_code(
                    error_codes::UNDEFINED_FUNCTION,
                    format!("Undefined function '{}'", used),
                    call.callee.ident.span,
                )
                .with_label("no function with this name")
                .with_data(DiagnosticData::function(used.as_str())),
            );
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::test_support::{linked, with_code};
    use crate::validation::validate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_in_group_reported_once_on_second_occurrence() {
        let source = "void f() { int a, a, b; a = b; }";
        let (program, symbols) = linked(source);
        let diags = validate(&program, &symbols);
        let dups = with_code(&diags, error_codes::DUPLICATE_DECLARATION);
        assert_eq!(dups.len(), 1);
        let second_a = source.find("a, b").unwrap();
        assert_eq!(dups[0].span.start, second_a);
        assert_eq!(
            dups[0].data().and_then(|d| d.variable_name.as_deref()),
            Some("a")
        );
    }

    #[test]
    fn test_same_name_in_separate_groups_is_not_a_duplicate() {
        let (program, symbols) = linked("int a;\nint a;");
        let diags = validate(&program, &symbols);
        assert!(with_code(&diags, error_codes::DUPLICATE_DECLARATION).is_empty());
    }

    #[test]
    fn test_array_overflow_payload() {
        let (program, symbols) = linked("int arr[3] = {1,2,3,4,5};");
        let diags = validate(&program, &symbols);
        let overflow = with_code(&diags, error_codes::ARRAY_SIZE_OVERFLOW);
        assert_eq!(overflow.len(), 1);
        assert_eq!(
            overflow[0].message,
            "Array 'arr' declared with size 3 but initialized with 5 elements"
        );
        let data = overflow[0].data().unwrap();
        assert_eq!(data.array_name.as_deref(), Some("arr"));
        assert_eq!(data.declared_size, Some(3));
        assert_eq!(data.actual_size, Some(5));
    }

    #[test]
    fn test_array_bound_checks_first_dimension_only() {
        let (program, symbols) = linked("int m[2][2] = {{1, 2, 3}, {4}};");
        let diags = validate(&program, &symbols);
        assert!(with_code(&diags, error_codes::ARRAY_SIZE_OVERFLOW).is_empty());
    }

    #[test]
    fn test_undefined_references() {
        let (program, symbols) = linked("int main() { return missing + helper(1); }");
        let diags = validate(&program, &symbols);

        let vars = with_code(&diags, error_codes::UNDEFINED_VARIABLE);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].message, "Undefined variable 'missing'");

        let funcs = with_code(&diags, error_codes::UNDEFINED_FUNCTION);
        assert_eq!(funcs.len(), 1);
        assert_eq!(
            funcs[0].data().and_then(|d| d.function_name.as_deref()),
            Some("helper")
        );
    }

    #[test]
    fn test_builtins_are_defined() {
        let (program, symbols) = linked("int main() { printf(\"%d\", 1); return getchar(); }");
        let diags = validate(&program, &symbols);
        assert!(with_code(&diags, error_codes::UNDEFINED_FUNCTION).is_empty());
    }

    #[test]
    fn test_string_literal_type_checks() {
        let (program, symbols) = linked("char name[8] = \"ada\";\nint n = \"ada\";\nvoid v;");
        let diags = validate(&program, &symbols);
        let mismatches = with_code(&diags, error_codes::TYPE_MISMATCH);
        assert_eq!(mismatches.len(), 2);
        assert!(mismatches[0].message.contains("'int' variable 'n'"));
        assert!(mismatches[1].message.contains("cannot have type 'void'"));
    }
}
