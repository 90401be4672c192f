//! Built-in resolvers, one per kind of repair
//!
//! Each resolver reads the payload through [`FixContext`] and the current
//! text. Anything it cannot find yields no action.

use super::context::FixContext;
use super::{action_kinds, create_code_action, create_command_action, QuickFixResult};
use crate::commands::{self, DeferredCommand};
use crate::text::{
    edit_distance, find_matching_close, fresh_name, is_identifier, line_indent, rewrite_items,
    span_to_range, split_top_level, typed_default,
};
use minic_core::ast::Item;
use minic_core::span::Span;
use minic_core::symbol::SymbolTable;
use minic_core::{analyze, error_codes, AnalysisOptions};
use tower_lsp::lsp_types::{CodeAction, TextEdit};

/// Largest edit distance for a rename suggestion
const MAX_SUGGESTION_DISTANCE: usize = 2;

fn quick_fix(ctx: &FixContext<'_>, title: String, edits: Vec<TextEdit>) -> CodeAction {
    create_code_action(title, ctx.uri, edits, action_kinds::quick_fix(), Some(ctx.diagnostic))
}

fn command_fix(
    ctx: &FixContext<'_>,
    title: &str,
    command: DeferredCommand,
) -> QuickFixResult<CodeAction> {
    create_command_action(title, &command, action_kinds::quick_fix(), Some(ctx.diagnostic))
}

fn edit(ctx: &FixContext<'_>, span: Span, new_text: impl Into<String>) -> TextEdit {
    TextEdit {
        range: span_to_range(ctx.index, span),
        new_text: new_text.into(),
    }
}

/// The line holding the start of the diagnostic, newline excluded
fn start_line(ctx: &FixContext<'_>) -> Option<Span> {
    ctx.index.line_span(ctx.diagnostic.range.start.line)
}

/// A whole line including its newline
fn with_newline(ctx: &FixContext<'_>, line: Span) -> Span {
    let end = if line.end < ctx.text.len() {
        line.end + 1
    } else {
        line.end
    };
    Span::new(line.start, end)
}

/// The diagnostic span, when it covers exactly `name`
fn name_span(ctx: &FixContext<'_>, name: &str) -> Option<Span> {
    let span = ctx.span()?;
    (ctx.slice(span)? == name).then_some(span)
}

pub fn declare_variable(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let Some(name) = ctx.variable_name().filter(|name| is_identifier(name)) else {
        return Ok(None);
    };
    let Some(line) = start_line(ctx) else {
        return Ok(None);
    };
    let indent = line_indent(ctx.slice(line).unwrap_or_default());

    Ok(Some(quick_fix(
        ctx,
        format!("Declare variable '{}'", name),
        vec![edit(
            ctx,
            Span::point(line.start),
            format!("{}int {} = 0;\n", indent, name),
        )],
    )))
}

/// Rename an undefined name to the closest variable visible before the use
pub fn rename_to_similar(ctx: &FixContext<'_>) -> QuickFixResult<Vec<CodeAction>> {
    let (Some(name), Some(span)) = (ctx.variable_name(), ctx.span()) else {
        return Ok(Vec::new());
    };

    let analysis = analyze(
        ctx.text,
        AnalysisOptions {
            enrich: false,
            unused_variables: false,
        },
    );
    let function = analysis.program.items.iter().find_map(|item| match item {
        Item::Function(func) if func.span.contains_offset(span.start) => Some(func.span),
        _ => None,
    });

    let Some(candidate) = closest_name(&analysis.symbols, &name, span.start, function) else {
        return Ok(Vec::new());
    };

    Ok(vec![quick_fix(
        ctx,
        format!("Change to '{}'", candidate),
        vec![edit(ctx, span, candidate.clone())],
    )])
}

fn closest_name(
    symbols: &SymbolTable,
    name: &str,
    use_offset: usize,
    function: Option<Span>,
) -> Option<String> {
    symbols
        .symbols()
        .filter(|(_, symbol)| !symbol.is_function() && symbol.name != name)
        .filter(|(_, symbol)| symbol.span.start < use_offset)
        .filter(|(_, symbol)| {
            symbol.scope == SymbolTable::GLOBAL
                || function.is_some_and(|f| f.contains_offset(symbol.span.start))
        })
        .map(|(_, symbol)| (edit_distance(name, &symbol.name), symbol))
        .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
        // First declared wins a tie
        .min_by_key(|(distance, symbol)| (*distance, symbol.span.start))
        .map(|(_, symbol)| symbol.name.clone())
}

/// Append `int name(int arg1, ...) { return 0; }` to the document
pub fn create_function_stub(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let Some(name) = ctx.function_name().filter(|name| is_identifier(name)) else {
        return Ok(None);
    };

    let arity = ctx
        .span()
        .and_then(|span| {
            let after = ctx.text.get(span.end..)?;
            let open = span.end + after.len() - after.trim_start().len();
            (ctx.text.as_bytes().get(open) == Some(&b'(')).then_some(open)
        })
        .and_then(|open| {
            let close = find_matching_close(ctx.text, open)?;
            Some(split_top_level(ctx.text, open, close).len())
        })
        .unwrap_or(0);

    let params = (1..=arity)
        .map(|n| format!("int arg{}", n))
        .collect::<Vec<_>>()
        .join(", ");
    let separator = if ctx.text.is_empty() || ctx.text.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    };
    let stub = format!(
        "{}int {}({}) {{\n    return 0;\n}}\n",
        separator, name, params
    );

    Ok(Some(quick_fix(
        ctx,
        format!("Create function '{}'", name),
        vec![edit(ctx, Span::point(ctx.text.len()), stub)],
    )))
}

pub fn rename_duplicate(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let name = if ctx.code() == Some(error_codes::DUPLICATE_FUNCTION) {
        ctx.function_name()
    } else {
        ctx.variable_name()
    };
    let Some((name, span)) = name.and_then(|name| Some((name.clone(), name_span(ctx, &name)?)))
    else {
        return Ok(None);
    };

    let renamed = fresh_name(ctx.text, &name);
    Ok(Some(quick_fix(
        ctx,
        format!("Rename to '{}'", renamed),
        vec![edit(ctx, span, renamed.clone())],
    )))
}

/// Rewrite the first dimension to the number of initializer elements
pub fn resize_array(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let (Some(name), Some(lines)) = (ctx.array_name(), ctx.lines()) else {
        return Ok(None);
    };

    let local = commands::find_array_declarator(ctx.text, lines.start, &name)
        .filter(|declarator| declarator.first_dim.start <= lines.end);

    match local {
        Some(declarator) => {
            let actual = ctx
                .array_sizes()
                .map(|(_, actual)| actual)
                .unwrap_or_else(|| declarator.element_count(ctx.text));
            Ok(Some(quick_fix(
                ctx,
                format!("Change size of '{}' to {}", name, actual),
                vec![edit(ctx, declarator.first_dim, actual.to_string())],
            )))
        }
        None => command_fix(
            ctx,
            &format!("Fix size of array '{}'", name),
            DeferredCommand::FixArraySize {
                uri: ctx.uri.clone(),
                array_name: name,
                range: ctx.diagnostic.range,
            },
        )
        .map(Some),
    }
}

/// Drop initializer elements past the declared size
pub fn trim_initializer(ctx: &FixContext<'_>) -> QuickFixResult<Vec<CodeAction>> {
    let (Some(name), Some((declared, _)), Some(lines)) =
        (ctx.array_name(), ctx.array_sizes(), ctx.lines())
    else {
        return Ok(Vec::new());
    };

    let rewrite = commands::find_array_declarator(ctx.text, lines.start, &name)
        .filter(|declarator| declarator.first_dim.start <= lines.end)
        .and_then(|d| rewrite_items(ctx.text, d.list_open, d.list_close, declared));

    Ok(rewrite
        .map(|(span, items)| {
            quick_fix(
                ctx,
                format!("Keep only the first {} elements", declared),
                vec![edit(ctx, span, items)],
            )
        })
        .into_iter()
        .collect())
}

/// Pad with `0` or drop arguments so the call matches the declaration
pub fn adjust_arguments(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let (Some((expected, actual)), Some(lines)) = (ctx.argument_counts(), ctx.lines()) else {
        return Ok(None);
    };
    let title = if expected > actual {
        "Add missing arguments"
    } else {
        "Remove extra arguments"
    };

    let start = ctx.span().map_or(lines.start, |span| span.start);
    match commands::call_arguments_edit(ctx.text, Span::new(start, lines.end), expected) {
        Some((span, arguments)) => Ok(Some(quick_fix(
            ctx,
            title.to_string(),
            vec![edit(ctx, span, arguments)],
        ))),
        None => command_fix(
            ctx,
            title,
            DeferredCommand::AdjustParameters {
                uri: ctx.uri.clone(),
                range: ctx.diagnostic.range,
                expected_count: expected,
            },
        )
        .map(Some),
    }
}

pub fn add_return_statement(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let Some(return_type) = ctx.return_type().filter(|ty| typed_default(ty).is_some()) else {
        return Ok(None);
    };

    command_fix(
        ctx,
        "Add return statement",
        DeferredCommand::AddReturnStatement {
            uri: ctx.uri.clone(),
            range: ctx.diagnostic.range,
            return_type,
        },
    )
    .map(Some)
}

/// `return;` in a non-void function becomes `return <default>;`
pub fn return_default_value(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let (Some(span), Some(default)) = (
        ctx.span(),
        ctx.return_type().as_deref().and_then(typed_default),
    ) else {
        return Ok(None);
    };
    if !ctx.slice(span).is_some_and(|text| text.starts_with("return")) {
        return Ok(None);
    }

    Ok(Some(quick_fix(
        ctx,
        format!("Return {}", default),
        vec![edit(ctx, span, format!("return {};", default))],
    )))
}

/// `return expr;` in a void function becomes `return;`
pub fn drop_return_value(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let Some(span) = ctx.span() else {
        return Ok(None);
    };
    if !ctx.slice(span).is_some_and(|text| text.starts_with("return")) {
        return Ok(None);
    }

    Ok(Some(quick_fix(
        ctx,
        "Remove return value".to_string(),
        vec![edit(ctx, span, "return;")],
    )))
}

/// Replace the statement using a void call's value with the call alone
pub fn keep_bare_call(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let (Some(call_span), Some(line)) = (ctx.span(), start_line(ctx)) else {
        return Ok(None);
    };
    let Some(call) = ctx.slice(call_span) else {
        return Ok(None);
    };

    // The statement starts after the previous statement or brace on its line
    let before = ctx.text.get(line.start..call_span.start).unwrap_or_default();
    let start = match before.rfind([';', '{', '}']) {
        Some(boundary) => line.start + boundary + 1,
        None => line.start,
    };
    let leading = ctx.text.get(start..call_span.start).unwrap_or_default();
    let start = start + (leading.len() - leading.trim_start().len());

    let Some(semicolon) = ctx
        .text
        .get(call_span.end..)
        .and_then(|rest| rest.find(';'))
        .map(|offset| call_span.end + offset)
    else {
        return Ok(None);
    };

    let title = match ctx.function_name() {
        Some(name) => format!("Call '{}' without using its result", name),
        None => "Call without using the result".to_string(),
    };
    Ok(Some(quick_fix(
        ctx,
        title,
        vec![edit(ctx, Span::new(start, semicolon + 1), format!("{};", call))],
    )))
}

/// Remove a `break` or `continue` outside a loop
pub fn remove_statement(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let (Some(span), Some(line)) = (ctx.span(), start_line(ctx)) else {
        return Ok(None);
    };
    let Some(statement) = ctx.slice(span).map(str::trim) else {
        return Ok(None);
    };
    let keyword = if statement.starts_with("continue") {
        "continue"
    } else {
        "break"
    };

    let alone = ctx.slice(line).map(str::trim) == Some(statement);
    let target = if alone { with_newline(ctx, line) } else { span };

    Ok(Some(quick_fix(
        ctx,
        format!("Remove '{}' statement", keyword),
        vec![edit(ctx, target, "")],
    )))
}

pub fn insert_semicolon(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let Some(span) = ctx.span() else {
        return Ok(None);
    };

    Ok(Some(quick_fix(
        ctx,
        "Insert missing semicolon".to_string(),
        vec![edit(ctx, Span::point(span.end), ";")],
    )))
}

/// Close an unclosed bracket or remove a stray closer
pub fn balance_bracket(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let Some(span) = ctx.span() else {
        return Ok(None);
    };
    let bracket = ctx
        .slice(span)
        .and_then(|text| text.chars().next())
        .or_else(|| ctx.variable_name().and_then(|name| name.chars().next()));

    let fix = match bracket {
        Some('{') => {
            let closer = if ctx.text.ends_with('\n') { "}\n" } else { "\n}" };
            Some((
                "Insert missing '}'".to_string(),
                edit(ctx, Span::point(ctx.text.len()), closer),
            ))
        }
        Some(open @ ('(' | '[')) => {
            let closer = if open == '(' { ')' } else { ']' };
            start_line(ctx).and_then(|line| {
                let content = ctx.slice(line)?.trim_end();
                let body = match content.strip_suffix([';', '{']) {
                    Some(head) => head.trim_end(),
                    None => content,
                };
                Some((
                    format!("Insert missing '{}'", closer),
                    edit(ctx, Span::point(line.start + body.len()), closer.to_string()),
                ))
            })
        }
        Some(close @ (')' | ']' | '}')) => Some((
            format!("Remove unmatched '{}'", close),
            edit(ctx, Span::new(span.start, span.start + 1), ""),
        )),
        _ => None,
    };

    Ok(fix.map(|(title, edit)| quick_fix(ctx, title, vec![edit])))
}

/// Delete a declaration line that only declares the unused variable
pub fn remove_unused_declaration(ctx: &FixContext<'_>) -> QuickFixResult<Option<CodeAction>> {
    let (Some(name), Some(line)) = (ctx.variable_name(), start_line(ctx)) else {
        return Ok(None);
    };
    let Some(content) = ctx.slice(line).map(str::trim) else {
        return Ok(None);
    };

    if !is_lone_declaration(content, &name) {
        return Ok(None);
    }

    Ok(Some(quick_fix(
        ctx,
        format!("Remove unused variable '{}'", name),
        vec![edit(ctx, with_newline(ctx, line), "")],
    )))
}

/// `int name ...;` declaring nothing else and calling nothing
fn is_lone_declaration(line: &str, name: &str) -> bool {
    let Some(rest) = ["int ", "float ", "char "]
        .iter()
        .find_map(|ty| line.strip_prefix(ty))
    else {
        return false;
    };
    let rest = rest.trim_start();
    let Some(after_name) = rest.strip_prefix(name) else {
        return false;
    };
    let declares_only_name = after_name
        .chars()
        .next()
        .is_some_and(|c| !(c.is_ascii_alphanumeric() || c == '_'));

    let Some(close) = line.find(';') else {
        return false;
    };
    let statement = &line[..close];
    let outside_braces = match (statement.find('{'), statement.rfind('}')) {
        (Some(open), Some(end)) => format!("{}{}", &statement[..open], &statement[end + 1..]),
        _ => statement.to_string(),
    };

    declares_only_name
        && close + 1 == line.len()
        && !outside_braces.contains(',')
        && !statement.contains('(')
}

pub fn prefix_underscore(ctx: &FixContext<'_>) -> QuickFixResult<Vec<CodeAction>> {
    let Some((name, span)) = ctx
        .variable_name()
        .and_then(|name| Some((name.clone(), name_span(ctx, &name)?)))
    else {
        return Ok(Vec::new());
    };

    let renamed = format!("_{}", name);
    Ok(vec![quick_fix(
        ctx,
        format!("Rename to '{}'", renamed),
        vec![edit(ctx, span, renamed)],
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("int x;", "x", true)]
    #[case("int x = 1;", "x", true)]
    #[case("int arr[3] = {1, 2, 3};", "arr", true)]
    #[case("int x, y;", "x", false)]
    #[case("int x = f();", "x", false)]
    #[case("int xy;", "x", false)]
    #[case("x = 1;", "x", false)]
    #[case("int x; int y;", "x", false)]
    fn test_lone_declaration(#[case] line: &str, #[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_lone_declaration(line, name), expected);
    }
}
