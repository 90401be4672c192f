//! Hover information provider for LSP
//!
//! Shows the declared shape of the identifier under the cursor: variable
//! references, calls, function definitions, declarators and parameters.

use crate::text::{position_to_offset, span_to_range};
use minic_core::ast::*;
use minic_core::span::{LineIndex, Span};
use minic_core::symbol::{Symbol, SymbolKind, SymbolTable};
use minic_core::{locate, Node, NodePath};
use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

/// Names typed `int` when nothing else says otherwise
const INT_NAMES: [&str; 5] = ["main", "printf", "scanf", "getchar", "putchar"];

/// Everything known about an identifier's type, strongest first
#[derive(Debug, Default)]
struct TypeEvidence<'a> {
    explicit: Option<TypeName>,
    declaration: Option<TypeName>,
    initializer: Option<&'a Initializer>,
    name: &'a str,
}

impl TypeEvidence<'_> {
    fn display_type(&self) -> &'static str {
        if let Some(ty) = self.explicit.or(self.declaration) {
            return ty.as_str();
        }
        if let Some(ty) = self.initializer.and_then(literal_shape) {
            return ty;
        }
        if INT_NAMES.contains(&self.name) {
            return "int";
        }
        "unknown"
    }
}

fn literal_shape(init: &Initializer) -> Option<&'static str> {
    let Initializer::Expr(Expr::Literal(literal)) = init else {
        return None;
    };
    let text = literal.text.as_str();
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        Some("int")
    } else if text.contains('.') && text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        Some("float")
    } else {
        None
    }
}

/// Generate hover information for a position in the document
pub fn generate_hover(
    text: &str,
    position: Position,
    program: &Program,
    symbols: &SymbolTable,
) -> Option<Hover> {
    let index = LineIndex::new(text);
    let offset = position_to_offset(&index, position)?;
    let path = locate(program, offset)?;

    let (span, markdown) = describe(&path, offset, symbols)?;
    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: markdown,
        }),
        range: Some(span_to_range(&index, span)),
    })
}

fn describe(path: &NodePath<'_>, offset: usize, symbols: &SymbolTable) -> Option<(Span, String)> {
    match path.innermost() {
        Node::Expr(Expr::Name(name_ref)) => Some((
            name_ref.ident.span,
            reference_hover(name_ref, symbols),
        )),
        Node::Expr(Expr::Call(call)) if call.callee.ident.span.contains_offset(offset) => Some((
            call.callee.ident.span,
            reference_hover(&call.callee, symbols),
        )),
        Node::Function(func) if func.name.span.contains_offset(offset) => {
            Some((func.name.span, function_hover(func)))
        }
        Node::Declarator(declarator) if declarator.name.span.contains_offset(offset) => {
            let group_type = path.ancestors().find_map(|node| match node {
                Node::DeclGroup(group) => Some(group.type_ref.name),
                _ => None,
            });
            Some((declarator.name.span, declarator_hover(declarator, group_type, path)))
        }
        Node::Param(param) if param.name.span.contains_offset(offset) => {
            Some((param.name.span, param_hover(param)))
        }
        _ => None,
    }
}

fn code_block(signature: &str, label: &str) -> String {
    format!("```c\n{}\n```\n\n{}", signature, label)
}

fn dims_suffix(dims: &[Option<usize>]) -> String {
    dims.iter()
        .map(|dim| match dim {
            Some(size) => format!("[{}]", size),
            None => "[]".to_string(),
        })
        .collect()
}

fn reference_hover(name_ref: &NameRef, symbols: &SymbolTable) -> String {
    let name = name_ref.ident.name.as_str();
    let Some(symbol) = name_ref.resolved.and_then(|id| symbols.get(id)) else {
        let evidence = TypeEvidence {
            name,
            ..TypeEvidence::default()
        };
        return code_block(&format!("{} {}", evidence.display_type(), name), "(undefined)");
    };

    let evidence = TypeEvidence {
        explicit: Some(symbol.ty),
        name,
        ..TypeEvidence::default()
    };
    let ty = evidence.display_type();
    match symbol.kind {
        SymbolKind::Function => code_block(&symbol_signature(symbol, ty), function_label(symbol)),
        SymbolKind::Parameter => code_block(
            &format!("{} {}{}", ty, name, dims_suffix(&symbol.dims)),
            "(parameter)",
        ),
        SymbolKind::Variable | SymbolKind::Array => code_block(
            &format!("{} {}{}", ty, name, dims_suffix(&symbol.dims)),
            variable_label(symbol),
        ),
    }
}

fn symbol_signature(symbol: &Symbol, ty: &str) -> String {
    let params = if symbol.variadic {
        "...".to_string()
    } else {
        symbol
            .params
            .iter()
            .map(|param| param.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{} {}({})", ty, symbol.name, params)
}

fn function_label(symbol: &Symbol) -> &'static str {
    if symbol.is_builtin() {
        "(built-in function)"
    } else {
        "(function)"
    }
}

fn variable_label(symbol: &Symbol) -> &'static str {
    match (symbol.kind, symbol.scope == SymbolTable::GLOBAL) {
        (SymbolKind::Array, true) => "(global array)",
        (SymbolKind::Array, false) => "(local array)",
        (_, true) => "(global variable)",
        (_, false) => "(local variable)",
    }
}

fn function_hover(func: &FunctionDecl) -> String {
    let evidence = TypeEvidence {
        explicit: Some(func.return_type.name),
        name: &func.name.name,
        ..TypeEvidence::default()
    };
    let params = func
        .params
        .iter()
        .map(|param| {
            format!(
                "{} {}{}",
                param.type_ref.name.as_str(),
                param.name.name,
                if param.is_array { "[]" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    code_block(
        &format!("{} {}({})", evidence.display_type(), func.name.name, params),
        "(function)",
    )
}

fn declarator_hover(
    declarator: &Declarator,
    group_type: Option<TypeName>,
    path: &NodePath<'_>,
) -> String {
    let evidence = TypeEvidence {
        declaration: group_type,
        initializer: declarator.init.as_ref(),
        name: &declarator.name.name,
        ..TypeEvidence::default()
    };
    let dims: Vec<Option<usize>> = declarator.dims.iter().map(ArrayDim::literal_size).collect();
    let local = path
        .ancestors()
        .any(|node| matches!(node, Node::Function(_)));
    let label = match (declarator.is_array(), local) {
        (true, true) => "(local array)",
        (true, false) => "(global array)",
        (false, true) => "(local variable)",
        (false, false) => "(global variable)",
    };
    code_block(
        &format!(
            "{} {}{}",
            evidence.display_type(),
            declarator.name.name,
            dims_suffix(&dims)
        ),
        label,
    )
}

fn param_hover(param: &Param) -> String {
    let evidence = TypeEvidence {
        explicit: Some(param.type_ref.name),
        name: &param.name.name,
        ..TypeEvidence::default()
    };
    code_block(
        &format!(
            "{} {}{}",
            evidence.display_type(),
            param.name.name,
            if param.is_array { "[]" } else { "" }
        ),
        "(parameter)",
    )
}
