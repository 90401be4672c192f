//! Innermost-node lookup by byte offset
//!
//! Descends from the top-level items, at each level taking the first child
//! whose span contains the offset, until no child qualifies.

use crate::ast::*;
use crate::span::Span;

/// A borrowed AST node of any kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    Function(&'a FunctionDecl),
    Param(&'a Param),
    DeclGroup(&'a DeclGroup),
    Declarator(&'a Declarator),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl<'a> Node<'a> {
    pub fn span(&self) -> Span {
        match self {
            Node::Function(func) => func.span,
            Node::Param(param) => param.span,
            Node::DeclGroup(group) => group.span,
            Node::Declarator(declarator) => declarator.span,
            Node::Stmt(stmt) => stmt.span(),
            Node::Expr(expr) => expr.span(),
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<Node<'a>> {
        match *self {
            Node::Function(func) => func
                .params
                .iter()
                .map(Node::Param)
                .chain(func.body.statements.iter().map(Node::Stmt))
                .collect(),
            Node::Param(_) => Vec::new(),
            Node::DeclGroup(group) => group.declarators.iter().map(Node::Declarator).collect(),
            Node::Declarator(declarator) => {
                let mut children: Vec<Node<'a>> = declarator
                    .dims
                    .iter()
                    .filter_map(|dim| dim.size.as_ref())
                    .map(Node::Expr)
                    .collect();
                if let Some(init) = &declarator.init {
                    collect_initializer(init, &mut children);
                }
                children
            }
            Node::Stmt(Stmt::Declaration(group)) => vec![Node::DeclGroup(group)],
            Node::Stmt(stmt) => {
                let mut children: Vec<Node<'a>> = stmt
                    .expressions()
                    .into_iter()
                    .map(Node::Expr)
                    .chain(stmt.nested_statements().into_iter().map(Node::Stmt))
                    .collect();
                children.sort_by_key(|child| child.span().start);
                children
            }
            Node::Expr(expr) => expr.subexpressions().into_iter().map(Node::Expr).collect(),
        }
    }
}

fn collect_initializer<'a>(init: &'a Initializer, out: &mut Vec<Node<'a>>) {
    match init {
        Initializer::Expr(expr) => out.push(Node::Expr(expr)),
        Initializer::List(list) => {
            for element in &list.elements {
                collect_initializer(element, out);
            }
        }
    }
}

/// The innermost node at an offset together with its ancestors
#[derive(Debug, Clone, PartialEq)]
pub struct NodePath<'a> {
    innermost: Node<'a>,
    /// Outermost first
    ancestors: Vec<Node<'a>>,
}

impl<'a> NodePath<'a> {
    pub fn innermost(&self) -> Node<'a> {
        self.innermost
    }

    /// Ancestors from the direct parent outwards
    pub fn ancestors(&self) -> impl Iterator<Item = Node<'a>> + '_ {
        self.ancestors.iter().rev().copied()
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len() + 1
    }
}

/// Find the innermost node containing `offset`
pub fn locate(program: &Program, offset: usize) -> Option<NodePath<'_>> {
    let root = program
        .items
        .iter()
        .map(|item| match item {
            Item::Function(func) => Node::Function(func),
            Item::Declaration(group) => Node::DeclGroup(group),
        })
        .find(|node| node.span().contains_offset(offset))?;

    let mut ancestors = Vec::new();
    let mut current = root;
    while let Some(child) = current
        .children()
        .into_iter()
        .find(|child| child.span().contains_offset(offset))
    {
        ancestors.push(current);
        current = child;
    }

    Some(NodePath {
        innermost: current,
        ancestors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::linker::link;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn program(source: &str) -> Program {
        let (tokens, _) = tokenize(source);
        let (mut program, _) = parse(tokens);
        link(&mut program);
        program
    }

    #[test]
    fn test_innermost_name_in_expression() {
        let source = "int main() { int total = 1; return total + 2; }";
        let program = program(source);
        let offset = source.rfind("total").unwrap() + 2;
        let path = locate(&program, offset).unwrap();

        let Node::Expr(Expr::Name(name)) = path.innermost() else {
            panic!("expected a name, got {:?}", path.innermost());
        };
        assert_eq!(name.ident.name, "total");

        let kinds: Vec<&str> = path
            .ancestors()
            .map(|node| match node {
                Node::Function(_) => "function",
                Node::Stmt(_) => "stmt",
                Node::Expr(_) => "expr",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["expr", "stmt", "function"]);
    }

    #[test]
    fn test_declarator_and_parameter() {
        let source = "int f(int p) { int arr[2] = {p, 1}; return arr[0]; }";
        let program = program(source);

        let path = locate(&program, source.find("p)").unwrap()).unwrap();
        assert!(matches!(path.innermost(), Node::Param(param) if param.name.name == "p"));

        let path = locate(&program, source.find("arr").unwrap()).unwrap();
        assert!(matches!(path.innermost(), Node::Declarator(d) if d.name.name == "arr"));
        assert!(path
            .ancestors()
            .any(|node| matches!(node, Node::DeclGroup(_))));
    }

    #[test]
    fn test_outside_any_item() {
        let source = "int a;\n\n\nint b;";
        let program = program(source);
        assert!(locate(&program, 8).is_none());
        assert_eq!(locate(&program, 0).unwrap().depth(), 1);
    }
}
