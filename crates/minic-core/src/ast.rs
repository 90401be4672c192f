//! Abstract Syntax Tree (AST) definitions
//!
//! Every identifier use carries a reference slot that the linker fills with
//! the [`SymbolId`] it resolves to, or leaves empty when resolution fails.
//! Validators only read these slots; they never mutate the tree.

use crate::span::Span;
use crate::symbol::SymbolId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// AST schema version
///
/// Included in JSON dumps. Increment when making breaking changes to the
/// AST structure.
pub const AST_VERSION: u32 = 1;

/// Top-level program containing all items
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Item>,
}

/// Versioned AST wrapper for JSON serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedProgram {
    pub ast_version: u32,
    #[serde(flatten)]
    pub program: Program,
}

impl VersionedProgram {
    pub fn new(program: Program) -> Self {
        Self {
            ast_version: AST_VERSION,
            program,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Top-level item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Function(FunctionDecl),
    Declaration(DeclGroup),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Function(func) => func.span,
            Item::Declaration(group) => group.span,
        }
    }
}

/// Identifier with its source location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

/// Built-in scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    Int,
    Float,
    Char,
    Void,
}

impl TypeName {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeName::Int => "int",
            TypeName::Float => "float",
            TypeName::Char => "char",
            TypeName::Void => "void",
        }
    }

    pub fn from_keyword(text: &str) -> Option<TypeName> {
        match text {
            "int" => Some(TypeName::Int),
            "float" => Some(TypeName::Float),
            "char" => Some(TypeName::Char),
            "void" => Some(TypeName::Void),
            _ => None,
        }
    }

    pub fn is_void(self) -> bool {
        self == TypeName::Void
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type annotation as written in source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: TypeName,
    pub span: Span,
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub return_type: TypeRef,
    pub name: Identifier,
    pub params: Vec<Param>,
    pub body: Block,
    pub span: Span,
    /// Filled by the linker
    #[serde(default)]
    pub symbol: Option<SymbolId>,
}

/// Function parameter (`int x`, `int xs[]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub type_ref: TypeRef,
    pub name: Identifier,
    pub is_array: bool,
    pub span: Span,
    #[serde(default)]
    pub symbol: Option<SymbolId>,
}

/// Declaration group: one type followed by comma-separated declarators
///
/// `int a, b[3] = {1, 2, 3}, c = 4;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclGroup {
    pub type_ref: TypeRef,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

/// A single declared name within a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declarator {
    pub name: Identifier,
    /// Array dimensions, outermost first
    pub dims: Vec<ArrayDim>,
    pub init: Option<Initializer>,
    pub span: Span,
    #[serde(default)]
    pub symbol: Option<SymbolId>,
}

impl Declarator {
    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }

    /// Literal first-dimension size, when written as an integer literal
    pub fn declared_size(&self) -> Option<usize> {
        self.dims.first().and_then(ArrayDim::literal_size)
    }
}

/// One `[size]` suffix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayDim {
    pub size: Option<Expr>,
    pub span: Span,
}

impl ArrayDim {
    pub fn literal_size(&self) -> Option<usize> {
        match &self.size {
            Some(Expr::Literal(Literal {
                kind: LiteralKind::Int,
                text,
                ..
            })) => text.parse().ok(),
            _ => None,
        }
    }
}

/// Declarator initializer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    Expr(Expr),
    List(InitList),
}

impl Initializer {
    pub fn span(&self) -> Span {
        match self {
            Initializer::Expr(expr) => expr.span(),
            Initializer::List(list) => list.span,
        }
    }
}

/// Brace initializer list; nested lists are single elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitList {
    pub elements: Vec<Initializer>,
    pub span: Span,
}

/// Block of statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Declaration(DeclGroup),
    Expr(ExprStmt),
    If(IfStmt),
    While(WhileStmt),
    Block(Block),
    Return(ReturnStmt),
    Break(Span),
    Continue(Span),
    Empty(Span),
}

/// Expression statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// If statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

/// While loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// Return statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Name(NameRef),
    Call(CallExpr),
    Index(IndexExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Assign(AssignExpr),
    Group(GroupExpr),
}

/// Literal value, kept as source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub kind: LiteralKind,
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Int,
    Float,
    Char,
    String,
}

/// Identifier use with its reference slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameRef {
    pub ident: Identifier,
    #[serde(default)]
    pub resolved: Option<SymbolId>,
}

impl NameRef {
    pub fn new(ident: Identifier) -> Self {
        Self {
            ident,
            resolved: None,
        }
    }
}

/// Function call; callees are always plain names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: NameRef,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// Array index expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexExpr {
    pub target: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Negate,
    Not,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
}

/// Assignment (`=`, `+=`, ...) used as an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignExpr {
    pub op: AssignOp,
    pub target: Box<Expr>,
    pub value: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

/// Parenthesized expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupExpr {
    pub expr: Box<Expr>,
    pub span: Span,
}

// Helper methods for getting spans from AST nodes

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(lit) => lit.span,
            Expr::Name(name) => name.ident.span,
            Expr::Call(call) => call.span,
            Expr::Index(index) => index.span,
            Expr::Unary(unary) => unary.span,
            Expr::Binary(binary) => binary.span,
            Expr::Assign(assign) => assign.span,
            Expr::Group(group) => group.span,
        }
    }

    /// Direct subexpressions in source order
    pub fn subexpressions(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_) | Expr::Name(_) => Vec::new(),
            Expr::Call(call) => call.args.iter().collect(),
            Expr::Index(index) => vec![&*index.target, &*index.index],
            Expr::Unary(unary) => vec![&*unary.expr],
            Expr::Binary(binary) => vec![&*binary.left, &*binary.right],
            Expr::Assign(assign) => vec![&*assign.target, &*assign.value],
            Expr::Group(group) => vec![&*group.expr],
        }
    }
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Declaration(group) => group.span,
            Stmt::Expr(stmt) => stmt.span,
            Stmt::If(stmt) => stmt.span,
            Stmt::While(stmt) => stmt.span,
            Stmt::Block(block) => block.span,
            Stmt::Return(stmt) => stmt.span,
            Stmt::Break(span) | Stmt::Continue(span) | Stmt::Empty(span) => *span,
        }
    }

    /// Statements nested directly inside this one.
    ///
    /// This is the single accessor used by passes that recurse through
    /// statement structure without caring about the statement kind.
    pub fn nested_statements(&self) -> Vec<&Stmt> {
        match self {
            Stmt::Block(block) => block.statements.iter().collect(),
            Stmt::If(stmt) => {
                let mut nested = vec![&*stmt.then_branch];
                if let Some(else_branch) = &stmt.else_branch {
                    nested.push(else_branch);
                }
                nested
            }
            Stmt::While(stmt) => vec![&*stmt.body],
            Stmt::Declaration(_)
            | Stmt::Expr(_)
            | Stmt::Return(_)
            | Stmt::Break(_)
            | Stmt::Continue(_)
            | Stmt::Empty(_) => Vec::new(),
        }
    }

    /// Expressions owned directly by this statement, excluding those inside
    /// nested statements
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            Stmt::Declaration(group) => group.expressions(),
            Stmt::Expr(stmt) => vec![&stmt.expr],
            Stmt::If(stmt) => vec![&stmt.cond],
            Stmt::While(stmt) => vec![&stmt.cond],
            Stmt::Return(stmt) => stmt.value.iter().collect(),
            Stmt::Block(_) | Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty(_) => Vec::new(),
        }
    }
}

impl DeclGroup {
    /// Array sizes and initializer expressions, in source order
    pub fn expressions(&self) -> Vec<&Expr> {
        let mut exprs = Vec::new();
        for declarator in &self.declarators {
            exprs.extend(declarator.dims.iter().filter_map(|dim| dim.size.as_ref()));
            if let Some(init) = &declarator.init {
                init.collect_expressions(&mut exprs);
            }
        }
        exprs
    }
}

impl Initializer {
    fn collect_expressions<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Initializer::Expr(expr) => out.push(expr),
            Initializer::List(list) => {
                for element in &list.elements {
                    element.collect_expressions(out);
                }
            }
        }
    }
}
