//! Name linking
//!
//! Two passes over the program:
//! 1. Hoist every top-level function into the global scope (first wins)
//! 2. Walk items in source order, defining declarations and filling the
//!    reference slot of every identifier use
//!
//! Each function gets one flat scope for its parameters and all of its local
//! declarations. A use only sees names declared before it. The linker never
//! reports anything: an unresolved use simply keeps an empty slot and the
//! validators decide what that means.

use crate::ast::*;
use crate::symbol::{ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind, SymbolTable};

/// Linker for name resolution
pub struct Linker {
    table: SymbolTable,
    scope: ScopeId,
}

impl Linker {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            scope: SymbolTable::GLOBAL,
        }
    }

    /// Link a program in place and return the populated symbol table
    pub fn link(mut self, program: &mut Program) -> SymbolTable {
        for item in &mut program.items {
            if let Item::Function(func) = item {
                func.symbol = self.hoist_function(func);
            }
        }

        for item in &mut program.items {
            match item {
                Item::Declaration(group) => self.link_group(group),
                Item::Function(func) => self.link_function(func),
            }
        }

        tracing::debug!(
            symbols = self.table.symbols().count(),
            "linked program"
        );
        self.table
    }

    fn hoist_function(&mut self, func: &FunctionDecl) -> Option<SymbolId> {
        self.table.define(Symbol {
            name: func.name.name.clone(),
            kind: SymbolKind::Function,
            ty: func.return_type.name,
            dims: Vec::new(),
            init_count: None,
            params: func.params.iter().map(|p| p.type_ref.name).collect(),
            variadic: false,
            span: func.name.span,
            scope: SymbolTable::GLOBAL,
        })
    }

    fn link_function(&mut self, func: &mut FunctionDecl) {
        self.scope = self.table.push_scope(
            ScopeKind::Function(func.name.name.clone()),
            SymbolTable::GLOBAL,
        );

        for param in &mut func.params {
            param.symbol = self.table.define(Symbol {
                name: param.name.name.clone(),
                kind: SymbolKind::Parameter,
                ty: param.type_ref.name,
                dims: if param.is_array { vec![None] } else { Vec::new() },
                init_count: None,
                params: Vec::new(),
                variadic: false,
                span: param.name.span,
                scope: self.scope,
            });
        }

        for stmt in &mut func.body.statements {
            self.link_stmt(stmt);
        }

        self.scope = SymbolTable::GLOBAL;
    }

    fn link_group(&mut self, group: &mut DeclGroup) {
        let ty = group.type_ref.name;
        for declarator in &mut group.declarators {
            for dim in &mut declarator.dims {
                if let Some(size) = &mut dim.size {
                    self.link_expr(size);
                }
            }

            let init_count = match &mut declarator.init {
                Some(Initializer::List(list)) => {
                    self.link_init_list(list);
                    Some(list.elements.len())
                }
                Some(Initializer::Expr(expr)) => {
                    self.link_expr(expr);
                    None
                }
                None => None,
            };

            let kind = if declarator.is_array() {
                SymbolKind::Array
            } else {
                SymbolKind::Variable
            };

            // A repeated name keeps an empty slot; the first one stays visible
            declarator.symbol = self.table.define(Symbol {
                name: declarator.name.name.clone(),
                kind,
                ty,
                dims: declarator.dims.iter().map(ArrayDim::literal_size).collect(),
                init_count,
                params: Vec::new(),
                variadic: false,
                span: declarator.name.span,
                scope: self.scope,
            });
        }
    }

    fn link_init_list(&mut self, list: &mut InitList) {
        for element in &mut list.elements {
            match element {
                Initializer::Expr(expr) => self.link_expr(expr),
                Initializer::List(nested) => self.link_init_list(nested),
            }
        }
    }

    fn link_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Declaration(group) => self.link_group(group),
            Stmt::Expr(expr_stmt) => self.link_expr(&mut expr_stmt.expr),
            Stmt::If(if_stmt) => {
                self.link_expr(&mut if_stmt.cond);
                self.link_stmt(&mut if_stmt.then_branch);
                if let Some(else_branch) = &mut if_stmt.else_branch {
                    self.link_stmt(else_branch);
                }
            }
            Stmt::While(while_stmt) => {
                self.link_expr(&mut while_stmt.cond);
                self.link_stmt(&mut while_stmt.body);
            }
            Stmt::Block(block) => {
                for stmt in &mut block.statements {
                    self.link_stmt(stmt);
                }
            }
            Stmt::Return(ret) => {
                if let Some(value) = &mut ret.value {
                    self.link_expr(value);
                }
            }
            Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty(_) => {}
        }
    }

    fn link_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Name(name) => {
                name.resolved = self.resolve(&name.ident.name, |s| !s.is_function());
            }
            Expr::Call(call) => {
                call.callee.resolved = self
                    .table
                    .lookup_local(SymbolTable::GLOBAL, &call.callee.ident.name)
                    .filter(|id| self.table.get(*id).is_some_and(Symbol::is_function));
                for arg in &mut call.args {
                    self.link_expr(arg);
                }
            }
            Expr::Index(index) => {
                self.link_expr(&mut index.target);
                self.link_expr(&mut index.index);
            }
            Expr::Unary(unary) => self.link_expr(&mut unary.expr),
            Expr::Binary(binary) => {
                self.link_expr(&mut binary.left);
                self.link_expr(&mut binary.right);
            }
            Expr::Assign(assign) => {
                self.link_expr(&mut assign.target);
                self.link_expr(&mut assign.value);
            }
            Expr::Group(group) => self.link_expr(&mut group.expr),
        }
    }

    /// Resolve a name from the current scope outwards, accepting only
    /// symbols of the wanted shape
    fn resolve(&self, name: &str, accept: impl Fn(&Symbol) -> bool) -> Option<SymbolId> {
        let id = self.table.lookup(self.scope, name)?;
        self.table.get(id).filter(|s| accept(*s)).map(|_| id)
    }
}

impl Default for Linker {
    fn default() -> Self {
        Self::new()
    }
}

/// Link a program in place
pub fn link(program: &mut Program) -> SymbolTable {
    Linker::new().link(program)
}
