//! Symbol table and scopes
//!
//! Scopes live in an arena and refer to their parent by [`ScopeId`]. A symbol
//! keeps a non-owning back-reference to the scope that declared it. Scopes are
//! never removed; once a function body has been linked nothing looks names up
//! in its scope again.

use crate::ast::TypeName;
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a symbol in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// Index of a scope in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

/// Symbol classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Variable,
    Array,
    Function,
    Parameter,
}

/// Symbol information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declared type (return type for functions)
    pub ty: TypeName,
    /// Array dimension sizes, outermost first; `None` where not a literal
    pub dims: Vec<Option<usize>>,
    /// Number of top-level initializer elements, when initialized with a list
    pub init_count: Option<usize>,
    /// Parameter types (functions only)
    pub params: Vec<TypeName>,
    /// Builtins accept any number of arguments
    pub variadic: bool,
    /// Declaration location (the declared name)
    pub span: Span,
    pub scope: ScopeId,
}

impl Symbol {
    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }

    pub fn is_builtin(&self) -> bool {
        self.is_function() && self.span == Span::dummy()
    }
}

/// Scope classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeKind {
    Global,
    Function(String),
}

/// A name→symbol region
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    names: HashMap<String, SymbolId>,
}

/// Library functions every program may call without declaring them
pub const BUILTIN_FUNCTIONS: &[(&str, TypeName)] = &[
    ("printf", TypeName::Int),
    ("scanf", TypeName::Int),
    ("getchar", TypeName::Int),
    ("putchar", TypeName::Int),
];

/// Arena of scopes and symbols
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Create a table holding only the global scope and builtins
    pub fn new() -> Self {
        let mut table = Self {
            symbols: Vec::new(),
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                parent: None,
                names: HashMap::new(),
            }],
        };

        for (name, ty) in BUILTIN_FUNCTIONS {
            table.define(Symbol {
                name: (*name).to_string(),
                kind: SymbolKind::Function,
                ty: *ty,
                dims: Vec::new(),
                init_count: None,
                params: Vec::new(),
                variadic: true,
                span: Span::dummy(),
                scope: Self::GLOBAL,
            });
        }

        table
    }

    pub const GLOBAL: ScopeId = ScopeId(0);

    /// Open a new scope under `parent`
    pub fn push_scope(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            names: HashMap::new(),
        });
        id
    }

    /// Define a symbol in its scope.
    ///
    /// Returns `None` when the name already exists in that scope; the earlier
    /// definition stays authoritative and the new symbol is discarded.
    pub fn define(&mut self, symbol: Symbol) -> Option<SymbolId> {
        let scope_idx = symbol.scope.0 as usize;
        let scope = self.scopes.get(scope_idx)?;
        if scope.names.contains_key(&symbol.name) {
            return None;
        }

        let id = SymbolId(self.symbols.len() as u32);
        let name = symbol.name.clone();
        self.symbols.push(symbol);
        self.scopes[scope_idx].names.insert(name, id);
        Some(id)
    }

    /// Look a name up, walking from `scope` out to the global scope
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scopes.get(id.0 as usize)?;
            if let Some(symbol) = scope.names.get(name) {
                return Some(*symbol);
            }
            current = scope.parent;
        }
        None
    }

    /// Look a name up in one scope only
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes
            .get(scope.0 as usize)
            .and_then(|s| s.names.get(name).copied())
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0 as usize)
    }

    /// All symbols in definition order
    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(idx, symbol)| (SymbolId(idx as u32), symbol))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(name: &str, scope: ScopeId, start: usize) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::Variable,
            ty: TypeName::Int,
            dims: Vec::new(),
            init_count: None,
            params: Vec::new(),
            variadic: false,
            span: Span::new(start, start + name.len()),
            scope,
        }
    }

    #[test]
    fn test_builtins_are_global_functions() {
        let table = SymbolTable::new();
        let id = table.lookup(SymbolTable::GLOBAL, "printf").unwrap();
        let symbol = table.get(id).unwrap();
        assert!(symbol.is_builtin());
        assert!(symbol.variadic);
    }

    #[test]
    fn test_first_definition_wins() {
        let mut table = SymbolTable::new();
        let first = table.define(variable("a", SymbolTable::GLOBAL, 4));
        let second = table.define(variable("a", SymbolTable::GLOBAL, 7));
        assert!(first.is_some());
        assert!(second.is_none());
        let found = table.lookup(SymbolTable::GLOBAL, "a").unwrap();
        assert_eq!(table.get(found).unwrap().span.start, 4);
    }

    #[test]
    fn test_lookup_walks_parents() {
        let mut table = SymbolTable::new();
        table.define(variable("g", SymbolTable::GLOBAL, 0));
        let func = table.push_scope(ScopeKind::Function("main".into()), SymbolTable::GLOBAL);
        table.define(variable("x", func, 20));

        assert!(table.lookup(func, "g").is_some());
        assert!(table.lookup(func, "x").is_some());
        assert!(table.lookup(SymbolTable::GLOBAL, "x").is_none());
        assert!(table.lookup_local(func, "g").is_none());
    }
}
