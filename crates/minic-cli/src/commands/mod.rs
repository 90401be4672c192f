pub mod ast;
pub mod check;
pub mod lsp;
