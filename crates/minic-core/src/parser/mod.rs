//! Parsing (tokens to AST)
//!
//! Recursive descent for items and statements, precedence climbing for
//! expressions. Parse functions return `Result<T, ()>`: the error has already
//! been recorded as a diagnostic and the caller only needs to recover.
//!
//! A missing `;` is reported as `MISSING_SEMICOLON` and parsing carries on as
//! if it were present, so a single forgotten semicolon does not hide the rest
//! of the file.

mod brackets;
mod expr;
mod stmt;

pub use brackets::check_brackets;

use crate::ast::*;
use crate::diagnostic::{error_codes, Diagnostic};
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser state for building AST from tokens
pub struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    pub(super) diagnostics: Vec<Diagnostic>,
}

/// Operator precedence levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Precedence {
    Lowest,
    Or,         // ||
    And,        // &&
    Equality,   // == !=
    Comparison, // < <= > >=
    Term,       // + -
    Factor,     // * / %
    Unary,      // ! - ++ --
    Postfix,    // () [] ++ --
}

impl Parser {
    /// Create a new parser for the given tokens
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token::new(TokenKind::Eof, "", Span::point(end)));
        }
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Parse tokens into an AST
    pub fn parse(mut self) -> (Program, Vec<Diagnostic>) {
        let mut items = Vec::new();

        while !self.is_at_end() {
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(()) => self.synchronize(),
            }
        }

        (Program { items }, self.diagnostics)
    }

    // === Top-level parsing ===

    /// Parse a function definition or a global declaration group
    fn parse_item(&mut self) -> Result<Item, ()> {
        let type_ref = self.parse_type_ref()?;
        let name = self.consume_identifier("a name after the type")?;

        if self.check(TokenKind::LeftParen) {
            Ok(Item::Function(self.parse_function(type_ref, name)?))
        } else {
            Ok(Item::Declaration(
                self.parse_declaration_rest(type_ref, name)?,
            ))
        }
    }

    /// Parse the remainder of a function definition after its name
    fn parse_function(&mut self, return_type: TypeRef, name: Identifier) -> Result<FunctionDecl, ()> {
        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        let void_params = self.check(TokenKind::Void)
            && self.peek_ahead(1).map(|t| t.kind) == Some(TokenKind::RightParen);
        if void_params {
            self.advance();
        } else if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;
        let body = self.parse_block()?;

        Ok(FunctionDecl {
            span: return_type.span.merge(body.span),
            return_type,
            name,
            params,
            body,
            symbol: None,
        })
    }

    fn parse_param(&mut self) -> Result<Param, ()> {
        let type_ref = self.parse_type_ref()?;
        let name = self.consume_identifier("a parameter name")?;
        let mut span = type_ref.span.merge(name.span);

        let is_array = if self.match_token(TokenKind::LeftBracket) {
            let close = self.consume(TokenKind::RightBracket, "Expected ']' in array parameter")?;
            span = span.merge(close.span);
            true
        } else {
            false
        };

        Ok(Param {
            type_ref,
            name,
            is_array,
            span,
            symbol: None,
        })
    }

    /// Parse a type keyword
    pub(super) fn parse_type_ref(&mut self) -> Result<TypeRef, ()> {
        let token = self.peek().clone();
        let name = match token.kind {
            TokenKind::Int => TypeName::Int,
            TokenKind::Float => TypeName::Float,
            TokenKind::Char => TypeName::Char,
            TokenKind::Void => TypeName::Void,
            _ => {
                self.error(&format!("Expected a type, found {}", describe(&token)));
                return Err(());
            }
        };
        self.advance();
        Ok(TypeRef {
            name,
            span: token.span,
        })
    }

    // === Token navigation ===

    pub(super) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    pub(super) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    pub(super) fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(super) fn peek_ahead(&self, distance: usize) -> Option<&Token> {
        self.tokens.get(self.current + distance)
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(super) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, ()> {
        if self.check(kind) {
            Ok(self.advance().clone())
        } else {
            let found = describe(self.peek());
            self.error(&format!("{}, found {}", message, found));
            Err(())
        }
    }

    pub(super) fn consume_identifier(&mut self, context: &str) -> Result<Identifier, ()> {
        let token = self.consume(TokenKind::Identifier, &format!("Expected {}", context))?;
        Ok(Identifier {
            name: token.lexeme,
            span: token.span,
        })
    }

    /// Require a `;`, reporting `MISSING_SEMICOLON` without failing.
    ///
    /// Returns the span the statement should end at: the semicolon when
    /// present, otherwise the end of the previous token.
    pub(super) fn expect_semicolon(&mut self, after: &str) -> Span {
        if self.check(TokenKind::Semicolon) {
            return self.advance().span;
        }

        let end = self.previous().span.end;
        self.diagnostics.push(
            Diagnostic::error_with_code(
                error_codes::MISSING_SEMICOLON,
                format!("Expected ';' after {}", after),
                Span::point(end),
            )
            .with_label("expected ';' here")
            .with_help("add a semicolon to end the statement"),
        );
        Span::point(end)
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Record a syntax error at the current token
    pub(super) fn error(&mut self, message: &str) {
        let span = self.peek().span;
        self.error_at(message, span);
    }

    pub(super) fn error_at(&mut self, message: &str, span: Span) {
        self.diagnostics.push(
            Diagnostic::error_with_code(error_codes::SYNTAX_ERROR, message, span)
                .with_label("syntax error")
                .with_help("check your syntax for typos or missing tokens"),
        );
    }

    /// Skip to the next statement boundary.
    ///
    /// Always consumes at least one token.
    pub(super) fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Int
                | TokenKind::Float
                | TokenKind::Char
                | TokenKind::Void
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::RightBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Token description for error messages
fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of file".to_string(),
        TokenKind::Identifier => format!("identifier '{}'", token.lexeme),
        _ => format!("'{}'", token.lexeme),
    }
}

/// Parse a token stream into a program
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<Diagnostic>) {
    Parser::new(tokens).parse()
}
