//! Statement parsing

use crate::ast::*;
use crate::parser::Parser;
use crate::span::Span;
use crate::token::TokenKind;

impl Parser {
    /// Parse a statement
    pub(super) fn parse_statement(&mut self) -> Result<Stmt, ()> {
        match self.peek().kind {
            kind if kind.is_type_keyword() => {
                let type_ref = self.parse_type_ref()?;
                let name = self.consume_identifier("a variable name")?;
                if self.check(TokenKind::LeftParen) {
                    self.error("Functions can only be defined at the top level");
                    return Err(());
                }
                Ok(Stmt::Declaration(self.parse_declaration_rest(type_ref, name)?))
            }
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Break => {
                let span = self.advance().span;
                let end = self.expect_semicolon("'break'");
                Ok(Stmt::Break(span.merge(end)))
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                let end = self.expect_semicolon("'continue'");
                Ok(Stmt::Continue(span.merge(end)))
            }
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Semicolon => Ok(Stmt::Empty(self.advance().span)),
            _ => {
                let expr = self.parse_expression()?;
                let end = self.expect_semicolon("expression");
                Ok(Stmt::Expr(ExprStmt {
                    span: expr.span().merge(end),
                    expr,
                }))
            }
        }
    }

    /// Parse the declarators of a group whose type and first name are consumed
    pub(super) fn parse_declaration_rest(
        &mut self,
        type_ref: TypeRef,
        first: Identifier,
    ) -> Result<DeclGroup, ()> {
        let mut declarators = vec![self.parse_declarator(first)?];

        while self.match_token(TokenKind::Comma) {
            let name = self.consume_identifier("a variable name after ','")?;
            declarators.push(self.parse_declarator(name)?);
        }

        let end = self.expect_semicolon("declaration");
        Ok(DeclGroup {
            span: type_ref.span.merge(end),
            type_ref,
            declarators,
        })
    }

    fn parse_declarator(&mut self, name: Identifier) -> Result<Declarator, ()> {
        let mut span = name.span;
        let mut dims = Vec::new();

        while self.check(TokenKind::LeftBracket) {
            let open = self.advance().span;
            let size = if self.check(TokenKind::RightBracket) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            let close = self.consume(TokenKind::RightBracket, "Expected ']' after array size")?;
            let dim_span = open.merge(close.span);
            span = span.merge(dim_span);
            dims.push(ArrayDim {
                size,
                span: dim_span,
            });
        }

        let init = if self.match_token(TokenKind::Equal) {
            let init = self.parse_initializer()?;
            span = span.merge(init.span());
            Some(init)
        } else {
            None
        };

        Ok(Declarator {
            name,
            dims,
            init,
            span,
            symbol: None,
        })
    }

    fn parse_initializer(&mut self) -> Result<Initializer, ()> {
        if !self.check(TokenKind::LeftBrace) {
            return Ok(Initializer::Expr(self.parse_expression()?));
        }

        let open = self.advance().span;
        let mut elements = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            elements.push(self.parse_initializer()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        let close = self.consume(TokenKind::RightBrace, "Expected '}' after initializer list")?;

        Ok(Initializer::List(InitList {
            elements,
            span: open.merge(close.span),
        }))
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, ()> {
        let if_span = self.advance().span;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let cond = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;

        let then_branch = Box::new(self.parse_statement()?);
        let mut span = if_span.merge(then_branch.span());

        let else_branch = if self.match_token(TokenKind::Else) {
            let branch = self.parse_statement()?;
            span = span.merge(branch.span());
            Some(Box::new(branch))
        } else {
            None
        };

        Ok(Stmt::If(IfStmt {
            cond,
            then_branch,
            else_branch,
            span,
        }))
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt, ()> {
        let while_span = self.advance().span;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let cond = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;
        let body = self.parse_statement()?;

        Ok(Stmt::While(WhileStmt {
            span: while_span.merge(body.span()),
            cond,
            body: Box::new(body),
        }))
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt, ()> {
        let return_span = self.advance().span;

        let value = if self.check(TokenKind::Semicolon) || self.check(TokenKind::RightBrace) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        let end = self.expect_semicolon("return statement");
        Ok(Stmt::Return(ReturnStmt {
            value,
            span: return_span.merge(end),
        }))
    }

    /// Parse a block
    pub(super) fn parse_block(&mut self) -> Result<Block, ()> {
        let open = self.consume(TokenKind::LeftBrace, "Expected '{'")?.span;
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.synchronize(),
            }
        }

        let close: Span = self.consume(TokenKind::RightBrace, "Expected '}'")?.span;
        Ok(Block {
            statements,
            span: open.merge(close),
        })
    }
}
