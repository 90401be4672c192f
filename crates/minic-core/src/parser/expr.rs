//! Expression parsing (precedence climbing)

use crate::ast::*;
use crate::parser::{Parser, Precedence};
use crate::token::TokenKind;

impl Parser {
    /// Parse an expression, including assignment
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ()> {
        let target = self.parse_precedence(Precedence::Lowest)?;

        let Some(op) = assign_op(self.peek().kind) else {
            return Ok(target);
        };
        let op_span = self.advance().span;

        if !matches!(target, Expr::Name(_) | Expr::Index(_)) {
            self.error_at("Invalid assignment target", op_span);
            return Err(());
        }

        // Right-associative: `a = b = c`
        let value = self.parse_expression()?;
        Ok(Expr::Assign(AssignExpr {
            span: target.span().merge(value.span()),
            op,
            target: Box::new(target),
            value: Box::new(value),
        }))
    }

    pub(super) fn parse_precedence(&mut self, precedence: Precedence) -> Result<Expr, ()> {
        let mut left = self.parse_prefix()?;

        while precedence < infix_precedence(self.peek().kind) {
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ()> {
        let token = self.peek().clone();
        let literal = |kind| -> Result<Expr, ()> {
            Ok(Expr::Literal(Literal {
                kind,
                text: token.lexeme.clone(),
                span: token.span,
            }))
        };

        match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                literal(LiteralKind::Int)
            }
            TokenKind::FloatLiteral => {
                self.advance();
                literal(LiteralKind::Float)
            }
            TokenKind::CharLiteral => {
                self.advance();
                literal(LiteralKind::Char)
            }
            TokenKind::StringLiteral => {
                self.advance();
                literal(LiteralKind::String)
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Name(NameRef::new(Identifier {
                    name: token.lexeme.clone(),
                    span: token.span,
                })))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                let close = self.consume(TokenKind::RightParen, "Expected ')'")?;
                Ok(Expr::Group(GroupExpr {
                    expr: Box::new(expr),
                    span: token.span.merge(close.span),
                }))
            }
            TokenKind::Minus | TokenKind::Bang | TokenKind::PlusPlus | TokenKind::MinusMinus => {
                self.advance();
                let op = match token.kind {
                    TokenKind::Minus => UnaryOp::Negate,
                    TokenKind::Bang => UnaryOp::Not,
                    TokenKind::PlusPlus => UnaryOp::PreIncrement,
                    _ => UnaryOp::PreDecrement,
                };
                let expr = self.parse_precedence(Precedence::Unary)?;
                Ok(Expr::Unary(UnaryExpr {
                    span: token.span.merge(expr.span()),
                    op,
                    expr: Box::new(expr),
                }))
            }
            _ => {
                self.error("Expected expression");
                Err(())
            }
        }
    }

    fn parse_infix(&mut self, left: Expr) -> Result<Expr, ()> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::LeftParen => self.parse_call(left),
            TokenKind::LeftBracket => {
                self.advance();
                let index = self.parse_expression()?;
                let close = self.consume(TokenKind::RightBracket, "Expected ']' after index")?;
                Ok(Expr::Index(IndexExpr {
                    span: left.span().merge(close.span),
                    target: Box::new(left),
                    index: Box::new(index),
                }))
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                self.advance();
                let op = if token.kind == TokenKind::PlusPlus {
                    UnaryOp::PostIncrement
                } else {
                    UnaryOp::PostDecrement
                };
                Ok(Expr::Unary(UnaryExpr {
                    span: left.span().merge(token.span),
                    op,
                    expr: Box::new(left),
                }))
            }
            kind => {
                let Some(op) = binary_op(kind) else {
                    return Ok(left);
                };
                let precedence = infix_precedence(kind);
                self.advance();
                let right = self.parse_precedence(precedence)?;
                Ok(Expr::Binary(BinaryExpr {
                    span: left.span().merge(right.span()),
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }))
            }
        }
    }

    fn parse_call(&mut self, callee: Expr) -> Result<Expr, ()> {
        let open = self.advance().span;
        let Expr::Name(callee) = callee else {
            self.error_at("Only named functions can be called", open);
            return Err(());
        };

        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        let close = self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;

        Ok(Expr::Call(CallExpr {
            span: callee.ident.span.merge(close.span),
            callee,
            args,
        }))
    }
}

fn infix_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::PipePipe => Precedence::Or,
        TokenKind::AmpAmp => Precedence::And,
        TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equality,
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
            Precedence::Comparison
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Term,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Factor,
        TokenKind::LeftParen
        | TokenKind::LeftBracket
        | TokenKind::PlusPlus
        | TokenKind::MinusMinus => Precedence::Postfix,
        _ => Precedence::Lowest,
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqualEqual => BinaryOp::Eq,
        TokenKind::BangEqual => BinaryOp::Ne,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessEqual => BinaryOp::Le,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterEqual => BinaryOp::Ge,
        TokenKind::AmpAmp => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Equal => AssignOp::Assign,
        TokenKind::PlusEqual => AssignOp::AddAssign,
        TokenKind::MinusEqual => AssignOp::SubAssign,
        TokenKind::StarEqual => AssignOp::MulAssign,
        TokenKind::SlashEqual => AssignOp::DivAssign,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use rstest::rstest;

    fn expr_of(source: &str) -> Expr {
        let wrapped = format!("void f() {{ {}; }}", source);
        let (tokens, _) = tokenize(&wrapped);
        let (program, diags) = parse(tokens);
        assert!(diags.is_empty(), "{:?}", diags);
        let Some(Item::Function(func)) = program.items.into_iter().next() else {
            panic!("expected function");
        };
        match func.body.statements.into_iter().next() {
            Some(Stmt::Expr(stmt)) => stmt.expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let Expr::Binary(add) = expr_of("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(add.op, BinaryOp::Add);
        assert!(matches!(*add.right, Expr::Binary(BinaryExpr { op: BinaryOp::Mul, .. })));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let Expr::Assign(outer) = expr_of("a = b = 3") else {
            panic!("expected assignment");
        };
        assert!(matches!(*outer.value, Expr::Assign(_)));
    }

    #[rstest]
    #[case("x += 1", AssignOp::AddAssign)]
    #[case("x -= 1", AssignOp::SubAssign)]
    #[case("arr[i] *= 2", AssignOp::MulAssign)]
    #[case("x /= 2", AssignOp::DivAssign)]
    fn test_compound_assignment(#[case] source: &str, #[case] expected: AssignOp) {
        let Expr::Assign(assign) = expr_of(source) else {
            panic!("expected assignment");
        };
        assert_eq!(assign.op, expected);
    }

    #[test]
    fn test_call_with_nested_arguments() {
        let Expr::Call(call) = expr_of("foo(1, bar(2), arr[0])") else {
            panic!("expected call");
        };
        assert_eq!(call.callee.ident.name, "foo");
        assert_eq!(call.args.len(), 3);
        assert!(matches!(call.args[1], Expr::Call(_)));
        assert!(matches!(call.args[2], Expr::Index(_)));
    }

    #[test]
    fn test_prefix_and_postfix_increment() {
        let Expr::Unary(post) = expr_of("i++") else {
            panic!("expected unary");
        };
        assert_eq!(post.op, UnaryOp::PostIncrement);
        let Expr::Unary(pre) = expr_of("--i") else {
            panic!("expected unary");
        };
        assert_eq!(pre.op, UnaryOp::PreDecrement);
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (tokens, _) = tokenize("void f() { 1 = 2; }");
        let (_, diags) = parse(tokens);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Invalid assignment target");
    }
}
