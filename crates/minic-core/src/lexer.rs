//! Lexical analysis (tokenization)
//!
//! The lexer converts MiniC source into a stream of tokens with byte spans.
//! Lexical problems are reported as diagnostics and scanning continues.

use crate::diagnostic::{error_codes, Diagnostic};
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexer state for tokenizing source code
pub struct Lexer<'src> {
    source: &'src str,
    /// Current byte position
    current: usize,
    /// Start position of current token
    start_pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            current: 0,
            start_pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the source code, returning tokens and any diagnostics.
    ///
    /// The token stream always ends with a single `Eof` token.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let Some(token) = self.next_token() else {
                continue;
            };
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, self.diagnostics)
    }

    /// Scan the next token; `None` when the characters scanned were skipped
    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();
        self.start_pos = self.current;

        let Some(c) = self.advance() else {
            return Some(self.make_token(TokenKind::Eof));
        };

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '%' => TokenKind::Percent,

            '+' => {
                if self.match_char('+') {
                    TokenKind::PlusPlus
                } else if self.match_char('=') {
                    TokenKind::PlusEqual
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.match_char('-') {
                    TokenKind::MinusMinus
                } else if self.match_char('=') {
                    TokenKind::MinusEqual
                } else {
                    TokenKind::Minus
                }
            }
            '*' => self.either('=', TokenKind::StarEqual, TokenKind::Star),
            '/' => self.either('=', TokenKind::SlashEqual, TokenKind::Slash),
            '=' => self.either('=', TokenKind::EqualEqual, TokenKind::Equal),
            '!' => self.either('=', TokenKind::BangEqual, TokenKind::Bang),
            '<' => self.either('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.either('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '&' => {
                if self.match_char('&') {
                    TokenKind::AmpAmp
                } else {
                    self.error("Unexpected character '&'", "did you mean '&&'?");
                    return None;
                }
            }
            '|' => {
                if self.match_char('|') {
                    TokenKind::PipePipe
                } else {
                    self.error("Unexpected character '|'", "did you mean '||'?");
                    return None;
                }
            }

            '"' => return self.string(),
            '\'' => return self.char_literal(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),

            _ => {
                self.error(
                    &format!("Unexpected character '{}'", c),
                    "remove this character",
                );
                return None;
            }
        };

        Some(self.make_token(kind))
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some('/') if self.peek_next() == Some('*') => {
                    self.start_pos = self.current;
                    self.advance();
                    self.advance();

                    let mut terminated = false;
                    while let Some(c) = self.advance() {
                        if c == '*' && self.match_char('/') {
                            terminated = true;
                            break;
                        }
                    }

                    if !terminated {
                        self.error(
                            "Unterminated multi-line comment",
                            "add '*/' to close the comment",
                        );
                    }
                }
                _ => return,
            }
        }
    }

    fn identifier(&mut self) -> TokenKind {
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        let text = &self.source[self.start_pos..self.current];
        TokenKind::keyword(text).unwrap_or(TokenKind::Identifier)
    }

    /// Scan an integer or decimal literal (`12`, `3.5`)
    fn number(&mut self) -> TokenKind {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    fn string(&mut self) -> Option<Token> {
        while let Some(c) = self.peek() {
            match c {
                '"' => {
                    self.advance();
                    return Some(self.make_token(TokenKind::StringLiteral));
                }
                '\n' => break,
                '\\' => {
                    self.advance();
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }

        self.error("Unterminated string literal", "add a closing '\"'");
        None
    }

    fn char_literal(&mut self) -> Option<Token> {
        match self.peek() {
            Some('\\') => {
                self.advance();
                self.advance();
            }
            Some('\'') | Some('\n') | None => {}
            Some(_) => {
                self.advance();
            }
        }

        if self.match_char('\'') {
            Some(self.make_token(TokenKind::CharLiteral))
        } else {
            self.error(
                "Unterminated character literal",
                "character literals hold exactly one character, like 'a'",
            );
            None
        }
    }

    // === Character navigation ===

    fn advance(&mut self) -> Option<char> {
        let c = self.source[self.current..].chars().next()?;
        self.current += c.len_utf8();
        Some(c)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn either(&mut self, next: char, compound: TokenKind, single: TokenKind) -> TokenKind {
        if self.match_char(next) {
            compound
        } else {
            single
        }
    }

    // === Token creation ===

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            &self.source[self.start_pos..self.current],
            Span::new(self.start_pos, self.current),
        )
    }

    fn error(&mut self, message: &str, help: &str) {
        let span = Span::new(self.start_pos, self.current.max(self.start_pos + 1));
        self.diagnostics.push(
            Diagnostic::error_with_code(error_codes::SYNTAX_ERROR, message, span)
                .with_label("invalid token")
                .with_help(help),
        );
    }
}

/// Tokenize a source string
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source).tokenize()
}
