//! Bracket balance pre-pass
//!
//! Runs over the token stream before parsing. Unbalanced brackets make every
//! later parse error noise, so when this pass reports anything the pipeline
//! stops reporting parse and semantic problems.

use crate::diagnostic::{error_codes, Diagnostic};
use crate::token::Token;

/// Report every unclosed opener and every stray closer
pub fn check_brackets(tokens: &[Token]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut stack: Vec<&Token> = Vec::new();

    for token in tokens {
        if token.kind.is_opening_bracket() {
            stack.push(token);
            continue;
        }
        if !token.kind.is_closing_bracket() {
            continue;
        }

        let matches = |open: &&Token| open.kind.closing_pair() == Some(token.kind);
        match stack.iter().rposition(matches) {
            Some(pos) => {
                // Openers above the match were never closed
                for unclosed in stack.drain(pos..).skip(1) {
                    diagnostics.push(unclosed_opener(unclosed));
                }
            }
            None => diagnostics.push(stray_closer(token)),
        }
    }

    diagnostics.extend(stack.into_iter().map(unclosed_opener));
    diagnostics.sort_by_key(|d| d.span.start);
    diagnostics
}

fn unclosed_opener(token: &Token) -> Diagnostic {
    let closer = token.kind.closing_pair().map(|k| k.to_string()).unwrap_or_default();
    Diagnostic::error_with_code(
        error_codes::UNMATCHED_BRACKETS,
        format!("Unmatched '{}'", token.lexeme),
        token.span,
    )
    .with_label("unclosed delimiter")
    .with_help(format!("add a matching '{}'", closer))
}

fn stray_closer(token: &Token) -> Diagnostic {
    Diagnostic::error_with_code(
        error_codes::UNMATCHED_BRACKETS,
        format!("Unmatched '{}'", token.lexeme),
        token.span,
    )
    .with_label("no matching opening delimiter")
    .with_help(format!("remove this '{}'", token.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::span::Span;

    fn check(source: &str) -> Vec<Diagnostic> {
        let (tokens, _) = tokenize(source);
        check_brackets(&tokens)
    }

    #[test]
    fn test_balanced_source_is_clean() {
        assert!(check("int main() { int a[2] = {1, 2}; return a[0]; }").is_empty());
    }

    #[test]
    fn test_unclosed_brace() {
        let diags = check("int main() {\n  return 0;\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Unmatched '{'");
        assert_eq!(diags[0].span, Span::new(11, 12));
    }

    #[test]
    fn test_stray_closer() {
        let diags = check("int x;\n)");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Unmatched ')'");
        assert_eq!(diags[0].code, error_codes::UNMATCHED_BRACKETS);
    }

    #[test]
    fn test_unclosed_paren_inside_block() {
        let diags = check("void f() { foo(1, 2; }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Unmatched '('");
    }
}
