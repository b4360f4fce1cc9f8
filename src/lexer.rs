//! Lexer for Catalyst
//!
//! The lexer converts source code into a stream of tokens. It uses the
//! `logos` crate for the character-level work; this wrapper guarantees
//! the stream ends with an `Eof` token and records errors for input the
//! token table cannot match.

use crate::span::Span;
use crate::token::{Token, TokenKind};
use logos::Logos;
use thiserror::Error;

/// Lexer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerError {
    #[error("unexpected character at byte {0}")]
    UnexpectedChar(usize),

    #[error("unterminated string literal at byte {0}")]
    UnterminatedString(usize),
}

/// The lexer for Catalyst
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
    errors: Vec<LexerError>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            errors: Vec::new(),
        }
    }

    /// Get the source code
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Get any errors that occurred during lexing
    pub fn errors(&self) -> &[LexerError] {
        &self.errors
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        match self.inner.next() {
            Some(Ok(kind)) => {
                let span = self.inner.span();
                Token::new(kind, Span::new(span.start, span.end))
            }
            Some(Err(())) => {
                // Unmatched input becomes an Unknown token; the parser's
                // recovery loops are what skip it.
                let span = self.inner.span();
                if self.inner.slice().starts_with('"') {
                    self.errors.push(LexerError::UnterminatedString(span.start));
                } else {
                    self.errors.push(LexerError::UnexpectedChar(span.start));
                }
                Token::new(TokenKind::Unknown, Span::new(span.start, span.end))
            }
            None => {
                let pos = self.source.len();
                Token::new(TokenKind::Eof, Span::new(pos, pos))
            }
        }
    }

    /// Collect all tokens into a vector, ending with `Eof`
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<LexerError>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let at_end = token.kind == TokenKind::Eof;
            tokens.push(token);
            if at_end {
                break;
            }
        }

        (tokens, self.errors)
    }
}

/// Helper function to lex source code
pub fn lex(source: &str) -> (Vec<Token>, Vec<LexerError>) {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, _) = lex(source);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        let kinds = token_kinds("");
        assert_eq!(kinds, vec![TokenKind::Eof]);
    }

    #[test]
    fn test_whitespace_only() {
        let kinds = token_kinds("   \t\n  ");
        assert_eq!(kinds, vec![TokenKind::Eof]);
    }

    #[test]
    fn test_numbers() {
        let kinds = token_kinds("42 3.14 0");
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLiteral,
                TokenKind::FloatLiteral,
                TokenKind::IntLiteral,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_dot_without_fraction_is_not_a_float() {
        let kinds = token_kinds("1.");
        assert_eq!(
            kinds,
            vec![TokenKind::IntLiteral, TokenKind::Unknown, TokenKind::Eof]
        );
    }

    #[test]
    fn test_strings() {
        let kinds = token_kinds(r#""hello" "with spaces""#);
        assert_eq!(
            kinds,
            vec![TokenKind::StringLiteral, TokenKind::StringLiteral, TokenKind::Eof]
        );
    }

    #[test]
    fn test_keywords() {
        let kinds = token_kinds("fn return if else while print scan true false");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Fn,
                TokenKind::Return,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Print,
                TokenKind::Scan,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_type_names() {
        let kinds = token_kinds("int float string bool");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Str,
                TokenKind::Bool,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_operators() {
        let kinds = token_kinds("= + < > -> : == != <= >= && || !");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Eq,
                TokenKind::Plus,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Arrow,
                TokenKind::Colon,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Bang,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_delimiters() {
        let kinds = token_kinds("( ) { } ; ,");
        assert_eq!(
            kinds,
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        let kinds = token_kinds("foo bar_baz _private x1");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments() {
        let kinds = token_kinds(
            r#"
            // a comment
            int x = 42 // trailing comment
        "#,
        );
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::IntLiteral,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unknown_character_is_reported() {
        let (tokens, errors) = lex("int x @ 1;");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Unknown));
        assert_eq!(errors, vec![LexerError::UnexpectedChar(6)]);
    }

    #[test]
    fn test_unterminated_string() {
        let (_, errors) = lex("\"oops");
        assert!(matches!(errors[0], LexerError::UnterminatedString(0)));
    }

    #[test]
    fn test_lone_ampersand_is_unknown() {
        let kinds = token_kinds("a & b");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Unknown,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_function_definition() {
        let kinds = token_kinds("fn add(int a, int b): int { return a + b; }");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Fn,
                TokenKind::Ident, // add
                TokenKind::LParen,
                TokenKind::Int,
                TokenKind::Ident, // a
                TokenKind::Comma,
                TokenKind::Int,
                TokenKind::Ident, // b
                TokenKind::RParen,
                TokenKind::Colon,
                TokenKind::Int,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::Ident, // a
                TokenKind::Plus,
                TokenKind::Ident, // b
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_span_tracking() {
        let source = "int x = 42";
        let (tokens, _) = lex(source);

        assert_eq!(tokens[0].span.text(source), "int");
        assert_eq!(tokens[1].span.text(source), "x");
        assert_eq!(tokens[2].span.text(source), "=");
        assert_eq!(tokens[3].span.text(source), "42");
    }
}
