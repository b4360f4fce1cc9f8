//! Token definitions for Catalyst
//!
//! This module defines all the tokens that the lexer can produce.

use crate::span::Span;
use logos::Logos;
use std::fmt;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Get the text of this token from source
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }

    /// Line/column of the start of this token
    pub fn position(&self, source: &str) -> crate::span::Position {
        crate::span::Position::locate(source, self.span.start)
    }
}

/// All possible token types in Catalyst
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip line comments
pub enum TokenKind {
    // ============ Literals ============

    /// Integer literal: 42
    #[regex(r"[0-9]+")]
    IntLiteral,

    /// Float literal: 3.14 (a digit is required on both sides of the dot)
    #[regex(r"[0-9]+\.[0-9]+")]
    FloatLiteral,

    /// String literal: "hello" (no escape sequences; may span lines)
    #[regex(r#""[^"]*""#)]
    StringLiteral,

    /// Boolean literal
    #[token("true")]
    True,
    #[token("false")]
    False,

    // ============ Keywords ============

    #[token("fn")]
    Fn,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("print")]
    Print,
    #[token("scan")]
    Scan,

    // ============ Types ============

    #[token("int")]
    Int,
    #[token("float")]
    Float,
    #[token("string")]
    Str,
    #[token("bool")]
    Bool,

    // ============ Identifiers ============

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // ============ Operators ============

    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("->")]
    Arrow,
    #[token(":")]
    Colon,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,

    // ============ Delimiters ============

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,

    // ============ Special ============

    /// A character sequence the lexer could not match
    Unknown,
    /// End of input, always the final token of a stream
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Fn => "'fn'",
            TokenKind::Return => "'return'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::Print => "'print'",
            TokenKind::Scan => "'scan'",
            TokenKind::Int => "'int'",
            TokenKind::Float => "'float'",
            TokenKind::Str => "'string'",
            TokenKind::Bool => "'bool'",
            TokenKind::Ident => "identifier",
            TokenKind::Eq => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::Arrow => "'->'",
            TokenKind::Colon => "':'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Unknown => "unknown character",
            TokenKind::Eof => "end of file",
        };
        f.write_str(text)
    }
}
