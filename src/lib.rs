//! Catalyst Compiler Front End
//!
//! Catalyst is a small imperative language. This crate turns source text
//! into a control-flow-graph intermediate representation ready for a
//! native backend.
//!
//! # Architecture
//!
//! ```text
//! Source Code (.cat)
//!       │
//!       ▼
//! ┌─────────────┐
//! │    Lexer    │  → Tokens
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │   Parser    │  → AST
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │  IR Lowering│  → Catalyst IR
//! └─────────────┘
//! ```
//!
//! There is no type checker and no optimizer: the lowerer selects
//! instructions from the values it has already produced, and whatever it
//! emits is handed to the backend as-is.

pub mod ast;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

// Re-exports for convenience
pub use lexer::Lexer;
pub use span::Span;
pub use token::{Token, TokenKind};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extension for Catalyst source files
pub const FILE_EXTENSION: &str = "cat";
