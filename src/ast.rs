//! Abstract Syntax Tree (AST) for Catalyst
//!
//! The AST is the contract between the parser and the lowerer. Every node
//! exclusively owns its children; nothing in a tree is shared or mutated
//! after parsing.

use crate::span::Span;
use std::fmt;

/// A complete Catalyst compilation unit
#[derive(Debug, Clone)]
pub struct Module {
    /// Function definitions in declaration order. Order fixes the IR
    /// emission order but has no effect on name resolution: every
    /// function is visible to every other one.
    pub functions: Vec<Function>,
    pub span: Span,
}

/// Function definition
#[derive(Debug, Clone)]
pub struct Function {
    pub proto: Prototype,
    pub body: Block,
    pub span: Span,
}

/// Function prototype: name, typed parameters, return type
#[derive(Debug, Clone)]
pub struct Prototype {
    pub name: String,
    /// Parameter names are not required to be unique.
    pub params: Vec<Param>,
    /// Defaults to `Type::Void` when the source omits a return type.
    pub return_type: Type,
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub ty: Type,
    pub name: String,
}

/// A braced sequence of statements; order is execution order
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// The closed set of Catalyst type names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Str,
    Bool,
    Void,
}

/// A statement
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Variable declaration: `int x = 1;`
    VarDecl {
        ty: Type,
        name: String,
        init: Option<Expr>,
    },

    /// Return statement: `return x + 1;`
    Return(Expr),

    /// Formatted output: `print("%d", x);`
    Print { format: String, args: Vec<Expr> },

    /// Formatted input into a declared variable: `scan(x);`
    Scan { target: String },

    /// Conditional: `if (cond) { ... } else { ... }`
    If {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },

    /// Loop: `while (cond) { ... }`
    While { condition: Expr, body: Block },

    /// A nested statement block
    Block(Block),
}

/// An expression
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Numeric literal, kept as source text until lowering
    Number { text: String, kind: NumberKind },

    /// String literal (quotes stripped, no escape processing)
    Str(String),

    /// Boolean literal
    Bool(bool),

    /// Variable reference
    Variable(String),

    /// Binary operation
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Unary operation
    Unary { op: UnOp, operand: Box<Expr> },

    /// Function call by name
    Call { callee: String, args: Vec<Expr> },
}

/// Which kind of numeric literal a `Number` holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Int,
    Float,
}

/// Binary operators.
///
/// `Sub` and `Mul` have no surface syntax: the grammar defines no tokens
/// for them, but the lowering stage accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Lt,
    LtEq,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        f.write_str(text)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Logical negation: `!x`
    Not,
}
