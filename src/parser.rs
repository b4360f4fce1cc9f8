//! Parser for Catalyst
//!
//! A recursive descent parser over an indexable token stream, with
//! precedence climbing for binary expressions. The parser never fails
//! outright: a malformed construct aborts the production that was being
//! parsed, the enclosing loop records the error, skips one token and
//! tries again. The result is always a module, possibly with malformed
//! definitions dropped.

use crate::ast;
use crate::span::Span;
use crate::token::{Token, TokenKind};
use thiserror::Error;

/// A parse diagnostic. Recovery keeps going after recording one of
/// these; it never aborts the whole parse.
#[derive(Error, Debug, Clone)]
#[error("expected {expected}, found {found}")]
pub struct ParseError {
    pub expected: String,
    pub found: TokenKind,
    pub span: Span,
}

/// Parse result for a single production
pub type ParseResult<T> = Result<T, ParseError>;

/// The parser for Catalyst
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    /// Create a parser over a token stream. The stream is expected to end
    /// with `Eof`; one is appended if the caller's stream lacks it.
    pub fn new(source: &'src str, mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = source.len();
            tokens.push(Token::new(TokenKind::Eof, Span::new(end, end)));
        }
        Self {
            source,
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Errors recorded during parsing
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// The token under the cursor
    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Advance the cursor; it never moves past the final `Eof`
    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Consume the current token if it matches
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it matches, otherwise error
    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            let token = self.current().clone();
            self.advance();
            Ok(token)
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError {
            expected: expected.to_string(),
            found: self.current().kind,
            span: self.current().span,
        }
    }

    /// Get text of a token
    fn text(&self, token: &Token) -> &'src str {
        token.text(self.source)
    }

    /// Span of the most recently consumed token
    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    /// Is the current token one of the type keywords?
    fn is_type(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Int | TokenKind::Float | TokenKind::Str | TokenKind::Bool
        )
    }

    // ============ Top-level parsing ============

    /// Parse a complete module. Always returns; malformed definitions are
    /// recorded in `errors()` and skipped one token at a time.
    pub fn parse_module(&mut self) -> ast::Module {
        let start = self.current().span;
        let mut functions = Vec::new();

        while !self.is_at_end() {
            match self.parse_definition() {
                Ok(func) => functions.push(func),
                Err(err) => {
                    self.errors.push(err);
                    self.advance();
                }
            }
        }

        ast::Module {
            functions,
            span: start.merge(self.current().span),
        }
    }

    fn parse_definition(&mut self) -> ParseResult<ast::Function> {
        let proto = self.parse_prototype()?;
        let body = self.parse_block()?;
        let span = proto.span.merge(body.span);
        Ok(ast::Function { proto, body, span })
    }

    fn parse_prototype(&mut self) -> ParseResult<ast::Prototype> {
        let start = self.current().span;
        self.expect(TokenKind::Fn, "'fn'")?;

        let name_tok = self.expect(TokenKind::Ident, "function name")?;
        let name = self.text(&name_tok).to_string();

        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let ty = self.parse_type_name()?;
                let param_tok = self.expect(TokenKind::Ident, "parameter name")?;
                params.push(ast::Param {
                    ty,
                    name: self.text(&param_tok).to_string(),
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        // Both `: type` and `-> type` spell a return type; absent means void
        let return_type = if self.eat(TokenKind::Colon) || self.eat(TokenKind::Arrow) {
            self.parse_type_name()?
        } else {
            ast::Type::Void
        };

        Ok(ast::Prototype {
            name,
            params,
            return_type,
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_type_name(&mut self) -> ParseResult<ast::Type> {
        let ty = match self.current().kind {
            TokenKind::Int => ast::Type::Int,
            TokenKind::Float => ast::Type::Float,
            TokenKind::Str => ast::Type::Str,
            TokenKind::Bool => ast::Type::Bool,
            _ => return Err(self.unexpected("type name")),
        };
        self.advance();
        Ok(ty)
    }

    fn parse_block(&mut self) -> ParseResult<ast::Block> {
        let start = self.current().span;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.advance();
                }
            }
        }

        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(ast::Block {
            stmts,
            span: start.merge(self.prev_span()),
        })
    }

    // ============ Statements ============

    fn parse_statement(&mut self) -> ParseResult<ast::Stmt> {
        match self.current().kind {
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Print => self.parse_print_stmt(),
            TokenKind::Scan => self.parse_scan_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            _ if self.is_type() => self.parse_var_decl_stmt(),
            _ => Err(self.unexpected("statement")),
        }
    }

    fn parse_return_stmt(&mut self) -> ParseResult<ast::Stmt> {
        let start = self.current().span;
        self.advance(); // consume 'return'
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(ast::Stmt {
            kind: ast::StmtKind::Return(value),
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_print_stmt(&mut self) -> ParseResult<ast::Stmt> {
        let start = self.current().span;
        self.advance(); // consume 'print'
        self.expect(TokenKind::LParen, "'('")?;

        let format_tok = self.expect(TokenKind::StringLiteral, "format string")?;
        let format = self.string_value(&format_tok);

        let mut args = Vec::new();
        while self.eat(TokenKind::Comma) {
            args.push(self.parse_expression()?);
        }

        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(ast::Stmt {
            kind: ast::StmtKind::Print { format, args },
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_scan_stmt(&mut self) -> ParseResult<ast::Stmt> {
        let start = self.current().span;
        self.advance(); // consume 'scan'
        self.expect(TokenKind::LParen, "'('")?;
        let target_tok = self.expect(TokenKind::Ident, "variable name")?;
        let target = self.text(&target_tok).to_string();
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(ast::Stmt {
            kind: ast::StmtKind::Scan { target },
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_var_decl_stmt(&mut self) -> ParseResult<ast::Stmt> {
        let start = self.current().span;
        let ty = self.parse_type_name()?;
        let name_tok = self.expect(TokenKind::Ident, "variable name")?;
        let name = self.text(&name_tok).to_string();

        let init = if self.eat(TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(ast::Stmt {
            kind: ast::StmtKind::VarDecl { ty, name, init },
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_if_stmt(&mut self) -> ParseResult<ast::Stmt> {
        let start = self.current().span;
        self.advance(); // consume 'if'
        self.expect(TokenKind::LParen, "'('")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.eat(TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(ast::Stmt {
            kind: ast::StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_while_stmt(&mut self) -> ParseResult<ast::Stmt> {
        let start = self.current().span;
        self.advance(); // consume 'while'
        self.expect(TokenKind::LParen, "'('")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        let body = self.parse_block()?;
        Ok(ast::Stmt {
            kind: ast::StmtKind::While { condition, body },
            span: start.merge(self.prev_span()),
        })
    }

    // ============ Expressions ============

    /// Infix operator and precedence for the current token, if it is one.
    /// Higher binds tighter. `>` is deliberately not an infix operator.
    fn peek_binop(&self) -> Option<(ast::BinOp, u8)> {
        let entry = match self.current().kind {
            TokenKind::AndAnd => (ast::BinOp::And, 5),
            TokenKind::OrOr => (ast::BinOp::Or, 5),
            TokenKind::Lt => (ast::BinOp::Lt, 10),
            TokenKind::EqEq => (ast::BinOp::Eq, 10),
            TokenKind::NotEq => (ast::BinOp::NotEq, 10),
            TokenKind::LtEq => (ast::BinOp::LtEq, 10),
            TokenKind::GtEq => (ast::BinOp::GtEq, 10),
            TokenKind::Plus => (ast::BinOp::Add, 20),
            _ => return None,
        };
        Some(entry)
    }

    fn parse_expression(&mut self) -> ParseResult<ast::Expr> {
        let lhs = self.parse_unary()?;
        self.parse_binop_rhs(0, lhs)
    }

    /// Precedence climbing: fold operators left-associatively while they
    /// bind at least as tightly as `min_prec`, recursing only when the
    /// operator after the right-hand operand binds tighter.
    fn parse_binop_rhs(&mut self, min_prec: u8, mut lhs: ast::Expr) -> ParseResult<ast::Expr> {
        loop {
            let Some((op, prec)) = self.peek_binop() else {
                return Ok(lhs);
            };
            if prec < min_prec {
                return Ok(lhs);
            }
            self.advance(); // consume the operator

            let mut rhs = self.parse_unary()?;
            if let Some((_, next_prec)) = self.peek_binop() {
                if prec < next_prec {
                    rhs = self.parse_binop_rhs(prec + 1, rhs)?;
                }
            }

            let span = lhs.span.merge(rhs.span);
            lhs = ast::Expr {
                kind: ast::ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            };
        }
    }

    fn parse_unary(&mut self) -> ParseResult<ast::Expr> {
        if self.check(TokenKind::Bang) {
            let start = self.current().span;
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(ast::Expr {
                kind: ast::ExprKind::Unary {
                    op: ast::UnOp::Not,
                    operand: Box::new(operand),
                },
                span,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<ast::Expr> {
        match self.current().kind {
            TokenKind::Ident => self.parse_identifier_expr(),
            TokenKind::IntLiteral | TokenKind::FloatLiteral => self.parse_number_expr(),
            TokenKind::StringLiteral => self.parse_string_expr(),
            TokenKind::True | TokenKind::False => self.parse_bool_expr(),
            TokenKind::LParen => self.parse_paren_expr(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// A bare identifier is a variable reference; an identifier followed
    /// by `(` is a call.
    fn parse_identifier_expr(&mut self) -> ParseResult<ast::Expr> {
        let name_tok = self.current().clone();
        let name = self.text(&name_tok).to_string();
        self.advance();

        if !self.eat(TokenKind::LParen) {
            return Ok(ast::Expr {
                kind: ast::ExprKind::Variable(name),
                span: name_tok.span,
            });
        }

        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        Ok(ast::Expr {
            kind: ast::ExprKind::Call { callee: name, args },
            span: name_tok.span.merge(self.prev_span()),
        })
    }

    fn parse_number_expr(&mut self) -> ParseResult<ast::Expr> {
        let token = self.current().clone();
        let kind = if token.kind == TokenKind::FloatLiteral {
            ast::NumberKind::Float
        } else {
            ast::NumberKind::Int
        };
        self.advance();
        Ok(ast::Expr {
            kind: ast::ExprKind::Number {
                text: self.text(&token).to_string(),
                kind,
            },
            span: token.span,
        })
    }

    fn parse_string_expr(&mut self) -> ParseResult<ast::Expr> {
        let token = self.current().clone();
        self.advance();
        Ok(ast::Expr {
            kind: ast::ExprKind::Str(self.string_value(&token)),
            span: token.span,
        })
    }

    fn parse_bool_expr(&mut self) -> ParseResult<ast::Expr> {
        let token = self.current().clone();
        self.advance();
        Ok(ast::Expr {
            kind: ast::ExprKind::Bool(token.kind == TokenKind::True),
            span: token.span,
        })
    }

    fn parse_paren_expr(&mut self) -> ParseResult<ast::Expr> {
        self.advance(); // consume '('
        let expr = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(expr)
    }

    /// Contents of a string literal token, without the surrounding quotes
    fn string_value(&self, token: &Token) -> String {
        let raw = self.text(token);
        raw[1..raw.len() - 1].to_string()
    }
}

/// Helper function to parse source code into a module
pub fn parse(source: &str) -> (ast::Module, Vec<ParseError>) {
    let (tokens, _) = crate::lexer::lex(source);
    let mut parser = Parser::new(source, tokens);
    let module = parser.parse_module();
    (module, parser.errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, ExprKind, NumberKind, StmtKind, Type, UnOp};

    fn parse_ok(source: &str) -> ast::Module {
        let (module, errors) = parse(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        module
    }

    fn expr(source: &str) -> ast::Expr {
        let (tokens, errors) = crate::lexer::lex(source);
        assert!(errors.is_empty(), "lex errors: {:?}", errors);
        let mut parser = Parser::new(source, tokens);
        parser.parse_expression().expect("expression should parse")
    }

    #[test]
    fn test_empty_module() {
        let module = parse_ok("");
        assert!(module.functions.is_empty());
    }

    #[test]
    fn test_simple_function() {
        let module = parse_ok("fn main(): int { return 0; }");
        assert_eq!(module.functions.len(), 1);
        let f = &module.functions[0];
        assert_eq!(f.proto.name, "main");
        assert!(f.proto.params.is_empty());
        assert_eq!(f.proto.return_type, Type::Int);
        assert_eq!(f.body.stmts.len(), 1);
    }

    #[test]
    fn test_params_and_arrow_return() {
        let module = parse_ok("fn add(int a, float b) -> float { return b; }");
        let proto = &module.functions[0].proto;
        assert_eq!(proto.params.len(), 2);
        assert_eq!(proto.params[0].ty, Type::Int);
        assert_eq!(proto.params[0].name, "a");
        assert_eq!(proto.params[1].ty, Type::Float);
        assert_eq!(proto.return_type, Type::Float);
    }

    #[test]
    fn test_missing_return_type_defaults_to_void() {
        let module = parse_ok("fn go() { print(\"hi\"); }");
        assert_eq!(module.functions[0].proto.return_type, Type::Void);
    }

    #[test]
    fn test_add_binds_tighter_than_comparison() {
        // 1 + 2 < 3 parses as (1 + 2) < 3
        let e = expr("1 + 2 < 3");
        let ExprKind::Binary { op, lhs, .. } = &e.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinOp::Lt);
        let ExprKind::Binary { op: inner, .. } = &lhs.kind else {
            panic!("expected nested binary expression");
        };
        assert_eq!(*inner, BinOp::Add);
    }

    #[test]
    fn test_comparison_binds_tighter_than_logical_and() {
        // a < b && c < d parses as (a < b) && (c < d)
        let e = expr("a < b && c < d");
        let ExprKind::Binary { op, lhs, rhs } = &e.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinOp::And);
        assert!(matches!(&lhs.kind, ExprKind::Binary { op: BinOp::Lt, .. }));
        assert!(matches!(&rhs.kind, ExprKind::Binary { op: BinOp::Lt, .. }));
    }

    #[test]
    fn test_unary_binds_tighter_than_comparison() {
        // !a < b parses as (!a) < b
        let e = expr("!a < b");
        let ExprKind::Binary { op, lhs, .. } = &e.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinOp::Lt);
        assert!(matches!(
            &lhs.kind,
            ExprKind::Unary { op: UnOp::Not, .. }
        ));
    }

    #[test]
    fn test_addition_is_left_associative() {
        // a + b + c parses as (a + b) + c
        let e = expr("a + b + c");
        let ExprKind::Binary { op, lhs, rhs } = &e.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(&lhs.kind, ExprKind::Binary { .. }));
        assert!(matches!(&rhs.kind, ExprKind::Variable(_)));
    }

    #[test]
    fn test_parenthesized_expression() {
        let e = expr("(1 + 2)");
        assert!(matches!(&e.kind, ExprKind::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn test_greater_than_is_not_an_infix_operator() {
        // '>' is lexed but has no precedence entry, so the expression
        // stops at 'a', the return statement fails on the missing
        // semicolon, and block recovery drops the whole statement.
        let (module, errors) = parse("fn f(): int { return a > b; }");
        assert_eq!(module.functions.len(), 1);
        assert!(module.functions[0].body.stmts.is_empty());
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_call_and_variable() {
        let e = expr("add(x, 2)");
        let ExprKind::Call { callee, args } = &e.kind else {
            panic!("expected call expression");
        };
        assert_eq!(callee, "add");
        assert_eq!(args.len(), 2);
        assert!(matches!(&args[0].kind, ExprKind::Variable(name) if name == "x"));
        assert!(matches!(
            &args[1].kind,
            ExprKind::Number { kind: NumberKind::Int, .. }
        ));
    }

    #[test]
    fn test_var_decl_with_and_without_init() {
        let module = parse_ok("fn f() { int x = 1; float y; }");
        let stmts = &module.functions[0].body.stmts;
        assert!(matches!(
            &stmts[0].kind,
            StmtKind::VarDecl { ty: Type::Int, init: Some(_), .. }
        ));
        assert!(matches!(
            &stmts[1].kind,
            StmtKind::VarDecl { ty: Type::Float, init: None, .. }
        ));
    }

    #[test]
    fn test_print_statement() {
        let module = parse_ok("fn f() { print(\"%d %d\", a, b); }");
        let StmtKind::Print { format, args } = &module.functions[0].body.stmts[0].kind else {
            panic!("expected print statement");
        };
        assert_eq!(format, "%d %d");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_scan_statement() {
        let module = parse_ok("fn f() { int x; scan(x); }");
        assert!(matches!(
            &module.functions[0].body.stmts[1].kind,
            StmtKind::Scan { target } if target == "x"
        ));
    }

    #[test]
    fn test_if_else() {
        let module = parse_ok("fn f() { if (a < b) { return 1; } else { return 2; } }");
        let StmtKind::If { else_branch, .. } = &module.functions[0].body.stmts[0].kind else {
            panic!("expected if statement");
        };
        assert!(else_branch.is_some());
    }

    #[test]
    fn test_while() {
        let module = parse_ok("fn f() { while (x < 3) { print(\"%d\", x); } }");
        let StmtKind::While { body, .. } = &module.functions[0].body.stmts[0].kind else {
            panic!("expected while statement");
        };
        assert_eq!(body.stmts.len(), 1);
    }

    #[test]
    fn test_malformed_definition_is_skipped() {
        // The broken first definition is dropped; parsing resumes and
        // still finds the second one.
        let (module, errors) = parse("fn f( { }\nfn g() { return 1; }");
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].proto.name, "g");
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_statement_recovery_inside_block() {
        let (module, errors) = parse("fn f() { x; return 1; }");
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].body.stmts.len(), 1);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_unterminated_block_terminates() {
        let (module, errors) = parse("fn f() { return 1; ");
        assert!(module.functions.is_empty());
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_unknown_token_is_skipped() {
        let (module, _) = parse("@ fn f() { return 1; }");
        assert_eq!(module.functions.len(), 1);
    }

    #[test]
    fn test_missing_semicolon_drops_statement() {
        let (module, errors) = parse("fn f() { int x = 1 return 2; }");
        assert_eq!(module.functions.len(), 1);
        assert!(!errors.is_empty());
    }
}
