//! Recursive-descent parser producing the whitelisted syntax tree.
//!
//! The grammar is deliberately tiny: arithmetic, unary sign, simple
//! function calls and (possibly dotted) name lookups. Everything else is
//! rejected at parse time so evaluation never sees an unvetted node.

use crate::ExprError;
use crate::lexer::{Lexer, Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    /// Plain identifier or dotted path (`a.b.c`) naming one symbol key.
    Name(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

pub(crate) fn parse(source: &str) -> Result<Expr, ExprError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, index: 0 };
    let expr = parser.parse_add_sub()?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    fn parse_add_sub(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_mul_div()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul_div()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_mul_div(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        match self.peek().kind {
            TokenKind::Plus => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Plus, Box::new(self.parse_unary()?)))
            }
            TokenKind::Minus => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Minus, Box::new(self.parse_unary()?)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr::Number(value))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_add_sub()?;
                self.expect(TokenKind::RParen, "expected ')'")?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    return self.parse_call(name);
                }
                let mut path = name;
                while self.check(&TokenKind::Dot) {
                    self.advance();
                    let part = self.consume_ident("expected identifier after '.'")?;
                    path.push('.');
                    path.push_str(&part);
                }
                // `a.b(...)` would be a method-style call on a symbol; only
                // bare function names are callable.
                if path.contains('.') && self.check(&TokenKind::LParen) {
                    return Err(ExprError::NotSimpleCall);
                }
                Ok(Expr::Name(path))
            }
            TokenKind::Eof => Err(ExprError::Parse("unexpected end of expression".to_string())),
            other => Err(ExprError::Parse(format!(
                "unexpected token {:?} at column {}",
                other, token.column
            ))),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr, ExprError> {
        self.expect(TokenKind::LParen, "expected '('")?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_add_sub()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "expected ')' to close call")?;
        Ok(Expr::Call(name, args))
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    fn consume_ident(&mut self, message: &str) -> Result<String, ExprError> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(ExprError::Parse(format!(
                "{message} at column {}",
                self.peek().column
            ))),
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<(), ExprError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(ExprError::Parse(format!(
                "{message} at column {}",
                self.peek().column
            )))
        }
    }

    fn expect_eof(&mut self) -> Result<(), ExprError> {
        if self.check(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(ExprError::Parse(format!(
                "unexpected trailing input at column {}",
                self.peek().column
            )))
        }
    }
}
