//! Tokenizer for the restricted expression grammar.

use crate::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    LParen,
    RParen,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Eof,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub column: usize,
}

pub(crate) struct Lexer<'a> {
    source: &'a str,
    index: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            index: 0,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ExprError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance_char();
                continue;
            }

            let column = self.column;
            let kind = match ch {
                '(' => {
                    self.advance_char();
                    TokenKind::LParen
                }
                ')' => {
                    self.advance_char();
                    TokenKind::RParen
                }
                ',' => {
                    self.advance_char();
                    TokenKind::Comma
                }
                '+' => {
                    self.advance_char();
                    TokenKind::Plus
                }
                '-' => {
                    self.advance_char();
                    TokenKind::Minus
                }
                '*' => {
                    self.advance_char();
                    TokenKind::Star
                }
                '/' => {
                    self.advance_char();
                    TokenKind::Slash
                }
                '.' if !self.second_char_is_digit() => {
                    self.advance_char();
                    TokenKind::Dot
                }
                c if is_ident_start(c) => self.lex_identifier(),
                c if c.is_ascii_digit() || c == '.' => self.lex_number(column)?,
                _ => {
                    return Err(ExprError::Parse(format!(
                        "unexpected character '{ch}' at column {column}"
                    )));
                }
            };
            tokens.push(Token { kind, column });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            column: self.column,
        });
        Ok(tokens)
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let start = self.index;
        self.advance_char();
        while self.peek_char().map(is_ident_continue).unwrap_or(false) {
            self.advance_char();
        }
        TokenKind::Ident(self.source[start..self.index].to_string())
    }

    fn lex_number(&mut self, column: usize) -> Result<TokenKind, ExprError> {
        let start = self.index;

        if self.peek_char() == Some('.') {
            self.advance_char();
        }
        while self.peek_char().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.advance_char();
        }
        if self.peek_char() == Some('.') && !self.source[start..self.index].contains('.') {
            self.advance_char();
            while self.peek_char().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.advance_char();
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            self.advance_char();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.advance_char();
            }
            let mut exp_digits = 0usize;
            while self.peek_char().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                exp_digits += 1;
                self.advance_char();
            }
            if exp_digits == 0 {
                return Err(ExprError::Parse(format!(
                    "invalid exponent in number at column {column}"
                )));
            }
        }

        let text = &self.source[start..self.index];
        let value = text.parse::<f64>().map_err(|err| {
            ExprError::Parse(format!("invalid number literal '{text}': {err}"))
        })?;
        Ok(TokenKind::Number(value))
    }

    fn second_char_is_digit(&self) -> bool {
        let mut chars = self.source[self.index..].chars();
        chars.next();
        chars.next().map(|c| c.is_ascii_digit()).unwrap_or(false)
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.index..].chars().next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.index += ch.len_utf8();
        self.column += 1;
        Some(ch)
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}

fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}
