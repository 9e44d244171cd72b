//! Parameter formula interpreter (C3): a small recursive-descent arithmetic
//! evaluator over a [`ParameterTable`](lca_schemas::calc_setup::ParameterTable).
//! Exchange amounts, allocation factors and cost amounts may be given as a
//! formula string instead of a literal; this module is the adapter that
//! turns such a string into a resolved `f64`.
//!
//! Grammar (standard precedence, left-associative, `^` right-associative):
//!
//! ```text
//! expr   := term (("+" | "-") term)*
//! term   := factor (("*" | "/") factor)*
//! power  := unary ("^" power)?
//! unary  := ("-")? power
//! factor := unary
//! atom   := NUMBER | IDENT | "(" expr ")"
//! ```

use lca_schemas::calc_setup::ParameterTable;

use crate::error::{LcaError, Result};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse::<f64>().map_err(|_| LcaError::FormulaEvalFailed {
                    formula: input.to_string(),
                    reason: format!("invalid number literal '{text}'"),
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(text));
            }
            other => {
                return Err(LcaError::FormulaEvalFailed {
                    formula: input.to_string(),
                    reason: format!("unexpected character '{other}'"),
                })
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    formula: &'a str,
    params: &'a ParameterTable,
    context_id: Option<u64>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    fn fail(&self, reason: impl Into<String>) -> LcaError {
        LcaError::FormulaEvalFailed {
            formula: self.formula.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_expr(&mut self) -> Result<f64> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<f64> {
        let mut value = self.parse_power()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.parse_power()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let divisor = self.parse_power()?;
                    if divisor == 0.0 {
                        return Err(self.fail("division by zero"));
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_power(&mut self) -> Result<f64> {
        let base = self.parse_unary()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            let exponent = self.parse_power()?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn parse_unary(&mut self) -> Result<f64> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            Ok(-self.parse_unary()?)
        } else {
            self.parse_atom()
        }
    }

    fn parse_atom(&mut self) -> Result<f64> {
        match self.advance().cloned() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Ident(name)) => self
                .params
                .get(self.context_id, &name)
                .ok_or_else(|| self.fail(format!("unknown parameter '{name}'"))),
            Some(Token::LParen) => {
                let value = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(self.fail("expected closing parenthesis")),
                }
            }
            other => Err(self.fail(format!("unexpected token {other:?}"))),
        }
    }
}

/// Evaluates `formula` against `params`, resolving identifiers in
/// `context_id`'s scope with fallback to the global scope (§3
/// `ParameterTable` semantics).
pub fn evaluate(formula: &str, params: &ParameterTable, context_id: Option<u64>) -> Result<f64> {
    let tokens = lex(formula)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        formula,
        params,
        context_id,
    };
    let value = parser.parse_expr()?;
    if parser.pos != tokens.len() {
        return Err(LcaError::FormulaEvalFailed {
            formula: formula.to_string(),
            reason: "trailing tokens after a complete expression".to_string(),
        });
    }
    Ok(value)
}
