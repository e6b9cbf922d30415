//! Arithmetic calculation tool.
//!
//! Evaluates expressions with a dedicated recursive-descent parser restricted
//! to numeric literals, `+ - * / ( )` and unary minus. Anything else is
//! rejected at tokenization, so arbitrary model-proposed text can never reach
//! an interpreter.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use super::Tool;

#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{0}' in expression")]
    UnexpectedCharacter(char),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expected ')'")]
    MissingCloseParen,

    #[error("division by zero")]
    DivisionByZero,

    #[error("expression result is not a finite number")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value: f64 = text
                .parse()
                .map_err(|_| ExprError::InvalidNumber(text.clone()))?;
            tokens.push(Token::Number(value));
            continue;
        }

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(ExprError::UnexpectedCharacter(other)),
        };
        tokens.push(token);
        i += 1;
    }

    Ok(tokens)
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64, ExprError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ExprError::UnexpectedEnd);
    }

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.parse_additive()?;
    if parser.pos != parser.tokens.len() {
        return Err(ExprError::UnexpectedToken(parser.pos));
    }
    if !value.is_finite() {
        return Err(ExprError::NonFinite);
    }
    Ok(value)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn parse_additive(&mut self) -> Result<f64, ExprError> {
        let mut left = self.parse_multiplicative()?;

        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.pos += 1;
                    left += self.parse_multiplicative()?;
                }
                Token::Minus => {
                    self.pos += 1;
                    left -= self.parse_multiplicative()?;
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<f64, ExprError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.pos += 1;
                    left *= self.parse_unary()?;
                }
                Token::Slash => {
                    self.pos += 1;
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err(ExprError::DivisionByZero);
                    }
                    left /= right;
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<f64, ExprError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.parse_unary()?)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<f64, ExprError> {
        match self.peek() {
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(value)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let value = self.parse_additive()?;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    _ => Err(ExprError::MissingCloseParen),
                }
            }
            Some(_) => Err(ExprError::UnexpectedToken(self.pos)),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

/// Tool wrapper around the expression evaluator.
pub struct Calculate;

#[async_trait]
impl Tool for Calculate {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Perform mathematical calculations. Supports numbers, +, -, *, / and parentheses."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The mathematical expression to calculate"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let expression = args["expression"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'expression' argument"))?;

        let result = evaluate(expression)
            .map_err(|e| anyhow::anyhow!("Invalid mathematical expression: {}", e))?;

        Ok(json!({
            "expression": expression,
            "result": number_value(result),
        }))
    }
}

/// Render integral results without a fractional part.
fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        json!(value as i64)
    } else {
        json!(value)
    }
}
