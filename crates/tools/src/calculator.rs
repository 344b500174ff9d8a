//! `calculate` action, which evaluates arithmetic expressions.
//!
//! Supports `+`, `-`, `*`, `/`, floor division `//`, modulo `%`, power
//! `**`, parentheses and unary signs, over decimal numbers. Precedence
//! follows the usual convention: `**` binds tightest and is
//! right-associative, so `-2 ** 2` is `-4`.
//!
//! Nothing but arithmetic is evaluated. Names, calls and strings are
//! rejected as invalid arguments.

use async_trait::async_trait;
use actloop_core::action::Action;
use actloop_core::error::ActionError;
use std::iter::Peekable;
use std::str::CharIndices;

pub struct CalculateAction;

#[async_trait]
impl Action for CalculateAction {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "e.g. calculate: 4 * 7 / 3\n\
         Runs a calculation and returns the number. Use floating point \
         syntax if necessary."
    }

    async fn invoke(&self, argument: &str) -> Result<String, ActionError> {
        let value = evaluate(argument)?;
        Ok(format_number(value))
    }
}

/// Render a result: whole numbers without a fractional part, everything
/// else in shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expr: &str) -> Result<f64, ActionError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(tok) = parser.tokens.get(parser.pos) {
        return Err(ActionError::InvalidArgument(format!(
            "unexpected {tok:?} after complete expression"
        )));
    }
    if !value.is_finite() {
        return Err(ActionError::Failed("result is not a finite number".into()));
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ActionError> {
    let mut tokens = Vec::new();
    let mut chars: Peekable<CharIndices<'_>> = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '+' => Token::Add,
            '-' => Token::Sub,
            '%' => Token::Mod,
            '(' => Token::Open,
            ')' => Token::Close,
            '*' if chars.next_if(|&(_, n)| n == '*').is_some() => Token::Pow,
            '*' => Token::Mul,
            '/' if chars.next_if(|&(_, n)| n == '/').is_some() => Token::FloorDiv,
            '/' => Token::Div,
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start + c.len_utf8();
                while let Some((i, n)) = chars.next_if(|&(_, n)| n.is_ascii_digit() || n == '.') {
                    end = i + n.len_utf8();
                }
                let literal = &input[start..end];
                let value = literal.parse().map_err(|_| {
                    ActionError::InvalidArgument(format!("invalid number '{literal}'"))
                })?;
                Token::Num(value)
            }
            other => {
                return Err(ActionError::InvalidArgument(format!(
                    "unsupported character '{other}'"
                )));
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// Deepest nesting of parentheses and unary signs the parser will follow.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, ActionError> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Add) => {
                    self.bump();
                    acc += self.term()?;
                }
                Some(Token::Sub) => {
                    self.bump();
                    acc -= self.term()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    // term := unary (('*' | '/' | '//' | '%') unary)*
    fn term(&mut self) -> Result<f64, ActionError> {
        let mut acc = self.unary()?;
        while let Some(op @ (Token::Mul | Token::Div | Token::FloorDiv | Token::Mod)) = self.peek()
        {
            self.bump();
            let rhs = self.unary()?;
            acc = match op {
                Token::Mul => acc * rhs,
                _ if rhs == 0.0 => return Err(ActionError::Failed("division by zero".into())),
                Token::Div => acc / rhs,
                Token::FloorDiv => (acc / rhs).floor(),
                // Sign follows the divisor.
                _ => acc - rhs * (acc / rhs).floor(),
            };
        }
        Ok(acc)
    }

    // unary := ('+' | '-') unary | power
    fn unary(&mut self) -> Result<f64, ActionError> {
        // Every nested group and sign passes through here
        if self.depth >= MAX_DEPTH {
            return Err(ActionError::InvalidArgument(
                "expression nested too deeply".into(),
            ));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, ActionError> {
        match self.peek() {
            Some(Token::Sub) => {
                self.bump();
                Ok(-self.unary()?)
            }
            Some(Token::Add) => {
                self.bump();
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := atom ('**' unary)?
    fn power(&mut self) -> Result<f64, ActionError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Pow) {
            self.bump();
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // atom := NUMBER | '(' expr ')'
    fn atom(&mut self) -> Result<f64, ActionError> {
        match self.bump() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Open) => {
                let inner = self.expr()?;
                match self.bump() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(ActionError::InvalidArgument("missing ')'".into())),
                }
            }
            Some(tok) => Err(ActionError::InvalidArgument(format!(
                "unexpected {tok:?}"
            ))),
            None => Err(ActionError::InvalidArgument(
                "unexpected end of expression".into(),
            )),
        }
    }
}
