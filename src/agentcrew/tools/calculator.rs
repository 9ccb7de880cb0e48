//! # Calculator Capability
//!
//! A small, closed arithmetic grammar for agents that need to do sums. It is a
//! recursive-descent parser over a fixed token set, not a general evaluator. There are
//! no variables, no assignment, no strings, and no way to call anything outside the
//! function list below.
//!
//! ## Grammar
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary (('^' | '**') unary)?
//! primary := number | constant | function '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! Exponentiation is right-associative and binds tighter than unary minus, so `-2^2` is `-4`.
//!
//! - **Constants**: `pi`, `e`
//! - **Unary functions**: `sqrt`, `abs`, `floor`, `ceil`, `round`, `ln`, `log` (base 10),
//!   `log2`, `exp`, `sin`, `cos`, `tan` (radians)
//! - **Variadic functions**: `min`, `max`, `sum`, `mean`
//!
//! ```rust
//! use agentcrew::tools::Calculator;
//!
//! let calc = Calculator::new();
//! assert_eq!(calc.evaluate("2 + 2 * 3").unwrap(), 8.0);
//! assert_eq!(calc.evaluate("(2 + 3)^2").unwrap(), 25.0);
//! assert!(calc.evaluate("1 / 0").is_err());
//! ```

use std::error::Error;
use std::fmt;

/// Longest expression the calculator will look at.
pub const MAX_EXPRESSION_LEN: usize = 512;
/// Deepest parenthesis / unary nesting allowed.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Error type for calculator operations
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorError {
    message: String,
}

impl CalculatorError {
    pub fn new(message: impl Into<String>) -> Self {
        CalculatorError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CalculatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Calculator error: {}", self.message)
    }
}

impl Error for CalculatorError {}

/// Either returns a computed `f64` value or a `CalculatorError`.
pub type CalculatorResult = Result<f64, CalculatorError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalculatorError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // optional exponent: 1e3, 2.5E-4
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| CalculatorError::new(format!("invalid number '{}'", literal)))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(ident.to_ascii_lowercase()));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if i + 1 < chars.len() && chars[i + 1] == '*' {
                    tokens.push(Token::StarStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' | '[' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' | ']' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => {
                return Err(CalculatorError::new(format!(
                    "unexpected character '{}'",
                    other
                )))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<(), CalculatorError> {
        match self.advance() {
            Some(ref tok) if *tok == expected => Ok(()),
            Some(tok) => Err(CalculatorError::new(format!(
                "expected {:?}, found {:?}",
                expected, tok
            ))),
            None => Err(CalculatorError::new(format!(
                "expected {:?}, found end of expression",
                expected
            ))),
        }
    }

    fn descend(&mut self) -> Result<(), CalculatorError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(CalculatorError::new("expression is nested too deeply"));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn expr(&mut self) -> CalculatorResult {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> CalculatorResult {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(CalculatorError::new("division by zero"));
                    }
                    value /= rhs;
                }
                Some(Token::Percent) => {
                    self.advance();
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(CalculatorError::new("modulo by zero"));
                    }
                    value %= rhs;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> CalculatorResult {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                self.descend()?;
                let v = self.unary();
                self.ascend();
                Ok(-v?)
            }
            Some(Token::Plus) => {
                self.advance();
                self.descend()?;
                let v = self.unary();
                self.ascend();
                v
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> CalculatorResult {
        let base = self.primary()?;
        match self.peek() {
            Some(Token::Caret) | Some(Token::StarStar) => {
                self.advance();
                self.descend()?;
                let exponent = self.unary();
                self.ascend();
                Ok(base.powf(exponent?))
            }
            _ => Ok(base),
        }
    }

    fn primary(&mut self) -> CalculatorResult {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                self.descend()?;
                let v = self.expr();
                self.ascend();
                let v = v?;
                self.expect(Token::RParen)?;
                Ok(v)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let args = self.arguments()?;
                    apply_function(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(tok) => Err(CalculatorError::new(format!("unexpected token {:?}", tok))),
            None => Err(CalculatorError::new("unexpected end of expression")),
        }
    }

    fn arguments(&mut self) -> Result<Vec<f64>, CalculatorError> {
        self.descend()?;
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.advance();
            self.ascend();
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                Some(tok) => {
                    return Err(CalculatorError::new(format!(
                        "expected ',' or ')', found {:?}",
                        tok
                    )))
                }
                None => return Err(CalculatorError::new("unclosed function call")),
            }
        }
        self.ascend();
        Ok(args)
    }
}

fn constant(name: &str) -> CalculatorResult {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        other => Err(CalculatorError::new(format!("unknown constant '{}'", other))),
    }
}

fn apply_function(name: &str, args: &[f64]) -> CalculatorResult {
    let single = |args: &[f64]| -> CalculatorResult {
        match args {
            [x] => Ok(*x),
            _ => Err(CalculatorError::new(format!(
                "{}() takes exactly one argument, got {}",
                name,
                args.len()
            ))),
        }
    };
    let non_empty = |args: &[f64]| -> Result<(), CalculatorError> {
        if args.is_empty() {
            Err(CalculatorError::new(format!(
                "{}() needs at least one argument",
                name
            )))
        } else {
            Ok(())
        }
    };

    match name {
        "sqrt" => {
            let x = single(args)?;
            if x < 0.0 {
                return Err(CalculatorError::new("square root of a negative number"));
            }
            Ok(x.sqrt())
        }
        "abs" => Ok(single(args)?.abs()),
        "floor" => Ok(single(args)?.floor()),
        "ceil" => Ok(single(args)?.ceil()),
        "round" => Ok(single(args)?.round()),
        "ln" | "log" | "log2" => {
            let x = single(args)?;
            if x <= 0.0 {
                return Err(CalculatorError::new(format!(
                    "{}() is undefined for non-positive values",
                    name
                )));
            }
            Ok(match name {
                "ln" => x.ln(),
                "log" => x.log10(),
                _ => x.log2(),
            })
        }
        "exp" => Ok(single(args)?.exp()),
        "sin" => Ok(single(args)?.sin()),
        "cos" => Ok(single(args)?.cos()),
        "tan" => Ok(single(args)?.tan()),
        "min" => {
            non_empty(args)?;
            Ok(args.iter().copied().fold(f64::INFINITY, f64::min))
        }
        "max" => {
            non_empty(args)?;
            Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        }
        "sum" => Ok(args.iter().sum()),
        "mean" => {
            non_empty(args)?;
            Ok(args.iter().sum::<f64>() / args.len() as f64)
        }
        other => Err(CalculatorError::new(format!("unknown function '{}'", other))),
    }
}

/// Stateless evaluator for the grammar above. Cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct Calculator {}

impl Calculator {
    pub fn new() -> Self {
        Calculator {}
    }

    /// Evaluate an arithmetic expression.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression is empty or too long, does not parse, divides by
    /// zero, calls a function outside its domain, or produces a non-finite result.
    pub fn evaluate(&self, expression: &str) -> CalculatorResult {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(CalculatorError::new("empty expression"));
        }
        if expression.len() > MAX_EXPRESSION_LEN {
            return Err(CalculatorError::new(format!(
                "expression longer than {} characters",
                MAX_EXPRESSION_LEN
            )));
        }

        let tokens = tokenize(expression)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let value = parser.expr()?;
        if let Some(tok) = parser.peek() {
            return Err(CalculatorError::new(format!(
                "unexpected trailing token {:?}",
                tok
            )));
        }
        if !value.is_finite() {
            return Err(CalculatorError::new("result is not a finite number"));
        }
        Ok(value)
    }
}
