//! Calculator tool
//!
//! Evaluates arithmetic expressions with a small recursive-descent parser.
//! Nothing is ever executed: the input is tokenized, parsed into an
//! [`Expr`] tree, and folded into a [`Number`].
//!
//! Supported syntax:
//! - integer and float literals (`42`, `3.5`, `1e-3`)
//! - `+ - * / // % **` with the usual precedence, `**` binding tighter than
//!   unary minus and associating to the right
//! - parentheses and function calls (`sqrt(144)`, `log(8, 2)`)
//! - constants `pi`, `e`, `tau`, `inf`, `nan`
//!
//! Integer arithmetic stays exact until it overflows `i64`, at which point
//! it continues in floating point. `/` always yields a float.

use crate::error::Result;
use crate::tools::{string_arg, ToolExecutor, ToolResult};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Substrings that are rejected before parsing
const BLOCKED_WORDS: &[&str] = &["import", "exec", "eval", "__"];

/// Error raised while parsing or evaluating an expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CalcError(String);

impl CalcError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type CalcResult<T> = std::result::Result<T, CalcError>;

/// A numeric value: exact integer or float
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Exact integer
    Int(i64),
    /// Floating point value
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

/// Render a float the way a reader expects: `32.0`, `0.5`, `1e+16`, `1.5e-05`
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{:e}", x);
        return match sci.split_once('e') {
            Some((mantissa, exponent)) => {
                let exp: i32 = exponent.parse().unwrap_or(0);
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            None => sci,
        };
    }

    if x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Number),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> CalcResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(parse_literal(&literal)?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
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
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::DoubleStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::DoubleSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '%' => {
                tokens.push(Token::Percent);
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
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '^' => {
                return Err(CalcError::new(
                    "unsupported operator '^' (use ** for powers)",
                ))
            }
            other => {
                return Err(CalcError::new(format!(
                    "invalid character '{}' in expression",
                    other
                )))
            }
        }
    }

    Ok(tokens)
}

fn parse_literal(literal: &str) -> CalcResult<Number> {
    let is_float = literal.contains(['.', 'e', 'E']);
    if !is_float {
        if let Ok(i) = literal.parse::<i64>() {
            return Ok(Number::Int(i));
        }
    }
    literal
        .parse::<f64>()
        .map(Number::Float)
        .map_err(|_| CalcError::new(format!("invalid number literal '{}'", literal)))
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Number),
    Name(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse(mut self) -> CalcResult<Expr> {
        if self.tokens.is_empty() {
            return Err(CalcError::new("empty expression"));
        }
        let expr = self.expr()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(CalcError::new(format!(
                "invalid syntax near {:?}",
                token
            ))),
        }
    }

    fn expr(&mut self) -> CalcResult<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> CalcResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::DoubleSlash) => BinOp::FloorDiv,
                Some(Token::Percent) => BinOp::Mod,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> CalcResult<Expr> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> CalcResult<Expr> {
        let base = self.primary()?;
        if self.eat(&Token::DoubleStar) {
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> CalcResult<Expr> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Literal(n)),
            Some(Token::Name(name)) => {
                if self.eat(&Token::LParen) {
                    let mut args = Vec::new();
                    if !self.eat(&Token::RParen) {
                        loop {
                            args.push(self.expr()?);
                            if self.eat(&Token::Comma) {
                                continue;
                            }
                            if self.eat(&Token::RParen) {
                                break;
                            }
                            return Err(CalcError::new(format!(
                                "expected ',' or ')' in call to {}",
                                name
                            )));
                        }
                    }
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                if self.eat(&Token::RParen) {
                    Ok(inner)
                } else {
                    Err(CalcError::new("'(' was never closed"))
                }
            }
            Some(token) => Err(CalcError::new(format!("invalid syntax near {:?}", token))),
            None => Err(CalcError::new("unexpected end of expression")),
        }
    }
}

fn domain_error() -> CalcError {
    CalcError::new("math domain error")
}

fn checked_float(x: f64) -> CalcResult<Number> {
    if x.is_infinite() {
        Err(CalcError::new("math range error"))
    } else {
        Ok(Number::Float(x))
    }
}

fn float_to_int(x: f64) -> CalcResult<Number> {
    if x.is_nan() {
        return Err(CalcError::new("cannot convert float NaN to integer"));
    }
    if x.is_infinite() {
        return Err(CalcError::new("cannot convert float infinity to integer"));
    }
    if x.abs() < 9.2e18 {
        Ok(Number::Int(x as i64))
    } else {
        Ok(Number::Float(x))
    }
}

fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        rounded
    }
}

fn expect_integral(name: &str, value: Number) -> CalcResult<i64> {
    match value {
        Number::Int(i) => Ok(i),
        Number::Float(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => Ok(f as i64),
        Number::Float(_) => Err(CalcError::new(format!(
            "{}() only accepts integral values",
            name
        ))),
    }
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.abs()
}

fn binary(op: BinOp, lhs: Number, rhs: Number) -> CalcResult<Number> {
    use Number::{Float, Int};

    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul => {
            if let (Int(a), Int(b)) = (lhs, rhs) {
                let exact = match op {
                    BinOp::Add => a.checked_add(b),
                    BinOp::Sub => a.checked_sub(b),
                    _ => a.checked_mul(b),
                };
                if let Some(v) = exact {
                    return Ok(Int(v));
                }
            }
            let (a, b) = (lhs.as_f64(), rhs.as_f64());
            Ok(Float(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                _ => a * b,
            }))
        }
        BinOp::Div => {
            if rhs.is_zero() {
                return Err(CalcError::new("division by zero"));
            }
            Ok(Float(lhs.as_f64() / rhs.as_f64()))
        }
        BinOp::FloorDiv => {
            if rhs.is_zero() {
                return Err(CalcError::new("integer division or modulo by zero"));
            }
            if let (Int(a), Int(b)) = (lhs, rhs) {
                if let Some(q) = a.checked_div(b) {
                    let q = if (a % b != 0) && ((a < 0) != (b < 0)) {
                        q - 1
                    } else {
                        q
                    };
                    return Ok(Int(q));
                }
            }
            Ok(Float((lhs.as_f64() / rhs.as_f64()).floor()))
        }
        BinOp::Mod => {
            if rhs.is_zero() {
                return Err(CalcError::new("integer division or modulo by zero"));
            }
            if let (Int(a), Int(b)) = (lhs, rhs) {
                if let Some(r) = a.checked_rem(b) {
                    let r = if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r };
                    return Ok(Int(r));
                }
            }
            let (a, b) = (lhs.as_f64(), rhs.as_f64());
            let mut r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r += b;
            }
            Ok(Float(r))
        }
        BinOp::Pow => {
            if let (Int(a), Int(b)) = (lhs, rhs) {
                if b >= 0 {
                    if let Some(v) = u32::try_from(b).ok().and_then(|e| a.checked_pow(e)) {
                        return Ok(Int(v));
                    }
                }
            }
            let (a, b) = (lhs.as_f64(), rhs.as_f64());
            if a == 0.0 && b < 0.0 {
                return Err(CalcError::new("0.0 cannot be raised to a negative power"));
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(domain_error());
            }
            checked_float(a.powf(b))
        }
    }
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "tau" => Some(std::f64::consts::TAU),
        "inf" => Some(f64::INFINITY),
        "nan" => Some(f64::NAN),
        _ => None,
    }
}

const FUNCTIONS: &[&str] = &[
    "sqrt", "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "sinh", "cosh", "tanh", "exp",
    "log", "log10", "log2", "pow", "abs", "fabs", "round", "floor", "ceil", "trunc", "factorial",
    "degrees", "radians", "hypot", "gcd", "isqrt",
];

fn arity_error(name: &str, expected: &str, got: usize) -> CalcError {
    CalcError::new(format!(
        "{}() takes {} argument(s) ({} given)",
        name, expected, got
    ))
}

/// Round an integer to `digits` decimal places, ties to even
fn round_int(i: i64, digits: i64) -> Number {
    if digits >= 0 {
        return Number::Int(i);
    }
    if digits < -38 {
        return Number::Int(0);
    }
    let step = 10i128.pow((-digits) as u32);
    let value = i as i128;
    let mut quotient = value.div_euclid(step);
    let twice_rem = value.rem_euclid(step) * 2;
    if twice_rem > step || (twice_rem == step && quotient % 2 != 0) {
        quotient += 1;
    }
    let rounded = quotient * step;
    i64::try_from(rounded)
        .map(Number::Int)
        .unwrap_or(Number::Float(rounded as f64))
}

fn call(name: &str, args: &[Number]) -> CalcResult<Number> {
    let unary_float = |f: fn(f64) -> f64| -> CalcResult<Number> {
        match args {
            [x] => checked_float(f(x.as_f64())),
            _ => Err(arity_error(name, "exactly one", args.len())),
        }
    };

    match name {
        "sqrt" => match args {
            [x] if x.as_f64() < 0.0 => Err(domain_error()),
            _ => unary_float(f64::sqrt),
        },
        "sin" => unary_float(f64::sin),
        "cos" => unary_float(f64::cos),
        "tan" => unary_float(f64::tan),
        "asin" | "acos" => match args {
            [x] if x.as_f64().abs() > 1.0 => Err(domain_error()),
            _ if name == "asin" => unary_float(f64::asin),
            _ => unary_float(f64::acos),
        },
        "atan" => unary_float(f64::atan),
        "sinh" => unary_float(f64::sinh),
        "cosh" => unary_float(f64::cosh),
        "tanh" => unary_float(f64::tanh),
        "exp" => unary_float(f64::exp),
        "degrees" => unary_float(f64::to_degrees),
        "radians" => unary_float(f64::to_radians),
        "fabs" => unary_float(f64::abs),
        "log10" | "log2" => match args {
            [x] if x.as_f64() <= 0.0 => Err(domain_error()),
            _ if name == "log10" => unary_float(f64::log10),
            _ => unary_float(f64::log2),
        },
        "log" => match args {
            [x] if x.as_f64() <= 0.0 => Err(domain_error()),
            [x] => checked_float(x.as_f64().ln()),
            [x, base] => {
                let (x, base) = (x.as_f64(), base.as_f64());
                if x <= 0.0 || base <= 0.0 {
                    return Err(domain_error());
                }
                if base == 1.0 {
                    return Err(CalcError::new("float division by zero"));
                }
                checked_float(x.ln() / base.ln())
            }
            _ => Err(arity_error(name, "one or two", args.len())),
        },
        "pow" => match args {
            [x, y] => binary(BinOp::Pow, Number::Float(x.as_f64()), *y),
            _ => Err(arity_error(name, "exactly two", args.len())),
        },
        "atan2" => match args {
            [y, x] => checked_float(y.as_f64().atan2(x.as_f64())),
            _ => Err(arity_error(name, "exactly two", args.len())),
        },
        "hypot" => match args {
            [x, y] => checked_float(x.as_f64().hypot(y.as_f64())),
            _ => Err(arity_error(name, "exactly two", args.len())),
        },
        "abs" => match args {
            [Number::Int(i)] => Ok(i
                .checked_abs()
                .map(Number::Int)
                .unwrap_or(Number::Float((*i as f64).abs()))),
            [Number::Float(f)] => Ok(Number::Float(f.abs())),
            _ => Err(arity_error(name, "exactly one", args.len())),
        },
        "round" => match args {
            [Number::Int(i)] => Ok(Number::Int(*i)),
            [Number::Float(f)] => float_to_int(round_half_even(*f)),
            [x, digits] => {
                let digits = expect_integral(name, *digits)?;
                if let Number::Int(i) = x {
                    return Ok(round_int(*i, digits));
                }
                let scale = 10f64.powi(digits.clamp(-308, 308) as i32);
                Ok(Number::Float(round_half_even(x.as_f64() * scale) / scale))
            }
            _ => Err(arity_error(name, "one or two", args.len())),
        },
        "floor" | "ceil" | "trunc" => match args {
            [Number::Int(i)] => Ok(Number::Int(*i)),
            [Number::Float(f)] => float_to_int(match name {
                "floor" => f.floor(),
                "ceil" => f.ceil(),
                _ => f.trunc(),
            }),
            _ => Err(arity_error(name, "exactly one", args.len())),
        },
        "factorial" => match args {
            [x] => {
                let n = expect_integral(name, *x)?;
                if n < 0 {
                    return Err(CalcError::new("factorial() not defined for negative values"));
                }
                let mut acc = Number::Int(1);
                for k in 2..=n {
                    acc = binary(BinOp::Mul, acc, Number::Int(k))?;
                    if let Number::Float(f) = acc {
                        if f.is_infinite() {
                            return Err(CalcError::new("math range error"));
                        }
                    }
                }
                Ok(acc)
            }
            _ => Err(arity_error(name, "exactly one", args.len())),
        },
        "gcd" => {
            let mut acc = 0i64;
            for arg in args {
                acc = gcd(acc, expect_integral(name, *arg)?);
            }
            Ok(Number::Int(acc))
        }
        "isqrt" => match args {
            [x] => {
                let n = expect_integral(name, *x)?;
                if n < 0 {
                    return Err(CalcError::new("isqrt() argument must be nonnegative"));
                }
                // A product that overflows is larger than any i64
                let square_le = |r: i64| r.checked_mul(r).is_some_and(|sq| sq <= n);
                let mut r = (n as f64).sqrt() as i64;
                while !square_le(r) {
                    r -= 1;
                }
                while square_le(r + 1) {
                    r += 1;
                }
                Ok(Number::Int(r))
            }
            _ => Err(arity_error(name, "exactly one", args.len())),
        },
        other => Err(CalcError::new(format!("name '{}' is not defined", other))),
    }
}

fn eval(expr: &Expr) -> CalcResult<Number> {
    match expr {
        Expr::Literal(n) => Ok(*n),
        Expr::Name(name) => {
            if let Some(value) = constant(name) {
                Ok(Number::Float(value))
            } else if FUNCTIONS.contains(&name.as_str()) {
                Err(CalcError::new(format!(
                    "'{}' is a function; call it like {}(...)",
                    name, name
                )))
            } else {
                Err(CalcError::new(format!("name '{}' is not defined", name)))
            }
        }
        Expr::Neg(inner) => match eval(inner)? {
            Number::Int(i) => Ok(i
                .checked_neg()
                .map(Number::Int)
                .unwrap_or(Number::Float(-(i as f64)))),
            Number::Float(f) => Ok(Number::Float(-f)),
        },
        Expr::Binary(op, lhs, rhs) => binary(*op, eval(lhs)?, eval(rhs)?),
        Expr::Call(name, args) => {
            if constant(name).is_some() {
                return Err(CalcError::new(format!("'{}' is not callable", name)));
            }
            let values = args.iter().map(eval).collect::<CalcResult<Vec<_>>>()?;
            call(name, &values)
        }
    }
}

/// Evaluate an arithmetic expression
///
/// # Examples
///
/// ```
/// use webqa::tools::calculator::{evaluate, Number};
///
/// assert_eq!(evaluate("15 * 23 + 47").unwrap(), Number::Int(392));
/// assert_eq!(evaluate("sqrt(144) + 10 / 100 * 200").unwrap().to_string(), "32.0");
/// assert!(evaluate("1 / 0").is_err());
/// ```
///
/// # Errors
///
/// Returns a `CalcError` for syntax errors, unknown names, and math
/// errors such as division by zero
pub fn evaluate(expression: &str) -> std::result::Result<Number, CalcError> {
    let tokens = tokenize(expression)?;
    let expr = Parser::new(tokens).parse()?;
    eval(&expr)
}

/// Tool for performing mathematical calculations
#[derive(Debug, Default, Clone, Copy)]
pub struct CalculatorTool;

impl CalculatorTool {
    /// Create a new calculator tool
    pub fn new() -> Self {
        Self
    }

    /// Evaluate an expression and render the observation
    pub fn calculate(&self, expression: &str) -> ToolResult {
        let lowered = expression.to_lowercase();
        if BLOCKED_WORDS.iter().any(|word| lowered.contains(word)) {
            tracing::warn!("Rejected calculator expression: {}", expression);
            return ToolResult::error("Invalid expression");
        }

        match evaluate(expression) {
            Ok(value) => ToolResult::success(format!("Result: {}", value)),
            Err(e) => {
                tracing::debug!("Calculator failed on '{}': {}", expression, e);
                ToolResult::error(format!("Could not calculate. {}", e))
            }
        }
    }
}

#[async_trait]
impl ToolExecutor for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Performs mathematical calculations. Use for arithmetic, algebra, and basic math operations. Input should be a valid mathematical expression."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Mathematical expression, e.g. 'sqrt(144) + 0.1 * 200'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        match string_arg(&args, "expression") {
            Some(expression) => Ok(self.calculate(expression)),
            None => Ok(ToolResult::error(
                "Could not calculate. missing required argument 'expression'",
            )),
        }
    }
}
