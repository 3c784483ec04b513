//! Mapping expression parser
//!
//! This module implements a recursive descent parser for the JSONata subset
//! used by transformation expressions, with position-aware error reporting.
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use super::ast::*;
use super::error::ExpressionError;
use serde_json::{Number, Value};
use std::iter::Peekable;
use std::str::Chars;

type ParseResult<T> = std::result::Result<T, ExpressionError>;

/// Deepest nesting of sub-expressions and unary operators the parser accepts
pub const MAX_NESTING_DEPTH: usize = 64;

/// Mapping expression parser
pub struct Parser<'a> {
    /// Input string being parsed
    input: &'a str,
    /// Character iterator
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input
    position: usize,
    /// Current nesting depth
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input
    pub fn new(input: &'a str) -> ParseResult<Self> {
        if input.trim().is_empty() {
            return Err(ExpressionError::parse("Empty mapping expression", 0, input));
        }

        Ok(Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            depth: 0,
        })
    }

    /// Parse the whole input into a single expression node
    pub fn parse(mut self) -> ParseResult<Node> {
        let node = self.parse_expression()?;
        self.skip_whitespace();
        if let Some(ch) = self.current_char() {
            return Err(ExpressionError::syntax(
                "Unexpected trailing input",
                self.position,
                vec!["end of expression".to_string()],
                ch.to_string(),
            ));
        }
        Ok(node)
    }

    fn parse_expression(&mut self) -> ParseResult<Node> {
        self.nested(Self::parse_conditional)
    }

    /// Run a recursive production one level deeper, failing past the nesting limit
    fn nested<T>(&mut self, production: fn(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ExpressionError::parse(
                format!("Expression nesting exceeds {} levels", MAX_NESTING_DEPTH),
                self.position,
                String::new(),
            ));
        }
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    /// Parse `condition ? then : otherwise`
    fn parse_conditional(&mut self) -> ParseResult<Node> {
        let condition = self.parse_logical_or()?;

        self.skip_whitespace();
        if !self.match_operator("?") {
            return Ok(condition);
        }

        let then = self.parse_expression()?;
        self.skip_whitespace();
        let otherwise = if self.match_operator(":") {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        Ok(Node::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise,
        })
    }

    /// Parse logical OR expression
    fn parse_logical_or(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_logical_and()?;

        loop {
            self.skip_whitespace();
            if !self.match_keyword("or") {
                break;
            }
            let right = self.parse_logical_and()?;
            expr = binary(expr, BinaryOperator::Or, right);
        }

        Ok(expr)
    }

    /// Parse logical AND expression
    fn parse_logical_and(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_comparison()?;

        loop {
            self.skip_whitespace();
            if !self.match_keyword("and") {
                break;
            }
            let right = self.parse_comparison()?;
            expr = binary(expr, BinaryOperator::And, right);
        }

        Ok(expr)
    }

    /// Parse equality and ordering comparisons
    fn parse_comparison(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_additive()?;

        loop {
            self.skip_whitespace();
            let operator = if self.match_operator("!=") {
                BinaryOperator::NotEqual
            } else if self.match_operator("<=") {
                BinaryOperator::LessThanOrEqual
            } else if self.match_operator(">=") {
                BinaryOperator::GreaterThanOrEqual
            } else if self.match_operator("=") {
                BinaryOperator::Equal
            } else if self.match_operator("<") {
                BinaryOperator::LessThan
            } else if self.match_operator(">") {
                BinaryOperator::GreaterThan
            } else {
                break;
            };
            let right = self.parse_additive()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    /// Parse `+`, `-` and string concatenation `&`
    fn parse_additive(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_multiplicative()?;

        loop {
            self.skip_whitespace();
            let operator = match self.current_char() {
                Some('+') => BinaryOperator::Add,
                Some('-') => BinaryOperator::Subtract,
                Some('&') => BinaryOperator::Concat,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_unary()?;

        loop {
            self.skip_whitespace();
            let operator = match self.current_char() {
                Some('*') => BinaryOperator::Multiply,
                Some('/') if self.peek_char() != Some('*') => BinaryOperator::Divide,
                Some('%') => BinaryOperator::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Node> {
        self.skip_whitespace();

        if self.current_char() == Some('-') {
            self.advance();
            let operand = self.nested(Self::parse_unary)?;
            return Ok(match operand {
                Node::Literal(Value::Number(n)) => Node::Literal(negate_number(&n)),
                other => Node::Negate(Box::new(other)),
            });
        }

        self.parse_path()
    }

    /// Parse a dot-separated chain of steps
    fn parse_path(&mut self) -> ParseResult<Node> {
        let mut steps = vec![self.parse_step(true)?];

        loop {
            self.skip_whitespace();
            if self.current_char() != Some('.') {
                break;
            }
            self.advance();
            steps.push(self.parse_step(false)?);
        }

        if steps.len() == 1 && steps[0].predicates.is_empty() {
            if let StepKind::Expr(_) = steps[0].kind {
                if let Some(Step {
                    kind: StepKind::Expr(node),
                    ..
                }) = steps.pop()
                {
                    return Ok(*node);
                }
            }
        }

        Ok(Node::Path(steps))
    }

    /// Parse one step and any bracketed predicates that follow it
    fn parse_step(&mut self, first: bool) -> ParseResult<Step> {
        let kind = self.parse_primary(first)?;
        let mut step = Step::new(kind);

        loop {
            self.skip_whitespace();
            if self.current_char() != Some('[') {
                break;
            }
            self.advance();
            let predicate = self.parse_expression()?;
            self.skip_whitespace();
            self.expect_char(']')?;
            step.predicates.push(match predicate {
                Node::Literal(Value::Number(n)) => match n.as_i64() {
                    Some(index) => Predicate::Index(index),
                    None => Predicate::Filter(Node::Literal(Value::Number(n))),
                },
                other => Predicate::Filter(other),
            });
        }

        Ok(step)
    }

    /// Parse primary expressions
    fn parse_primary(&mut self, first: bool) -> ParseResult<StepKind> {
        self.skip_whitespace();

        match self.current_char() {
            Some('(') => {
                self.advance();
                let inner = self.parse_expression()?;
                self.skip_whitespace();
                self.expect_char(')')?;
                Ok(StepKind::Expr(Box::new(inner)))
            }
            Some('{') => Ok(StepKind::Expr(Box::new(self.parse_object()?))),
            Some('[') if first => Ok(StepKind::Expr(Box::new(self.parse_array()?))),
            Some('"') | Some('\'') => {
                let text = self.parse_quoted_string()?;
                if first {
                    Ok(StepKind::Expr(Box::new(Node::Literal(Value::String(text)))))
                } else {
                    Ok(StepKind::Field(text))
                }
            }
            Some('`') => Ok(StepKind::Field(self.parse_backtick_name()?)),
            Some('*') => {
                self.advance();
                Ok(StepKind::Wildcard)
            }
            Some('$') => self.parse_dollar(),
            Some(ch) if ch.is_ascii_digit() && first => {
                let number = self.parse_number()?;
                Ok(StepKind::Expr(Box::new(Node::Literal(Value::Number(number)))))
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let name = self.parse_identifier()?;
                if first {
                    let literal = match name.as_str() {
                        "true" => Some(Value::Bool(true)),
                        "false" => Some(Value::Bool(false)),
                        "null" => Some(Value::Null),
                        _ => None,
                    };
                    if let Some(literal) = literal {
                        return Ok(StepKind::Expr(Box::new(Node::Literal(literal))));
                    }
                }
                Ok(StepKind::Field(name))
            }
            Some(ch) => Err(ExpressionError::syntax(
                "Unexpected character",
                self.position,
                vec![
                    "field name".to_string(),
                    "literal".to_string(),
                    "'$'".to_string(),
                    "'('".to_string(),
                    "'{'".to_string(),
                ],
                ch.to_string(),
            )),
            None => Err(ExpressionError::parse(
                "Unexpected end of input",
                self.position,
                self.input,
            )),
        }
    }

    /// Parse `$`, `$$` or a `$function(...)` call
    fn parse_dollar(&mut self) -> ParseResult<StepKind> {
        self.advance(); // consume '$'

        if self.current_char() == Some('$') {
            self.advance();
            return Ok(StepKind::Root);
        }

        match self.current_char() {
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let start = self.position;
                let name = self.parse_identifier()?;
                self.skip_whitespace();
                if self.current_char() != Some('(') {
                    return Err(ExpressionError::syntax(
                        format!("Variable ${} is not supported", name),
                        start,
                        vec!["'('".to_string()],
                        self.current_char()
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "EOF".to_string()),
                    ));
                }
                let args = self.parse_function_args()?;
                Ok(StepKind::Expr(Box::new(Node::Function { name, args })))
            }
            _ => Ok(StepKind::Context),
        }
    }

    /// Parse a parenthesized, comma-separated argument list
    fn parse_function_args(&mut self) -> ParseResult<Vec<Node>> {
        self.expect_char('(')?;
        let mut args = Vec::new();

        self.skip_whitespace();
        if self.current_char() == Some(')') {
            self.advance();
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            self.skip_whitespace();
            match self.current_char() {
                Some(',') => {
                    self.advance();
                }
                Some(')') => {
                    self.advance();
                    return Ok(args);
                }
                _ => {
                    return Err(self.unexpected(vec!["','".to_string(), "')'".to_string()]));
                }
            }
        }
    }

    /// Parse an object constructor
    fn parse_object(&mut self) -> ParseResult<Node> {
        self.expect_char('{')?;
        let mut pairs = Vec::new();

        self.skip_whitespace();
        if self.current_char() == Some('}') {
            self.advance();
            return Ok(Node::Object(pairs));
        }

        loop {
            let key = self.parse_expression()?;
            self.skip_whitespace();
            self.expect_char(':')?;
            let value = self.parse_expression()?;
            pairs.push((key, value));

            self.skip_whitespace();
            match self.current_char() {
                Some(',') => {
                    self.advance();
                }
                Some('}') => {
                    self.advance();
                    return Ok(Node::Object(pairs));
                }
                _ => {
                    return Err(self.unexpected(vec!["','".to_string(), "'}'".to_string()]));
                }
            }
        }
    }

    /// Parse an array constructor
    fn parse_array(&mut self) -> ParseResult<Node> {
        self.expect_char('[')?;
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.current_char() == Some(']') {
            self.advance();
            return Ok(Node::Array(items));
        }

        loop {
            items.push(self.parse_expression()?);
            self.skip_whitespace();
            match self.current_char() {
                Some(',') => {
                    self.advance();
                }
                Some(']') => {
                    self.advance();
                    return Ok(Node::Array(items));
                }
                _ => {
                    return Err(self.unexpected(vec!["','".to_string(), "']'".to_string()]));
                }
            }
        }
    }

    /// Parse an identifier
    fn parse_identifier(&mut self) -> ParseResult<String> {
        let start = self.position;
        let mut identifier = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if identifier.is_empty() {
            return Err(ExpressionError::parse("Expected identifier", start, self.input));
        }

        Ok(identifier)
    }

    /// Parse a backtick-quoted field name
    fn parse_backtick_name(&mut self) -> ParseResult<String> {
        let start = self.position;
        self.advance(); // consume '`'
        let mut name = String::new();

        loop {
            match self.advance() {
                Some('`') => return Ok(name),
                Some(ch) => name.push(ch),
                None => {
                    return Err(ExpressionError::parse(
                        "Unterminated quoted name",
                        start,
                        self.input,
                    ))
                }
            }
        }
    }

    /// Parse a single- or double-quoted string literal
    fn parse_quoted_string(&mut self) -> ParseResult<String> {
        let start = self.position;
        let quote = self.advance().unwrap_or('"');
        let mut result = String::new();

        loop {
            match self.advance() {
                Some(ch) if ch == quote => return Ok(result),
                Some('\\') => {
                    let escaped = match self.advance() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('u') => self.parse_unicode_escape()?,
                        Some(other) => other,
                        None => break,
                    };
                    result.push(escaped);
                }
                Some(ch) => result.push(ch),
                None => break,
            }
        }

        Err(ExpressionError::parse(
            "Unterminated string literal",
            start,
            self.input,
        ))
    }

    fn parse_unicode_escape(&mut self) -> ParseResult<char> {
        let start = self.position;
        let digits: String = (0..4).filter_map(|_| self.advance()).collect();
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| {
                ExpressionError::parse(
                    format!("Invalid unicode escape: \\u{}", digits),
                    start,
                    self.input,
                )
            })
    }

    /// Parse a number literal
    fn parse_number(&mut self) -> ParseResult<Number> {
        let start = self.position;
        let mut text = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char().is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                text.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E')
                && self
                    .peek_char()
                    .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+')
            {
                is_float = true;
                text.push(ch);
                self.advance();
                if let Some(sign) = self.current_char().filter(|c| *c == '-' || *c == '+') {
                    text.push(sign);
                    self.advance();
                }
            } else {
                break;
            }
        }

        let invalid = || {
            ExpressionError::parse(format!("Invalid number: {}", text), start, self.input)
        };

        if !is_float {
            if let Ok(integer) = text.parse::<i64>() {
                return Ok(Number::from(integer));
            }
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(invalid)
    }

    /// Match and consume an operator
    fn match_operator(&mut self, op: &str) -> bool {
        let remaining: String = self.chars.clone().take(op.chars().count()).collect();
        if remaining == op {
            for _ in 0..op.chars().count() {
                self.advance();
            }
            true
        } else {
            false
        }
    }

    /// Match a word operator that is not the prefix of a longer identifier
    fn match_keyword(&mut self, keyword: &str) -> bool {
        let mut lookahead = self.chars.clone();
        for expected in keyword.chars() {
            if lookahead.next() != Some(expected) {
                return false;
            }
        }
        if lookahead
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || *c == '_')
        {
            return false;
        }
        self.match_operator(keyword)
    }

    /// Skip whitespace and `/* ... */` comments
    fn skip_whitespace(&mut self) {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_char() == Some('*') => {
                    self.advance();
                    self.advance();
                    let mut previous = None;
                    while let Some(ch) = self.advance() {
                        if previous == Some('*') && ch == '/' {
                            break;
                        }
                        previous = Some(ch);
                    }
                }
                _ => break,
            }
        }
    }

    /// Get current character without advancing
    fn current_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Get next character without advancing
    fn peek_char(&mut self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.peek().copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    /// Expect a specific character
    fn expect_char(&mut self, expected: char) -> ParseResult<()> {
        match self.current_char() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(_) => Err(self.unexpected(vec![format!("'{}'", expected)])),
            None => Err(ExpressionError::parse(
                format!("Expected '{}' but reached end of input", expected),
                self.position,
                self.input,
            )),
        }
    }

    fn unexpected(&mut self, expected: Vec<String>) -> ExpressionError {
        let position = self.position;
        match self.current_char() {
            Some(ch) => {
                ExpressionError::syntax("Unexpected character", position, expected, format!("'{}'", ch))
            }
            None => ExpressionError::parse("Unexpected end of input", position, self.input),
        }
    }
}

fn binary(left: Node, operator: BinaryOperator, right: Node) -> Node {
    Node::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

fn negate_number(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        return Value::Number(Number::from(-i));
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
