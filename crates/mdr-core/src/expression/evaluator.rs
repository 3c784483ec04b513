//! Mapping expression evaluator
//!
//! Evaluation works on sequences: a path step maps over every item of the
//! current sequence and flattens arrays it lands on. A final sequence of one
//! item collapses to that item and an empty sequence is "undefined".
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use super::ast::*;
use super::error::{type_name, ExpressionError};
use super::functions;
use serde_json::{Map, Number, Value};

pub(crate) type EvalResult<T> = std::result::Result<T, ExpressionError>;

/// Evaluation limits
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    /// Maximum nesting depth of evaluated nodes
    pub max_depth: usize,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

/// Expression evaluator bound to one input document
pub struct Evaluator<'a> {
    root: &'a Value,
    context: EvaluationContext,
}

impl<'a> Evaluator<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self::with_context(root, EvaluationContext::default())
    }

    pub fn with_context(root: &'a Value, context: EvaluationContext) -> Self {
        Self { root, context }
    }

    /// Evaluate a node with the input document as context; `None` is undefined
    pub fn evaluate(&self, node: &Node) -> EvalResult<Option<Value>> {
        self.eval(node, self.root, 0)
    }

    fn eval(&self, node: &Node, input: &Value, depth: usize) -> EvalResult<Option<Value>> {
        if depth >= self.context.max_depth {
            return Err(ExpressionError::execution(
                "Maximum expression nesting depth exceeded",
            ));
        }
        let depth = depth + 1;

        match node {
            Node::Literal(value) => Ok(Some(value.clone())),
            Node::Path(steps) => Ok(collapse(self.eval_path(steps, input, depth)?)),
            Node::Object(pairs) => self.eval_object(pairs, input, depth),
            Node::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(value) = self.eval(item, input, depth)? {
                        out.push(value);
                    }
                }
                Ok(Some(Value::Array(out)))
            }
            Node::Binary {
                left,
                operator,
                right,
            } => self.eval_binary(left, *operator, right, input, depth),
            Node::Negate(inner) => match self.eval(inner, input, depth)? {
                None => Ok(None),
                Some(Value::Number(n)) => number_value(-as_f64(&n)).map(Some),
                Some(other) => Err(ExpressionError::type_mismatch(
                    "number",
                    type_name(&other),
                    "negation",
                )),
            },
            Node::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.eval(condition, input, depth)?;
                if is_truthy(condition.as_ref()) {
                    self.eval(then, input, depth)
                } else if let Some(otherwise) = otherwise {
                    self.eval(otherwise, input, depth)
                } else {
                    Ok(None)
                }
            }
            Node::Function { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, input, depth)?);
                }
                functions::call(name, values)
            }
        }
    }

    fn eval_object(
        &self,
        pairs: &[(Node, Node)],
        input: &Value,
        depth: usize,
    ) -> EvalResult<Option<Value>> {
        let mut object = Map::new();
        for (key_node, value_node) in pairs {
            let key = match self.eval(key_node, input, depth)? {
                Some(Value::String(key)) => key,
                Some(other) => {
                    return Err(ExpressionError::type_mismatch(
                        "string",
                        type_name(&other),
                        "object key",
                    ))
                }
                None => {
                    return Err(ExpressionError::execution(format!(
                        "Object key {} evaluated to undefined",
                        key_node
                    )))
                }
            };
            if let Some(value) = self.eval(value_node, input, depth)? {
                object.insert(key, value);
            }
        }
        Ok(Some(Value::Object(object)))
    }

    fn eval_path(&self, steps: &[Step], input: &Value, depth: usize) -> EvalResult<Vec<Value>> {
        let mut sequence = vec![input.clone()];

        for step in steps {
            let mut next = Vec::new();
            match &step.kind {
                StepKind::Field(name) => {
                    for item in &sequence {
                        select_field(item, name, &mut next);
                    }
                }
                StepKind::Wildcard => {
                    for item in &sequence {
                        if let Value::Object(map) = item {
                            for value in map.values() {
                                push_flattened(value.clone(), &mut next);
                            }
                        }
                    }
                }
                StepKind::Context => next = sequence,
                StepKind::Root => next.push(self.root.clone()),
                StepKind::Expr(node) => {
                    for item in &sequence {
                        match self.eval(node, item, depth)? {
                            Some(Value::Array(values)) if sequence.len() > 1 => {
                                next.extend(values)
                            }
                            Some(value) => next.push(value),
                            None => {}
                        }
                    }
                }
            }

            for predicate in &step.predicates {
                next = self.apply_predicate(predicate, next, depth)?;
            }

            if next.is_empty() {
                return Ok(next);
            }
            sequence = next;
        }

        Ok(sequence)
    }

    fn apply_predicate(
        &self,
        predicate: &Predicate,
        sequence: Vec<Value>,
        depth: usize,
    ) -> EvalResult<Vec<Value>> {
        // A single array value is filtered element-wise
        let sequence = match sequence.as_slice() {
            [Value::Array(_)] => match sequence.into_iter().next() {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => sequence,
        };

        match predicate {
            Predicate::Index(index) => Ok(select_index(sequence, *index)),
            Predicate::Filter(node) => {
                let mut kept = Vec::new();
                let len = sequence.len();
                for (position, item) in sequence.into_iter().enumerate() {
                    let verdict = self.eval(node, &item, depth)?;
                    let keep = match &verdict {
                        Some(Value::Number(n)) => {
                            let wanted = as_f64(n).floor() as i64;
                            let wanted = if wanted < 0 { wanted + len as i64 } else { wanted };
                            wanted == position as i64
                        }
                        other => is_truthy(other.as_ref()),
                    };
                    if keep {
                        kept.push(item);
                    }
                }
                Ok(kept)
            }
        }
    }

    fn eval_binary(
        &self,
        left: &Node,
        operator: BinaryOperator,
        right: &Node,
        input: &Value,
        depth: usize,
    ) -> EvalResult<Option<Value>> {
        // Short-circuit boolean operators
        match operator {
            BinaryOperator::And => {
                let lhs = self.eval(left, input, depth)?;
                if !is_truthy(lhs.as_ref()) {
                    return Ok(Some(Value::Bool(false)));
                }
                let rhs = self.eval(right, input, depth)?;
                return Ok(Some(Value::Bool(is_truthy(rhs.as_ref()))));
            }
            BinaryOperator::Or => {
                let lhs = self.eval(left, input, depth)?;
                if is_truthy(lhs.as_ref()) {
                    return Ok(Some(Value::Bool(true)));
                }
                let rhs = self.eval(right, input, depth)?;
                return Ok(Some(Value::Bool(is_truthy(rhs.as_ref()))));
            }
            _ => {}
        }

        let lhs = self.eval(left, input, depth)?;
        let rhs = self.eval(right, input, depth)?;

        match operator {
            BinaryOperator::Concat => {
                let mut text = lhs.as_ref().map(functions::stringify).unwrap_or_default();
                text.push_str(&rhs.as_ref().map(functions::stringify).unwrap_or_default());
                Ok(Some(Value::String(text)))
            }
            BinaryOperator::Equal => Ok(Some(Value::Bool(match (&lhs, &rhs) {
                (Some(a), Some(b)) => values_equal(a, b),
                _ => false,
            }))),
            BinaryOperator::NotEqual => Ok(Some(Value::Bool(match (&lhs, &rhs) {
                (Some(a), Some(b)) => !values_equal(a, b),
                _ => false,
            }))),
            BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => {
                let (Some(a), Some(b)) = (lhs, rhs) else {
                    return Ok(Some(Value::Bool(false)));
                };
                compare(&a, operator, &b).map(|result| Some(Value::Bool(result)))
            }
            _ => {
                let (Some(a), Some(b)) = (lhs, rhs) else {
                    return Ok(None);
                };
                arithmetic(&a, operator, &b).map(Some)
            }
        }
    }
}

/// JSONata boolean cast
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => as_f64(n) != 0.0,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => items.iter().any(|item| is_truthy(Some(item))),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Collapse an evaluation sequence into a single value
pub(crate) fn collapse(mut sequence: Vec<Value>) -> Option<Value> {
    match sequence.len() {
        0 => None,
        1 => sequence.pop(),
        _ => Some(Value::Array(sequence)),
    }
}

pub(crate) fn as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(0.0)
}

/// Convert an f64 result back into a JSON number, preferring integers
pub(crate) fn number_value(value: f64) -> EvalResult<Value> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Ok(Value::Number(Number::from(value as i64)));
    }
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| ExpressionError::execution(format!("Number out of range: {}", value)))
}

fn select_field(item: &Value, name: &str, out: &mut Vec<Value>) {
    match item {
        Value::Object(map) => {
            if let Some(value) = map.get(name) {
                push_flattened(value.clone(), out);
            }
        }
        Value::Array(items) => {
            for nested in items {
                select_field(nested, name, out);
            }
        }
        _ => {}
    }
}

fn push_flattened(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => out.extend(items),
        other => out.push(other),
    }
}

fn select_index(sequence: Vec<Value>, index: i64) -> Vec<Value> {
    let len = sequence.len() as i64;
    let position = if index < 0 { len + index } else { index };
    if position < 0 || position >= len {
        return Vec::new();
    }
    sequence
        .into_iter()
        .nth(position as usize)
        .into_iter()
        .collect()
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => as_f64(x) == as_f64(y),
        _ => a == b,
    }
}

fn compare(a: &Value, operator: BinaryOperator, b: &Value) -> EvalResult<bool> {
    let ordering = match (a, b) {
        (Value::Number(x), Value::Number(y)) => as_f64(x).partial_cmp(&as_f64(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => {
            return Err(ExpressionError::type_mismatch(
                "two numbers or two strings",
                format!("{} and {}", type_name(a), type_name(b)),
                format!("'{}' comparison", operator),
            ))
        }
    };
    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match operator {
        BinaryOperator::LessThan => ordering.is_lt(),
        BinaryOperator::LessThanOrEqual => ordering.is_le(),
        BinaryOperator::GreaterThan => ordering.is_gt(),
        _ => ordering.is_ge(),
    })
}

fn arithmetic(a: &Value, operator: BinaryOperator, b: &Value) -> EvalResult<Value> {
    let (Value::Number(x), Value::Number(y)) = (a, b) else {
        let found = if a.is_number() { b } else { a };
        return Err(ExpressionError::type_mismatch(
            "number",
            type_name(found),
            format!("'{}' operand", operator),
        ));
    };

    let (x, y) = (as_f64(x), as_f64(y));
    let result = match operator {
        BinaryOperator::Add => x + y,
        BinaryOperator::Subtract => x - y,
        BinaryOperator::Multiply => x * y,
        BinaryOperator::Divide | BinaryOperator::Modulo if y == 0.0 => {
            return Err(ExpressionError::execution("Division by zero"));
        }
        BinaryOperator::Divide => x / y,
        BinaryOperator::Modulo => x % y,
        other => {
            return Err(ExpressionError::execution(format!(
                "'{}' is not an arithmetic operator",
                other
            )))
        }
    };
    number_value(result)
}
