//! Abstract syntax tree for mapping expressions
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;
use std::fmt;

/// A node of a parsed mapping expression
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// String, number, boolean or null literal
    Literal(Value),
    /// Navigation through the input (`Person.Name[0]`, `$.x`, `$$.y`)
    Path(Vec<Step>),
    /// Object constructor (`{"key": expr, ...}`)
    Object(Vec<(Node, Node)>),
    /// Array constructor (`[expr, ...]`)
    Array(Vec<Node>),
    /// Binary operation
    Binary {
        left: Box<Node>,
        operator: BinaryOperator,
        right: Box<Node>,
    },
    /// Arithmetic negation
    Negate(Box<Node>),
    /// Ternary conditional (`cond ? a : b`)
    Conditional {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
    /// Built-in function call (`$string(x)`)
    Function { name: String, args: Vec<Node> },
}

/// One navigation step of a path
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub kind: StepKind,
    pub predicates: Vec<Predicate>,
}

/// What a path step selects
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    /// Named field of every object in the current sequence
    Field(String),
    /// Every field value of every object in the current sequence
    Wildcard,
    /// The current context (`$`)
    Context,
    /// The input document (`$$`)
    Root,
    /// Any other expression evaluated against each item
    Expr(Box<Node>),
}

/// A bracketed filter applied to the sequence produced by a step
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Positional selection; negative values count from the end
    Index(i64),
    /// Keep the items for which the expression is truthy
    Filter(Node),
}

/// One property of the target location a scalar expression is nested under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetKey {
    pub name: String,
    /// The property holds an array of objects
    pub repeated: bool,
}

impl TargetKey {
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repeated: false,
        }
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repeated: true,
        }
    }
}

/// Binary operators in precedence groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

impl Step {
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            predicates: Vec::new(),
        }
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::new(StepKind::Field(name.into()))
    }
}

impl Node {
    /// Whether the node is an object constructor
    pub fn is_object_constructor(&self) -> bool {
        matches!(self, Node::Object(_))
    }

    /// Wrap the node in nested single-key object constructors, outermost key first
    pub fn wrap_in_keys<S: AsRef<str>>(self, keys: &[S]) -> Node {
        let keys: Vec<TargetKey> = keys.iter().map(|key| TargetKey::object(key.as_ref())).collect();
        self.wrap_along(&keys)
    }

    /// Like [`wrap_in_keys`](Self::wrap_in_keys); a repeated key holds a one-element array
    pub fn wrap_along(self, keys: &[TargetKey]) -> Node {
        keys.iter().rev().fold(self, |inner, key| {
            let value = if key.repeated {
                Node::Array(vec![inner])
            } else {
                inner
            };
            Node::Object(vec![(Node::Literal(Value::String(key.name.clone())), value)])
        })
    }

    /// Count the nodes of the tree; used as a rough complexity measure
    pub fn size(&self) -> usize {
        1 + match self {
            Node::Literal(_) => 0,
            Node::Path(steps) => steps
                .iter()
                .map(|step| {
                    let kind = match &step.kind {
                        StepKind::Expr(node) => node.size(),
                        _ => 0,
                    };
                    kind + step
                        .predicates
                        .iter()
                        .map(|p| match p {
                            Predicate::Index(_) => 1,
                            Predicate::Filter(node) => node.size(),
                        })
                        .sum::<usize>()
                })
                .sum(),
            Node::Object(pairs) => pairs.iter().map(|(k, v)| k.size() + v.size()).sum(),
            Node::Array(items) => items.iter().map(Node::size).sum(),
            Node::Binary { left, right, .. } => left.size() + right.size(),
            Node::Negate(inner) => inner.size(),
            Node::Conditional {
                condition,
                then,
                otherwise,
            } => condition.size() + then.size() + otherwise.as_ref().map_or(0, |o| o.size()),
            Node::Function { args, .. } => args.iter().map(Node::size).sum(),
        }
    }
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Concat => "&",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(value) => write!(f, "{}", value),
            Node::Path(steps) => {
                for (i, step) in steps.iter().enumerate() {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", step)?;
                }
                Ok(())
            }
            Node::Object(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Node::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Node::Binary {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Node::Negate(inner) => write!(f, "-{}", inner),
            Node::Conditional {
                condition,
                then,
                otherwise,
            } => {
                write!(f, "({} ? {}", condition, then)?;
                if let Some(otherwise) = otherwise {
                    write!(f, " : {}", otherwise)?;
                }
                write!(f, ")")
            }
            Node::Function { name, args } => {
                write!(f, "${}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StepKind::Field(name) => {
                let plain = name
                    .chars()
                    .enumerate()
                    .all(|(i, c)| c == '_' || c.is_alphabetic() || (i > 0 && c.is_alphanumeric()));
                if plain && !name.is_empty() {
                    write!(f, "{}", name)?;
                } else {
                    write!(f, "`{}`", name)?;
                }
            }
            StepKind::Wildcard => write!(f, "*")?,
            StepKind::Context => write!(f, "$")?,
            StepKind::Root => write!(f, "$$")?,
            StepKind::Expr(node) => write!(f, "({})", node)?,
        }
        for predicate in &self.predicates {
            match predicate {
                Predicate::Index(i) => write!(f, "[{}]", i)?,
                Predicate::Filter(node) => write!(f, "[{}]", node)?,
            }
        }
        Ok(())
    }
}
