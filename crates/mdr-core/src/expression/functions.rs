//! Built-in functions callable from mapping expressions
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use super::error::{type_name, ExpressionError};
use super::evaluator::{as_f64, is_truthy, number_value, EvalResult};
use serde_json::Value;

/// Names of every function the evaluator knows
pub const FUNCTION_NAMES: &[&str] = &[
    "string",
    "number",
    "boolean",
    "not",
    "exists",
    "count",
    "uppercase",
    "lowercase",
    "trim",
    "substring",
    "contains",
    "join",
    "split",
    "sum",
    "lookup",
];

/// Dispatch a function call; arguments are already evaluated
pub fn call(name: &str, args: Vec<Option<Value>>) -> EvalResult<Option<Value>> {
    match name {
        "string" => {
            let [arg] = arity::<1>(name, args)?;
            Ok(arg.map(|v| match v {
                Value::String(s) => Value::String(s),
                other => Value::String(stringify(&other)),
            }))
        }
        "number" => {
            let [arg] = arity::<1>(name, args)?;
            arg.map(|v| to_number(name, v)).transpose()
        }
        "boolean" => {
            let [arg] = arity::<1>(name, args)?;
            Ok(arg.map(|v| Value::Bool(is_truthy(Some(&v)))))
        }
        "not" => {
            let [arg] = arity::<1>(name, args)?;
            Ok(arg.map(|v| Value::Bool(!is_truthy(Some(&v)))))
        }
        "exists" => {
            let [arg] = arity::<1>(name, args)?;
            Ok(Some(Value::Bool(arg.is_some())))
        }
        "count" => {
            let [arg] = arity::<1>(name, args)?;
            let count = match arg {
                None => 0,
                Some(Value::Array(items)) => items.len(),
                Some(_) => 1,
            };
            Ok(Some(Value::from(count)))
        }
        "uppercase" | "lowercase" | "trim" => {
            let [arg] = arity::<1>(name, args)?;
            let Some(text) = optional_string(name, arg)? else {
                return Ok(None);
            };
            let result = match name {
                "uppercase" => text.to_uppercase(),
                "lowercase" => text.to_lowercase(),
                _ => text.split_whitespace().collect::<Vec<_>>().join(" "),
            };
            Ok(Some(Value::String(result)))
        }
        "substring" => substring(args),
        "contains" => {
            let [text, pattern] = arity::<2>(name, args)?;
            let Some(text) = optional_string(name, text)? else {
                return Ok(None);
            };
            let pattern = required_string(name, pattern, 2)?;
            Ok(Some(Value::Bool(text.contains(pattern.as_str()))))
        }
        "join" => join(args),
        "split" => {
            let [text, separator] = arity::<2>(name, args)?;
            let Some(text) = optional_string(name, text)? else {
                return Ok(None);
            };
            let separator = required_string(name, separator, 2)?;
            let parts: Vec<Value> = if separator.is_empty() {
                text.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                text.split(separator.as_str())
                    .map(|part| Value::String(part.to_string()))
                    .collect()
            };
            Ok(Some(Value::Array(parts)))
        }
        "sum" => {
            let [arg] = arity::<1>(name, args)?;
            let items = match arg {
                None => return Ok(Some(Value::from(0))),
                Some(Value::Array(items)) => items,
                Some(single) => vec![single],
            };
            let mut total = 0.0;
            for item in &items {
                match item {
                    Value::Number(n) => total += as_f64(n),
                    other => {
                        return Err(ExpressionError::function(
                            name,
                            format!("cannot sum a {}", type_name(other)),
                        ))
                    }
                }
            }
            number_value(total).map(Some)
        }
        "lookup" => {
            let [object, key] = arity::<2>(name, args)?;
            let key = required_string(name, key, 2)?;
            Ok(match object {
                Some(Value::Object(map)) => map.get(&key).cloned(),
                Some(Value::Array(items)) => {
                    let found: Vec<Value> = items
                        .iter()
                        .filter_map(|item| item.as_object().and_then(|m| m.get(&key)).cloned())
                        .collect();
                    super::evaluator::collapse(found)
                }
                _ => None,
            })
        }
        _ => Err(ExpressionError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

/// Render a value the way `$string` and `&` do
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            let f = as_f64(n);
            if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", f as i64)
            } else {
                n.to_string()
            }
        }
        other => other.to_string(),
    }
}

fn arity<const N: usize>(name: &str, args: Vec<Option<Value>>) -> EvalResult<[Option<Value>; N]> {
    let count = args.len();
    args.try_into().map_err(|_| {
        ExpressionError::function(
            name,
            format!("expected {} argument(s), got {}", N, count),
        )
    })
}

fn optional_string(name: &str, value: Option<Value>) -> EvalResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ExpressionError::type_mismatch(
            "string",
            type_name(&other),
            format!("${}() argument 1", name),
        )),
    }
}

fn required_string(name: &str, value: Option<Value>, position: usize) -> EvalResult<String> {
    match value {
        Some(Value::String(s)) => Ok(s),
        other => Err(ExpressionError::type_mismatch(
            "string",
            other.as_ref().map_or("undefined", type_name),
            format!("${}() argument {}", name, position),
        )),
    }
}

fn to_number(name: &str, value: Value) -> EvalResult<Value> {
    match value {
        Value::Number(n) => Ok(Value::Number(n)),
        Value::Bool(b) => Ok(Value::from(if b { 1 } else { 0 })),
        Value::String(s) => {
            let parsed: f64 = s.trim().parse().map_err(|_| {
                ExpressionError::function(name, format!("cannot convert '{}' to a number", s))
            })?;
            number_value(parsed)
        }
        other => Err(ExpressionError::function(
            name,
            format!("cannot convert a {} to a number", type_name(&other)),
        )),
    }
}

fn substring(args: Vec<Option<Value>>) -> EvalResult<Option<Value>> {
    let name = "substring";
    if !(2..=3).contains(&args.len()) {
        return Err(ExpressionError::function(
            name,
            format!("expected 2 or 3 arguments, got {}", args.len()),
        ));
    }
    let mut args = args.into_iter();
    let Some(text) = optional_string(name, args.next().flatten())? else {
        return Ok(None);
    };
    let start = match args.next().flatten() {
        Some(Value::Number(n)) => as_f64(&n) as i64,
        other => {
            return Err(ExpressionError::type_mismatch(
                "number",
                other.as_ref().map_or("undefined", type_name),
                "$substring() argument 2",
            ))
        }
    };
    let length = match args.next().flatten() {
        None => None,
        Some(Value::Number(n)) => Some(as_f64(&n).max(0.0) as usize),
        Some(other) => {
            return Err(ExpressionError::type_mismatch(
                "number",
                type_name(&other),
                "$substring() argument 3",
            ))
        }
    };

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len() as i64;
    let start = (if start < 0 { (len + start).max(0) } else { start.min(len) }) as usize;
    let end = match length {
        Some(length) => (start + length).min(chars.len()),
        None => chars.len(),
    };
    Ok(Some(Value::String(chars[start..end].iter().collect())))
}

fn join(args: Vec<Option<Value>>) -> EvalResult<Option<Value>> {
    let name = "join";
    if !(1..=2).contains(&args.len()) {
        return Err(ExpressionError::function(
            name,
            format!("expected 1 or 2 arguments, got {}", args.len()),
        ));
    }
    let mut args = args.into_iter();
    let items = match args.next().flatten() {
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(single) => vec![single],
    };
    let separator = match args.next().flatten() {
        None => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(ExpressionError::type_mismatch(
                "string",
                type_name(&other),
                "$join() argument 2",
            ))
        }
    };

    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => parts.push(s),
            other => {
                return Err(ExpressionError::function(
                    name,
                    format!("cannot join a {}", type_name(&other)),
                ))
            }
        }
    }
    Ok(Some(Value::String(parts.join(&separator))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call1(name: &str, arg: Value) -> Option<Value> {
        call(name, vec![Some(arg)]).unwrap()
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(call1("string", json!(12)), Some(json!("12")));
        assert_eq!(call1("string", json!(true)), Some(json!("true")));
        assert_eq!(call1("string", json!({"a": 1})), Some(json!(r#"{"a":1}"#)));
        assert_eq!(call("string", vec![None]).unwrap(), None);
    }

    #[test]
    fn test_number_conversion() {
        assert_eq!(call1("number", json!("42")), Some(json!(42)));
        assert_eq!(call1("number", json!("2.5")), Some(json!(2.5)));
        assert!(call("number", vec![Some(json!("abc"))]).is_err());
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(call1("uppercase", json!("abc")), Some(json!("ABC")));
        assert_eq!(call1("trim", json!("  a   b ")), Some(json!("a b")));
        assert_eq!(
            call("substring", vec![Some(json!("Lovelace")), Some(json!(0)), Some(json!(4))]).unwrap(),
            Some(json!("Love"))
        );
        assert_eq!(
            call("substring", vec![Some(json!("Lovelace")), Some(json!(-4))]).unwrap(),
            Some(json!("lace"))
        );
        assert_eq!(
            call("split", vec![Some(json!("a,b")), Some(json!(","))]).unwrap(),
            Some(json!(["a", "b"]))
        );
        assert_eq!(
            call("join", vec![Some(json!(["a", "b"])), Some(json!("-"))]).unwrap(),
            Some(json!("a-b"))
        );
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(call1("count", json!([1, 2, 3])), Some(json!(3)));
        assert_eq!(call("count", vec![None]).unwrap(), Some(json!(0)));
        assert_eq!(call1("sum", json!([1, 2.5])), Some(json!(3.5)));
        assert_eq!(call("exists", vec![None]).unwrap(), Some(json!(false)));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(
            call("lookup", vec![Some(json!({"k": 1})), Some(json!("k"))]).unwrap(),
            Some(json!(1))
        );
    }

    #[test]
    fn test_arity_and_unknown_function() {
        assert!(matches!(
            call("uppercase", vec![]),
            Err(ExpressionError::Function { .. })
        ));
        assert!(matches!(
            call("eval", vec![]),
            Err(ExpressionError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn test_stringify_whole_floats() {
        assert_eq!(stringify(&json!(3.0)), "3");
        assert_eq!(stringify(&json!(3.25)), "3.25");
    }
}
