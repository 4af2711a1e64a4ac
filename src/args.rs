//! Building a [`Params`] store from command-line input.
//!
//! Two forms are accepted:
//!
//! - assignments, `key=value`, where dots in the key nest stores:
//!   `resize.width=100 format=png` becomes
//!   `{"format": "png", "resize": {"width": 100}}`
//! - a single JSON object, `{"resize": {"width": 100}}`
//!
//! Assignment values are typed by shape: `true`/`false` are booleans, anything
//! that parses as an `i64` is an integer, everything else is a string.

use crate::params::{ParamError, Params, Value, ValueKind};

/// Parse `key=value` assignments into a store.
pub fn parse_assignments<I, S>(assignments: I) -> Result<Params, ParamError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut params = Params::new();
    for assignment in assignments {
        let assignment = assignment.as_ref();
        let (key, raw) = assignment.split_once('=').ok_or_else(|| {
            ParamError::invalid(assignment, "expected key=value")
        })?;
        let path: Vec<&str> = key.split('.').collect();
        if path.iter().any(|segment| segment.is_empty()) {
            return Err(ParamError::invalid(key, "empty key segment"));
        }
        insert(&mut params, &path, scalar(raw))?;
    }
    Ok(params)
}

/// Parse a JSON object into a store. Floats and nulls are rejected.
pub fn parse_json(json: &str) -> Result<Params, ParamError> {
    serde_json::from_str(json).map_err(|e| ParamError::invalid("params", e.to_string()))
}

/// Either form: a leading `{` selects JSON.
pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Params, ParamError> {
    match args {
        [single] if single.as_ref().trim_start().starts_with('{') => parse_json(single.as_ref()),
        _ => parse_assignments(args),
    }
}

fn scalar(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match raw.parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => Value::String(raw.to_string()),
        },
    }
}

fn insert(params: &mut Params, path: &[&str], value: Value) -> Result<(), ParamError> {
    let (head, rest) = match path {
        [] => return Ok(()),
        [last] => {
            params.set(*last, value);
            return Ok(());
        }
        [head, rest @ ..] => (*head, rest),
    };

    let mut sub = match params.get(head) {
        Ok(Value::Params(existing)) => existing.clone(),
        Ok(other) => {
            return Err(ParamError::TypeMismatch {
                param: head.to_string(),
                expected: ValueKind::Params,
                found: other.kind(),
            });
        }
        Err(_) => Params::new(),
    };
    insert(&mut sub, rest, value).map_err(|e| e.prefixed(head))?;
    params.set(head, sub);
    Ok(())
}
