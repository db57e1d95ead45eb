//! The value model: integers and homogeneous integer lists.
//!
//! Every value a routine consumes or produces is one of these two shapes.
//! JSON conversion is strict — floats, nested arrays, and numbers outside
//! the `i64` range are rejected rather than coerced.

use thiserror::Error;

/// A runtime value flowing along routine wires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    List(Vec<i64>),
}

/// Conversion failures between JSON and [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("expected an integer or an array of integers")]
    UnsupportedShape,
    #[error("number is not an i64")]
    NotAnInteger,
    #[error("array element is not an i64")]
    BadElement,
}

impl Value {
    /// Parse a JSON value: a number becomes `Int`, an array of numbers
    /// becomes `List`. Anything else is rejected.
    pub fn from_json(json: &serde_json::Value) -> Result<Value, ValueError> {
        match json {
            serde_json::Value::Number(n) => {
                n.as_i64().map(Value::Int).ok_or(ValueError::NotAnInteger)
            }
            serde_json::Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let n = item.as_i64().ok_or(ValueError::BadElement)?;
                    out.push(n);
                }
                Ok(Value::List(out))
            }
            _ => Err(ValueError::UnsupportedShape),
        }
    }

    /// Render as JSON (number or array of numbers).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(n) => serde_json::Value::from(*n),
            Value::List(items) => serde_json::Value::from(items.clone()),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[i64]> {
        match self {
            Value::Int(_) => None,
            Value::List(items) => Some(items),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// The canonical parameter name a subroutine slot binds to.
///
/// Primitive subroutines accept at most two parameters; by convention the
/// first is `k` and the second is `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamName {
    K,
    N,
}

impl ParamName {
    /// The name bound by parameter slot `index` (0-based).
    pub fn for_slot(index: usize) -> Option<ParamName> {
        match index {
            0 => Some(ParamName::K),
            1 => Some(ParamName::N),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamName::K => write!(f, "k"),
            ParamName::N => write!(f, "n"),
        }
    }
}

/// The resolved `k` / `n` parameter bundle passed to a subroutine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Params {
    pub k: Option<i64>,
    pub n: Option<i64>,
}

impl Params {
    pub fn none() -> Params {
        Params::default()
    }

    pub fn with_k(k: i64) -> Params {
        Params {
            k: Some(k),
            n: None,
        }
    }

    pub fn get(&self, name: ParamName) -> Option<i64> {
        match name {
            ParamName::K => self.k,
            ParamName::N => self.n,
        }
    }

    pub fn set(&mut self, name: ParamName, value: i64) {
        match name {
            ParamName::K => self.k = Some(value),
            ParamName::N => self.n = Some(value),
        }
    }
}
