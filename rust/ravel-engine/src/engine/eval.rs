//! Routine execution.
//!
//! Threads a value vector `V` through the pipeline: `V[0]` is the overall
//! input, `V[i]` the output of node `i`. Wires resolve against `V`; the
//! first parameter wire binds `k`, the second binds `n`. Callers are
//! expected to have checked the routine and validated the input, but
//! every failure here is still a typed error, never a panic — generated
//! inputs only guarantee the *overall* input type, so a mid-pipeline
//! value can land outside a subroutine's domain.

use thiserror::Error;

use ravel_core::{ParamName, Params, Value};

use super::registry::Registry;
use super::routine::{Routine, Wire};

/// Runtime failure inside a routine or one of its subroutines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown subroutine `{0}`")]
    UnknownSubroutine(String),
    #[error("node is missing its input wire")]
    MissingInput,
    #[error("wire references a value that does not exist yet")]
    BadWire,
    #[error("missing parameter `{0}`")]
    MissingParam(ParamName),
    #[error("expected an integer")]
    ExpectedInt,
    #[error("expected a list")]
    ExpectedList,
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("empty list")]
    EmptyList,
    #[error("value outside the subroutine's domain")]
    Domain,
    #[error("arithmetic overflow")]
    Overflow,
}

/// Run `routine` on `input`, returning the final node's output.
pub fn evaluate(registry: &Registry, routine: &Routine, input: &Value) -> Result<Value, EvalError> {
    let mut values: Vec<Value> = Vec::with_capacity(routine.len() + 1);
    values.push(input.clone());

    for node in &routine.nodes {
        let sub = registry
            .get(&node.name)
            .ok_or_else(|| EvalError::UnknownSubroutine(node.name.clone()))?;
        let input_wire = node.input().ok_or(EvalError::MissingInput)?;
        let arg = resolve(input_wire, &values)?;

        let mut params = Params::none();
        for (i, wire) in node.param_wires().iter().enumerate() {
            let name = ParamName::for_slot(i).ok_or(EvalError::BadWire)?;
            let value = resolve(wire, &values)?;
            params.set(name, value.as_int().ok_or(EvalError::ExpectedInt)?);
        }

        values.push((sub.evaluate)(&arg, &params)?);
    }

    values.pop().ok_or(EvalError::MissingInput)
}

fn resolve(wire: &Wire, values: &[Value]) -> Result<Value, EvalError> {
    match wire {
        Wire::Static(v) => Ok(Value::Int(*v)),
        Wire::Dyn(j) => values.get(*j).cloned().ok_or(EvalError::BadWire),
    }
}
