//! Routine well-formedness and type inference.
//!
//! Four short-circuiting stages: known names (plus structural sanity —
//! arity and wire direction), connectedness, static-value typing, and
//! left-to-right bidirectional inference. The result is the inferred type
//! vector `T` of length `m + 1`: `T[0]` is the overall input type, `T[i]`
//! the output type of node `i`. Every wire narrows its producer by
//! intersection with the consumer's requirement; any contradiction aborts
//! the check.

use thiserror::Error;

use ravel_core::Value;

use super::registry::Registry;
use super::routine::{Routine, Wire};
use super::types::{Type, TypeError};

/// Why a routine failed its check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("unknown subroutine `{0}`")]
    UnknownSubroutine(String),
    #[error("node {node} expects {expected} wires, found {found}")]
    WrongArity {
        node: usize,
        expected: usize,
        found: usize,
    },
    #[error("node {node} references value {index}, which is not earlier in the routine")]
    ForwardReference { node: usize, index: usize },
    #[error("value {index} is never consumed")]
    Disconnected { index: usize },
    #[error("static value {value} on node {node} does not inhabit slot {slot}")]
    StaticOutOfType { node: usize, slot: usize, value: i64 },
    #[error("output-only refinement on an input or parameter slot of `{0}`")]
    OutputOnly(String),
    #[error("type contradiction at node {node}")]
    Contradiction { node: usize },
    #[error("overall input type is unconstrained")]
    UnconstrainedInput,
}

/// Check `routine`, returning its inferred type vector.
pub fn check(registry: &Registry, routine: &Routine) -> Result<Vec<Type>, CheckError> {
    let m = routine.len();

    // Stage 1: every node names a registered subroutine, carries the
    // right number of wires, and only references earlier values.
    for (idx, node) in routine.nodes.iter().enumerate() {
        let i = idx + 1;
        let sub = registry
            .get(&node.name)
            .ok_or_else(|| CheckError::UnknownSubroutine(node.name.clone()))?;
        if node.wires.len() != sub.arity() {
            return Err(CheckError::WrongArity {
                node: i,
                expected: sub.arity(),
                found: node.wires.len(),
            });
        }
        for wire in &node.wires {
            if let Wire::Dyn(j) = wire {
                if *j >= i {
                    return Err(CheckError::ForwardReference { node: i, index: *j });
                }
            }
        }
    }

    // Stage 2: connectedness. Every value index 0..m-1 must be consumed
    // by at least one wire — the overall input (index 0) included; only
    // the final node's output may go unreferenced.
    let mut referenced = vec![false; m.max(1)];
    for node in &routine.nodes {
        for wire in &node.wires {
            if let Wire::Dyn(j) = wire {
                referenced[*j] = true;
            }
        }
    }
    for (index, seen) in referenced.iter().enumerate().take(m) {
        if !seen {
            return Err(CheckError::Disconnected { index });
        }
    }

    // Stage 3: static values inhabit their declared slot types.
    for (idx, node) in routine.nodes.iter().enumerate() {
        let i = idx + 1;
        let sub = registry
            .get(&node.name)
            .ok_or_else(|| CheckError::UnknownSubroutine(node.name.clone()))?;
        let params = node.static_params();
        for (slot, wire) in node.wires.iter().enumerate() {
            if let Wire::Static(v) = wire {
                let declared = match sub.slot_type(slot) {
                    Some(expr) => expr,
                    None => continue,
                };
                let ty = lower(declared.resolve(&params), i, &node.name)?;
                if !ty.inhabits(&Value::Int(*v)) {
                    return Err(CheckError::StaticOutOfType {
                        node: i,
                        slot,
                        value: *v,
                    });
                }
            }
        }
    }

    // Stage 4: bidirectional inference.
    let mut types = vec![Type::any(); m + 1];
    for (idx, node) in routine.nodes.iter().enumerate() {
        let i = idx + 1;
        let sub = registry
            .get(&node.name)
            .ok_or_else(|| CheckError::UnknownSubroutine(node.name.clone()))?;
        let params = node.static_params();

        let declared_input = lower(sub.input.resolve(&params), i, &node.name)?;
        types[i] = lower(
            sub.output.resolve_output(&declared_input, &params),
            i,
            &node.name,
        )?;

        for (slot, wire) in node.wires.iter().enumerate() {
            if let Wire::Dyn(j) = wire {
                let declared = match sub.slot_type(slot) {
                    Some(expr) => expr,
                    None => continue,
                };
                let required = lower(declared.resolve(&params), i, &node.name)?;
                types[*j] = types[*j]
                    .introduce(&required)
                    .ok_or(CheckError::Contradiction { node: i })?;
            }
        }
    }

    if types[0].is_any() {
        return Err(CheckError::UnconstrainedInput);
    }
    Ok(types)
}

/// Check the routine and test whether `input` inhabits its inferred
/// input type.
pub fn validate_input(
    registry: &Registry,
    routine: &Routine,
    input: &Value,
) -> Result<bool, CheckError> {
    let types = check(registry, routine)?;
    Ok(types[0].inhabits(input))
}

fn lower(result: Result<Type, TypeError>, node: usize, name: &str) -> Result<Type, CheckError> {
    result.map_err(|e| match e {
        TypeError::Contradiction => CheckError::Contradiction { node },
        TypeError::OutputOnly => CheckError::OutputOnly(name.to_string()),
    })
}
