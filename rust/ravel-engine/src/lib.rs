//! Ravel Engine
//!
//! Synthesizes, checks, and runs *routines* — topologically ordered DAG
//! pipelines of primitive subroutines over integers and integer lists.
//! Wires between nodes carry either constants or back-references to
//! earlier outputs; a small refinement type system narrows every wire by
//! intersection, so a routine that checks is safe to run on any input
//! inhabiting its inferred input type.

pub mod engine;

use ravel_core::Value;
use thiserror::Error;

pub use engine::check::{check, validate_input, CheckError};
pub use engine::enumerate::{enumerate, EnumerateOptions};
pub use engine::eval::{evaluate, EvalError};
pub use engine::generate::{generate_examples, GenerateError};
pub use engine::registry::{GenParams, ParamSlot, Registry, Subroutine};
pub use engine::routine::{Node, ParseError, Routine, Wire};
pub use engine::types::{Arg, Base, Refinement, Type, TypeExpr};

/// Any failure surfaced by an engine entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("check error: {0}")]
    Check(#[from] CheckError),
    #[error("input does not inhabit the routine's input type")]
    InvalidInput,
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
    #[error("generation error: {0}")]
    Generate(#[from] GenerateError),
}

/// Parse, check, validate, and run a routine expression in one step.
pub fn run_routine(registry: &Registry, text: &str, input: &Value) -> Result<Value, EngineError> {
    let routine = Routine::parse(text, registry)?;
    if !validate_input(registry, &routine, input)? {
        return Err(EngineError::InvalidInput);
    }
    Ok(evaluate(registry, &routine, input)?)
}
