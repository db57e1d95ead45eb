//! Example-input generation for checked routines.
//!
//! The first node consumes the overall input, so its subroutine's
//! generator proposes candidates — shaped by the node's static
//! parameters — and the inferred input type filters them. Candidates
//! that pass are paired with the routine's output on them, so every
//! returned example round-trips through evaluation.

use rand::RngCore;
use thiserror::Error;

use ravel_core::Value;

use super::check::{check, CheckError};
use super::eval::evaluate;
use super::registry::{GenParams, Registry};
use super::routine::{Routine, Wire};

/// Batches of candidates proposed before giving up.
const MAX_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error("first node does not consume the overall input")]
    FirstNodeInput,
    #[error("no valid inputs after {MAX_ATTEMPTS} attempts")]
    NoValidInputs,
}

/// Produce up to `count` `(input, output)` example pairs for `routine`.
pub fn generate_examples(
    registry: &Registry,
    routine: &Routine,
    count: usize,
    rng: &mut dyn RngCore,
) -> Result<Vec<(Value, Value)>, GenerateError> {
    let types = check(registry, routine)?;

    let first = routine.nodes.first().ok_or(GenerateError::FirstNodeInput)?;
    if first.input() != Some(&Wire::Dyn(0)) {
        return Err(GenerateError::FirstNodeInput);
    }
    let sub = registry
        .get(&first.name)
        .ok_or_else(|| GenerateError::Check(CheckError::UnknownSubroutine(first.name.clone())))?;

    let gen_params = GenParams {
        count,
        params: first.static_params(),
    };
    let input_type = &types[0];

    let mut accepted = Vec::new();
    for _ in 0..MAX_ATTEMPTS {
        for candidate in (sub.generate)(&gen_params, rng) {
            if accepted.len() >= count {
                break;
            }
            if !input_type.inhabits(&candidate) {
                continue;
            }
            // A candidate that fails mid-pipeline (an intermediate value
            // outside some node's domain) is rejected like any other.
            if let Ok(output) = evaluate(registry, routine, &candidate) {
                accepted.push((candidate, output));
            }
        }
        if accepted.len() >= count {
            break;
        }
    }

    if accepted.is_empty() {
        eprintln!(
            "warning: no generated input for type {} inhabited routine `{}` (k={:?}, n={:?})",
            input_type, routine, gen_params.params.k, gen_params.params.n
        );
        return Err(GenerateError::NoValidInputs);
    }
    Ok(accepted)
}
