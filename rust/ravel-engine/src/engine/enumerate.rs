//! Routine enumeration.
//!
//! Iterative deepening over the registry: size-1 seeds for every
//! subroutine, then repeated extension of surviving routines by one node
//! whose input (or a parameter) consumes the most recent output. Two
//! routines are considered the same when they are behaviorally
//! equivalent on a small cross-evaluated sample — a pragmatic filter,
//! not a total equivalence. Warnings (size cap, discarded routines) go
//! to the error stream; the return value is only routines that pass a
//! final re-check.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use ravel_core::Params;

use super::check::check;
use super::eval::evaluate;
use super::generate::generate_examples;
use super::registry::Registry;
use super::routine::{Node, Routine, Wire};
use super::types::Type;

/// Hard cap on routine size; deepening past it aborts enumeration.
const MAX_SIZE: usize = 7;
/// Inputs sampled per side for the behavioral-equivalence test.
const SAMPLE_COUNT: usize = 4;
/// Attempts at re-sampling a routine's static values before keeping the
/// originals.
const REGEN_ATTEMPTS: usize = 5;
/// Chance that an int-valued free slot back-references an earlier value
/// instead of taking a fresh static.
const BACKREF_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct EnumerateOptions {
    /// Stop once this many behaviorally distinct routines exist.
    pub bound: usize,
    /// Magnitude limit for sampled static values.
    pub rand_limit: i64,
}

impl Default for EnumerateOptions {
    fn default() -> Self {
        EnumerateOptions {
            bound: 10,
            rand_limit: 10,
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    routine: Routine,
    types: Vec<Type>,
}

/// Enumerate behaviorally distinct routines until `bound` is reached or
/// the size cap trips.
pub fn enumerate(
    registry: &Registry,
    options: &EnumerateOptions,
    rng: &mut dyn RngCore,
) -> Vec<Routine> {
    let mut generated: Vec<Candidate> = Vec::new();

    for name in registry.names() {
        if let Some(seed) = seed_routine(registry, name, options, rng) {
            push_if_novel(registry, &mut generated, seed, rng);
        }
    }

    while generated.len() < options.bound {
        let extendable = generated
            .iter()
            .filter(|c| c.routine.len() < MAX_SIZE)
            .cloned()
            .collect::<Vec<_>>();
        if extendable.is_empty() {
            eprintln!(
                "warning: enumeration hit the size cap ({}) with {} routines",
                MAX_SIZE,
                generated.len()
            );
            break;
        }

        let mut grew = false;
        for candidate in extendable {
            let base = regenerate_statics(registry, &candidate, options, rng);
            for extended in deepen(registry, &base, options, rng) {
                if push_if_novel(registry, &mut generated, extended, rng) {
                    grew = true;
                }
                if generated.len() >= options.bound {
                    break;
                }
            }
            if generated.len() >= options.bound {
                break;
            }
        }
        if !grew {
            eprintln!(
                "warning: enumeration stalled with {} routines",
                generated.len()
            );
            break;
        }
    }

    let mut routines = Vec::with_capacity(generated.len());
    for candidate in generated {
        if check(registry, &candidate.routine).is_ok() {
            routines.push(candidate.routine);
        } else {
            eprintln!(
                "warning: discarding routine that no longer checks: {}",
                candidate.routine
            );
        }
    }
    routines
}

/// The size-1 routine for one subroutine: input wired to the overall
/// input, parameters freshly sampled.
fn seed_routine(
    registry: &Registry,
    name: &str,
    options: &EnumerateOptions,
    rng: &mut dyn RngCore,
) -> Option<Candidate> {
    let sub = registry.get(name)?;
    let mut wires = vec![Wire::Dyn(0)];
    for slot in 1..sub.arity() {
        wires.push(Wire::Static(sub.sample_static(slot, options.rand_limit, rng)));
    }
    let routine = Routine {
        nodes: vec![Node {
            name: name.to_string(),
            wires,
        }],
    };
    let types = check(registry, &routine).ok()?;
    Some(Candidate { routine, types })
}

/// Every one-node extension of `base`: for each subroutine, each slot
/// whose requirement the current output satisfies receives the most
/// recent output; remaining slots are wired to compatible earlier values
/// or fresh statics.
fn deepen(
    registry: &Registry,
    base: &Candidate,
    options: &EnumerateOptions,
    rng: &mut dyn RngCore,
) -> Vec<Candidate> {
    let m = base.routine.len();
    let last = &base.types[m];
    let mut extended = Vec::new();

    for name in registry.names() {
        let sub = match registry.get(name) {
            Some(sub) => sub,
            None => continue,
        };
        for target in 0..sub.arity() {
            let required = match sub
                .slot_type(target)
                .and_then(|expr| expr.resolve(&Params::none()).ok())
            {
                Some(ty) => ty,
                None => continue,
            };
            if !last.subtype(&required) {
                continue;
            }
            let node = match build_node(sub, name, target, base, options, rng) {
                Some(node) => node,
                None => continue,
            };
            let mut routine = base.routine.clone();
            routine.nodes.push(node);
            if let Ok(types) = check(registry, &routine) {
                extended.push(Candidate { routine, types });
            }
        }
    }
    extended
}

fn build_node(
    sub: &super::registry::Subroutine,
    name: &str,
    target: usize,
    base: &Candidate,
    options: &EnumerateOptions,
    rng: &mut dyn RngCore,
) -> Option<Node> {
    let m = base.routine.len();
    let mut wires = Vec::with_capacity(sub.arity());
    for slot in 0..sub.arity() {
        if slot == target {
            wires.push(Wire::Dyn(m));
            continue;
        }
        let expr = sub.slot_type(slot)?;
        let required = expr.resolve(&Params::none()).ok()?;
        if expr.is_list_valued() {
            // A list can only come from an earlier value.
            let j = *compatible_sources(base, &required).choose(rng)?;
            wires.push(Wire::Dyn(j));
        } else {
            if rng.gen_bool(BACKREF_PROBABILITY) {
                if let Some(&j) = compatible_sources(base, &required).choose(rng) {
                    wires.push(Wire::Dyn(j));
                    continue;
                }
            }
            wires.push(Wire::Static(sub.sample_static(slot, options.rand_limit, rng)));
        }
    }
    Some(Node {
        name: name.to_string(),
        wires,
    })
}

/// Indices of earlier values whose inferred type satisfies `required`.
fn compatible_sources(base: &Candidate, required: &Type) -> Vec<usize> {
    (0..base.types.len())
        .filter(|&j| base.types[j].subtype(required))
        .collect()
}

/// Re-sample every static wire; keep the originals when the routine
/// stops checking after [`REGEN_ATTEMPTS`] tries.
fn regenerate_statics(
    registry: &Registry,
    candidate: &Candidate,
    options: &EnumerateOptions,
    rng: &mut dyn RngCore,
) -> Candidate {
    let has_statics = candidate
        .routine
        .nodes
        .iter()
        .any(|n| n.wires.iter().any(|w| matches!(w, Wire::Static(_))));
    if !has_statics {
        return candidate.clone();
    }

    for _ in 0..REGEN_ATTEMPTS {
        let mut routine = candidate.routine.clone();
        for node in &mut routine.nodes {
            let sub = match registry.get(&node.name) {
                Some(sub) => sub,
                None => return candidate.clone(),
            };
            for (slot, wire) in node.wires.iter_mut().enumerate() {
                if matches!(wire, Wire::Static(_)) {
                    *wire = Wire::Static(sub.sample_static(slot, options.rand_limit, rng));
                }
            }
        }
        if let Ok(types) = check(registry, &routine) {
            return Candidate { routine, types };
        }
    }
    candidate.clone()
}

/// Append `candidate` unless it is behaviorally equivalent to a routine
/// already generated.
fn push_if_novel(
    registry: &Registry,
    generated: &mut Vec<Candidate>,
    candidate: Candidate,
    rng: &mut dyn RngCore,
) -> bool {
    for existing in generated.iter() {
        if equivalent(registry, existing, &candidate, rng) {
            return false;
        }
    }
    generated.push(candidate);
    true
}

/// Behavioral equivalence: identical inferred input types, and each
/// side's sampled inputs produce identical outputs on the other side.
/// Any sampling failure counts as a difference.
fn equivalent(registry: &Registry, a: &Candidate, b: &Candidate, rng: &mut dyn RngCore) -> bool {
    if a.types[0] != b.types[0] {
        return false;
    }
    let sample_a = match generate_examples(registry, &a.routine, SAMPLE_COUNT, rng) {
        Ok(pairs) => pairs,
        Err(_) => return false,
    };
    let sample_b = match generate_examples(registry, &b.routine, SAMPLE_COUNT, rng) {
        Ok(pairs) => pairs,
        Err(_) => return false,
    };
    sample_a
        .iter()
        .all(|(input, output)| evaluate(registry, &b.routine, input).as_ref() == Ok(output))
        && sample_b
            .iter()
            .all(|(input, output)| evaluate(registry, &a.routine, input).as_ref() == Ok(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::library;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn seeds_cover_the_registry() {
        let registry = library::builtin();
        let mut rng = StdRng::seed_from_u64(11);
        let seed = seed_routine(&registry, "index-k", &EnumerateOptions::default(), &mut rng)
            .expect("index-k seeds");
        assert_eq!(seed.routine.len(), 1);
        assert_eq!(seed.routine.nodes[0].wires[0], Wire::Dyn(0));
    }

    #[test]
    fn equivalent_detects_renamed_copies() {
        // head and index-k with k = 1 compute the same function over the
        // same input type.
        let registry = library::builtin();
        let mut rng = StdRng::seed_from_u64(5);
        let head = Routine::parse("(head (dyn 0))", &registry).unwrap();
        let first = Routine::parse("(index-k (dyn 0) (static 1))", &registry).unwrap();
        let a = Candidate {
            types: check(&registry, &head).unwrap(),
            routine: head,
        };
        let b = Candidate {
            types: check(&registry, &first).unwrap(),
            routine: first,
        };
        assert!(equivalent(&registry, &a, &b, &mut rng));
    }

    #[test]
    fn distinct_behavior_is_kept() {
        let registry = library::builtin();
        let mut rng = StdRng::seed_from_u64(5);
        let sum = Routine::parse("(sum (dyn 0))", &registry).unwrap();
        let product = Routine::parse("(product (dyn 0))", &registry).unwrap();
        let a = Candidate {
            types: check(&registry, &sum).unwrap(),
            routine: sum,
        };
        let b = Candidate {
            types: check(&registry, &product).unwrap(),
            routine: product,
        };
        assert!(!equivalent(&registry, &a, &b, &mut rng));
    }
}
