//! Subroutine descriptors and the process-wide registry.
//!
//! Subroutines are statically linked: each descriptor bundles its declared
//! slot types with plain function pointers for evaluation and input
//! generation. The registry is an immutable name → descriptor map with
//! deterministic (lexicographic) iteration order.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use rand::{Rng, RngCore};

use ravel_core::{ParamName, Params, Value};

use super::eval::EvalError;
use super::library;
use super::types::{Sign, TypeExpr};

/// Evaluate one subroutine application.
pub type EvalFn = fn(&Value, &Params) -> Result<Value, EvalError>;

/// Propose candidate inputs. Candidates are independent suggestions; the
/// caller filters them against the routine's inferred input type.
pub type GenerateFn = fn(&GenParams, &mut dyn RngCore) -> Vec<Value>;

/// Options for a subroutine's input generator: how many candidates to
/// propose, plus the consuming node's static parameters (a subroutine
/// whose input type depends on `k` shapes its proposals accordingly).
#[derive(Debug, Clone, Copy)]
pub struct GenParams {
    pub count: usize,
    pub params: Params,
}

/// One declared parameter slot.
#[derive(Debug, Clone)]
pub struct ParamSlot {
    pub name: ParamName,
    pub ty: TypeExpr,
}

/// A registered primitive subroutine.
pub struct Subroutine {
    pub name: &'static str,
    pub description: &'static str,
    pub input: TypeExpr,
    pub output: TypeExpr,
    pub params: Vec<ParamSlot>,
    pub evaluate: EvalFn,
    pub generate: GenerateFn,
    /// Default statics used when the routine is named bare.
    pub example_params: Params,
    /// Pre-declared example inputs, served by the `examples` op.
    pub examples: Vec<Value>,
}

impl Subroutine {
    /// Total number of wires a node invoking this subroutine carries.
    pub fn arity(&self) -> usize {
        1 + self.params.len()
    }

    /// Declared type of slot `slot` (0 = input, 1.. = parameters).
    pub fn slot_type(&self, slot: usize) -> Option<&TypeExpr> {
        if slot == 0 {
            Some(&self.input)
        } else {
            self.params.get(slot - 1).map(|p| &p.ty)
        }
    }

    /// Sample a static value for `slot`, uniform within `limit` and
    /// clamped to the slot's declared sign and range. Parity and
    /// divisibility refinements are not sampled for — no builtin
    /// declares them on a slot.
    pub fn sample_static(&self, slot: usize, limit: i64, rng: &mut dyn RngCore) -> i64 {
        let limit = limit.max(1);
        let (mut lo, mut hi) = (-limit, limit);
        if let Some(ty) = self.slot_type(slot) {
            if let Ok(resolved) = ty.resolve(&Params::none()) {
                match resolved.sign {
                    Some(Sign::Positive) => lo = lo.max(1),
                    Some(Sign::NonNegative) => lo = lo.max(0),
                    Some(Sign::Negative) => hi = hi.min(-1),
                    None => {}
                }
                if let Some((rlo, rhi)) = resolved.range {
                    lo = lo.max(rlo);
                    hi = hi.min(rhi);
                }
            }
        }
        if lo > hi {
            lo = hi;
        }
        rng.gen_range(lo..=hi)
    }
}

/// Immutable catalog of subroutines.
#[derive(Default)]
pub struct Registry {
    subs: BTreeMap<&'static str, Subroutine>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn register(&mut self, sub: Subroutine) {
        self.subs.insert(sub.name, sub);
    }

    pub fn get(&self, name: &str) -> Option<&Subroutine> {
        self.subs.get(name)
    }

    /// Subroutine names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.subs.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subroutine> + '_ {
        self.subs.values()
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// The process-wide registry, populated once from the builtin
    /// library and immutable thereafter.
    pub fn global() -> &'static Registry {
        static REGISTRY: Lazy<Registry> = Lazy::new(library::builtin);
        &REGISTRY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn names_are_lexicographic() {
        let registry = Registry::global();
        let names: Vec<_> = registry.names().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(!names.is_empty());
    }

    #[test]
    fn sample_static_respects_declared_sign() {
        let registry = Registry::global();
        let index_k = registry.get("index-k").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let v = index_k.sample_static(1, 10, &mut rng);
            assert!((1..=10).contains(&v), "positive k expected, got {}", v);
        }
    }

    #[test]
    fn slot_types_cover_input_and_params() {
        let registry = Registry::global();
        let index_k = registry.get("index-k").unwrap();
        assert_eq!(index_k.arity(), 2);
        assert!(index_k.slot_type(0).unwrap().is_list_valued());
        assert!(!index_k.slot_type(1).unwrap().is_list_valued());
        assert!(index_k.slot_type(2).is_none());
    }
}
