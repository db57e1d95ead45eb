//! Enumerator properties under a fixed seed.

use rand::rngs::StdRng;
use rand::SeedableRng;

use ravel_engine::{
    check, enumerate, evaluate, generate_examples, EnumerateOptions, Registry, Routine,
};

fn enumerated(bound: usize, seed: u64) -> Vec<Routine> {
    let options = EnumerateOptions {
        bound,
        ..EnumerateOptions::default()
    };
    let mut rng = StdRng::seed_from_u64(seed);
    enumerate(Registry::global(), &options, &mut rng)
}

#[test]
fn bound_ten_yields_ten_checked_routines_with_examples() {
    let registry = Registry::global();
    let routines = enumerated(10, 0xC0FFEE);
    assert!(routines.len() >= 10, "got {} routines", routines.len());

    let mut rng = StdRng::seed_from_u64(1);
    for routine in &routines {
        check(registry, routine)
            .unwrap_or_else(|e| panic!("`{}` no longer checks: {}", routine, e));
        let pairs = generate_examples(registry, routine, 1, &mut rng)
            .unwrap_or_else(|e| panic!("`{}` generates no example: {}", routine, e));
        assert!(!pairs.is_empty());
        for (input, output) in &pairs {
            assert_eq!(evaluate(registry, routine, input).as_ref(), Ok(output));
        }
    }
}

#[test]
fn enumeration_is_reproducible_under_a_fixed_seed() {
    let first: Vec<String> = enumerated(10, 7).iter().map(Routine::to_string).collect();
    let second: Vec<String> = enumerated(10, 7).iter().map(Routine::to_string).collect();
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn deepening_produces_multi_node_routines() {
    // A bound above the seed count forces at least one deepening round.
    let registry = Registry::global();
    let routines = enumerated(registry.len() + 4, 99);
    assert!(
        routines.iter().any(|r| r.len() >= 2),
        "no routine grew past one node"
    );
    for routine in &routines {
        assert!(routine.len() <= 7, "`{}` exceeds the size cap", routine);
        check(registry, routine).unwrap();
    }
}
