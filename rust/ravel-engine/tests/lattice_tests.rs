//! Algebraic laws of the refinement type lattice, exercised over a
//! fixed sample of types.

use ravel_core::{Params, Value};
use ravel_engine::{Arg, Refinement, Type, TypeExpr};

fn ty(expr: TypeExpr) -> Type {
    expr.resolve(&Params::none()).expect("sample type resolves")
}

fn samples() -> Vec<Type> {
    vec![
        Type::any(),
        ty(TypeExpr::int()),
        ty(TypeExpr::int().refine(Refinement::Positive)),
        ty(TypeExpr::int().refine(Refinement::NonNegative)),
        ty(TypeExpr::int().refine(Refinement::Even)),
        ty(TypeExpr::int().refine(Refinement::Odd)),
        ty(TypeExpr::int().refine(Refinement::Multiple(Arg::Lit(3)))),
        ty(TypeExpr::int().refine(Refinement::Divisor(Arg::Lit(12)))),
        ty(TypeExpr::int().refine(Refinement::Between(Arg::Lit(-4), Arg::Lit(9)))),
        ty(TypeExpr::int_list()),
        ty(TypeExpr::int_list().refine(Refinement::LengthAtLeast(Arg::Lit(2)))),
        ty(TypeExpr::int_list().refine(Refinement::LengthExact(Arg::Lit(3)))),
        ty(TypeExpr::int_list().refine(Refinement::Sorted)),
        ty(TypeExpr::int_list()
            .refine(Refinement::Positive)
            .refine(Refinement::LengthAtLeast(Arg::Lit(1)))),
    ]
}

fn witnesses() -> Vec<Value> {
    vec![
        Value::Int(0),
        Value::Int(1),
        Value::Int(-3),
        Value::Int(4),
        Value::Int(6),
        Value::Int(9),
        Value::List(vec![]),
        Value::List(vec![2]),
        Value::List(vec![1, 2, 3]),
        Value::List(vec![3, 1]),
        Value::List(vec![-2, 0, 2, 4]),
    ]
}

#[test]
fn intersect_commutes() {
    let samples = samples();
    for a in &samples {
        for b in &samples {
            assert_eq!(a.intersect(b), b.intersect(a), "{} ∧ {}", a, b);
        }
    }
}

#[test]
fn intersect_is_associative() {
    let samples = samples();
    for a in &samples {
        for b in &samples {
            for c in &samples {
                let left = a.intersect(b).and_then(|ab| ab.intersect(c));
                let right = b.intersect(c).and_then(|bc| a.intersect(&bc));
                assert_eq!(left, right, "({} ∧ {}) ∧ {}", a, b, c);
            }
        }
    }
}

#[test]
fn intersect_is_idempotent_with_any_identity() {
    for t in samples() {
        assert_eq!(t.intersect(&t), Some(t.clone()), "{} ∧ {}", t, t);
        assert_eq!(Type::any().intersect(&t), Some(t.clone()));
        assert_eq!(t.intersect(&Type::any()), Some(t));
    }
}

#[test]
fn intersect_refines_membership() {
    // v ∈ a ∧ b exactly when v ∈ a and v ∈ b.
    let samples = samples();
    let witnesses = witnesses();
    for a in &samples {
        for b in &samples {
            match a.intersect(b) {
                Some(met) => {
                    for v in &witnesses {
                        assert_eq!(
                            met.inhabits(v),
                            a.inhabits(v) && b.inhabits(v),
                            "{} ∈ {} ∧ {}",
                            v,
                            a,
                            b
                        );
                    }
                }
                None => {
                    for v in &witnesses {
                        assert!(
                            !(a.inhabits(v) && b.inhabits(v)),
                            "{} inhabits both {} and {} yet the meet is bottom",
                            v,
                            a,
                            b
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn subtype_is_reflexive_and_transitive() {
    let samples = samples();
    for a in &samples {
        assert!(a.subtype(a), "{} ≤ {}", a, a);
        for b in &samples {
            for c in &samples {
                if a.subtype(b) && b.subtype(c) {
                    assert!(a.subtype(c), "{} ≤ {} ≤ {}", a, b, c);
                }
            }
        }
    }
}

#[test]
fn subtype_implies_membership_inclusion() {
    let samples = samples();
    let witnesses = witnesses();
    for a in &samples {
        for b in &samples {
            if !a.subtype(b) {
                continue;
            }
            for v in &witnesses {
                if a.inhabits(v) {
                    assert!(
                        b.inhabits(v),
                        "{} ≤ {} but witness {} fails the supertype",
                        a,
                        b,
                        v
                    );
                }
            }
        }
    }
}

#[test]
fn introduce_adopts_requirements_onto_any() {
    let req = ty(TypeExpr::int_list().refine(Refinement::LengthAtLeast(Arg::Lit(3))));
    assert_eq!(Type::any().introduce(&req), Some(req.clone()));
    let sorted = ty(TypeExpr::int_list().refine(Refinement::Sorted));
    let narrowed = sorted.introduce(&req).expect("compatible requirement");
    assert!(narrowed.subtype(&req));
    assert!(narrowed.subtype(&sorted));
}
