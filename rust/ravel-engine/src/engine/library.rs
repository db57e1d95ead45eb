//! The builtin subroutine library.
//!
//! Every primitive a routine can invoke is registered here, statically
//! linked. Evaluators use checked arithmetic — overflow and domain
//! violations surface as [`EvalError`]s. Generators propose candidate
//! inputs by sampling within each subroutine's declared input type,
//! honoring the consuming node's static `k` where the type depends on it.

use rand::{Rng, RngCore};

use ravel_core::{ParamName, Params, Value};

use super::eval::EvalError;
use super::registry::{GenParams, ParamSlot, Registry, Subroutine};
use super::types::{Arg, Refinement, TypeExpr};

/// Build the full builtin registry.
pub fn builtin() -> Registry {
    let mut r = Registry::new();

    r.register(Subroutine {
        name: "abs",
        description: "Replace every element with its absolute value.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int_list()
            .refine(Refinement::SameLength)
            .refine(Refinement::NonNegative),
        params: vec![],
        evaluate: eval_abs,
        generate: gen_lists_any,
        example_params: Params::none(),
        examples: vec![list(&[-3, 0, 5]), list(&[7, -7])],
    });

    r.register(Subroutine {
        name: "add-k",
        description: "Add k to every element.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int_list().refine(Refinement::SameLength),
        params: vec![k_slot(TypeExpr::int())],
        evaluate: eval_add_k,
        generate: gen_lists_any,
        example_params: Params::with_k(2),
        examples: vec![list(&[1, 2, 3]), list(&[-4, 0, 9]), list(&[])],
    });

    r.register(Subroutine {
        name: "append-k",
        description: "Append k at the end of the list.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int_list().refine(Refinement::NoSmaller),
        params: vec![k_slot(TypeExpr::int())],
        evaluate: eval_append_k,
        generate: gen_lists_any,
        example_params: Params::with_k(5),
        examples: vec![list(&[]), list(&[1, 2, 3])],
    });

    r.register(Subroutine {
        name: "count-k",
        description: "Count occurrences of k.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int().refine(Refinement::NonNegative),
        params: vec![k_slot(TypeExpr::int())],
        evaluate: eval_count_k,
        generate: gen_lists_any,
        example_params: Params::with_k(1),
        examples: vec![list(&[1, 1, 2]), list(&[0, 3])],
    });

    r.register(Subroutine {
        name: "drop-k",
        description: "Drop the first k elements.",
        input: TypeExpr::int_list().refine(Refinement::LengthAtLeast(Arg::K)),
        output: TypeExpr::int_list(),
        params: vec![k_slot(TypeExpr::int().refine(Refinement::Positive))],
        evaluate: eval_drop_k,
        generate: gen_lists_len_k,
        example_params: Params::with_k(1),
        examples: vec![list(&[1, 2, 3]), list(&[9, 8])],
    });

    r.register(Subroutine {
        name: "evens",
        description: "Keep only the even elements.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int_list().refine(Refinement::Even),
        params: vec![],
        evaluate: eval_evens,
        generate: gen_lists_any,
        example_params: Params::none(),
        examples: vec![list(&[1, 2, 3, 4]), list(&[5, 7])],
    });

    r.register(Subroutine {
        name: "fibonacci",
        description: "The n-th Fibonacci number of the input.",
        input: TypeExpr::int().refine(Refinement::Positive),
        output: TypeExpr::int().refine(Refinement::Positive),
        params: vec![],
        evaluate: eval_fibonacci,
        generate: gen_ints_positive,
        example_params: Params::none(),
        examples: vec![Value::Int(1), Value::Int(5), Value::Int(9)],
    });

    r.register(Subroutine {
        name: "head",
        description: "The first element.",
        input: TypeExpr::int_list().refine(Refinement::LengthAtLeast(Arg::Lit(1))),
        output: TypeExpr::int().refine(Refinement::Element),
        params: vec![],
        evaluate: eval_head,
        generate: gen_lists_nonempty,
        example_params: Params::none(),
        examples: vec![list(&[4, 1, 1]), list(&[-2])],
    });

    r.register(Subroutine {
        name: "index-k",
        description: "The k-th element (1-based).",
        input: TypeExpr::int_list().refine(Refinement::LengthAtLeast(Arg::K)),
        output: TypeExpr::int().refine(Refinement::Element),
        params: vec![k_slot(TypeExpr::int().refine(Refinement::Positive))],
        evaluate: eval_index_k,
        generate: gen_lists_len_k,
        example_params: Params::with_k(2),
        examples: vec![list(&[1, 2, 3]), list(&[7, 7, 7, 7])],
    });

    r.register(Subroutine {
        name: "last",
        description: "The last element.",
        input: TypeExpr::int_list().refine(Refinement::LengthAtLeast(Arg::Lit(1))),
        output: TypeExpr::int().refine(Refinement::Element),
        params: vec![],
        evaluate: eval_last,
        generate: gen_lists_nonempty,
        example_params: Params::none(),
        examples: vec![list(&[4, 1, 1]), list(&[-2])],
    });

    r.register(Subroutine {
        name: "length",
        description: "The number of elements.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int().refine(Refinement::NonNegative),
        params: vec![],
        evaluate: eval_length,
        generate: gen_lists_any,
        example_params: Params::none(),
        examples: vec![list(&[]), list(&[1, 2, 3])],
    });

    r.register(Subroutine {
        name: "max",
        description: "The largest element.",
        input: TypeExpr::int_list().refine(Refinement::LengthAtLeast(Arg::Lit(1))),
        output: TypeExpr::int().refine(Refinement::Element),
        params: vec![],
        evaluate: eval_max,
        generate: gen_lists_nonempty,
        example_params: Params::none(),
        examples: vec![list(&[3, 9, 1]), list(&[-5, -2])],
    });

    r.register(Subroutine {
        name: "min",
        description: "The smallest element.",
        input: TypeExpr::int_list().refine(Refinement::LengthAtLeast(Arg::Lit(1))),
        output: TypeExpr::int().refine(Refinement::Element),
        params: vec![],
        evaluate: eval_min,
        generate: gen_lists_nonempty,
        example_params: Params::none(),
        examples: vec![list(&[3, 9, 1]), list(&[-5, -2])],
    });

    r.register(Subroutine {
        name: "mod-k",
        description: "Every element modulo k (non-negative remainder).",
        input: TypeExpr::int_list(),
        output: TypeExpr::int_list()
            .refine(Refinement::SameLength)
            .refine(Refinement::Between(Arg::Lit(0), Arg::K)),
        params: vec![k_slot(TypeExpr::int().refine(Refinement::Positive))],
        evaluate: eval_mod_k,
        generate: gen_lists_any,
        example_params: Params::with_k(3),
        examples: vec![list(&[1, 5, 6]), list(&[-4, 0])],
    });

    r.register(Subroutine {
        name: "multiply-k",
        description: "Multiply every element by k.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int_list()
            .refine(Refinement::SameLength)
            .refine(Refinement::Multiple(Arg::K)),
        params: vec![k_slot(TypeExpr::int())],
        evaluate: eval_multiply_k,
        generate: gen_lists_any,
        example_params: Params::with_k(3),
        examples: vec![list(&[1, 2, 3]), list(&[0, -2])],
    });

    r.register(Subroutine {
        name: "product",
        description: "The product of all elements.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int(),
        params: vec![],
        evaluate: eval_product,
        generate: gen_lists_any,
        example_params: Params::none(),
        examples: vec![list(&[2, 3, 4]), list(&[])],
    });

    r.register(Subroutine {
        name: "repeat-k",
        description: "A list of k copies of the input.",
        input: TypeExpr::int(),
        output: TypeExpr::int_list().refine(Refinement::LengthExact(Arg::K)),
        params: vec![k_slot(TypeExpr::int().refine(Refinement::Positive))],
        evaluate: eval_repeat_k,
        generate: gen_ints_small,
        example_params: Params::with_k(3),
        examples: vec![Value::Int(7), Value::Int(-1)],
    });

    r.register(Subroutine {
        name: "reverse",
        description: "The list reversed.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int_list().refine(Refinement::SameLength),
        params: vec![],
        evaluate: eval_reverse,
        generate: gen_lists_any,
        example_params: Params::none(),
        examples: vec![list(&[1, 2, 3]), list(&[])],
    });

    r.register(Subroutine {
        name: "sort",
        description: "The list sorted nondecreasing.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int_list()
            .refine(Refinement::SameLength)
            .refine(Refinement::Sorted),
        params: vec![],
        evaluate: eval_sort,
        generate: gen_lists_any,
        example_params: Params::none(),
        examples: vec![list(&[3, 1, 2]), list(&[5])],
    });

    r.register(Subroutine {
        name: "sub-k",
        description: "Subtract k from every element.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int_list().refine(Refinement::SameLength),
        params: vec![k_slot(TypeExpr::int())],
        evaluate: eval_sub_k,
        generate: gen_lists_any,
        example_params: Params::with_k(1),
        examples: vec![list(&[1, 2, 3]), list(&[0])],
    });

    r.register(Subroutine {
        name: "sum",
        description: "The sum of all elements.",
        input: TypeExpr::int_list(),
        output: TypeExpr::int(),
        params: vec![],
        evaluate: eval_sum,
        generate: gen_lists_any,
        example_params: Params::none(),
        examples: vec![list(&[1, 2, 3]), list(&[])],
    });

    r.register(Subroutine {
        name: "take-k",
        description: "The first k elements.",
        input: TypeExpr::int_list().refine(Refinement::LengthAtLeast(Arg::K)),
        output: TypeExpr::int_list().refine(Refinement::LengthExact(Arg::K)),
        params: vec![k_slot(TypeExpr::int().refine(Refinement::Positive))],
        evaluate: eval_take_k,
        generate: gen_lists_len_k,
        example_params: Params::with_k(2),
        examples: vec![list(&[1, 2, 3]), list(&[4, 4])],
    });

    r
}

fn k_slot(ty: TypeExpr) -> ParamSlot {
    ParamSlot {
        name: ParamName::K,
        ty,
    }
}

fn list(xs: &[i64]) -> Value {
    Value::List(xs.to_vec())
}

// ── Evaluation helpers ──────────────────────────────────────────────

fn expect_int(value: &Value) -> Result<i64, EvalError> {
    value.as_int().ok_or(EvalError::ExpectedInt)
}

fn expect_list(value: &Value) -> Result<&[i64], EvalError> {
    value.as_list().ok_or(EvalError::ExpectedList)
}

fn need_k(params: &Params) -> Result<i64, EvalError> {
    params.k.ok_or(EvalError::MissingParam(ParamName::K))
}

fn map_elements(value: &Value, f: impl Fn(i64) -> Option<i64>) -> Result<Value, EvalError> {
    let xs = expect_list(value)?;
    let mut out = Vec::with_capacity(xs.len());
    for &x in xs {
        out.push(f(x).ok_or(EvalError::Overflow)?);
    }
    Ok(Value::List(out))
}

// ── Evaluators ──────────────────────────────────────────────────────

fn eval_abs(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    map_elements(value, i64::checked_abs)
}

fn eval_add_k(value: &Value, params: &Params) -> Result<Value, EvalError> {
    let k = need_k(params)?;
    map_elements(value, |x| x.checked_add(k))
}

fn eval_append_k(value: &Value, params: &Params) -> Result<Value, EvalError> {
    let k = need_k(params)?;
    let mut xs = expect_list(value)?.to_vec();
    xs.push(k);
    Ok(Value::List(xs))
}

fn eval_count_k(value: &Value, params: &Params) -> Result<Value, EvalError> {
    let k = need_k(params)?;
    let xs = expect_list(value)?;
    Ok(Value::Int(xs.iter().filter(|&&x| x == k).count() as i64))
}

fn eval_drop_k(value: &Value, params: &Params) -> Result<Value, EvalError> {
    let k = need_k(params)?;
    let xs = expect_list(value)?;
    if k < 0 || k as usize > xs.len() {
        return Err(EvalError::IndexOutOfRange {
            index: k,
            len: xs.len(),
        });
    }
    Ok(Value::List(xs[k as usize..].to_vec()))
}

fn eval_evens(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    let xs = expect_list(value)?;
    Ok(Value::List(
        xs.iter().copied().filter(|x| x % 2 == 0).collect(),
    ))
}

fn eval_fibonacci(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    let n = expect_int(value)?;
    if n < 1 {
        return Err(EvalError::Domain);
    }
    let (mut a, mut b) = (0i64, 1i64);
    for _ in 1..n {
        let next = a.checked_add(b).ok_or(EvalError::Overflow)?;
        a = b;
        b = next;
    }
    Ok(Value::Int(b))
}

fn eval_head(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    let xs = expect_list(value)?;
    xs.first().map(|&x| Value::Int(x)).ok_or(EvalError::EmptyList)
}

fn eval_index_k(value: &Value, params: &Params) -> Result<Value, EvalError> {
    let k = need_k(params)?;
    let xs = expect_list(value)?;
    if k < 1 || k as usize > xs.len() {
        return Err(EvalError::IndexOutOfRange {
            index: k,
            len: xs.len(),
        });
    }
    Ok(Value::Int(xs[k as usize - 1]))
}

fn eval_last(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    let xs = expect_list(value)?;
    xs.last().map(|&x| Value::Int(x)).ok_or(EvalError::EmptyList)
}

fn eval_length(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    Ok(Value::Int(expect_list(value)?.len() as i64))
}

fn eval_max(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    let xs = expect_list(value)?;
    xs.iter().max().map(|&x| Value::Int(x)).ok_or(EvalError::EmptyList)
}

fn eval_min(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    let xs = expect_list(value)?;
    xs.iter().min().map(|&x| Value::Int(x)).ok_or(EvalError::EmptyList)
}

fn eval_mod_k(value: &Value, params: &Params) -> Result<Value, EvalError> {
    let k = need_k(params)?;
    if k < 1 {
        return Err(EvalError::Domain);
    }
    map_elements(value, |x| x.checked_rem_euclid(k))
}

fn eval_multiply_k(value: &Value, params: &Params) -> Result<Value, EvalError> {
    let k = need_k(params)?;
    map_elements(value, |x| x.checked_mul(k))
}

fn eval_product(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    let xs = expect_list(value)?;
    let mut acc = 1i64;
    for &x in xs {
        acc = acc.checked_mul(x).ok_or(EvalError::Overflow)?;
    }
    Ok(Value::Int(acc))
}

fn eval_repeat_k(value: &Value, params: &Params) -> Result<Value, EvalError> {
    let k = need_k(params)?;
    let x = expect_int(value)?;
    if !(0..=10_000).contains(&k) {
        return Err(EvalError::Domain);
    }
    Ok(Value::List(vec![x; k as usize]))
}

fn eval_reverse(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    let mut xs = expect_list(value)?.to_vec();
    xs.reverse();
    Ok(Value::List(xs))
}

fn eval_sort(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    let mut xs = expect_list(value)?.to_vec();
    xs.sort_unstable();
    Ok(Value::List(xs))
}

fn eval_sub_k(value: &Value, params: &Params) -> Result<Value, EvalError> {
    let k = need_k(params)?;
    map_elements(value, |x| x.checked_sub(k))
}

fn eval_sum(value: &Value, _params: &Params) -> Result<Value, EvalError> {
    let xs = expect_list(value)?;
    let mut acc = 0i64;
    for &x in xs {
        acc = acc.checked_add(x).ok_or(EvalError::Overflow)?;
    }
    Ok(Value::Int(acc))
}

fn eval_take_k(value: &Value, params: &Params) -> Result<Value, EvalError> {
    let k = need_k(params)?;
    let xs = expect_list(value)?;
    if k < 0 || k as usize > xs.len() {
        return Err(EvalError::IndexOutOfRange {
            index: k,
            len: xs.len(),
        });
    }
    Ok(Value::List(xs[..k as usize].to_vec()))
}

// ── Generators ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct ListSpec {
    min_len: usize,
    max_len: usize,
    lo: i64,
    hi: i64,
}

impl Default for ListSpec {
    fn default() -> Self {
        ListSpec {
            min_len: 0,
            max_len: 7,
            lo: -9,
            hi: 9,
        }
    }
}

fn propose_lists(count: usize, rng: &mut dyn RngCore, spec: ListSpec) -> Vec<Value> {
    (0..count)
        .map(|_| {
            let len = rng.gen_range(spec.min_len..=spec.max_len);
            Value::List((0..len).map(|_| rng.gen_range(spec.lo..=spec.hi)).collect())
        })
        .collect()
}

fn gen_lists_any(gp: &GenParams, rng: &mut dyn RngCore) -> Vec<Value> {
    propose_lists(gp.count, rng, ListSpec::default())
}

fn gen_lists_nonempty(gp: &GenParams, rng: &mut dyn RngCore) -> Vec<Value> {
    propose_lists(
        gp.count,
        rng,
        ListSpec {
            min_len: 1,
            ..ListSpec::default()
        },
    )
}

/// Lists long enough for the node's static `k` (falling back to 1 when
/// `k` is wired dynamically).
fn gen_lists_len_k(gp: &GenParams, rng: &mut dyn RngCore) -> Vec<Value> {
    let k = gp.params.k.unwrap_or(1).clamp(1, 12) as usize;
    propose_lists(
        gp.count,
        rng,
        ListSpec {
            min_len: k,
            max_len: k + 4,
            ..ListSpec::default()
        },
    )
}

fn gen_ints_small(gp: &GenParams, rng: &mut dyn RngCore) -> Vec<Value> {
    (0..gp.count)
        .map(|_| Value::Int(rng.gen_range(-9..=9)))
        .collect()
}

fn gen_ints_positive(gp: &GenParams, rng: &mut dyn RngCore) -> Vec<Value> {
    (0..gp.count)
        .map(|_| Value::Int(rng.gen_range(1..=20)))
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fibonacci_series() {
        let fib = |n| eval_fibonacci(&Value::Int(n), &Params::none());
        assert_eq!(fib(1), Ok(Value::Int(1)));
        assert_eq!(fib(2), Ok(Value::Int(1)));
        assert_eq!(fib(3), Ok(Value::Int(2)));
        assert_eq!(fib(9), Ok(Value::Int(34)));
        assert_eq!(fib(0), Err(EvalError::Domain));
        assert_eq!(fib(200), Err(EvalError::Overflow));
    }

    #[test]
    fn index_is_one_based() {
        let xs = list(&[10, 20, 30]);
        assert_eq!(
            eval_index_k(&xs, &Params::with_k(1)),
            Ok(Value::Int(10))
        );
        assert_eq!(
            eval_index_k(&xs, &Params::with_k(3)),
            Ok(Value::Int(30))
        );
        assert_eq!(
            eval_index_k(&xs, &Params::with_k(4)),
            Err(EvalError::IndexOutOfRange { index: 4, len: 3 })
        );
    }

    #[test]
    fn mod_k_is_non_negative() {
        assert_eq!(
            eval_mod_k(&list(&[-4, 0, 5]), &Params::with_k(3)),
            Ok(list(&[2, 0, 2]))
        );
        assert_eq!(
            eval_mod_k(&list(&[1]), &Params::with_k(0)),
            Err(EvalError::Domain)
        );
    }

    #[test]
    fn product_of_empty_is_one() {
        assert_eq!(eval_product(&list(&[]), &Params::none()), Ok(Value::Int(1)));
        assert_eq!(
            eval_product(&list(&[2, 3, 4]), &Params::none()),
            Ok(Value::Int(24))
        );
    }

    #[test]
    fn overflow_is_an_error_not_a_panic() {
        assert_eq!(
            eval_add_k(&list(&[i64::MAX]), &Params::with_k(1)),
            Err(EvalError::Overflow)
        );
        assert_eq!(
            eval_abs(&list(&[i64::MIN]), &Params::none()),
            Err(EvalError::Overflow)
        );
    }

    #[test]
    fn take_and_drop_partition() {
        let xs = list(&[1, 2, 3, 4]);
        assert_eq!(eval_take_k(&xs, &Params::with_k(2)), Ok(list(&[1, 2])));
        assert_eq!(eval_drop_k(&xs, &Params::with_k(2)), Ok(list(&[3, 4])));
    }

    #[test]
    fn generators_respect_k() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        let mut rng = StdRng::seed_from_u64(3);
        let gp = GenParams {
            count: 20,
            params: Params::with_k(4),
        };
        for v in gen_lists_len_k(&gp, &mut rng) {
            assert!(v.as_list().unwrap().len() >= 4);
        }
    }

    #[test]
    fn every_example_inhabits_the_declared_input() {
        let registry = builtin();
        for sub in registry.iter() {
            let ty = sub.input.resolve(&sub.example_params).unwrap();
            for example in &sub.examples {
                assert!(
                    ty.inhabits(example),
                    "`{}` example {} does not fit {}",
                    sub.name,
                    example,
                    ty
                );
            }
        }
    }

    #[test]
    fn every_example_evaluates_into_the_declared_output() {
        let registry = builtin();
        for sub in registry.iter() {
            let input_ty = sub.input.resolve(&sub.example_params).unwrap();
            let output_ty = sub
                .output
                .resolve_output(&input_ty, &sub.example_params)
                .unwrap();
            for example in &sub.examples {
                let out = (sub.evaluate)(example, &sub.example_params)
                    .unwrap_or_else(|e| panic!("`{}` failed on {}: {}", sub.name, example, e));
                assert!(
                    output_ty.inhabits(&out),
                    "`{}` output {} does not fit {}",
                    sub.name,
                    out,
                    output_ty
                );
            }
        }
    }
}
