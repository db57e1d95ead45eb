//! Refinement type lattice over integers and integer lists.
//!
//! A type is a base shape (`int`, `int-list`, or the lattice top `any`)
//! plus a normalized set of refinements. Subroutines declare their slots
//! with [`TypeExpr`] — a refinement list that may carry the symbolic
//! parameters `k` / `n` and the output-only tags `same-length`, `element`,
//! and `no-smaller`. Resolution substitutes parameters and lowers the
//! output-only tags, producing a closed-form [`Type`] that supports
//! intersection, subtyping, and inhabitation tests.
//!
//! Intersection is a total meet: every pair of tags has an explicit
//! interaction rule, and any contradiction collapses to bottom (`None`).

use ravel_core::{Params, Value};
use thiserror::Error;

// ── Declared types ──────────────────────────────────────────────────

/// Base shape of a type. `Any` is the lattice top; `Int` and `IntList`
/// are disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Any,
    Int,
    IntList,
}

/// A refinement argument: an integer literal or one of the two symbolic
/// parameter names, substituted from a node's static parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    Lit(i64),
    K,
    N,
}

impl Arg {
    /// Substitute the argument. `None` when the parameter has no static
    /// binding (it arrives over a dynamic wire).
    fn resolve(self, params: &Params) -> Option<i64> {
        match self {
            Arg::Lit(v) => Some(v),
            Arg::K => params.k,
            Arg::N => params.n,
        }
    }
}

/// One declared refinement tag from the closed vocabulary.
///
/// Sign, parity, `multiple`, and `between` apply to `int` directly and to
/// `int-list` elementwise. `divisor` applies to `int` only; the length
/// tags and `sorted` apply to `int-list` only. The last three variants
/// are output-only: they are lowered against the node's input type during
/// inference and never appear in a stored [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    NonNegative,
    Positive,
    Negative,
    Even,
    Odd,
    /// Value divides the argument.
    Divisor(Arg),
    /// Value is a multiple of the argument.
    Multiple(Arg),
    /// Inclusive range.
    Between(Arg, Arg),
    LengthExact(Arg),
    LengthAtLeast(Arg),
    /// Nondecreasing.
    Sorted,
    /// Output list has the same length as the input list.
    SameLength,
    /// Output is an element of the input list.
    Element,
    /// Output list is at least as long as the input list.
    NoSmaller,
}

/// A declared (pre-lowering) type: base shape plus refinement tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub base: Base,
    pub refinements: Vec<Refinement>,
}

/// Failure while lowering a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("contradictory refinements")]
    Contradiction,
    #[error("output-only refinement in input or parameter position")]
    OutputOnly,
}

impl TypeExpr {
    pub fn any() -> TypeExpr {
        TypeExpr {
            base: Base::Any,
            refinements: Vec::new(),
        }
    }

    pub fn int() -> TypeExpr {
        TypeExpr {
            base: Base::Int,
            refinements: Vec::new(),
        }
    }

    pub fn int_list() -> TypeExpr {
        TypeExpr {
            base: Base::IntList,
            refinements: Vec::new(),
        }
    }

    /// Add a refinement tag (builder style).
    pub fn refine(mut self, r: Refinement) -> TypeExpr {
        self.refinements.push(r);
        self
    }

    pub fn is_list_valued(&self) -> bool {
        self.base == Base::IntList
    }

    /// Lower to a normalized [`Type`], substituting `k` / `n` from
    /// `params`. A refinement whose symbolic argument has no binding is
    /// dropped. Output-only tags are rejected — they have no meaning in
    /// an input or parameter position.
    pub fn resolve(&self, params: &Params) -> Result<Type, TypeError> {
        self.lower(params, None)
    }

    /// Lower a declared *output* type: like [`TypeExpr::resolve`], but
    /// the output-only tags are evaluated against the node's declared
    /// input type. `same-length` becomes `length-exact n` when the input
    /// length is known and `length-at-least` of its lower bound
    /// otherwise; `no-smaller` becomes `length-at-least` of the input's
    /// lower bound; `element` copies the input's elementwise refinements
    /// onto an `int`.
    pub fn resolve_output(&self, input: &Type, params: &Params) -> Result<Type, TypeError> {
        self.lower(params, Some(input))
    }

    fn lower(&self, params: &Params, input: Option<&Type>) -> Result<Type, TypeError> {
        let mut ty = Type::with_base(self.base);
        for r in &self.refinements {
            let narrowed = match singleton(self.base, *r, params, input) {
                Ok(Some(s)) => ty.intersect(&s),
                Ok(None) => continue,
                Err(e) => return Err(e),
            };
            ty = narrowed.ok_or(TypeError::Contradiction)?;
        }
        Ok(ty)
    }
}

/// Build the single-tag type a refinement denotes, with arguments
/// substituted. `Ok(None)` means the tag resolved to no information (an
/// unbound symbolic argument, or an output-only tag against a non-list
/// input). A tag that is meaningless on its base (`sorted` on `int`) is a
/// contradiction.
fn singleton(
    base: Base,
    r: Refinement,
    params: &Params,
    input: Option<&Type>,
) -> Result<Option<Type>, TypeError> {
    let mut ty = Type::with_base(base);
    match r {
        Refinement::NonNegative => ty.sign = Some(Sign::NonNegative),
        Refinement::Positive => ty.sign = Some(Sign::Positive),
        Refinement::Negative => ty.sign = Some(Sign::Negative),
        Refinement::Even => ty.parity = Some(Parity::Even),
        Refinement::Odd => ty.parity = Some(Parity::Odd),
        Refinement::Divisor(arg) => {
            if base != Base::Int {
                return Err(TypeError::Contradiction);
            }
            match arg.resolve(params) {
                Some(v) => ty.divisor = Some(magnitude(v)),
                None => return Ok(None),
            }
        }
        Refinement::Multiple(arg) => match arg.resolve(params) {
            Some(v) => ty.multiple = Some(magnitude(v)),
            None => return Ok(None),
        },
        Refinement::Between(lo, hi) => match (lo.resolve(params), hi.resolve(params)) {
            (Some(lo), Some(hi)) => {
                if lo > hi {
                    return Err(TypeError::Contradiction);
                }
                ty.range = Some((lo, hi));
            }
            _ => return Ok(None),
        },
        Refinement::LengthExact(arg) => {
            if base != Base::IntList {
                return Err(TypeError::Contradiction);
            }
            match arg.resolve(params) {
                Some(n) if n >= 0 => ty.len_exact = Some(n as usize),
                Some(_) => return Err(TypeError::Contradiction),
                None => return Ok(None),
            }
        }
        Refinement::LengthAtLeast(arg) => {
            if base != Base::IntList {
                return Err(TypeError::Contradiction);
            }
            match arg.resolve(params) {
                Some(n) => ty.len_min = Some(n.max(0) as usize),
                None => return Ok(None),
            }
        }
        Refinement::Sorted => {
            if base != Base::IntList {
                return Err(TypeError::Contradiction);
            }
            ty.sorted = true;
        }
        Refinement::SameLength => {
            let input = input.ok_or(TypeError::OutputOnly)?;
            if input.base != Base::IntList {
                return Ok(None);
            }
            match input.len_exact {
                Some(n) => ty.len_exact = Some(n),
                None => ty.len_min = Some(input.len_lower_bound()),
            }
        }
        Refinement::NoSmaller => {
            let input = input.ok_or(TypeError::OutputOnly)?;
            if input.base != Base::IntList {
                return Ok(None);
            }
            ty.len_min = Some(input.len_lower_bound());
        }
        Refinement::Element => {
            let input = input.ok_or(TypeError::OutputOnly)?;
            if input.base != Base::IntList {
                return Ok(None);
            }
            // Propagate the elementwise refinements of the input list.
            ty.sign = input.sign;
            ty.parity = input.parity;
            ty.multiple = input.multiple;
            ty.range = input.range;
        }
    }
    Ok(Some(ty))
}

// ── Normalized types ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sign {
    NonNegative,
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Parity {
    Even,
    Odd,
}

/// A normalized refinement type. Stored types contain only closed-form
/// refinements; `any` carries none at all. Equality is structural on the
/// normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub(crate) base: Base,
    pub(crate) sign: Option<Sign>,
    pub(crate) parity: Option<Parity>,
    /// Value divides this (stored non-negative). `int` only.
    pub(crate) divisor: Option<i64>,
    /// Value is a multiple of this (stored non-negative).
    pub(crate) multiple: Option<i64>,
    /// Inclusive range.
    pub(crate) range: Option<(i64, i64)>,
    pub(crate) len_exact: Option<usize>,
    pub(crate) len_min: Option<usize>,
    pub(crate) sorted: bool,
}

impl Type {
    pub fn any() -> Type {
        Type::with_base(Base::Any)
    }

    pub(crate) fn with_base(base: Base) -> Type {
        Type {
            base,
            sign: None,
            parity: None,
            divisor: None,
            multiple: None,
            range: None,
            len_exact: None,
            len_min: None,
            sorted: false,
        }
    }

    pub fn base(&self) -> Base {
        self.base
    }

    pub fn is_any(&self) -> bool {
        self.base == Base::Any
    }

    pub fn len_exact(&self) -> Option<usize> {
        self.len_exact
    }

    /// Lower bound on list length (0 when unconstrained).
    pub fn len_lower_bound(&self) -> usize {
        self.len_exact.or(self.len_min).unwrap_or(0)
    }

    /// Sign as constrained directly or implied by the range.
    fn effective_sign(&self) -> Option<Sign> {
        if self.sign.is_some() {
            return self.sign;
        }
        match self.range {
            Some((lo, _)) if lo >= 1 => Some(Sign::Positive),
            Some((lo, _)) if lo >= 0 => Some(Sign::NonNegative),
            Some((_, hi)) if hi <= -1 => Some(Sign::Negative),
            _ => None,
        }
    }

    /// Multiple as constrained directly or implied by parity.
    fn effective_multiple(&self) -> Option<i64> {
        self.multiple.or(match self.parity {
            Some(Parity::Even) => Some(2),
            _ => None,
        })
    }

    /// Intersection (lattice meet). `None` is bottom: the two types admit
    /// no common inhabitant. Commutative, associative, idempotent, with
    /// `any` as identity.
    pub fn intersect(&self, other: &Type) -> Option<Type> {
        if self.is_any() {
            return Some(other.clone());
        }
        if other.is_any() {
            return Some(self.clone());
        }
        if self.base != other.base {
            return None;
        }

        let mut out = Type::with_base(self.base);

        out.sign = match (self.sign, other.sign) {
            (s, None) => s,
            (None, s) => s,
            (Some(a), Some(b)) if a == b => Some(a),
            (Some(Sign::NonNegative), Some(Sign::Positive))
            | (Some(Sign::Positive), Some(Sign::NonNegative)) => Some(Sign::Positive),
            _ => return None, // negative against non-negative or positive
        };

        out.parity = match (self.parity, other.parity) {
            (p, None) => p,
            (None, p) => p,
            (Some(a), Some(b)) if a == b => Some(a),
            _ => return None, // even against odd
        };

        out.divisor = match (self.divisor, other.divisor) {
            (d, None) => d,
            (None, d) => d,
            // v | a and v | b exactly when v | gcd(a, b).
            (Some(a), Some(b)) => Some(gcd(a, b)),
        };

        out.multiple = match (self.multiple, other.multiple) {
            (m, None) => m,
            (None, m) => m,
            // Multiple of both exactly when multiple of lcm(a, b). An lcm
            // beyond i64 leaves no representable nonzero inhabitant and
            // collapses to bottom.
            (Some(a), Some(b)) => Some(lcm(a, b)?),
        };

        out.range = match (self.range, other.range) {
            (r, None) => r,
            (None, r) => r,
            (Some((alo, ahi)), Some((blo, bhi))) => {
                let lo = alo.max(blo);
                let hi = ahi.min(bhi);
                if lo > hi {
                    return None;
                }
                Some((lo, hi))
            }
        };

        out.len_exact = match (self.len_exact, other.len_exact) {
            (n, None) => n,
            (None, n) => n,
            (Some(a), Some(b)) if a == b => Some(a),
            _ => return None,
        };

        out.len_min = match (self.len_min, other.len_min) {
            (n, None) => n,
            (None, n) => n,
            (Some(a), Some(b)) => Some(a.max(b)),
        };

        out.sorted = self.sorted || other.sorted;

        out.normalize()
    }

    /// Fold redundant fields and run the cross-tag contradiction checks.
    /// Refinements that constrain nothing (`length-at-least 0`,
    /// `multiple 1`) are dropped so that structural equality coincides
    /// with semantic equality.
    fn normalize(mut self) -> Option<Type> {
        if self.len_min == Some(0) {
            self.len_min = None;
        }
        if self.multiple == Some(1) {
            self.multiple = None;
        }
        // length-exact subsumes length-at-least.
        if let (Some(exact), Some(min)) = (self.len_exact, self.len_min) {
            if exact < min {
                return None;
            }
            self.len_min = None;
        }
        // Sign against range.
        if let Some((lo, hi)) = self.range {
            match self.sign {
                Some(Sign::Positive) if hi < 1 => return None,
                Some(Sign::NonNegative) if hi < 0 => return None,
                Some(Sign::Negative) if lo > -1 => return None,
                _ => {}
            }
        }
        // Parity against multiple: an odd value cannot be a multiple of
        // an even number; multiple 0 forces the value to be 0 (even).
        if let (Some(Parity::Odd), Some(m)) = (self.parity, self.multiple) {
            if m == 0 || m % 2 == 0 {
                return None;
            }
        }
        // Multiple against divisor: multiple 0 means v == 0, which divides
        // nothing; otherwise m | v and v | d force m | d (everything
        // divides d == 0).
        if let (Some(m), Some(d)) = (self.multiple, self.divisor) {
            if m == 0 || (d != 0 && d % m != 0) {
                return None;
            }
        }
        Some(self)
    }

    /// Narrow a producer's type by a consumer's requirement. A previously
    /// unconstrained (`any`) producer adopts the requirement outright.
    pub fn introduce(&self, required: &Type) -> Option<Type> {
        if self.is_any() {
            Some(required.clone())
        } else {
            self.intersect(required)
        }
    }

    /// `self` ≤ `other`: every inhabitant of `self` inhabits `other`.
    /// Refinement inclusion plus numeric containment.
    pub fn subtype(&self, other: &Type) -> bool {
        if other.is_any() {
            return true;
        }
        if self.is_any() || self.base != other.base {
            return false;
        }

        match other.sign {
            None => {}
            Some(want) => match self.effective_sign() {
                Some(Sign::Positive) => {
                    if want == Sign::Negative {
                        return false;
                    }
                }
                Some(Sign::NonNegative) => {
                    if want != Sign::NonNegative {
                        return false;
                    }
                }
                Some(Sign::Negative) => {
                    if want != Sign::Negative {
                        return false;
                    }
                }
                None => return false,
            },
        }

        if let Some(want) = other.parity {
            let have = match self.parity {
                Some(p) => Some(p),
                None => match self.multiple {
                    Some(m) if m != 0 && m % 2 == 0 => Some(Parity::Even),
                    Some(0) => Some(Parity::Even),
                    _ => None,
                },
            };
            if have != Some(want) {
                return false;
            }
        }

        if let Some(db) = other.divisor {
            match self.divisor {
                None => return false,
                Some(da) => {
                    let ok = if da == 0 {
                        db == 0
                    } else {
                        db == 0 || db % da == 0
                    };
                    if !ok {
                        return false;
                    }
                }
            }
        }

        if let Some(mb) = other.multiple {
            match self.effective_multiple() {
                None => return false,
                Some(ma) => {
                    let ok = if mb == 0 { ma == 0 } else { ma % mb == 0 };
                    if !ok {
                        return false;
                    }
                }
            }
        }

        if let Some((blo, bhi)) = other.range {
            match self.range {
                Some((alo, ahi)) if alo >= blo && ahi <= bhi => {}
                _ => return false,
            }
        }

        if let Some(n) = other.len_exact {
            if self.len_exact != Some(n) {
                return false;
            }
        }

        if let Some(n) = other.len_min {
            if self.len_lower_bound() < n {
                return false;
            }
        }

        if other.sorted && !self.sorted {
            return false;
        }

        true
    }

    /// Does a concrete value inhabit this type?
    pub fn inhabits(&self, value: &Value) -> bool {
        match (self.base, value) {
            (Base::Any, _) => true,
            (Base::Int, Value::Int(n)) => self.int_holds(*n),
            (Base::IntList, Value::List(xs)) => {
                if let Some(exact) = self.len_exact {
                    if xs.len() != exact {
                        return false;
                    }
                }
                if let Some(min) = self.len_min {
                    if xs.len() < min {
                        return false;
                    }
                }
                if self.sorted && xs.windows(2).any(|w| w[0] > w[1]) {
                    return false;
                }
                xs.iter().all(|&x| self.int_holds(x))
            }
            _ => false,
        }
    }

    fn int_holds(&self, n: i64) -> bool {
        match self.sign {
            Some(Sign::NonNegative) if n < 0 => return false,
            Some(Sign::Positive) if n < 1 => return false,
            Some(Sign::Negative) if n > -1 => return false,
            _ => {}
        }
        match self.parity {
            Some(Parity::Even) if n.rem_euclid(2) != 0 => return false,
            Some(Parity::Odd) if n.rem_euclid(2) != 1 => return false,
            _ => {}
        }
        if let Some(d) = self.divisor {
            if n == 0 || d % n != 0 {
                return false;
            }
        }
        if let Some(m) = self.multiple {
            let ok = if m == 0 { n == 0 } else { n % m == 0 };
            if !ok {
                return false;
            }
        }
        if let Some((lo, hi)) = self.range {
            if n < lo || n > hi {
                return false;
            }
        }
        true
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.base {
            Base::Any => "any",
            Base::Int => "int",
            Base::IntList => "int-list",
        };
        write!(f, "{}", name)?;
        let mut tags: Vec<String> = Vec::new();
        match self.sign {
            Some(Sign::NonNegative) => tags.push("non-negative".into()),
            Some(Sign::Positive) => tags.push("positive".into()),
            Some(Sign::Negative) => tags.push("negative".into()),
            None => {}
        }
        match self.parity {
            Some(Parity::Even) => tags.push("even".into()),
            Some(Parity::Odd) => tags.push("odd".into()),
            None => {}
        }
        if let Some(d) = self.divisor {
            tags.push(format!("divisor {}", d));
        }
        if let Some(m) = self.multiple {
            tags.push(format!("multiple {}", m));
        }
        if let Some((lo, hi)) = self.range {
            tags.push(format!("between {} {}", lo, hi));
        }
        if let Some(n) = self.len_exact {
            tags.push(format!("length-exact {}", n));
        }
        if let Some(n) = self.len_min {
            tags.push(format!("length-at-least {}", n));
        }
        if self.sorted {
            tags.push("sorted".into());
        }
        if !tags.is_empty() {
            write!(f, "{{{}}}", tags.join(", "))?;
        }
        Ok(())
    }
}

/// Absolute value saturating at `i64::MAX` (divisibility arguments are
/// stored non-negative).
fn magnitude(v: i64) -> i64 {
    v.checked_abs().unwrap_or(i64::MAX)
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

fn lcm(a: i64, b: i64) -> Option<i64> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    let g = gcd(a, b);
    let wide = (a as i128 / g as i128) * b as i128;
    i64::try_from(wide.abs()).ok()
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(expr: TypeExpr) -> Type {
        expr.resolve(&Params::none()).unwrap()
    }

    fn int_list_min(n: i64) -> Type {
        resolve(TypeExpr::int_list().refine(Refinement::LengthAtLeast(Arg::Lit(n))))
    }

    #[test]
    fn any_is_identity_for_intersect() {
        let t = resolve(TypeExpr::int().refine(Refinement::Positive));
        assert_eq!(Type::any().intersect(&t), Some(t.clone()));
        assert_eq!(t.intersect(&Type::any()), Some(t));
    }

    #[test]
    fn disjoint_bases_meet_at_bottom() {
        let a = resolve(TypeExpr::int());
        let b = resolve(TypeExpr::int_list());
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    fn sign_contradiction_is_bottom() {
        let pos = resolve(TypeExpr::int().refine(Refinement::Positive));
        let neg = resolve(TypeExpr::int().refine(Refinement::Negative));
        assert_eq!(pos.intersect(&neg), None);
        let nonneg = resolve(TypeExpr::int().refine(Refinement::NonNegative));
        assert_eq!(
            nonneg.intersect(&pos).unwrap(),
            pos,
            "non-negative meets positive at positive"
        );
    }

    #[test]
    fn length_exact_conflict_is_bottom() {
        let a = resolve(TypeExpr::int_list().refine(Refinement::LengthExact(Arg::Lit(3))));
        let b = resolve(TypeExpr::int_list().refine(Refinement::LengthExact(Arg::Lit(4))));
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    fn length_exact_subsumes_length_at_least() {
        let exact = resolve(TypeExpr::int_list().refine(Refinement::LengthExact(Arg::Lit(3))));
        let min = int_list_min(2);
        let met = exact.intersect(&min).unwrap();
        assert_eq!(met, exact);
        assert_eq!(exact.intersect(&int_list_min(4)), None);
    }

    #[test]
    fn multiples_meet_at_lcm() {
        let m4 = resolve(TypeExpr::int().refine(Refinement::Multiple(Arg::Lit(4))));
        let m6 = resolve(TypeExpr::int().refine(Refinement::Multiple(Arg::Lit(6))));
        let met = m4.intersect(&m6).unwrap();
        assert!(met.inhabits(&Value::Int(12)));
        assert!(!met.inhabits(&Value::Int(4)));
    }

    #[test]
    fn odd_against_even_multiple_is_bottom() {
        let odd = resolve(TypeExpr::int().refine(Refinement::Odd));
        let m4 = resolve(TypeExpr::int().refine(Refinement::Multiple(Arg::Lit(4))));
        assert_eq!(odd.intersect(&m4), None);
    }

    #[test]
    fn range_meet_and_contradiction() {
        let a = resolve(TypeExpr::int().refine(Refinement::Between(Arg::Lit(0), Arg::Lit(10))));
        let b = resolve(TypeExpr::int().refine(Refinement::Between(Arg::Lit(5), Arg::Lit(20))));
        let met = a.intersect(&b).unwrap();
        assert!(met.inhabits(&Value::Int(7)));
        assert!(!met.inhabits(&Value::Int(12)));
        let c = resolve(TypeExpr::int().refine(Refinement::Between(Arg::Lit(11), Arg::Lit(20))));
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn positive_against_nonpositive_range_is_bottom() {
        let pos = resolve(TypeExpr::int().refine(Refinement::Positive));
        let below = resolve(TypeExpr::int().refine(Refinement::Between(Arg::Lit(-5), Arg::Lit(0))));
        assert_eq!(pos.intersect(&below), None);
    }

    #[test]
    fn intersect_is_commutative_and_idempotent() {
        let samples = vec![
            resolve(TypeExpr::int().refine(Refinement::Positive)),
            resolve(TypeExpr::int().refine(Refinement::Even)),
            resolve(TypeExpr::int().refine(Refinement::Between(Arg::Lit(-3), Arg::Lit(9)))),
            int_list_min(2),
            resolve(TypeExpr::int_list().refine(Refinement::Sorted)),
            Type::any(),
        ];
        for a in &samples {
            assert_eq!(a.intersect(a), Some(a.clone()), "idempotent: {}", a);
            for b in &samples {
                assert_eq!(a.intersect(b), b.intersect(a), "commutes: {} {}", a, b);
            }
        }
    }

    #[test]
    fn subtype_numeric_containment() {
        assert!(int_list_min(5).subtype(&int_list_min(3)));
        assert!(!int_list_min(3).subtype(&int_list_min(5)));
        let narrow = resolve(TypeExpr::int().refine(Refinement::Between(Arg::Lit(1), Arg::Lit(5))));
        let wide = resolve(TypeExpr::int().refine(Refinement::Between(Arg::Lit(0), Arg::Lit(10))));
        assert!(narrow.subtype(&wide));
        assert!(!wide.subtype(&narrow));
    }

    #[test]
    fn subtype_reflexive_and_top() {
        let t = resolve(
            TypeExpr::int_list()
                .refine(Refinement::Positive)
                .refine(Refinement::Sorted),
        );
        assert!(t.subtype(&t));
        assert!(t.subtype(&Type::any()));
        assert!(!Type::any().subtype(&t));
    }

    #[test]
    fn subtype_derives_sign_from_range() {
        let narrow = resolve(TypeExpr::int().refine(Refinement::Between(Arg::Lit(1), Arg::Lit(5))));
        let pos = resolve(TypeExpr::int().refine(Refinement::Positive));
        assert!(narrow.subtype(&pos));
    }

    #[test]
    fn inhabits_checks_every_tag() {
        let t = resolve(
            TypeExpr::int_list()
                .refine(Refinement::Positive)
                .refine(Refinement::LengthAtLeast(Arg::Lit(2)))
                .refine(Refinement::Sorted),
        );
        assert!(t.inhabits(&Value::List(vec![1, 2, 9])));
        assert!(!t.inhabits(&Value::List(vec![1])));
        assert!(!t.inhabits(&Value::List(vec![2, 1, 3])));
        assert!(!t.inhabits(&Value::List(vec![0, 1, 2])));
        assert!(!t.inhabits(&Value::Int(3)));
    }

    #[test]
    fn divisor_membership() {
        let t = resolve(TypeExpr::int().refine(Refinement::Divisor(Arg::Lit(12))));
        assert!(t.inhabits(&Value::Int(4)));
        assert!(t.inhabits(&Value::Int(-6)));
        assert!(!t.inhabits(&Value::Int(5)));
        assert!(!t.inhabits(&Value::Int(0)));
    }

    #[test]
    fn symbolic_args_substitute_or_drop() {
        let expr = TypeExpr::int_list().refine(Refinement::LengthAtLeast(Arg::K));
        let bound = expr.resolve(&Params::with_k(3)).unwrap();
        assert_eq!(bound.len_lower_bound(), 3);
        let unbound = expr.resolve(&Params::none()).unwrap();
        assert_eq!(unbound.len_lower_bound(), 0);
    }

    #[test]
    fn same_length_lowers_to_exact_or_bound() {
        let out = TypeExpr::int_list().refine(Refinement::SameLength);
        let known = resolve(TypeExpr::int_list().refine(Refinement::LengthExact(Arg::Lit(4))));
        let lowered = out.resolve_output(&known, &Params::none()).unwrap();
        assert_eq!(lowered.len_exact(), Some(4));
        let bounded = int_list_min(2);
        let lowered = out.resolve_output(&bounded, &Params::none()).unwrap();
        assert_eq!(lowered.len_exact(), None);
        assert_eq!(lowered.len_lower_bound(), 2);
    }

    #[test]
    fn element_propagates_elementwise_refinements() {
        let input = resolve(
            TypeExpr::int_list()
                .refine(Refinement::Positive)
                .refine(Refinement::Even),
        );
        let out = TypeExpr::int().refine(Refinement::Element);
        let lowered = out.resolve_output(&input, &Params::none()).unwrap();
        assert!(lowered.inhabits(&Value::Int(4)));
        assert!(!lowered.inhabits(&Value::Int(3)));
        assert!(!lowered.inhabits(&Value::Int(-2)));
    }

    #[test]
    fn output_only_tag_rejected_on_input() {
        let expr = TypeExpr::int_list().refine(Refinement::SameLength);
        assert_eq!(expr.resolve(&Params::none()), Err(TypeError::OutputOnly));
    }

    #[test]
    fn introduce_replaces_any() {
        let req = int_list_min(3);
        assert_eq!(Type::any().introduce(&req), Some(req.clone()));
        let narrowed = int_list_min(5).introduce(&req).unwrap();
        assert_eq!(narrowed.len_lower_bound(), 5);
    }
}
