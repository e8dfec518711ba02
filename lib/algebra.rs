//! Canonical expansion of operator expressions.
//!
//! An expression expands into a linear combination of [`Word`]s with
//! [`Scalar`] coefficients. A word is an ordered product of finite operators
//! followed by a normal-ordered product of boson operators. Expansion
//! distributes products over sums, commutes finite operators on different
//! subspaces into subspace-name order, normal-orders bosons with
//! `a a† = a† a + 1` and collects like terms.

use std::{ collections::BTreeMap, fmt, rc::Rc };
use indexmap::IndexMap;
use itertools::Itertools;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{ One, ToPrimitive, Zero };
use crate::{
    config::TermBudget,
    error::{ Error, Result },
    expr::{ BosonOperator, Expr, FiniteOperator, Ladder },
    scalar::{ self, Coeff, Scalar },
};

fn factorial(n: u32) -> BigInt {
    (1..=n).fold(BigInt::one(), |acc, k| acc * BigInt::from(k))
}

fn binom(n: u32, k: u32) -> BigInt {
    if k > n { return BigInt::from(0); }
    (0..k).fold(BigInt::one(), |acc, j| acc * BigInt::from(n - j) / BigInt::from(j + 1))
}

/* Boson words ****************************************************************/

/// A normal-ordered product of boson operators, stored as per-mode
/// `(creations, annihilations)` counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BosonWord(BTreeMap<Rc<str>, (u32, u32)>);

impl BosonWord {
    /// The empty word, `1`.
    pub fn empty() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn from_op(op: &BosonOperator) -> Self {
        let counts = match op.ladder() {
            Ladder::Creation => (1, 0),
            Ladder::Annihilation => (0, 1),
        };
        Self([(op.mode_rc().clone(), counts)].into_iter().collect())
    }

    /// Build a word from `(mode, creations, annihilations)` triples.
    pub fn from_counts<'a, I>(counts: I) -> Self
    where I: IntoIterator<Item = (&'a str, u32, u32)>
    {
        let mut acc: BTreeMap<Rc<str>, (u32, u32)> = BTreeMap::new();
        for (mode, c, a) in counts.into_iter() {
            let entry = acc.entry(mode.into()).or_insert((0, 0));
            entry.0 += c;
            entry.1 += a;
        }
        acc.retain(|_, ca| *ca != (0, 0));
        Self(acc)
    }

    /// Iterate over `(mode, creations, annihilations)` in mode order.
    pub fn counts(&self) -> impl Iterator<Item = (&str, u32, u32)> + '_ {
        self.0.iter().map(|(m, (c, a))| (m.as_ref(), *c, *a))
    }

    /// Return `true` if every mode has as many creations as annihilations.
    pub fn is_balanced(&self) -> bool {
        self.0.values().all(|(c, a)| c == a)
    }

    /// Return the individual ladder operators, creations before
    /// annihilations within each mode.
    pub fn operators(&self) -> Vec<BosonOperator> {
        self.0.iter()
            .flat_map(|(m, (c, a))| {
                std::iter::repeat(Ladder::Creation).take(*c as usize)
                    .chain(std::iter::repeat(Ladder::Annihilation).take(*a as usize))
                    .map(move |ladder| BosonOperator::new(m, ladder))
            })
            .collect()
    }

    /// The word as a product expression.
    pub fn to_expr(&self) -> Expr {
        Expr::product(self.operators().into_iter().map(Expr::Boson))
    }

    /// Normal-ordered product `self · rhs` as a list of integer-weighted
    /// words.
    ///
    /// Within a mode, `a^q a†^r = Σ_j j! C(q, j) C(r, j) a†^(r-j) a^(q-j)`.
    pub fn mul(&self, rhs: &Self) -> Vec<(BigInt, Self)> {
        let modes: Vec<&Rc<str>>
            = self.0.keys().merge(rhs.0.keys()).dedup().collect();
        if modes.is_empty() { return vec![(BigInt::one(), Self::empty())]; }
        let per_mode: Vec<Vec<(BigInt, (u32, u32))>>
            = modes.iter()
            .map(|m| {
                let (p, q) = self.0.get(*m).copied().unwrap_or((0, 0));
                let (r, s) = rhs.0.get(*m).copied().unwrap_or((0, 0));
                (0..=q.min(r))
                    .map(|j| {
                        let c = factorial(j) * binom(q, j) * binom(r, j);
                        (c, (p + r - j, q + s - j))
                    })
                    .collect()
            })
            .collect();
        per_mode.iter()
            .map(|choices| choices.iter())
            .multi_cartesian_product()
            .map(|choice| {
                let mut coeff = BigInt::one();
                let mut word: BTreeMap<Rc<str>, (u32, u32)> = BTreeMap::new();
                for (m, (c, counts)) in modes.iter().zip(choice) {
                    coeff *= c;
                    if *counts != (0, 0) { word.insert((*m).clone(), *counts); }
                }
                (coeff, Self(word))
            })
            .collect()
    }
}

impl fmt::Display for BosonWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() { return write!(f, "1"); }
        let s = self.0.iter()
            .flat_map(|(m, (c, a))| {
                let cr = match *c {
                    0 => None,
                    1 => Some(format!("{m}†")),
                    n => Some(format!("{m}†^{n}")),
                };
                let an = match *a {
                    0 => None,
                    1 => Some(format!("{m}")),
                    n => Some(format!("{m}^{n}")),
                };
                cr.into_iter().chain(an)
            })
            .join("*");
        write!(f, "{s}")
    }
}

/* Words **********************************************************************/

/// An ordered product of finite operators times a boson word.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Word {
    pub finite: Vec<FiniteOperator>,
    pub bosons: BosonWord,
}

impl Word {
    pub fn one() -> Self { Self::default() }

    pub fn from_finite(op: FiniteOperator) -> Self {
        Self { finite: vec![op], bosons: BosonWord::empty() }
    }

    pub fn from_boson(op: &BosonOperator) -> Self {
        Self { finite: Vec::new(), bosons: BosonWord::from_op(op) }
    }

    pub fn is_one(&self) -> bool { self.finite.is_empty() && self.bosons.is_empty() }

    /// Commute operators on distinct, non-composite subspaces into
    /// subspace-name order. Operators sharing a subspace keep their relative
    /// order.
    fn sort_finite(ops: &mut [FiniteOperator]) {
        let mut swapped = true;
        while swapped {
            swapped = false;
            for k in 1..ops.len() {
                let (a, b) = (ops[k - 1].subspace(), ops[k].subspace());
                if a.commutes_with(b) && a.name() > b.name() {
                    ops.swap(k - 1, k);
                    swapped = true;
                }
            }
        }
    }

    pub fn mul(&self, rhs: &Self) -> Vec<(BigInt, Self)> {
        let mut finite: Vec<FiniteOperator>
            = self.finite.iter().chain(rhs.finite.iter()).cloned().collect();
        Self::sort_finite(&mut finite);
        self.bosons.mul(&rhs.bosons).into_iter()
            .map(|(c, bosons)| (c, Self { finite: finite.clone(), bosons }))
            .collect()
    }
}

/* Canonical sums *************************************************************/

/// A collected linear combination of [`Word`]s.
#[derive(Clone, Debug)]
pub struct Canonical {
    terms: IndexMap<Word, Scalar>,
    budget: TermBudget,
}

impl Canonical {
    pub fn zero(budget: TermBudget) -> Self {
        Self { terms: IndexMap::new(), budget }
    }

    pub fn from_term(word: Word, coeff: Scalar, budget: TermBudget) -> Self {
        let mut acc = Self::zero(budget);
        acc.terms.insert(word, coeff);
        acc.terms.retain(|_, c| !c.is_zero());
        acc
    }

    pub fn is_zero(&self) -> bool { self.terms.is_empty() }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&Word, &Scalar)> + '_ {
        self.terms.iter()
    }

    pub(crate) fn add_term(&mut self, word: Word, coeff: Scalar) -> Result<()> {
        if coeff.is_zero() { return Ok(()); }
        let Some(c) = self.terms.get(&word) else {
            self.terms.insert(word, coeff);
            return self.budget.check(self.terms.len());
        };
        let sum = c + &coeff;
        if sum.is_zero() {
            self.terms.shift_remove(&word);
        } else {
            self.terms.insert(word, sum);
        }
        Ok(())
    }

    pub fn add(mut self, rhs: Self) -> Result<Self> {
        for (w, c) in rhs.terms.into_iter() { self.add_term(w, c)?; }
        Ok(self)
    }

    pub fn scale(&self, s: &Scalar) -> Self {
        if s.is_zero() { return Self::zero(self.budget); }
        Self {
            terms: self.terms.iter().map(|(w, c)| (w.clone(), c * s)).collect(),
            budget: self.budget,
        }
    }

    pub fn mul(&self, rhs: &Self) -> Result<Self> {
        let mut acc = Self::zero(self.budget);
        for ((w1, c1), (w2, c2)) in self.terms.iter().cartesian_product(rhs.terms.iter()) {
            let c12 = c1 * c2;
            for (k, w) in w1.mul(w2).into_iter() {
                let ck = if k.is_one() {
                    c12.clone()
                } else {
                    &c12 * &Scalar::from(Coeff::new(BigRational::from_integer(k), BigRational::zero()))
                };
                acc.add_term(w, ck)?;
            }
        }
        Ok(acc)
    }

    /// Ordered factor lists of every term.
    ///
    /// Each numerator monomial of a coefficient becomes its own term, with
    /// factors ordered as: numeric coefficient (omitted when 1), symbols,
    /// reciprocal denominator (omitted when 1), finite operators, bosons.
    pub fn term_factors(&self) -> Vec<Vec<Expr>> {
        let mut acc: Vec<Vec<Expr>> = Vec::new();
        for (word, coeff) in self.terms.iter() {
            let den = coeff.denom();
            for (m, c) in coeff.numer().terms() {
                let mut factors: Vec<Expr> = Vec::new();
                if !c.is_one() { factors.push(Expr::Number(c.clone())); }
                for (s, e) in m.iter() {
                    (0..e).for_each(|_| factors.push(Expr::Symbol(s.clone())));
                }
                if !den.is_one() {
                    factors.push(Expr::Fraction(Scalar::reciprocal_of(den)));
                }
                factors.extend(word.finite.iter().cloned().map(Expr::Finite));
                factors.extend(word.bosons.operators().into_iter().map(Expr::Boson));
                if factors.is_empty() { factors.push(Expr::one()); }
                acc.push(factors);
            }
        }
        acc
    }

    pub fn into_expr(self) -> Expr { self.to_expr() }

    pub fn to_expr(&self) -> Expr {
        Expr::sum(self.term_factors().into_iter().map(Expr::product))
    }
}

/// Return the exponent of a power if it is a non-negative integer.
pub fn power_exponent(exponent: &Expr) -> Result<u32> {
    let n = match exponent {
        Expr::Number(c) => scalar::coeff_as_integer(c).and_then(|n| n.to_u32()),
        _ => None,
    };
    n.ok_or_else(|| {
        Error::UnsupportedOperation(
            format!("exponent `{exponent}` is not a non-negative integer"))
    })
}

/// Expand `expr` into canonical form.
pub fn expand(expr: &Expr, budget: TermBudget) -> Result<Canonical> {
    match expr {
        Expr::Number(c)
            => Ok(Canonical::from_term(Word::one(), Scalar::from(c.clone()), budget)),
        Expr::Symbol(s)
            => Ok(Canonical::from_term(Word::one(), Scalar::symbol(s.clone()), budget)),
        Expr::Fraction(s)
            => Ok(Canonical::from_term(Word::one(), s.clone(), budget)),
        Expr::Finite(op)
            => Ok(Canonical::from_term(Word::from_finite(op.clone()), Scalar::one(), budget)),
        Expr::Boson(op)
            => Ok(Canonical::from_term(Word::from_boson(op), Scalar::one(), budget)),
        Expr::Sum(terms) => {
            terms.iter()
                .try_fold(Canonical::zero(budget), |acc, t| acc.add(expand(t, budget)?))
        },
        Expr::Product(factors) => {
            let one = Canonical::from_term(Word::one(), Scalar::one(), budget);
            factors.iter()
                .try_fold(one, |acc, f| acc.mul(&expand(f, budget)?))
        },
        Expr::Power(base, exponent) => {
            let n = power_exponent(exponent)?;
            let b = expand(base, budget)?;
            let one = Canonical::from_term(Word::one(), Scalar::one(), budget);
            (0..n).try_fold(one, |acc, _| acc.mul(&b))
        },
        Expr::Commutator(a, b) => {
            let a = expand(a, budget)?;
            let b = expand(b, budget)?;
            a.mul(&b)?.add(b.mul(&a)?.scale(&Scalar::from_int(-1)))
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ hilbert::SubSpace, nd_utils::from_ints };

    fn canon(e: &Expr) -> Canonical { expand(e, TermBudget::default()).unwrap() }

    #[test]
    fn normal_ordering() {
        let a = Expr::annihilate("a");
        let ad = Expr::create("a");
        let lhs = a.clone() * ad.clone();
        let rhs = ad.clone() * a.clone() + Expr::one();
        assert!(lhs.equiv(&rhs).unwrap());
        assert!(Expr::commutator(a.clone(), ad.clone()).equiv(&Expr::one()).unwrap());

        // a^2 a†^2 = a†^2 a^2 + 4 a† a + 2
        let lhs = Expr::pow(a.clone(), 2) * Expr::pow(ad.clone(), 2);
        let rhs = Expr::product([ad.clone(), ad.clone(), a.clone(), a.clone()])
            + Expr::int(4) * ad.clone() * a.clone()
            + Expr::int(2);
        assert!(lhs.equiv(&rhs).unwrap());
    }

    #[test]
    fn modes_commute() {
        let a = Expr::annihilate("a");
        let bd = Expr::create("b");
        assert!(Expr::commutator(a, bd).vanishes().unwrap());
    }

    #[test]
    fn finite_ordering() {
        let sx = SubSpace::new("x", 2);
        let sy = SubSpace::new("y", 2);
        let x = from_ints([[0, 1], [1, 0]]);
        let opx = Expr::finite("X", &sx, x.clone());
        let opy = Expr::finite("Y", &sy, x.clone());
        let opx2 = Expr::finite("Z", &sx, from_ints([[1, 0], [0, -1]]));
        assert!(Expr::commutator(opx.clone(), opy.clone()).vanishes().unwrap());
        // same-subspace operators are never reordered
        assert!(!Expr::commutator(opx.clone(), opx2.clone()).vanishes().unwrap());
        let c = canon(&(opy.clone() * opx.clone()));
        let (word, _) = c.iter().next().unwrap();
        assert_eq!(word.finite[0].name(), "X");
        assert_eq!(word.finite[1].name(), "Y");
    }

    #[test]
    fn factor_order() {
        let sx = SubSpace::new("x", 2);
        let opx = Expr::finite("X", &sx, from_ints([[0, 1], [1, 0]]));
        let g = Expr::symbol("g", 1);
        let e = Expr::annihilate("a") * opx.clone() * g.clone() * Expr::int(3) * g.clone();
        let factors = canon(&e).term_factors();
        assert_eq!(factors.len(), 1);
        assert_eq!(
            factors[0],
            vec![Expr::int(3), g.clone(), g.clone(), opx, Expr::annihilate("a")],
        );
    }

    #[test]
    fn unsupported_exponent() {
        let e = Expr::power(Expr::create("a"), Expr::rational(1, 2));
        assert!(matches!(
            expand(&e, TermBudget::default()),
            Err(Error::UnsupportedOperation(_))
        ));
        let e = Expr::power(Expr::create("a"), Expr::int(-1));
        assert!(matches!(
            expand(&e, TermBudget::default()),
            Err(Error::UnsupportedOperation(_))
        ));
        assert!(Expr::pow(Expr::create("a"), 0).equiv(&Expr::one()).unwrap());
    }

    #[test]
    fn budget_exceeded() {
        let modes = ["a", "b", "c", "d"];
        let e = Expr::product(
            modes.iter().map(|m| Expr::create(m) + Expr::annihilate(m)));
        assert!(matches!(
            expand(&e, TermBudget::new(8)),
            Err(Error::BudgetExceeded { limit: 8, .. })
        ));
        assert_eq!(canon(&e).len(), 16);
    }

    #[test]
    fn word_display() {
        let w = BosonWord::from_counts([("a", 2, 1), ("b", 0, 1)]);
        assert_eq!(w.to_string(), "a†^2*a*b");
        assert!(!w.is_balanced());
        assert_eq!(BosonWord::empty().to_string(), "1");
    }
}
