//! Exact scalars: complex rationals, sparse polynomials in perturbative
//! symbols, and rational functions of those polynomials.
//!
//! Matrix entries, term coefficients and solutions to the generator equations
//! all live in the field of [`Scalar`]s.

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt,
    ops::{ Add, Mul, Neg, Sub },
    rc::Rc,
};
use indexmap::IndexMap;
use itertools::Itertools;
use num_bigint::BigInt;
use num_complex::Complex;
use num_rational::BigRational;
use num_traits::{ One, Signed, Zero };

/// Exact complex-rational number.
pub type Coeff = Complex<BigRational>;

/// Create a real integer [`Coeff`].
pub fn coeff_int(n: i64) -> Coeff {
    Complex::new(BigRational::from_integer(BigInt::from(n)), BigRational::zero())
}

/// Create a real rational [`Coeff`] `n / d`.
///
/// *Panics* if `d == 0`.
pub fn coeff_ratio(n: i64, d: i64) -> Coeff {
    Complex::new(
        BigRational::new(BigInt::from(n), BigInt::from(d)),
        BigRational::zero(),
    )
}

/// Create a purely imaginary integer [`Coeff`].
pub fn coeff_imag(n: i64) -> Coeff {
    Complex::new(BigRational::zero(), BigRational::from_integer(BigInt::from(n)))
}

/// Return `Some(n)` if `c` is a real integer.
pub(crate) fn coeff_as_integer(c: &Coeff) -> Option<BigInt> {
    (c.im.is_zero() && c.re.is_integer()).then(|| c.re.to_integer())
}

pub(crate) fn fmt_coeff(c: &Coeff, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match (c.re.is_zero(), c.im.is_zero()) {
        (_, true) => write!(f, "{}", c.re),
        (true, false) => write!(f, "{}i", c.im),
        (false, false) if c.im.is_negative() =>
            write!(f, "({} - {}i)", c.re, -c.im.clone()),
        (false, false) => write!(f, "({} + {}i)", c.re, c.im),
    }
}

/* Symbols ********************************************************************/

/// A commutative perturbative parameter carrying a non-negative order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    name: Rc<str>,
    order: u32,
}

impl Symbol {
    /// Create a new symbol of a given perturbative order.
    pub fn new(name: &str, order: u32) -> Self {
        Self { name: name.into(), order }
    }

    /// Return the name of the symbol.
    pub fn name(&self) -> &str { &self.name }

    /// Return the perturbative order of the symbol.
    pub fn order(&self) -> u32 { self.order }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A product of symbols raised to positive powers.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Monomial(BTreeMap<Symbol, u32>);

impl Monomial {
    /// The empty product.
    pub fn one() -> Self { Self::default() }

    /// A single symbol.
    pub fn var(s: Symbol) -> Self { Self([(s, 1)].into_iter().collect()) }

    /// Return `true` if `self` is the empty product.
    pub fn is_one(&self) -> bool { self.0.is_empty() }

    /// Iterate over `(symbol, exponent)` pairs in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, u32)> + '_ {
        self.0.iter().map(|(s, e)| (s, *e))
    }

    /// Return the exponent of a symbol.
    pub fn degree_in(&self, s: &Symbol) -> u32 {
        self.0.get(s).copied().unwrap_or(0)
    }

    /// Return the total perturbative order, i.e. the sum of symbol orders
    /// weighted by their exponents.
    pub fn order(&self) -> u32 {
        self.0.iter().map(|(s, e)| s.order * e).sum()
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        let mut acc = self.0.clone();
        rhs.0.iter()
            .for_each(|(s, e)| { *acc.entry(s.clone()).or_insert(0) += e; });
        Self(acc)
    }

    /// Exact division, if `rhs` divides `self`.
    pub fn div(&self, rhs: &Self) -> Option<Self> {
        let mut acc = self.0.clone();
        for (s, e) in rhs.0.iter() {
            let have = acc.get_mut(s)?;
            match (*have).cmp(e) {
                Ordering::Less => { return None; },
                Ordering::Equal => { acc.remove(s); },
                Ordering::Greater => { *have -= e; },
            }
        }
        Some(Self(acc))
    }

    /// Greatest common divisor.
    pub fn gcd(&self, rhs: &Self) -> Self {
        Self(
            self.0.iter()
                .filter_map(|(s, e)| rhs.0.get(s).map(|f| (s.clone(), *e.min(f))))
                .collect()
        )
    }

    /// Remove a symbol entirely, returning its exponent alongside the rest.
    pub(crate) fn split_off(&self, s: &Symbol) -> (u32, Self) {
        let mut rest = self.0.clone();
        let e = rest.remove(s).unwrap_or(0);
        (e, Self(rest))
    }

    /// Lexicographic monomial order, with symbols earlier in [`Symbol`] order
    /// being more significant.
    pub fn lex_cmp(&self, rhs: &Self) -> Ordering {
        self.0.keys().merge(rhs.0.keys()).dedup()
            .map(|s| self.degree_in(s).cmp(&rhs.degree_in(s)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.iter()
            .map(|(s, e)| if *e == 1 { s.to_string() } else { format!("{s}^{e}") })
            .join("*");
        write!(f, "{s}")
    }
}

/* Polynomials ****************************************************************/

/// A sparse multivariate polynomial over [`Coeff`].
///
/// No stored coefficient is zero, so structural equality is equality of
/// polynomials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Poly {
    terms: BTreeMap<Monomial, Coeff>,
}

impl Poly {
    pub fn zero() -> Self { Self::default() }

    pub fn one() -> Self { Self::constant(Coeff::one()) }

    pub fn constant(c: Coeff) -> Self { Self::term(Monomial::one(), c) }

    pub fn term(m: Monomial, c: Coeff) -> Self {
        let mut terms = BTreeMap::new();
        if !c.is_zero() { terms.insert(m, c); }
        Self { terms }
    }

    pub fn symbol(s: Symbol) -> Self { Self::term(Monomial::var(s), Coeff::one()) }

    pub fn is_zero(&self) -> bool { self.terms.is_empty() }

    /// Return the constant value of `self` if it has no symbols.
    pub fn as_constant(&self) -> Option<Coeff> {
        match self.terms.len() {
            0 => Some(Coeff::zero()),
            1 => self.terms.get(&Monomial::one()).cloned(),
            _ => None,
        }
    }

    pub fn is_one(&self) -> bool {
        self.as_constant().is_some_and(|c| c.is_one())
    }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    /// Iterate over `(monomial, coefficient)` pairs.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &Coeff)> + '_ {
        self.terms.iter()
    }

    fn add_term(&mut self, m: Monomial, c: Coeff) {
        if c.is_zero() { return; }
        let sum = self.terms.get(&m).map(|d| d + &c).unwrap_or(c);
        if sum.is_zero() {
            self.terms.remove(&m);
        } else {
            self.terms.insert(m, sum);
        }
    }

    pub fn scale(&self, c: &Coeff) -> Self {
        if c.is_zero() { return Self::zero(); }
        Self { terms: self.terms.iter().map(|(m, d)| (m.clone(), d * c)).collect() }
    }

    /// Return the leading term under [`Monomial::lex_cmp`].
    pub fn leading(&self) -> Option<(&Monomial, &Coeff)> {
        self.terms.iter().max_by(|(a, _), (b, _)| a.lex_cmp(b))
    }

    /// Greatest common monomial divisor of all terms.
    pub fn content(&self) -> Monomial {
        let mut iter = self.terms.keys();
        let Some(first) = iter.next() else { return Monomial::one(); };
        iter.fold(first.clone(), |acc, m| acc.gcd(m))
    }

    /// Exact division, if `rhs` divides `self`.
    pub fn div_exact(&self, rhs: &Self) -> Option<Self> {
        let (lm, lc) = rhs.leading()?;
        let mut rem = self.clone();
        let mut quo = Self::zero();
        while let Some((rm, rc)) = rem.leading() {
            let q = Self::term(rm.div(lm)?, rc / lc);
            rem = &rem - &(&q * rhs);
            quo = &quo + &q;
        }
        Some(quo)
    }

    /// Return `true` if any monomial contains `s`.
    pub fn contains(&self, s: &Symbol) -> bool {
        self.terms.keys().any(|m| m.degree_in(s) > 0)
    }

    /// Return the perturbative order of every monomial if they all agree.
    pub fn homogeneous_order(&self) -> Option<u32> {
        let mut orders = self.terms.keys().map(Monomial::order);
        let first = orders.next()?;
        orders.all(|o| o == first).then_some(first)
    }

    /// Replace symbols by scalars.
    ///
    /// Symbols missing from `values` are kept as they are.
    pub fn subst(&self, values: &IndexMap<Symbol, Scalar>) -> Scalar {
        self.terms.iter()
            .map(|(m, c)| {
                m.iter()
                    .fold(Scalar::from(c.clone()), |acc, (s, e)| {
                        let base
                            = values.get(s).cloned()
                            .unwrap_or_else(|| Scalar::symbol(s.clone()));
                        &acc * &base.pow(e)
                    })
            })
            .fold(Scalar::zero(), |acc, t| &acc + &t)
    }
}

/* Polynomial gcd *************************************************************/

impl Poly {
    /// Return the earliest symbol, in [`Symbol`] order, appearing in `self`.
    fn first_symbol(&self) -> Option<&Symbol> {
        self.terms.keys().filter_map(|m| m.0.keys().next()).min()
    }

    /// Return the degree of `self` in a symbol.
    pub fn degree(&self, s: &Symbol) -> u32 {
        self.terms.keys().map(|m| m.degree_in(s)).max().unwrap_or(0)
    }

    /// Coefficients of `self` viewed as a univariate polynomial in `s`,
    /// indexed by power.
    fn coeffs_in(&self, s: &Symbol) -> Vec<Poly> {
        let mut coeffs = vec![Poly::zero(); self.degree(s) as usize + 1];
        for (m, c) in self.terms.iter() {
            let (e, rest) = m.split_off(s);
            coeffs[e as usize].add_term(rest, c.clone());
        }
        coeffs
    }

    fn lead_in(&self, s: &Symbol) -> Poly {
        self.coeffs_in(s).pop().unwrap_or_default()
    }

    /// Multiply by `s^e`.
    fn shift(&self, s: &Symbol, e: u32) -> Poly {
        if e == 0 { return self.clone(); }
        let m = Monomial([(s.clone(), e)].into_iter().collect());
        Self { terms: self.terms.iter().map(|(n, c)| (n.mul(&m), c.clone())).collect() }
    }

    /// Pseudo-remainder of `self` by `rhs` as univariate polynomials in `s`.
    ///
    /// `rhs` must have positive degree in `s`.
    fn pseudo_rem(&self, rhs: &Self, s: &Symbol) -> Poly {
        let db = rhs.degree(s);
        let lb = rhs.lead_in(s);
        let mut r = self.clone();
        while !r.is_zero() && r.degree(s) >= db {
            let dr = r.degree(s);
            let lr = r.lead_in(s);
            r = &(&lb * &r) - &(&lr * &rhs.shift(s, dr - db));
        }
        r
    }

    /// Greatest common divisor of the coefficients of `self` in `s`.
    fn content_in(&self, s: &Symbol) -> Poly {
        let mut acc = Poly::zero();
        for c in self.coeffs_in(s).iter().filter(|c| !c.is_zero()) {
            acc = acc.gcd(c);
            if acc.is_one() { break; }
        }
        acc
    }

    /// Rescale so that the leading coefficient is 1.
    pub fn monic(&self) -> Poly {
        match self.leading() {
            Some((_, c)) => self.scale(&c.inv()),
            None => Poly::zero(),
        }
    }

    /// Monic greatest common divisor.
    ///
    /// Works recursively on the earliest symbol: contents are split off and
    /// the primitive parts are reduced through a primitive pseudo-remainder
    /// sequence. `gcd(0, 0) == 0`.
    pub fn gcd(&self, rhs: &Self) -> Poly {
        if self.is_zero() { return rhs.monic(); }
        if rhs.is_zero() { return self.monic(); }
        if self.as_constant().is_some() || rhs.as_constant().is_some() {
            return Poly::one();
        }
        // divisors of a monomial are monomials
        if self.len() == 1 || rhs.len() == 1 {
            return Poly::term(self.content().gcd(&rhs.content()), Coeff::one());
        }
        let x: Symbol
            = match (self.first_symbol(), rhs.first_symbol()) {
                (Some(a), Some(b)) => a.min(b).clone(),
                _ => { return Poly::one(); },
            };
        if !self.contains(&x) { return self.gcd(&rhs.content_in(&x)); }
        if !rhs.contains(&x) { return self.content_in(&x).gcd(rhs); }

        let ca = self.content_in(&x);
        let cb = rhs.content_in(&x);
        let c = ca.gcd(&cb);
        let (Some(mut a), Some(mut b)) = (self.div_exact(&ca), rhs.div_exact(&cb))
            else { return c; };
        if a.degree(&x) < b.degree(&x) { std::mem::swap(&mut a, &mut b); }
        let g = loop {
            let r = a.pseudo_rem(&b, &x);
            if r.is_zero() { break b; }
            if r.degree(&x) == 0 { break Poly::one(); }
            let cr = r.content_in(&x);
            a = b;
            b = r.div_exact(&cr).unwrap_or(r);
        };
        (&c * &g).monic()
    }
}

impl<'a> Add<&'a Poly> for &'a Poly {
    type Output = Poly;

    fn add(self, rhs: &'a Poly) -> Poly {
        let mut acc = self.clone();
        rhs.terms.iter().for_each(|(m, c)| acc.add_term(m.clone(), c.clone()));
        acc
    }
}

impl<'a> Sub<&'a Poly> for &'a Poly {
    type Output = Poly;

    fn sub(self, rhs: &'a Poly) -> Poly {
        let mut acc = self.clone();
        rhs.terms.iter().for_each(|(m, c)| acc.add_term(m.clone(), -c.clone()));
        acc
    }
}

impl<'a> Mul<&'a Poly> for &'a Poly {
    type Output = Poly;

    fn mul(self, rhs: &'a Poly) -> Poly {
        let mut acc = Poly::zero();
        self.terms.iter().cartesian_product(rhs.terms.iter())
            .for_each(|((m1, c1), (m2, c2))| acc.add_term(m1.mul(m2), c1 * c2));
        acc
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        Poly { terms: self.terms.iter().map(|(m, c)| (m.clone(), -c.clone())).collect() }
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() { return write!(f, "0"); }
        for (k, (m, c)) in self.terms.iter().enumerate() {
            if k > 0 { write!(f, " + ")?; }
            match (m.is_one(), c.is_one()) {
                (true, _) => fmt_coeff(c, f)?,
                (false, true) => write!(f, "{m}")?,
                (false, false) => {
                    fmt_coeff(c, f)?;
                    write!(f, "*{m}")?;
                },
            }
        }
        Ok(())
    }
}

/* Rational functions *********************************************************/

/// A rational function `num / den` of perturbative symbols.
///
/// Numerator and denominator are kept coprime, with the denominator monic
/// (unit leading coefficient). Equality is equality of
/// rational functions, i.e. `a/b == c/d` iff `a*d == b*c`.
#[derive(Clone, Debug)]
pub struct Scalar {
    num: Poly,
    den: Poly,
}

impl Scalar {
    pub fn zero() -> Self { Self { num: Poly::zero(), den: Poly::one() } }

    pub fn one() -> Self { Self { num: Poly::one(), den: Poly::one() } }

    pub fn symbol(s: Symbol) -> Self { Self { num: Poly::symbol(s), den: Poly::one() } }

    pub fn from_int(n: i64) -> Self { Self::from(coeff_int(n)) }

    pub fn from_poly(p: Poly) -> Self { Self { num: p, den: Poly::one() } }

    /// Create `num / den`, returning `None` if `den` is zero.
    pub fn ratio(num: Poly, den: Poly) -> Option<Self> {
        (!den.is_zero()).then(|| Self::normalized(num, den))
    }

    /// Create `1 / den` for an already-normalized denominator.
    pub(crate) fn reciprocal_of(den: &Poly) -> Self {
        Self { num: Poly::one(), den: den.clone() }
    }

    /// Cancel the gcd of `num` and `den` and make `den` monic.
    fn normalized(num: Poly, den: Poly) -> Self {
        if num.is_zero() { return Self::zero(); }
        if let Some(c) = den.as_constant() {
            return Self { num: num.scale(&c.inv()), den: Poly::one() };
        }
        let g = num.gcd(&den);
        let (num, den)
            = if g.is_one() {
                (num, den)
            } else {
                match (num.div_exact(&g), den.div_exact(&g)) {
                    (Some(n), Some(d)) => (n, d),
                    _ => (num, den),
                }
            };
        if let Some(c) = den.as_constant() {
            return Self { num: num.scale(&c.inv()), den: Poly::one() };
        }
        let lc = den.leading().map(|(_, c)| c.inv()).unwrap_or_else(Coeff::one);
        Self { num: num.scale(&lc), den: den.scale(&lc) }
    }

    pub fn numer(&self) -> &Poly { &self.num }

    pub fn denom(&self) -> &Poly { &self.den }

    pub fn is_zero(&self) -> bool { self.num.is_zero() }

    pub fn is_one(&self) -> bool { self.den.is_one() && self.num.is_one() }

    /// Return the numeric value of `self` if it has no symbols.
    pub fn as_constant(&self) -> Option<Coeff> {
        if self.den.is_one() { self.num.as_constant() } else { None }
    }

    pub fn pow(&self, e: u32) -> Self {
        (0..e).fold(Self::one(), |acc, _| &acc * self)
    }

    /// Multiplicative inverse, if `self` is non-zero.
    pub fn recip(&self) -> Option<Self> {
        Self::ratio(self.den.clone(), self.num.clone())
    }

    pub fn checked_div(&self, rhs: &Self) -> Option<Self> {
        rhs.recip().map(|r| self * &r)
    }

    /// Return `true` if `s` appears in either numerator or denominator.
    pub fn contains(&self, s: &Symbol) -> bool {
        self.num.contains(s) || self.den.contains(s)
    }

    /// Perturbative order `order(num) - order(den)`, if both are homogeneous.
    ///
    /// Zero has order zero.
    pub fn order(&self) -> Option<i64> {
        if self.is_zero() { return Some(0); }
        let n = self.num.homogeneous_order()?;
        let d = self.den.homogeneous_order()?;
        Some(i64::from(n) - i64::from(d))
    }

    /// Replace symbols by scalars, returning `None` if the denominator
    /// vanishes.
    pub fn subst(&self, values: &IndexMap<Symbol, Scalar>) -> Option<Self> {
        self.num.subst(values).checked_div(&self.den.subst(values))
    }
}

impl PartialEq for Scalar {
    fn eq(&self, rhs: &Self) -> bool {
        if self.den == rhs.den { return self.num == rhs.num; }
        &self.num * &rhs.den == &rhs.num * &self.den
    }
}

impl Eq for Scalar { }

impl Default for Scalar {
    fn default() -> Self { Self::zero() }
}

impl From<Coeff> for Scalar {
    fn from(c: Coeff) -> Self { Self { num: Poly::constant(c), den: Poly::one() } }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self { Self::from_int(n) }
}

impl From<Symbol> for Scalar {
    fn from(s: Symbol) -> Self { Self::symbol(s) }
}

impl<'a> Add<&'a Scalar> for &'a Scalar {
    type Output = Scalar;

    fn add(self, rhs: &'a Scalar) -> Scalar {
        if self.is_zero() { return rhs.clone(); }
        if rhs.is_zero() { return self.clone(); }
        if self.den == rhs.den {
            return Scalar::normalized(&self.num + &rhs.num, self.den.clone());
        }
        // combine over lcm(den, rhs.den)
        let g = self.den.gcd(&rhs.den);
        if !g.is_one() {
            if let (Some(a), Some(b)) = (self.den.div_exact(&g), rhs.den.div_exact(&g)) {
                return Scalar::normalized(
                    &(&self.num * &b) + &(&rhs.num * &a),
                    &self.den * &b,
                );
            }
        }
        Scalar::normalized(
            &(&self.num * &rhs.den) + &(&rhs.num * &self.den),
            &self.den * &rhs.den,
        )
    }
}

impl<'a> Sub<&'a Scalar> for &'a Scalar {
    type Output = Scalar;

    fn sub(self, rhs: &'a Scalar) -> Scalar { self + &(-rhs) }
}

impl<'a> Mul<&'a Scalar> for &'a Scalar {
    type Output = Scalar;

    fn mul(self, rhs: &'a Scalar) -> Scalar {
        if self.is_zero() || rhs.is_zero() { return Scalar::zero(); }
        if self.den.is_one() && rhs.den.is_one() {
            return Scalar::from_poly(&self.num * &rhs.num);
        }
        Scalar::normalized(&self.num * &rhs.num, &self.den * &rhs.den)
    }
}

impl Neg for &Scalar {
    type Output = Scalar;

    fn neg(self) -> Scalar { Scalar { num: -&self.num, den: self.den.clone() } }
}

impl Add for Scalar {
    type Output = Scalar;

    fn add(self, rhs: Scalar) -> Scalar { &self + &rhs }
}

impl Sub for Scalar {
    type Output = Scalar;

    fn sub(self, rhs: Scalar) -> Scalar { &self - &rhs }
}

impl Mul for Scalar {
    type Output = Scalar;

    fn mul(self, rhs: Scalar) -> Scalar { &self * &rhs }
}

impl Neg for Scalar {
    type Output = Scalar;

    fn neg(self) -> Scalar { -&self }
}

impl Zero for Scalar {
    fn zero() -> Self { Scalar::zero() }

    fn is_zero(&self) -> bool { self.num.is_zero() }
}

impl One for Scalar {
    fn one() -> Self { Scalar::one() }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den.is_one() {
            write!(f, "{}", self.num)
        } else {
            write!(f, "({}) / ({})", self.num, self.den)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sym(name: &str, order: u32) -> Scalar { Scalar::symbol(Symbol::new(name, order)) }

    #[test]
    fn field_arithmetic() {
        let x = sym("x", 0);
        let y = sym("y", 0);
        let lhs = &(&x + &y) * &(&x - &y);
        let rhs = &(&x * &x) - &(&y * &y);
        assert_eq!(lhs, rhs);
        let q = lhs.checked_div(&(&x - &y)).unwrap();
        assert_eq!(q, &x + &y);
        assert!(q.denom().is_one());
        assert!(x.checked_div(&Scalar::zero()).is_none());
    }

    #[test]
    fn cancels_common_monomials() {
        let g = sym("g", 1);
        let d = sym("d", 0);
        let q = (&g * &d).checked_div(&(&d * &d)).unwrap();
        assert_eq!(q.numer(), &Poly::symbol(Symbol::new("g", 1)));
        assert_eq!(q.denom(), &Poly::symbol(Symbol::new("d", 0)));
        assert_eq!(q.order(), Some(1));
    }

    #[test]
    fn denominators_stay_reduced() {
        let d = &sym("e1", 0) - &sym("e2", 0);
        let d2 = &d * &d;
        let a = Scalar::one().checked_div(&d).unwrap();
        let b = Scalar::one().checked_div(&d2).unwrap();
        let mut acc = Scalar::zero();
        for _ in 0..6 {
            acc = &acc + &a;
            acc = &acc + &b;
        }
        assert_eq!(acc.denom(), d2.numer());
        let x = Symbol::new("e1", 0);
        assert_eq!(acc.denom().degree(&x), 2);
        let expected = &(&Scalar::from_int(6) * &(&d + &Scalar::one())) * &b;
        assert_eq!(acc, expected);
        let zero = &(&acc - &(&Scalar::from_int(6) * &a)) - &(&Scalar::from_int(6) * &b);
        assert!(zero.is_zero());
    }

    #[test]
    fn polynomial_gcd() {
        let x = sym("x", 0);
        let y = sym("y", 0);
        let one = Scalar::one();
        let p = &(&y * &(&x + &one)) * &(&x + &y);
        let q = &(&x + &one) * &(&y * &y);
        let g = p.numer().gcd(q.numer());
        assert_eq!(&g, (&y * &(&x + &one)).numer());
        assert_eq!(g.leading().map(|(_, c)| c.clone()), Some(Coeff::one()));
        assert!(p.numer().gcd(&Poly::zero()) == p.numer().monic());
        assert!(x.numer().gcd(y.numer()).is_one());

        let r = (&x + &one).checked_div(&(&(&x * &x) - &one)).unwrap();
        assert!(r.numer().is_one());
        assert_eq!(r.denom(), (&x - &one).numer());
    }

    #[test]
    fn inhomogeneous_order() {
        let g = sym("g", 1);
        let d = sym("d", 0);
        assert_eq!((&g + &d).order(), None);
        assert_eq!((&g * &g).order(), Some(2));
    }

    #[test]
    fn substitution() {
        let g = Symbol::new("g", 1);
        let d = Symbol::new("d", 0);
        let expr = Scalar::symbol(g.clone()).checked_div(&Scalar::symbol(d.clone())).unwrap();
        let values: IndexMap<Symbol, Scalar>
            = [(d, Scalar::from_int(2))].into_iter().collect();
        let res = expr.subst(&values).unwrap();
        assert_eq!(res, &Scalar::symbol(g) * &Scalar::from(coeff_ratio(1, 2)));
    }
}
