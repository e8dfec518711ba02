//! The operator-expression model.
//!
//! Expressions are immutable trees over numbers, perturbative symbols, matrix
//! operators on finite subspaces and bosonic ladder operators. Products are
//! noncommutative; every transformation returns a new value.

use std::{
    fmt,
    hash::{ Hash, Hasher },
    ops::{ Add, Mul, Neg, Sub },
    rc::Rc,
};
use itertools::Itertools;
use ndarray as nd;
use num_traits::{ One, Zero };
use rustc_hash::FxHashSet as HashSet;
use crate::{
    algebra,
    config::TermBudget,
    error::{ Error, Result },
    hilbert::SubSpace,
    scalar::{ self, Coeff, Scalar, Symbol },
};

/* Leaves *********************************************************************/

/// Kind of bosonic ladder operator.
///
/// Creation sorts before annihilation, which is the normal order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ladder {
    Creation,
    Annihilation,
}

/// A single bosonic ladder operator acting on a named mode.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BosonOperator {
    mode: Rc<str>,
    ladder: Ladder,
}

impl BosonOperator {
    pub fn new(mode: &str, ladder: Ladder) -> Self {
        Self { mode: mode.into(), ladder }
    }

    /// `a†` on `mode`.
    pub fn create(mode: &str) -> Self { Self::new(mode, Ladder::Creation) }

    /// `a` on `mode`.
    pub fn annihilate(mode: &str) -> Self { Self::new(mode, Ladder::Annihilation) }

    pub fn mode(&self) -> &str { &self.mode }

    pub(crate) fn mode_rc(&self) -> &Rc<str> { &self.mode }

    pub fn ladder(&self) -> Ladder { self.ladder }
}

impl fmt::Display for BosonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ladder {
            Ladder::Creation => write!(f, "{}†", self.mode),
            Ladder::Annihilation => write!(f, "{}", self.mode),
        }
    }
}

/// A named operator on a finite subspace, carrying an explicit matrix.
///
/// Two operators are equal only if their names, subspaces and matrices all
/// agree; hashing uses only the name and subspace.
#[derive(Clone, Debug)]
pub struct FiniteOperator {
    name: Rc<str>,
    subspace: SubSpace,
    matrix: Rc<nd::Array2<Scalar>>,
}

impl FiniteOperator {
    /// Create a new operator.
    ///
    /// The shape of `matrix` is checked against the dimension of `subspace`
    /// only when the operator is expanded onto a product space.
    pub fn new(name: &str, subspace: &SubSpace, matrix: nd::Array2<Scalar>)
        -> Self
    {
        Self { name: name.into(), subspace: subspace.clone(), matrix: Rc::new(matrix) }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn subspace(&self) -> &SubSpace { &self.subspace }

    pub fn matrix(&self) -> &nd::Array2<Scalar> { &self.matrix }

    /// Return `true` if every off-diagonal matrix element is zero.
    pub fn is_diagonal(&self) -> bool {
        crate::nd_utils::is_diagonal(&self.matrix.view())
    }

    /// Fail with [`Error::DimensionMismatch`] unless the matrix is square with
    /// the subspace's dimension.
    pub fn check_shape(&self) -> Result<()> {
        let n = self.subspace.dim();
        if self.matrix.dim() != (n, n) {
            return Err(Error::DimensionMismatch {
                what: format!("operator `{}`", self.name),
                subspace: self.subspace.name().to_string(),
                expected: n,
                found: self.matrix.dim(),
            });
        }
        Ok(())
    }

    /// Return a copy of `self` with every matrix element mapped through `f`.
    pub fn try_map_entries<F>(&self, mut f: F) -> Result<Self>
    where F: FnMut(&Scalar) -> Result<Scalar>
    {
        let entries: Vec<Scalar>
            = self.matrix.iter().map(&mut f).collect::<Result<_>>()?;
        let matrix = nd::Array2::from_shape_vec(self.matrix.dim(), entries)
            .map_err(|err| Error::Structural(err.to_string()))?;
        Ok(Self { name: self.name.clone(), subspace: self.subspace.clone(), matrix: Rc::new(matrix) })
    }
}

impl PartialEq for FiniteOperator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.subspace == other.subspace
            && (Rc::ptr_eq(&self.matrix, &other.matrix) || self.matrix == other.matrix)
    }
}

impl Eq for FiniteOperator { }

impl Hash for FiniteOperator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.subspace.hash(state);
    }
}

impl fmt::Display for FiniteOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/* Expressions ****************************************************************/

/// An operator expression.
///
/// The derived equality is structural; use [`Expr::equiv`] for algebraic
/// equality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// An exact complex-rational constant.
    Number(Coeff),
    /// A perturbative parameter.
    Symbol(Symbol),
    /// A rational function of perturbative parameters.
    Fraction(Scalar),
    /// An operator on a finite subspace.
    Finite(FiniteOperator),
    /// A bosonic ladder operator.
    Boson(BosonOperator),
    Sum(Vec<Expr>),
    /// A noncommutative product, in left-to-right order.
    Product(Vec<Expr>),
    /// `base ^ exponent`; only non-negative integer exponents are supported.
    Power(Box<Expr>, Box<Expr>),
    /// `[A, B] = A B - B A`.
    Commutator(Box<Expr>, Box<Expr>),
}

impl Default for Expr {
    fn default() -> Self { Self::zero() }
}

impl Expr {
    pub fn zero() -> Self { Self::Number(Coeff::zero()) }

    pub fn one() -> Self { Self::Number(Coeff::one()) }

    pub fn int(n: i64) -> Self { Self::Number(scalar::coeff_int(n)) }

    /// `n / d`.
    ///
    /// *Panics* if `d == 0`.
    pub fn rational(n: i64, d: i64) -> Self { Self::Number(scalar::coeff_ratio(n, d)) }

    /// The imaginary unit times `n`.
    pub fn imag(n: i64) -> Self { Self::Number(scalar::coeff_imag(n)) }

    pub fn symbol(name: &str, order: u32) -> Self { Self::Symbol(Symbol::new(name, order)) }

    /// Wrap a scalar in the simplest leaf that holds it.
    pub fn from_scalar(s: Scalar) -> Self {
        if let Some(c) = s.as_constant() { return Self::Number(c); }
        if s.denom().is_one() && s.numer().len() == 1 {
            if let Some((m, c)) = s.numer().terms().next() {
                let mut vars = m.iter();
                if let (Some((sym, 1)), None) = (vars.next(), vars.next()) {
                    if c.is_one() { return Self::Symbol(sym.clone()); }
                }
            }
        }
        Self::Fraction(s)
    }

    pub fn finite(name: &str, subspace: &SubSpace, matrix: nd::Array2<Scalar>) -> Self {
        Self::Finite(FiniteOperator::new(name, subspace, matrix))
    }

    /// `a†` on `mode`.
    pub fn create(mode: &str) -> Self { Self::Boson(BosonOperator::create(mode)) }

    /// `a` on `mode`.
    pub fn annihilate(mode: &str) -> Self { Self::Boson(BosonOperator::annihilate(mode)) }

    /// Flattened sum.
    pub fn sum<I>(terms: I) -> Self
    where I: IntoIterator<Item = Expr>
    {
        let mut acc: Vec<Expr> = Vec::new();
        for term in terms.into_iter() {
            match term {
                Self::Sum(inner) => { acc.extend(inner); },
                other => { acc.push(other); },
            }
        }
        match acc.len() {
            0 => Self::zero(),
            1 => acc.pop().unwrap_or_default(),
            _ => Self::Sum(acc),
        }
    }

    /// Flattened product, preserving factor order.
    pub fn product<I>(factors: I) -> Self
    where I: IntoIterator<Item = Expr>
    {
        let mut acc: Vec<Expr> = Vec::new();
        for factor in factors.into_iter() {
            match factor {
                Self::Product(inner) => { acc.extend(inner); },
                other => { acc.push(other); },
            }
        }
        match acc.len() {
            0 => Self::one(),
            1 => acc.pop().unwrap_or_default(),
            _ => Self::Product(acc),
        }
    }

    /// `base ^ n`.
    pub fn pow(base: Expr, n: u32) -> Self {
        Self::Power(Box::new(base), Box::new(Self::int(i64::from(n))))
    }

    /// `base ^ exponent` for an arbitrary exponent expression.
    ///
    /// Anything but a non-negative integer exponent is rejected when the
    /// power is expanded.
    pub fn power(base: Expr, exponent: Expr) -> Self {
        Self::Power(Box::new(base), Box::new(exponent))
    }

    pub fn commutator(a: Expr, b: Expr) -> Self {
        Self::Commutator(Box::new(a), Box::new(b))
    }

    /// `[[[A, B], B], ..., B]` with `k` commutators; `k == 0` gives `A`.
    pub fn nested_commutator(a: Expr, b: &Expr, k: usize) -> Self {
        (0..k).fold(a, |acc, _| Self::commutator(acc, b.clone()))
    }

    /// Return `true` if `self` is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Number(_) | Self::Symbol(_) | Self::Fraction(_)
                | Self::Finite(_) | Self::Boson(_)
        )
    }

    /// Return `true` if `self` is a numeric, symbolic or fractional leaf.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Symbol(_) | Self::Fraction(_))
    }

    /// Return `true` if any boson operator appears in `self`.
    pub fn has_bosons(&self) -> bool {
        match self {
            Self::Boson(_) => true,
            Self::Number(_) | Self::Symbol(_) | Self::Fraction(_) | Self::Finite(_)
                => false,
            Self::Sum(items) | Self::Product(items)
                => items.iter().any(Self::has_bosons),
            Self::Power(a, b) | Self::Commutator(a, b)
                => a.has_bosons() || b.has_bosons(),
        }
    }

    fn visit_finite<'a>(&'a self, f: &mut dyn FnMut(&'a FiniteOperator)) {
        match self {
            Self::Finite(op) => { f(op); },
            Self::Number(_) | Self::Symbol(_) | Self::Fraction(_) | Self::Boson(_)
                => { },
            Self::Sum(items) | Self::Product(items)
                => { items.iter().for_each(|item| item.visit_finite(f)); },
            Self::Power(a, b) | Self::Commutator(a, b) => {
                a.visit_finite(f);
                b.visit_finite(f);
            },
        }
    }

    /// Return the distinct non-composite subspaces touched by finite
    /// operators in `self`, in order of first appearance.
    pub fn finite_subspaces(&self) -> Vec<SubSpace> {
        let mut acc: Vec<SubSpace> = Vec::new();
        let mut seen: HashSet<SubSpace> = HashSet::default();
        self.visit_finite(&mut |op| {
            let sub = op.subspace();
            if !sub.is_composite() && seen.insert(sub.clone()) { acc.push(sub.clone()); }
        });
        acc
    }

    /// Fully distribute products over sums, collecting like terms.
    pub fn expand(&self) -> Result<Expr> {
        self.expand_with(TermBudget::default())
    }

    /// Like [`Self::expand`], with an explicit term budget.
    pub fn expand_with(&self, budget: TermBudget) -> Result<Expr> {
        Ok(algebra::expand(self, budget)?.into_expr())
    }

    /// Return `true` if `self` expands to zero.
    pub fn vanishes(&self) -> Result<bool> {
        Ok(algebra::expand(self, TermBudget::default())?.is_zero())
    }

    /// Algebraic equality: `self - other` expands to zero.
    pub fn equiv(&self, other: &Expr) -> Result<bool> {
        (self.clone() - other.clone()).vanishes()
    }
}

impl From<Symbol> for Expr {
    fn from(s: Symbol) -> Self { Self::Symbol(s) }
}

impl From<FiniteOperator> for Expr {
    fn from(op: FiniteOperator) -> Self { Self::Finite(op) }
}

impl From<BosonOperator> for Expr {
    fn from(op: BosonOperator) -> Self { Self::Boson(op) }
}

impl From<Scalar> for Expr {
    fn from(s: Scalar) -> Self { Self::from_scalar(s) }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self { Self::int(n) }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr { Expr::sum([self, rhs]) }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr { Expr::sum([self, -rhs]) }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr { Expr::product([self, rhs]) }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        match self {
            Self::Number(c) => Self::Number(-c),
            other => Expr::product([Expr::int(-1), other]),
        }
    }
}

impl<'a> Add<&'a Expr> for &'a Expr {
    type Output = Expr;

    fn add(self, rhs: &'a Expr) -> Expr { self.clone() + rhs.clone() }
}

impl<'a> Sub<&'a Expr> for &'a Expr {
    type Output = Expr;

    fn sub(self, rhs: &'a Expr) -> Expr { self.clone() - rhs.clone() }
}

impl<'a> Mul<&'a Expr> for &'a Expr {
    type Output = Expr;

    fn mul(self, rhs: &'a Expr) -> Expr { self.clone() * rhs.clone() }
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr { -self.clone() }
}

struct CoeffFmt<'a>(&'a Coeff);

impl fmt::Display for CoeffFmt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        scalar::fmt_coeff(self.0, f)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(c) => write!(f, "{}", CoeffFmt(c)),
            Self::Symbol(s) => write!(f, "{s}"),
            Self::Fraction(s) => write!(f, "({s})"),
            Self::Finite(op) => write!(f, "{op}"),
            Self::Boson(op) => write!(f, "{op}"),
            Self::Sum(terms) => write!(f, "{}", terms.iter().join(" + ")),
            Self::Product(factors) => {
                let s = factors.iter()
                    .map(|x| {
                        if matches!(x, Self::Sum(_)) { format!("({x})") } else { x.to_string() }
                    })
                    .join("*");
                write!(f, "{s}")
            },
            Self::Power(base, exp) => {
                if base.is_leaf() {
                    write!(f, "{base}^{exp}")
                } else {
                    write!(f, "({base})^{exp}")
                }
            },
            Self::Commutator(a, b) => write!(f, "[{a}, {b}]"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nd_utils::from_ints;

    #[test]
    fn flattening() {
        let x = Expr::symbol("x", 0);
        let y = Expr::symbol("y", 1);
        let e = (x.clone() + y.clone()) + (x.clone() * y.clone()) * x.clone();
        match &e {
            Expr::Sum(terms) => {
                assert_eq!(terms.len(), 3);
                assert!(matches!(&terms[2], Expr::Product(f) if f.len() == 3));
            },
            _ => panic!("expected a sum"),
        }
        assert_eq!(Expr::sum(Vec::new()), Expr::zero());
        assert_eq!(Expr::product([x.clone()]), x);
    }

    #[test]
    fn subspaces_and_bosons() {
        let sx = SubSpace::new("x", 2);
        let sy = SubSpace::new("y", 3);
        let a = Expr::finite("A", &sx, from_ints([[0, 1], [1, 0]]));
        let b = Expr::finite("B", &sy, from_ints([[1, 0, 0], [0, 1, 0], [0, 0, 1]]));
        let e = b.clone() * a.clone() + a.clone();
        assert_eq!(e.finite_subspaces(), vec![sy, sx]);
        assert!(!e.has_bosons());
        assert!((e * Expr::create("c")).has_bosons());
    }

    #[test]
    fn scalar_leaves() {
        let g = Symbol::new("g", 1);
        assert_eq!(Expr::from_scalar(Scalar::symbol(g.clone())), Expr::Symbol(g.clone()));
        assert_eq!(Expr::from_scalar(Scalar::from_int(3)), Expr::int(3));
        let half_g = &Scalar::symbol(g) * &Scalar::from(scalar::coeff_ratio(1, 2));
        assert!(matches!(Expr::from_scalar(half_g), Expr::Fraction(_)));
    }

    #[test]
    fn display() {
        let e = Expr::commutator(
            Expr::symbol("w", 0) * Expr::create("a") * Expr::annihilate("a"),
            Expr::pow(Expr::create("a") + Expr::int(1), 2),
        );
        assert_eq!(e.to_string(), "[w*a†*a, (a† + 1)^2]");
    }
}
