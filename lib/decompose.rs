//! Flattening of expressions into additive terms and ordered multiplicative
//! factors.

use crate::{
    algebra::{ self, power_exponent },
    config::TermBudget,
    error::{ Error, Result },
    expr::Expr,
};

/// Additive terms of an expression together with the ordered factors of each
/// term.
///
/// `terms[k]` is the product of `factors[k]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decomposition {
    pub terms: Vec<Expr>,
    pub factors: Vec<Vec<Expr>>,
}

impl Decomposition {
    fn from_factors(factors: Vec<Vec<Expr>>) -> Self {
        let terms: Vec<Expr>
            = factors.iter().map(|f| Expr::product(f.iter().cloned())).collect();
        Self { terms, factors }
    }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    /// Iterate over `(term, factors)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Expr, &[Expr])> + '_ {
        self.terms.iter().zip(self.factors.iter().map(|f| f.as_slice()))
    }
}

/// Decompose `expr` using the default [`TermBudget`].
pub fn decompose(expr: &Expr) -> Result<Decomposition> {
    decompose_with(expr, TermBudget::default())
}

/// Decompose `expr` into terms and factors.
///
/// Leaves are a single term with a single factor. A power of a leaf is a
/// single term with the base repeated. Every other expression is expanded
/// first; see [`Canonical::term_factors`][crate::algebra::Canonical::term_factors]
/// for the resulting factor order.
pub fn decompose_with(expr: &Expr, budget: TermBudget) -> Result<Decomposition> {
    match expr {
        Expr::Number(_) | Expr::Symbol(_) | Expr::Fraction(_)
            | Expr::Finite(_) | Expr::Boson(_)
            => Ok(Decomposition::from_factors(vec![vec![expr.clone()]])),
        Expr::Power(base, exponent) if base.is_leaf() => {
            let n = power_exponent(exponent)?;
            let factors: Vec<Expr>
                = if n == 0 {
                    vec![Expr::one()]
                } else {
                    (0..n).map(|_| (**base).clone()).collect()
                };
            Ok(Decomposition::from_factors(vec![factors]))
        },
        _ => {
            let canon = algebra::expand(expr, budget)?;
            Ok(Decomposition::from_factors(canon.term_factors()))
        },
    }
}

/// Ordered additive terms of `expr`.
pub fn terms_of(expr: &Expr) -> Result<Vec<Expr>> {
    Ok(decompose(expr)?.terms)
}

/// Ordered multiplicative factors of a single term.
///
/// Fails with [`Error::Structural`] if `term` expands to more than one term.
pub fn factors_of(term: &Expr) -> Result<Vec<Expr>> {
    let mut dec = decompose(term)?;
    match dec.factors.len() {
        0 => Ok(vec![Expr::zero()]),
        1 => Ok(dec.factors.pop().unwrap_or_default()),
        n => Err(Error::Structural(
            format!("`{term}` is a sum of {n} terms, not a single term"))),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ hilbert::SubSpace, nd_utils::from_ints };

    #[test]
    fn leaves() {
        let g = Expr::symbol("g", 1);
        let dec = decompose(&g).unwrap();
        assert_eq!(dec.terms, vec![g.clone()]);
        assert_eq!(dec.factors, vec![vec![g.clone()]]);
    }

    #[test]
    fn powers() {
        let a = Expr::annihilate("a");
        let dec = decompose(&Expr::pow(a.clone(), 3)).unwrap();
        assert_eq!(dec.len(), 1);
        assert_eq!(dec.factors[0], vec![a.clone(), a.clone(), a.clone()]);
        assert!(matches!(
            decompose(&Expr::power(a.clone(), Expr::symbol("n", 0))),
            Err(Error::UnsupportedOperation(_))
        ));
        assert!(matches!(
            decompose(&Expr::power(a.clone(), Expr::int(-2))),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn compound() {
        let sx = SubSpace::new("x", 2);
        let opa = Expr::finite("A", &sx, from_ints([[0, 1], [1, 0]]));
        let s1 = Expr::symbol("s1", 1);
        let s2 = Expr::symbol("s2", 2);
        let e = s1.clone() * (opa.clone() + s2.clone() * opa.clone() * opa.clone());
        let dec = decompose(&e).unwrap();
        assert_eq!(dec.len(), 2);
        assert_eq!(dec.factors[0], vec![s1.clone(), opa.clone()]);
        assert_eq!(dec.factors[1], vec![s1.clone(), s2.clone(), opa.clone(), opa.clone()]);
        assert_eq!(decompose(&e).unwrap(), dec);
        assert!(factors_of(&e).is_err());
        assert_eq!(terms_of(&e).unwrap(), dec.terms);
        assert_eq!(factors_of(&dec.terms[1]).unwrap(), dec.factors[1]);
    }
}
