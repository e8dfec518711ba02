//! Definitions to describe finite subspaces and ordered tensor products
//! thereof.

use std::{ fmt, rc::Rc };
use itertools::Itertools;
use ndarray as nd;
use crate::{
    error::{ Error, Result },
    expr::FiniteOperator,
    scalar::Scalar,
};

/* Subspaces ******************************************************************/

/// A named finite-dimensional factor of the total state space.
///
/// Composite subspaces stand for the full ordered tensor product of several
/// ordinary subspaces (see [`ProductSpace::full`]); operators on them never
/// commute with any other finite operator.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubSpace {
    name: Rc<str>,
    dim: usize,
    composite: bool,
}

impl SubSpace {
    /// Create a new subspace.
    pub fn new(name: &str, dim: usize) -> Self {
        Self { name: name.into(), dim, composite: false }
    }

    /// Return the name of the subspace.
    pub fn name(&self) -> &str { &self.name }

    /// Return the declared dimension of the subspace.
    pub fn dim(&self) -> usize { self.dim }

    /// Return `true` if `self` is the tensor product of other subspaces.
    pub fn is_composite(&self) -> bool { self.composite }

    /// Return `true` if operators on `self` commute with operators on `other`.
    pub fn commutes_with(&self, other: &Self) -> bool {
        !self.composite && !other.composite && self != other
    }
}

impl fmt::Display for SubSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/* Product space **************************************************************/

/// An ordered tensor product of [`SubSpace`]s.
///
/// The order of the factors fixes the order of every Kronecker product taken
/// over this space: index `r` of the full space corresponds to the
/// multi-index returned by [`Self::label`], with the last factor varying
/// fastest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductSpace {
    factors: Vec<SubSpace>,
    full: SubSpace,
}

impl ProductSpace {
    /// Create a new product space.
    ///
    /// Fails if any factor is composite or zero-dimensional, or if two factors
    /// share a name.
    pub fn new(factors: Vec<SubSpace>) -> Result<Self> {
        if let Some(bad) = factors.iter().find(|s| s.dim == 0) {
            return Err(Error::Structural(
                format!("subspace `{}` has dimension 0", bad.name)));
        }
        if let Some(bad) = factors.iter().find(|s| s.composite) {
            return Err(Error::Structural(
                format!("subspace `{}` is already a product space", bad.name)));
        }
        if let Some(dup) = factors.iter().map(|s| &s.name).duplicates().next() {
            return Err(Error::Structural(
                format!("subspace `{dup}` is listed more than once")));
        }
        let name: String
            = if factors.is_empty() {
                "1".to_string()
            } else {
                factors.iter().map(|s| s.name.as_ref()).join("⊗")
            };
        let dim: usize = factors.iter().map(|s| s.dim).product();
        let full = SubSpace { name: name.into(), dim, composite: true };
        Ok(Self { factors, full })
    }

    /// Return the ordered factors.
    pub fn factors(&self) -> &[SubSpace] { &self.factors }

    /// Return the composite subspace covering the whole product.
    pub fn full(&self) -> &SubSpace { &self.full }

    /// Return the total dimension, i.e. the product of all factor dimensions.
    pub fn dim(&self) -> usize { self.full.dim }

    /// Return the multi-index of a single full-space index.
    pub fn label(&self, index: usize) -> Vec<usize> {
        let mut rem = index;
        let mut label: Vec<usize>
            = self.factors.iter().rev()
            .map(|s| {
                let k = rem % s.dim;
                rem /= s.dim;
                k
            })
            .collect();
        label.reverse();
        label
    }

    /// Return the elementary unit `|r⟩⟨c|` on the full space.
    pub fn unit(&self, r: usize, c: usize) -> FiniteOperator {
        let n = self.dim();
        let matrix: nd::Array2<Scalar>
            = nd::Array2::from_shape_fn(
                (n, n),
                |(i, j)| if (i, j) == (r, c) { Scalar::one() } else { Scalar::zero() },
            );
        let name = format!(
            "|{}⟩⟨{}|",
            self.label(r).iter().join(","),
            self.label(c).iter().join(","),
        );
        FiniteOperator::new(&name, &self.full, matrix)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn labels_follow_kronecker_order() {
        let space = ProductSpace::new(vec![
            SubSpace::new("spin", 2),
            SubSpace::new("charge", 3),
        ]).unwrap();
        assert_eq!(space.dim(), 6);
        assert_eq!(space.label(0), vec![0, 0]);
        assert_eq!(space.label(1), vec![0, 1]);
        assert_eq!(space.label(3), vec![1, 0]);
        assert_eq!(space.label(5), vec![1, 2]);
        assert_eq!(space.unit(1, 3).name(), "|0,1⟩⟨1,0|");
        assert!(space.full().is_composite());
    }

    #[test]
    fn rejects_bad_factors() {
        assert!(ProductSpace::new(vec![SubSpace::new("x", 0)]).is_err());
        assert!(
            ProductSpace::new(vec![SubSpace::new("x", 2), SubSpace::new("x", 2)])
                .is_err()
        );
        let empty = ProductSpace::new(Vec::new()).unwrap();
        assert_eq!(empty.dim(), 1);
        assert!(empty.label(0).is_empty());
    }
}
