//! Domain expansion: promotion of subspace-local operators to explicit
//! matrices on an ordered tensor-product space.
//!
//! Bosons are never represented as matrices; an expanded expression is a map
//! from normal-ordered boson words to full-space matrices.

use indexmap::IndexMap;
use ndarray as nd;
use crate::{
    algebra::{ self, BosonWord, Canonical, Word },
    config::TermBudget,
    error::{ Error, Result },
    expr::{ Expr, FiniteOperator },
    hilbert::{ ProductSpace, SubSpace },
    nd_utils,
    scalar::Scalar,
};

/// Identity matrices keyed by subspace.
pub type Identities = IndexMap<SubSpace, nd::Array2<Scalar>>;

/// One identity matrix per distinct finite subspace touched by `expr`, sized
/// to the subspace's declared dimension.
pub fn identities_for(expr: &Expr) -> Identities {
    expr.finite_subspaces().into_iter()
        .map(|sub| {
            let eye = nd_utils::identity(sub.dim());
            (sub, eye)
        })
        .collect()
}

/* Expansion context **********************************************************/

/// Everything needed to expand expressions onto a fixed product space.
///
/// Built once per top-level call and passed by reference.
#[derive(Clone, Debug)]
pub struct ExpansionContext {
    space: ProductSpace,
    identities: Identities,
    budget: TermBudget,
}

impl ExpansionContext {
    /// Create a new context.
    ///
    /// Listed subspaces missing from `identities` get identities built from
    /// their declared dimensions. Supplied identities must have the
    /// dimension of their subspace.
    pub fn new(subspaces: &[SubSpace], mut identities: Identities, budget: TermBudget)
        -> Result<Self>
    {
        let space = ProductSpace::new(subspaces.to_vec())?;
        for sub in space.factors().iter() {
            match identities.get(sub) {
                Some(eye) => {
                    if eye.dim() != (sub.dim(), sub.dim()) {
                        return Err(Error::DimensionMismatch {
                            what: "identity".to_string(),
                            subspace: sub.name().to_string(),
                            expected: sub.dim(),
                            found: eye.dim(),
                        });
                    }
                },
                None => {
                    identities.insert(sub.clone(), nd_utils::identity(sub.dim()));
                },
            }
        }
        Ok(Self { space, identities, budget })
    }

    pub fn space(&self) -> &ProductSpace { &self.space }

    pub fn identities(&self) -> &Identities { &self.identities }

    pub fn budget(&self) -> TermBudget { self.budget }

    /// Full-space matrix of a single finite operator.
    fn embed(&self, op: &FiniteOperator) -> Result<nd::Array2<Scalar>> {
        let sub = op.subspace();
        if sub.is_composite() {
            let full = self.space.full();
            if sub.name() != full.name() {
                return Err(Error::Structural(format!(
                    "operator `{}` acts on product space `{}`, not `{}`",
                    op, sub, full,
                )));
            }
            if op.matrix().dim() != (full.dim(), full.dim()) {
                return Err(Error::DimensionMismatch {
                    what: format!("operator `{op}`"),
                    subspace: full.name().to_string(),
                    expected: full.dim(),
                    found: op.matrix().dim(),
                });
            }
            return Ok(op.matrix().clone());
        }
        let listed
            = self.space.factors().iter()
            .find(|s| s.name() == sub.name())
            .ok_or_else(|| {
                Error::Structural(format!(
                    "operator `{op}` acts on subspace `{sub}`, which is not part \
                    of the product space `{}`",
                    self.space.full(),
                ))
            })?;
        if listed.dim() != sub.dim() {
            return Err(Error::DimensionMismatch {
                what: format!("operator `{op}`"),
                subspace: sub.name().to_string(),
                expected: listed.dim(),
                found: (sub.dim(), sub.dim()),
            });
        }
        op.check_shape()?;
        let mats: Vec<nd::ArrayView2<Scalar>>
            = self.space.factors().iter()
            .map(|s| {
                if s == sub {
                    Ok(op.matrix().view())
                } else {
                    self.identities.get(s)
                        .map(|eye| eye.view())
                        .ok_or_else(|| Error::Structural(
                            format!("no identity for subspace `{s}`")))
                }
            })
            .collect::<Result<_>>()?;
        Ok(nd_utils::kron_all(mats))
    }

    /// Full-space matrix of an ordered product of finite operators.
    fn word_matrix(&self, ops: &[FiniteOperator]) -> Result<nd::Array2<Scalar>> {
        let mut acc: Option<nd::Array2<Scalar>> = None;
        for op in ops.iter() {
            let m = self.embed(op)?;
            acc = Some(match acc {
                None => m,
                Some(prev) => nd_utils::matmul(&prev.view(), &m.view()),
            });
        }
        Ok(acc.unwrap_or_else(|| nd_utils::identity(self.space.dim())))
    }

    /// Expand `expr` into one full-space matrix per boson word.
    pub fn expand(&self, expr: &Expr) -> Result<ExpandedMatrix> {
        let canon = algebra::expand(expr, self.budget)?;
        let dim = self.space.dim();
        let mut blocks: IndexMap<BosonWord, nd::Array2<Scalar>> = IndexMap::new();
        for (word, coeff) in canon.iter() {
            let m = self.word_matrix(&word.finite)?;
            let m = nd_utils::scale(&m.view(), coeff);
            match blocks.get_mut(&word.bosons) {
                Some(block) => { *block = nd_utils::add(&block.view(), &m.view()); },
                None => { blocks.insert(word.bosons.clone(), m); },
            }
        }
        blocks.retain(|_, m| !nd_utils::is_zero(&m.view()));
        Ok(ExpandedMatrix { dim, blocks })
    }

    /// Rewrite `expr` over the elementary units `|r⟩⟨c|` of the product
    /// space.
    ///
    /// Every finite factor of a resolved term is a single unit, so per-factor
    /// classification of the result is exact.
    pub fn resolve(&self, expr: &Expr) -> Result<Expr> {
        self.expand(expr)?.to_expr(&self.space, self.budget)
    }
}

/* Expanded matrices **********************************************************/

/// Matrix-valued expansion of an expression: one `dim × dim` matrix of
/// scalars per normal-ordered boson word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpandedMatrix {
    dim: usize,
    blocks: IndexMap<BosonWord, nd::Array2<Scalar>>,
}

impl ExpandedMatrix {
    pub fn dim(&self) -> usize { self.dim }

    /// Non-zero blocks keyed by boson word.
    pub fn blocks(&self) -> &IndexMap<BosonWord, nd::Array2<Scalar>> { &self.blocks }

    /// The block of a boson word, or zero.
    pub fn block(&self, word: &BosonWord) -> nd::Array2<Scalar> {
        self.blocks.get(word).cloned()
            .unwrap_or_else(|| nd::Array2::default((self.dim, self.dim)))
    }

    /// The pure-finite block.
    pub fn finite_block(&self) -> nd::Array2<Scalar> { self.block(&BosonWord::empty()) }

    pub fn is_zero(&self) -> bool { self.blocks.is_empty() }

    /// Convert back into an expression over the units of `space`.
    pub fn to_expr(&self, space: &ProductSpace, budget: TermBudget) -> Result<Expr> {
        if space.dim() != self.dim {
            return Err(Error::DimensionMismatch {
                what: "expanded matrix".to_string(),
                subspace: space.full().name().to_string(),
                expected: space.dim(),
                found: (self.dim, self.dim),
            });
        }
        let mut canon = Canonical::zero(budget);
        for (bosons, m) in self.blocks.iter() {
            for ((r, c), x) in m.indexed_iter() {
                if x.is_zero() { continue; }
                let finite: Vec<FiniteOperator>
                    = if space.factors().is_empty() {
                        Vec::new()
                    } else {
                        vec![space.unit(r, c)]
                    };
                canon.add_term(Word { finite, bosons: bosons.clone() }, x.clone())?;
            }
        }
        Ok(canon.into_expr())
    }
}

/// Expand `expr` onto `subspaces` with the default identities.
pub fn domain_expansion(expr: &Expr, subspaces: &[SubSpace]) -> Result<ExpandedMatrix> {
    domain_expansion_with(expr, subspaces, identities_for(expr))
}

/// Expand `expr` onto `subspaces`, padding with the given identities.
///
/// Each finite operator is placed at its subspace's position and every other
/// listed subspace is filled with its identity; the Kronecker product is
/// taken in exactly the listed order.
pub fn domain_expansion_with(
    expr: &Expr,
    subspaces: &[SubSpace],
    identities: Identities,
) -> Result<ExpandedMatrix>
{
    ExpansionContext::new(subspaces, identities, TermBudget::default())?.expand(expr)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nd_utils::{ from_ints, identity, kron };

    fn setup() -> (SubSpace, SubSpace, Expr, Expr) {
        let x = SubSpace::new("X", 2);
        let y = SubSpace::new("Y", 2);
        let op_a = Expr::finite("opA", &x, from_ints([[0, 1], [1, 0]]));
        let op_b = Expr::finite("opB", &y, from_ints([[1, 0], [0, 1]]));
        (x, y, op_a, op_b)
    }

    #[test]
    fn kronecker_padding() {
        let (x, y, op_a, op_b) = setup();
        let a = from_ints([[0, 1], [1, 0]]);
        let b = from_ints([[1, 0], [0, 1]]);
        let ea = domain_expansion(&op_a, &[x.clone(), y.clone()]).unwrap();
        assert_eq!(ea.finite_block(), kron(&a.view(), &identity(2).view()));
        let eb = domain_expansion(&op_b, &[x.clone(), y.clone()]).unwrap();
        assert_eq!(eb.finite_block(), kron(&identity(2).view(), &b.view()));

        let swapped = domain_expansion(&op_a, &[y.clone(), x.clone()]).unwrap();
        assert_eq!(swapped.finite_block(), kron(&identity(2).view(), &a.view()));
    }

    #[test]
    fn dimensions() {
        let (x, _, op_a, _) = setup();
        let z = SubSpace::new("Z", 3);
        let e = domain_expansion(&op_a, &[x.clone(), z.clone()]).unwrap();
        assert_eq!(e.dim(), 6);
        assert_eq!(e.finite_block().dim(), (6, 6));
    }

    #[test]
    fn bosons_stay_symbolic() {
        let (x, y, op_a, op_b) = setup();
        let g = Expr::symbol("g", 1);
        let expr = g.clone() * op_a.clone() * Expr::annihilate("c") + op_b.clone();
        let e = domain_expansion(&expr, &[x.clone(), y.clone()]).unwrap();
        assert_eq!(e.blocks().len(), 2);
        let word = BosonWord::from_counts([("c", 0, 1)]);
        let block = e.block(&word);
        assert_eq!(block[[0, 2]], Scalar::symbol(crate::scalar::Symbol::new("g", 1)));
        assert!(block[[0, 0]].is_zero());
    }

    #[test]
    fn errors() {
        let (x, y, op_a, _) = setup();
        assert!(matches!(
            domain_expansion(&op_a, &[y.clone()]),
            Err(Error::Structural(_))
        ));
        let bad = Expr::finite("bad", &x, from_ints([[1, 0, 0], [0, 1, 0], [0, 0, 1]]));
        assert!(matches!(
            domain_expansion(&bad, &[x.clone(), y.clone()]),
            Err(Error::DimensionMismatch { .. })
        ));
        let mut ids = identities_for(&op_a);
        ids.insert(y.clone(), identity(3));
        assert!(matches!(
            domain_expansion_with(&op_a, &[x.clone(), y.clone()], ids),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn resolution_round_trip() {
        let (x, y, op_a, op_b) = setup();
        let ctx = ExpansionContext::new(
            &[x.clone(), y.clone()], identities_for(&op_a), TermBudget::default()
        ).unwrap();
        let n = Expr::create("c") * Expr::annihilate("c");
        let expr = op_a.clone() * op_a.clone() + op_b.clone() * n;
        let resolved = ctx.resolve(&expr).unwrap();
        assert_eq!(ctx.expand(&resolved).unwrap(), ctx.expand(&expr).unwrap());
        // opA^2 = 1 is recognized only after resolution
        let split = crate::classify::group_by_diagonal(&resolved).unwrap();
        assert!(split.off_diagonal.vanishes().unwrap());
    }
}
