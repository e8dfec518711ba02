//! Trial generators with unknown matrix elements.

use indexmap::IndexMap;
use ndarray as nd;
use crate::{
    algebra::BosonWord,
    classify::Classifier,
    error::{ Error, Result },
    expr::{ Expr, FiniteOperator },
    hilbert::ProductSpace,
    scalar::{ Scalar, Symbol },
};

/// One unknown operator of an [`Ansatz`] together with the boson word it
/// multiplies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnsatzBlock {
    pub word: BosonWord,
    pub operator: FiniteOperator,
}

impl AnsatzBlock {
    fn to_expr(&self) -> Expr {
        Expr::Finite(self.operator.clone()) * self.word.to_expr()
    }
}

/// A trial generator `Σ_j S^(j)_k w_j` for perturbative order `k`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ansatz {
    pub generator: Expr,
    /// Matrix-element unknowns of every block, in block then row-major order.
    pub unknowns: Vec<Symbol>,
    pub blocks: Vec<AnsatzBlock>,
}

fn unknown_operator(space: &ProductSpace, order: u32, j: usize, unknowns: &mut Vec<Symbol>)
    -> FiniteOperator
{
    let name = format!("S^({j})_{order}");
    let n = space.dim();
    let matrix: nd::Array2<Scalar>
        = nd::Array2::from_shape_fn((n, n), |(r, c)| {
            let s = Symbol::new(&format!("{name}[{r},{c}]"), order);
            unknowns.push(s.clone());
            Scalar::symbol(s)
        });
    FiniteOperator::new(&name, space.full(), matrix)
}

/// Build the trial generator for perturbative order `order` from the
/// non-diagonal content `v`.
///
/// One unknown operator on the full finite sector absorbs pure-finite
/// content. If `infinite` is set, every distinct boson word in the infinite
/// part of `v` gets its own unknown operator, in order of first appearance.
pub fn build_ansatz(
    v: &Expr,
    space: &ProductSpace,
    order: u32,
    infinite: bool,
    classifier: &Classifier,
) -> Result<Ansatz>
{
    let mut unknowns: Vec<Symbol> = Vec::new();
    let mut blocks: Vec<AnsatzBlock> = vec![
        AnsatzBlock {
            word: BosonWord::empty(),
            operator: unknown_operator(space, order, 0, &mut unknowns),
        },
    ];
    if infinite {
        let split = classifier.group_by_infinite(v)?;
        let words: Vec<BosonWord>
            = classifier.group_by_bosons(&split.infinite)?
            .into_keys()
            .filter(|w| !w.is_empty())
            .collect();
        for (j, word) in words.into_iter().enumerate() {
            let operator = unknown_operator(space, order, j + 1, &mut unknowns);
            blocks.push(AnsatzBlock { word, operator });
        }
    }
    let generator = Expr::sum(blocks.iter().map(AnsatzBlock::to_expr));
    Ok(Ansatz { generator, unknowns, blocks })
}

impl Ansatz {
    /// Replace every unknown by its value in `solution`.
    ///
    /// Unknowns missing from `solution` are kept.
    pub fn substitute(&self, solution: &IndexMap<Symbol, Scalar>) -> Result<Expr> {
        let terms: Vec<Expr>
            = self.blocks.iter()
            .map(|block| {
                let operator = block.operator.try_map_entries(|x| {
                    x.subst(solution).ok_or_else(|| {
                        Error::Structural(format!(
                            "substitution into `{}` divides by zero",
                            block.operator,
                        ))
                    })
                })?;
                Ok(AnsatzBlock { word: block.word.clone(), operator }.to_expr())
            })
            .collect::<Result<_>>()?;
        Ok(Expr::sum(terms))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ hilbert::SubSpace, nd_utils::from_ints };

    fn space() -> ProductSpace { ProductSpace::new(vec![SubSpace::new("q", 2)]).unwrap() }

    #[test]
    fn finite_only() {
        let sp = space();
        let v = Expr::symbol("g", 1)
            * Expr::finite("X", &sp.factors()[0], from_ints([[0, 1], [1, 0]]));
        let ans = build_ansatz(&v, &sp, 1, false, &Classifier::default()).unwrap();
        assert_eq!(ans.blocks.len(), 1);
        assert_eq!(ans.unknowns.len(), 4);
        assert_eq!(ans.unknowns[1].name(), "S^(0)_1[0,1]");
        assert!(ans.unknowns.iter().all(|u| u.order() == 1));
        assert!(ans.blocks[0].operator.subspace().is_composite());
    }

    #[test]
    fn boson_blocks() {
        let sp = space();
        let x = Expr::finite("X", &sp.factors()[0], from_ints([[0, 1], [1, 0]]));
        let g = Expr::symbol("g", 2);
        let v = g.clone() * x.clone() * Expr::annihilate("a")
            + g.clone() * Expr::create("a") * x.clone()
            + Expr::annihilate("a") * x.clone();
        let ans = build_ansatz(&v, &sp, 2, true, &Classifier::default()).unwrap();
        assert_eq!(ans.blocks.len(), 3);
        assert_eq!(ans.unknowns.len(), 12);
        assert_eq!(ans.blocks[1].word, BosonWord::from_counts([("a", 0, 1)]));
        assert_eq!(ans.blocks[2].word, BosonWord::from_counts([("a", 1, 0)]));
        assert_eq!(ans.blocks[2].operator.name(), "S^(2)_2");
    }

    #[test]
    fn substitution() {
        let sp = space();
        let ans = build_ansatz(&Expr::zero(), &sp, 1, false, &Classifier::default()).unwrap();
        let g = Scalar::symbol(Symbol::new("g", 1));
        let solution: IndexMap<Symbol, Scalar>
            = ans.unknowns.iter().enumerate()
            .map(|(k, u)| (u.clone(), if k == 1 { g.clone() } else { Scalar::zero() }))
            .collect();
        let s = ans.substitute(&solution).unwrap();
        let m = crate::expansion::domain_expansion(&s, sp.factors()).unwrap();
        assert_eq!(m.finite_block()[[0, 1]], g);
        assert!(m.finite_block()[[1, 0]].is_zero());
    }
}
