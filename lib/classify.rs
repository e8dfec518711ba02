//! Classification passes over decomposed expressions.
//!
//! Every pass dispatches on the node kind: leaves are classified directly and
//! any compound expression is decomposed into terms and factors first, with
//! per-term results accumulated into sums keyed by the classification.

use indexmap::IndexMap;
use crate::{
    algebra::{ self, BosonWord, Canonical, Word },
    config::TermBudget,
    decompose::{ decompose_with, Decomposition },
    error::{ Error, Result },
    expr::{ Expr, Ladder },
};

/// Result of [`Classifier::group_by_infinite`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfiniteSplit {
    /// Terms containing at least one boson operator.
    pub infinite: Expr,
    /// Terms with no boson operators.
    pub finite: Expr,
}

impl InfiniteSplit {
    pub fn get(&self, infinite: bool) -> &Expr {
        if infinite { &self.infinite } else { &self.finite }
    }
}

/// Result of [`Classifier::group_by_diagonal`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagonalSplit {
    pub diagonal: Expr,
    pub off_diagonal: Expr,
}

impl DiagonalSplit {
    pub fn get(&self, diagonal: bool) -> &Expr {
        if diagonal { &self.diagonal } else { &self.off_diagonal }
    }
}

/// Per-mode, per-ladder-kind operator counts.
pub type BosonCounts = IndexMap<String, IndexMap<Ladder, u32>>;

/// Runs the classification passes under a fixed [`TermBudget`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Classifier {
    budget: TermBudget,
}

fn split_sum<K>(groups: IndexMap<K, Vec<Expr>>) -> IndexMap<K, Expr>
where K: std::hash::Hash + Eq
{
    groups.into_iter().map(|(k, terms)| (k, Expr::sum(terms))).collect()
}

impl Classifier {
    pub fn new(budget: TermBudget) -> Self { Self { budget } }

    pub fn budget(&self) -> TermBudget { self.budget }

    fn decompose(&self, expr: &Expr) -> Result<Decomposition> {
        decompose_with(expr, self.budget)
    }

    /// Perturbative order of a single factor.
    pub fn factor_order(factor: &Expr) -> Result<i64> {
        match factor {
            Expr::Symbol(s) => Ok(i64::from(s.order())),
            Expr::Fraction(s) => s.order().ok_or_else(|| {
                Error::Structural(
                    format!("`{s}` mixes perturbative orders and has no single order"))
            }),
            Expr::Number(_) | Expr::Finite(_) | Expr::Boson(_) => Ok(0),
            other => Err(Error::Structural(
                format!("`{other}` is not an elementary factor"))),
        }
    }

    /// Group terms by perturbative order.
    ///
    /// Orders with no terms are absent from the result.
    pub fn group_by_order(&self, expr: &Expr) -> Result<IndexMap<i64, Expr>> {
        let mut groups: IndexMap<i64, Vec<Expr>> = IndexMap::new();
        match expr {
            Expr::Number(_) | Expr::Symbol(_) | Expr::Fraction(_)
                | Expr::Finite(_) | Expr::Boson(_)
            => {
                groups.insert(Self::factor_order(expr)?, vec![expr.clone()]);
            },
            _ => {
                for (term, factors) in self.decompose(expr)?.iter() {
                    let order: i64
                        = factors.iter()
                        .map(Self::factor_order)
                        .sum::<Result<i64>>()?;
                    groups.entry(order).or_default().push(term.clone());
                }
            },
        }
        Ok(split_sum(groups))
    }

    /// Return the order-`order` component of `expr`, or zero.
    pub fn order_component(&self, expr: &Expr, order: i64) -> Result<Expr> {
        Ok(self.group_by_order(expr)?.swap_remove(&order).unwrap_or_default())
    }

    /// Split terms by whether they contain any boson operator.
    pub fn group_by_infinite(&self, expr: &Expr) -> Result<InfiniteSplit> {
        let mut infinite: Vec<Expr> = Vec::new();
        let mut finite: Vec<Expr> = Vec::new();
        match expr {
            Expr::Boson(_) => { infinite.push(expr.clone()); },
            Expr::Number(_) | Expr::Symbol(_) | Expr::Fraction(_) | Expr::Finite(_)
                => { finite.push(expr.clone()); },
            _ => {
                for (term, factors) in self.decompose(expr)?.iter() {
                    if factors.iter().any(|f| matches!(f, Expr::Boson(_))) {
                        infinite.push(term.clone());
                    } else {
                        finite.push(term.clone());
                    }
                }
            },
        }
        Ok(InfiniteSplit { infinite: Expr::sum(infinite), finite: Expr::sum(finite) })
    }

    /// Count boson operators per mode and ladder kind across every factor of
    /// every term.
    ///
    /// Modes with no boson operators are absent.
    pub fn count_bosons(&self, expr: &Expr) -> Result<BosonCounts> {
        let mut counts = BosonCounts::new();
        let mut tally = |f: &Expr| {
            if let Expr::Boson(op) = f {
                *counts.entry(op.mode().to_string()).or_default()
                    .entry(op.ladder()).or_insert(0) += 1;
            }
        };
        match expr {
            Expr::Number(_) | Expr::Symbol(_) | Expr::Fraction(_)
                | Expr::Finite(_) | Expr::Boson(_)
                => { tally(expr); },
            _ => {
                self.decompose(expr)?.factors.iter()
                    .flat_map(|factors| factors.iter())
                    .for_each(&mut tally);
            },
        }
        Ok(counts)
    }

    /// Return `true` if a single factor has no off-diagonal finite content.
    ///
    /// Boson factors are accounted for by the occupation balance of the whole
    /// term and count as diagonal here.
    fn factor_is_diagonal(factor: &Expr) -> bool {
        match factor {
            Expr::Finite(op) => op.is_diagonal(),
            Expr::Number(_) | Expr::Symbol(_) | Expr::Fraction(_) | Expr::Boson(_)
                => true,
            _ => false,
        }
    }

    fn term_is_diagonal(factors: &[Expr]) -> bool {
        let word = BosonWord::from_counts(
            factors.iter()
                .filter_map(|f| match f {
                    Expr::Boson(op) => Some(match op.ladder() {
                        Ladder::Creation => (op.mode(), 1, 0),
                        Ladder::Annihilation => (op.mode(), 0, 1),
                    }),
                    _ => None,
                })
        );
        word.is_balanced() && factors.iter().all(Self::factor_is_diagonal)
    }

    /// Split terms by whether they are diagonal.
    ///
    /// A term is diagonal if every boson mode in it has as many creation as
    /// annihilation operators and every finite factor has a diagonal matrix.
    pub fn group_by_diagonal(&self, expr: &Expr) -> Result<DiagonalSplit> {
        let mut diagonal: Vec<Expr> = Vec::new();
        let mut off_diagonal: Vec<Expr> = Vec::new();
        match expr {
            Expr::Number(_) | Expr::Symbol(_) | Expr::Fraction(_)
                => { diagonal.push(expr.clone()); },
            Expr::Finite(op) => {
                if op.is_diagonal() {
                    diagonal.push(expr.clone());
                } else {
                    off_diagonal.push(expr.clone());
                }
            },
            Expr::Boson(_) => { off_diagonal.push(expr.clone()); },
            _ => {
                for (term, factors) in self.decompose(expr)?.iter() {
                    if Self::term_is_diagonal(factors) {
                        diagonal.push(term.clone());
                    } else {
                        off_diagonal.push(term.clone());
                    }
                }
            },
        }
        Ok(DiagonalSplit {
            diagonal: Expr::sum(diagonal),
            off_diagonal: Expr::sum(off_diagonal),
        })
    }

    /// Group terms by their normal-ordered boson word, mapping each word to
    /// the sum of its finite co-factors.
    ///
    /// Pure-finite terms are collected under the empty word.
    pub fn group_by_bosons(&self, expr: &Expr) -> Result<IndexMap<BosonWord, Expr>> {
        let canon = algebra::expand(expr, self.budget)?;
        let mut groups: IndexMap<BosonWord, Canonical> = IndexMap::new();
        for (word, coeff) in canon.iter() {
            let cofactor = Word { finite: word.finite.clone(), bosons: BosonWord::empty() };
            groups.entry(word.bosons.clone())
                .or_insert_with(|| Canonical::zero(self.budget))
                .add_term(cofactor, coeff.clone())?;
        }
        Ok(groups.into_iter().map(|(w, c)| (w, c.into_expr())).collect())
    }
}

/// [`Classifier::group_by_order`] with the default term budget.
pub fn group_by_order(expr: &Expr) -> Result<IndexMap<i64, Expr>> {
    Classifier::default().group_by_order(expr)
}

/// [`Classifier::group_by_infinite`] with the default term budget.
pub fn group_by_infinite(expr: &Expr) -> Result<InfiniteSplit> {
    Classifier::default().group_by_infinite(expr)
}

/// [`Classifier::count_bosons`] with the default term budget.
pub fn count_bosons(expr: &Expr) -> Result<BosonCounts> {
    Classifier::default().count_bosons(expr)
}

/// [`Classifier::group_by_diagonal`] with the default term budget.
pub fn group_by_diagonal(expr: &Expr) -> Result<DiagonalSplit> {
    Classifier::default().group_by_diagonal(expr)
}

/// [`Classifier::group_by_bosons`] with the default term budget.
pub fn group_by_bosons(expr: &Expr) -> Result<IndexMap<BosonWord, Expr>> {
    Classifier::default().group_by_bosons(expr)
}
