//! Gauss-Jordan elimination over the [`Scalar`] field.

use indexmap::IndexMap;
use rustc_hash::FxHashSet as HashSet;
use tracing::{ debug, trace };
use crate::{
    config::FreeUnknowns,
    error::SolveFailure,
    scalar::{ Poly, Scalar, Symbol },
};

/// A scalar equation `lhs == 0`, labelled for error reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Equation {
    pub lhs: Scalar,
    pub label: String,
}

impl Equation {
    pub fn new(lhs: Scalar, label: &str) -> Self {
        Self { lhs, label: label.to_string() }
    }
}

#[derive(Clone, Debug)]
struct Row {
    coeffs: Vec<Scalar>,
    rhs: Scalar,
    label: String,
}

impl Row {
    /// Write `eq` as `Σ_u a_u u == rhs`.
    ///
    /// Only the numerator matters, provided the denominator is free of
    /// unknowns.
    fn from_equation(eq: &Equation, unknowns: &[Symbol]) -> Result<Self, SolveFailure> {
        let nonlinear = || SolveFailure::Nonlinear { equation: eq.label.clone() };
        if unknowns.iter().any(|u| eq.lhs.denom().contains(u)) {
            return Err(nonlinear());
        }
        let mut coeffs: Vec<Scalar> = vec![Scalar::zero(); unknowns.len()];
        let mut rhs = Scalar::zero();
        for (m, c) in eq.lhs.numer().terms() {
            let mut found: Option<(usize, Scalar)> = None;
            let degree: u32 = unknowns.iter().map(|u| m.degree_in(u)).sum();
            match degree {
                0 => {
                    rhs = &rhs - &Scalar::from_poly(Poly::term(m.clone(), c.clone()));
                },
                1 => {
                    found = unknowns.iter().enumerate()
                        .find_map(|(k, u)| {
                            let (e, rest) = m.split_off(u);
                            (e == 1).then(|| (k, Scalar::from_poly(Poly::term(rest, c.clone()))))
                        });
                },
                _ => { return Err(nonlinear()); },
            }
            if let Some((k, a)) = found {
                coeffs[k] = &coeffs[k] + &a;
            }
        }
        Ok(Self { coeffs, rhs, label: eq.label.clone() })
    }

    fn is_trivial(&self) -> bool {
        self.rhs.is_zero() && self.coeffs.iter().all(Scalar::is_zero)
    }
}

/// Solve a linear system for `unknowns`.
///
/// Every unknown appears in the result. Unknowns left free by a consistent
/// system are set to zero under [`FreeUnknowns::Zero`] and reported as
/// [`SolveFailure::Underdetermined`] under [`FreeUnknowns::Reject`].
pub fn solve_linear(
    equations: &[Equation],
    unknowns: &[Symbol],
    free: FreeUnknowns,
) -> Result<IndexMap<Symbol, Scalar>, SolveFailure>
{
    let mut rows: Vec<Row> = Vec::new();
    for eq in equations.iter() {
        let row = Row::from_equation(eq, unknowns)?;
        if !row.is_trivial() { rows.push(row); }
    }
    let n = unknowns.len();
    let mut pivots: Vec<usize> = Vec::new();
    let mut rank: usize = 0;
    for col in 0..n {
        let Some(p) = (rank..rows.len()).find(|&r| !rows[r].coeffs[col].is_zero())
            else { continue; };
        rows.swap(rank, p);
        let Some(inv) = rows[rank].coeffs[col].recip() else { continue; };
        let pivot_row = {
            let row = &rows[rank];
            Row {
                coeffs: row.coeffs.iter().map(|a| a * &inv).collect(),
                rhs: &row.rhs * &inv,
                label: row.label.clone(),
            }
        };
        for (r, row) in rows.iter_mut().enumerate() {
            if r == rank || row.coeffs[col].is_zero() { continue; }
            let f = row.coeffs[col].clone();
            row.coeffs.iter_mut().zip(pivot_row.coeffs.iter())
                .for_each(|(a, b)| { *a = &*a - &(&f * b); });
            row.rhs = &row.rhs - &(&f * &pivot_row.rhs);
        }
        rows[rank] = pivot_row;
        pivots.push(col);
        rank += 1;
    }
    if let Some(bad) = rows[rank..].iter().find(|row| !row.rhs.is_zero()) {
        return Err(SolveFailure::Inconsistent { equation: bad.label.clone() });
    }
    let pivot_cols: HashSet<usize> = pivots.iter().copied().collect();
    let free_cols: Vec<usize> = (0..n).filter(|c| !pivot_cols.contains(c)).collect();
    trace!(rank, free = free_cols.len(), "linear system reduced");
    if !free_cols.is_empty() && free == FreeUnknowns::Reject {
        return Err(SolveFailure::Underdetermined {
            unknowns: free_cols.iter().map(|&c| unknowns[c].to_string()).collect(),
        });
    }
    if !free_cols.is_empty() {
        debug!(count = free_cols.len(), "free unknowns pinned to zero");
    }
    let mut solution: IndexMap<Symbol, Scalar>
        = unknowns.iter().map(|u| (u.clone(), Scalar::zero())).collect();
    for (r, &col) in pivots.iter().enumerate() {
        solution.insert(unknowns[col].clone(), rows[r].rhs.clone());
    }
    Ok(solution)
}
