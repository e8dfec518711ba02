//! Order-by-order Schrieffer-Wolff transformation.
//!
//! The transformed Hamiltonian is `H' = e^{-S} H e^{S} = Σ_n [H, S]_n / n!`
//! with `[H, S]_0 = H` and `[H, S]_n = [[H, S]_{n-1}, S]`. At each order `k`
//! a generator `S_k` is chosen so that the off-diagonal order-`k` part of
//! `H'` vanishes, and the diagonal order-`k` part is added to the effective
//! Hamiltonian.

use tracing::{ debug, info, trace };
use crate::{
    ansatz::{ build_ansatz, Ansatz },
    classify::Classifier,
    config::SolverConfig,
    error::{ AtOrder, Error, Result, Step },
    expansion::{ identities_for, ExpandedMatrix, ExpansionContext },
    expr::Expr,
    hilbert::ProductSpace,
    linsolve::{ solve_linear, Equation },
};

/// Output of [`Solver::run`].
#[derive(Clone, Debug)]
pub struct EffectiveHamiltonian {
    /// Diagonal effective Hamiltonian, truncated at [`Self::order`].
    pub effective: Expr,
    /// Accumulated generator `S = S_1 + ... + S_order`.
    pub generator: Expr,
    /// Off-diagonal part of the next order left by the last step.
    pub remainder: Expr,
    /// Product space of the finite sector, in Kronecker order.
    pub space: ProductSpace,
    /// Truncation order the result was computed to.
    pub order: u32,
}

impl EffectiveHamiltonian {
    /// Matrix form of the effective Hamiltonian, one block per boson word.
    pub fn expanded(&self) -> Result<ExpandedMatrix> {
        ExpansionContext::new(self.space.factors(), Default::default(), Default::default())?
            .expand(&self.effective)
    }
}

fn term_count(expr: &Expr) -> usize {
    match expr {
        Expr::Sum(terms) => terms.len(),
        e if *e == Expr::zero() => 0,
        _ => 1,
    }
}

/// Drives the perturbative expansion under a fixed [`SolverConfig`].
#[derive(Clone, Debug)]
pub struct Solver {
    config: SolverConfig,
    classifier: Classifier,
}

impl Solver {
    /// Create a new solver, validating `config`.
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        let classifier = Classifier::new(config.budget());
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &SolverConfig { &self.config }

    fn vanishes(ctx: &ExpansionContext, expr: &Expr) -> Result<bool> {
        Ok(ctx.expand(expr)?.is_zero())
    }

    /// Sum of the components of `expr` with order at most `max_order`.
    fn truncate(&self, expr: &Expr, max_order: i64) -> Result<Expr> {
        let kept: Vec<Expr>
            = self.classifier.group_by_order(expr)?
            .into_iter()
            .filter(|(order, _)| *order <= max_order)
            .map(|(_, e)| e)
            .collect();
        Ok(Expr::sum(kept))
    }

    /// Truncated series `Σ_{n=0}^{max_order} [h, s]_n / n!`, keeping only
    /// orders up to `max_order`.
    fn transformed(&self, ctx: &ExpansionContext, h: &Expr, s: &Expr, max_order: u32)
        -> Result<Expr>
    {
        let mut term = h.clone();
        let mut total = h.clone();
        for n in 1..=max_order {
            let c = ctx.resolve(&Expr::commutator(term, s.clone()))?;
            let c = self.truncate(&c, i64::from(max_order))?;
            term = ctx.resolve(&(Expr::rational(1, i64::from(n)) * c))?;
            if term == Expr::zero() { break; }
            total = total + term.clone();
        }
        ctx.resolve(&total)
    }

    /// Entry-wise equations `[H0, S_k] + target == 0`, one set per boson
    /// word.
    fn equations(
        ctx: &ExpansionContext,
        classifier: &Classifier,
        h0: &Expr,
        ansatz: &Ansatz,
        target: &Expr,
    ) -> Result<Vec<Equation>>
    {
        let lhs = Expr::commutator(h0.clone(), ansatz.generator.clone()) + target.clone();
        let mut equations: Vec<Equation> = Vec::new();
        for (word, finite) in classifier.group_by_bosons(&lhs)?.iter() {
            let m = ctx.expand(finite)?.finite_block();
            let before = equations.len();
            for ((r, c), x) in m.indexed_iter() {
                if x.is_zero() { continue; }
                equations.push(Equation::new(x.clone(), &format!("{word} [{r},{c}]")));
            }
            trace!(word = %word, equations = equations.len() - before, "boson group expanded");
        }
        Ok(equations)
    }

    /// Compute the effective Hamiltonian of `hamiltonian` through the
    /// configured order.
    pub fn run(&self, hamiltonian: &Expr) -> Result<EffectiveHamiltonian> {
        let order = self.config.order;
        let classifier = &self.classifier;
        let subspaces = self.config.resolve_subspaces(&hamiltonian.finite_subspaces())?;
        let ctx = ExpansionContext::new(
            &subspaces, identities_for(hamiltonian), self.config.budget())?;
        let infinite = hamiltonian.has_bosons();
        info!(
            order,
            dim = ctx.space().dim(),
            space = %ctx.space().full(),
            infinite,
            "computing effective Hamiltonian"
        );

        let h = ctx.resolve(hamiltonian)?;
        let by_order = classifier.group_by_order(&h)?;
        if let Some(k) = by_order.keys().find(|k| **k < 0) {
            return Err(Error::Structural(
                format!("the Hamiltonian has a component of negative order {k}")));
        }
        let h0 = by_order.get(&0).cloned().unwrap_or_default();
        let split0 = classifier.group_by_diagonal(&h0)?;
        if !Self::vanishes(&ctx, &split0.off_diagonal)? {
            return Err(Error::Structural(format!(
                "the order-0 part of the Hamiltonian is not diagonal: {}",
                split0.off_diagonal,
            )));
        }
        if Self::vanishes(&ctx, &split0.diagonal)? {
            return Err(Error::MissingOrderZero);
        }

        let mut h_final = h0.clone();
        let mut b = Expr::zero();
        let mut s = Expr::zero();
        let mut h_below = h0.clone();
        for k in 1..=order {
            let ko = i64::from(k);
            let h_k = by_order.get(&ko).cloned().unwrap_or_default();
            h_below = ctx.resolve(&(h_below + h_k)).at(k, Step::Classify)?;
            let v_k
                = classifier.group_by_diagonal(&h_below)
                .and_then(|split| classifier.order_component(&split.off_diagonal, ko))
                .at(k, Step::Classify)?;
            let target = ctx.resolve(&(v_k.clone() + b.clone())).at(k, Step::Classify)?;

            let ansatz = build_ansatz(&target, ctx.space(), k, infinite, classifier)
                .at(k, Step::Ansatz)?;
            let equations = Self::equations(&ctx, classifier, &h0, &ansatz, &target)
                .at(k, Step::Equation)?;
            debug!(
                order = k,
                v_terms = term_count(&v_k),
                b_terms = term_count(&b),
                unknowns = ansatz.unknowns.len(),
                equations = equations.len(),
                "generator equations assembled"
            );
            let solution = solve_linear(&equations, &ansatz.unknowns, self.config.free_unknowns)
                .at(k, Step::Solve)?;
            let s_k = ansatz.substitute(&solution)
                .and_then(|e| ctx.resolve(&e))
                .at(k, Step::Substitute)?;
            debug!(order = k, generator_terms = term_count(&s_k), "generator solved");
            s = ctx.resolve(&(s + s_k)).at(k, Step::Substitute)?;

            let mut t
                = self.transformed(&ctx, &h_below, &s, k + 1)
                .and_then(|t| classifier.group_by_order(&t))
                .at(k, Step::Correction)?;
            let t_k = t.swap_remove(&ko).unwrap_or_default();
            let t_next = t.swap_remove(&(ko + 1)).unwrap_or_default();
            let diag_k = classifier.group_by_diagonal(&t_k).at(k, Step::Correction)?.diagonal;
            h_final = ctx.resolve(&(h_final + diag_k)).at(k, Step::Correction)?;
            b = classifier.group_by_diagonal(&t_next).at(k, Step::Correction)?.off_diagonal;
            debug!(order = k, remainder_terms = term_count(&b), "order complete");
        }

        info!(order, terms = term_count(&h_final), "effective Hamiltonian computed");
        Ok(EffectiveHamiltonian {
            effective: h_final,
            generator: s,
            remainder: b,
            space: ctx.space().clone(),
            order,
        })
    }
}

/// Compute the effective Hamiltonian through `order` with otherwise default
/// settings.
pub fn solve(hamiltonian: &Expr, order: u32) -> Result<EffectiveHamiltonian> {
    Solver::new(SolverConfig::default().with_order(order))?.run(hamiltonian)
}
