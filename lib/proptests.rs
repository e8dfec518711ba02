//! Property-based tests for the classifiers and domain expansion.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{
        classify::{ group_by_diagonal, group_by_infinite, group_by_order },
        expansion::domain_expansion,
        expr::Expr,
        hilbert::SubSpace,
        nd_utils::from_ints,
        scalar::Scalar,
    };

    fn op(k: usize) -> Expr {
        let x = SubSpace::new("x", 2);
        let y = SubSpace::new("y", 2);
        match k {
            0 => Expr::finite("A", &x, from_ints([[0, 1], [1, 0]])),
            1 => Expr::finite("Z", &x, from_ints([[1, 0], [0, -1]])),
            _ => Expr::finite("B", &y, from_ints([[2, 0], [0, 3]])),
        }
    }

    fn sym(k: usize) -> Expr {
        match k {
            0 => Expr::symbol("w", 0),
            1 => Expr::symbol("g", 1),
            _ => Expr::symbol("h", 2),
        }
    }

    fn bosons(creations: usize, annihilations: usize) -> Expr {
        Expr::product(
            std::iter::repeat(Expr::create("a")).take(creations)
                .chain(std::iter::repeat(Expr::annihilate("a")).take(annihilations))
        )
    }

    // A single product term: coefficient, symbol, optional finite operator,
    // boson word.
    fn term() -> impl Strategy<Value = Expr> {
        (
            prop_oneof![1i64..4, -3i64..0],
            0usize..3,
            proptest::option::of(0usize..3),
            0usize..3,
            0usize..3,
        )
            .prop_map(|(c, s, o, cr, an)| {
                let mut factors = vec![Expr::int(c), sym(s)];
                if let Some(k) = o { factors.push(op(k)); }
                factors.push(bosons(cr, an));
                Expr::product(factors)
            })
    }

    fn expr() -> impl Strategy<Value = Expr> {
        proptest::collection::vec(term(), 1..4).prop_map(Expr::sum)
    }

    proptest! {
        #[test]
        fn order_grouping_is_additive(a in expr(), b in expr()) {
            let ga = group_by_order(&a).unwrap();
            let gb = group_by_order(&b).unwrap();
            let gab = group_by_order(&(a.clone() + b.clone())).unwrap();
            let keys: Vec<i64>
                = ga.keys().chain(gb.keys()).chain(gab.keys()).copied().collect();
            for k in keys {
                let lhs = gab.get(&k).cloned().unwrap_or_default();
                let rhs = ga.get(&k).cloned().unwrap_or_default()
                    + gb.get(&k).cloned().unwrap_or_default();
                prop_assert!(lhs.equiv(&rhs).unwrap());
            }
        }

        #[test]
        fn infinite_split_is_complete(e in expr()) {
            let split = group_by_infinite(&e).unwrap();
            prop_assert!((split.infinite.clone() + split.finite.clone()).equiv(&e).unwrap());
            prop_assert!(!group_by_infinite(&split.finite).unwrap().finite.has_bosons());
        }

        #[test]
        fn expansion_dimension(
            dims in proptest::collection::vec(1usize..4, 1..4),
            pick in 0usize..8,
        ) {
            let subspaces: Vec<SubSpace>
                = dims.iter().enumerate()
                .map(|(k, d)| SubSpace::new(&format!("s{k}"), *d))
                .collect();
            let target = &subspaces[pick % subspaces.len()];
            let n = target.dim();
            let matrix = ndarray::Array2::from_shape_fn(
                (n, n), |(i, j)| Scalar::from_int((i * n + j) as i64 + 1));
            let e = Expr::finite("M", target, matrix);
            let total: usize = dims.iter().product();
            let m = domain_expansion(&e, &subspaces).unwrap();
            prop_assert_eq!(m.dim(), total);
            prop_assert_eq!(m.finite_block().dim(), (total, total));
        }

        #[test]
        fn boson_imbalance_is_off_diagonal(
            s in 0usize..3,
            cr in 0usize..3,
            an in 0usize..3,
        ) {
            prop_assume!(cr != an);
            let e = sym(s) * op(1) * bosons(cr, an);
            let split = group_by_diagonal(&e).unwrap();
            prop_assert!(split.diagonal.vanishes().unwrap());
            prop_assert!(split.off_diagonal.equiv(&e).unwrap());
        }

        #[test]
        fn diagonal_input_is_fixed(
            terms in proptest::collection::vec((0usize..3, 1usize..3, 0usize..3), 1..4),
        ) {
            let e = Expr::sum(
                terms.into_iter().map(|(s, k, n)| sym(s) * op(k) * bosons(n, n)));
            let split = group_by_diagonal(&e).unwrap();
            prop_assert!(split.diagonal.equiv(&e).unwrap());
            prop_assert!(split.off_diagonal.vanishes().unwrap());
        }
    }
}
