//! Matrix primitives over the [`Scalar`] field.
//!
//! `ndarray`'s own `kron` and `dot` need `LinalgScalar: Copy`, which exact
//! rational functions are not, so the few products needed here are written
//! out by hand.

use ndarray as nd;
use crate::scalar::Scalar;

/// `n × n` identity.
pub fn identity(n: usize) -> nd::Array2<Scalar> {
    nd::Array2::from_shape_fn(
        (n, n),
        |(i, j)| if i == j { Scalar::one() } else { Scalar::zero() },
    )
}

/// Build a square matrix from integer entries.
pub fn from_ints<const N: usize>(rows: [[i64; N]; N]) -> nd::Array2<Scalar> {
    nd::Array2::from_shape_fn((N, N), |(i, j)| Scalar::from_int(rows[i][j]))
}

/// Kronecker product `a ⊗ b`.
pub fn kron(a: &nd::ArrayView2<Scalar>, b: &nd::ArrayView2<Scalar>)
    -> nd::Array2<Scalar>
{
    let (ra, ca) = a.dim();
    let (rb, cb) = b.dim();
    let mut out: nd::Array2<Scalar> = nd::Array2::default((ra * rb, ca * cb));
    for ((i, j), aij) in a.indexed_iter() {
        if aij.is_zero() { continue; }
        for ((k, l), bkl) in b.indexed_iter() {
            if bkl.is_zero() { continue; }
            out[[i * rb + k, j * cb + l]] = aij * bkl;
        }
    }
    out
}

/// Ordered Kronecker product `m_0 ⊗ m_1 ⊗ ... ⊗ m_{n-1}`.
///
/// An empty product is the `1 × 1` identity.
pub fn kron_all<'a, I>(mats: I) -> nd::Array2<Scalar>
where I: IntoIterator<Item = nd::ArrayView2<'a, Scalar>>
{
    mats.into_iter()
        .fold(identity(1), |acc, m| kron(&acc.view(), &m))
}

/// Matrix product `a · b`.
pub fn matmul(a: &nd::ArrayView2<Scalar>, b: &nd::ArrayView2<Scalar>)
    -> nd::Array2<Scalar>
{
    let (n, m) = a.dim();
    let (_, p) = b.dim();
    let mut out: nd::Array2<Scalar> = nd::Array2::default((n, p));
    for i in 0..n {
        for k in 0..m {
            let aik = &a[[i, k]];
            if aik.is_zero() { continue; }
            for j in 0..p {
                let bkj = &b[[k, j]];
                if bkj.is_zero() { continue; }
                out[[i, j]] = &out[[i, j]] + &(aik * bkj);
            }
        }
    }
    out
}

/// Element-wise sum.
pub fn add(a: &nd::ArrayView2<Scalar>, b: &nd::ArrayView2<Scalar>)
    -> nd::Array2<Scalar>
{
    nd::Zip::from(a).and(b).map_collect(|x, y| x + y)
}

/// Multiply every entry by a scalar.
pub fn scale(a: &nd::ArrayView2<Scalar>, c: &Scalar) -> nd::Array2<Scalar> {
    a.map(|x| x * c)
}

/// Return `true` if every entry is exactly zero.
pub fn is_zero(a: &nd::ArrayView2<Scalar>) -> bool {
    a.iter().all(Scalar::is_zero)
}

/// Return `true` if every off-diagonal entry is exactly zero.
pub fn is_diagonal(a: &nd::ArrayView2<Scalar>) -> bool {
    *a == diag_part(a)
}

/// Diagonal matrix built from the diagonal of `a`.
pub fn diag_part(a: &nd::ArrayView2<Scalar>) -> nd::Array2<Scalar> {
    nd::Array2::from_shape_fn(
        a.dim(),
        |(i, j)| if i == j { a[[i, j]].clone() } else { Scalar::zero() },
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kron_ordering() {
        let x = from_ints([[0, 1], [1, 0]]);
        let z = from_ints([[1, 0], [0, -1]]);
        let xz = kron(&x.view(), &z.view());
        let expected = from_ints([
            [0, 0, 1, 0],
            [0, 0, 0, -1],
            [1, 0, 0, 0],
            [0, -1, 0, 0],
        ]);
        assert_eq!(xz, expected);
        assert_eq!(kron_all([x.view(), z.view()]), expected);
    }

    #[test]
    fn products_and_tests() {
        let x = from_ints([[0, 1], [1, 0]]);
        let z = from_ints([[1, 0], [0, -1]]);
        let xx = matmul(&x.view(), &x.view());
        assert_eq!(xx, identity(2));
        assert!(is_diagonal(&xx.view()));
        assert!(!is_diagonal(&x.view()));
        let xz = matmul(&x.view(), &z.view());
        let zx = matmul(&z.view(), &x.view());
        assert!(is_zero(&add(&xz.view(), &zx.view()).view()));
        assert_eq!(diag_part(&add(&x.view(), &z.view()).view()), z);
        assert_eq!(scale(&z.view(), &Scalar::from_int(-1)), from_ints([[-1, 0], [0, 1]]));
    }
}
