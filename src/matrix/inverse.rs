//! Dense inverse and pseudo-inverse primitives.
//!
//! [`DenseInverse`] is the seam the block-Jacobi builder inverts through. The
//! direct inverse must report exact singularity as [`PrecondError::SingularMatrix`]
//! so callers can fall back to the pseudo-inverse for that condition only;
//! every other failure is a [`PrecondError::LinearAlgebra`].
//!
//! [`LuInverse`] is the default implementation, built on Faer's dense solvers:
//! - `inverse`: LU with partial pivoting. An exact zero on the diagonal of `U`
//!   marks the matrix singular, the same test LAPACK's `getrf` applies.
//! - `pseudo_inverse`: Moore-Penrose inverse `A⁺ = V Σ⁺ Uᵀ` from Faer's SVD.
//!   Singular values at or below `max(rows, cols) · ε · σ_max` are dropped.
//!
//! # References
//! - Faer documentation: https://github.com/sarah-ek/faer-rs
//! - Golub & Van Loan, Matrix Computations, §3.2 and §5.5

use crate::error::PrecondError;
use faer::Mat;
use faer::linalg::solvers::{DenseSolveCore, PartialPivLu, Svd};

/// Inverse and pseudo-inverse of a small dense matrix.
pub trait DenseInverse: Sync {
    /// Compute `A⁻¹`. Fails with [`PrecondError::SingularMatrix`] if `A` is singular.
    fn inverse(&self, a: &Mat<f64>) -> Result<Mat<f64>, PrecondError>;
    /// Compute the Moore-Penrose pseudo-inverse `A⁺`.
    fn pseudo_inverse(&self, a: &Mat<f64>) -> Result<Mat<f64>, PrecondError>;
}

/// LU inverse with an SVD pseudo-inverse fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct LuInverse;

impl LuInverse {
    pub fn new() -> Self {
        Self
    }
}

fn check_finite(a: &Mat<f64>) -> Result<(), PrecondError> {
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            if !a[(i, j)].is_finite() {
                return Err(PrecondError::LinearAlgebra(format!(
                    "non-finite entry at ({i}, {j})"
                )));
            }
        }
    }
    Ok(())
}

impl DenseInverse for LuInverse {
    fn inverse(&self, a: &Mat<f64>) -> Result<Mat<f64>, PrecondError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(PrecondError::LinearAlgebra(format!(
                "cannot invert a {}x{} matrix",
                n,
                a.ncols()
            )));
        }
        check_finite(a)?;
        if n == 0 {
            return Ok(Mat::zeros(0, 0));
        }

        let lu = PartialPivLu::new(a.as_ref());
        let u = lu.U();
        // a zero pivot stays exactly zero on the diagonal; later pivots turn NaN
        if (0..n).any(|i| u[(i, i)] == 0.0 || u[(i, i)].is_nan()) {
            return Err(PrecondError::SingularMatrix);
        }
        let inv = lu.inverse();
        check_finite(&inv).map_err(|_| {
            PrecondError::LinearAlgebra("inverse overflowed to a non-finite value".into())
        })?;
        Ok(inv)
    }

    fn pseudo_inverse(&self, a: &Mat<f64>) -> Result<Mat<f64>, PrecondError> {
        check_finite(a)?;
        let (rows, cols) = (a.nrows(), a.ncols());
        if rows == 0 || cols == 0 {
            return Ok(Mat::zeros(cols, rows));
        }

        let svd = Svd::new(a.as_ref())
            .map_err(|e| PrecondError::LinearAlgebra(format!("svd failed: {e:?}")))?;
        let (u, v, s) = (svd.U(), svd.V(), svd.S());
        let rank = rows.min(cols);
        let s_max = (0..rank).map(|k| s[k]).fold(0.0f64, f64::max);
        let cutoff = rows.max(cols) as f64 * f64::EPSILON * s_max;

        // A⁺ = Σ_k v_k u_kᵀ / σ_k over the retained singular values
        let mut pinv = Mat::<f64>::zeros(cols, rows);
        for k in 0..rank {
            let sk = s[k];
            if sk <= cutoff || sk == 0.0 {
                continue;
            }
            for i in 0..cols {
                let vik = v[(i, k)] / sk;
                if vik == 0.0 {
                    continue;
                }
                for j in 0..rows {
                    pinv[(i, j)] += vik * u[(j, k)];
                }
            }
        }
        check_finite(&pinv).map_err(|_| {
            PrecondError::LinearAlgebra("pseudo-inverse overflowed to a non-finite value".into())
        })?;
        Ok(pinv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_mat_eq(a: &Mat<f64>, b: &Mat<f64>, eps: f64) {
        assert_eq!(a.nrows(), b.nrows());
        assert_eq!(a.ncols(), b.ncols());
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                assert_abs_diff_eq!(a[(i, j)], b[(i, j)], epsilon = eps);
            }
        }
    }

    #[test]
    fn inverse_of_spd_block() {
        let a = Mat::from_fn(2, 2, |i, j| [[4.0, 1.0], [1.0, 3.0]][i][j]);
        let inv = LuInverse::new().inverse(&a).unwrap();
        let expected = Mat::from_fn(2, 2, |i, j| [[3.0, -1.0], [-1.0, 4.0]][i][j] / 11.0);
        assert_mat_eq(&inv, &expected, 1e-14);
    }

    #[test]
    fn inverse_needs_pivoting() {
        let a = Mat::from_fn(2, 2, |i, j| [[0.0, 1.0], [1.0, 0.0]][i][j]);
        let inv = LuInverse::new().inverse(&a).unwrap();
        assert_mat_eq(&inv, &a, 1e-15);
    }

    #[test]
    fn singular_is_distinguishable() {
        let a = Mat::from_fn(2, 2, |_, _| 1.0);
        assert_eq!(LuInverse::new().inverse(&a).unwrap_err(), PrecondError::SingularMatrix);
        let z = Mat::<f64>::zeros(3, 3);
        assert_eq!(LuInverse::new().inverse(&z).unwrap_err(), PrecondError::SingularMatrix);
        let first_col_zero = Mat::from_fn(3, 3, |i, j| if j == 0 { 0.0 } else { (i + j) as f64 });
        assert_eq!(
            LuInverse::new().inverse(&first_col_zero).unwrap_err(),
            PrecondError::SingularMatrix
        );
    }

    #[test]
    fn non_finite_is_fatal() {
        let mut a = Mat::<f64>::identity(2, 2);
        a[(0, 1)] = f64::NAN;
        assert!(matches!(
            LuInverse::new().inverse(&a),
            Err(PrecondError::LinearAlgebra(_))
        ));
        assert!(matches!(
            LuInverse::new().pseudo_inverse(&a),
            Err(PrecondError::LinearAlgebra(_))
        ));
    }

    #[test]
    fn pseudo_inverse_of_rank_one() {
        let a = Mat::from_fn(2, 2, |_, _| 1.0);
        let p = LuInverse::new().pseudo_inverse(&a).unwrap();
        assert_mat_eq(&p, &Mat::from_fn(2, 2, |_, _| 0.25), 1e-12);
    }

    #[test]
    fn pseudo_inverse_of_zero_is_zero() {
        let p = LuInverse::new().pseudo_inverse(&Mat::<f64>::zeros(3, 3)).unwrap();
        assert_mat_eq(&p, &Mat::<f64>::zeros(3, 3), 0.0);
    }

    #[test]
    fn pseudo_inverse_matches_inverse_when_regular() {
        let a = Mat::from_fn(3, 3, |i, j| [[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]][i][j]);
        let lu = LuInverse::new();
        assert_mat_eq(&lu.pseudo_inverse(&a).unwrap(), &lu.inverse(&a).unwrap(), 1e-10);
    }

    #[test]
    fn pseudo_inverse_satisfies_penrose_identity() {
        // singular symmetric: third row = first + second
        let rows = [[2.0, 1.0, 3.0], [1.0, 2.0, 3.0], [3.0, 3.0, 6.0]];
        let a = Mat::from_fn(3, 3, |i, j| rows[i][j]);
        let p = LuInverse::new().pseudo_inverse(&a).unwrap();
        let apa = &(&a * &p) * &a;
        assert_mat_eq(&apa, &a, 1e-10);
        let pap = &(&p * &a) * &p;
        assert_mat_eq(&pap, &p, 1e-10);
    }

    #[test]
    fn pseudo_inverse_of_rank_deficient_gram_blocks() {
        for (n, r) in [(12, 5), (40, 17)] {
            // integer factor so A = F Fᵀ is exact and has rank at most r
            let f = Mat::from_fn(n, r, |i, j| ((i * 7 + j * 3 + i * j) % 11) as f64 - 5.0);
            let ft = f.transpose().to_owned();
            let a = &f * &ft;
            let p = LuInverse::new().pseudo_inverse(&a).unwrap();
            assert!((0..n).all(|i| (0..n).all(|j| p[(i, j)].is_finite())));
            let apa = &(&a * &p) * &a;
            assert_mat_eq(&apa, &a, 1e-8);
        }
    }

    #[test]
    fn pseudo_inverse_of_wide_matrix() {
        let a = Mat::from_fn(1, 2, |_, j| [3.0, 4.0][j]);
        let p = LuInverse::new().pseudo_inverse(&a).unwrap();
        assert_eq!((p.nrows(), p.ncols()), (2, 1));
        assert_abs_diff_eq!(p[(0, 0)], 3.0 / 25.0, epsilon = 1e-14);
        assert_abs_diff_eq!(p[(1, 0)], 4.0 / 25.0, epsilon = 1e-14);
    }
}
