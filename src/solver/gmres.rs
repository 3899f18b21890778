//! Generalized Minimal Residual (GMRES) solver with fixed restart (Saad §6.4)
//!
//! This module implements the restarted GMRES algorithm for solving dense, possibly nonsymmetric
//! linear systems Ax = b. Left preconditioning is applied by the caller, who hands in the
//! already-preconditioned operator `P A` and right-hand side `P b`.
//!
//! # Features
//! - Modified Gram-Schmidt with a second orthogonalization pass for numerical stability
//! - Happy breakdown detection for early termination
//! - Givens rotations for least-squares update
//! - Robust back-substitution with zero-pivot protection
//! - Per-iteration observer receiving the residual estimate relative to ‖b‖
//!
//! # Status codes
//! - `0`: converged, ‖r‖ ≤ max(atol, tol · ‖b‖)
//! - `> 0`: iteration budget exhausted; the value is the number of iterations taken
//! - `-1`: the residual became non-finite
//!
//! # References
//! - Saad, Y. (2003). Iterative Methods for Sparse Linear Systems, 2nd Edition. SIAM. §6.4
//! - https://en.wikipedia.org/wiki/Generalized_minimal_residual_method

use crate::core::traits::{InnerProduct, MatVec};
use crate::error::PrecondError;
use crate::solver::LinearSolver;
use crate::utils::convergence::{Convergence, SolveStats};
use num_traits::Float;

/// GMRES solver struct with restart and stopping options.
///
/// # Type Parameters
/// * `T` - Scalar type (e.g., f32, f64)
#[derive(Clone, Debug)]
pub struct GmresSolver<T> {
    /// Number of Arnoldi vectors before restart
    pub restart: usize,
    /// Convergence criteria (tolerances and max iterations)
    pub conv: Convergence<T>,
}

impl<T: Copy + Float> GmresSolver<T> {
    /// Create a new GMRES solver with restart, relative tolerance, and max iterations.
    pub fn new(restart: usize, tol: T, max_iters: usize) -> Self {
        Self {
            restart: restart.max(1),
            conv: Convergence { tol, atol: T::zero(), max_iters },
        }
    }

    /// Set an absolute floor on the stopping threshold.
    pub fn with_atol(mut self, atol: T) -> Self {
        self.conv.atol = atol;
        self
    }

    /// Perform one step of the Arnoldi process.
    /// Returns true if happy breakdown is detected (no new basis vector is pushed).
    fn arnoldi<M, V>(
        a: &M,
        ip: &(),
        v_basis: &mut Vec<V>,
        h: &mut [Vec<T>],
        j: usize,
        epsilon: T,
    ) -> bool
    where
        M: MatVec<V>,
        (): InnerProduct<V, Scalar = T>,
        V: AsMut<[T]> + AsRef<[T]> + From<Vec<T>> + Clone,
    {
        let n = v_basis[0].as_ref().len();
        let mut w = V::from(vec![T::zero(); n]);
        a.matvec(&v_basis[j], &mut w);
        // Modified Gram-Schmidt orthogonalization
        for i in 0..=j {
            h[i][j] = ip.dot(&w, &v_basis[i]);
            for (wk, vik) in w.as_mut().iter_mut().zip(v_basis[i].as_ref()) {
                *wk = *wk - h[i][j] * *vik;
            }
        }
        // Iterative refinement (second orthogonalization)
        for i in 0..=j {
            let tmp = ip.dot(&w, &v_basis[i]);
            h[i][j] = h[i][j] + tmp;
            for (wk, vik) in w.as_mut().iter_mut().zip(v_basis[i].as_ref()) {
                *wk = *wk - tmp * *vik;
            }
        }
        h[j + 1][j] = ip.norm(&w);
        if h[j + 1][j].abs() < epsilon {
            return true;
        }
        let vj1 = V::from(w.as_ref().iter().map(|&wi| wi / h[j + 1][j]).collect::<Vec<_>>());
        v_basis.push(vj1);
        false
    }

    /// Apply Givens rotations to Hessenberg matrix and update g vector.
    fn apply_givens_and_update_g(h: &mut [Vec<T>], g: &mut [T], cs: &mut [T], sn: &mut [T], j: usize, epsilon: T) {
        for i in 0..j {
            let temp = cs[i] * h[i][j] + sn[i] * h[i + 1][j];
            h[i + 1][j] = -sn[i] * h[i][j] + cs[i] * h[i + 1][j];
            h[i][j] = temp;
        }
        let h_kk = h[j][j];
        let h_k1k = h[j + 1][j];
        let r = (h_kk * h_kk + h_k1k * h_k1k).sqrt();
        if r.abs() < epsilon {
            cs[j] = T::one();
            sn[j] = T::zero();
        } else {
            cs[j] = h_kk / r;
            sn[j] = h_k1k / r;
        }
        h[j][j] = cs[j] * h_kk + sn[j] * h_k1k;
        h[j + 1][j] = T::zero();
        let temp = cs[j] * g[j] + sn[j] * g[j + 1];
        g[j + 1] = -sn[j] * g[j] + cs[j] * g[j + 1];
        g[j] = temp;
    }

    /// Solve upper-triangular system Hy = g for y, with zero-pivot protection.
    fn back_substitution(h: &[Vec<T>], g: &[T], y: &mut [T], m: usize, epsilon: T) {
        for i in (0..m).rev() {
            y[i] = g[i];
            for j in (i + 1)..m {
                y[i] = y[i] - h[i][j] * y[j];
            }
            if h[i][i].abs() > epsilon {
                y[i] = y[i] / h[i][i];
            } else {
                y[i] = T::zero();
            }
        }
    }

    /// r = b - A x
    fn residual<M, V>(a: &M, b: &V, xk: &[T]) -> V
    where
        M: MatVec<V>,
        V: AsRef<[T]> + From<Vec<T>>,
    {
        let n = xk.len();
        let mut tmp = V::from(vec![T::zero(); n]);
        a.matvec(&V::from(xk.to_vec()), &mut tmp);
        V::from(tmp.as_ref().iter().zip(b.as_ref()).map(|(&ax, &bi)| bi - ax).collect::<Vec<_>>())
    }
}

impl<M, V, T> LinearSolver<M, V> for GmresSolver<T>
where
    M: MatVec<V>,
    (): InnerProduct<V, Scalar = T>,
    V: AsMut<[T]> + AsRef<[T]> + From<Vec<T>> + Clone,
    T: Float + From<f64>,
{
    type Scalar = T;

    /// Solve the linear system Ax = b using restarted GMRES.
    ///
    /// # Arguments
    /// * `a` - Matrix implementing `MatVec`
    /// * `b` - Right-hand side vector
    /// * `x` - On input: initial guess; on output: solution vector
    /// * `observer` - Receives ‖r_j‖ / ‖b‖ after every inner iteration
    ///
    /// # Returns
    /// * `Ok(SolveStats)` whether or not the iteration converged; see `status`
    /// * `Err(PrecondError::Shape)` if `x` and `b` differ in length
    fn solve_observed(
        &mut self,
        a: &M,
        b: &V,
        x: &mut V,
        observer: &mut dyn FnMut(T),
    ) -> Result<SolveStats<T>, PrecondError> {
        let n = b.as_ref().len();
        if x.as_ref().len() != n {
            return Err(PrecondError::shape(format!(
                "initial guess has length {}, right-hand side has length {n}",
                x.as_ref().len()
            )));
        }
        let ip = ();
        let b_norm = ip.norm(b);
        if b_norm == T::zero() {
            // the exact solution of A x = 0 is x = 0
            *x = V::from(vec![T::zero(); n]);
            let mut stats = SolveStats::initial(T::zero());
            stats.converged = true;
            return Ok(stats.finish());
        }

        let threshold = self.conv.threshold(b_norm);
        let mut xk = x.as_ref().to_vec();
        let mut r0 = Self::residual(a, b, &xk);
        let mut beta = ip.norm(&r0);
        let mut stats = SolveStats::initial(beta);
        if beta <= threshold || !beta.is_finite() {
            stats.converged = beta <= threshold;
            return Ok(stats.finish());
        }

        let restart = self.restart;
        let epsilon = <T as From<f64>>::from(1e-14);
        let mut iteration = 0;
        while iteration < self.conv.max_iters {
            let mut v_basis: Vec<V> = Vec::with_capacity(restart + 1);
            v_basis.push(V::from(r0.as_ref().iter().map(|&ri| ri / beta).collect::<Vec<_>>()));
            // Hessenberg matrix and Givens rotation storage
            let mut h = vec![vec![T::zero(); restart]; restart + 1];
            let mut g = vec![T::zero(); restart + 1];
            g[0] = beta;
            let mut cs = vec![T::zero(); restart];
            let mut sn = vec![T::zero(); restart];
            let mut m = 0;
            for j in 0..restart {
                if iteration >= self.conv.max_iters {
                    break;
                }
                iteration += 1;
                let happy_breakdown = Self::arnoldi(a, &ip, &mut v_basis, &mut h, j, epsilon);
                Self::apply_givens_and_update_g(&mut h, &mut g, &mut cs, &mut sn, j, epsilon);
                m = j + 1;
                let res_norm = g[j + 1].abs();
                observer(res_norm / b_norm);
                let (stop, _) = self.conv.check(res_norm, b_norm, iteration);
                stats.iterations = iteration;
                stats.final_residual = res_norm;
                if stop || happy_breakdown {
                    break;
                }
            }
            // Solve least-squares problem for y and update xk
            let mut y = vec![T::zero(); m];
            Self::back_substitution(&h, &g, &mut y, m, epsilon);
            for (yj, vj) in y.iter().zip(&v_basis) {
                for (xk_i, vj_i) in xk.iter_mut().zip(vj.as_ref()) {
                    *xk_i = *xk_i + *yj * *vj_i;
                }
            }
            // Restart from the true residual
            r0 = Self::residual(a, b, &xk);
            beta = ip.norm(&r0);
            stats.final_residual = beta;
            stats.converged = beta <= threshold;
            if stats.converged || !beta.is_finite() {
                break;
            }
        }
        *x = V::from(xk);
        Ok(stats.finish())
    }
}
