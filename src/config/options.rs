//! API options for the preconditioner builder and the monitored solver.
//!
//! This module provides `BuilderOptions` and `SolverOptions`, plain option
//! structs with public fields. Defaults follow the conventional choices for
//! batched block-Jacobi preconditioning: normalization on, a loose relative
//! tolerance of `1e-3`, restart length `min(20, m)` and `10 * m` iterations.
//!
//! The iteration budget counts inner (Arnoldi) iterations across all restart
//! cycles. This differs from SciPy's `gmres`, whose `maxiter` counts restart
//! cycles, so the default budget here is tighter by up to a factor of `restart`.

/// Options for building a block-Jacobi preconditioner batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuilderOptions {
    /// Remap the inverted batch onto `[-1, 0]` and force a unit diagonal
    pub normalize: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self { normalize: true }
    }
}

impl BuilderOptions {
    /// Enable or disable the min-max normalization pass.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

/// Options for the per-system GMRES solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Relative tolerance: stop once ‖r‖ ≤ rtol · ‖b‖
    pub rtol: f64,

    /// Absolute floor on the stopping threshold
    pub atol: f64,

    /// Arnoldi vectors before restart (`None` → min(20, m))
    pub restart: Option<usize>,

    /// Total inner iterations per system across restarts (`None` → 10 · m)
    pub max_iters: Option<usize>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 0.0,
            restart: None,
            max_iters: None,
        }
    }
}

impl SolverOptions {
    pub fn with_rtol(mut self, rtol: f64) -> Self {
        self.rtol = rtol;
        self
    }

    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    pub fn with_restart(mut self, restart: usize) -> Self {
        self.restart = Some(restart);
        self
    }

    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = Some(max_iters);
        self
    }

    /// Restart length for systems of dimension `m`.
    pub fn restart_for(&self, m: usize) -> usize {
        self.restart.unwrap_or_else(|| m.min(20)).max(1)
    }

    /// Inner-iteration budget for systems of dimension `m`, summed over restart cycles.
    pub fn max_iters_for(&self, m: usize) -> usize {
        self.max_iters.unwrap_or(10 * m).max(1)
    }
}
