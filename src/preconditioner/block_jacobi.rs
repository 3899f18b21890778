// Block-Jacobi preconditioner construction for matrix batches

use crate::config::BuilderOptions;
use crate::error::PrecondError;
use crate::matrix::{BlockStartIndicator, DenseInverse, LuInverse, MatrixBatch};
use crate::parallel::try_map_batch;
use crate::preconditioner::normalize::{MinMaxNorm, set_unit_diagonal};
use crate::utils::diagnostics::{DiagnosticsSink, LogSink};
use faer::Mat;
use log::Level;

/// Builds one block-diagonal preconditioner per matrix of a batch.
///
/// Every diagonal block named by the indicator is inverted independently; a
/// singular block falls back to its pseudo-inverse and is reported to the sink.
/// With normalization on, the finished batch is remapped onto `[-1, 0]` and its
/// diagonal forced to `1.0`.
pub struct BlockJacobiBuilder<'s, I = LuInverse> {
    pub options: BuilderOptions,
    inverter: I,
    sink: &'s dyn DiagnosticsSink,
}

impl BlockJacobiBuilder<'static, LuInverse> {
    /// Default inverter, diagnostics to the `log` facade.
    pub fn new(options: BuilderOptions) -> Self {
        Self {
            options,
            inverter: LuInverse::default(),
            sink: &LogSink,
        }
    }
}

impl Default for BlockJacobiBuilder<'static, LuInverse> {
    fn default() -> Self {
        Self::new(BuilderOptions::default())
    }
}

impl<'s, I: DenseInverse> BlockJacobiBuilder<'s, I> {
    /// Swap the inverse primitive.
    pub fn with_inverter<J: DenseInverse>(self, inverter: J) -> BlockJacobiBuilder<'s, J> {
        BlockJacobiBuilder {
            options: self.options,
            inverter,
            sink: self.sink,
        }
    }

    /// Route diagnostics to `sink`.
    pub fn with_sink<'t>(self, sink: &'t dyn DiagnosticsSink) -> BlockJacobiBuilder<'t, I> {
        BlockJacobiBuilder {
            options: self.options,
            inverter: self.inverter,
            sink,
        }
    }

    /// Build the preconditioner batch for `matrices`.
    ///
    /// Fails with [`PrecondError::Shape`] if the indicator does not match the batch
    /// or a row does not open a block at offset 0, and with
    /// [`PrecondError::LinearAlgebra`] if any block fails to invert for a reason
    /// other than singularity. Either failure aborts the whole batch.
    pub fn build(
        &self,
        matrices: &MatrixBatch,
        indicators: &BlockStartIndicator,
    ) -> Result<MatrixBatch, PrecondError> {
        let (n, m) = (matrices.len(), matrices.dim());
        if indicators.len() != n {
            return Err(PrecondError::shape(format!(
                "indicator has {} rows for a batch of {n} matrices",
                indicators.len()
            )));
        }
        if n > 0 && indicators.dim() != m {
            return Err(PrecondError::shape(format!(
                "indicator rows have length {}, matrices are {m}x{m}",
                indicators.dim()
            )));
        }
        log::debug!("building block-Jacobi preconditioner for batch ({n}, {m}, {m})");

        // Validate every layout up front so a bad row fails before any inversion.
        let bounds = (0..n)
            .map(|k| indicators.bounds(k))
            .collect::<Result<Vec<_>, _>>()?;

        let inverted = try_map_batch(n, |k| self.invert_blocks(k, &matrices[k], &bounds[k]))?;

        // Fallback notices go out only once the whole batch has inverted, in index order.
        let mut mats = Vec::with_capacity(n);
        for (k, inv) in inverted.into_iter().enumerate() {
            for (start, end) in inv.singular {
                self.sink.emit(
                    Level::Warn,
                    &format!("Block is singular, using pseudo-inverse for block {k:4} at indices {start}:{end}"),
                );
            }
            mats.push(inv.matrix);
        }
        let mut precon = MatrixBatch::from_parts(m, mats);

        if self.options.normalize {
            MinMaxNorm::shifted().apply_batch(&mut precon);
            set_unit_diagonal(&mut precon);
        }
        Ok(precon)
    }

    /// Invert each diagonal block of matrix `k` into a zero-initialised buffer.
    fn invert_blocks(&self, k: usize, a: &Mat<f64>, bounds: &[usize]) -> Result<InvertedMatrix, PrecondError> {
        let m = a.nrows();
        let mut out = Mat::<f64>::zeros(m, m);
        let mut singular = Vec::new();
        for w in bounds.windows(2) {
            let (start, end) = (w[0], w[1]);
            let len = end - start;
            let block = Mat::from_fn(len, len, |i, j| a[(start + i, start + j)]);
            let inv = match self.inverter.inverse(&block) {
                Ok(inv) => inv,
                Err(PrecondError::SingularMatrix) => {
                    singular.push((start, end));
                    self.inverter
                        .pseudo_inverse(&block)
                        .map_err(|e| with_location(e, k, start, end))?
                }
                Err(e) => return Err(with_location(e, k, start, end)),
            };
            for i in 0..len {
                for j in 0..len {
                    out[(start + i, start + j)] = inv[(i, j)];
                }
            }
        }
        Ok(InvertedMatrix { matrix: out, singular })
    }
}

/// One block-inverted matrix plus the ranges that needed the pseudo-inverse.
struct InvertedMatrix {
    matrix: Mat<f64>,
    singular: Vec<(usize, usize)>,
}

fn with_location(err: PrecondError, k: usize, start: usize, end: usize) -> PrecondError {
    match err {
        PrecondError::LinearAlgebra(msg) => {
            PrecondError::LinearAlgebra(format!("matrix {k}, block {start}:{end}: {msg}"))
        }
        PrecondError::SingularMatrix => {
            PrecondError::LinearAlgebra(format!("matrix {k}, block {start}:{end}: singular matrix"))
        }
        other => other,
    }
}
