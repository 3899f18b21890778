//! Block-start indicators and the block bounds derived from them.
//!
//! Each matrix in a batch carries `m` flags; a `1` at position `i` opens a new
//! diagonal block at row/column `i`. Bounds are the start offsets with `m`
//! appended, so consecutive pairs give half-open block ranges.

use crate::error::PrecondError;

/// Per-matrix block-start flags, shape `(n, m)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStartIndicator {
    dim: usize,
    rows: Vec<Vec<u8>>,
}

impl BlockStartIndicator {
    /// Build from one flag row per matrix. All rows must share the same length.
    pub fn new(rows: Vec<Vec<u8>>) -> Result<Self, PrecondError> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(k) = rows.iter().position(|r| r.len() != dim) {
            return Err(PrecondError::shape(format!(
                "indicator row {k} has length {}, expected {dim}",
                rows[k].len()
            )));
        }
        Ok(Self { dim, rows })
    }

    /// The same block layout repeated for `n` matrices.
    pub fn uniform(n: usize, flags: &[u8]) -> Self {
        Self {
            dim: flags.len(),
            rows: vec![flags.to_vec(); n],
        }
    }

    /// Build from explicit block start offsets, e.g. `[0, 2]` for `m = 4`.
    pub fn from_starts(n: usize, m: usize, starts: &[usize]) -> Result<Self, PrecondError> {
        let mut flags = vec![0u8; m];
        for &s in starts {
            if s >= m {
                return Err(PrecondError::shape(format!(
                    "block start {s} out of range for dimension {m}"
                )));
            }
            flags[s] = 1;
        }
        Ok(Self::uniform(n, &flags))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, k: usize) -> &[u8] {
        &self.rows[k]
    }

    /// Block bounds for matrix `k`: start offsets followed by the sentinel `m`.
    pub fn bounds(&self, k: usize) -> Result<Vec<usize>, PrecondError> {
        block_bounds(&self.rows[k]).map_err(|e| match e {
            PrecondError::Shape(msg) => PrecondError::Shape(format!("indicator row {k}: {msg}")),
            other => other,
        })
    }
}

/// Derive block bounds from one flag row.
///
/// Positions equal to `1` are block starts; `m` is appended as the end sentinel.
/// An empty row yields `[0]` (no blocks).
pub fn block_bounds(flags: &[u8]) -> Result<Vec<usize>, PrecondError> {
    let m = flags.len();
    let mut bounds: Vec<usize> = flags
        .iter()
        .enumerate()
        .filter(|&(_, &f)| f == 1)
        .map(|(i, _)| i)
        .collect();
    if m == 0 {
        return Ok(vec![0]);
    }
    if bounds.first() != Some(&0) {
        return Err(PrecondError::shape("no block starts at offset 0"));
    }
    bounds.push(m);
    if bounds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(PrecondError::shape(format!(
            "block bounds {bounds:?} are not strictly increasing"
        )));
    }
    Ok(bounds)
}
