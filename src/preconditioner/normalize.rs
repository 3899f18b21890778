//! Min-max normalization over whole matrix batches.
//!
//! `y = factor · (x − min) / (max − min) + offset`, where `min`/`max` are taken
//! over every entry of every matrix. When `max == min` the normalized value is
//! `0`, so every entry becomes `offset`.

use crate::matrix::MatrixBatch;
use faer::Mat;

/// Affine min-max remap with a trailing scale and shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxNorm {
    pub factor: f64,
    pub offset: f64,
}

impl Default for MinMaxNorm {
    fn default() -> Self {
        Self { factor: 1.0, offset: 0.0 }
    }
}

impl MinMaxNorm {
    /// `[min, max] → [0, 1]`
    pub fn unit() -> Self {
        Self::default()
    }

    /// `[min, max] → [-1, 0]` with `min ↦ -1`; used for block-Jacobi batches.
    pub fn shifted() -> Self {
        Self { factor: 1.0, offset: -1.0 }
    }

    /// `[min, max] → [-1, 0]` with `max ↦ -1`.
    pub fn flipped() -> Self {
        Self { factor: -1.0, offset: 0.0 }
    }

    /// Remap a single value against a known range.
    pub fn map(&self, x: f64, min: f64, max: f64) -> f64 {
        let span = max - min;
        let unit = if span > 0.0 { (x - min) / span } else { 0.0 };
        self.factor * unit + self.offset
    }

    /// Remap every entry of the batch in place. An empty batch is left untouched.
    pub fn apply_batch(&self, batch: &mut MatrixBatch) {
        // both statistics come from the untouched batch before any write
        let Some((min, max)) = value_range(batch.iter()) else {
            return;
        };
        for a in batch.iter_mut() {
            self.remap(a, min, max);
        }
    }

    /// Remap every entry of a single matrix in place.
    pub fn apply_matrix(&self, a: &mut Mat<f64>) {
        if let Some((min, max)) = value_range(std::iter::once(&*a)) {
            self.remap(a, min, max);
        }
    }

    fn remap(&self, a: &mut Mat<f64>, min: f64, max: f64) {
        for j in 0..a.ncols() {
            for i in 0..a.nrows() {
                a[(i, j)] = self.map(a[(i, j)], min, max);
            }
        }
    }
}

/// Global `(min, max)` over all entries, or `None` if there are no entries.
pub fn value_range<'a>(mats: impl Iterator<Item = &'a Mat<f64>>) -> Option<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;
    for a in mats {
        for j in 0..a.ncols() {
            for i in 0..a.nrows() {
                let v = a[(i, j)];
                range = Some(match range {
                    None => (v, v),
                    Some((lo, hi)) => (lo.min(v), hi.max(v)),
                });
            }
        }
    }
    range
}

/// Force every diagonal entry of every matrix to exactly `1.0`.
pub fn set_unit_diagonal(batch: &mut MatrixBatch) {
    for a in batch.iter_mut() {
        set_unit_diagonal_matrix(a);
    }
}

pub(crate) fn set_unit_diagonal_matrix(a: &mut Mat<f64>) {
    for i in 0..a.nrows().min(a.ncols()) {
        a[(i, i)] = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifted_maps_min_to_minus_one() {
        let norm = MinMaxNorm::shifted();
        assert_eq!(norm.map(2.0, 2.0, 6.0), -1.0);
        assert_eq!(norm.map(6.0, 2.0, 6.0), 0.0);
        assert_eq!(norm.map(4.0, 2.0, 6.0), -0.5);
    }

    #[test]
    fn flipped_maps_max_to_minus_one() {
        let norm = MinMaxNorm::flipped();
        assert_eq!(norm.map(6.0, 2.0, 6.0), -1.0);
        assert_eq!(norm.map(2.0, 2.0, 6.0), 0.0);
    }

    #[test]
    fn degenerate_range_maps_to_offset() {
        let mut batch = MatrixBatch::zeros(2, 3);
        MinMaxNorm::shifted().apply_batch(&mut batch);
        assert!(batch.iter().all(|a| (0..3).all(|i| (0..3).all(|j| a[(i, j)] == -1.0))));
    }

    #[test]
    fn range_is_batch_global() {
        let mut batch = MatrixBatch::from_row_major(2, 1, &[1.0, 3.0]).unwrap();
        MinMaxNorm::unit().apply_batch(&mut batch);
        assert_eq!(batch[0][(0, 0)], 0.0);
        assert_eq!(batch[1][(0, 0)], 1.0);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut batch = MatrixBatch::zeros(0, 3);
        MinMaxNorm::shifted().apply_batch(&mut batch);
        assert!(batch.is_empty());
        assert_eq!(value_range(batch.iter()), None);
    }

    #[test]
    fn unit_diagonal_overwrites() {
        let mut batch = MatrixBatch::from_row_major(1, 2, &[5.0, 2.0, 2.0, -3.0]).unwrap();
        set_unit_diagonal(&mut batch);
        assert_eq!(batch.to_row_major(), vec![1.0, 2.0, 2.0, 1.0]);
    }
}
