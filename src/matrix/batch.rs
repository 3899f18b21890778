//! Batches of square dense matrices and of vectors.
//!
//! A [`MatrixBatch`] owns `n` faer matrices that all share the dimension `m`; a
//! [`VectorBatch`] owns `n` vectors of length `m`. Both validate their shape on
//! construction so downstream code can index freely.

use crate::error::PrecondError;
use faer::Mat;

/// An ordered batch of `n` square `m × m` matrices.
#[derive(Debug, Clone)]
pub struct MatrixBatch {
    dim: usize,
    mats: Vec<Mat<f64>>,
}

impl MatrixBatch {
    /// Build a batch from owned matrices. Every matrix must be square with the same dimension.
    pub fn new(mats: Vec<Mat<f64>>) -> Result<Self, PrecondError> {
        let dim = mats.first().map(|a| a.nrows()).unwrap_or(0);
        for (k, a) in mats.iter().enumerate() {
            if a.nrows() != a.ncols() {
                return Err(PrecondError::shape(format!(
                    "matrix {k} is {}x{}, expected a square matrix",
                    a.nrows(),
                    a.ncols()
                )));
            }
            if a.nrows() != dim {
                return Err(PrecondError::shape(format!(
                    "matrix {k} has dimension {}, batch dimension is {dim}",
                    a.nrows()
                )));
            }
        }
        Ok(Self { dim, mats })
    }

    /// Build a batch from a flat row-major buffer of shape `(n, m, m)`.
    pub fn from_row_major(n: usize, m: usize, data: &[f64]) -> Result<Self, PrecondError> {
        if data.len() != n * m * m {
            return Err(PrecondError::shape(format!(
                "buffer of length {} cannot hold {n} matrices of size {m}x{m}",
                data.len()
            )));
        }
        let mats = (0..n)
            .map(|k| {
                let base = k * m * m;
                Mat::from_fn(m, m, |i, j| data[base + i * m + j])
            })
            .collect();
        Ok(Self { dim: m, mats })
    }

    /// A batch of `n` zero matrices of size `m × m`.
    pub fn zeros(n: usize, m: usize) -> Self {
        Self {
            dim: m,
            mats: (0..n).map(|_| Mat::zeros(m, m)).collect(),
        }
    }

    /// Wrap matrices already known to share dimension `dim`.
    pub(crate) fn from_parts(dim: usize, mats: Vec<Mat<f64>>) -> Self {
        debug_assert!(mats.iter().all(|a| a.nrows() == dim && a.ncols() == dim));
        Self { dim, mats }
    }

    /// Number of matrices `n`.
    pub fn len(&self) -> usize {
        self.mats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mats.is_empty()
    }

    /// Common matrix dimension `m`.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, k: usize) -> Option<&Mat<f64>> {
        self.mats.get(k)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mat<f64>> {
        self.mats.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Mat<f64>> {
        self.mats.iter_mut()
    }

    pub fn as_slice(&self) -> &[Mat<f64>] {
        &self.mats
    }

    pub fn into_inner(self) -> Vec<Mat<f64>> {
        self.mats
    }

    /// Flatten back into a row-major `(n, m, m)` buffer.
    pub fn to_row_major(&self) -> Vec<f64> {
        let m = self.dim;
        let mut out = Vec::with_capacity(self.mats.len() * m * m);
        for a in &self.mats {
            for i in 0..m {
                for j in 0..m {
                    out.push(a[(i, j)]);
                }
            }
        }
        out
    }
}

impl std::ops::Index<usize> for MatrixBatch {
    type Output = Mat<f64>;
    fn index(&self, k: usize) -> &Mat<f64> {
        &self.mats[k]
    }
}

/// An ordered batch of `n` vectors of common length `m`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorBatch {
    dim: usize,
    vecs: Vec<Vec<f64>>,
}

impl VectorBatch {
    /// Build a batch from owned vectors of equal length.
    pub fn new(vecs: Vec<Vec<f64>>) -> Result<Self, PrecondError> {
        let dim = vecs.first().map(Vec::len).unwrap_or(0);
        if let Some(k) = vecs.iter().position(|v| v.len() != dim) {
            return Err(PrecondError::shape(format!(
                "vector {k} has length {}, batch length is {dim}",
                vecs[k].len()
            )));
        }
        Ok(Self { dim, vecs })
    }

    /// Build a batch from a flat row-major buffer of shape `(n, m)`.
    pub fn from_row_major(n: usize, m: usize, data: &[f64]) -> Result<Self, PrecondError> {
        if data.len() != n * m {
            return Err(PrecondError::shape(format!(
                "buffer of length {} cannot hold {n} vectors of length {m}",
                data.len()
            )));
        }
        let vecs = if m == 0 {
            vec![Vec::new(); n]
        } else {
            data.chunks(m).map(<[f64]>::to_vec).collect()
        };
        Ok(Self { dim: m, vecs })
    }

    pub fn len(&self) -> usize {
        self.vecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vecs.is_empty()
    }

    /// Common vector length `m`.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec<f64>> {
        self.vecs.iter()
    }

    pub fn as_slice(&self) -> &[Vec<f64>] {
        &self.vecs
    }

    pub fn into_inner(self) -> Vec<Vec<f64>> {
        self.vecs
    }
}

impl std::ops::Index<usize> for VectorBatch {
    type Output = Vec<f64>;
    fn index(&self, k: usize) -> &Vec<f64> {
        &self.vecs[k]
    }
}
