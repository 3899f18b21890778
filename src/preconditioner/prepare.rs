//! Matrix preparation: remap entries, then force a unit diagonal.
//!
//! Preparation pushes off-diagonal values into a non-positive range while the
//! diagonal is pinned to `1.0`, which keeps the prepared matrices away from
//! singularity. The mapping is chosen with [`MappingType`]:
//!
//! | name         | effect                                    |
//! |--------------|-------------------------------------------|
//! | `minmax`     | min-max onto `[0, 1]`                     |
//! | `flip`       | multiply by `-1` (for values in `[0, 1]`) |
//! | `flip_norm`  | min-max, then multiply by `-1`            |
//! | `shift`      | add `-1`                                  |
//! | `shift_norm` | min-max, then add `-1`                    |

use crate::error::PrecondError;
use crate::matrix::MatrixBatch;
use crate::parallel::map_batch;
use crate::preconditioner::normalize::{MinMaxNorm, set_unit_diagonal, set_unit_diagonal_matrix};
use faer::Mat;
use std::fmt;
use std::str::FromStr;

/// Value mapping applied before the diagonal is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingType {
    MinMax,
    #[default]
    Flip,
    FlipNorm,
    Shift,
    ShiftNorm,
}

impl MappingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingType::MinMax => "minmax",
            MappingType::Flip => "flip",
            MappingType::FlipNorm => "flip_norm",
            MappingType::Shift => "shift",
            MappingType::ShiftNorm => "shift_norm",
        }
    }

    fn norm(&self) -> Option<MinMaxNorm> {
        match self {
            MappingType::MinMax => Some(MinMaxNorm::unit()),
            MappingType::FlipNorm => Some(MinMaxNorm::flipped()),
            MappingType::ShiftNorm => Some(MinMaxNorm::shifted()),
            MappingType::Flip | MappingType::Shift => None,
        }
    }

    fn pointwise(&self, x: f64) -> f64 {
        match self {
            MappingType::Flip => -x,
            MappingType::Shift => x - 1.0,
            _ => x,
        }
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingType {
    type Err = PrecondError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minmax" => Ok(MappingType::MinMax),
            "flip" => Ok(MappingType::Flip),
            "flip_norm" => Ok(MappingType::FlipNorm),
            "shift" => Ok(MappingType::Shift),
            "shift_norm" => Ok(MappingType::ShiftNorm),
            other => Err(PrecondError::InvalidArgument(format!("invalid mapping type '{other}'"))),
        }
    }
}

/// Prepare a single square matrix. The input is left untouched.
pub fn prepare_matrix(a: &Mat<f64>, mapping: MappingType) -> Mat<f64> {
    let mut out = a.clone();
    match mapping.norm() {
        Some(norm) => norm.apply_matrix(&mut out),
        None => map_entries(&mut out, |x| mapping.pointwise(x)),
    }
    set_unit_diagonal_matrix(&mut out);
    out
}

/// Prepare every matrix of a batch. Normalizing mappings use the batch-global range.
pub fn prepare_batch(batch: &MatrixBatch, mapping: MappingType) -> MatrixBatch {
    let mut out = match mapping.norm() {
        Some(norm) => {
            let mut out = batch.clone();
            norm.apply_batch(&mut out);
            out
        }
        None => {
            let mats = map_batch(batch.len(), |k| {
                let mut a = batch[k].clone();
                map_entries(&mut a, |x| mapping.pointwise(x));
                a
            });
            MatrixBatch::from_parts(batch.dim(), mats)
        }
    };
    set_unit_diagonal(&mut out);
    out
}

fn map_entries(a: &mut Mat<f64>, f: impl Fn(f64) -> f64) {
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            a[(i, j)] = f(a[(i, j)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Mat<f64> {
        Mat::from_fn(2, 2, |i, j| [[0.5, 0.25], [1.0, 0.0]][i][j])
    }

    #[test]
    fn parses_known_names() {
        for name in ["minmax", "flip", "flip_norm", "shift", "shift_norm"] {
            let t: MappingType = name.parse().unwrap();
            assert_eq!(t.to_string(), name);
        }
        assert!(matches!("scale".parse::<MappingType>(), Err(PrecondError::InvalidArgument(_))));
    }

    #[test]
    fn flip_negates_off_diagonal() {
        let p = prepare_matrix(&sample(), MappingType::Flip);
        assert_eq!((p[(0, 0)], p[(0, 1)], p[(1, 0)], p[(1, 1)]), (1.0, -0.25, -1.0, 1.0));
    }

    #[test]
    fn shift_moves_by_minus_one() {
        let p = prepare_matrix(&sample(), MappingType::Shift);
        assert_eq!((p[(0, 1)], p[(1, 0)]), (-0.75, 0.0));
    }

    #[test]
    fn norm_variants_use_full_range() {
        let a = sample();
        let mm = prepare_matrix(&a, MappingType::MinMax);
        assert_eq!((mm[(0, 1)], mm[(1, 0)]), (0.25, 1.0));
        let fl = prepare_matrix(&a, MappingType::FlipNorm);
        assert_eq!((fl[(0, 1)], fl[(1, 0)]), (-0.25, -1.0));
        let sh = prepare_matrix(&a, MappingType::ShiftNorm);
        assert_eq!((sh[(0, 1)], sh[(1, 0)]), (-0.75, 0.0));
        assert_eq!((sh[(0, 0)], sh[(1, 1)]), (1.0, 1.0));
    }

    #[test]
    fn batch_preparation_leaves_input_alone() {
        let batch = MatrixBatch::new(vec![sample(), sample()]).unwrap();
        let out = prepare_batch(&batch, MappingType::Flip);
        assert_eq!(batch[0][(0, 1)], 0.25);
        assert_eq!(out[1][(0, 1)], -0.25);
        assert_eq!(out[1][(1, 1)], 1.0);
    }
}
