//! Matrix module: batches of dense matrices, block layouts and inverse primitives.

pub mod batch;
pub use batch::{MatrixBatch, VectorBatch};
pub mod blocks;
pub use blocks::{BlockStartIndicator, block_bounds};
pub mod inverse;
pub use inverse::{DenseInverse, LuInverse};
