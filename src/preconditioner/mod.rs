//! Block-Jacobi preconditioner construction and the value-mapping helpers it shares
//! with matrix preparation.

pub mod block_jacobi;
pub mod normalize;
pub mod prepare;

// Re-exports for convenience
pub use block_jacobi::BlockJacobiBuilder;
pub use normalize::{MinMaxNorm, set_unit_diagonal, value_range};
pub use prepare::{MappingType, prepare_batch, prepare_matrix};
