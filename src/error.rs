use thiserror::Error;

// Unified error type for blockprec

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrecondError {
    #[error("shape error: {0}")]
    Shape(String),
    #[error("linear algebra error: {0}")]
    LinearAlgebra(String),
    #[error("singular matrix")]
    SingularMatrix,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl PrecondError {
    /// Shorthand for building a [`PrecondError::Shape`].
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        PrecondError::Shape(msg.into())
    }
}
