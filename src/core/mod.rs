//! Core linear-algebra traits and their implementations for faer and `Vec`.

pub mod traits;
pub mod wrappers;
