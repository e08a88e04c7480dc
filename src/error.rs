//! Error types for the planar-slam library
//!
//! Module-level errors live next to the code that raises them; this module
//! provides the crate-wide error and result types that wrap them. All errors
//! use the `thiserror` crate for automatic trait implementations.

use crate::factors::FactorError;
use crate::optimizer::OptimizerError;
use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Cost assembly errors (trajectory/measurement shape violations)
    #[error("factor error: {0}")]
    Factor(#[from] FactorError),

    /// Optimizer errors (gradient/trajectory shape violations)
    #[error("optimizer error: {0}")]
    Optimizer(#[from] OptimizerError),
}
