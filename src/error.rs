//! Error types for the volgrid library.
//!
//! Per-quote inversion failures are not errors: they surface as
//! [`ImpliedVol::Undefined`](crate::types::ImpliedVol::Undefined). This type
//! covers invalid caller input and the internal failures the solver maps
//! into undefined values.

use thiserror::Error;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, VolGridError>;

/// Errors raised by validation, root-finding and snapshot lookup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VolGridError {
    /// Input data is invalid (e.g. non-positive spot, grid resolution below 2).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Numerical computation failed (e.g. root not bracketed, iteration cap hit).
    #[error("numerical error: {message}")]
    NumericalError { message: String },

    /// Market price lies outside the no-arbitrage call price range.
    #[error("price {price} outside achievable range [{lower}, {upper}]")]
    UnachievablePrice { price: f64, lower: f64, upper: f64 },

    /// No snapshot is stored under the requested identifier.
    #[error("snapshot {id} not found")]
    SnapshotNotFound { id: u64 },
}
