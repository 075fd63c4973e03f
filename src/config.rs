//! Pipeline parameters.

use serde::{Deserialize, Serialize};

use crate::error;
use crate::surface::DEFAULT_GRID_POINTS;
use crate::validate::{validate_finite, validate_resolution};

/// Default risk-free rate used when valuing a chain.
pub const DEFAULT_RATE: f64 = 0.01;

/// Market and grid settings for a chain → surface run.
///
/// Missing fields deserialize to their defaults:
///
/// ```
/// use volgrid::config::SurfaceParams;
///
/// let params: SurfaceParams = serde_json::from_str(r#"{ "n_time": 30 }"#).unwrap();
/// assert_eq!(params.n_time, 30);
/// assert_eq!(params.n_strike, 50);
/// assert_eq!(params.rate, 0.01);
/// assert!(params.use_moneyness);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceParams {
    /// Continuously compounded risk-free rate.
    pub rate: f64,
    /// Continuous dividend yield.
    pub dividend_yield: f64,
    pub n_time: usize,
    pub n_strike: usize,
    /// Moneyness (K/S) on the strike axis instead of raw strikes.
    pub use_moneyness: bool,
}

impl SurfaceParams {
    /// # Errors
    /// Returns [`VolGridError::InvalidInput`](crate::VolGridError::InvalidInput)
    /// for a non-finite rate or dividend yield, or a resolution below 2.
    pub fn validate(&self) -> error::Result<()> {
        validate_finite(self.rate, "rate")?;
        validate_finite(self.dividend_yield, "dividend_yield")?;
        validate_resolution(self.n_time, "n_time")?;
        validate_resolution(self.n_strike, "n_strike")?;
        Ok(())
    }
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            dividend_yield: 0.0,
            n_time: DEFAULT_GRID_POINTS,
            n_strike: DEFAULT_GRID_POINTS,
            use_moneyness: true,
        }
    }
}
