//! Black-Scholes implied volatility via bracketed root-finding.
//!
//! Inversion proceeds in three stages:
//!
//! 1. Non-positive or missing prices carry no optionality and map to `σ = 0`.
//! 2. Prices outside the achievable call range (see
//!    [`call_price_bounds`](crate::pricer::call_price_bounds)) are rejected
//!    without iterating.
//! 3. Brent's method is run on `C(σ) − price` over each configured
//!    [`Bracket`] in order, stopping at the first one that converges.
//!
//! Failures never escape as errors: they become
//! [`ImpliedVol::Undefined`] so that one bad quote leaves a hole in the
//! surface instead of aborting the batch.

use serde::{Deserialize, Serialize};

use crate::error::{self, VolGridError};
use crate::optim::{BrentConfig, brent_root};
use crate::types::{ContractTerms, ImpliedVol, UndefinedReason, Vol};

/// Lower volatility bound of the default bracket.
pub const DEFAULT_LOWER_VOL: f64 = 1e-6;

/// Upper volatility bound of the default (wide) bracket.
pub const DEFAULT_UPPER_VOL: f64 = 5.0;

/// Upper bound of the fallback bracket tried when the wide bracket fails.
pub const NARROW_UPPER_BOUND: f64 = 2.0;

/// Slack on the achievable price range absorbing rounding in quoted prices.
pub const PRICE_BOUND_TOLERANCE: f64 = 1e-8;

/// Iteration cap per bracket.
pub const MAX_ITERATIONS: usize = 200;

/// A volatility interval handed to the root finder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub low: f64,
    pub high: f64,
}

impl Bracket {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

/// Solver settings.
///
/// Brackets are tried in order; the default list is the wide bracket
/// `[1e-6, 5.0]` followed by the narrow `[1e-6, 2.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub brackets: Vec<Bracket>,
    /// Tolerance ε applied to both ends of the achievable price range.
    pub price_tolerance: f64,
    pub max_iterations: usize,
    /// Absolute tolerance on σ.
    pub vol_tolerance: f64,
    /// Relative tolerance on σ.
    pub relative_tolerance: f64,
}

impl SolverConfig {
    /// Two-tier bracket list `[(low, high), (low, NARROW_UPPER_BOUND)]`.
    pub fn with_bounds(low: f64, high: f64) -> Self {
        Self {
            brackets: vec![
                Bracket::new(low, high),
                Bracket::new(low, NARROW_UPPER_BOUND),
            ],
            ..Self::default()
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            brackets: vec![
                Bracket::new(DEFAULT_LOWER_VOL, DEFAULT_UPPER_VOL),
                Bracket::new(DEFAULT_LOWER_VOL, NARROW_UPPER_BOUND),
            ],
            price_tolerance: PRICE_BOUND_TOLERANCE,
            max_iterations: MAX_ITERATIONS,
            vol_tolerance: 2e-12,
            relative_tolerance: 4.0 * f64::EPSILON,
        }
    }
}

/// Black-Scholes implied volatility solver for European calls.
///
/// # Examples
/// ```
/// use volgrid::implied::ImpliedVolSolver;
/// use volgrid::pricer::bs_call_price;
/// use volgrid::types::ContractTerms;
///
/// let terms = ContractTerms::new(100.0, 105.0, 0.5, 0.01, 0.0)?;
/// let price = bs_call_price(100.0, 105.0, 0.5, 0.01, 0.0, 0.25);
///
/// let iv = ImpliedVolSolver::default().solve(Some(price), &terms);
/// let vol = iv.value().unwrap();
/// assert!((vol.0 - 0.25).abs() < 1e-6);
/// # Ok::<(), volgrid::VolGridError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolSolver {
    config: SolverConfig,
}

impl ImpliedVolSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Invert one quote. Never fails: problems yield [`ImpliedVol::Undefined`].
    pub fn solve(&self, market_price: Option<f64>, terms: &ContractTerms) -> ImpliedVol {
        let price = match market_price {
            Some(p) if p > 0.0 => p,
            Some(p) if p.is_nan() => {
                return ImpliedVol::Undefined(UndefinedReason::InvalidTerms);
            }
            _ => return ImpliedVol::Defined(Vol(0.0)),
        };

        match self.invert(price, terms) {
            Ok(vol) => ImpliedVol::Defined(vol),
            Err(err) => {
                #[cfg(feature = "logging")]
                tracing::trace!(
                    price,
                    strike = terms.strike,
                    expiry = terms.expiry,
                    error = %err,
                    "implied vol undefined"
                );
                ImpliedVol::Undefined(match err {
                    VolGridError::InvalidInput { .. } => UndefinedReason::InvalidTerms,
                    VolGridError::UnachievablePrice { .. } => UndefinedReason::UnachievablePrice,
                    _ => UndefinedReason::NoConvergence,
                })
            }
        }
    }

    /// Invert a strictly positive price, reporting why inversion failed.
    ///
    /// # Errors
    /// - [`VolGridError::InvalidInput`] for invalid contract terms
    /// - [`VolGridError::UnachievablePrice`] when `price` is outside the
    ///   achievable range widened by `price_tolerance`
    /// - [`VolGridError::NumericalError`] when every bracket fails
    pub fn invert(&self, price: f64, terms: &ContractTerms) -> error::Result<Vol> {
        terms.validate()?;

        let (lower, upper) = terms.call_price_bounds();
        let eps = self.config.price_tolerance;
        if !(price >= lower - eps && price <= upper + eps) {
            return Err(VolGridError::UnachievablePrice {
                price,
                lower,
                upper,
            });
        }

        let brent = BrentConfig {
            max_iter: self.config.max_iterations,
            xtol: self.config.vol_tolerance,
            rtol: self.config.relative_tolerance,
        };
        let objective = |vol: f64| terms.call_price(vol) - price;

        let mut last_err = VolGridError::NumericalError {
            message: "no brackets configured".into(),
        };
        for bracket in &self.config.brackets {
            match brent_root(&objective, bracket.low, bracket.high, &brent) {
                Ok(vol) => return Ok(Vol(vol)),
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }
}

/// Implied volatility of one call, trying `bounds` and then the narrow
/// fallback bracket `[bounds.0, NARROW_UPPER_BOUND]`.
pub fn implied_vol(
    market_price: Option<f64>,
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    dividend_yield: f64,
    bounds: (f64, f64),
) -> ImpliedVol {
    let terms = ContractTerms {
        spot,
        strike,
        expiry,
        rate,
        dividend_yield,
    };
    ImpliedVolSolver::new(SolverConfig::with_bounds(bounds.0, bounds.1)).solve(market_price, &terms)
}
