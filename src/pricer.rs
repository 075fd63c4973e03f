//! Closed-form Black-Scholes pricing of European calls.
//!
//! # Formula
//! ```text
//! C = S·e^{−qT}·Φ(d1) − K·e^{−rT}·Φ(d2)
//! d1 = (ln(S/K) + (r − q + σ²/2)·T) / (σ√T),  d2 = d1 − σ√T
//! ```
//!
//! The price is strictly increasing in σ for σ > 0 and T > 0, and is
//! confined to [`call_price_bounds`]: the zero-vol forward payoff below and
//! the discounted spot above.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::types::ContractTerms;

/// Standard normal cumulative distribution function Φ.
pub(crate) fn norm_cdf(x: f64) -> f64 {
    Normal::standard().cdf(x)
}

/// European call value under continuous dividend yield.
///
/// - `expiry <= 0`: intrinsic value `max(S − K, 0)`.
/// - `vol <= 0`: discounted forward payoff `max(S·e^{−qT} − K·e^{−rT}, 0)`.
///
/// # Examples
/// ```
/// use volgrid::pricer::bs_call_price;
///
/// let price = bs_call_price(100.0, 100.0, 1.0, 0.0, 0.0, 0.2);
/// assert!((price - 7.965567).abs() < 1e-5);
/// ```
pub fn bs_call_price(
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
) -> f64 {
    if expiry <= 0.0 {
        return (spot - strike).max(0.0);
    }
    let spot_pv = spot * (-dividend_yield * expiry).exp();
    let strike_pv = strike * (-rate * expiry).exp();
    if vol <= 0.0 {
        return (spot_pv - strike_pv).max(0.0);
    }
    let vol_sqrt_t = vol * expiry.sqrt();
    let d1 = ((spot / strike).ln() + (rate - dividend_yield + 0.5 * vol * vol) * expiry)
        / vol_sqrt_t;
    let d2 = d1 - vol_sqrt_t;
    spot_pv * norm_cdf(d1) - strike_pv * norm_cdf(d2)
}

/// Range of call prices achievable by some volatility: `(σ → 0, σ → ∞)` limits.
pub fn call_price_bounds(
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    dividend_yield: f64,
) -> (f64, f64) {
    let spot_pv = spot * (-dividend_yield * expiry).exp();
    let strike_pv = strike * (-rate * expiry).exp();
    ((spot_pv - strike_pv).max(0.0), spot_pv)
}

impl ContractTerms {
    /// Black-Scholes call value of these terms at volatility `vol`.
    pub fn call_price(&self, vol: f64) -> f64 {
        bs_call_price(
            self.spot,
            self.strike,
            self.expiry,
            self.rate,
            self.dividend_yield,
            vol,
        )
    }

    /// See [`call_price_bounds`].
    pub fn call_price_bounds(&self) -> (f64, f64) {
        call_price_bounds(
            self.spot,
            self.strike,
            self.expiry,
            self.rate,
            self.dividend_yield,
        )
    }
}
