//! Core domain types for implied volatility extraction and gridding.
//!
//! # Newtype Strategy
//!
//! **Outputs use newtypes**: [`Vol`] wraps solved volatilities so a caller
//! cannot confuse them with prices. Inputs are bare `f64` fields on small
//! value objects ([`ContractTerms`], [`Quote`]).
//!
//! # Undefined volatilities
//!
//! A quote whose price cannot be inverted yields
//! [`ImpliedVol::Undefined`] with a [`UndefinedReason`] instead of a NaN, so
//! no not-a-number value can leak into downstream arithmetic.

use serde::{Deserialize, Serialize};

use crate::error;
use crate::validate::{validate_finite, validate_positive};

/// Implied volatility `σ`, measured as annualized standard deviation.
///
/// # Examples
/// ```
/// use volgrid::types::Vol;
/// let vol = Vol(0.20);
/// assert_eq!(vol.0, 0.20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Vol(pub f64);

/// Terms of a European call contract at a valuation instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContractTerms {
    /// Spot price of the underlying.
    pub spot: f64,
    /// Strike price.
    pub strike: f64,
    /// Time to expiry in years.
    pub expiry: f64,
    /// Continuously compounded risk-free rate.
    pub rate: f64,
    /// Continuous dividend yield.
    pub dividend_yield: f64,
}

impl ContractTerms {
    /// Create validated contract terms.
    ///
    /// # Errors
    /// Returns [`VolGridError::InvalidInput`](crate::VolGridError::InvalidInput)
    /// if spot or strike is not positive, or any field is non-finite.
    pub fn new(
        spot: f64,
        strike: f64,
        expiry: f64,
        rate: f64,
        dividend_yield: f64,
    ) -> error::Result<Self> {
        let terms = Self {
            spot,
            strike,
            expiry,
            rate,
            dividend_yield,
        };
        terms.validate()?;
        Ok(terms)
    }

    /// Check the invariants [`new`](Self::new) enforces.
    pub fn validate(&self) -> error::Result<()> {
        validate_positive(self.spot, "spot")?;
        validate_positive(self.strike, "strike")?;
        validate_finite(self.expiry, "expiry")?;
        validate_finite(self.rate, "rate")?;
        validate_finite(self.dividend_yield, "dividend_yield")?;
        Ok(())
    }
}

/// A contract together with its observed market price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub terms: ContractTerms,
    /// Mid or last price; `None` when the source had no price at all.
    pub market_price: Option<f64>,
}

impl Quote {
    pub fn new(terms: ContractTerms, market_price: Option<f64>) -> Self {
        Self {
            terms,
            market_price,
        }
    }
}

/// Why an implied volatility could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UndefinedReason {
    /// Contract terms were non-finite or non-positive where positivity is required.
    InvalidTerms,
    /// Market price outside the `[intrinsic, forward]` range of achievable call prices.
    UnachievablePrice,
    /// Every configured bracket failed to produce a root.
    NoConvergence,
}

/// Outcome of inverting one quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ImpliedVol {
    /// A finite, non-negative volatility.
    Defined(Vol),
    /// Inversion failed for the given reason.
    Undefined(UndefinedReason),
}

impl ImpliedVol {
    /// The volatility, if defined.
    pub fn value(&self) -> Option<Vol> {
        match *self {
            Self::Defined(vol) => Some(vol),
            Self::Undefined(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Defined(_))
    }

    /// The failure reason, if undefined.
    pub fn reason(&self) -> Option<UndefinedReason> {
        match *self {
            Self::Defined(_) => None,
            Self::Undefined(reason) => Some(reason),
        }
    }
}

/// One point of the implied volatility cloud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolSample {
    /// Time to expiry in years.
    pub expiry: f64,
    pub strike: f64,
    /// Spot recorded alongside the quote, used as the moneyness reference.
    pub spot: Option<f64>,
    pub vol: ImpliedVol,
}

impl ImpliedVolSample {
    pub fn new(expiry: f64, strike: f64, spot: Option<f64>, vol: ImpliedVol) -> Self {
        Self {
            expiry,
            strike,
            spot,
            vol,
        }
    }
}
