//! Call option chains as delivered by a quote source.
//!
//! An [`OptionChain`] holds raw rows keyed by expiration timestamp. Valuing
//! it at an instant turns each row into a [`Quote`] with a year-fraction
//! expiry, which the solver then inverts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SurfaceParams;
use crate::conventions;
use crate::error::{self, VolGridError};
use crate::implied::ImpliedVolSolver;
use crate::surface::{SurfaceBuilder, SurfaceGrid};
use crate::types::{ContractTerms, ImpliedVol, ImpliedVolSample, Quote, UndefinedReason};
use crate::validate::validate_positive;

/// Which quoted price is treated as the market price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PriceSource {
    /// Average of bid and ask; a missing side counts as zero.
    #[default]
    Mid,
    /// Last traded price.
    Last,
}

/// One call contract of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainRow {
    pub strike: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last_price: Option<f64>,
    pub expiration: DateTime<Utc>,
}

impl ChainRow {
    /// `(bid + ask) / 2` with missing sides as zero.
    pub fn mid(&self) -> f64 {
        0.5 * (self.bid.unwrap_or(0.0) + self.ask.unwrap_or(0.0))
    }

    pub fn price(&self, source: PriceSource) -> Option<f64> {
        match source {
            PriceSource::Mid => Some(self.mid()),
            PriceSource::Last => self.last_price,
        }
    }
}

/// Calls on one underlying across all listed expirations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub underlying: String,
    /// Latest underlying close; `None` when the source had none.
    pub spot: Option<f64>,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub price_source: PriceSource,
    pub rows: Vec<ChainRow>,
}

impl OptionChain {
    pub fn new(
        underlying: impl Into<String>,
        spot: Option<f64>,
        fetched_at: DateTime<Utc>,
        rows: Vec<ChainRow>,
    ) -> Self {
        Self {
            underlying: underlying.into(),
            spot,
            fetched_at,
            price_source: PriceSource::default(),
            rows,
        }
    }

    pub fn with_price_source(mut self, source: PriceSource) -> Self {
        self.price_source = source;
        self
    }

    fn terms(
        &self,
        row: &ChainRow,
        spot: f64,
        valuation: DateTime<Utc>,
        rate: f64,
        dividend_yield: f64,
    ) -> error::Result<ContractTerms> {
        let expiry = conventions::time_to_expiry(valuation, row.expiration);
        ContractTerms::new(spot, row.strike, expiry, rate, dividend_yield)
    }

    fn require_spot(&self) -> error::Result<f64> {
        let spot = self.spot.ok_or_else(|| VolGridError::InvalidInput {
            message: format!("no spot price for {}", self.underlying),
        })?;
        validate_positive(spot, "spot")
    }

    /// Value every row at `valuation`.
    ///
    /// Time to expiry is floored at
    /// [`MIN_TIME_TO_EXPIRY`](conventions::MIN_TIME_TO_EXPIRY), so expired
    /// rows price as (almost) intrinsic.
    ///
    /// # Errors
    /// Returns [`VolGridError::InvalidInput`] if the spot is missing or
    /// invalid, or any row has a non-positive strike.
    pub fn quotes(
        &self,
        valuation: DateTime<Utc>,
        rate: f64,
        dividend_yield: f64,
    ) -> error::Result<Vec<Quote>> {
        let spot = self.require_spot()?;
        self.rows
            .iter()
            .map(|row| {
                let terms = self.terms(row, spot, valuation, rate, dividend_yield)?;
                Ok(Quote::new(terms, row.price(self.price_source)))
            })
            .collect()
    }

    /// Implied volatility of every row, in row order.
    ///
    /// Never fails: a missing spot or an invalid row yields
    /// `Undefined(InvalidTerms)` samples.
    pub fn implied_vols(
        &self,
        solver: &ImpliedVolSolver,
        valuation: DateTime<Utc>,
        rate: f64,
        dividend_yield: f64,
    ) -> Vec<ImpliedVolSample> {
        let spot = self.require_spot().ok();
        let mut samples = Vec::with_capacity(self.rows.len());
        let mut quotes = Vec::with_capacity(self.rows.len());
        let mut slots = Vec::with_capacity(self.rows.len());

        for row in &self.rows {
            let expiry = conventions::time_to_expiry(valuation, row.expiration);
            let terms = spot.and_then(|s| self.terms(row, s, valuation, rate, dividend_yield).ok());
            match terms {
                Some(terms) => {
                    slots.push(Some(quotes.len()));
                    quotes.push(Quote::new(terms, row.price(self.price_source)));
                }
                None => slots.push(None),
            }
            samples.push(ImpliedVolSample::new(
                expiry,
                row.strike,
                spot,
                ImpliedVol::Undefined(UndefinedReason::InvalidTerms),
            ));
        }

        #[cfg(feature = "logging")]
        if spot.is_none() {
            tracing::warn!(
                underlying = %self.underlying,
                n_rows = self.rows.len(),
                "chain has no usable spot, all implied vols undefined"
            );
        }

        let solved = solver.solve_batch(&quotes);
        for (sample, slot) in samples.iter_mut().zip(slots) {
            if let Some(i) = slot {
                *sample = solved[i];
            }
        }
        samples
    }

    /// Chain → quotes → implied vols → grid, with the default solver.
    ///
    /// # Errors
    /// Returns [`VolGridError::InvalidInput`] if `params` fail validation.
    pub fn surface(
        &self,
        params: &SurfaceParams,
        valuation: DateTime<Utc>,
    ) -> error::Result<Option<SurfaceGrid>> {
        params.validate()?;
        let samples = self.implied_vols(
            &ImpliedVolSolver::default(),
            valuation,
            params.rate,
            params.dividend_yield,
        );
        SurfaceBuilder::from_params(params).build(&samples)
    }
}
