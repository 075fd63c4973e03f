//! Time and moneyness conventions.
//!
//! Year fractions use an actual/365.25 clock measured in seconds, which is
//! also the factor used to express expiries in days on the surface axis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Days per year used for both year fractions and the days-to-expiry axis.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Seconds per year under [`DAYS_PER_YEAR`].
pub const SECONDS_PER_YEAR: f64 = DAYS_PER_YEAR * 24.0 * 3600.0;

/// Floor applied to time to expiry when valuing live quotes, in years.
pub const MIN_TIME_TO_EXPIRY: f64 = 1e-12;

/// Coordinate used for the strike-like axis of a surface grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AxisMode {
    /// Strike divided by a reference spot.
    #[default]
    Moneyness,
    /// Raw strike price.
    Strike,
}

impl AxisMode {
    /// Build from the boolean `use_moneyness` switch.
    pub fn from_moneyness_flag(use_moneyness: bool) -> Self {
        if use_moneyness {
            Self::Moneyness
        } else {
            Self::Strike
        }
    }

    /// Axis label shown by renderers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Moneyness => "moneyness",
            Self::Strike => "strike",
        }
    }
}

/// Convert a strike to simple moneyness: m = K / S.
pub fn moneyness(strike: f64, reference_spot: f64) -> f64 {
    strike / reference_spot
}

/// Convert a year fraction to days.
pub fn years_to_days(years: f64) -> f64 {
    years * DAYS_PER_YEAR
}

/// Signed year fraction between two instants (negative once `to` has passed).
pub fn year_fraction(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let elapsed = to.signed_duration_since(from);
    let seconds = elapsed.num_milliseconds() as f64 / 1000.0;
    seconds / SECONDS_PER_YEAR
}

/// Year fraction clipped below at [`MIN_TIME_TO_EXPIRY`].
pub fn time_to_expiry(valuation: DateTime<Utc>, expiration: DateTime<Utc>) -> f64 {
    year_fraction(valuation, expiration).max(MIN_TIME_TO_EXPIRY)
}
