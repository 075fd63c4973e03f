//! Point-in-time records of a chain's implied volatilities.
//!
//! A [`NewSnapshot`] is captured from an [`OptionChain`], handed to a
//! [`SnapshotStore`] which assigns it an id, and later loaded back as a
//! [`Snapshot`] to rebuild a surface.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::OptionChain;
use crate::conventions;
use crate::error::{self, VolGridError};
use crate::implied::ImpliedVolSolver;
use crate::types::{ImpliedVol, ImpliedVolSample};

/// Identifier assigned by a store.
pub type SnapshotId = u64;

/// One contract of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPoint {
    pub strike: f64,
    pub expiration: DateTime<Utc>,
    /// Price the volatility was solved from.
    pub market_price: Option<f64>,
    pub vol: ImpliedVol,
}

/// A snapshot not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSnapshot {
    pub ticker: String,
    pub fetched_at: DateTime<Utc>,
    pub spot: Option<f64>,
    pub rate: f64,
    pub dividend_yield: f64,
    pub points: Vec<SnapshotPoint>,
}

impl NewSnapshot {
    /// Solve every row of `chain`, valued at the instant it was fetched.
    pub fn capture(
        chain: &OptionChain,
        solver: &ImpliedVolSolver,
        rate: f64,
        dividend_yield: f64,
    ) -> Self {
        let samples = chain.implied_vols(solver, chain.fetched_at, rate, dividend_yield);
        let points = chain
            .rows
            .iter()
            .zip(samples)
            .map(|(row, sample)| SnapshotPoint {
                strike: row.strike,
                expiration: row.expiration,
                market_price: row.price(chain.price_source),
                vol: sample.vol,
            })
            .collect();
        Self {
            ticker: chain.underlying.clone(),
            fetched_at: chain.fetched_at,
            spot: chain.spot,
            rate,
            dividend_yield,
            points,
        }
    }
}

/// A stored snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub ticker: String,
    pub fetched_at: DateTime<Utc>,
    pub spot: Option<f64>,
    pub rate: f64,
    pub dividend_yield: f64,
    pub points: Vec<SnapshotPoint>,
}

impl Snapshot {
    fn from_new(id: SnapshotId, new: NewSnapshot) -> Self {
        Self {
            id,
            ticker: new.ticker,
            fetched_at: new.fetched_at,
            spot: new.spot,
            rate: new.rate,
            dividend_yield: new.dividend_yield,
            points: new.points,
        }
    }

    /// Samples with expiries measured from `as_of`.
    ///
    /// Expiries are not floored, so points that expired before `as_of`
    /// come back with negative year fractions.
    pub fn samples(&self, as_of: DateTime<Utc>) -> Vec<ImpliedVolSample> {
        self.points
            .iter()
            .map(|p| {
                ImpliedVolSample::new(
                    conventions::year_fraction(as_of, p.expiration),
                    p.strike,
                    self.spot,
                    p.vol,
                )
            })
            .collect()
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            id: self.id,
            ticker: self.ticker.clone(),
            fetched_at: self.fetched_at,
            spot: self.spot,
            n_points: self.points.len(),
        }
    }
}

/// Listing entry for [`SnapshotStore::recent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: SnapshotId,
    pub ticker: String,
    pub fetched_at: DateTime<Utc>,
    pub spot: Option<f64>,
    pub n_points: usize,
}

/// Persistence for snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Store a snapshot and return its new id.
    fn insert(&mut self, snapshot: NewSnapshot) -> error::Result<SnapshotId>;

    /// Up to `limit` snapshots of `ticker`, newest `fetched_at` first.
    fn recent(&self, ticker: &str, limit: usize) -> error::Result<Vec<SnapshotSummary>>;

    /// # Errors
    /// Returns [`VolGridError::SnapshotNotFound`] for an unknown id.
    fn load(&self, id: SnapshotId) -> error::Result<Snapshot>;
}

/// In-process [`SnapshotStore`]. Ids start at 1.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    last_id: SnapshotId,
    snapshots: BTreeMap<SnapshotId, Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn insert(&mut self, snapshot: NewSnapshot) -> error::Result<SnapshotId> {
        self.last_id += 1;
        let id = self.last_id;

        #[cfg(feature = "logging")]
        tracing::debug!(
            ticker = %snapshot.ticker,
            id,
            n_points = snapshot.points.len(),
            "snapshot saved"
        );

        self.snapshots.insert(id, Snapshot::from_new(id, snapshot));
        Ok(id)
    }

    fn recent(&self, ticker: &str, limit: usize) -> error::Result<Vec<SnapshotSummary>> {
        let mut matching: Vec<&Snapshot> = self
            .snapshots
            .values()
            .filter(|s| s.ticker == ticker)
            .collect();
        matching.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at).then(b.id.cmp(&a.id)));
        Ok(matching.into_iter().take(limit).map(Snapshot::summary).collect())
    }

    fn load(&self, id: SnapshotId) -> error::Result<Snapshot> {
        self.snapshots
            .get(&id)
            .cloned()
            .ok_or(VolGridError::SnapshotNotFound { id })
    }
}
