//! # volgrid
//!
//! Implied volatility surfaces from call option chains.
//!
//! Provides the pipeline: option chain → Black-Scholes implied vol per quote
//! → scattered (days-to-expiry, moneyness) cloud → rectangular grid ready for
//! rendering or storage.
//!
//! ## Architecture
//!
//! - **`pricer`**: Black-Scholes European call price with dividend yield
//! - **`implied`**: Bracketed Brent inversion of call prices, single and batch
//! - **`surface`**: Delaunay-linear gridding with nearest-neighbour fill
//! - **`chain`**: Option chain rows, price selection, valuation into quotes
//! - **`snapshot`**: Captured chains and the [`SnapshotStore`] trait
//!
//! ## Design
//!
//! - **No NaN sentinels.** A quote that cannot be inverted yields
//!   [`ImpliedVol::Undefined`] with a reason; one bad quote never aborts a
//!   batch.
//! - **No panics.** Every fallible operation returns [`Result`]. Library code
//!   never calls `unwrap()` or `expect()`.
//! - **Insufficient data is not an error.** Gridding returns `Ok(None)` when
//!   no defined sample remains or the samples do not span a triangle.
//! - **Immutable grids.** A [`SurfaceGrid`] cannot be modified once built and
//!   validates its shape on deserialization.
//! - **Serializable.** All value types implement Serde `Serialize` /
//!   `Deserialize`; configuration structs fill missing fields from defaults.
//!
//! ## Example
//!
//! ```
//! use volgrid::implied::ImpliedVolSolver;
//! use volgrid::pricer::bs_call_price;
//! use volgrid::surface::build_grid;
//! use volgrid::types::{ContractTerms, Quote};
//!
//! let quotes: Vec<Quote> = [(0.1, 90.0), (0.1, 110.0), (0.5, 95.0), (0.5, 105.0), (1.0, 100.0)]
//!     .iter()
//!     .map(|&(t, k)| {
//!         let terms = ContractTerms::new(100.0, k, t, 0.01, 0.0).unwrap();
//!         Quote::new(terms, Some(bs_call_price(100.0, k, t, 0.01, 0.0, 0.2)))
//!     })
//!     .collect();
//!
//! let samples = ImpliedVolSolver::default().solve_batch(&quotes);
//! let grid = build_grid(&samples, 20, 20, true)?.expect("non-degenerate cloud");
//! assert!(grid.values().iter().flatten().all(|v| (v - 0.2).abs() < 1e-6));
//! # Ok::<(), volgrid::VolGridError>(())
//! ```

pub mod chain;
pub mod config;
pub mod conventions;
pub mod error;
pub mod implied;
mod optim;
pub mod pricer;
pub mod snapshot;
pub mod surface;
pub mod types;
mod validate;

#[doc(inline)]
pub use chain::{ChainRow, OptionChain, PriceSource};
#[doc(inline)]
pub use config::SurfaceParams;
#[doc(inline)]
pub use error::{Result, VolGridError};
#[doc(inline)]
pub use implied::{ImpliedVolSolver, SolverConfig};
#[doc(inline)]
pub use snapshot::{MemoryStore, NewSnapshot, Snapshot, SnapshotStore};
#[doc(inline)]
pub use surface::{SurfaceBuilder, SurfaceGrid};
#[doc(inline)]
pub use types::{ContractTerms, ImpliedVol, ImpliedVolSample, Quote, UndefinedReason, Vol};
