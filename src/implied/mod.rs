//! Implied volatility extraction from option prices.
//!
//! - [`ImpliedVolSolver`]: Black-Scholes call inversion with an ordered
//!   list of fallback brackets
//! - [`implied_vol`]: one-shot inversion with explicit bounds
//! - [`ImpliedVolSolver::solve_batch`]: independent inversion of a quote
//!   collection

mod batch;
pub mod black;

pub use black::{
    Bracket, DEFAULT_LOWER_VOL, DEFAULT_UPPER_VOL, ImpliedVolSolver, MAX_ITERATIONS,
    NARROW_UPPER_BOUND, PRICE_BOUND_TOLERANCE, SolverConfig, implied_vol,
};
