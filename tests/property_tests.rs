//! Property-based tests using proptest.
//!
//! These tests verify invariant properties across random inputs rather than
//! testing fixed examples: solver round-trips, price boundaries, and the
//! shape guarantees of gridded surfaces.

use proptest::prelude::*;
use volgrid::conventions;
use volgrid::implied::{DEFAULT_LOWER_VOL, DEFAULT_UPPER_VOL, implied_vol};
use volgrid::pricer::{bs_call_price, call_price_bounds};
use volgrid::surface::{build_grid, interpolate_nearest};
use volgrid::types::{ImpliedVol, ImpliedVolSample, UndefinedReason, Vol};

const BOUNDS: (f64, f64) = (DEFAULT_LOWER_VOL, DEFAULT_UPPER_VOL);

// --- Property Test 1: price → vol round trip ---

proptest! {
    /// Pricing at σ and inverting recovers σ for any vol the default bracket
    /// covers, as long as the option carries measurable time value.
    #[test]
    fn implied_vol_round_trip(
        spot in 50.0_f64..150.0,
        moneyness in 0.7_f64..1.4,
        expiry in 0.05_f64..2.0,
        rate in 0.0_f64..0.05,
        q in 0.0_f64..0.03,
        vol in 0.01_f64..3.0,
    ) {
        let strike = spot * moneyness;
        let price = bs_call_price(spot, strike, expiry, rate, q, vol);
        let (lower, _) = call_price_bounds(spot, strike, expiry, rate, q);
        prop_assume!(price - lower > 1e-6 * spot);

        let iv = implied_vol(Some(price), spot, strike, expiry, rate, q, BOUNDS);
        let solved = iv.value();
        prop_assert!(solved.is_some(), "undefined: {:?}", iv);
        if let Some(v) = solved {
            prop_assert!((v.0 - vol).abs() < 1e-3, "solved {} for true {}", v.0, vol);
        }
    }
}

// --- Property Test 2: price boundaries and monotonicity ---

proptest! {
    /// max(S e^{-qT} − K e^{-rT}, 0) ≤ C ≤ S e^{-qT}.
    #[test]
    fn call_price_within_bounds(
        spot in 1.0_f64..500.0,
        strike in 1.0_f64..500.0,
        expiry in 0.0_f64..5.0,
        rate in -0.01_f64..0.1,
        q in 0.0_f64..0.05,
        vol in 0.0_f64..5.0,
    ) {
        let price = bs_call_price(spot, strike, expiry, rate, q, vol);
        let (lower, upper) = call_price_bounds(spot, strike, expiry, rate, q);
        let slack = 1e-9 * spot;
        prop_assert!(price >= lower - slack, "price {} below {}", price, lower);
        prop_assert!(price <= upper + slack, "price {} above {}", price, upper);
    }

    /// Call price strictly increases with volatility wherever the option
    /// has measurable time value.
    #[test]
    fn call_price_increases_with_vol(
        spot in 50.0_f64..150.0,
        moneyness in 0.8_f64..1.25,
        expiry in 0.1_f64..2.0,
        vol_lo in 0.05_f64..1.0,
        bump in 0.01_f64..1.0,
    ) {
        let strike = spot * moneyness;
        let lo = bs_call_price(spot, strike, expiry, 0.01, 0.0, vol_lo);
        let (lower, _) = call_price_bounds(spot, strike, expiry, 0.01, 0.0);
        prop_assume!(lo - lower > 1e-6 * spot);
        let hi = bs_call_price(spot, strike, expiry, 0.01, 0.0, vol_lo + bump);
        prop_assert!(hi > lo, "C({}) = {} not above C({}) = {}", vol_lo + bump, hi, vol_lo, lo);
    }

    /// Prices above the forward can never be attained.
    #[test]
    fn price_above_spot_is_undefined(
        spot in 10.0_f64..200.0,
        strike in 10.0_f64..200.0,
        expiry in 0.05_f64..2.0,
    ) {
        let iv = implied_vol(Some(spot + 1.0), spot, strike, expiry, 0.01, 0.0, BOUNDS);
        prop_assert!(!iv.is_defined());
    }

    /// Non-positive prices map to zero volatility.
    #[test]
    fn non_positive_price_is_zero_vol(price in -10.0_f64..=0.0) {
        let iv = implied_vol(Some(price), 100.0, 100.0, 1.0, 0.01, 0.0, BOUNDS);
        prop_assert_eq!(iv, ImpliedVol::Defined(Vol(0.0)));
    }
}

// --- Property Test 3: grid shape ---

fn sample_cloud() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((0.02_f64..2.0, 50.0_f64..150.0, 0.05_f64..1.0), 3..40)
}

fn to_samples(cloud: &[(f64, f64, f64)]) -> Vec<ImpliedVolSample> {
    cloud
        .iter()
        .map(|&(t, k, v)| ImpliedVolSample::new(t, k, Some(100.0), ImpliedVol::Defined(Vol(v))))
        .collect()
}

proptest! {
    /// Any non-degenerate cloud yields a complete grid whose values stay
    /// within the sampled range and whose axes span the samples.
    #[test]
    fn grid_is_complete_and_bounded(
        cloud in sample_cloud(),
        n_time in 2_usize..30,
        n_strike in 2_usize..30,
    ) {
        let samples = to_samples(&cloud);
        let grid = build_grid(&samples, n_time, n_strike, true).unwrap();
        if let Some(grid) = grid {
            prop_assert_eq!(grid.shape(), (n_time, n_strike));

            let lo = cloud.iter().map(|c| c.2).fold(f64::INFINITY, f64::min);
            let hi = cloud.iter().map(|c| c.2).fold(f64::NEG_INFINITY, f64::max);
            for &v in grid.values().iter().flatten() {
                prop_assert!(v.is_finite());
                prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9, "{} outside [{}, {}]", v, lo, hi);
            }

            let days_min = cloud.iter().map(|c| c.0).fold(f64::INFINITY, f64::min)
                * conventions::DAYS_PER_YEAR;
            let days_max = cloud.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max)
                * conventions::DAYS_PER_YEAR;
            let time = grid.time_axis();
            prop_assert!((time[0] - days_min).abs() < 1e-9);
            prop_assert!((time[n_time - 1] - days_max).abs() < 1e-9);
            prop_assert!(time.windows(2).all(|w| w[1] > w[0]));

            let m_min = cloud.iter().map(|c| c.1).fold(f64::INFINITY, f64::min) / 100.0;
            let m_max = cloud.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max) / 100.0;
            let strike = grid.strike_axis();
            prop_assert!((strike[0] - 0.95 * m_min).abs() < 1e-12);
            prop_assert!((strike[n_strike - 1] - 1.05 * m_max).abs() < 1e-12);
        }
    }

    /// Three affinely independent samples always produce a grid.
    #[test]
    fn triangle_always_grids(
        t0 in 0.05_f64..0.5,
        dt in 0.1_f64..1.5,
        k0 in 60.0_f64..100.0,
        dk in 5.0_f64..50.0,
    ) {
        let cloud = [(t0, k0, 0.3), (t0, k0 + dk, 0.2), (t0 + dt, k0 + 0.5 * dk, 0.25)];
        let grid = build_grid(&to_samples(&cloud), 8, 8, true).unwrap();
        prop_assert!(grid.is_some());
    }

    /// Cloud entirely undefined → no grid.
    #[test]
    fn undefined_cloud_has_no_grid(cloud in sample_cloud()) {
        let samples: Vec<ImpliedVolSample> = to_samples(&cloud)
            .into_iter()
            .map(|s| ImpliedVolSample {
                vol: ImpliedVol::Undefined(UndefinedReason::NoConvergence),
                ..s
            })
            .collect();
        prop_assert!(build_grid(&samples, 10, 10, true).unwrap().is_none());
    }

    /// Nearest-neighbour interpolation returns sample values at the samples.
    #[test]
    fn nearest_is_exact_at_samples(cloud in sample_cloud()) {
        let points: Vec<(f64, f64)> = cloud.iter().map(|c| (c.0, c.1)).collect();
        let values: Vec<f64> = cloud.iter().map(|c| c.2).collect();
        let out = interpolate_nearest(&points, &values, &points).unwrap();
        for (i, &p) in points.iter().enumerate() {
            let first = points.iter().position(|&q| q == p).unwrap();
            prop_assert_eq!(out[i], values[first]);
        }
    }
}
