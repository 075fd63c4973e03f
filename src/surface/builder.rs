//! Builder API for gridding scattered implied volatility samples.
//!
//! ```
//! use volgrid::surface::SurfaceBuilder;
//! use volgrid::types::{ImpliedVol, ImpliedVolSample, Vol};
//!
//! let mut samples = Vec::new();
//! for &expiry in &[0.1, 0.25, 0.5] {
//!     for &strike in &[90.0, 100.0, 110.0] {
//!         let vol = ImpliedVol::Defined(Vol(0.2 + 0.05 * expiry));
//!         samples.push(ImpliedVolSample::new(expiry, strike, Some(100.0), vol));
//!     }
//! }
//!
//! let grid = SurfaceBuilder::new()
//!     .time_points(20)
//!     .strike_points(30)
//!     .build(&samples)
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(grid.shape(), (20, 30));
//! ```

use crate::config::SurfaceParams;
use crate::conventions::{self, AxisMode};
use crate::error;
use crate::surface::SurfaceGrid;
use crate::surface::interp::{LinearInterpolator, NearestInterpolator};
use crate::types::ImpliedVolSample;
use crate::validate::validate_resolution;

/// Default number of points on each grid axis.
pub const DEFAULT_GRID_POINTS: usize = 50;

/// Relative padding applied to both ends of the strike axis.
pub const STRIKE_AXIS_PADDING: f64 = 0.05;

/// Label of the time axis.
pub const TIME_AXIS_LABEL: &str = "days to expiry";

/// Builder for [`SurfaceGrid`]s.
///
/// Undefined samples are dropped. The remaining points are placed at
/// `(expiry · 365.25, moneyness or strike)`, interpolated linearly inside
/// their convex hull and filled from the nearest sample outside it.
///
/// # Examples
///
/// ```
/// use volgrid::conventions::AxisMode;
/// use volgrid::surface::SurfaceBuilder;
/// use volgrid::types::{ImpliedVol, ImpliedVolSample, Vol};
///
/// let samples = vec![
///     ImpliedVolSample::new(0.1, 95.0, None, ImpliedVol::Defined(Vol(0.24))),
///     ImpliedVolSample::new(0.1, 105.0, None, ImpliedVol::Defined(Vol(0.21))),
///     ImpliedVolSample::new(0.4, 100.0, None, ImpliedVol::Defined(Vol(0.20))),
/// ];
///
/// let grid = SurfaceBuilder::new()
///     .axis(AxisMode::Strike)
///     .build(&samples)?
///     .expect("samples span a triangle");
///
/// assert_eq!(grid.strike_label(), "strike");
/// assert!((grid.strike_axis()[0] - 0.95 * 95.0).abs() < 1e-9);
/// # Ok::<(), volgrid::VolGridError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceBuilder {
    time_points: usize,
    strike_points: usize,
    axis: AxisMode,
}

impl SurfaceBuilder {
    /// 50 × 50 grid on a moneyness axis.
    pub fn new() -> Self {
        Self {
            time_points: DEFAULT_GRID_POINTS,
            strike_points: DEFAULT_GRID_POINTS,
            axis: AxisMode::default(),
        }
    }

    /// Grid settings taken from pipeline parameters.
    pub fn from_params(params: &SurfaceParams) -> Self {
        Self::new()
            .time_points(params.n_time)
            .strike_points(params.n_strike)
            .use_moneyness(params.use_moneyness)
    }

    /// Number of points on the days-to-expiry axis.
    pub fn time_points(mut self, n: usize) -> Self {
        self.time_points = n;
        self
    }

    /// Number of points on the moneyness/strike axis.
    pub fn strike_points(mut self, n: usize) -> Self {
        self.strike_points = n;
        self
    }

    pub fn axis(mut self, axis: AxisMode) -> Self {
        self.axis = axis;
        self
    }

    pub fn use_moneyness(self, use_moneyness: bool) -> Self {
        self.axis(AxisMode::from_moneyness_flag(use_moneyness))
    }

    /// Grid the samples.
    ///
    /// Returns `Ok(None)` when no sample has a defined volatility or the
    /// defined samples do not span a triangle (single expiry, single strike,
    /// or collinear).
    ///
    /// # Errors
    /// Returns [`VolGridError::InvalidInput`](crate::VolGridError::InvalidInput)
    /// if either resolution is below 2.
    pub fn build(&self, samples: &[ImpliedVolSample]) -> error::Result<Option<SurfaceGrid>> {
        validate_resolution(self.time_points, "n_time")?;
        validate_resolution(self.strike_points, "n_strike")?;

        #[cfg(feature = "logging")]
        tracing::debug!(
            n_samples = samples.len(),
            n_time = self.time_points,
            n_strike = self.strike_points,
            axis = ?self.axis,
            "surface grid build started"
        );

        let defined: Vec<(&ImpliedVolSample, f64)> = samples
            .iter()
            .filter(|s| s.expiry.is_finite() && s.strike.is_finite())
            .filter_map(|s| s.vol.value().map(|v| (s, v.0)))
            .filter(|(_, v)| v.is_finite())
            .collect();
        if defined.is_empty() {
            #[cfg(feature = "logging")]
            tracing::debug!("no defined samples, surface grid not built");
            return Ok(None);
        }

        let reference_spot = match self.axis {
            AxisMode::Moneyness => Some(reference_spot(&defined)),
            AxisMode::Strike => None,
        };
        let points: Vec<(f64, f64)> = defined
            .iter()
            .map(|(s, _)| {
                let y = match reference_spot {
                    Some(spot) => conventions::moneyness(s.strike, spot),
                    None => s.strike,
                };
                (conventions::years_to_days(s.expiry), y)
            })
            .collect();
        let values: Vec<f64> = defined.iter().map(|&(_, v)| v).collect();

        let Some(linear) = LinearInterpolator::new(&points, &values)? else {
            #[cfg(feature = "logging")]
            tracing::debug!(
                n_defined = defined.len(),
                "samples do not span a triangle, surface grid not built"
            );
            return Ok(None);
        };
        let nearest = NearestInterpolator::new(&points, &values)?;

        let (t_min, t_max) = bounds(points.iter().map(|p| p.0));
        let (y_min, y_max) = bounds(points.iter().map(|p| p.1));
        let time_axis = linspace(t_min, t_max, self.time_points);
        let strike_axis = linspace(
            y_min * (1.0 - STRIKE_AXIS_PADDING),
            y_max * (1.0 + STRIKE_AXIS_PADDING),
            self.strike_points,
        );

        let cells: Vec<(f64, f64)> = time_axis
            .iter()
            .flat_map(|&t| strike_axis.iter().map(move |&y| (t, y)))
            .collect();
        let mut extrapolated = 0;
        let filled: Vec<f64> = linear
            .eval_many(&cells)
            .into_iter()
            .zip(&cells)
            .map(|(v, &(t, y))| {
                v.unwrap_or_else(|| {
                    extrapolated += 1;
                    nearest.eval(t, y)
                })
            })
            .collect();
        let grid: Vec<Vec<f64>> = filled
            .chunks(strike_axis.len())
            .map(<[f64]>::to_vec)
            .collect();

        #[cfg(feature = "logging")]
        tracing::debug!(
            n_defined = defined.len(),
            n_triangles = linear.triangle_count(),
            extrapolated_cells = extrapolated,
            "surface grid build complete"
        );

        SurfaceGrid::from_parts(
            time_axis,
            strike_axis,
            grid,
            self.axis,
            reference_spot,
            defined.len(),
            extrapolated,
        )
        .map(Some)
    }
}

impl Default for SurfaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Grid scattered samples with an explicit resolution and axis choice.
///
/// Equivalent to
/// `SurfaceBuilder::new().time_points(n_time).strike_points(n_strike).use_moneyness(use_moneyness).build(samples)`.
///
/// # Errors
/// Returns [`VolGridError::InvalidInput`](crate::VolGridError::InvalidInput)
/// if either resolution is below 2.
pub fn build_grid(
    samples: &[ImpliedVolSample],
    n_time: usize,
    n_strike: usize,
    use_moneyness: bool,
) -> error::Result<Option<SurfaceGrid>> {
    SurfaceBuilder::new()
        .time_points(n_time)
        .strike_points(n_strike)
        .use_moneyness(use_moneyness)
        .build(samples)
}

/// Spot of the first sample when it carries a usable one, otherwise the
/// median strike. The median is only a rough stand-in for spot.
fn reference_spot(defined: &[(&ImpliedVolSample, f64)]) -> f64 {
    if let Some((first, _)) = defined.first()
        && let Some(spot) = first.spot
        && spot.is_finite()
        && spot > 0.0
    {
        return spot;
    }
    let mut strikes: Vec<f64> = defined.iter().map(|(s, _)| s.strike).collect();
    median(&mut strikes)
}

/// Median of a non-empty slice; even lengths average the middle pair.
fn median(xs: &mut [f64]) -> f64 {
    xs.sort_by(|a, b| a.total_cmp(b));
    let mid = xs.len() / 2;
    if xs.len() % 2 == 0 {
        0.5 * (xs[mid - 1] + xs[mid])
    } else {
        xs[mid]
    }
}

fn bounds(xs: impl Iterator<Item = f64>) -> (f64, f64) {
    xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
        (lo.min(x), hi.max(x))
    })
}

/// `n` evenly spaced points from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    let step = (end - start) / (n - 1) as f64;
    (0..n)
        .map(|i| if i + 1 == n { end } else { start + step * i as f64 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VolGridError;
    use crate::types::{ImpliedVol, UndefinedReason, Vol};
    use approx::assert_abs_diff_eq;

    const EXPIRIES: [f64; 4] = [0.1, 0.25, 0.5, 1.0];
    const STRIKES: [f64; 5] = [80.0, 90.0, 100.0, 110.0, 120.0];

    fn plane_vol(days: f64, m: f64) -> f64 {
        0.2 + 1e-4 * days + 0.1 * (m - 1.0)
    }

    fn sample(expiry: f64, strike: f64, spot: Option<f64>, vol: f64) -> ImpliedVolSample {
        ImpliedVolSample::new(expiry, strike, spot, ImpliedVol::Defined(Vol(vol)))
    }

    fn rectangle_samples() -> Vec<ImpliedVolSample> {
        let mut out = Vec::new();
        for &t in &EXPIRIES {
            for &k in &STRIKES {
                let vol = plane_vol(t * conventions::DAYS_PER_YEAR, k / 100.0);
                out.push(sample(t, k, Some(100.0), vol));
            }
        }
        out
    }

    #[test]
    fn grid_is_complete() {
        let grid = build_grid(&rectangle_samples(), 50, 50, true).unwrap().unwrap();
        assert_eq!(grid.shape(), (50, 50));
        assert_eq!(grid.values().len(), 50);
        assert!(grid.values().iter().all(|row| row.len() == 50));
        assert!(grid.values().iter().flatten().all(|v| v.is_finite()));
        assert_eq!(grid.sample_count(), 20);
        assert_eq!(grid.reference_spot(), Some(100.0));
        assert_eq!(grid.time_label(), "days to expiry");
        assert_eq!(grid.strike_label(), "moneyness");
    }

    #[test]
    fn axes_span_samples_with_strike_padding() {
        let grid = build_grid(&rectangle_samples(), 12, 9, true).unwrap().unwrap();
        let time = grid.time_axis();
        assert_abs_diff_eq!(time[0], 0.1 * 365.25, epsilon = 1e-12);
        assert_abs_diff_eq!(time[11], 365.25, epsilon = 1e-12);
        assert!(time.windows(2).all(|w| w[1] > w[0]));

        let strike = grid.strike_axis();
        assert_abs_diff_eq!(strike[0], 0.8 * 0.95, epsilon = 1e-12);
        assert_abs_diff_eq!(strike[8], 1.2 * 1.05, epsilon = 1e-12);
        assert!(strike.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn linear_pass_reproduces_plane_inside_hull() {
        let grid = build_grid(&rectangle_samples(), 15, 40, true).unwrap().unwrap();
        let mut checked = 0;
        for (i, &t) in grid.time_axis().iter().enumerate() {
            for (j, &m) in grid.strike_axis().iter().enumerate() {
                if (0.81..=1.19).contains(&m) {
                    let v = grid.value(i, j).unwrap();
                    assert_abs_diff_eq!(v, plane_vol(t, m), epsilon = 1e-9);
                    checked += 1;
                }
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn cells_outside_hull_take_nearest_sample() {
        let grid = build_grid(&rectangle_samples(), 10, 21, true).unwrap().unwrap();
        assert!(grid.extrapolated_cells() > 0);
        // Lowest padded moneyness at the shortest expiry: closest sample is
        // (36.525 days, m = 0.8).
        let expected = plane_vol(0.1 * 365.25, 0.8);
        assert_abs_diff_eq!(grid.value(0, 0).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn undefined_samples_are_dropped() {
        let mut samples = rectangle_samples();
        samples.push(ImpliedVolSample::new(
            2.0,
            300.0,
            Some(100.0),
            ImpliedVol::Undefined(UndefinedReason::UnachievablePrice),
        ));
        let grid = build_grid(&samples, 10, 10, true).unwrap().unwrap();
        assert_eq!(grid.sample_count(), 20);
        assert_abs_diff_eq!(grid.time_axis()[9], 365.25, epsilon = 1e-12);
    }

    #[test]
    fn all_undefined_gives_none() {
        let samples: Vec<ImpliedVolSample> = rectangle_samples()
            .into_iter()
            .map(|s| ImpliedVolSample {
                vol: ImpliedVol::Undefined(UndefinedReason::NoConvergence),
                ..s
            })
            .collect();
        assert!(build_grid(&samples, 10, 10, true).unwrap().is_none());
        assert!(build_grid(&[], 10, 10, true).unwrap().is_none());
    }

    #[test]
    fn single_expiry_gives_none() {
        let samples: Vec<ImpliedVolSample> = STRIKES
            .iter()
            .map(|&k| sample(0.25, k, Some(100.0), 0.2))
            .collect();
        assert!(build_grid(&samples, 10, 10, true).unwrap().is_none());
    }

    #[test]
    fn resolution_below_two_rejected() {
        let samples = rectangle_samples();
        assert!(matches!(
            build_grid(&samples, 1, 10, true),
            Err(VolGridError::InvalidInput { .. })
        ));
        assert!(matches!(
            build_grid(&[], 10, 0, true),
            Err(VolGridError::InvalidInput { .. })
        ));
    }

    #[test]
    fn strike_axis_uses_raw_strikes() {
        let grid = SurfaceBuilder::new()
            .axis(AxisMode::Strike)
            .time_points(5)
            .strike_points(5)
            .build(&rectangle_samples())
            .unwrap()
            .unwrap();
        assert_eq!(grid.axis_mode(), AxisMode::Strike);
        assert_eq!(grid.reference_spot(), None);
        assert_eq!(grid.strike_label(), "strike");
        assert_abs_diff_eq!(grid.strike_axis()[0], 76.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grid.strike_axis()[4], 126.0, epsilon = 1e-12);
    }

    #[test]
    fn median_strike_fallback_without_spot() {
        let samples = vec![
            sample(0.1, 90.0, None, 0.25),
            sample(0.1, 120.0, None, 0.22),
            sample(0.5, 100.0, Some(100.0), 0.2),
            sample(0.5, 110.0, None, 0.21),
        ];
        let grid = build_grid(&samples, 5, 5, true).unwrap().unwrap();
        assert_eq!(grid.reference_spot(), Some(105.0));
        assert_abs_diff_eq!(grid.strike_axis()[0], 0.95 * 90.0 / 105.0, epsilon = 1e-12);
    }

    #[test]
    fn median_of_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn linspace_hits_endpoints() {
        let xs = linspace(1.0, 2.0, 5);
        assert_eq!(xs, vec![1.0, 1.25, 1.5, 1.75, 2.0]);
    }

    #[test]
    fn from_params_carries_grid_settings() {
        let params = SurfaceParams {
            n_time: 7,
            n_strike: 9,
            use_moneyness: false,
            ..SurfaceParams::default()
        };
        let builder = SurfaceBuilder::from_params(&params);
        assert_eq!(
            builder,
            SurfaceBuilder::new()
                .time_points(7)
                .strike_points(9)
                .axis(AxisMode::Strike)
        );
    }
}
