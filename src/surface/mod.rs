//! Gridded implied volatility surfaces.
//!
//! A [`SurfaceGrid`] samples implied volatility on a rectangular
//! (days-to-expiry × moneyness-or-strike) lattice built from a scattered
//! cloud of [`ImpliedVolSample`](crate::types::ImpliedVolSample)s:
//!
//! - [`SurfaceBuilder`] / [`build_grid`]: two-pass gridding (linear over a
//!   Delaunay triangulation, nearest-neighbour outside the hull)
//! - [`LinearInterpolator`] / [`NearestInterpolator`]: the scattered-data
//!   interpolants, also exposed as [`interpolate_linear`] and
//!   [`interpolate_nearest`]

pub mod builder;
mod delaunay;
pub mod interp;

pub use builder::{
    DEFAULT_GRID_POINTS, STRIKE_AXIS_PADDING, SurfaceBuilder, TIME_AXIS_LABEL, build_grid,
};
pub use interp::{LinearInterpolator, NearestInterpolator, interpolate_linear, interpolate_nearest};

use serde::{Deserialize, Serialize};

use crate::conventions::AxisMode;
use crate::error::{self, VolGridError};

/// Implied volatility sampled on a rectangular grid.
///
/// `values()[i][j]` is the volatility at `time_axis()[i]` days and
/// `strike_axis()[j]`. Every value is finite and both axes are strictly
/// increasing. Immutable once built.
///
/// # Examples
///
/// ```
/// use volgrid::surface::build_grid;
/// use volgrid::types::{ImpliedVol, ImpliedVolSample, Vol};
///
/// let samples: Vec<ImpliedVolSample> = [(0.1, 90.0, 0.25), (0.1, 110.0, 0.22), (0.5, 100.0, 0.2)]
///     .into_iter()
///     .map(|(t, k, v)| ImpliedVolSample::new(t, k, Some(100.0), ImpliedVol::Defined(Vol(v))))
///     .collect();
///
/// let grid = build_grid(&samples, 10, 12, true)?.expect("three non-collinear samples");
/// assert_eq!(grid.shape(), (10, 12));
/// assert_eq!(grid.strike_label(), "moneyness");
/// assert!(grid.values().iter().flatten().all(|v| v.is_finite()));
/// # Ok::<(), volgrid::VolGridError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SurfaceGridRaw", into = "SurfaceGridRaw")]
pub struct SurfaceGrid {
    time_axis: Vec<f64>,
    strike_axis: Vec<f64>,
    values: Vec<Vec<f64>>,
    time_label: String,
    strike_label: String,
    axis_mode: AxisMode,
    reference_spot: Option<f64>,
    sample_count: usize,
    extrapolated_cells: usize,
}

#[derive(Clone, Serialize, Deserialize)]
struct SurfaceGridRaw {
    time_axis: Vec<f64>,
    strike_axis: Vec<f64>,
    values: Vec<Vec<f64>>,
    time_label: String,
    strike_label: String,
    axis_mode: AxisMode,
    reference_spot: Option<f64>,
    sample_count: usize,
    extrapolated_cells: usize,
}

impl TryFrom<SurfaceGridRaw> for SurfaceGrid {
    type Error = VolGridError;
    fn try_from(raw: SurfaceGridRaw) -> Result<Self, Self::Error> {
        let grid = Self {
            time_axis: raw.time_axis,
            strike_axis: raw.strike_axis,
            values: raw.values,
            time_label: raw.time_label,
            strike_label: raw.strike_label,
            axis_mode: raw.axis_mode,
            reference_spot: raw.reference_spot,
            sample_count: raw.sample_count,
            extrapolated_cells: raw.extrapolated_cells,
        };
        grid.check()?;
        Ok(grid)
    }
}

impl From<SurfaceGrid> for SurfaceGridRaw {
    fn from(g: SurfaceGrid) -> Self {
        Self {
            time_axis: g.time_axis,
            strike_axis: g.strike_axis,
            values: g.values,
            time_label: g.time_label,
            strike_label: g.strike_label,
            axis_mode: g.axis_mode,
            reference_spot: g.reference_spot,
            sample_count: g.sample_count,
            extrapolated_cells: g.extrapolated_cells,
        }
    }
}

fn check_axis(axis: &[f64], name: &str) -> error::Result<()> {
    if axis.len() < 2 {
        return Err(VolGridError::InvalidInput {
            message: format!("{name} needs at least 2 points, got {}", axis.len()),
        });
    }
    if axis.iter().any(|x| !x.is_finite()) || axis.windows(2).any(|w| w[1] <= w[0]) {
        return Err(VolGridError::InvalidInput {
            message: format!("{name} must be finite and strictly increasing"),
        });
    }
    Ok(())
}

impl SurfaceGrid {
    pub(crate) fn from_parts(
        time_axis: Vec<f64>,
        strike_axis: Vec<f64>,
        values: Vec<Vec<f64>>,
        axis_mode: AxisMode,
        reference_spot: Option<f64>,
        sample_count: usize,
        extrapolated_cells: usize,
    ) -> error::Result<Self> {
        let grid = Self {
            time_axis,
            strike_axis,
            values,
            time_label: builder::TIME_AXIS_LABEL.to_string(),
            strike_label: axis_mode.label().to_string(),
            axis_mode,
            reference_spot,
            sample_count,
            extrapolated_cells,
        };
        grid.check()?;
        Ok(grid)
    }

    fn check(&self) -> error::Result<()> {
        check_axis(&self.time_axis, "time axis")?;
        check_axis(&self.strike_axis, "strike axis")?;
        if self.values.len() != self.time_axis.len()
            || self.values.iter().any(|row| row.len() != self.strike_axis.len())
        {
            return Err(VolGridError::InvalidInput {
                message: format!(
                    "values must be {} x {}",
                    self.time_axis.len(),
                    self.strike_axis.len()
                ),
            });
        }
        if self.values.iter().flatten().any(|v| !v.is_finite()) {
            return Err(VolGridError::NumericalError {
                message: "surface grid contains non-finite values".into(),
            });
        }
        Ok(())
    }

    /// Days to expiry, strictly increasing.
    pub fn time_axis(&self) -> &[f64] {
        &self.time_axis
    }

    /// Moneyness or strike, strictly increasing.
    pub fn strike_axis(&self) -> &[f64] {
        &self.strike_axis
    }

    /// Volatility matrix indexed `[time][strike]`.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn value(&self, time_index: usize, strike_index: usize) -> Option<f64> {
        self.values.get(time_index)?.get(strike_index).copied()
    }

    /// `(time_axis().len(), strike_axis().len())`.
    pub fn shape(&self) -> (usize, usize) {
        (self.time_axis.len(), self.strike_axis.len())
    }

    pub fn time_label(&self) -> &str {
        &self.time_label
    }

    pub fn strike_label(&self) -> &str {
        &self.strike_label
    }

    pub fn axis_mode(&self) -> AxisMode {
        self.axis_mode
    }

    /// Spot used to normalize strikes; `None` on a strike axis.
    pub fn reference_spot(&self) -> Option<f64> {
        self.reference_spot
    }

    /// Number of defined samples the grid was built from.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Cells outside the sample hull, filled from the nearest sample.
    pub fn extrapolated_cells(&self) -> usize {
        self.extrapolated_cells
    }
}
