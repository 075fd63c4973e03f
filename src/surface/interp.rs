//! Scattered-data interpolation on the plane.
//!
//! - [`LinearInterpolator`]: piecewise-linear over a Delaunay triangulation,
//!   undefined outside the convex hull of the samples.
//! - [`NearestInterpolator`]: value of the closest sample, defined everywhere.
//!
//! The triangulation is built on coordinates rescaled to the unit box so that
//! axes with very different units (days vs. moneyness) do not produce sliver
//! triangles. Barycentric weights are affine invariant, so values inside a
//! triangle are unaffected by the rescaling. Nearest-neighbour distances are
//! measured in the original coordinates.

use std::collections::HashSet;

use nalgebra::Point2;

use crate::error::{self, VolGridError};
use crate::surface::delaunay::Triangulation;

fn validate_samples(points: &[(f64, f64)], values: &[f64]) -> error::Result<()> {
    if points.len() != values.len() {
        return Err(VolGridError::InvalidInput {
            message: format!(
                "points ({}) and values ({}) must have the same length",
                points.len(),
                values.len()
            ),
        });
    }
    for (i, (&(x, y), &v)) in points.iter().zip(values).enumerate() {
        if !x.is_finite() || !y.is_finite() || !v.is_finite() {
            return Err(VolGridError::InvalidInput {
                message: format!("sample {i} is not finite: ({x}, {y}) -> {v}"),
            });
        }
    }
    Ok(())
}

/// Affine map of the sample bounding box onto the unit square.
#[derive(Debug, Clone, Copy)]
struct UnitScale {
    min_x: f64,
    span_x: f64,
    min_y: f64,
    span_y: f64,
}

impl UnitScale {
    /// `None` when either axis has zero extent.
    fn fit(points: &[(f64, f64)]) -> Option<Self> {
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(x, y) in points {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        let (span_x, span_y) = (max_x - min_x, max_y - min_y);
        if !(span_x > 0.0 && span_y > 0.0) {
            return None;
        }
        Some(Self {
            min_x,
            span_x,
            min_y,
            span_y,
        })
    }

    fn apply(&self, (x, y): (f64, f64)) -> Point2<f64> {
        Point2::new((x - self.min_x) / self.span_x, (y - self.min_y) / self.span_y)
    }
}

/// Piecewise-linear interpolant over a Delaunay triangulation.
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    scale: UnitScale,
    triangulation: Triangulation,
    values: Vec<f64>,
}

impl LinearInterpolator {
    /// Triangulate the sample points.
    ///
    /// Repeated coordinates keep the first value seen. Returns `Ok(None)`
    /// when the points do not span a triangle (fewer than three distinct
    /// points, or all collinear).
    ///
    /// # Errors
    /// Returns [`VolGridError::InvalidInput`] for mismatched lengths or
    /// non-finite samples.
    pub fn new(points: &[(f64, f64)], values: &[f64]) -> error::Result<Option<Self>> {
        validate_samples(points, values)?;
        let Some(scale) = UnitScale::fit(points) else {
            return Ok(None);
        };

        let mut seen = HashSet::with_capacity(points.len());
        let mut unique: Vec<Point2<f64>> = Vec::with_capacity(points.len());
        let mut unique_values = Vec::with_capacity(points.len());
        for (&pt, &v) in points.iter().zip(values) {
            let p = scale.apply(pt);
            // +0.0 so that -0.0 and 0.0 hash alike
            if seen.insert(((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())) {
                unique.push(p);
                unique_values.push(v);
            }
        }

        Ok(Triangulation::new(&unique).map(|triangulation| Self {
            scale,
            triangulation,
            values: unique_values,
        }))
    }

    /// Interpolated value at `(x, y)`, or `None` outside the convex hull.
    pub fn eval(&self, x: f64, y: f64) -> Option<f64> {
        let (v, w) = self.triangulation.locate(self.scale.apply((x, y)))?;
        Some(self.combine(v, w))
    }

    /// Interpolated values at each query, `None` outside the convex hull.
    ///
    /// Each search starts from the triangle of the previous hit, so queries
    /// in scan order (such as grid cells) are located in near-constant time.
    pub fn eval_many(&self, queries: &[(f64, f64)]) -> Vec<Option<f64>> {
        let mut hint = 0;
        queries
            .iter()
            .map(|&q| {
                let (t, w) = self.triangulation.locate_from(self.scale.apply(q), hint)?;
                hint = t;
                Some(self.combine(self.triangulation.triangles()[t], w))
            })
            .collect()
    }

    fn combine(&self, v: [usize; 3], w: [f64; 3]) -> f64 {
        w[0] * self.values[v[0]] + w[1] * self.values[v[1]] + w[2] * self.values[v[2]]
    }

    /// Number of triangles in the underlying triangulation.
    pub fn triangle_count(&self) -> usize {
        self.triangulation.triangles().len()
    }
}

/// Nearest-neighbour interpolant.
#[derive(Debug, Clone)]
pub struct NearestInterpolator {
    points: Vec<(f64, f64)>,
    values: Vec<f64>,
}

impl NearestInterpolator {
    /// # Errors
    /// Returns [`VolGridError::InvalidInput`] for empty input, mismatched
    /// lengths, or non-finite samples.
    pub fn new(points: &[(f64, f64)], values: &[f64]) -> error::Result<Self> {
        validate_samples(points, values)?;
        if points.is_empty() {
            return Err(VolGridError::InvalidInput {
                message: "nearest-neighbour interpolation needs at least one sample".into(),
            });
        }
        Ok(Self {
            points: points.to_vec(),
            values: values.to_vec(),
        })
    }

    /// Value of the closest sample; ties resolve to the earliest sample.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, &(px, py)) in self.points.iter().enumerate() {
            let dist = (px - x).powi(2) + (py - y).powi(2);
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        self.values[best]
    }
}

/// Linear interpolation of scattered samples at each query point.
///
/// Returns `Ok(None)` when the samples do not span a triangle; otherwise
/// queries outside the convex hull yield `None` entries.
///
/// # Errors
/// Returns [`VolGridError::InvalidInput`] for mismatched lengths or
/// non-finite samples.
pub fn interpolate_linear(
    points: &[(f64, f64)],
    values: &[f64],
    queries: &[(f64, f64)],
) -> error::Result<Option<Vec<Option<f64>>>> {
    Ok(LinearInterpolator::new(points, values)?
        .map(|interp| interp.eval_many(queries)))
}

/// Nearest-neighbour interpolation of scattered samples at each query point.
///
/// # Errors
/// Returns [`VolGridError::InvalidInput`] for empty input, mismatched
/// lengths, or non-finite samples.
pub fn interpolate_nearest(
    points: &[(f64, f64)],
    values: &[f64],
    queries: &[(f64, f64)],
) -> error::Result<Vec<f64>> {
    let interp = NearestInterpolator::new(points, values)?;
    Ok(queries.iter().map(|&(x, y)| interp.eval(x, y)).collect())
}
