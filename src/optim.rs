//! Internal root-finding utilities for implied volatility inversion.

use crate::error::{self, VolGridError};

/// Configuration for Brent's bracketed root finder.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BrentConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Absolute tolerance on the root location.
    pub xtol: f64,
    /// Relative tolerance on the root location.
    pub rtol: f64,
}

/// Find a zero of `f` in `[a, b]` with Brent's method.
///
/// Combines bisection, secant and inverse quadratic extrapolation, falling
/// back to bisection whenever an interpolated step would leave the bracket
/// or shrink it too slowly. Requires `f(a)` and `f(b)` to differ in sign.
///
/// # Errors
/// Returns [`VolGridError::NumericalError`] if the endpoints do not bracket
/// a root, an evaluation is NaN, or `max_iter` is reached.
pub(crate) fn brent_root<F>(f: F, a: f64, b: f64, config: &BrentConfig) -> error::Result<f64>
where
    F: Fn(f64) -> f64,
{
    let mut x_pre = a;
    let mut x_cur = b;
    let mut f_pre = f(x_pre);
    let mut f_cur = f(x_cur);

    if f_pre.is_nan() || f_cur.is_nan() {
        return Err(VolGridError::NumericalError {
            message: format!("objective is NaN at bracket endpoints [{a}, {b}]"),
        });
    }
    if f_pre * f_cur > 0.0 {
        return Err(VolGridError::NumericalError {
            message: format!(
                "root not bracketed: f({a})={f_pre}, f({b})={f_cur} have the same sign"
            ),
        });
    }
    if f_pre == 0.0 {
        return Ok(x_pre);
    }
    if f_cur == 0.0 {
        return Ok(x_cur);
    }

    // Contrapoint: f(x_blk) and f(x_cur) always have opposite signs.
    let mut x_blk = 0.0;
    let mut f_blk = 0.0;
    let mut s_pre = 0.0;
    let mut s_cur = 0.0;

    for _ in 0..config.max_iter {
        if f_pre != 0.0 && f_cur != 0.0 && f_pre.is_sign_negative() != f_cur.is_sign_negative() {
            x_blk = x_pre;
            f_blk = f_pre;
            s_pre = x_cur - x_pre;
            s_cur = s_pre;
        }
        if f_blk.abs() < f_cur.abs() {
            x_pre = x_cur;
            x_cur = x_blk;
            x_blk = x_pre;

            f_pre = f_cur;
            f_cur = f_blk;
            f_blk = f_pre;
        }

        let delta = 0.5 * (config.xtol + config.rtol * x_cur.abs());
        let s_bis = 0.5 * (x_blk - x_cur);
        if f_cur == 0.0 || s_bis.abs() < delta {
            return Ok(x_cur);
        }

        if s_pre.abs() > delta && f_cur.abs() < f_pre.abs() {
            let s_try = if x_pre == x_blk {
                // secant
                -f_cur * (x_cur - x_pre) / (f_cur - f_pre)
            } else {
                // inverse quadratic extrapolation
                let d_pre = (f_pre - f_cur) / (x_pre - x_cur);
                let d_blk = (f_blk - f_cur) / (x_blk - x_cur);
                -f_cur * (f_blk * d_blk - f_pre * d_pre) / (d_blk * d_pre * (f_blk - f_pre))
            };
            if 2.0 * s_try.abs() < s_pre.abs().min(3.0 * s_bis.abs() - delta) {
                s_pre = s_cur;
                s_cur = s_try;
            } else {
                s_pre = s_bis;
                s_cur = s_bis;
            }
        } else {
            s_pre = s_bis;
            s_cur = s_bis;
        }

        x_pre = x_cur;
        f_pre = f_cur;
        if s_cur.abs() > delta {
            x_cur += s_cur;
        } else {
            x_cur += if s_bis > 0.0 { delta } else { -delta };
        }

        f_cur = f(x_cur);
        if f_cur.is_nan() {
            return Err(VolGridError::NumericalError {
                message: format!("objective is NaN at x={x_cur}"),
            });
        }
    }

    Err(VolGridError::NumericalError {
        message: format!("root finder did not converge in {} iterations", config.max_iter),
    })
}
