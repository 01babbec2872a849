// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gradient functions
//!
//! Given the horizontal and vertical brightness differences around a
//! pixel, produce that pixel's energy.  Several classic variants are
//! provided, from the plain Euclidean norm to single-axis magnitudes,
//! and the caller may supply their own.

use failure::Fail;
use std::fmt;
use std::str::FromStr;

/// The type signature of a caller-supplied gradient.
pub type GradientFn = fn(f64, f64) -> f64;

#[derive(Copy, Clone)]
pub enum GradientFunction {
    /// `sqrt(x² + y²)`
    Norm,
    /// `sqrt(x² + 0.1 y²)`
    NormBias,
    /// `|x| + |y|`
    SumAbs,
    /// `|x|`
    XAbs,
    /// `|y|`
    YAbs,
    /// Always zero; only the bias matters.
    Null,
    Custom(GradientFn),
}

impl GradientFunction {
    #[inline]
    pub fn apply(&self, gx: f64, gy: f64) -> f64 {
        match self {
            GradientFunction::Norm => (gx * gx + gy * gy).sqrt(),
            GradientFunction::NormBias => (gx * gx + 0.1 * gy * gy).sqrt(),
            GradientFunction::SumAbs => gx.abs() + gy.abs(),
            GradientFunction::XAbs => gx.abs(),
            GradientFunction::YAbs => gy.abs(),
            GradientFunction::Null => 0.0,
            GradientFunction::Custom(f) => f(gx, gy),
        }
    }
}

impl Default for GradientFunction {
    fn default() -> Self {
        GradientFunction::Norm
    }
}

impl fmt::Debug for GradientFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            GradientFunction::Norm => "norm",
            GradientFunction::NormBias => "norm-bias",
            GradientFunction::SumAbs => "sumabs",
            GradientFunction::XAbs => "xabs",
            GradientFunction::YAbs => "yabs",
            GradientFunction::Null => "null",
            GradientFunction::Custom(_) => "custom",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Fail)]
#[fail(display = "unknown gradient function '{}'", _0)]
pub struct UnknownGradient(String);

impl FromStr for GradientFunction {
    type Err = UnknownGradient;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "norm" => Ok(GradientFunction::Norm),
            "norm-bias" => Ok(GradientFunction::NormBias),
            "sumabs" => Ok(GradientFunction::SumAbs),
            "xabs" => Ok(GradientFunction::XAbs),
            "yabs" => Ok(GradientFunction::YAbs),
            "null" => Ok(GradientFunction::Null),
            other => Err(UnknownGradient(other.to_string())),
        }
    }
}
