/*
MIT License
Copyright (c) 2021 Germán Molina
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

use crate::error::ClimateError;
use crate::Float;
use serde::{Deserialize, Serialize};

/// What to do when evaluating a [`LinearSpline`] outside of
/// the range of its `x` values
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extrapolation {
    /// Return the first or last value
    #[default]
    Constant,
    /// Continue the first or last segment
    Linear,
}

/// A piecewise-linear function `y(x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SplineTable")]
pub struct LinearSpline {
    x: Vec<Float>,
    y: Vec<Float>,

    /// How to extrapolate
    pub extrapolation: Extrapolation,
}

/// A [`LinearSpline`] as it is written, before checking it
#[derive(Deserialize)]
struct SplineTable {
    x: Vec<Float>,
    y: Vec<Float>,
    #[serde(default)]
    extrapolation: Extrapolation,
}

impl TryFrom<SplineTable> for LinearSpline {
    type Error = ClimateError;

    fn try_from(table: SplineTable) -> Result<Self, Self::Error> {
        Ok(LinearSpline::new(table.x, table.y)?.with_extrapolation(table.extrapolation))
    }
}

impl LinearSpline {
    /// Builds a new spline. `x` needs to be strictly increasing and
    /// as long as `y`.
    pub fn new(x: Vec<Float>, y: Vec<Float>) -> Result<Self, ClimateError> {
        if x.is_empty() {
            return Err(ClimateError::SplineConstructionFailure(
                "no values given".into(),
            ));
        }
        if x.len() != y.len() {
            return Err(ClimateError::SplineConstructionFailure(format!(
                "x has {} values, but y has {}",
                x.len(),
                y.len()
            )));
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ClimateError::SplineConstructionFailure(format!(
                "x values must be strictly increasing (x[{}] = {}, x[{}] = {})",
                i,
                x[i],
                i + 1,
                x[i + 1]
            )));
        }
        Ok(Self {
            x,
            y,
            extrapolation: Extrapolation::Constant,
        })
    }

    /// Builds a spline from a table that is known to be valid (e.g., a constant)
    pub(crate) fn from_table(x: &[Float], y: &[Float]) -> Self {
        debug_assert!(!x.is_empty() && x.len() == y.len());
        debug_assert!(x.windows(2).all(|w| w[0] < w[1]));
        Self {
            x: x.to_vec(),
            y: y.to_vec(),
            extrapolation: Extrapolation::Constant,
        }
    }

    /// Same as `new()` but setting the extrapolation
    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// The `x` values
    pub fn x(&self) -> &[Float] {
        &self.x
    }

    /// The `y` values
    pub fn y(&self) -> &[Float] {
        &self.y
    }

    /// Index `i` so that `x[i] <= x < x[i+1]`. Only valid
    /// when there are at least two points.
    fn segment(&self, x: Float) -> usize {
        let i = self.x.partition_point(|v| *v <= x);
        i.saturating_sub(1).min(self.x.len() - 2)
    }

    /// Evaluates the spline at `x`
    pub fn value(&self, x: Float) -> Float {
        let n = self.x.len();
        if n == 1 {
            return self.y[0];
        }
        if self.extrapolation == Extrapolation::Constant {
            if x <= self.x[0] {
                return self.y[0];
            }
            if x >= self.x[n - 1] {
                return self.y[n - 1];
            }
        }
        let i = self.segment(x);
        let (x1, x2) = (self.x[i], self.x[i + 1]);
        let (y1, y2) = (self.y[i], self.y[i + 1]);
        y1 + (x - x1) * (y2 - y1) / (x2 - x1)
    }

    /// The slope of the spline at `x`
    pub fn slope(&self, x: Float) -> Float {
        let n = self.x.len();
        if n == 1 {
            return 0.0;
        }
        if self.extrapolation == Extrapolation::Constant && (x < self.x[0] || x > self.x[n - 1]) {
            return 0.0;
        }
        let i = self.segment(x);
        (self.y[i + 1] - self.y[i]) / (self.x[i + 1] - self.x[i])
    }
}
