//! Interpolation tables over energy (and transformed loss).
//!
//! A table is a set of samples on an [`Axis`] plus the spline built from
//! them. Only the samples are serialized; splines are rebuilt on load.

use serde::{Deserialize, Serialize};

use crate::utilities::locate_interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisScale {
    Linear,
    /// Nodes equidistant in `ln x`.
    Exponential,
}

/// Sampling grid of one table dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    scale: AxisScale,
    low: f64,
    high: f64,
    nodes: usize,
}

impl Axis {
    pub fn linear(low: f64, high: f64, nodes: usize) -> Self {
        Axis {
            scale: AxisScale::Linear,
            low,
            high,
            nodes: nodes.max(2),
        }
    }

    /// `low` must be positive.
    pub fn exponential(low: f64, high: f64, nodes: usize) -> Self {
        Axis {
            scale: AxisScale::Exponential,
            low,
            high,
            nodes: nodes.max(2),
        }
    }

    pub fn scale(&self) -> AxisScale {
        self.scale
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn transform(&self, x: f64) -> f64 {
        match self.scale {
            AxisScale::Linear => x,
            AxisScale::Exponential => x.ln(),
        }
    }

    pub fn back_transform(&self, t: f64) -> f64 {
        match self.scale {
            AxisScale::Linear => t,
            AxisScale::Exponential => t.exp(),
        }
    }

    /// Value of node `i`. The last node is exactly `high`.
    pub fn node(&self, i: usize) -> f64 {
        if i == 0 {
            return self.low;
        }
        if i + 1 >= self.nodes {
            return self.high;
        }
        let t_low = self.transform(self.low);
        let t_high = self.transform(self.high);
        let step = (t_high - t_low) / (self.nodes - 1) as f64;
        self.back_transform(t_low + i as f64 * step)
    }

    pub fn node_values(&self) -> Vec<f64> {
        (0..self.nodes).map(|i| self.node(i)).collect()
    }

    pub fn transformed_nodes(&self) -> Vec<f64> {
        (0..self.nodes).map(|i| self.transform(self.node(i))).collect()
    }
}

/// Natural cubic spline, stored per interval as `[d, c, b, a]` so that
/// `S_i(t) = a + b dt + c dt² + d dt³` with `dt = t - x_i`.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    coefs: Vec<[f64; 4]>,
}

impl CubicSpline {
    /// `x` must be strictly increasing and hold at least two points.
    pub fn natural(x: Vec<f64>, y: &[f64]) -> Self {
        let n = x.len() - 1;
        let h: Vec<f64> = (0..n).map(|i| x[i + 1] - x[i]).collect();
        let m = natural_moments(&h, y);
        let coefs = (0..n)
            .map(|i| {
                let d = (m[i + 1] - m[i]) / (6.0 * h[i]);
                let c = m[i] / 2.0;
                let b = (y[i + 1] - y[i]) / h[i] - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0;
                [d, c, b, y[i]]
            })
            .collect();
        CubicSpline { x, coefs }
    }

    /// Value at `t`; outside the grid the outermost polynomial is continued.
    pub fn value(&self, t: f64) -> f64 {
        let i = locate_interval(&self.x, t);
        let dt = t - self.x[i];
        let [d, c, b, a] = self.coefs[i];
        ((d * dt + c) * dt + b) * dt + a
    }
}

/// Second derivatives at the nodes with `m[0] = m[n] = 0`.
///
/// Interior equations
/// `h[i-1] m[i-1] + 2 (h[i-1] + h[i]) m[i] + h[i] m[i+1] = 6 (s[i] - s[i-1])`
/// form a tridiagonal system, solved with the Thomas algorithm.
fn natural_moments(h: &[f64], y: &[f64]) -> Vec<f64> {
    let n = h.len();
    let mut m = vec![0.0; n + 1];
    if n < 2 {
        return m;
    }

    let size = n - 1;
    let mut c_prime = vec![0.0; size];
    let mut d_prime = vec![0.0; size];
    for k in 0..size {
        let i = k + 1;
        let sub = if k > 0 { h[i - 1] } else { 0.0 };
        let diag = 2.0 * (h[i - 1] + h[i]);
        let sup = if k + 1 < size { h[i] } else { 0.0 };
        let rhs = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);

        let (prev_c, prev_d) = if k > 0 {
            (c_prime[k - 1], d_prime[k - 1])
        } else {
            (0.0, 0.0)
        };
        let denom = diag - sub * prev_c;
        c_prime[k] = sup / denom;
        d_prime[k] = (rhs - sub * prev_d) / denom;
    }

    m[size] = d_prime[size - 1];
    for k in (0..size - 1).rev() {
        m[k + 1] = d_prime[k] - c_prime[k] * m[k + 2];
    }
    m
}

/// Serialized form of [`Interpolant1D`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table1D {
    axis: Axis,
    values: Vec<f64>,
}

/// One-dimensional table `f(x)` with a natural spline in the transformed
/// axis coordinate.
///
/// When every sample is positive the spline runs through `ln f`, so power
/// laws on an exponential axis are reproduced exactly. Otherwise it runs
/// through `f`, and a table without negative samples never evaluates below
/// zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Table1D", into = "Table1D")]
pub struct Interpolant1D {
    axis: Axis,
    values: Vec<f64>,
    log_values: bool,
    non_negative: bool,
    spline: CubicSpline,
}

impl Interpolant1D {
    pub fn build<F>(axis: Axis, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        let values = axis.node_values().into_iter().map(f).collect();
        Self::from_values(axis, values)
    }

    /// `values` holds one sample per node of `axis`.
    pub fn from_values(axis: Axis, values: Vec<f64>) -> Self {
        let log_values = values.iter().all(|&v| v > 0.0 && v.is_finite());
        let non_negative = values.iter().all(|&v| v >= 0.0);
        let y: Vec<f64> = if log_values {
            values.iter().map(|v| v.ln()).collect()
        } else {
            values.clone()
        };
        let spline = CubicSpline::natural(axis.transformed_nodes(), &y);
        Interpolant1D {
            axis,
            values,
            log_values,
            non_negative,
            spline,
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let y = self.spline.value(self.axis.transform(x));
        if self.log_values {
            y.exp()
        } else if self.non_negative {
            y.max(0.0)
        } else {
            y
        }
    }

    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl TryFrom<Table1D> for Interpolant1D {
    type Error = String;

    fn try_from(table: Table1D) -> Result<Self, Self::Error> {
        if table.values.len() != table.axis.nodes() {
            return Err(format!(
                "table holds {} values for {} nodes",
                table.values.len(),
                table.axis.nodes()
            ));
        }
        Ok(Interpolant1D::from_values(table.axis, table.values))
    }
}

impl From<Interpolant1D> for Table1D {
    fn from(interpolant: Interpolant1D) -> Self {
        Table1D {
            axis: interpolant.axis,
            values: interpolant.values,
        }
    }
}

/// One-dimensional table split into pieces at points where the tabulated
/// function has a kink. Every piece spans its own copy of the axis with the
/// full node count, so no spline runs across a kink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentedInterpolant {
    pieces: Vec<Interpolant1D>,
}

impl SegmentedInterpolant {
    /// `breaks` must be increasing and lie strictly inside the axis range.
    pub fn build<F>(axis: Axis, breaks: &[f64], f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        let mut bounds = Vec::with_capacity(breaks.len() + 2);
        bounds.push(axis.low);
        bounds.extend_from_slice(breaks);
        bounds.push(axis.high);
        let pieces = bounds
            .windows(2)
            .map(|range| {
                let piece = Axis {
                    low: range[0],
                    high: range[1],
                    ..axis
                };
                Interpolant1D::build(piece, &f)
            })
            .collect();
        SegmentedInterpolant { pieces }
    }

    pub fn pieces(&self) -> &[Interpolant1D] {
        &self.pieces
    }

    /// Value from the piece holding `x`; the outermost pieces extrapolate.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.pieces
            .iter()
            .find(|piece| x <= piece.axis().high())
            .or_else(|| self.pieces.last())
            .map_or(0.0, |piece| piece.evaluate(x))
    }
}

/// Lagrange weights of up to four neighbouring rows.
#[derive(Debug, Clone, Copy)]
pub struct RowWeights {
    start: usize,
    count: usize,
    weights: [f64; 4],
}

/// Serialized form of [`Interpolant2D`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table2D {
    axis_x: Axis,
    axis_y: Axis,
    rows: Vec<Vec<f64>>,
}

/// Two-dimensional table `f(x, y)`.
///
/// Each node of `axis_x` owns a natural spline along `y`; between nodes the
/// row values are combined with four-point Lagrange interpolation in the
/// transformed `x` coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Table2D", into = "Table2D")]
pub struct Interpolant2D {
    axis_x: Axis,
    axis_y: Axis,
    rows: Vec<Vec<f64>>,
    t_nodes: Vec<f64>,
    splines: Vec<CubicSpline>,
}

const BISECTION_STEPS: usize = 64;

impl Interpolant2D {
    /// `rows[i][j]` is the sample at `axis_x.node(i)`, `axis_y.node(j)`.
    pub fn from_rows(axis_x: Axis, axis_y: Axis, rows: Vec<Vec<f64>>) -> Self {
        let y_nodes = axis_y.transformed_nodes();
        let splines = rows
            .iter()
            .map(|row| CubicSpline::natural(y_nodes.clone(), row))
            .collect();
        Interpolant2D {
            t_nodes: axis_x.transformed_nodes(),
            axis_x,
            axis_y,
            rows,
            splines,
        }
    }

    pub fn axis_x(&self) -> &Axis {
        &self.axis_x
    }

    pub fn axis_y(&self) -> &Axis {
        &self.axis_y
    }

    /// Interpolation weights of the rows around `x`.
    pub fn row_weights(&self, x: f64) -> RowWeights {
        let t = self.axis_x.transform(x);
        let n = self.t_nodes.len();
        let count = n.min(4);
        let i = locate_interval(&self.t_nodes, t);
        let start = i.saturating_sub(1).min(n - count);

        let mut weights = [0.0; 4];
        for (j, w) in weights.iter_mut().enumerate().take(count) {
            let tj = self.t_nodes[start + j];
            *w = (0..count)
                .filter(|&k| k != j)
                .map(|k| {
                    let tk = self.t_nodes[start + k];
                    (t - tk) / (tj - tk)
                })
                .product();
        }
        RowWeights {
            start,
            count,
            weights,
        }
    }

    pub fn evaluate_with(&self, weights: &RowWeights, y: f64) -> f64 {
        let u = self.axis_y.transform(y);
        (0..weights.count)
            .map(|j| weights.weights[j] * self.splines[weights.start + j].value(u))
            .sum()
    }

    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        self.evaluate_with(&self.row_weights(x), y)
    }

    /// Smallest `y` on the axis range where the surface at `x` reaches
    /// `target`, assuming it does not decrease along `y`. Saturates at the
    /// axis ends.
    pub fn find_y(&self, x: f64, target: f64) -> f64 {
        let weights = self.row_weights(x);
        let mut low = self.axis_y.low();
        let mut high = self.axis_y.high();
        if self.evaluate_with(&weights, low) >= target {
            return low;
        }
        if self.evaluate_with(&weights, high) <= target {
            return high;
        }
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (low + high);
            if self.evaluate_with(&weights, mid) < target {
                low = mid;
            } else {
                high = mid;
            }
        }
        0.5 * (low + high)
    }
}

impl TryFrom<Table2D> for Interpolant2D {
    type Error = String;

    fn try_from(table: Table2D) -> Result<Self, Self::Error> {
        if table.rows.len() != table.axis_x.nodes()
            || table
                .rows
                .iter()
                .any(|row| row.len() != table.axis_y.nodes())
        {
            return Err(String::from("table rows do not match the axes"));
        }
        Ok(Interpolant2D::from_rows(table.axis_x, table.axis_y, table.rows))
    }
}

impl From<Interpolant2D> for Table2D {
    fn from(interpolant: Interpolant2D) -> Self {
        Table2D {
            axis_x: interpolant.axis_x,
            axis_y: interpolant.axis_y,
            rows: interpolant.rows,
        }
    }
}
