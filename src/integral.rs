//! Romberg integration over one variable, plus the inverse problem of
//! finding the upper limit at which an integral reaches a target value.

use crate::config::IntegralSettings;

/// Substitution applied before integrating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationMethod {
    /// Plain Romberg on the original variable.
    Romberg,
    /// Romberg on `t = ln x`, integrand multiplied by `x`. Handles integrands
    /// that diverge like `1/x` at a small positive lower bound. Falls back to
    /// [`IntegrationMethod::Romberg`] when a bound is not positive.
    LogSubstitution,
}

/// Result of [`Integral::integrate_with_random_ratio`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioIntegral {
    /// Integral from the start to `upper_limit`.
    pub sum: f64,
    /// Upper limit at which the target was reached, or the bound when it
    /// could not be reached.
    pub upper_limit: f64,
}

impl RatioIntegral {
    pub fn upper_limit(&self) -> f64 {
        self.upper_limit
    }
}

/// Stateless Romberg integrator.
///
/// Every call is independent, so one integrator can be shared freely
/// between calculators and threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integral {
    precision: f64,
    max_steps: usize,
    order: usize,
}

const ROOT_MAX_ITERATIONS: usize = 100;

impl Integral {
    pub fn new(settings: IntegralSettings) -> Self {
        Integral {
            precision: settings.precision,
            max_steps: settings.max_steps.max(1),
            order: settings.order.max(2),
        }
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// Integral of `f` from `low` to `high`. Swapped bounds give the negated
    /// value, equal bounds give zero.
    pub fn integrate<F>(&self, low: f64, high: f64, f: F, method: IntegrationMethod) -> f64
    where
        F: Fn(f64) -> f64,
    {
        if low == high {
            return 0.0;
        }
        match method {
            IntegrationMethod::LogSubstitution if low > 0.0 && high > 0.0 => {
                self.romberg(low.ln(), high.ln(), &|t: f64| {
                    let x = t.exp();
                    x * f(x)
                })
            }
            _ => self.romberg(low, high, &f),
        }
    }

    /// Find `x` between `start` and `bound` with `|∫_start^x f| = target`.
    ///
    /// A positive `ratio` sets the target to `ratio` times the absolute
    /// integral over the whole range, a negative one sets it to `-ratio`
    /// directly. When the whole range does not reach the target the result
    /// saturates at `bound`. `f` must not change sign on the range.
    pub fn integrate_with_random_ratio<F>(
        &self,
        start: f64,
        bound: f64,
        f: F,
        method: IntegrationMethod,
        ratio: f64,
    ) -> RatioIntegral
    where
        F: Fn(f64) -> f64,
    {
        let total = self.integrate(start, bound, &f, method);
        let total_abs = total.abs();
        let target = if ratio < 0.0 { -ratio } else { ratio * total_abs };

        if target >= total_abs || start == bound {
            return RatioIntegral {
                sum: total,
                upper_limit: bound,
            };
        }
        if target <= 0.0 {
            return RatioIntegral {
                sum: 0.0,
                upper_limit: start,
            };
        }

        // search on a parameter s in [0, 1] along the integration variable
        let log_space = method == IntegrationMethod::LogSubstitution && start > 0.0 && bound > 0.0;
        let (u_start, u_bound) = if log_space {
            (start.ln(), bound.ln())
        } else {
            (start, bound)
        };
        let width = u_bound - u_start;
        let position = |s: f64| {
            let u = u_start + s * width;
            if log_space {
                u.exp()
            } else {
                u
            }
        };

        let mut s_low = 0.0;
        let mut s_high = 1.0;
        let mut s = target / total_abs;
        let mut x = position(s);
        let mut sum = 0.0;
        for _ in 0..ROOT_MAX_ITERATIONS {
            x = position(s);
            sum = self.integrate(start, x, &f, method);
            let residual = sum.abs() - target;
            if residual.abs() <= self.precision * target {
                break;
            }
            if residual < 0.0 {
                s_low = s;
            } else {
                s_high = s;
            }
            if s_high - s_low <= f64::EPSILON {
                break;
            }

            let jacobian = if log_space { x * width } else { width };
            let slope = (f(x) * jacobian).abs();
            let newton = s - residual / slope;
            s = if slope.is_finite() && slope > 0.0 && newton > s_low && newton < s_high {
                newton
            } else {
                0.5 * (s_low + s_high)
            };
        }

        RatioIntegral {
            sum,
            upper_limit: x,
        }
    }

    fn romberg(&self, a: f64, b: f64, f: &dyn Fn(f64) -> f64) -> f64 {
        let k = self.order;
        let mut sums: Vec<f64> = Vec::with_capacity(self.max_steps);
        let mut steps: Vec<f64> = Vec::with_capacity(self.max_steps);
        let mut trapezoid = 0.0;
        let mut step = 1.0;
        let mut estimate = 0.0;

        for n in 1..=self.max_steps {
            trapezoid = refine_trapezoid(a, b, f, trapezoid, n);
            sums.push(trapezoid);
            steps.push(step);
            estimate = trapezoid;

            if n >= k {
                let (value, error) = extrapolate_to_zero(&steps[n - k..], &sums[n - k..]);
                estimate = value;
                if error.abs() <= self.precision * value.abs() {
                    return value;
                }
            }
            step *= 0.25;
        }

        log::debug!(
            "Romberg integration on [{}, {}] stopped after {} steps without reaching precision {}",
            a,
            b,
            self.max_steps,
            self.precision
        );
        estimate
    }
}

/// n-th stage of the extended trapezoid rule. Stage n adds 2^(n-2) interior
/// points to the previous estimate.
fn refine_trapezoid(a: f64, b: f64, f: &dyn Fn(f64) -> f64, previous: f64, n: usize) -> f64 {
    if n == 1 {
        return 0.5 * (b - a) * (f(a) + f(b));
    }
    let points = 1usize << (n - 2);
    let delta = (b - a) / points as f64;
    let mut x = a + 0.5 * delta;
    let mut sum = 0.0;
    for _ in 0..points {
        sum += f(x);
        x += delta;
    }
    0.5 * (previous + (b - a) * sum / points as f64)
}

/// Neville extrapolation of the points `(xa, ya)` to `x = 0`.
/// Returns the value and the size of the last correction.
fn extrapolate_to_zero(xa: &[f64], ya: &[f64]) -> (f64, f64) {
    let n = xa.len();
    let mut c = ya.to_vec();
    let mut d = ya.to_vec();

    let mut ns = 0usize;
    let mut closest = xa[0].abs();
    for (i, x) in xa.iter().enumerate() {
        if x.abs() < closest {
            ns = i;
            closest = x.abs();
        }
    }

    let mut y = ya[ns];
    let mut dy = 0.0;
    let mut ns = ns as isize;
    for m in 1..n {
        for i in 0..n - m {
            let ho = xa[i];
            let hp = xa[i + m];
            let w = c[i + 1] - d[i];
            let den = w / (ho - hp);
            d[i] = hp * den;
            c[i] = ho * den;
        }
        dy = if 2 * ns < (n - m) as isize {
            c[ns as usize]
        } else {
            ns -= 1;
            d[ns as usize]
        };
        y += dy;
    }
    (y, dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn integral() -> Integral {
        Integral::new(IntegralSettings::default())
    }

    #[test]
    fn test_polynomial() {
        let value = integral().integrate(0.0, 2.0, |x| x * x, IntegrationMethod::Romberg);
        assert_relative_eq!(value, 8.0 / 3.0, max_relative = 1e-10);
    }

    #[test]
    fn test_swapped_bounds_negate() {
        let i = integral();
        let forward = i.integrate(1.0, 3.0, |x| x.exp(), IntegrationMethod::Romberg);
        let backward = i.integrate(3.0, 1.0, |x| x.exp(), IntegrationMethod::Romberg);
        assert_relative_eq!(forward, -backward, max_relative = 1e-12);
        assert_relative_eq!(forward, 3f64.exp() - 1f64.exp(), max_relative = 1e-6);
        assert_eq!(i.integrate(2.0, 2.0, |x| x, IntegrationMethod::Romberg), 0.0);
    }

    #[test]
    fn test_log_substitution_handles_inverse() {
        let value = integral().integrate(1e-8, 1.0, |x| 1.0 / x, IntegrationMethod::LogSubstitution);
        assert_relative_eq!(value, -(1e-8f64).ln(), max_relative = 1e-9);
    }

    #[test]
    fn test_log_substitution_falls_back_at_zero() {
        let value = integral().integrate(0.0, 1.0, |x| x, IntegrationMethod::LogSubstitution);
        assert_relative_eq!(value, 0.5, max_relative = 1e-10);
    }

    #[test]
    fn test_ratio_fraction_of_total() {
        // ∫_0^x 2t dt = x² = 0.25 * 1
        let result =
            integral().integrate_with_random_ratio(0.0, 1.0, |x| 2.0 * x, IntegrationMethod::Romberg, 0.25);
        assert_relative_eq!(result.upper_limit(), 0.5, max_relative = 1e-6);
        assert_relative_eq!(result.sum, 0.25, max_relative = 1e-6);
    }

    #[test]
    fn test_ratio_absolute_target() {
        // ∫_1^x dt/t = ln x = 1
        let result = integral().integrate_with_random_ratio(
            1.0,
            100.0,
            |x| 1.0 / x,
            IntegrationMethod::LogSubstitution,
            -1.0,
        );
        assert_relative_eq!(result.upper_limit(), std::f64::consts::E, max_relative = 1e-5);
    }

    #[test]
    fn test_ratio_saturates_at_bound() {
        let result =
            integral().integrate_with_random_ratio(0.0, 1.0, |_| 1.0, IntegrationMethod::Romberg, -5.0);
        assert_eq!(result.upper_limit(), 1.0);
        assert_relative_eq!(result.sum, 1.0, max_relative = 1e-10);
    }

    #[test]
    fn test_ratio_downward_direction() {
        // integrate from 10 down towards 1: ∫_x^10 dt = 10 - x = 4
        let result =
            integral().integrate_with_random_ratio(10.0, 1.0, |_| 1.0, IntegrationMethod::Romberg, -4.0);
        assert_relative_eq!(result.upper_limit(), 6.0, max_relative = 1e-6);
    }
}
