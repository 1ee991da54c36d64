//! Integrals over energy, as opposed to the fixed-energy integrals over the
//! relative loss done by the rate calculators.

use std::fmt;
use std::sync::Arc;

use crate::config::IntegralSettings;
use crate::integral::{Integral, IntegrationMethod};

type EnergyFunction = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// `∫ g(E) dE` for an arbitrary function of energy, for example the
/// displacement `1 / (dE/dx)` of a continuous loss.
#[derive(Clone)]
pub struct EnergyIntegral {
    function: EnergyFunction,
    lower_lim: f64,
    integral: Integral,
}

impl fmt::Debug for EnergyIntegral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnergyIntegral")
            .field("lower_lim", &self.lower_lim)
            .field("integral", &self.integral)
            .finish()
    }
}

impl EnergyIntegral {
    pub fn new<F>(function: F, lower_lim: f64, settings: IntegralSettings) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        EnergyIntegral {
            function: Arc::new(function),
            lower_lim,
            integral: Integral::new(settings),
        }
    }

    pub fn lower_lim(&self) -> f64 {
        self.lower_lim
    }

    /// `∫_{e_initial}^{e_final} g(E) dE`; negative when `e_final < e_initial`
    /// for positive `g`.
    pub fn calculate(&self, e_initial: f64, e_final: f64) -> f64 {
        self.integral.integrate(
            e_initial,
            e_final,
            |e| (self.function)(e),
            IntegrationMethod::LogSubstitution,
        )
    }

    /// Energy below `e_initial` at which `|∫_{e_initial}^{E} g dE|` reaches
    /// `value`. Saturates at the lower limit.
    pub fn upper_limit(&self, e_initial: f64, value: f64) -> f64 {
        if value <= 0.0 || e_initial <= self.lower_lim {
            return e_initial.max(self.lower_lim);
        }
        self.integral
            .integrate_with_random_ratio(
                e_initial,
                self.lower_lim,
                |e| (self.function)(e),
                IntegrationMethod::LogSubstitution,
                -value,
            )
            .upper_limit()
    }
}
