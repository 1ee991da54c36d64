//! Rates computed on demand by integrating the differential cross section.

use std::sync::Arc;

use crate::energy_cut::{CutRegime, EnergyCutSettings};
use crate::integral::Integral;
use crate::parametrization::{KinematicLimits, Parametrization, Target};
use crate::particle::ParticleDef;
use crate::utilities::{hash_combine_all, hash_str};

/// Which moment of the continuous loss a calculator integrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossMoment {
    /// `E ∫ v dσ/dv dv`
    Dedx,
    /// `E² ∫ v² dσ/dv dv`
    De2dx,
}

impl LossMoment {
    pub fn label(&self) -> &'static str {
        match self {
            LossMoment::Dedx => "dedx",
            LossMoment::De2dx => "de2dx",
        }
    }

    fn power(&self) -> i32 {
        match self {
            LossMoment::Dedx => 1,
            LossMoment::De2dx => 2,
        }
    }
}

/// The pieces every calculator of one target needs: model, particle, target
/// and integrator.
#[derive(Debug, Clone)]
pub struct RateFunctional {
    param: Arc<dyn Parametrization>,
    particle: ParticleDef,
    target: Target,
    integral: Integral,
}

impl RateFunctional {
    pub fn new(
        param: Arc<dyn Parametrization>,
        particle: ParticleDef,
        target: Target,
        integral: Integral,
    ) -> Self {
        RateFunctional {
            param,
            particle,
            target,
            integral,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn lower_energy_lim(&self) -> f64 {
        self.param.lower_energy_lim(&self.particle)
    }

    pub fn hash(&self) -> u64 {
        hash_combine_all(&[self.param.hash(), self.particle.hash(), self.target.hash()])
    }

    pub fn kinematic_limits(&self, energy: f64) -> KinematicLimits {
        self.param
            .kinematic_limits(&self.particle, &self.target, energy)
    }

    /// `∫_{v_low}^{v_high} v^power dσ/dv dv` at `energy`.
    fn moment(&self, energy: f64, v_low: f64, v_high: f64, power: i32) -> f64 {
        self.integral.integrate(
            v_low,
            v_high,
            |v| {
                v.powi(power)
                    * self
                        .param
                        .differential_cross_section(&self.particle, &self.target, energy, v)
            },
            self.param.integration_method(),
        )
    }

    /// `v` above `v_low` where `∫_{v_low}^{v} dσ/dv dv` reaches `rate`.
    fn invert(&self, energy: f64, v_low: f64, v_high: f64, rate: f64) -> f64 {
        self.integral
            .integrate_with_random_ratio(
                v_low,
                v_high,
                |v| {
                    self.param
                        .differential_cross_section(&self.particle, &self.target, energy, v)
                },
                self.param.integration_method(),
                -rate,
            )
            .upper_limit()
    }
}

/// dE/dx or dE²/dx of one target, integrated below the energy cut.
#[derive(Debug, Clone)]
pub struct ContinuousIntegral {
    functional: RateFunctional,
    cut: EnergyCutSettings,
    moment: LossMoment,
}

impl ContinuousIntegral {
    pub fn new(functional: RateFunctional, cut: EnergyCutSettings, moment: LossMoment) -> Self {
        ContinuousIntegral {
            functional,
            cut,
            moment,
        }
    }

    pub fn functional(&self) -> &RateFunctional {
        &self.functional
    }

    pub fn moment(&self) -> LossMoment {
        self.moment
    }

    pub fn cut_regime(&self, energy: f64) -> CutRegime {
        self.cut
            .regime(self.functional.kinematic_limits(energy), energy)
    }

    pub fn calculate(&self, energy: f64) -> f64 {
        let f = &self.functional;
        if energy < f.lower_energy_lim() {
            return 0.0;
        }
        let limits = f.param.kinematic_limits(&f.particle, &f.target, energy);
        let v_cut = self.cut.cut(limits, energy);
        if v_cut <= limits.v_min {
            return 0.0;
        }
        let power = self.moment.power();
        energy.powi(power) * f.moment(energy, limits.v_min, v_cut, power)
    }

    pub fn hash(&self) -> u64 {
        hash_combine_all(&[
            self.functional.hash(),
            self.cut.hash(),
            hash_str(self.moment.label()),
        ])
    }
}

/// dN/dx of one target above the energy cut, or over the full kinematic
/// range when there is no cut.
#[derive(Debug, Clone)]
pub struct DndxIntegral {
    functional: RateFunctional,
    cut: Option<EnergyCutSettings>,
}

impl DndxIntegral {
    pub fn new(functional: RateFunctional, cut: Option<EnergyCutSettings>) -> Self {
        DndxIntegral { functional, cut }
    }

    pub fn functional(&self) -> &RateFunctional {
        &self.functional
    }

    /// `None` without a cut.
    pub fn cut_regime(&self, energy: f64) -> Option<CutRegime> {
        self.cut
            .map(|cut| cut.regime(self.functional.kinematic_limits(energy), energy))
    }

    /// Range `(v_low, v_max)` stochastic losses at `energy` are drawn from.
    pub fn loss_range(&self, energy: f64) -> (f64, f64) {
        let f = &self.functional;
        let limits = f.param.kinematic_limits(&f.particle, &f.target, energy);
        let v_low = match &self.cut {
            Some(cut) => cut.cut(limits, energy),
            None => limits.v_min,
        };
        (v_low, limits.v_max)
    }

    /// `∫_{v_low}^{v} dσ/dv dv`, clamped to the loss range.
    pub fn partial(&self, energy: f64, v: f64) -> f64 {
        let (v_low, v_max) = self.loss_range(energy);
        let v = v.min(v_max);
        if v <= v_low {
            return 0.0;
        }
        self.functional.moment(energy, v_low, v, 0)
    }

    /// Integral between two losses of the range, used to build tables
    /// segment by segment.
    pub(crate) fn segment(&self, energy: f64, v_from: f64, v_to: f64) -> f64 {
        self.functional.moment(energy, v_from, v_to, 0)
    }

    pub fn calculate(&self, energy: f64) -> f64 {
        if energy < self.functional.lower_energy_lim() {
            return 0.0;
        }
        let (v_low, v_max) = self.loss_range(energy);
        if v_low >= v_max {
            return 0.0;
        }
        self.functional.moment(energy, v_low, v_max, 0)
    }

    /// Relative loss `v` at which the partial rate from the cut reaches
    /// `rate`. Saturates at `v_max` when `rate` exceeds the total.
    pub fn upper_limit(&self, energy: f64, rate: f64) -> f64 {
        debug_assert!(rate > 0.0, "rate must be positive");
        let (v_low, v_max) = self.loss_range(energy);
        if v_low >= v_max {
            return v_max;
        }
        self.functional.invert(energy, v_low, v_max, rate)
    }

    pub fn hash(&self) -> u64 {
        hash_combine_all(&[
            self.functional.hash(),
            self.cut.map_or(0, |c| c.hash()),
            hash_str("dndx"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::config::IntegralSettings;
    use crate::parametrization::toy::{InverseLoss, V_MAX, V_MIN};
    use approx::assert_relative_eq;

    fn oxygen_functional() -> (RateFunctional, ParticleDef, Target) {
        let particle = ParticleDef::mu_minus();
        let target = Target::Component(Arc::new(Component::oxygen(1.0).unwrap()));
        let functional = RateFunctional::new(
            Arc::new(InverseLoss),
            particle.clone(),
            target.clone(),
            Integral::new(IntegralSettings::default()),
        );
        (functional, particle, target)
    }

    #[test]
    fn test_dedx_matches_closed_form() {
        let (functional, particle, target) = oxygen_functional();
        let cut = EnergyCutSettings::new(500.0, 0.05, false).unwrap();
        let dedx = ContinuousIntegral::new(functional, cut, LossMoment::Dedx);
        for energy in [1e3, 1e5, 1e7] {
            let k = InverseLoss::strength(&particle, &target, energy);
            let v_cut = cut.raw_cut(energy);
            let expected = energy * k * (v_cut - V_MIN);
            assert_relative_eq!(dedx.calculate(energy), expected, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_de2dx_matches_closed_form() {
        let (functional, particle, target) = oxygen_functional();
        let cut = EnergyCutSettings::new(-1.0, 0.05, true).unwrap();
        let de2dx = ContinuousIntegral::new(functional, cut, LossMoment::De2dx);
        let energy = 1e6;
        let k = InverseLoss::strength(&particle, &target, energy);
        let expected = energy * energy * k * (0.05f64.powi(2) - V_MIN * V_MIN) / 2.0;
        assert_relative_eq!(de2dx.calculate(energy), expected, max_relative = 1e-6);
    }

    #[test]
    fn test_dndx_and_upper_limit() {
        let (functional, particle, target) = oxygen_functional();
        let cut = EnergyCutSettings::new(-1.0, 0.05, false).unwrap();
        let dndx = DndxIntegral::new(functional, Some(cut));
        let energy = 1e5;
        let k = InverseLoss::strength(&particle, &target, energy);

        let total = dndx.calculate(energy);
        assert_relative_eq!(total, k * (V_MAX / 0.05).ln(), max_relative = 1e-6);

        let rate = 0.3 * total;
        let v = dndx.upper_limit(energy, rate);
        assert_relative_eq!(v, 0.05 * (rate / k).exp(), max_relative = 1e-5);
        assert_relative_eq!(dndx.partial(energy, v), rate, max_relative = 1e-5);

        // rates beyond the total saturate at v_max
        assert_eq!(dndx.upper_limit(energy, 2.0 * total), V_MAX);
    }

    #[test]
    fn test_zero_below_lower_energy_limit() {
        let (functional, particle, _) = oxygen_functional();
        let cut = EnergyCutSettings::new(500.0, 0.05, false).unwrap();
        let below = 0.5 * particle.mass;
        assert_eq!(ContinuousIntegral::new(functional.clone(), cut, LossMoment::Dedx).calculate(below), 0.0);
        assert_eq!(DndxIntegral::new(functional, Some(cut)).calculate(below), 0.0);
    }

    #[test]
    fn test_dndx_without_cut_uses_full_range() {
        let (functional, _, _) = oxygen_functional();
        let dndx = DndxIntegral::new(functional, None);
        assert_eq!(dndx.loss_range(1e4), (V_MIN, V_MAX));
    }

    #[test]
    fn test_hash_distinguishes_moments() {
        let (functional, _, _) = oxygen_functional();
        let cut = EnergyCutSettings::new(500.0, 0.05, false).unwrap();
        let dedx = ContinuousIntegral::new(functional.clone(), cut, LossMoment::Dedx);
        let de2dx = ContinuousIntegral::new(functional, cut, LossMoment::De2dx);
        assert_ne!(dedx.hash(), de2dx.hash());
    }
}
