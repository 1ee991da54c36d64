use rand::Rng;
use std::sync::Arc;

use crate::aggregator::{AggregateBuilder, ContinuousAggregate, DndxAggregate};
use crate::calculator::CalculatorKind;
use crate::calculator_integral::LossMoment;
use crate::component::Component;
use crate::config::{Config, IntegralSettings};
use crate::energy_cut::EnergyCutSettings;
use crate::energy_integral::EnergyIntegral;
use crate::error::{CrossSectionError, Result};
use crate::medium::Medium;
use crate::parametrization::{InteractionType, Parametrization};
use crate::particle::ParticleDef;
use crate::utilities::hash_combine_all;

/// How a parametrization is assembled into a cross section. Chosen once from
/// the parametrization's traits when the cross section is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Per component, with continuous and stochastic parts.
    ComponentWise,
    /// Whole medium, with continuous and stochastic parts.
    MediumWise,
    /// Per component, stochastic only.
    ComponentWiseOnlyStochastic,
    /// Whole medium, stochastic only.
    MediumWiseOnlyStochastic,
}

impl Behaviour {
    pub fn from_traits(component_wise: bool, only_stochastic: bool) -> Self {
        match (component_wise, only_stochastic) {
            (true, false) => Behaviour::ComponentWise,
            (false, false) => Behaviour::MediumWise,
            (true, true) => Behaviour::ComponentWiseOnlyStochastic,
            (false, true) => Behaviour::MediumWiseOnlyStochastic,
        }
    }

    pub fn is_component_wise(self) -> bool {
        matches!(
            self,
            Behaviour::ComponentWise | Behaviour::ComponentWiseOnlyStochastic
        )
    }

    pub fn is_only_stochastic(self) -> bool {
        matches!(
            self,
            Behaviour::ComponentWiseOnlyStochastic | Behaviour::MediumWiseOnlyStochastic
        )
    }
}

/// A dN/dx target with its rate at one energy.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRate {
    /// `None` for the whole-medium target.
    pub component: Option<Arc<Component>>,
    pub rate: f64,
}

/// One sampled stochastic interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticLoss {
    pub component: Option<Arc<Component>>,
    /// Relative energy loss.
    pub v: f64,
}

/// Cross section of one interaction for one particle in one medium.
///
/// Combines a [`Parametrization`], a [`ParticleDef`], a [`Medium`] and an
/// optional [`EnergyCutSettings`] into
///
/// * [`CrossSection::calculate_dedx`]: mean continuous loss per path length,
/// * [`CrossSection::calculate_de2dx`]: its second moment,
/// * [`CrossSection::calculate_dndx`]: rate of stochastic losses,
/// * [`CrossSection::calculate_stochastic_loss`]: relative loss of one
///   stochastic interaction for a given rate.
///
/// Every rate is either integrated on demand or read from an interpolation
/// table, depending on the `interpolate` flag given at construction. Tables
/// start at the lower energy limit but never below 1e-3 MeV, and energies
/// under a table's first node are integrated directly. Tables are split
/// where the energy cut changes from relative to absolute or reaches the
/// kinematic limits.
/// Queries never mutate the cross section, so one instance can be shared
/// between threads through `Arc`.
///
/// # Examples
///
/// ```ignore
/// let medium = Arc::new(Medium::water()?);
/// let cut = EnergyCutSettings::new(500.0, 0.05, false)?;
/// let xs = CrossSection::new(param, ParticleDef::mu_minus(), medium, Some(cut), true)?;
/// let dedx = xs.calculate_dedx(1e5);
/// ```
#[derive(Debug)]
pub struct CrossSection {
    behaviour: Behaviour,
    param: Arc<dyn Parametrization>,
    particle: ParticleDef,
    medium: Arc<Medium>,
    cut: Option<EnergyCutSettings>,
    dedx: Option<ContinuousAggregate>,
    de2dx: Option<ContinuousAggregate>,
    dndx: DndxAggregate,
    lower_energy_lim: f64,
    hash: u64,
    integration: IntegralSettings,
}

impl CrossSection {
    /// Build with the current global [`Config`].
    pub fn new(
        param: Arc<dyn Parametrization>,
        particle: ParticleDef,
        medium: Arc<Medium>,
        cut: Option<EnergyCutSettings>,
        interpolate: bool,
    ) -> Result<Self> {
        let config = Config::snapshot();
        Self::with_config(param, particle, medium, cut, interpolate, &config)
    }

    /// Build with an explicit configuration.
    ///
    /// Fails with [`CrossSectionError::Configuration`] when an only-stochastic
    /// parametrization gets a cut, or any other parametrization gets none.
    pub fn with_config(
        param: Arc<dyn Parametrization>,
        particle: ParticleDef,
        medium: Arc<Medium>,
        cut: Option<EnergyCutSettings>,
        interpolate: bool,
        config: &Config,
    ) -> Result<Self> {
        let behaviour = Behaviour::from_traits(param.is_component_wise(), param.is_only_stochastic());
        match (behaviour.is_only_stochastic(), cut.is_some()) {
            (true, true) => {
                return Err(CrossSectionError::Configuration(format!(
                    "Parametrization {} is only stochastic and does not take an energy cut",
                    param.name()
                )))
            }
            (false, false) => {
                return Err(CrossSectionError::Configuration(format!(
                    "Parametrization {} has a continuous part and needs an energy cut",
                    param.name()
                )))
            }
            _ => {}
        }

        let kind = CalculatorKind::from_interpolate(interpolate);
        log::debug!(
            "Building {} cross section for {} in {} ({:?}, {:?})",
            param.name(),
            particle.name,
            medium.name(),
            behaviour,
            kind
        );

        let builder = AggregateBuilder::new(&param, &particle, &medium, kind, config);
        let (dedx, de2dx) = match cut {
            Some(cut) => {
                let dedx = builder.continuous(cut, LossMoment::Dedx);
                let de2dx = if cut.continuous_randomization() {
                    Some(builder.continuous(cut, LossMoment::De2dx))
                } else {
                    None
                };
                (Some(dedx), de2dx)
            }
            None => (None, None),
        };
        let dndx = builder.dndx(cut);

        let lower_energy_lim = param.lower_energy_lim(&particle);
        let hash = hash_combine_all(&[
            param.hash(),
            particle.hash(),
            medium.hash(),
            cut.map_or(0, |c| c.hash()),
        ]);

        Ok(CrossSection {
            behaviour,
            param,
            particle,
            medium,
            cut,
            dedx,
            de2dx,
            dndx,
            lower_energy_lim,
            hash,
            integration: config.integration,
        })
    }

    /// Mean continuous energy loss per path length. Zero without a cut.
    /// `energy` must not be below [`CrossSection::lower_energy_lim`].
    pub fn calculate_dedx(&self, energy: f64) -> f64 {
        self.dedx.as_ref().map_or(0.0, |d| d.calculate(energy))
    }

    /// Second moment of the continuous loss. Zero unless the cut requests
    /// continuous randomization.
    pub fn calculate_de2dx(&self, energy: f64) -> f64 {
        self.de2dx.as_ref().map_or(0.0, |d| d.calculate(energy))
    }

    /// Total stochastic rate, or the rate of `component` alone. With
    /// interpolation, energies below the first table node (at least 1e-3
    /// MeV) are integrated instead of extrapolated.
    pub fn calculate_dndx(&self, energy: f64, component: Option<&Component>) -> f64 {
        self.dndx.calculate(energy, component)
    }

    /// Relative loss of a stochastic interaction with `component` whose
    /// partial rate from the cut equals `rate`.
    ///
    /// `rate` must lie in `(0, calculate_dndx(energy, component)]`; larger
    /// rates saturate at the kinematic maximum. Only-stochastic cross
    /// sections always return 1.
    pub fn calculate_stochastic_loss(
        &self,
        component: Option<&Component>,
        energy: f64,
        rate: f64,
    ) -> f64 {
        if self.behaviour.is_only_stochastic() {
            return 1.0;
        }
        debug_assert!(rate > 0.0, "rate must be positive, got {}", rate);
        let v = self.dndx.upper_limit(component, energy, rate);
        debug_assert!(v.is_some(), "component is not a target of this cross section");
        v.unwrap_or(0.0)
    }

    /// Pick a target with probability proportional to its dN/dx at `energy`.
    /// `rnd` is uniform in `[0, 1)`. `None` when no target has a positive
    /// rate.
    pub fn sample_target(&self, energy: f64, rnd: f64) -> Option<TargetRate> {
        let rates: Vec<TargetRate> = self
            .targets()
            .into_iter()
            .map(|component| {
                let rate = self.calculate_dndx(energy, component.as_deref());
                TargetRate { component, rate }
            })
            .collect();
        let total: f64 = rates.iter().map(|t| t.rate).sum();
        if total <= 0.0 {
            return None;
        }

        let pick = rnd * total;
        let mut cumulative = 0.0;
        let mut last = None;
        for target in rates.into_iter().filter(|t| t.rate > 0.0) {
            cumulative += target.rate;
            if cumulative > pick {
                return Some(target);
            }
            last = Some(target);
        }
        last
    }

    /// Draw a target and a stochastic loss with two random numbers from
    /// `rng`.
    pub fn sample_stochastic_loss<R: Rng + ?Sized>(
        &self,
        energy: f64,
        rng: &mut R,
    ) -> Option<StochasticLoss> {
        let target = self.sample_target(energy, rng.gen::<f64>())?;
        // uniform in (0, rate]
        let rate = target.rate * (1.0 - rng.gen::<f64>());
        let v = self.calculate_stochastic_loss(target.component.as_deref(), energy, rate);
        Some(StochasticLoss {
            component: target.component,
            v,
        })
    }

    /// `∫ dE / (dE/dx)` over energy, the path length a purely continuous
    /// loss needs between two energies.
    pub fn displacement_integral(self: &Arc<Self>) -> EnergyIntegral {
        let xs = Arc::clone(self);
        EnergyIntegral::new(
            move |energy| {
                let dedx = xs.calculate_dedx(energy);
                if dedx > 0.0 {
                    1.0 / dedx
                } else {
                    0.0
                }
            },
            self.lower_energy_lim,
            self.integration,
        )
    }

    pub fn lower_energy_lim(&self) -> f64 {
        self.lower_energy_lim
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn interaction_type(&self) -> InteractionType {
        self.param.interaction_type()
    }

    /// Every component with a dN/dx entry; `None` stands for the whole medium.
    pub fn targets(&self) -> Vec<Option<Arc<Component>>> {
        self.dndx.targets()
    }

    pub fn behaviour(&self) -> Behaviour {
        self.behaviour
    }

    pub fn parametrization(&self) -> &Arc<dyn Parametrization> {
        &self.param
    }

    pub fn particle(&self) -> &ParticleDef {
        &self.particle
    }

    pub fn medium(&self) -> &Arc<Medium> {
        &self.medium
    }

    pub fn cut(&self) -> Option<&EnergyCutSettings> {
        self.cut.as_ref()
    }
}
