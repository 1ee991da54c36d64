//! Combination of per-target calculators into medium-level rates.

use std::sync::Arc;

use crate::calculator::{CalculatorKind, ContinuousCalculator, DndxCalculator};
use crate::calculator_integral::{ContinuousIntegral, DndxIntegral, LossMoment, RateFunctional};
use crate::component::Component;
use crate::config::Config;
use crate::energy_cut::EnergyCutSettings;
use crate::integral::Integral;
use crate::medium::Medium;
use crate::parametrization::{Parametrization, Target};
use crate::particle::ParticleDef;

/// Inverse number fraction of `component` in `medium`:
/// `sum_nucleons / (atom_in_molecule * atomic_num)`.
pub fn component_weight(medium: &Medium, component: &Component) -> f64 {
    medium.sum_nucleons() / (component.atom_in_molecule() * component.atomic_num())
}

/// A calculator together with the component it belongs to and its weight.
/// `component` is `None` for the single whole-medium entry, whose weight is 1.
#[derive(Debug, Clone)]
pub struct WeightedEntry<C> {
    pub component: Option<Arc<Component>>,
    pub weight: f64,
    pub calculator: C,
}

/// dE/dx or dE²/dx summed over all entries.
#[derive(Debug, Clone)]
pub struct ContinuousAggregate {
    entries: Vec<WeightedEntry<ContinuousCalculator>>,
}

impl ContinuousAggregate {
    pub fn entries(&self) -> &[WeightedEntry<ContinuousCalculator>] {
        &self.entries
    }

    pub fn calculate(&self, energy: f64) -> f64 {
        self.entries
            .iter()
            .map(|e| e.calculator.calculate(energy) / e.weight)
            .sum()
    }
}

/// dN/dx entries, per component or for the whole medium.
///
/// Component-wise rates are divided by the entry weight; the whole-medium
/// rate is returned as the calculator gives it.
#[derive(Debug, Clone)]
pub struct DndxAggregate {
    entries: Vec<WeightedEntry<DndxCalculator>>,
    component_wise: bool,
}

impl DndxAggregate {
    pub fn entries(&self) -> &[WeightedEntry<DndxCalculator>] {
        &self.entries
    }

    pub fn entry(&self, component: &Component) -> Option<&WeightedEntry<DndxCalculator>> {
        self.entries
            .iter()
            .find(|e| e.component.as_deref() == Some(component))
    }

    pub fn targets(&self) -> Vec<Option<Arc<Component>>> {
        self.entries.iter().map(|e| e.component.clone()).collect()
    }

    /// Total rate, or the rate of one component when `component` is given.
    /// Unknown components have rate 0. Medium-level rates ignore `component`.
    pub fn calculate(&self, energy: f64, component: Option<&Component>) -> f64 {
        if !self.component_wise {
            return self
                .entries
                .iter()
                .map(|e| e.calculator.calculate(energy))
                .sum();
        }
        match component {
            Some(c) => self
                .entry(c)
                .map_or(0.0, |e| e.calculator.calculate(energy) / e.weight),
            None => self
                .entries
                .iter()
                .map(|e| e.calculator.calculate(energy) / e.weight)
                .sum(),
        }
    }

    /// Sampled relative loss for `rate`, rescaled into the per-atom frame
    /// for component-wise entries. `None` when a component-wise aggregate is
    /// asked for a component it does not hold.
    pub fn upper_limit(&self, component: Option<&Component>, energy: f64, rate: f64) -> Option<f64> {
        if !self.component_wise {
            return self
                .entries
                .first()
                .map(|e| e.calculator.upper_limit(energy, rate));
        }
        let entry = self.entry(component?)?;
        Some(entry.calculator.upper_limit(energy, rate * entry.weight))
    }
}

/// Builds aggregates for one parametrization, particle and medium.
pub struct AggregateBuilder<'a> {
    param: &'a Arc<dyn Parametrization>,
    particle: &'a ParticleDef,
    medium: &'a Arc<Medium>,
    kind: CalculatorKind,
    config: &'a Config,
}

impl<'a> AggregateBuilder<'a> {
    pub fn new(
        param: &'a Arc<dyn Parametrization>,
        particle: &'a ParticleDef,
        medium: &'a Arc<Medium>,
        kind: CalculatorKind,
        config: &'a Config,
    ) -> Self {
        AggregateBuilder {
            param,
            particle,
            medium,
            kind,
            config,
        }
    }

    /// One functional per entry, with the entry's component and weight.
    fn functionals(&self) -> Vec<(Option<Arc<Component>>, f64, RateFunctional)> {
        let integral = Integral::new(self.config.integration);
        let functional = |target: Target| {
            RateFunctional::new(
                Arc::clone(self.param),
                self.particle.clone(),
                target,
                integral,
            )
        };

        if self.param.is_component_wise() {
            self.medium
                .components()
                .iter()
                .map(|c| {
                    (
                        Some(Arc::clone(c)),
                        component_weight(self.medium, c),
                        functional(Target::Component(Arc::clone(c))),
                    )
                })
                .collect()
        } else {
            vec![(None, 1.0, functional(Target::Medium(Arc::clone(self.medium))))]
        }
    }

    pub fn continuous(&self, cut: EnergyCutSettings, moment: LossMoment) -> ContinuousAggregate {
        let def = match moment {
            LossMoment::Dedx => &self.config.dedx_def,
            LossMoment::De2dx => &self.config.de2dx_def,
        };
        let table_dir = self.config.table_dir.as_deref();
        let entries = self
            .functionals()
            .into_iter()
            .map(|(component, weight, functional)| WeightedEntry {
                component,
                weight,
                calculator: ContinuousCalculator::new(
                    ContinuousIntegral::new(functional, cut, moment),
                    self.kind,
                    def,
                    table_dir,
                ),
            })
            .collect();
        ContinuousAggregate { entries }
    }

    pub fn dndx(&self, cut: Option<EnergyCutSettings>) -> DndxAggregate {
        let table_dir = self.config.table_dir.as_deref();
        let entries = self
            .functionals()
            .into_iter()
            .map(|(component, weight, functional)| WeightedEntry {
                component,
                weight,
                calculator: DndxCalculator::new(
                    DndxIntegral::new(functional, cut),
                    self.kind,
                    &self.config.dndx_def,
                    table_dir,
                ),
            })
            .collect();
        DndxAggregate {
            entries,
            component_wise: self.param.is_component_wise(),
        }
    }
}
