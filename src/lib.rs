// First, import any modules and re-export the types for Rust usage
mod aggregator;
mod calculator;
mod calculator_integral;
mod calculator_interpolant;
mod component;
mod config;
mod crosssection;
mod energy_cut;
mod energy_integral;
mod error;
mod integral;
mod interpolant;
mod medium;
mod parametrization;
mod particle;
pub mod constants;
pub mod table_cache;
pub mod utilities;

pub use aggregator::{component_weight, ContinuousAggregate, DndxAggregate, WeightedEntry};
pub use calculator::{CalculatorKind, ContinuousCalculator, DndxCalculator};
pub use calculator_integral::{ContinuousIntegral, DndxIntegral, LossMoment, RateFunctional};
pub use calculator_interpolant::{
    retransform_relativ_loss, transform_relativ_loss, ContinuousInterpolant, DndxInterpolant,
};
pub use component::Component;
pub use config::{Config, IntegralSettings, InterpolationDef, CONFIG};
pub use crosssection::{Behaviour, CrossSection, StochasticLoss, TargetRate};
pub use energy_cut::{CutRegime, EnergyCutSettings};
pub use energy_integral::EnergyIntegral;
pub use error::{CrossSectionError, Result};
pub use integral::{Integral, IntegrationMethod, RatioIntegral};
pub use interpolant::{
    Axis, AxisScale, CubicSpline, Interpolant1D, Interpolant2D, RowWeights, SegmentedInterpolant,
};
pub use medium::Medium;
pub use parametrization::{InteractionType, KinematicLimits, Parametrization, Target};
pub use particle::ParticleDef;
