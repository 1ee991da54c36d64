//! Calculator dispatch: each rate is either integrated on demand or read
//! from a table. The choice is made once, when the cross section is built.

use std::path::Path;

use crate::calculator_integral::{ContinuousIntegral, DndxIntegral};
use crate::calculator_interpolant::{ContinuousInterpolant, DndxInterpolant};
use crate::config::InterpolationDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculatorKind {
    Integral,
    Interpolant,
}

impl CalculatorKind {
    pub fn from_interpolate(interpolate: bool) -> Self {
        if interpolate {
            CalculatorKind::Interpolant
        } else {
            CalculatorKind::Integral
        }
    }
}

#[derive(Debug, Clone)]
pub enum ContinuousCalculator {
    Integral(ContinuousIntegral),
    Interpolant(ContinuousInterpolant),
}

impl ContinuousCalculator {
    pub fn new(
        integral: ContinuousIntegral,
        kind: CalculatorKind,
        def: &InterpolationDef,
        table_dir: Option<&Path>,
    ) -> Self {
        match kind {
            CalculatorKind::Integral => ContinuousCalculator::Integral(integral),
            CalculatorKind::Interpolant => {
                ContinuousCalculator::Interpolant(ContinuousInterpolant::new(&integral, def, table_dir))
            }
        }
    }

    pub fn calculate(&self, energy: f64) -> f64 {
        match self {
            ContinuousCalculator::Integral(c) => c.calculate(energy),
            ContinuousCalculator::Interpolant(c) => c.calculate(energy),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DndxCalculator {
    Integral(DndxIntegral),
    Interpolant(DndxInterpolant),
}

impl DndxCalculator {
    pub fn new(
        integral: DndxIntegral,
        kind: CalculatorKind,
        def: &InterpolationDef,
        table_dir: Option<&Path>,
    ) -> Self {
        match kind {
            CalculatorKind::Integral => DndxCalculator::Integral(integral),
            CalculatorKind::Interpolant => {
                DndxCalculator::Interpolant(DndxInterpolant::new(integral, def, table_dir))
            }
        }
    }

    pub fn calculate(&self, energy: f64) -> f64 {
        match self {
            DndxCalculator::Integral(c) => c.calculate(energy),
            DndxCalculator::Interpolant(c) => c.calculate(energy),
        }
    }

    pub fn upper_limit(&self, energy: f64, rate: f64) -> f64 {
        match self {
            DndxCalculator::Integral(c) => c.upper_limit(energy, rate),
            DndxCalculator::Interpolant(c) => c.upper_limit(energy, rate),
        }
    }
}
