//! Rates read from precomputed interpolation tables.
//!
//! Tables are built from the matching integral calculator and shared through
//! [`crate::table_cache`], so two cross sections with identical inputs use
//! the same table.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::calculator_integral::{ContinuousIntegral, DndxIntegral};
use crate::config::InterpolationDef;
use crate::interpolant::{Axis, Interpolant2D, SegmentedInterpolant};
use crate::table_cache;
use crate::utilities::hash_combine_all;

/// Smallest energy an exponential table axis may start at (MeV). Queries
/// below it are integrated directly.
const TABLE_ENERGY_FLOOR: f64 = 1e-3;

const KINK_BISECTION_STEPS: usize = 60;

/// Pieces narrower than this in `ln E` are merged into their neighbour.
const MIN_PIECE_WIDTH: f64 = 1e-6;

/// Map a relative loss `v` from `[v_cut, v_max]` onto `[0, 1]`,
/// logarithmically. Returns 0 when the range is empty. `v_cut` must be
/// positive.
pub fn transform_relativ_loss(v_cut: f64, v_max: f64, v: f64) -> f64 {
    if v_max <= v_cut || v <= v_cut {
        return 0.0;
    }
    ((v / v_cut).ln() / (v_max / v_cut).ln()).min(1.0)
}

/// Inverse of [`transform_relativ_loss`]: `v_cut (v_max / v_cut)^x`.
/// Returns `v_cut` when the range is empty.
pub fn retransform_relativ_loss(v_cut: f64, v_max: f64, x: f64) -> f64 {
    if v_max <= v_cut {
        return v_cut;
    }
    v_cut * (v_max / v_cut).powf(x.clamp(0.0, 1.0))
}

/// Loss at table coordinate `x`: logarithmic above a positive lower end,
/// linear when the range starts at zero.
fn loss_at(v_low: f64, v_max: f64, x: f64) -> f64 {
    if v_low > 0.0 {
        retransform_relativ_loss(v_low, v_max, x)
    } else {
        v_low + (v_max - v_low) * x.clamp(0.0, 1.0)
    }
}

fn energy_axis(lower_energy_lim: f64, def: &InterpolationDef) -> Axis {
    let low = lower_energy_lim.max(TABLE_ENERGY_FLOOR);
    Axis::exponential(low, def.energy_max.max(low * 10.0), def.nodes_energy)
}

/// Energies where `regime` changes between neighbouring nodes of `axis`,
/// located by bisection in `ln E`. Each returned energy already has the
/// regime of the upper side.
fn kink_energies<R, F>(axis: &Axis, regime: F) -> Vec<f64>
where
    R: PartialEq,
    F: Fn(f64) -> R,
{
    let nodes = axis.node_values();
    let mut kinks: Vec<f64> = Vec::new();
    let mut previous = axis.low();
    for pair in nodes.windows(2) {
        let upper = regime(pair[1]);
        if regime(pair[0]) == upper {
            continue;
        }
        let (mut low, mut high) = (pair[0], pair[1]);
        for _ in 0..KINK_BISECTION_STEPS {
            let mid = (0.5 * (low.ln() + high.ln())).exp();
            if mid <= low || mid >= high {
                break;
            }
            if regime(mid) == upper {
                high = mid;
            } else {
                low = mid;
            }
        }
        if (high / previous).ln() > MIN_PIECE_WIDTH
            && (axis.high() / high).ln() > MIN_PIECE_WIDTH
        {
            kinks.push(high);
            previous = high;
        }
    }
    kinks
}

/// dE/dx or dE²/dx from a table over energy, split where the cut changes
/// regime.
#[derive(Debug, Clone)]
pub struct ContinuousInterpolant {
    integral: ContinuousIntegral,
    table: Arc<SegmentedInterpolant>,
    table_low: f64,
    hash: u64,
}

impl ContinuousInterpolant {
    pub fn new(
        integral: &ContinuousIntegral,
        def: &InterpolationDef,
        table_dir: Option<&Path>,
    ) -> Self {
        let hash = hash_combine_all(&[integral.hash(), def.hash()]);
        let axis = energy_axis(integral.functional().lower_energy_lim(), def);
        let table = table_cache::get_or_build(integral.moment().label(), hash, table_dir, || {
            let kinks = kink_energies(&axis, |energy| integral.cut_regime(energy));
            SegmentedInterpolant::build(axis, &kinks, |energy| integral.calculate(energy))
        });
        ContinuousInterpolant {
            integral: integral.clone(),
            table,
            table_low: axis.low(),
            hash,
        }
    }

    pub fn calculate(&self, energy: f64) -> f64 {
        if energy < self.table_low {
            return self.integral.calculate(energy);
        }
        self.table.evaluate(energy)
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }
}

/// Persisted content of a dN/dx interpolant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DndxTables {
    /// Total rate over energy.
    total: SegmentedInterpolant,
    /// Cumulative fraction of the total over energy and the loss coordinate
    /// `x` in `[0, 1]`.
    fraction: Interpolant2D,
}

/// dN/dx and stochastic-loss inversion from tables.
#[derive(Debug, Clone)]
pub struct DndxInterpolant {
    integral: DndxIntegral,
    tables: Arc<DndxTables>,
    table_low: f64,
    hash: u64,
}

impl DndxInterpolant {
    pub fn new(integral: DndxIntegral, def: &InterpolationDef, table_dir: Option<&Path>) -> Self {
        let hash = hash_combine_all(&[integral.hash(), def.hash()]);
        let tables = table_cache::get_or_build("dndx", hash, table_dir, || {
            build_dndx_tables(&integral, def)
        });
        DndxInterpolant {
            table_low: tables.fraction.axis_x().low(),
            integral,
            tables,
            hash,
        }
    }

    pub fn calculate(&self, energy: f64) -> f64 {
        if energy < self.table_low {
            return self.integral.calculate(energy);
        }
        self.tables.total.evaluate(energy)
    }

    pub fn upper_limit(&self, energy: f64, rate: f64) -> f64 {
        debug_assert!(rate > 0.0, "rate must be positive");
        if energy < self.table_low {
            return self.integral.upper_limit(energy, rate);
        }
        let (v_low, v_max) = self.integral.loss_range(energy);
        if v_low >= v_max {
            return v_max;
        }
        let total = self.calculate(energy);
        if total <= 0.0 || rate >= total {
            return v_max;
        }
        let x = self.tables.fraction.find_y(energy, rate / total);
        loss_at(v_low, v_max, x)
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }
}

fn build_dndx_tables(integral: &DndxIntegral, def: &InterpolationDef) -> DndxTables {
    let energy_axis = energy_axis(integral.functional().lower_energy_lim(), def);
    let x_axis = Axis::linear(0.0, 1.0, def.nodes_v);
    let x_nodes = x_axis.node_values();

    let mut rows = Vec::with_capacity(energy_axis.nodes());
    for energy in energy_axis.node_values() {
        let (v_low, v_max) = integral.loss_range(energy);
        if v_low >= v_max {
            rows.push(x_nodes.clone());
            continue;
        }

        // cumulative rate, integrated segment by segment along x
        let mut cumulative = Vec::with_capacity(x_nodes.len());
        let mut sum = 0.0;
        let mut v_prev = v_low;
        for &x in &x_nodes {
            let v = loss_at(v_low, v_max, x);
            sum += integral.segment(energy, v_prev, v);
            cumulative.push(sum);
            v_prev = v;
        }

        if sum > 0.0 {
            rows.push(cumulative.iter().map(|c| c / sum).collect());
        } else {
            rows.push(x_nodes.clone());
        }
    }

    let kinks = kink_energies(&energy_axis, |energy| integral.cut_regime(energy));
    DndxTables {
        total: SegmentedInterpolant::build(energy_axis, &kinks, |energy| {
            integral.calculate(energy)
        }),
        fraction: Interpolant2D::from_rows(energy_axis, x_axis, rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator_integral::{LossMoment, RateFunctional};
    use crate::component::Component;
    use crate::config::IntegralSettings;
    use crate::energy_cut::EnergyCutSettings;
    use crate::integral::Integral;
    use crate::medium::Medium;
    use crate::parametrization::toy::{Flat, InverseLoss};
    use crate::parametrization::Target;
    use crate::particle::ParticleDef;
    use approx::assert_relative_eq;

    fn functional() -> RateFunctional {
        RateFunctional::new(
            Arc::new(InverseLoss),
            ParticleDef::mu_minus(),
            Target::Component(Arc::new(Component::iron(1.0).unwrap())),
            Integral::new(IntegralSettings::default()),
        )
    }

    #[test]
    fn test_transform_round_trip() {
        let (v_cut, v_max) = (1e-3, 0.8);
        for v in [1e-3, 3e-3, 0.05, 0.5, 0.8] {
            let x = transform_relativ_loss(v_cut, v_max, v);
            assert!((0.0..=1.0).contains(&x));
            assert_relative_eq!(retransform_relativ_loss(v_cut, v_max, x), v, max_relative = 1e-12);
        }
        assert_eq!(transform_relativ_loss(v_cut, v_max, v_cut), 0.0);
        assert_relative_eq!(transform_relativ_loss(v_cut, v_max, v_max), 1.0);
    }

    #[test]
    fn test_transform_empty_range() {
        assert_eq!(transform_relativ_loss(0.5, 0.5, 0.5), 0.0);
        assert_eq!(retransform_relativ_loss(0.5, 0.4, 0.7), 0.5);
    }

    #[test]
    fn test_dedx_table_matches_integral() {
        let cut = EnergyCutSettings::new(-1.0, 0.05, false).unwrap();
        let integral = ContinuousIntegral::new(functional(), cut, LossMoment::Dedx);
        let def = InterpolationDef::default();
        let interpolant = ContinuousInterpolant::new(&integral, &def, None);
        for energy in [1.234e3, 5.5e5, 3.3e8, 7.7e11] {
            assert_relative_eq!(
                interpolant.calculate(energy),
                integral.calculate(energy),
                max_relative = 1e-5
            );
        }
    }

    #[test]
    fn test_dndx_table_inverts_like_integral() {
        let cut = EnergyCutSettings::new(-1.0, 0.05, false).unwrap();
        let integral = DndxIntegral::new(functional(), Some(cut));
        let def = InterpolationDef::new(60, 30, 1e12);
        let interpolant = DndxInterpolant::new(integral.clone(), &def, None);
        for energy in [2.2e3, 4.4e6, 8.8e9] {
            let total = integral.calculate(energy);
            assert_relative_eq!(interpolant.calculate(energy), total, max_relative = 1e-5);
            for fraction in [0.1, 0.5, 0.9] {
                let rate = fraction * total;
                assert_relative_eq!(
                    interpolant.upper_limit(energy, rate),
                    integral.upper_limit(energy, rate),
                    max_relative = 1e-4
                );
            }
        }
    }

    fn flat(particle: ParticleDef) -> RateFunctional {
        RateFunctional::new(
            Arc::new(Flat { k: 2.0 }),
            particle,
            Target::Medium(Arc::new(Medium::water().unwrap())),
            Integral::new(IntegralSettings::default()),
        )
    }

    #[test]
    fn test_kinks_at_cut_regime_changes() {
        let cut = EnergyCutSettings::new(500.0, 0.05, false).unwrap();
        let integral = ContinuousIntegral::new(functional(), cut, LossMoment::Dedx);
        let axis = energy_axis(ParticleDef::mu_minus().mass, &InterpolationDef::default());
        let kinks = kink_energies(&axis, |energy| integral.cut_regime(energy));
        assert_eq!(kinks.len(), 2);
        // ecut / vcut, then ecut / v_min
        assert_relative_eq!(kinks[0], 1e4, max_relative = 1e-9);
        assert_relative_eq!(kinks[1], 5e7, max_relative = 1e-9);

        let relative_only = EnergyCutSettings::new(-1.0, 0.05, false).unwrap();
        let integral = ContinuousIntegral::new(functional(), relative_only, LossMoment::Dedx);
        assert!(kink_energies(&axis, |energy| integral.cut_regime(energy)).is_empty());
    }

    #[test]
    fn test_dedx_table_is_zero_without_continuous_range() {
        let cut = EnergyCutSettings::new(500.0, 0.05, false).unwrap();
        let integral = ContinuousIntegral::new(functional(), cut, LossMoment::Dedx);
        let interpolant = ContinuousInterpolant::new(&integral, &InterpolationDef::default(), None);
        for energy in [6e7, 1e9, 9e13] {
            assert_eq!(integral.calculate(energy), 0.0);
            assert_eq!(interpolant.calculate(energy), 0.0);
        }
        let mut energy = 120.0;
        while energy < 1e14 {
            assert!(interpolant.calculate(energy) >= 0.0);
            energy *= 1.37;
        }
    }

    #[test]
    fn test_dndx_table_for_loss_range_from_zero() {
        let integral = DndxIntegral::new(flat(ParticleDef::mu_minus()), None);
        let interpolant = DndxInterpolant::new(integral.clone(), &InterpolationDef::default(), None);
        for energy in [2e2, 1e5, 9e13] {
            let total = interpolant.calculate(energy);
            assert_relative_eq!(total, 1.0, max_relative = 1e-10);
            for rate in [0.05, 0.3, 0.8] {
                let v = interpolant.upper_limit(energy, rate);
                assert_relative_eq!(v, rate / 2.0, max_relative = 1e-8);
                assert_relative_eq!(v, integral.upper_limit(energy, rate), max_relative = 1e-8);
            }
        }
    }

    #[test]
    fn test_energies_below_table_floor_are_integrated() {
        let cut = EnergyCutSettings::new(-1.0, 0.1, false).unwrap();
        let dedx = ContinuousIntegral::new(flat(ParticleDef::gamma()), cut, LossMoment::Dedx);
        let dedx_table = ContinuousInterpolant::new(&dedx, &InterpolationDef::default(), None);
        let dndx = DndxIntegral::new(flat(ParticleDef::gamma()), Some(cut));
        let dndx_table = DndxInterpolant::new(dndx.clone(), &InterpolationDef::default(), None);

        for energy in [1e-5, 5e-4] {
            assert!(energy < TABLE_ENERGY_FLOOR);
            assert_eq!(dedx_table.calculate(energy), dedx.calculate(energy));
            assert_eq!(dndx_table.calculate(energy), dndx.calculate(energy));
            assert_eq!(dndx_table.upper_limit(energy, 0.3), dndx.upper_limit(energy, 0.3));
        }
        assert_relative_eq!(dedx_table.calculate(5e-4), 5e-4 * 2.0 * 0.005, max_relative = 1e-10);
    }
}
