use crate::error::{CrossSectionError, Result};
use crate::parametrization::KinematicLimits;
use crate::utilities::{hash_combine_all, hash_f64};

/// Which bound sets the cut at a given energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutRegime {
    /// `ecut / E` is the tighter bound.
    Absolute,
    /// `vcut` is the tighter bound.
    Relative,
    /// Clamped to the kinematic minimum; there is no continuous range.
    KinematicMin,
    /// Clamped to the kinematic maximum; there is no stochastic range.
    KinematicMax,
}

/// Policy splitting continuous from stochastic energy losses.
///
/// The cut at energy `E` is `min(ecut / E, vcut)`, clamped into the kinematic
/// range of the interaction. Losses below the cut contribute to dE/dx, losses
/// above it are sampled as discrete events.
///
/// * `ecut` is an absolute cut in MeV; zero or a negative value means "no
///   absolute cut" (infinity).
/// * `vcut` is a relative cut; values outside `(0, 1]` mean "no relative
///   cut" (one).
///
/// `continuous_randomization` additionally requests the second moment dE2/dx
/// so the continuous losses can be smeared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyCutSettings {
    ecut: f64,
    vcut: f64,
    continuous_randomization: bool,
}

impl EnergyCutSettings {
    pub fn new(ecut: f64, vcut: f64, continuous_randomization: bool) -> Result<Self> {
        if ecut.is_nan() || vcut.is_nan() {
            return Err(CrossSectionError::InvalidParameter(String::from(
                "Energy cuts must not be NaN",
            )));
        }
        let ecut = if ecut <= 0.0 { f64::INFINITY } else { ecut };
        let vcut = if vcut <= 0.0 || vcut > 1.0 { 1.0 } else { vcut };
        if ecut.is_infinite() && vcut == 1.0 {
            log::warn!("Energy cut without absolute or relative limit: every loss is continuous");
        }
        Ok(EnergyCutSettings {
            ecut,
            vcut,
            continuous_randomization,
        })
    }

    pub fn ecut(&self) -> f64 {
        self.ecut
    }

    pub fn vcut(&self) -> f64 {
        self.vcut
    }

    pub fn continuous_randomization(&self) -> bool {
        self.continuous_randomization
    }

    /// Relative cut at `energy` without kinematic clamping.
    pub fn raw_cut(&self, energy: f64) -> f64 {
        (self.ecut / energy).min(self.vcut)
    }

    /// Relative cut at `energy`, clamped into `limits`.
    pub fn cut(&self, limits: KinematicLimits, energy: f64) -> f64 {
        self.raw_cut(energy).max(limits.v_min).min(limits.v_max)
    }

    /// Bound that sets [`EnergyCutSettings::cut`] at `energy`. Rates built
    /// on the cut have kinks where the regime changes.
    pub fn regime(&self, limits: KinematicLimits, energy: f64) -> CutRegime {
        let raw = self.raw_cut(energy);
        if raw <= limits.v_min {
            CutRegime::KinematicMin
        } else if raw >= limits.v_max {
            CutRegime::KinematicMax
        } else if self.ecut / energy < self.vcut {
            CutRegime::Absolute
        } else {
            CutRegime::Relative
        }
    }

    pub fn hash(&self) -> u64 {
        hash_combine_all(&[
            hash_f64(self.ecut),
            hash_f64(self.vcut),
            self.continuous_randomization as u64,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_values_disable_cuts() {
        let cut = EnergyCutSettings::new(-1.0, -1.0, false).unwrap();
        assert!(cut.ecut().is_infinite());
        assert_eq!(cut.vcut(), 1.0);
        assert_eq!(cut.raw_cut(1e5), 1.0);
    }

    #[test]
    fn test_tighter_cut_wins() {
        let cut = EnergyCutSettings::new(500.0, 0.05, false).unwrap();
        // absolute cut dominates at high energy
        assert_eq!(cut.raw_cut(1e5), 500.0 / 1e5);
        // relative cut dominates at low energy
        assert_eq!(cut.raw_cut(1e3), 0.05);
    }

    #[test]
    fn test_cut_is_clamped_to_kinematic_limits() {
        let cut = EnergyCutSettings::new(-1.0, 0.05, true).unwrap();
        let limits = KinematicLimits::new(0.1, 0.5);
        assert_eq!(cut.cut(limits, 1e4), 0.1);
        let limits = KinematicLimits::new(1e-4, 0.01);
        assert_eq!(cut.cut(limits, 1e4), 0.01);
        let limits = KinematicLimits::new(1e-4, 0.9);
        assert_eq!(cut.cut(limits, 1e4), 0.05);
        assert!(cut.continuous_randomization());
    }

    #[test]
    fn test_regime_follows_the_binding_bound() {
        let cut = EnergyCutSettings::new(500.0, 0.05, false).unwrap();
        let limits = KinematicLimits::new(1e-5, 0.9);
        assert_eq!(cut.regime(limits, 1e3), CutRegime::Relative);
        assert_eq!(cut.regime(limits, 1e5), CutRegime::Absolute);
        assert_eq!(cut.regime(limits, 1e9), CutRegime::KinematicMin);
        let narrow = KinematicLimits::new(1e-5, 0.01);
        assert_eq!(cut.regime(narrow, 1e3), CutRegime::KinematicMax);
    }

    #[test]
    fn test_nan_is_rejected() {
        assert!(EnergyCutSettings::new(f64::NAN, 0.05, false).is_err());
    }

    #[test]
    fn test_hash_includes_cont_rand() {
        let a = EnergyCutSettings::new(500.0, 0.05, false).unwrap();
        let b = EnergyCutSettings::new(500.0, 0.05, true).unwrap();
        assert_ne!(a.hash(), b.hash());
    }
}
