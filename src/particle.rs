use crate::constants::{LIFETIME_MU, LIFETIME_TAU, ME, MMU, MTAU, STABLE_PARTICLE};
use crate::utilities::{hash_combine_all, hash_f64, hash_str};

/// Static identity of a propagated particle.
///
/// Only properties that never change along a track live here; the current
/// energy is passed to every cross-section query instead of being stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleDef {
    pub name: String,
    /// Rest mass in MeV
    pub mass: f64,
    /// Energy below which the particle is no longer propagated (MeV)
    pub low: f64,
    /// Mean lifetime in s, negative for stable particles
    pub lifetime: f64,
    /// Charge in units of the elementary charge
    pub charge: f64,
}

impl ParticleDef {
    pub fn new(name: impl Into<String>, mass: f64, low: f64, lifetime: f64, charge: f64) -> Self {
        Self {
            name: name.into(),
            mass,
            low,
            lifetime,
            charge,
        }
    }

    pub fn hash(&self) -> u64 {
        hash_combine_all(&[
            hash_str(&self.name),
            hash_f64(self.mass),
            hash_f64(self.low),
            hash_f64(self.lifetime),
            hash_f64(self.charge),
        ])
    }

    pub fn mu_minus() -> Self {
        Self::new("MuMinus", MMU, MMU, LIFETIME_MU, -1.0)
    }

    pub fn mu_plus() -> Self {
        Self::new("MuPlus", MMU, MMU, LIFETIME_MU, 1.0)
    }

    pub fn e_minus() -> Self {
        Self::new("EMinus", ME, ME, STABLE_PARTICLE, -1.0)
    }

    pub fn e_plus() -> Self {
        Self::new("EPlus", ME, ME, STABLE_PARTICLE, 1.0)
    }

    pub fn tau_minus() -> Self {
        Self::new("TauMinus", MTAU, MTAU, LIFETIME_TAU, -1.0)
    }

    pub fn tau_plus() -> Self {
        Self::new("TauPlus", MTAU, MTAU, LIFETIME_TAU, 1.0)
    }

    pub fn gamma() -> Self {
        Self::new("Gamma", 0.0, 0.0, STABLE_PARTICLE, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_construction() {
        let p = ParticleDef::new("Test", 1.0, 2.0, 3.0, -1.0);
        assert_eq!(p.name, "Test");
        assert_eq!(p.mass, 1.0);
        assert_eq!(p.low, 2.0);
        assert_eq!(p.lifetime, 3.0);
        assert_eq!(p.charge, -1.0);
    }

    #[test]
    fn test_presets() {
        let mu = ParticleDef::mu_minus();
        assert_eq!(mu.mass, MMU);
        assert_eq!(mu.low, mu.mass);
        assert_eq!(ParticleDef::gamma().charge, 0.0);
        assert_eq!(ParticleDef::e_plus().charge, -ParticleDef::e_minus().charge);
    }

    #[test]
    fn test_hash_distinguishes_charge() {
        assert_ne!(ParticleDef::mu_minus().hash(), ParticleDef::mu_plus().hash());
        assert_eq!(ParticleDef::mu_minus().hash(), ParticleDef::mu_minus().hash());
    }
}
