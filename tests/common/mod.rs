// Closed-form parametrizations shared by the integration tests
#![allow(dead_code)]

use leptonic_xs::utilities::{hash_combine_all, hash_f64, hash_str};
use leptonic_xs::{
    IntegrationMethod, InteractionType, KinematicLimits, Medium, Parametrization, ParticleDef,
    Target,
};

pub const V_MIN: f64 = 1e-5;
pub const V_MAX: f64 = 0.9;

fn charge(target: &Target) -> f64 {
    match target {
        Target::Component(c) => c.nuc_charge(),
        Target::Medium(m) => m.sum_charge(),
    }
}

/// dσ/dv = scale Z² (1 + 0.1 ln(E/m)) / v on [V_MIN, V_MAX], per component.
#[derive(Debug)]
pub struct InverseLoss {
    pub scale: f64,
}

impl InverseLoss {
    pub fn strength(&self, particle: &ParticleDef, target: &Target, energy: f64) -> f64 {
        let z = charge(target);
        self.scale * z * z * (1.0 + 0.1 * (energy / particle.mass).ln())
    }

    pub fn dedx(&self, particle: &ParticleDef, target: &Target, energy: f64, v_cut: f64) -> f64 {
        energy * self.strength(particle, target, energy) * (v_cut - V_MIN)
    }

    pub fn de2dx(&self, particle: &ParticleDef, target: &Target, energy: f64, v_cut: f64) -> f64 {
        energy * energy * self.strength(particle, target, energy) * (v_cut * v_cut - V_MIN * V_MIN)
            / 2.0
    }

    pub fn dndx(&self, particle: &ParticleDef, target: &Target, energy: f64, v_cut: f64) -> f64 {
        self.strength(particle, target, energy) * (V_MAX / v_cut).ln()
    }
}

impl Parametrization for InverseLoss {
    fn name(&self) -> &str {
        "inverse_loss"
    }

    fn interaction_type(&self) -> InteractionType {
        InteractionType::Brems
    }

    fn is_component_wise(&self) -> bool {
        true
    }

    fn lower_energy_lim(&self, particle: &ParticleDef) -> f64 {
        particle.mass
    }

    fn kinematic_limits(&self, _: &ParticleDef, _: &Target, _: f64) -> KinematicLimits {
        KinematicLimits::new(V_MIN, V_MAX)
    }

    fn differential_cross_section(
        &self,
        particle: &ParticleDef,
        target: &Target,
        energy: f64,
        v: f64,
    ) -> f64 {
        self.strength(particle, target, energy) / v
    }

    fn hash(&self) -> u64 {
        hash_combine_all(&[hash_str(self.name()), hash_f64(self.scale)])
    }
}

/// dσ/dv = k Z/A of the medium on [0, 0.5], evaluated on the whole medium.
#[derive(Debug)]
pub struct FlatMedium {
    pub k: f64,
}

impl FlatMedium {
    pub fn strength(&self, medium: &Medium) -> f64 {
        self.k * medium.z_a()
    }
}

impl Parametrization for FlatMedium {
    fn name(&self) -> &str {
        "flat_medium"
    }

    fn interaction_type(&self) -> InteractionType {
        InteractionType::Ioniz
    }

    fn is_component_wise(&self) -> bool {
        false
    }

    fn lower_energy_lim(&self, particle: &ParticleDef) -> f64 {
        particle.mass
    }

    fn kinematic_limits(&self, _: &ParticleDef, _: &Target, _: f64) -> KinematicLimits {
        KinematicLimits::new(0.0, 0.5)
    }

    fn differential_cross_section(&self, _: &ParticleDef, target: &Target, _: f64, _: f64) -> f64 {
        match target {
            Target::Medium(m) => self.strength(m),
            Target::Component(_) => 0.0,
        }
    }

    fn hash(&self) -> u64 {
        hash_combine_all(&[hash_str(self.name()), hash_f64(self.k)])
    }

    fn integration_method(&self) -> IntegrationMethod {
        IntegrationMethod::Romberg
    }
}

/// dσ/dv = Z² v on [0.2, 0.8] with no continuous part.
#[derive(Debug)]
pub struct PairsOnly {
    pub component_wise: bool,
}

impl Parametrization for PairsOnly {
    fn name(&self) -> &str {
        "pairs_only"
    }

    fn interaction_type(&self) -> InteractionType {
        InteractionType::Photopair
    }

    fn is_component_wise(&self) -> bool {
        self.component_wise
    }

    fn is_only_stochastic(&self) -> bool {
        true
    }

    fn lower_energy_lim(&self, particle: &ParticleDef) -> f64 {
        particle.mass
    }

    fn kinematic_limits(&self, _: &ParticleDef, _: &Target, _: f64) -> KinematicLimits {
        KinematicLimits::new(0.2, 0.8)
    }

    fn differential_cross_section(&self, _: &ParticleDef, target: &Target, _: f64, v: f64) -> f64 {
        let z = charge(target);
        z * z * v
    }

    fn hash(&self) -> u64 {
        hash_combine_all(&[hash_str(self.name()), self.component_wise as u64])
    }
}

/// dσ/dv = 2 on [0, 0.5] for the whole medium with no continuous part, so
/// dN/dx is 1 at every energy.
#[derive(Debug)]
pub struct UniformFromZero;

impl Parametrization for UniformFromZero {
    fn name(&self) -> &str {
        "uniform_from_zero"
    }

    fn interaction_type(&self) -> InteractionType {
        InteractionType::Compton
    }

    fn is_component_wise(&self) -> bool {
        false
    }

    fn is_only_stochastic(&self) -> bool {
        true
    }

    fn lower_energy_lim(&self, particle: &ParticleDef) -> f64 {
        particle.mass
    }

    fn kinematic_limits(&self, _: &ParticleDef, _: &Target, _: f64) -> KinematicLimits {
        KinematicLimits::new(0.0, 0.5)
    }

    fn differential_cross_section(&self, _: &ParticleDef, _: &Target, _: f64, _: f64) -> f64 {
        2.0
    }

    fn hash(&self) -> u64 {
        hash_str(self.name())
    }
}
