use std::fmt;
use std::sync::Arc;

use crate::component::Component;
use crate::integral::IntegrationMethod;
use crate::medium::Medium;
use crate::particle::ParticleDef;

/// Interaction catalogue a cross section reports through
/// [`crate::CrossSection::interaction_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionType {
    Brems,
    Ioniz,
    Epair,
    Photonuclear,
    MuPair,
    WeakInt,
    Compton,
    Annihilation,
    Photopair,
    /// Anything that does not fit the named interactions.
    Other,
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InteractionType::Brems => "brems",
            InteractionType::Ioniz => "ioniz",
            InteractionType::Epair => "epair",
            InteractionType::Photonuclear => "photonuclear",
            InteractionType::MuPair => "mupair",
            InteractionType::WeakInt => "weakint",
            InteractionType::Compton => "compton",
            InteractionType::Annihilation => "annihilation",
            InteractionType::Photopair => "photopair",
            InteractionType::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// What a rate functional is evaluated against: a single element of a medium
/// (component-wise parametrizations) or the medium as a whole.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Component(Arc<Component>),
    Medium(Arc<Medium>),
}

impl Target {
    pub fn hash(&self) -> u64 {
        match self {
            Target::Component(c) => c.hash(),
            Target::Medium(m) => m.hash(),
        }
    }

    /// The component, if this target is one.
    pub fn component(&self) -> Option<&Arc<Component>> {
        match self {
            Target::Component(c) => Some(c),
            Target::Medium(_) => None,
        }
    }
}

/// Allowed range of the relative energy loss `v` at a given energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicLimits {
    pub v_min: f64,
    pub v_max: f64,
}

impl KinematicLimits {
    pub fn new(v_min: f64, v_max: f64) -> Self {
        KinematicLimits { v_min, v_max }
    }
}

/// A physical model of the differential cross section dσ/dv.
///
/// The engine treats the model as a black box: it asks for the kinematic
/// range of `v`, evaluates the differential cross section inside that range
/// and integrates. Two static traits select how the cross section is
/// assembled:
///
/// * [`Parametrization::is_component_wise`]: evaluate per element of the
///   medium and combine with number-fraction weights, instead of once for
///   the whole medium.
/// * [`Parametrization::is_only_stochastic`]: the model has no continuous
///   part, so no energy cut applies and every interaction is sampled.
///
/// [`Parametrization::hash`] must identify the model including every
/// parameter that changes its output; it keys the interpolation tables.
pub trait Parametrization: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn interaction_type(&self) -> InteractionType;

    fn is_component_wise(&self) -> bool;

    fn is_only_stochastic(&self) -> bool {
        false
    }

    /// Energy below which no term of this model is ever evaluated.
    fn lower_energy_lim(&self, particle: &ParticleDef) -> f64;

    fn kinematic_limits(
        &self,
        particle: &ParticleDef,
        target: &Target,
        energy: f64,
    ) -> KinematicLimits;

    /// dσ/dv at energy `energy` and relative loss `v`, per target atom for
    /// component targets and per medium for medium targets.
    fn differential_cross_section(
        &self,
        particle: &ParticleDef,
        target: &Target,
        energy: f64,
        v: f64,
    ) -> f64;

    fn hash(&self) -> u64;

    /// Substitution used when integrating over `v`. The default removes the
    /// `1/v` singularity most loss spectra have at small `v`.
    fn integration_method(&self) -> IntegrationMethod {
        IntegrationMethod::LogSubstitution
    }
}
