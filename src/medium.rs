use std::sync::Arc;

use crate::component::Component;
use crate::error::{CrossSectionError, Result};
use crate::utilities::{hash_combine, hash_combine_all, hash_f64, hash_str};

/// A named substance made of one or more [`Component`]s.
///
/// The components are kept in insertion order and shared through `Arc`, so
/// the per-component calculators of a cross section and the medium itself
/// point at the same component values. A medium is immutable once built;
/// construct it with [`Medium::new`] or one of the presets.
#[derive(Debug, Clone, PartialEq)]
pub struct Medium {
    name: String,
    /// Mass density in g/cm³
    mass_density: f64,
    components: Vec<Arc<Component>>,
}

impl Medium {
    pub fn new(
        name: impl Into<String>,
        mass_density: f64,
        components: Vec<Component>,
    ) -> Result<Self> {
        if mass_density <= 0.0 {
            return Err(CrossSectionError::InvalidParameter(String::from(
                "Density must be positive",
            )));
        }
        if components.is_empty() {
            return Err(CrossSectionError::Configuration(String::from(
                "A medium needs at least one component",
            )));
        }
        let name = name.into();
        // component names identify the per-component calculators
        for (i, component) in components.iter().enumerate() {
            if components[..i].iter().any(|c| c.name() == component.name()) {
                return Err(CrossSectionError::Configuration(format!(
                    "Component {} is listed twice in medium {}",
                    component.name(),
                    name
                )));
            }
        }
        Ok(Medium {
            name,
            mass_density,
            components: components.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mass_density(&self) -> f64 {
        self.mass_density
    }

    pub fn components(&self) -> &[Arc<Component>] {
        &self.components
    }

    /// Nucleon sum of one molecule: Σ atoms-per-molecule × atomic weight.
    pub fn sum_nucleons(&self) -> f64 {
        self.components
            .iter()
            .map(|c| c.atom_in_molecule() * c.atomic_num())
            .sum()
    }

    /// Total number of nuclear charges of one molecule.
    pub fn sum_charge(&self) -> f64 {
        self.components
            .iter()
            .map(|c| c.atom_in_molecule() * c.nuc_charge())
            .sum()
    }

    /// Effective Z/A of the medium.
    pub fn z_a(&self) -> f64 {
        self.sum_charge() / self.sum_nucleons()
    }

    pub fn hash(&self) -> u64 {
        let seed = hash_combine_all(&[hash_str(&self.name), hash_f64(self.mass_density)]);
        self.components
            .iter()
            .fold(seed, |seed, c| hash_combine(seed, c.hash()))
    }

    pub fn water() -> Result<Self> {
        Medium::new(
            "water",
            1.0,
            vec![Component::hydrogen(2.0)?, Component::oxygen(1.0)?],
        )
    }

    pub fn ice() -> Result<Self> {
        Medium::new(
            "ice",
            0.917,
            vec![Component::hydrogen(2.0)?, Component::oxygen(1.0)?],
        )
    }

    pub fn hydrogen() -> Result<Self> {
        Medium::new("hydrogen", 0.07080, vec![Component::hydrogen(1.0)?])
    }

    pub fn iron() -> Result<Self> {
        Medium::new("iron", 7.874, vec![Component::iron(1.0)?])
    }

    pub fn lead() -> Result<Self> {
        Medium::new("lead", 11.35, vec![Component::lead(1.0)?])
    }

    pub fn uranium() -> Result<Self> {
        Medium::new("uranium", 18.95, vec![Component::uranium(1.0)?])
    }

    pub fn standard_rock() -> Result<Self> {
        Medium::new("standardrock", 2.65, vec![Component::standard_rock(1.0)?])
    }

    pub fn air() -> Result<Self> {
        Medium::new(
            "air",
            1.205e-3,
            vec![
                Component::nitrogen(0.78)?,
                Component::oxygen(0.21)?,
                Component::argon(0.01)?,
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_nucleons_water() {
        let water = Medium::water().unwrap();
        let expected = 2.0 * 1.00794 + 15.9994;
        assert!((water.sum_nucleons() - expected).abs() < 1e-12);
        assert_eq!(water.sum_charge(), 10.0);
        assert_eq!(water.components().len(), 2);
        assert_eq!(water.components()[0].name(), "H");
    }

    #[test]
    fn test_invalid_medium() {
        assert!(Medium::new("empty", 1.0, vec![]).is_err());
        assert!(Medium::new("x", 0.0, vec![Component::iron(1.0).unwrap()]).is_err());
    }

    #[test]
    fn test_repeated_component_is_rejected() {
        let result = Medium::new(
            "twice",
            1.0,
            vec![
                Component::oxygen(1.0).unwrap(),
                Component::hydrogen(2.0).unwrap(),
                Component::oxygen(2.0).unwrap(),
            ],
        );
        assert!(matches!(result, Err(CrossSectionError::Configuration(_))));
    }

    #[test]
    fn test_hash_depends_on_density_and_components() {
        let water = Medium::water().unwrap();
        let ice = Medium::ice().unwrap();
        assert_ne!(water.hash(), ice.hash());
        assert_eq!(water.hash(), Medium::water().unwrap().hash());
    }
}
