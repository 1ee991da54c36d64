use serde::{Deserialize, Serialize};

use crate::constants::{MN, MP};
use crate::error::{CrossSectionError, Result};
use crate::utilities::{hash_combine_all, hash_f64, hash_str};

/// One element (or effective element) of a [`crate::Medium`].
///
/// A component is described by its nuclear charge `Z`, its atomic weight `A`
/// (`atomic_num`, in g/mol) and the number of such atoms per molecule of the
/// medium (`atom_in_molecule`). The radiation logarithm constant, the nuclear
/// screening parameter `b_prime` and the average nucleon weight are derived at
/// construction and never change afterwards.
///
/// Components are plain values: two components compare equal when every field
/// matches, and [`Component::hash`] is stable across runs so it can be part of
/// an interpolation table key. Cross sections share them through `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    name: String,
    nuc_charge: f64,
    atomic_num: f64,
    atom_in_molecule: f64,
    log_constant: f64,
    b_prime: f64,
    average_nucleon_weight: f64,
}

impl Component {
    pub fn new(
        name: impl Into<String>,
        nuc_charge: f64,
        atomic_num: f64,
        atom_in_molecule: f64,
    ) -> Result<Self> {
        if nuc_charge <= 0.0 {
            return Err(CrossSectionError::InvalidParameter(String::from(
                "Nuclear charge must be positive",
            )));
        }
        if atomic_num < nuc_charge {
            return Err(CrossSectionError::InvalidParameter(String::from(
                "Atomic weight cannot be smaller than the nuclear charge",
            )));
        }
        if atom_in_molecule <= 0.0 {
            return Err(CrossSectionError::InvalidParameter(String::from(
                "Atoms per molecule must be positive",
            )));
        }

        let z = nuc_charge.round() as i64;
        Ok(Component {
            name: name.into(),
            nuc_charge,
            atomic_num,
            atom_in_molecule,
            log_constant: radiation_log_constant(z),
            b_prime: if z == 1 { 446.0 } else { 1429.0 },
            average_nucleon_weight: (nuc_charge * MP + (atomic_num - nuc_charge) * MN)
                / atomic_num,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nuclear charge Z
    pub fn nuc_charge(&self) -> f64 {
        self.nuc_charge
    }

    /// Atomic weight A in g/mol
    pub fn atomic_num(&self) -> f64 {
        self.atomic_num
    }

    pub fn atom_in_molecule(&self) -> f64 {
        self.atom_in_molecule
    }

    pub fn log_constant(&self) -> f64 {
        self.log_constant
    }

    pub fn b_prime(&self) -> f64 {
        self.b_prime
    }

    /// Average nucleon mass in MeV
    pub fn average_nucleon_weight(&self) -> f64 {
        self.average_nucleon_weight
    }

    /// Copy of this component with a different number of atoms per molecule.
    pub fn with_atom_in_molecule(&self, atom_in_molecule: f64) -> Result<Self> {
        Component::new(
            self.name.clone(),
            self.nuc_charge,
            self.atomic_num,
            atom_in_molecule,
        )
    }

    pub fn hash(&self) -> u64 {
        hash_combine_all(&[
            hash_str(&self.name),
            hash_f64(self.nuc_charge),
            hash_f64(self.atomic_num),
            hash_f64(self.atom_in_molecule),
        ])
    }

    pub fn hydrogen(atom_in_molecule: f64) -> Result<Self> {
        Component::new("H", 1.0, 1.00794, atom_in_molecule)
    }

    pub fn carbon(atom_in_molecule: f64) -> Result<Self> {
        Component::new("C", 6.0, 12.0011, atom_in_molecule)
    }

    pub fn nitrogen(atom_in_molecule: f64) -> Result<Self> {
        Component::new("N", 7.0, 14.0067, atom_in_molecule)
    }

    pub fn oxygen(atom_in_molecule: f64) -> Result<Self> {
        Component::new("O", 8.0, 15.9994, atom_in_molecule)
    }

    pub fn sodium(atom_in_molecule: f64) -> Result<Self> {
        Component::new("Na", 11.0, 22.989770, atom_in_molecule)
    }

    pub fn magnesium(atom_in_molecule: f64) -> Result<Self> {
        Component::new("Mg", 12.0, 24.31, atom_in_molecule)
    }

    pub fn sulfur(atom_in_molecule: f64) -> Result<Self> {
        Component::new("S", 16.0, 32.07, atom_in_molecule)
    }

    pub fn chlorine(atom_in_molecule: f64) -> Result<Self> {
        Component::new("Cl", 17.0, 35.4527, atom_in_molecule)
    }

    pub fn argon(atom_in_molecule: f64) -> Result<Self> {
        Component::new("Ar", 18.0, 39.948, atom_in_molecule)
    }

    pub fn potassium(atom_in_molecule: f64) -> Result<Self> {
        Component::new("K", 19.0, 39.10, atom_in_molecule)
    }

    pub fn calcium(atom_in_molecule: f64) -> Result<Self> {
        Component::new("Ca", 20.0, 40.08, atom_in_molecule)
    }

    pub fn iron(atom_in_molecule: f64) -> Result<Self> {
        Component::new("Fe", 26.0, 55.845, atom_in_molecule)
    }

    pub fn copper(atom_in_molecule: f64) -> Result<Self> {
        Component::new("Cu", 29.0, 63.546, atom_in_molecule)
    }

    pub fn lead(atom_in_molecule: f64) -> Result<Self> {
        Component::new("Pb", 82.0, 207.2, atom_in_molecule)
    }

    pub fn uranium(atom_in_molecule: f64) -> Result<Self> {
        Component::new("U", 92.0, 238.0289, atom_in_molecule)
    }

    pub fn standard_rock(atom_in_molecule: f64) -> Result<Self> {
        Component::new("StandardRock", 11.0, 22.0, atom_in_molecule)
    }

    pub fn frejus_rock(atom_in_molecule: f64) -> Result<Self> {
        Component::new("FrejusRock", 10.12, 20.34, atom_in_molecule)
    }
}

/// Radiation logarithm constant by nuclear charge (Kelner, Kokoulin, Petrukhin).
fn radiation_log_constant(z: i64) -> f64 {
    match z {
        1 => 202.4,
        2 => 151.9,
        3 => 159.9,
        4 => 172.3,
        5 => 177.9,
        6 => 178.3,
        7 => 176.6,
        8 => 173.4,
        9 => 170.0,
        10 | 11 => 165.8,
        12 => 167.1,
        13 => 169.1,
        14 => 170.8,
        15 => 172.2,
        16 => 173.4,
        17 => 174.3,
        18 => 174.8,
        19 => 175.1,
        20 => 175.6,
        21 => 176.2,
        22 => 176.8,
        26 => 175.8,
        29 => 173.1,
        32 => 173.0,
        35 => 173.5,
        42 => 175.9,
        50 => 177.4,
        53 => 178.6,
        74 => 177.6,
        82 => 178.0,
        92 => 179.8,
        _ => 182.7,
    }
}
