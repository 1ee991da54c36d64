// Global configuration for cross-section construction
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::utilities::{hash_combine_all, hash_f64};

// Global configuration for table persistence and numerical settings
pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// Grid definition of one interpolation table.
///
/// The energy axis is exponential from the parametrization's lower energy
/// limit up to `energy_max`. `nodes_v` is only used by dN/dx tables, whose
/// second axis is the transformed relative energy loss on `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolationDef {
    pub nodes_energy: usize,
    pub nodes_v: usize,
    pub energy_max: f64,
}

impl InterpolationDef {
    pub fn new(nodes_energy: usize, nodes_v: usize, energy_max: f64) -> Self {
        InterpolationDef {
            nodes_energy,
            nodes_v,
            energy_max,
        }
    }

    pub fn hash(&self) -> u64 {
        hash_combine_all(&[
            self.nodes_energy as u64,
            self.nodes_v as u64,
            hash_f64(self.energy_max),
        ])
    }
}

impl Default for InterpolationDef {
    fn default() -> Self {
        InterpolationDef::new(100, 50, 1e14)
    }
}

/// Romberg settings shared by every integral-based calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegralSettings {
    /// Relative precision at which refinement stops.
    pub precision: f64,
    /// Maximum number of trapezoid refinement steps.
    pub max_steps: usize,
    /// Number of points used for the polynomial extrapolation.
    pub order: usize,
}

impl Default for IntegralSettings {
    fn default() -> Self {
        IntegralSettings {
            precision: 1e-6,
            max_steps: 20,
            order: 5,
        }
    }
}

/// Global configuration container for cross-section construction.
///
/// A single global instance is exposed via the `CONFIG` static (a
/// `Lazy<Mutex<Config>>`). Most code should obtain a guard with
/// [`Config::global`] and copy out what it needs instead of holding the lock;
/// [`Config::snapshot`] does exactly that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory interpolation tables are written to and read from.
    /// `None` keeps every table in memory only.
    pub table_dir: Option<PathBuf>,
    pub dedx_def: InterpolationDef,
    pub de2dx_def: InterpolationDef,
    pub dndx_def: InterpolationDef,
    pub integration: IntegralSettings,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Config {
            table_dir: None,
            dedx_def: InterpolationDef::default(),
            de2dx_def: InterpolationDef::default(),
            dndx_def: InterpolationDef::default(),
            integration: IntegralSettings::default(),
        }
    }

    /// Persist tables into `dir`, or disable persistence with `None`.
    pub fn set_table_dir(&mut self, dir: Option<impl Into<PathBuf>>) {
        self.table_dir = dir.map(Into::into);
    }

    /// Conventional table location, `~/.cache/leptonic_xs/tables` on Linux.
    pub fn default_table_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("leptonic_xs").join("tables"))
    }

    /// Restore defaults
    pub fn clear(&mut self) {
        *self = Config::new();
    }

    /// Get the global configuration instance
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the global configuration at this moment.
    pub fn snapshot() -> Self {
        Config::global().clone()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_in_memory() {
        let config = Config::new();
        assert_eq!(config.table_dir, None);
        assert_eq!(config.dedx_def.nodes_energy, 100);
        assert_eq!(config.dedx_def.energy_max, 1e14);
        assert_eq!(config.integration.precision, 1e-6);
    }

    #[test]
    fn test_set_and_clear_table_dir() {
        let mut config = Config::new();
        config.set_table_dir(Some("/tmp/tables"));
        assert_eq!(config.table_dir, Some(PathBuf::from("/tmp/tables")));
        config.set_table_dir(None::<PathBuf>);
        assert_eq!(config.table_dir, None);
        config.dndx_def.nodes_v = 7;
        config.clear();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_interpolation_def_hash_depends_on_grid() {
        let a = InterpolationDef::default();
        let mut b = a;
        b.nodes_energy = 200;
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), InterpolationDef::default().hash());
    }

    #[test]
    fn test_default_table_dir_ends_with_crate_name() {
        if let Some(dir) = Config::default_table_dir() {
            assert!(dir.ends_with("leptonic_xs/tables"));
        }
    }
}
