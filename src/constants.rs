//! # Physical Constants
//!
//! Energies and masses in MeV, lifetimes in seconds.

// ============================================================================
// PARTICLE MASSES
// ============================================================================

/// Electron mass (MeV)
pub const ME: f64 = 0.510_998_950_00;

/// Muon mass (MeV)
pub const MMU: f64 = 105.658_374_5;

/// Tau mass (MeV)
pub const MTAU: f64 = 1776.86;

/// Proton mass (MeV)
pub const MP: f64 = 938.272_088_16;

/// Neutron mass (MeV)
pub const MN: f64 = 939.565_420_52;

// ============================================================================
// LIFETIMES
// ============================================================================

/// Muon lifetime (s)
pub const LIFETIME_MU: f64 = 2.196_981_1e-6;

/// Tau lifetime (s)
pub const LIFETIME_TAU: f64 = 290.3e-15;

/// Marker for particles that never decay
pub const STABLE_PARTICLE: f64 = -1.0;

// ============================================================================
// MACROSCOPIC
// ============================================================================

/// Avogadro number (1/mol)
pub const NA: f64 = 6.022_140_76e23;
