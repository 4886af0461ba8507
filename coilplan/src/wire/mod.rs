//! Wire constructions and outer-dimension resolution.
//!
//! The winding stages only ever need a conductor's outer bounding dimensions;
//! everything else about a wire (material, resistivity, strand layout) belongs
//! to downstream loss models. The [`WireGeometry`] trait is the seam: the
//! default [`CatalogWireGeometry`] resolves named wires from an embedded
//! catalog and falls back to standard build-up formulas, but callers with
//! their own wire database can plug in an alternative provider.

pub mod catalog;

pub use catalog::CatalogWireGeometry;

use serde::{Deserialize, Serialize};

use crate::errors::WireError;

fn default_grade() -> u32 {
    1
}

fn default_insulation_layers() -> u32 {
    3
}

fn default_insulation_layer_thickness() -> f64 {
    3.0e-5
}

/// Physical construction of a winding's conductor.
///
/// Dimensions are meters. A `name` refers to an entry in the wire catalog;
/// explicit dimensions override whatever the catalog or the build-up formulas
/// would produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WireSpec {
    /// Enamelled round magnet wire.
    Round {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conducting_diameter: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outer_diameter: Option<f64>,
        /// Enamel grade per IEC 60317.
        #[serde(default = "default_grade")]
        grade: u32,
    },
    /// Bundled multi-strand litz, optionally served.
    Litz {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strand_conducting_diameter: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        number_conductors: Option<u32>,
        #[serde(default = "default_grade")]
        grade: u32,
        #[serde(default)]
        served: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outer_diameter: Option<f64>,
    },
    /// Enamelled rectangular wire, wound flat (width along the turn row).
    Rectangular {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conducting_width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conducting_height: Option<f64>,
        #[serde(default = "default_grade")]
        grade: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outer_width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outer_height: Option<f64>,
    },
    /// Copper foil; each turn is one full-width sheet.
    Foil {
        thickness: f64,
        /// Sheet width. When absent, the layer packer substitutes the full
        /// available packing length of the section.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
    },
    /// Planar trace cross-section; only valid through the planar path.
    Planar { width: f64, height: f64 },
    /// Triple-insulated wire. The extruded walls count towards solid
    /// insulation, so margins and barriers can be waived between TIW windings.
    Insulated {
        conducting_diameter: f64,
        #[serde(default = "default_insulation_layers")]
        insulation_layers: u32,
        #[serde(default = "default_insulation_layer_thickness")]
        layer_thickness: f64,
    },
}

impl WireSpec {
    /// Bare enamelled round wire of grade 1.
    pub fn round(conducting_diameter: f64) -> Self {
        WireSpec::Round {
            name: None,
            conducting_diameter: Some(conducting_diameter),
            outer_diameter: None,
            grade: 1,
        }
    }

    /// Catalog wire referenced by name.
    pub fn named(name: &str) -> Self {
        WireSpec::Round {
            name: Some(name.to_string()),
            conducting_diameter: None,
            outer_diameter: None,
            grade: 1,
        }
    }

    pub fn is_planar(&self) -> bool {
        matches!(self, WireSpec::Planar { .. })
    }

    pub fn is_insulated(&self) -> bool {
        matches!(self, WireSpec::Insulated { .. })
    }

    /// Copy of this spec with an unspecified foil width filled in with the
    /// available packing length. Other constructions are returned unchanged.
    pub fn resolved_for_length(&self, available: f64) -> WireSpec {
        match self {
            WireSpec::Foil {
                thickness,
                width: None,
            } => WireSpec::Foil {
                thickness: *thickness,
                width: Some(available),
            },
            other => other.clone(),
        }
    }

    /// Short human label used in error messages.
    pub fn label(&self) -> String {
        match self {
            WireSpec::Round { name: Some(n), .. }
            | WireSpec::Litz { name: Some(n), .. }
            | WireSpec::Rectangular { name: Some(n), .. } => n.clone(),
            WireSpec::Round { .. } => "round".to_string(),
            WireSpec::Litz { .. } => "litz".to_string(),
            WireSpec::Rectangular { .. } => "rectangular".to_string(),
            WireSpec::Foil { .. } => "foil".to_string(),
            WireSpec::Planar { .. } => "planar".to_string(),
            WireSpec::Insulated { .. } => "insulated".to_string(),
        }
    }
}

/// Resolves a wire construction to its outer bounding dimensions,
/// `[along the packing axis, along the stacking axis]` in meters.
pub trait WireGeometry {
    fn outer_dimensions(&self, wire: &WireSpec) -> Result<[f64; 2], WireError>;
}
