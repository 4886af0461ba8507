//! Sections: the partition of the window along the sectioning axis.

use serde::{Deserialize, Serialize};

use super::{ElectricalType, WindingOrientation};

/// The part of one winding assigned to a section or layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialWinding {
    pub winding: String,
    /// Turns of the winding in this section; every parallel repeats them.
    pub number_turns: u32,
    pub number_parallels: u32,
}

impl PartialWinding {
    /// Physical wraps this partial winding contributes.
    pub fn physical_turns(&self) -> u32 {
        self.number_turns * self.number_parallels
    }
}

/// One slice of the winding window.
///
/// `dimensions` and `coordinates` are physical: axis 0 radial, axis 1 axial
/// for rectangular windows, `[radial, angle]` for round ones. The dimension
/// along the turn-packing axis excludes the margins, which are stored
/// separately as `[leading, trailing]` tape widths in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub name: String,
    #[serde(rename = "type")]
    pub section_type: ElectricalType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_windings: Vec<super::PartialWinding>,
    pub layers_orientation: WindingOrientation,
    pub dimensions: [f64; 2],
    pub coordinates: [f64; 2],
    #[serde(default)]
    pub margin: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_factor: Option<f64>,
}

impl Section {
    pub fn is_conduction(&self) -> bool {
        self.section_type == ElectricalType::Conduction
    }

    /// Name of the winding this section belongs to, if it carries one.
    pub fn winding_name(&self) -> Option<&str> {
        self.partial_windings.first().map(|p| p.winding.as_str())
    }

    /// Physical wraps assigned to this section.
    pub fn physical_turns(&self) -> u32 {
        self.partial_windings
            .iter()
            .map(PartialWinding::physical_turns)
            .sum()
    }
}
