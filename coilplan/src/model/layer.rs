//! Layers: strata of turns within a section.

use serde::{Deserialize, Serialize};

use super::{ElectricalType, WindingOrientation};

/// One stratum of a section.
///
/// Conduction layers carry `turn_count` physical wraps of `winding`;
/// insulation layers (planar barriers) carry neither. `insulation_thickness`
/// is the gap to the next layer of the same section along the stacking axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub name: String,
    pub section: String,
    #[serde(rename = "type")]
    pub layer_type: ElectricalType,
    pub orientation: WindingOrientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winding: Option<String>,
    #[serde(default)]
    pub turn_count: u32,
    pub dimensions: [f64; 2],
    pub coordinates: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulation_thickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_factor: Option<f64>,
}

impl Layer {
    pub fn is_conduction(&self) -> bool {
        self.layer_type == ElectricalType::Conduction
    }
}
