//! Turns: individual conductor wraps with exact coordinates.

use serde::{Deserialize, Serialize};

/// One physical wrap of one parallel of one winding.
///
/// `coordinates` are the wrap center: `[radial, axial]` meters for
/// rectangular windows, `[radius, angle]` for round ones (`angle` then
/// repeats the angular coordinate in radians for exporters). `dimensions` are
/// the outer bounding box in meters on both axes, tangential for round
/// windows. `turn_index` numbers the wrap within its winding and parallel
/// across all sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub name: String,
    pub winding: String,
    pub parallel: u32,
    pub turn_index: u32,
    pub layer: String,
    pub section: String,
    pub coordinates: [f64; 2],
    pub dimensions: [f64; 2],
    /// Wire length of this wrap, from the central column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
}
