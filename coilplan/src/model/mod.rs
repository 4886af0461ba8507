//! Data model of the winding layout.
//!
//! A [`Coil`] owns the functional description (windings + bobbin), the
//! construction policies, and the staged artifacts the winding passes
//! produce: sections, then layers, then turns. All types serialize with
//! camelCase field names matching the coil description JSON contract.

pub mod bobbin;
pub mod coil;
pub mod layer;
pub mod section;
pub mod turn;

pub use bobbin::{Bobbin, ColumnShape, ColumnSpec, WindingWindow};
pub use coil::{Coil, CoilStage, IsolationSide, Winding};
pub use layer::Layer;
pub use section::{PartialWinding, Section};
pub use turn::Turn;

use serde::{Deserialize, Serialize};

/// Whether a section or layer carries conductors or insulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElectricalType {
    Conduction,
    Insulation,
}

/// How consecutive elements are arranged relative to the window axes.
///
/// At the coil level this selects the sectioning axis: `Contiguous` partitions
/// the axial (or angular) axis, `Overlapping` the radial one. At the layer
/// level, `Overlapping` layers stack radially with turns packing axially and
/// `Contiguous` layers do the opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindingOrientation {
    Contiguous,
    Overlapping,
}

impl Default for WindingOrientation {
    fn default() -> Self {
        WindingOrientation::Overlapping
    }
}

/// Where content sits inside its available length after nominal placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    #[default]
    Centered,
    /// Content packed toward the start of the axis; leftover space after.
    InnerOrTop,
    /// Content packed toward the end of the axis; leftover space before.
    OuterOrBottom,
    /// Leftover distributed as equal gaps between consecutive elements,
    /// first and last flush with the ends.
    Spread,
}
