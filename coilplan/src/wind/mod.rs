//! Staged construction of the winding layout.
//!
//! Each stage is a pure function from the previous stage's artifact plus the
//! coil's policies to the next artifact:
//!
//! ```text
//! functional description ──sections──▶ Vec<Section>
//!                        ───layers───▶ Vec<Layer>
//!                        ───turns────▶ Vec<Turn>
//!                        ──compact───▶ normalized (Sections, Layers, Turns)
//! ```
//!
//! The orchestrator in [`crate::core`] wires the stages to a [`crate::Coil`]
//! and enforces the stage prerequisites.

pub mod compact;
pub mod layers;
pub mod margins;
pub mod planar;
pub mod sections;
pub mod turns;

use crate::model::{Alignment, Section, WindingOrientation, WindingWindow};

/// Axis a winding orientation sections along: contiguous partitions the axial
/// (or angular) axis, overlapping the radial one.
pub(crate) fn sectioning_axis(orientation: WindingOrientation) -> usize {
    match orientation {
        WindingOrientation::Contiguous => 1,
        WindingOrientation::Overlapping => 0,
    }
}

/// Axis turns pack along for a layer orientation; layers stack along the
/// other axis.
pub(crate) fn packing_axis(orientation: WindingOrientation) -> usize {
    match orientation {
        WindingOrientation::Overlapping => 1,
        WindingOrientation::Contiguous => 0,
    }
}

/// Convert a physical length to axis units: radians at the window edge
/// radius for a round window's angular axis, meters everywhere else.
pub(crate) fn length_to_axis_units(window: &WindingWindow, axis: usize, length: f64) -> f64 {
    match window {
        WindingWindow::Round { radial_height, .. } if axis == 1 => length / radial_height,
        _ => length,
    }
}

/// Inverse of [`length_to_axis_units`].
pub(crate) fn axis_units_to_length(window: &WindingWindow, axis: usize, units: f64) -> f64 {
    match window {
        WindingWindow::Round { radial_height, .. } if axis == 1 => units * radial_height,
        _ => units,
    }
}

/// Length a section offers for packing turns, margins deducted, in the
/// packing axis units.
///
/// When the packing axis is the sectioning axis the section's own extent
/// already excludes the margins; otherwise the full window extent applies and
/// the margins come off here.
pub(crate) fn packing_bound(
    section: &Section,
    window: &WindingWindow,
    sectioning: usize,
    packing: usize,
) -> f64 {
    if packing == sectioning {
        section.dimensions[packing]
    } else {
        window.extents()[packing]
            - length_to_axis_units(window, packing, section.margin[0])
            - length_to_axis_units(window, packing, section.margin[1])
    }
}

/// Depth available for stacking layers of a section.
pub(crate) fn stacking_bound(
    section: &Section,
    window: &WindingWindow,
    sectioning: usize,
    stacking: usize,
) -> f64 {
    if stacking == sectioning {
        section.dimensions[stacking]
    } else {
        window.extents()[stacking]
    }
}

/// Leading offset and inter-slot gap that place a run of slots inside
/// `leftover` spare length per the alignment.
pub(crate) fn aligned_start_and_gap(
    alignment: Alignment,
    leftover: f64,
    slots: usize,
) -> (f64, f64) {
    match alignment {
        Alignment::Centered => (leftover / 2.0, 0.0),
        Alignment::InnerOrTop => (0.0, 0.0),
        Alignment::OuterOrBottom => (leftover, 0.0),
        Alignment::Spread => {
            if slots > 1 {
                (0.0, leftover / (slots - 1) as f64)
            } else {
                (leftover / 2.0, 0.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_mapping() {
        assert_eq!(sectioning_axis(WindingOrientation::Contiguous), 1);
        assert_eq!(sectioning_axis(WindingOrientation::Overlapping), 0);
        assert_eq!(packing_axis(WindingOrientation::Overlapping), 1);
        assert_eq!(packing_axis(WindingOrientation::Contiguous), 0);
    }

    #[test]
    fn test_angular_unit_conversion() {
        let window = WindingWindow::Round {
            radial_height: 0.008,
            angle: std::f64::consts::TAU,
            coordinates: [0.0, 0.0],
        };
        let units = length_to_axis_units(&window, 1, 0.004);
        assert!((units - 0.5).abs() < 1e-12);
        assert!((axis_units_to_length(&window, 1, units) - 0.004).abs() < 1e-12);
        // The radial axis stays in meters.
        assert_eq!(length_to_axis_units(&window, 0, 0.004), 0.004);
    }

    #[test]
    fn test_alignment_distribution() {
        assert_eq!(aligned_start_and_gap(Alignment::Centered, 2.0, 4), (1.0, 0.0));
        assert_eq!(aligned_start_and_gap(Alignment::InnerOrTop, 2.0, 4), (0.0, 0.0));
        assert_eq!(
            aligned_start_and_gap(Alignment::OuterOrBottom, 2.0, 4),
            (2.0, 0.0)
        );
        assert_eq!(aligned_start_and_gap(Alignment::Spread, 3.0, 4), (0.0, 1.0));
        assert_eq!(aligned_start_and_gap(Alignment::Spread, 3.0, 1), (1.5, 0.0));
    }
}
