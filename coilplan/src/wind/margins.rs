//! Isolation distances between windings: margin tape and insulation barriers.

use crate::core::{WindPlan, WindSettings};
use crate::errors::{ConfigurationError, FitError, MissingPrerequisiteError, WindError};
use crate::insulation;
use crate::model::{Coil, ElectricalType, Winding};
use crate::wind::{self, layers, turns};
use crate::wire::WireGeometry;
use crate::GEOMETRY_TOLERANCE;

/// Whether the boundary between two windings needs an isolation distance.
///
/// Windings on the same isolation side never do. A fully insulated wire on
/// either side carries the isolation itself when the settings allow it.
pub(crate) fn needs_isolation(a: &Winding, b: &Winding, settings: &WindSettings) -> bool {
    if a.isolation_side == b.isolation_side {
        return false;
    }
    if settings.allow_insulated_wire && (a.wire.is_insulated() || b.wire.is_insulated()) {
        return false;
    }
    true
}

/// Margin tape width per section edge at an isolation boundary. The creepage
/// or clearance distance, whichever is larger, split between the two facing
/// sections.
pub(crate) fn derived_edge_margin(settings: &WindSettings) -> f64 {
    insulation::required_margin(settings.insulation_grade, settings.working_voltage)
}

/// Thickness of an insulation barrier between two facing sections.
pub(crate) fn barrier_thickness(settings: &WindSettings) -> f64 {
    insulation::barrier_thickness(settings.insulation_grade, settings.working_voltage)
}

/// Validate a caller-supplied per-winding margin table.
pub(crate) fn validate_margin_spec(
    margins: &[[f64; 2]],
    expected: usize,
) -> Result<(), ConfigurationError> {
    if margins.len() != expected {
        return Err(ConfigurationError::MarginLength {
            expected,
            got: margins.len(),
        });
    }
    for (index, margin) in margins.iter().enumerate() {
        if margin[0] < 0.0 || margin[1] < 0.0 {
            return Err(ConfigurationError::NegativeMargin {
                index,
                left: margin[0],
                right: margin[1],
            });
        }
    }
    Ok(())
}

/// Replace the margins of one conduction section and recompute every later
/// stage that was already present.
///
/// The new tape widths are in meters. When the margins lie on the sectioning
/// axis the section's conduction extent shrinks by the difference; the
/// adjoining sections keep their slots. Fails without touching the coil if
/// the new margins leave no room for turns or the re-wound layers no longer
/// fit.
pub fn add_margin_to_section(
    coil: &mut Coil,
    index: usize,
    margin: [f64; 2],
    plan: &WindPlan,
    provider: &dyn WireGeometry,
    settings: &WindSettings,
) -> Result<(), WindError> {
    if margin[0] < 0.0 || margin[1] < 0.0 {
        return Err(ConfigurationError::NegativeMargin {
            index,
            left: margin[0],
            right: margin[1],
        }
        .into());
    }
    let mut sections = coil
        .sections_description
        .clone()
        .ok_or(MissingPrerequisiteError {
            requested: "add_margin_to_section",
            missing: "sections description",
        })?;

    let conduction = sections
        .iter()
        .enumerate()
        .filter(|(_, s)| s.section_type == ElectricalType::Conduction)
        .map(|(position, _)| position)
        .nth(index)
        .ok_or(ConfigurationError::SectionIndexOutOfRange {
            index,
            sections: sections
                .iter()
                .filter(|s| s.section_type == ElectricalType::Conduction)
                .count(),
        })?;

    let window = &coil.bobbin.winding_window;
    let sec_axis = wind::sectioning_axis(coil.winding_orientation);
    let section = &mut sections[conduction];
    let orientation = coil
        .layers_orientation
        .resolve_or(index, &section.name, section.layers_orientation);
    let pack_axis = wind::packing_axis(orientation);

    if pack_axis == sec_axis {
        // Margins consume the section's slot; the slot itself is fixed.
        let old = [
            wind::length_to_axis_units(window, sec_axis, section.margin[0]),
            wind::length_to_axis_units(window, sec_axis, section.margin[1]),
        ];
        let new = [
            wind::length_to_axis_units(window, sec_axis, margin[0]),
            wind::length_to_axis_units(window, sec_axis, margin[1]),
        ];
        let slot = section.dimensions[sec_axis] + old[0] + old[1];
        let extent = slot - new[0] - new[1];
        if extent <= GEOMETRY_TOLERANCE {
            return Err(FitError {
                section: section.name.clone(),
                required: margin[0] + margin[1],
                available: wind::axis_units_to_length(window, sec_axis, slot),
            }
            .into());
        }
        let frame = window.frame(sec_axis);
        let start = frame.offset(section.coordinates[sec_axis])
            - section.dimensions[sec_axis] / 2.0
            - old[0];
        section.margin = margin;
        section.dimensions[sec_axis] = extent;
        section.coordinates[sec_axis] = frame.position(start + new[0] + extent / 2.0);
    } else {
        section.margin = margin;
    }

    // Recompute downstream artifacts before committing anything.
    let layers = if coil.layers_description.is_some() {
        Some(layers::pack_layers(coil, &sections, plan, provider, settings)?)
    } else {
        None
    };
    let turns = match (&layers, &coil.turns_description) {
        (Some(layers), Some(_)) => Some(turns::place_turns(coil, &sections, layers, provider)?),
        _ => None,
    };

    coil.sections_description = Some(sections);
    if layers.is_some() {
        coil.layers_description = layers;
    }
    if turns.is_some() {
        coil.turns_description = turns;
    }
    coil.compacted = false;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IsolationSide;
    use crate::wire::WireSpec;

    fn winding(name: &str, side: IsolationSide) -> Winding {
        Winding::new(name, 10, 1, WireSpec::round(1.0e-3)).with_isolation_side(side)
    }

    #[test]
    fn test_same_side_needs_no_isolation() {
        let settings = WindSettings::default();
        let a = winding("a", IsolationSide::Primary);
        let b = winding("b", IsolationSide::Primary);
        assert!(!needs_isolation(&a, &b, &settings));
    }

    #[test]
    fn test_differing_sides_need_isolation() {
        let settings = WindSettings::default();
        let a = winding("a", IsolationSide::Primary);
        let b = winding("b", IsolationSide::Secondary);
        assert!(needs_isolation(&a, &b, &settings));
    }

    #[test]
    fn test_insulated_wire_waives_isolation() {
        let settings = WindSettings {
            allow_insulated_wire: true,
            ..WindSettings::default()
        };
        let a = winding("a", IsolationSide::Primary);
        let mut b = winding("b", IsolationSide::Secondary);
        b.wire = WireSpec::Insulated {
            conducting_diameter: 1.0e-3,
            insulation_layers: 3,
            layer_thickness: 3.0e-5,
        };
        assert!(!needs_isolation(&a, &b, &settings));

        let strict = WindSettings {
            allow_insulated_wire: false,
            ..WindSettings::default()
        };
        assert!(needs_isolation(&a, &b, &strict));
    }

    #[test]
    fn test_margin_spec_validation() {
        assert!(validate_margin_spec(&[[0.0, 0.0], [1.0e-3, 2.0e-3]], 2).is_ok());
        assert!(matches!(
            validate_margin_spec(&[[0.0, 0.0]], 2),
            Err(ConfigurationError::MarginLength { expected: 2, got: 1 })
        ));
        assert!(matches!(
            validate_margin_spec(&[[-1.0e-3, 0.0], [0.0, 0.0]], 2),
            Err(ConfigurationError::NegativeMargin { index: 0, .. })
        ));
    }
}
