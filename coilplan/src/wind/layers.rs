//! Layer packing: stacking strata of turns inside each section.

use crate::core::{WindPlan, WindSettings};
use crate::errors::{ConfigurationError, FitError, UnsupportedCombinationError, WindError};
use crate::model::{Coil, ElectricalType, Layer, Section, WindingOrientation};
use crate::wind;
use crate::wire::WireGeometry;
use crate::GEOMETRY_TOLERANCE;

/// Pack each section's turns into layers.
///
/// Turns fill greedily along the packing axis; full layers stack along the
/// other axis until the section's depth runs out. In round windows the
/// angular pitch of a turn widens as layers move inward, so capacity is
/// recomputed per layer at its radius. A section whose turns cannot fit
/// raises [`FitError`] with the length a single-stack winding would need,
/// unless the settings ask for a best-effort overflowing layout.
pub fn pack_layers(
    coil: &Coil,
    sections: &[Section],
    plan: &WindPlan,
    provider: &dyn WireGeometry,
    settings: &WindSettings,
) -> Result<Vec<Layer>, WindError> {
    let window = &coil.bobbin.winding_window;
    let sec_axis = wind::sectioning_axis(coil.winding_orientation);
    let gap = plan.insulation_thickness.unwrap_or(0.0);

    let mut layers = Vec::new();
    let mut conduction_index = 0usize;
    for section in sections {
        if section.section_type == ElectricalType::Insulation {
            // A barrier section carries a single full-size insulation layer.
            layers.push(Layer {
                name: format!("{} layer 0", section.name),
                section: section.name.clone(),
                layer_type: ElectricalType::Insulation,
                orientation: section.layers_orientation,
                winding: None,
                turn_count: 0,
                dimensions: section.dimensions,
                coordinates: section.coordinates,
                insulation_thickness: None,
                fill_factor: None,
            });
            continue;
        }

        let index = conduction_index;
        conduction_index += 1;

        let orientation =
            coil.layers_orientation
                .resolve_or(index, &section.name, section.layers_orientation);
        if window.is_round() && orientation == WindingOrientation::Contiguous {
            return Err(UnsupportedCombinationError(
                "contiguous layers are not supported in round windows".to_string(),
            )
            .into());
        }

        let Some(partial) = section.partial_windings.first() else {
            continue;
        };
        let wraps = partial.physical_turns();
        if wraps == 0 {
            continue;
        }
        let winding = coil.winding(&partial.winding).ok_or_else(|| {
            ConfigurationError::Invalid(format!(
                "section {} references unknown winding {}",
                section.name, partial.winding
            ))
        })?;
        if winding.wire.is_planar() {
            return Err(UnsupportedCombinationError(format!(
                "winding {} uses planar wire, which only the planar path can wind",
                winding.name
            ))
            .into());
        }

        let pack = wind::packing_axis(orientation);
        let stack = 1 - pack;
        let pack_avail = wind::packing_bound(section, window, sec_axis, pack);
        let pack_avail_m = wind::axis_units_to_length(window, pack, pack_avail);
        if pack_avail_m <= GEOMETRY_TOLERANCE {
            return Err(FitError {
                section: section.name.clone(),
                required: 0.0,
                available: pack_avail_m,
            }
            .into());
        }
        let od = provider.outer_dimensions(&winding.wire.resolved_for_length(pack_avail_m))?;
        let stack_bound = wind::stacking_bound(section, window, sec_axis, stack);

        let stack_frame = window.frame(stack);
        let region_start = if stack == sec_axis {
            stack_frame.offset(section.coordinates[stack]) - section.dimensions[stack] / 2.0
        } else {
            0.0
        };
        let pack_center = if pack == sec_axis {
            section.coordinates[pack]
        } else {
            let pack_frame = window.frame(pack);
            let lead = wind::length_to_axis_units(window, pack, section.margin[0]);
            pack_frame.position(lead + pack_avail / 2.0)
        };

        let mut remaining = wraps;
        let mut cursor = 0.0;
        let mut layer_index = 0u32;
        while remaining > 0 {
            if layer_index > 0 {
                cursor += gap;
            }
            let stack_coord = stack_frame.position(region_start + cursor + od[1] / 2.0);
            // Angular pitch widens as layers move inward.
            let pitch = if window.is_round() && pack == 1 {
                od[0] / stack_coord
            } else {
                od[0]
            };
            let mut capacity = ((pack_avail + GEOMETRY_TOLERANCE) / pitch) as u32;
            if capacity == 0 {
                if !settings.wind_even_if_not_fit {
                    return Err(FitError {
                        section: section.name.clone(),
                        required: od[0],
                        available: pack_avail_m,
                    }
                    .into());
                }
                tracing::warn!(
                    "section {} is narrower than one turn, overfilling",
                    section.name
                );
                capacity = 1;
            }
            let taken = capacity.min(remaining);
            remaining -= taken;

            let mut dimensions = [0.0; 2];
            dimensions[pack] = pack_avail;
            dimensions[stack] = od[1];
            let mut coordinates = [0.0; 2];
            coordinates[pack] = pack_center;
            coordinates[stack] = stack_coord;

            layers.push(Layer {
                name: format!("{} layer {}", section.name, layer_index),
                section: section.name.clone(),
                layer_type: ElectricalType::Conduction,
                orientation,
                winding: Some(winding.name.clone()),
                turn_count: taken,
                dimensions,
                coordinates,
                insulation_thickness: (remaining > 0 && gap > 0.0).then_some(gap),
                fill_factor: Some(f64::from(taken) * pitch / pack_avail),
            });
            cursor += od[1];
            layer_index += 1;
        }

        if cursor > stack_bound + GEOMETRY_TOLERANCE {
            let depth = od[1] + gap;
            let layers_that_fit =
                (((stack_bound + gap + GEOMETRY_TOLERANCE) / depth) as u32).max(1);
            let turns_per_layer = wraps.div_ceil(layers_that_fit);
            let pitch = layers.last().map_or(od[0], |l| {
                if window.is_round() && pack == 1 {
                    od[0] / l.coordinates[0]
                } else {
                    od[0]
                }
            });
            let required =
                wind::axis_units_to_length(window, pack, f64::from(turns_per_layer) * pitch);
            if !settings.wind_even_if_not_fit {
                return Err(FitError {
                    section: section.name.clone(),
                    required,
                    available: pack_avail_m,
                }
                .into());
            }
            tracing::warn!(
                "section {} needs {} m of packing length but only {} m is available",
                section.name,
                required,
                pack_avail_m
            );
        }
    }

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{WindPlan, WindSettings};
    use crate::model::{Bobbin, ColumnSpec, Winding, WindingOrientation};
    use crate::wind::sections::plan_sections;
    use crate::wire::{CatalogWireGeometry, WireSpec};

    fn wound_sections(coil: &Coil, plan: &WindPlan) -> Vec<Section> {
        let provider = CatalogWireGeometry::new();
        plan_sections(coil, plan, &provider, &WindSettings::default()).unwrap()
    }

    fn single_winding_coil(turns: u32, wire: WireSpec) -> Coil {
        let windings = vec![Winding::new("primary", turns, 1, wire)];
        let bobbin = Bobbin::rectangular(0.004, 0.012, [0.007, 0.0], ColumnSpec::round(0.010));
        Coil::new(windings, bobbin).unwrap()
    }

    #[test]
    fn test_turns_fill_one_layer_before_the_next() {
        // 1 mm bare wire into a 12 mm tall window: 11 turns per layer.
        let coil = single_winding_coil(15, WireSpec::round(1.0e-3));
        let plan = WindPlan::default();
        let sections = wound_sections(&coil, &plan);
        let provider = CatalogWireGeometry::new();
        let layers =
            pack_layers(&coil, &sections, &plan, &provider, &WindSettings::default()).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].turn_count, 11);
        assert_eq!(layers[1].turn_count, 4);
        assert_eq!(layers[0].name, "primary section 0 layer 0");
    }

    #[test]
    fn test_layers_stack_radially_outward_from_the_column() {
        let coil = single_winding_coil(15, WireSpec::round(1.0e-3));
        let plan = WindPlan::default();
        let sections = wound_sections(&coil, &plan);
        let provider = CatalogWireGeometry::new();
        let layers =
            pack_layers(&coil, &sections, &plan, &provider, &WindSettings::default()).unwrap();
        // Window spans 5 mm to 9 mm radially; bare 1 mm wire has 1.08 mm
        // outer diameter.
        assert!((layers[0].coordinates[0] - 0.00554).abs() < 1e-9);
        assert!((layers[1].coordinates[0] - 0.00662).abs() < 1e-9);
    }

    #[test]
    fn test_interlayer_insulation_spaces_layers() {
        let coil = single_winding_coil(15, WireSpec::round(1.0e-3));
        let plan = WindPlan {
            insulation_thickness: Some(1.0e-4),
            ..WindPlan::default()
        };
        let sections = wound_sections(&coil, &plan);
        let provider = CatalogWireGeometry::new();
        let layers =
            pack_layers(&coil, &sections, &plan, &provider, &WindSettings::default()).unwrap();
        assert_eq!(layers[0].insulation_thickness, Some(1.0e-4));
        assert_eq!(layers[1].insulation_thickness, None);
        let spacing = layers[1].coordinates[0] - layers[0].coordinates[0];
        assert!((spacing - 1.18e-3).abs() < 1e-9);
    }

    #[test]
    fn test_unfit_section_reports_single_stack_length() {
        // 10 turns of 1 mm wire against a 5 mm packing length and a stack
        // deep enough for only one layer.
        let windings = vec![Winding::new(
            "primary",
            10,
            1,
            WireSpec::Round {
                name: None,
                conducting_diameter: Some(1.0e-3),
                outer_diameter: Some(1.0e-3),
                grade: 1,
            },
        )];
        let bobbin = Bobbin::rectangular(1.5e-3, 5.0e-3, [0.005, 0.0], ColumnSpec::round(0.007));
        let coil = Coil::new(windings, bobbin).unwrap();
        let plan = WindPlan::default();
        let sections = wound_sections(&coil, &plan);
        let provider = CatalogWireGeometry::new();
        let err = pack_layers(&coil, &sections, &plan, &provider, &WindSettings::default())
            .unwrap_err();
        match err {
            WindError::Fit(fit) => {
                assert!((fit.required - 0.010).abs() < 1e-9);
                assert!((fit.available - 0.005).abs() < 1e-9);
            }
            other => panic!("expected a fit error, got {other:?}"),
        }
    }

    #[test]
    fn test_overfill_override_keeps_the_layout() {
        let windings = vec![Winding::new(
            "primary",
            10,
            1,
            WireSpec::Round {
                name: None,
                conducting_diameter: Some(1.0e-3),
                outer_diameter: Some(1.0e-3),
                grade: 1,
            },
        )];
        let bobbin = Bobbin::rectangular(1.5e-3, 5.0e-3, [0.005, 0.0], ColumnSpec::round(0.007));
        let coil = Coil::new(windings, bobbin).unwrap();
        let plan = WindPlan::default();
        let sections = wound_sections(&coil, &plan);
        let provider = CatalogWireGeometry::new();
        let settings = WindSettings {
            wind_even_if_not_fit: true,
            ..WindSettings::default()
        };
        let layers = pack_layers(&coil, &sections, &plan, &provider, &settings).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers.iter().map(|l| l.turn_count).sum::<u32>(), 10);
    }

    #[test]
    fn test_round_window_packs_by_angle() {
        let windings = vec![Winding::new(
            "primary",
            20,
            1,
            WireSpec::Round {
                name: None,
                conducting_diameter: Some(1.0e-3),
                outer_diameter: Some(1.0e-3),
                grade: 1,
            },
        )];
        let bobbin = Bobbin::round(0.008, std::f64::consts::TAU, ColumnSpec::round(0.004));
        let coil = Coil::new(windings, bobbin).unwrap();
        let plan = WindPlan::default();
        let sections = wound_sections(&coil, &plan);
        let provider = CatalogWireGeometry::new();
        let layers =
            pack_layers(&coil, &sections, &plan, &provider, &WindSettings::default()).unwrap();
        // First layer sits at radius 7.5 mm; pitch 1/7.5 rad allows 47 turns.
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].turn_count, 20);
        assert!((layers[0].coordinates[0] - 0.0075).abs() < 1e-9);
    }

    #[test]
    fn test_contiguous_layers_in_round_window_are_rejected() {
        let windings = vec![Winding::new("primary", 20, 1, WireSpec::round(1.0e-3))];
        let bobbin = Bobbin::round(0.008, std::f64::consts::TAU, ColumnSpec::round(0.004));
        let mut coil = Coil::new(windings, bobbin).unwrap();
        coil.layers_orientation =
            crate::policy::Policy::Uniform(WindingOrientation::Contiguous);
        let plan = WindPlan::default();
        let sections = wound_sections(&coil, &plan);
        let provider = CatalogWireGeometry::new();
        let err = pack_layers(&coil, &sections, &plan, &provider, &WindSettings::default())
            .unwrap_err();
        assert!(matches!(err, WindError::Unsupported(_)));
    }

    #[test]
    fn test_planar_wire_is_rejected_on_the_wound_path() {
        let coil = single_winding_coil(
            4,
            WireSpec::Planar {
                width: 2.0e-3,
                height: 7.0e-5,
            },
        );
        let plan = WindPlan::default();
        let provider = CatalogWireGeometry::new();
        let sections =
            plan_sections(&coil, &plan, &provider, &WindSettings::default()).unwrap();
        let err = pack_layers(&coil, &sections, &plan, &provider, &WindSettings::default())
            .unwrap_err();
        assert!(matches!(err, WindError::Unsupported(_)));
    }
}
