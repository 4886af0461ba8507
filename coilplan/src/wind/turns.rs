//! Turn placement: exact coordinates for every physical wrap.

use std::collections::BTreeMap;

use crate::errors::{ConfigurationError, WindError};
use crate::model::{Alignment, Coil, Layer, Section, Turn};
use crate::wind;
use crate::wire::WireGeometry;

/// Place every wrap of every layer.
///
/// Wraps are ordered parallel-major within a section: all turns of parallel 0,
/// then parallel 1, and so on, filling the section's layers in order. The
/// turn index numbers a winding's turns globally across sections, so an
/// interleaved winding keeps one contiguous turn sequence. Within a layer the
/// turns sit at the wire pitch and the leftover length is distributed per the
/// coil's turns-alignment policy.
pub fn place_turns(
    coil: &Coil,
    sections: &[Section],
    layers: &[Layer],
    provider: &dyn WireGeometry,
) -> Result<Vec<Turn>, WindError> {
    let window = &coil.bobbin.winding_window;
    let sec_axis = wind::sectioning_axis(coil.winding_orientation);

    let conduction_names: Vec<&str> = sections
        .iter()
        .filter(|s| s.is_conduction())
        .map(|s| s.name.as_str())
        .collect();
    coil.turns_alignment.check_names(&conduction_names)?;

    let mut turns = Vec::new();
    let mut turn_base: BTreeMap<&str, u32> = BTreeMap::new();
    let mut conduction_index = 0usize;
    for section in sections {
        if !section.is_conduction() {
            continue;
        }
        let index = conduction_index;
        conduction_index += 1;

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

        let section_layers: Vec<&Layer> = layers
            .iter()
            .filter(|l| l.section == section.name && l.is_conduction())
            .collect();
        let in_layers: u32 = section_layers.iter().map(|l| l.turn_count).sum();
        if in_layers != wraps {
            return Err(ConfigurationError::Invalid(format!(
                "layers of section {} hold {} turns but the section assigns {}",
                section.name, in_layers, wraps
            ))
            .into());
        }
        let Some(first_layer) = section_layers.first() else {
            continue;
        };

        let pack = wind::packing_axis(first_layer.orientation);
        let stack = 1 - pack;
        let pack_avail = wind::packing_bound(section, window, sec_axis, pack);
        let pack_avail_m = wind::axis_units_to_length(window, pack, pack_avail);
        let od = provider.outer_dimensions(&winding.wire.resolved_for_length(pack_avail_m))?;

        let pack_frame = window.frame(pack);
        let region_start = if pack == sec_axis {
            pack_frame.offset(section.coordinates[pack]) - section.dimensions[pack] / 2.0
        } else {
            wind::length_to_axis_units(window, pack, section.margin[0])
        };
        let alignment =
            coil.turns_alignment
                .resolve_or(index, &section.name, Alignment::default());

        let base = *turn_base.get(winding.name.as_str()).unwrap_or(&0);
        // Parallel-major wrap order, chunked into the layers in turn.
        let mut wrap = 0u32;
        for layer in &section_layers {
            let pitch = if window.is_round() && pack == 1 {
                od[0] / layer.coordinates[0]
            } else {
                od[0]
            };
            let count = layer.turn_count;
            let leftover = pack_avail - f64::from(count) * pitch;
            let (lead, gap) = wind::aligned_start_and_gap(alignment, leftover, count as usize);
            for position in 0..count {
                let parallel = wrap / partial.number_turns;
                let turn_index = base + wrap % partial.number_turns;
                let center = region_start
                    + lead
                    + f64::from(position) * (pitch + gap)
                    + pitch / 2.0;

                let mut coordinates = [0.0; 2];
                coordinates[pack] = pack_frame.position(center);
                coordinates[stack] = layer.coordinates[stack];
                let mut dimensions = [0.0; 2];
                dimensions[pack] = od[0];
                dimensions[stack] = od[1];

                turns.push(Turn {
                    name: format!("{} parallel {} turn {}", winding.name, parallel, turn_index),
                    winding: winding.name.clone(),
                    parallel,
                    turn_index,
                    layer: layer.name.clone(),
                    section: section.name.clone(),
                    coordinates,
                    dimensions,
                    length: Some(coil.bobbin.turn_length(coordinates)),
                    angle: window.is_round().then_some(coordinates[1]),
                });
                wrap += 1;
            }
        }
        *turn_base.entry(winding.name.as_str()).or_insert(0) += partial.number_turns;
    }

    Ok(turns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{WindPlan, WindSettings};
    use crate::model::{Bobbin, ColumnSpec, Winding};
    use crate::policy::Policy;
    use crate::wind::layers::pack_layers;
    use crate::wind::sections::plan_sections;
    use crate::wire::{CatalogWireGeometry, WireSpec};

    fn staged(coil: &Coil, plan: &WindPlan) -> (Vec<Section>, Vec<Layer>, Vec<Turn>) {
        let provider = CatalogWireGeometry::new();
        let settings = WindSettings::default();
        let sections = plan_sections(coil, plan, &provider, &settings).unwrap();
        let layers = pack_layers(coil, &sections, plan, &provider, &settings).unwrap();
        let turns = place_turns(coil, &sections, &layers, &provider).unwrap();
        (sections, layers, turns)
    }

    fn bare_round(diameter: f64) -> WireSpec {
        WireSpec::Round {
            name: None,
            conducting_diameter: Some(diameter),
            outer_diameter: Some(diameter),
            grade: 1,
        }
    }

    fn single_winding_coil(turns: u32, parallels: u32) -> Coil {
        let windings = vec![Winding::new("primary", turns, parallels, bare_round(1.0e-3))];
        let bobbin = Bobbin::rectangular(0.004, 0.012, [0.007, 0.0], ColumnSpec::round(0.010));
        Coil::new(windings, bobbin).unwrap()
    }

    #[test]
    fn test_every_wrap_is_placed() {
        let coil = single_winding_coil(15, 1);
        let (_, layers, turns) = staged(&coil, &WindPlan::default());
        assert_eq!(turns.len(), 15);
        assert_eq!(layers[0].turn_count, 12);
        // Turns carry their layer and sequential indices.
        assert!(turns[..12].iter().all(|t| t.layer.ends_with("layer 0")));
        assert_eq!(turns[14].turn_index, 14);
        assert_eq!(turns[14].name, "primary parallel 0 turn 14");
    }

    #[test]
    fn test_centered_turns_share_the_leftover() {
        let coil = single_winding_coil(12, 1);
        let (_, _, turns) = staged(&coil, &WindPlan::default());
        // 12 turns of 1 mm pitch in a 12 mm window: no leftover, first turn
        // center half a pitch from the window start at -6 mm.
        assert!((turns[0].coordinates[1] + 0.0055).abs() < 1e-9);
        assert!((turns[11].coordinates[1] - 0.0055).abs() < 1e-9);
        // All on the first layer radius.
        assert!((turns[0].coordinates[0] - 0.0055).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_major_ordering() {
        let coil = single_winding_coil(3, 2);
        let (_, _, turns) = staged(&coil, &WindPlan::default());
        assert_eq!(turns.len(), 6);
        assert_eq!((turns[2].parallel, turns[2].turn_index), (0, 2));
        assert_eq!((turns[3].parallel, turns[3].turn_index), (1, 0));
        assert_eq!(turns[3].name, "primary parallel 1 turn 0");
    }

    #[test]
    fn test_turn_indices_continue_across_sections() {
        let mut coil = single_winding_coil(10, 1);
        coil.functional_description.push(
            Winding::new("secondary", 4, 1, bare_round(1.0e-3))
                .with_isolation_side(crate::model::IsolationSide::Secondary),
        );
        let plan = WindPlan {
            pattern: Some(vec![0, 1, 0]),
            ..WindPlan::default()
        };
        let (sections, _, turns) = staged(&coil, &plan);
        assert_eq!(sections.len(), 3);
        let second_run: Vec<u32> = turns
            .iter()
            .filter(|t| t.section == "primary section 1")
            .map(|t| t.turn_index)
            .collect();
        assert_eq!(second_run, vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_top_and_bottom_alignment() {
        let mut coil = single_winding_coil(4, 1);
        coil.turns_alignment = Policy::Uniform(Alignment::InnerOrTop);
        let (_, _, turns) = staged(&coil, &WindPlan::default());
        // Flush against the window start at -6 mm.
        assert!((turns[0].coordinates[1] + 0.0055).abs() < 1e-9);

        let mut coil = single_winding_coil(4, 1);
        coil.turns_alignment = Policy::Uniform(Alignment::OuterOrBottom);
        let (_, _, turns) = staged(&coil, &WindPlan::default());
        assert!((turns[3].coordinates[1] - 0.0055).abs() < 1e-9);
    }

    #[test]
    fn test_spread_alignment_justifies_the_row() {
        let mut coil = single_winding_coil(4, 1);
        coil.turns_alignment = Policy::Uniform(Alignment::Spread);
        let (_, _, turns) = staged(&coil, &WindPlan::default());
        assert!((turns[0].coordinates[1] + 0.0055).abs() < 1e-9);
        assert!((turns[3].coordinates[1] - 0.0055).abs() < 1e-9);
        let gap = turns[1].coordinates[1] - turns[0].coordinates[1];
        let expected = (0.012 - 0.001) / 3.0;
        assert!((gap - expected).abs() < 1e-9);
    }

    #[test]
    fn test_turn_length_wraps_the_column() {
        let coil = single_winding_coil(2, 1);
        let (_, _, turns) = staged(&coil, &WindPlan::default());
        let expected = 2.0 * std::f64::consts::PI * turns[0].coordinates[0];
        assert!((turns[0].length.unwrap() - expected).abs() < 1e-12);
        assert_eq!(turns[0].angle, None);
    }

    #[test]
    fn test_round_window_turns_carry_angles() {
        let windings = vec![Winding::new("primary", 8, 1, bare_round(1.0e-3))];
        let bobbin = Bobbin::round(0.008, std::f64::consts::TAU, ColumnSpec::round(0.004));
        let coil = Coil::new(windings, bobbin).unwrap();
        let (_, _, turns) = staged(&coil, &WindPlan::default());
        assert_eq!(turns.len(), 8);
        let angles: Vec<f64> = turns.iter().map(|t| t.angle.unwrap()).collect();
        assert!(angles.windows(2).all(|w| w[1] > w[0]));
        assert!((turns[0].coordinates[0] - 0.0075).abs() < 1e-9);
        // Tangential and radial outer dimensions stay in meters.
        assert_eq!(turns[0].dimensions, [1.0e-3, 1.0e-3]);
    }

    #[test]
    fn test_mismatched_layer_counts_are_rejected() {
        let coil = single_winding_coil(15, 1);
        let plan = WindPlan::default();
        let provider = CatalogWireGeometry::new();
        let settings = WindSettings::default();
        let sections = plan_sections(&coil, &plan, &provider, &settings).unwrap();
        let mut layers = pack_layers(&coil, &sections, &plan, &provider, &settings).unwrap();
        layers[0].turn_count += 1;
        let err = place_turns(&coil, &sections, &layers, &provider).unwrap_err();
        assert!(matches!(err, WindError::Configuration(_)));
    }
}
