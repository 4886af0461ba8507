//! Planar winding: a caller-supplied stack of board layers.
//!
//! Planar windings do not compute a layer layout; printed circuit stack-ups
//! are fixed by the board design. The caller gives the vertical order of
//! winding layers and, optionally, the distance under each boundary, and the
//! planner turns that into sections (one per run of consecutive layers of the
//! same winding) and one layer per stack entry. Turn placement afterwards is
//! the ordinary path.

use crate::core::{WindPlan, WindSettings};
use crate::errors::{ConfigurationError, FitError, UnsupportedCombinationError, WindError};
use crate::model::{
    Coil, ElectricalType, Layer, PartialWinding, Section, WindingOrientation,
};
use crate::wind::{self, margins};
use crate::wire::WireGeometry;
use crate::GEOMETRY_TOLERANCE;

/// Sections and layers for a planar stack-up.
///
/// The stack fills the window's axial extent top-down: entry 0 sits at the
/// start of the axial axis. Boundaries between windings of differing
/// isolation side become insulation barrier sections; boundaries within a
/// winding become inter-layer spacing.
pub fn plan_planar(
    coil: &Coil,
    plan: &WindPlan,
    provider: &dyn WireGeometry,
    settings: &WindSettings,
) -> Result<(Vec<Section>, Vec<Layer>), WindError> {
    let window = &coil.bobbin.winding_window;
    if window.is_round() {
        return Err(UnsupportedCombinationError(
            "planar windings require a rectangular window".to_string(),
        )
        .into());
    }
    if coil.winding_orientation != WindingOrientation::Contiguous {
        return Err(UnsupportedCombinationError(
            "planar windings stack along the axial axis and need a contiguous winding orientation"
                .to_string(),
        )
        .into());
    }
    let windings = &coil.functional_description;
    let count = windings.len();
    for winding in windings {
        if !winding.wire.is_planar() {
            return Err(UnsupportedCombinationError(format!(
                "winding {} needs planar wire for the planar path",
                winding.name
            ))
            .into());
        }
    }

    let stack_up = plan.stack_up.as_ref().ok_or_else(|| {
        ConfigurationError::Invalid("planar winding requires a stack-up order".to_string())
    })?;
    if stack_up.is_empty() {
        return Err(ConfigurationError::Invalid("planar stack-up is empty".to_string()).into());
    }
    if stack_up.len() > settings.max_planar_layers {
        return Err(ConfigurationError::TooManyPlanarLayers {
            got: stack_up.len(),
            max: settings.max_planar_layers,
        }
        .into());
    }
    let mut occurrences = vec![0u32; count];
    for &entry in stack_up {
        if entry >= count {
            return Err(ConfigurationError::PatternIndexOutOfRange {
                value: entry,
                windings: count,
            }
            .into());
        }
        occurrences[entry] += 1;
    }
    for (index, &occ) in occurrences.iter().enumerate() {
        if occ == 0 {
            return Err(ConfigurationError::Invalid(format!(
                "stack-up does not include winding {}",
                windings[index].name
            ))
            .into());
        }
    }
    if let Some(distances) = &plan.stack_distances {
        if distances.len() + 1 != stack_up.len() {
            return Err(ConfigurationError::StackDistanceLength {
                expected: stack_up.len() - 1,
                got: distances.len(),
            }
            .into());
        }
        for &distance in distances {
            if distance < 0.0 {
                return Err(ConfigurationError::Invalid(
                    "planar stack distances must be non-negative".to_string(),
                )
                .into());
            }
        }
    }
    if let Some(margins) = &plan.margins {
        margins::validate_margin_spec(margins, count)?;
    }

    let mut ods = Vec::with_capacity(count);
    for winding in windings {
        ods.push(provider.outer_dimensions(&winding.wire)?);
    }

    // Turns per stack entry: each winding's turns split over its entries,
    // earlier entries absorbing the remainder.
    let mut seen = vec![0u32; count];
    let entry_turns: Vec<u32> = stack_up
        .iter()
        .map(|&w| {
            let occurrence = seen[w];
            seen[w] += 1;
            let total = windings[w].number_turns;
            total / occurrences[w] + u32::from(occurrence < total % occurrences[w])
        })
        .collect();

    // The gap under stack entry i, and whether it is an isolation barrier.
    let base_gap = plan.insulation_thickness.unwrap_or(0.0);
    let barrier = margins::barrier_thickness(settings);
    let boundary = |i: usize| -> (f64, bool) {
        let a = stack_up[i];
        let b = stack_up[i + 1];
        let isolating =
            a != b && margins::needs_isolation(&windings[a], &windings[b], settings);
        match &plan.stack_distances {
            Some(distances) => (distances[i], isolating),
            None if isolating => (barrier.max(base_gap), true),
            None => (base_gap, false),
        }
    };

    let height = window.extents()[1];
    let total: f64 = stack_up.iter().map(|&w| ods[w][1]).sum::<f64>()
        + (0..stack_up.len() - 1).map(|i| boundary(i).0).sum::<f64>();
    if total > height + GEOMETRY_TOLERANCE {
        if !settings.wind_even_if_not_fit {
            return Err(FitError {
                section: "planar stack".to_string(),
                required: total,
                available: height,
            }
            .into());
        }
        tracing::warn!(
            "planar stack is {} m tall in a {} m window, overfilling",
            total,
            height
        );
    }

    // Runs and barriers are the slots the section alignment distributes.
    let mut slot_count = 1usize;
    for i in 0..stack_up.len() - 1 {
        if stack_up[i] != stack_up[i + 1] {
            slot_count += 1;
            if boundary(i).1 && boundary(i).0 > 0.0 {
                slot_count += 1;
            }
        }
    }
    let (start, extra_gap) =
        wind::aligned_start_and_gap(coil.section_alignment, height - total, slot_count);

    let frame_v = window.frame(1);
    let frame_h = window.frame(0);
    let width = window.extents()[0];

    let mut sections = Vec::new();
    let mut layers = Vec::new();
    let mut occurrence = vec![0u32; count];
    let mut barriers = 0usize;
    let mut cursor = start.max(0.0);
    let mut entry = 0usize;
    while entry < stack_up.len() {
        let w = stack_up[entry];
        let winding = &windings[w];
        let od = ods[w];
        let name = format!("{} section {}", winding.name, occurrence[w]);
        occurrence[w] += 1;

        let margin = plan.margins.as_ref().map_or([0.0, 0.0], |m| m[w]);
        let pack_avail = width - margin[0] - margin[1];
        if pack_avail <= GEOMETRY_TOLERANCE {
            return Err(FitError {
                section: name,
                required: margin[0] + margin[1],
                available: width,
            }
            .into());
        }
        let pack_center = frame_h.position(margin[0] + pack_avail / 2.0);

        let run_start = cursor;
        let mut run_turns = 0u32;
        let mut layer_index = 0u32;
        loop {
            let wraps = entry_turns[entry] * winding.number_parallels;
            run_turns += entry_turns[entry];
            let needed = f64::from(wraps) * od[0];
            if needed > pack_avail + GEOMETRY_TOLERANCE {
                if !settings.wind_even_if_not_fit {
                    return Err(FitError {
                        section: name,
                        required: needed,
                        available: pack_avail,
                    }
                    .into());
                }
                tracing::warn!(
                    "planar layer of {} needs {} m of track width, {} m available",
                    winding.name,
                    needed,
                    pack_avail
                );
            }
            layers.push(Layer {
                name: format!("{} layer {}", name, layer_index),
                section: name.clone(),
                layer_type: ElectricalType::Conduction,
                orientation: WindingOrientation::Contiguous,
                winding: Some(winding.name.clone()),
                turn_count: wraps,
                dimensions: [pack_avail, od[1]],
                coordinates: [pack_center, frame_v.position(cursor + od[1] / 2.0)],
                insulation_thickness: None,
                fill_factor: Some(needed / pack_avail),
            });
            cursor += od[1];
            layer_index += 1;

            if entry + 1 < stack_up.len() && stack_up[entry + 1] == w {
                let (gap, _) = boundary(entry);
                if gap > 0.0 {
                    if let Some(last) = layers.last_mut() {
                        last.insulation_thickness = Some(gap);
                    }
                    cursor += gap;
                }
                entry += 1;
            } else {
                break;
            }
        }

        let span = cursor - run_start;
        sections.push(Section {
            name: name.clone(),
            section_type: ElectricalType::Conduction,
            partial_windings: vec![PartialWinding {
                winding: winding.name.clone(),
                number_turns: run_turns,
                number_parallels: winding.number_parallels,
            }],
            layers_orientation: WindingOrientation::Contiguous,
            dimensions: [pack_avail, span],
            coordinates: [pack_center, frame_v.position(run_start + span / 2.0)],
            margin,
            fill_factor: None,
        });

        if entry + 1 < stack_up.len() {
            let (gap, isolating) = boundary(entry);
            cursor += extra_gap;
            if isolating && gap > 0.0 {
                let barrier_name = format!("insulation section {}", barriers);
                barriers += 1;
                let coordinates = [
                    frame_h.position(width / 2.0),
                    frame_v.position(cursor + gap / 2.0),
                ];
                sections.push(Section {
                    name: barrier_name.clone(),
                    section_type: ElectricalType::Insulation,
                    partial_windings: Vec::new(),
                    layers_orientation: WindingOrientation::Contiguous,
                    dimensions: [width, gap],
                    coordinates,
                    margin: [0.0, 0.0],
                    fill_factor: None,
                });
                layers.push(Layer {
                    name: format!("{} layer 0", barrier_name),
                    section: barrier_name,
                    layer_type: ElectricalType::Insulation,
                    orientation: WindingOrientation::Contiguous,
                    winding: None,
                    turn_count: 0,
                    dimensions: [width, gap],
                    coordinates,
                    insulation_thickness: None,
                    fill_factor: None,
                });
                cursor += gap + extra_gap;
            } else {
                cursor += gap;
            }
        }
        entry += 1;
    }

    Ok((sections, layers))
}
