//! Section planning: partitioning the window among the windings.

use crate::core::{WindPlan, WindSettings};
use crate::errors::{ConfigurationError, FitError, WindError};
use crate::model::{
    Coil, ElectricalType, PartialWinding, Section, WindingOrientation, WindingWindow,
};
use crate::wind::{self, margins};
use crate::wire::WireGeometry;
use crate::GEOMETRY_TOLERANCE;

/// One slot of the planned partition, before geometry is assigned.
enum Slot {
    Conduction {
        winding: usize,
        turns: u32,
        name: String,
    },
    Barrier {
        name: String,
        thickness: f64,
    },
}

/// Plan the ordered partition of the winding window into sections.
///
/// The section order follows the plan's pattern, or interleaved rounds over
/// the windings when only proportions (or nothing) were given. Each winding's
/// share of the sectioning axis comes from the plan's proportions, defaulting
/// to the relative conductor areas. Margins and insulation barriers between
/// differing isolation sides are resolved here so that every later stage sees
/// final section extents.
pub fn plan_sections(
    coil: &Coil,
    plan: &WindPlan,
    provider: &dyn WireGeometry,
    settings: &WindSettings,
) -> Result<Vec<Section>, WindError> {
    let windings = &coil.functional_description;
    let count = windings.len();
    if count == 0 {
        return Err(ConfigurationError::Invalid("coil has no windings".to_string()).into());
    }
    if plan.repetitions == 0 {
        return Err(ConfigurationError::ZeroRepetitions.into());
    }
    if let Some(proportions) = &plan.proportions {
        if proportions.len() != count {
            return Err(ConfigurationError::ProportionLength {
                expected: count,
                got: proportions.len(),
            }
            .into());
        }
        for (index, &value) in proportions.iter().enumerate() {
            if value <= 0.0 {
                return Err(ConfigurationError::NonPositiveProportion { index, value }.into());
            }
        }
    }
    if let Some(pattern) = &plan.pattern {
        if pattern.is_empty() {
            return Err(ConfigurationError::EmptyPattern.into());
        }
        for &entry in pattern {
            if entry >= count {
                return Err(ConfigurationError::PatternIndexOutOfRange {
                    value: entry,
                    windings: count,
                }
                .into());
            }
        }
    }
    if let Some(margins) = &plan.margins {
        margins::validate_margin_spec(margins, count)?;
    }

    // The ordered winding index per conduction section.
    let sequence: Vec<usize> = match &plan.pattern {
        Some(pattern) => pattern
            .iter()
            .copied()
            .cycle()
            .take(pattern.len() * plan.repetitions as usize)
            .collect(),
        None => {
            let rounds = (plan.repetitions * coil.interleaving_level.max(1)) as usize;
            (0..count).cycle().take(count * rounds).collect()
        }
    };

    let mut occurrences = vec![0u32; count];
    for &w in &sequence {
        occurrences[w] += 1;
    }
    for (index, &occ) in occurrences.iter().enumerate() {
        if occ == 0 {
            return Err(ConfigurationError::Invalid(format!(
                "pattern does not include winding {}",
                windings[index].name
            ))
            .into());
        }
    }

    let proportions = match &plan.proportions {
        Some(explicit) => normalized(explicit),
        None => area_proportions(coil, provider)?,
    };

    // Turns of each winding split across its occurrences, earlier occurrences
    // absorbing the remainder.
    let barrier = if settings.allow_margin_tape {
        0.0
    } else {
        margins::barrier_thickness(settings)
    };
    let mut seen = vec![0u32; count];
    let mut barriers = 0usize;
    let mut slots: Vec<Slot> = Vec::with_capacity(sequence.len());
    for (position, &w) in sequence.iter().enumerate() {
        if position > 0 {
            let previous = sequence[position - 1];
            if barrier > 0.0
                && margins::needs_isolation(&windings[previous], &windings[w], settings)
            {
                slots.push(Slot::Barrier {
                    name: format!("insulation section {}", barriers),
                    thickness: barrier,
                });
                barriers += 1;
            }
        }
        let occurrence = seen[w];
        seen[w] += 1;
        let total = windings[w].number_turns;
        let base = total / occurrences[w];
        let turns = base + u32::from(occurrence < total % occurrences[w]);
        slots.push(Slot::Conduction {
            winding: w,
            turns,
            name: format!("{} section {}", windings[w].name, occurrence),
        });
    }

    let conduction_names: Vec<&str> = slots
        .iter()
        .filter_map(|slot| match slot {
            Slot::Conduction { name, .. } => Some(name.as_str()),
            Slot::Barrier { .. } => None,
        })
        .collect();
    coil.layers_orientation.check_names(&conduction_names)?;
    coil.turns_alignment.check_names(&conduction_names)?;

    let window = &coil.bobbin.winding_window;
    let sec_axis = wind::sectioning_axis(coil.winding_orientation);
    let other_axis = 1 - sec_axis;
    let frame = window.frame(sec_axis);
    let cross = window.frame(other_axis);
    let extent = window.extents()[sec_axis];

    let barrier_units: f64 = slots
        .iter()
        .map(|slot| match slot {
            Slot::Barrier { thickness, .. } => {
                wind::length_to_axis_units(window, sec_axis, *thickness)
            }
            Slot::Conduction { .. } => 0.0,
        })
        .sum();
    let budget = extent - barrier_units;
    if budget <= GEOMETRY_TOLERANCE {
        return Err(FitError {
            section: "insulation barriers".to_string(),
            required: wind::axis_units_to_length(window, sec_axis, barrier_units),
            available: wind::axis_units_to_length(window, sec_axis, extent),
        }
        .into());
    }

    let derived_margin = if settings.allow_margin_tape {
        margins::derived_edge_margin(settings)
    } else {
        0.0
    };

    let mut sections = Vec::with_capacity(slots.len());
    let mut cursor = 0.0;
    let mut conduction_index = 0usize;
    for (position, slot) in slots.iter().enumerate() {
        match slot {
            Slot::Barrier { name, thickness } => {
                let width = wind::length_to_axis_units(window, sec_axis, *thickness);
                let mut dimensions = [0.0; 2];
                dimensions[sec_axis] = width;
                dimensions[other_axis] = window.extents()[other_axis];
                let mut coordinates = [0.0; 2];
                coordinates[sec_axis] = frame.position(cursor + width / 2.0);
                coordinates[other_axis] = cross.position(cross.extent / 2.0);
                sections.push(Section {
                    name: name.clone(),
                    section_type: ElectricalType::Insulation,
                    partial_windings: Vec::new(),
                    layers_orientation: WindingOrientation::Overlapping,
                    dimensions,
                    coordinates,
                    margin: [0.0, 0.0],
                    fill_factor: None,
                });
                cursor += width;
            }
            Slot::Conduction {
                winding: w,
                turns,
                name,
            } => {
                let winding = &windings[*w];
                let share = proportions[*w] / f64::from(occurrences[*w]);
                let slot_units = share * budget;

                let orientation = coil.layers_orientation.resolve_or(
                    conduction_index,
                    name,
                    coil_default_orientation(coil),
                );
                let pack_axis = wind::packing_axis(orientation);

                let margin = section_margin(
                    plan,
                    settings,
                    windings,
                    &sequence,
                    position_in_sequence(&slots, position),
                    *w,
                    derived_margin,
                );
                let lead = wind::length_to_axis_units(window, sec_axis, margin[0]);
                let trail = wind::length_to_axis_units(window, sec_axis, margin[1]);

                let (extent_units, center) = if pack_axis == sec_axis {
                    let extent_units = slot_units - lead - trail;
                    if extent_units <= GEOMETRY_TOLERANCE {
                        return Err(FitError {
                            section: name.clone(),
                            required: margin[0] + margin[1],
                            available: wind::axis_units_to_length(window, sec_axis, slot_units),
                        }
                        .into());
                    }
                    (extent_units, cursor + lead + extent_units / 2.0)
                } else {
                    (slot_units, cursor + slot_units / 2.0)
                };

                let mut dimensions = [0.0; 2];
                dimensions[sec_axis] = extent_units;
                dimensions[other_axis] = window.extents()[other_axis];
                let mut coordinates = [0.0; 2];
                coordinates[sec_axis] = frame.position(center);
                coordinates[other_axis] = cross.position(cross.extent / 2.0);

                sections.push(Section {
                    name: name.clone(),
                    section_type: ElectricalType::Conduction,
                    partial_windings: vec![PartialWinding {
                        winding: winding.name.clone(),
                        number_turns: *turns,
                        number_parallels: winding.number_parallels,
                    }],
                    layers_orientation: orientation,
                    dimensions,
                    coordinates,
                    margin,
                    fill_factor: None,
                });
                cursor += slot_units;
                conduction_index += 1;
            }
        }
    }

    Ok(sections)
}

/// The coil's uniform layer orientation when no policy entry matches.
fn coil_default_orientation(coil: &Coil) -> WindingOrientation {
    match &coil.layers_orientation {
        crate::policy::Policy::Uniform(orientation) => *orientation,
        _ => WindingOrientation::default(),
    }
}

/// Position of the slot at `index` within the conduction-only sequence.
fn position_in_sequence(slots: &[Slot], index: usize) -> usize {
    slots[..index]
        .iter()
        .filter(|slot| matches!(slot, Slot::Conduction { .. }))
        .count()
}

/// Margins for one conduction section: the caller's per-winding pair, or the
/// derived coordination margin on each edge that faces a winding of a
/// different isolation side.
fn section_margin(
    plan: &WindPlan,
    settings: &WindSettings,
    windings: &[crate::model::Winding],
    sequence: &[usize],
    position: usize,
    winding: usize,
    derived: f64,
) -> [f64; 2] {
    if let Some(margins) = &plan.margins {
        return margins[winding];
    }
    if derived <= 0.0 {
        return [0.0, 0.0];
    }
    let mut margin = [0.0, 0.0];
    if position > 0 {
        let previous = sequence[position - 1];
        if margins::needs_isolation(&windings[previous], &windings[winding], settings) {
            margin[0] = derived;
        }
    }
    if position + 1 < sequence.len() {
        let next = sequence[position + 1];
        if margins::needs_isolation(&windings[winding], &windings[next], settings) {
            margin[1] = derived;
        }
    }
    margin
}

/// Proportions scaled to sum to one.
fn normalized(values: &[f64]) -> Vec<f64> {
    let sum: f64 = values.iter().sum();
    if (sum - 1.0).abs() > GEOMETRY_TOLERANCE {
        tracing::debug!("normalizing section proportions summing to {}", sum);
    }
    values.iter().map(|v| v / sum).collect()
}

/// Default proportions: each winding's share of the total conductor area.
fn area_proportions(coil: &Coil, provider: &dyn WireGeometry) -> Result<Vec<f64>, WindError> {
    let window = &coil.bobbin.winding_window;
    let sec_axis = wind::sectioning_axis(coil.winding_orientation);
    let available =
        wind::axis_units_to_length(window, sec_axis, window.extents()[sec_axis]);
    let mut areas = Vec::with_capacity(coil.functional_description.len());
    for winding in &coil.functional_description {
        let od = provider.outer_dimensions(&winding.wire.resolved_for_length(available))?;
        areas.push(f64::from(winding.physical_turns()) * od[0] * od[1]);
    }
    Ok(normalized(&areas))
}

/// Window extent along the sectioning axis that conduction sections and their
/// margins partition, once barriers are deducted. Exposed for the fit checks.
pub(crate) fn conduction_budget(window: &WindingWindow, sec_axis: usize, sections: &[Section]) -> f64 {
    let barrier_units: f64 = sections
        .iter()
        .filter(|s| s.section_type == ElectricalType::Insulation)
        .map(|s| s.dimensions[sec_axis])
        .sum();
    window.extents()[sec_axis] - barrier_units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{WindPlan, WindSettings};
    use crate::model::{Bobbin, ColumnSpec, IsolationSide, Winding};
    use crate::wire::{CatalogWireGeometry, WireSpec};

    fn two_winding_coil() -> Coil {
        let windings = vec![
            Winding::new("primary", 10, 1, WireSpec::round(0.5e-3)),
            Winding::new("secondary", 20, 1, WireSpec::round(0.5e-3))
                .with_isolation_side(IsolationSide::Secondary),
        ];
        let bobbin = Bobbin::rectangular(0.004, 0.012, [0.007, 0.0], ColumnSpec::round(0.010));
        Coil::new(windings, bobbin).unwrap()
    }

    #[test]
    fn test_equal_proportions_split_the_window() {
        let coil = two_winding_coil();
        let plan = WindPlan {
            proportions: Some(vec![0.5, 0.5]),
            ..WindPlan::default()
        };
        let provider = CatalogWireGeometry::new();
        let sections =
            plan_sections(&coil, &plan, &provider, &WindSettings::default()).unwrap();
        assert_eq!(sections.len(), 2);
        // Axial partition: each section gets half the 12 mm height.
        assert!((sections[0].dimensions[1] - 0.006).abs() < 1e-9);
        assert!((sections[1].dimensions[1] - 0.006).abs() < 1e-9);
        assert!((sections[0].coordinates[1] + 0.003).abs() < 1e-9);
        assert!((sections[1].coordinates[1] - 0.003).abs() < 1e-9);
        assert_eq!(sections[0].name, "primary section 0");
        assert_eq!(sections[1].name, "secondary section 0");
    }

    #[test]
    fn test_proportions_are_normalized() {
        let coil = two_winding_coil();
        let plan = WindPlan {
            proportions: Some(vec![1.0, 3.0]),
            ..WindPlan::default()
        };
        let provider = CatalogWireGeometry::new();
        let sections =
            plan_sections(&coil, &plan, &provider, &WindSettings::default()).unwrap();
        assert!((sections[0].dimensions[1] - 0.003).abs() < 1e-9);
        assert!((sections[1].dimensions[1] - 0.009).abs() < 1e-9);
    }

    #[test]
    fn test_pattern_with_repetitions_interleaves() {
        let coil = two_winding_coil();
        let plan = WindPlan {
            pattern: Some(vec![0, 1]),
            repetitions: 2,
            ..WindPlan::default()
        };
        let provider = CatalogWireGeometry::new();
        let sections =
            plan_sections(&coil, &plan, &provider, &WindSettings::default()).unwrap();
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0].winding_name(), Some("primary"));
        assert_eq!(sections[1].winding_name(), Some("secondary"));
        assert_eq!(sections[2].winding_name(), Some("primary"));
        assert_eq!(sections[3].winding_name(), Some("secondary"));
        // 10 primary turns over two occurrences.
        assert_eq!(sections[0].partial_windings[0].number_turns, 5);
        assert_eq!(sections[2].partial_windings[0].number_turns, 5);
    }

    #[test]
    fn test_turn_remainder_goes_to_earlier_sections() {
        let mut coil = two_winding_coil();
        coil.functional_description[0].number_turns = 7;
        let plan = WindPlan {
            pattern: Some(vec![0, 1, 0]),
            ..WindPlan::default()
        };
        let provider = CatalogWireGeometry::new();
        let sections =
            plan_sections(&coil, &plan, &provider, &WindSettings::default()).unwrap();
        assert_eq!(sections[0].partial_windings[0].number_turns, 4);
        assert_eq!(sections[2].partial_windings[0].number_turns, 3);
    }

    #[test]
    fn test_pattern_must_cover_every_winding() {
        let coil = two_winding_coil();
        let plan = WindPlan {
            pattern: Some(vec![0, 0]),
            ..WindPlan::default()
        };
        let provider = CatalogWireGeometry::new();
        let err = plan_sections(&coil, &plan, &provider, &WindSettings::default()).unwrap_err();
        assert!(err.to_string().contains("secondary"));
    }

    #[test]
    fn test_zero_turn_occurrences_produce_empty_sections() {
        let mut coil = two_winding_coil();
        coil.functional_description[0].number_turns = 2;
        let plan = WindPlan {
            pattern: Some(vec![0, 1]),
            repetitions: 3,
            ..WindPlan::default()
        };
        let provider = CatalogWireGeometry::new();
        let sections =
            plan_sections(&coil, &plan, &provider, &WindSettings::default()).unwrap();
        let primary: Vec<u32> = sections
            .iter()
            .filter(|s| s.winding_name() == Some("primary"))
            .map(|s| s.partial_windings[0].number_turns)
            .collect();
        assert_eq!(primary, vec![1, 1, 0]);
    }

    #[test]
    fn test_margins_shrink_the_packing_extent() {
        let coil = two_winding_coil();
        let plan = WindPlan {
            proportions: Some(vec![0.5, 0.5]),
            margins: Some(vec![[1.0e-3, 1.0e-3], [0.0, 0.0]]),
            ..WindPlan::default()
        };
        let provider = CatalogWireGeometry::new();
        let sections =
            plan_sections(&coil, &plan, &provider, &WindSettings::default()).unwrap();
        // Margins lie on the axial packing axis and come out of the slot.
        assert!((sections[0].dimensions[1] - 0.004).abs() < 1e-9);
        assert_eq!(sections[0].margin, [1.0e-3, 1.0e-3]);
        assert!((sections[1].dimensions[1] - 0.006).abs() < 1e-9);
    }

    #[test]
    fn test_voltage_and_no_tape_insert_barrier_sections() {
        let coil = two_winding_coil();
        let plan = WindPlan::default();
        let settings = WindSettings {
            working_voltage: 400.0,
            allow_margin_tape: false,
            ..WindSettings::default()
        };
        let provider = CatalogWireGeometry::new();
        let sections = plan_sections(&coil, &plan, &provider, &settings).unwrap();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[1].section_type, ElectricalType::Insulation);
        // 12 layers of 25 um tape.
        assert!((sections[1].dimensions[1] - 3.0e-4).abs() < 1e-9);
        let total: f64 = sections.iter().map(|s| s.dimensions[1]).sum();
        assert!((total - 0.012).abs() < 1e-9);
    }

    #[test]
    fn test_voltage_with_tape_derives_margins() {
        let coil = two_winding_coil();
        let plan = WindPlan::default();
        let settings = WindSettings {
            working_voltage: 400.0,
            allow_margin_tape: true,
            ..WindSettings::default()
        };
        let provider = CatalogWireGeometry::new();
        let sections = plan_sections(&coil, &plan, &provider, &settings).unwrap();
        assert_eq!(sections.len(), 2);
        // Basic 400 V: max(2.5, 1.5)/2 = 1.25 mm on the facing edges only.
        assert_eq!(sections[0].margin, [0.0, 1.25e-3]);
        assert_eq!(sections[1].margin, [1.25e-3, 0.0]);
    }

    #[test]
    fn test_margins_larger_than_slot_fail() {
        let coil = two_winding_coil();
        let plan = WindPlan {
            proportions: Some(vec![0.5, 0.5]),
            margins: Some(vec![[4.0e-3, 4.0e-3], [0.0, 0.0]]),
            ..WindPlan::default()
        };
        let provider = CatalogWireGeometry::new();
        let err = plan_sections(&coil, &plan, &provider, &WindSettings::default()).unwrap_err();
        assert!(matches!(err, WindError::Fit(_)));
    }
}
