//! Fit validation and compaction of a wound coil.

use serde::Serialize;

use crate::core::WindSettings;
use crate::errors::WindError;
use crate::model::{Coil, ElectricalType, Layer, Section, Turn};
use crate::wind::{self, margins};
use crate::wire::WireGeometry;
use crate::GEOMETRY_TOLERANCE;

/// One section whose content does not fit its bounds.
///
/// Both numbers are packing-axis lengths in meters. A section whose layers
/// stack too deep is reported as the length one full-depth winding of it
/// would need, which is the number a designer can act on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitIssue {
    pub section: String,
    pub required: f64,
    pub available: f64,
}

/// Outcome of a fit check over every section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitReport {
    pub issues: Vec<FitIssue>,
}

impl FitReport {
    pub fn fits(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Recompute occupied extents against section bounds without mutating
/// anything.
///
/// Works from whatever artifacts exist: with turns their exact bounding box
/// counts, otherwise the nominal pitch of each layer's turn count.
pub fn check_fit(
    coil: &Coil,
    sections: &[Section],
    layers: &[Layer],
    turns: Option<&[Turn]>,
    provider: &dyn WireGeometry,
) -> Result<FitReport, WindError> {
    let window = &coil.bobbin.winding_window;
    let sec_axis = wind::sectioning_axis(coil.winding_orientation);
    let mut issues = Vec::new();

    for section in sections {
        if !section.is_conduction() {
            continue;
        }
        let section_layers: Vec<&Layer> = layers
            .iter()
            .filter(|l| l.section == section.name && l.is_conduction())
            .collect();
        let Some(first_layer) = section_layers.first() else {
            continue;
        };
        let Some(partial) = section.partial_windings.first() else {
            continue;
        };
        let winding = match coil.winding(&partial.winding) {
            Some(winding) => winding,
            None => continue,
        };

        let pack = wind::packing_axis(first_layer.orientation);
        let stack = 1 - pack;
        let pack_avail = wind::packing_bound(section, window, sec_axis, pack);
        let pack_avail_m = wind::axis_units_to_length(window, pack, pack_avail);
        let stack_bound = wind::stacking_bound(section, window, sec_axis, stack);
        let od = provider.outer_dimensions(&winding.wire.resolved_for_length(pack_avail_m))?;

        let gap = section_layers
            .iter()
            .find_map(|l| l.insulation_thickness)
            .unwrap_or(0.0);
        let occupied_stack: f64 = section_layers
            .iter()
            .map(|l| l.dimensions[stack] + l.insulation_thickness.unwrap_or(0.0))
            .sum();
        if occupied_stack > stack_bound + GEOMETRY_TOLERANCE {
            let depth = od[1] + gap;
            let layers_that_fit =
                (((stack_bound + gap + GEOMETRY_TOLERANCE) / depth) as u32).max(1);
            let turns_per_layer = section.physical_turns().div_ceil(layers_that_fit);
            let pitch = pitch_at(window, pack, od[0], first_layer);
            issues.push(FitIssue {
                section: section.name.clone(),
                required: wind::axis_units_to_length(
                    window,
                    pack,
                    f64::from(turns_per_layer) * pitch,
                ),
                available: pack_avail_m,
            });
        }

        let occupied_pack = section_layers
            .iter()
            .map(|layer| match turns {
                Some(turns) => turn_extent(window, pack, layer, turns)
                    .map_or(0.0, |(lo, hi)| hi - lo),
                None => {
                    f64::from(layer.turn_count) * pitch_at(window, pack, od[0], layer)
                }
            })
            .fold(0.0, f64::max);
        if occupied_pack > pack_avail + GEOMETRY_TOLERANCE {
            issues.push(FitIssue {
                section: section.name.clone(),
                required: wind::axis_units_to_length(window, pack, occupied_pack),
                available: pack_avail_m,
            });
        }
    }

    Ok(FitReport { issues })
}

/// Remove empty allocations, hug every section to its content, and repack
/// the sections along the winding axis.
///
/// Margins are reset to the minimum the isolation requirements derive, so
/// compaction reclaims over-generous tape. Running it twice is a no-op.
pub fn delimit_and_compact(
    coil: &Coil,
    sections: &[Section],
    layers: &[Layer],
    turns: &[Turn],
    settings: &WindSettings,
) -> Result<(Vec<Section>, Vec<Layer>, Vec<Turn>), WindError> {
    let window = &coil.bobbin.winding_window;
    let sec_axis = wind::sectioning_axis(coil.winding_orientation);

    // Drop empty conduction sections, then any barrier not strictly between
    // two surviving conduction sections.
    let mut kept: Vec<Section> = Vec::with_capacity(sections.len());
    for section in sections {
        match section.section_type {
            ElectricalType::Conduction => {
                let occupied: u32 = layers
                    .iter()
                    .filter(|l| l.section == section.name)
                    .map(|l| l.turn_count)
                    .sum();
                if occupied > 0 {
                    kept.push(section.clone());
                }
            }
            ElectricalType::Insulation => {
                if kept.last().is_some_and(|s| s.is_conduction()) {
                    kept.push(section.clone());
                }
            }
        }
    }
    while kept.last().is_some_and(|s| !s.is_conduction()) {
        kept.pop();
    }

    let mut kept_layers: Vec<Layer> = layers
        .iter()
        .filter(|l| kept.iter().any(|s| s.name == l.section))
        .cloned()
        .collect();
    let mut kept_turns: Vec<Turn> = turns.to_vec();

    // Minimum margins per surviving adjacency. A neighboring barrier section
    // already carries the isolation.
    let derived = if settings.allow_margin_tape {
        margins::derived_edge_margin(settings)
    } else {
        0.0
    };
    let mut new_margins: Vec<[f64; 2]> = Vec::with_capacity(kept.len());
    for (position, section) in kept.iter().enumerate() {
        if !section.is_conduction() {
            new_margins.push([0.0, 0.0]);
            continue;
        }
        let mut margin = [0.0, 0.0];
        if derived > 0.0 {
            let windings = &coil.functional_description;
            let this = section.winding_name().and_then(|n| coil.winding_index(n));
            for (edge, neighbor) in [
                (0, position.checked_sub(1).map(|p| &kept[p])),
                (1, kept.get(position + 1)),
            ] {
                let Some(neighbor) = neighbor else { continue };
                if !neighbor.is_conduction() {
                    continue;
                }
                let other = neighbor.winding_name().and_then(|n| coil.winding_index(n));
                if let (Some(a), Some(b)) = (this, other) {
                    if margins::needs_isolation(&windings[a], &windings[b], settings) {
                        margin[edge] = derived;
                    }
                }
            }
        }
        new_margins.push(margin);
    }

    // Hug each conduction section and its layers to the turns they hold.
    for (section, margin) in kept.iter_mut().zip(&new_margins) {
        if !section.is_conduction() {
            continue;
        }
        section.margin = *margin;
        let Some(first_layer) = kept_layers
            .iter()
            .find(|l| l.section == section.name && l.is_conduction())
        else {
            continue;
        };
        let pack = wind::packing_axis(first_layer.orientation);
        let stack = 1 - pack;
        let pack_frame = window.frame(pack);
        let stack_frame = window.frame(stack);

        let mut pack_lo = f64::INFINITY;
        let mut pack_hi = f64::NEG_INFINITY;
        let mut stack_lo = f64::INFINITY;
        let mut stack_hi = f64::NEG_INFINITY;
        for layer in kept_layers
            .iter_mut()
            .filter(|l| l.section == section.name && l.is_conduction())
        {
            if let Some((lo, hi)) = turn_extent(window, pack, layer, &kept_turns) {
                snap(&mut layer.dimensions[pack], hi - lo);
                snap(&mut layer.coordinates[pack], pack_frame.position((lo + hi) / 2.0));
                let pitch_units = kept_turns
                    .iter()
                    .find(|t| t.layer == layer.name)
                    .map_or(0.0, |t| turn_units(window, pack, t, layer));
                layer.fill_factor = if layer.dimensions[pack] > GEOMETRY_TOLERANCE {
                    Some(f64::from(layer.turn_count) * pitch_units / layer.dimensions[pack])
                } else {
                    None
                };
                pack_lo = pack_lo.min(lo);
                pack_hi = pack_hi.max(hi);
            }
            let depth_lo = stack_frame.offset(layer.coordinates[stack]) - layer.dimensions[stack] / 2.0;
            stack_lo = stack_lo.min(depth_lo);
            stack_hi = stack_hi.max(depth_lo + layer.dimensions[stack]);
        }
        if pack_lo.is_finite() {
            snap(&mut section.dimensions[pack], pack_hi - pack_lo);
            snap(&mut section.coordinates[pack], pack_frame.position((pack_lo + pack_hi) / 2.0));
        }
        if stack_lo.is_finite() {
            snap(&mut section.dimensions[stack], stack_hi - stack_lo);
            snap(&mut section.coordinates[stack], stack_frame.position((stack_lo + stack_hi) / 2.0));
        }
    }

    // Repack the slots along the sectioning axis per the section alignment.
    let frame = window.frame(sec_axis);
    let slot_of = |section: &Section| -> f64 {
        if section.is_conduction() {
            let first = kept_layers
                .iter()
                .find(|l| l.section == section.name && l.is_conduction());
            let pack = first.map_or(sec_axis, |l| wind::packing_axis(l.orientation));
            if pack == sec_axis {
                section.dimensions[sec_axis]
                    + wind::length_to_axis_units(window, sec_axis, section.margin[0])
                    + wind::length_to_axis_units(window, sec_axis, section.margin[1])
            } else {
                section.dimensions[sec_axis]
            }
        } else {
            section.dimensions[sec_axis]
        }
    };
    let slots: Vec<f64> = kept.iter().map(slot_of).collect();
    let total: f64 = slots.iter().sum();
    let leftover = frame.extent - total;
    if leftover < -GEOMETRY_TOLERANCE {
        tracing::warn!(
            "compacted sections span {} of a {} window",
            total,
            frame.extent
        );
    }
    let (start, gap) =
        wind::aligned_start_and_gap(coil.section_alignment, leftover, kept.len());

    let mut cursor = start;
    for (section, slot) in kept.iter_mut().zip(&slots) {
        let lead = if section.is_conduction() {
            wind::length_to_axis_units(window, sec_axis, section.margin[0])
        } else {
            0.0
        };
        let width = section.dimensions[sec_axis];
        let new_center = frame.position(cursor + lead + width / 2.0);
        let delta = new_center - section.coordinates[sec_axis];
        if delta.abs() > GEOMETRY_TOLERANCE {
            section.coordinates[sec_axis] = new_center;
            for layer in kept_layers.iter_mut().filter(|l| l.section == section.name) {
                layer.coordinates[sec_axis] += delta;
            }
            for turn in kept_turns.iter_mut().filter(|t| t.section == section.name) {
                turn.coordinates[sec_axis] += delta;
                if window.is_round() && sec_axis == 1 {
                    turn.angle = Some(turn.coordinates[1]);
                }
            }
        }
        cursor += slot + gap;
    }

    // Barrier layers mirror their section.
    for layer in kept_layers.iter_mut().filter(|l| !l.is_conduction()) {
        if let Some(section) = kept.iter().find(|s| s.name == layer.section) {
            layer.dimensions = section.dimensions;
            layer.coordinates = section.coordinates;
        }
    }

    // Fill factors over the hugged bounds.
    for section in kept.iter_mut().filter(|s| s.is_conduction()) {
        let area: f64 = kept_turns
            .iter()
            .filter(|t| t.section == section.name)
            .map(|t| t.dimensions[0] * t.dimensions[1])
            .sum();
        let bounds = physical_area(window, section);
        section.fill_factor = (bounds > GEOMETRY_TOLERANCE).then(|| area / bounds);
    }

    Ok((kept, kept_layers, kept_turns))
}

/// Overwrite `slot` only when the change exceeds the geometry tolerance.
/// Sub-tolerance recomputations keep the stored value, so repeated compaction
/// does not drift by rounding.
fn snap(slot: &mut f64, value: f64) {
    if (value - *slot).abs() > GEOMETRY_TOLERANCE {
        *slot = value;
    }
}

/// Packing-axis extent of one turn in axis units.
fn turn_units(window: &crate::model::WindingWindow, pack: usize, turn: &Turn, layer: &Layer) -> f64 {
    if window.is_round() && pack == 1 {
        turn.dimensions[1] / layer.coordinates[0]
    } else {
        turn.dimensions[pack]
    }
}

/// Bounding interval of a layer's turns along the packing axis, in frame
/// offsets.
fn turn_extent(
    window: &crate::model::WindingWindow,
    pack: usize,
    layer: &Layer,
    turns: &[Turn],
) -> Option<(f64, f64)> {
    let frame = window.frame(pack);
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for turn in turns.iter().filter(|t| t.layer == layer.name) {
        let half = turn_units(window, pack, turn, layer) / 2.0;
        let center = frame.offset(turn.coordinates[pack]);
        lo = lo.min(center - half);
        hi = hi.max(center + half);
    }
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

fn pitch_at(window: &crate::model::WindingWindow, pack: usize, od0: f64, layer: &Layer) -> f64 {
    if window.is_round() && pack == 1 {
        od0 / layer.coordinates[0]
    } else {
        od0
    }
}

/// Area of a section in square meters; round sections use the arc length at
/// their mean radius.
fn physical_area(window: &crate::model::WindingWindow, section: &Section) -> f64 {
    if window.is_round() {
        section.dimensions[0] * section.dimensions[1] * section.coordinates[0]
    } else {
        section.dimensions[0] * section.dimensions[1]
    }
}
