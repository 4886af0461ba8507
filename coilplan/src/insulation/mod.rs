//! Insulation coordination distances and tape materials.
//!
//! The embedded table carries minimum creepage, clearance and
//! distance-through-insulation per insulation grade and working-voltage band.
//! A working voltage of zero means no isolation requirement was specified and
//! every distance resolves to zero, which keeps purely geometric winding runs
//! free of implicit margins.

use serde::{Deserialize, Serialize};

const EMBEDDED_COORDINATION: &str = include_str!("../../catalog/insulation.json");
const EMBEDDED_TAPES: &str = include_str!("../../catalog/tapes.json");

/// Insulation grade between windings of differing isolation side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsulationGrade {
    Functional,
    #[default]
    Basic,
    Reinforced,
}

/// Minimum coordination distances for one voltage band, meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsulationRequirement {
    pub max_working_voltage: f64,
    pub creepage: f64,
    pub clearance: f64,
    pub distance_through_insulation: f64,
}

impl InsulationRequirement {
    pub const NONE: InsulationRequirement = InsulationRequirement {
        max_working_voltage: 0.0,
        creepage: 0.0,
        clearance: 0.0,
        distance_through_insulation: 0.0,
    };
}

/// One tape material from the embedded list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapeMaterial {
    pub name: String,
    pub thickness: f64,
    pub dielectric_strength: f64,
}

#[derive(Debug, Deserialize)]
struct CoordinationTable {
    functional: Vec<InsulationRequirement>,
    basic: Vec<InsulationRequirement>,
    reinforced: Vec<InsulationRequirement>,
}

fn coordination_table() -> Option<CoordinationTable> {
    match serde_json::from_str(EMBEDDED_COORDINATION) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::warn!("Failed to parse embedded insulation table: {}", e);
            None
        }
    }
}

/// Coordination distances for `grade` at `working_voltage`.
///
/// Voltages beyond the last band fall back to the widest entry with a
/// warning; a non-positive voltage resolves to zero distances.
pub fn requirements(grade: InsulationGrade, working_voltage: f64) -> InsulationRequirement {
    if working_voltage <= 0.0 {
        return InsulationRequirement::NONE;
    }
    let Some(table) = coordination_table() else {
        return InsulationRequirement::NONE;
    };
    let rows = match grade {
        InsulationGrade::Functional => &table.functional,
        InsulationGrade::Basic => &table.basic,
        InsulationGrade::Reinforced => &table.reinforced,
    };
    for row in rows {
        if working_voltage <= row.max_working_voltage {
            return *row;
        }
    }
    match rows.last() {
        Some(last) => {
            tracing::warn!(
                "working voltage {} V beyond the coordination table, using the {} V band",
                working_voltage,
                last.max_working_voltage
            );
            *last
        }
        None => InsulationRequirement::NONE,
    }
}

/// All embedded tape materials.
pub fn tape_materials() -> Vec<TapeMaterial> {
    match serde_json::from_str::<Vec<TapeMaterial>>(EMBEDDED_TAPES) {
        Ok(tapes) => tapes,
        Err(e) => {
            tracing::warn!("Failed to parse embedded tape list: {}", e);
            Vec::new()
        }
    }
}

/// The material used for margin tape and barriers unless the caller picks one.
pub fn default_tape() -> TapeMaterial {
    tape_materials()
        .into_iter()
        .next()
        .unwrap_or(TapeMaterial {
            name: "Polyimide tape 25um".to_string(),
            thickness: 2.5e-5,
            dielectric_strength: 2.8e8,
        })
}

/// Margin per section edge when margin tape carries the coordination
/// distance. Each of the two facing sections contributes half.
pub fn required_margin(grade: InsulationGrade, working_voltage: f64) -> f64 {
    let req = requirements(grade, working_voltage);
    req.creepage.max(req.clearance) / 2.0
}

/// Number of tape layers in a dedicated insulation barrier.
///
/// At least one layer once any distance through insulation is required;
/// reinforced isolation always gets three or more.
pub fn tape_layer_count(
    grade: InsulationGrade,
    working_voltage: f64,
    tape: &TapeMaterial,
) -> u32 {
    let dti = requirements(grade, working_voltage).distance_through_insulation;
    if dti <= 0.0 {
        return 0;
    }
    let layers = (dti / tape.thickness).ceil() as u32;
    let floor = match grade {
        InsulationGrade::Reinforced => 3,
        _ => 1,
    };
    layers.max(floor)
}

/// Thickness of a dedicated insulation barrier, meters. Zero when no
/// isolation is required.
pub fn barrier_thickness(grade: InsulationGrade, working_voltage: f64) -> f64 {
    let tape = default_tape();
    f64::from(tape_layer_count(grade, working_voltage, &tape)) * tape.thickness
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_voltage_needs_nothing() {
        let req = requirements(InsulationGrade::Reinforced, 0.0);
        assert_eq!(req.creepage, 0.0);
        assert_eq!(req.distance_through_insulation, 0.0);
        assert_eq!(required_margin(InsulationGrade::Basic, 0.0), 0.0);
        assert_eq!(barrier_thickness(InsulationGrade::Basic, 0.0), 0.0);
    }

    #[test]
    fn test_basic_band_lookup() {
        let req = requirements(InsulationGrade::Basic, 400.0);
        assert!((req.creepage - 2.5e-3).abs() < 1e-12);
        assert!((req.clearance - 1.5e-3).abs() < 1e-12);
        assert!((req.distance_through_insulation - 3.0e-4).abs() < 1e-12);
    }

    #[test]
    fn test_voltage_beyond_table_uses_widest_band() {
        let req = requirements(InsulationGrade::Basic, 5000.0);
        assert!((req.creepage - 5.0e-3).abs() < 1e-12);
    }

    #[test]
    fn test_margin_is_half_the_worst_distance() {
        let margin = required_margin(InsulationGrade::Basic, 400.0);
        assert!((margin - 1.25e-3).abs() < 1e-12);
    }

    #[test]
    fn test_reinforced_barrier_has_at_least_three_layers() {
        let tape = default_tape();
        let thin_voltage_layers = tape_layer_count(InsulationGrade::Reinforced, 100.0, &tape);
        assert!(thin_voltage_layers >= 3);

        let basic = tape_layer_count(InsulationGrade::Basic, 400.0, &tape);
        // 0.3 mm of DTI through 25 um tape.
        assert_eq!(basic, 12);
    }

    #[test]
    fn test_tape_materials_parse() {
        let tapes = tape_materials();
        assert_eq!(tapes.len(), 3);
        assert!(tapes.iter().all(|t| t.thickness > 0.0));
    }
}
