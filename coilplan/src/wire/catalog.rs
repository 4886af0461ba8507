//! Embedded wire catalog and the default geometry provider.
//!
//! The catalog is compiled into the binary; named wires resolve to their
//! measured outer dimensions, everything else falls back to build-up formulas.

use serde::Deserialize;

use super::{WireGeometry, WireSpec};
use crate::errors::WireError;

const EMBEDDED_WIRES: &str = include_str!("../../catalog/wires.json");

// Enamel build-up approximated at 8 % of the conducting diameter per grade.
const ENAMEL_BUILD_PER_GRADE: f64 = 0.08;
// Litz bundle diameter factor for round bundles of n strands.
const LITZ_BUNDLE_FACTOR: f64 = 1.155;
// Single nylon serve, per side.
const SERVE_THICKNESS: f64 = 4.0e-5;
// Rectangular wire enamel per side, per grade.
const RECTANGULAR_ENAMEL_PER_GRADE: f64 = 2.5e-5;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    conducting_diameter: Option<f64>,
    #[serde(default)]
    outer_diameter: Option<f64>,
    #[serde(default)]
    conducting_width: Option<f64>,
    #[serde(default)]
    conducting_height: Option<f64>,
    #[serde(default)]
    outer_width: Option<f64>,
    #[serde(default)]
    outer_height: Option<f64>,
    #[serde(default)]
    number_conductors: Option<u32>,
}

/// Wire geometry provider backed by the embedded catalog.
pub struct CatalogWireGeometry {
    entries: Vec<CatalogEntry>,
}

impl CatalogWireGeometry {
    pub fn new() -> Self {
        let entries = match serde_json::from_str::<Vec<CatalogEntry>>(EMBEDDED_WIRES) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to parse embedded wire catalog: {}", e);
                Vec::new()
            }
        };
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    fn lookup(&self, name: &str) -> Result<&CatalogEntry, WireError> {
        self.find(name)
            .ok_or_else(|| WireError::UnknownWire(name.to_string()))
    }
}

impl Default for CatalogWireGeometry {
    fn default() -> Self {
        Self::new()
    }
}

fn enamelled_diameter(conducting: f64, grade: u32) -> f64 {
    conducting * (1.0 + ENAMEL_BUILD_PER_GRADE * f64::from(grade))
}

impl WireGeometry for CatalogWireGeometry {
    fn outer_dimensions(&self, wire: &WireSpec) -> Result<[f64; 2], WireError> {
        match wire {
            WireSpec::Round {
                name,
                conducting_diameter,
                outer_diameter,
                grade,
            } => {
                if let Some(od) = outer_diameter {
                    return Ok([*od, *od]);
                }
                let entry = match name {
                    Some(n) => Some(self.lookup(n)?),
                    None => None,
                };
                if let Some(od) = entry.and_then(|e| e.outer_diameter) {
                    return Ok([od, od]);
                }
                let conducting = conducting_diameter
                    .or_else(|| entry.and_then(|e| e.conducting_diameter))
                    .ok_or_else(|| WireError::MissingDimensions { wire: wire.label() })?;
                if conducting <= 0.0 {
                    return Err(WireError::InvalidConstruction(format!(
                        "conducting diameter must be positive, got {}",
                        conducting
                    )));
                }
                let od = enamelled_diameter(conducting, *grade);
                tracing::debug!(
                    "derived outer diameter {:.6e} m for round wire {}",
                    od,
                    wire.label()
                );
                Ok([od, od])
            }
            WireSpec::Litz {
                name,
                strand_conducting_diameter,
                number_conductors,
                grade,
                served,
                outer_diameter,
            } => {
                if let Some(od) = outer_diameter {
                    return Ok([*od, *od]);
                }
                let entry = match name {
                    Some(n) => Some(self.lookup(n)?),
                    None => None,
                };
                if let Some(od) = entry.and_then(|e| e.outer_diameter) {
                    return Ok([od, od]);
                }
                let strand = strand_conducting_diameter
                    .or_else(|| entry.and_then(|e| e.conducting_diameter))
                    .ok_or_else(|| WireError::MissingDimensions { wire: wire.label() })?;
                let strands = number_conductors
                    .or_else(|| entry.and_then(|e| e.number_conductors))
                    .ok_or_else(|| WireError::MissingDimensions { wire: wire.label() })?;
                if strands == 0 {
                    return Err(WireError::InvalidConstruction(
                        "litz bundle needs at least one strand".to_string(),
                    ));
                }
                let strand_od = enamelled_diameter(strand, *grade);
                let mut od = LITZ_BUNDLE_FACTOR * f64::from(strands).sqrt() * strand_od;
                if *served {
                    od += 2.0 * SERVE_THICKNESS;
                }
                Ok([od, od])
            }
            WireSpec::Rectangular {
                name,
                conducting_width,
                conducting_height,
                grade,
                outer_width,
                outer_height,
            } => {
                let entry = match name {
                    Some(n) => Some(self.lookup(n)?),
                    None => None,
                };
                let enamel = 2.0 * RECTANGULAR_ENAMEL_PER_GRADE * f64::from(*grade);
                let width = outer_width
                    .or_else(|| entry.and_then(|e| e.outer_width))
                    .or_else(|| {
                        conducting_width
                            .or_else(|| entry.and_then(|e| e.conducting_width))
                            .map(|w| w + enamel)
                    })
                    .ok_or_else(|| WireError::MissingDimensions { wire: wire.label() })?;
                let height = outer_height
                    .or_else(|| entry.and_then(|e| e.outer_height))
                    .or_else(|| {
                        conducting_height
                            .or_else(|| entry.and_then(|e| e.conducting_height))
                            .map(|h| h + enamel)
                    })
                    .ok_or_else(|| WireError::MissingDimensions { wire: wire.label() })?;
                Ok([width, height])
            }
            WireSpec::Foil { thickness, width } => {
                let width = width.ok_or_else(|| WireError::MissingDimensions {
                    wire: wire.label(),
                })?;
                if *thickness <= 0.0 {
                    return Err(WireError::InvalidConstruction(format!(
                        "foil thickness must be positive, got {}",
                        thickness
                    )));
                }
                // Foil packs one turn per layer: the sheet spans the packing
                // axis and the thickness stacks.
                Ok([width, *thickness])
            }
            WireSpec::Planar { width, height } => {
                if *width <= 0.0 || *height <= 0.0 {
                    return Err(WireError::InvalidConstruction(format!(
                        "planar trace must have positive dimensions, got {}x{}",
                        width, height
                    )));
                }
                Ok([*width, *height])
            }
            WireSpec::Insulated {
                conducting_diameter,
                insulation_layers,
                layer_thickness,
            } => {
                if *conducting_diameter <= 0.0 {
                    return Err(WireError::InvalidConstruction(format!(
                        "conducting diameter must be positive, got {}",
                        conducting_diameter
                    )));
                }
                let od = conducting_diameter
                    + 2.0 * f64::from(*insulation_layers) * layer_thickness;
                Ok([od, od])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_parses() {
        let catalog = CatalogWireGeometry::new();
        assert!(!catalog.is_empty());
        assert!(catalog.len() >= 20);
    }

    #[test]
    fn test_named_round_wire_uses_catalog_dimensions() {
        let catalog = CatalogWireGeometry::new();
        let wire = WireSpec::named("Round 1.00 - Grade 1");
        let od = catalog.outer_dimensions(&wire).unwrap();
        assert!((od[0] - 1.062e-3).abs() < 1e-9);
        assert_eq!(od[0], od[1]);
    }

    #[test]
    fn test_unknown_wire_is_an_error() {
        let catalog = CatalogWireGeometry::new();
        let wire = WireSpec::named("Unobtainium 0.1");
        let err = catalog.outer_dimensions(&wire).unwrap_err();
        assert!(matches!(err, WireError::UnknownWire(_)));
    }

    #[test]
    fn test_bare_round_wire_derives_enamel_build() {
        let catalog = CatalogWireGeometry::new();
        let od = catalog.outer_dimensions(&WireSpec::round(1.0e-3)).unwrap();
        assert!((od[0] - 1.08e-3).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_outer_diameter_wins() {
        let catalog = CatalogWireGeometry::new();
        let wire = WireSpec::Round {
            name: Some("Round 1.00 - Grade 1".to_string()),
            conducting_diameter: None,
            outer_diameter: Some(2.0e-3),
            grade: 1,
        };
        let od = catalog.outer_dimensions(&wire).unwrap();
        assert_eq!(od, [2.0e-3, 2.0e-3]);
    }

    #[test]
    fn test_litz_bundle_formula() {
        let catalog = CatalogWireGeometry::new();
        let wire = WireSpec::Litz {
            name: None,
            strand_conducting_diameter: Some(1.0e-4),
            number_conductors: Some(100),
            grade: 1,
            served: false,
            outer_diameter: None,
        };
        let od = catalog.outer_dimensions(&wire).unwrap();
        let expected = 1.155 * 10.0 * 1.08e-4;
        assert!((od[0] - expected).abs() < 1e-9);

        let served = WireSpec::Litz {
            name: None,
            strand_conducting_diameter: Some(1.0e-4),
            number_conductors: Some(100),
            grade: 1,
            served: true,
            outer_diameter: None,
        };
        let served_od = catalog.outer_dimensions(&served).unwrap();
        assert!((served_od[0] - (expected + 8.0e-5)).abs() < 1e-9);
    }

    #[test]
    fn test_insulated_wire_adds_wall_per_layer() {
        let catalog = CatalogWireGeometry::new();
        let wire = WireSpec::Insulated {
            conducting_diameter: 5.0e-4,
            insulation_layers: 3,
            layer_thickness: 3.0e-5,
        };
        let od = catalog.outer_dimensions(&wire).unwrap();
        assert!((od[0] - 6.8e-4).abs() < 1e-9);
    }

    #[test]
    fn test_foil_orientation() {
        let catalog = CatalogWireGeometry::new();
        let wire = WireSpec::Foil {
            thickness: 1.0e-4,
            width: Some(0.010),
        };
        let od = catalog.outer_dimensions(&wire).unwrap();
        assert_eq!(od, [0.010, 1.0e-4]);
    }

    #[test]
    fn test_zero_strand_litz_rejected() {
        let catalog = CatalogWireGeometry::new();
        let wire = WireSpec::Litz {
            name: None,
            strand_conducting_diameter: Some(1.0e-4),
            number_conductors: Some(0),
            grade: 1,
            served: false,
            outer_diameter: None,
        };
        assert!(matches!(
            catalog.outer_dimensions(&wire),
            Err(WireError::InvalidConstruction(_))
        ));
    }
}
