//! The coil aggregate: functional description, policies, staged artifacts.

use serde::{Deserialize, Serialize};

use super::{Alignment, Bobbin, ElectricalType, Layer, Section, Turn, WindingOrientation};
use crate::errors::ConfigurationError;
use crate::policy::Policy;
use crate::wire::WireSpec;

/// Isolation side of a winding, by electrical function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IsolationSide {
    Primary,
    Secondary,
    Tertiary,
    Quaternary,
    Quinary,
    Senary,
    Septenary,
    Octonary,
    Nonary,
    Denary,
}

impl IsolationSide {
    const ORDERED: [IsolationSide; 10] = [
        IsolationSide::Primary,
        IsolationSide::Secondary,
        IsolationSide::Tertiary,
        IsolationSide::Quaternary,
        IsolationSide::Quinary,
        IsolationSide::Senary,
        IsolationSide::Septenary,
        IsolationSide::Octonary,
        IsolationSide::Nonary,
        IsolationSide::Denary,
    ];

    /// Isolation side for the winding at `index`; past the tenth clamps to
    /// `Denary`.
    pub fn from_index(index: usize) -> Self {
        Self::ORDERED[index.min(Self::ORDERED.len() - 1)]
    }
}

/// Logical description of one winding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winding {
    pub name: String,
    pub number_turns: u32,
    pub number_parallels: u32,
    pub wire: WireSpec,
    pub isolation_side: IsolationSide,
}

impl Winding {
    pub fn new(name: &str, number_turns: u32, number_parallels: u32, wire: WireSpec) -> Self {
        Self {
            name: name.to_string(),
            number_turns,
            number_parallels,
            wire,
            isolation_side: IsolationSide::Primary,
        }
    }

    pub fn with_isolation_side(mut self, side: IsolationSide) -> Self {
        self.isolation_side = side;
        self
    }

    /// Total physical wraps: turns times parallels.
    pub fn physical_turns(&self) -> u32 {
        self.number_turns * self.number_parallels
    }
}

/// Construction progress of a coil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoilStage {
    Unwound,
    SectionsPlanned,
    LayersPacked,
    TurnsPlaced,
    Compacted,
}

fn default_interleaving_level() -> u32 {
    1
}

fn default_winding_orientation() -> WindingOrientation {
    WindingOrientation::Contiguous
}

fn default_layers_orientation() -> Policy<WindingOrientation> {
    Policy::Uniform(WindingOrientation::Overlapping)
}

/// A coil being constructed: ordered windings, a bobbin, the construction
/// policies, and whichever staged artifacts have been produced so far.
///
/// Construction calls fail fast: on error every artifact keeps its pre-call
/// value. Producing an artifact invalidates everything downstream of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coil {
    pub functional_description: Vec<Winding>,
    pub bobbin: Bobbin,
    #[serde(default = "default_interleaving_level")]
    pub interleaving_level: u32,
    #[serde(default = "default_winding_orientation")]
    pub winding_orientation: WindingOrientation,
    #[serde(default = "default_layers_orientation")]
    pub layers_orientation: Policy<WindingOrientation>,
    #[serde(default)]
    pub turns_alignment: Policy<Alignment>,
    #[serde(default)]
    pub section_alignment: Alignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections_description: Option<Vec<Section>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers_description: Option<Vec<Layer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turns_description: Option<Vec<Turn>>,
    #[serde(default)]
    pub compacted: bool,
}

impl Coil {
    pub fn new(
        functional_description: Vec<Winding>,
        bobbin: Bobbin,
    ) -> Result<Self, ConfigurationError> {
        let coil = Self {
            functional_description,
            bobbin,
            interleaving_level: default_interleaving_level(),
            winding_orientation: default_winding_orientation(),
            layers_orientation: default_layers_orientation(),
            turns_alignment: Policy::default(),
            section_alignment: Alignment::default(),
            sections_description: None,
            layers_description: None,
            turns_description: None,
            compacted: false,
        };
        coil.validate()?;
        Ok(coil)
    }

    /// Parse a coil description, rejecting degenerate windings.
    pub fn from_json(json: &str) -> Result<Self, crate::errors::WindError> {
        let coil: Coil = serde_json::from_str(json)?;
        coil.validate()?;
        Ok(coil)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for winding in &self.functional_description {
            if winding.number_turns == 0 {
                return Err(ConfigurationError::ZeroTurns {
                    name: winding.name.clone(),
                });
            }
            if winding.number_parallels == 0 {
                return Err(ConfigurationError::ZeroParallels {
                    name: winding.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn stage(&self) -> CoilStage {
        if self.turns_description.is_some() && self.compacted {
            CoilStage::Compacted
        } else if self.turns_description.is_some() {
            CoilStage::TurnsPlaced
        } else if self.layers_description.is_some() {
            CoilStage::LayersPacked
        } else if self.sections_description.is_some() {
            CoilStage::SectionsPlanned
        } else {
            CoilStage::Unwound
        }
    }

    pub fn winding_index(&self, name: &str) -> Option<usize> {
        self.functional_description
            .iter()
            .position(|w| w.name == name)
    }

    pub fn winding(&self, name: &str) -> Option<&Winding> {
        self.functional_description.iter().find(|w| w.name == name)
    }

    /// Sections of the given electrical type, in window order.
    pub fn sections_by_type(&self, section_type: ElectricalType) -> Vec<&Section> {
        self.sections_description
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|s| s.section_type == section_type)
            .collect()
    }

    pub fn conduction_sections(&self) -> Vec<&Section> {
        self.sections_by_type(ElectricalType::Conduction)
    }

    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.sections_description
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|s| s.name == name)
    }

    pub fn layers_by_section(&self, section: &str) -> Vec<&Layer> {
        self.layers_description
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|l| l.section == section)
            .collect()
    }

    pub fn layers_by_winding(&self, index: usize) -> Vec<&Layer> {
        let Some(winding) = self.functional_description.get(index) else {
            return Vec::new();
        };
        self.layers_description
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|l| l.winding.as_deref() == Some(winding.name.as_str()))
            .collect()
    }

    pub fn turns_by_layer(&self, layer: &str) -> Vec<&Turn> {
        self.turns_description
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|t| t.layer == layer)
            .collect()
    }

    pub fn turns_by_winding(&self, index: usize) -> Vec<&Turn> {
        let Some(winding) = self.functional_description.get(index) else {
            return Vec::new();
        };
        self.turns_description
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|t| t.winding == winding.name)
            .collect()
    }

    /// Winding-to-section turn assignment, `(winding, turns, parallels)` per
    /// conduction section in window order. This is what a re-wind from a
    /// saved sections description must reproduce.
    pub fn section_assignment(&self) -> Vec<(String, u32, u32)> {
        self.conduction_sections()
            .iter()
            .filter_map(|s| {
                s.partial_windings.first().map(|p| {
                    (p.winding.clone(), p.number_turns, p.number_parallels)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnSpec;

    fn test_coil() -> Coil {
        let windings = vec![
            Winding::new("primary", 10, 1, WireSpec::round(1.0e-3)),
            Winding::new("secondary", 5, 2, WireSpec::round(1.0e-3))
                .with_isolation_side(IsolationSide::Secondary),
        ];
        let bobbin = Bobbin::rectangular(0.004, 0.012, [0.007, 0.0], ColumnSpec::round(0.010));
        Coil::new(windings, bobbin).unwrap()
    }

    #[test]
    fn test_isolation_side_from_index() {
        assert_eq!(IsolationSide::from_index(0), IsolationSide::Primary);
        assert_eq!(IsolationSide::from_index(1), IsolationSide::Secondary);
        assert_eq!(IsolationSide::from_index(9), IsolationSide::Denary);
        assert_eq!(IsolationSide::from_index(42), IsolationSide::Denary);
    }

    #[test]
    fn test_new_rejects_zero_turns() {
        let windings = vec![Winding::new("broken", 0, 1, WireSpec::round(1.0e-3))];
        let bobbin = Bobbin::rectangular(0.004, 0.012, [0.007, 0.0], ColumnSpec::round(0.010));
        let err = Coil::new(windings, bobbin).unwrap_err();
        assert!(matches!(err, ConfigurationError::ZeroTurns { name } if name == "broken"));
    }

    #[test]
    fn test_stage_starts_unwound() {
        let coil = test_coil();
        assert_eq!(coil.stage(), CoilStage::Unwound);
        assert!(coil.conduction_sections().is_empty());
    }

    #[test]
    fn test_coil_json_defaults() {
        let json = r#"{
            "functionalDescription": [
                {
                    "name": "primary",
                    "numberTurns": 10,
                    "numberParallels": 1,
                    "wire": {"type": "round", "conductingDiameter": 0.001},
                    "isolationSide": "primary"
                }
            ],
            "bobbin": {
                "windingWindow": {
                    "shape": "rectangular",
                    "width": 0.004,
                    "height": 0.012,
                    "coordinates": [0.007, 0.0]
                },
                "column": {"shape": "round", "width": 0.01}
            }
        }"#;
        let coil = Coil::from_json(json).unwrap();
        assert_eq!(coil.interleaving_level, 1);
        assert_eq!(coil.winding_orientation, WindingOrientation::Contiguous);
        assert_eq!(
            coil.layers_orientation,
            Policy::Uniform(WindingOrientation::Overlapping)
        );
        assert_eq!(coil.section_alignment, Alignment::Centered);
        assert_eq!(coil.stage(), CoilStage::Unwound);
    }

    #[test]
    fn test_winding_lookup() {
        let coil = test_coil();
        assert_eq!(coil.winding_index("secondary"), Some(1));
        assert_eq!(coil.winding_index("tertiary"), None);
        assert_eq!(coil.winding("primary").unwrap().physical_turns(), 10);
        assert_eq!(coil.winding("secondary").unwrap().physical_turns(), 10);
    }
}
