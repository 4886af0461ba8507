//! The coil orchestrator: staged winding entry points over a [`Coil`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{MissingPrerequisiteError, WindError};
use crate::insulation::InsulationGrade;
use crate::model::{Coil, CoilStage, Layer, Section, Turn};
use crate::wind::compact::{self, FitIssue, FitReport};
use crate::wind::{layers, margins, planar, sections, turns};
use crate::wire::{CatalogWireGeometry, WireGeometry};

fn default_repetitions() -> u32 {
    1
}

/// Construction parameters for one winding run.
///
/// Everything is optional: the empty plan winds one section per winding with
/// area-derived proportions and no margins. Proportions select the share of
/// the winding axis per winding; a pattern fixes the section order instead of
/// round-robin interleaving. The planar fields only apply to
/// [`Winder::wind_planar`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindPlan {
    pub repetitions: u32,
    pub proportions: Option<Vec<f64>>,
    pub pattern: Option<Vec<usize>>,
    /// Margin tape widths per winding, `[leading, trailing]` meters.
    pub margins: Option<Vec<[f64; 2]>>,
    /// Spacing between consecutive layers of a section, meters.
    pub insulation_thickness: Option<f64>,
    /// Planar stack order, one winding index per board layer.
    pub stack_up: Option<Vec<usize>>,
    /// Distance under each planar boundary, `stack_up.len() - 1` entries.
    pub stack_distances: Option<Vec<f64>>,
}

impl Default for WindPlan {
    fn default() -> Self {
        Self {
            repetitions: default_repetitions(),
            proportions: None,
            pattern: None,
            margins: None,
            insulation_thickness: None,
            stack_up: None,
            stack_distances: None,
        }
    }
}

/// Immutable settings snapshot for a batch of winding runs.
///
/// Passed in by value so concurrent evaluations of independent designs can
/// each carry their own snapshot; nothing here is process-global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindSettings {
    /// Carry isolation with margin tape instead of barrier sections.
    pub allow_margin_tape: bool,
    /// Let triple-insulated wire waive margins and barriers.
    pub allow_insulated_wire: bool,
    /// Keep an overflowing layout instead of raising a fit error.
    pub wind_even_if_not_fit: bool,
    /// Compact automatically at the end of a full wind.
    pub delimit_and_compact: bool,
    /// Retry a failed wind once with derived proportions before surfacing
    /// the fit error.
    pub try_rewind: bool,
    pub insulation_grade: InsulationGrade,
    /// Working voltage between isolation sides; zero means no isolation
    /// requirement.
    pub working_voltage: f64,
    pub max_planar_layers: usize,
}

impl Default for WindSettings {
    fn default() -> Self {
        Self {
            allow_margin_tape: false,
            allow_insulated_wire: true,
            wind_even_if_not_fit: false,
            delimit_and_compact: false,
            try_rewind: true,
            insulation_grade: InsulationGrade::default(),
            working_voltage: 0.0,
            max_planar_layers: 32,
        }
    }
}

/// Summary of a coil's construction state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindReport {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub stage: CoilStage,
    pub fits: bool,
    pub sections: usize,
    pub layers: usize,
    pub turns: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<FitIssue>,
    /// Mean conduction-section fill factor, once compaction computed them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_factor: Option<f64>,
}

impl WindReport {
    fn new(coil: &Coil, fit: Option<FitReport>) -> Self {
        let fills: Vec<f64> = coil
            .conduction_sections()
            .iter()
            .filter_map(|s| s.fill_factor)
            .collect();
        let fill_factor = if fills.is_empty() {
            None
        } else {
            Some(fills.iter().sum::<f64>() / fills.len() as f64)
        };
        let (fits, issues) = match fit {
            Some(report) => (report.fits(), report.issues),
            None => (true, Vec::new()),
        };
        Self {
            report_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            stage: coil.stage(),
            fits,
            sections: coil.sections_description.as_deref().map_or(0, |s| s.len()),
            layers: coil.layers_description.as_deref().map_or(0, |l| l.len()),
            turns: coil.turns_description.as_deref().map_or(0, |t| t.len()),
            issues,
            fill_factor,
        }
    }

    /// Multi-line human-readable form.
    pub fn human(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Stage:    {:?}\n", self.stage));
        out.push_str(&format!(
            "Layout:   {} sections, {} layers, {} turns\n",
            self.sections, self.layers, self.turns
        ));
        if let Some(fill) = self.fill_factor {
            out.push_str(&format!("Fill:     {:.1}%\n", fill * 100.0));
        }
        out.push_str(&format!("Fits:     {}\n", if self.fits { "yes" } else { "NO" }));
        for issue in &self.issues {
            out.push_str(&format!(
                "  - {}: requires {:.3} mm, has {:.3} mm\n",
                issue.section,
                issue.required * 1e3,
                issue.available * 1e3
            ));
        }
        out
    }
}

/// Runs the winding stages against a coil with one settings snapshot and one
/// wire geometry provider.
///
/// Every entry point is fail-fast: on error the coil keeps all of its
/// pre-call artifacts. Entry points that resume mid-pipeline require the
/// prior stage's artifact and invalidate everything downstream of the stage
/// they produce.
#[derive(Debug)]
pub struct Winder<P = CatalogWireGeometry> {
    provider: P,
    settings: WindSettings,
}

impl Winder<CatalogWireGeometry> {
    pub fn new(settings: WindSettings) -> Self {
        Self {
            provider: CatalogWireGeometry::new(),
            settings,
        }
    }
}

impl Default for Winder<CatalogWireGeometry> {
    fn default() -> Self {
        Self::new(WindSettings::default())
    }
}

impl<P: WireGeometry> Winder<P> {
    /// A winder over a custom wire geometry provider.
    pub fn with_provider(provider: P, settings: WindSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &WindSettings {
        &self.settings
    }

    /// Full pipeline: sections, layers, turns and, when the settings ask for
    /// it, compaction.
    ///
    /// When explicit proportions do not fit and the rewind setting is on,
    /// the wind is retried once with derived proportions; the retry's error
    /// wins if that fails too.
    pub fn wind(&self, coil: &mut Coil, plan: &WindPlan) -> Result<(), WindError> {
        match self.wind_once(coil, plan) {
            Err(WindError::Fit(first))
                if self.settings.try_rewind && plan.proportions.is_some() =>
            {
                tracing::debug!(
                    "explicit proportions did not fit ({}), rewinding with derived proportions",
                    first
                );
                let retry = WindPlan {
                    proportions: None,
                    ..plan.clone()
                };
                self.wind_once(coil, &retry)
            }
            other => other,
        }
    }

    fn wind_once(&self, coil: &mut Coil, plan: &WindPlan) -> Result<(), WindError> {
        let sections = sections::plan_sections(coil, plan, &self.provider, &self.settings)?;
        let layers =
            layers::pack_layers(coil, &sections, plan, &self.provider, &self.settings)?;
        let turns = turns::place_turns(coil, &sections, &layers, &self.provider)?;
        if self.settings.delimit_and_compact {
            let (sections, layers, turns) =
                compact::delimit_and_compact(coil, &sections, &layers, &turns, &self.settings)?;
            assign(coil, sections, layers, turns, true);
        } else {
            assign(coil, sections, layers, turns, false);
        }
        Ok(())
    }

    /// Plan sections only, leaving the coil at the sections-planned stage.
    pub fn wind_by_sections(&self, coil: &mut Coil, plan: &WindPlan) -> Result<(), WindError> {
        let sections = sections::plan_sections(coil, plan, &self.provider, &self.settings)?;
        coil.sections_description = Some(sections);
        coil.layers_description = None;
        coil.turns_description = None;
        coil.compacted = false;
        Ok(())
    }

    /// Pack layers from the coil's existing sections description.
    pub fn wind_by_layers(&self, coil: &mut Coil, plan: &WindPlan) -> Result<(), WindError> {
        let layers = {
            let sections =
                coil.sections_description
                    .as_deref()
                    .ok_or(MissingPrerequisiteError {
                        requested: "wind_by_layers",
                        missing: "sections description",
                    })?;
            layers::pack_layers(coil, sections, plan, &self.provider, &self.settings)?
        };
        coil.layers_description = Some(layers);
        coil.turns_description = None;
        coil.compacted = false;
        Ok(())
    }

    /// Place turns from the coil's existing sections and layers.
    pub fn wind_by_turns(&self, coil: &mut Coil) -> Result<(), WindError> {
        let turns = {
            let sections =
                coil.sections_description
                    .as_deref()
                    .ok_or(MissingPrerequisiteError {
                        requested: "wind_by_turns",
                        missing: "sections description",
                    })?;
            let layers = coil
                .layers_description
                .as_deref()
                .ok_or(MissingPrerequisiteError {
                    requested: "wind_by_turns",
                    missing: "layers description",
                })?;
            turns::place_turns(coil, sections, layers, &self.provider)?
        };
        coil.turns_description = Some(turns);
        coil.compacted = false;
        Ok(())
    }

    /// Wind a planar stack-up: sections and layers from the plan's stack
    /// order, then turns.
    pub fn wind_planar(&self, coil: &mut Coil, plan: &WindPlan) -> Result<(), WindError> {
        let (sections, layers) =
            planar::plan_planar(coil, plan, &self.provider, &self.settings)?;
        let turns = turns::place_turns(coil, &sections, &layers, &self.provider)?;
        if self.settings.delimit_and_compact {
            let (sections, layers, turns) =
                compact::delimit_and_compact(coil, &sections, &layers, &turns, &self.settings)?;
            assign(coil, sections, layers, turns, true);
        } else {
            assign(coil, sections, layers, turns, false);
        }
        Ok(())
    }

    /// Compact a fully wound coil in place.
    pub fn delimit_and_compact(&self, coil: &mut Coil) -> Result<(), WindError> {
        let (sections, layers, turns) = {
            let sections =
                coil.sections_description
                    .as_deref()
                    .ok_or(MissingPrerequisiteError {
                        requested: "delimit_and_compact",
                        missing: "sections description",
                    })?;
            let layers = coil
                .layers_description
                .as_deref()
                .ok_or(MissingPrerequisiteError {
                    requested: "delimit_and_compact",
                    missing: "layers description",
                })?;
            let turns = coil
                .turns_description
                .as_deref()
                .ok_or(MissingPrerequisiteError {
                    requested: "delimit_and_compact",
                    missing: "turns description",
                })?;
            compact::delimit_and_compact(coil, sections, layers, turns, &self.settings)?
        };
        assign(coil, sections, layers, turns, true);
        Ok(())
    }

    /// Check the wound geometry against the window bounds without mutating
    /// the coil.
    pub fn check_fit(&self, coil: &Coil) -> Result<FitReport, WindError> {
        let sections = coil
            .sections_description
            .as_deref()
            .ok_or(MissingPrerequisiteError {
                requested: "check_fit",
                missing: "sections description",
            })?;
        let layers = coil
            .layers_description
            .as_deref()
            .ok_or(MissingPrerequisiteError {
                requested: "check_fit",
                missing: "layers description",
            })?;
        compact::check_fit(
            coil,
            sections,
            layers,
            coil.turns_description.as_deref(),
            &self.provider,
        )
    }

    /// Override one conduction section's margins and recompute the stages
    /// that depended on them.
    pub fn add_margin_to_section(
        &self,
        coil: &mut Coil,
        index: usize,
        margin: [f64; 2],
        plan: &WindPlan,
    ) -> Result<(), WindError> {
        margins::add_margin_to_section(coil, index, margin, plan, &self.provider, &self.settings)
    }

    /// Summarize the coil's construction state, including a fit check when
    /// layers exist.
    pub fn report(&self, coil: &Coil) -> Result<WindReport, WindError> {
        let fit = if coil.layers_description.is_some() {
            Some(self.check_fit(coil)?)
        } else {
            None
        };
        Ok(WindReport::new(coil, fit))
    }
}

fn assign(
    coil: &mut Coil,
    sections: Vec<Section>,
    layers: Vec<Layer>,
    turns: Vec<Turn>,
    compacted: bool,
) {
    coil.sections_description = Some(sections);
    coil.layers_description = Some(layers);
    coil.turns_description = Some(turns);
    coil.compacted = compacted;
}
