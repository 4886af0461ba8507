//! coilplan - coil winding layout engine for magnetic components
//!
//! This library turns a functional description of a wound magnetic component
//! (windings, wire constructions, a bobbin) into a concrete physical layout:
//! sections across the winding window, wire layers inside each section, and
//! individually placed turns, with margins and insulation barriers derived
//! from the isolation requirements.
//!
//! # Quick Start
//!
//! ```no_run
//! use coilplan::{load_coil, WindPlan, WindSettings, Winder};
//!
//! let mut coil = load_coil("transformer.json").unwrap();
//! let winder = Winder::new(WindSettings::default());
//! winder.wind(&mut coil, &WindPlan::default()).unwrap();
//!
//! let report = winder.report(&coil).unwrap();
//! println!("{}", report.human());
//! ```
//!
//! # Features
//!
//! - **Section planning**: Proportional or patterned window partitioning
//! - **Layer packing**: Greedy capacity packing, rectangular and round windows
//! - **Turn placement**: Per-turn coordinates with alignment policies
//! - **Insulation**: Margins, barriers, and clearance/creepage tables
//! - **Compaction**: Hug sections to their content and re-justify the window

pub mod core;
pub mod errors;
pub mod insulation;
pub mod model;
pub mod policy;
pub mod wind;
pub mod wire;

// Re-export main types
pub use crate::core::{WindPlan, WindReport, WindSettings, Winder};
pub use errors::{
    ConfigurationError, FitError, MissingPrerequisiteError, UnsupportedCombinationError, WindError,
    WireError,
};
pub use model::{
    Alignment, Bobbin, Coil, CoilStage, ElectricalType, IsolationSide, Layer, Section, Turn,
    Winding, WindingOrientation,
};
pub use policy::Policy;
pub use wind::compact::{FitIssue, FitReport};
pub use wire::{CatalogWireGeometry, WireGeometry, WireSpec};

/// Coordinates closer than this are treated as equal, meters.
pub const GEOMETRY_TOLERANCE: f64 = 1e-9;

/// Load a coil description from a JSON file (convenience wrapper).
pub fn load_coil<P: AsRef<std::path::Path>>(path: P) -> Result<Coil, WindError> {
    let json = std::fs::read_to_string(path)?;
    Coil::from_json(&json)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Coil, CoilStage, FitReport, WindError, WindPlan, WindReport, WindSettings, Winder,
    };
}
