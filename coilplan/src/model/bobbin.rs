//! Bobbin and winding-window geometry.

use serde::{Deserialize, Serialize};

/// Cross-section shape of the central column the turns wrap around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnShape {
    Round,
    Rectangular,
}

/// Central column dimensions, used to compute per-turn wire length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub shape: ColumnShape,
    /// Diameter for round columns, radial width for rectangular ones. Meters.
    pub width: f64,
    /// Depth perpendicular to the window plane. Ignored for round columns.
    #[serde(default)]
    pub depth: f64,
}

impl ColumnSpec {
    pub fn round(diameter: f64) -> Self {
        Self {
            shape: ColumnShape::Round,
            width: diameter,
            depth: diameter,
        }
    }

    pub fn rectangular(width: f64, depth: f64) -> Self {
        Self {
            shape: ColumnShape::Rectangular,
            width,
            depth,
        }
    }
}

/// The bounded region available for conductors.
///
/// Rectangular windows use core-frame coordinates: axis 0 is radial (distance
/// from the core centerline), axis 1 is axial. Round windows use polar
/// coordinates: axis 0 is the radius from the window center in meters, axis 1
/// the angle in radians, increasing from the start of the window span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WindingWindow {
    Rectangular {
        /// Radial extent, meters.
        width: f64,
        /// Axial extent, meters.
        height: f64,
        /// Center of the window in the core frame.
        coordinates: [f64; 2],
    },
    Round {
        /// Radial depth available for conductors, meters.
        radial_height: f64,
        /// Angular extent, radians.
        angle: f64,
        /// Center of the window in the core frame.
        coordinates: [f64; 2],
    },
}

/// A directed placement axis: `position(t) = origin + dir * t` for offsets
/// `t` in `[0, extent]`. Round windows fill radially inward from the window
/// edge, so their radial frame runs against the coordinate direction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AxisFrame {
    pub origin: f64,
    pub dir: f64,
    pub extent: f64,
}

impl AxisFrame {
    pub fn position(&self, offset: f64) -> f64 {
        self.origin + self.dir * offset
    }

    pub fn offset(&self, coordinate: f64) -> f64 {
        (coordinate - self.origin) * self.dir
    }
}

impl WindingWindow {
    pub fn is_round(&self) -> bool {
        matches!(self, WindingWindow::Round { .. })
    }

    /// Extent along each axis: `[width, height]` for rectangular windows,
    /// `[radial_height, angle]` for round ones.
    pub fn extents(&self) -> [f64; 2] {
        match self {
            WindingWindow::Rectangular { width, height, .. } => [*width, *height],
            WindingWindow::Round {
                radial_height,
                angle,
                ..
            } => [*radial_height, *angle],
        }
    }

    pub(crate) fn frame(&self, axis: usize) -> AxisFrame {
        match self {
            WindingWindow::Rectangular {
                width,
                height,
                coordinates,
            } => {
                let extent = if axis == 0 { *width } else { *height };
                AxisFrame {
                    origin: coordinates[axis] - extent / 2.0,
                    dir: 1.0,
                    extent,
                }
            }
            WindingWindow::Round {
                radial_height,
                angle,
                ..
            } => {
                if axis == 0 {
                    AxisFrame {
                        origin: *radial_height,
                        dir: -1.0,
                        extent: *radial_height,
                    }
                } else {
                    AxisFrame {
                        origin: 0.0,
                        dir: 1.0,
                        extent: *angle,
                    }
                }
            }
        }
    }
}

/// Physical winding window plus the column it wraps. Immutable once resolved
/// for a design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bobbin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub winding_window: WindingWindow,
    pub column: ColumnSpec,
}

impl Bobbin {
    pub fn rectangular(width: f64, height: f64, coordinates: [f64; 2], column: ColumnSpec) -> Self {
        Self {
            name: None,
            winding_window: WindingWindow::Rectangular {
                width,
                height,
                coordinates,
            },
            column,
        }
    }

    pub fn round(radial_height: f64, angle: f64, column: ColumnSpec) -> Self {
        Self {
            name: None,
            winding_window: WindingWindow::Round {
                radial_height,
                angle,
                coordinates: [0.0, 0.0],
            },
            column,
        }
    }

    /// Wire length of one wrap whose center sits at `coordinates`.
    ///
    /// Rectangular windows wrap the central column at the turn's radial
    /// distance from the centerline. Round windows wrap the core
    /// cross-section, growing with the turn's depth into the window.
    pub fn turn_length(&self, coordinates: [f64; 2]) -> f64 {
        match &self.winding_window {
            WindingWindow::Rectangular { .. } => match self.column.shape {
                ColumnShape::Round => 2.0 * std::f64::consts::PI * coordinates[0],
                ColumnShape::Rectangular => {
                    let corner = (coordinates[0] - self.column.width / 2.0).max(0.0);
                    2.0 * (self.column.width + self.column.depth)
                        + 2.0 * std::f64::consts::PI * corner
                }
            },
            WindingWindow::Round { radial_height, .. } => {
                let depth = (radial_height - coordinates[0]).max(0.0);
                2.0 * (self.column.width + self.column.depth)
                    + 2.0 * std::f64::consts::PI * depth
            }
        }
    }
}
