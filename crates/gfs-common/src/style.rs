//! Presentation tags attached to each forecast parameter.

use serde::{Deserialize, Serialize};

/// Named colour ramps used for filled surfaces and isolines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// White to dark blue.
    Blues,
    /// Diverging blue to red.
    CoolWarm,
    /// Yellow through green to blue.
    YlGnBu,
    /// Cyan to magenta.
    Cool,
}

impl ColorScheme {
    pub fn name(&self) -> &'static str {
        match self {
            ColorScheme::Blues => "Blues",
            ColorScheme::CoolWarm => "coolwarm",
            ColorScheme::YlGnBu => "YlGnBu",
            ColorScheme::Cool => "cool",
        }
    }
}

impl std::fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a prepared field is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    FilledSurface,
    FilledSurfaceWithVectors,
    IsolineContour,
}

impl RenderMode {
    pub fn has_vectors(&self) -> bool {
        matches!(self, RenderMode::FilledSurfaceWithVectors)
    }

    pub fn is_filled(&self) -> bool {
        !matches!(self, RenderMode::IsolineContour)
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RenderMode::FilledSurface => "filled",
            RenderMode::FilledSurfaceWithVectors => "filled+vectors",
            RenderMode::IsolineContour => "isolines",
        };
        f.write_str(s)
    }
}
