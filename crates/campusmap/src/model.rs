use serde::{Deserialize, Serialize};

/// A named campus location, as served by `/getBuildings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    /// Abbreviated name, used as the selection value.
    pub short_name: String,
    /// Display label.
    pub long_name: String,
}

impl Building {
    #[cfg(test)]
    pub fn new(short_name: impl Into<String>, long_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            long_name: long_name.into(),
        }
    }
}

/// A location in map-image pixel space (origin top-left, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Round both coordinates the way a browser's `Math.round` does.
    pub fn rounded(self) -> Self {
        Self {
            x: round_half_up(self.x),
            y: round_half_up(self.y),
        }
    }
}

/// One leg of a route as returned by `/buildingLocation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub start: Point,
    pub destination: Point,
    /// Walking distance of this leg in feet, when the server reports it.
    #[serde(default, rename = "label", skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl RouteSegment {
    #[cfg(test)]
    pub fn new(start: Point, destination: Point) -> Self {
        Self {
            start,
            destination,
            distance: None,
        }
    }

    #[cfg(test)]
    pub fn with_distance(mut self, feet: f64) -> Self {
        self.distance = Some(feet);
        self
    }
}

/// Halves round toward positive infinity, so `-2.5` becomes `-2` and `2.5` becomes `3`.
/// `f64::round` rounds halves away from zero, which differs for negative input.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
