use std::f64::consts::PI;
use std::fmt;

use crate::model::RouteSegment;

/// Eight-way compass heading on the map (north is up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compass {
    E,
    NE,
    N,
    NW,
    W,
    SW,
    S,
    SE,
}

impl Compass {
    /// Heading of a step of `(dx, dy)` map pixels. Image y grows downward, so it is flipped.
    pub fn from_delta(dx: f64, dy: f64) -> Self {
        let angle = (-dy).atan2(dx);
        let sector = PI / 8.0;
        if (-sector..=sector).contains(&angle) {
            Self::E
        } else if (sector..=3.0 * sector).contains(&angle) {
            Self::NE
        } else if (3.0 * sector..=5.0 * sector).contains(&angle) {
            Self::N
        } else if (5.0 * sector..=7.0 * sector).contains(&angle) {
            Self::NW
        } else if angle <= -7.0 * sector || angle >= 7.0 * sector {
            Self::W
        } else if (-7.0 * sector..=-5.0 * sector).contains(&angle) {
            Self::SW
        } else if (-5.0 * sector..=-3.0 * sector).contains(&angle) {
            Self::S
        } else {
            Self::SE
        }
    }

    pub fn of(segment: &RouteSegment) -> Self {
        Self::from_delta(
            segment.destination.x - segment.start.x,
            segment.destination.y - segment.start.y,
        )
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::E => "E",
            Self::NE => "NE",
            Self::N => "N",
            Self::NW => "NW",
            Self::W => "W",
            Self::SW => "SW",
            Self::S => "S",
            Self::SE => "SE",
        }
    }
}

impl fmt::Display for Compass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Turn-by-turn text for a loaded route.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub title: String,
    pub steps: Vec<String>,
    /// Sum of all leg distances; `None` if any leg had no distance.
    pub total_feet: Option<f64>,
}

impl Itinerary {
    pub fn new(route: &[RouteSegment], from: &str, to: &str) -> Self {
        let steps = route.iter().map(describe_step).collect();
        let total_feet = route
            .iter()
            .map(|s| s.distance)
            .sum::<Option<f64>>()
            .filter(|_| !route.is_empty());
        Self {
            title: format!("Path from {from} to {to}:"),
            steps,
            total_feet,
        }
    }

    pub fn total_line(&self) -> Option<String> {
        self.total_feet
            .map(|feet| format!("Total distance: {feet:.0} feet"))
    }

    /// Title, one tab-indented line per step, then the total if known.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.steps.len() + 2);
        lines.push(self.title.clone());
        lines.extend(self.steps.iter().map(|s| format!("\t{s}")));
        lines.extend(self.total_line());
        lines
    }
}

fn describe_step(segment: &RouteSegment) -> String {
    let dir = Compass::of(segment);
    let to = segment.destination;
    match segment.distance {
        Some(feet) => format!("Walk {feet:.0} feet {dir} to ({:.0}, {:.0})", to.x, to.y),
        None => format!("Walk {dir} to ({:.0}, {:.0})", to.x, to.y),
    }
}
