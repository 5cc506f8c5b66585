pub mod base_map;
pub mod painter;

use eframe::egui::{Color32, Stroke};

use crate::model::{Point, RouteSegment};

pub const MARKER_RADIUS: f64 = 30.0;
pub const MARKER_FILL: Color32 = Color32::RED;
pub const MARKER_OUTLINE: Stroke = Stroke {
    width: 1.0,
    color: Color32::BLACK,
};
pub const ROUTE_WIDTH: f64 = 8.0;
pub const ROUTE_COLOR: Color32 = Color32::BLUE;

/// One drawing primitive, in map-image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    BaseMap {
        origin: Point,
    },
    /// Outlined, filled circle. The outline is drawn first and the fill on top of it.
    Marker {
        center: Point,
        radius: f64,
        outline: Stroke,
        fill: Color32,
    },
    Line {
        from: Point,
        to: Point,
        width: f64,
        color: Color32,
    },
}

/// A surface the map can be drawn onto.
pub trait Canvas {
    fn clear(&mut self);
    fn draw_base_map(&mut self, origin: Point);
    fn draw_marker(&mut self, center: Point, radius: f64, outline: Stroke, fill: Color32);
    fn draw_line(&mut self, from: Point, to: Point, width: f64, color: Color32);

    fn execute(&mut self, command: &DrawCommand) {
        match *command {
            DrawCommand::Clear => self.clear(),
            DrawCommand::BaseMap { origin } => self.draw_base_map(origin),
            DrawCommand::Marker {
                center,
                radius,
                outline,
                fill,
            } => self.draw_marker(center, radius, outline, fill),
            DrawCommand::Line {
                from,
                to,
                width,
                color,
            } => self.draw_line(from, to, width, color),
        }
    }
}

/// Draws the base map and the route overlay. Every call is a full redraw.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapRenderer;

impl MapRenderer {
    /// Clear the canvas, then draw base map and overlay from scratch.
    pub fn redraw(&self, canvas: &mut impl Canvas, route: &[RouteSegment]) {
        for command in frame_commands(route) {
            canvas.execute(&command);
        }
    }
}

/// The full frame: clear, base map at the origin, then the overlay.
pub fn frame_commands(route: &[RouteSegment]) -> Vec<DrawCommand> {
    let mut commands = vec![
        DrawCommand::Clear,
        DrawCommand::BaseMap {
            origin: Point::new(0.0, 0.0),
        },
    ];
    commands.extend(overlay_commands(route));
    commands
}

/// Markers at the route's first start and last destination, and one line per segment.
///
/// Marker centers keep their exact coordinates; line endpoints are rounded.
/// A one-segment route gets both markers.
pub fn overlay_commands(route: &[RouteSegment]) -> Vec<DrawCommand> {
    let last = route.len().saturating_sub(1);
    let mut commands = Vec::with_capacity(route.len() + 2);
    for (i, segment) in route.iter().enumerate() {
        if i == 0 {
            commands.push(marker(segment.start));
        }
        if i == last {
            commands.push(marker(segment.destination));
        }
        commands.push(DrawCommand::Line {
            from: segment.start.rounded(),
            to: segment.destination.rounded(),
            width: ROUTE_WIDTH,
            color: ROUTE_COLOR,
        });
    }
    commands
}

fn marker(center: Point) -> DrawCommand {
    DrawCommand::Marker {
        center,
        radius: MARKER_RADIUS,
        outline: MARKER_OUTLINE,
        fill: MARKER_FILL,
    }
}
