use eframe::egui::{self, Color32, Pos2, Rect, Stroke};

use super::Canvas;
use crate::model::Point;

/// Draws map-pixel commands into an egui painter, scaled onto a screen rect.
pub struct PainterCanvas<'a> {
    painter: &'a egui::Painter,
    /// Screen position of map pixel (0, 0).
    origin: Pos2,
    /// Screen points per map pixel.
    scale: f32,
    map_size: egui::Vec2,
    texture: Option<&'a egui::TextureHandle>,
    background: Color32,
}

impl<'a> PainterCanvas<'a> {
    pub fn new(
        painter: &'a egui::Painter,
        origin: Pos2,
        scale: f32,
        map_size: egui::Vec2,
        background: Color32,
    ) -> Self {
        Self {
            painter,
            origin,
            scale,
            map_size,
            texture: None,
            background,
        }
    }

    pub fn with_texture(mut self, texture: Option<&'a egui::TextureHandle>) -> Self {
        self.texture = texture;
        self
    }

    fn to_screen(&self, p: Point) -> Pos2 {
        self.origin + egui::vec2(p.x as f32, p.y as f32) * self.scale
    }

    fn map_rect(&self) -> Rect {
        Rect::from_min_size(self.origin, self.map_size * self.scale)
    }
}

impl Canvas for PainterCanvas<'_> {
    fn clear(&mut self) {
        self.painter.rect_filled(self.map_rect(), 0.0, self.background);
    }

    fn draw_base_map(&mut self, origin: Point) {
        let Some(texture) = self.texture else { return };
        let rect = Rect::from_min_size(self.to_screen(origin), self.map_size * self.scale);
        let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        self.painter.image(texture.id(), rect, uv, Color32::WHITE);
    }

    fn draw_marker(&mut self, center: Point, radius: f64, outline: Stroke, fill: Color32) {
        let center = self.to_screen(center);
        let radius = radius as f32 * self.scale;
        for shape in marker_shapes(center, radius, outline, fill, self.scale) {
            self.painter.add(shape);
        }
    }

    fn draw_line(&mut self, from: Point, to: Point, width: f64, color: Color32) {
        let stroke = Stroke::new(width as f32 * self.scale, color);
        self.painter
            .line_segment([self.to_screen(from), self.to_screen(to)], stroke);
    }
}

/// Outline first, then fill. The outline scales with the map but stays at least 1 px.
fn marker_shapes(
    center: Pos2,
    radius: f32,
    outline: Stroke,
    fill: Color32,
    scale: f32,
) -> [egui::Shape; 2] {
    let outline = Stroke::new((outline.width * scale).max(1.0), outline.color);
    [
        egui::Shape::circle_stroke(center, radius, outline),
        egui::Shape::circle_filled(center, radius, fill),
    ]
}

/// Largest scale at which the whole map fits into `available`.
pub fn fit_scale(map_size: egui::Vec2, available: egui::Vec2) -> f32 {
    if map_size.x <= 0.0 || map_size.y <= 0.0 {
        return 1.0;
    }
    (available.x / map_size.x).min(available.y / map_size.y).max(0.01)
}
