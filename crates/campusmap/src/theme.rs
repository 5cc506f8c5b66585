use eframe::egui::{self, Color32};

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub background: Color32,
    pub foreground: Color32,
    pub heading_color: Color32,
    pub accent: Color32,
    pub panel_background: Color32,
    /// Shown under the overlay where no map image is available.
    pub map_background: Color32,
    pub error: Color32,
    pub body_size: f32,
    pub heading_size: f32,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            background: Color32::from_rgb(0x1E, 0x1E, 0x1E),
            foreground: Color32::from_rgb(0xC8, 0xC8, 0xC8),
            heading_color: Color32::WHITE,
            accent: Color32::from_rgb(0x52, 0x94, 0xE2),
            panel_background: Color32::from_rgb(0x2D, 0x2D, 0x2D),
            map_background: Color32::from_rgb(0x3A, 0x3A, 0x3A),
            error: Color32::from_rgb(0xFF, 0x7E, 0x67),
            body_size: 15.0,
            heading_size: 18.0,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            background: Color32::WHITE,
            foreground: Color32::from_rgb(0x1A, 0x1A, 0x2E),
            heading_color: Color32::from_rgb(0x16, 0x21, 0x3E),
            accent: Color32::from_rgb(0x0F, 0x34, 0x60),
            panel_background: Color32::from_rgb(0xF5, 0xF5, 0xF5),
            map_background: Color32::from_rgb(0xE4, 0xE4, 0xE4),
            error: Color32::from_rgb(0xC7, 0x3E, 0x1D),
            body_size: 15.0,
            heading_size: 18.0,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }

    pub fn toggled(&self) -> Self {
        if self.name == "dark" {
            Self::light()
        } else {
            Self::dark()
        }
    }

    pub fn is_dark(&self) -> bool {
        self.name == "dark"
    }

    /// egui widget visuals matching this theme.
    pub fn visuals(&self) -> egui::Visuals {
        let mut visuals = if self.is_dark() {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        visuals.panel_fill = self.panel_background;
        visuals.window_fill = self.panel_background;
        visuals.extreme_bg_color = self.background;
        visuals.error_fg_color = self.error;
        visuals.hyperlink_color = self.accent;
        visuals
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), (opacity * 255.0) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_and_toggle() {
        assert_eq!(Theme::from_name("dark").name, "dark");
        assert_eq!(Theme::from_name("anything").name, "light");
        assert_eq!(Theme::light().toggled().name, "dark");
        assert_eq!(Theme::dark().toggled().name, "light");
    }

    #[test]
    fn test_visuals_follow_theme() {
        assert!(Theme::dark().visuals().dark_mode);
        assert!(!Theme::light().visuals().dark_mode);
        assert_eq!(Theme::dark().visuals().panel_fill, Theme::dark().panel_background);
    }
}
