use std::path::{Path, PathBuf};

use eframe::egui;

use crate::api::HttpApi;
use crate::config::Settings;
use crate::model::RouteSegment;
use crate::render::MapRenderer;
use crate::render::base_map::BaseMap;
use crate::render::painter::{PainterCanvas, fit_scale};
use crate::theme::Theme;

struct ExportApp {
    route: Vec<RouteSegment>,
    base_map: BaseMap,
    renderer: MapRenderer,
    theme: Theme,
    output: PathBuf,
    screenshot_requested: bool,
    done: bool,
}

impl ExportApp {
    fn new(route: Vec<RouteSegment>, base_map: BaseMap, theme: Theme, output: PathBuf) -> Self {
        Self {
            route,
            base_map,
            renderer: MapRenderer,
            theme,
            output,
            screenshot_requested: false,
            done: false,
        }
    }
}

impl eframe::App for ExportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.done {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        // Screenshot requested last frame arrives as an event
        let mut got_screenshot = false;
        ctx.input(|i| {
            for event in &i.events {
                if let egui::Event::Screenshot { image, .. } = event {
                    save_color_image(image, &self.output);
                    got_screenshot = true;
                }
            }
        });
        if got_screenshot {
            self.done = true;
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        let bg = self.theme.background;
        let map_size = self.base_map.size_vec2();
        let texture = self.base_map.texture(ctx).cloned();
        let route = &self.route;
        let renderer = self.renderer;
        let map_background = self.theme.map_background;

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(bg).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let scale = fit_scale(map_size, rect.size());
                let origin = rect.center() - map_size * scale / 2.0;
                let painter = ui.painter_at(rect);
                let mut canvas =
                    PainterCanvas::new(&painter, origin, scale, map_size, map_background)
                        .with_texture(texture.as_ref());
                renderer.redraw(&mut canvas, route);
            });

        if !self.screenshot_requested {
            ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
            self.screenshot_requested = true;
        }

        ctx.request_repaint();
    }
}

fn save_color_image(image: &egui::ColorImage, path: &Path) {
    let width = image.width() as u32;
    let height = image.height() as u32;
    let pixels: Vec<u8> = image
        .pixels
        .iter()
        .flat_map(|c| [c.r(), c.g(), c.b(), c.a()])
        .collect();

    match image::save_buffer(path, &pixels, width, height, image::ColorType::Rgba8) {
        Ok(()) => tracing::info!(path = %path.display(), width, height, "saved route image"),
        Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to save route image"),
    }
}

pub fn run(
    settings: &Settings,
    start: &str,
    end: &str,
    output: PathBuf,
    width: u32,
    height: u32,
) -> anyhow::Result<()> {
    if width == 0 || height == 0 {
        anyhow::bail!("Export size must be positive, got {width}x{height}");
    }

    let api = HttpApi::new(&settings.server, settings.timeout)?;
    let form = super::route::plan(&api, Some(start.to_string()), Some(end.to_string()))?;
    let route = form.route().to_vec();

    let base_map = BaseMap::load_or_blank(settings.map_image.as_deref(), settings.map_size);
    let theme = Theme::from_name(&settings.theme);

    if output.exists() {
        std::fs::remove_file(&output)?;
    }
    eprintln!(
        "Exporting route {start} -> {end} ({} segments) to {} ({width}x{height})",
        route.len(),
        output.display(),
    );

    let title = format!("campusmap export {start} {end}");
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([width as f32, height as f32])
        .with_title(&title)
        .with_decorations(false);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let output_clone = output.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(ExportApp::new(route, base_map, theme, output_clone)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    if !output.exists() {
        anyhow::bail!("Export failed: {} was not written", output.display());
    }
    eprintln!("Export complete.");
    Ok(())
}
