use eframe::egui;
use std::sync::Arc;
use std::time::Instant;

use crate::api::HttpApi;
use crate::config::Settings;
use crate::directory::{BuildingDirectory, DirectoryStatus};
use crate::fetch::Fetcher;
use crate::form::RouteOverlayForm;
use crate::render::MapRenderer;
use crate::render::base_map::BaseMap;
use crate::render::painter::{PainterCanvas, fit_scale};
use crate::theme::Theme;

const ZOOM_STEP: f32 = 1.25;
const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 4.0;
const COMBO_WIDTH: f32 = 260.0;

struct Toast {
    message: String,
    start: Instant,
}

impl Toast {
    fn new(message: String) -> Self {
        Self {
            message,
            start: Instant::now(),
        }
    }

    fn opacity(&self) -> f32 {
        let elapsed = self.start.elapsed().as_secs_f32();
        let duration = 1.5;
        let fade_start = 1.0;
        if elapsed < fade_start {
            1.0
        } else if elapsed < duration {
            1.0 - (elapsed - fade_start) / (duration - fade_start)
        } else {
            0.0
        }
    }

    fn is_expired(&self) -> bool {
        self.start.elapsed().as_secs_f32() >= 1.5
    }
}

struct CampusMapApp {
    form: RouteOverlayForm,
    fetcher: Fetcher,
    renderer: MapRenderer,
    base_map: BaseMap,
    theme: Theme,
    /// `None` fits the whole map into the view.
    zoom: Option<f32>,
    /// Scale used in the last frame, the starting point for manual zoom.
    last_scale: f32,
    show_directions: bool,
    toast: Option<Toast>,
}

impl CampusMapApp {
    fn new(fetcher: Fetcher, base_map: BaseMap, theme: Theme) -> Self {
        fetcher.fetch_buildings();
        Self {
            form: RouteOverlayForm::new(),
            fetcher,
            renderer: MapRenderer,
            base_map,
            theme,
            zoom: None,
            last_scale: 1.0,
            show_directions: true,
            toast: None,
        }
    }

    fn submit(&mut self) {
        if let Some((id, query)) = self.form.submit() {
            self.fetcher.fetch_route(id, query);
        }
    }

    fn reset(&mut self) {
        self.form.reset();
        self.toast = Some(Toast::new("Selection cleared".to_string()));
    }

    fn retry_buildings(&mut self) {
        self.form.reload_buildings();
        self.fetcher.fetch_buildings();
    }

    fn toggle_theme(&mut self, ctx: &egui::Context) {
        self.theme = self.theme.toggled();
        ctx.set_visuals(self.theme.visuals());
        self.toast = Some(Toast::new(format!("Theme: {}", self.theme.name)));
    }

    fn zoom_by(&mut self, factor: f32) {
        let current = self.zoom.unwrap_or(self.last_scale);
        let next = (current * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.zoom = Some(next);
        self.toast = Some(Toast::new(format!("Zoom: {:.0}%", next * 100.0)));
    }

    fn zoom_to_fit(&mut self) {
        self.zoom = None;
        self.toast = Some(Toast::new("Zoom: fit".to_string()));
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        let mut picked_start = None;
        let mut picked_end = None;
        let mut submit = false;
        let mut reset = false;
        let mut retry = false;

        ui.horizontal_wrapped(|ui| {
            let directory = self.form.directory();
            let state = self.form.state();

            picked_start = building_combo(
                ui,
                "Start",
                state.start.as_deref(),
                state.start_text(directory),
                directory,
            );
            picked_end = building_combo(
                ui,
                "End",
                state.end.as_deref(),
                state.end_text(directory),
                directory,
            );

            submit = ui
                .add_enabled(!directory.is_loading(), egui::Button::new("Submit"))
                .clicked();
            reset = ui.button("Reset").clicked();

            if state.is_pending() {
                ui.spinner();
            }

            match directory.status() {
                DirectoryStatus::Loading => {
                    ui.spinner();
                    ui.label("Loading buildings\u{2026}");
                }
                DirectoryStatus::Failed(message) => {
                    ui.colored_label(
                        self.theme.error,
                        format!("Buildings unavailable: {message}"),
                    );
                    retry = ui.button("Retry").clicked();
                }
                DirectoryStatus::Ready => {}
            }

            if let Some(notice) = &state.notice {
                ui.colored_label(self.theme.error, notice.as_str());
            }
        });

        if let Some(id) = picked_start {
            self.form.set_start(id);
        }
        if let Some(id) = picked_end {
            self.form.set_end(id);
        }
        if submit {
            self.submit();
        }
        if reset {
            self.reset();
        }
        if retry {
            self.retry_buildings();
        }
    }

    fn draw_directions(&self, ui: &mut egui::Ui) {
        ui.label(
            egui::RichText::new("Directions")
                .size(self.theme.heading_size)
                .color(self.theme.heading_color),
        );
        ui.separator();

        let Some(itinerary) = self.form.itinerary() else {
            ui.label("Pick a start and end building, then Submit.");
            return;
        };
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.label(egui::RichText::new(&itinerary.title).strong());
            for step in &itinerary.steps {
                ui.label(step.as_str());
            }
            if let Some(total) = itinerary.total_line() {
                ui.add_space(8.0);
                ui.label(egui::RichText::new(total).color(self.theme.accent));
            }
        });
    }

    fn draw_map(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let map_size = self.base_map.size_vec2();
        let scale = self
            .zoom
            .unwrap_or_else(|| fit_scale(map_size, ui.available_size()));
        self.last_scale = scale;

        let texture = self.base_map.texture(ctx).cloned();
        let background = self.theme.map_background;
        let route = self.form.route();
        let renderer = self.renderer;

        egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let (rect, _response) =
                    ui.allocate_exact_size(map_size * scale, egui::Sense::hover());
                let painter = ui.painter_at(rect);
                let mut canvas =
                    PainterCanvas::new(&painter, rect.min, scale, map_size, background)
                        .with_texture(texture.as_ref());
                renderer.redraw(&mut canvas, route);
            });
    }

    fn draw_toast(&self, ui: &egui::Ui, ctx: &egui::Context, rect: egui::Rect) {
        let Some(toast) = &self.toast else { return };
        let opacity = toast.opacity();
        if opacity <= 0.0 {
            return;
        }
        let toast_color = Theme::with_opacity(self.theme.foreground, opacity * 0.9);
        let toast_bg = Theme::with_opacity(self.theme.panel_background, opacity * 0.9);
        let galley = ui.painter().layout_no_wrap(
            toast.message.clone(),
            egui::FontId::proportional(self.theme.body_size),
            toast_color,
        );
        let padding = 12.0;
        let toast_rect = egui::Rect::from_min_size(
            egui::pos2(
                rect.center().x - galley.rect.width() / 2.0 - padding,
                rect.bottom() - 60.0,
            ),
            egui::vec2(
                galley.rect.width() + padding * 2.0,
                galley.rect.height() + padding * 2.0,
            ),
        );
        ui.painter().rect_filled(toast_rect, 8.0, toast_bg);
        let text_pos = egui::pos2(toast_rect.left() + padding, toast_rect.top() + padding);
        ui.painter().galley(text_pos, galley, toast_color);
        ctx.request_repaint();
    }
}

impl eframe::App for CampusMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for event in self.fetcher.poll() {
            self.form.apply(event);
        }

        // Collect viewport commands to send AFTER the input closure
        // (sending inside ctx.input() causes RwLock deadlock)
        let mut viewport_cmds: Vec<egui::ViewportCommand> = Vec::new();
        let mut toggle_theme = false;
        let mut zoom: Option<f32> = None;
        let mut fit = false;
        let mut submit = false;
        let mut reset = false;
        // Read before this frame's widgets run, so a dropdown closed by Escape still counts
        let widget_active = ctx.memory(|m| m.any_popup_open()) || ctx.wants_keyboard_input();

        ctx.input(|i| {
            if i.key_pressed(egui::Key::Q) {
                viewport_cmds.push(egui::ViewportCommand::Close);
                return;
            }
            if i.key_pressed(egui::Key::F) {
                viewport_cmds.push(egui::ViewportCommand::Fullscreen(
                    !i.viewport().fullscreen.unwrap_or(false),
                ));
            }
            if i.key_pressed(egui::Key::D) {
                toggle_theme = true;
            }
            if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
                zoom = Some(ZOOM_STEP);
            }
            if i.key_pressed(egui::Key::Minus) {
                zoom = Some(1.0 / ZOOM_STEP);
            }
            if i.key_pressed(egui::Key::Num0) {
                fit = true;
            }
            submit = form_key(i, egui::Key::Enter, widget_active);
            reset = form_key(i, egui::Key::Escape, widget_active);
            if i.key_pressed(egui::Key::H) {
                self.show_directions = !self.show_directions;
            }
        });

        for cmd in viewport_cmds {
            ctx.send_viewport_cmd(cmd);
        }
        if toggle_theme {
            self.toggle_theme(ctx);
        }
        if let Some(factor) = zoom {
            self.zoom_by(factor);
        }
        if fit {
            self.zoom_to_fit();
        }
        if submit {
            self.submit();
        }
        if reset {
            self.reset();
        }

        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }

        egui::TopBottomPanel::top("route-form")
            .frame(
                egui::Frame::new()
                    .fill(self.theme.panel_background)
                    .inner_margin(10.0),
            )
            .show(ctx, |ui| self.draw_controls(ui));

        if self.show_directions {
            egui::SidePanel::right("directions")
                .resizable(true)
                .default_width(300.0)
                .frame(
                    egui::Frame::new()
                        .fill(self.theme.panel_background)
                        .inner_margin(10.0),
                )
                .show(ctx, |ui| self.draw_directions(ui));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(self.theme.background).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                self.draw_map(ui, ctx);
                self.draw_toast(ui, ctx, rect);
            });
    }
}

/// Enter and Escape go to an open dropdown or focused widget before the form.
fn form_key(input: &egui::InputState, key: egui::Key, widget_active: bool) -> bool {
    !widget_active && input.key_pressed(key)
}

/// A dropdown over the directory. Returns the newly picked short name, if any.
fn building_combo(
    ui: &mut egui::Ui,
    label: &str,
    current: Option<&str>,
    selected_text: &str,
    directory: &BuildingDirectory,
) -> Option<String> {
    let mut choice = current.map(str::to_string);
    egui::ComboBox::from_label(label)
        .selected_text(selected_text)
        .width(COMBO_WIDTH)
        .show_ui(ui, |ui| {
            for (value, text) in directory.options() {
                ui.selectable_value(&mut choice, Some(value.to_string()), text);
            }
        });
    match choice {
        Some(id) if Some(id.as_str()) != current => Some(id),
        _ => None,
    }
}

pub fn run(settings: Settings, windowed: bool) -> anyhow::Result<()> {
    let api = HttpApi::new(&settings.server, settings.timeout)?;
    tracing::info!(server = %api.server(), "using routing service");
    let fetcher = Fetcher::new(Arc::new(api))?;
    let base_map = BaseMap::load_or_blank(settings.map_image.as_deref(), settings.map_size);
    tracing::debug!(
        image = ?base_map.source(),
        size = ?base_map.size(),
        "base map ready"
    );
    let theme = Theme::from_name(&settings.theme);

    let title = "Campus Paths";
    let viewport = if windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_title(title)
    } else {
        egui::ViewportBuilder::default()
            .with_maximized(true)
            .with_title(title)
    };

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        title,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(theme.visuals());
            let ctx = cc.egui_ctx.clone();
            let fetcher = fetcher.with_waker(move || ctx.request_repaint());
            Ok(Box::new(CampusMapApp::new(fetcher, base_map, theme)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
