//! World Cinema Map
//! Click a country on the world map to browse its top-rated movies

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

mod api;
mod catalog;
mod config;
mod logging;
mod map;
mod models;
mod presenter;
mod session;

use api::TmdbClient;
use catalog::LoadState;
use config::AppConfig;
use logging::{ConsoleLog, LogLevel};
use map::WorldMap;
use models::*;
use presenter::{ListStatus, MovieCard, SKELETON_ROWS};
use session::{Event, FetchRequest, Session};

/// Poster thumbnail size in the movie list
const POSTER_SIZE: egui::Vec2 = egui::vec2(60.0, 90.0);

/// Load application icon: a globe on the purple app gradient
fn load_icon() -> egui::IconData {
    let size: usize = 64;
    let mut rgba = vec![0u8; size * size * 4];

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;

            // Normalize coordinates to -1.0..1.0 around the centre
            let nx = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
            let ny = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;
            let r = (nx * nx + ny * ny).sqrt();

            if r > 0.95 {
                continue;
            }

            // Purple gradient (#667eea to #764ba2)
            let t = (nx + ny + 2.0) / 4.0;
            let mut pixel = [
                (102.0 + (118.0 - 102.0) * t) as u8,
                (126.0 + (75.0 - 126.0) * t) as u8,
                (234.0 + (162.0 - 234.0) * t) as u8,
            ];

            // Graticule: equator, two parallels, central meridian and two ellipses
            let on_parallel = [0.0f32, -0.5, 0.5].iter().any(|p| (ny - p).abs() < 0.04);
            let on_meridian = [0.0f32, 0.5].iter().any(|w| {
                if *w == 0.0 {
                    nx.abs() < 0.04
                } else {
                    let rim = (1.0 - ny * ny).max(0.0).sqrt() * w;
                    (nx.abs() - rim).abs() < 0.04
                }
            });
            let on_rim = r > 0.88;

            if on_parallel || on_meridian || on_rim {
                pixel = [255, 255, 255];
            }

            rgba[idx] = pixel[0];
            rgba[idx + 1] = pixel[1];
            rgba[idx + 2] = pixel[2];
            rgba[idx + 3] = 255;
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}

/// Background task messages
enum TaskResult {
    CountriesLoaded(Vec<CountryEntry>),
    CountriesFailed(String),
    GenresLoaded(Vec<Genre>),
    GenresFailed(String),
    AtlasLoaded(Box<WorldMap>),
    AtlasFailed(String),
    MoviesLoaded { generation: u64, page: MoviePage },
    MoviesFailed { generation: u64, error: String },
}

/// Everything a background fetch needs, cloned off the UI thread
struct FetchContext {
    config: AppConfig,
    sender: Sender<TaskResult>,
    repaint: egui::Context,
}

impl FetchContext {
    fn client(&self) -> TmdbClient {
        TmdbClient::new(&self.config)
    }

    fn send(&self, result: TaskResult) {
        let _ = self.sender.send(result);
        self.repaint.request_repaint();
    }
}

fn main() -> Result<(), eframe::Error> {
    let config = AppConfig::load();
    logging::init_tracing(&config.log_filter);

    let icon = load_icon();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([900.0, 500.0])
            .with_icon(icon),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "World Cinema Map",
        options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            if config.dark_mode {
                cc.egui_ctx.set_visuals(egui::Visuals::dark());
            } else {
                cc.egui_ctx.set_visuals(egui::Visuals::light());
            }
            Ok(Box::new(CineMapApp::new(config, cc.egui_ctx.clone())))
        }),
    )
}

struct CineMapApp {
    config: AppConfig,
    // Edited copy shown in the Settings tab
    settings_draft: AppConfig,

    current_tab: Tab,
    status_message: String,

    // Background task channel
    task_receiver: Receiver<TaskResult>,
    task_sender: Sender<TaskResult>,
    ctx: egui::Context,

    session: Session,
    world: Option<WorldMap>,
    atlas_state: LoadState,

    console: ConsoleLog,
}

impl CineMapApp {
    fn new(config: AppConfig, ctx: egui::Context) -> Self {
        let (task_sender, task_receiver) = channel();
        let session = Session::new(&config.image_base, config.min_vote_count);

        let mut app = Self {
            settings_draft: config.clone(),
            config,
            current_tab: Tab::Map,
            status_message: String::new(),
            task_receiver,
            task_sender,
            ctx,
            session,
            world: None,
            atlas_state: LoadState::Pending,
            console: ConsoleLog::new(),
        };

        if !app.config.has_api_key() {
            app.console.warn(&format!(
                "No API key configured - set {} or add one in Settings",
                config::API_KEY_ENV
            ));
        }
        app.load_reference_data();
        app
    }

    fn fetch_context(&self) -> FetchContext {
        FetchContext {
            config: self.config.clone(),
            sender: self.task_sender.clone(),
            repaint: self.ctx.clone(),
        }
    }

    /// Country list, genre list and world boundaries, each on its own thread
    fn load_reference_data(&mut self) {
        self.status_message = "Loading reference data...".to_string();
        self.console.info("Loading country list, genres and world atlas");

        let ctx = self.fetch_context();
        thread::spawn(move || match ctx.client().get_countries() {
            Ok(countries) => ctx.send(TaskResult::CountriesLoaded(countries)),
            Err(e) => ctx.send(TaskResult::CountriesFailed(e.to_string())),
        });

        let ctx = self.fetch_context();
        thread::spawn(move || match ctx.client().get_genres() {
            Ok(genres) => ctx.send(TaskResult::GenresLoaded(genres)),
            Err(e) => ctx.send(TaskResult::GenresFailed(e.to_string())),
        });

        if self.world.is_none() {
            self.atlas_state = LoadState::Pending;
            let ctx = self.fetch_context();
            thread::spawn(move || {
                let result = ctx
                    .client()
                    .get_atlas(&ctx.config.atlas_url)
                    .map_err(|e| e.to_string())
                    .and_then(|json| WorldMap::from_topojson(&json).map_err(|e| e.to_string()));
                match result {
                    Ok(world) => ctx.send(TaskResult::AtlasLoaded(Box::new(world))),
                    Err(e) => ctx.send(TaskResult::AtlasFailed(e)),
                }
            });
        }
    }

    fn fetch_movies(&mut self, request: FetchRequest) {
        let query = request.query;
        let genre = query
            .genre
            .and_then(|id| self.session.genres().name_of(id))
            .unwrap_or("all genres");
        self.console.info(&format!(
            "Fetching page {} for {} ({})",
            query.page, query.country, genre
        ));
        self.status_message = format!("Loading page {}...", query.page);

        let ctx = self.fetch_context();
        let generation = request.generation;
        thread::spawn(move || match ctx.client().discover_movies(&query) {
            Ok(page) => ctx.send(TaskResult::MoviesLoaded { generation, page }),
            Err(e) => ctx.send(TaskResult::MoviesFailed {
                generation,
                error: e.to_string(),
            }),
        });
    }

    /// Feed one event through the session and start whatever query it asks for
    fn dispatch(&mut self, event: Event) {
        let (session, request) = std::mem::take(&mut self.session).apply(event);
        self.session = session;
        if let Some(request) = request {
            self.fetch_movies(request);
        }
    }

    fn process_tasks(&mut self) {
        while let Ok(result) = self.task_receiver.try_recv() {
            match result {
                TaskResult::CountriesLoaded(countries) => {
                    self.console.info(&format!("Loaded {} countries", countries.len()));
                    self.dispatch(Event::CountriesLoaded(countries));
                }
                TaskResult::CountriesFailed(error) => {
                    self.console.error(&format!("Country list fetch failed: {}", error));
                    self.dispatch(Event::CountriesFailed(error));
                }
                TaskResult::GenresLoaded(genres) => {
                    self.console.info(&format!("Loaded {} genres", genres.len()));
                    self.dispatch(Event::GenresLoaded(genres));
                }
                TaskResult::GenresFailed(error) => {
                    self.console.error(&format!("Genre fetch failed: {}", error));
                    self.dispatch(Event::GenresFailed(error));
                }
                TaskResult::AtlasLoaded(world) => {
                    self.console.info(&format!("World atlas ready: {} countries", world.len()));
                    self.world = Some(*world);
                    self.atlas_state = LoadState::Ready;
                    self.status_message = "Click a country to list its movies".to_string();
                }
                TaskResult::AtlasFailed(error) => {
                    self.console.error(&format!("World atlas failed: {}", error));
                    self.atlas_state = LoadState::Failed(error);
                }
                TaskResult::MoviesLoaded { generation, page } => {
                    if generation == self.session.generation() {
                        self.console.info(&format!(
                            "Page {}/{}: {} movies ({} total)",
                            page.page,
                            page.total_pages,
                            page.results.len(),
                            page.total_results
                        ));
                        self.status_message = format!("{} movies", page.total_results);
                    }
                    self.dispatch(Event::PageLoaded {
                        generation,
                        page: page.page.max(1),
                        results: page.results,
                        total_pages: page.total_pages,
                    });
                }
                TaskResult::MoviesFailed { generation, error } => {
                    if generation == self.session.generation() {
                        self.console.error(&format!("Movie fetch failed: {}", error));
                        self.status_message = format!("Error: {}", error);
                    }
                    self.dispatch(Event::QueryFailed { generation, error });
                }
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.session.is_loading()
            || self.atlas_state == LoadState::Pending
            || *self.session.resolver().state() == LoadState::Pending
            || *self.session.genres().state() == LoadState::Pending
    }

    fn show_sidebar(&mut self, ui: &mut egui::Ui) {
        let panel = self.session.panel().clone();
        ui.add_space(8.0);
        ui.heading(panel.name().unwrap_or("World Cinema Map"));
        let meta_color = match &panel {
            session::CountryPanel::NotFound { .. } | session::CountryPanel::Unavailable { .. } => {
                egui::Color32::YELLOW
            }
            _ => egui::Color32::GRAY,
        };
        ui.label(egui::RichText::new(panel.meta()).color(meta_color));
        ui.add_space(6.0);

        self.show_genre_filters(ui);
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.show_movie_list(ui);
                ui.add_space(8.0);
                self.show_pager(ui);
            });
    }

    fn show_genre_filters(&mut self, ui: &mut egui::Ui) {
        let mut toggled: Option<GenreId> = None;
        let genres = self.session.genres();

        match genres.state() {
            LoadState::Pending => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading genres...");
                });
            }
            LoadState::Failed(_) => {
                ui.label(egui::RichText::new("Genres unavailable").weak());
            }
            LoadState::Ready => {
                let active = genres.active();
                ui.horizontal_wrapped(|ui| {
                    for genre in genres.genres() {
                        let text = egui::RichText::new(genre.name.to_uppercase()).size(11.0).strong();
                        if ui.selectable_label(active == Some(genre.id), text).clicked() {
                            toggled = Some(genre.id);
                        }
                    }
                });
            }
        }

        if let Some(id) = toggled {
            self.dispatch(Event::GenreToggled { id });
        }
    }

    fn show_movie_list(&mut self, ui: &mut egui::Ui) {
        let list = self.session.list();
        let mut retry = false;

        match list.status() {
            ListStatus::Idle => {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("Select a country to see its best-rated movies").weak());
                });
            }
            ListStatus::Loading => {
                for _ in 0..SKELETON_ROWS {
                    show_skeleton(ui);
                }
            }
            ListStatus::NoResults => {
                ui.add_space(30.0);
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("No movies found.").weak());
                });
            }
            ListStatus::Ready | ListStatus::Failed(_) => {
                for card in list.cards() {
                    show_card(ui, card);
                }
            }
        }

        if let ListStatus::Failed(error) = list.status() {
            ui.add_space(10.0);
            ui.colored_label(egui::Color32::RED, format!("Could not load movies: {}", error));
            if ui
                .add_enabled(self.session.can_retry(), egui::Button::new("⟳ Retry"))
                .clicked()
            {
                retry = true;
            }
        }

        if retry {
            self.dispatch(Event::Retry);
        }
    }

    fn show_pager(&mut self, ui: &mut egui::Ui) {
        let loading_more = self.session.is_loading() && self.session.selection().page() > 1;
        if loading_more {
            ui.vertical_centered(|ui| {
                ui.spinner();
            });
            return;
        }

        if !self.session.pager_enabled() {
            return;
        }

        let mut advance = false;
        ui.vertical_centered(|ui| {
            let label = format!(
                "Load more ({}/{})",
                self.session.selection().page(),
                self.session.selection().total_pages()
            );
            if ui.button(label).clicked() {
                advance = true;
            }
        });

        if advance {
            self.dispatch(Event::PageAdvanced);
        }
    }

    fn show_map(&mut self, ui: &mut egui::Ui) {
        if let Some(world) = self.world.as_mut() {
            if let Some(name) = world.show(ui) {
                self.console.info(&format!("Selected {}", name));
                self.dispatch(Event::CountrySelected { name });
                if let Some(code) = self.session.selection().country() {
                    self.status_message = format!("{} selected", code);
                } else {
                    self.console.warn(&self.session.panel().meta());
                }
            }
            return;
        }

        let mut reload = false;
        ui.vertical_centered(|ui| {
            ui.add_space(100.0);
            match &self.atlas_state {
                LoadState::Failed(error) => {
                    ui.colored_label(egui::Color32::RED, format!("World map unavailable: {}", error));
                    ui.add_space(10.0);
                    reload = ui.button("⟳ Reload").clicked();
                }
                _ => {
                    ui.spinner();
                    ui.label("Loading world map...");
                }
            }
        });

        if reload {
            self.load_reference_data();
        }
    }

    fn show_settings_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.separator();

        egui::Grid::new("settings_grid")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("API key:");
                ui.add(egui::TextEdit::singleline(&mut self.settings_draft.api_key).password(true));
                ui.end_row();

                ui.label("API base URL:");
                ui.text_edit_singleline(&mut self.settings_draft.api_base);
                ui.end_row();

                ui.label("Image base URL:");
                ui.text_edit_singleline(&mut self.settings_draft.image_base);
                ui.end_row();

                ui.label("World atlas URL:");
                ui.text_edit_singleline(&mut self.settings_draft.atlas_url);
                ui.end_row();

                ui.label("Minimum votes:");
                ui.add(egui::DragValue::new(&mut self.settings_draft.min_vote_count).range(0..=100_000));
                ui.end_row();

                ui.label("Request timeout (s):");
                ui.add(egui::DragValue::new(&mut self.settings_draft.request_timeout_secs).range(1..=300));
                ui.end_row();

                ui.label("Dark mode:");
                ui.checkbox(&mut self.settings_draft.dark_mode, "");
                ui.end_row();
            });

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui.button("💾 Save").clicked() {
                self.apply_settings(ui.ctx());
            }
            if ui.button("Revert").clicked() {
                self.settings_draft = self.config.clone();
            }
            if ui.button("⟳ Reload data").clicked() {
                self.load_reference_data();
            }
        });
    }

    fn apply_settings(&mut self, ctx: &egui::Context) {
        let atlas_changed = self.settings_draft.atlas_url != self.config.atlas_url;
        self.config = self.settings_draft.clone();
        self.config.save();

        ctx.set_visuals(if self.config.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
        self.session.set_min_vote_count(self.config.min_vote_count);
        self.session.set_image_base(&self.config.image_base);
        if atlas_changed {
            self.world = None;
        }

        self.console.info("Settings saved");
        self.load_reference_data();
    }

    fn show_console_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Console Log");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🗑 Clear").clicked() {
                    self.console.clear();
                }
            });
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for (level, line) in self.console.lines() {
                    let color = match level {
                        LogLevel::Error => egui::Color32::RED,
                        LogLevel::Warn => egui::Color32::YELLOW,
                        LogLevel::Info => egui::Color32::LIGHT_BLUE,
                    };
                    ui.label(egui::RichText::new(line).monospace().color(color));
                }
            });
    }
}

fn show_card(ui: &mut egui::Ui, card: &MovieCard) {
    ui.horizontal(|ui| {
        if let Some(url) = &card.poster_url {
            ui.add(
                egui::Image::new(url.as_str())
                    .fit_to_exact_size(POSTER_SIZE)
                    .corner_radius(4.0),
            );
        }
        ui.vertical(|ui| {
            ui.label(egui::RichText::new(&card.title).strong());
            ui.label(egui::RichText::new(format!("★ {}", card.rating)).color(egui::Color32::GOLD));
            ui.label(egui::RichText::new(&card.year).small().weak());
        });
    });
    ui.add_space(6.0);
}

fn show_skeleton(ui: &mut egui::Ui) {
    let fill = ui.visuals().faint_bg_color;
    ui.horizontal(|ui| {
        let (poster, _) = ui.allocate_exact_size(POSTER_SIZE, egui::Sense::hover());
        ui.painter().rect_filled(poster, 4.0, fill);
        ui.vertical(|ui| {
            let (line, _) = ui.allocate_exact_size(egui::vec2(180.0, 12.0), egui::Sense::hover());
            ui.painter().rect_filled(line, 3.0, fill);
            ui.add_space(6.0);
            let (line, _) = ui.allocate_exact_size(egui::vec2(108.0, 12.0), egui::Sense::hover());
            ui.painter().rect_filled(line, 3.0, fill);
        });
    });
    ui.add_space(6.0);
}

impl eframe::App for CineMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process background task results (non-blocking)
        self.process_tasks();

        // Top panel - tabs
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.heading("🌍 World Cinema Map");
                ui.add_space(20.0);
                ui.selectable_value(&mut self.current_tab, Tab::Map, "Map");
                ui.selectable_value(&mut self.current_tab, Tab::Settings, "Settings");
                ui.selectable_value(&mut self.current_tab, Tab::Console, "Console");
            });
            ui.add_space(5.0);
        });

        // Bottom panel - Status
        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.is_busy() {
                    ui.spinner();
                }
                ui.label(&self.status_message);
            });
        });

        match self.current_tab {
            Tab::Map => {
                egui::SidePanel::right("movie_panel")
                    .resizable(true)
                    .default_width(380.0)
                    .min_width(300.0)
                    .show(ctx, |ui| self.show_sidebar(ui));
                egui::CentralPanel::default().show(ctx, |ui| self.show_map(ui));
            }
            Tab::Settings => {
                egui::CentralPanel::default().show(ctx, |ui| self.show_settings_tab(ui));
            }
            Tab::Console => {
                egui::CentralPanel::default().show(ctx, |ui| self.show_console_tab(ui));
            }
        }

        // Request repaint while loading
        if self.is_busy() {
            ctx.request_repaint();
        }
    }
}
