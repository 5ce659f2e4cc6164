//! TMDB Catalog - Rust Edition
//! Browse the top rated shows and movies of a TMDB catalog database

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use eframe::egui;
use std::path::Path;
use std::sync::Arc;

mod config;
mod database;
mod error;
mod filter;
mod models;
mod navigation;
mod posters;
mod views;

use config::*;
use database::{CatalogWorker, DataAccess, FetchOutcome, Query, SqliteStore, TableNames};
use error::CatalogError;
use models::*;
use navigation::{reduce, NavAction, NavState};
use posters::PosterCache;
use views::{ListView, UiEvent};

/// Get current time as HH:MM:SS (local)
fn timestamp_now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Application icon: a poster with a star on a blue-green gradient
fn load_icon() -> egui::IconData {
    let size: usize = 64;
    let mut rgba = vec![0u8; size * size * 4];

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let nx = x as f32 / size as f32;
            let ny = y as f32 / size as f32;

            // Rounded corners
            let corner = 0.125;
            let dx = if nx < corner { corner - nx } else if nx > 1.0 - corner { nx - (1.0 - corner) } else { 0.0 };
            let dy = if ny < corner { corner - ny } else if ny > 1.0 - corner { ny - (1.0 - corner) } else { 0.0 };
            if dx * dx + dy * dy > corner * corner {
                continue;
            }

            // Gradient #01b4e4 -> #90cea1
            let t = nx * 0.5 + ny * 0.5;
            let mut px = [
                (1.0 + (144.0 - 1.0) * t) as u8,
                (180.0 + (206.0 - 180.0) * t) as u8,
                (228.0 + (161.0 - 228.0) * t) as u8,
                255,
            ];

            let in_poster = (0.25..=0.75).contains(&nx) && (0.15..=0.85).contains(&ny);
            let in_frame = in_poster && !((0.30..=0.70).contains(&nx) && (0.20..=0.80).contains(&ny));
            // Five-point star approximated by a diamond plus a bar
            let sx = (nx - 0.5).abs();
            let sy = ny - 0.48;
            let in_star = (sx + sy.abs() * 0.8 < 0.10) || (sx < 0.14 && sy.abs() < 0.025);

            if in_frame {
                px = [255, 255, 255, 255];
            } else if in_poster && in_star {
                px = [255, 200, 40, 255];
            } else if in_poster {
                px = [13, 37, 63, 255];
            }

            rgba[idx..idx + 4].copy_from_slice(&px);
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}

#[cfg(target_os = "windows")]
const EMOJI_FONTS: &[&str] = &["C:\\Windows\\Fonts\\seguiemj.ttf"];
#[cfg(target_os = "linux")]
const EMOJI_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf",
    "/usr/share/fonts/noto-emoji/NotoColorEmoji.ttf",
    "/usr/share/fonts/google-noto-emoji/NotoColorEmoji.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
];
#[cfg(target_os = "macos")]
const EMOJI_FONTS: &[&str] = &["/System/Library/Fonts/Apple Color Emoji.ttc"];
#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
const EMOJI_FONTS: &[&str] = &[];

/// Add the first system emoji font found as a proportional fallback
fn install_emoji_font(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    if let Some((path, font_data)) = EMOJI_FONTS
        .iter()
        .find_map(|path| std::fs::read(path).ok().map(|data| (path, data)))
    {
        log::debug!("Using emoji font {}", path);
        fonts.font_data.insert(
            "emoji".to_owned(),
            egui::FontData::from_owned(font_data).into(),
        );
        fonts.families
            .entry(egui::FontFamily::Proportional)
            .or_default()
            .push("emoji".to_owned());
    }

    ctx.set_fonts(fonts);
}

fn apply_font_size(ctx: &egui::Context, size: u32) {
    let size = size.clamp(8, 32) as f32;
    ctx.style_mut(|style| {
        for text_style in [egui::TextStyle::Body, egui::TextStyle::Button] {
            if let Some(font) = style.text_styles.get_mut(&text_style) {
                font.size = size;
            }
        }
    });
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("TMDB Catalog v{} starting", env!("CARGO_PKG_VERSION"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1250.0, 800.0])
            .with_min_inner_size([800.0, 550.0])
            .with_icon(load_icon()),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "TMDB Catalog - Rust Edition",
        options,
        Box::new(|cc| {
            install_emoji_font(&cc.egui_ctx);
            Ok(Box::new(CatalogApp::new(&cc.egui_ctx)))
        }),
    )
}

struct CatalogApp {
    config: AppConfig,

    // Session state
    nav: NavState,
    draft: FilterCriteria,
    shows: ListView,
    movies: ListView,
    posters: PosterCache,
    cached_queries: usize,

    // Background fetches
    worker: Option<CatalogWorker>,
    egui_ctx: egui::Context,

    status_message: String,

    // Console log
    console_log: Vec<String>,
    show_console: bool,
}

impl CatalogApp {
    fn new(ctx: &egui::Context) -> Self {
        let config = AppConfig::load();

        if config.dark_mode {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }
        apply_font_size(ctx, config.font_size);

        let mut app = Self {
            config,
            nav: NavState::default(),
            draft: FilterCriteria::default(),
            shows: ListView::default(),
            movies: ListView::default(),
            posters: PosterCache::new(),
            cached_queries: 0,
            worker: None,
            egui_ctx: ctx.clone(),
            status_message: String::new(),
            console_log: Vec::new(),
            show_console: false,
        };
        app.connect_catalog();
        app
    }

    fn log(&mut self, message: &str) {
        if message.starts_with("[ERROR]") {
            log::error!("{}", message);
        } else if message.starts_with("[WARN]") {
            log::warn!("{}", message);
        } else {
            log::info!("{}", message);
        }

        self.console_log.push(format!("[{}] {}", timestamp_now(), message));
        // Keep last 500 lines
        if self.console_log.len() > 500 {
            self.console_log.remove(0);
        }
    }

    /// (Re)start the catalog worker for the configured database. Starts a fresh query cache.
    fn connect_catalog(&mut self) {
        self.worker = None;
        self.shows = ListView::default();
        self.movies = ListView::default();
        self.cached_queries = 0;

        if self.config.database_path.trim().is_empty() {
            self.status_message = "No database selected - use 📂 Open database".to_string();
            self.log("[WARN] No database configured");
            return;
        }

        let tables = match TableNames::new(&self.config.shows_table, &self.config.movies_table) {
            Ok(tables) => tables,
            Err(e) => {
                self.status_message = format!("Configuration error: {}", e);
                self.log(&format!("[ERROR] {}", e));
                return;
            }
        };

        let path = self.config.database_path.clone();
        let store = SqliteStore::new(Path::new(&path), tables);
        let access = DataAccess::new(Arc::new(store), self.config.query_timeout());

        let ctx = self.egui_ctx.clone();
        self.worker = Some(CatalogWorker::spawn(access, move || ctx.request_repaint()));

        self.status_message = format!("Database: {}", path);
        self.log(&format!("[INFO] Using catalog database {}", path));
    }

    fn list_view_mut(&mut self, table: TableKind) -> &mut ListView {
        match table {
            TableKind::Shows => &mut self.shows,
            TableKind::Movies => &mut self.movies,
        }
    }

    /// Fetch (memoized by the worker) then filter with the current criteria
    fn request_table(&mut self, table: TableKind) {
        self.list_view_mut(table).begin_fetch();
        self.status_message = format!("Loading {}...", table.label().to_lowercase());

        let queued = self.worker.as_ref().is_some_and(|w| w.request(Query::new(table)));
        if !queued {
            // Same path as a failed fetch: notice + previous results kept
            let outcome = FetchOutcome {
                query: Query::new(table),
                items: Arc::new(Vec::new()),
                notice: Some(CatalogError::DataUnavailable("no database connected".to_string())),
                from_cache: false,
                cached_queries: self.cached_queries,
            };
            self.on_fetch(outcome);
        }
    }

    fn on_fetch(&mut self, outcome: FetchOutcome) {
        let table = outcome.query.table;
        let criteria = self.nav.criteria_for(table);
        self.cached_queries = outcome.cached_queries;
        self.list_view_mut(table).absorb(&outcome, &criteria);

        match &outcome.notice {
            Some(e) => {
                self.status_message = format!("{} unavailable", table.label());
                self.log(&format!("[WARN] {}: {}", table.label(), e));
            }
            None => {
                let shown = self.list_view_mut(table).results.len();
                self.status_message = format!(
                    "{}: {} of {} rows{}",
                    table.label(),
                    shown,
                    outcome.items.len(),
                    if outcome.from_cache { " (cached)" } else { "" }
                );
                if !outcome.from_cache {
                    self.log(&format!("[INFO] Loaded {} {} rows", outcome.items.len(), table.label().to_lowercase()));
                }
            }
        }
    }

    fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::Nav(action) => {
                let entering_list = matches!(action, NavAction::SelectSeries | NavAction::SelectMovies);
                let before = self.nav.screen;
                self.nav = reduce(std::mem::take(&mut self.nav), action);

                if self.nav.screen != before {
                    self.log(&format!("[INFO] {:?} -> {:?}", before, self.nav.screen));
                }
                if entering_list {
                    self.draft = self.nav.last_criteria.clone();
                    if let Some(table) = self.nav.screen.table() {
                        self.request_table(table);
                    }
                }
            }
            UiEvent::Search(criteria) => {
                self.nav = reduce(std::mem::take(&mut self.nav), NavAction::ApplyCriteria(criteria));
                if let Some(table) = self.nav.screen.table() {
                    self.request_table(table);
                }
            }
        }
    }

    fn open_database(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Select Catalog Database")
            .add_filter("SQLite", &["db", "sqlite", "sqlite3"])
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.config.database_path = path.display().to_string();
            self.config.save();
            self.connect_catalog();
            if let Some(table) = self.nav.active_table() {
                self.request_table(table);
            }
        }
    }

    /// Kick off poster downloads for whatever the current screen shows
    fn prefetch_posters(&mut self, ctx: &egui::Context) {
        match self.nav.screen {
            Screen::SeriesList => self.posters.prefetch(ctx, self.shows.poster_urls()),
            Screen::MoviesList => self.posters.prefetch(ctx, self.movies.poster_urls()),
            Screen::Detail => {
                if let Some(item) = &self.nav.selected_item {
                    let urls: Vec<String> = views::detail_urls(item).collect();
                    self.posters.prefetch(ctx, urls.iter().map(String::as_str));
                }
            }
            Screen::Home => {}
        }
    }
}

impl eframe::App for CatalogApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process background results (non-blocking)
        let outcomes = self.worker.as_ref().map(CatalogWorker::poll).unwrap_or_default();
        for outcome in outcomes {
            self.on_fetch(outcome);
        }
        for (url, e) in self.posters.poll(ctx) {
            self.log(&format!("[WARN] Poster {}: {}", url, e));
        }
        self.prefetch_posters(ctx);

        let mut events: Vec<UiEvent> = Vec::new();
        let mut open_db = false;

        // Top panel - Controls
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                if ui.button("🏠 Home").clicked() {
                    events.push(UiEvent::Nav(NavAction::Home));
                }
                let crumb = match self.nav.screen {
                    Screen::Home => "Home".to_string(),
                    Screen::SeriesList => "Home › TV Shows".to_string(),
                    Screen::MoviesList => "Home › Movies".to_string(),
                    Screen::Detail => format!(
                        "Home › {} › {}",
                        self.nav.active_table().map(|t| t.label()).unwrap_or("?"),
                        self.nav.selected_item.as_ref().map(|i| i.display_name()).unwrap_or("Nothing selected")
                    ),
                };
                ui.label(egui::RichText::new(crumb).strong());

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.selectable_label(self.show_console, "🖥 Console").clicked() {
                        self.show_console = !self.show_console;
                    }
                    if ui.checkbox(&mut self.config.dark_mode, "🌙 Dark").changed() {
                        if self.config.dark_mode {
                            ctx.set_visuals(egui::Visuals::dark());
                        } else {
                            ctx.set_visuals(egui::Visuals::light());
                        }
                        self.config.save();
                    }
                    if ui.button("📂 Open database").clicked() {
                        open_db = true;
                    }
                });
            });
            ui.add_space(5.0);
        });

        // Bottom panel - Status
        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.shows.is_loading() || self.movies.is_loading() || self.posters.is_loading() {
                    ui.spinner();
                }
                ui.label(&self.status_message);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(format!("{} cached queries", self.cached_queries)).weak());
                });
            });
        });

        // Main content
        egui::CentralPanel::default().show(ctx, |ui| {
            let cols = self.config.cards_per_row();
            match self.nav.screen {
                Screen::Home => events.extend(views::show_home(ui)),
                Screen::SeriesList | Screen::MoviesList => {
                    let table = self.nav.screen.table().unwrap_or(TableKind::Shows);
                    ui.heading(match table {
                        TableKind::Shows => "📺 Top 10 TV Shows",
                        TableKind::Movies => "🎬 Top 10 Movies",
                    });
                    events.extend(views::show_filter_form(ui, &mut self.draft, table));
                    ui.separator();

                    let list = match table {
                        TableKind::Shows => &self.shows,
                        TableKind::Movies => &self.movies,
                    };
                    views::show_notice(ui, list, &self.nav.criteria_for(table));
                    egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                        events.extend(views::show_ranked_grid(ui, &list.results, &self.posters, cols));
                    });
                }
                Screen::Detail => {
                    events.extend(views::show_detail(ui, self.nav.selected_item.as_ref(), &self.posters));
                }
            }
        });

        // Console window
        let mut show_console = self.show_console;
        egui::Window::new("🖥 Console Log")
            .open(&mut show_console)
            .default_size([640.0, 320.0])
            .show(ctx, |ui| {
                if ui.button("🗑 Clear").clicked() {
                    self.console_log.clear();
                    self.console_log.push(format!("[{}] Console cleared", timestamp_now()));
                }
                ui.separator();
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in &self.console_log {
                            let color = if line.contains("[ERROR]") {
                                egui::Color32::RED
                            } else if line.contains("[WARN]") {
                                egui::Color32::YELLOW
                            } else if line.contains("[INFO]") {
                                egui::Color32::LIGHT_BLUE
                            } else {
                                egui::Color32::GRAY
                            };
                            ui.label(egui::RichText::new(line).monospace().color(color));
                        }
                    });
            });
        self.show_console = show_console;

        // State changes only after the frame is drawn; the next frame renders the new state
        if open_db {
            self.open_database();
        }
        for event in events {
            self.handle(event);
        }
    }
}
