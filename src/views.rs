//! Screen rendering
//!
//! Views read state and return the user's choice as a `UiEvent`; they never
//! mutate navigation or results themselves.

use eframe::egui;

use crate::database::FetchOutcome;
use crate::filter::{apply_filters, image_url};
use crate::models::{CatalogItem, FilterCriteria, FilterField, RankedItem, RankedResult, TableKind};
use crate::navigation::NavAction;
use crate::posters::{PosterCache, PosterState};

/// What the user asked for during a frame
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Nav(NavAction),
    Search(FilterCriteria),
}

/// Why a list has nothing (or stale things) to show
#[derive(Debug, Clone, PartialEq)]
pub enum ListNotice {
    NoResults,
    DataUnavailable(String),
}

/// Ranked results for one list screen
#[derive(Debug, Default)]
pub struct ListView {
    pub results: RankedResult,
    pub notice: Option<ListNotice>,
    pending: usize,
}

impl ListView {
    pub fn begin_fetch(&mut self) {
        self.pending += 1;
    }

    /// True until every requested fetch has been absorbed
    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    /// Fold a fetch into the view. On failure the previous results stay on screen.
    pub fn absorb(&mut self, outcome: &FetchOutcome, criteria: &FilterCriteria) {
        self.pending = self.pending.saturating_sub(1);
        match &outcome.notice {
            Some(err) => {
                self.notice = Some(ListNotice::DataUnavailable(err.to_string()));
            }
            None => {
                let criteria = criteria.for_table(outcome.query.table);
                self.results = apply_filters(&outcome.items, &criteria);
                self.notice = self.results.is_empty().then_some(ListNotice::NoResults);
            }
        }
    }

    /// Whether to prompt for a search: nothing to report and no filter set yet
    pub fn wants_prompt(&self, criteria: &FilterCriteria) -> bool {
        self.notice.is_none() && !self.is_loading() && criteria.is_empty()
    }

    /// Poster URLs the grid will want
    pub fn poster_urls(&self) -> impl Iterator<Item = &str> {
        self.results.iter().filter_map(|r| r.image_url.as_deref())
    }
}

const PLACEHOLDER: egui::Color32 = egui::Color32::from_rgb(40, 40, 60);

pub fn show_home(ui: &mut egui::Ui) -> Option<UiEvent> {
    let mut event = None;
    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.heading("🎬 TMDB Catalog");
        ui.add_space(10.0);
        ui.label("Browse the top 10 shows and movies by genre, title, overview or network.");
        ui.add_space(30.0);

        if ui.add_sized([220.0, 40.0], egui::Button::new("📺 TV SHOWS")).clicked() {
            event = Some(UiEvent::Nav(NavAction::SelectSeries));
        }
        ui.add_space(10.0);
        if ui.add_sized([220.0, 40.0], egui::Button::new("🎬 MOVIES")).clicked() {
            event = Some(UiEvent::Nav(NavAction::SelectMovies));
        }
    });
    event
}

/// Search inputs. Enter in any field or the Search button submits.
pub fn show_filter_form(ui: &mut egui::Ui, draft: &mut FilterCriteria, table: TableKind) -> Option<UiEvent> {
    let mut submit = false;

    ui.horizontal_wrapped(|ui| {
        for field in FilterField::ALL {
            if !field.applies_to(table) {
                continue;
            }
            ui.label(format!("{}:", field.label()));
            let text = draft.patterns.entry(field).or_default();
            let response = ui.add(egui::TextEdit::singleline(text).desired_width(140.0));
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }
        }

        if table == TableKind::Movies {
            ui.checkbox(&mut draft.exclude_adult, "🔞 Exclude adult");
        }

        if ui.button("🔍 Search").clicked() {
            submit = true;
        }
        if ui.button("✖ Clear").clicked() {
            *draft = FilterCriteria::default();
            submit = true;
        }
    });

    submit.then(|| UiEvent::Search(draft.clone()))
}

pub fn show_notice(ui: &mut egui::Ui, list: &ListView, criteria: &FilterCriteria) {
    match &list.notice {
        Some(ListNotice::DataUnavailable(msg)) => {
            ui.colored_label(egui::Color32::YELLOW, format!("⚠ Data unavailable: {}", msg));
            if !list.results.is_empty() {
                ui.label(egui::RichText::new("Showing the last results that loaded.").weak());
            }
        }
        Some(ListNotice::NoResults) => {
            ui.colored_label(egui::Color32::LIGHT_BLUE, "ℹ No results found for these filters.");
        }
        None if list.wants_prompt(criteria) => {
            ui.label(egui::RichText::new("Enter a genre to search the Top 10.").weak());
        }
        None => {}
    }
}

/// Top-10 cards in a fixed-column grid
pub fn show_ranked_grid(
    ui: &mut egui::Ui,
    results: &RankedResult,
    posters: &PosterCache,
    cols: usize,
) -> Option<UiEvent> {
    if results.is_empty() {
        return None;
    }

    let spacing = 12.0;
    let cols = cols.max(1);
    let card_width = ((ui.available_width() - spacing * (cols as f32 - 1.0)) / cols as f32).max(80.0);
    let mut event = None;

    ui.label(egui::RichText::new(format!("Top {}", results.len())).strong().size(16.0));
    ui.add_space(6.0);

    egui::Grid::new("ranked_grid")
        .num_columns(cols)
        .spacing([spacing, spacing])
        .show(ui, |ui| {
            for (idx, ranked) in results.iter().enumerate() {
                ui.vertical(|ui| {
                    ui.set_width(card_width);
                    if show_card(ui, ranked, posters, card_width) {
                        event = Some(UiEvent::Nav(NavAction::PickItem(ranked.item.clone())));
                    }
                });
                if (idx + 1) % cols == 0 {
                    ui.end_row();
                }
            }
        });

    event
}

fn card_tooltip(item: &CatalogItem) -> String {
    format!(
        "{}\nRating: {:.2}\nNetwork: {}",
        item.display_name(),
        item.vote_average,
        item.networks.as_deref().unwrap_or("N/A")
    )
}

/// Returns true when the card was clicked
fn show_card(ui: &mut egui::Ui, ranked: &RankedItem, posters: &PosterCache, width: f32) -> bool {
    let size = egui::vec2(width, width * 1.5);
    let image = poster_widget(ui, ranked.image_url.as_deref(), posters, size);
    let caption = ui.add(
        egui::Label::new(egui::RichText::new(ranked.item.caption()).strong())
            .wrap()
            .sense(egui::Sense::click()),
    );
    ui.label(
        egui::RichText::new(format!("⭐ {:.2}", ranked.item.vote_average))
            .small()
            .color(egui::Color32::GOLD),
    );

    let tooltip = card_tooltip(&ranked.item);
    let image_clicked = image.on_hover_text(tooltip.as_str()).clicked();
    let caption_clicked = caption.on_hover_text(tooltip).clicked();
    image_clicked || caption_clicked
}

/// Poster texture, or a placeholder box while loading / when there is no image
fn poster_widget(ui: &mut egui::Ui, url: Option<&str>, posters: &PosterCache, size: egui::Vec2) -> egui::Response {
    if let Some(PosterState::Ready(texture)) = url.and_then(|u| posters.get(u)) {
        return ui.add(egui::Image::new((texture.id(), size)).sense(egui::Sense::click()));
    }

    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
    ui.painter().rect_filled(rect, 4.0, PLACEHOLDER);
    let label = match url.and_then(|u| posters.get(u)) {
        Some(PosterState::Loading) => "⏳",
        _ => "🎬 No image",
    };
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        label,
        egui::FontId::proportional(16.0),
        egui::Color32::GRAY,
    );
    response
}

/// Image URLs the detail view will want
pub fn detail_urls(item: &CatalogItem) -> impl Iterator<Item = String> {
    [image_url(item.backdrop_path.as_deref()), image_url(item.poster_path.as_deref())]
        .into_iter()
        .flatten()
}

pub fn show_detail(ui: &mut egui::Ui, item: Option<&CatalogItem>, posters: &PosterCache) -> Option<UiEvent> {
    let mut event = None;

    ui.horizontal(|ui| {
        if ui.button("⬅ Back to list").clicked() {
            event = Some(UiEvent::Nav(NavAction::Back));
        }
        if ui.button("🏠 Home").clicked() {
            event = Some(UiEvent::Nav(NavAction::Home));
        }
    });
    ui.separator();

    let Some(item) = item else {
        ui.add_space(20.0);
        ui.colored_label(egui::Color32::YELLOW, "⚠ Nothing selected.");
        ui.label("Go back to the list and pick a show or movie.");
        return event;
    };

    egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
        if let Some(backdrop) = image_url(item.backdrop_path.as_deref()) {
            if let Some(PosterState::Ready(texture)) = posters.get(&backdrop) {
                let tex_size = texture.size_vec2();
                let width = ui.available_width();
                let height = (width * tex_size.y / tex_size.x.max(1.0)).min(320.0);
                ui.image((texture.id(), egui::vec2(width, height)));
                ui.add_space(10.0);
            }
        }

        ui.horizontal_top(|ui| {
            ui.vertical(|ui| {
                let poster = image_url(item.poster_path.as_deref());
                let _ = poster_widget(ui, poster.as_deref(), posters, egui::vec2(250.0, 375.0));
            });
            ui.add_space(16.0);
            ui.vertical(|ui| show_detail_text(ui, item));
        });
    });

    event
}

fn or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("Not available")
}

fn show_detail_text(ui: &mut egui::Ui, item: &CatalogItem) {
    ui.heading(egui::RichText::new(item.caption()).size(26.0));
    ui.add_space(6.0);
    ui.label(
        egui::RichText::new(format!("Rating: {:.2} ⭐ ({} votes)", item.vote_average, item.vote_count))
            .strong(),
    );
    ui.label(format!(
        "Original language: {}",
        item.original_language
            .as_deref()
            .map(|l| l.to_uppercase())
            .unwrap_or_else(|| "N/A".to_string())
    ));
    ui.label(format!("Genres: {}", or_na(item.genres.as_deref())));

    ui.add_space(10.0);
    ui.label(egui::RichText::new("Overview").strong().size(18.0));
    ui.label(or_na(item.overview.as_deref()));
    ui.add_space(10.0);

    egui::Grid::new("detail_grid")
        .num_columns(2)
        .spacing([20.0, 6.0])
        .show(ui, |ui| {
            for (label, value) in detail_rows(item) {
                ui.label(label);
                ui.label(value);
                ui.end_row();
            }
        });
}

/// Optional fields that are present, as label/value pairs
fn detail_rows(item: &CatalogItem) -> Vec<(&'static str, String)> {
    let yes_no = |b: bool| (if b { "Yes" } else { "No" }).to_string();
    let mut rows = Vec::new();
    if let Some(networks) = &item.networks {
        rows.push(("Networks:", networks.clone()));
    }
    if let Some(seasons) = item.number_of_seasons {
        rows.push(("Seasons:", seasons.to_string()));
    }
    if let Some(episodes) = item.number_of_episodes {
        rows.push(("Episodes:", episodes.to_string()));
    }
    if let Some(status) = &item.status {
        rows.push(("Status:", status.clone()));
    }
    if let Some(in_production) = item.in_production {
        rows.push(("In production:", yes_no(in_production)));
    }
    if let Some(created_by) = &item.created_by {
        rows.push(("Created by:", created_by.clone()));
    }
    if let Some(cast) = &item.cast {
        rows.push(("Cast:", cast.clone()));
    }
    if let Some(popularity) = item.popularity {
        rows.push(("Popularity:", format!("{:.1}", popularity)));
    }
    if let Some(adult) = item.adult {
        rows.push(("Adult:", yes_no(adult)));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Query;
    use crate::error::CatalogError;
    use std::sync::Arc;

    fn drama(name: &str, rating: f64) -> CatalogItem {
        let mut item = CatalogItem::new(TableKind::Shows);
        item.name = Some(name.to_string());
        item.genres = Some("Drama".to_string());
        item.vote_average = rating;
        item
    }

    fn outcome(items: Vec<CatalogItem>, notice: Option<CatalogError>) -> FetchOutcome {
        FetchOutcome {
            query: Query::new(TableKind::Shows),
            items: Arc::new(items),
            notice,
            from_cache: false,
            cached_queries: 0,
        }
    }

    #[test]
    fn test_absorb_ranks_results() {
        let mut list = ListView::default();
        list.begin_fetch();
        list.absorb(&outcome(vec![drama("a", 6.0), drama("b", 8.0)], None), &FilterCriteria::default());

        assert!(!list.is_loading());
        assert!(list.notice.is_none());
        assert_eq!(list.results.items[0].item.display_name(), "b");
    }

    #[test]
    fn test_no_results_is_distinct_from_unavailable() {
        let mut list = ListView::default();
        let criteria = FilterCriteria::default().with(FilterField::Genres, "western");
        list.absorb(&outcome(vec![drama("a", 6.0)], None), &criteria);
        assert_eq!(list.notice, Some(ListNotice::NoResults));

        list.absorb(&outcome(Vec::new(), Some(CatalogError::DataUnavailable("down".into()))), &criteria);
        assert!(matches!(list.notice, Some(ListNotice::DataUnavailable(_))));
    }

    #[test]
    fn test_failure_keeps_previous_results() {
        let mut list = ListView::default();
        list.absorb(&outcome(vec![drama("kept", 7.0)], None), &FilterCriteria::default());

        list.begin_fetch();
        list.absorb(
            &outcome(Vec::new(), Some(CatalogError::DataUnavailable("connection reset".into()))),
            &FilterCriteria::default(),
        );

        assert!(!list.is_loading());
        assert_eq!(list.results.len(), 1);
        assert_eq!(list.results.items[0].item.display_name(), "kept");
        assert_eq!(
            list.notice,
            Some(ListNotice::DataUnavailable("data unavailable: connection reset".to_string()))
        );
    }

    #[test]
    fn test_loading_until_every_fetch_lands() {
        let mut list = ListView::default();
        list.begin_fetch();
        list.begin_fetch();

        list.absorb(&outcome(vec![drama("a", 6.0)], None), &FilterCriteria::default());
        assert!(list.is_loading());
        list.absorb(&outcome(vec![drama("a", 6.0)], None), &FilterCriteria::default());
        assert!(!list.is_loading());
    }

    #[test]
    fn test_absorb_ignores_fields_the_table_lacks() {
        let mut heat = CatalogItem::new(TableKind::Movies);
        heat.title = Some("Heat".to_string());
        let movies = FetchOutcome { query: Query::new(TableKind::Movies), ..outcome(vec![heat], None) };

        let mut list = ListView::default();
        list.absorb(&movies, &FilterCriteria::default().with(FilterField::Networks, "HBO"));
        assert_eq!(list.results.len(), 1);
        assert!(list.notice.is_none());
    }

    #[test]
    fn test_prompt_while_no_filter_is_set() {
        let mut list = ListView::default();
        list.absorb(&outcome(vec![drama("a", 6.0)], None), &FilterCriteria::default());
        assert!(list.wants_prompt(&FilterCriteria::default()));
        assert!(!list.wants_prompt(&FilterCriteria::default().with(FilterField::Genres, "drama")));

        list.begin_fetch();
        assert!(!list.wants_prompt(&FilterCriteria::default()));
    }

    #[test]
    fn test_poster_urls_skip_missing() {
        let mut with_poster = drama("p", 7.0);
        with_poster.poster_path = Some("/p.jpg".to_string());
        let mut list = ListView::default();
        list.absorb(&outcome(vec![with_poster, drama("none", 6.0)], None), &FilterCriteria::default());

        let urls: Vec<&str> = list.poster_urls().collect();
        assert_eq!(urls, vec!["https://image.tmdb.org/t/p/w500/p.jpg"]);
        assert_eq!(list.results.len(), 2);
    }

    #[test]
    fn test_card_tooltip() {
        let mut item = drama("Succession", 8.8);
        assert_eq!(card_tooltip(&item), "Succession\nRating: 8.80\nNetwork: N/A");
        item.networks = Some("HBO".to_string());
        assert!(card_tooltip(&item).ends_with("Network: HBO"));
    }

    #[test]
    fn test_detail_rows_only_present_fields() {
        let mut item = drama("The Bear", 8.2);
        assert!(detail_rows(&item).is_empty());

        item.number_of_seasons = Some(3);
        item.in_production = Some(true);
        let rows = detail_rows(&item);
        assert_eq!(rows, vec![("Seasons:", "3".to_string()), ("In production:", "Yes".to_string())]);
    }

    #[test]
    fn test_detail_urls() {
        let mut item = drama("x", 1.0);
        assert_eq!(detail_urls(&item).count(), 0);
        item.poster_path = Some("/p.jpg".to_string());
        item.backdrop_path = Some("/b.jpg".to_string());
        let urls: Vec<String> = detail_urls(&item).collect();
        assert_eq!(urls[0], "https://image.tmdb.org/t/p/w500/b.jpg");
        assert_eq!(urls.len(), 2);
    }
}
