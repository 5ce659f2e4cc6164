//! Session navigation
//!
//! `NavState` is owned by the app and only changes through `reduce`.

use crate::models::{CatalogItem, FilterCriteria, Screen, TableKind};

/// Per-session navigation state
#[derive(Debug, Clone, PartialEq)]
pub struct NavState {
    pub screen: Screen,
    pub selected_item: Option<CatalogItem>,
    pub last_criteria: FilterCriteria,
    /// List screen the detail view was entered from
    pub came_from: Option<Screen>,
}

impl Default for NavState {
    fn default() -> Self {
        Self {
            screen: Screen::Home,
            selected_item: None,
            last_criteria: FilterCriteria::default(),
            came_from: None,
        }
    }
}

impl NavState {
    /// Table browsed by the current screen (or by the list behind the detail view)
    pub fn active_table(&self) -> Option<TableKind> {
        match self.screen {
            Screen::Detail => self.back_target().table(),
            screen => screen.table(),
        }
    }

    /// Session criteria narrowed to the fields a `table` list shows
    pub fn criteria_for(&self, table: TableKind) -> FilterCriteria {
        self.last_criteria.for_table(table)
    }

    fn back_target(&self) -> Screen {
        self.came_from
            .or_else(|| self.selected_item.as_ref().map(|item| item.kind.list_screen()))
            .unwrap_or(Screen::Home)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavAction {
    SelectSeries,
    SelectMovies,
    PickItem(CatalogItem),
    Back,
    Home,
    ApplyCriteria(FilterCriteria),
}

/// Apply one user action. Actions that make no sense on the current screen leave the state as is.
pub fn reduce(mut state: NavState, action: NavAction) -> NavState {
    match (state.screen, action) {
        (Screen::Home, NavAction::SelectSeries) => {
            state.screen = Screen::SeriesList;
        }
        (Screen::Home, NavAction::SelectMovies) => {
            state.screen = Screen::MoviesList;
        }
        (list @ (Screen::SeriesList | Screen::MoviesList), NavAction::PickItem(item)) => {
            state.selected_item = Some(item);
            state.came_from = Some(list);
            state.screen = Screen::Detail;
        }
        (Screen::Detail, NavAction::Back) => {
            state.screen = state.back_target();
            state.came_from = None;
        }
        (_, NavAction::Home) => {
            state.screen = Screen::Home;
            state.selected_item = None;
            state.came_from = None;
        }
        (_, NavAction::ApplyCriteria(criteria)) => {
            state.last_criteria = criteria;
        }
        (screen, action) => {
            log::debug!("Ignoring {:?} on {:?}", action, screen);
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterField;

    fn item(kind: TableKind, name: &str) -> CatalogItem {
        let mut item = CatalogItem::new(kind);
        item.name = Some(name.to_string());
        item
    }

    #[test]
    fn test_initial_state() {
        let state = NavState::default();
        assert_eq!(state.screen, Screen::Home);
        assert!(state.selected_item.is_none());
        assert!(state.last_criteria.is_empty());
    }

    #[test]
    fn test_series_pick_back() {
        let x = item(TableKind::Shows, "X");
        let state = reduce(NavState::default(), NavAction::SelectSeries);
        assert_eq!(state.screen, Screen::SeriesList);

        let state = reduce(state, NavAction::PickItem(x.clone()));
        assert_eq!(state.screen, Screen::Detail);
        assert_eq!(state.selected_item.as_ref(), Some(&x));

        // back returns to the list but does not clear the selection
        let state = reduce(state, NavAction::Back);
        assert_eq!(state.screen, Screen::SeriesList);
        assert_eq!(state.selected_item.as_ref(), Some(&x));
    }

    #[test]
    fn test_movies_back_returns_to_movies() {
        let state = reduce(NavState::default(), NavAction::SelectMovies);
        let state = reduce(state, NavAction::PickItem(item(TableKind::Movies, "M")));
        assert_eq!(state.active_table(), Some(TableKind::Movies));

        let state = reduce(state, NavAction::Back);
        assert_eq!(state.screen, Screen::MoviesList);
    }

    #[test]
    fn test_home_clears_selection() {
        let state = reduce(NavState::default(), NavAction::SelectSeries);
        let state = reduce(state, NavAction::PickItem(item(TableKind::Shows, "X")));

        let state = reduce(state, NavAction::Home);
        assert_eq!(state.screen, Screen::Home);
        assert!(state.selected_item.is_none());
        assert!(state.came_from.is_none());
    }

    #[test]
    fn test_invalid_transitions_are_ignored() {
        let home = NavState::default();
        assert_eq!(reduce(home.clone(), NavAction::PickItem(item(TableKind::Shows, "X"))), home);
        assert_eq!(reduce(home.clone(), NavAction::Back), home);

        let list = reduce(home, NavAction::SelectSeries);
        assert_eq!(reduce(list.clone(), NavAction::SelectMovies), list);
        assert_eq!(reduce(list.clone(), NavAction::Back), list);
    }

    #[test]
    fn test_back_from_detail_without_origin() {
        let selected = NavState {
            screen: Screen::Detail,
            selected_item: Some(item(TableKind::Movies, "M")),
            ..NavState::default()
        };
        assert_eq!(reduce(selected, NavAction::Back).screen, Screen::MoviesList);

        // Detail reached with nothing selected still has a way out
        let empty = NavState { screen: Screen::Detail, ..NavState::default() };
        assert_eq!(reduce(empty, NavAction::Back).screen, Screen::Home);
    }

    #[test]
    fn test_criteria_survive_navigation() {
        let criteria = FilterCriteria::default().with(FilterField::Genres, "drama");
        let state = reduce(NavState::default(), NavAction::SelectSeries);
        let state = reduce(state, NavAction::ApplyCriteria(criteria.clone()));
        assert_eq!(state.screen, Screen::SeriesList);

        let state = reduce(state, NavAction::PickItem(item(TableKind::Shows, "X")));
        let state = reduce(state, NavAction::Back);
        let state = reduce(state, NavAction::Home);
        assert_eq!(state.last_criteria, criteria);
    }

    #[test]
    fn test_cycle_is_repeatable() {
        let mut state = NavState::default();
        for _ in 0..3 {
            state = reduce(state, NavAction::SelectMovies);
            state = reduce(state, NavAction::PickItem(item(TableKind::Movies, "M")));
            state = reduce(state, NavAction::Back);
            assert_eq!(state.screen, Screen::MoviesList);
            state = reduce(state, NavAction::Home);
        }
        assert_eq!(state, NavState::default());
    }

    #[test]
    fn test_show_only_criteria_do_not_hide_movies() {
        let state = reduce(NavState::default(), NavAction::SelectSeries);
        let state = reduce(
            state,
            NavAction::ApplyCriteria(FilterCriteria::default().with(FilterField::Networks, "HBO")),
        );
        let state = reduce(state, NavAction::Home);
        let state = reduce(state, NavAction::SelectMovies);

        let heat = item(TableKind::Movies, "Heat");
        let ranked = crate::filter::apply_filters(&[heat], &state.criteria_for(TableKind::Movies));
        assert_eq!(ranked.len(), 1);

        // Still applied when the series list comes back
        assert_eq!(state.criteria_for(TableKind::Shows).pattern(FilterField::Networks), Some("HBO"));
    }
}
