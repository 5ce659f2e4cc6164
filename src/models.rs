//! Data models for the TMDB catalog browser

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

/// Which catalog table a row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKind {
    Shows,
    Movies,
}

impl TableKind {
    pub fn label(&self) -> &'static str {
        match self {
            TableKind::Shows => "Shows",
            TableKind::Movies => "Movies",
        }
    }

    /// The list screen that browses this table
    pub fn list_screen(&self) -> Screen {
        match self {
            TableKind::Shows => Screen::SeriesList,
            TableKind::Movies => Screen::MoviesList,
        }
    }
}

/// UI screen selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    SeriesList,
    MoviesList,
    Detail,
}

impl Screen {
    /// Table browsed by a list screen
    pub fn table(&self) -> Option<TableKind> {
        match self {
            Screen::SeriesList => Some(TableKind::Shows),
            Screen::MoviesList => Some(TableKind::Movies),
            Screen::Home | Screen::Detail => None,
        }
    }
}

/// One show or movie record
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub kind: TableKind,
    pub id: Option<i64>,
    // Shows carry name/original_name, movies carry title
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub title: Option<String>,
    pub genres: Option<String>,
    pub overview: Option<String>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<String>,
    pub release_date: Option<String>,
    pub original_language: Option<String>,
    pub networks: Option<String>,
    pub number_of_seasons: Option<i64>,
    pub number_of_episodes: Option<i64>,
    pub status: Option<String>,
    pub in_production: Option<bool>,
    pub adult: Option<bool>,
    pub popularity: Option<f64>,
    pub created_by: Option<String>,
    pub cast: Option<String>,
}

impl CatalogItem {
    pub fn new(kind: TableKind) -> Self {
        Self {
            kind,
            id: None,
            name: None,
            original_name: None,
            title: None,
            genres: None,
            overview: None,
            vote_average: 0.0,
            vote_count: 0,
            poster_path: None,
            backdrop_path: None,
            first_air_date: None,
            release_date: None,
            original_language: None,
            networks: None,
            number_of_seasons: None,
            number_of_episodes: None,
            status: None,
            in_production: None,
            adult: None,
            popularity: None,
            created_by: None,
            cast: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .or(self.original_name.as_deref())
            .unwrap_or("Untitled")
    }

    /// All title-like fields, for title filtering
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        [&self.title, &self.name, &self.original_name]
            .into_iter()
            .filter_map(|t| t.as_deref())
    }

    /// first_air_date for shows, release_date for movies
    pub fn release_date(&self) -> Option<&str> {
        match self.kind {
            TableKind::Shows => self.first_air_date.as_deref().or(self.release_date.as_deref()),
            TableKind::Movies => self.release_date.as_deref().or(self.first_air_date.as_deref()),
        }
    }

    pub fn release_year(&self) -> Option<i32> {
        let date = self.release_date()?.trim();
        let day = date.get(..10).unwrap_or(date);
        if let Ok(parsed) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            return Some(parsed.year());
        }
        let year = date.get(..4)?;
        if year.bytes().all(|b| b.is_ascii_digit()) {
            year.parse().ok()
        } else {
            None
        }
    }

    /// "Name (YYYY)" or "Name (N/A)"
    pub fn caption(&self) -> String {
        match self.release_year() {
            Some(year) => format!("{} ({})", self.display_name(), year),
            None => format!("{} (N/A)", self.display_name()),
        }
    }
}

/// Text fields the user can filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterField {
    Genres,
    Title,
    Overview,
    Networks,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::Genres,
        FilterField::Title,
        FilterField::Overview,
        FilterField::Networks,
    ];

    /// Movies carry no network column
    pub fn applies_to(&self, table: TableKind) -> bool {
        !(*self == FilterField::Networks && table == TableKind::Movies)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterField::Genres => "Genre",
            FilterField::Title => "Title / Name",
            FilterField::Overview => "Overview",
            FilterField::Networks => "Network",
        }
    }
}

/// Substring patterns per field plus the adult toggle. All present criteria are ANDed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub patterns: BTreeMap<FilterField, String>,
    pub exclude_adult: bool,
}

impl FilterCriteria {
    pub fn with(mut self, field: FilterField, pattern: &str) -> Self {
        self.patterns.insert(field, pattern.to_string());
        self
    }

    pub fn excluding_adult(mut self) -> Self {
        self.exclude_adult = true;
        self
    }

    /// Pattern for a field, as typed. Whitespace-only counts as absent.
    pub fn pattern(&self, field: FilterField) -> Option<&str> {
        self.patterns
            .get(&field)
            .map(String::as_str)
            .filter(|p| !p.trim().is_empty())
    }

    /// The criteria a list of `table` can show and edit. Hidden fields impose nothing.
    pub fn for_table(&self, table: TableKind) -> FilterCriteria {
        FilterCriteria {
            patterns: self
                .patterns
                .iter()
                .filter(|(field, _)| field.applies_to(table))
                .map(|(field, p)| (*field, p.clone()))
                .collect(),
            exclude_adult: self.exclude_adult && table == TableKind::Movies,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.exclude_adult && FilterField::ALL.iter().all(|f| self.pattern(*f).is_none())
    }
}

/// A ranked item with its resolved poster URL
#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem {
    pub item: CatalogItem,
    pub image_url: Option<String>,
}

/// Top-N items by vote_average, best first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedResult {
    pub items: Vec<RankedItem>,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedItem> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_title() {
        let mut item = CatalogItem::new(TableKind::Movies);
        item.title = Some("Heat".to_string());
        item.name = Some("ignored".to_string());
        assert_eq!(item.display_name(), "Heat");

        let mut show = CatalogItem::new(TableKind::Shows);
        show.original_name = Some("Dark".to_string());
        assert_eq!(show.display_name(), "Dark");

        assert_eq!(CatalogItem::new(TableKind::Shows).display_name(), "Untitled");
    }

    #[test]
    fn test_release_year() {
        let mut show = CatalogItem::new(TableKind::Shows);
        show.first_air_date = Some("2008-01-20".to_string());
        assert_eq!(show.release_year(), Some(2008));
        assert_eq!(show.caption(), "Untitled (2008)");

        let mut movie = CatalogItem::new(TableKind::Movies);
        movie.release_date = Some("1995-12-15 00:00:00".to_string());
        assert_eq!(movie.release_year(), Some(1995));

        movie.release_date = Some("2021".to_string());
        assert_eq!(movie.release_year(), Some(2021));

        movie.release_date = Some("unknown".to_string());
        assert_eq!(movie.release_year(), None);
        assert!(movie.caption().ends_with("(N/A)"));
    }

    #[test]
    fn test_blank_pattern_is_absent() {
        let criteria = FilterCriteria::default().with(FilterField::Genres, "   ");
        assert_eq!(criteria.pattern(FilterField::Genres), None);
        assert!(criteria.is_empty());
        assert!(!criteria.excluding_adult().is_empty());
    }

    #[test]
    fn test_pattern_is_kept_as_typed() {
        let criteria = FilterCriteria::default().with(FilterField::Genres, " drama");
        assert_eq!(criteria.pattern(FilterField::Genres), Some(" drama"));
    }

    #[test]
    fn test_for_table_drops_hidden_fields() {
        let criteria = FilterCriteria::default()
            .with(FilterField::Networks, "HBO")
            .with(FilterField::Genres, "crime")
            .excluding_adult();

        let movies = criteria.for_table(TableKind::Movies);
        assert_eq!(movies.pattern(FilterField::Networks), None);
        assert_eq!(movies.pattern(FilterField::Genres), Some("crime"));
        assert!(movies.exclude_adult);

        let shows = criteria.for_table(TableKind::Shows);
        assert_eq!(shows.pattern(FilterField::Networks), Some("HBO"));
        assert!(!shows.exclude_adult);
    }
}
