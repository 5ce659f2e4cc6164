//! Filter and rank engine
//!
//! Pure functions: substring filters over catalog rows, then a stable
//! top-N by rating with poster URLs resolved.

use crate::models::{CatalogItem, FilterCriteria, FilterField, RankedItem, RankedResult};

/// Base URL for poster and backdrop paths
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Size of the ranked list
pub const TOP_N: usize = 10;

/// Case-insensitive substring check. ASCII input is compared without allocating.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() { return true; }

    if haystack.is_ascii() && needle.is_ascii() {
        if needle.len() > haystack.len() { return false; }
        return haystack.as_bytes()
            .windows(needle.len())
            .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()));
    }

    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Join a relative CDN path onto the image base URL
pub fn image_url(path: Option<&str>) -> Option<String> {
    let path = path?.trim();
    if path.is_empty() {
        return None;
    }
    Some(format!("{}{}", IMAGE_BASE_URL, path))
}

fn field_matches(item: &CatalogItem, field: FilterField, pattern: &str) -> bool {
    match field {
        FilterField::Title => item.titles().any(|t| contains_ignore_case(t, pattern)),
        FilterField::Genres => text_matches(item.genres.as_deref(), pattern),
        FilterField::Overview => text_matches(item.overview.as_deref(), pattern),
        FilterField::Networks => text_matches(item.networks.as_deref(), pattern),
    }
}

fn text_matches(value: Option<&str>, pattern: &str) -> bool {
    value.is_some_and(|v| contains_ignore_case(v, pattern))
}

/// True when the item passes every criterion
pub fn matches(item: &CatalogItem, criteria: &FilterCriteria) -> bool {
    if criteria.exclude_adult && item.adult == Some(true) {
        return false;
    }

    FilterField::ALL.iter().all(|field| match criteria.pattern(*field) {
        Some(pattern) => field_matches(item, *field, pattern),
        None => true,
    })
}

/// Filter, sort by vote_average (highest first, ties keep input order) and keep the top 10.
/// Items without a poster stay in the result with `image_url = None`.
pub fn apply_filters(items: &[CatalogItem], criteria: &FilterCriteria) -> RankedResult {
    let mut passing: Vec<&CatalogItem> = items.iter().filter(|item| matches(item, criteria)).collect();

    // sort_by is stable
    passing.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));

    let items = passing
        .into_iter()
        .take(TOP_N)
        .map(|item| RankedItem {
            image_url: image_url(item.poster_path.as_deref()),
            item: item.clone(),
        })
        .collect();

    RankedResult { items }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
