//! Read-only catalog data access
//!
//! Queries are built from enumerated tables and columns only; user text is
//! always bound as a parameter. Results are memoized per session by exact
//! query and every failure comes back as `DataUnavailable` next to an empty
//! row set, never as a panic.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags, Row, ToSql};

use crate::error::{CatalogError, Result};
use crate::models::{CatalogItem, TableKind};

/// Columns the catalog tables may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Name,
    OriginalName,
    Title,
    Genres,
    Overview,
    VoteAverage,
    VoteCount,
    PosterPath,
    BackdropPath,
    FirstAirDate,
    ReleaseDate,
    OriginalLanguage,
    Networks,
    NumberOfSeasons,
    NumberOfEpisodes,
    Status,
    InProduction,
    Adult,
    Popularity,
    CreatedBy,
    Cast,
}

impl Column {
    pub const ALL: [Column; 22] = [
        Column::Id,
        Column::Name,
        Column::OriginalName,
        Column::Title,
        Column::Genres,
        Column::Overview,
        Column::VoteAverage,
        Column::VoteCount,
        Column::PosterPath,
        Column::BackdropPath,
        Column::FirstAirDate,
        Column::ReleaseDate,
        Column::OriginalLanguage,
        Column::Networks,
        Column::NumberOfSeasons,
        Column::NumberOfEpisodes,
        Column::Status,
        Column::InProduction,
        Column::Adult,
        Column::Popularity,
        Column::CreatedBy,
        Column::Cast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Name => "name",
            Column::OriginalName => "original_name",
            Column::Title => "title",
            Column::Genres => "genres",
            Column::Overview => "overview",
            Column::VoteAverage => "vote_average",
            Column::VoteCount => "vote_count",
            Column::PosterPath => "poster_path",
            Column::BackdropPath => "backdrop_path",
            Column::FirstAirDate => "first_air_date",
            Column::ReleaseDate => "release_date",
            Column::OriginalLanguage => "original_language",
            Column::Networks => "networks",
            Column::NumberOfSeasons => "number_of_seasons",
            Column::NumberOfEpisodes => "number_of_episodes",
            Column::Status => "status",
            Column::InProduction => "in_production",
            Column::Adult => "adult",
            Column::Popularity => "popularity",
            Column::CreatedBy => "created_by",
            Column::Cast => "cast",
        }
    }

    fn from_name(name: &str) -> Option<Column> {
        Column::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }
}

/// A value bound into a query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Bool(bool),
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlValue::Text(s) => s.to_sql(),
            SqlValue::Integer(i) => i.to_sql(),
            SqlValue::Bool(b) => b.to_sql(),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self { SqlValue::Text(s.to_string()) }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self { SqlValue::Integer(i) }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self { SqlValue::Bool(b) }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    Equals(SqlValue),
    /// Substring match via LIKE; the pattern is escaped and bound
    Contains(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub column: Column,
    pub condition: Condition,
}

impl Predicate {
    pub fn equals(column: Column, value: impl Into<SqlValue>) -> Self {
        Self { column, condition: Condition::Equals(value.into()) }
    }

    pub fn contains(column: Column, text: &str) -> Self {
        Self { column, condition: Condition::Contains(text.to_string()) }
    }
}

/// An immutable read request; doubles as the cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub table: TableKind,
    pub predicates: Vec<Predicate>,
}

impl Query {
    pub fn new(table: TableKind) -> Self {
        Self { table, predicates: Vec::new() }
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Statement text with numbered placeholders
    pub fn sql(&self, table_name: &str) -> String {
        let mut sql = format!("SELECT * FROM {}", table_name);
        for (i, predicate) in self.predicates.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            let column = predicate.column.as_str();
            match predicate.condition {
                Condition::Equals(_) => sql.push_str(&format!("{} = ?{}", column, i + 1)),
                Condition::Contains(_) => {
                    sql.push_str(&format!("{} LIKE ?{} ESCAPE '\\'", column, i + 1))
                }
            }
        }
        sql
    }

    /// Values bound to the placeholders of `sql`, in order
    pub fn params(&self) -> Vec<SqlValue> {
        self.predicates
            .iter()
            .map(|p| match &p.condition {
                Condition::Equals(value) => value.clone(),
                Condition::Contains(text) => SqlValue::Text(format!("%{}%", escape_like(text))),
            })
            .collect()
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Physical table names for each catalog table
#[derive(Debug, Clone, PartialEq)]
pub struct TableNames {
    shows: String,
    movies: String,
}

impl TableNames {
    pub fn new(shows: &str, movies: &str) -> Result<Self> {
        for name in [shows, movies] {
            if !is_identifier(name) {
                return Err(CatalogError::InvalidTableName(name.to_string()));
            }
        }
        Ok(Self { shows: shows.to_string(), movies: movies.to_string() })
    }

    pub fn resolve(&self, table: TableKind) -> &str {
        match table {
            TableKind::Shows => &self.shows,
            TableKind::Movies => &self.movies,
        }
    }
}

/// Anything that can answer a catalog query
pub trait CatalogStore: Send + Sync {
    fn load(&self, query: &Query) -> Result<Vec<CatalogItem>>;

    fn describe(&self) -> String {
        "catalog store".to_string()
    }
}

/// SQLite database file, opened read-only per query
pub struct SqliteStore {
    path: PathBuf,
    tables: TableNames,
}

impl SqliteStore {
    pub fn new(path: &Path, tables: TableNames) -> Self {
        Self { path: path.to_path_buf(), tables }
    }

    fn connect(&self) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Ok(Connection::open_with_flags(&self.path, flags)?)
    }
}

impl CatalogStore for SqliteStore {
    fn load(&self, query: &Query) -> Result<Vec<CatalogItem>> {
        let conn = self.connect()?;
        let sql = query.sql(self.tables.resolve(query.table));
        log::debug!("Running '{}' against {}", sql, self.path.display());

        let mut stmt = conn.prepare(&sql)?;
        let layout = RowLayout::new(&stmt.column_names());

        let mut rows = stmt.query(params_from_iter(query.params()))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(layout.read_item(row, query.table)?);
        }
        Ok(items)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Where each known column sits in a result row
struct RowLayout {
    positions: HashMap<Column, usize>,
}

impl RowLayout {
    fn new(names: &[&str]) -> Self {
        let positions = names
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| Column::from_name(name).map(|c| (c, idx)))
            .collect();
        Self { positions }
    }

    fn value<'r>(&self, row: &'r Row<'_>, column: Column) -> Result<ValueRef<'r>> {
        match self.positions.get(&column) {
            Some(&idx) => Ok(row.get_ref(idx)?),
            None => Ok(ValueRef::Null),
        }
    }

    fn text(&self, row: &Row<'_>, column: Column) -> Result<Option<String>> {
        Ok(as_text(self.value(row, column)?))
    }

    fn read_item(&self, row: &Row<'_>, kind: TableKind) -> Result<CatalogItem> {
        let mut item = CatalogItem::new(kind);
        item.id = as_int(self.value(row, Column::Id)?);
        item.name = self.text(row, Column::Name)?;
        item.original_name = self.text(row, Column::OriginalName)?;
        item.title = self.text(row, Column::Title)?;
        item.genres = self.text(row, Column::Genres)?;
        item.overview = self.text(row, Column::Overview)?;
        item.vote_average = as_float(self.value(row, Column::VoteAverage)?).unwrap_or(0.0);
        item.vote_count = as_int(self.value(row, Column::VoteCount)?).unwrap_or(0).max(0);
        item.poster_path = self.text(row, Column::PosterPath)?.filter(|p| !p.trim().is_empty());
        item.backdrop_path = self.text(row, Column::BackdropPath)?.filter(|p| !p.trim().is_empty());
        item.first_air_date = self.text(row, Column::FirstAirDate)?;
        item.release_date = self.text(row, Column::ReleaseDate)?;
        item.original_language = self.text(row, Column::OriginalLanguage)?;
        item.networks = self.text(row, Column::Networks)?;
        item.number_of_seasons = as_int(self.value(row, Column::NumberOfSeasons)?);
        item.number_of_episodes = as_int(self.value(row, Column::NumberOfEpisodes)?);
        item.status = self.text(row, Column::Status)?;
        item.in_production = as_bool(self.value(row, Column::InProduction)?);
        item.adult = as_bool(self.value(row, Column::Adult)?);
        item.popularity = as_float(self.value(row, Column::Popularity)?);
        item.created_by = self.text(row, Column::CreatedBy)?;
        item.cast = self.text(row, Column::Cast)?;
        Ok(item)
    }
}

// SQLite is dynamically typed; these accept whatever storage class a column ended up with.

fn as_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

fn as_float(value: ValueRef<'_>) -> Option<f64> {
    let f = match value {
        ValueRef::Real(f) => f,
        ValueRef::Integer(i) => i as f64,
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok()?,
        ValueRef::Null | ValueRef::Blob(_) => return None,
    };
    f.is_finite().then_some(f)
}

fn as_int(value: ValueRef<'_>) -> Option<i64> {
    match value {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) if f.is_finite() => Some(f as i64),
        ValueRef::Text(_) => as_float(value).map(|f| f as i64),
        _ => None,
    }
}

fn as_bool(value: ValueRef<'_>) -> Option<bool> {
    match value {
        ValueRef::Integer(i) => Some(i != 0),
        ValueRef::Real(f) => Some(f != 0.0),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).ok()?.trim().to_ascii_lowercase();
            match text.as_str() {
                "true" | "t" | "yes" | "1" => Some(true),
                "false" | "f" | "no" | "0" => Some(false),
                _ => None,
            }
        }
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

/// Session-scoped memo of query results. Never evicts; bounded by the distinct queries a session issues.
#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<Query, Arc<Vec<CatalogItem>>>,
}

impl QueryCache {
    pub fn get(&self, query: &Query) -> Option<Arc<Vec<CatalogItem>>> {
        self.entries.get(query).cloned()
    }

    pub fn insert(&mut self, query: Query, items: Arc<Vec<CatalogItem>>) {
        self.entries.insert(query, items);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of one fetch. `notice` is set when the store could not answer; `items` is then empty.
#[derive(Debug)]
pub struct FetchOutcome {
    pub query: Query,
    pub items: Arc<Vec<CatalogItem>>,
    pub notice: Option<CatalogError>,
    pub from_cache: bool,
    pub cached_queries: usize,
}

/// Store + memo + timeout
pub struct DataAccess {
    store: Arc<dyn CatalogStore>,
    cache: QueryCache,
    timeout: Duration,
}

impl DataAccess {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        Self { store, cache: QueryCache::default(), timeout }
    }

    pub fn fetch_table(&mut self, table: TableKind, predicates: Vec<Predicate>) -> FetchOutcome {
        self.fetch(Query { table, predicates })
    }

    pub fn fetch(&mut self, query: Query) -> FetchOutcome {
        if let Some(items) = self.cache.get(&query) {
            log::debug!("Cache hit for {:?} ({} rows)", query.table, items.len());
            return FetchOutcome {
                query,
                items,
                notice: None,
                from_cache: true,
                cached_queries: self.cache.len(),
            };
        }

        match load_with_timeout(Arc::clone(&self.store), query.clone(), self.timeout) {
            Ok(items) => {
                log::info!("Loaded {} rows from {} ({})", items.len(), query.table.label(), self.store.describe());
                let items = Arc::new(items);
                self.cache.insert(query.clone(), Arc::clone(&items));
                FetchOutcome {
                    query,
                    items,
                    notice: None,
                    from_cache: false,
                    cached_queries: self.cache.len(),
                }
            }
            Err(e) => {
                log::warn!("Fetching {} failed: {}", query.table.label(), e);
                FetchOutcome {
                    query,
                    items: Arc::new(Vec::new()),
                    notice: Some(e),
                    from_cache: false,
                    cached_queries: self.cache.len(),
                }
            }
        }
    }

    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }
}

/// Run the store query on a helper thread and give up after `timeout`.
/// A stuck query thread is left to finish on its own; its answer is dropped.
fn load_with_timeout(store: Arc<dyn CatalogStore>, query: Query, timeout: Duration) -> Result<Vec<CatalogItem>> {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("catalog-query".to_string())
        .spawn(move || {
            let _ = tx.send(store.load(&query));
        })
        .map_err(|e| CatalogError::DataUnavailable(format!("could not start query: {}", e)))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map_err(CatalogError::into_unavailable),
        Err(RecvTimeoutError::Timeout) => Err(CatalogError::DataUnavailable(format!(
            "query timed out after {:?}",
            timeout
        ))),
        Err(RecvTimeoutError::Disconnected) => Err(CatalogError::DataUnavailable(
            "query stopped unexpectedly".to_string(),
        )),
    }
}

/// Per-session thread owning the `DataAccess`. Requests are served one at a time, in order.
pub struct CatalogWorker {
    requests: Sender<Query>,
    results: Receiver<FetchOutcome>,
}

impl CatalogWorker {
    /// Start the worker thread. `notify` runs after each answer is queued.
    /// Answers still in flight when the worker is dropped are discarded.
    pub fn spawn<F>(mut access: DataAccess, notify: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (requests, rx) = mpsc::channel::<Query>();
        let (results_tx, results) = mpsc::channel::<FetchOutcome>();

        let spawned = thread::Builder::new()
            .name("catalog-worker".to_string())
            .spawn(move || {
                for query in rx {
                    if results_tx.send(access.fetch(query)).is_err() {
                        break;
                    }
                    notify();
                }
                log::debug!("Catalog worker stopped");
            });
        if let Err(e) = spawned {
            // Requests will fail with a disconnected channel and surface as DataUnavailable
            log::error!("Could not start catalog worker: {}", e);
        }

        Self { requests, results }
    }

    /// Queue a fetch. Returns false when the worker is gone.
    pub fn request(&self, query: Query) -> bool {
        self.requests.send(query).is_ok()
    }

    /// Answers that arrived since the last poll, in request order
    pub fn poll(&self) -> Vec<FetchOutcome> {
        self.results.try_iter().collect()
    }
}

#[cfg(test)]
#[path = "database_tests.rs"]
mod tests;
