//! Selection state and the event reducer that drives movie queries.
//!
//! Every user action and every network completion is an [`Event`]. The
//! [`Session`] value is consumed by [`Session::apply`] and returned updated,
//! together with at most one [`FetchRequest`] for the caller to run. Each
//! request carries a generation token; completions for any generation other
//! than the latest one are dropped, so a slow response for a previous country
//! or genre can never overwrite the list for the current one.

use crate::api::DiscoverQuery;
use crate::catalog::{CountryResolver, GenreCatalog, LoadState};
use crate::models::{CountryEntry, Genre, GenreId, Movie};
use crate::presenter::{ListStatus, ListView, RenderMode};

/// Country/genre/page bookkeeping. Changing either the country or the genre
/// resets the page to 1 and forgets the page count of the old pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    country: Option<String>,
    genre: Option<GenreId>,
    page: u32,
    total_pages: u32,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            country: None,
            genre: None,
            page: 1,
            total_pages: 0,
        }
    }
}

impl Selection {
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn genre(&self) -> Option<GenreId> {
        self.genre
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// New country (or none). Always restarts at page 1, even for the same code.
    pub fn with_country(self, country: Option<String>) -> Self {
        Self {
            country,
            page: 1,
            total_pages: 0,
            ..self
        }
    }

    /// New genre filter. Always restarts at page 1.
    pub fn with_genre(self, genre: Option<GenreId>) -> Self {
        Self {
            genre,
            page: 1,
            total_pages: 0,
            ..self
        }
    }

    pub fn with_total_pages(self, total_pages: u32) -> Self {
        Self { total_pages, ..self }
    }

    /// Next page, if the last response reported more
    pub fn advanced(self) -> Option<Self> {
        if self.has_more_pages() {
            Some(Self {
                page: self.page + 1,
                ..self
            })
        } else {
            None
        }
    }

    /// `page < total_pages` with a non-zero total
    pub fn has_more_pages(&self) -> bool {
        self.total_pages > 0 && self.page < self.total_pages
    }
}

/// Country heading in the side panel
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CountryPanel {
    #[default]
    Empty,
    Resolved { name: String, code: String },
    NotFound { name: String },
    /// Country list failed to load, so nothing can resolve
    Unavailable { name: String },
}

impl CountryPanel {
    pub fn name(&self) -> Option<&str> {
        match self {
            CountryPanel::Empty => None,
            CountryPanel::Resolved { name, .. }
            | CountryPanel::NotFound { name }
            | CountryPanel::Unavailable { name } => Some(name),
        }
    }

    pub fn meta(&self) -> String {
        match self {
            CountryPanel::Empty => "Click a country on the map".to_string(),
            CountryPanel::Resolved { code, .. } => format!("ISO Code: {}", code),
            CountryPanel::NotFound { .. } => "ISO Code not found".to_string(),
            CountryPanel::Unavailable { .. } => "Country list unavailable".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CountriesLoaded(Vec<CountryEntry>),
    CountriesFailed(String),
    GenresLoaded(Vec<Genre>),
    GenresFailed(String),
    CountrySelected { name: String },
    GenreToggled { id: GenreId },
    PageAdvanced,
    Retry,
    PageLoaded {
        generation: u64,
        /// Page number as reported by the server
        page: u32,
        results: Vec<Movie>,
        total_pages: u32,
    },
    QueryFailed { generation: u64, error: String },
}

/// A discover query to run, tagged with the generation it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub generation: u64,
    pub query: DiscoverQuery,
}

#[derive(Debug, Clone)]
pub struct Session {
    resolver: CountryResolver,
    genres: GenreCatalog,
    selection: Selection,
    panel: CountryPanel,
    list: ListView,
    generation: u64,
    in_flight: Option<u64>,
    min_vote_count: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new("", 0)
    }
}

impl Session {
    pub fn new(image_base: &str, min_vote_count: u32) -> Self {
        Self {
            resolver: CountryResolver::new(),
            genres: GenreCatalog::new(),
            selection: Selection::default(),
            panel: CountryPanel::Empty,
            list: ListView::new(image_base),
            generation: 0,
            in_flight: None,
            min_vote_count,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn panel(&self) -> &CountryPanel {
        &self.panel
    }

    pub fn list(&self) -> &ListView {
        &self.list
    }

    pub fn resolver(&self) -> &CountryResolver {
        &self.resolver
    }

    pub fn genres(&self) -> &GenreCatalog {
        &self.genres
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Pager is usable when more pages remain and nothing is pending or failed
    pub fn pager_enabled(&self) -> bool {
        self.selection.has_more_pages()
            && self.in_flight.is_none()
            && !matches!(self.list.status(), ListStatus::Failed(_))
    }

    pub fn can_retry(&self) -> bool {
        self.selection.country.is_some()
            && self.in_flight.is_none()
            && matches!(self.list.status(), ListStatus::Failed(_))
    }

    pub fn set_min_vote_count(&mut self, min_vote_count: u32) {
        self.min_vote_count = min_vote_count;
    }

    pub fn set_image_base(&mut self, image_base: &str) {
        self.list.set_image_base(image_base);
    }

    /// Reduce one event into the next state
    pub fn apply(mut self, event: Event) -> (Self, Option<FetchRequest>) {
        let request = match event {
            Event::CountriesLoaded(entries) => {
                self.resolver.loaded(entries);
                None
            }
            Event::CountriesFailed(error) => {
                self.resolver.failed(error);
                None
            }
            Event::GenresLoaded(genres) => {
                self.genres.loaded(genres);
                self.sync_genre()
            }
            Event::GenresFailed(error) => {
                self.genres.failed(error);
                self.sync_genre()
            }
            Event::CountrySelected { name } => self.select_country(name),
            Event::GenreToggled { id } => self.toggle_genre(id),
            Event::PageAdvanced => self.advance_page(),
            Event::Retry => {
                if self.can_retry() {
                    self.issue()
                } else {
                    None
                }
            }
            Event::PageLoaded {
                generation,
                page,
                results,
                total_pages,
            } => {
                if self.is_current(generation) {
                    let requested = self.selection.page();
                    if page != requested {
                        tracing::warn!(requested, reported = page, "page number mismatch in response");
                    }
                    self.in_flight = None;
                    self.selection = self.selection.clone().with_total_pages(total_pages);
                    self.list.render(&results, RenderMode::for_page(requested));
                } else {
                    tracing::debug!(generation, latest = self.generation, "discarding stale page");
                }
                None
            }
            Event::QueryFailed { generation, error } => {
                if self.is_current(generation) {
                    self.in_flight = None;
                    self.list.show_error(&error);
                } else {
                    tracing::debug!(generation, latest = self.generation, "discarding stale failure");
                }
                None
            }
        };
        (self, request)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.in_flight == Some(generation) && generation == self.generation
    }

    fn select_country(&mut self, name: String) -> Option<FetchRequest> {
        let code = self.resolver.resolve(&name).map(str::to_string);
        self.selection = self.selection.clone().with_country(code.clone());

        match code {
            Some(code) => {
                self.panel = CountryPanel::Resolved { name, code };
                self.issue()
            }
            None => {
                self.panel = match self.resolver.state() {
                    LoadState::Ready => CountryPanel::NotFound { name },
                    _ => CountryPanel::Unavailable { name },
                };
                tracing::warn!("no ISO code for {:?}, skipping query", self.panel.name());
                self.abandon();
                None
            }
        }
    }

    fn toggle_genre(&mut self, id: GenreId) -> Option<FetchRequest> {
        let before = self.genres.active();
        let after = self.genres.toggle(id);
        if before == after && self.selection.genre == after {
            return None;
        }
        self.selection = self.selection.clone().with_genre(after);
        if self.selection.country.is_some() {
            self.issue()
        } else {
            None
        }
    }

    /// A reload can drop the active genre; requery if the filter changed
    fn sync_genre(&mut self) -> Option<FetchRequest> {
        if self.selection.genre == self.genres.active() {
            return None;
        }
        self.selection = self.selection.clone().with_genre(self.genres.active());
        if self.selection.country.is_some() {
            self.issue()
        } else {
            None
        }
    }

    fn advance_page(&mut self) -> Option<FetchRequest> {
        if !self.pager_enabled() || self.selection.country.is_none() {
            return None;
        }
        let next = self.selection.clone().advanced()?;
        self.selection = next;
        self.issue()
    }

    /// Start a query for the current selection under a fresh generation
    fn issue(&mut self) -> Option<FetchRequest> {
        let country = self.selection.country.clone()?;
        self.generation += 1;
        self.in_flight = Some(self.generation);

        if self.selection.page == 1 {
            self.list.show_loading();
        }

        Some(FetchRequest {
            generation: self.generation,
            query: DiscoverQuery {
                country,
                genre: self.selection.genre,
                page: self.selection.page,
                min_vote_count: self.min_vote_count,
            },
        })
    }

    /// Forget any outstanding request and clear the list
    fn abandon(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.list.clear();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
