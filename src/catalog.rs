//! Reference data loaded once at startup: country codes and genres

use crate::models::{CountryEntry, Genre, GenreId};

/// Load state shared by both reference lists
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Ready,
    Failed(String),
}

/// Maps a map-rendered country name to its ISO 3166-1 code
#[derive(Debug, Clone, Default)]
pub struct CountryResolver {
    entries: Vec<CountryEntry>,
    state: LoadState,
}

impl CountryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&mut self, entries: Vec<CountryEntry>) {
        self.entries = entries;
        self.state = LoadState::Ready;
    }

    pub fn failed(&mut self, error: String) {
        self.entries.clear();
        self.state = LoadState::Failed(error);
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Exact display-name match; `None` when not loaded or unknown
    pub fn resolve(&self, display_name: &str) -> Option<&str> {
        if !self.is_ready() {
            return None;
        }
        self.entries
            .iter()
            .find(|c| c.name == display_name)
            .map(|c| c.code.as_str())
    }
}

/// Genre toggles: at most one active at a time
#[derive(Debug, Clone, Default)]
pub struct GenreCatalog {
    genres: Vec<Genre>,
    active: Option<GenreId>,
    state: LoadState,
}

impl GenreCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&mut self, genres: Vec<Genre>) {
        self.genres = genres;
        self.state = LoadState::Ready;
        if let Some(active) = self.active {
            if !self.genres.iter().any(|g| g.id == active) {
                self.active = None;
            }
        }
    }

    pub fn failed(&mut self, error: String) {
        self.genres.clear();
        self.active = None;
        self.state = LoadState::Failed(error);
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    pub fn active(&self) -> Option<GenreId> {
        self.active
    }

    pub fn name_of(&self, id: GenreId) -> Option<&str> {
        self.genres.iter().find(|g| g.id == id).map(|g| g.name.as_str())
    }

    /// Clicking the active genre clears the filter; any other genre replaces it.
    /// Unknown ids leave the selection untouched. Returns the new filter.
    pub fn toggle(&mut self, id: GenreId) -> Option<GenreId> {
        if !self.genres.iter().any(|g| g.id == id) {
            return self.active;
        }
        self.active = if self.active == Some(id) { None } else { Some(id) };
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countries() -> Vec<CountryEntry> {
        vec![
            CountryEntry { name: "Japan".into(), code: "JP".into(), native_name: None },
            CountryEntry { name: "France".into(), code: "FR".into(), native_name: None },
            CountryEntry { name: "United States of America".into(), code: "US".into(), native_name: None },
        ]
    }

    fn genres() -> Vec<Genre> {
        vec![
            Genre { id: 28, name: "Action".into() },
            Genre { id: 18, name: "Drama".into() },
        ]
    }

    #[test]
    fn test_resolve_known_names() {
        let mut resolver = CountryResolver::new();
        resolver.loaded(countries());
        for entry in countries() {
            assert_eq!(resolver.resolve(&entry.name), Some(entry.code.as_str()));
        }
    }

    #[test]
    fn test_resolve_is_exact() {
        let mut resolver = CountryResolver::new();
        resolver.loaded(countries());
        assert_eq!(resolver.resolve("japan"), None);
        assert_eq!(resolver.resolve("Japan "), None);
        assert_eq!(resolver.resolve("Atlantis"), None);
    }

    #[test]
    fn test_resolve_before_load_or_after_failure() {
        let mut resolver = CountryResolver::new();
        assert_eq!(resolver.resolve("Japan"), None);
        resolver.failed("timeout".into());
        assert_eq!(resolver.resolve("Japan"), None);
        assert_eq!(resolver.state(), &LoadState::Failed("timeout".into()));
    }

    #[test]
    fn test_genre_toggle_sequence() {
        let mut catalog = GenreCatalog::new();
        catalog.loaded(genres());
        assert_eq!(catalog.toggle(28), Some(28));
        assert_eq!(catalog.toggle(28), None);
        assert_eq!(catalog.toggle(18), Some(18));
        assert_eq!(catalog.toggle(28), Some(28));
        assert_eq!(catalog.active(), Some(28));
    }

    #[test]
    fn test_unknown_genre_is_ignored() {
        let mut catalog = GenreCatalog::new();
        catalog.loaded(genres());
        catalog.toggle(18);
        assert_eq!(catalog.toggle(999), Some(18));
    }

    #[test]
    fn test_reload_drops_vanished_active_genre() {
        let mut catalog = GenreCatalog::new();
        catalog.loaded(genres());
        catalog.toggle(28);
        catalog.loaded(vec![Genre { id: 18, name: "Drama".into() }]);
        assert_eq!(catalog.active(), None);
        assert_eq!(catalog.name_of(18), Some("Drama"));
    }
}
