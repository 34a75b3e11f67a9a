//! Movie list view model: what the side panel shows for the current query

use crate::api::poster_url;
use crate::models::Movie;

/// Shown when a movie has no release date
pub const MISSING_YEAR: &str = "N/A";

/// Number of placeholder rows while the first page loads
pub const SKELETON_ROWS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderMode {
    /// New selection: drop everything shown before
    Replace,
    /// Next page: add below the existing cards
    Append,
}

impl RenderMode {
    pub fn for_page(page: u32) -> Self {
        if page <= 1 {
            RenderMode::Replace
        } else {
            RenderMode::Append
        }
    }
}

/// One rendered movie row
#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub title: String,
    pub poster_url: Option<String>,
    pub rating: String,
    pub year: String,
}

impl MovieCard {
    pub fn from_movie(movie: &Movie, image_base: &str) -> Self {
        Self {
            title: movie.title.clone(),
            poster_url: poster_url(image_base, movie.poster_path.as_deref()),
            rating: format_rating(movie.vote_average),
            year: release_year(movie.release_date()).to_string(),
        }
    }
}

/// Rating with exactly one decimal place, halves rounded away from zero
pub fn format_rating(vote_average: f64) -> String {
    format!("{:.1}", (vote_average * 10.0).round() / 10.0)
}

/// Portion of the release date before the first separator, or "N/A"
pub fn release_year(release_date: Option<&str>) -> &str {
    match release_date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(date) => date.split('-').next().unwrap_or(date),
        None => MISSING_YEAR,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListStatus {
    /// Nothing selected yet, or the selection could not be resolved
    #[default]
    Idle,
    /// First page in flight; skeleton rows replace the list
    Loading,
    Ready,
    /// Replace-mode render of an empty page
    NoResults,
    /// Query failed; cards from earlier pages are kept
    Failed(String),
}

/// Contents of the movie list container
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListView {
    cards: Vec<MovieCard>,
    status: ListStatus,
    image_base: String,
}

impl ListView {
    pub fn new(image_base: &str) -> Self {
        Self {
            cards: Vec::new(),
            status: ListStatus::Idle,
            image_base: image_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn cards(&self) -> &[MovieCard] {
        &self.cards
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    pub fn set_image_base(&mut self, image_base: &str) {
        self.image_base = image_base.trim_end_matches('/').to_string();
    }

    /// Render a fetched page
    pub fn render(&mut self, movies: &[Movie], mode: RenderMode) {
        if mode == RenderMode::Replace {
            self.cards.clear();
        }

        if movies.is_empty() {
            if mode == RenderMode::Replace {
                self.status = ListStatus::NoResults;
            } else if !matches!(self.status, ListStatus::NoResults) {
                self.status = ListStatus::Ready;
            }
            return;
        }

        let image_base = &self.image_base;
        self.cards
            .extend(movies.iter().map(|m| MovieCard::from_movie(m, image_base)));
        self.status = ListStatus::Ready;
    }

    /// Loading placeholder replaces prior content
    pub fn show_loading(&mut self) {
        self.cards.clear();
        self.status = ListStatus::Loading;
    }

    pub fn show_error(&mut self, error: &str) {
        self.status = ListStatus::Failed(error.to_string());
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.status = ListStatus::Idle;
    }

    /// Number of visible list nodes: skeleton rows, the "no results" node, or cards
    pub fn node_count(&self) -> usize {
        match self.status {
            ListStatus::Loading => SKELETON_ROWS,
            ListStatus::NoResults => 1,
            _ => self.cards.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://image.tmdb.org/t/p";

    fn movie(title: &str, rating: f64, date: Option<&str>, poster: Option<&str>) -> Movie {
        Movie {
            id: 0,
            title: title.to_string(),
            poster_path: poster.map(String::from),
            vote_average: rating,
            release_date: date.map(String::from),
        }
    }

    #[test]
    fn test_rating_one_decimal() {
        assert_eq!(format_rating(7.456), "7.5");
        assert_eq!(format_rating(8.0), "8.0");
        assert_eq!(format_rating(0.0), "0.0");
    }

    #[test]
    fn test_rating_ties_round_up() {
        assert_eq!(format_rating(7.25), "7.3");
        assert_eq!(format_rating(6.25), "6.3");
        assert_eq!(format_rating(8.75), "8.8");
        assert_eq!(format_rating(0.25), "0.3");
    }

    #[test]
    fn test_release_year() {
        assert_eq!(release_year(Some("2014-03-21")), "2014");
        assert_eq!(release_year(None), "N/A");
        assert_eq!(release_year(Some("")), "N/A");
        assert_eq!(release_year(Some("1999")), "1999");
    }

    #[test]
    fn test_card_without_poster_has_no_image() {
        let card = MovieCard::from_movie(&movie("Ikiru", 8.2, Some("1952-10-09"), None), BASE);
        assert_eq!(card.poster_url, None);
        assert_eq!(card.year, "1952");
        assert_eq!(card.rating, "8.2");
    }

    #[test]
    fn test_card_with_poster() {
        let card = MovieCard::from_movie(&movie("Ran", 8.1, None, Some("/ran.jpg")), BASE);
        assert_eq!(card.poster_url.as_deref(), Some("https://image.tmdb.org/t/p/w500/ran.jpg"));
        assert_eq!(card.year, "N/A");
    }

    #[test]
    fn test_replace_with_empty_shows_single_no_results_node() {
        let mut view = ListView::new(BASE);
        view.render(&[movie("A", 7.0, None, None)], RenderMode::Replace);
        view.render(&[], RenderMode::Replace);
        assert_eq!(view.status(), &ListStatus::NoResults);
        assert!(view.cards().is_empty());
        assert_eq!(view.node_count(), 1);
    }

    #[test]
    fn test_append_empty_adds_nothing() {
        let mut view = ListView::new(BASE);
        view.render(&[movie("A", 7.0, None, None), movie("B", 6.0, None, None)], RenderMode::Replace);
        view.render(&[], RenderMode::Append);
        assert_eq!(view.cards().len(), 2);
        assert_eq!(view.node_count(), 2);
        assert_eq!(view.status(), &ListStatus::Ready);
    }

    #[test]
    fn test_append_keeps_existing_cards() {
        let mut view = ListView::new(BASE);
        view.render(&[movie("A", 7.0, None, None)], RenderMode::Replace);
        view.render(&[movie("B", 6.0, None, None)], RenderMode::Append);
        let titles: Vec<_> = view.cards().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_loading_replaces_content() {
        let mut view = ListView::new(BASE);
        view.render(&[movie("A", 7.0, None, None)], RenderMode::Replace);
        view.show_loading();
        assert!(view.cards().is_empty());
        assert_eq!(view.node_count(), SKELETON_ROWS);
    }

    #[test]
    fn test_render_mode_for_page() {
        assert_eq!(RenderMode::for_page(1), RenderMode::Replace);
        assert_eq!(RenderMode::for_page(2), RenderMode::Append);
    }
}
