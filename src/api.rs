//! TMDB API client

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::{CountryEntry, Genre, GenreId, MoviePage};

/// Sort key for discover queries: best rated first
pub const SORT_BY_RATING: &str = "vote_average.desc";

/// Poster size segment used for list thumbnails
const POSTER_SIZE: &str = "w500";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Malformed response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parameters for one page of a discover query
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    pub country: String,
    pub genre: Option<GenreId>,
    pub page: u32,
    pub min_vote_count: u32,
}

impl DiscoverQuery {
    /// Query parameters in request order (without the API key)
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("with_origin_country", self.country.clone()),
            ("sort_by", SORT_BY_RATING.to_string()),
            ("vote_count.gte", self.min_vote_count.to_string()),
            ("page", self.page.to_string()),
        ];
        if let Some(genre) = self.genre {
            params.push(("with_genres", genre.to_string()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

pub struct TmdbClient {
    agent: ureq::Agent,
    api_base: String,
    image_base: String,
    api_key: String,
    user_agent: String,
}

impl TmdbClient {
    pub fn new(config: &AppConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .timeout_connect(Some(Duration::from_secs(10)))
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self {
            agent,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            image_base: config.image_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            user_agent: format!("WorldCinemaMap/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String, ApiError> {
        let request = params.iter().fold(
            self.agent
                .get(url)
                .header("User-Agent", &self.user_agent)
                .header("Accept", "application/json"),
            |request, (key, value)| request.query(*key, value),
        );

        let mut response = request
            .call()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(ApiError::Status(status));
        }

        response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Read(e.to_string()))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T, ApiError> {
        let mut all = Vec::with_capacity(params.len() + 1);
        all.push(("api_key", self.api_key.clone()));
        all.extend(params.iter().cloned());
        let body = self.get_text(&self.endpoint(path), &all)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Country reference list (display name + ISO 3166-1 code)
    pub fn get_countries(&self) -> Result<Vec<CountryEntry>, ApiError> {
        self.get_json("configuration/countries", &[])
    }

    /// Movie genre list
    pub fn get_genres(&self) -> Result<Vec<Genre>, ApiError> {
        let list: GenreList = self.get_json("genre/movie/list", &[])?;
        Ok(list.genres)
    }

    /// One page of movies produced in `query.country`, best rated first
    pub fn discover_movies(&self, query: &DiscoverQuery) -> Result<MoviePage, ApiError> {
        self.get_json("discover/movie", &query.params())
    }

    /// Raw TopoJSON world boundaries (not a TMDB endpoint)
    pub fn get_atlas(&self, url: &str) -> Result<String, ApiError> {
        self.get_text(url, &[])
    }

    pub fn image_base(&self) -> &str {
        &self.image_base
    }
}

/// Full poster URL for a poster path, if there is one
pub fn poster_url(image_base: &str, poster_path: Option<&str>) -> Option<String> {
    let path = poster_path.map(str::trim).filter(|p| !p.is_empty())?;
    let sep = if path.starts_with('/') { "" } else { "/" };
    Some(format!(
        "{}/{}{}{}",
        image_base.trim_end_matches('/'),
        POSTER_SIZE,
        sep,
        path
    ))
}
