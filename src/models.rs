//! Data models for World Cinema Map

use serde::{Deserialize, Serialize};

/// UI Tab selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tab {
    Map,
    Settings,
    Console,
}

/// Country reference entry from the metadata source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryEntry {
    #[serde(rename = "english_name")]
    pub name: String,
    #[serde(rename = "iso_3166_1")]
    pub code: String,
    #[serde(default)]
    pub native_name: Option<String>,
}

/// Genre identifier as defined by the metadata source's taxonomy
pub type GenreId = i64;

/// Genre entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// Movie record as returned by a discover query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl Movie {
    /// Release date, treating an empty string as missing
    pub fn release_date(&self) -> Option<&str> {
        self.release_date.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// One page of discover results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}
