//! Search and filter types for the catalog store.

use bricksage_core::LegoSet;
use serde::{Deserialize, Serialize};

/// A scored search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetHit {
    #[serde(flatten)]
    pub set: LegoSet,
    /// BM25, cosine, or RRF score depending on the search mode.
    /// Comparable only within one mode.
    pub score: f64,
}

/// Sort order for structured filter queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOrder {
    #[default]
    Newest,
    Oldest,
    MostPieces,
    FewestPieces,
    PriceHigh,
    PriceLow,
}

impl SetOrder {
    /// ORDER BY clause for this ordering. NULLs sort last so that sets
    /// missing the ordered field don't dominate the results.
    pub(crate) fn sql(self) -> &'static str {
        match self {
            SetOrder::Newest => "release_year IS NULL, release_year DESC",
            SetOrder::Oldest => "release_year IS NULL, release_year ASC",
            SetOrder::MostPieces => "piece_count DESC",
            SetOrder::FewestPieces => "piece_count ASC",
            SetOrder::PriceHigh => "price IS NULL, price DESC",
            SetOrder::PriceLow => "price IS NULL, price ASC",
        }
    }
}

/// Structured filter over stored sets.
#[derive(Debug, Clone, Deserialize)]
pub struct SetFilter {
    /// Case-insensitive theme equality.
    pub theme: Option<String>,
    pub year: Option<i32>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub min_pieces: Option<u32>,
    pub max_pieces: Option<u32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    #[serde(default)]
    pub order: SetOrder,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for SetFilter {
    fn default() -> Self {
        Self {
            theme: None,
            year: None,
            min_year: None,
            max_year: None,
            min_pieces: None,
            max_pieces: None,
            min_price: None,
            max_price: None,
            order: SetOrder::default(),
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    20
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_sets: i64,
    pub embeddings_stored: i64,
    pub themes: i64,
    pub embedding_dimension: usize,
    pub db_path: String,
    pub db_size_mb: f64,
    pub matrix_loaded: bool,
    pub matrix_rows: usize,
}
