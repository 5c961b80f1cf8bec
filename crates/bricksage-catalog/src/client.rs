//! Unified catalog client: queries all providers and merges responses.

use reqwest::Client;
use tracing::{debug, warn};

use crate::types::{BrickOwlSet, BricksetSet, RebrickableSet};
use crate::{brickowl, brickset, rebrickable};
use bricksage_core::{Error, LegoSet, Result};

/// Provider keys and endpoints. Base URLs are overridable so tests never
/// touch the network.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub brickset_api_key: Option<String>,
    pub rebrickable_api_key: Option<String>,
    pub brickowl_api_key: Option<String>,
    pub brickset_base_url: String,
    pub rebrickable_base_url: String,
    pub brickowl_base_url: String,
}

impl CatalogConfig {
    /// Read provider keys from the environment
    /// (`BRICKSET_API_KEY`, `REBRICKABLE_API_KEY`, `BRICKOWL_API_KEY`).
    pub fn from_env() -> Self {
        Self {
            brickset_api_key: std::env::var("BRICKSET_API_KEY").ok(),
            rebrickable_api_key: std::env::var("REBRICKABLE_API_KEY").ok(),
            brickowl_api_key: std::env::var("BRICKOWL_API_KEY").ok(),
            brickset_base_url: brickset::DEFAULT_BASE_URL.to_string(),
            rebrickable_base_url: rebrickable::DEFAULT_BASE_URL.to_string(),
            brickowl_base_url: brickowl::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Which providers have keys configured.
    pub fn configured_providers(&self) -> Vec<&'static str> {
        let mut providers = Vec::new();
        if self.brickset_api_key.is_some() {
            providers.push("brickset");
        }
        if self.rebrickable_api_key.is_some() {
            providers.push("rebrickable");
        }
        if self.brickowl_api_key.is_some() {
            providers.push("brickowl");
        }
        providers
    }
}

/// Unified client over the three catalog providers.
pub struct CatalogClient {
    http: Client,
    config: CatalogConfig,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Fetch one set, merging all providers. A provider that errors or has
    /// no key degrades to missing fields; only a set no provider can name
    /// fails the lookup.
    pub async fn fetch_set(&self, set_id: &str) -> Result<LegoSet> {
        let brickset_data = match self.config.brickset_api_key.as_deref() {
            Some(key) => brickset::get_set(
                &self.http,
                &self.config.brickset_base_url,
                key,
                set_id,
            )
            .await
            .unwrap_or_else(|e| {
                warn!("Brickset lookup failed for {}: {}", set_id, e);
                None
            }),
            None => {
                debug!("BRICKSET_API_KEY not set; skipping Brickset");
                None
            }
        };

        let rebrickable_data = match self.config.rebrickable_api_key.as_deref() {
            Some(key) => rebrickable::get_set(
                &self.http,
                &self.config.rebrickable_base_url,
                key,
                set_id,
            )
            .await
            .unwrap_or_else(|e| {
                warn!("Rebrickable lookup failed for {}: {}", set_id, e);
                None
            }),
            None => {
                debug!("REBRICKABLE_API_KEY not set; skipping Rebrickable");
                None
            }
        };

        let brickowl_data = match self.config.brickowl_api_key.as_deref() {
            Some(key) => brickowl::get_set(
                &self.http,
                &self.config.brickowl_base_url,
                key,
                set_id,
            )
            .await
            .unwrap_or_else(|e| {
                warn!("BrickOwl lookup failed for {}: {}", set_id, e);
                None
            }),
            None => {
                debug!("BRICKOWL_API_KEY not set; skipping BrickOwl");
                None
            }
        };

        merge_set(set_id, brickset_data, rebrickable_data, brickowl_data)
    }

    /// Search Brickset and hydrate the top results through `fetch_set`.
    pub async fn search_sets(&self, query: &str, limit: usize) -> Result<Vec<LegoSet>> {
        let key = self
            .config
            .brickset_api_key
            .as_deref()
            .ok_or_else(|| Error::Config("BRICKSET_API_KEY is not set".into()))?;

        let matches = brickset::search(
            &self.http,
            &self.config.brickset_base_url,
            key,
            query,
            limit,
        )
        .await?;

        let mut sets = Vec::new();
        for found in matches.into_iter().take(limit) {
            match self.fetch_set(&found.number).await {
                Ok(set) => sets.push(set),
                Err(e) => warn!("Skipping set {}: {}", found.number, e),
            }
        }
        Ok(sets)
    }
}

/// Merge provider responses into one normalized record.
///
/// Precedence: Brickset names, themes, dates and describes the set;
/// Rebrickable supplies the part count (its inventories are authoritative);
/// BrickOwl supplies the retail price.
pub fn merge_set(
    set_id: &str,
    brickset: Option<BricksetSet>,
    rebrickable: Option<RebrickableSet>,
    brickowl: Option<BrickOwlSet>,
) -> Result<LegoSet> {
    let name = brickset
        .as_ref()
        .map(|b| b.name.clone())
        .or_else(|| rebrickable.as_ref().map(|r| r.name.clone()))
        .ok_or_else(|| Error::NotFound(format!("set {}", set_id)))?;

    let set = LegoSet {
        set_id: set_id.to_string(),
        name,
        theme: brickset
            .as_ref()
            .map(|b| b.theme.clone())
            .unwrap_or_default(),
        piece_count: rebrickable
            .as_ref()
            .and_then(|r| r.num_parts)
            .or_else(|| brickset.as_ref().and_then(|b| b.pieces))
            .unwrap_or(0),
        price: brickowl.as_ref().and_then(|o| o.retail_price()),
        release_year: brickset
            .as_ref()
            .and_then(|b| b.year)
            .or_else(|| rebrickable.as_ref().and_then(|r| r.year)),
        description: brickset.as_ref().and_then(|b| b.description.clone()),
    };

    set.validate()?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brickset_colosseum() -> BricksetSet {
        serde_json::from_value(serde_json::json!({
            "number": "10276",
            "name": "Colosseum",
            "theme": "Creator Expert",
            "year": 2020,
            "pieces": 9036,
            "description": "The largest LEGO brick model"
        }))
        .unwrap()
    }

    fn rebrickable_colosseum() -> RebrickableSet {
        serde_json::from_value(serde_json::json!({
            "set_num": "10276-1",
            "name": "Colosseum",
            "year": 2020,
            "num_parts": 9036
        }))
        .unwrap()
    }

    fn brickowl_colosseum() -> BrickOwlSet {
        serde_json::from_value(serde_json::json!({
            "name": "Colosseum",
            "retail_price": "549.99"
        }))
        .unwrap()
    }

    #[test]
    fn test_merge_all_providers() {
        let set = merge_set(
            "10276",
            Some(brickset_colosseum()),
            Some(rebrickable_colosseum()),
            Some(brickowl_colosseum()),
        )
        .unwrap();

        assert_eq!(set.set_id, "10276");
        assert_eq!(set.name, "Colosseum");
        assert_eq!(set.theme, "Creator Expert");
        assert_eq!(set.piece_count, 9036);
        assert_eq!(set.price, Some(549.99));
        assert_eq!(set.release_year, Some(2020));
        assert!(set.description.is_some());
    }

    #[test]
    fn test_merge_without_pricing() {
        let set = merge_set(
            "10276",
            Some(brickset_colosseum()),
            Some(rebrickable_colosseum()),
            None,
        )
        .unwrap();
        assert_eq!(set.price, None);
        assert_eq!(set.piece_count, 9036);
    }

    #[test]
    fn test_merge_rebrickable_only() {
        // Brickset down — Rebrickable still names the set
        let set = merge_set("10276", None, Some(rebrickable_colosseum()), None).unwrap();
        assert_eq!(set.name, "Colosseum");
        assert_eq!(set.theme, "");
        assert_eq!(set.release_year, Some(2020));
    }

    #[test]
    fn test_merge_piece_count_falls_back_to_brickset() {
        let set = merge_set("10276", Some(brickset_colosseum()), None, None).unwrap();
        assert_eq!(set.piece_count, 9036);
    }

    #[test]
    fn test_merge_nothing_found() {
        let result = merge_set("99999", None, None, None);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_configured_providers() {
        let config = CatalogConfig {
            brickset_api_key: Some("a".into()),
            rebrickable_api_key: None,
            brickowl_api_key: Some("c".into()),
            brickset_base_url: String::new(),
            rebrickable_base_url: String::new(),
            brickowl_base_url: String::new(),
        };
        assert_eq!(config.configured_providers(), vec!["brickset", "brickowl"]);
    }
}
