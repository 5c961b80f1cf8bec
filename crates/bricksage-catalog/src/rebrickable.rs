//! Rebrickable API v3 client — part counts.

use reqwest::Client;

use crate::brickset::with_variant;
use crate::types::RebrickableSet;
use bricksage_core::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://rebrickable.com";

/// Look up a set by number. Returns Ok(None) on 404.
pub async fn get_set(
    client: &Client,
    base_url: &str,
    api_key: &str,
    set_number: &str,
) -> Result<Option<RebrickableSet>> {
    let url = format!(
        "{}/api/v3/lego/sets/{}/",
        base_url,
        with_variant(set_number)
    );
    let response = client
        .get(&url)
        .header("Authorization", format!("key {}", api_key))
        .send()
        .await
        .map_err(|e| Error::provider("rebrickable", e.to_string()))?;

    if response.status().as_u16() == 404 {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(Error::provider(
            "rebrickable",
            format!("HTTP {}", response.status()),
        ));
    }

    let set: RebrickableSet = response
        .json()
        .await
        .map_err(|e| Error::provider("rebrickable", format!("Invalid response: {}", e)))?;
    Ok(Some(set))
}
