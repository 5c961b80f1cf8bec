//! BrickOwl API client — retail pricing.

use reqwest::Client;

use crate::types::BrickOwlSet;
use bricksage_core::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.brickowl.com";

/// Look up pricing for a set. Returns Ok(None) on 404.
pub async fn get_set(
    client: &Client,
    base_url: &str,
    api_key: &str,
    set_number: &str,
) -> Result<Option<BrickOwlSet>> {
    let url = format!("{}/v1/catalog/get_set", base_url);
    let response = client
        .get(&url)
        .query(&[("set_id", set_number)])
        .header("Authorization", format!("Bearer {}", api_key))
        .send()
        .await
        .map_err(|e| Error::provider("brickowl", e.to_string()))?;

    if response.status().as_u16() == 404 {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(Error::provider(
            "brickowl",
            format!("HTTP {}", response.status()),
        ));
    }

    let set: BrickOwlSet = response
        .json()
        .await
        .map_err(|e| Error::provider("brickowl", format!("Invalid response: {}", e)))?;
    Ok(Some(set))
}
