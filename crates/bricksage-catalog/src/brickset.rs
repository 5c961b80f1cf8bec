//! Brickset API v3 client — set details and search.

use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::types::{BricksetResponse, BricksetSet};
use bricksage_core::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://brickset.com";

/// Look up a single set by number. Returns Ok(None) when Brickset has no
/// matching set.
pub async fn get_set(
    client: &Client,
    base_url: &str,
    api_key: &str,
    set_number: &str,
) -> Result<Option<BricksetSet>> {
    let params = json!({ "setNumber": with_variant(set_number) }).to_string();
    let mut resp = request(client, base_url, api_key, &params).await?;
    Ok(if resp.sets.is_empty() {
        None
    } else {
        Some(resp.sets.remove(0))
    })
}

/// Free-text search. Returns up to `page_size` sets.
pub async fn search(
    client: &Client,
    base_url: &str,
    api_key: &str,
    query: &str,
    page_size: usize,
) -> Result<Vec<BricksetSet>> {
    let params = json!({ "query": query, "pageSize": page_size }).to_string();
    let resp = request(client, base_url, api_key, &params).await?;
    debug!("Brickset search '{}': {} matches", query, resp.matches);
    Ok(resp.sets)
}

async fn request(
    client: &Client,
    base_url: &str,
    api_key: &str,
    params: &str,
) -> Result<BricksetResponse> {
    let url = format!("{}/api/v3.asmx/getSets", base_url);
    let response = client
        .get(&url)
        .query(&[("apiKey", api_key), ("userHash", ""), ("params", params)])
        .send()
        .await
        .map_err(|e| Error::provider("brickset", e.to_string()))?;

    if !response.status().is_success() {
        return Err(Error::provider(
            "brickset",
            format!("HTTP {}", response.status()),
        ));
    }

    let body: BricksetResponse = response
        .json()
        .await
        .map_err(|e| Error::provider("brickset", format!("Invalid response: {}", e)))?;

    if body.status != "success" {
        return Err(Error::provider(
            "brickset",
            body.message.unwrap_or_else(|| body.status.clone()),
        ));
    }

    Ok(body)
}

/// Brickset set numbers carry a `-1` variant suffix; add it when missing.
pub fn with_variant(set_number: &str) -> String {
    if set_number.contains('-') {
        set_number.to_string()
    } else {
        format!("{}-1", set_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_variant() {
        assert_eq!(with_variant("10276"), "10276-1");
        assert_eq!(with_variant("10276-1"), "10276-1");
        assert_eq!(with_variant("10276-2"), "10276-2");
    }
}
