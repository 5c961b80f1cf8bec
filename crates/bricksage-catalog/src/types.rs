//! Raw provider response models.

use serde::Deserialize;

/// A set as returned by Brickset's `getSets` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BricksetSet {
    /// Set number without variant suffix, e.g. `"10276"`.
    pub number: String,
    pub name: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub pieces: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Envelope around Brickset responses.
#[derive(Debug, Deserialize)]
pub struct BricksetResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub matches: i64,
    #[serde(default)]
    pub sets: Vec<BricksetSet>,
}

/// A set as returned by Rebrickable's `/lego/sets/{set_num}/` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RebrickableSet {
    pub set_num: String,
    pub name: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub num_parts: Option<u32>,
}

/// Pricing data from BrickOwl's `catalog/get_set` endpoint.
///
/// BrickOwl encodes prices inconsistently (sometimes a number, sometimes a
/// string), so the raw field is kept as JSON and read through
/// [`BrickOwlSet::retail_price`].
#[derive(Debug, Clone, Deserialize)]
pub struct BrickOwlSet {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "retail_price")]
    raw_retail_price: Option<serde_json::Value>,
}

impl BrickOwlSet {
    /// Retail price, tolerating both string and numeric JSON encodings.
    pub fn retail_price(&self) -> Option<f64> {
        match &self.raw_retail_price {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brickowl_numeric_price() {
        let set: BrickOwlSet =
            serde_json::from_str(r#"{"name": "Colosseum", "retail_price": 549.99}"#).unwrap();
        assert_eq!(set.retail_price(), Some(549.99));
    }

    #[test]
    fn test_brickowl_string_price() {
        let set: BrickOwlSet =
            serde_json::from_str(r#"{"name": "Colosseum", "retail_price": "549.99"}"#).unwrap();
        assert_eq!(set.retail_price(), Some(549.99));
    }

    #[test]
    fn test_brickowl_missing_price() {
        let set: BrickOwlSet = serde_json::from_str(r#"{"name": "Colosseum"}"#).unwrap();
        assert_eq!(set.retail_price(), None);

        let set: BrickOwlSet =
            serde_json::from_str(r#"{"retail_price": "not a number"}"#).unwrap();
        assert_eq!(set.retail_price(), None);
    }

    #[test]
    fn test_brickset_response_parses() {
        let raw = r#"{
            "status": "success",
            "matches": 1,
            "sets": [{
                "setID": 29962,
                "number": "10276",
                "numberVariant": 1,
                "name": "Colosseum",
                "year": 2020,
                "theme": "Creator Expert",
                "pieces": 9036
            }]
        }"#;
        let resp: BricksetResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.status, "success");
        assert_eq!(resp.sets.len(), 1);
        assert_eq!(resp.sets[0].number, "10276");
        assert_eq!(resp.sets[0].pieces, Some(9036));
    }
}
