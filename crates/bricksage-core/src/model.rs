//! Domain model: normalized LEGO set records and assistant results.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Earliest plausible release year (the first LEGO sets shipped in 1949).
const MIN_RELEASE_YEAR: i32 = 1949;
const MAX_RELEASE_YEAR: i32 = 2100;

/// A LEGO set record normalized across catalog providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegoSet {
    /// Provider-assigned set number, e.g. `"10276"`.
    pub set_id: String,
    pub name: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub piece_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LegoSet {
    /// Validate the record. `set_id` and `name` must be non-empty,
    /// `release_year` plausible when present.
    pub fn validate(&self) -> Result<()> {
        if self.set_id.trim().is_empty() {
            return Err(Error::Validation("set_id must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Validation(format!(
                "set {} has no name",
                self.set_id
            )));
        }
        if let Some(year) = self.release_year {
            if !(MIN_RELEASE_YEAR..=MAX_RELEASE_YEAR).contains(&year) {
                return Err(Error::Validation(format!(
                    "set {}: implausible release year {}",
                    self.set_id, year
                )));
            }
        }
        Ok(())
    }

    /// Text used for semantic indexing: the description when it carries any
    /// content, otherwise the set name.
    pub fn embedding_text(&self) -> &str {
        match &self.description {
            Some(d) if !d.trim().is_empty() => d,
            _ => &self.name,
        }
    }
}

/// Result of an assistant query: the sets surfaced plus the generated answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub sets: Vec<LegoSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> LegoSet {
        LegoSet {
            set_id: "10276".into(),
            name: "Colosseum".into(),
            theme: "Creator Expert".into(),
            piece_count: 9036,
            price: Some(549.99),
            release_year: Some(2020),
            description: Some("The largest LEGO brick model ever".into()),
        }
    }

    #[test]
    fn test_valid_set_passes() {
        assert!(sample_set().validate().is_ok());
    }

    #[test]
    fn test_empty_set_id_rejected() {
        let mut set = sample_set();
        set.set_id = "  ".into();
        assert!(matches!(set.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut set = sample_set();
        set.name = String::new();
        assert!(matches!(set.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_implausible_year_rejected() {
        let mut set = sample_set();
        set.release_year = Some(1900);
        assert!(set.validate().is_err());

        set.release_year = Some(1949);
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_embedding_text_prefers_description() {
        let set = sample_set();
        assert_eq!(set.embedding_text(), "The largest LEGO brick model ever");

        let mut no_desc = sample_set();
        no_desc.description = None;
        assert_eq!(no_desc.embedding_text(), "Colosseum");

        let mut blank_desc = sample_set();
        blank_desc.description = Some("   ".into());
        assert_eq!(blank_desc.embedding_text(), "Colosseum");
    }

    #[test]
    fn test_search_result_serde() {
        let result = SearchResult {
            sets: vec![sample_set()],
            ai_response: Some("The Colosseum has 9036 pieces.".into()),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["sets"][0]["set_id"], "10276");
        assert_eq!(json["ai_response"], "The Colosseum has 9036 pieces.");

        let empty = SearchResult {
            sets: Vec::new(),
            ai_response: None,
        };
        let json = serde_json::to_value(&empty).unwrap();
        assert!(json.get("ai_response").is_none());
    }

    #[test]
    fn test_serde_omits_empty_optionals() {
        let mut set = sample_set();
        set.price = None;
        set.description = None;
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.get("price").is_none());
        assert!(json.get("description").is_none());
        assert_eq!(json["set_id"], "10276");
    }
}
