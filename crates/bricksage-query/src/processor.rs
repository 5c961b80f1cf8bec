//! Query parsing: theme, modifier, year, set-number and keyword extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Canonical themes with their spoken variations.
static THEME_VARIATIONS: Lazy<Vec<(&'static str, Vec<&'static str>)>> = Lazy::new(|| {
    vec![
        ("star wars", vec!["star wars", "starwars", "sw", "starwar"]),
        ("city", vec!["city", "lego city", "town"]),
        ("technic", vec!["technic", "technical"]),
        ("friends", vec!["friends", "lego friends"]),
        ("ninjago", vec!["ninjago", "ninja go", "ninja"]),
        ("architecture", vec!["architecture", "architectural"]),
        ("creator", vec!["creator", "creative"]),
        ("duplo", vec!["duplo", "duplo blocks"]),
        ("bionicle", vec!["bionicle", "bionicles"]),
        ("marvel", vec!["marvel", "superheroes", "avengers"]),
        ("dc", vec!["dc", "batman", "superman"]),
        ("harry potter", vec!["harry potter", "hp", "wizarding world"]),
        ("minecraft", vec!["minecraft", "mine craft"]),
        ("jurassic world", vec!["jurassic world", "jurassic park", "dinosaurs"]),
        ("speed champions", vec!["speed champions", "cars", "racing"]),
        ("ideas", vec!["ideas", "lego ideas", "fan designed"]),
        ("expert", vec!["expert", "expert level", "adult"]),
        ("classic", vec!["classic", "basic", "traditional"]),
    ]
});

/// Acceptance threshold for fuzzy theme matching.
const FUZZY_THEME_THRESHOLD: f64 = 0.8;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static SET_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3,6}\b").unwrap());
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with",
        "by", "set", "sets", "lego",
    ]
    .into_iter()
    .collect()
});

/// Time-related query modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeModifier {
    Oldest,
    Newest,
    Vintage,
    Modern,
}

impl TimeModifier {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            TimeModifier::Oldest => &["oldest", "first", "earliest", "original"],
            TimeModifier::Newest => &["newest", "latest", "recent", "current"],
            TimeModifier::Vintage => &["vintage", "retro", "old"],
            TimeModifier::Modern => &["modern", "new", "contemporary"],
        }
    }

    const ALL: [TimeModifier; 4] = [
        TimeModifier::Oldest,
        TimeModifier::Newest,
        TimeModifier::Vintage,
        TimeModifier::Modern,
    ];
}

/// Size-related query modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeModifier {
    Largest,
    Smallest,
    Medium,
}

impl SizeModifier {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            SizeModifier::Largest => &["largest", "biggest", "huge", "massive"],
            SizeModifier::Smallest => &["smallest", "tiny", "mini", "small"],
            SizeModifier::Medium => &["medium", "average", "normal"],
        }
    }

    const ALL: [SizeModifier; 3] = [
        SizeModifier::Largest,
        SizeModifier::Smallest,
        SizeModifier::Medium,
    ];
}

/// Price-related query modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceModifier {
    Expensive,
    Cheap,
    Free,
}

impl PriceModifier {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            PriceModifier::Expensive => &["expensive", "costly", "premium", "high price"],
            PriceModifier::Cheap => &["cheap", "inexpensive", "affordable", "low price"],
            PriceModifier::Free => &["free", "no cost", "zero price"],
        }
    }

    const ALL: [PriceModifier; 3] = [
        PriceModifier::Expensive,
        PriceModifier::Cheap,
        PriceModifier::Free,
    ];
}

/// Structured view of a free-form query.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedQuery {
    pub original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_modifier: Option<TimeModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_modifier: Option<SizeModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_modifier: Option<PriceModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_number: Option<String>,
    pub keywords: Vec<String>,
}

impl ParsedQuery {
    /// Generate expanded search queries from the parsed components:
    /// the original, the theme (optionally combined with a time modifier),
    /// the set number, and the individual keywords. Deduplicated.
    pub fn expanded_queries(&self) -> Vec<String> {
        let mut queries = vec![self.original.trim().to_string()];

        if let Some(theme) = &self.theme {
            queries.push(theme.clone());
            if let Some(time) = self.time_modifier {
                queries.push(format!("{:?} {}", time, theme).to_lowercase());
            }
        }

        if let Some(number) = &self.set_number {
            queries.push(number.clone());
        }

        queries.extend(self.keywords.iter().cloned());

        let mut seen = HashSet::new();
        queries
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty() && seen.insert(q.clone()))
            .collect()
    }
}

/// Parse a free-form query into structured search parameters.
pub fn parse(query: &str) -> ParsedQuery {
    let year = extract_year(query);
    let parsed = ParsedQuery {
        original: query.to_string(),
        theme: extract_theme(query),
        time_modifier: extract_time_modifier(query),
        size_modifier: extract_size_modifier(query),
        price_modifier: extract_price_modifier(query),
        year,
        set_number: extract_set_number(query, year),
        keywords: extract_keywords(query),
    };
    debug!(?parsed, "parsed query");
    parsed
}

/// Extract a canonical theme: variation substring match first, then fuzzy
/// matching against canonical names.
pub fn extract_theme(query: &str) -> Option<String> {
    let query_lower = query.to_lowercase();

    for (theme, variations) in THEME_VARIATIONS.iter() {
        for variation in variations {
            if contains_phrase(&query_lower, variation) {
                return Some((*theme).to_string());
            }
        }
    }

    // Fuzzy fallback against canonical names
    let mut best: Option<(&str, f64)> = None;
    for (theme, _) in THEME_VARIATIONS.iter() {
        let score = fuzzy_phrase_score(&query_lower, theme);
        if score >= FUZZY_THEME_THRESHOLD && best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((theme, score));
        }
    }
    best.map(|(theme, _)| theme.to_string())
}

/// Whole-word phrase containment ("sw" must not match inside "swoosh").
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let words: Vec<&str> = haystack.split_whitespace().collect();
    let phrase_words: Vec<&str> = phrase.split_whitespace().collect();
    if phrase_words.is_empty() || phrase_words.len() > words.len() {
        return false;
    }
    words
        .windows(phrase_words.len())
        .any(|w| {
            w.iter()
                .zip(&phrase_words)
                .all(|(a, b)| a.trim_matches(|c: char| !c.is_alphanumeric()) == *b)
        })
}

/// Best Jaro-Winkler similarity between the phrase and any same-length
/// word window of the query.
fn fuzzy_phrase_score(query: &str, phrase: &str) -> f64 {
    let words: Vec<&str> = query.split_whitespace().collect();
    let n = phrase.split_whitespace().count().max(1);
    if words.is_empty() {
        return 0.0;
    }

    let mut best: f64 = 0.0;
    for window in words.windows(n.min(words.len())) {
        let candidate = window.join(" ");
        let candidate: String = candidate
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        best = best.max(strsim::jaro_winkler(&candidate, phrase));
    }
    best
}

pub fn extract_time_modifier(query: &str) -> Option<TimeModifier> {
    let query_lower = query.to_lowercase();
    TimeModifier::ALL
        .into_iter()
        .find(|m| m.keywords().iter().any(|kw| contains_phrase(&query_lower, kw)))
}

pub fn extract_size_modifier(query: &str) -> Option<SizeModifier> {
    let query_lower = query.to_lowercase();
    SizeModifier::ALL
        .into_iter()
        .find(|m| m.keywords().iter().any(|kw| contains_phrase(&query_lower, kw)))
}

pub fn extract_price_modifier(query: &str) -> Option<PriceModifier> {
    let query_lower = query.to_lowercase();
    PriceModifier::ALL
        .into_iter()
        .find(|m| m.keywords().iter().any(|kw| contains_phrase(&query_lower, kw)))
}

/// First four-digit year in 1900–2099.
pub fn extract_year(query: &str) -> Option<i32> {
    YEAR_RE.find(query).and_then(|m| m.as_str().parse().ok())
}

/// First 3–6 digit token that wasn't already consumed as a year.
pub fn extract_set_number(query: &str, year: Option<i32>) -> Option<String> {
    let year_str = year.map(|y| y.to_string());
    SET_NUMBER_RE
        .find_iter(query)
        .map(|m| m.as_str().to_string())
        .find(|candidate| year_str.as_deref() != Some(candidate.as_str()))
}

/// Lowercased content keywords: stop words removed, short tokens dropped.
pub fn extract_keywords(query: &str) -> Vec<String> {
    WORD_RE
        .find_iter(&query.to_lowercase())
        .map(|m| m.as_str().to_string())
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_direct_match() {
        assert_eq!(extract_theme("show me star wars sets"), Some("star wars".into()));
        assert_eq!(extract_theme("any Technic models?"), Some("technic".into()));
    }

    #[test]
    fn test_theme_variation_match() {
        assert_eq!(extract_theme("starwars spaceships"), Some("star wars".into()));
        assert_eq!(extract_theme("ninja sets for kids"), Some("ninjago".into()));
        assert_eq!(extract_theme("batman vehicles"), Some("dc".into()));
    }

    #[test]
    fn test_theme_fuzzy_match() {
        // Misspelling close enough for Jaro-Winkler
        assert_eq!(extract_theme("star wras sets"), Some("star wars".into()));
        assert_eq!(extract_theme("ninjago sets"), Some("ninjago".into()));
    }

    #[test]
    fn test_theme_no_match() {
        assert_eq!(extract_theme("pirate ships please"), None);
    }

    #[test]
    fn test_short_variation_needs_word_boundary() {
        // "sw" the word matches star wars; "sw" inside a word must not
        assert_eq!(extract_theme("any sw sets?"), Some("star wars".into()));
        assert_eq!(extract_theme("swoosh models"), None);
    }

    #[test]
    fn test_time_modifiers() {
        assert_eq!(
            extract_time_modifier("the oldest set ever"),
            Some(TimeModifier::Oldest)
        );
        assert_eq!(
            extract_time_modifier("latest releases"),
            Some(TimeModifier::Newest)
        );
        assert_eq!(extract_time_modifier("a nice spaceship"), None);
    }

    #[test]
    fn test_size_and_price_modifiers() {
        assert_eq!(
            extract_size_modifier("the biggest castle"),
            Some(SizeModifier::Largest)
        );
        assert_eq!(
            extract_price_modifier("something affordable"),
            Some(PriceModifier::Cheap)
        );
    }

    #[test]
    fn test_year_extraction() {
        assert_eq!(extract_year("sets from 1999"), Some(1999));
        assert_eq!(extract_year("released in 2023 maybe"), Some(2023));
        assert_eq!(extract_year("set 10276"), None);
        assert_eq!(extract_year("no year here"), None);
    }

    #[test]
    fn test_set_number_extraction() {
        assert_eq!(extract_set_number("set 10276 details", None), Some("10276".into()));
        assert_eq!(extract_set_number("details on 75192", None), Some("75192".into()));
        assert_eq!(extract_set_number("just words", None), None);
    }

    #[test]
    fn test_year_not_mistaken_for_set_number() {
        let q = "star wars sets from 1999";
        let year = extract_year(q);
        assert_eq!(year, Some(1999));
        assert_eq!(extract_set_number(q, year), None);
    }

    #[test]
    fn test_keywords_drop_stop_words() {
        let kw = extract_keywords("the biggest LEGO set with a falcon");
        assert!(kw.contains(&"falcon".to_string()));
        assert!(kw.contains(&"biggest".to_string()));
        assert!(!kw.contains(&"the".to_string()));
        assert!(!kw.contains(&"set".to_string()));
        assert!(!kw.contains(&"lego".to_string()));
    }

    #[test]
    fn test_parse_full_query() {
        let parsed = parse("what is the oldest star wars set from 1999?");
        assert_eq!(parsed.theme.as_deref(), Some("star wars"));
        assert_eq!(parsed.time_modifier, Some(TimeModifier::Oldest));
        assert_eq!(parsed.year, Some(1999));
        assert_eq!(parsed.set_number, None);
        assert!(parsed.keywords.contains(&"oldest".to_string()));
    }

    #[test]
    fn test_expanded_queries_dedup() {
        let parsed = parse("oldest star wars set");
        let queries = parsed.expanded_queries();

        assert!(queries.contains(&"oldest star wars set".to_string()));
        assert!(queries.contains(&"star wars".to_string()));
        assert!(queries.contains(&"oldest star wars".to_string()));

        let unique: HashSet<&String> = queries.iter().collect();
        assert_eq!(unique.len(), queries.len());
        assert!(queries.iter().all(|q| !q.is_empty()));
    }

    #[test]
    fn test_expanded_queries_include_set_number() {
        let parsed = parse("tell me about set 10276");
        assert!(parsed.expanded_queries().contains(&"10276".to_string()));
    }
}
