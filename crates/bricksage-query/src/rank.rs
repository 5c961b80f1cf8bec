//! Relevance ranking and modifier → filter mapping.

use bricksage_core::LegoSet;
use bricksage_store::{SetFilter, SetOrder};

use crate::processor::{ParsedQuery, PriceModifier, SizeModifier, TimeModifier};

/// Rank candidate sets against a parsed query. Additive scoring:
/// theme match +10; time modifier vs release year +5; size modifier vs
/// piece count +3; price modifier vs price +3; keyword in name +2, in
/// description +1. Stable sort, highest score first.
pub fn rank(sets: &[LegoSet], query: &ParsedQuery) -> Vec<LegoSet> {
    if sets.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&LegoSet, i32)> = sets
        .iter()
        .map(|set| (set, score_set(set, query)))
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(set, _)| set.clone()).collect()
}

fn score_set(set: &LegoSet, query: &ParsedQuery) -> i32 {
    let mut score = 0;

    if let Some(theme) = &query.theme {
        if set.theme.to_lowercase().contains(&theme.to_lowercase()) {
            score += 10;
        }
    }

    if let (Some(time), Some(year)) = (query.time_modifier, set.release_year) {
        match time {
            TimeModifier::Oldest | TimeModifier::Vintage if year < 2000 => score += 5,
            TimeModifier::Newest | TimeModifier::Modern if year > 2010 => score += 5,
            _ => {}
        }
    }

    if let Some(size) = query.size_modifier {
        match size {
            SizeModifier::Largest if set.piece_count > 1000 => score += 3,
            SizeModifier::Smallest if set.piece_count > 0 && set.piece_count < 100 => score += 3,
            _ => {}
        }
    }

    if let (Some(price_mod), Some(price)) = (query.price_modifier, set.price) {
        match price_mod {
            PriceModifier::Expensive if price > 100.0 => score += 3,
            PriceModifier::Cheap if price < 50.0 => score += 3,
            _ => {}
        }
    }

    let name_lower = set.name.to_lowercase();
    let desc_lower = set.description.as_deref().map(|d| d.to_lowercase());
    for keyword in &query.keywords {
        if name_lower.contains(keyword) {
            score += 2;
        }
        if let Some(desc) = &desc_lower {
            if desc.contains(keyword) {
                score += 1;
            }
        }
    }

    score
}

/// Map parsed modifiers onto a structured store filter so that "oldest star
/// wars set" can be answered directly from SQL rather than only by re-ranking.
pub fn to_filter(query: &ParsedQuery) -> SetFilter {
    let mut filter = SetFilter::default();

    // Store themes are display-cased ("Star Wars"); the filter compares
    // case-insensitively.
    filter.theme = query.theme.clone();
    filter.year = query.year;

    if let Some(time) = query.time_modifier {
        filter.order = match time {
            TimeModifier::Oldest | TimeModifier::Vintage => SetOrder::Oldest,
            TimeModifier::Newest | TimeModifier::Modern => SetOrder::Newest,
        };
    }

    if let Some(size) = query.size_modifier {
        match size {
            SizeModifier::Largest => filter.order = SetOrder::MostPieces,
            SizeModifier::Smallest => filter.order = SetOrder::FewestPieces,
            SizeModifier::Medium => {}
        }
    }

    if let Some(price_mod) = query.price_modifier {
        match price_mod {
            PriceModifier::Expensive => filter.order = SetOrder::PriceHigh,
            PriceModifier::Cheap => filter.order = SetOrder::PriceLow,
            PriceModifier::Free => filter.max_price = Some(0.0),
        }
    }

    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::parse;

    fn set(id: &str, name: &str, theme: &str, pieces: u32, price: Option<f64>, year: Option<i32>) -> LegoSet {
        LegoSet {
            set_id: id.into(),
            name: name.into(),
            theme: theme.into(),
            piece_count: pieces,
            price,
            release_year: year,
            description: Some(format!("{} from the {} theme", name, theme)),
        }
    }

    #[test]
    fn test_theme_match_outranks() {
        let sets = vec![
            set("60380", "Downtown", "City", 2010, Some(199.99), Some(2023)),
            set("75192", "Millennium Falcon", "Star Wars", 7541, Some(849.99), Some(2017)),
        ];

        let ranked = rank(&sets, &parse("star wars sets"));
        assert_eq!(ranked[0].set_id, "75192");
    }

    #[test]
    fn test_time_modifier_boosts_old_sets() {
        let sets = vec![
            set("75192", "Millennium Falcon", "Star Wars", 7541, None, Some(2017)),
            set("7140", "X-wing Fighter", "Star Wars", 263, None, Some(1999)),
        ];

        let ranked = rank(&sets, &parse("oldest star wars set"));
        assert_eq!(ranked[0].set_id, "7140");
    }

    #[test]
    fn test_keyword_match_in_name() {
        let sets = vec![
            set("60380", "Downtown", "City", 2010, None, None),
            set("75257", "Falcon Microfighter", "Star Wars", 101, None, None),
        ];

        let ranked = rank(&sets, &parse("falcon"));
        assert_eq!(ranked[0].set_id, "75257");
    }

    #[test]
    fn test_size_and_price_boosts() {
        let sets = vec![
            set("30495", "AT-ST Mini", "Star Wars", 79, Some(4.99), None),
            set("75192", "Millennium Falcon", "Star Wars", 7541, Some(849.99), None),
        ];

        let ranked = rank(&sets, &parse("smallest cheap star wars"));
        assert_eq!(ranked[0].set_id, "30495");

        let ranked = rank(&sets, &parse("biggest most expensive star wars"));
        assert_eq!(ranked[0].set_id, "75192");
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(&[], &parse("anything")).is_empty());
    }

    #[test]
    fn test_filter_mapping_theme_and_order() {
        let filter = to_filter(&parse("oldest star wars set"));
        assert_eq!(filter.theme.as_deref(), Some("star wars"));
        assert_eq!(filter.order, SetOrder::Oldest);

        let filter = to_filter(&parse("biggest technic set"));
        assert_eq!(filter.theme.as_deref(), Some("technic"));
        assert_eq!(filter.order, SetOrder::MostPieces);
    }

    #[test]
    fn test_filter_mapping_year() {
        let filter = to_filter(&parse("city sets from 1999"));
        assert_eq!(filter.year, Some(1999));
        assert_eq!(filter.theme.as_deref(), Some("city"));
    }

    #[test]
    fn test_filter_mapping_price() {
        let filter = to_filter(&parse("cheap ninjago sets"));
        assert_eq!(filter.order, SetOrder::PriceLow);
    }
}
