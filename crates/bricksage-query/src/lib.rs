//! BrickSage Query — natural-language query processing.
//!
//! Turns free-form questions ("what's the oldest star wars set?") into
//! structured search parameters: a canonical theme, time/size/price
//! modifiers, an explicit year or set number, and content keywords.
//! Also ranks candidate sets against the parsed query and maps modifiers
//! onto store filters.

pub mod processor;
pub mod rank;

pub use processor::{
    parse, ParsedQuery, PriceModifier, SizeModifier, TimeModifier,
};
pub use rank::{rank, to_filter};
