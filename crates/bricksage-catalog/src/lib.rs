//! BrickSage Catalog — unified access to the three LEGO data providers.
//!
//! Brickset names and describes a set, Rebrickable knows its inventory
//! size, BrickOwl tracks pricing. `CatalogClient` queries all three and
//! merges the answers into one normalized `LegoSet`.

pub mod brickowl;
pub mod brickset;
pub mod client;
pub mod rebrickable;
pub mod types;

pub use client::{merge_set, CatalogClient, CatalogConfig};
pub use types::{BrickOwlSet, BricksetSet, RebrickableSet};
