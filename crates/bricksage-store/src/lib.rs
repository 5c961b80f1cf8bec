//! BrickSage Store — SQLite catalog with FTS5 + int8 vector search.

pub mod embedding;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::CatalogStore;
pub use types::*;
