//! BrickSage Core — domain model, errors, configuration.

pub mod config;
pub mod error;
pub mod model;

pub use config::{BrickSageConfig, DataPaths};
pub use error::{Error, Result};
pub use model::{LegoSet, SearchResult};
