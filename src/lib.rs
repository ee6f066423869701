//! flixrecom - movie and TV discovery over TMDB.
//!
//! Three pipelines share one [`catalog::CatalogClient`]: the rotating
//! [`banner`], the filterable [`discovery`] grid and [`search`].

pub mod banner;
pub mod catalog;
pub mod detail;
pub mod discovery;
pub mod enrich;
pub mod media;
pub mod normalize;
pub mod search;
pub mod settings;
pub mod tmdb;

#[cfg(test)]
mod testing;

pub use catalog::{CatalogClient, Locale};
pub use media::{ApiError, Category, ContentItem, ContentKind, MediaType};
pub use settings::AppSettings;
pub use tmdb::TmdbClient;
