//! Market data models
//!
//! This module contains the canonical data types produced by the gateway:
//! - `types` - Provider identifiers
//! - `quote` - Canonical quote shape (Quote)
//! - `profile` - Company profile data (CompanyProfile)
//! - `search` - Search result data (SearchResult, Country)
//! - `market` - Composite views (MarketIndices, TopMovers, HeatmapTile, NewsArticle)

mod market;
mod profile;
mod quote;
mod search;
mod types;

pub use market::{HeatmapTile, MarketIndices, Mover, NewsArticle, TopMovers};
pub use profile::CompanyProfile;
pub use quote::Quote;
pub use search::{Country, SearchResult};
pub use types::{ProviderId, BRAPI_PROVIDER_ID, TIINGO_PROVIDER_ID};
