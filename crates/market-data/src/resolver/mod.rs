//! Identifier routing and payload normalization.
//!
//! - [`route_for`] / [`split_by_market`]: pick the upstream from the
//!   identifier's shape
//! - [`normalize`]: map provider payloads into canonical models

pub mod normalize;
mod routing;

pub use routing::{is_valid_symbol, normalize_symbol, route_for, split_by_market, Market};
