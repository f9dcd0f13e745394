#[macro_use]
pub mod restate_serde;
pub mod clustering;
pub mod config;
pub mod entities;
pub mod extraction;
pub mod findings;
pub mod geo;
pub mod heat_map;
pub mod investigations;
pub mod members;
pub mod query_helpers;
pub mod scraping;
pub mod search;
pub mod shared;
pub mod signals;
pub mod taxonomy;
pub mod translation;
