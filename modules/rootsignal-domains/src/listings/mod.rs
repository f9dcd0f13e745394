pub mod models;
pub mod restate;

pub use models::listing::{
    Listing, ListingDetail, ListingFilters, ListingStats, ListingWithDistance, TagCount,
};
pub use restate::{ListingsService, ListingsServiceImpl};
