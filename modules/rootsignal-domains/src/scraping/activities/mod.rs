pub mod detect_entity;
pub mod discover_sources;
pub mod qualify_source;
pub mod scrape_source;
pub mod store_snapshot;

pub use detect_entity::detect_source_entity;
pub use discover_sources::discover_sources;
pub use qualify_source::qualify_source;
pub use scrape_source::scrape_source;
pub use store_snapshot::store_page_snapshot;
