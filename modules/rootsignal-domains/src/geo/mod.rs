pub mod distance;
pub mod hotspot;
pub mod location;
pub mod zip_code;

pub use distance::{coarsen_coords, haversine_distance, haversine_distance_meters, haversine_distance_miles, DistanceUnit};
pub use hotspot::Hotspot;
pub use location::{Location, Locationable};
pub use zip_code::ZipCode;
