pub mod eventlike;
pub mod events;
pub mod types;
pub mod values;

pub use eventlike::Eventlike;
