// Core engine types: aggregate, events, deps, stats, engine, projection.

pub mod aggregate;
pub mod deps;
pub mod engine;
pub mod events;
pub mod projection;
pub mod stats;
