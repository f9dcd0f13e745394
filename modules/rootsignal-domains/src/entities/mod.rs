pub mod activities;
pub mod models;

pub use models::entity::{BusinessEntity, Entity, GovernmentEntity, Organization};
pub use models::entity_relationship::EntityRelationship;
