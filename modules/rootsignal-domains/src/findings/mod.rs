pub mod activities;
pub mod models;
pub mod restate;
pub mod tools;

pub use models::connection::Connection;
pub use models::finding::Finding;
pub use models::finding_evidence::FindingEvidence;
pub use models::investigation_step::InvestigationStep;
pub use restate::{
    ClusterDetectionWorkflowImpl, WhyInvestigationWorkflowImpl,
};
