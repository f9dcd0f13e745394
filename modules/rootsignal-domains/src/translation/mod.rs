pub mod activities;
pub mod restate;
pub mod translation;

pub use restate::{TranslateRequest, TranslateResult, TranslateWorkflowImpl};
pub use translation::Translation;
