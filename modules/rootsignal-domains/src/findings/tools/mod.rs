pub mod follow_link;
pub mod query_entities;
pub mod query_findings;
pub mod query_signals;
pub mod query_social;
pub mod recommend_source;
pub mod web_search;

pub use follow_link::FollowLinkTool;
pub use query_entities::QueryEntitiesTool;
pub use query_findings::QueryFindingsTool;
pub use query_signals::QuerySignalsTool;
pub use query_social::QuerySocialTool;
pub use recommend_source::RecommendSourceTool;
pub use web_search::FindingWebSearchTool;
