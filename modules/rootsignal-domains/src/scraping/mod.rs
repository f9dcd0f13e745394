pub mod activities;
pub mod adapters;
pub mod restate;
pub mod source;
pub mod url_alias;

pub use adapters::{build_ingestor, build_web_searcher};
pub use restate::{QualifyWorkflowImpl, ScrapeWorkflowImpl, SchedulerServiceImpl, SourceObjectImpl};
pub use source::{SocialSource, Source, WebsiteSource};
pub use url_alias::{normalize_url, UrlAlias};
