pub mod archive;
pub mod enrichment;
pub mod error;
pub mod fetch_request;
pub mod links;
mod readability;
pub mod router;
mod services;
mod source_handle;
mod store;
pub mod text_extract;
pub mod workflows;

pub use archive::{Archive, ArchiveConfig, PageBackend};
pub use enrichment::{EnrichmentJob, MockDispatcher, RestateDispatcher, WorkflowDispatcher};
pub use error::{ArchiveError, Result};
pub use fetch_request::FetchRequest;
pub use links::extract_links_by_pattern;
pub use rootsignal_common::types::{ArchiveItem, Channels};
pub use router::Platform;
pub use source_handle::{
    CrawlRequest, FeedRequest, PageRequest, PostsRequest, SearchRequest, ShortVideoRequest,
    SourceHandle, StoriesRequest, TopicSearchRequest, VideoRequest,
};
