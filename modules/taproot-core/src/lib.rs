pub mod config;
pub mod deps;
pub mod file_config;
pub mod ingestor;
pub mod prompt_registry;
pub mod template;
pub mod types;

pub use config::AppConfig;
pub use deps::{EmbeddingService, ServerDeps};
pub use file_config::FileConfig;
pub use ingestor::{DiscoverConfig, Ingestor, WebSearcher};
pub use prompt_registry::PromptRegistry;
pub use types::*;
