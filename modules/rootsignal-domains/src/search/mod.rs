pub mod embedding;
pub mod hybrid;
pub mod nlq;
pub mod query_log;
pub mod translate;
pub mod types;

pub use embedding::{Embedding, SimilarRecord};
pub use hybrid::hybrid_search;
pub use nlq::parse_natural_language_query;
pub use query_log::QueryLog;
pub use translate::translate_query_to_english;
pub use types::*;
