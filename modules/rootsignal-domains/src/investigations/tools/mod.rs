pub mod signal_history;
pub mod tavily_search;
pub mod whois;

pub use signal_history::InternalSignalHistoryTool;
pub use tavily_search::TavilyEntitySearchTool;
pub use whois::WhoisLookupTool;
