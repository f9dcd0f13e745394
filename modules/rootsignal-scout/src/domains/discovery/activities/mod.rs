// Discovery activities: source finding, tension linking, response finding, etc.
// Canonical locations: crate::discovery::*, crate::pipeline::handlers::bootstrap

pub use crate::discovery::agent_tools;
pub use crate::discovery::bootstrap;
pub use crate::discovery::gathering_finder;
pub use crate::discovery::investigator;
pub use crate::discovery::response_finder;
pub use crate::discovery::response_mapper;
pub use crate::discovery::source_finder;
pub use crate::discovery::tension_linker;
pub(crate) use crate::pipeline::handlers::bootstrap as engine_bootstrap;
