pub mod restate;
pub mod tag;
pub mod tag_kind;

pub use restate::tags::{TagsService, TagsServiceImpl};
pub use tag::{Tag, Taggable};
pub use tag_kind::{build_tag_instructions, TagKindConfig};
