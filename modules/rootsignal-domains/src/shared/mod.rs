pub mod contact;
pub mod media;
pub mod note;
pub mod schedule;
pub mod service;

pub use contact::Contact;
pub use media::{Media, MediaAttachment};
pub use note::{Notable, Note};
pub use schedule::Schedule;
pub use service::Service;
