//! Row types returned by the store.

pub mod admin;
pub mod chat;
pub mod event;
pub mod link;
pub mod media;
pub mod podcast;
pub mod resource;
pub mod session;
pub mod testimonial;

pub use admin::{Admin, AdminUser};
pub use chat::ChatMessage;
pub use event::{Event, EventMode, EventStatus, EventType};
pub use link::Link;
pub use media::Media;
pub use podcast::Podcast;
pub use resource::{Resource, ResourceFormat};
pub use session::ChatSession;
pub use testimonial::Testimonial;
