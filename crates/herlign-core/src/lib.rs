//! I/O-free domain logic shared by the herlign server.
//!
//! Nothing in this crate touches the network or the database; the server
//! feeds it values and persists whatever it decides.

pub mod chat;
pub mod identity;
pub mod media;
pub mod pagination;
pub mod rate_limit;
pub mod slug;

mod error;

pub use chat::{ChatMode, GuestReplyPlan, ModeTransition, SenderType};
pub use error::CoreError;
pub use pagination::{PageParams, Pagination};
pub use rate_limit::{RateLimitConfig, RateLimitDecision, RateLimiter};
