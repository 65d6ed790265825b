//! Message module - Role-tagged chat messages
//!
//! The context sent to a completion service is built from these.

mod chat;

pub use chat::{ChatMessage, Role};
