//! Tree module - Conversation tree data model
//!
//! Nodes are stored in an arena keyed by id; links are ids only.

mod conversation;
mod node;

pub use conversation::{ConversationDates, ConversationTree, TreeMetadata, UserInfo};
pub use node::{ChatNode, NodeId, NodePatch, NodeSource};
