//! chat_tree - Conversation tree model and algorithms
//!
//! This crate provides the data model behind the branching chat view:
//! - `tree` - ChatNode, ConversationTree (arena of nodes keyed by id)
//! - `import` - linear transcript to tree
//! - `path` - root-path walk and chat history for the model context
//! - `branch` - immutable branch creation
//! - `layout` - positions for the tree visualization

pub mod branch;
pub mod error;
pub mod import;
pub mod layout;
pub mod message;
pub mod path;
pub mod tree;

// Re-export commonly used types
pub use branch::{create_branch, new_branch_id};
pub use error::{Result, TreeError};
pub use import::{import_conversation, import_conversation_str};
pub use layout::{compute_tree_layout, LayoutBounds, LayoutConfig, Position, TreeLayout};
pub use message::{ChatMessage, Role};
pub use path::{build_chat_history, path_nodes, path_to_root};
pub use tree::{
    ChatNode, ConversationDates, ConversationTree, NodeId, NodePatch, NodeSource, TreeMetadata,
    UserInfo,
};
