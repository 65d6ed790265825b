use thiserror::Error;

use crate::tree::NodeId;

/// Errors raised while building or traversing a conversation tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Invalid conversation format: {0}")]
    InvalidFormat(String),

    #[error("Conversation contains no prompt/response pairs")]
    EmptyConversation,

    #[error("Parent node not found: {0}")]
    ParentNotFound(NodeId),

    #[error("Cycle detected while walking from node {node_id}")]
    CycleDetected { node_id: NodeId },

    #[error("Parent/child link is inconsistent at node {node_id}")]
    BrokenLink { node_id: NodeId },
}

pub type Result<T> = std::result::Result<T, TreeError>;
