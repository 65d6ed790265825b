//! Root-path walking and chat history construction.

use std::collections::HashMap;

use crate::error::{Result, TreeError};
use crate::message::ChatMessage;
use crate::tree::{ChatNode, NodeId};

/// Ids from the root down to `node_id`, root first.
///
/// Returns an empty path when `node_id` is unknown. The walk is bounded by the
/// number of nodes, so a malformed map yields [`TreeError::CycleDetected`]
/// instead of looping.
pub fn path_to_root(nodes: &HashMap<NodeId, ChatNode>, node_id: &str) -> Result<Vec<NodeId>> {
    let Some(mut current) = nodes.get(node_id) else {
        return Ok(Vec::new());
    };

    let mut path = vec![current.id.clone()];
    while let Some(parent) = current.parent_id.as_ref().and_then(|id| nodes.get(id)) {
        if path.len() >= nodes.len() {
            return Err(TreeError::CycleDetected {
                node_id: node_id.to_string(),
            });
        }
        path.push(parent.id.clone());
        current = parent;
    }

    path.reverse();
    Ok(path)
}

/// Nodes along the root-path of `node_id`, root first.
pub fn path_nodes<'a>(
    nodes: &'a HashMap<NodeId, ChatNode>,
    node_id: &str,
) -> Result<Vec<&'a ChatNode>> {
    Ok(path_to_root(nodes, node_id)?
        .iter()
        .filter_map(|id| nodes.get(id))
        .collect())
}

/// Role-tagged history along the root-path of `node_id`.
///
/// Empty prompts and responses are left out; each prompt is followed by its
/// response when one exists.
pub fn build_chat_history(
    nodes: &HashMap<NodeId, ChatNode>,
    node_id: &str,
) -> Result<Vec<ChatMessage>> {
    let mut history = Vec::new();
    for node in path_nodes(nodes, node_id)? {
        if !node.prompt.is_empty() {
            history.push(ChatMessage::user(node.prompt.as_str()));
        }
        if !node.response.is_empty() {
            history.push(ChatMessage::assistant(node.response.as_str()));
        }
    }
    Ok(history)
}
