//! ChatNode - A single prompt/response exchange
//!
//! Nodes live in a flat map keyed by id; `parent_id` and `child_ids` are the
//! only links between them.

use serde::{Deserialize, Serialize};

/// Identifier of a node inside a [`super::ConversationTree`].
pub type NodeId = String;

/// Where a node came from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeSource {
    /// Originated from the uploaded transcript.
    Imported,
    /// Created by a branch operation.
    Generated,
}

/// One prompt/response exchange in the conversation tree.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatNode {
    pub id: NodeId,

    /// User message text (empty for a fresh branch)
    pub prompt: String,

    /// Assistant message text
    pub response: String,

    /// Node this one branches from (None for the root)
    pub parent_id: Option<NodeId>,

    /// Children in branch creation order
    pub child_ids: Vec<NodeId>,

    pub source: NodeSource,
}

impl ChatNode {
    /// Create an imported node with the given text and parent.
    pub fn imported(
        id: impl Into<NodeId>,
        prompt: impl Into<String>,
        response: impl Into<String>,
        parent_id: Option<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            response: response.into(),
            parent_id,
            child_ids: Vec::new(),
            source: NodeSource::Imported,
        }
    }

    /// Create an empty generated node under `parent_id`.
    pub fn generated(id: impl Into<NodeId>, parent_id: NodeId) -> Self {
        Self {
            id: id.into(),
            prompt: String::new(),
            response: String::new(),
            parent_id: Some(parent_id),
            child_ids: Vec::new(),
            source: NodeSource::Generated,
        }
    }

    /// Check if this is the root node
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if this node has no children
    pub fn is_leaf(&self) -> bool {
        self.child_ids.is_empty()
    }

    /// Return a copy with `patch` shallow-merged in.
    pub fn patched(&self, patch: &NodePatch) -> Self {
        let mut node = self.clone();
        if let Some(prompt) = &patch.prompt {
            node.prompt = prompt.clone();
        }
        if let Some(response) = &patch.response {
            node.response = response.clone();
        }
        node
    }
}

/// Partial update of a node's text fields.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl NodePatch {
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            response: None,
        }
    }

    pub fn response(response: impl Into<String>) -> Self {
        Self {
            prompt: None,
            response: Some(response.into()),
        }
    }

    /// Set the response as well
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }
}
