//! ConversationTree - Aggregate root for an imported conversation
//!
//! A tree value is never edited in place. Every change produces a new tree
//! that the caller installs in place of the old one.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::node::{ChatNode, NodeId, NodePatch};
use crate::error::{Result, TreeError};

/// Descriptive metadata carried over from the transcript export.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeMetadata {
    pub title: String,
    pub user: UserInfo,
    pub dates: ConversationDates,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
}

/// Lifecycle timestamps, kept as the exporter wrote them.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationDates {
    pub created: String,
    pub updated: String,
    pub exported: String,
}

/// The conversation tree: metadata plus a flat map of nodes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTree {
    metadata: TreeMetadata,
    nodes: HashMap<NodeId, ChatNode>,
    root_id: NodeId,
}

impl ConversationTree {
    /// Build a tree from its parts, rejecting anything that breaks the
    /// parent/child invariants.
    pub fn from_parts(
        metadata: TreeMetadata,
        nodes: HashMap<NodeId, ChatNode>,
        root_id: impl Into<NodeId>,
    ) -> Result<Self> {
        let tree = Self {
            metadata,
            nodes,
            root_id: root_id.into(),
        };
        tree.validate()?;
        Ok(tree)
    }

    pub fn metadata(&self) -> &TreeMetadata {
        &self.metadata
    }

    pub fn nodes(&self) -> &HashMap<NodeId, ChatNode> {
        &self.nodes
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn root(&self) -> Option<&ChatNode> {
        self.nodes.get(&self.root_id)
    }

    pub fn get(&self, node_id: &str) -> Option<&ChatNode> {
        self.nodes.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Same metadata and root, different node map.
    pub fn with_nodes(&self, nodes: HashMap<NodeId, ChatNode>) -> Self {
        Self {
            metadata: self.metadata.clone(),
            nodes,
            root_id: self.root_id.clone(),
        }
    }

    /// Shallow-merge `patch` into one node. Returns `None` for an unknown id.
    pub fn update_node(&self, node_id: &str, patch: &NodePatch) -> Option<Self> {
        let node = self.nodes.get(node_id)?;
        let mut nodes = self.nodes.clone();
        nodes.insert(node.id.clone(), node.patched(patch));
        Some(self.with_nodes(nodes))
    }

    /// 1-based position of a node among its siblings, and the sibling count.
    pub fn sibling_position(&self, node_id: &str) -> Option<(usize, usize)> {
        let node = self.nodes.get(node_id)?;
        let Some(parent_id) = &node.parent_id else {
            return Some((1, 1));
        };
        let parent = self.nodes.get(parent_id)?;
        let index = parent.child_ids.iter().position(|id| id == node_id)?;
        Some((index + 1, parent.child_ids.len()))
    }

    /// Check every structural invariant of the tree.
    pub fn validate(&self) -> Result<()> {
        let root = self.nodes.get(&self.root_id).ok_or_else(|| {
            TreeError::InvalidFormat(format!("root node {} is missing", self.root_id))
        })?;
        if !root.is_root() {
            return Err(TreeError::BrokenLink {
                node_id: self.root_id.clone(),
            });
        }

        for (key, node) in &self.nodes {
            let broken = || TreeError::BrokenLink {
                node_id: key.clone(),
            };

            if key != &node.id {
                return Err(broken());
            }

            match &node.parent_id {
                None if key != &self.root_id => return Err(broken()),
                None => {}
                Some(parent_id) => {
                    let parent = self.nodes.get(parent_id).ok_or_else(broken)?;
                    if !parent.child_ids.contains(key) {
                        return Err(broken());
                    }
                }
            }

            for child_id in &node.child_ids {
                let child = self.nodes.get(child_id).ok_or_else(broken)?;
                if child.parent_id.as_deref() != Some(key.as_str()) {
                    return Err(broken());
                }
            }
        }

        self.check_reachable()
    }

    /// Walk down from the root once. With links already known to be
    /// bidirectional, any node the walk cannot reach sits on a parent cycle.
    fn check_reachable(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        let mut stack = vec![self.root_id.as_str()];

        while let Some(node_id) = stack.pop() {
            if !seen.insert(node_id) {
                return Err(TreeError::BrokenLink {
                    node_id: node_id.to_string(),
                });
            }
            if let Some(node) = self.nodes.get(node_id) {
                stack.extend(node.child_ids.iter().map(String::as_str));
            }
        }

        if seen.len() == self.nodes.len() {
            return Ok(());
        }
        let stranded = self
            .nodes
            .keys()
            .filter(|id| !seen.contains(id.as_str()))
            .min()
            .cloned()
            .unwrap_or_default();
        Err(TreeError::CycleDetected { node_id: stranded })
    }
}
