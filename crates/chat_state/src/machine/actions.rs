//! Actions - The fixed set of inputs to the state container

use chat_tree::{ConversationTree, NodeId, NodePatch};
use serde::{Deserialize, Serialize};

use super::state::ActiveView;
use crate::settings::SettingsPatch;

/// Defines the actions that can transition the application state.
#[derive(Debug, Clone)]
pub enum Action {
    /// Replace the tree wholesale with a freshly imported one.
    Import(ConversationTree),

    /// Select a node (or clear the selection). Membership is not checked.
    SelectNode(Option<NodeId>),

    /// Switch between the tree and path views.
    SetView(ActiveView),

    /// Shallow-merge a settings patch and persist the result.
    UpdateSettings(SettingsPatch),

    /// Create an empty branch under the given node and focus it.
    BranchFromNode(NodeId),

    /// Shallow-merge text fields into one existing node.
    UpdateNode { node_id: NodeId, patch: NodePatch },
}

/// Payload-free tag of an [`Action`], kept in transition records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Import,
    SelectNode,
    SetView,
    UpdateSettings,
    BranchFromNode,
    UpdateNode,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Import(_) => ActionKind::Import,
            Self::SelectNode(_) => ActionKind::SelectNode,
            Self::SetView(_) => ActionKind::SetView,
            Self::UpdateSettings(_) => ActionKind::UpdateSettings,
            Self::BranchFromNode(_) => ActionKind::BranchFromNode,
            Self::UpdateNode { .. } => ActionKind::UpdateNode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        let kind = Action::BranchFromNode("node-0".to_string()).kind();
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"branch_from_node\"");
        assert_eq!(Action::SetView(ActiveView::Path).kind(), ActionKind::SetView);
    }

    #[test]
    fn test_kind_matches_variant() {
        let action = Action::UpdateNode {
            node_id: "node-0".to_string(),
            patch: NodePatch::prompt("hi"),
        };
        assert_eq!(action.kind(), ActionKind::UpdateNode);
    }
}
