//! Application state - Tree, selection, active view and settings

use std::sync::Arc;

use chat_tree::{
    build_chat_history, compute_tree_layout, path_nodes, ChatMessage, ChatNode,
    ConversationTree, LayoutConfig, NodeId, TreeError, TreeLayout,
};
use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Which view the presentation layer shows.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    #[default]
    Tree,
    Path,
}

/// The whole application state.
///
/// The tree is shared behind an [`Arc`]; transitions that leave it alone
/// keep the same allocation, transitions that change it install a new one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub tree: Option<Arc<ConversationTree>>,
    pub selected_node_id: Option<NodeId>,
    pub active_view: ActiveView,
    pub settings: Settings,
}

impl AppState {
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// The selected node, if the selection resolves in the current tree.
    pub fn selected_node(&self) -> Option<&ChatNode> {
        let tree = self.tree.as_ref()?;
        tree.get(self.selected_node_id.as_deref()?)
    }

    /// Nodes from the root to the selection, for the linear path view.
    pub fn current_path(&self) -> Result<Vec<&ChatNode>, TreeError> {
        match (&self.tree, &self.selected_node_id) {
            (Some(tree), Some(node_id)) => path_nodes(tree.nodes(), node_id),
            _ => Ok(Vec::new()),
        }
    }

    /// Model context for `node_id`.
    pub fn chat_history(&self, node_id: &str) -> Result<Vec<ChatMessage>, TreeError> {
        match &self.tree {
            Some(tree) => build_chat_history(tree.nodes(), node_id),
            None => Ok(Vec::new()),
        }
    }

    /// Card positions for the tree view.
    pub fn layout(&self, config: &LayoutConfig) -> Option<TreeLayout> {
        let tree = self.tree.as_ref()?;
        Some(compute_tree_layout(tree.root_id(), tree.nodes(), config))
    }

    /// Same state, compared without walking the tree.
    pub(crate) fn same_as(&self, other: &AppState) -> bool {
        let same_tree = match (&self.tree, &other.tree) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_tree
            && self.selected_node_id == other.selected_node_id
            && self.active_view == other.active_view
            && self.settings == other.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_tree::import_conversation;
    use serde_json::json;

    fn state() -> AppState {
        let tree = import_conversation(&json!({
            "metadata": {},
            "messages": [
                { "role": "Prompt", "say": "x" },
                { "role": "Response", "say": "y" },
                { "role": "Prompt", "say": "a" },
                { "role": "Response", "say": "b" }
            ]
        }))
        .unwrap();

        AppState {
            tree: Some(Arc::new(tree)),
            selected_node_id: Some("node-1".to_string()),
            ..AppState::default()
        }
    }

    #[test]
    fn test_default_view_is_tree() {
        assert_eq!(AppState::default().active_view, ActiveView::Tree);
    }

    #[test]
    fn test_selectors_follow_selection() {
        let state = state();
        assert_eq!(state.selected_node().map(|n| n.prompt.as_str()), Some("a"));

        let path: Vec<_> = state.current_path().unwrap().iter().map(|n| n.id.clone()).collect();
        assert_eq!(path, vec!["node-0", "node-1"]);

        assert_eq!(state.chat_history("node-1").unwrap().len(), 4);
        assert_eq!(state.layout(&LayoutConfig::default()).unwrap().positions.len(), 2);
    }

    #[test]
    fn test_unresolved_selection_yields_nothing() {
        let mut state = state();
        state.selected_node_id = Some("ghost".to_string());

        assert!(state.selected_node().is_none());
        assert!(state.current_path().unwrap().is_empty());
        assert!(AppState::default().layout(&LayoutConfig::default()).is_none());
    }
}
