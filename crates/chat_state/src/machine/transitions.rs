//! State transitions - pure reducer and the store that drives it
//!
//! `reduce` never fails: bad input degrades to an unchanged state. Tree
//! faults that callers should hear about are reported on the
//! [`StateTransition`] returned by [`Store::dispatch`].

use std::sync::Arc;

use chat_tree::{create_branch, import_conversation, TreeError};
use serde_json::Value;

use super::actions::{Action, ActionKind};
use super::state::{ActiveView, AppState};
use crate::settings::Settings;
use crate::storage::KeyValueStore;

/// Represents a dispatched transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTransition {
    /// The action that was applied.
    pub action: ActionKind,
    /// Whether the state actually changed.
    pub changed: bool,
    /// Tree fault that turned the action into a no-op.
    pub fault: Option<TreeError>,
}

/// Apply `action` to `state`, producing the next state.
pub fn reduce(state: &AppState, action: Action) -> AppState {
    apply(state, action).0
}

fn apply(state: &AppState, action: Action) -> (AppState, Option<TreeError>) {
    match action {
        Action::Import(tree) => {
            let root_id = tree.root_id().to_string();
            let next = AppState {
                tree: Some(Arc::new(tree)),
                selected_node_id: Some(root_id),
                active_view: ActiveView::Tree,
                settings: state.settings.clone(),
            };
            (next, None)
        }

        Action::SelectNode(node_id) => (
            AppState {
                selected_node_id: node_id,
                ..state.clone()
            },
            None,
        ),

        Action::SetView(view) => (
            AppState {
                active_view: view,
                ..state.clone()
            },
            None,
        ),

        Action::UpdateSettings(patch) => (
            AppState {
                settings: state.settings.merged(&patch),
                ..state.clone()
            },
            None,
        ),

        Action::BranchFromNode(parent_id) => {
            let Some(tree) = &state.tree else {
                return (state.clone(), None);
            };
            match create_branch(tree.nodes(), &parent_id) {
                Ok((nodes, branch_id)) => (
                    AppState {
                        tree: Some(Arc::new(tree.with_nodes(nodes))),
                        selected_node_id: Some(branch_id),
                        active_view: ActiveView::Path,
                        settings: state.settings.clone(),
                    },
                    None,
                ),
                Err(err) => (state.clone(), Some(err)),
            }
        }

        Action::UpdateNode { node_id, patch } => {
            let updated = state
                .tree
                .as_ref()
                .and_then(|tree| tree.update_node(&node_id, &patch));
            match updated {
                Some(tree) => (
                    AppState {
                        tree: Some(Arc::new(tree)),
                        ..state.clone()
                    },
                    None,
                ),
                None => (state.clone(), None),
            }
        }
    }
}

/// Holds the current state and persists settings changes.
///
/// `state.settings` is what the app runs with, environment overrides
/// included. `persisted` mirrors what is in storage and is the only value
/// ever written back.
pub struct Store {
    state: AppState,
    storage: Box<dyn KeyValueStore>,
    persisted: Settings,
}

impl Store {
    /// Create a store, loading settings from `storage` and applying
    /// environment overrides on top.
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        let persisted = Settings::read(storage.as_ref());
        Self {
            state: AppState::with_settings(persisted.clone().with_env_overrides()),
            storage,
            persisted,
        }
    }

    /// Create a store with a specific initial state. Later settings updates
    /// are merged into whatever `storage` already holds.
    pub fn with_state(state: AppState, storage: Box<dyn KeyValueStore>) -> Self {
        let persisted = Settings::read(storage.as_ref());
        Self {
            state,
            storage,
            persisted,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply an action and install the resulting state.
    pub fn dispatch(&mut self, action: Action) -> StateTransition {
        let kind = action.kind();
        let persisted = match &action {
            Action::UpdateSettings(patch) => Some(self.persisted.merged(patch)),
            _ => None,
        };
        let (next, fault) = apply(&self.state, action);
        let changed = !next.same_as(&self.state);

        if let Some(err) = &fault {
            tracing::error!("{:?} left state unchanged: {}", kind, err);
        }

        if let Some(persisted) = persisted {
            if let Err(err) = persisted.save(self.storage.as_ref()) {
                tracing::warn!("Failed to persist settings: {}", err);
            }
            self.persisted = persisted;
        }

        tracing::debug!(action = ?kind, changed, "state transition");
        self.state = next;

        StateTransition {
            action: kind,
            changed,
            fault,
        }
    }

    /// Parse a transcript and install it. On error nothing changes.
    pub fn import_json(&mut self, value: &Value) -> Result<StateTransition, TreeError> {
        let tree = import_conversation(value)?;
        tracing::info!(
            "Imported \"{}\" with {} nodes",
            tree.metadata().title,
            tree.len()
        );
        Ok(self.dispatch(Action::Import(tree)))
    }
}
