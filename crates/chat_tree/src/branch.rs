//! Branch creation - adds an empty generated child under an existing node.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::Rng;

use crate::error::{Result, TreeError};
use crate::tree::{ChatNode, NodeId};

static BRANCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a process-unique branch id.
///
/// Combines the wall clock, a process-wide counter and a random suffix so
/// that repeated calls within one millisecond never collide.
pub fn new_branch_id() -> NodeId {
    let millis = Utc::now().timestamp_millis();
    let seq = BRANCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix: u32 = rand::thread_rng().gen();
    format!("branch-{millis}-{seq}-{suffix:08x}")
}

/// Return a new node map with an empty child appended under `parent_id`.
///
/// The input map is not modified. The new id is returned alongside the map.
pub fn create_branch(
    nodes: &HashMap<NodeId, ChatNode>,
    parent_id: &str,
) -> Result<(HashMap<NodeId, ChatNode>, NodeId)> {
    let parent = nodes
        .get(parent_id)
        .ok_or_else(|| TreeError::ParentNotFound(parent_id.to_string()))?;

    let mut branch_id = new_branch_id();
    while nodes.contains_key(&branch_id) {
        branch_id = new_branch_id();
    }

    let mut updated_parent = parent.clone();
    updated_parent.child_ids.push(branch_id.clone());

    let mut next = nodes.clone();
    next.insert(parent.id.clone(), updated_parent);
    next.insert(
        branch_id.clone(),
        ChatNode::generated(branch_id.clone(), parent.id.clone()),
    );

    log::debug!("Created branch {} under {}", branch_id, parent_id);
    Ok((next, branch_id))
}
