//! Tree layout - positions nodes for the tree visualization.
//!
//! Depth sets the vertical coordinate. Leaves take consecutive horizontal
//! slots left to right, and every parent is centered over the horizontal
//! extent of its subtree. The result depends only on tree shape and the
//! dimensions in [`LayoutConfig`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::tree::{ChatNode, NodeId};

/// Card and gap dimensions used by the layout.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    pub h_gap: f64,
    pub v_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 300.0,
            node_height: 160.0,
            h_gap: 50.0,
            v_gap: 80.0,
        }
    }
}

impl LayoutConfig {
    fn column_width(&self) -> f64 {
        self.node_width + self.h_gap
    }

    fn row_height(&self) -> f64 {
        self.node_height + self.v_gap
    }
}

/// Top-left corner of a node card.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Overall size of the laid out tree, cards included.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutBounds {
    pub width: f64,
    pub height: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TreeLayout {
    pub positions: HashMap<NodeId, Position>,
    pub bounds: LayoutBounds,
}

impl TreeLayout {
    pub fn position(&self, node_id: &str) -> Option<Position> {
        self.positions.get(node_id).copied()
    }
}

/// Horizontal extent of a subtree.
#[derive(Clone, Copy)]
struct Extent {
    min: f64,
    max: f64,
}

impl Extent {
    fn point(x: f64) -> Self {
        Self { min: x, max: x }
    }

    fn merge(self, other: Extent) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

struct Frame<'a> {
    node: &'a ChatNode,
    depth: usize,
    next_child: usize,
    children: Option<Extent>,
}

/// Compute card positions for every node reachable from `root_id`.
///
/// Post-order walk over `child_ids` using an explicit stack. Ids missing from
/// `nodes` are skipped and a node reached twice is laid out once.
pub fn compute_tree_layout(
    root_id: &str,
    nodes: &HashMap<NodeId, ChatNode>,
    config: &LayoutConfig,
) -> TreeLayout {
    let mut layout = TreeLayout::default();
    let Some(root) = nodes.get(root_id) else {
        return layout;
    };

    let mut visited: HashSet<&str> = HashSet::from([root.id.as_str()]);
    let mut stack = vec![Frame {
        node: root,
        depth: 0,
        next_child: 0,
        children: None,
    }];
    let mut next_slot = 0usize;
    let mut max_depth = 0usize;

    while let Some(frame) = stack.last_mut() {
        let node = frame.node;
        if let Some(child_id) = node.child_ids.get(frame.next_child) {
            frame.next_child += 1;
            let depth = frame.depth + 1;
            if let Some(child) = nodes.get(child_id) {
                if visited.insert(child.id.as_str()) {
                    stack.push(Frame {
                        node: child,
                        depth,
                        next_child: 0,
                        children: None,
                    });
                }
            }
            continue;
        }

        let Some(frame) = stack.pop() else {
            break;
        };

        let (x, extent) = match frame.children {
            Some(extent) => ((extent.min + extent.max) / 2.0, extent),
            None => {
                let x = next_slot as f64 * config.column_width();
                next_slot += 1;
                (x, Extent::point(x))
            }
        };
        let y = frame.depth as f64 * config.row_height();
        max_depth = max_depth.max(frame.depth);
        layout.positions.insert(frame.node.id.clone(), Position { x, y });

        if let Some(parent) = stack.last_mut() {
            parent.children = Some(match parent.children {
                Some(existing) => existing.merge(extent),
                None => extent,
            });
        }
    }

    let columns = next_slot.max(1) as f64;
    layout.bounds = LayoutBounds {
        width: columns * config.node_width + (columns - 1.0) * config.h_gap,
        height: (max_depth + 1) as f64 * config.node_height + max_depth as f64 * config.v_gap,
    };
    layout
}
