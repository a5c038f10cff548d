//! Drag-and-drop move validation.

use std::collections::HashMap;
use std::fmt;

use super::{NodeId, NodeStore};

/// Why a node cannot be dropped onto a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveRejection {
    UnknownNode,
    UnknownTarget,
    /// The node was dropped onto itself.
    SelfTarget,
    TargetNotDirectory,
    /// The target lies inside the dragged subtree.
    IntoDescendant,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MoveRejection::UnknownNode => "the node does not exist",
            MoveRejection::UnknownTarget => "the target does not exist",
            MoveRejection::SelfTarget => "a node cannot contain itself",
            MoveRejection::TargetNotDirectory => "the target is not a directory",
            MoveRejection::IntoDescendant => "the target is inside the node",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCheck {
    Valid,
    /// The target already is the parent; dropping there changes nothing.
    AlreadyThere,
    Rejected(MoveRejection),
}

impl MoveCheck {
    pub fn is_valid(self) -> bool {
        self == MoveCheck::Valid
    }
}

/// Classifies dropping `dragged` onto `target`.
///
/// Cost is one walk from `target` up to the root.
pub fn check_move(store: &NodeStore, dragged: &str, target: &str) -> MoveCheck {
    let Some(node) = store.get_node(dragged) else {
        return MoveCheck::Rejected(MoveRejection::UnknownNode);
    };
    let Some(target_node) = store.get_node(target) else {
        return MoveCheck::Rejected(MoveRejection::UnknownTarget);
    };

    if dragged == target {
        return MoveCheck::Rejected(MoveRejection::SelfTarget);
    }
    if !target_node.is_directory() {
        return MoveCheck::Rejected(MoveRejection::TargetNotDirectory);
    }
    if store.is_self_or_descendant(target, dragged) {
        return MoveCheck::Rejected(MoveRejection::IntoDescendant);
    }
    if node.parent_id().is_some_and(|parent| parent.as_str() == target) {
        return MoveCheck::AlreadyThere;
    }

    MoveCheck::Valid
}

/// Whether dropping `dragged` onto `target` would actually move it.
///
/// False for unknown ids, for non-directory targets, for the node itself or anything below
/// it, and for the node's current parent.
pub fn is_valid_move(store: &NodeStore, dragged: &str, target: &str) -> bool {
    check_move(store, dragged, target).is_valid()
}

/// Memoized [`is_valid_move`] for drag-over feedback.
///
/// Answers are dropped whenever the store revision changes. The hint only drives the cursor;
/// drops go through [`NodeStore::move_node`], which validates again.
#[derive(Debug, Default)]
pub struct MoveHintCache {
    revision: u64,
    hints: HashMap<NodeId, HashMap<NodeId, bool>>,
}

impl MoveHintCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid_move(&mut self, store: &NodeStore, dragged: &str, target: &str) -> bool {
        if self.revision != store.revision() {
            self.hints.clear();
            self.revision = store.revision();
        }

        if let Some(hint) = self.hints.get(dragged).and_then(|t| t.get(target)) {
            return *hint;
        }

        let hint = is_valid_move(store, dragged, target);
        self.hints
            .entry(NodeId::from(dragged))
            .or_default()
            .insert(NodeId::from(target), hint);
        hint
    }

    pub fn clear(&mut self) {
        self.hints.clear();
    }

    pub fn len(&self) -> usize {
        self.hints.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
