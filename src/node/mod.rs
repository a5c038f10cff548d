//! Virtual filesystem as a flat parent-pointer map.
//!
//! Nodes reference each other only by [`NodeId`]: a directory lists the ids of its children,
//! and every other node carries the id of its parent. The store is the single owner of that
//! map, and every mutation goes through it so the two directions never disagree:
//!
//! - every non-root node's parent is an existing directory listing it exactly once,
//! - the root is the only node without a parent,
//! - no node is its own ancestor (checked at move time by [`moves::check_move`]).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod moves;


use self::moves::{MoveCheck, MoveRejection};

/// Stable node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Variant-specific node data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory {
        children: Vec<NodeId>,
    },
    Application {
        application_id: String,
        component_key: String,
    },
    Link {
        url: String,
    },
    Document {
        application_id: String,
        document_config_id: String,
    },
    Function {
        function_key: String,
    },
    EasterEgg {
        image_index: usize,
        broken: bool,
    },
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Directory { .. } => "directory",
            NodeKind::Application { .. } => "application",
            NodeKind::Link { .. } => "link",
            NodeKind::Document { .. } => "document",
            NodeKind::Function { .. } => "function",
            NodeKind::EasterEgg { .. } => "easter-egg",
        }
    }
}

/// A node in the virtual filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    id: NodeId,
    label: String,
    /// Set by the store on insertion and moves.
    parent_id: Option<NodeId>,
    image: Option<String>,
    date_modified: Option<String>,
    size: Option<u64>,
    kind: NodeKind,
}

impl NodeEntry {
    fn new(id: impl Into<NodeId>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parent_id: None,
            image: None,
            date_modified: None,
            size: None,
            kind,
        }
    }

    pub fn directory(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self::new(id, label, NodeKind::Directory { children: Vec::new() })
    }

    pub fn application(
        id: impl Into<NodeId>,
        label: impl Into<String>,
        application_id: impl Into<String>,
        component_key: impl Into<String>,
    ) -> Self {
        let kind = NodeKind::Application {
            application_id: application_id.into(),
            component_key: component_key.into(),
        };
        Self::new(id, label, kind)
    }

    pub fn link(id: impl Into<NodeId>, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(id, label, NodeKind::Link { url: url.into() })
    }

    pub fn document(
        id: impl Into<NodeId>,
        label: impl Into<String>,
        application_id: impl Into<String>,
        document_config_id: impl Into<String>,
    ) -> Self {
        let kind = NodeKind::Document {
            application_id: application_id.into(),
            document_config_id: document_config_id.into(),
        };
        Self::new(id, label, kind)
    }

    pub fn function(
        id: impl Into<NodeId>,
        label: impl Into<String>,
        function_key: impl Into<String>,
    ) -> Self {
        let kind = NodeKind::Function {
            function_key: function_key.into(),
        };
        Self::new(id, label, kind)
    }

    pub fn easter_egg(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        let kind = NodeKind::EasterEgg {
            image_index: 0,
            broken: false,
        };
        Self::new(id, label, kind)
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_date_modified(mut self, date: impl Into<String>) -> Self {
        self.date_modified = Some(date.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent_id.as_ref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn date_modified(&self) -> Option<&str> {
        self.date_modified.as_deref()
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Children ids; empty for anything but a directory.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            _ => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match &mut self.kind {
            NodeKind::Directory { children } => Some(children),
            _ => None,
        }
    }

    pub fn to_ipc(&self) -> vdesk_ipc::Node {
        let kind = match &self.kind {
            NodeKind::Directory { children } => vdesk_ipc::NodeKind::Directory {
                children: children.iter().map(|id| id.to_string()).collect(),
            },
            NodeKind::Application {
                application_id,
                component_key,
            } => vdesk_ipc::NodeKind::Application {
                application_id: application_id.clone(),
                component_key: component_key.clone(),
            },
            NodeKind::Link { url } => vdesk_ipc::NodeKind::Link { url: url.clone() },
            NodeKind::Document {
                application_id,
                document_config_id,
            } => vdesk_ipc::NodeKind::Document {
                application_id: application_id.clone(),
                document_config_id: document_config_id.clone(),
            },
            NodeKind::Function { function_key } => vdesk_ipc::NodeKind::Function {
                function_key: function_key.clone(),
            },
            NodeKind::EasterEgg {
                image_index,
                broken,
            } => vdesk_ipc::NodeKind::EasterEgg {
                image_index: *image_index,
                broken: *broken,
            },
        };

        vdesk_ipc::Node {
            id: self.id.to_string(),
            label: self.label.clone(),
            parent_id: self.parent_id.as_ref().map(|id| id.to_string()),
            image: self.image.clone(),
            date_modified: self.date_modified.clone(),
            size: self.size,
            kind,
        }
    }
}

/// Owner of the node map.
#[derive(Debug, Clone)]
pub struct NodeStore {
    nodes: HashMap<NodeId, NodeEntry>,
    root: NodeId,
    /// Bumped on every successful mutation.
    revision: u64,
}

impl NodeStore {
    /// Creates a store holding only `root`, which must be a directory.
    pub fn new(mut root: NodeEntry) -> Result<Self> {
        if !root.is_directory() {
            return Err(Error::ParentNotFound {
                parent: root.id.to_string(),
            });
        }
        if let Some(children) = root.children_mut() {
            children.clear();
        }
        root.parent_id = None;

        let id = root.id.clone();
        let mut nodes = HashMap::new();
        nodes.insert(id.clone(), root);

        Ok(Self {
            nodes,
            root: id,
            revision: 0,
        })
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    pub fn root(&self) -> &NodeEntry {
        &self.nodes[&self.root]
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root is always there.
        false
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get_node(&self, id: &str) -> Option<&NodeEntry> {
        self.nodes.get(id)
    }

    /// Children of `parent_id` in display order; empty if it is not a directory.
    pub fn get_children(&self, parent_id: &str) -> Vec<&NodeEntry> {
        let Some(parent) = self.nodes.get(parent_id) else {
            return Vec::new();
        };

        parent
            .children()
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    pub fn get_parent(&self, id: &str) -> Option<&NodeEntry> {
        let parent_id = self.nodes.get(id)?.parent_id.as_ref()?;
        self.nodes.get(parent_id)
    }

    /// Ids from the root down to `id`, both included.
    pub fn path(&self, id: &str) -> Option<Vec<NodeId>> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(id)?;
        loop {
            path.push(current.id.clone());
            match &current.parent_id {
                Some(parent) => current = self.nodes.get(parent)?,
                None => break,
            }
            // Guards against walking a corrupted map forever.
            if path.len() > self.nodes.len() {
                return None;
            }
        }
        path.reverse();
        Some(path)
    }

    /// Whether `node` is `ancestor` or lies somewhere below it.
    pub fn is_self_or_descendant(&self, node: &str, ancestor: &str) -> bool {
        let mut current = node;
        for _ in 0..=self.nodes.len() {
            if current == ancestor {
                return true;
            }
            match self.nodes.get(current).and_then(|n| n.parent_id.as_ref()) {
                Some(parent) => current = parent.as_str(),
                None => return false,
            }
        }
        false
    }

    /// Ids of every node below `id`, in pre-order. Does not include `id` itself.
    pub fn descendants(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<&NodeId> = match self.nodes.get(id) {
            Some(node) => node.children().iter().rev().collect(),
            None => return out,
        };

        while let Some(id) = stack.pop() {
            out.push(id.clone());
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children().iter().rev());
            }
        }

        out
    }

    /// Inserts `entry` as the last child of `parent_id`.
    ///
    /// Directory entries start out empty; children are added by further calls.
    pub fn create_node(&mut self, mut entry: NodeEntry, parent_id: &str) -> Result<()> {
        if self.nodes.contains_key(entry.id.as_str()) {
            return Err(Error::DuplicateId { id: entry.id });
        }

        let parent = self
            .nodes
            .get_mut(parent_id)
            .and_then(NodeEntry::children_mut)
            .ok_or_else(|| Error::ParentNotFound {
                parent: parent_id.to_owned(),
            })?;
        parent.push(entry.id.clone());

        if let Some(children) = entry.children_mut() {
            children.clear();
        }
        entry.parent_id = Some(NodeId::from(parent_id));

        trace!("created {} {} under {parent_id}", entry.kind.type_name(), entry.id);
        self.nodes.insert(entry.id.clone(), entry);
        self.revision += 1;
        Ok(())
    }

    /// Removes `id` together with its whole subtree.
    ///
    /// Returns the removed entries, `id` first and descendants in pre-order after it.
    pub fn delete_node(&mut self, id: &str) -> Result<Vec<NodeEntry>> {
        let node = self.nodes.get(id).ok_or_else(|| Error::NodeNotFound { id: id.to_owned() })?;
        let Some(parent_id) = node.parent_id.clone() else {
            return Err(Error::RootNode);
        };

        let descendants = self.descendants(id);

        if let Some(siblings) = self.nodes.get_mut(&parent_id).and_then(NodeEntry::children_mut)
        {
            siblings.retain(|child| child.as_str() != id);
        }

        let mut removed = Vec::with_capacity(descendants.len() + 1);
        removed.extend(self.nodes.remove(id));
        for descendant in descendants {
            removed.extend(self.nodes.remove(&descendant));
        }

        debug!("deleted {id} and {} descendants", removed.len() - 1);
        self.revision += 1;
        Ok(removed)
    }

    /// Reparents `id` under `new_parent_id`.
    ///
    /// Returns `Ok(false)` without touching anything when `new_parent_id` already is the parent.
    pub fn move_node(&mut self, id: &str, new_parent_id: &str) -> Result<bool> {
        match moves::check_move(self, id, new_parent_id) {
            MoveCheck::Valid => (),
            MoveCheck::AlreadyThere => return Ok(false),
            MoveCheck::Rejected(MoveRejection::UnknownNode) => {
                return Err(Error::NodeNotFound { id: id.to_owned() })
            }
            MoveCheck::Rejected(MoveRejection::UnknownTarget) => {
                return Err(Error::NodeNotFound {
                    id: new_parent_id.to_owned(),
                })
            }
            MoveCheck::Rejected(reason) => {
                return Err(Error::InvalidMove {
                    node: NodeId::from(id),
                    target: NodeId::from(new_parent_id),
                    reason,
                })
            }
        }

        // A valid move always has a parent: the root is an ancestor of every directory.
        let Some(old_parent_id) = self.nodes.get(id).and_then(|n| n.parent_id.clone()) else {
            return Err(Error::RootNode);
        };

        if let Some(siblings) = self
            .nodes
            .get_mut(&old_parent_id)
            .and_then(NodeEntry::children_mut)
        {
            siblings.retain(|child| child.as_str() != id);
        }
        if let Some(children) = self
            .nodes
            .get_mut(new_parent_id)
            .and_then(NodeEntry::children_mut)
        {
            children.push(NodeId::from(id));
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent_id = Some(NodeId::from(new_parent_id));
        }

        debug!("moved {id} from {old_parent_id} to {new_parent_id}");
        self.revision += 1;
        Ok(true)
    }

    pub fn rename_node(&mut self, id: &str, label: impl Into<String>) -> Result<()> {
        let node = self.get_node_mut(id)?;
        node.label = label.into();
        self.revision += 1;
        Ok(())
    }

    pub fn set_image(&mut self, id: &str, image: Option<String>) -> Result<()> {
        let node = self.get_node_mut(id)?;
        node.image = image;
        self.revision += 1;
        Ok(())
    }

    /// Advances an easter egg to its next image frame.
    ///
    /// Returns the new frame index, or `None` if the node is not an egg, is broken, or there
    /// are no frames to cycle through.
    pub fn cycle_egg_image(&mut self, id: &str, frame_count: usize) -> Result<Option<usize>> {
        let node = self.get_node_mut(id)?;
        let NodeKind::EasterEgg {
            image_index,
            broken: false,
        } = &mut node.kind
        else {
            return Ok(None);
        };
        if frame_count == 0 {
            return Ok(None);
        }

        *image_index = (*image_index + 1) % frame_count;
        let index = *image_index;
        self.revision += 1;
        Ok(Some(index))
    }

    /// Marks an easter egg as broken. Returns whether anything changed.
    pub fn break_egg(&mut self, id: &str) -> Result<bool> {
        let node = self.get_node_mut(id)?;
        let NodeKind::EasterEgg { broken, .. } = &mut node.kind else {
            return Ok(false);
        };
        if *broken {
            return Ok(false);
        }

        *broken = true;
        self.revision += 1;
        Ok(true)
    }

    fn get_node_mut(&mut self, id: &str) -> Result<&mut NodeEntry> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| Error::NodeNotFound { id: id.to_owned() })
    }

    /// All nodes, parents before children, siblings in display order.
    pub fn snapshot(&self) -> Vec<vdesk_ipc::Node> {
        let mut out = Vec::with_capacity(self.nodes.len());
        out.push(self.root().to_ipc());
        for id in self.descendants(self.root.as_str()) {
            if let Some(node) = self.nodes.get(&id) {
                out.push(node.to_ipc());
            }
        }
        out
    }

    /// Indented dump of the tree, one node per line.
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        self.debug_tree_node(&self.root, 0, &mut out);
        out
    }

    /// Same as [`NodeStore::debug_tree`], starting at `id`.
    pub fn debug_subtree(&self, id: &str) -> String {
        let mut out = String::new();
        self.debug_tree_node(&NodeId::from(id), 0, &mut out);
        out
    }

    fn debug_tree_node(&self, id: &NodeId, depth: usize, out: &mut String) {
        use std::fmt::Write as _;

        let indent = "  ".repeat(depth);
        let Some(node) = self.nodes.get(id) else {
            let _ = writeln!(out, "{indent}{id} (missing)");
            return;
        };

        let _ = match &node.kind {
            NodeKind::Directory { .. } => writeln!(out, "{indent}{id}/"),
            NodeKind::Application { application_id, .. } => {
                writeln!(out, "{indent}{id} (app {application_id})")
            }
            NodeKind::Link { url } => writeln!(out, "{indent}{id} -> {url}"),
            NodeKind::Document {
                application_id,
                document_config_id,
            } => writeln!(out, "{indent}{id} (doc {application_id}:{document_config_id})"),
            NodeKind::Function { function_key } => writeln!(out, "{indent}{id} (fn {function_key})"),
            NodeKind::EasterEgg {
                image_index,
                broken,
            } => {
                let broken = if *broken { ", broken" } else { "" };
                writeln!(out, "{indent}{id} (egg {image_index}{broken})")
            }
        };

        for child in node.children() {
            self.debug_tree_node(child, depth + 1, out);
        }
    }

    #[cfg(test)]
    pub(crate) fn verify_invariants(&self) {
        let root = &self.nodes[&self.root];
        assert!(root.parent_id.is_none(), "root must not have a parent");
        assert!(root.is_directory(), "root must be a directory");

        for (id, node) in &self.nodes {
            assert_eq!(id, &node.id, "map key must match the entry id");

            if let Some(parent_id) = &node.parent_id {
                let parent = self
                    .nodes
                    .get(parent_id)
                    .unwrap_or_else(|| panic!("parent {parent_id} of {id} must exist"));
                assert!(parent.is_directory(), "parent {parent_id} of {id} must be a directory");
                let count = parent.children().iter().filter(|c| *c == id).count();
                assert_eq!(count, 1, "{parent_id} must list {id} exactly once");
            } else {
                assert_eq!(id, &self.root, "only the root may lack a parent");
            }

            for child in node.children() {
                let child_node = self
                    .nodes
                    .get(child)
                    .unwrap_or_else(|| panic!("child {child} of {id} must exist"));
                assert_eq!(
                    child_node.parent_id.as_ref(),
                    Some(id),
                    "child {child} must point back at {id}"
                );
            }

            assert!(
                self.is_self_or_descendant(id.as_str(), self.root.as_str()),
                "{id} must be reachable from the root"
            );
        }

        assert_eq!(
            self.descendants(self.root.as_str()).len() + 1,
            self.nodes.len(),
            "every node must be reachable exactly once"
        );
    }
}
