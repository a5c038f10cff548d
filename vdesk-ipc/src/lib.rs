//! Types for exchanging vdesk state with external collaborators.
//!
//! Render consumers and storage bindings never reach into the core stores. They read a
//! [`DesktopSnapshot`] (or one of its parts) instead, and a durable-storage binding can
//! serialize it as JSON. Everything in this crate is plain data.
//!
//! [`WindowScope`] also lives here since both the configuration and the snapshots refer to it.
#![warn(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Window-scope policy declared by an application at registration time.
///
/// The scope decides how many simultaneous windows the application may have and what its
/// window id is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
pub enum WindowScope {
    /// One window system-wide, id `"{application}-singleton"`.
    #[default]
    PerApplication,
    /// One window per backing node, id `"{application}-{node}"`.
    PerNode,
    /// One window per document, id `"{application}-{document}"`.
    PerDocument,
}

impl WindowScope {
    /// Name of the activation context field this scope requires, if any.
    pub fn required_context(self) -> Option<&'static str> {
        match self {
            WindowScope::PerApplication => None,
            WindowScope::PerNode => Some("node_id"),
            WindowScope::PerDocument => Some("document_config_id"),
        }
    }
}

impl FromStr for WindowScope {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-application" | "singleton" => Ok(Self::PerApplication),
            "per-node" | "per-node-id" => Ok(Self::PerNode),
            "per-document" => Ok(Self::PerDocument),
            _ => Err(r#"invalid window scope, can be "per-application", "per-node" or "per-document""#),
        }
    }
}

impl fmt::Display for WindowScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WindowScope::PerApplication => "per-application",
            WindowScope::PerNode => "per-node",
            WindowScope::PerDocument => "per-document",
        })
    }
}

/// Variant-specific part of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
pub enum NodeKind {
    /// Directory with ordered children ids.
    Directory {
        /// Child node ids, in display order.
        children: Vec<String>,
    },
    /// Launcher for an application.
    Application {
        /// Registered application id.
        application_id: String,
        /// Key of the UI payload the application renders.
        component_key: String,
    },
    /// External URL.
    Link {
        /// Target URL.
        url: String,
    },
    /// Document opened by an application.
    Document {
        /// Registered application id.
        application_id: String,
        /// Identity of the document configuration.
        document_config_id: String,
    },
    /// Node running a named function when activated.
    Function {
        /// Name of the function.
        function_key: String,
    },
    /// Easter egg with a cycling image.
    EasterEgg {
        /// Index of the currently shown image frame.
        image_index: usize,
        /// Whether the egg is broken.
        broken: bool,
    },
}

/// Snapshot of a single filesystem node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
pub struct Node {
    /// Stable node id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Parent directory id, `None` only for the root.
    pub parent_id: Option<String>,
    /// Icon image key.
    pub image: Option<String>,
    /// Display modification date.
    pub date_modified: Option<String>,
    /// Size in bytes.
    pub size: Option<u64>,
    /// Variant-specific data.
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Snapshot of an open window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
pub struct Window {
    /// Content-addressed window id.
    pub id: String,
    /// Application the window belongs to.
    pub application_id: String,
    /// Backing node, for node-scoped windows.
    pub node_id: Option<String>,
    /// Backing document, for document-scoped windows.
    pub document_config_id: Option<String>,
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Width in logical pixels.
    pub width: u32,
    /// Height in logical pixels.
    pub height: u32,
    /// Stacking order, higher is on top.
    pub z_index: u64,
    /// Whether the window is minimized.
    pub is_minimized: bool,
    /// Whether the window is maximized.
    pub is_maximized: bool,
    /// Whether the window is the topmost visible window.
    pub is_focused: bool,
    /// Whether the window refuses moves and resizes.
    pub fixed: bool,
    /// Location currently shown by the window (URL, directory id).
    pub location: Option<String>,
}

/// Snapshot of a history instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
pub struct History {
    /// Opaque history key, usually a window id.
    pub id: String,
    /// Items, oldest first.
    pub items: Vec<String>,
    /// Index of the current item.
    pub current_index: usize,
}

/// Snapshot of the whole desktop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
pub struct DesktopSnapshot {
    /// Root node id.
    pub root: String,
    /// All nodes, parents before children.
    pub nodes: Vec<Node>,
    /// Open windows, in opening order.
    pub windows: Vec<Window>,
    /// History instances, sorted by id.
    pub histories: Vec<History>,
    /// Topmost non-minimized window.
    pub focused_window: Option<String>,
}

impl DesktopSnapshot {
    /// Serializes the snapshot as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a snapshot from JSON.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_window_scope() {
        assert_eq!(
            "per-application".parse::<WindowScope>(),
            Ok(WindowScope::PerApplication)
        );
        assert_eq!("singleton".parse::<WindowScope>(), Ok(WindowScope::PerApplication));
        assert_eq!("per-node".parse::<WindowScope>(), Ok(WindowScope::PerNode));
        assert_eq!("per-node-id".parse::<WindowScope>(), Ok(WindowScope::PerNode));
        assert_eq!("per-document".parse::<WindowScope>(), Ok(WindowScope::PerDocument));
        assert!("per-window".parse::<WindowScope>().is_err());
    }

    #[test]
    fn window_scope_display_parses_back() {
        for scope in [
            WindowScope::PerApplication,
            WindowScope::PerNode,
            WindowScope::PerDocument,
        ] {
            assert_eq!(scope.to_string().parse::<WindowScope>(), Ok(scope));
        }
    }

    #[test]
    fn node_kind_is_flattened_with_type_tag() {
        let node = Node {
            id: String::from("docs"),
            label: String::from("Documents"),
            parent_id: Some(String::from("root")),
            image: None,
            date_modified: None,
            size: None,
            kind: NodeKind::Directory {
                children: vec![String::from("resume")],
            },
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "directory");
        assert_eq!(value["children"][0], "resume");
        assert_eq!(value["parent_id"], "root");

        let back: Node = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn easter_egg_uses_kebab_case_tag() {
        let kind = NodeKind::EasterEgg {
            image_index: 2,
            broken: true,
        };
        let value = serde_json::to_value(&kind).unwrap();
        assert_eq!(value["type"], "easter-egg");
        assert_eq!(value["image_index"], 2);
    }
}
