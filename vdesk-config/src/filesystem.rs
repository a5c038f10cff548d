use std::collections::HashSet;

use knuffel::errors::DecodeError;
use knuffel::Decode as _;

use crate::utils::expect_only_children;

/// The initial node hierarchy.
///
/// Holds at most one top-level node, which must be a directory: the root.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Filesystem(pub Option<DirectoryDecl>);

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub enum NodeDecl {
    Directory(DirectoryDecl),
    App(AppDecl),
    Link(LinkDecl),
    Document(DocumentDecl),
    Function(FunctionDecl),
    EasterEgg(EasterEggDecl),
}

/// Properties every node declaration accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeMeta<'a> {
    pub id: &'a str,
    pub label: Option<&'a str>,
    pub image: Option<&'a str>,
    pub date_modified: Option<&'a str>,
    pub size: Option<u64>,
}

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct DirectoryDecl {
    #[knuffel(argument)]
    pub id: String,
    #[knuffel(property)]
    pub label: Option<String>,
    #[knuffel(property)]
    pub image: Option<String>,
    #[knuffel(property(name = "date-modified"))]
    pub date_modified: Option<String>,
    #[knuffel(property)]
    pub size: Option<u64>,
    #[knuffel(children)]
    pub children: Vec<NodeDecl>,
}

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct AppDecl {
    #[knuffel(argument)]
    pub id: String,
    #[knuffel(property(name = "application"))]
    pub application_id: String,
    #[knuffel(property(name = "component"))]
    pub component_key: Option<String>,
    #[knuffel(property)]
    pub label: Option<String>,
    #[knuffel(property)]
    pub image: Option<String>,
    #[knuffel(property(name = "date-modified"))]
    pub date_modified: Option<String>,
    #[knuffel(property)]
    pub size: Option<u64>,
}

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct LinkDecl {
    #[knuffel(argument)]
    pub id: String,
    #[knuffel(property)]
    pub url: String,
    #[knuffel(property)]
    pub label: Option<String>,
    #[knuffel(property)]
    pub image: Option<String>,
    #[knuffel(property(name = "date-modified"))]
    pub date_modified: Option<String>,
    #[knuffel(property)]
    pub size: Option<u64>,
}

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct DocumentDecl {
    #[knuffel(argument)]
    pub id: String,
    #[knuffel(property(name = "application"))]
    pub application_id: String,
    /// Document configuration id; the node id is used when absent.
    #[knuffel(property(name = "document"))]
    pub document_config_id: Option<String>,
    #[knuffel(property)]
    pub label: Option<String>,
    #[knuffel(property)]
    pub image: Option<String>,
    #[knuffel(property(name = "date-modified"))]
    pub date_modified: Option<String>,
    #[knuffel(property)]
    pub size: Option<u64>,
}

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    #[knuffel(argument)]
    pub id: String,
    #[knuffel(property(name = "function"))]
    pub function_key: String,
    #[knuffel(property)]
    pub label: Option<String>,
    #[knuffel(property)]
    pub image: Option<String>,
    #[knuffel(property(name = "date-modified"))]
    pub date_modified: Option<String>,
    #[knuffel(property)]
    pub size: Option<u64>,
}

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct EasterEggDecl {
    #[knuffel(argument)]
    pub id: String,
    #[knuffel(property)]
    pub label: Option<String>,
    #[knuffel(property)]
    pub image: Option<String>,
    #[knuffel(property(name = "date-modified"))]
    pub date_modified: Option<String>,
    #[knuffel(property)]
    pub size: Option<u64>,
    #[knuffel(property, default)]
    pub broken: bool,
}

impl NodeDecl {
    pub fn meta(&self) -> NodeMeta<'_> {
        macro_rules! meta {
            ($decl:expr) => {
                NodeMeta {
                    id: &$decl.id,
                    label: $decl.label.as_deref(),
                    image: $decl.image.as_deref(),
                    date_modified: $decl.date_modified.as_deref(),
                    size: $decl.size,
                }
            };
        }

        match self {
            NodeDecl::Directory(decl) => meta!(decl),
            NodeDecl::App(decl) => meta!(decl),
            NodeDecl::Link(decl) => meta!(decl),
            NodeDecl::Document(decl) => meta!(decl),
            NodeDecl::Function(decl) => meta!(decl),
            NodeDecl::EasterEgg(decl) => meta!(decl),
        }
    }

    pub fn id(&self) -> &str {
        self.meta().id
    }
}

impl DirectoryDecl {
    /// Visits this directory and every declaration below it, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(Option<&'a str>, &'a NodeDecl)) {
        for child in &self.children {
            f(Some(&self.id), child);
            if let NodeDecl::Directory(dir) = child {
                dir.walk(f);
            }
        }
    }

    /// Number of declarations in this subtree, this directory included.
    pub fn count(&self) -> usize {
        let mut count = 1;
        self.walk(&mut |_, _| count += 1);
        count
    }
}

impl Filesystem {
    pub fn root(&self) -> Option<&DirectoryDecl> {
        self.0.as_ref()
    }
}

impl<S> knuffel::Decode<S> for Filesystem
where
    S: knuffel::traits::ErrorSpan,
{
    fn decode_node(
        node: &knuffel::ast::SpannedNode<S>,
        ctx: &mut knuffel::decode::Context<S>,
    ) -> Result<Self, DecodeError<S>> {
        expect_only_children(node, ctx);

        let mut root = None;

        for child in node.children() {
            let decl = match NodeDecl::decode_node(child, ctx) {
                Ok(decl) => decl,
                Err(e) => {
                    ctx.emit_error(e);
                    continue;
                }
            };

            let NodeDecl::Directory(dir) = decl else {
                ctx.emit_error(DecodeError::unexpected(
                    &child.node_name,
                    "node",
                    "the filesystem root must be a directory",
                ));
                continue;
            };

            if root.is_some() {
                ctx.emit_error(DecodeError::unexpected(
                    &child.node_name,
                    "node",
                    "only one root directory is allowed",
                ));
                continue;
            }

            // Spans of nested nodes are gone after decoding, so duplicates point at the root.
            let mut seen = HashSet::new();
            seen.insert(dir.id.clone());
            let mut duplicates = Vec::new();
            dir.walk(&mut |_, decl| {
                if !seen.insert(decl.id().to_owned()) {
                    duplicates.push(decl.id().to_owned());
                }
            });
            for id in duplicates {
                ctx.emit_error(DecodeError::unexpected(
                    &child.node_name,
                    "node",
                    format!("duplicate node id `{id}`"),
                ));
            }

            root = Some(dir);
        }

        Ok(Self(root))
    }
}
