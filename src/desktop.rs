//! Command layer tying the stores together.
//!
//! Drag-and-drop, activation and navigation surfaces talk to a [`Desktop`]; it decides which
//! store a command goes to, mirrors history into windows and cleans up windows whose content
//! disappears. Structural errors are routed through the [`ErrorPolicy`] in
//! [`Desktop::do_action`].

use std::collections::HashSet;

use vdesk_config::{Action, Config, DebugConfig, NodeDecl, NodeMeta};
use vdesk_ipc::{DesktopSnapshot, WindowScope};

use crate::error::{Error, Result};
use crate::history::HistoryManager;
use crate::node::moves::MoveHintCache;
use crate::node::{NodeEntry, NodeId, NodeKind, NodeStore};
use crate::window::{
    resolve_window_id, Activation, ApplicationDescriptor, ApplicationRegistry, WindowContext,
    WindowId, WindowRegistry,
};

/// Function key that empties the trash when activated.
pub const EMPTY_TRASH_FUNCTION: &str = "empty-trash";
/// Function key that downloads a new easter egg when activated.
pub const DOWNLOAD_EGG_FUNCTION: &str = "download-egg";

/// What to do with structural errors coming out of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return them to the caller.
    Strict,
    /// Log them and carry on as if the command was a no-op.
    Lenient,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ErrorPolicy::Strict
        } else {
            ErrorPolicy::Lenient
        }
    }
}

impl ErrorPolicy {
    pub fn from_config(debug: &DebugConfig) -> Self {
        if debug.strict_errors {
            ErrorPolicy::Strict
        } else if debug.lenient_errors {
            ErrorPolicy::Lenient
        } else {
            ErrorPolicy::default()
        }
    }
}

/// Result of activating a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeActivation {
    /// A directory, application or document window was opened or raised.
    Window {
        window: WindowId,
        activation: Activation,
    },
    /// The browser was opened or raised and navigated to the link.
    Link { url: String, window: WindowId },
    /// A function node. Built-in functions have already run.
    Function { function_key: String, builtin: bool },
    /// An easter egg moved on to the given image frame.
    EggCycled { image_index: usize },
    /// An easter egg with no image frames configured, nothing happens.
    EggUnchanged,
    /// A broken easter egg, nothing happens.
    EggBroken,
}

#[derive(Debug)]
pub struct Desktop {
    nodes: NodeStore,
    applications: ApplicationRegistry,
    windows: WindowRegistry,
    /// Navigation history of every window, keyed by window id.
    histories: HistoryManager<String>,
    move_hints: MoveHintCache,
    policy: ErrorPolicy,
    trash: NodeId,
    downloads: NodeId,
    finder: String,
    browser: String,
    egg_frames: Vec<String>,
    eggs_downloaded: u32,
}

impl Desktop {
    pub fn from_config(config: &Config) -> Result<Self> {
        let desktop = &config.desktop;

        let nodes = match config.filesystem.root() {
            Some(root) => {
                if root.id != desktop.root {
                    warn!(
                        "filesystem root {} does not match desktop root {}, using the former",
                        root.id, desktop.root
                    );
                }
                let meta = NodeMeta {
                    id: &root.id,
                    label: root.label.as_deref(),
                    image: root.image.as_deref(),
                    date_modified: root.date_modified.as_deref(),
                    size: root.size,
                };
                let label = meta.label.unwrap_or(meta.id);
                let mut nodes =
                    NodeStore::new(with_meta(NodeEntry::directory(meta.id, label), meta))?;

                let mut decls = Vec::new();
                root.walk(&mut |parent, decl| {
                    decls.push((parent.unwrap_or(root.id.as_str()), decl));
                });
                for (parent, decl) in decls {
                    nodes.create_node(entry_from_decl(decl), parent)?;
                    if let NodeDecl::EasterEgg(egg) = decl {
                        if egg.broken {
                            nodes.break_egg(&egg.id)?;
                        }
                    }
                }
                nodes
            }
            None => NodeStore::new(NodeEntry::directory(desktop.root.as_str(), &desktop.root))?,
        };

        let mut applications = ApplicationRegistry::new();
        for decl in &config.applications {
            applications.register(ApplicationDescriptor::from_decl(decl))?;
        }

        let policy = ErrorPolicy::from_config(&config.debug);
        debug!(
            "desktop with {} nodes and {} applications, {policy:?} errors",
            nodes.len(),
            applications.len()
        );

        Ok(Self {
            nodes,
            applications,
            windows: WindowRegistry::new(desktop.cascade_origin, desktop.cascade_step),
            histories: HistoryManager::new(),
            move_hints: MoveHintCache::new(),
            policy,
            trash: NodeId::from(desktop.trash.as_str()),
            downloads: NodeId::from(desktop.downloads.as_str()),
            finder: desktop.finder.clone(),
            browser: desktop.browser.clone(),
            egg_frames: desktop.egg_frames.clone(),
            eggs_downloaded: 0,
        })
    }

    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    pub fn applications(&self) -> &ApplicationRegistry {
        &self.applications
    }

    pub fn windows(&self) -> &WindowRegistry {
        &self.windows
    }

    pub fn histories(&self) -> &HistoryManager<String> {
        &self.histories
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ErrorPolicy) {
        self.policy = policy;
    }

    /// Opens whatever `id` stands for, as a double-click would.
    pub fn activate_node(&mut self, id: &str) -> Result<NodeActivation> {
        let node = self
            .nodes
            .get_node(id)
            .ok_or_else(|| Error::NodeNotFound { id: id.to_owned() })?;

        match node.kind().clone() {
            NodeKind::Directory { .. } => {
                let finder = self.finder.clone();
                let (window, activation) =
                    self.open_application(&finder, WindowContext::node(id))?;
                Ok(NodeActivation::Window { window, activation })
            }
            NodeKind::Application { application_id, .. } => {
                // The finder launcher browses from the root rather than from itself.
                let root = self.nodes.root_id().clone();
                let node = if application_id == self.finder {
                    root.as_str()
                } else {
                    id
                };
                let (window, activation) =
                    self.open_application(&application_id, WindowContext::node(node))?;
                Ok(NodeActivation::Window { window, activation })
            }
            NodeKind::Document {
                application_id,
                document_config_id,
            } => {
                let context = WindowContext {
                    node_id: Some(id),
                    document_config_id: Some(&document_config_id),
                };
                let (window, activation) = self.open_application(&application_id, context)?;
                Ok(NodeActivation::Window { window, activation })
            }
            NodeKind::Link { url } => {
                let browser = self.browser.clone();
                let (window, _) = self.open_application(&browser, WindowContext::node(id))?;
                if self.histories.get_current_item(window.as_str()) != Some(&url) {
                    self.navigate(window.as_str(), url.clone())?;
                }
                Ok(NodeActivation::Link { url, window })
            }
            NodeKind::Function { function_key } => {
                let builtin = self.run_function(&function_key)?;
                Ok(NodeActivation::Function {
                    function_key,
                    builtin,
                })
            }
            NodeKind::EasterEgg { broken: true, .. } => Ok(NodeActivation::EggBroken),
            NodeKind::EasterEgg { .. } => {
                let Some(image_index) = self.nodes.cycle_egg_image(id, self.egg_frames.len())?
                else {
                    return Ok(NodeActivation::EggUnchanged);
                };
                if let Some(image) = self.egg_frames.get(image_index).cloned() {
                    self.nodes.set_image(id, Some(image))?;
                }
                Ok(NodeActivation::EggCycled { image_index })
            }
        }
    }

    /// Runs a built-in function. Returns `false` for keys the desktop does not know.
    fn run_function(&mut self, function_key: &str) -> Result<bool> {
        match function_key {
            EMPTY_TRASH_FUNCTION => {
                self.empty_trash()?;
            }
            DOWNLOAD_EGG_FUNCTION => {
                self.download_egg()?;
            }
            _ => {
                debug!("function {function_key} is left to the caller");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Opens or raises the window of `application_id` for `context`.
    ///
    /// A newly spawned node or document window starts its history at that node or document.
    /// Node-scoped windows are only opened for nodes that exist.
    pub fn open_application(
        &mut self,
        application_id: &str,
        context: WindowContext,
    ) -> Result<(WindowId, Activation)> {
        let scope = self.applications.get(application_id).map(|app| app.scope);
        if let (Some(WindowScope::PerNode), Some(node)) = (scope, context.node_id) {
            if !self.nodes.contains(node) {
                return Err(Error::NodeNotFound {
                    id: node.to_owned(),
                });
            }
        }

        let (id, activation) =
            self.windows
                .open_or_focus(&self.applications, application_id, context)?;

        if activation == Activation::Spawned {
            let initial = self.windows.get(id.as_str()).and_then(|window| {
                window
                    .node_id
                    .as_ref()
                    .map(|node| node.to_string())
                    .or_else(|| window.document_config_id.clone())
            });
            if let Some(initial) = initial {
                self.histories.create_history(id.as_str(), initial);
            }
            self.sync_location(id.as_str())?;
        }

        Ok((id, activation))
    }

    /// Closes the window. Its history is kept for when it is opened again.
    pub fn close_window(&mut self, id: &str) -> Result<()> {
        self.windows.close(id)?;
        Ok(())
    }

    /// Pushes `item` onto the window's history and shows it.
    pub fn navigate(&mut self, window: &str, item: String) -> Result<()> {
        self.expect_window(window)?;
        if self.histories.contains(window) {
            self.histories.add_to_history(window, item)?;
        } else {
            self.histories.create_history(window, item);
        }
        self.sync_location(window)
    }

    pub fn go_back(&mut self, window: &str) -> Result<bool> {
        self.expect_window(window)?;
        let moved = self.histories.go_back(window);
        self.sync_location(window)?;
        Ok(moved)
    }

    pub fn go_forward(&mut self, window: &str) -> Result<bool> {
        self.expect_window(window)?;
        let moved = self.histories.go_forward(window);
        self.sync_location(window)?;
        Ok(moved)
    }

    pub fn go_to_index(&mut self, window: &str, index: usize) -> Result<bool> {
        self.expect_window(window)?;
        let moved = self.histories.go_to_index(window, index);
        self.sync_location(window)?;
        Ok(moved)
    }

    fn expect_window(&self, window: &str) -> Result<()> {
        if self.windows.contains(window) {
            Ok(())
        } else {
            Err(Error::WindowNotFound {
                window: WindowId::from(window),
            })
        }
    }

    fn sync_location(&mut self, window: &str) -> Result<()> {
        let location = self.histories.get_current_item(window).cloned();
        self.windows.set_location(window, location)
    }

    /// Cursor feedback while `dragged` hovers over `target`.
    pub fn drag_over(&mut self, dragged: &str, target: &str) -> bool {
        self.move_hints.is_valid_move(&self.nodes, dragged, target)
    }

    /// Drops `dragged` onto `target`. Returns whether the node moved.
    ///
    /// Drops that cannot move anything are ignored, whatever the drag-over hint said.
    pub fn drop_node(&mut self, dragged: &str, target: &str) -> Result<bool> {
        match self.nodes.move_node(dragged, target) {
            Ok(moved) => Ok(moved),
            Err(err @ (Error::InvalidMove { .. } | Error::NodeNotFound { .. })) => {
                debug!("ignoring drop: {err}");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    pub fn move_to_trash(&mut self, id: &str) -> Result<bool> {
        let trash = self.trash.clone();
        self.drop_node(id, trash.as_str())
    }

    pub fn create_directory(&mut self, id: &str, parent: &str, label: &str) -> Result<()> {
        self.nodes.create_node(NodeEntry::directory(id, label), parent)
    }

    pub fn rename_node(&mut self, id: &str, label: &str) -> Result<()> {
        self.nodes.rename_node(id, label)
    }

    /// Deletes `id` and everything below it, closing windows that showed any of it.
    ///
    /// Returns the ids of the removed nodes.
    pub fn delete_node(&mut self, id: &str) -> Result<Vec<NodeId>> {
        let removed = self.nodes.delete_node(id)?;

        let removed_ids: HashSet<&NodeId> = removed.iter().map(NodeEntry::id).collect();
        let removed_documents: HashSet<(&str, &str)> = removed
            .iter()
            .filter_map(|node| match node.kind() {
                NodeKind::Document {
                    application_id,
                    document_config_id,
                } => Some((application_id.as_str(), document_config_id.as_str())),
                _ => None,
            })
            .filter(|&(app, doc)| !self.document_in_use(app, doc))
            .collect();

        let stale: Vec<WindowId> = self
            .windows
            .windows()
            .iter()
            .filter(|window| {
                window.node_id.as_ref().is_some_and(|node| removed_ids.contains(node))
                    || window.document_config_id.as_deref().is_some_and(|doc| {
                        removed_documents.contains(&(window.application_id.as_str(), doc))
                    })
            })
            .map(|window| window.id.clone())
            .collect();

        // Closed windows keep their histories, so drop those by key as well.
        let mut stale_histories = Vec::new();
        for app in self.applications.iter() {
            match app.scope {
                WindowScope::PerNode => {
                    for node in &removed_ids {
                        let context = WindowContext::node(node.as_str());
                        stale_histories.push(resolve_window_id(app, context)?);
                    }
                }
                WindowScope::PerDocument => {
                    let docs = removed_documents.iter().filter(|(a, _)| *a == app.id);
                    for &(_, doc) in docs {
                        let context = WindowContext::document(doc);
                        stale_histories.push(resolve_window_id(app, context)?);
                    }
                }
                WindowScope::PerApplication => (),
            }
        }

        for window in stale {
            debug!("closing {window}, its content was deleted");
            self.windows.close(window.as_str())?;
        }
        for history in stale_histories {
            if self.histories.remove_history(history.as_str()).is_some() {
                debug!("dropped history of {history}");
            }
        }

        Ok(removed.into_iter().map(|node| node.id().clone()).collect())
    }

    fn document_in_use(&self, application_id: &str, document_config_id: &str) -> bool {
        self.nodes.descendants(self.nodes.root_id().as_str()).iter().any(|id| {
            self.nodes.get_node(id.as_str()).is_some_and(|node| {
                matches!(
                    node.kind(),
                    NodeKind::Document { application_id: app, document_config_id: doc }
                        if app == application_id && doc == document_config_id
                )
            })
        })
    }

    /// Deletes everything in the trash. Returns the number of removed nodes.
    pub fn empty_trash(&mut self) -> Result<usize> {
        let children = self.nodes.get_node(self.trash.as_str()).map_or_else(Vec::new, |trash| {
            trash.children().to_vec()
        });

        let mut count = 0;
        for child in children {
            count += self.delete_node(child.as_str())?.len();
        }

        info!("emptied trash, {count} nodes removed");
        Ok(count)
    }

    /// Creates a new easter egg in the downloads directory.
    pub fn download_egg(&mut self) -> Result<NodeId> {
        let id = loop {
            self.eggs_downloaded += 1;
            let id = format!("egg-{}", self.eggs_downloaded);
            if !self.nodes.contains(&id) {
                break id;
            }
        };

        let mut entry = NodeEntry::easter_egg(id.as_str(), "Egg");
        if let Some(frame) = self.egg_frames.first() {
            entry = entry.with_image(frame);
        }
        self.nodes.create_node(entry, self.downloads.as_str())?;

        info!("downloaded {id}");
        Ok(NodeId::from(id))
    }

    pub fn break_egg(&mut self, id: &str) -> Result<bool> {
        self.nodes.break_egg(id)
    }

    /// Runs `action`, applying the error policy.
    pub fn do_action(&mut self, action: Action) -> Result<()> {
        trace!("{action:?}");
        match self.do_action_inner(&action) {
            Ok(()) => Ok(()),
            Err(err) if err.is_structural() => match self.policy {
                ErrorPolicy::Strict => Err(err),
                ErrorPolicy::Lenient => {
                    warn!("ignoring {action:?}: {err}");
                    Ok(())
                }
            },
            Err(err) => {
                debug!("ignoring {action:?}: {err}");
                Ok(())
            }
        }
    }

    fn do_action_inner(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::OpenNode(id) => {
                let activation = self.activate_node(id)?;
                debug!("activated {id}: {activation:?}");
            }
            Action::OpenApplication(application, node, document) => {
                let context = WindowContext {
                    node_id: node.as_deref(),
                    document_config_id: document.as_deref(),
                };
                self.open_application(application, context)?;
            }
            Action::FocusWindow(id) => self.windows.focus(id)?,
            Action::CloseWindow(id) => self.close_window(id)?,
            Action::MinimizeWindow(id) => self.windows.minimize(id)?,
            Action::RestoreWindow(id) => self.windows.restore(id)?,
            Action::MaximizeWindow(id) => {
                self.windows.maximize(id)?;
            }
            Action::ToggleMaximizeWindow(id) => {
                self.windows.toggle_maximize(id)?;
            }
            Action::MoveWindow(id, x, y) => {
                self.windows.move_to(id, *x, *y)?;
            }
            Action::ResizeWindow(id, width, height) => {
                self.windows.resize(id, *width, *height)?;
            }
            Action::Navigate(window, item) => self.navigate(window, item.clone())?,
            Action::GoBack(window) => {
                self.go_back(window)?;
            }
            Action::GoForward(window) => {
                self.go_forward(window)?;
            }
            Action::GoToIndex(window, index) => {
                self.go_to_index(window, *index)?;
            }
            Action::MoveNode(id, target) => {
                self.drop_node(id, target)?;
            }
            Action::CreateDirectory(id, parent, label) => {
                self.create_directory(id, parent, label.as_deref().unwrap_or(id))?;
            }
            Action::RenameNode(id, label) => self.rename_node(id, label)?,
            Action::DeleteNode(id) => {
                self.delete_node(id)?;
            }
            Action::MoveToTrash(id) => {
                self.move_to_trash(id)?;
            }
            Action::EmptyTrash => {
                self.empty_trash()?;
            }
            Action::DownloadEgg => {
                self.download_egg()?;
            }
            Action::BreakEgg(id) => {
                self.break_egg(id)?;
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> DesktopSnapshot {
        DesktopSnapshot {
            root: self.nodes.root_id().to_string(),
            nodes: self.nodes.snapshot(),
            windows: self.windows.snapshot(),
            histories: self.histories.snapshot(),
            focused_window: self.windows.focused_window().map(|w| w.id.to_string()),
        }
    }

    #[cfg(test)]
    pub(crate) fn verify_invariants(&self) {
        self.nodes.verify_invariants();
        self.windows.verify_invariants();

        for window in self.windows.windows() {
            if let Some(node) = &window.node_id {
                assert!(
                    self.nodes.contains(node.as_str()),
                    "{} shows deleted node {node}",
                    window.id
                );
            }
            assert_eq!(
                window.location.as_ref(),
                self.histories.get_current_item(window.id.as_str()),
                "{} location must mirror its history",
                window.id
            );
        }
    }
}

fn with_meta(mut entry: NodeEntry, meta: NodeMeta) -> NodeEntry {
    if let Some(image) = meta.image {
        entry = entry.with_image(image);
    }
    if let Some(date) = meta.date_modified {
        entry = entry.with_date_modified(date);
    }
    if let Some(size) = meta.size {
        entry = entry.with_size(size);
    }
    entry
}

fn entry_from_decl(decl: &NodeDecl) -> NodeEntry {
    let meta = decl.meta();
    let (id, label) = (meta.id, meta.label.unwrap_or(meta.id));

    let entry = match decl {
        NodeDecl::Directory(_) => NodeEntry::directory(id, label),
        NodeDecl::App(app) => NodeEntry::application(
            id,
            label,
            &app.application_id,
            app.component_key.as_deref().unwrap_or(&app.application_id),
        ),
        NodeDecl::Link(link) => NodeEntry::link(id, label, &link.url),
        NodeDecl::Document(doc) => NodeEntry::document(
            id,
            label,
            &doc.application_id,
            doc.document_config_id.as_deref().unwrap_or(id),
        ),
        NodeDecl::Function(function) => NodeEntry::function(id, label, &function.function_key),
        NodeDecl::EasterEgg(_) => NodeEntry::easter_egg(id, label),
    };

    with_meta(entry, meta)
}
