//! Open windows and their stacking order.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use vdesk_ipc::WindowScope;

use crate::error::{Error, Result};
use crate::node::NodeId;

pub mod identity;


pub use self::identity::{
    resolve_window_id, ApplicationDescriptor, ApplicationRegistry, WindowContext,
};

/// Number of cascade steps before new windows wrap back to the origin.
const CASCADE_SLOTS: u32 = 8;

/// Window identifier derived by [`resolve_window_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for WindowId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub id: WindowId,
    pub application_id: String,
    pub node_id: Option<NodeId>,
    pub document_config_id: Option<String>,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Stacking order, assigned from a counter that never goes back.
    pub z_index: u64,
    pub is_minimized: bool,
    pub is_maximized: bool,
    pub fixed: bool,
    /// Current item of the window's history, mirrored by the desktop.
    pub location: Option<String>,
}

impl Window {
    pub fn to_ipc(&self, is_focused: bool) -> vdesk_ipc::Window {
        vdesk_ipc::Window {
            id: self.id.to_string(),
            application_id: self.application_id.clone(),
            node_id: self.node_id.as_ref().map(|id| id.to_string()),
            document_config_id: self.document_config_id.clone(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            z_index: self.z_index,
            is_minimized: self.is_minimized,
            is_maximized: self.is_maximized,
            is_focused,
            fixed: self.fixed,
            location: self.location.clone(),
        }
    }
}

/// How [`WindowRegistry::open_or_focus`] satisfied an activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The window was already open and got raised.
    Focused,
    /// The window was minimized and got restored and raised.
    Restored,
    /// A new window was created.
    Spawned,
}

#[derive(Debug, Clone)]
pub struct WindowRegistry {
    /// Open windows in opening order.
    windows: Vec<Window>,
    next_z_index: u64,
    /// Windows spawned so far, drives cascade placement.
    spawned: u32,
    cascade_origin: i32,
    cascade_step: i32,
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl WindowRegistry {
    pub fn new(cascade_origin: i32, cascade_step: i32) -> Self {
        Self {
            windows: Vec::new(),
            next_z_index: 1,
            spawned: 0,
            cascade_origin,
            cascade_step,
        }
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.id.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn next_z_index(&self) -> u64 {
        self.next_z_index
    }

    /// Windows from bottom to top.
    pub fn windows_by_z(&self) -> Vec<&Window> {
        let mut windows: Vec<_> = self.windows.iter().collect();
        windows.sort_by_key(|w| w.z_index);
        windows
    }

    /// The topmost window that is not minimized.
    pub fn focused_window(&self) -> Option<&Window> {
        self.windows
            .iter()
            .filter(|w| !w.is_minimized)
            .max_by_key(|w| w.z_index)
    }

    pub fn windows_for_node<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Window> {
        self.windows
            .iter()
            .filter(move |w| w.node_id.as_ref().is_some_and(|id| id.as_str() == node_id))
    }

    /// Resolves the window for `application_id` in `context` and raises it, spawning it first
    /// if it is not open yet.
    ///
    /// Never creates a second window with the same id. An id already taken by another
    /// application's window is a [`Error::WindowIdCollision`].
    pub fn open_or_focus(
        &mut self,
        applications: &ApplicationRegistry,
        application_id: &str,
        context: WindowContext,
    ) -> Result<(WindowId, Activation)> {
        let app = applications
            .get(application_id)
            .ok_or_else(|| Error::UnknownApplication {
                application: application_id.to_owned(),
            })?;
        let id = resolve_window_id(app, context)?;

        if let Some(window) = self.get(id.as_str()) {
            if window.application_id != app.id {
                return Err(Error::WindowIdCollision {
                    window: id,
                    owner: window.application_id.clone(),
                    application: app.id.clone(),
                });
            }
            let activation = if window.is_minimized {
                Activation::Restored
            } else {
                Activation::Focused
            };
            self.focus(id.as_str())?;
            debug!("{activation:?} existing window {id}");
            return Ok((id, activation));
        }

        let offset = self.cascade_step * (self.spawned % CASCADE_SLOTS) as i32;
        self.spawned += 1;

        let window = Window {
            id: id.clone(),
            application_id: app.id.clone(),
            // Only the context the scope keys on is recorded.
            node_id: (app.scope == WindowScope::PerNode)
                .then_some(context.node_id)
                .flatten()
                .map(NodeId::from),
            document_config_id: (app.scope == WindowScope::PerDocument)
                .then_some(context.document_config_id)
                .flatten()
                .map(str::to_owned),
            x: self.cascade_origin + offset,
            y: self.cascade_origin + offset,
            width: app.width,
            height: app.height,
            z_index: 0,
            is_minimized: false,
            is_maximized: false,
            fixed: app.fixed,
            location: None,
        };
        self.windows.push(window);
        self.focus(id.as_str())?;

        debug!("spawned window {id}");
        Ok((id, Activation::Spawned))
    }

    /// Raises the window to the top of the stack, unminimizing it.
    pub fn focus(&mut self, id: &str) -> Result<()> {
        let z_index = self.next_z_index;
        let window = self.get_mut(id)?;
        window.z_index = z_index;
        window.is_minimized = false;
        self.next_z_index += 1;
        Ok(())
    }

    /// Removes the window. Whatever it was showing is left alone.
    pub fn close(&mut self, id: &str) -> Result<Window> {
        let idx = self
            .windows
            .iter()
            .position(|w| w.id.as_str() == id)
            .ok_or_else(|| Error::WindowNotFound {
                window: WindowId::from(id),
            })?;
        debug!("closed window {id}");
        Ok(self.windows.remove(idx))
    }

    pub fn minimize(&mut self, id: &str) -> Result<()> {
        self.get_mut(id)?.is_minimized = true;
        Ok(())
    }

    /// Brings the window out of both minimized and maximized state and raises it.
    pub fn restore(&mut self, id: &str) -> Result<()> {
        self.get_mut(id)?.is_maximized = false;
        self.focus(id)
    }

    /// Maximizes and raises the window. Returns `false` for fixed windows, which stay as is.
    pub fn maximize(&mut self, id: &str) -> Result<bool> {
        let window = self.get_mut(id)?;
        if window.fixed {
            return Ok(false);
        }
        window.is_maximized = true;
        self.focus(id)?;
        Ok(true)
    }

    pub fn toggle_maximize(&mut self, id: &str) -> Result<bool> {
        let window = self.get_mut(id)?;
        if window.is_maximized {
            window.is_maximized = false;
            Ok(true)
        } else {
            self.maximize(id)
        }
    }

    /// Moves the window. Returns `false` for fixed windows, which stay as is.
    pub fn move_to(&mut self, id: &str, x: i32, y: i32) -> Result<bool> {
        let window = self.get_mut(id)?;
        if window.fixed {
            return Ok(false);
        }
        window.x = x;
        window.y = y;
        Ok(true)
    }

    /// Resizes the window. Returns `false` for fixed windows, which stay as is.
    pub fn resize(&mut self, id: &str, width: u32, height: u32) -> Result<bool> {
        let window = self.get_mut(id)?;
        if window.fixed {
            return Ok(false);
        }
        window.width = width;
        window.height = height;
        Ok(true)
    }

    pub fn set_location(&mut self, id: &str, location: Option<String>) -> Result<()> {
        self.get_mut(id)?.location = location;
        Ok(())
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Window> {
        self.windows
            .iter_mut()
            .find(|w| w.id.as_str() == id)
            .ok_or_else(|| Error::WindowNotFound {
                window: WindowId::from(id),
            })
    }

    pub fn snapshot(&self) -> Vec<vdesk_ipc::Window> {
        let focused = self.focused_window().map(|w| &w.id);
        self.windows
            .iter()
            .map(|w| w.to_ipc(Some(&w.id) == focused))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn verify_invariants(&self) {
        use std::collections::HashSet;

        let mut ids = HashSet::new();
        let mut z_indices = HashSet::new();
        for window in &self.windows {
            assert!(ids.insert(&window.id), "duplicate window {}", window.id);
            assert!(
                z_indices.insert(window.z_index),
                "z-index {} is used twice",
                window.z_index
            );
            assert!(window.z_index > 0, "{} was never focused", window.id);
            assert!(window.z_index < self.next_z_index);
        }
    }
}
