//! Content-addressed window identity.
//!
//! A window id is a pure function of the application and, depending on its scope, the node or
//! document it was opened for. Activating the same target twice therefore lands on the same id,
//! which is what turns a second open into a focus.

use vdesk_config::ApplicationDecl;
use vdesk_ipc::WindowScope;

use super::WindowId;
use crate::error::{Error, Result};

/// An application as registered with the desktop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDescriptor {
    pub id: String,
    pub title: String,
    pub scope: WindowScope,
    pub component_key: String,
    /// Size of newly spawned windows.
    pub width: u32,
    pub height: u32,
    /// Windows refuse moves, resizes and maximizing.
    pub fixed: bool,
}

impl ApplicationDescriptor {
    pub fn new(id: impl Into<String>, scope: WindowScope) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            component_key: id.clone(),
            id,
            scope,
            width: 640,
            height: 480,
            fixed: false,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    pub fn from_decl(decl: &ApplicationDecl) -> Self {
        Self {
            id: decl.id.clone(),
            title: decl.title.clone().unwrap_or_else(|| decl.id.clone()),
            scope: decl.scope,
            component_key: decl.component_key().to_owned(),
            width: decl.size.width,
            height: decl.size.height,
            fixed: decl.fixed,
        }
    }
}

/// What an activation was triggered for.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WindowContext<'a> {
    pub node_id: Option<&'a str>,
    pub document_config_id: Option<&'a str>,
}

impl<'a> WindowContext<'a> {
    pub fn node(node_id: &'a str) -> Self {
        Self {
            node_id: Some(node_id),
            document_config_id: None,
        }
    }

    pub fn document(document_config_id: &'a str) -> Self {
        Self {
            node_id: None,
            document_config_id: Some(document_config_id),
        }
    }
}

/// Derives the window id for `app` in `context`.
///
/// Context fields the scope does not use are ignored.
pub fn resolve_window_id(app: &ApplicationDescriptor, context: WindowContext) -> Result<WindowId> {
    let suffix = match app.scope {
        WindowScope::PerApplication => Some("singleton"),
        WindowScope::PerNode => context.node_id,
        WindowScope::PerDocument => context.document_config_id,
    };

    let Some(suffix) = suffix else {
        return Err(Error::UnresolvedWindowContext {
            application: app.id.clone(),
            scope: app.scope,
            missing: app.scope.required_context().unwrap_or_default(),
        });
    };

    Ok(WindowId::new(format!("{}-{suffix}", app.id)))
}

/// Applications known to the desktop, in registration order.
#[derive(Debug, Default, Clone)]
pub struct ApplicationRegistry {
    applications: Vec<ApplicationDescriptor>,
}

impl ApplicationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `app`. Each application declares its scope exactly once.
    pub fn register(&mut self, app: ApplicationDescriptor) -> Result<()> {
        if self.contains(&app.id) {
            return Err(Error::DuplicateApplication {
                application: app.id,
            });
        }

        debug!("registered {} with scope {}", app.id, app.scope);
        self.applications.push(app);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ApplicationDescriptor> {
        self.applications.iter().find(|app| app.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApplicationDescriptor> + '_ {
        self.applications.iter()
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    pub fn resolve_window_id(&self, application_id: &str, context: WindowContext) -> Result<WindowId> {
        let app = self.get(application_id).ok_or_else(|| Error::UnknownApplication {
            application: application_id.to_owned(),
        })?;
        resolve_window_id(app, context)
    }
}
