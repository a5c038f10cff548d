#[macro_use]
extern crate tracing;

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use miette::{IntoDiagnostic as _, WrapErr as _};
pub use vdesk_ipc::WindowScope;

pub mod actions;
pub mod filesystem;
pub mod utils;

pub use crate::actions::{Action, Script};
pub use crate::filesystem::{
    AppDecl, DirectoryDecl, DocumentDecl, EasterEggDecl, Filesystem, FunctionDecl, LinkDecl,
    NodeDecl, NodeMeta,
};

pub const DEFAULT_CONFIG: &str = include_str!("../../resources/default-config.kdl");

pub const DEFAULT_ROOT: &str = "root";
pub const DEFAULT_TRASH: &str = "trash";
pub const DEFAULT_DOWNLOADS: &str = "downloads";
pub const DEFAULT_FINDER: &str = "finder";
pub const DEFAULT_BROWSER: &str = "browser";

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Config {
    #[knuffel(child, default)]
    pub debug: DebugConfig,
    #[knuffel(child, default)]
    pub desktop: DesktopConfig,
    #[knuffel(children(name = "application"))]
    pub applications: Vec<ApplicationDecl>,
    #[knuffel(child, default)]
    pub filesystem: Filesystem,
}

#[derive(knuffel::Decode, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DebugConfig {
    #[knuffel(child)]
    pub strict_errors: bool,
    #[knuffel(child)]
    pub lenient_errors: bool,
}

/// Well-known node and application ids plus window placement.
#[derive(knuffel::Decode, Debug, Clone, PartialEq, Eq)]
pub struct DesktopConfig {
    #[knuffel(child, unwrap(argument), default = DEFAULT_ROOT.to_owned())]
    pub root: String,
    #[knuffel(child, unwrap(argument), default = DEFAULT_TRASH.to_owned())]
    pub trash: String,
    #[knuffel(child, unwrap(argument), default = DEFAULT_DOWNLOADS.to_owned())]
    pub downloads: String,
    /// Application that opens directories.
    #[knuffel(child, unwrap(argument), default = DEFAULT_FINDER.to_owned())]
    pub finder: String,
    /// Application that opens links.
    #[knuffel(child, unwrap(argument), default = DEFAULT_BROWSER.to_owned())]
    pub browser: String,
    /// Image keys an easter egg cycles through.
    #[knuffel(child, unwrap(arguments), default)]
    pub egg_frames: Vec<String>,
    #[knuffel(child, unwrap(argument), default = 80)]
    pub cascade_origin: i32,
    #[knuffel(child, unwrap(argument), default = 24)]
    pub cascade_step: i32,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_owned(),
            trash: DEFAULT_TRASH.to_owned(),
            downloads: DEFAULT_DOWNLOADS.to_owned(),
            finder: DEFAULT_FINDER.to_owned(),
            browser: DEFAULT_BROWSER.to_owned(),
            egg_frames: Vec::new(),
            cascade_origin: 80,
            cascade_step: 24,
        }
    }
}

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct ApplicationDecl {
    #[knuffel(argument)]
    pub id: String,
    #[knuffel(child, unwrap(argument))]
    pub title: Option<String>,
    #[knuffel(child, unwrap(argument, str), default)]
    pub scope: WindowScope,
    #[knuffel(child, unwrap(argument))]
    pub component: Option<String>,
    #[knuffel(child, default)]
    pub size: WindowSize,
    #[knuffel(child)]
    pub fixed: bool,
}

#[derive(knuffel::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    #[knuffel(argument)]
    pub width: u32,
    #[knuffel(argument)]
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

impl ApplicationDecl {
    /// Component key, falling back to the application id.
    pub fn component_key(&self) -> &str {
        self.component.as_deref().unwrap_or(&self.id)
    }
}

impl Config {
    pub fn load(path: &Path) -> miette::Result<Self> {
        let contents = fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("error reading {path:?}"))?;

        let filename = path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or("config.kdl");
        let config = Self::parse(filename, &contents).wrap_err("error parsing config")?;
        debug!("loaded config from {path:?}");
        Ok(config)
    }

    pub fn parse(filename: &str, text: &str) -> Result<Self, knuffel::Error> {
        knuffel::parse(filename, text)
    }

    pub fn application(&self, id: &str) -> Option<&ApplicationDecl> {
        self.applications.iter().find(|app| app.id == id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::parse("default-config.kdl", DEFAULT_CONFIG).unwrap()
    }
}
