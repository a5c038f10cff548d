#[macro_use]
extern crate tracing;

pub mod cli;
pub mod desktop;
pub mod error;
pub mod history;
pub mod node;
pub mod window;

#[cfg(test)]
mod tests;

pub use crate::desktop::{Desktop, ErrorPolicy, NodeActivation};
pub use crate::error::{Error, Result};
pub use crate::history::{History, HistoryManager};
pub use crate::node::moves::{check_move, is_valid_move, MoveCheck, MoveHintCache, MoveRejection};
pub use crate::node::{NodeEntry, NodeId, NodeKind, NodeStore};
pub use crate::window::{
    resolve_window_id, Activation, ApplicationDescriptor, ApplicationRegistry, Window,
    WindowContext, WindowId, WindowRegistry,
};
