use vdesk_ipc::WindowScope;

use crate::node::moves::MoveRejection;
use crate::node::NodeId;
use crate::window::WindowId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by the node store, history manager and window registry.
///
/// Everything here is a programmer error: routine negative outcomes such as an invalid drop
/// target or going back at the start of a history are plain `bool`/`Option` returns instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("parent `{parent}` is not an existing directory")]
    ParentNotFound { parent: String },
    #[error("node `{id}` already exists")]
    DuplicateId { id: NodeId },
    #[error("cannot move `{node}` into `{target}`: {reason}")]
    InvalidMove {
        node: NodeId,
        target: NodeId,
        reason: MoveRejection,
    },
    #[error("application `{application}` has scope {scope} but no {missing} was given")]
    UnresolvedWindowContext {
        application: String,
        scope: WindowScope,
        missing: &'static str,
    },
    #[error("no history for `{history}`")]
    HistoryNotInitialized { history: String },
    #[error("node `{id}` does not exist")]
    NodeNotFound { id: String },
    #[error("the root node cannot be moved or deleted")]
    RootNode,
    #[error("application `{application}` is not registered")]
    UnknownApplication { application: String },
    #[error("application `{application}` is already registered")]
    DuplicateApplication { application: String },
    #[error("window `{window}` is not open")]
    WindowNotFound { window: WindowId },
    #[error("`{application}` resolves to window `{window}`, which belongs to `{owner}`")]
    WindowIdCollision {
        window: WindowId,
        owner: String,
        application: String,
    },
}

impl Error {
    /// Whether the error signals a broken caller contract rather than a user mistake.
    ///
    /// Structural errors are returned in strict mode and logged-and-ignored in lenient mode.
    /// The rest (dropping a node somewhere it cannot go, addressing a window that was just
    /// closed) are always silent no-ops at the command layer.
    pub fn is_structural(&self) -> bool {
        match self {
            Error::ParentNotFound { .. }
            | Error::DuplicateId { .. }
            | Error::UnresolvedWindowContext { .. }
            | Error::HistoryNotInitialized { .. }
            | Error::UnknownApplication { .. }
            | Error::DuplicateApplication { .. }
            | Error::WindowIdCollision { .. } => true,
            Error::InvalidMove { .. }
            | Error::NodeNotFound { .. }
            | Error::RootNode
            | Error::WindowNotFound { .. } => false,
        }
    }
}
