/// A sequence of actions, as read from a KDL script.
#[derive(knuffel::Decode, Debug, Default, Clone, PartialEq)]
pub struct Script {
    #[knuffel(children)]
    pub actions: Vec<Action>,
}

impl Script {
    pub fn parse(filename: &str, text: &str) -> Result<Self, knuffel::Error> {
        knuffel::parse(filename, text)
    }
}

/// Commands accepted by the desktop.
///
/// Drag-and-drop, activation and navigation surfaces all reduce to one of these.
#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub enum Action {
    /// Activate a node as if it was double-clicked.
    OpenNode(#[knuffel(argument)] String),
    OpenApplication(
        #[knuffel(argument)] String,
        #[knuffel(property(name = "node"))] Option<String>,
        #[knuffel(property(name = "document"))] Option<String>,
    ),
    FocusWindow(#[knuffel(argument)] String),
    CloseWindow(#[knuffel(argument)] String),
    MinimizeWindow(#[knuffel(argument)] String),
    RestoreWindow(#[knuffel(argument)] String),
    MaximizeWindow(#[knuffel(argument)] String),
    ToggleMaximizeWindow(#[knuffel(argument)] String),
    MoveWindow(
        #[knuffel(argument)] String,
        #[knuffel(argument)] i32,
        #[knuffel(argument)] i32,
    ),
    ResizeWindow(
        #[knuffel(argument)] String,
        #[knuffel(argument)] u32,
        #[knuffel(argument)] u32,
    ),
    /// Push a location (URL, directory id) onto a window's history.
    Navigate(#[knuffel(argument)] String, #[knuffel(argument)] String),
    GoBack(#[knuffel(argument)] String),
    GoForward(#[knuffel(argument)] String),
    GoToIndex(#[knuffel(argument)] String, #[knuffel(argument)] usize),
    /// Drop a node onto a directory.
    MoveNode(#[knuffel(argument)] String, #[knuffel(argument)] String),
    CreateDirectory(
        #[knuffel(argument)] String,
        #[knuffel(argument)] String,
        #[knuffel(property(name = "label"))] Option<String>,
    ),
    RenameNode(#[knuffel(argument)] String, #[knuffel(argument)] String),
    DeleteNode(#[knuffel(argument)] String),
    MoveToTrash(#[knuffel(argument)] String),
    EmptyTrash,
    DownloadEgg,
    BreakEgg(#[knuffel(argument)] String),
}
