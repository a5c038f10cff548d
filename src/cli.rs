use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vdesk_ipc::WindowScope;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(subcommand_value_name = "SUBCOMMAND")]
#[command(subcommand_help_heading = "Subcommands")]
pub struct Cli {
    /// Path to config file (default: `$XDG_CONFIG_HOME/vdesk/config.kdl`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub subcommand: Sub,
}

#[derive(Subcommand)]
pub enum Sub {
    /// Validate the config file.
    Validate,
    /// Print the initial node tree.
    Tree,
    /// Print the initial desktop state as JSON.
    Snapshot,
    /// List registered applications.
    Applications {
        /// Only list applications with this window scope.
        #[arg(long, value_enum)]
        scope: Option<WindowScope>,
    },
    /// Print the window id an activation would resolve to.
    Resolve {
        application: String,
        /// Node the application is opened for.
        #[arg(long)]
        node: Option<String>,
        /// Document the application is opened for.
        #[arg(long)]
        document: Option<String>,
    },
    /// Run a KDL action script against the initial desktop.
    Run {
        script: PathBuf,
        /// Print the final state as JSON instead of a tree.
        #[arg(long)]
        json: bool,
        /// Log and skip structural errors instead of stopping at the first one.
        #[arg(long)]
        lenient: bool,
    },
}
