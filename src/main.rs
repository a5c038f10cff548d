#[macro_use]
extern crate tracing;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use directories::ProjectDirs;
use tracing_subscriber::EnvFilter;
use vdesk::cli::{Cli, Sub};
use vdesk::{Desktop, ErrorPolicy, WindowContext};
use vdesk_config::{Config, Script};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let directives = env::var("RUST_LOG").unwrap_or_else(|_| "vdesk=info".to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    let config = load_config(cli.config)?;

    match cli.subcommand {
        Sub::Validate => {
            Desktop::from_config(&config).context("error building the desktop")?;
            info!("config is valid");
        }
        Sub::Tree => {
            let desktop = Desktop::from_config(&config)?;
            print!("{}", desktop.nodes().debug_tree());
        }
        Sub::Snapshot => {
            let desktop = Desktop::from_config(&config)?;
            println!("{}", desktop.snapshot().to_json_pretty()?);
        }
        Sub::Applications { scope } => {
            let desktop = Desktop::from_config(&config)?;
            for app in desktop.applications().iter() {
                if scope.is_some_and(|scope| scope != app.scope) {
                    continue;
                }
                let fixed = if app.fixed { ", fixed" } else { "" };
                println!(
                    "{} \"{}\" ({}, {}x{}{fixed})",
                    app.id, app.title, app.scope, app.width, app.height
                );
            }
        }
        Sub::Resolve {
            application,
            node,
            document,
        } => {
            let desktop = Desktop::from_config(&config)?;
            let context = WindowContext {
                node_id: node.as_deref(),
                document_config_id: document.as_deref(),
            };
            let id = desktop
                .applications()
                .resolve_window_id(&application, context)?;
            println!("{id}");
        }
        Sub::Run {
            script,
            json,
            lenient,
        } => {
            let mut desktop = Desktop::from_config(&config)?;
            if lenient {
                desktop.set_policy(ErrorPolicy::Lenient);
            }

            let script = load_script(&script)?;
            for (idx, action) in script.actions.into_iter().enumerate() {
                desktop
                    .do_action(action)
                    .with_context(|| format!("action #{} failed", idx + 1))?;
            }

            if json {
                println!("{}", desktop.snapshot().to_json_pretty()?);
            } else {
                print!("{}", desktop.nodes().debug_tree());
                for window in desktop.windows().windows_by_z() {
                    let minimized = if window.is_minimized { " minimized" } else { "" };
                    let maximized = if window.is_maximized { " maximized" } else { "" };
                    println!(
                        "window {} z={} at {},{} {}x{}{minimized}{maximized} -> {}",
                        window.id,
                        window.z_index,
                        window.x,
                        window.y,
                        window.width,
                        window.height,
                        window.location.as_deref().unwrap_or("-"),
                    );
                }
            }
        }
    }

    Ok(())
}

fn default_config_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "vdesk")?;
    Some(dirs.config_dir().join("config.kdl"))
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path,
        None => match default_config_path().filter(|path| path.exists()) {
            Some(path) => path,
            None => {
                debug!("no config file, using the built-in default");
                return Ok(Config::default());
            }
        },
    };

    match Config::load(&path) {
        Ok(config) => Ok(config),
        Err(err) => {
            eprintln!("{err:?}");
            bail!("error loading config from {path:?}");
        }
    }
}

fn load_script(path: &Path) -> anyhow::Result<Script> {
    let text =
        fs::read_to_string(path).with_context(|| format!("error reading {path:?}"))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("script.kdl");

    match Script::parse(filename, &text) {
        Ok(script) => Ok(script),
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            bail!("error parsing {path:?}");
        }
    }
}
