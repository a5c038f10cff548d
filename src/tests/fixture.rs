use std::fmt::Write as _;

use vdesk_config::{Config, Script};

use crate::desktop::{Desktop, ErrorPolicy};
use crate::error::Result;

pub struct Fixture {
    pub desktop: Desktop,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        let mut desktop = Desktop::from_config(config).unwrap();
        desktop.set_policy(ErrorPolicy::Strict);
        desktop.verify_invariants();
        Self { desktop }
    }

    #[track_caller]
    pub fn parse(text: &str) -> Self {
        let config = Config::parse("test.kdl", text)
            .map_err(miette::Report::new)
            .unwrap();
        Self::with_config(&config)
    }

    /// Runs every action of `script`, checking invariants after each one.
    #[track_caller]
    pub fn run(&mut self, script: &str) {
        self.try_run(script).unwrap();
    }

    #[track_caller]
    pub fn try_run(&mut self, script: &str) -> Result<()> {
        let script = Script::parse("script.kdl", script)
            .map_err(miette::Report::new)
            .unwrap();
        for action in script.actions {
            self.desktop.do_action(action)?;
            self.desktop.verify_invariants();
        }
        Ok(())
    }

    pub fn subtree(&self, id: &str) -> String {
        self.desktop.nodes().debug_subtree(id)
    }

    /// Open windows from bottom to top.
    pub fn format_windows(&self) -> String {
        let mut out = String::new();
        for window in self.desktop.windows().windows_by_z() {
            let _ = write!(out, "{}: z={}", window.id, window.z_index);
            if window.is_minimized {
                out.push_str(", minimized");
            }
            if window.is_maximized {
                out.push_str(", maximized");
            }
            let location = window.location.as_deref().unwrap_or("-");
            let _ = writeln!(out, ", location={location}");
        }
        out
    }

    pub fn history(&self, window: &str) -> String {
        let histories = self.desktop.histories();
        let items = histories.get_history_items(window);
        let current = histories.get_current_index(window);

        let mut out = String::new();
        for (idx, item) in items.iter().enumerate() {
            let marker = if Some(idx) == current { "*" } else { "-" };
            let _ = writeln!(out, "{marker} {item}");
        }
        out
    }
}
