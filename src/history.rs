//! Keyed back/forward navigation stacks.
//!
//! One [`HistoryManager`] backs every navigable surface: browser URLs, finder directories and
//! plain per-window navigation all go through it. It never looks at what it stores.

use std::collections::HashMap;
use std::fmt::Display;

use crate::error::{Error, Result};

/// A single back/forward stack.
///
/// Never empty: `current_index` always points at an existing item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History<T> {
    items: Vec<T>,
    current_index: usize,
}

impl<T> History<T> {
    pub fn new(initial: T) -> Self {
        Self {
            items: vec![initial],
            current_index: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> &T {
        &self.items[self.current_index]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.current_index + 1 < self.items.len()
    }

    /// Drops everything after the current item, then appends `item` and makes it current.
    pub fn push(&mut self, item: T) {
        self.items.truncate(self.current_index + 1);
        self.items.push(item);
        self.current_index = self.items.len() - 1;
    }

    pub fn go_back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.current_index -= 1;
        true
    }

    pub fn go_forward(&mut self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.current_index += 1;
        true
    }

    pub fn go_to_index(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.current_index = index;
        true
    }

    #[cfg(test)]
    fn verify_invariants(&self) {
        assert!(!self.items.is_empty());
        assert!(self.current_index < self.items.len());
    }
}

/// Histories keyed by an opaque id, usually a window id.
///
/// Navigation on an unknown id reports `false` like any other out-of-bounds move. Only
/// [`HistoryManager::add_to_history`] treats a missing history as an error.
#[derive(Debug, Clone)]
pub struct HistoryManager<T> {
    histories: HashMap<String, History<T>>,
}

impl<T> Default for HistoryManager<T> {
    fn default() -> Self {
        Self {
            histories: HashMap::new(),
        }
    }
}

impl<T> HistoryManager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a history with `initial` unless one already exists for `id`.
    ///
    /// Returns whether a new history was created.
    pub fn create_history(&mut self, id: &str, initial: T) -> bool {
        if self.histories.contains_key(id) {
            return false;
        }

        trace!("created history {id}");
        self.histories.insert(id.to_owned(), History::new(initial));
        true
    }

    pub fn add_to_history(&mut self, id: &str, item: T) -> Result<()> {
        let history = self
            .histories
            .get_mut(id)
            .ok_or_else(|| Error::HistoryNotInitialized {
                history: id.to_owned(),
            })?;
        history.push(item);
        Ok(())
    }

    pub fn go_back(&mut self, id: &str) -> bool {
        self.histories.get_mut(id).is_some_and(History::go_back)
    }

    pub fn go_forward(&mut self, id: &str) -> bool {
        self.histories.get_mut(id).is_some_and(History::go_forward)
    }

    pub fn go_to_index(&mut self, id: &str, index: usize) -> bool {
        self.histories
            .get_mut(id)
            .is_some_and(|history| history.go_to_index(index))
    }

    pub fn can_go_back(&self, id: &str) -> bool {
        self.histories.get(id).is_some_and(History::can_go_back)
    }

    pub fn can_go_forward(&self, id: &str) -> bool {
        self.histories.get(id).is_some_and(History::can_go_forward)
    }

    pub fn get_current_item(&self, id: &str) -> Option<&T> {
        self.histories.get(id).map(History::current)
    }

    pub fn get_current_index(&self, id: &str) -> Option<usize> {
        self.histories.get(id).map(History::current_index)
    }

    pub fn get_history_items(&self, id: &str) -> &[T] {
        self.histories.get(id).map(History::items).unwrap_or_default()
    }

    pub fn get_history_length(&self, id: &str) -> usize {
        self.histories.get(id).map_or(0, History::len)
    }

    pub fn get(&self, id: &str) -> Option<&History<T>> {
        self.histories.get(id)
    }

    /// Tears down the history for `id`, returning it if there was one.
    pub fn remove_history(&mut self, id: &str) -> Option<History<T>> {
        let removed = self.histories.remove(id);
        if removed.is_some() {
            trace!("removed history {id}");
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.histories.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

impl<T: Display> HistoryManager<T> {
    /// All histories with their items rendered as strings, sorted by id.
    pub fn snapshot(&self) -> Vec<vdesk_ipc::History> {
        let mut out: Vec<_> = self
            .histories
            .iter()
            .map(|(id, history)| vdesk_ipc::History {
                id: id.clone(),
                items: history.items.iter().map(ToString::to_string).collect(),
                current_index: history.current_index,
            })
            .collect();
        out.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use proptest_derive::Arbitrary;

    use super::*;

    #[test]
    fn back_and_forward() {
        let mut manager = HistoryManager::new();
        assert!(manager.create_history("k", "a"));
        manager.add_to_history("k", "b").unwrap();
        manager.add_to_history("k", "c").unwrap();

        assert!(manager.go_back("k"));
        assert_eq!(manager.get_current_item("k"), Some(&"b"));
        assert!(manager.go_forward("k"));
        assert_eq!(manager.get_current_item("k"), Some(&"c"));
        assert!(!manager.go_forward("k"));
    }

    #[test]
    fn adding_truncates_forward_branch() {
        let mut manager = HistoryManager::new();
        manager.create_history("k", "a");
        manager.add_to_history("k", "b").unwrap();
        manager.add_to_history("k", "c").unwrap();
        manager.go_back("k");
        manager.go_forward("k");

        assert!(manager.go_back("k"));
        assert!(manager.go_back("k"));
        assert!(!manager.go_back("k"));
        manager.add_to_history("k", "d").unwrap();

        assert!(!manager.can_go_forward("k"));
        assert!(manager.can_go_back("k"));
        assert_eq!(manager.get_history_items("k"), ["a", "d"]);
        assert_eq!(manager.get_current_index("k"), Some(1));
        assert_eq!(manager.get_history_length("k"), 2);
    }

    #[test]
    fn create_is_idempotent() {
        let mut manager = HistoryManager::new();
        assert!(manager.create_history("k", 1));
        manager.add_to_history("k", 2).unwrap();

        assert!(!manager.create_history("k", 10));
        assert_eq!(manager.get_history_items("k"), [1, 2]);
        assert_eq!(manager.get_current_item("k"), Some(&2));
    }

    #[test]
    fn missing_history() {
        let mut manager = HistoryManager::<String>::new();

        assert_eq!(
            manager.add_to_history("nope", String::from("x")),
            Err(Error::HistoryNotInitialized {
                history: String::from("nope")
            })
        );
        assert!(!manager.go_back("nope"));
        assert!(!manager.go_forward("nope"));
        assert!(!manager.go_to_index("nope", 0));
        assert!(!manager.can_go_back("nope"));
        assert_eq!(manager.get_current_item("nope"), None);
        assert_eq!(manager.get_current_index("nope"), None);
        assert!(manager.get_history_items("nope").is_empty());
        assert_eq!(manager.get_history_length("nope"), 0);
        assert!(manager.is_empty());
    }

    #[test]
    fn go_to_index_bounds() {
        let mut manager = HistoryManager::new();
        manager.create_history("k", 'a');
        manager.add_to_history("k", 'b').unwrap();
        manager.add_to_history("k", 'c').unwrap();

        assert!(manager.go_to_index("k", 0));
        assert_eq!(manager.get_current_item("k"), Some(&'a'));
        assert!(manager.can_go_forward("k"));
        assert!(!manager.go_to_index("k", 3));
        assert_eq!(manager.get_current_index("k"), Some(0));
        assert!(manager.go_to_index("k", 2));
        assert!(!manager.can_go_forward("k"));
    }

    #[test]
    fn histories_are_independent() {
        let mut manager = HistoryManager::new();
        manager.create_history("browser-singleton", "https://example.com");
        manager.create_history("finder-docs", "docs");
        manager.add_to_history("finder-docs", "projects").unwrap();

        assert!(!manager.can_go_back("browser-singleton"));
        assert!(manager.can_go_back("finder-docs"));
        assert_eq!(manager.len(), 2);

        let removed = manager.remove_history("finder-docs").unwrap();
        assert_eq!(removed.items(), ["docs", "projects"]);
        assert!(!manager.contains("finder-docs"));
        assert!(manager.remove_history("finder-docs").is_none());
    }

    #[test]
    fn snapshot_is_sorted() {
        let mut manager = HistoryManager::new();
        manager.create_history("b", 2);
        manager.create_history("a", 1);
        manager.add_to_history("a", 3).unwrap();

        let snapshot = manager.snapshot();
        assert_eq!(
            snapshot,
            [
                vdesk_ipc::History {
                    id: String::from("a"),
                    items: vec![String::from("1"), String::from("3")],
                    current_index: 1,
                },
                vdesk_ipc::History {
                    id: String::from("b"),
                    items: vec![String::from("2")],
                    current_index: 0,
                },
            ]
        );
    }

    #[derive(Debug, Clone, Copy, Arbitrary)]
    enum Op {
        Add(u8),
        Back,
        Forward,
        GoTo(#[proptest(strategy = "0..8usize")] usize),
    }

    proptest! {
        #[test]
        fn random_navigation_stays_in_bounds(ops: Vec<Op>) {
            let mut history = History::new(0u8);
            for op in ops {
                let len = history.len();
                let index = history.current_index();
                match op {
                    Op::Add(item) => {
                        history.push(item);
                        prop_assert_eq!(history.len(), index + 2);
                        prop_assert_eq!(*history.current(), item);
                        prop_assert!(!history.can_go_forward());
                    }
                    Op::Back => {
                        prop_assert_eq!(history.go_back(), index > 0);
                    }
                    Op::Forward => {
                        prop_assert_eq!(history.go_forward(), index + 1 < len);
                    }
                    Op::GoTo(target) => {
                        prop_assert_eq!(history.go_to_index(target), target < len);
                    }
                }
                history.verify_invariants();
            }
        }
    }
}
