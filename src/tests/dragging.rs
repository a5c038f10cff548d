use insta::assert_snapshot;

use super::*;
use crate::desktop::NodeActivation;
use crate::window::{Activation, WindowId};

#[test]
fn drop_moves_node() {
    let mut f = Fixture::new();

    assert!(f.desktop.drag_over("resume", "pictures"));
    assert_eq!(f.desktop.drop_node("resume", "pictures"), Ok(true));
    f.desktop.verify_invariants();

    assert_snapshot!(f.subtree("pictures"), @r"
    pictures/
      sunset (doc preview:sunset)
      resume (doc text-edit:resume)
    ");
    assert_snapshot!(f.subtree("docs"), @r"
    docs/
      notes (doc text-edit:notes)
      projects/
        roadmap (doc text-edit:roadmap)
    ");
}

#[test]
fn drop_on_current_parent_changes_nothing() {
    let mut f = Fixture::new();
    let before = f.desktop.nodes().debug_tree();
    let revision = f.desktop.nodes().revision();

    assert!(!f.desktop.drag_over("resume", "docs"));
    f.run(r#"move-node "resume" "docs""#);

    assert_eq!(f.desktop.nodes().debug_tree(), before);
    assert_eq!(f.desktop.nodes().revision(), revision);
}

#[test]
fn trash_child_onto_trash() {
    let mut f = Fixture::new();
    f.run(r#"move-to-trash "notes""#);
    assert_snapshot!(f.subtree("trash"), @r"
    trash/
      notes (doc text-edit:notes)
    ");

    let before = f.desktop.nodes().debug_tree();
    assert!(!f.desktop.drag_over("notes", "trash"));
    assert!(!f.desktop.drag_over("trash", "trash"));
    assert_eq!(f.desktop.drop_node("notes", "trash"), Ok(false));
    assert_eq!(f.desktop.drop_node("trash", "trash"), Ok(false));
    assert_eq!(f.desktop.nodes().debug_tree(), before);
}

#[test]
fn directory_into_its_own_subtree() {
    let mut f = Fixture::new();
    let before = f.desktop.nodes().debug_tree();

    assert!(!f.desktop.drag_over("docs", "projects"));
    assert!(!f.desktop.drag_over("root", "trash"));
    f.run(
        r#"
        move-node "docs" "projects"
        move-node "root" "trash"
        move-to-trash "root"
        "#,
    );

    assert_eq!(f.desktop.nodes().debug_tree(), before);
}

#[test]
fn only_directories_accept_drops() {
    let mut f = Fixture::new();

    assert!(!f.desktop.drag_over("notes", "resume"));
    assert!(!f.desktop.drag_over("docs", "portfolio"));
    assert!(!f.desktop.drag_over("ghost", "docs"));
    assert!(!f.desktop.drag_over("docs", "ghost"));
    assert_eq!(f.desktop.drop_node("notes", "resume"), Ok(false));
    assert_eq!(f.desktop.drop_node("ghost", "docs"), Ok(false));
}

#[test]
fn stale_hint_is_revalidated_on_drop() {
    let mut f = Fixture::new();

    assert!(f.desktop.drag_over("docs", "pictures"));
    f.run(r#"move-node "pictures" "docs""#);

    assert_eq!(f.desktop.drop_node("docs", "pictures"), Ok(false));
    assert!(!f.desktop.drag_over("docs", "pictures"));
    assert_snapshot!(f.subtree("docs"), @r"
    docs/
      resume (doc text-edit:resume)
      notes (doc text-edit:notes)
      projects/
        roadmap (doc text-edit:roadmap)
      pictures/
        sunset (doc preview:sunset)
    ");
}

#[test]
fn open_window_follows_moved_directory() {
    let mut f = Fixture::new();
    f.run(
        r#"
        open-node "projects"
        move-node "projects" "pictures"
        "#,
    );

    let activation = f.desktop.activate_node("projects").unwrap();
    assert_eq!(
        activation,
        NodeActivation::Window {
            window: WindowId::from("finder-projects"),
            activation: Activation::Focused,
        }
    );
    assert_eq!(
        f.desktop.nodes().path("roadmap").unwrap(),
        ["root", "pictures", "projects", "roadmap"].map(crate::node::NodeId::from)
    );
}

#[test]
fn create_and_rename_directories() {
    let mut f = Fixture::new();
    f.run(
        r#"
        create-directory "archive" "docs" label="Archive"
        move-node "notes" "archive"
        rename-node "archive" "Old Stuff"
        "#,
    );

    let archive = f.desktop.nodes().get_node("archive").unwrap();
    assert_eq!(archive.label(), "Old Stuff");
    assert_snapshot!(f.subtree("docs"), @r"
    docs/
      resume (doc text-edit:resume)
      projects/
        roadmap (doc text-edit:roadmap)
      archive/
        notes (doc text-edit:notes)
    ");

    let res = f.try_run(r#"create-directory "archive" "pictures""#);
    assert!(matches!(res, Err(crate::Error::DuplicateId { .. })));
    let res = f.try_run(r#"create-directory "inner" "resume""#);
    assert!(matches!(res, Err(crate::Error::ParentNotFound { .. })));
}
