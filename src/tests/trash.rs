use insta::assert_snapshot;

use super::*;
use crate::desktop::{ErrorPolicy, NodeActivation};
use crate::error::Error;

#[test]
fn emptying_trash_closes_windows() {
    let mut f = Fixture::new();
    f.run(
        r#"
        open-node "docs"
        open-node "projects"
        open-node "roadmap"
        open-node "pictures"
        navigate "finder-docs" "projects"
        move-to-trash "docs"
        "#,
    );
    assert_eq!(f.desktop.windows().len(), 4);

    let count = f.desktop.empty_trash().unwrap();
    f.desktop.verify_invariants();
    assert_eq!(count, 5);

    assert_snapshot!(f.format_windows(), @"finder-pictures: z=4, location=pictures");
    assert!(!f.desktop.histories().contains("finder-docs"));
    assert!(!f.desktop.histories().contains("finder-projects"));
    assert!(!f.desktop.histories().contains("text-edit-roadmap"));
    assert_snapshot!(f.subtree("trash"), @"trash/");
    assert!(!f.desktop.nodes().contains("roadmap"));
}

#[test]
fn empty_trash_function_node() {
    let mut f = Fixture::new();
    f.run(
        r#"
        move-to-trash "notes"
        move-to-trash "pictures"
        "#,
    );

    let activation = f.desktop.activate_node("empty-trash").unwrap();
    f.desktop.verify_invariants();
    assert_eq!(
        activation,
        NodeActivation::Function {
            function_key: String::from("empty-trash"),
            builtin: true,
        }
    );
    assert_snapshot!(f.subtree("trash"), @"trash/");
    assert!(!f.desktop.nodes().contains("sunset"));
}

#[test]
fn unknown_function_is_left_to_caller() {
    let mut f = Fixture::parse(
        r#"
        filesystem {
            directory "root" {
                function "calc" function="open-calculator"
                directory "trash"
            }
        }
        "#,
    );

    let activation = f.desktop.activate_node("calc").unwrap();
    assert_eq!(
        activation,
        NodeActivation::Function {
            function_key: String::from("open-calculator"),
            builtin: false,
        }
    );
}

#[test]
fn shared_document_window_outlives_one_node() {
    let mut f = Fixture::parse(
        r#"
        application "text-edit" {
            scope "per-document"
        }
        filesystem {
            directory "root" {
                document "copy-a" application="text-edit" document="shared"
                document "copy-b" application="text-edit" document="shared"
                directory "trash"
            }
        }
        "#,
    );
    f.run(
        r#"
        open-node "copy-a"
        open-node "copy-b"
        "#,
    );
    assert_snapshot!(f.format_windows(), @"text-edit-shared: z=2, location=shared");

    f.run(r#"delete-node "copy-a""#);
    assert_eq!(f.desktop.windows().len(), 1);

    f.run(r#"delete-node "copy-b""#);
    assert!(f.desktop.windows().is_empty());
    assert!(f.desktop.histories().is_empty());
}

#[test]
fn download_and_crack_egg() {
    let mut f = Fixture::new();

    f.desktop.activate_node("get-egg").unwrap();
    f.desktop.verify_invariants();
    assert_snapshot!(f.subtree("downloads"), @r"
    downloads/
      get-egg (fn download-egg)
      egg-1 (egg 0)
    ");
    let egg = f.desktop.nodes().get_node("egg-1").unwrap();
    assert_eq!(egg.image(), Some("egg-whole"));

    let mut frames = Vec::new();
    for _ in 0..3 {
        let activation = f.desktop.activate_node("egg-1").unwrap();
        let NodeActivation::EggCycled { image_index } = activation else {
            panic!("expected the egg to cycle, got {activation:?}");
        };
        let image = f.desktop.nodes().get_node("egg-1").unwrap().image();
        frames.push((image_index, image.unwrap().to_owned()));
    }
    assert_eq!(
        frames,
        [
            (1, String::from("egg-cracked")),
            (2, String::from("egg-hatching")),
            (0, String::from("egg-whole")),
        ]
    );

    f.run(
        r#"
        break-egg "egg-1"
        download-egg
        "#,
    );
    assert_eq!(f.desktop.activate_node("egg-1"), Ok(NodeActivation::EggBroken));
    assert_snapshot!(f.subtree("downloads"), @r"
    downloads/
      get-egg (fn download-egg)
      egg-1 (egg 0, broken)
      egg-2 (egg 0)
    ");
}

#[test]
fn egg_ids_skip_existing_nodes() {
    let mut f = Fixture::parse(
        r#"
        filesystem {
            directory "root" {
                directory "downloads" {
                    easter-egg "egg-1"
                    easter-egg "old" broken=true
                }
            }
        }
        "#,
    );

    let id = f.desktop.download_egg().unwrap();
    assert_eq!(id.as_str(), "egg-2");
    assert_eq!(f.desktop.activate_node("old"), Ok(NodeActivation::EggBroken));

    // No frames configured, so there is nothing to cycle through.
    let revision = f.desktop.nodes().revision();
    assert_eq!(f.desktop.activate_node("egg-1"), Ok(NodeActivation::EggUnchanged));
    assert_eq!(f.desktop.nodes().revision(), revision);
    assert_snapshot!(f.subtree("egg-1"), @"egg-1 (egg 0)");
}

#[test]
fn missing_downloads_directory() {
    let mut f = Fixture::parse(
        r#"
        filesystem {
            directory "root" {
                directory "trash"
            }
        }
        "#,
    );

    let res = f.try_run("download-egg");
    assert_eq!(
        res,
        Err(Error::ParentNotFound {
            parent: String::from("downloads")
        })
    );

    f.desktop.set_policy(ErrorPolicy::Lenient);
    f.run("download-egg");
    assert_eq!(f.desktop.nodes().len(), 2);
}

#[test]
fn root_cannot_be_deleted() {
    let mut f = Fixture::new();
    let before = f.desktop.nodes().debug_tree();

    assert_eq!(f.desktop.delete_node("root"), Err(Error::RootNode));
    assert!(matches!(
        f.desktop.delete_node("ghost"),
        Err(Error::NodeNotFound { .. })
    ));
    f.run(
        r#"
        delete-node "root"
        delete-node "ghost"
        "#,
    );

    assert_eq!(f.desktop.nodes().debug_tree(), before);
}

#[test]
fn deleting_directly_skips_the_trash() {
    let mut f = Fixture::new();
    f.run(
        r#"
        open-node "sunset"
        delete-node "pictures"
        "#,
    );

    assert!(f.desktop.windows().is_empty());
    assert_snapshot!(f.subtree("trash"), @"trash/");
    assert!(!f.desktop.nodes().contains("sunset"));
}

#[test]
fn emptying_trash_drops_histories_of_closed_windows() {
    let mut f = Fixture::new();
    f.run(
        r#"
        open-node "roadmap"
        open-node "sunset"
        open-node "pictures"
        close-window "text-edit-roadmap"
        close-window "finder-pictures"
        move-to-trash "docs"
        empty-trash
        "#,
    );

    assert!(!f.desktop.histories().contains("text-edit-roadmap"));
    assert!(f.desktop.histories().contains("finder-pictures"));
    assert!(f.desktop.histories().contains("preview-sunset"));
    assert_eq!(f.desktop.histories().len(), 2);
}
