//! End-to-end scenario exercised through the facade on both backends,
//! including the places where they intentionally diverge.

use daybook_core::{
    open_repository, RepoError, Repository, Status, StoreConfig, Task,
};
use tempfile::TempDir;

/// Mirrors the caller-side tag flow: look the tag up first, create it on
/// NotFound, then attach it.
fn ensure_tag(repo: &dyn Repository, task: &Task, name: &str) {
    let tag = match repo.get_tag(name) {
        Ok(tag) => tag,
        Err(RepoError::NotFound(_)) => repo.create_tag(name).unwrap(),
        Err(err) => panic!("unexpected error looking up tag: {err}"),
    };
    repo.set_task_tag(task, &tag).unwrap();
}

/// The shared part of the scenario: create, list, tag, filter.
fn create_and_tag_report_task(repo: &dyn Repository) -> Task {
    let mut task = Task::new("Write report");
    repo.create_task(&mut task).unwrap();
    assert!(!task.item.id.is_empty());

    let listing = repo.get_tasks().unwrap();
    assert_eq!(listing.items.len(), 1);
    assert_eq!(listing.items[0].item.title, "Write report");
    assert_eq!(listing.items[0].status, Status::Todo);

    ensure_tag(repo, &task, "work");

    let tagged = repo.get_items_with_tag("work").unwrap();
    assert_eq!(tagged.items.len(), 1);
    assert_eq!(tagged.items[0].title(), "Write report");

    // Re-read so the returned record carries the tag.
    repo.get_tasks().unwrap().items.remove(0)
}

#[test]
fn sqlite_keeps_ids_stable_and_tags_outlive_their_items() {
    let dir = TempDir::new().unwrap();
    let repo = open_repository(StoreConfig::Sqlite {
        db_path: dir.path().join("items.db"),
    })
    .unwrap();

    let mut task = create_and_tag_report_task(repo.as_ref());
    let id_before = task.item.id.clone();

    task.item.title = "Write final report".to_string();
    repo.update_task(&task).unwrap();

    let listing = repo.get_tasks().unwrap();
    assert_eq!(listing.items[0].item.id, id_before);
    assert_eq!(listing.items[0].item.title, "Write final report");

    repo.remove_task(&id_before).unwrap();
    assert!(repo.get_tasks().unwrap().items.is_empty());

    // The tag row was never explicitly deleted, so it is still listed.
    let names: Vec<String> = repo
        .get_tags()
        .unwrap()
        .into_iter()
        .map(|tag| tag.name)
        .collect();
    assert_eq!(names, vec!["work"]);
}

#[test]
fn vault_changes_ids_on_rename_and_tags_vanish_with_their_items() {
    let dir = TempDir::new().unwrap();
    let repo = open_repository(StoreConfig::Vault {
        dir: dir.path().to_path_buf(),
    })
    .unwrap();

    let mut task = create_and_tag_report_task(repo.as_ref());
    let id_before = task.item.id.clone();
    assert_eq!(id_before, "write-report.md");

    task.item.title = "Write final report".to_string();
    task.item.created_at = None;
    repo.update_task(&task).unwrap();

    let listing = repo.get_tasks().unwrap();
    assert_eq!(listing.items.len(), 1);
    let new_id = listing.items[0].item.id.clone();
    assert_eq!(new_id, "write-final-report.md");
    assert_ne!(new_id, id_before);

    // The old identity is gone.
    assert!(matches!(
        repo.remove_task(&id_before).unwrap_err(),
        RepoError::NotFound(_)
    ));

    repo.remove_task(&new_id).unwrap();
    assert!(repo.get_tasks().unwrap().items.is_empty());

    // Vault tags exist only while referenced; removing the last holder
    // removed the tag.
    assert!(repo.get_tags().unwrap().is_empty());
    assert!(matches!(
        repo.get_tag("work").unwrap_err(),
        RepoError::NotFound(_)
    ));
}

#[test]
fn both_backends_report_the_same_surface_for_common_operations() {
    let dir = TempDir::new().unwrap();
    let backends: Vec<Box<dyn Repository>> = vec![
        open_repository(StoreConfig::Sqlite {
            db_path: dir.path().join("parity.db"),
        })
        .unwrap(),
        open_repository(StoreConfig::Vault {
            dir: dir.path().join("parity-vault"),
        })
        .unwrap(),
    ];

    for repo in &backends {
        let mut task = Task::new("Shared checks");
        repo.create_task(&mut task).unwrap();

        repo.update_task_status(&task, Status::InProgress).unwrap();
        let listing = repo.get_tasks().unwrap();
        assert_eq!(listing.items[0].status, Status::InProgress);
        assert!(listing.skipped.is_empty());

        // Unknown identities fail the same way everywhere.
        assert!(matches!(
            repo.remove_task("no-such-id.md").unwrap_err(),
            RepoError::NotFound(_)
        ));
        assert!(matches!(
            repo.get_tag("no-such-tag").unwrap_err(),
            RepoError::NotFound(_)
        ));

        repo.remove_task(&task.item.id).unwrap();
        assert!(repo.get_tasks().unwrap().items.is_empty());
    }
}
