use std::fs;
use std::path::{Path, PathBuf};

use signet_core::{
    Direction, EditorSnapshot, NavigationConfig, NavigationTier, ProjectId, SignetFileStore,
    SignetManager, ViewId,
};
use tempfile::{tempdir, TempDir};

fn workspace() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().expect("temp dir");
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "alpha\n".repeat(30)).unwrap();
    fs::write(&b, "beta\n".repeat(30)).unwrap();
    (dir, a, b)
}

fn manager(root: &Path) -> SignetManager {
    SignetManager::new(
        SignetFileStore::new(root.join("store")),
        NavigationConfig::default(),
    )
}

#[test]
fn save_then_reload_preserves_every_signet() {
    let (dir, a, b) = workspace();
    let project = ProjectId::new("demo");
    let editor = EditorSnapshot::new();

    let mut first = manager(dir.path());
    first.open_project(&project);
    for row in [19, 9, 4] {
        first.toggle(&project, &a, row);
    }
    first.toggle(&project, &b, 4);
    first.save_project(&project, &editor).unwrap();

    let mut second = manager(dir.path());
    let loaded = second.open_project(&project).clone();
    assert_eq!(Some(&loaded), first.project(&project));
    assert_eq!(loaded.lines(&a), vec![5, 10, 20]);
    assert_eq!(loaded.signet_count(), 4);
}

#[test]
fn emptied_project_removes_its_file() {
    let (dir, a, _) = workspace();
    let project = ProjectId::new("demo");
    let editor = EditorSnapshot::new();
    let mut signets = manager(dir.path());
    signets.open_project(&project);

    signets.toggle(&project, &a, 2);
    signets.save_project(&project, &editor).unwrap();
    assert!(signets.files().exists(&project));

    signets.open_project(&project);
    signets.toggle(&project, &a, 2);
    signets.save_project(&project, &editor).unwrap();
    assert!(!signets.files().exists(&project));
}

#[test]
fn deleted_files_are_pruned_on_close() {
    let (dir, a, b) = workspace();
    let project = ProjectId::new("demo");
    let mut signets = manager(dir.path());
    signets.open_project(&project);
    signets.toggle(&project, &a, 0);
    signets.toggle(&project, &b, 0);
    fs::remove_file(&b).unwrap();

    signets
        .close_project(&project, &EditorSnapshot::new())
        .unwrap();
    let persisted = fs::read_to_string(signets.files().path_for(&project)).unwrap();
    assert!(persisted.contains("a.txt"));
    assert!(!persisted.contains("b.txt"));
}

#[test]
fn close_project_collects_markers_of_seeded_views() {
    let (dir, a, b) = workspace();
    let project = ProjectId::new("demo");
    let mut signets = manager(dir.path());
    signets.open_project(&project);
    signets.toggle(&project, &a, 3);
    signets.toggle(&project, &b, 3);
    signets.view_opened(&project, ViewId::new(1), Some(&a));
    signets.view_opened(&project, ViewId::new(2), Some(&b));

    // Markers in `a` moved down two rows; every marker in `b` was deleted.
    let editor = EditorSnapshot::new()
        .with_marked_tab(&a, vec![5])
        .with_marked_tab(&b, Vec::new());
    signets.close_project(&project, &editor).unwrap();

    let mut reopened = manager(dir.path());
    let loaded = reopened.open_project(&project);
    assert_eq!(loaded.lines(&a), vec![6]);
    assert!(!loaded.contains_file(&b));
}

#[test]
fn navigation_scenario_across_tiers() {
    let (dir, a, b) = workspace();
    let project = ProjectId::new("demo");
    let mut signets = manager(dir.path());
    signets.open_project(&project);
    signets.toggle(&project, &a, 9);
    signets.toggle(&project, &a, 19);
    signets.toggle(&project, &b, 4);

    let both_open = EditorSnapshot::new()
        .with_tab(&a)
        .with_tab(&b)
        .focused(&a, 9);
    let target = signets
        .navigate(&project, Direction::Next, &both_open)
        .unwrap();
    assert_eq!((target.file.clone(), target.line), (a.clone(), 20));
    assert_eq!(target.tier, NavigationTier::SameFile);

    let at_last = both_open.clone().focused(&a, 19);
    let target = signets
        .navigate(&project, Direction::Next, &at_last)
        .unwrap();
    assert_eq!((target.file.clone(), target.line), (b.clone(), 5));
    assert_eq!(target.tier, NavigationTier::OpenTab);

    let only_a = EditorSnapshot::new().with_tab(&a).focused(&a, 19);
    let target = signets
        .navigate(&project, Direction::Next, &only_a)
        .unwrap();
    assert_eq!((target.file.clone(), target.line), (b.clone(), 5));
    assert!(target.needs_open);
    assert_eq!(target.row(), 4);

    let target = signets
        .navigate(&project, Direction::Previous, &at_last)
        .unwrap();
    assert_eq!((target.file.clone(), target.line), (a.clone(), 10));

    signets.clear_project(&project).unwrap();
    assert!(signets
        .navigate(&project, Direction::Next, &both_open)
        .is_none());
}

#[test]
fn picker_snapshot_is_independent_of_later_edits() {
    let (dir, a, b) = workspace();
    let project = ProjectId::new("demo");
    let mut signets = manager(dir.path());
    signets.open_project(&project);
    signets.toggle(&project, &b, 0);
    signets.toggle(&project, &a, 7);

    let list = signets.picker(&project);
    signets.clear_file(&project, &a);

    assert_eq!(list.len(), 2);
    assert_eq!(list.resolve_selection(0).file, a);
    assert_eq!(list.resolve_selection(0).line, 8);
    assert_eq!(signets.picker(&project).len(), 1);
}
