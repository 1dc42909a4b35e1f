use signet_settings::{SettingsStore, SignetSettings};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn load_missing_file_returns_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("signets.json");

    let store = SettingsStore::load(&path).expect("load defaults");
    assert!(store.settings().nav_all_files);
    assert_eq!(store.settings().signet_scope, "region.redish");
    assert!(store.settings().store_dir.is_none());
    assert!(store.settings().navigation().nav_all_files);
}

#[test]
fn save_and_reload_roundtrip() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("nested").join("signets.json");

    let mut store = SettingsStore::new(path.clone(), SignetSettings::default());
    store
        .update(|settings| {
            settings.nav_all_files = false;
            settings.store_dir = Some(PathBuf::from("/srv/signets"));
        })
        .expect("save");

    let reloaded = SettingsStore::load(&path).expect("reload");
    assert!(!reloaded.settings().nav_all_files);
    assert!(!reloaded.settings().navigation().nav_all_files);
    assert_eq!(
        reloaded.settings().resolved_store_dir(),
        PathBuf::from("/srv/signets")
    );
}

#[test]
fn legacy_values_are_sanitized_on_load() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("signets.json");
    fs::write(
        &path,
        r#"{
            "version": 0,
            "nav_all_files": false,
            "signet_scope": "  ",
            "store_dir": ""
        }"#,
    )
    .expect("write legacy settings");

    let store = SettingsStore::load(&path).expect("load legacy file");
    let settings = store.settings();
    assert_eq!(settings.version, 1, "legacy settings should be upgraded");
    assert_eq!(
        settings.signet_scope, "region.redish",
        "blank scope should fall back to default"
    );
    assert!(settings.store_dir.is_none(), "empty store dir means default");
    assert!(!settings.nav_all_files, "explicit values are preserved");
}

#[test]
fn malformed_file_is_reported() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("signets.json");
    fs::write(&path, "{ nav_all_files: ").expect("write");

    let err = SettingsStore::load(&path).expect_err("malformed settings");
    assert!(err.to_string().contains("failed to parse settings"));
}
