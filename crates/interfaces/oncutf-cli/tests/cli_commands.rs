use camino::Utf8PathBuf;
use oncutf_cli::commands;
use oncutf_config::Config;
use oncutf_services::CoreServices;

fn services_over(dir: &std::path::Path) -> CoreServices {
    let mut config = Config::default();
    config.store_path = Utf8PathBuf::from_path_buf(dir.join("oncutf_data.db")).unwrap();
    CoreServices::bootstrap(config).unwrap()
}

fn touch(dir: &std::path::Path, name: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, b"data").unwrap();
    Utf8PathBuf::from_path_buf(path).unwrap().to_string()
}

#[test]
fn preview_runs_without_touching_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let services = services_over(dir.path());
    let file = touch(dir.path(), "vacation.jpg");

    commands::cmd_preview(&services, vec![file.clone()], Some(r#"[{"kind":"text","find":"vacation","replace":"trip"}]"#), None)
        .unwrap();

    assert!(std::path::Path::new(&file).exists());
}

#[test]
fn rename_then_undo_round_trips_the_original_name() {
    let dir = tempfile::tempdir().unwrap();
    let services = services_over(dir.path());
    let file = touch(dir.path(), "vacation.jpg");

    commands::cmd_rename(
        &services,
        vec![file.clone()],
        Some(r#"[{"kind":"text","find":"vacation","replace":"trip"}]"#),
        None,
        false,
        false,
    )
    .unwrap();

    assert!(!std::path::Path::new(&file).exists());
    assert!(dir.path().join("trip.jpg").exists());

    commands::cmd_undo(&services, None, true).unwrap();
    assert!(std::path::Path::new(&file).exists());
    assert!(!dir.path().join("trip.jpg").exists());
}

#[test]
fn dry_run_leaves_files_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let services = services_over(dir.path());
    let file = touch(dir.path(), "vacation.jpg");

    commands::cmd_rename(
        &services,
        vec![file.clone()],
        Some(r#"[{"kind":"text","find":"vacation","replace":"trip"}]"#),
        None,
        true,
        false,
    )
    .unwrap();

    assert!(std::path::Path::new(&file).exists());
}

#[test]
fn snapshot_create_then_list_reports_the_new_backup() {
    let dir = tempfile::tempdir().unwrap();
    let services = services_over(dir.path());
    // Force the store file to exist on disk before snapshotting.
    services.metadata_cache.stats().unwrap();

    commands::cmd_snapshot_create(&services, "test").unwrap();
    commands::cmd_snapshot_list(&services).unwrap();
}
