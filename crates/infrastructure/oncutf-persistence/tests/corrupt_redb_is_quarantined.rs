use camino::Utf8PathBuf;
use oncutf_persistence::{ConnectionOwner, DbState, OncutfRedbStore, PersistentStore};

#[test]
fn corrupt_store_is_quarantined_and_can_be_recreated() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let db_path = root.join("oncutf_data.db");

    std::fs::write(&db_path, b"definitely-not-a-redb-database").unwrap();
    assert!(db_path.exists());

    let store = OncutfRedbStore::new(db_path.clone());
    assert_eq!(store.validate().unwrap(), DbState::Corrupt);

    assert!(!db_path.exists());
    let quarantines: Vec<_> = std::fs::read_dir(&root)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n.starts_with("oncutf_data.db.corrupt."))
        .collect();
    assert_eq!(quarantines.len(), 1, "expected exactly one quarantine");

    let owner = ConnectionOwner::default();
    let id = store.upsert_path(&owner, "/tmp/a.txt", "a.txt", Some(1)).unwrap();
    assert!(db_path.exists());
    assert_eq!(store.get_path_id(&owner, "/tmp/a.txt").unwrap(), Some(id));
}
