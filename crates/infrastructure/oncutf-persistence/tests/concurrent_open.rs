use camino::Utf8PathBuf;
use oncutf_persistence::{ConnectionOwner, OncutfRedbStore, PersistentStore};
use std::sync::{Arc, Barrier};

#[test]
fn concurrent_hash_writes_do_not_error_database_already_open() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = Utf8PathBuf::from_path_buf(dir.path().join("oncutf_data.db")).unwrap();

    let store = OncutfRedbStore::new(db_path.clone());
    let owner = ConnectionOwner::default();
    store.upsert_path(&owner, "/tmp/seed.txt", "seed.txt", Some(1)).unwrap();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let db_path = Arc::new(db_path);

    std::thread::scope(|s| {
        for i in 0..threads {
            let barrier = barrier.clone();
            let db_path = db_path.clone();
            s.spawn(move || {
                let store = OncutfRedbStore::new((*db_path).clone());
                let owner = ConnectionOwner::new(format!("worker-{i}"));
                let file_path = format!("/tmp/file-{i}.txt");
                barrier.wait();

                store.store_hash(&owner, &file_path, "deadbeef", "CRC32").unwrap();
                let got = store.get_hash(&owner, &file_path, "CRC32").unwrap();
                assert_eq!(got, Some("deadbeef".to_string()));
            });
        }
    });
}
