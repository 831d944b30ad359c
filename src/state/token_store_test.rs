use super::*;

// =============================================================
// Helpers
// =============================================================

fn scratch_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("portal-token-test-{}", Uuid::new_v4()))
        .join("token")
}

fn token(raw: &str) -> SessionToken {
    SessionToken::new(raw).unwrap()
}

// =============================================================
// FileTokenStore
// =============================================================

#[test]
fn file_store_missing_file_loads_none() {
    let store = FileTokenStore::new(scratch_path());
    assert!(store.load().unwrap().is_none());
}

#[test]
fn file_store_save_then_load() {
    let path = scratch_path();
    let store = FileTokenStore::new(&path);
    store.save(&token("abc123")).unwrap();

    assert_eq!(store.load().unwrap(), Some(token("abc123")));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc123");

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_store_last_write_wins() {
    let path = scratch_path();
    let store = FileTokenStore::new(&path);
    store.save(&token("first")).unwrap();
    store.save(&token("second")).unwrap();

    assert_eq!(store.load().unwrap(), Some(token("second")));
    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_store_blank_file_loads_none() {
    let path = scratch_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "  \n").unwrap();

    let store = FileTokenStore::new(&path);
    assert!(store.load().unwrap().is_none());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_store_clear_is_idempotent() {
    let path = scratch_path();
    let store = FileTokenStore::new(&path);
    store.save(&token("abc123")).unwrap();

    store.clear().unwrap();
    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
    assert!(!path.exists());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_store_directory_path_is_io_error() {
    let dir = std::env::temp_dir().join(format!("portal-token-dir-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();

    let store = FileTokenStore::new(&dir);
    let err = store.load().unwrap_err();
    assert!(matches!(err, StoreError::Io { .. }));

    let _ = std::fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn file_store_restricts_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let path = scratch_path();
    let store = FileTokenStore::new(&path);
    store.save(&token("abc123")).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

// =============================================================
// MemoryTokenStore
// =============================================================

#[test]
fn memory_store_round_trip() {
    let store = MemoryTokenStore::new();
    assert!(store.load().unwrap().is_none());

    store.save(&token("abc123")).unwrap();
    assert_eq!(store.load().unwrap(), Some(token("abc123")));

    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
}

#[test]
fn memory_store_with_token_preloads() {
    let store = MemoryTokenStore::with_token(token("seed"));
    assert_eq!(store.load().unwrap(), Some(token("seed")));
}
