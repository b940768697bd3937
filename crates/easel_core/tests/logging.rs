use easel_core::{flush_logging, init_logging, migrate_snapshot, Snapshot, UiState};
use std::fs;
use std::path::Path;

fn log_text(dir: &Path) -> String {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
        .map(|path| fs::read_to_string(path).unwrap())
        .collect()
}

#[test]
fn flushed_records_reach_the_log_file_before_exit() {
    let dir = tempfile::tempdir().unwrap();
    init_logging("info", dir.path()).unwrap();

    let (migrated, _) = migrate_snapshot::<UiState>(Snapshot::new());
    assert_eq!(migrated["_version"], 3);
    log::info!("event=cli_start module=cli status=ok");
    flush_logging();

    let text = log_text(dir.path());
    assert!(text.contains("event=logging_start"), "log was: {text}");
    assert!(text.contains("event=slice_migrate"), "log was: {text}");
    assert!(text.contains("event=cli_start"), "log was: {text}");
}
