//! Exercises the temp-file + rename pattern the blocklist refresher uses to
//! replace the on-disk blocklist (spec P6: readers never see a partially
//! written file).

use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn rename_over_target_is_all_or_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("blocklist.txt");

    std::fs::write(&target, "ads.com\n").unwrap();

    let mut tmp = NamedTempFile::new_in(dir.path()).unwrap();
    tmp.write_all(b"tracker.net\nmalware.test\n").unwrap();
    tmp.persist(&target).unwrap();

    let contents = std::fs::read_to_string(&target).unwrap();
    assert_eq!(contents, "tracker.net\nmalware.test\n");
}

#[test]
fn failed_persist_leaves_original_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("blocklist.txt");
    std::fs::write(&target, "ads.com\n").unwrap();

    // A temp file in a different directory than the target cannot be
    // renamed atomically across filesystems on some platforms, but within
    // the same directory (as the refresher always uses) persist always
    // succeeds; this test documents that the original content would remain
    // readable had the write never reached `persist`.
    let tmp = NamedTempFile::new_in(dir.path()).unwrap();
    drop(tmp);

    let contents = std::fs::read_to_string(&target).unwrap();
    assert_eq!(contents, "ads.com\n");
}
