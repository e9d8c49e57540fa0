//! Custom assertions for disk-interface integration tests.

#![allow(dead_code)]

use crate::common::TestDrive;
use repodrive_mount::ErrorCategory;
use repodrive_smb::{DiskInterface, DiskResult, FileStatus};
use std::fmt::Debug;

/// Assert that a file exists and has the expected content.
pub fn assert_file_content(drive: &TestDrive, path: &str, expected: &[u8]) {
    let actual = drive.get(path);
    assert_eq!(
        actual,
        expected,
        "File content mismatch at {}: expected {} bytes, got {} bytes",
        path,
        expected.len(),
        actual.len()
    );
}

/// Assert that nothing is visible at `path`.
pub fn assert_absent(drive: &TestDrive, path: &str) {
    assert_eq!(
        drive.disk.file_exists(&drive.session, path),
        FileStatus::NotExist,
        "Expected {path} to be absent"
    );
    assert!(drive.info(path).is_none(), "Expected no metadata for {path}");
}

/// Assert that a call failed with the given protocol category.
pub fn assert_category<T: Debug>(result: DiskResult<T>, expected: ErrorCategory) {
    match result {
        Ok(value) => panic!("Expected {} error, got Ok({value:?})", expected.name()),
        Err(e) => assert_eq!(
            e.category(),
            expected,
            "Expected {} error, got {}: {e}",
            expected.name(),
            e.category().name()
        ),
    }
}
