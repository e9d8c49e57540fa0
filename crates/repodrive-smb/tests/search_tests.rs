//! Directory search tests for the repository disk interface.
//!
//! Covers wildcard matching (including the DOS forms), attribute filtering,
//! exact-name lookups and cursor behaviour.

mod common;

use common::{README, TestDrive, assert_category};
use repodrive_mount::ErrorCategory;
use repodrive_smb::{DIRECTORY_LENGTH, DiskInterface, OpenParams, SearchAttributes};

const ALL: [&str; 6] = [
    "archive",
    "empty.bin",
    "notes.md",
    "readme.txt",
    "report.pdf",
    "report.txt",
];

// ============================================================================
// Listing Tests
// ============================================================================

#[test]
fn test_star_lists_everything() {
    let drive = TestDrive::new();
    assert_eq!(
        drive.search_names(r"\docs\*", SearchAttributes::everything()),
        ALL
    );
}

#[test]
fn test_trailing_separator_lists_directory() {
    let drive = TestDrive::new();
    assert_eq!(
        drive.search_names(r"\docs\", SearchAttributes::everything()),
        ALL
    );
    assert_eq!(
        drive.search_names("/docs/", SearchAttributes::everything()),
        ALL
    );
}

#[test]
fn test_root_listing() {
    let drive = TestDrive::new();
    assert_eq!(
        drive.search_names("\\", SearchAttributes::everything()),
        ["docs"]
    );
    assert_eq!(
        drive.search_names(r"\*", SearchAttributes::everything()),
        ["docs"]
    );
}

#[test]
fn test_star_dot_star_matches_names_without_dot() {
    let drive = TestDrive::new();
    assert_eq!(
        drive.search_names(r"\docs\*.*", SearchAttributes::everything()),
        ALL
    );
}

// ============================================================================
// Wildcard Tests
// ============================================================================

#[test]
fn test_extension_wildcard() {
    let drive = TestDrive::new();
    assert_eq!(
        drive.search_names(r"\docs\report.*", SearchAttributes::everything()),
        ["report.pdf", "report.txt"]
    );
    assert_eq!(
        drive.search_names(r"\docs\*.pdf", SearchAttributes::everything()),
        ["report.pdf"]
    );
}

#[test]
fn test_question_mark_matches_one_character() {
    let drive = TestDrive::new();
    assert_eq!(
        drive.search_names(r"\docs\report.?df", SearchAttributes::everything()),
        ["report.pdf"]
    );
    assert!(
        drive
            .search_names(r"\docs\report.?", SearchAttributes::everything())
            .is_empty()
    );
}

#[test]
fn test_matching_ignores_case() {
    let drive = TestDrive::new();
    assert_eq!(
        drive.search_names(r"\docs\REPORT.*", SearchAttributes::everything()),
        ["report.pdf", "report.txt"]
    );
}

#[test]
fn test_dos_wildcards() {
    let drive = TestDrive::new();
    assert_eq!(
        drive.search_names(r#"\docs\report"pdf"#, SearchAttributes::everything()),
        ["report.pdf"]
    );
    assert_eq!(
        drive.search_names(r"\docs\<.md", SearchAttributes::everything()),
        ["notes.md"]
    );
    assert_eq!(
        drive.search_names(r"\docs\notes.m>", SearchAttributes::everything()),
        ["notes.md"]
    );
}

#[test]
fn test_regex_metacharacters_are_literal() {
    let drive = TestDrive::new();
    drive.put(r"\docs\a+b (1).txt", b"x");

    assert_eq!(
        drive.search_names(r"\docs\a+b (?).*", SearchAttributes::everything()),
        ["a+b (1).txt"]
    );
    assert_eq!(
        drive.search_names(r"\docs\a+b*", SearchAttributes::everything()),
        ["a+b (1).txt"]
    );
}

// ============================================================================
// Attribute Filter Tests
// ============================================================================

#[test]
fn test_directories_excluded_without_directory_attribute() {
    let drive = TestDrive::new();
    assert_eq!(
        drive.search_names(r"\docs\*", SearchAttributes::empty()),
        &ALL[1..]
    );
}

#[test]
fn test_directories_only() {
    let drive = TestDrive::new();
    assert_eq!(
        drive.search_names(r"\docs\*", SearchAttributes::DIRECTORIES_ONLY),
        ["archive"]
    );
}

// ============================================================================
// Exact Lookup Tests
// ============================================================================

#[test]
fn test_exact_name_lookup() {
    let drive = TestDrive::new();

    let cursor = drive
        .disk
        .start_search(
            &drive.session,
            r"\docs\readme.txt",
            SearchAttributes::everything(),
        )
        .unwrap();
    let entries: Vec<_> = cursor.collect();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "readme.txt");
    assert_eq!(entries[0].size, README.len() as u64);
}

#[test]
fn test_exact_directory_lookup_returns_the_directory() {
    let drive = TestDrive::new();
    assert_eq!(
        drive.search_names(r"\docs\archive", SearchAttributes::everything()),
        ["archive"]
    );
}

#[test]
fn test_exact_lookup_of_missing_name_is_empty() {
    let drive = TestDrive::new();
    assert!(
        drive
            .search_names(r"\docs\missing.txt", SearchAttributes::everything())
            .is_empty()
    );
    assert!(
        drive
            .search_names(r"\nowhere\missing.txt", SearchAttributes::everything())
            .is_empty()
    );
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_wildcard_in_missing_directory_is_not_found() {
    let drive = TestDrive::new();
    assert_category(
        drive
            .disk
            .start_search(&drive.session, r"\nowhere\*", SearchAttributes::everything()),
        ErrorCategory::NotFound,
    );
}

#[test]
fn test_wildcard_below_a_file_is_denied() {
    let drive = TestDrive::new();
    assert_category(
        drive.disk.start_search(
            &drive.session,
            r"\docs\readme.txt\*",
            SearchAttributes::everything(),
        ),
        ErrorCategory::AccessDenied,
    );
}

// ============================================================================
// Cursor Tests
// ============================================================================

#[test]
fn test_cursor_pages_through_results() {
    let drive = TestDrive::new();
    let mut cursor = drive
        .disk
        .start_search(&drive.session, r"\docs\report.*", SearchAttributes::everything())
        .unwrap();

    assert_eq!(cursor.total(), 2);
    assert_eq!(cursor.len(), 2);
    assert_eq!(cursor.next().map(|e| e.name), Some("report.pdf".to_string()));
    assert_eq!(cursor.position(), 1);
    assert_eq!(cursor.remaining(), 1);
    assert_eq!(cursor.next().map(|e| e.name), Some("report.txt".to_string()));
    assert!(cursor.is_exhausted());
    assert!(cursor.next().is_none());
    assert!(cursor.next().is_none());
}

#[test]
fn test_cursor_is_a_snapshot() {
    let drive = TestDrive::new();
    let cursor = drive
        .disk
        .start_search(&drive.session, r"\docs\*", SearchAttributes::everything())
        .unwrap();

    drive
        .disk
        .delete_file(&drive.session, r"\docs\readme.txt")
        .unwrap();
    drive.put(r"\docs\late.txt", b"late");

    let names: Vec<_> = cursor.map(|e| e.name).collect();
    assert_eq!(names, ALL);
}

#[test]
fn test_entry_metadata() {
    let drive = TestDrive::new();
    let entries: Vec<_> = drive
        .disk
        .start_search(&drive.session, r"\docs\*", SearchAttributes::everything())
        .unwrap()
        .collect();

    let archive = entries.iter().find(|e| e.name == "archive").unwrap();
    assert!(archive.is_directory());
    assert_eq!(archive.size, DIRECTORY_LENGTH);

    let readme = entries.iter().find(|e| e.name == "readme.txt").unwrap();
    assert!(!readme.is_directory());
    assert!(!readme.is_read_only());
    assert_eq!(readme.size, README.len() as u64);

    let direct = drive
        .disk
        .open_file(&drive.session, &OpenParams::new(r"\docs\readme.txt"))
        .unwrap()
        .metadata()
        .unwrap();
    assert_eq!(readme.file_id, direct.file_id);
}
