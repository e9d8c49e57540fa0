//! Protocol path to repository path translation.
//!
//! SMB clients send backslash-separated paths relative to the share; the
//! repository addresses resources with absolute forward-slash paths. Every
//! path received from the protocol server passes through [`translate_path`]
//! before it reaches the repository.
//!
//! Each segment is run through [`translate_name`], which rewrites characters
//! a Windows client cannot address. Wildcard characters survive translation
//! so search patterns arrive intact.
//!
//! # Example
//!
//! ```
//! use repodrive_mount::path_mapper::{split_path, translate_path};
//!
//! let path = translate_path(r"\docs\\reports\q3:draft.txt");
//! assert_eq!(path, "/docs/reports/q3_draft.txt");
//!
//! assert_eq!(split_path(&path), ("/docs/reports", "q3_draft.txt"));
//! ```

/// Separator used by repository paths.
pub const SEPARATOR: char = '/';

/// Characters treated as wildcards in search patterns.
///
/// `<`, `>` and `"` are the DOS forms of `*`, `?` and `.` that Windows
/// clients send for 8.3-compatible matching.
pub const WILDCARDS: [char; 5] = ['*', '?', '<', '>', '"'];

/// Pattern matching every entry of a directory.
pub const MATCH_ALL: &str = "*";

/// Translates a protocol path into an absolute repository path.
///
/// Splits on both slash styles, drops empty segments, translates each
/// segment and rejoins with `/`. The empty path and any path made only of
/// separators map to the root `/`.
pub fn translate_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 1);
    for segment in raw.split(['\\', '/']) {
        let name = translate_name(segment);
        if name.is_empty() {
            continue;
        }
        out.push(SEPARATOR);
        out.push_str(&name);
    }
    if out.is_empty() {
        out.push(SEPARATOR);
    }
    out
}

/// Translates a single path segment.
///
/// Control characters, `:` and `|` become `_`. Trailing dots and spaces are
/// stripped, which also turns `.` and `..` into empty segments.
pub fn translate_name(segment: &str) -> String {
    let mapped: String = segment
        .chars()
        .map(|c| {
            if c.is_control() || c == ':' || c == '|' {
                '_'
            } else {
                c
            }
        })
        .collect();
    mapped.trim_end_matches(['.', ' ']).to_string()
}

/// Returns true if the raw protocol path names a directory listing, i.e. ends
/// with a separator.
pub fn ends_with_separator(raw: &str) -> bool {
    raw.ends_with(['\\', '/'])
}

/// Splits a translated path into its parent path and final segment.
///
/// The parent of a top-level entry is `/`; the root splits into `("/", "")`.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind(SEPARATOR) {
        Some(0) => ("/", &path[1..]),
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("/", path),
    }
}

/// Joins a parent path and a child name.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with(SEPARATOR) {
        format!("{parent}{name}")
    } else {
        format!("{parent}{SEPARATOR}{name}")
    }
}

/// Returns true if `pattern` contains any wildcard character.
pub fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(WILDCARDS)
}
