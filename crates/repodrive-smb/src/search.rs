//! Directory search: wildcard patterns, attribute filters and the cursor the
//! protocol server pages through.

use crate::error::{FileError, FileResult};
use crate::file_info::FileInfo;
use bitflags::bitflags;
use regex::{Regex, RegexBuilder};

bitflags! {
    /// Which kinds of entries a search includes.
    ///
    /// Files are included unless `DIRECTORIES_ONLY` is set; directories only
    /// when `DIRECTORY` is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SearchAttributes: u32 {
        const DIRECTORY = 0x0010;
        const DIRECTORIES_ONLY = 0x0100;
    }
}

impl SearchAttributes {
    /// Every kind of entry.
    pub fn everything() -> Self {
        SearchAttributes::DIRECTORY
    }

    /// Returns true if an entry of the given kind passes the filter.
    pub fn includes(self, is_directory: bool) -> bool {
        if is_directory {
            self.intersects(SearchAttributes::DIRECTORY | SearchAttributes::DIRECTORIES_ONLY)
        } else {
            !self.contains(SearchAttributes::DIRECTORIES_ONLY)
        }
    }
}

/// A compiled search pattern.
///
/// `*` matches any run of characters and `?` exactly one. The DOS forms `<`,
/// `>` and `"` stand for `*`, `?` and a literal dot. Matching ignores case.
///
/// ```
/// use repodrive_smb::WildcardPattern;
///
/// let pattern = WildcardPattern::new("report.*").unwrap();
/// assert!(pattern.is_match("report.txt"));
/// assert!(pattern.is_match("REPORT.PDF"));
/// assert!(!pattern.is_match("summary.txt"));
/// ```
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    pattern: String,
    regex: Regex,
}

impl WildcardPattern {
    /// Compiles `pattern`.
    pub fn new(pattern: &str) -> FileResult<Self> {
        // Windows clients send "*.*" to mean everything, dotted or not
        let effective = if pattern == "*.*" { "*" } else { pattern };

        let mut source = String::with_capacity(effective.len() * 2 + 2);
        source.push('^');
        for c in effective.chars() {
            match c {
                '*' | '<' => source.push_str(".*"),
                '?' | '>' => source.push('.'),
                '"' => source.push_str(r"\."),
                other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        source.push('$');

        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|source| FileError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Returns true if `name` matches the whole pattern.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// The pattern as given.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// Snapshot of search results, consumed front to back.
///
/// Results are computed eagerly when the search starts; later repository
/// changes do not show up. There is no rewind: once exhausted, the cursor
/// stays exhausted.
#[derive(Debug, Clone, Default)]
pub struct SearchCursor {
    entries: Vec<FileInfo>,
    next: usize,
}

impl SearchCursor {
    /// Wraps an ordered result list.
    pub fn new(entries: Vec<FileInfo>) -> Self {
        Self { entries, next: 0 }
    }

    /// A cursor with no results.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index of the next entry to be returned.
    pub fn position(&self) -> usize {
        self.next
    }

    /// Number of entries not yet returned.
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.next
    }

    /// Total number of results.
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Returns true once every entry has been returned.
    pub fn is_exhausted(&self) -> bool {
        self.next >= self.entries.len()
    }
}

impl Iterator for SearchCursor {
    type Item = FileInfo;

    fn next(&mut self) -> Option<FileInfo> {
        let entry = self.entries.get(self.next)?.clone();
        self.next += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SearchCursor {}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    const LITERAL_NAME: &str = "[a-zA-Z0-9 ._+()\\[\\]$^-]{1,24}";

    proptest! {
        #[test]
        fn literal_names_match_themselves(name in LITERAL_NAME) {
            let pattern = WildcardPattern::new(&name).unwrap();
            prop_assert!(pattern.is_match(&name));
            prop_assert!(pattern.is_match(&name.to_ascii_uppercase()));
        }

        #[test]
        fn star_suffix_matches_any_extension(
            stem in LITERAL_NAME,
            tail in "[a-z0-9.]{0,12}",
        ) {
            let pattern = WildcardPattern::new(&format!("{stem}*")).unwrap();
            let name = format!("{stem}{tail}");
            prop_assert!(pattern.is_match(&name));
        }

        #[test]
        fn question_mark_matches_exactly_one(stem in "[a-z]{1,10}", extra in "[a-z]{2,4}") {
            let pattern = WildcardPattern::new(&format!("{stem}?")).unwrap();
            let one = format!("{stem}{}", &extra[..1]);
            let more = format!("{stem}{extra}");
            prop_assert!(pattern.is_match(&one));
            prop_assert!(!pattern.is_match(&more));
            prop_assert!(!pattern.is_match(&stem));
        }
    }
}
