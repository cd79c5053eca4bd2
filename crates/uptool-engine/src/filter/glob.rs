//! A hand-rolled glob matcher for dependency-name and manifest-path
//! patterns (§2 "Semver/Glob/Cron predicates", §4.2 step 3, §4.4
//! stages 1/2/5).
//!
//! Supports `*` (any run of characters within a path segment), `?`
//! (any single character), and `**` (any number of path segments,
//! including zero), matching standard shell glob semantics where `**`
//! matches path segments rather than characters. No crate in the
//! retrieval pack implements this glob dialect, so — as with the
//! teacher's own hand-rolled version parser — this is hand-written
//! rather than imported.

/// Returns whether `path` matches `pattern`.
///
/// `path` and `pattern` are both split on `/` into segments; `**`
/// consumes zero or more whole segments, while `*` and `?` operate
/// within a single segment.
pub fn matches(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    match_segments(&pattern_segments, &path_segments)
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some(&"**") => {
            if pattern.len() == 1 {
                return true;
            }
            // Try consuming 0, 1, 2, ... path segments for `**`.
            for split in 0..=path.len() {
                if match_segments(&pattern[1..], &path[split..]) {
                    return true;
                }
            }
            false
        }
        Some(seg) => match path.first() {
            Some(path_seg) if match_segment(seg, path_seg) => {
                match_segments(&pattern[1..], &path[1..])
            }
            _ => false,
        },
    }
}

/// Matches a single path segment against a single pattern segment
/// containing `*` and `?` wildcards.
fn match_segment(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    match_chars(&pattern, &text)
}

fn match_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('*') => {
            for split in 0..=text.len() {
                if match_chars(&pattern[1..], &text[split..]) {
                    return true;
                }
            }
            false
        }
        Some('?') => !text.is_empty() && match_chars(&pattern[1..], &text[1..]),
        Some(c) => text.first() == Some(c) && match_chars(&pattern[1..], &text[1..]),
    }
}

/// Returns whether `path` matches at least one pattern in `patterns`.
/// An empty pattern list matches nothing (callers that want "match
/// anything" should special-case an empty list themselves, since the
/// semantics differ between allow-lists, which treat empty as
/// "inapplicable," and grouping, which treats empty patterns as
/// "match any that passed other filters").
pub fn matches_any(patterns: &[String], path: &str) -> bool {
    patterns.iter().any(|p| matches(p, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_match() {
        assert!(matches("package.json", "package.json"));
        assert!(!matches("package.json", "other.json"));
    }

    #[test]
    fn single_star_stays_within_segment() {
        assert!(matches("src/*.rs", "src/lib.rs"));
        assert!(!matches("src/*.rs", "src/sub/lib.rs"));
    }

    #[test]
    fn double_star_spans_segments() {
        assert!(matches("**/Cargo.toml", "Cargo.toml"));
        assert!(matches("**/Cargo.toml", "crates/foo/Cargo.toml"));
        assert!(matches("services/**/package.json", "services/a/b/package.json"));
    }

    #[test]
    fn question_mark_single_char() {
        assert!(matches("v?.txt", "v1.txt"));
        assert!(!matches("v?.txt", "v10.txt"));
    }

    #[test]
    fn purity() {
        assert_eq!(
            matches("**/*.rs", "a/b/c.rs"),
            matches("**/*.rs", "a/b/c.rs")
        );
    }
}
