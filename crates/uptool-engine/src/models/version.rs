//! Parsing, comparison, and predicate matching for dependency versions.
//!
//! Ecosystem version strings are not guaranteed to be strict semver, so
//! parsing here is permissive rather than fallible: any non-numeric or
//! missing segment is treated as `0`, per §4.4's "lexical-numeric tuple
//! comparison where non-numeric tails are treated as 0."

use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Eq)]
pub struct Version {
    raw: String,
    segments: Vec<u64>,
}

impl Version {
    /// Parses a version string. An optional leading `v` is stripped;
    /// each dot-separated segment's leading digits are taken as its
    /// numeric value (`0` if none are present).
    pub fn parse(s: &str) -> Self {
        let trimmed = s.strip_prefix('v').unwrap_or(s);
        let segments = trimmed
            .split('.')
            .map(|seg| {
                let digits: String = seg.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().unwrap_or(0)
            })
            .collect();

        Self {
            raw: s.to_string(),
            segments,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segment(&self, index: usize) -> u64 {
        self.segments.get(index).copied().unwrap_or(0)
    }

    pub fn major(&self) -> u64 {
        self.segment(0)
    }

    pub fn minor(&self) -> u64 {
        self.segment(1)
    }

    pub fn patch(&self) -> u64 {
        self.segment(2)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            match self.segment(i).cmp(&other.segment(i)) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

/// Semver step classification of a version change (§3 `Update.impact`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Impact {
    Major,
    Minor,
    Patch,
}

/// Classifies the step from `current` to `target`.
///
/// Falls back to `Patch` when neither the major nor minor segment
/// changed but the versions differ (e.g. a patch-only bump or a
/// pre-release-only change).
pub fn classify_impact(current: &Version, target: &Version) -> Impact {
    if current.major() != target.major() {
        Impact::Major
    } else if current.minor() != target.minor() {
        Impact::Minor
    } else {
        Impact::Patch
    }
}

/// A comparison operator as used in `IgnoreRule.versions[]` (§4.4 Stage 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
}

/// One entry of `IgnoreRule.versions[]`: an exact match, an `x.x`-style
/// prefix wildcard, or a comparison against a fixed version.
#[derive(Debug, Clone)]
pub enum VersionPredicate {
    Exact(String),
    PrefixWildcard(Vec<u64>),
    Cmp(CmpOp, Version),
}

impl VersionPredicate {
    /// Parses one predicate string. Recognizes a leading `>=`, `<=`,
    /// `>`, `<`, or `=` as a comparison; a trailing `.x` run as a
    /// prefix wildcard (e.g. `4.x`, `4.2.x`); otherwise an exact match.
    pub fn parse(s: &str) -> Self {
        for (prefix, op) in [
            (">=", CmpOp::Ge),
            ("<=", CmpOp::Le),
            (">", CmpOp::Gt),
            ("<", CmpOp::Lt),
            ("=", CmpOp::Eq),
        ] {
            if let Some(rest) = s.strip_prefix(prefix) {
                return VersionPredicate::Cmp(op, Version::parse(rest.trim()));
            }
        }

        if s.ends_with(".x") || s == "x" {
            let prefix: Vec<u64> = s
                .split('.')
                .filter(|seg| *seg != "x")
                .map(|seg| seg.parse().unwrap_or(0))
                .collect();
            return VersionPredicate::PrefixWildcard(prefix);
        }

        VersionPredicate::Exact(s.to_string())
    }

    /// Returns whether `version` satisfies this predicate.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionPredicate::Exact(expected) => {
                version.raw() == expected || &Version::parse(expected) == version
            }
            VersionPredicate::PrefixWildcard(prefix) => prefix
                .iter()
                .enumerate()
                .all(|(i, seg)| version.segment(i) == *seg),
            VersionPredicate::Cmp(op, bound) => match op {
                CmpOp::Ge => version >= bound,
                CmpOp::Le => version <= bound,
                CmpOp::Gt => version > bound,
                CmpOp::Lt => version < bound,
                CmpOp::Eq => version == bound,
            },
        }
    }
}
