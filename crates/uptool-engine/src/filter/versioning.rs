//! Caret/tilde/`>=N` constraint semantics, used by the versioning
//! strategy stage (§4.4 Stage 4).

use crate::models::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintKind {
    Caret,
    Tilde,
    Ge,
}

/// A parsed manifest-declared constraint: one of `^1.2.3`, `~1.2.3`,
/// or `>=1.2.3`.
#[derive(Debug, Clone)]
pub struct Constraint {
    kind: ConstraintKind,
    base: Version,
    raw_base: String,
}

impl Constraint {
    /// Parses a constraint string. Returns `None` for anything that
    /// isn't one of the three recognized forms (e.g. an exact pin
    /// `=1.2.3`, which Stage 4 never widens or bumps-in-place).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix('^') {
            return Some(Self {
                kind: ConstraintKind::Caret,
                base: Version::parse(rest),
                raw_base: rest.to_string(),
            });
        }
        if let Some(rest) = s.strip_prefix('~') {
            return Some(Self {
                kind: ConstraintKind::Tilde,
                base: Version::parse(rest),
                raw_base: rest.to_string(),
            });
        }
        if let Some(rest) = s.strip_prefix(">=") {
            return Some(Self {
                kind: ConstraintKind::Ge,
                base: Version::parse(rest.trim()),
                raw_base: rest.trim().to_string(),
            });
        }
        None
    }

    /// Whether `version` already satisfies this constraint, per §4.4's
    /// caret/tilde/`>=N` semantics.
    pub fn satisfies(&self, version: &Version) -> bool {
        match self.kind {
            ConstraintKind::Ge => version >= &self.base,
            ConstraintKind::Tilde => {
                version.major() == self.base.major()
                    && version.minor() == self.base.minor()
                    && version >= &self.base
            }
            ConstraintKind::Caret => {
                if self.base.major() != 0 {
                    version.major() == self.base.major() && version >= &self.base
                } else {
                    // For 0.x.y constraints, only the patch segment may float.
                    version.major() == 0
                        && version.minor() == self.base.minor()
                        && version >= &self.base
                }
            }
        }
    }

    /// Widens this constraint to admit both `current` and `target`
    /// (§4.4 Stage 4 `widen`). Returns the new constraint string and
    /// whether a manifest rewrite is needed.
    pub fn widen(&self, target: &Version) -> (String, bool) {
        if target.major() > self.base.major() {
            return (format!(">={}", self.raw_base), true);
        }

        if self.satisfies(target) {
            return (self.to_string(), false);
        }

        (format!(">={}", self.raw_base), true)
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.kind {
            ConstraintKind::Caret => "^",
            ConstraintKind::Tilde => "~",
            ConstraintKind::Ge => ">=",
        };
        write!(f, "{prefix}{}", self.raw_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_allows_same_leftmost_nonzero() {
        let c = Constraint::parse("^1.2.3").unwrap();
        assert!(c.satisfies(&Version::parse("1.9.0")));
        assert!(!c.satisfies(&Version::parse("2.0.0")));
    }

    #[test]
    fn caret_zero_major_only_patch_floats() {
        let c = Constraint::parse("^0.2.3").unwrap();
        assert!(c.satisfies(&Version::parse("0.2.9")));
        assert!(!c.satisfies(&Version::parse("0.3.0")));
    }

    #[test]
    fn tilde_fixes_major_and_minor() {
        let c = Constraint::parse("~1.2.3").unwrap();
        assert!(c.satisfies(&Version::parse("1.2.9")));
        assert!(!c.satisfies(&Version::parse("1.3.0")));
    }

    #[test]
    fn widen_switches_to_ge_on_major_bump() {
        let c = Constraint::parse("^1.2.0").unwrap();
        let (new_constraint, rewrite) = c.widen(&Version::parse("2.0.0"));
        assert_eq!(new_constraint, ">=1.2.0");
        assert!(rewrite);
    }

    #[test]
    fn widen_keeps_constraint_when_already_satisfied() {
        let c = Constraint::parse("^1.2.0").unwrap();
        let (new_constraint, rewrite) = c.widen(&Version::parse("1.9.0"));
        assert_eq!(new_constraint, "^1.2.0");
        assert!(!rewrite);
    }
}
