//! Plausibility verdicts and their AND/OR algebra.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of testing a rupture (or one nucleation point of it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlausibilityResult {
    Pass,
    /// Fails as built, but a larger rupture containing this one might still pass.
    FailFuturePossible,
    /// Fails, and so will every rupture that contains this one.
    FailHardStop,
}

impl PlausibilityResult {
    pub fn is_pass(self) -> bool {
        self == PlausibilityResult::Pass
    }

    /// Whether a rupture built on top of this one could still pass.
    pub fn can_continue(self) -> bool {
        self != PlausibilityResult::FailHardStop
    }

    /// `Pass` is the identity; two failures combine to the more restrictive one.
    pub fn and(self, other: PlausibilityResult) -> PlausibilityResult {
        use PlausibilityResult::*;
        match (self, other) {
            (Pass, r) | (r, Pass) => r,
            (FailHardStop, _) | (_, FailHardStop) => FailHardStop,
            _ => FailFuturePossible,
        }
    }

    /// `Pass` absorbs; two failures combine to the less restrictive one.
    pub fn or(self, other: PlausibilityResult) -> PlausibilityResult {
        use PlausibilityResult::*;
        match (self, other) {
            (Pass, _) | (_, Pass) => Pass,
            (FailFuturePossible, _) | (_, FailFuturePossible) => FailFuturePossible,
            _ => FailHardStop,
        }
    }
}

impl fmt::Display for PlausibilityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlausibilityResult::Pass => "PASS",
            PlausibilityResult::FailFuturePossible => "FAIL_FUTURE_POSSIBLE",
            PlausibilityResult::FailHardStop => "FAIL_HARD_STOP",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::PlausibilityResult::*;
    use super::*;

    const ALL: [PlausibilityResult; 3] = [Pass, FailFuturePossible, FailHardStop];

    #[test]
    fn pass_is_and_identity() {
        for r in ALL {
            assert_eq!(Pass.and(r), r);
            assert_eq!(r.and(Pass), r);
        }
    }

    #[test]
    fn pass_absorbs_or() {
        for r in ALL {
            assert_eq!(Pass.or(r), Pass);
            assert_eq!(r.or(Pass), Pass);
        }
    }

    #[test]
    fn failures_combine_by_severity() {
        assert_eq!(FailFuturePossible.and(FailHardStop), FailHardStop);
        assert_eq!(FailHardStop.and(FailFuturePossible), FailHardStop);
        assert_eq!(FailFuturePossible.or(FailHardStop), FailFuturePossible);
        assert_eq!(FailHardStop.or(FailHardStop), FailHardStop);
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&FailHardStop).unwrap();
        assert_eq!(json, "\"FAIL_HARD_STOP\"");
        let back: PlausibilityResult = serde_json::from_str("\"FAIL_FUTURE_POSSIBLE\"").unwrap();
        assert_eq!(back, FailFuturePossible);
    }

    #[test]
    fn continuation() {
        assert!(Pass.can_continue());
        assert!(FailFuturePossible.can_continue());
        assert!(!FailHardStop.can_continue());
    }
}
