//! Acceptable ranges for scalar criteria and the "is this value better" ordering
//! shared by every scalar evaluator and filter.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;

/// Range of acceptable values for a scalar criterion.
///
/// Besides membership, a range defines which of two values is *better*:
/// - bounded below only: larger is better
/// - bounded above only: smaller is better
/// - bounded on both sides: inside beats outside; two outside values rank by
///   distance to the range (closer is better); two inside values rank by
///   distance to the nearest bound (farther is better)
/// - unbounded: larger is better
///
/// NaN is worse than every other value and never acceptable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptableRange {
    lower: Bound<f64>,
    upper: Bound<f64>,
}

impl AcceptableRange {
    pub fn new(lower: Bound<f64>, upper: Bound<f64>) -> Self {
        Self { lower, upper }
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(Bound::Included(min), Bound::Unbounded)
    }

    pub fn greater_than(min: f64) -> Self {
        Self::new(Bound::Excluded(min), Bound::Unbounded)
    }

    pub fn at_most(max: f64) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(max))
    }

    pub fn less_than(max: f64) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(max))
    }

    pub fn closed(min: f64, max: f64) -> Self {
        Self::new(Bound::Included(min), Bound::Included(max))
    }

    pub fn all() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    pub fn lower(&self) -> Bound<f64> {
        self.lower
    }

    pub fn upper(&self) -> Bound<f64> {
        self.upper
    }

    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        let above = match self.lower {
            Bound::Included(lo) => value >= lo,
            Bound::Excluded(lo) => value > lo,
            Bound::Unbounded => true,
        };
        let below = match self.upper {
            Bound::Included(hi) => value <= hi,
            Bound::Excluded(hi) => value < hi,
            Bound::Unbounded => true,
        };
        above && below
    }

    /// True if `value` is strictly better than `other`.
    pub fn is_value_better(&self, value: f64, other: f64) -> bool {
        self.compare(value, other) == Ordering::Greater
    }

    /// Orders values worst first. Suitable for `sort_by`.
    pub fn worst_to_best(&self, a: &f64, b: &f64) -> Ordering {
        self.compare(*a, *b)
    }

    /// Better of the two; `current` wins ties.
    pub fn better_of(&self, current: f64, candidate: f64) -> f64 {
        if self.is_value_better(candidate, current) {
            candidate
        } else {
            current
        }
    }

    /// Worse of the two; `current` wins ties.
    pub fn worse_of(&self, current: f64, candidate: f64) -> f64 {
        if self.is_value_better(current, candidate) {
            candidate
        } else {
            current
        }
    }

    fn compare(&self, a: f64, b: f64) -> Ordering {
        let (tier_a, key_a) = self.score(a);
        let (tier_b, key_b) = self.score(b);
        tier_a.cmp(&tier_b).then_with(|| key_a.total_cmp(&key_b))
    }

    /// Lexicographic goodness key: higher is better.
    fn score(&self, value: f64) -> (i8, f64) {
        if value.is_nan() {
            return (-1, 0.0);
        }
        match (bound_value(self.lower), bound_value(self.upper)) {
            (Some(_), None) | (None, None) => (0, value),
            (None, Some(_)) => (0, -value),
            (Some(lo), Some(hi)) => {
                if self.contains(value) {
                    (1, (value - lo).min(hi - value))
                } else if value <= lo {
                    (0, value - lo)
                } else {
                    (0, hi - value)
                }
            }
        }
    }
}

fn bound_value(bound: Bound<f64>) -> Option<f64> {
    match bound {
        Bound::Included(v) | Bound::Excluded(v) => Some(v),
        Bound::Unbounded => None,
    }
}

impl fmt::Display for AcceptableRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.lower, self.upper) {
            (Bound::Unbounded, Bound::Unbounded) => write!(f, "(-∞, ∞)"),
            (Bound::Included(lo), Bound::Unbounded) => write!(f, "≥{lo}"),
            (Bound::Excluded(lo), Bound::Unbounded) => write!(f, ">{lo}"),
            (Bound::Unbounded, Bound::Included(hi)) => write!(f, "≤{hi}"),
            (Bound::Unbounded, Bound::Excluded(hi)) => write!(f, "<{hi}"),
            (lower, upper) => {
                match lower {
                    Bound::Included(lo) => write!(f, "[{lo}, ")?,
                    Bound::Excluded(lo) => write!(f, "({lo}, ")?,
                    Bound::Unbounded => write!(f, "(-∞, ")?,
                }
                match upper {
                    Bound::Included(hi) => write!(f, "{hi}]"),
                    Bound::Excluded(hi) => write!(f, "{hi})"),
                    Bound::Unbounded => write!(f, "∞)"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_bound_prefers_larger() {
        let r = AcceptableRange::at_least(0.0);
        assert!(r.is_value_better(2.0, 1.0));
        assert!(!r.is_value_better(1.0, 2.0));
        assert!(!r.is_value_better(1.0, 1.0));
        assert!(r.contains(0.0));
        assert!(!r.contains(-0.1));
    }

    #[test]
    fn upper_bound_prefers_smaller() {
        let r = AcceptableRange::at_most(5.0);
        assert!(r.is_value_better(1.0, 4.0));
        assert!(r.contains(5.0));
        assert!(!AcceptableRange::less_than(5.0).contains(5.0));
    }

    #[test]
    fn closed_range_prefers_inside_then_center() {
        let r = AcceptableRange::closed(0.0, 10.0);
        assert!(r.is_value_better(0.5, 11.0));
        assert!(r.is_value_better(5.0, 1.0));
        assert!(r.is_value_better(11.0, 15.0));
        assert!(r.is_value_better(-1.0, -3.0));
    }

    #[test]
    fn nan_is_worst() {
        let r = AcceptableRange::at_least(0.0);
        assert!(r.is_value_better(-1e9, f64::NAN));
        assert!(!r.is_value_better(f64::NAN, -1e9));
        assert!(!r.contains(f64::NAN));
    }

    #[test]
    fn worst_to_best_sort() {
        let r = AcceptableRange::at_least(0.0);
        let mut vals = vec![3.0, -1.0, 2.0, f64::NAN];
        vals.sort_by(|a, b| r.worst_to_best(a, b));
        assert!(vals[0].is_nan());
        assert_eq!(&vals[1..], &[-1.0, 2.0, 3.0]);
    }

    #[test]
    fn ties_keep_current() {
        let r = AcceptableRange::at_least(0.0);
        assert_eq!(r.worse_of(1.0, 1.0).to_bits(), 1.0f64.to_bits());
        assert_eq!(r.better_of(1.0, 3.0), 3.0);
        assert_eq!(r.worse_of(1.0, 3.0), 1.0);
    }

    #[test]
    fn display() {
        assert_eq!(AcceptableRange::at_least(0.5).to_string(), "≥0.5");
        assert_eq!(AcceptableRange::at_most(2.0).to_string(), "≤2");
        assert_eq!(AcceptableRange::closed(1.0, 2.0).to_string(), "[1, 2]");
    }
}
