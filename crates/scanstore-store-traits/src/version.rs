use std::cmp::Ordering;

/// A fixed-length, kind-scoped normalized version.
///
/// Comparison is lexicographic on the ten components but only within a
/// single `kind` (e.g. `rpm`, `dpkg`, `semver`, `pep440`); versions of
/// different kinds are incomparable, which is why this type implements
/// `PartialOrd` and not `Ord`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Version {
    pub kind: String,
    pub components: [i32; 10],
}

impl Version {
    pub fn new(kind: impl Into<String>, components: [i32; 10]) -> Self {
        Self {
            kind: kind.into(),
            components,
        }
    }

    pub fn is_empty_kind(&self) -> bool {
        self.kind.is_empty()
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.kind != other.kind {
            return None;
        }
        Some(self.components.cmp(&other.components))
    }
}

/// A half-open interval `[lower, upper)` over same-kind `Version`s. Either
/// bound may be absent, meaning unbounded on that side. The empty range
/// (spec-encoded as `('{}', '{}', '()')`) matches nothing and is
/// constructed via [`Range::empty`].
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Range {
    pub lower: Option<Version>,
    pub upper: Option<Version>,
    empty: bool,
}

impl Range {
    pub fn new(lower: Option<Version>, upper: Option<Version>) -> Self {
        Self {
            lower,
            upper,
            empty: false,
        }
    }

    pub fn empty() -> Self {
        Self {
            lower: None,
            upper: None,
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// `kind` of the bounds in this range, if any bound is present.
    pub fn kind(&self) -> Option<&str> {
        self.lower
            .as_ref()
            .or(self.upper.as_ref())
            .map(|v| v.kind.as_str())
    }

    /// Whether `v` falls in `[lower, upper)`. Returns `false` for the empty
    /// range and for a version of a different kind than the range's bounds.
    pub fn contains(&self, v: &Version) -> bool {
        if self.empty {
            return false;
        }
        if let Some(kind) = self.kind() {
            if kind != v.kind {
                return false;
            }
        }
        let above_lower = match &self.lower {
            Some(lo) => v.components >= lo.components,
            None => true,
        };
        let below_upper = match &self.upper {
            Some(hi) => v.components < hi.components,
            None => true,
        };
        above_lower && below_upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(kind: &str, n: i32) -> Version {
        let mut c = [0; 10];
        c[9] = n;
        Version::new(kind, c)
    }

    #[test]
    fn same_kind_orders_lexicographically() {
        assert!(v("rpm", 1) < v("rpm", 2));
        assert_eq!(v("rpm", 1).partial_cmp(&v("rpm", 1)), Some(Ordering::Equal));
    }

    #[test]
    fn distinct_kinds_do_not_compare() {
        assert_eq!(v("rpm", 1).partial_cmp(&v("dpkg", 1)), None);
    }

    #[test]
    fn half_open_interval_excludes_upper() {
        let r = Range::new(Some(v("rpm", 1)), Some(v("rpm", 5)));
        assert!(!r.contains(&v("rpm", 0)));
        assert!(r.contains(&v("rpm", 1)));
        assert!(r.contains(&v("rpm", 4)));
        assert!(!r.contains(&v("rpm", 5)));
    }

    #[test]
    fn empty_range_matches_nothing() {
        let r = Range::empty();
        assert!(!r.contains(&v("rpm", 0)));
        assert!(r.is_empty());
    }

    #[test]
    fn unbounded_sides_accept_anything_on_that_side() {
        let only_upper = Range::new(None, Some(v("semver", 10)));
        assert!(only_upper.contains(&v("semver", -1000)));
        assert!(!only_upper.contains(&v("semver", 10)));

        let only_lower = Range::new(Some(v("semver", 3)), None);
        assert!(only_lower.contains(&v("semver", 1_000_000)));
        assert!(!only_lower.contains(&v("semver", 2)));
    }

    #[test]
    fn range_of_mismatched_kind_does_not_contain() {
        let r = Range::new(Some(v("rpm", 1)), Some(v("rpm", 5)));
        assert!(!r.contains(&v("dpkg", 2)));
    }
}
