//! Conversion of semver requirements into solver version ranges.

use pubgrub::Range;
use semver::{Comparator, Op, Version, VersionReq};

/// Convert a semver `VersionReq` to a solver `Range`.
pub fn version_req_to_range(req: &VersionReq) -> Range<Version> {
    let mut range = Range::full();
    for comp in &req.comparators {
        range = range.intersection(&comparator_to_range(comp));
    }
    range
}

fn comparator_to_range(comp: &Comparator) -> Range<Version> {
    let major = comp.major;
    let minor = comp.minor.unwrap_or(0);
    let patch = comp.patch.unwrap_or(0);
    let version = Version::new(major, minor, patch);

    match comp.op {
        Op::Exact => Range::singleton(version),

        Op::Greater => Range::strictly_higher_than(version),

        Op::GreaterEq => Range::higher_than(version),

        Op::Less => Range::strictly_lower_than(version),

        Op::LessEq => {
            let next = Version::new(version.major, version.minor, version.patch + 1);
            Range::strictly_lower_than(next)
        }

        Op::Tilde => {
            // ~1.2.3 admits patch-level changes; a bare ~1 admits minors.
            let upper = if comp.minor.is_some() {
                Version::new(major, minor + 1, 0)
            } else {
                Version::new(major + 1, 0, 0)
            };
            Range::between(version, upper)
        }

        Op::Caret => {
            // ^ keeps the left-most non-zero component fixed.
            let upper = if major > 0 {
                Version::new(major + 1, 0, 0)
            } else if minor > 0 {
                Version::new(0, minor + 1, 0)
            } else {
                Version::new(0, 0, patch + 1)
            };
            Range::between(version, upper)
        }

        Op::Wildcard => {
            if comp.minor.is_some() {
                Range::between(version, Version::new(major, minor + 1, 0))
            } else {
                Range::between(version, Version::new(major + 1, 0, 0))
            }
        }

        _ => Range::full(),
    }
}
