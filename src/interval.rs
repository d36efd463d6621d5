//! Interval types used to describe a rule's acceptable values in a single
//! classification dimension.
//!
//! The reference classifier this crate is modeled on encodes an interval as a
//! tagged union of `AnyToAny` / one range / a set of ranges, with the
//! convention that a range's `end == 0` means "unbounded above" and a range's
//! `begin == 0` collapses the interval to `AnyToAny`. We keep both
//! conventions (they are part of the wire contract rule producers rely on)
//! but represent the tag with an enum instead of a C union, which makes an
//! unrecognized discriminator unrepresentable.

use serde::{Deserialize, Serialize};

/// A single half-open range `[begin, end)`. `end == 0` means unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub begin: u32,
    pub end: u32,
}

impl Range {
    pub fn contains(&self, begin: u32, end: u32) -> bool {
        self.begin <= begin && (self.end == 0 || (self.end >= end && end > 0))
    }
}

/// The acceptable values for one rule in one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    /// Matches every value.
    AnyToAny,
    /// A single half-open range.
    Range(Range),
    /// Matches if any range in the set matches.
    RangeSet(Vec<Range>),
}

impl Interval {
    /// An interval matching every value in the dimension.
    pub fn make_anytoany() -> Self {
        Interval::AnyToAny
    }

    /// `[begin, end)`. A `begin` of 0 collapses to [`Interval::AnyToAny`],
    /// matching the convention used by rule producers: 0 is not a legal lower
    /// bound for a real range. `end == 0` means unbounded above.
    pub fn make_range(begin: u32, end: u32) -> Self {
        if begin == 0 {
            Interval::AnyToAny
        } else {
            Interval::Range(Range { begin, end })
        }
    }

    /// A single point, modeled as `[point, point + 1)`.
    pub fn make_point(point: u32) -> Self {
        Self::make_range(point, point.wrapping_add(1))
    }

    /// `[ranges[0]] ∪ [ranges[1]] ∪ ...`
    pub fn make_range_set(ranges: Vec<(u32, u32)>) -> Self {
        Interval::RangeSet(
            ranges
                .into_iter()
                .map(|(begin, end)| Range { begin, end })
                .collect(),
        )
    }

    /// Does this interval contain the sub-range `[begin, end)`? Used during
    /// projection: a rule is carried into a layer's elementary interval iff
    /// its dimension-d interval contains that interval.
    pub fn contains_range(&self, begin: u32, end: u32) -> bool {
        match self {
            Interval::AnyToAny => begin == 0 && end == 0,
            Interval::Range(r) => r.contains(begin, end),
            Interval::RangeSet(set) => set.iter().any(|r| r.contains(begin, end)),
        }
    }

    /// Endpoints to be inserted as RL-tree keys for this interval. `AnyToAny`
    /// contributes no endpoints (§4.2 step 2).
    pub fn endpoints(&self) -> Vec<u32> {
        match self {
            Interval::AnyToAny => Vec::new(),
            Interval::Range(r) => vec![r.begin, r.end],
            Interval::RangeSet(set) => {
                set.iter().flat_map(|r| [r.begin, r.end]).collect()
            }
        }
    }
}
