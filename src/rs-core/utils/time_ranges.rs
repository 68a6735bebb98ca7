/// Represent a range of time, from a start to an end, generally in seconds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeRange {
    start: f64,
    end: f64,
}

impl TimeRange {
    pub(crate) fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Returns the start time of the range
    pub(crate) fn start(&self) -> f64 {
        self.start
    }

    /// Returns the end time of the range
    pub(crate) fn end(&self) -> f64 {
        self.end
    }

    /// Returns the amount of time covered by that range.
    pub(crate) fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Abstracts non-contiguous chronological ranges of time, generally expressed in seconds.
///
/// This is the Rust-side view of a JavaScript `TimeRanges` object, such as the `buffered`
/// attribute of a `SourceBuffer`.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TimeRanges {
    ranges: Vec<TimeRange>,
}

impl TimeRanges {
    /// Create a new empty `TimeRanges` object
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Build a `TimeRanges` object from a flat list of start and end couples, in the form
    /// `[start0, end0, start1, end1...]`, which is how JavaScript communicates them.
    ///
    /// A trailing lone value is ignored.
    pub(crate) fn from_flat(flat: &[f64]) -> Self {
        let ranges = flat
            .chunks_exact(2)
            .map(|pair| TimeRange::new(pair[0], pair[1]))
            .collect();
        Self { ranges }
    }

    /// Returns the number of non-contiguous ranges in this `TimeRanges` object
    pub(crate) fn len(&self) -> usize {
        self.ranges.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns the chronologically first range, `None` if there's no range.
    pub(crate) fn first(&self) -> Option<&TimeRange> {
        self.ranges.first()
    }

    /// Returns the chronologically last range, `None` if there's no range.
    pub(crate) fn last(&self) -> Option<&TimeRange> {
        self.ranges.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat() {
        let ranges = TimeRanges::from_flat(&[0., 4., 6., 10.]);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges.first(), Some(&TimeRange::new(0., 4.)));
        assert_eq!(ranges.last(), Some(&TimeRange::new(6., 10.)));

        let ranges = TimeRanges::from_flat(&[1., 2., 3.]);
        assert_eq!(ranges.len(), 1);

        assert!(TimeRanges::from_flat(&[]).is_empty());
    }
}
