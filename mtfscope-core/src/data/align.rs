//! As-of time alignment of a coarser timeframe onto a finer one.
//!
//! For every fine timestamp, pick the most recent coarse row whose timestamp
//! is at or before it (forward fill). Fine rows before the first coarse row
//! have no aligned row.

use chrono::{DateTime, FixedOffset};

/// Index of the aligned coarse row for each fine timestamp.
///
/// Both inputs must be sorted ascending. Runs in a single pass with an
/// advancing cursor into `coarse`, so the cost is linear in the combined
/// length.
pub fn align_as_of(
    fine: &[DateTime<FixedOffset>],
    coarse: &[DateTime<FixedOffset>],
) -> Vec<Option<usize>> {
    let mut aligned = Vec::with_capacity(fine.len());
    let mut cursor = 0;
    let mut current: Option<usize> = None;

    for ts in fine {
        while cursor < coarse.len() && coarse[cursor] <= *ts {
            current = Some(cursor);
            cursor += 1;
        }
        aligned.push(current);
    }

    aligned
}

/// Forward-filled copy of `coarse` rows at each fine timestamp.
pub fn forward_fill<'a, T>(
    fine: &[DateTime<FixedOffset>],
    coarse: &'a [T],
    timestamp: impl Fn(&T) -> DateTime<FixedOffset>,
) -> Vec<Option<&'a T>> {
    let coarse_ts: Vec<DateTime<FixedOffset>> = coarse.iter().map(timestamp).collect();
    align_as_of(fine, &coarse_ts)
        .into_iter()
        .map(|idx| idx.map(|i| &coarse[i]))
        .collect()
}
