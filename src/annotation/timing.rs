use super::model::Interval;

// @module: Time resolution shared by formats that only store start times

/// Derive end times from the following interval's start.
///
/// Every interval except the last ends where the next one starts; the last
/// ends at `terminal`. Intervals must already be in chronological order.
pub fn fill_ends_backward(intervals: &mut [Interval], terminal: f64) {
    let count = intervals.len();
    if count == 0 {
        return;
    }

    for i in 0..count - 1 {
        intervals[i].end = intervals[i + 1].start;
    }
    intervals[count - 1].end = terminal;
}
