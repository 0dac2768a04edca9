/*!
 * Normalization applied immediately before encoding.
 *
 * Interval-based targets (TextGrid) need every interval tier to cover the
 * whole timeline without holes. Span-based targets (EAF, ANTX) have no notion
 * of point tiers, so points are either stretched into spans or dropped.
 */

use log::debug;

use super::model::{Annotation, Interval, Tier};
use super::timing::fill_ends_backward;

impl Tier {
    /// Insert empty intervals so the tier covers `[0, duration)` contiguously
    pub fn fill_gaps(&mut self, duration: f64) {
        if self.intervals.is_empty() {
            self.intervals.push(Interval::empty(0.0, duration));
            return;
        }

        let mut filled = Vec::with_capacity(self.intervals.len() * 2 + 1);
        let first_start = self.intervals[0].start;
        if first_start > 0.0 {
            filled.push(Interval::empty(0.0, first_start));
        }

        for interval in self.intervals.drain(..) {
            let gap = filled
                .last()
                .filter(|prior: &&Interval| prior.end < interval.start)
                .map(|prior| Interval::empty(prior.end, interval.start));
            if let Some(gap) = gap {
                filled.push(gap);
            }
            filled.push(interval);
        }

        let last_end = filled.last().map(|i| i.end).unwrap_or(0.0);
        if last_end < duration {
            filled.push(Interval::empty(last_end, duration));
        }

        self.intervals = filled;
    }

    /// Turn point markers into spans ending at the next point (or `duration`)
    pub fn extend_points(&mut self, duration: f64) {
        fill_ends_backward(&mut self.intervals, duration);
    }
}

impl Annotation {
    /// Raise the duration so it covers every interval end
    pub fn cover_interval_ends(&mut self) {
        if let Some(max_end) = self.max_end() {
            if max_end > self.duration {
                debug!("Raising duration from {} to {} to cover interval ends", self.duration, max_end);
                self.duration = max_end;
            }
        }
    }

    /// Prepare for an interval-based target: gap-fill every interval tier
    pub fn prepare_for_interval_target(&mut self) {
        self.cover_interval_ends();
        let duration = self.duration;
        for tier in self.tiers.iter_mut().filter(|t| !t.is_point) {
            tier.fill_gaps(duration);
        }
    }

    /// Prepare for a span-based target: extend point tiers or drop them
    pub fn prepare_for_span_target(&mut self, include_point: bool) {
        self.cover_interval_ends();
        let duration = self.duration;

        if include_point {
            for tier in self.tiers.iter_mut().filter(|t| t.is_point) {
                tier.extend_points(duration);
            }
        } else {
            let before = self.tiers.len();
            self.tiers.retain(|t| !t.is_point);
            let dropped = before - self.tiers.len();
            if dropped > 0 {
                debug!("Dropped {} point tier(s) for span-based output", dropped);
            }
        }
    }
}
