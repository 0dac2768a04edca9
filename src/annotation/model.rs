/*!
 * Core model types for time-aligned annotations.
 *
 * All times are in seconds. A decoder builds an [`Annotation`] fresh for each
 * conversion, the normalizer adjusts it in place, an encoder consumes it.
 */

/// A time-bounded piece of annotation text.
///
/// `start == end` marks an instant; whether it is rendered as a point is
/// decided by the owning tier's `is_point` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Annotation text, possibly empty
    pub text: String,
}

impl Interval {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Create an empty-text interval, used for synthetic gap fillers
    pub fn empty(start: f64, end: f64) -> Self {
        Self::new(start, end, String::new())
    }

    /// Create a point marker at `time`
    pub fn point(time: f64, text: impl Into<String>) -> Self {
        Self::new(time, time, text)
    }

    /// Length of the interval in seconds
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

/// A named track of intervals in export order
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    /// Display and export name
    pub name: String,

    /// Intervals in document order
    pub intervals: Vec<Interval>,

    /// Whether the tier holds instant markers instead of spans
    pub is_point: bool,
}

impl Tier {
    /// Create an interval tier
    pub fn new(name: impl Into<String>, intervals: Vec<Interval>) -> Self {
        Self {
            name: name.into(),
            intervals,
            is_point: false,
        }
    }

    /// Create a point tier
    pub fn points(name: impl Into<String>, intervals: Vec<Interval>) -> Self {
        Self {
            name: name.into(),
            intervals,
            is_point: true,
        }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Largest interval end, `None` for an empty tier
    pub fn max_end(&self) -> Option<f64> {
        self.intervals.iter().map(|i| i.end).reduce(f64::max)
    }
}

/// A complete annotation: nominal timeline length plus its tiers
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Timeline length in seconds
    pub duration: f64,

    /// Tiers in document order
    pub tiers: Vec<Tier>,
}

impl Annotation {
    pub fn new(duration: f64, tiers: Vec<Tier>) -> Self {
        Self { duration, tiers }
    }

    /// Find a tier by name
    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    /// Total number of intervals across all tiers
    pub fn interval_count(&self) -> usize {
        self.tiers.iter().map(Tier::len).sum()
    }

    /// Largest interval end across all tiers
    pub fn max_end(&self) -> Option<f64> {
        self.tiers.iter().filter_map(Tier::max_end).reduce(f64::max)
    }
}

impl std::fmt::Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tier(s), {} interval(s), {:.3}s",
            self.tiers.len(),
            self.interval_count(),
            self.duration
        )
    }
}
