use rand::Rng;
use time::{Duration, OffsetDateTime};

/// Half-open time range `[start, end)` with `start <= end`.
///
/// Used both for the overall project span and for constrained sub-ranges
/// such as the release window nested at the late end of the main span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl TimeWindow {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self { start, end }
    }

    /// A degenerate window collapses every draw to `start`.
    pub fn is_degenerate(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, ts: OffsetDateTime) -> bool {
        ts >= self.start && ts < self.end
    }

    /// Uniform draw from `[start, end)` at one-second granularity.
    /// A degenerate window pins to `start`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> OffsetDateTime {
        if self.is_degenerate() {
            return self.start;
        }
        // A positive sub-second span rounds down to zero whole seconds and
        // must pin like a degenerate window.
        let span = (self.end - self.start).whole_seconds();
        if span <= 0 {
            return self.start;
        }
        self.start + Duration::seconds(rng.gen_range(0..span))
    }

    /// This window with both edges pulled inward. Collapses to a degenerate
    /// window at `start + from_start` when the margins overlap.
    pub fn shrunk(&self, from_start: Duration, from_end: Duration) -> Self {
        let start = self.start + from_start;
        let end = (self.end - from_end).max(start);
        Self { start, end }
    }
}

/// Uniform draw from the closed range `[lo, hi]`, pinning to `lo` when the
/// range collapses. Merge timestamps use this: their upper bound is inclusive.
pub fn sample_between<R: Rng>(rng: &mut R, lo: OffsetDateTime, hi: OffsetDateTime) -> OffsetDateTime {
    if lo >= hi {
        return lo;
    }
    let span = (hi - lo).whole_seconds();
    lo + Duration::seconds(rng.gen_range(0..=span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::datetime;

    #[test]
    fn sample_stays_inside_half_open_range() {
        let w = TimeWindow::new(
            datetime!(2025-11-02 00:00 UTC),
            datetime!(2025-11-12 00:00 UTC),
        );
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let ts = w.sample(&mut rng);
            assert!(w.contains(ts), "{ts} outside {w:?}");
        }
    }

    #[test]
    fn degenerate_window_pins_to_start() {
        let t = datetime!(2025-11-02 00:00 UTC);
        let w = TimeWindow::new(t, t);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(w.is_degenerate());
        assert_eq!(w.sample(&mut rng), t);
    }

    #[test]
    fn subsecond_window_pins_to_start() {
        let start = datetime!(2025-11-02 00:00 UTC);
        let w = TimeWindow::new(start, start + Duration::milliseconds(500));
        let mut rng = StdRng::seed_from_u64(3);
        assert!(!w.is_degenerate());
        assert_eq!(w.sample(&mut rng), start);
    }

    #[test]
    fn sample_between_is_inclusive_and_pins_on_collapse() {
        let lo = datetime!(2025-11-05 12:00 UTC);
        let hi = datetime!(2025-11-06 12:00 UTC);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let ts = sample_between(&mut rng, lo, hi);
            assert!(ts >= lo && ts <= hi);
        }
        assert_eq!(sample_between(&mut rng, hi, lo), hi);
    }

    #[test]
    fn shrunk_never_inverts() {
        let w = TimeWindow::new(
            datetime!(2025-11-02 00:00 UTC),
            datetime!(2025-11-04 00:00 UTC),
        );
        let s = w.shrunk(Duration::days(5), Duration::days(2));
        assert!(s.start <= s.end);
        assert!(s.is_degenerate());
    }
}
