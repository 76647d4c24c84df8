//! Discretized time grid.
//!
//! Every [`TimeSlotWindow`] is expanded into candidate start points spaced
//! [`TICK_MINUTES`] apart. The resulting sequence is sorted by (day rank,
//! start minute) and is the tie-break order every strategy walks.

use std::ops::Range;

use crate::data::TimeSlotWindow;
use crate::time::{Day, TICK_MINUTES};

/// A legal session start, tagged with the end of the window it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePoint {
    pub day: Day,
    pub start: u16,
    pub window_end: u16,
}

impl TimePoint {
    /// Whether a session of `duration` minutes starting here stays inside the window.
    pub fn fits(&self, duration: u16) -> bool {
        self.start + duration <= self.window_end
    }
}

/// One 15-minute cell `[minute, minute + 15)` on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tick {
    pub day: Day,
    pub minute: u16,
}

#[derive(Debug, Clone, Default)]
pub struct TimeGrid {
    points: Vec<TimePoint>,
    ticks: Vec<Tick>,
}

impl TimeGrid {
    pub fn new(windows: &[TimeSlotWindow]) -> Self {
        let mut points = Vec::new();
        for window in windows {
            let end = window.end_time.minutes();
            let mut start = window.start_time.minutes();
            while start < end {
                points.push(TimePoint {
                    day: window.day,
                    start,
                    window_end: end,
                });
                start += TICK_MINUTES;
            }
        }
        // stable: windows keep their input order on equal (day, start)
        points.sort_by_key(|p| (p.day, p.start));

        let mut ticks: Vec<Tick> = points
            .iter()
            .map(|p| Tick {
                day: p.day,
                minute: p.start,
            })
            .collect();
        ticks.dedup();

        Self { points, ticks }
    }

    /// Candidate start points in scheduling order.
    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    /// Distinct grid cells, sorted by (day, minute).
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    /// Indices into [`ticks`](Self::ticks) of every cell on `day` that
    /// overlaps `[start, end)`. Empty for zero-length intervals.
    pub fn covered_ticks(&self, day: Day, start: u16, end: u16) -> Range<usize> {
        if end <= start {
            return 0..0;
        }
        let lo = self
            .ticks
            .partition_point(|t| (t.day, t.minute + TICK_MINUTES) <= (day, start));
        let hi = self
            .ticks
            .partition_point(|t| t.day < day || (t.day == day && t.minute < end));
        lo..hi.max(lo)
    }
}
