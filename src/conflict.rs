//! Post-hoc double-booking detection over a list of schedule entries.
//!
//! Strategy-agnostic: used as a correctness oracle on finished schedules
//! and to explain why a session could not be added to one.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::data::ScheduleEntry;
use crate::occupancy::Interval;
use crate::time::{ClockTime, Day};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Room,
    Lecturer,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Room => f.write_str("Room conflict"),
            ConflictKind::Lecturer => f.write_str("Lecturer conflict"),
        }
    }
}

/// One side of a conflicting pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Booking {
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub course: String,
    pub session: u32,
}

impl From<&ScheduleEntry> for Booking {
    fn from(entry: &ScheduleEntry) -> Self {
        Self {
            start_time: entry.start_time,
            end_time: entry.end_time,
            course: entry.course.clone(),
            session: entry.session,
        }
    }
}

/// Two entries that share a room (or lecturer) on the same day with
/// overlapping intervals. `first` is never greater than `second`, so the
/// pair is the same whichever order the entries arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub day: Day,
    pub resource_id: u32,
    pub resource: String,
    pub first: Booking,
    pub second: Booking,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            ConflictKind::Room => "ROOM CONFLICT",
            ConflictKind::Lecturer => "LECTURER CONFLICT",
        };
        write!(
            f,
            "[{tag}] {} - {} {}-{} ({}) vs {}-{} ({})",
            self.resource,
            self.day,
            self.first.start_time,
            self.first.end_time,
            self.first.course,
            self.second.start_time,
            self.second.end_time,
            self.second.course
        )
    }
}

/// Every pairwise room and lecturer overlap in `entries`, de-duplicated
/// and sorted.
pub fn detect_conflicts(entries: &[ScheduleEntry]) -> Vec<Conflict> {
    let mut found = BTreeSet::new();

    let by_room = entries
        .iter()
        .map(|e| ((e.day, e.room_id), e))
        .into_group_map();
    for ((day, room_id), group) in by_room {
        collect_overlaps(&group, ConflictKind::Room, day, room_id, |e| &e.room, &mut found);
    }

    let by_lecturer = entries
        .iter()
        .map(|e| ((e.day, e.lecturer_id), e))
        .into_group_map();
    for ((day, lecturer_id), group) in by_lecturer {
        collect_overlaps(
            &group,
            ConflictKind::Lecturer,
            day,
            lecturer_id,
            |e| &e.lecturer,
            &mut found,
        );
    }

    found.into_iter().collect()
}

fn collect_overlaps(
    group: &[&ScheduleEntry],
    kind: ConflictKind,
    day: Day,
    resource_id: u32,
    resource_name: impl Fn(&ScheduleEntry) -> &str,
    found: &mut BTreeSet<Conflict>,
) {
    for (a, b) in group.iter().tuple_combinations() {
        if !interval(a).overlaps(&interval(b)) {
            continue;
        }
        let (first, second) = {
            let (x, y) = (Booking::from(*a), Booking::from(*b));
            if x <= y { (x, y) } else { (y, x) }
        };
        found.insert(Conflict {
            kind,
            day,
            resource_id,
            resource: resource_name(a).to_string(),
            first,
            second,
        });
    }
}

fn interval(entry: &ScheduleEntry) -> Interval {
    Interval::new(entry.start_time.minutes(), entry.end_time.minutes())
}
