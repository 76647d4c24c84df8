//! Per-run record of which rooms and lecturers are already booked.

use std::collections::HashMap;

use crate::conflict::ConflictKind;
use crate::data::{LecturerId, RoomId};
use crate::time::Day;

/// Half-open minute interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    pub start: u16,
    pub end: u16,
}

impl Interval {
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub const fn overlaps(&self, other: &Interval) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Room(RoomId),
    Lecturer(LecturerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub day: Day,
    pub resource: Resource,
}

impl ResourceKey {
    pub const fn room(day: Day, room: RoomId) -> Self {
        Self {
            day,
            resource: Resource::Room(room),
        }
    }

    pub const fn lecturer(day: Day, lecturer: LecturerId) -> Self {
        Self {
            day,
            resource: Resource::Lecturer(lecturer),
        }
    }
}

/// Booked intervals per (day, resource), each list kept sorted by start.
///
/// Owned by a single strategy run and never shared.
#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    booked: HashMap<ResourceKey, Vec<Interval>>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn booked(&self, key: &ResourceKey) -> &[Interval] {
        self.booked.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_free(&self, key: &ResourceKey, interval: Interval) -> bool {
        !self.booked(key).iter().any(|b| b.overlaps(&interval))
    }

    /// First clash for placing a session in `room` taught by `lecturer`.
    /// The room is checked before the lecturer.
    pub fn conflict(
        &self,
        day: Day,
        interval: Interval,
        room: RoomId,
        lecturer: LecturerId,
    ) -> Option<ConflictKind> {
        if !self.is_free(&ResourceKey::room(day, room), interval) {
            return Some(ConflictKind::Room);
        }
        if !self.is_free(&ResourceKey::lecturer(day, lecturer), interval) {
            return Some(ConflictKind::Lecturer);
        }
        None
    }

    pub fn book(&mut self, day: Day, interval: Interval, room: RoomId, lecturer: LecturerId) {
        self.insert(ResourceKey::room(day, room), interval);
        self.insert(ResourceKey::lecturer(day, lecturer), interval);
    }

    fn insert(&mut self, key: ResourceKey, interval: Interval) {
        let list = self.booked.entry(key).or_default();
        let at = list.partition_point(|b| b.start <= interval.start);
        list.insert(at, interval);
    }
}
