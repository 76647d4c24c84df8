use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::time::{ClockTime, Day};

// Type aliases for clarity
pub type CourseId = u32;
pub type LecturerId = u32;
pub type RoomId = u32;

/// A course to be split into sessions and scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Course {
    pub id: CourseId,
    #[serde(alias = "nama")]
    pub name: String,
    /// Credit weight; determines the session length (see [`crate::time::credit_minutes`]).
    #[serde(alias = "sks")]
    pub credit_weight: u32,
    #[serde(alias = "dosen_id")]
    pub lecturer_id: LecturerId,
    #[serde(alias = "jumlah_mahasiswa")]
    pub enrollment: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Lecturer {
    pub id: LecturerId,
    #[serde(alias = "nama")]
    pub name: String,
}

/// A physical room with a given capacity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Room {
    pub id: RoomId,
    #[serde(alias = "nama")]
    pub name: String,
    #[serde(alias = "kapasitas")]
    pub capacity: u32,
}

/// The legal envelope on one day within which sessions may start and end.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeSlotWindow {
    #[serde(alias = "hari")]
    pub day: Day,
    #[serde(alias = "jam_mulai")]
    pub start_time: ClockTime,
    #[serde(alias = "jam_selesai")]
    pub end_time: ClockTime,
}

/// The complete input for the scheduling problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Dataset {
    #[serde(alias = "matakuliah")]
    pub courses: Vec<Course>,
    #[serde(alias = "dosen")]
    pub lecturers: Vec<Lecturer>,
    #[serde(alias = "ruangan")]
    pub rooms: Vec<Room>,
    #[serde(alias = "slot_waktu")]
    pub time_windows: Vec<TimeSlotWindow>,
}

pub const UNKNOWN_LECTURER: &str = "Unknown lecturer";

impl Dataset {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading dataset {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("parsing dataset {}", path.display()))
    }

    pub fn lecturer_name(&self, id: LecturerId) -> &str {
        self.lecturers
            .iter()
            .find(|l| l.id == id)
            .map_or(UNKNOWN_LECTURER, |l| l.name.as_str())
    }

    /// Largest room capacity, or 1 when there are no rooms.
    pub fn max_room_capacity(&self) -> u32 {
        self.rooms.iter().map(|r| r.capacity).max().unwrap_or(1)
    }
}

/// A single placed session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ScheduleEntry {
    pub course_id: CourseId,
    pub course: String,
    pub lecturer_id: LecturerId,
    pub lecturer: String,
    pub room_id: RoomId,
    pub room: String,
    pub day: Day,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub attendees: u32,
    /// 1-based ordinal of this session within its course.
    pub session: u32,
}

impl ScheduleEntry {
    /// Ordering used for every returned schedule: day, start, course name.
    pub fn report_key(&self) -> (Day, ClockTime, &str) {
        (self.day, self.start_time, self.course.as_str())
    }
}

/// A session that could not be placed, and why.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FailureRecord {
    pub course: String,
    pub lecturer: String,
    pub session: u32,
    pub attendees: u32,
    pub reason: String,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (session {}, {} students, {}): {}",
            self.course, self.session, self.attendees, self.lecturer, self.reason
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Statistics {
    pub total_slots_attempted: usize,
    pub scheduled_slots: usize,
    /// Number of sessions that could not be placed.
    pub conflicts: usize,
    pub failed_details: Vec<FailureRecord>,
    /// Wall-clock duration of the solve, in seconds.
    pub execution_time: f64,
}

/// The final output of one strategy run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScheduleResult {
    pub schedule: Vec<ScheduleEntry>,
    pub stats: Statistics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_indonesian_dataset_layout() {
        let json = r#"{
            "matakuliah": [
                {"id": 1, "nama": "Algoritma", "sks": 3, "dosen_id": 10, "jumlah_mahasiswa": 40}
            ],
            "dosen": [{"id": 10, "nama": "Budi"}],
            "ruangan": [{"id": 100, "nama": "R.101", "kapasitas": 45}],
            "slot_waktu": [{"hari": "Senin", "jam_mulai": "08:00", "jam_selesai": "12:00"}]
        }"#;
        let data = Dataset::from_json_str(json).unwrap();
        assert_eq!(data.courses[0].credit_weight, 3);
        assert_eq!(data.courses[0].lecturer_id, 10);
        assert_eq!(data.rooms[0].capacity, 45);
        assert_eq!(data.time_windows[0].day, Day::Senin);
        assert_eq!(data.time_windows[0].end_time.minutes(), 720);
    }

    #[test]
    fn reads_the_english_dataset_layout() {
        let json = r#"{
            "courses": [
                {"id": 1, "name": "Databases", "credit_weight": 2, "lecturer_id": 7, "enrollment": 30}
            ],
            "lecturers": [{"id": 7, "name": "Sari"}],
            "rooms": [{"id": 1, "name": "Lab", "capacity": 30}],
            "time_windows": [{"day": "Tuesday", "start_time": "13:00", "end_time": "15:00"}]
        }"#;
        let data = Dataset::from_json_str(json).unwrap();
        assert_eq!(data.courses[0].name, "Databases");
        assert_eq!(data.time_windows[0].day, Day::Selasa);
    }

    #[test]
    fn failure_record_reads_as_one_line() {
        let record = FailureRecord {
            course: "Kalkulus".into(),
            lecturer: "Dewi".into(),
            session: 2,
            attendees: 35,
            reason: "No suitable time slot or room was found.".into(),
        };
        assert_eq!(
            record.to_string(),
            "Kalkulus (session 2, 35 students, Dewi): No suitable time slot or room was found."
        );
    }

    #[test]
    fn day_names_in_a_dataset_ignore_case() {
        let json = r#"{"courses": [], "lecturers": [], "rooms": [],
            "time_windows": [{"day": "monday", "start_time": "08:00", "end_time": "10:00"}]}"#;
        let data = Dataset::from_json_str(json).unwrap();
        assert_eq!(data.time_windows[0].day, Day::Senin);

        let json = json.replace("monday", "Moonday");
        let err = Dataset::from_json_str(&json).unwrap_err();
        assert!(err.to_string().contains("unknown day"), "{err}");
    }

    #[test]
    fn malformed_time_is_a_parse_error() {
        let json = r#"{"courses": [], "lecturers": [], "rooms": [],
            "time_windows": [{"day": "Senin", "start_time": "8am", "end_time": "10:00"}]}"#;
        let err = Dataset::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("8am"), "{err}");
    }

    #[test]
    fn lecturer_lookup_falls_back() {
        let data = Dataset {
            lecturers: vec![Lecturer { id: 1, name: "Ani".into() }],
            ..Dataset::default()
        };
        assert_eq!(data.lecturer_name(1), "Ani");
        assert_eq!(data.lecturer_name(2), UNKNOWN_LECTURER);
        assert_eq!(data.max_room_capacity(), 1);
    }
}
