//! Wall-clock primitives: minute-of-day times, weekday ordering and the
//! credit-weight to duration lookup.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::SolveError;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Width of one grid cell in minutes.
pub const TICK_MINUTES: u16 = 15;

/// Minutes since midnight, always in `[0, 1440)`.
///
/// Serialized as a zero-padded 24-hour `"HH:MM"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_minutes(minutes: u16) -> Result<Self, SolveError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(SolveError::InvalidTime(format!(
                "{minutes} minutes is past the end of the day"
            )));
        }
        Ok(Self(minutes))
    }

    pub fn from_hm(hours: u16, minutes: u16) -> Result<Self, SolveError> {
        if hours >= 24 || minutes >= 60 {
            return Err(SolveError::InvalidTime(format!("{hours}:{minutes:02}")));
        }
        Ok(Self(hours * 60 + minutes))
    }

    pub const fn minutes(self) -> u16 {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SolveError::InvalidTime(format!("{s:?} is not an HH:MM time"));
        let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hours: u16 = hours.parse().map_err(|_| invalid())?;
        let minutes: u16 = minutes.parse().map_err(|_| invalid())?;
        Self::from_hm(hours, minutes)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_minutes(self.0))
    }
}

/// `"HH:MM"` for a raw minute-of-day count.
pub fn format_minutes(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Teaching day. Declaration order is the scheduling order (Senin first).
///
/// Serialized by its Indonesian name; parsing also accepts English names,
/// ignoring case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Day {
    Senin,
    Selasa,
    Rabu,
    Kamis,
    Jumat,
    Sabtu,
    Minggu,
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Senin,
        Day::Selasa,
        Day::Rabu,
        Day::Kamis,
        Day::Jumat,
        Day::Sabtu,
        Day::Minggu,
    ];

    /// 1 for Senin through 7 for Minggu.
    pub const fn rank(self) -> u8 {
        self as u8 + 1
    }

    pub const fn name(self) -> &'static str {
        match self {
            Day::Senin => "Senin",
            Day::Selasa => "Selasa",
            Day::Rabu => "Rabu",
            Day::Kamis => "Kamis",
            Day::Jumat => "Jumat",
            Day::Sabtu => "Sabtu",
            Day::Minggu => "Minggu",
        }
    }

    const fn english(self) -> &'static str {
        match self {
            Day::Senin => "Monday",
            Day::Selasa => "Tuesday",
            Day::Rabu => "Wednesday",
            Day::Kamis => "Thursday",
            Day::Jumat => "Friday",
            Day::Sabtu => "Saturday",
            Day::Minggu => "Sunday",
        }
    }
}

impl FromStr for Day {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Day::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s) || d.english().eq_ignore_ascii_case(s))
            .ok_or_else(|| SolveError::UnknownDay(s.to_string()))
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Session length for a course credit weight. Unknown weights map to zero.
pub const fn credit_minutes(credit_weight: u32) -> u16 {
    match credit_weight {
        2 => 90,
        3 => 135,
        _ => 0,
    }
}
