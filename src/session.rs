use std::fmt;

use crate::data::{Course, CourseId, LecturerId};
use crate::time::credit_minutes;

/// Identifies one session: the course it belongs to and its 1-based ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId {
    pub course: CourseId,
    pub ordinal: u32,
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.course, self.ordinal)
    }
}

/// One concrete meeting of a course, sized to fit the largest room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    /// Position of the owning course in the input list.
    pub course_index: usize,
    pub lecturer_id: LecturerId,
    pub duration: u16,
    pub seats: u32,
}

/// How many sessions a course needs and how many seats each one takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPlan {
    pub count: u32,
    pub seats: u32,
}

impl SessionPlan {
    pub fn for_enrollment(enrollment: u32, max_room_capacity: u32) -> Self {
        let max_room_capacity = max_room_capacity.max(1);
        let count = if enrollment > 0 {
            enrollment.div_ceil(max_room_capacity)
        } else {
            0
        };
        let seats = if count > 0 {
            enrollment.div_ceil(count)
        } else {
            enrollment
        };
        Self { count, seats }
    }
}

/// Expands one course into its sessions, numbered from 1.
pub fn course_sessions(course: &Course, course_index: usize, max_room_capacity: u32) -> Vec<Session> {
    let plan = SessionPlan::for_enrollment(course.enrollment, max_room_capacity);
    let duration = credit_minutes(course.credit_weight);
    (1..=plan.count)
        .map(|ordinal| Session {
            id: SessionId {
                course: course.id,
                ordinal,
            },
            course_index,
            lecturer_id: course.lecturer_id,
            duration,
            seats: plan.seats,
        })
        .collect()
}

/// Sessions for every course, in course input order.
pub fn generate_sessions(courses: &[Course], max_room_capacity: u32) -> Vec<Session> {
    courses
        .iter()
        .enumerate()
        .flat_map(|(index, course)| course_sessions(course, index, max_room_capacity))
        .collect()
}
