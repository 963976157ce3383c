//! Typed operations over the Learn public REST API.
//!
//! Each service is a thin view over [`crate::client::BlackboardClient`]: it
//! builds the versioned endpoint path, sends the request through the
//! authenticated dispatcher, and maps the response status to a typed result.

mod announcements;
mod courses;
mod users;

pub use announcements::{
    Announcement, AnnouncementAvailability, AnnouncementDuration, AnnouncementsService,
};
pub use courses::{
    CopyHistory, Course, CourseAvailability, CourseDuration, CourseLocale, CourseRole,
    CourseUpdateRequest, CoursesService, Enrollment, EnrollmentRequest, MembershipAvailability,
};
pub use users::{
    Address, Avatar, Contact, ContactUpdate, Job, Locale, Name, NameUpdate, NewUser,
    PronunciationAudio, User, UserAvailability, UserUpdate, UsersService,
};

use crate::errors::{BlackboardError, BlackboardResult};
use serde::{Deserialize, Serialize};

/// Availability flag shared by users, courses, and memberships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    /// Visible and accessible.
    #[default]
    Yes,
    /// Hidden but kept.
    No,
    /// Disabled by an administrator.
    Disabled,
}

/// Envelope returned by Learn list endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    /// The page of results.
    pub results: Vec<T>,
    /// Present when more pages exist.
    #[serde(default)]
    pub paging: Option<Paging>,
}

/// Paging block of a list response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// Relative URL of the next page.
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Trims a mandatory field and rejects it when empty.
pub(crate) fn required(value: &str, field: &'static str) -> BlackboardResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BlackboardError::validation(format!(
            "{} is required and cannot be empty",
            field
        )));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional field; an empty result is acceptable.
pub(crate) fn optional(value: &str) -> String {
    value.trim().to_string()
}
