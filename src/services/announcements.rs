//! Course announcement operations.

use crate::client::{json_body, read_body_capped, BlackboardClient};
use crate::errors::{BlackboardError, BlackboardResult};
use crate::services::{required, Paged};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

fn announcements_path(course_id: &str) -> String {
    format!(
        "/learn/api/public/v1/courses/courseId:{}/announcements",
        course_id
    )
}

fn announcement_path(course_id: &str, announcement_id: &str) -> String {
    format!(
        "/learn/api/public/v1/courses/courseId:{}/announcements/{}",
        course_id, announcement_id
    )
}

/// Service for course announcement operations.
pub struct AnnouncementsService<'a> {
    client: &'a BlackboardClient,
}

impl<'a> AnnouncementsService<'a> {
    /// Creates a new announcements service.
    pub(crate) fn new(client: &'a BlackboardClient) -> Self {
        Self { client }
    }

    /// Lists the announcements of a course.
    pub async fn list(&self, course_id: &str) -> BlackboardResult<Vec<Announcement>> {
        let course_id = required(course_id, "courseID")?;
        let response = self.client.get(&announcements_path(&course_id)).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            ));
        }

        let page: Paged<Announcement> = json_body(response).await?;
        Ok(page.results)
    }

    /// Fetches a single announcement.
    pub async fn get(
        &self,
        course_id: &str,
        announcement_id: &str,
    ) -> BlackboardResult<Announcement> {
        let course_id = required(course_id, "courseID")?;
        let announcement_id = required(announcement_id, "announcementID")?;

        let response = self
            .client
            .get(&announcement_path(&course_id, &announcement_id))
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => json_body(response).await,
            StatusCode::NOT_FOUND => Err(BlackboardError::not_found("announcement doesn't exist")),
            _ => Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            )),
        }
    }
}

/// A course announcement.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Announcement {
    /// Primary id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Body HTML.
    pub body: String,
    /// Whether the announcement is still a draft.
    pub draft: bool,
    /// Availability window.
    pub availability: Option<AnnouncementAvailability>,
    /// Id of the creating user.
    pub creator_user_id: String,
    /// Creation instant.
    pub created: Option<DateTime<Utc>>,
    /// Last modification instant.
    pub modified: Option<DateTime<Utc>>,
    /// Position among the course's announcements.
    pub position: i32,
    /// Display name of the creator.
    pub creator: String,
}

/// Availability window of an announcement.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnouncementAvailability {
    /// Duration settings.
    pub duration: Option<AnnouncementDuration>,
}

/// Duration settings of an announcement.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnouncementDuration {
    /// Duration type, e.g. "Permanent" or "Restricted".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Visibility start.
    pub start: Option<DateTime<Utc>>,
    /// Visibility end.
    pub end: Option<DateTime<Utc>>,
}
