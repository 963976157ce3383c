//! Course, enrollment, and membership operations.

use crate::client::{json_body, read_body_capped, BlackboardClient};
use crate::errors::{BlackboardError, BlackboardErrorKind, BlackboardResult};
use crate::services::{required, Availability};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const COURSES_PATH: &str = "/learn/api/public/v3/courses";

fn path_by_course_id(course_id: &str) -> String {
    format!("/learn/api/public/v3/courses/courseId:{}", course_id)
}

fn path_by_id(id: &str) -> String {
    format!("/learn/api/public/v3/courses/{}", id)
}

// Course copy never moved past v2 of the public API.
fn copy_path(course_id: &str) -> String {
    format!("/learn/api/public/v2/courses/courseId:{}/copy", course_id)
}

fn child_path(course_id: &str, child_id: &str) -> String {
    format!(
        "/learn/api/public/v1/courses/courseId:{}/children/courseId:{}",
        course_id, child_id
    )
}

fn membership_path(course_id: &str, username: &str) -> String {
    format!(
        "/learn/api/public/v1/courses/courseId:{}/users/userName:{}",
        course_id, username
    )
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Service for course operations.
pub struct CoursesService<'a> {
    client: &'a BlackboardClient,
}

impl<'a> CoursesService<'a> {
    /// Creates a new courses service.
    pub(crate) fn new(client: &'a BlackboardClient) -> Self {
        Self { client }
    }

    /// Creates a course, initially unavailable to students.
    pub async fn create(
        &self,
        course_id: &str,
        name: &str,
        term_id: &str,
    ) -> BlackboardResult<()> {
        let course_id = required(course_id, "courseId")?;
        let name = required(name, "name")?;
        let term_id = required(term_id, "termId")?;

        let body = Course {
            course_id,
            name,
            term_id,
            organization: false,
            availability: Some(CourseAvailability {
                available: Availability::No,
                duration: None,
            }),
            enrollment: Some(Enrollment {
                kind: "Continuous".to_string(),
                ..Enrollment::default()
            }),
            ..Course::default()
        };

        let response = self.client.post(COURSES_PATH, &body).await?;
        let status = response.status();
        match status {
            StatusCode::CREATED => Ok(()),
            StatusCode::FORBIDDEN => Err(BlackboardError::from_response(
                403,
                read_body_capped(response).await,
            )),
            StatusCode::CONFLICT => Err(BlackboardError::from_response(
                409,
                read_body_capped(response).await,
            )),
            StatusCode::BAD_REQUEST => {
                Err(BlackboardError::validation("course payload was rejected")
                    .with_status(400)
                    .with_body(read_body_capped(response).await))
            }
            _ => Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            )),
        }
    }

    /// Copies a course's content into another course.
    ///
    /// The server performs the copy asynchronously; the returned string is
    /// the task URI from the `Location` header, which can be polled for
    /// completion.
    pub async fn copy(
        &self,
        source_course_id: &str,
        target_course_id: &str,
    ) -> BlackboardResult<String> {
        let source = required(source_course_id, "source courseId")?;
        let target = required(target_course_id, "target courseId")?;

        let body = serde_json::json!({
            "targetCourse": {
                "courseId": target,
            },
            "copy": {
                "adaptiveReleaseRules": true,
                "announcements": true,
                "assessments": true,
                "blogs": true,
                "calendar": true,
                "contacts": true,
                "contentAlignments": true,
                "contentAreas": true,
                "discussions": "ForumsAndStarterPosts",
                "glossary": true,
                "gradebook": true,
                "groupSettings": true,
                "journals": true,
                "retentionRules": true,
                "rubrics": true,
                "settings": {
                    "availability": false,
                    "bannerImage": true,
                    "duration": true,
                    "enrollmentOptions": true,
                    "guestAccess": true,
                    "languagePack": true,
                    "navigationSettings": true,
                    "observerAccess": true,
                },
                "tasks": true,
                "wikis": true,
            },
        });

        let response = self.client.post(&copy_path(&source), &body).await?;
        let status = response.status();
        match status {
            StatusCode::ACCEPTED => {
                let task_uri = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                task_uri.ok_or_else(|| {
                    BlackboardError::new(
                        BlackboardErrorKind::Unknown,
                        "202 Accepted received but Location header was missing",
                    )
                })
            }
            _ => Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            )),
        }
    }

    /// Checks whether a course exists.
    pub async fn exists(&self, course_id: &str) -> BlackboardResult<bool> {
        let course_id = required(course_id, "courseId")?;
        let response = self.client.get(&path_by_course_id(&course_id)).await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            )),
        }
    }

    /// Fetches a course by its courseId (the human-assigned identifier).
    pub async fn get_by_course_id(&self, course_id: &str) -> BlackboardResult<Course> {
        let course_id = required(course_id, "courseId")?;
        self.fetch(&path_by_course_id(&course_id)).await
    }

    /// Fetches a course by its primary id.
    pub async fn get_by_id(&self, id: &str) -> BlackboardResult<Course> {
        let id = required(id, "id")?;
        self.fetch(&path_by_id(&id)).await
    }

    async fn fetch(&self, path: &str) -> BlackboardResult<Course> {
        let response = self.client.get(path).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            ));
        }
        json_body(response).await
    }

    /// Applies a partial update and returns the updated course.
    pub async fn update(
        &self,
        course_id: &str,
        request: &CourseUpdateRequest,
    ) -> BlackboardResult<Course> {
        let course_id = required(course_id, "courseId")?;

        if request.name.is_none()
            && request.term_id.is_none()
            && request.availability.is_none()
            && request.data_source_id.is_none()
        {
            return Err(BlackboardError::validation(
                "at least one field must be provided for update",
            ));
        }

        let mut request = request.clone();
        request.name = request.name.map(|v| v.trim().to_string());
        request.term_id = request.term_id.map(|v| v.trim().to_string());
        request.data_source_id = request.data_source_id.map(|v| v.trim().to_string());

        let response = self
            .client
            .patch(&path_by_course_id(&course_id), &request)
            .await?;
        let status = response.status();
        match status {
            StatusCode::OK => json_body(response).await,
            StatusCode::NOT_FOUND => Err(BlackboardError::not_found("course doesn't exist")),
            StatusCode::FORBIDDEN => Err(BlackboardError::from_response(
                403,
                read_body_capped(response).await,
            )),
            StatusCode::BAD_REQUEST => {
                Err(BlackboardError::validation("course update was rejected")
                    .with_status(400)
                    .with_body(read_body_capped(response).await))
            }
            _ => Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            )),
        }
    }

    /// Attaches a child course to a parent (cross-listing).
    pub async fn add_child(&self, course_id: &str, child_id: &str) -> BlackboardResult<()> {
        let course_id = required(course_id, "courseId")?;
        let child_id = required(child_id, "childId")?;

        let response = self
            .client
            .put_empty(&child_path(&course_id, &child_id))
            .await?;
        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            return Ok(());
        }

        Err(BlackboardError::from_response(
            status.as_u16(),
            read_body_capped(response).await,
        ))
    }

    /// Deletes a course.
    pub async fn delete(&self, course_id: &str) -> BlackboardResult<()> {
        let course_id = required(course_id, "courseId")?;
        let response = self.client.delete(&path_by_course_id(&course_id)).await?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::ACCEPTED {
            return Ok(());
        }

        Err(BlackboardError::from_response(
            status.as_u16(),
            read_body_capped(response).await,
        ))
    }

    /// Creates a course membership for a user.
    pub async fn create_membership(
        &self,
        username: &str,
        course_id: &str,
        request: &EnrollmentRequest,
    ) -> BlackboardResult<()> {
        self.upsert_membership(true, username, course_id, request)
            .await
    }

    /// Updates an existing course membership.
    pub async fn update_membership(
        &self,
        username: &str,
        course_id: &str,
        request: &EnrollmentRequest,
    ) -> BlackboardResult<()> {
        self.upsert_membership(false, username, course_id, request)
            .await
    }

    // Create and update differ only in the verb: PUT creates the membership,
    // PATCH modifies it in place.
    async fn upsert_membership(
        &self,
        create: bool,
        username: &str,
        course_id: &str,
        request: &EnrollmentRequest,
    ) -> BlackboardResult<()> {
        let username = required(username, "username")?;
        let course_id = required(course_id, "courseId")?;

        let path = membership_path(&course_id, &username);
        let response = if create {
            self.client.put(&path, request).await?
        } else {
            self.client.patch(&path, request).await?
        };

        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(BlackboardError::not_found(
                "course or user account doesn't exist",
            )),
            StatusCode::BAD_REQUEST | StatusCode::INTERNAL_SERVER_ERROR => Err(
                BlackboardError::validation("membership change was rejected")
                    .with_status(status.as_u16())
                    .with_body(read_body_capped(response).await),
            ),
            _ => Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            )),
        }
    }

    /// Enrolls a user into a course with a role and availability.
    pub async fn enroll_user(
        &self,
        course_id: &str,
        username: &str,
        role: CourseRole,
        availability: Availability,
    ) -> BlackboardResult<()> {
        let request = EnrollmentRequest {
            course_role_id: Some(role),
            availability: Some(MembershipAvailability {
                available: Some(availability),
            }),
            ..EnrollmentRequest::default()
        };
        self.create_membership(username, course_id, &request).await
    }

    /// Toggles the availability of an existing membership.
    pub async fn update_membership_availability(
        &self,
        username: &str,
        course_id: &str,
        availability: Availability,
    ) -> BlackboardResult<()> {
        let request = EnrollmentRequest {
            availability: Some(MembershipAvailability {
                available: Some(availability),
            }),
            ..EnrollmentRequest::default()
        };
        self.update_membership(username, course_id, &request).await
    }

    /// Removes a user from a course.
    pub async fn remove_user(&self, course_id: &str, username: &str) -> BlackboardResult<()> {
        let username = required(username, "username")?;
        let course_id = required(course_id, "courseId")?;

        let response = self
            .client
            .delete(&membership_path(&course_id, &username))
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        Err(BlackboardError::from_response(
            status.as_u16(),
            read_body_capped(response).await,
        ))
    }
}

/// Role a user holds within a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseRole {
    /// Student.
    Student,
    /// Instructor.
    Instructor,
    /// Teaching assistant.
    TeachingAssistant,
}

/// A Learn course.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    /// Human-assigned course identifier. Required for creation.
    pub course_id: String,
    /// Course title. Required for creation.
    pub name: String,
    /// Term the course belongs to. Required for creation.
    pub term_id: String,

    /// Course description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Availability block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<CourseAvailability>,
    /// True for organizations rather than courses.
    #[serde(skip_serializing_if = "is_false")]
    pub organization: bool,
    /// Ultra status.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ultra_status: String,
    /// Whether guests may access the course.
    #[serde(skip_serializing_if = "is_false")]
    pub allow_guests: bool,
    /// Whether observers may access the course.
    pub allow_observers: bool,
    /// Whether the course is closed.
    pub closed_complete: bool,
    /// Enrollment options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment: Option<Enrollment>,
    /// Locale settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<CourseLocale>,

    // Read-only fields, set by the server and ignored on create.
    /// Primary id.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Immutable UUID.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    /// Creation instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Last modification instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// External (SIS) id.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub external_id: String,
    /// Data source id.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data_source_id: String,

    /// Whether the course has child courses.
    #[serde(skip_serializing_if = "is_false")]
    pub has_children: bool,
    /// Parent course id, for child courses.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub parent_id: String,
    /// External access URL.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub external_access_url: String,
    /// Guest access URL.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub guest_access_url: String,
    /// Courses this one was copied from.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub copy_history: Vec<CopyHistory>,
}

/// Course availability block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseAvailability {
    /// Availability flag.
    pub available: Availability,
    /// Duration settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<CourseDuration>,
}

/// Course duration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseDuration {
    /// Duration type, e.g. "Continuous" or "DateRange".
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Start instant for date-range durations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    /// End instant for date-range durations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Day count for fixed-length durations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_of_use: Option<i32>,
}

/// Course enrollment options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Enrollment {
    /// Enrollment type.
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Self-enrollment start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    /// Self-enrollment end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Access code for self-enrollment.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub access_code: String,
}

/// Course locale block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseLocale {
    /// Locale id.
    pub id: String,
    /// Whether the locale is forced on all members.
    pub force: bool,
}

/// A copy-history entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CopyHistory {
    /// UUID of the source course.
    pub uuid: String,
}

/// Partial update of a course. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseUpdateRequest {
    /// New course title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New term.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_id: Option<String>,
    /// New availability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<CourseAvailability>,
    /// New data source id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<String>,
}

/// Membership creation/update payload.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRequest {
    /// Child course the membership belongs to, for merged courses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_course_id: Option<String>,
    /// Data source id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<String>,
    /// Membership availability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<MembershipAvailability>,
    /// Role within the course.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_role_id: Option<CourseRole>,
    /// Display order within the course list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

/// Membership availability block.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipAvailability {
    /// Availability flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<Availability>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrollment_request_serializes_camel_case() {
        let request = EnrollmentRequest {
            course_role_id: Some(CourseRole::TeachingAssistant),
            availability: Some(MembershipAvailability {
                available: Some(Availability::Yes),
            }),
            ..EnrollmentRequest::default()
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "courseRoleId": "TeachingAssistant",
                "availability": {"available": "Yes"},
            })
        );
    }

    #[test]
    fn test_course_deserializes_read_only_fields() {
        let course: Course = serde_json::from_str(
            r#"{
                "id": "_55_1",
                "uuid": "ffff",
                "courseId": "CS101",
                "name": "Intro",
                "termId": "FALL2026",
                "availability": {"available": "No"},
                "created": "2026-01-10T09:00:00.000Z",
                "hasChildren": true,
                "copyHistory": [{"uuid": "aaaa"}]
            }"#,
        )
        .unwrap();

        assert_eq!(course.id, "_55_1");
        assert!(course.has_children);
        assert_eq!(course.copy_history.len(), 1);
        assert_eq!(
            course.availability.unwrap().available,
            Availability::No
        );
    }

    #[test]
    fn test_membership_paths_carry_both_selectors() {
        assert_eq!(
            membership_path("CS101", "jdoe"),
            "/learn/api/public/v1/courses/courseId:CS101/users/userName:jdoe"
        );
        assert_eq!(
            copy_path("CS101"),
            "/learn/api/public/v2/courses/courseId:CS101/copy"
        );
    }
}
