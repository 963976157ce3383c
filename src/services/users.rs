//! User operations.

use crate::client::{json_body, read_body_capped, BlackboardClient};
use crate::errors::{BlackboardError, BlackboardResult};
use crate::services::{optional, required, Availability};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

fn path_by_username(username: &str) -> String {
    format!("/learn/api/public/v1/users/userName:{}", username)
}

const USERS_PATH: &str = "/learn/api/public/v1/users";

/// Learn quirk: some instances answer a duplicate-user create with a 400
/// carrying this phrase instead of the documented 409.
const DATABASE_ERROR_MARKER: &str = "A database error occurred";

/// Service for user operations.
pub struct UsersService<'a> {
    client: &'a BlackboardClient,
}

impl<'a> UsersService<'a> {
    /// Creates a new users service.
    pub(crate) fn new(client: &'a BlackboardClient) -> Self {
        Self { client }
    }

    /// Creates a user account.
    pub async fn create(&self, new_user: NewUser) -> BlackboardResult<()> {
        let username = required(&new_user.username, "username")?;
        let first_name = required(&new_user.first_name, "first name")?;
        let last_name = required(&new_user.last_name, "last name")?;
        let email = optional(&new_user.email);
        let password = optional(&new_user.password);

        let body = User {
            user_name: username,
            password,
            availability: Some(UserAvailability {
                available: Availability::Yes,
            }),
            name: Some(Name {
                given: first_name,
                family: last_name,
                preferred_display_name: "GivenName".to_string(),
                ..Name::default()
            }),
            contact: Some(Contact {
                email,
                ..Contact::default()
            }),
            ..User::default()
        };

        let response = self.client.post(USERS_PATH, &body).await?;
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
                let body = read_body_capped(response).await;
                if body.contains(DATABASE_ERROR_MARKER) {
                    // The server failed the insert rather than reporting the
                    // conflict; treat it as "already exists".
                    Err(BlackboardError::from_response(409, body))
                } else {
                    Err(BlackboardError::validation("user payload was rejected")
                        .with_status(400)
                        .with_body(body))
                }
            }
            _ => Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            )),
        }
    }

    /// Checks whether a user account exists.
    ///
    /// Only a 404 is a confident "does not exist"; any other non-200 status
    /// is an error, not a `false`.
    pub async fn exists(&self, username: &str) -> BlackboardResult<bool> {
        let username = required(username, "username")?;
        let response = self.client.get(&path_by_username(&username)).await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            )),
        }
    }

    /// Fetches a user by username.
    pub async fn get_by_username(&self, username: &str) -> BlackboardResult<User> {
        let username = required(username, "username")?;
        let response = self.client.get(&path_by_username(&username)).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            ));
        }

        json_body(response).await
    }

    /// Applies a partial update to a user account.
    pub async fn update(&self, username: &str, update: &UserUpdate) -> BlackboardResult<()> {
        let username = required(username, "username")?;
        let response = self
            .client
            .patch(&path_by_username(&username), update)
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(BlackboardError::not_found("user account doesn't exist")),
            StatusCode::BAD_REQUEST => Err(BlackboardError::validation("user update was rejected")
                .with_status(400)
                .with_body(read_body_capped(response).await)),
            _ => Err(BlackboardError::from_response(
                status.as_u16(),
                read_body_capped(response).await,
            )),
        }
    }

    /// Sets a new password.
    pub async fn update_password(&self, username: &str, new_password: &str) -> BlackboardResult<()> {
        let password = required(new_password, "new password")?;
        self.update(
            username,
            &UserUpdate {
                password: Some(password),
                ..UserUpdate::default()
            },
        )
        .await
    }

    /// Sets the contact email address.
    pub async fn update_email(&self, username: &str, new_email: &str) -> BlackboardResult<()> {
        self.update(
            username,
            &UserUpdate {
                contact: Some(ContactUpdate {
                    email: Some(optional(new_email)),
                    ..ContactUpdate::default()
                }),
                ..UserUpdate::default()
            },
        )
        .await
    }

    /// Sets the institution email address.
    pub async fn update_institution_email(
        &self,
        username: &str,
        new_email: &str,
    ) -> BlackboardResult<()> {
        self.update(
            username,
            &UserUpdate {
                contact: Some(ContactUpdate {
                    institution_email: Some(optional(new_email)),
                    ..ContactUpdate::default()
                }),
                ..UserUpdate::default()
            },
        )
        .await
    }

    /// Sets the given and/or family name. At least one must be provided.
    pub async fn update_name(
        &self,
        username: &str,
        given: Option<&str>,
        family: Option<&str>,
    ) -> BlackboardResult<()> {
        let given = given.map(str::trim).filter(|s| !s.is_empty());
        let family = family.map(str::trim).filter(|s| !s.is_empty());

        if given.is_none() && family.is_none() {
            return Err(BlackboardError::validation(
                "first and last name not provided",
            ));
        }

        self.update(
            username,
            &UserUpdate {
                name: Some(NameUpdate {
                    given: given.map(String::from),
                    family: family.map(String::from),
                }),
                ..UserUpdate::default()
            },
        )
        .await
    }

    /// Grants institution roles.
    pub async fn add_institution_roles(
        &self,
        username: &str,
        roles: &[String],
    ) -> BlackboardResult<()> {
        if roles.is_empty() {
            return Err(BlackboardError::validation("no roles provided"));
        }

        self.update(
            username,
            &UserUpdate {
                institution_role_ids: roles.to_vec(),
                ..UserUpdate::default()
            },
        )
        .await
    }

    /// Toggles account availability.
    pub async fn update_availability(
        &self,
        username: &str,
        availability: Availability,
    ) -> BlackboardResult<()> {
        self.update(
            username,
            &UserUpdate {
                availability: Some(UserAvailability {
                    available: availability,
                }),
                ..UserUpdate::default()
            },
        )
        .await
    }
}

/// Parameters for creating a user account.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    /// Login name. Required.
    pub username: String,
    /// Given name. Required.
    pub first_name: String,
    /// Family name. Required.
    pub last_name: String,
    /// Contact email. May be left empty.
    pub email: String,
    /// Initial password. May be left empty when the instance uses SSO.
    pub password: String,
}

/// A Learn user account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    /// Primary id assigned by the server.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Immutable UUID assigned by the server.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    /// External (SIS) id.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub external_id: String,
    /// Data source id.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data_source_id: String,
    /// Login name.
    pub user_name: String,
    /// Student id.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub student_id: String,
    /// Password, accepted on create only. Never returned by the server.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// Education level.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub education_level: String,
    /// Gender.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gender: String,
    /// Pronouns.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pronouns: String,
    /// Birth date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<DateTime<Utc>>,
    /// Institution role ids.
    pub institution_role_ids: Vec<String>,
    /// System role ids.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub system_role_ids: Vec<String>,
    /// Account availability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<UserAvailability>,
    /// Name block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,
    /// Job block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<Job>,
    /// Contact block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// Address block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Locale block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<Locale>,
    /// Avatar block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Avatar>,
    /// Name pronunciation text.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pronunciation: String,
    /// Name pronunciation audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronunciation_audio: Option<PronunciationAudio>,
}

/// User availability block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserAvailability {
    /// Availability flag.
    pub available: Availability,
}

/// User name block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Name {
    /// Given name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub given: String,
    /// Family name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub family: String,
    /// Middle name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub middle: String,
    /// Other name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub other: String,
    /// Suffix.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub suffix: String,
    /// Title.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Which name is shown in courses.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub preferred_display_name: String,
}

/// User job block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    /// Job title.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Department.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub department: String,
    /// Company.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub company: String,
}

/// User contact block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    /// Home phone.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub home_phone: String,
    /// Mobile phone.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mobile_phone: String,
    /// Business phone.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub business_phone: String,
    /// Business fax.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub business_fax: String,
    /// Contact email.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// Institution email.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub institution_email: String,
    /// Web page.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub web_page: String,
}

/// User address block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    /// Street, first line.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub street_1: String,
    /// Street, second line.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub street_2: String,
    /// City.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
    /// State or province.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub state: String,
    /// Zip or postal code.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub zip_code: String,
    /// Country.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,
}

/// User locale block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Locale {
    /// Locale id.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Calendar type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<String>,
    /// First day of the week.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_day_of_week: Option<String>,
}

/// User avatar block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Avatar {
    /// Avatar source.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// Upload id.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub upload_id: String,
    /// Resource id.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_id: String,
}

/// Name pronunciation audio block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PronunciationAudio {
    /// Upload id.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub upload_id: String,
}

/// Partial update of a user account. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// Contact changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactUpdate>,
    /// Name changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<NameUpdate>,
    /// New password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Institution roles to set.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub institution_role_ids: Vec<String>,
    /// Availability change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<UserAvailability>,
}

/// Contact changes within a [`UserUpdate`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactUpdate {
    /// New contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New institution email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_email: Option<String>,
}

/// Name changes within a [`UserUpdate`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameUpdate {
    /// New given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    /// New family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_update_serializes_only_set_fields() {
        let update = UserUpdate {
            password: Some("hunter2".to_string()),
            ..UserUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"password": "hunter2"}));
    }

    #[test]
    fn test_user_deserializes_from_learn_shape() {
        let user: User = serde_json::from_str(
            r#"{
                "id": "_123_1",
                "uuid": "abcd",
                "userName": "jdoe",
                "institutionRoleIds": ["STUDENT"],
                "availability": {"available": "Yes"},
                "name": {"given": "Jane", "family": "Doe"},
                "contact": {"email": "jdoe@example.edu"}
            }"#,
        )
        .unwrap();

        assert_eq!(user.user_name, "jdoe");
        assert_eq!(user.name.unwrap().given, "Jane");
        assert_eq!(
            user.availability.unwrap().available,
            Availability::Yes
        );
    }
}
