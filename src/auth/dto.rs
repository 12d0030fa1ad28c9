use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::User;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileImageRequest {
    pub profile_image: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            profile_image: u.profile_image,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Login and `GET /auth/` response: the user with the session token alongside.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    #[serde(flatten)]
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_response_is_flat_and_hides_hash() {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            profile_image: String::new(),
            created_at: now,
            updated_at: now,
        };
        let resp = SessionResponse {
            token: "tok".into(),
            user: user.into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["token"], "tok");
        assert_eq!(json["email"], "ana@x.com");
        assert_eq!(json["profileImage"], "");
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn change_password_body_is_camel_case() {
        let req: ChangePasswordRequest =
            serde_json::from_str(r#"{"currentPassword":"a","newPassword":"b"}"#).unwrap();
        assert_eq!(req.current_password, "a");
        assert_eq!(req.new_password, "b");
    }
}
