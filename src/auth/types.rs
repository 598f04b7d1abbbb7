// Authentication types

use serde::{Deserialize, Serialize};

/// Persisted authentication state
///
/// An access token being present is what makes the session count as
/// authenticated; the user record travels along for display purposes.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
}

impl Session {
    /// Whether the session holds an access credential
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// User record as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

/// Body of the token refresh call
#[derive(Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Token refresh response
#[derive(Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Login request body
#[derive(Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response: token pair plus the signed-in user
#[derive(Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserProfile,
}

/// Registration request body
#[derive(Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub password: String,
    pub password2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_authenticated() {
        let mut session = Session::default();
        assert!(!session.is_authenticated());

        session.access_token = Some("a1".to_string());
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_user_profile_tolerates_missing_fields() {
        let user: UserProfile =
            serde_json::from_str(r#"{"id": 7, "username": "alice"}"#).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, None);
        assert_eq!(user.role, None);
    }

    #[test]
    fn test_register_request_skips_absent_fields() {
        let req = RegisterRequest {
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            first_name: None,
            last_name: None,
            password: "pw".to_string(),
            password2: "pw".to_string(),
            department: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("first_name").is_none());
        assert!(json.get("department").is_none());
        assert_eq!(json["username"], "bob");
    }
}
