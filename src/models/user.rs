use serde::{Deserialize, Serialize};

/// Account role within Counsel.
///
/// Seekers submit questions; scholars review generated guidance before it is
/// marked as reviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Seeker,
    Scholar,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Seeker => write!(f, "Seeker"),
            UserRole::Scholar => write!(f, "Scholar"),
            UserRole::Admin => write!(f, "Admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub organization_id: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_profile_response() {
        let json = r#"{
            "id": "usr_01h9",
            "email": "amina@example.org",
            "name": "Amina K",
            "role": "seeker",
            "organization_id": null
        }"#;

        let user: User = serde_json::from_str(json).expect("profile should parse");
        assert_eq!(user.id, "usr_01h9");
        assert_eq!(user.role, UserRole::Seeker);
        assert!(user.organization_id.is_none());
        // email_verified is absent in older server responses
        assert!(!user.email_verified);
    }
}
