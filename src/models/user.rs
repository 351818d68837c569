use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Standard,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Standard => "standard",
            UserRole::Admin => "admin",
        }
    }
}

/// Stored user record. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "pwdHash")]
    pub pwd_hash: Option<String>,
}

/// What clients see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// `user` field of add/update request bodies.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: UserInput,
}

impl User {
    /// Structural contract for a submitted user: integer `id`, non-empty
    /// `name`, an `email` containing `@`, and a known `role`.
    pub fn instance_of(value: &Value) -> bool {
        let Some(obj) = value.as_object() else {
            return false;
        };

        let id_ok = obj.get("id").is_some_and(|v| v.is_i64() || v.is_u64());
        let name_ok = obj
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        let email_ok = obj
            .get("email")
            .and_then(Value::as_str)
            .is_some_and(|s| s.contains('@'));
        let role_ok = obj
            .get("role")
            .and_then(Value::as_str)
            .is_some_and(|s| matches!(s, "standard" | "admin"));

        id_ok && name_ok && email_ok && role_ok
    }
}
