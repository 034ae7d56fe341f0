use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ActiveStatus, Entity};

/// Staff and client roles. Wire names are the ones the web client uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "ADMIN")]
    Admin,
    /// Field meter reader.
    #[serde(rename = "LEITOR")]
    Reader,
    #[serde(rename = "TECNICO")]
    Technician,
    #[serde(rename = "CLIENTE")]
    Client,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Reader => write!(f, "reader"),
            UserRole::Technician => write!(f, "technician"),
            UserRole::Client => write!(f, "client"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: UserRole,
    #[serde(default)]
    pub status: ActiveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
            role,
            status: ActiveStatus::Active,
            last_login: None,
            avatar: None,
            password: None,
            updated_at: None,
        }
    }
}

impl Entity for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        super::seed::users()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} <{}> [{}]", self.id, self.name, self.email, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(
            serde_json::to_value(UserRole::Reader).unwrap(),
            serde_json::json!("LEITOR")
        );
        let role: UserRole = serde_json::from_str("\"TECNICO\"").unwrap();
        assert_eq!(role, UserRole::Technician);
    }
}
