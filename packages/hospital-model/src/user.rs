use crate::{require, Collection, Entity, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Doctor,
    #[default]
    User,
    Staff,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Admin => "Admin",
            Role::Doctor => "Doctor",
            Role::User => "User",
            Role::Staff => "Staff",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum UserStatus {
    #[default]
    Active,
    Pending,
    Inactive,
    Blocked,
}

///
/// Public view of an account.
///
/// The password hash lives in the stored document only and is never part of
/// this type, so it cannot leak through a response body.
///
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    pub name: String,
    pub email: String,

    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub status: UserStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(name: &str, email: &str, role: Role) -> Self {
        User {
            id: None,
            name: name.to_string(),
            email: email.to_string(),
            role,
            status: UserStatus::default(),
            specialty: None,
            experience: None,
            block: None,
            last_login: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }
}

impl Entity for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("email", &self.email)?;

        let valid = self
            .email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());

        if !valid {
            return Err(ValidationError::InvalidEmail {
                email: self.email.to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn password_fields_are_ignored() {
        let user: User = serde_json::from_value(json!({
            "name": "Dr. Smith",
            "email": "smith@hospital.com",
            "role": "Doctor",
            "passwordHash": "pbkdf2-sha256$1$00$00"
        }))
        .unwrap();

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password").is_none());
        assert!(user.is_doctor());
    }

    #[test]
    fn blocked_status_is_accepted() {
        let user: User = serde_json::from_value(json!({
            "name": "Gone",
            "email": "gone@hospital.com",
            "status": "Blocked"
        }))
        .unwrap();
        assert_eq!(user.status, UserStatus::Blocked);
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn email_must_have_both_parts() {
        assert!(User::new("A", "a@b.com", Role::User).validate().is_ok());
        assert!(matches!(
            User::new("A", "a@", Role::User).validate(),
            Err(ValidationError::InvalidEmail { .. })
        ));
        assert!(matches!(
            User::new("A", "nobody", Role::User).validate(),
            Err(ValidationError::InvalidEmail { .. })
        ));
    }
}
