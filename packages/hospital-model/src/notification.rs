use crate::{normalize_name, require, Collection, Entity, Role, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum RecipientRole {
    #[default]
    All,
    Admin,
    Doctor,
    Patient,
}

impl RecipientRole {
    /// The feed a user of `role` reads from
    pub fn feed_for(role: Role) -> RecipientRole {
        match role {
            Role::Admin => RecipientRole::Admin,
            Role::Doctor => RecipientRole::Doctor,
            Role::User | Role::Staff => RecipientRole::Patient,
        }
    }
}

///
/// Who is looking at the notification feed.
///
/// With a name set, notifications addressed to a specific recipient are only
/// shown to that recipient.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Viewer {
    pub role: Role,
    pub name: Option<String>,
}

impl Viewer {
    pub fn role(role: Role) -> Self {
        Viewer { role, name: None }
    }

    pub fn named(role: Role, name: &str) -> Self {
        Viewer {
            role,
            name: Some(name.to_string()),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    pub message: String,

    #[serde(rename = "type", default)]
    pub kind: NotificationKind,

    #[serde(default)]
    pub read: bool,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub recipient_role: RecipientRole,

    #[serde(default)]
    pub recipient_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(
        message: impl Into<String>,
        kind: NotificationKind,
        recipient_role: RecipientRole,
    ) -> Self {
        Notification {
            id: None,
            message: message.into(),
            kind,
            read: false,
            timestamp: Utc::now(),
            recipient_role,
            recipient_name: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn to_recipient(mut self, name: Option<&str>) -> Self {
        self.recipient_name = name.map(str::to_string);
        self
    }

    pub fn is_visible_to(&self, viewer: &Viewer) -> bool {
        let feed = RecipientRole::feed_for(viewer.role);

        if self.recipient_role != RecipientRole::All && self.recipient_role != feed {
            return false;
        }

        match (&self.recipient_name, &viewer.name) {
            (Some(recipient), Some(name)) => normalize_name(recipient) == normalize_name(name),
            _ => true,
        }
    }
}

impl Entity for Notification {
    const COLLECTION: Collection = Collection::Notifications;

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("message", &self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn for_role(role: RecipientRole) -> Notification {
        Notification::new("hello", NotificationKind::Info, role)
    }

    #[test]
    fn admin_sees_admin_and_all() {
        let admin = Viewer::role(Role::Admin);
        assert!(for_role(RecipientRole::Admin).is_visible_to(&admin));
        assert!(for_role(RecipientRole::All).is_visible_to(&admin));
        assert!(!for_role(RecipientRole::Doctor).is_visible_to(&admin));
        assert!(!for_role(RecipientRole::Patient).is_visible_to(&admin));
    }

    #[test]
    fn users_and_staff_read_the_patient_feed() {
        for role in [Role::User, Role::Staff] {
            let viewer = Viewer::role(role);
            assert!(for_role(RecipientRole::Patient).is_visible_to(&viewer));
            assert!(!for_role(RecipientRole::Admin).is_visible_to(&viewer));
        }
    }

    #[test]
    fn named_viewer_only_sees_own_addressed_notifications() {
        let notification = for_role(RecipientRole::Doctor).to_recipient(Some("Dr. Smith"));

        assert!(notification.is_visible_to(&Viewer::named(Role::Doctor, "smith")));
        assert!(!notification.is_visible_to(&Viewer::named(Role::Doctor, "Jones")));
        // Without a name the role check alone applies
        assert!(notification.is_visible_to(&Viewer::role(Role::Doctor)));
    }

    #[test]
    fn defaults_on_deserialize() {
        let notification: Notification =
            serde_json::from_value(json!({ "message": "Ward B inspection" })).unwrap();

        assert_eq!(notification.kind, NotificationKind::Info);
        assert_eq!(notification.recipient_role, RecipientRole::All);
        assert!(!notification.read);
        assert!(notification.recipient_name.is_none());
    }

    #[test]
    fn kind_serialises_lowercase() {
        let value = serde_json::to_value(for_role(RecipientRole::Admin)).unwrap();
        assert_eq!(value["type"], json!("info"));
        assert_eq!(value["recipientRole"], json!("Admin"));
        assert_eq!(value["recipientName"], json!(null));
    }
}
