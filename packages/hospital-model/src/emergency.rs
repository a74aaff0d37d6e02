use crate::{require, Collection, Entity, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Severity {
    Critical,
    #[default]
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum EmergencyStatus {
    #[default]
    Active,
    Resolved,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyAlert {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(rename = "type")]
    pub kind: String,

    pub patient: String,

    #[serde(default)]
    pub severity: Severity,

    pub location: String,
    pub time: String,

    #[serde(default)]
    pub status: EmergencyStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EmergencyAlert {
    pub fn new(kind: &str, patient: &str, location: &str, time: &str) -> Self {
        EmergencyAlert {
            id: None,
            kind: kind.to_string(),
            patient: patient.to_string(),
            severity: Severity::default(),
            location: location.to_string(),
            time: time.to_string(),
            status: EmergencyStatus::Active,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == EmergencyStatus::Active
    }
}

impl Entity for EmergencyAlert {
    const COLLECTION: Collection = Collection::Emergencies;

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("type", &self.kind)?;
        require("patient", &self.patient)?;
        require("location", &self.location)?;
        require("time", &self.time)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let alert: EmergencyAlert = serde_json::from_value(json!({
            "type": "Cardiac Arrest",
            "patient": "Jane Doe",
            "location": "Ward 3",
            "time": "10:42"
        }))
        .unwrap();

        assert_eq!(alert.severity, Severity::High);
        assert!(alert.is_active());
        assert!(alert.validate().is_ok());
    }

    #[test]
    fn location_is_required() {
        let alert = EmergencyAlert::new("Fall", "Jane Doe", " ", "10:42");
        assert!(matches!(
            alert.validate(),
            Err(ValidationError::MissingField { field: "location" })
        ));
    }
}
