use crate::{require, Collection, DoctorRef, Entity, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum PatientStatus {
    #[default]
    Stable,
    #[serde(rename = "Under Treatment")]
    UnderTreatment,
    Monitoring,
    Treated,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default)]
    pub status: PatientStatus,

    /// Display name of the assigned doctor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_block: Option<String>,

    #[serde(default)]
    pub is_treated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn new(name: &str) -> Self {
        Patient {
            id: None,
            name: name.to_string(),
            age: None,
            gender: None,
            blood_group: None,
            phone: None,
            last_visit: None,
            condition: None,
            status: PatientStatus::default(),
            doctor: None,
            doctor_id: None,
            assigned_block: None,
            is_treated: false,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_doctor(mut self, doctor: &str) -> Self {
        self.doctor = Some(doctor.to_string());
        self
    }

    pub fn is_assigned_to(&self, doctor: &DoctorRef) -> bool {
        doctor.matches(self.doctor_id, self.doctor.as_deref())
    }
}

impl Entity for Patient {
    const COLLECTION: Collection = Collection::Patients;

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_uses_display_names() {
        let value = serde_json::to_value(PatientStatus::UnderTreatment).unwrap();
        assert_eq!(value, json!("Under Treatment"));

        let status: PatientStatus = serde_json::from_value(json!("Treated")).unwrap();
        assert_eq!(status, PatientStatus::Treated);
    }

    #[test]
    fn camel_case_round_trip_keeps_fields() {
        let patient: Patient = serde_json::from_value(json!({
            "name": "Jane Doe",
            "age": 42,
            "bloodGroup": "O+",
            "doctor": "Dr. Smith",
            "isTreated": false
        }))
        .unwrap();

        assert_eq!(patient.blood_group.as_deref(), Some("O+"));
        assert_eq!(patient.status, PatientStatus::Stable);

        let value = serde_json::to_value(&patient).unwrap();
        assert_eq!(value["bloodGroup"], json!("O+"));
        assert_eq!(value["isTreated"], json!(false));
        assert!(value.get("_id").is_none());
    }

    #[test]
    fn name_is_required() {
        let patient = Patient::new("");
        assert!(matches!(
            patient.validate(),
            Err(ValidationError::MissingField { field: "name" })
        ));
    }
}
