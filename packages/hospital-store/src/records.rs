//! Records kept only on the client, the API has no collection for them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Medicine {
    pub name: String,
    pub dosage: String,
    pub duration: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    pub date: String,
    pub medicines: Vec<Medicine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Prescription {
    /// Dated today, with a fresh id
    pub fn new(patient_name: &str, doctor_name: &str, medicines: Vec<Medicine>) -> Self {
        Prescription {
            id: Uuid::new_v4(),
            patient_name: patient_name.to_string(),
            doctor_name: doctor_name.to_string(),
            date: today(),
            medicines,
            notes: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicalReport {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub date: String,
    pub status: String,
}

impl MedicalReport {
    pub fn new(title: &str, kind: &str, patient_name: &str, doctor_name: &str) -> Self {
        MedicalReport {
            id: Uuid::new_v4(),
            title: title.to_string(),
            kind: kind.to_string(),
            patient_name: patient_name.to_string(),
            doctor_name: doctor_name.to_string(),
            date: today(),
            status: "Finalized".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Hours {
    pub start: String,
    pub end: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Break {
    #[serde(rename = "type")]
    pub kind: String,
    pub start: String,
    pub end: String,
}

///
/// A doctor's weekly availability
///
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub working_hours: Hours,
    pub breaks: Vec<Break>,
    pub leaves: Vec<String>,
    pub days_off: Vec<String>,
}

/// Nine to five with an hour for lunch, weekends off
impl Default for Schedule {
    fn default() -> Self {
        Schedule {
            working_hours: Hours {
                start: "09:00".to_string(),
                end: "17:00".to_string(),
            },
            breaks: vec![Break {
                kind: "Lunch".to_string(),
                start: "13:00".to_string(),
                end: "14:00".to_string(),
            }],
            leaves: vec![],
            days_off: vec!["Saturday".to_string(), "Sunday".to_string()],
        }
    }
}
