use crate::{require, Collection, Entity, TransitionError, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    ///
    /// Allowed edges of the appointment workflow
    ///
    /// ```text
    /// Pending   -> Confirmed | Cancelled
    /// Confirmed -> Completed | Cancelled
    /// Completed, Cancelled are terminal
    /// ```
    ///
    /// Setting the current status again is a no-op and always allowed.
    ///
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;

        if *self == next {
            return true;
        }

        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
        )
    }

    pub fn transition_to(
        &self,
        next: AppointmentStatus,
    ) -> Result<AppointmentStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError { from: *self, to: next })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::Completed => "Completed",
        }
    }
}

impl Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    pub patient_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<Uuid>,

    pub doctor_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<Uuid>,

    pub date: String,
    pub time: String,

    #[serde(rename = "type", default = "Appointment::default_kind")]
    pub kind: String,

    #[serde(default)]
    pub status: AppointmentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn new(patient_name: &str, doctor_name: &str, date: &str, time: &str) -> Self {
        Appointment {
            id: None,
            patient_name: patient_name.to_string(),
            patient_id: None,
            doctor_name: doctor_name.to_string(),
            doctor_id: None,
            date: date.to_string(),
            time: time.to_string(),
            kind: Appointment::default_kind(),
            status: AppointmentStatus::Pending,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn default_kind() -> String {
        "Consultation".to_string()
    }
}

impl Entity for Appointment {
    const COLLECTION: Collection = Collection::Appointments;

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("patientName", &self.patient_name)?;
        require("doctorName", &self.doctor_name)?;
        require("date", &self.date)?;
        require("time", &self.time)?;
        Ok(())
    }
}
