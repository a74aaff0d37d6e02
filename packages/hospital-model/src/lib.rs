mod appointment;
mod doctor;
mod emergency;
mod error;
mod hospital_data;
mod notification;
mod patient;
mod user;

pub use appointment::{Appointment, AppointmentStatus};
pub use doctor::{normalize_name, DoctorRef};
pub use emergency::{EmergencyAlert, EmergencyStatus, Severity};
pub use error::{TransitionError, ValidationError};
pub use hospital_data::{
    AppointmentsPerDay, BloodBankEntry, HospitalAnalytics, HospitalData, HospitalStats,
    MonthlyRevenue, PatientGrowth, SpecialtyShare,
};
pub use notification::{Notification, NotificationKind, RecipientRole, Viewer};
pub use patient::{Patient, PatientStatus};
pub use user::{Role, User, UserStatus};

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Document field holding the generated identifier.
pub const ID_FIELD: &str = "_id";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

///
/// Named collections of the document store.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Patients,
    Appointments,
    Users,
    Notifications,
    Emergencies,
    HospitalData,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Patients,
        Collection::Appointments,
        Collection::Users,
        Collection::Notifications,
        Collection::Emergencies,
        Collection::HospitalData,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Collection::Patients => "patients",
            Collection::Appointments => "appointments",
            Collection::Users => "users",
            Collection::Notifications => "notifications",
            Collection::Emergencies => "emergencies",
            Collection::HospitalData => "hospital_data",
        }
    }

    /// Singular display name used in "not found" messages
    pub const fn label(&self) -> &'static str {
        match self {
            Collection::Patients => "Patient",
            Collection::Appointments => "Appointment",
            Collection::Users => "User",
            Collection::Notifications => "Notification",
            Collection::Emergencies => "Emergency alert",
            Collection::HospitalData => "Hospital data",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

///
/// A document type stored in one collection.
///
/// `validate` checks the constraints serde cannot express: required strings
/// that must not be blank, e-mail shape and the like.
///
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> Option<Uuid>;

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(())
}
