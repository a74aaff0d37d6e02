use crate::AppointmentStatus;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Path `{field}` is required.")]
    MissingField { field: &'static str },

    #[error("{email} is not a valid email address")]
    InvalidEmail { email: String },

    #[error("Appointment must be created with status Pending, received {status}")]
    InitialStatus { status: AppointmentStatus },

    #[error("{message}")]
    Schema { message: String },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Appointment cannot move from {from} to {to}")]
pub struct TransitionError {
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
}

impl From<serde_json::Error> for ValidationError {
    fn from(e: serde_json::Error) -> Self {
        ValidationError::Schema {
            message: e.to_string(),
        }
    }
}
