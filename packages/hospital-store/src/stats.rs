use hospital_model::{Appointment, AppointmentStatus, DoctorRef, Patient};
use std::fmt::Display;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Focus {
    Appointment { patient_name: String },
    Patient { name: String },
    None,
}

///
/// Workload of one doctor across the cached patients and appointments.
///
/// Completed counts treated patients plus confirmed or completed appointments.
/// Remaining counts untreated patients plus pending appointments.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoctorStats {
    pub completed: usize,
    pub remaining: usize,
    pub current_focus: Focus,
}

impl DoctorStats {
    pub fn compute(doctor: &DoctorRef, patients: &[Patient], appointments: &[Appointment]) -> Self {
        let (treated, untreated): (Vec<&Patient>, Vec<&Patient>) = patients
            .iter()
            .filter(|p| p.is_assigned_to(doctor))
            .partition(|p| p.is_treated);

        let theirs = appointments
            .iter()
            .filter(|a| doctor.matches(a.doctor_id, Some(&a.doctor_name)))
            .collect::<Vec<_>>();

        let done = theirs
            .iter()
            .filter(|a| {
                matches!(
                    a.status,
                    AppointmentStatus::Confirmed | AppointmentStatus::Completed
                )
            })
            .count();

        let pending = theirs
            .iter()
            .filter(|a| a.status == AppointmentStatus::Pending)
            .collect::<Vec<_>>();

        let current_focus = match (pending.first(), untreated.first()) {
            (Some(appointment), _) => Focus::Appointment {
                patient_name: appointment.patient_name.to_owned(),
            },
            (None, Some(patient)) => Focus::Patient {
                name: patient.name.to_owned(),
            },
            (None, None) => Focus::None,
        };

        DoctorStats {
            completed: treated.len() + done,
            remaining: untreated.len() + pending.len(),
            current_focus,
        }
    }
}

impl Display for Focus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Focus::Appointment { patient_name } => write!(f, "Appointment with {patient_name}"),
            Focus::Patient { name } => write!(f, "Patient {name}"),
            Focus::None => write!(f, "None"),
        }
    }
}

/// Rendered as the block appended to admin notifications
impl Display for DoctorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "\nStats:\n- Completed Tasks: {}\n- Remaining Work: {}\n- Current Focus: {}",
            self.completed, self.remaining, self.current_focus
        )
    }
}
