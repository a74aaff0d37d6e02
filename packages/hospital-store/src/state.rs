use crate::api::Session;
use crate::records::{MedicalReport, Prescription, Schedule};
use hospital_model::{
    Appointment, EmergencyAlert, Entity, HospitalData, Notification, Patient, User, Viewer,
};
use std::collections::HashMap;
use uuid::Uuid;

///
/// Immutable view of everything the store holds.
///
/// Readers get an `Arc<HospitalState>` and never see a half-applied change.
///
#[derive(Clone, Debug, Default)]
pub struct HospitalState {
    pub patients: Vec<Patient>,
    pub appointments: Vec<Appointment>,
    pub users: Vec<User>,
    /// Newest first
    pub notifications: Vec<Notification>,
    /// Active alerts only, newest first
    pub emergencies: Vec<EmergencyAlert>,
    pub hospital: HospitalData,

    pub prescriptions: Vec<Prescription>,
    pub medical_reports: Vec<MedicalReport>,
    /// Keyed by doctor name
    pub availability: HashMap<String, Schedule>,

    pub session: Option<Session>,
}

impl HospitalState {
    pub fn patient(&self, id: Uuid) -> Option<&Patient> {
        find(&self.patients, id)
    }

    pub fn appointment(&self, id: Uuid) -> Option<&Appointment> {
        find(&self.appointments, id)
    }

    pub fn user(&self, id: Uuid) -> Option<&User> {
        find(&self.users, id)
    }

    /// Users with the Doctor role
    pub fn doctors(&self) -> Vec<&User> {
        self.users.iter().filter(|u| u.is_doctor()).collect()
    }

    pub fn visible_notifications(&self, viewer: &Viewer) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| n.is_visible_to(viewer))
            .collect()
    }

    pub fn unread_count(&self, viewer: &Viewer) -> usize {
        self.visible_notifications(viewer)
            .iter()
            .filter(|n| !n.read)
            .count()
    }
}

pub(crate) fn find<T: Entity>(items: &[T], id: Uuid) -> Option<&T> {
    items.iter().find(|item| item.id() == Some(id))
}

///
/// Replaces the element with the same id.
/// Records not already held locally are ignored.
///
pub(crate) fn replace<T: Entity>(items: &mut [T], updated: T) {
    let Some(id) = updated.id() else {
        return;
    };

    if let Some(slot) = items.iter_mut().find(|item| item.id() == Some(id)) {
        *slot = updated;
    }
}

pub(crate) fn remove<T: Entity>(items: &mut Vec<T>, id: Uuid) {
    items.retain(|item| item.id() != Some(id));
}
