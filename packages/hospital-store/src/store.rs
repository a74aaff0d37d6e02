use crate::api::{HospitalApi, Patch, Registration};
use crate::error::{ApiError, Error};
use crate::log::{FANOUT, STORE};
use crate::records::{MedicalReport, Prescription, Schedule};
use crate::state::{self, HospitalState};
use crate::stats::DoctorStats;
use arc_swap::ArcSwap;
use hospital_model::{
    Appointment, AppointmentStatus, DoctorRef, EmergencyAlert, Notification, NotificationKind,
    Patient, PatientStatus, RecipientRole, User, Viewer,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Password given to accounts created without one
pub const DEFAULT_PASSWORD: &str = "password123";

const EVENT_CAPACITY: usize = 256;

///
/// Part of the state a change applies to
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Patients,
    Appointments,
    Users,
    Notifications,
    Emergencies,
    HospitalData,
    Prescriptions,
    MedicalReports,
    Availability,
    Session,
}

///
/// Short user-facing message
///
#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub message: String,
    pub kind: NotificationKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    Loaded(LoadReport),
    Changed(Topic),
    Toast(Toast),
}

///
/// Outcome of `HospitalStore::load`, one entry per collection that could not be fetched
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub failed: Vec<(Topic, String)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn take<T: Default>(&mut self, topic: Topic, result: Result<T, ApiError>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(target: STORE, msg = "Could not load", ?topic, error = err.to_string());
                self.failed.push((topic, err.to_string()));
                T::default()
            }
        }
    }
}

struct Shared<A> {
    api: A,
    state: ArcSwap<HospitalState>,
    events: broadcast::Sender<StoreEvent>,
}

impl<A> Shared<A> {
    fn emit(&self, event: StoreEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn toast(&self, message: impl Into<String>, kind: NotificationKind) {
        self.emit(StoreEvent::Toast(Toast {
            message: message.into(),
            kind,
        }));
    }

    fn modify<F: Fn(&mut HospitalState)>(&self, f: F) {
        self.state.rcu(|current| {
            let mut next = HospitalState::clone(current);
            f(&mut next);
            next
        });
    }

    fn update<F: Fn(&mut HospitalState)>(&self, topic: Topic, f: F) {
        self.modify(f);
        self.emit(StoreEvent::Changed(topic));
    }

    ///
    /// Reports a failed request: the server's message if it gave one,
    /// otherwise a connection error naming the action
    ///
    fn fail(&self, action: &str, err: ApiError) -> Error {
        warn!(target: STORE, msg = "Request failed", action, error = err.to_string());

        let message = match &err {
            ApiError::Rejected { message, .. } => message.to_owned(),
            _ => format!("Connection error while {action}"),
        };
        self.toast(message, NotificationKind::Error);

        err.into()
    }
}

///
/// Client-side cache of the hospital API.
///
/// Reads come from an immutable snapshot. Every mutation calls the API first
/// and only changes the snapshot once the server has answered, merging the
/// returned record by id. Subscribers are told about each change.
///
/// Some mutations also post notifications to other roles. Those are spawned in
/// the background and their failure never fails the mutation, `settle` waits
/// for them.
///
pub struct HospitalStore<A> {
    shared: Arc<Shared<A>>,
    fanout: TaskTracker,
}

impl<A> Clone for HospitalStore<A> {
    fn clone(&self) -> Self {
        HospitalStore {
            shared: self.shared.clone(),
            fanout: self.fanout.clone(),
        }
    }
}

impl<A: HospitalApi> HospitalStore<A> {
    pub fn new(api: A) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        HospitalStore {
            shared: Arc::new(Shared {
                api,
                state: ArcSwap::from_pointee(HospitalState::default()),
                events,
            }),
            fanout: TaskTracker::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.shared.api
    }

    pub fn snapshot(&self) -> Arc<HospitalState> {
        self.shared.state.load_full()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.shared.events.subscribe()
    }

    ///
    /// Waits for background notification posts to finish
    ///
    pub async fn settle(&self) {
        self.fanout.close();
        self.fanout.wait().await;
        self.fanout.reopen();
    }

    ///
    /// Fetches every collection concurrently.
    ///
    /// A collection that fails to load is left empty. Local-only records and
    /// the session are kept.
    ///
    pub async fn load(&self) -> LoadReport {
        let api = &self.shared.api;

        let (patients, appointments, users, notifications, emergencies, hospital) = tokio::join!(
            api.patients(),
            api.appointments(),
            api.users(),
            api.notifications(),
            api.emergencies(),
            api.hospital_data(),
        );

        let mut report = LoadReport::default();
        let patients = report.take(Topic::Patients, patients);
        let appointments = report.take(Topic::Appointments, appointments);
        let users = report.take(Topic::Users, users);
        let notifications = report.take(Topic::Notifications, notifications);
        let emergencies = report.take(Topic::Emergencies, emergencies);
        let hospital = report.take(Topic::HospitalData, hospital);

        self.shared.modify(|state| {
            state.patients = patients.clone();
            state.appointments = appointments.clone();
            state.users = users.clone();
            state.notifications = notifications.clone();
            state.emergencies = emergencies.clone();
            state.hospital = hospital.clone();
        });

        info!(target: STORE, msg = "Loaded", failed = report.failed.len());
        self.shared.emit(StoreEvent::Loaded(report.clone()));
        report
    }

    ///
    /// Posts a notification in the background
    ///
    fn notify(&self, notification: Notification) {
        let shared = self.shared.clone();

        self.fanout.spawn(async move {
            match shared.api.create_notification(&notification).await {
                Ok(created) => {
                    debug!(
                        target: FANOUT,
                        msg = "Notification delivered",
                        recipient = ?created.recipient_role
                    );
                    shared.toast(created.message.to_owned(), created.kind);
                    shared.update(Topic::Notifications, |state| {
                        state.notifications.insert(0, created.clone())
                    });
                }
                Err(err) => {
                    warn!(
                        target: FANOUT,
                        msg = "Notification not delivered",
                        error = err.to_string()
                    );
                }
            }
        });
    }

    pub fn doctors(&self) -> Vec<User> {
        self.snapshot().doctors().into_iter().cloned().collect()
    }

    pub fn doctor_stats(&self, doctor: &DoctorRef) -> DoctorStats {
        let state = self.snapshot();
        DoctorStats::compute(doctor, &state.patients, &state.appointments)
    }

    pub fn visible_notifications(&self, viewer: &Viewer) -> Vec<Notification> {
        self.snapshot()
            .visible_notifications(viewer)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn unread_count(&self, viewer: &Viewer) -> usize {
        self.snapshot().unread_count(viewer)
    }

    ///
    /// Creates the patient and tells the assigned doctor and the patient
    ///
    pub async fn add_patient(&self, patient: Patient) -> Result<Patient, Error> {
        let created = self
            .shared
            .api
            .create_patient(&patient)
            .await
            .map_err(|err| self.shared.fail("adding patient", err))?;

        self.shared
            .update(Topic::Patients, |state| state.patients.push(created.clone()));

        if let Some(doctor) = created.doctor.as_deref() {
            self.notify(
                Notification::new(
                    format!("New patient {} assigned to you.", created.name),
                    NotificationKind::Info,
                    RecipientRole::Doctor,
                )
                .to_recipient(Some(doctor)),
            );
            self.notify(
                Notification::new(
                    format!("You have been assigned to {}.", titled(doctor)),
                    NotificationKind::Info,
                    RecipientRole::Patient,
                )
                .to_recipient(Some(&created.name)),
            );
        }

        Ok(created)
    }

    pub async fn update_patient(&self, id: Uuid, patch: Patch) -> Result<Patient, Error> {
        let updated = self
            .shared
            .api
            .update_patient(id, &patch)
            .await
            .map_err(|err| self.shared.fail("updating patient", err))?;

        self.shared.update(Topic::Patients, |state| {
            state::replace(&mut state.patients, updated.clone())
        });
        Ok(updated)
    }

    pub async fn delete_patient(&self, id: Uuid) -> Result<(), Error> {
        self.shared
            .api
            .delete_patient(id)
            .await
            .map_err(|err| self.shared.fail("deleting patient", err))?;

        self.shared
            .update(Topic::Patients, |state| state::remove(&mut state.patients, id));
        self.shared
            .toast("Patient record deleted", NotificationKind::Info);
        Ok(())
    }

    ///
    /// Marks the patient treated and reports the doctor's workload to admins
    ///
    pub async fn treat_patient(&self, id: Uuid, doctor: &DoctorRef) -> Result<Patient, Error> {
        let mut patch = Patch::new();
        patch.insert("isTreated".to_string(), Value::Bool(true));
        patch.insert("status".to_string(), json!(PatientStatus::Treated));

        let patient = self.update_patient(id, patch).await?;

        let stats = self.doctor_stats(doctor);
        self.notify(Notification::new(
            format!(
                "Treatment completed for patient by {}{}",
                titled(&doctor.name),
                stats
            ),
            NotificationKind::Success,
            RecipientRole::Admin,
        ));

        Ok(patient)
    }

    ///
    /// Books an appointment. New appointments are always Pending.
    ///
    pub async fn add_appointment(&self, appointment: Appointment) -> Result<Appointment, Error> {
        let appointment = Appointment {
            status: AppointmentStatus::Pending,
            ..appointment
        };

        let created = self
            .shared
            .api
            .create_appointment(&appointment)
            .await
            .map_err(|err| self.shared.fail("scheduling appointment", err))?;

        self.shared.update(Topic::Appointments, |state| {
            state.appointments.push(created.clone())
        });

        self.notify(Notification::new(
            format!(
                "New appointment request from {} with {}",
                created.patient_name,
                titled(&created.doctor_name)
            ),
            NotificationKind::Info,
            RecipientRole::Admin,
        ));

        Ok(created)
    }

    ///
    /// Moves the appointment along its workflow and tells admins and the patient
    ///
    pub async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, Error> {
        let updated = self
            .shared
            .api
            .update_appointment_status(id, status)
            .await
            .map_err(|err| self.shared.fail("updating appointment status", err))?;

        self.shared.update(Topic::Appointments, |state| {
            state::replace(&mut state.appointments, updated.clone())
        });

        let doctor = DoctorRef {
            id: updated.doctor_id,
            name: updated.doctor_name.to_owned(),
        };
        let stats = self.doctor_stats(&doctor);

        let kind = match status {
            AppointmentStatus::Confirmed => NotificationKind::Success,
            _ => NotificationKind::Warning,
        };

        self.notify(Notification::new(
            format!(
                "Appointment for {} marked as {} by {}{}",
                updated.patient_name,
                status,
                titled(&doctor.name),
                stats
            ),
            kind,
            RecipientRole::Admin,
        ));
        self.notify(
            Notification::new(
                format!(
                    "Your appointment with {} has been {}.",
                    titled(&doctor.name),
                    status
                ),
                kind,
                RecipientRole::Patient,
            )
            .to_recipient(Some(&updated.patient_name)),
        );

        Ok(updated)
    }

    pub async fn update_appointment(&self, id: Uuid, patch: Patch) -> Result<Appointment, Error> {
        let updated = self
            .shared
            .api
            .update_appointment(id, &patch)
            .await
            .map_err(|err| self.shared.fail("updating appointment", err))?;

        self.shared.update(Topic::Appointments, |state| {
            state::replace(&mut state.appointments, updated.clone())
        });
        self.shared
            .toast("Appointment updated", NotificationKind::Success);
        Ok(updated)
    }

    pub async fn delete_appointment(&self, id: Uuid) -> Result<(), Error> {
        self.shared
            .api
            .delete_appointment(id)
            .await
            .map_err(|err| self.shared.fail("deleting appointment", err))?;

        self.shared.update(Topic::Appointments, |state| {
            state::remove(&mut state.appointments, id)
        });
        self.shared
            .toast("Appointment removed", NotificationKind::Info);
        Ok(())
    }

    pub async fn add_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, Error> {
        let created = self
            .shared
            .api
            .create_notification(&notification)
            .await
            .map_err(|err| self.shared.fail("adding notification", err))?;

        self.shared.update(Topic::Notifications, |state| {
            state.notifications.insert(0, created.clone())
        });
        self.shared.toast(created.message.to_owned(), created.kind);
        Ok(created)
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> Result<Notification, Error> {
        let updated = self
            .shared
            .api
            .mark_notification_read(id)
            .await
            .map_err(|err| self.shared.fail("marking notification read", err))?;

        self.shared.update(Topic::Notifications, |state| {
            state::replace(&mut state.notifications, updated.clone())
        });
        Ok(updated)
    }

    /// Returns the number of notifications the server removed
    pub async fn clear_notifications(&self) -> Result<u64, Error> {
        let deleted = self
            .shared
            .api
            .clear_notifications()
            .await
            .map_err(|err| self.shared.fail("clearing notifications", err))?;

        self.shared
            .update(Topic::Notifications, |state| state.notifications.clear());
        Ok(deleted)
    }

    ///
    /// Registers an account. An empty password is replaced by `DEFAULT_PASSWORD`.
    ///
    pub async fn add_user(&self, registration: Registration) -> Result<User, Error> {
        let registration = if registration.password.is_empty() {
            Registration {
                password: DEFAULT_PASSWORD.to_string(),
                ..registration
            }
        } else {
            registration
        };

        let created = self
            .shared
            .api
            .register(&registration)
            .await
            .map_err(|err| self.shared.fail("adding user", err))?;

        self.shared
            .update(Topic::Users, |state| state.users.push(created.clone()));
        self.shared.toast(
            format!("User {} created successfully", created.name),
            NotificationKind::Success,
        );
        Ok(created)
    }

    pub async fn update_user(&self, id: Uuid, patch: Patch) -> Result<User, Error> {
        let updated = self
            .shared
            .api
            .update_user(id, &patch)
            .await
            .map_err(|err| self.shared.fail("updating user", err))?;

        self.shared.update(Topic::Users, |state| {
            state::replace(&mut state.users, updated.clone())
        });
        self.shared
            .toast("User updated successfully", NotificationKind::Success);
        Ok(updated)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), Error> {
        self.shared
            .api
            .delete_user(id)
            .await
            .map_err(|err| self.shared.fail("deleting user", err))?;

        self.shared
            .update(Topic::Users, |state| state::remove(&mut state.users, id));
        self.shared
            .toast("User deleted successfully", NotificationKind::Info);
        Ok(())
    }

    pub async fn approve_doctor(&self, id: Uuid) -> Result<User, Error> {
        let approved = self
            .shared
            .api
            .approve_user(id)
            .await
            .map_err(|err| self.shared.fail("approving doctor", err))?;

        self.shared.update(Topic::Users, |state| {
            state::replace(&mut state.users, approved.clone())
        });
        self.shared
            .toast("Doctor approved successfully", NotificationKind::Success);

        self.notify(Notification::new(
            format!(
                "Doctor account for {} has been approved.",
                titled(&approved.name)
            ),
            NotificationKind::Success,
            RecipientRole::Admin,
        ));

        Ok(approved)
    }

    pub async fn add_emergency(&self, alert: EmergencyAlert) -> Result<EmergencyAlert, Error> {
        let created = self
            .shared
            .api
            .create_emergency(&alert)
            .await
            .map_err(|err| self.shared.fail("raising emergency alert", err))?;

        self.shared.update(Topic::Emergencies, |state| {
            state.emergencies.insert(0, created.clone())
        });
        Ok(created)
    }

    pub async fn resolve_emergency(&self, id: Uuid) -> Result<(), Error> {
        self.shared
            .api
            .resolve_emergency(id)
            .await
            .map_err(|err| self.shared.fail("resolving emergency", err))?;

        self.shared.update(Topic::Emergencies, |state| {
            state::remove(&mut state.emergencies, id)
        });
        self.shared
            .toast("Emergency case marked as resolved", NotificationKind::Success);
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, Error> {
        let session = self
            .shared
            .api
            .login(email, password)
            .await
            .map_err(|err| self.shared.fail("signing in", err))?;

        let user = session.user.clone();
        self.shared
            .update(Topic::Session, |state| state.session = Some(session.clone()));

        info!(target: STORE, msg = "Signed in", email = user.email, role = %user.role);
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), Error> {
        if self.snapshot().session.is_none() {
            return Err(Error::NotSignedIn);
        }

        let result = self.shared.api.logout().await;

        // The transport forgets its token even when the server refuses the request
        self.shared
            .update(Topic::Session, |state| state.session = None);

        result.map_err(|err| self.shared.fail("signing out", err))
    }

    ///
    /// Keeps a prescription locally and tells the patient.
    /// Must be called from within a Tokio runtime.
    ///
    pub fn add_prescription(&self, prescription: Prescription) -> Prescription {
        self.shared.update(Topic::Prescriptions, |state| {
            state.prescriptions.push(prescription.clone())
        });
        self.shared
            .toast("Prescription created successfully", NotificationKind::Success);

        self.notify(
            Notification::new(
                format!(
                    "New prescription received from {}",
                    titled(&prescription.doctor_name)
                ),
                NotificationKind::Success,
                RecipientRole::Patient,
            )
            .to_recipient(Some(&prescription.patient_name)),
        );

        prescription
    }

    ///
    /// Keeps a report locally and tells the patient.
    /// Must be called from within a Tokio runtime.
    ///
    pub fn upload_medical_report(&self, report: MedicalReport) -> MedicalReport {
        self.shared.update(Topic::MedicalReports, |state| {
            state.medical_reports.push(report.clone())
        });
        self.shared
            .toast("Medical report uploaded", NotificationKind::Success);

        self.notify(
            Notification::new(
                format!(
                    "New medical report uploaded by {}",
                    titled(&report.doctor_name)
                ),
                NotificationKind::Info,
                RecipientRole::Patient,
            )
            .to_recipient(Some(&report.patient_name)),
        );

        report
    }

    pub fn update_availability(&self, doctor_name: &str, schedule: Schedule) {
        self.shared.update(Topic::Availability, |state| {
            state
                .availability
                .insert(doctor_name.to_string(), schedule.clone());
        });
        self.shared
            .toast("Availability updated successfully", NotificationKind::Success);
    }
}

///
/// "Smith" becomes "Dr. Smith", names already carrying the title are kept
///
fn titled(name: &str) -> String {
    let name = name.trim();
    let lower = name.to_lowercase();

    if lower.starts_with("dr.") || lower.starts_with("dr ") {
        name.to_string()
    } else {
        format!("Dr. {name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctor_titles() {
        assert_eq!(titled("Smith"), "Dr. Smith");
        assert_eq!(titled("Dr. Smith"), "Dr. Smith");
        assert_eq!(titled(" dr jones "), "dr jones");
        assert_eq!(titled("Drew"), "Dr. Drew");
    }

    #[test]
    fn load_report_collects_failures() {
        let mut report = LoadReport::default();

        let patients: Vec<Patient> = report.take(Topic::Patients, Ok(vec![Patient::new("Ann")]));
        assert_eq!(patients.len(), 1);

        let users: Vec<User> = report.take(
            Topic::Users,
            Err(ApiError::Rejected {
                status: 500,
                message: "Database Connection Error".to_string(),
            }),
        );
        assert!(users.is_empty());

        assert!(!report.is_complete());
        assert_eq!(
            report.failed,
            vec![(Topic::Users, "Database Connection Error".to_string())]
        );
    }
}
