use async_trait::async_trait;
use hospital_api::api::{router, AppState};
use hospital_api::config::{AuthConfig, ServerConfig};
use hospital_api::store::MemoryStore;
use hospital_model::{
    Appointment, AppointmentStatus, DoctorRef, EmergencyAlert, HospitalData, Notification,
    NotificationKind, Patient, PatientStatus, RecipientRole, Role, User, UserStatus, Viewer,
};
use hospital_store::{
    ApiError, Error, HospitalApi, HospitalStore, HttpApi, Medicine, Patch, Prescription,
    Registration, Session, StoreEvent, Toast, Topic,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

///
/// Serves a fresh API over an in-memory store and returns its base url
///
async fn serve() -> String {
    let auth = AuthConfig {
        hash_iterations: 1000,
        ..Default::default()
    };
    let state = AppState::new(Arc::new(MemoryStore::new()), auth);
    let app = router(state, &ServerConfig::default()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{address}/api")
}

async fn store() -> HospitalStore<HttpApi> {
    HospitalStore::new(HttpApi::new(&serve().await).unwrap())
}

fn patch(value: Value) -> Patch {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn toasts(events: &mut tokio::sync::broadcast::Receiver<StoreEvent>) -> Vec<Toast> {
    let mut toasts = vec![];
    while let Ok(event) = events.try_recv() {
        if let StoreEvent::Toast(toast) = event {
            toasts.push(toast);
        }
    }
    toasts
}

#[tokio::test]
async fn load_fetches_every_collection() {
    let store = store().await;

    let report = store.load().await;
    assert!(report.is_complete());

    let state = store.snapshot();
    assert!(state.patients.is_empty());
    assert!(!state.hospital.blood_bank.is_empty());
}

#[tokio::test]
async fn unreachable_server_leaves_collections_empty() {
    let store = HospitalStore::new(HttpApi::new("http://127.0.0.1:1/api").unwrap());
    let mut events = store.subscribe();

    let report = store.load().await;
    assert_eq!(report.failed.len(), 6);
    assert!(store.snapshot().users.is_empty());

    let result = store.add_patient(Patient::new("Jane Roe")).await;
    assert!(matches!(result, Err(Error::Api(ApiError::Connection(_)))));

    let toasts = toasts(&mut events);
    assert_eq!(
        toasts.last(),
        Some(&Toast {
            message: "Connection error while adding patient".to_string(),
            kind: NotificationKind::Error,
        })
    );
}

#[tokio::test]
async fn adding_a_patient_notifies_doctor_and_patient() {
    let store = store().await;
    let mut events = store.subscribe();

    let patient = store
        .add_patient(Patient::new("Jane Roe").with_doctor("Smith"))
        .await
        .unwrap();
    assert!(patient.id.is_some());
    assert_eq!(store.snapshot().patients, vec![patient]);
    assert_eq!(events.recv().await.unwrap(), StoreEvent::Changed(Topic::Patients));

    store.settle().await;

    let doctor = store.visible_notifications(&Viewer::named(Role::Doctor, "Dr. Smith"));
    assert_eq!(doctor.len(), 1);
    assert_eq!(doctor[0].message, "New patient Jane Roe assigned to you.");

    let other_doctor = store.visible_notifications(&Viewer::named(Role::Doctor, "Dr. Jones"));
    assert!(other_doctor.is_empty());

    let patient = store.visible_notifications(&Viewer::named(Role::User, "Jane Roe"));
    assert_eq!(patient.len(), 1);
    assert_eq!(patient[0].message, "You have been assigned to Dr. Smith.");
    assert_eq!(store.unread_count(&Viewer::named(Role::User, "Jane Roe")), 1);
}

#[tokio::test]
async fn failed_update_leaves_the_snapshot_alone() {
    let store = store().await;
    let mut events = store.subscribe();

    let result = store
        .update_patient(Uuid::new_v4(), patch(json!({"condition": "Flu"})))
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(store.snapshot().patients.is_empty());

    assert_eq!(
        toasts(&mut events),
        vec![Toast {
            message: "Patient not found".to_string(),
            kind: NotificationKind::Error,
        }]
    );
}

#[tokio::test]
async fn treating_a_patient_reports_doctor_stats() {
    let store = store().await;

    let patient = store
        .add_patient(Patient::new("Jane Roe").with_doctor("Dr. Smith"))
        .await
        .unwrap();
    let id = patient.id.unwrap();

    let treated = store
        .treat_patient(id, &DoctorRef::named("Smith"))
        .await
        .unwrap();
    assert!(treated.is_treated);
    assert_eq!(treated.status, PatientStatus::Treated);
    assert_eq!(store.snapshot().patient(id), Some(&treated));

    store.settle().await;

    let admin = store.visible_notifications(&Viewer::role(Role::Admin));
    assert_eq!(admin.len(), 1);
    assert_eq!(
        admin[0].message,
        "Treatment completed for patient by Dr. Smith\nStats:\n- Completed Tasks: 1\n- Remaining Work: 0\n- Current Focus: None"
    );
}

#[tokio::test]
async fn appointment_workflow() {
    let store = store().await;

    let booked = store
        .add_appointment(Appointment {
            status: AppointmentStatus::Completed,
            ..Appointment::new("Jane Roe", "Dr. Smith", "2026-05-01", "10:00")
        })
        .await
        .unwrap();
    assert_eq!(booked.status, AppointmentStatus::Pending);
    let id = booked.id.unwrap();

    let stats = store.doctor_stats(&DoctorRef::named("Smith"));
    assert_eq!(stats.remaining, 1);

    let confirmed = store
        .update_appointment_status(id, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
    assert_eq!(
        store.snapshot().appointment(id).map(|a| a.status),
        Some(AppointmentStatus::Confirmed)
    );

    store.settle().await;

    let admin = store.visible_notifications(&Viewer::role(Role::Admin));
    assert_eq!(admin.len(), 2);
    assert!(admin
        .iter()
        .any(|n| n.message == "New appointment request from Jane Roe with Dr. Smith"));
    let confirmed_by = "Appointment for Jane Roe marked as Confirmed by Dr. Smith\nStats:\n";
    assert!(admin.iter().any(|n| n.kind == NotificationKind::Success
        && n.message.starts_with(confirmed_by)
        && n.message.contains("- Completed Tasks: 1\n")));

    let patient = store.visible_notifications(&Viewer::named(Role::User, "Jane Roe"));
    assert_eq!(patient.len(), 1);
    assert_eq!(
        patient[0].message,
        "Your appointment with Dr. Smith has been Confirmed."
    );

    let updated = store
        .update_appointment(id, patch(json!({"time": "11:30"})))
        .await
        .unwrap();
    assert_eq!(updated.time, "11:30");

    store.delete_appointment(id).await.unwrap();
    assert!(store.snapshot().appointments.is_empty());
}

#[tokio::test]
async fn illegal_transition_is_rejected() {
    let store = store().await;
    let mut events = store.subscribe();

    let booked = store
        .add_appointment(Appointment::new("Jane Roe", "Dr. Smith", "2026-05-01", "10:00"))
        .await
        .unwrap();
    let id = booked.id.unwrap();

    store
        .update_appointment_status(id, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    store
        .update_appointment_status(id, AppointmentStatus::Completed)
        .await
        .unwrap();
    store.settle().await;
    toasts(&mut events);

    let err = store
        .update_appointment_status(id, AppointmentStatus::Confirmed)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(
        store.snapshot().appointment(id).map(|a| a.status),
        Some(AppointmentStatus::Completed)
    );

    assert_eq!(
        toasts(&mut events),
        vec![Toast {
            message: "Appointment cannot move from Completed to Confirmed".to_string(),
            kind: NotificationKind::Error,
        }]
    );
}

#[tokio::test]
async fn concurrent_patient_updates_last_write_wins() {
    let store = store().await;

    let patient = store.add_patient(Patient::new("Jane Roe")).await.unwrap();
    let id = patient.id.unwrap();

    let (stable, monitoring) = tokio::join!(
        store.update_patient(id, patch(json!({"status": "Stable"}))),
        store.update_patient(id, patch(json!({"status": "Monitoring"}))),
    );
    let written = [stable.unwrap().status, monitoring.unwrap().status];

    let on_server = store.api().patients().await.unwrap();
    assert!(written.contains(&on_server[0].status));
}

#[tokio::test]
async fn notifications_are_added_read_and_cleared() {
    let store = store().await;
    let mut events = store.subscribe();

    let notification = store
        .add_notification(Notification::new(
            "Blood bank low",
            NotificationKind::Warning,
            RecipientRole::Admin,
        ))
        .await
        .unwrap();

    assert_eq!(
        toasts(&mut events),
        vec![Toast {
            message: "Blood bank low".to_string(),
            kind: NotificationKind::Warning,
        }]
    );
    assert_eq!(store.unread_count(&Viewer::role(Role::Admin)), 1);
    assert_eq!(store.unread_count(&Viewer::role(Role::Doctor)), 0);

    let read = store
        .mark_notification_read(notification.id.unwrap())
        .await
        .unwrap();
    assert!(read.read);
    assert_eq!(store.unread_count(&Viewer::role(Role::Admin)), 0);

    assert_eq!(store.clear_notifications().await.unwrap(), 1);
    assert!(store.snapshot().notifications.is_empty());
    assert!(store.api().notifications().await.unwrap().is_empty());
}

#[tokio::test]
async fn accounts_and_sessions() {
    let store = store().await;

    let user = store
        .add_user(Registration {
            name: "Dr. Who".to_string(),
            email: "who@example.com".to_string(),
            password: String::new(),
            role: Some(Role::Doctor),
        })
        .await
        .unwrap();
    let id = user.id.unwrap();
    assert_eq!(store.doctors(), vec![user.clone()]);

    let duplicate = store
        .add_user(Registration {
            name: "Again".to_string(),
            email: "who@example.com".to_string(),
            password: "secret".to_string(),
            role: None,
        })
        .await;
    assert_eq!(duplicate.unwrap_err().status(), Some(400));
    assert_eq!(store.snapshot().users.len(), 1);

    let suspended = store
        .update_user(id, patch(json!({"status": "Pending"})))
        .await
        .unwrap();
    assert_eq!(suspended.status, UserStatus::Pending);

    let approved = store.approve_doctor(id).await.unwrap();
    assert_eq!(approved.status, UserStatus::Active);
    assert_eq!(store.snapshot().user(id), Some(&approved));

    assert!(matches!(store.logout().await, Err(Error::NotSignedIn)));

    let signed_in = store.login("who@example.com", "password123").await.unwrap();
    assert_eq!(signed_in.id, Some(id));
    assert!(store.snapshot().session.is_some());
    assert!(store.api().token().is_some());

    store.logout().await.unwrap();
    assert!(store.snapshot().session.is_none());
    assert!(store.api().token().is_none());

    store.delete_user(id).await.unwrap();
    assert!(store.doctors().is_empty());

    store.settle().await;
    let admin = store.visible_notifications(&Viewer::role(Role::Admin));
    assert_eq!(
        admin[0].message,
        "Doctor account for Dr. Who has been approved."
    );
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let store = store().await;

    store
        .add_user(Registration {
            name: "Ann Lee".to_string(),
            email: "ann@example.com".to_string(),
            password: "secret".to_string(),
            role: None,
        })
        .await
        .unwrap();

    let err = store.login("ann@example.com", "nope").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(store.snapshot().session.is_none());
}

#[tokio::test]
async fn refused_logout_still_signs_out() {
    let store = store().await;

    let user = store
        .add_user(Registration {
            name: "Ann Lee".to_string(),
            email: "ann@example.com".to_string(),
            password: String::new(),
            role: None,
        })
        .await
        .unwrap();
    store.login("ann@example.com", "password123").await.unwrap();

    // Deleting the account revokes its sessions on the server
    store.delete_user(user.id.unwrap()).await.unwrap();

    let mut events = store.subscribe();
    let err = store.logout().await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    assert!(store.snapshot().session.is_none());
    assert!(store.api().token().is_none());
    assert!(matches!(
        events.try_recv(),
        Ok(StoreEvent::Changed(Topic::Session))
    ));

    assert!(matches!(store.logout().await, Err(Error::NotSignedIn)));
}

#[tokio::test]
async fn emergencies_are_raised_and_resolved() {
    let store = store().await;

    let alert = store
        .add_emergency(EmergencyAlert::new(
            "Cardiac Arrest",
            "Jane Roe",
            "Ward 3",
            "09:12",
        ))
        .await
        .unwrap();
    assert_eq!(store.snapshot().emergencies.len(), 1);

    store.resolve_emergency(alert.id.unwrap()).await.unwrap();
    assert!(store.snapshot().emergencies.is_empty());

    store.load().await;
    assert!(store.snapshot().emergencies.is_empty());
}

#[tokio::test]
async fn local_records_notify_the_patient() {
    let store = store().await;

    let prescription = store.add_prescription(Prescription::new(
        "Jane Roe",
        "Dr. Smith",
        vec![Medicine {
            name: "Amoxicillin".to_string(),
            dosage: "500mg".to_string(),
            duration: "7 days".to_string(),
        }],
    ));
    assert_eq!(store.snapshot().prescriptions, vec![prescription]);

    store.update_availability("Dr. Smith", Default::default());
    assert!(store.snapshot().availability.contains_key("Dr. Smith"));

    store.settle().await;

    let patient = store.visible_notifications(&Viewer::named(Role::User, "Jane Roe"));
    assert_eq!(patient.len(), 1);
    assert_eq!(patient[0].message, "New prescription received from Dr. Smith");

    // Local records survive a reload
    store.load().await;
    assert_eq!(store.snapshot().prescriptions.len(), 1);
}

///
/// Delegates to `HttpApi` but can never post a notification
///
struct NoNotifications(HttpApi);

#[async_trait]
impl HospitalApi for NoNotifications {
    async fn patients(&self) -> Result<Vec<Patient>, ApiError> {
        self.0.patients().await
    }

    async fn create_patient(&self, patient: &Patient) -> Result<Patient, ApiError> {
        self.0.create_patient(patient).await
    }

    async fn update_patient(&self, id: Uuid, patch: &Patch) -> Result<Patient, ApiError> {
        self.0.update_patient(id, patch).await
    }

    async fn delete_patient(&self, id: Uuid) -> Result<(), ApiError> {
        self.0.delete_patient(id).await
    }

    async fn appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        self.0.appointments().await
    }

    async fn create_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<Appointment, ApiError> {
        self.0.create_appointment(appointment).await
    }

    async fn update_appointment(&self, id: Uuid, patch: &Patch) -> Result<Appointment, ApiError> {
        self.0.update_appointment(id, patch).await
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, ApiError> {
        self.0.update_appointment_status(id, status).await
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), ApiError> {
        self.0.delete_appointment(id).await
    }

    async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.0.users().await
    }

    async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        self.0.register(registration).await
    }

    async fn update_user(&self, id: Uuid, patch: &Patch) -> Result<User, ApiError> {
        self.0.update_user(id, patch).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), ApiError> {
        self.0.delete_user(id).await
    }

    async fn approve_user(&self, id: Uuid) -> Result<User, ApiError> {
        self.0.approve_user(id).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        self.0.login(email, password).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.0.logout().await
    }

    async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.0.notifications().await
    }

    async fn create_notification(
        &self,
        _notification: &Notification,
    ) -> Result<Notification, ApiError> {
        Err(ApiError::Rejected {
            status: 503,
            message: "Database Connection Error".to_string(),
        })
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<Notification, ApiError> {
        self.0.mark_notification_read(id).await
    }

    async fn clear_notifications(&self) -> Result<u64, ApiError> {
        self.0.clear_notifications().await
    }

    async fn emergencies(&self) -> Result<Vec<EmergencyAlert>, ApiError> {
        self.0.emergencies().await
    }

    async fn create_emergency(&self, alert: &EmergencyAlert) -> Result<EmergencyAlert, ApiError> {
        self.0.create_emergency(alert).await
    }

    async fn resolve_emergency(&self, id: Uuid) -> Result<(), ApiError> {
        self.0.resolve_emergency(id).await
    }

    async fn hospital_data(&self) -> Result<HospitalData, ApiError> {
        self.0.hospital_data().await
    }
}

#[tokio::test]
async fn fanout_failure_never_fails_the_mutation() {
    let api = NoNotifications(HttpApi::new(&serve().await).unwrap());
    let store = HospitalStore::new(api);

    let patient = store
        .add_patient(Patient::new("Jane Roe").with_doctor("Dr. Smith"))
        .await
        .unwrap();
    store.settle().await;

    assert_eq!(store.snapshot().patients, vec![patient]);
    assert!(store.snapshot().notifications.is_empty());

    // The explicit call does surface the failure
    let result = store
        .add_notification(Notification::new(
            "hello",
            NotificationKind::Info,
            RecipientRole::All,
        ))
        .await;
    assert_eq!(result.unwrap_err().status(), Some(503));
}
