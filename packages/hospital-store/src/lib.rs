//! Client-side state for the hospital API.
//!
//! `HospitalStore` holds every collection as one immutable snapshot, applies
//! mutations only after the server confirms them and broadcasts a
//! `StoreEvent` for each change.
//!
//! ```no_run
//! use hospital_store::{HospitalStore, HttpApi};
//!
//! # async fn run() -> Result<(), hospital_store::error::ApiError> {
//! let store = HospitalStore::new(HttpApi::from_env()?);
//! let report = store.load().await;
//! println!("{} patients, complete: {}", store.snapshot().patients.len(), report.is_complete());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod log;
pub mod records;
pub mod state;
pub mod stats;
pub mod store;

pub use api::{HospitalApi, HttpApi, Patch, Registration, Session};
pub use error::{ApiError, Error};
pub use records::{MedicalReport, Medicine, Prescription, Schedule};
pub use state::HospitalState;
pub use stats::{DoctorStats, Focus};
pub use store::{HospitalStore, LoadReport, StoreEvent, Toast, Topic, DEFAULT_PASSWORD};
