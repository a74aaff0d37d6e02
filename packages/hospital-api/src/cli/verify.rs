use crate::api::{create_account, AppState};
use crate::error::Error;
use crate::log::STORE;
use crate::seed::DEMO_PASSWORD;
use chrono::Utc;
use hospital_model::{Role, User};
use tracing::{debug, error, info};

const SPECIALTY: &str = "Cardiology";
const EXPERIENCE: &str = "10 Years";

#[derive(clap::Args, Clone, Debug)]
#[command(version, about, long_about)]
///
/// Check that accounts persist in the configured document store
///
/// Saves one account per role, reads each back, then deletes them.
///
pub struct Verify {
    /// Leave the test accounts in place
    #[arg(short, long, default_value_t = false)]
    keep: bool,
}

impl Verify {
    pub fn new(keep: bool) -> Self {
        Verify { keep }
    }

    pub async fn run(&self, state: &AppState) -> Result<(), Error> {
        let stamp = Utc::now().timestamp_millis();
        info!(target: STORE, msg = "Starting persistence verification", stamp);

        let mut created = Vec::new();
        for user in test_accounts(stamp) {
            let saved = create_account(state, &user, DEMO_PASSWORD).await?;
            info!(target: STORE, msg = "Saved", role = %saved.role, email = saved.email);
            created.push(saved);
        }

        let result = verify_all(state, &created).await;

        if !self.keep {
            for user in &created {
                if let Some(id) = user.id {
                    state.users.delete(id).await?;
                    debug!(target: STORE, msg = "Deleted test account", email = user.email);
                }
            }
        }

        match &result {
            Ok(()) => info!(msg = "Verification successful, all roles persist correctly"),
            Err(err) => error!(msg = "Verification failed", error = err.to_string()),
        }
        result
    }
}

async fn verify_all(state: &AppState, created: &[User]) -> Result<(), Error> {
    for saved in created {
        let found = match saved.id {
            Some(id) => state.users.get(id).await?,
            None => None,
        };

        let Some(found) = found else {
            return Err(failure(saved, "not found after save"));
        };

        info!(target: STORE, msg = "Verified", role = %found.role, id = ?found.id);

        if found.is_doctor()
            && (found.specialty.as_deref() != Some(SPECIALTY)
                || found.experience.as_deref() != Some(EXPERIENCE))
        {
            return Err(failure(saved, "doctor fields missing or incorrect"));
        }
    }
    Ok(())
}

fn failure(user: &User, reason: &str) -> Error {
    Error::Verification {
        email: user.email.to_owned(),
        reason: reason.to_string(),
    }
}

fn test_accounts(stamp: i64) -> [User; 3] {
    let mut doctor = User::new(
        &format!("Test Doctor {stamp}"),
        &format!("doc_{stamp}@test.com"),
        Role::Doctor,
    );
    doctor.specialty = Some(SPECIALTY.to_string());
    doctor.experience = Some(EXPERIENCE.to_string());

    [
        User::new(
            &format!("Test Admin {stamp}"),
            &format!("admin_{stamp}@test.com"),
            Role::Admin,
        ),
        doctor,
        User::new(
            &format!("Test User {stamp}"),
            &format!("user_{stamp}@test.com"),
            Role::User,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn state() -> AppState {
        let auth = AuthConfig {
            hash_iterations: 1000,
            ..Default::default()
        };
        AppState::new(Arc::new(MemoryStore::new()), auth)
    }

    #[tokio::test]
    async fn verification_cleans_up() {
        let state = state();
        Verify::new(false).run(&state).await.unwrap();
        assert!(state.users.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn verification_can_keep_accounts() {
        let state = state();
        Verify::new(true).run(&state).await.unwrap();

        let users = state.users.all().await.unwrap();
        assert_eq!(users.len(), 3);
        assert!(users.iter().any(|u| u.role == Role::Doctor
            && u.specialty.as_deref() == Some(SPECIALTY)));
    }
}
