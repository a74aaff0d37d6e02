use crate::api::{create_account, AppState};
use crate::error::{AuthError, Error};
use crate::log::SEED;
use hospital_model::{Role, User, UserStatus};
use tracing::{debug, info};

/// Password shared by every demo account
pub const DEMO_PASSWORD: &str = "password123";

///
/// The accounts a fresh installation can be seeded with
///
pub fn demo_accounts() -> Vec<User> {
    let mut doctor = User::new("Dr. Smith", "smith@hospital.com", Role::Doctor);
    doctor.specialty = Some("Family Medicine".to_string());
    doctor.block = Some("A-1".to_string());

    vec![
        User::new("Admin User", "admin@hospital.com", Role::Admin),
        User::new("Super Admin", "admin@ganeshhospital.com", Role::Admin),
        doctor,
        User::new("John Patient", "john@gmail.com", Role::User),
    ]
    .into_iter()
    .map(|user| User {
        status: UserStatus::Active,
        ..user
    })
    .collect()
}

///
/// Creates the demo accounts, skipping any e-mail already registered.
/// Returns the number of accounts created.
///
pub async fn demo_users(state: &AppState) -> Result<u64, Error> {
    let mut created = 0;

    for user in demo_accounts() {
        match create_account(state, &user, DEMO_PASSWORD).await {
            Ok(_) => {
                debug!(target: SEED, msg = "Seeded account", email = user.email);
                created += 1;
            }
            Err(Error::Auth(AuthError::UserExists)) => {
                debug!(target: SEED, msg = "Account exists", email = user.email);
            }
            Err(err) => return Err(err),
        }
    }

    info!(target: SEED, msg = "Demo accounts seeded", created);
    Ok(created)
}
