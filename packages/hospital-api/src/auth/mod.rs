mod password;
mod session;

pub use password::{hash_password_in_background, verify_password_in_background};
pub use session::SessionManager;

/// Document field holding the encoded password hash of a user
pub const PASSWORD_HASH_FIELD: &str = "passwordHash";

/// Request field carrying a plain-text password
pub const PASSWORD_FIELD: &str = "password";
