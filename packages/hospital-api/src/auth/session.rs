use crate::log::AUTHENTICATION;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

const TOKEN_LEN: usize = 32;

#[derive(Clone, Copy, Debug)]
struct Session {
    user_id: Uuid,
    last_seen: Instant,
}

///
/// In-process bearer sessions.
///
/// A session expires once it has been idle for the configured ttl. Expired
/// sessions are removed when their token is next used or when another session
/// is issued. Sessions do not survive a restart.
///
#[derive(Debug)]
pub struct SessionManager {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        SessionManager {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn issue(&self, user_id: Uuid) -> String {
        let token = hex::encode(rand::random::<[u8; TOKEN_LEN]>());

        let session = Session {
            user_id,
            last_seen: Instant::now(),
        };

        let mut sessions = self.sessions.write().await;

        // Abandoned tokens are never resolved again, drop them here
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen.elapsed() < self.ttl);
        let expired = before - sessions.len();

        sessions.insert(token.clone(), session);

        debug!(target: AUTHENTICATION, msg = "Session issued", %user_id, expired);
        token
    }

    ///
    /// Returns the user holding the token and refreshes its idle timer
    ///
    pub async fn resolve(&self, token: &str) -> Option<Uuid> {
        let mut sessions = self.sessions.write().await;

        let session = sessions.get_mut(token)?;

        if session.last_seen.elapsed() >= self.ttl {
            let user_id = session.user_id;
            sessions.remove(token);
            debug!(target: AUTHENTICATION, msg = "Session expired", %user_id);
            return None;
        }

        session.last_seen = Instant::now();
        Some(session.user_id)
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Ends every session of a user, used when the account is deleted
    pub async fn revoke_user(&self, user_id: Uuid) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.user_id != user_id);
        before - sessions.len()
    }
}
