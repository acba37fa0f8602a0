use std::sync::Arc;

use bk_studio::{Session, Studio};
use tokio::sync::Mutex;

/// Shared handler state: one studio and one logical session.
///
/// Requests that touch the session take its lock for their whole duration,
/// so session-scoped operations are serialized.
#[derive(Clone)]
pub struct AppState {
    pub studio: Arc<Studio>,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(studio: Arc<Studio>) -> Self {
        let session = studio.new_session();
        Self {
            studio,
            session: Arc::new(Mutex::new(session)),
        }
    }
}
