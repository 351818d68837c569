use async_trait::async_trait;

use crate::auth::SessionManager;
use crate::error::ApiError;

use super::pipeline::{RequestView, Stage};

/// Lets a request through only when its session belongs to an admin.
///
/// No or invalid session → 401. Valid session without the admin role → 403.
pub struct AdminGate {
    sessions: SessionManager,
}

impl AdminGate {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl Stage for AdminGate {
    fn name(&self) -> &'static str {
        "admin"
    }

    async fn check(&self, request: &RequestView) -> Result<(), ApiError> {
        let session = self.sessions.session_from_headers(request.headers())?;

        if !session.is_admin() {
            tracing::warn!(
                "User {} ({}) denied admin access to {}",
                session.id,
                session.email,
                request.path()
            );
            return Err(ApiError::forbidden("Admin access required"));
        }

        Ok(())
    }
}
