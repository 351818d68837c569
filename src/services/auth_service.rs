use std::sync::Arc;

use crate::auth::{self, SessionManager};
use crate::error::ApiError;
use crate::store::UserStore;

const LOGIN_FAILED: &str = "Login failed";

/// Credential checks for the login endpoint.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    sessions: SessionManager,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, sessions: SessionManager) -> Self {
        Self { store, sessions }
    }

    /// Verify `email`/`password` and return a signed session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let user = self.store.get_by_email(email).await?.ok_or_else(|| {
            tracing::warn!("Login failed: no user with email '{}'", email);
            ApiError::unauthorized(LOGIN_FAILED)
        })?;

        let Some(hash) = user.pwd_hash.clone() else {
            tracing::warn!("Login failed: user {} has no password set", user.id);
            return Err(ApiError::unauthorized(LOGIN_FAILED));
        };

        // bcrypt blocks; run it on the blocking pool.
        let password = password.to_owned();
        let matches = tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
            .await
            .map_err(|e| ApiError::internal(format!("password check aborted: {}", e)))?;

        if !matches {
            tracing::warn!("Login failed: wrong password for user {}", user.id);
            return Err(ApiError::unauthorized(LOGIN_FAILED));
        }

        let token = self.sessions.issue(&user)?;
        tracing::info!("User {} ({}) logged in", user.id, user.email);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{User, UserRole};
    use crate::store::JsonUserStore;
    use axum::http::StatusCode;

    async fn service() -> AuthService {
        let store = Arc::new(JsonUserStore::in_memory());
        store
            .insert(User {
                id: 0,
                name: "Ada".into(),
                email: "ada@example.com".into(),
                role: UserRole::Admin,
                pwd_hash: Some(auth::hash_password("correct horse", 4).unwrap()),
            })
            .await
            .unwrap();
        store
            .insert(User {
                id: 0,
                name: "NoPass".into(),
                email: "nopass@example.com".into(),
                role: UserRole::Standard,
                pwd_hash: None,
            })
            .await
            .unwrap();
        AuthService::new(store, SessionManager::new(&AppConfig::test()))
    }

    #[tokio::test]
    async fn correct_credentials_yield_verifiable_token() {
        let svc = service().await;
        let token = svc.login("ada@example.com", "correct horse").await.unwrap();
        let claims = SessionManager::new(&AppConfig::test()).verify(&token).unwrap();
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let svc = service().await;
        for (email, password) in [
            ("ada@example.com", "wrong"),
            ("ghost@example.com", "correct horse"),
            ("nopass@example.com", ""),
        ] {
            let err = svc.login(email, password).await.unwrap_err();
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED, "{email}");
            assert_eq!(err.to_string(), LOGIN_FAILED);
        }
    }
}
