use std::sync::Arc;

use crate::auth;
use crate::error::ApiError;
use crate::models::{PublicUser, User, UserInput};
use crate::store::UserStore;

const USER_NOT_FOUND: &str = "User not found";

/// User CRUD on top of the store.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn get_all(&self) -> Result<Vec<PublicUser>, ApiError> {
        let users = self.store.get_all().await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    pub async fn add_one(&self, input: UserInput) -> Result<PublicUser, ApiError> {
        let user = self.to_record(input).await?;
        let created = self.store.insert(user).await?;
        tracing::info!("Created user {} ({})", created.id, created.email);
        Ok(created.into())
    }

    pub async fn update_one(&self, input: UserInput) -> Result<(), ApiError> {
        if !self.store.exists(input.id).await? {
            return Err(ApiError::not_found(USER_NOT_FOUND));
        }
        let user = self.to_record(input).await?;
        let id = user.id;
        self.store.update(user).await?;
        tracing::info!("Updated user {}", id);
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        if !self.store.exists(id).await? {
            return Err(ApiError::not_found(USER_NOT_FOUND));
        }
        self.store.delete(id).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Create the user only when the email is not taken yet.
    pub async fn ensure_admin(&self, input: UserInput) -> Result<bool, ApiError> {
        if self.store.get_by_email(&input.email).await?.is_some() {
            return Ok(false);
        }
        self.add_one(input).await?;
        Ok(true)
    }

    async fn to_record(&self, input: UserInput) -> Result<User, ApiError> {
        let pwd_hash = match input.password {
            Some(password) if !password.is_empty() => {
                let cost = self.bcrypt_cost;
                let hash = tokio::task::spawn_blocking(move || auth::hash_password(&password, cost))
                    .await
                    .map_err(|e| ApiError::internal(format!("password hashing aborted: {}", e)))?
                    .map_err(|e| ApiError::internal(format!("password hashing failed: {}", e)))?;
                Some(hash)
            }
            _ => None,
        };

        Ok(User {
            id: input.id,
            name: input.name,
            email: input.email,
            role: input.role,
            pwd_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::store::JsonUserStore;
    use axum::http::StatusCode;

    fn input(id: i64, email: &str) -> UserInput {
        UserInput {
            id,
            name: "Grace".into(),
            email: email.into(),
            role: UserRole::Standard,
            password: Some("pw".into()),
        }
    }

    fn service() -> (UserService, Arc<JsonUserStore>) {
        let store = Arc::new(JsonUserStore::in_memory());
        (UserService::new(store.clone(), 4), store)
    }

    #[tokio::test]
    async fn add_hashes_password_and_hides_it() {
        let (svc, store) = service();
        let created = svc.add_one(input(0, "grace@example.com")).await.unwrap();
        assert_eq!(created.id, 1);

        let stored = store.get_by_email("grace@example.com").await.unwrap().unwrap();
        let hash = stored.pwd_hash.expect("hash stored");
        assert!(auth::verify_password("pw", &hash));
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let (svc, _) = service();
        svc.add_one(input(0, "grace@example.com")).await.unwrap();
        let err = svc.add_one(input(0, "grace@example.com")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn update_and_delete_missing_user_is_not_found() {
        let (svc, _) = service();
        let err = svc.update_one(input(9, "x@example.com")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), USER_NOT_FOUND);

        let err = svc.delete(9).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let (svc, _) = service();
        let mut admin = input(0, "root@example.com");
        admin.role = UserRole::Admin;
        assert!(svc.ensure_admin(admin.clone()).await.unwrap());
        assert!(!svc.ensure_admin(admin).await.unwrap());
        assert_eq!(svc.get_all().await.unwrap().len(), 1);
    }
}
