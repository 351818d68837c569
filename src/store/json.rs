use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{StoreError, UserStore};
use crate::models::User;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Database {
    users: Vec<User>,
}

/// Users held in memory, optionally mirrored to a JSON file that is
/// rewritten after every mutation.
pub struct JsonUserStore {
    path: Option<PathBuf>,
    db: RwLock<Database>,
}

impl JsonUserStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            db: RwLock::new(Database::default()),
        }
    }

    /// Load `path` if it exists, otherwise start empty and create it on the
    /// first write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let db = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Database::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Database::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Loaded {} users from {}", db.users.len(), path.display());

        Ok(Self {
            path: Some(path),
            db: RwLock::new(db),
        })
    }

    async fn persist(&self, db: &Database) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(db)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Write `next` out and only then make it the live state.
    async fn commit(&self, db: &mut Database, next: Database) -> Result<(), StoreError> {
        self.persist(&next).await?;
        *db = next;
        Ok(())
    }
}

fn next_id(users: &[User]) -> Result<i64, StoreError> {
    users
        .iter()
        .map(|u| u.id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(StoreError::IdsExhausted)
}

#[async_trait]
impl UserStore for JsonUserStore {
    async fn get_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.db.read().await.users.clone())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let db = self.db.read().await;
        Ok(db
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.db.read().await.users.iter().any(|u| u.id == id))
    }

    async fn insert(&self, mut user: User) -> Result<User, StoreError> {
        let mut db = self.db.write().await;

        if db.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::DuplicateEmail(user.email));
        }
        if user.id <= 0 || db.users.iter().any(|u| u.id == user.id) {
            user.id = next_id(&db.users)?;
        }

        let mut next = db.clone();
        next.users.push(user.clone());
        self.commit(&mut db, next).await?;
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<(), StoreError> {
        let mut db = self.db.write().await;

        if db
            .users
            .iter()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let mut next = db.clone();
        let slot = next
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::NotFound(user.id))?;

        let pwd_hash = user.pwd_hash.or_else(|| slot.pwd_hash.take());
        *slot = User { pwd_hash, ..user };

        self.commit(&mut db, next).await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut db = self.db.write().await;
        if !db.users.iter().any(|u| u.id == id) {
            return Err(StoreError::NotFound(id));
        }

        let mut next = db.clone();
        next.users.retain(|u| u.id != id);
        self.commit(&mut db, next).await
    }
}
