//! Persistence: in-process storage backing the user repository.
//!
//! [`InMemoryUserRepository`] keeps plain rows rather than entities and rehydrates a
//! [`User`] on every read, the way a database-backed repository would.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{DomainError, User, UserId, UserRepository};

/// Errors produced by repositories.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepoError {
    /// The addressed row does not exist.
    #[error("{entity} with id '{id}' was not found")]
    NotFound { entity: &'static str, id: String },

    /// A stored row no longer passes domain validation.
    #[error("stored row is invalid: {0}")]
    Corrupt(#[from] DomainError),

    /// The storage backend could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl RepoError {
    fn user_not_found(id: UserId) -> Self {
        RepoError::NotFound {
            entity: "user",
            id: id.to_string(),
        }
    }
}

// Flattened persisted form of a user.
#[derive(Debug, Clone)]
struct UserRow {
    id: Uuid,
    name: String,
    age: i32,
}

impl UserRow {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id().value(),
            name: user.name().as_str().to_owned(),
            age: i32::from(user.age().value()),
        }
    }

    fn to_user(&self) -> Result<User, RepoError> {
        Ok(User::reconstruct(self.id, &self.name, self.age)?)
    }
}

/// Thread-safe, in-memory [`UserRepository`].
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    rows: RwLock<HashMap<Uuid, UserRow>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A poisoned lock only means another writer panicked mid-call; every write below is a
// single map operation, so the map itself is never left half-updated.
#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        rows.get(&id.value()).map(UserRow::to_user).transpose()
    }

    async fn insert(&self, user: &User) -> Result<(), RepoError> {
        let row = UserRow::from_user(user);
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(row.id, row);
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), RepoError> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        match rows.get_mut(&user.id().value()) {
            Some(row) => {
                *row = UserRow::from_user(user);
                Ok(())
            }
            None => Err(RepoError::user_not_found(user.id())),
        }
    }

    async fn list(&self) -> Result<Vec<User>, RepoError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        let mut users = rows
            .values()
            .map(UserRow::to_user)
            .collect::<Result<Vec<_>, _>>()?;
        users.sort_by(|a, b| {
            a.name()
                .as_str()
                .cmp(b.name().as_str())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(users)
    }
}
