//! User feature: the commands and queries dispatched through the mediator.
//!
//! | Request        | Response        | Capability                                   |
//! |----------------|-----------------|----------------------------------------------|
//! | [`CreateUser`] | [`UserDto`]     | invalidates `users-list`                     |
//! | [`UpdateUser`] | `bool`          | invalidates `user-{id}`, `users-list`        |
//! | [`GetUserById`]| [`UserDto`]     | cached under `user-{id}` for 5 minutes       |
//! | [`ListUsers`]  | `Vec<UserDto>`  | cached under `users-list` until invalidated  |
//!
//! [`UsersModule`] registers all four handlers over one shared repository.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{User, UserRepository};
use crate::error::Result;
use crate::mediator::{HandlerModule, RegistryBuilder};

mod commands;
mod queries;

pub use commands::{CreateUser, CreateUserHandler, UpdateUser, UpdateUserHandler};
pub use queries::{GetUserById, GetUserByIdHandler, ListUsers, ListUsersHandler, USER_CACHE_TTL};

/// Cache key of the full user listing.
pub const USERS_LIST_KEY: &str = "users-list";

/// Cache key of a single user.
pub fn user_cache_key(id: Uuid) -> String {
    format!("user-{id}")
}

/// Read model returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub age: u8,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().value(),
            name: user.name().as_str().to_owned(),
            age: user.age().value(),
        }
    }
}

/// Registers the user commands and queries.
pub struct UsersModule {
    repo: Arc<dyn UserRepository>,
}

impl UsersModule {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

impl HandlerModule for UsersModule {
    fn register(self, registry: &mut RegistryBuilder) -> Result<()> {
        registry
            .register::<CreateUser>(CreateUserHandler::new(Arc::clone(&self.repo)))?
            .register::<UpdateUser>(UpdateUserHandler::new(Arc::clone(&self.repo)))?
            .register::<GetUserById>(GetUserByIdHandler::new(Arc::clone(&self.repo)))?
            .register::<ListUsers>(ListUsersHandler::new(self.repo))?;
        Ok(())
    }
}
