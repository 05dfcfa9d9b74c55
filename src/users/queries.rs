//! Read-only user requests. Both are cacheable.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::{USERS_LIST_KEY, UserDto, user_cache_key};
use crate::context::CancellationToken;
use crate::domain::{UserId, UserRepository};
use crate::error::{Error, Result};
use crate::handler::{BoxFuture, CachePolicy, Handler, Request};

/// How long a single user stays cached.
pub const USER_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Fetches one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetUserById {
    pub id: Uuid,
}

impl Request for GetUserById {
    type Response = UserDto;

    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(user_cache_key(self.id)).ttl(USER_CACHE_TTL))
    }
}

pub struct GetUserByIdHandler {
    repo: Arc<dyn UserRepository>,
}

impl GetUserByIdHandler {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

impl Handler<GetUserById> for GetUserByIdHandler {
    fn handle(&self, request: GetUserById, _token: CancellationToken) -> BoxFuture<'static, Result<UserDto>> {
        let repo = Arc::clone(&self.repo);
        Box::pin(async move {
            let id = UserId::new(request.id)?;
            let user = repo.find_by_id(id).await?.ok_or_else(|| Error::NotFound {
                entity: "user",
                id: id.to_string(),
            })?;
            Ok(UserDto::from(&user))
        })
    }
}

/// Lists every user, sorted by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListUsers;

impl Request for ListUsers {
    type Response = Vec<UserDto>;

    // No TTL: the listing lives until a command invalidates it.
    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(USERS_LIST_KEY))
    }
}

pub struct ListUsersHandler {
    repo: Arc<dyn UserRepository>,
}

impl ListUsersHandler {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

impl Handler<ListUsers> for ListUsersHandler {
    fn handle(&self, _request: ListUsers, _token: CancellationToken) -> BoxFuture<'static, Result<Vec<UserDto>>> {
        let repo = Arc::clone(&self.repo);
        Box::pin(async move {
            let users = repo.list().await?;
            Ok(users.iter().map(UserDto::from).collect())
        })
    }
}
