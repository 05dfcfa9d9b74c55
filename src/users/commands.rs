//! Mutating user requests.

use std::sync::Arc;

use uuid::Uuid;

use super::{USERS_LIST_KEY, UserDto, user_cache_key};
use crate::context::CancellationToken;
use crate::domain::{Age, Name, User, UserId, UserRepository};
use crate::error::{Error, Result};
use crate::handler::{BoxFuture, Handler, Request};

/// Registers a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUser {
    pub name: String,
    pub age: i32,
}

impl Request for CreateUser {
    type Response = UserDto;

    fn invalidates(&self) -> Vec<String> {
        vec![USERS_LIST_KEY.to_owned()]
    }
}

pub struct CreateUserHandler {
    repo: Arc<dyn UserRepository>,
}

impl CreateUserHandler {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

impl Handler<CreateUser> for CreateUserHandler {
    fn handle(&self, request: CreateUser, token: CancellationToken) -> BoxFuture<'static, Result<UserDto>> {
        let repo = Arc::clone(&self.repo);
        Box::pin(async move {
            let user = User::create(&request.name, request.age)?;
            token.check(CreateUser::name())?;
            repo.insert(&user).await?;
            Ok(UserDto::from(&user))
        })
    }
}

/// Replaces an existing user's name and age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUser {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
}

impl Request for UpdateUser {
    type Response = bool;

    fn invalidates(&self) -> Vec<String> {
        vec![user_cache_key(self.id), USERS_LIST_KEY.to_owned()]
    }
}

pub struct UpdateUserHandler {
    repo: Arc<dyn UserRepository>,
}

impl UpdateUserHandler {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

impl Handler<UpdateUser> for UpdateUserHandler {
    fn handle(&self, request: UpdateUser, token: CancellationToken) -> BoxFuture<'static, Result<bool>> {
        let repo = Arc::clone(&self.repo);
        Box::pin(async move {
            let id = UserId::new(request.id)?;
            let mut user = repo.find_by_id(id).await?.ok_or_else(|| Error::NotFound {
                entity: "user",
                id: id.to_string(),
            })?;

            user.update_details(Name::new(request.name)?, Age::new(request.age)?);

            token.check(UpdateUser::name())?;
            repo.update(&user).await?;
            Ok(true)
        })
    }
}
