//! Persistence contract for users.

use async_trait::async_trait;

use super::{User, UserId};
use crate::database::RepoError;

/// Storage for [`User`] aggregates.
///
/// Implementations must be safe to share between concurrent dispatches.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns the user with `id`, or `None` if there is none.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError>;

    /// Stores a new user, replacing any row with the same id.
    async fn insert(&self, user: &User) -> Result<(), RepoError>;

    /// Overwrites an existing user.
    ///
    /// Fails with [`RepoError::NotFound`] if no user with that id exists.
    async fn update(&self, user: &User) -> Result<(), RepoError>;

    /// Returns every stored user.
    async fn list(&self) -> Result<Vec<User>, RepoError>;
}
