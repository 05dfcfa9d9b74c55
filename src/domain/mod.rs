//! User domain: value objects, the `User` entity, and the repository contract.
//!
//! Value objects validate on construction, so a `User` can only ever hold a non-empty
//! name, an age between 13 and 99, and a non-nil id.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

mod repository;

pub use repository::UserRepository;

/// Youngest age a user may register with.
pub const MIN_AGE: i32 = 13;

/// Oldest age a user may register with.
pub const MAX_AGE: i32 = 99;

/// Validation failures raised by the value objects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("age must be between 13 and 99, got {0}")]
    AgeOutOfRange(i32),

    #[error("id cannot be the nil uuid")]
    NilId,
}

/// Unique, non-nil user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(Uuid);

impl UserId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing uuid, rejecting the nil uuid.
    pub fn new(value: Uuid) -> Result<Self, DomainError> {
        if value.is_nil() {
            return Err(DomainError::NilId);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A user's display name. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(String);

impl Name {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::EmptyName);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A user's age in years, within [`MIN_AGE`]..=[`MAX_AGE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age(u8);

impl Age {
    pub fn new(value: i32) -> Result<Self, DomainError> {
        if !(MIN_AGE..=MAX_AGE).contains(&value) {
            return Err(DomainError::AgeOutOfRange(value));
        }
        // The range check above guarantees the value fits.
        u8::try_from(value)
            .map(Self)
            .map_err(|_| DomainError::AgeOutOfRange(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// A registered user.
///
/// State only changes through [`User::update_details`], which takes already validated
/// value objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: Name,
    age: Age,
}

impl User {
    /// Creates a new user with a freshly generated id.
    ///
    /// # Errors
    ///
    /// [`DomainError::EmptyName`] or [`DomainError::AgeOutOfRange`].
    pub fn create(name: &str, age: i32) -> Result<Self, DomainError> {
        Ok(Self {
            id: UserId::generate(),
            name: Name::new(name)?,
            age: Age::new(age)?,
        })
    }

    /// Rebuilds a user from persisted fields, keeping its id.
    ///
    /// # Errors
    ///
    /// Any [`DomainError`] if the stored fields no longer validate.
    pub fn reconstruct(id: Uuid, name: &str, age: i32) -> Result<Self, DomainError> {
        Ok(Self {
            id: UserId::new(id)?,
            name: Name::new(name)?,
            age: Age::new(age)?,
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn age(&self) -> Age {
        self.age
    }

    /// Replaces the user's name and age.
    pub fn update_details(&mut self, name: Name, age: Age) {
        self.name = name;
        self.age = age;
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name.as_str(), self.age.value())
    }
}
