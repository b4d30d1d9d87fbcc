use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::progress::DAILY_TARGET;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("daily target must be at least 1")]
    InvalidDailyTarget,
}

/// An account record.
///
/// The tracker runs with a single implicit "demo" user; multi-user support
/// exists structurally but nothing creates further accounts. The password
/// is stored as an opaque string — authentication is out of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: String,
    password: String,
    daily_target: u32,
    created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with the shared default daily target.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmptyUsername` if the username is blank.
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        password: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        Self::from_persisted(id, username, password, DAILY_TARGET, created_at)
    }

    /// Rebuild a user from persisted fields.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the username is blank or the target is zero.
    pub fn from_persisted(
        id: UserId,
        username: impl Into<String>,
        password: impl Into<String>,
        daily_target: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(UserError::EmptyUsername);
        }
        if daily_target == 0 {
            return Err(UserError::InvalidDailyTarget);
        }

        Ok(Self {
            id,
            username: username.trim().to_owned(),
            password: password.into(),
            daily_target,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Personal target; display-only. Target/streak qualification uses the
    /// shared `DAILY_TARGET` constant.
    #[must_use]
    pub fn daily_target(&self) -> u32 {
        self.daily_target
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
