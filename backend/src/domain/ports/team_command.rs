//! Driving port for managing team members.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, User, UserId, UserRole};

/// Request to add a user below the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUserRequest {
    pub requester: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Engineer a new technician reports to. Required when an admin adds a
    /// technician; ignored otherwise.
    pub manager_id: Option<UserId>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

/// Driving port for team changes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeamCommand: Send + Sync {
    async fn add_user(&self, request: AddUserRequest) -> Result<User, Error>;

    /// Hard-delete `target`.
    async fn delete_user(&self, requester: &UserId, target: &UserId) -> Result<(), Error>;
}
