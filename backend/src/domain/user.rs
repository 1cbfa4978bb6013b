//! Team members and the three-level organisation hierarchy.
//!
//! An ADMIN is the root of a tenant. Engineers report to their tenant's
//! admin; technicians report to an engineer of the same tenant. The
//! [`RoleProfile`] enum carries only the links each role can have, so an
//! admin with a manager or a technician without one cannot be built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UserId;

/// Maximum length of a user's display name.
pub const USER_NAME_MAX: usize = 120;

/// Role of a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Tenant owner and accountant.
    Admin,
    /// Site engineer, managed by an admin.
    Engineer,
    /// Technician, managed by an engineer.
    Technician,
}

impl UserRole {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Engineer => "ENGINEER",
            Self::Technician => "TECHNICIAN",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown user role: {0}")]
pub struct ParseUserRoleError(String);

impl FromStr for UserRole {
    type Err = ParseUserRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "ENGINEER" => Ok(Self::Engineer),
            "TECHNICIAN" => Ok(Self::Technician),
            _ => Err(ParseUserRoleError(s.to_owned())),
        }
    }
}

/// Role together with the hierarchy links that role carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleProfile {
    /// Tenant root; owns projects and users.
    Admin,
    /// Engineer whose manager is the tenant's admin.
    Engineer {
        /// The admin owning the tenant (and managing the engineer).
        root_admin_id: UserId,
    },
    /// Technician managed by an engineer.
    Technician {
        /// The supervising engineer.
        manager_id: UserId,
        /// The admin owning the tenant.
        root_admin_id: UserId,
    },
}

impl RoleProfile {
    /// Role without hierarchy links.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        match self {
            Self::Admin => UserRole::Admin,
            Self::Engineer { .. } => UserRole::Engineer,
            Self::Technician { .. } => UserRole::Technician,
        }
    }

    /// Direct supervisor, if any.
    #[must_use]
    pub const fn manager_id(&self) -> Option<UserId> {
        match self {
            Self::Admin => None,
            Self::Engineer { root_admin_id } => Some(*root_admin_id),
            Self::Technician { manager_id, .. } => Some(*manager_id),
        }
    }

    /// Owning admin for non-admin roles.
    #[must_use]
    pub const fn root_admin_id(&self) -> Option<UserId> {
        match self {
            Self::Admin => None,
            Self::Engineer { root_admin_id } | Self::Technician { root_admin_id, .. } => {
                Some(*root_admin_id)
            }
        }
    }

    /// Rebuild a profile from flat storage columns.
    pub fn from_parts(
        role: UserRole,
        manager_id: Option<UserId>,
        root_admin_id: Option<UserId>,
    ) -> Result<Self, UserValidationError> {
        match (role, manager_id, root_admin_id) {
            (UserRole::Admin, None, None) => Ok(Self::Admin),
            (UserRole::Admin, _, _) => Err(UserValidationError::AdminHasManager),
            (UserRole::Engineer, manager, Some(root)) if manager.is_none_or(|id| id == root) => {
                Ok(Self::Engineer {
                    root_admin_id: root,
                })
            }
            (UserRole::Engineer, Some(_), Some(_)) => {
                Err(UserValidationError::EngineerManagerNotRoot)
            }
            (UserRole::Technician, Some(manager_id), Some(root_admin_id)) => Ok(Self::Technician {
                manager_id,
                root_admin_id,
            }),
            (UserRole::Engineer | UserRole::Technician, _, _) => {
                Err(UserValidationError::MissingHierarchy { role })
            }
        }
    }
}

/// Validation errors returned by [`User::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyName,
    NameTooLong { max: usize },
    InvalidEmail,
    AdminHasManager,
    EngineerManagerNotRoot,
    MissingHierarchy { role: UserRole },
    SelfManaged,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::AdminHasManager => write!(f, "an admin cannot have a manager"),
            Self::EngineerManagerNotRoot => {
                write!(f, "an engineer must be managed by the tenant admin")
            }
            Self::MissingHierarchy { role } => {
                write!(f, "{role} requires a manager and a root admin")
            }
            Self::SelfManaged => write!(f, "a user cannot manage themselves"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Input for constructing a [`User`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub profile: RoleProfile,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

/// A team member.
///
/// ## Invariants
/// - `name` is trimmed and non-empty.
/// - `email` is lower-cased and has a local part and a dotted domain.
/// - hierarchy links never point at the user itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserRecord", into = "UserRecord")]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    profile: RoleProfile,
    job_title: Option<String>,
    phone: Option<String>,
    avatar_url: Option<String>,
}

pub(crate) fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !email.chars().any(char::is_whitespace)
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

impl User {
    /// Validate a draft into a user.
    ///
    /// # Examples
    /// ```
    /// use advance_ledger::domain::{RoleProfile, User, UserDraft, UserId, UserRole};
    ///
    /// let user = User::new(UserDraft {
    ///     id: UserId::random(),
    ///     name: "  Amal Haddad ".to_owned(),
    ///     email: "Amal@Example.com".to_owned(),
    ///     profile: RoleProfile::Admin,
    ///     job_title: None,
    ///     phone: None,
    ///     avatar_url: None,
    /// })
    /// .expect("valid user");
    /// assert_eq!(user.name(), "Amal Haddad");
    /// assert_eq!(user.email(), "amal@example.com");
    /// assert_eq!(user.role(), UserRole::Admin);
    /// ```
    pub fn new(draft: UserDraft) -> Result<Self, UserValidationError> {
        let UserDraft {
            id,
            name,
            email,
            profile,
            job_title,
            phone,
            avatar_url,
        } = draft;

        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if name.chars().count() > USER_NAME_MAX {
            return Err(UserValidationError::NameTooLong {
                max: USER_NAME_MAX,
            });
        }
        let email = email.trim().to_lowercase();
        if !is_plausible_email(&email) {
            return Err(UserValidationError::InvalidEmail);
        }
        if profile.manager_id() == Some(id) || profile.root_admin_id() == Some(id) {
            return Err(UserValidationError::SelfManaged);
        }

        Ok(Self {
            id,
            name,
            email,
            profile,
            job_title: optional_text(job_title),
            phone: optional_text(phone),
            avatar_url: optional_text(avatar_url),
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn profile(&self) -> &RoleProfile {
        &self.profile
    }

    pub fn role(&self) -> UserRole {
        self.profile.role()
    }

    pub fn manager_id(&self) -> Option<UserId> {
        self.profile.manager_id()
    }

    pub fn root_admin_id(&self) -> Option<UserId> {
        self.profile.root_admin_id()
    }

    /// The admin owning this user's tenant; an admin owns its own.
    pub fn tenant_root(&self) -> UserId {
        self.profile.root_admin_id().unwrap_or(self.id)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.profile, RoleProfile::Admin)
    }

    pub fn job_title(&self) -> Option<&str> {
        self.job_title.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }
}

/// Flat wire and change-feed representation of a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub manager_id: Option<UserId>,
    pub root_admin_id: Option<UserId>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<User> for UserRecord {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            role: value.role(),
            manager_id: value.manager_id(),
            root_admin_id: value.root_admin_id(),
            name: value.name,
            email: value.email,
            job_title: value.job_title,
            phone: value.phone,
            avatar_url: value.avatar_url,
        }
    }
}

impl TryFrom<UserRecord> for User {
    type Error = UserValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let profile = RoleProfile::from_parts(value.role, value.manager_id, value.root_admin_id)?;
        Self::new(UserDraft {
            id: value.id,
            name: value.name,
            email: value.email,
            profile,
            job_title: value.job_title,
            phone: value.phone,
            avatar_url: value.avatar_url,
        })
    }
}
