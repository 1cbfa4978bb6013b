//! Login credentials accepted by the authentication port.

use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

use super::user::is_plausible_email;

/// Reasons a login payload is refused before the directory is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginValidationError {
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email must be a valid address")]
    MalformedEmail,
    #[error("password must not be empty")]
    EmptyPassword,
}

impl LoginValidationError {
    /// Request field the failure belongs to.
    pub const fn field(self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::MalformedEmail => "email",
            Self::EmptyPassword => "password",
        }
    }

    /// Machine-readable reason, used in error details.
    pub const fn code(self) -> &'static str {
        match self {
            Self::EmptyEmail => "empty_email",
            Self::MalformedEmail => "malformed_email",
            Self::EmptyPassword => "empty_password",
        }
    }
}

/// Normalised login pair. Emails are matched the way [`super::User`] stores
/// them, lower-cased and trimmed; the password is wiped on drop.
///
/// # Examples
/// ```
/// use advance_ledger::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Hana@Example.com ", "s3cret")
///     .expect("valid credentials");
/// assert_eq!(creds.email(), "hana@example.com");
/// assert_eq!(creds.password(), "s3cret");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if !is_plausible_email(&email) {
            return Err(LoginValidationError::MalformedEmail);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyEmail)]
    #[case("   ", "pw", LoginValidationError::EmptyEmail)]
    #[case("faisal", "pw", LoginValidationError::MalformedEmail)]
    #[case("faisal@site", "pw", LoginValidationError::MalformedEmail)]
    #[case("faisal@example.com", "", LoginValidationError::EmptyPassword)]
    fn refuses_unusable_input(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password).expect_err("refused");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn debug_output_omits_the_password() {
        let creds =
            LoginCredentials::try_from_parts("faisal@example.com", "hunter2").expect("valid");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("faisal@example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
