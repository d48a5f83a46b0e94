//! Error types for tickefic
//!
//! All fallible library operations return [`Result`], whose error type is
//! [`TickeficError`]. The REST layer maps these onto host-style error bodies
//! in [`crate::api::ApiError`].

use thiserror::Error;

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, TickeficError>;

/// Errors raised by the ticket service, its store and its configuration
#[derive(Error, Debug)]
pub enum TickeficError {
    /// I/O failure while reading or writing the data file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data file could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// A dashboard template failed to render
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Ticket does not exist
    #[error("Ticket not found: {id}")]
    TicketNotFound { id: u64 },

    /// User does not exist
    #[error("User not found: {login}")]
    UserNotFound { login: String },

    /// A user with the same login or email already exists
    #[error("User already exists: {login}")]
    UserExists { login: String },

    /// Role is not registered
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Category term does not exist
    #[error("Invalid category term: {0}")]
    InvalidTerm(u64),

    /// A request parameter failed validation
    #[error("Invalid parameter {param}: {reason}")]
    InvalidParam { param: String, reason: String },

    /// Requested listing page is past the last page
    #[error("The page number requested is larger than the number of pages available.")]
    PageOutOfRange { page: u32 },

    /// Caller must be logged in
    #[error("You must be logged in to do that")]
    NotLoggedIn,

    /// Caller lacks the capability for the action
    #[error("Sorry, you are not allowed to {action}")]
    Forbidden { action: String },

    /// Username/password did not match
    #[error("Invalid credentials.")]
    InvalidCredentials,

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Another process held the data file's lock for too long
    #[error("Data file is busy: {}", .0.display())]
    DataFileBusy(std::path::PathBuf),

    /// Shared state lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// Any other error
    #[error("{0}")]
    Custom(String),
}

impl TickeficError {
    /// Create a custom error
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a parameter validation error
    pub fn invalid_param(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Create an authorization error for the named action
    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }

    /// Message suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::Io(e) => format!("File operation failed: {e}"),
            Self::Serialization(_) => "The data file is corrupted or unreadable".to_string(),
            Self::Config(e) => format!("Configuration problem: {e}"),
            _ => self.to_string(),
        }
    }

    /// Hints for resolving the error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UserNotFound { .. } => vec![
                "List existing users with 'tickefic user list'".to_string(),
                "Create the user with 'tickefic user add'".to_string(),
            ],
            Self::UserExists { .. } => {
                vec!["Choose a different login or email address".to_string()]
            },
            Self::UnknownRole(_) => vec![
                "Known roles are administrator, agent and subscriber".to_string(),
                "Run 'tickefic activate' to create the agent role".to_string(),
            ],
            Self::TicketNotFound { .. } => {
                vec!["List tickets with 'tickefic tickets list'".to_string()]
            },
            Self::Serialization(_) => {
                vec!["Check the data file or restore it from a backup".to_string()]
            },
            Self::DataFileBusy(path) => vec![
                "Another tickefic process is writing the data file; try again".to_string(),
                format!("If no other process is running, remove {}.lock", path.display()),
            ],
            Self::Config(_) => {
                vec!["Check tickefic.toml and TICKEFIC__* environment variables".to_string()]
            },
            _ => vec![],
        }
    }

    /// Whether retrying with different input could succeed
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidParam { .. }
                | Self::InvalidCredentials
                | Self::NotLoggedIn
                | Self::UserExists { .. }
                | Self::InvalidTerm(_)
                | Self::PageOutOfRange { .. }
                | Self::DataFileBusy(_)
        )
    }

    /// Whether the error originates from configuration
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl<T> From<std::sync::PoisonError<T>> for TickeficError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_custom_error() {
        let err = TickeficError::custom("something broke");
        assert_eq!(err.user_message(), "something broke");
    }

    #[test]
    fn test_suggestions_for_unknown_role() {
        let err = TickeficError::UnknownRole("agent".to_string());
        assert!(!err.suggestions().is_empty());
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(TickeficError::InvalidCredentials.is_recoverable());
        assert!(TickeficError::invalid_param("page", "too big").is_recoverable());
        assert!(!TickeficError::LockPoisoned.is_recoverable());
    }
}
