use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Network error - {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Error::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Identity-provider failures, translated into messages a reader can act on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("The current password is incorrect")]
    WrongPassword,

    #[error("The new password is too weak. Use at least 6 characters")]
    WeakPassword,

    #[error("Please sign out and sign in again before changing your password")]
    RequiresRecentLogin,

    #[error("This email address is already registered")]
    EmailAlreadyInUse,

    #[error("No account exists for this email address")]
    UserNotFound,

    #[error("The email address is not valid")]
    InvalidEmail,

    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("This sign-in method is not enabled")]
    OperationNotAllowed,

    #[error("Too many attempts, try again later")]
    TooManyRequests,

    #[error("Cannot change the password of an account without a password sign-in. Manage it with your sign-in provider")]
    NoPasswordProvider,

    #[error("No user is currently signed in")]
    NotSignedIn,

    #[error("{message}")]
    Provider { code: String, message: String },
}

impl AuthError {
    /// Maps a provider error code to a variant. Accepts both the SDK style
    /// (`auth/wrong-password`) and the REST style (`INVALID_PASSWORD`,
    /// `WEAK_PASSWORD : Password should be at least 6 characters`).
    pub fn from_code(code: &str, message: &str) -> Self {
        let normalized = code
            .split(" : ")
            .next()
            .unwrap_or(code)
            .trim()
            .trim_start_matches("auth/")
            .to_ascii_lowercase()
            .replace('_', "-");

        match normalized.as_str() {
            "wrong-password" | "invalid-password" => AuthError::WrongPassword,
            "weak-password" => AuthError::WeakPassword,
            "requires-recent-login" | "credential-too-old-login-again" => {
                AuthError::RequiresRecentLogin
            }
            "email-already-in-use" | "email-exists" => AuthError::EmailAlreadyInUse,
            "user-not-found" | "email-not-found" => AuthError::UserNotFound,
            "invalid-email" => AuthError::InvalidEmail,
            "invalid-credential" | "invalid-login-credentials" | "invalid-idp-response" => {
                AuthError::InvalidCredential
            }
            "operation-not-allowed" => AuthError::OperationNotAllowed,
            "too-many-requests" | "too-many-attempts-try-later" => AuthError::TooManyRequests,
            _ => AuthError::Provider {
                code: code.to_string(),
                message: if message.is_empty() {
                    code.to_string()
                } else {
                    message.to_string()
                },
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
