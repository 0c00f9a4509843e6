use std::env;
use std::str::FromStr;
use std::sync::Arc;

use nr_core::{Error, IdentityProvider, Result};

pub mod backends;
pub mod session;

pub use session::{Session, SessionConfig, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityKind {
    #[default]
    Memory,
    Firebase,
}

impl FromStr for IdentityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(IdentityKind::Memory),
            "firebase" => Ok(IdentityKind::Firebase),
            other => Err(Error::Config(format!("Unknown identity backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub kind: IdentityKind,
    pub api_key: Option<String>,
    pub session: SessionConfig,
}

impl AuthConfig {
    /// Reads `NR_AUTH` and `FIREBASE_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let kind = match env::var("NR_AUTH") {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => IdentityKind::default(),
        };
        Ok(Self {
            kind,
            api_key: env::var("FIREBASE_API_KEY").ok(),
            session: SessionConfig::default(),
        })
    }
}

pub fn create_identity(config: &AuthConfig) -> Result<Arc<dyn IdentityProvider>> {
    match config.kind {
        IdentityKind::Memory => Ok(Arc::new(backends::memory::MemoryIdentity::new())),
        #[cfg(feature = "firebase")]
        IdentityKind::Firebase => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                Error::Config("FIREBASE_API_KEY is required for the firebase backend".to_string())
            })?;
            let identity = backends::firebase::FirebaseIdentity::new(
                backends::firebase::FirebaseConfig::new(api_key),
            )?;
            Ok(Arc::new(identity))
        }
        #[cfg(not(feature = "firebase"))]
        IdentityKind::Firebase => Err(Error::Config(
            "Firebase identity support is not compiled in (enable the `firebase` feature)"
                .to_string(),
        )),
    }
}

pub mod prelude {
    pub use super::backends::memory::MemoryIdentity;
    pub use super::{create_identity, AuthConfig, IdentityKind, Session, SessionConfig, SessionState};
    pub use nr_core::{AuthError, AuthState, AuthUser, IdentityProvider, ProviderKind};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_kind_parse() {
        assert_eq!("Memory".parse::<IdentityKind>().unwrap(), IdentityKind::Memory);
        assert_eq!("firebase".parse::<IdentityKind>().unwrap(), IdentityKind::Firebase);
        assert!("ldap".parse::<IdentityKind>().is_err());
    }

    #[test]
    fn test_create_memory_identity() {
        let identity = create_identity(&AuthConfig::default()).unwrap();
        assert_eq!(identity.name(), "memory");
        assert!(identity.current_user().is_none());
    }

    #[cfg(feature = "firebase")]
    #[test]
    fn test_firebase_requires_key() {
        let config = AuthConfig {
            kind: IdentityKind::Firebase,
            ..AuthConfig::default()
        };
        assert!(create_identity(&config).is_err());
    }
}
