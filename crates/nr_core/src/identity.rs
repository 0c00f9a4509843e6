use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    Password,
    Google,
}

impl ProviderKind {
    pub fn provider_id(&self) -> &'static str {
        match self {
            ProviderKind::Password => "password",
            ProviderKind::Google => "google.com",
        }
    }

    pub fn from_provider_id(id: &str) -> Option<Self> {
        match id {
            "password" => Some(ProviderKind::Password),
            "google.com" => Some(ProviderKind::Google),
            _ => None,
        }
    }
}

/// The identity as the provider sees it, independent of the profile record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub providers: Vec<ProviderKind>,
}

impl AuthUser {
    pub fn has_provider(&self, kind: ProviderKind) -> bool {
        self.providers.contains(&kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn(AuthUser),
}

impl AuthState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            AuthState::SignedOut => None,
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Create a password account and sign it in
    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Exchange a Google identity token for a session
    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser>;

    async fn sign_out(&self) -> Result<()>;

    /// Re-prove the password of the signed-in account
    async fn reauthenticate(&self, email: &str, password: &str) -> Result<()>;

    async fn update_password(&self, new_password: &str) -> Result<()>;

    fn current_user(&self) -> Option<AuthUser>;

    /// Push-based view of sign-in state changes
    fn auth_state(&self) -> watch::Receiver<AuthState>;

    /// Bearer token for the signed-in identity, if the provider issues one
    async fn id_token(&self) -> Option<String> {
        None
    }
}
