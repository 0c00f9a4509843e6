//! Identity provider backed by the hosted identity REST API
//! (`accounts:signUp`, `accounts:signInWithPassword`, `accounts:signInWithIdp`,
//! `accounts:update`, `accounts:lookup`).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nr_core::{AuthError, AuthState, AuthUser, Error, IdentityProvider, ProviderKind, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info};

pub const DEFAULT_HOST: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Clone)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub host: String,
    /// Redirect URI reported for IdP sign-in
    pub request_uri: String,
}

impl fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &"<redacted>")
            .field("host", &self.host)
            .field("request_uri", &self.request_uri)
            .finish()
    }
}

impl FirebaseConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            host: DEFAULT_HOST.to_string(),
            request_uri: "http://localhost".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    local_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    provider_user_info: Vec<ProviderInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderInfo {
    provider_id: String,
}

impl LookupUser {
    fn into_auth_user(self) -> AuthUser {
        AuthUser {
            uid: self.local_id,
            email: self.email,
            display_name: self.display_name.filter(|n| !n.is_empty()),
            providers: self
                .provider_user_info
                .iter()
                .filter_map(|p| ProviderKind::from_provider_id(&p.provider_id))
                .collect(),
        }
    }
}

/// Maps an identity REST error body onto an [`AuthError`].
pub fn parse_error(body: &str) -> AuthError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string());
    AuthError::from_code(&message, &message)
}

pub struct FirebaseIdentity {
    client: Arc<Client>,
    config: FirebaseConfig,
    id_token: RwLock<Option<String>>,
    state: watch::Sender<AuthState>,
}

impl fmt::Debug for FirebaseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseIdentity")
            .field("client", &"<reqwest::Client>")
            .field("config", &self.config)
            .finish()
    }
}

impl FirebaseIdentity {
    pub fn new(config: FirebaseConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("Firebase API key is required".to_string()));
        }
        let (state, _) = watch::channel(AuthState::SignedOut);
        Ok(Self {
            client: Arc::new(Client::new()),
            config,
            id_token: RwLock::new(None),
            state,
        })
    }

    fn endpoint(&self, operation: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            self.config.host.trim_end_matches('/'),
            operation,
            self.config.api_key
        )
    }

    async fn call<T: for<'de> Deserialize<'de>>(&self, operation: &str, body: Value) -> Result<T> {
        let response = self
            .client
            .post(self.endpoint(operation))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Identity service unreachable ({})", e)))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = parse_error(&text);
            error!("❌ accounts:{} failed ({}): {}", operation, status, err);
            return Err(err.into());
        }
        Ok(response.json::<T>().await?)
    }

    async fn lookup(&self, id_token: &str) -> Result<AuthUser> {
        let lookup: LookupResponse = self.call("lookup", json!({ "idToken": id_token })).await?;
        lookup
            .users
            .into_iter()
            .next()
            .map(LookupUser::into_auth_user)
            .ok_or_else(|| AuthError::UserNotFound.into())
    }

    async fn establish(&self, tokens: TokenResponse) -> Result<AuthUser> {
        let user = self.lookup(&tokens.id_token).await?;
        debug!("Session established for {}", tokens.local_id);
        *self.id_token.write().await = Some(tokens.id_token);
        self.state.send_replace(AuthState::SignedIn(user.clone()));
        info!("🔑 Signed in {}", user.email.as_deref().unwrap_or(&user.uid));
        Ok(user)
    }

    async fn require_token(&self) -> Result<String> {
        self.id_token
            .read()
            .await
            .clone()
            .ok_or_else(|| AuthError::NotSignedIn.into())
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthUser> {
        let tokens = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        self.establish(tokens).await
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser> {
        let tokens = self
            .call(
                "signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        self.establish(tokens).await
    }

    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser> {
        let tokens = self
            .call(
                "signInWithIdp",
                json!({
                    "postBody": format!("id_token={}&providerId=google.com", id_token),
                    "requestUri": self.config.request_uri,
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                }),
            )
            .await?;
        self.establish(tokens).await
    }

    async fn sign_out(&self) -> Result<()> {
        *self.id_token.write().await = None;
        self.state.send_replace(AuthState::SignedOut);
        info!("👋 Signed out");
        Ok(())
    }

    async fn reauthenticate(&self, email: &str, password: &str) -> Result<()> {
        let current = self.current_user().ok_or(AuthError::NotSignedIn)?;
        let tokens: TokenResponse = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        if tokens.local_id != current.uid {
            return Err(AuthError::InvalidCredential.into());
        }
        *self.id_token.write().await = Some(tokens.id_token);
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<()> {
        let token = self.require_token().await?;
        let tokens: TokenResponse = self
            .call(
                "update",
                json!({ "idToken": token, "password": new_password, "returnSecureToken": true }),
            )
            .await?;
        *self.id_token.write().await = Some(tokens.id_token);
        info!("🔒 Password updated");
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().user().cloned()
    }

    fn auth_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    async fn id_token(&self) -> Option<String> {
        self.id_token.read().await.clone()
    }
}
