use std::collections::HashMap;

use async_trait::async_trait;
use nr_core::{AuthError, AuthState, AuthUser, IdentityProvider, ProviderKind, Result};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password: Option<String>,
    display_name: Option<String>,
    providers: Vec<ProviderKind>,
}

impl Account {
    fn auth_user(&self) -> AuthUser {
        AuthUser {
            uid: self.uid.clone(),
            email: Some(self.email.clone()),
            display_name: self.display_name.clone(),
            providers: self.providers.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct GoogleProfile {
    email: String,
    display_name: Option<String>,
}

/// In-process identity provider with the same error behavior as the hosted
/// one. Google sign-in accepts tokens registered via [`register_google_token`].
///
/// [`register_google_token`]: MemoryIdentity::register_google_token
pub struct MemoryIdentity {
    accounts: RwLock<HashMap<String, Account>>,
    google_tokens: RwLock<HashMap<String, GoogleProfile>>,
    state: watch::Sender<AuthState>,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

fn check_email(email: &str) -> Result<String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => {
            Ok(email.to_lowercase())
        }
        _ => Err(AuthError::InvalidEmail.into()),
    }
}

impl MemoryIdentity {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::SignedOut);
        Self {
            accounts: RwLock::new(HashMap::new()),
            google_tokens: RwLock::new(HashMap::new()),
            state,
        }
    }

    /// Makes `token` a valid Google identity token for `email`.
    pub async fn register_google_token(
        &self,
        token: &str,
        email: &str,
        display_name: Option<&str>,
    ) {
        self.google_tokens.write().await.insert(
            token.to_string(),
            GoogleProfile {
                email: email.to_lowercase(),
                display_name: display_name.map(str::to_string),
            },
        );
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    fn signed_in(&self, account: &Account) -> AuthUser {
        let user = account.auth_user();
        self.state.send_replace(AuthState::SignedIn(user.clone()));
        info!("🔑 Signed in {}", account.email);
        user
    }

    fn current_uid(&self) -> Result<String> {
        self.state
            .borrow()
            .user()
            .map(|u| u.uid.clone())
            .ok_or_else(|| AuthError::NotSignedIn.into())
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    fn name(&self) -> &str {
        "memory"
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = check_email(email)?;
        let accounts = self.accounts.read().await;
        let account = accounts
            .values()
            .find(|a| a.email == email)
            .ok_or(AuthError::UserNotFound)?;
        match account.password.as_deref() {
            Some(stored) if stored == password => Ok(self.signed_in(account)),
            Some(_) => Err(AuthError::WrongPassword.into()),
            None => Err(AuthError::InvalidCredential.into()),
        }
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = check_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == email) {
            return Err(AuthError::EmailAlreadyInUse.into());
        }
        let account = Account {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            email,
            password: Some(password.to_string()),
            display_name: None,
            providers: vec![ProviderKind::Password],
        };
        accounts.insert(account.uid.clone(), account.clone());
        debug!("Created account {}", account.uid);
        Ok(self.signed_in(&account))
    }

    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser> {
        let profile = self
            .google_tokens
            .read()
            .await
            .get(id_token)
            .cloned()
            .ok_or(AuthError::InvalidCredential)?;

        let mut accounts = self.accounts.write().await;
        let existing = accounts
            .values_mut()
            .find(|a| a.email == profile.email);
        let account = match existing {
            Some(account) => {
                // Same email signs into the same account, linking the provider
                if !account.providers.contains(&ProviderKind::Google) {
                    account.providers.push(ProviderKind::Google);
                }
                if account.display_name.is_none() {
                    account.display_name = profile.display_name.clone();
                }
                account.clone()
            }
            None => {
                let account = Account {
                    uid: uuid::Uuid::new_v4().simple().to_string(),
                    email: profile.email.clone(),
                    password: None,
                    display_name: profile.display_name.clone(),
                    providers: vec![ProviderKind::Google],
                };
                accounts.insert(account.uid.clone(), account.clone());
                account
            }
        };
        Ok(self.signed_in(&account))
    }

    async fn sign_out(&self) -> Result<()> {
        self.state.send_replace(AuthState::SignedOut);
        info!("👋 Signed out");
        Ok(())
    }

    async fn reauthenticate(&self, email: &str, password: &str) -> Result<()> {
        let uid = self.current_uid()?;
        let accounts = self.accounts.read().await;
        let account = accounts.get(&uid).ok_or(AuthError::UserNotFound)?;
        if !account.email.eq_ignore_ascii_case(email.trim()) {
            return Err(AuthError::InvalidCredential.into());
        }
        match account.password.as_deref() {
            Some(stored) if stored == password => Ok(()),
            Some(_) => Err(AuthError::WrongPassword.into()),
            None => Err(AuthError::NoPasswordProvider.into()),
        }
    }

    async fn update_password(&self, new_password: &str) -> Result<()> {
        let uid = self.current_uid()?;
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(&uid).ok_or(AuthError::UserNotFound)?;
        account.password = Some(new_password.to_string());
        if !account.providers.contains(&ProviderKind::Password) {
            account.providers.push(ProviderKind::Password);
        }
        info!("🔒 Password updated for {}", account.email);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().user().cloned()
    }

    fn auth_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}
