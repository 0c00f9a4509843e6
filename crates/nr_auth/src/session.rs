use std::sync::Arc;
use std::time::Duration;

use nr_core::{
    AuthError, AuthState, AuthUser, DocumentStore, Error, IdentityProvider, ProviderKind, Result,
    User, UserPatch,
};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(10);
const FALLBACK_NAME: &str = "User";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound for loading or creating the profile after an identity change
    pub sync_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }
}

/// What screens observe: the signed-in profile, if any, and whether the
/// session is still resolving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
}

/// The live profile listener of the signed-in identity.
struct Listener {
    uid: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    config: SessionConfig,
    state: Arc<watch::Sender<SessionState>>,
    // Every identity change goes through this lock, one at a time
    listener: Mutex<Option<Listener>>,
    shutdown: CancellationToken,
}

impl Inner {
    async fn detach(&self, slot: &mut Option<Listener>) {
        if let Some(listener) = slot.take() {
            listener.token.cancel();
            if let Err(e) = listener.handle.await {
                warn!("⚠️ Profile listener for {} ended abnormally: {}", listener.uid, e);
            }
            debug!("Detached profile listener for {}", listener.uid);
        }
    }

    async fn sign_out_locally(&self, slot: &mut Option<Listener>) {
        self.detach(slot).await;
        self.state.send_replace(SessionState::default());
    }

    /// Makes `auth_user` the session user: loads or creates its profile and
    /// replaces any previous listener with one on the new profile.
    async fn attach(&self, slot: &mut Option<Listener>, auth_user: &AuthUser) -> Result<User> {
        if slot.as_ref().map(|l| l.uid.as_str()) == Some(auth_user.uid.as_str()) {
            let current = self.state.borrow().user.clone();
            if let Some(user) = current {
                return Ok(user);
            }
        }

        self.detach(slot).await;
        self.state.send_modify(|s| {
            s.user = None;
            s.loading = true;
        });

        let result = tokio::time::timeout(self.config.sync_timeout, self.open_profile(auth_user))
            .await
            .unwrap_or_else(|_| {
                Err(Error::Timeout(format!(
                    "Profile of {} did not load within {:?}",
                    auth_user.uid, self.config.sync_timeout
                )))
            });

        match result {
            Ok((user, listener)) => {
                *slot = Some(listener);
                self.state.send_replace(SessionState {
                    user: Some(user.clone()),
                    loading: false,
                });
                Ok(user)
            }
            Err(e) => {
                self.state.send_replace(SessionState::default());
                Err(e)
            }
        }
    }

    async fn open_profile(&self, auth_user: &AuthUser) -> Result<(User, Listener)> {
        let uid = auth_user.uid.clone();
        let user = match self.store.get_user(&uid).await? {
            Some(user) => user,
            None => {
                let profile = User::new_profile(
                    &uid,
                    auth_user.email.as_deref().unwrap_or_default(),
                    auth_user.display_name.as_deref().unwrap_or(FALLBACK_NAME),
                );
                self.store.put_user(&profile).await?;
                info!("👤 Created profile for {}", uid);
                profile
            }
        };

        let token = self.shutdown.child_token();
        let mut subscription = self.store.subscribe_user(&uid).await?.bind_to(&token);
        let state = Arc::clone(&self.state);
        let watched = uid.clone();
        let handle = tokio::spawn(async move {
            while let Some(snapshot) = subscription.next().await {
                match snapshot {
                    Some(user) => {
                        state.send_if_modified(|s| match &mut s.user {
                            Some(current) if current.id == user.id && *current != user => {
                                *current = user;
                                true
                            }
                            _ => false,
                        });
                    }
                    None => warn!("⚠️ Profile {} no longer exists", watched),
                }
            }
            debug!("Profile listener for {} stopped", watched);
        });

        Ok((user, Listener { uid, token, handle }))
    }
}

async fn watch_identity(inner: Arc<Inner>, mut auth: watch::Receiver<AuthState>) {
    loop {
        {
            let mut slot = inner.listener.lock().await;
            // Read under the lock so a change applied by a session call is never undone
            let current = auth.borrow_and_update().clone();
            match current {
                AuthState::SignedOut => inner.sign_out_locally(&mut slot).await,
                AuthState::SignedIn(user) => {
                    if let Err(e) = inner.attach(&mut slot, &user).await {
                        error!("❌ Failed to sync session for {}: {}", user.uid, e);
                    }
                }
            }
        }

        tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            changed = auth.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    debug!("Identity watcher stopped");
}

/// Owns the signed-in identity and its profile record.
pub struct Session {
    inner: Arc<Inner>,
    watcher: JoinHandle<()>,
}

impl Session {
    /// Starts tracking `identity`. Must be called inside a tokio runtime.
    pub fn start(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        config: SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState {
            user: None,
            loading: true,
        });
        let auth = identity.auth_state();
        let inner = Arc::new(Inner {
            identity,
            store,
            config,
            state: Arc::new(state),
            listener: Mutex::new(None),
            shutdown: CancellationToken::new(),
        });
        let watcher = tokio::spawn(watch_identity(Arc::clone(&inner), auth));
        info!("🚀 Session started with {} identity", inner.identity.name());
        Self { inner, watcher }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.inner.identity
    }

    /// Uid of the profile currently being listened to.
    pub async fn listening_to(&self) -> Option<String> {
        self.inner.listener.lock().await.as_ref().map(|l| l.uid.clone())
    }

    /// Waits until the initial identity state has been resolved.
    pub async fn ready(&self) -> Result<SessionState> {
        let mut rx = self.subscribe();
        let waited = tokio::time::timeout(self.inner.config.sync_timeout, async {
            rx.wait_for(|s| !s.loading).await.map(|s| s.clone())
        })
        .await;
        match waited {
            Ok(Ok(state)) => Ok(state),
            Ok(Err(_)) => Err(Error::Cancelled),
            Err(_) => Err(Error::Timeout("Session did not become ready".to_string())),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let mut slot = self.inner.listener.lock().await;
        let auth_user = self
            .inner
            .identity
            .sign_in_with_password(email.trim(), password)
            .await?;
        self.inner.attach(&mut slot, &auth_user).await
    }

    /// Creates the identity and its profile. The profile is written before
    /// the identity watcher can look for it, so exactly one is created.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User> {
        let mut slot = self.inner.listener.lock().await;
        let email = email.trim();
        let auth_user = self.inner.identity.create_user(email, password).await?;
        let profile = User::new_profile(&auth_user.uid, email, name.trim());
        self.inner.store.put_user(&profile).await?;
        info!("📝 Registered {}", auth_user.uid);
        self.inner.attach(&mut slot, &auth_user).await
    }

    pub async fn login_with_google(&self, id_token: &str) -> Result<User> {
        let mut slot = self.inner.listener.lock().await;
        let auth_user = self.inner.identity.sign_in_with_google(id_token).await?;
        self.inner.attach(&mut slot, &auth_user).await
    }

    pub async fn logout(&self) -> Result<()> {
        let mut slot = self.inner.listener.lock().await;
        self.inner.identity.sign_out().await?;
        self.inner.sign_out_locally(&mut slot).await;
        Ok(())
    }

    /// Merges `patch` into the stored profile and the local copy.
    pub async fn update_profile(&self, patch: &UserPatch) -> Result<User> {
        let user = self.user().ok_or(AuthError::NotSignedIn)?;
        if patch.is_empty() {
            return Ok(user);
        }
        self.inner.store.merge_user(&user.id, patch).await?;

        let mut updated = None;
        self.inner.state.send_if_modified(|s| match &mut s.user {
            Some(current) if current.id == user.id => {
                current.apply(patch);
                updated = Some(current.clone());
                true
            }
            _ => false,
        });
        Ok(updated.unwrap_or_else(|| {
            let mut user = user;
            user.apply(patch);
            user
        }))
    }

    /// Re-proves `current` and sets `new` as the password. Accounts that sign
    /// in only through another provider have no password to change.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<()> {
        let auth_user = self
            .inner
            .identity
            .current_user()
            .ok_or(AuthError::NotSignedIn)?;
        if !auth_user.has_provider(ProviderKind::Password) {
            return Err(AuthError::NoPasswordProvider.into());
        }
        let email = auth_user
            .email
            .as_deref()
            .ok_or(AuthError::NoPasswordProvider)?;

        self.inner
            .identity
            .reauthenticate(email, current)
            .await
            .map_err(|e| match e {
                Error::Auth(AuthError::InvalidCredential) => AuthError::WrongPassword.into(),
                other => other,
            })?;
        self.inner.identity.update_password(new).await?;
        info!("🔒 Password changed for {}", auth_user.uid);
        Ok(())
    }

    /// Stops the identity watcher and the profile listener.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let mut slot = self.inner.listener.lock().await;
        self.inner.detach(&mut slot).await;
        info!("🛑 Session shut down");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
        self.watcher.abort();
    }
}
