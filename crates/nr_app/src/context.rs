use std::sync::Arc;

use nr_auth::{create_identity, AuthConfig, Session};
use nr_core::{DocumentStore, Error, InferenceModel, Result, User};
use nr_storage::{create_storage, StorageConfig};
use tracing::info;

pub const GENERAL_QUERY: &str = "tin tức tổng hợp";
pub const RECOMMENDATION_COUNT: usize = 5;

#[derive(Debug, Clone)]
pub struct HomeConfig {
    /// Recommendation query used when no category is selected
    pub general_query: String,
    pub recommendation_count: usize,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            general_query: GENERAL_QUERY.to_string(),
            recommendation_count: RECOMMENDATION_COUNT,
        }
    }
}

/// Everything a screen needs: the session, the document store and the model.
#[derive(Clone)]
pub struct AppContext {
    pub session: Arc<Session>,
    pub store: Arc<dyn DocumentStore>,
    pub model: Arc<dyn InferenceModel>,
    pub home: HomeConfig,
}

impl AppContext {
    pub fn new(session: Arc<Session>, model: Arc<dyn InferenceModel>) -> Self {
        Self {
            store: Arc::clone(session.store()),
            session,
            model,
            home: HomeConfig::default(),
        }
    }

    pub fn with_home_config(mut self, home: HomeConfig) -> Self {
        self.home = home;
        self
    }

    /// Builds the identity provider, store, session and model from config.
    pub async fn bootstrap(
        storage: &StorageConfig,
        auth: &AuthConfig,
        inference: nr_inference::Config,
    ) -> Result<Self> {
        let identity = create_identity(auth)?;
        let store = create_storage(storage, Some(Arc::clone(&identity))).await?;
        let session = Arc::new(Session::start(identity, store, auth.session.clone()));
        let model = nr_inference::create_model(Some(inference)).await?;
        info!(
            "📱 App ready (store: {}, model: {})",
            session.store().name(),
            model.name()
        );
        Ok(Self::new(session, model))
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.user()
    }

    pub fn require_user(&self, action: &str) -> Result<User> {
        self.current_user()
            .ok_or_else(|| Error::PermissionDenied(format!("Please sign in to {}", action)))
    }

    pub fn require_admin(&self) -> Result<User> {
        let user = self.require_user("manage articles")?;
        if !user.is_admin() {
            return Err(Error::PermissionDenied(
                "Only administrators can manage articles".to_string(),
            ));
        }
        Ok(user)
    }
}
