pub mod context;
pub mod forms;
pub mod save;
pub mod scope;
pub mod screens;

pub use context::{AppContext, HomeConfig};
pub use forms::{LoginForm, PasswordChangeForm, RegistrationForm};
pub use save::SaveToggle;
pub use scope::ScreenScope;
pub use screens::{
    AdminConsole, ArticleDetail, ArticleDraft, HomeFeed, ProfileView, SavedArticles, SearchView,
};

pub mod prelude {
    pub use super::context::{AppContext, HomeConfig};
    pub use super::forms::{LoginForm, PasswordChangeForm, RegistrationForm};
    pub use super::screens::*;
    pub use super::{SaveToggle, ScreenScope};
    pub use nr_core::{Article, Category, CategoryFilter, Comment, Error, Result, User};
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use nr_auth::backends::memory::MemoryIdentity;
    use nr_auth::{Session, SessionConfig};
    use nr_core::{
        Error, InferenceModel, Recommendations, Result, Role, SummaryLength, User, UserStore,
    };
    use nr_storage::backends::memory::MemoryStorage;
    use nr_storage::seed_articles;

    use crate::AppContext;

    pub const PASSWORD: &str = "secret1";

    /// Model with canned answers; `None` answers fail.
    #[derive(Debug, Default)]
    pub struct StaticModel {
        pub recommendations: Option<Recommendations>,
        pub summary: Option<String>,
        pub summarize_calls: AtomicUsize,
    }

    impl StaticModel {
        pub fn failing() -> Self {
            Self::default()
        }

        pub fn answering(recommendations: Recommendations) -> Self {
            Self {
                recommendations: Some(recommendations),
                ..Self::default()
            }
        }

        pub fn summarizing(summary: &str) -> Self {
            Self {
                summary: Some(summary.to_string()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl InferenceModel for StaticModel {
        fn name(&self) -> &str {
            "static"
        }

        async fn summarize(&self, _content: &str, _length: SummaryLength) -> Result<String> {
            self.summarize_calls.fetch_add(1, Ordering::SeqCst);
            self.summary
                .clone()
                .ok_or_else(|| Error::Inference("no summary".to_string()))
        }

        async fn recommend(&self, _query: &str, _top_k: usize) -> Result<Recommendations> {
            self.recommendations
                .clone()
                .ok_or_else(|| Error::Network("offline".to_string()))
        }

        async fn health(&self) -> Result<bool> {
            Ok(self.recommendations.is_some())
        }
    }

    /// Seeded memory store, memory identity and a started session.
    pub async fn context_from(model: Arc<dyn InferenceModel>) -> AppContext {
        let store = Arc::new(MemoryStorage::new());
        seed_articles(store.as_ref()).await.unwrap();
        let session = Session::start(
            Arc::new(MemoryIdentity::new()),
            store,
            SessionConfig::default(),
        );
        session.ready().await.unwrap();
        AppContext::new(Arc::new(session), model)
    }

    pub async fn context_with(model: StaticModel) -> AppContext {
        context_from(Arc::new(model)).await
    }

    pub async fn sign_up(ctx: &AppContext, email: &str, name: &str) -> User {
        ctx.session.register(email, PASSWORD, name).await.unwrap()
    }

    pub async fn wait_for_user(ctx: &AppContext, predicate: impl Fn(&User) -> bool) -> User {
        let mut rx = ctx.session.subscribe();
        let state = tokio::time::timeout(
            Duration::from_secs(2),
            rx.wait_for(|s| s.user.as_ref().map_or(false, &predicate)),
        )
        .await
        .expect("session did not update in time")
        .expect("session closed")
        .clone();
        state.user.expect("signed in")
    }

    /// Promotes a profile to admin and waits until the session sees it.
    pub async fn make_admin(ctx: &AppContext, user_id: &str) -> User {
        let mut user = ctx.store.get_user(user_id).await.unwrap().unwrap();
        user.role = Role::Admin;
        ctx.store.put_user(&user).await.unwrap();
        wait_for_user(ctx, |u| u.id == user_id && u.is_admin()).await
    }
}
