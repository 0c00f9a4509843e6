use nr_core::{Article, Result, Role, User, UserPatch};
use tracing::info;

use super::resolve_articles;
use crate::context::AppContext;
use crate::scope::ScreenScope;

pub const PREVIEW_LEN: usize = 3;

pub struct ProfileView {
    ctx: AppContext,
    scope: ScreenScope,
    user: Option<User>,
    saved: Vec<Article>,
}

impl ProfileView {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            user: None,
            saved: Vec::new(),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Saved articles that still exist.
    pub fn saved_count(&self) -> usize {
        self.saved.len()
    }

    pub fn preview(&self) -> &[Article] {
        &self.saved[..self.saved.len().min(PREVIEW_LEN)]
    }

    pub fn role_badge(&self) -> Option<&'static str> {
        match self.user.as_ref()?.role {
            Role::Admin => Some("ADMIN"),
            Role::User => None,
        }
    }

    /// First letter of the display name, for the avatar placeholder.
    pub fn initial(&self) -> Option<char> {
        self.user
            .as_ref()
            .and_then(|u| u.name.chars().next())
            .map(|c| c.to_ascii_uppercase())
    }

    pub async fn load(&mut self) -> Result<()> {
        self.user = self.ctx.current_user();
        let ids = self
            .user
            .as_ref()
            .map(|u| u.saved_articles.clone())
            .unwrap_or_default();
        let store = self.ctx.store.as_ref();
        let (found, _) = self.scope.run(resolve_articles(store, &ids)).await?;
        self.saved = found;
        Ok(())
    }

    pub async fn update(&mut self, patch: &UserPatch) -> Result<()> {
        let updated = self.scope.run(self.ctx.session.update_profile(patch)).await?;
        self.user = Some(updated);
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.scope.run(self.ctx.session.logout()).await?;
        self.user = None;
        self.saved.clear();
        info!("👋 Logged out from profile");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context_with, make_admin, sign_up, wait_for_user, StaticModel};
    use nr_core::{ArticleStore, UserStore};

    #[tokio::test]
    async fn test_profile_summary() {
        let ctx = context_with(StaticModel::failing()).await;
        let user = sign_up(&ctx, "ann@b.co", "ann").await;
        for article in ctx.store.list_articles().await.unwrap().iter().take(4) {
            ctx.store.add_saved_article(&user.id, &article.id).await.unwrap();
        }
        wait_for_user(&ctx, |u| u.saved_articles.len() == 4).await;

        let mut profile = ProfileView::new(ctx.clone());
        profile.load().await.unwrap();
        assert_eq!(profile.saved_count(), 4);
        assert_eq!(profile.preview().len(), PREVIEW_LEN);
        assert_eq!(profile.initial(), Some('A'));
        assert_eq!(profile.role_badge(), None);

        make_admin(&ctx, &user.id).await;
        profile.load().await.unwrap();
        assert_eq!(profile.role_badge(), Some("ADMIN"));
    }

    #[tokio::test]
    async fn test_deleted_articles_not_counted() {
        let ctx = context_with(StaticModel::failing()).await;
        let user = sign_up(&ctx, "ann@b.co", "Ann").await;
        let articles = ctx.store.list_articles().await.unwrap();
        for article in articles.iter().take(5) {
            ctx.store.add_saved_article(&user.id, &article.id).await.unwrap();
        }
        for article in articles.iter().take(2) {
            ctx.store.delete_article(&article.id).await.unwrap();
        }
        wait_for_user(&ctx, |u| u.saved_articles.len() == 5).await;

        let mut profile = ProfileView::new(ctx.clone());
        profile.load().await.unwrap();
        assert_eq!(profile.saved_count(), 3);
        let preview: Vec<&str> = profile.preview().iter().map(|a| a.id.as_str()).collect();
        let live: Vec<&str> = articles[2..5].iter().map(|a| a.id.as_str()).collect();
        assert_eq!(preview, live);
    }

    #[tokio::test]
    async fn test_update_and_logout() {
        let ctx = context_with(StaticModel::failing()).await;
        sign_up(&ctx, "ann@b.co", "Ann").await;
        let mut profile = ProfileView::new(ctx.clone());
        profile.load().await.unwrap();

        let patch = UserPatch {
            avatar: Some("https://img/ann.png".to_string()),
            ..UserPatch::default()
        };
        profile.update(&patch).await.unwrap();
        assert_eq!(profile.user().unwrap().avatar.as_deref(), Some("https://img/ann.png"));

        profile.logout().await.unwrap();
        assert!(profile.user().is_none());
        assert!(ctx.current_user().is_none());
    }
}
