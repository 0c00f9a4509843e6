use nr_core::{Article, Result, UserStore};
use tracing::{info, warn};

use super::resolve_articles;
use crate::context::AppContext;
use crate::scope::ScreenScope;

/// The signed-in user's bookmarks.
pub struct SavedArticles {
    ctx: AppContext,
    scope: ScreenScope,
    articles: Vec<Article>,
}

impl SavedArticles {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            articles: Vec::new(),
        }
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Resolves the saved ids against the store. Ids whose article is gone
    /// are removed from the user record.
    pub async fn load(&mut self) -> Result<&[Article]> {
        let Some(user) = self.ctx.current_user() else {
            self.articles.clear();
            return Ok(&self.articles);
        };
        let store = self.ctx.store.as_ref();
        let articles = self
            .scope
            .run(async {
                let saved = match store.get_user(&user.id).await? {
                    Some(record) => record.saved_articles,
                    None => Vec::new(),
                };
                let (found, missing) = resolve_articles(store, &saved).await?;
                for id in &missing {
                    warn!("⚠️ Pruning saved article {} that no longer exists", id);
                    store.remove_saved_article(&user.id, id).await?;
                }
                Ok(found)
            })
            .await?;
        info!("🔖 {} saved articles", articles.len());
        self.articles = articles;
        Ok(&self.articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context_with, sign_up, StaticModel};
    use nr_core::ArticleStore;

    #[tokio::test]
    async fn test_signed_out_has_nothing_saved() {
        let mut saved = SavedArticles::new(context_with(StaticModel::failing()).await);
        assert!(saved.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dangling_ids_are_pruned() {
        let ctx = context_with(StaticModel::failing()).await;
        let user = sign_up(&ctx, "a@b.co", "Ann").await;
        let articles = ctx.store.list_articles().await.unwrap();
        ctx.store.add_saved_article(&user.id, &articles[1].id).await.unwrap();
        ctx.store.add_saved_article(&user.id, "deleted-article").await.unwrap();
        ctx.store.add_saved_article(&user.id, &articles[0].id).await.unwrap();

        let mut saved = SavedArticles::new(ctx.clone());
        let ids: Vec<String> = saved
            .load()
            .await
            .unwrap()
            .iter()
            .map(|a| a.id.clone())
            .collect();
        assert_eq!(ids, vec![articles[1].id.clone(), articles[0].id.clone()]);

        let record = ctx.store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(record.saved_articles, ids);
    }
}
