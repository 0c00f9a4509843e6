use nr_core::{
    Article, ArticleStore, Comment, CommentStore, Error, InferenceModel, NewComment, Result,
    Subscription, SummaryLength,
};
use tracing::{debug, info};

use crate::context::AppContext;
use crate::save::SaveToggle;
use crate::scope::ScreenScope;

/// One article with its bookmark state, AI summary and comment thread.
pub struct ArticleDetail {
    ctx: AppContext,
    scope: ScreenScope,
    article: Article,
    save: SaveToggle,
    summary: Option<String>,
    comments: Vec<Comment>,
    comment_feed: Option<Subscription<Vec<Comment>>>,
}

impl ArticleDetail {
    /// Opens an article already at hand, e.g. from a list.
    pub async fn open(ctx: AppContext, article: Article) -> Result<Self> {
        let mut save = SaveToggle::new(ctx.clone(), &article.id);
        let scope = ScreenScope::new();
        scope.run(save.check()).await?;
        Ok(Self {
            ctx,
            scope,
            article,
            save,
            summary: None,
            comments: Vec::new(),
            comment_feed: None,
        })
    }

    pub async fn open_by_id(ctx: AppContext, article_id: &str) -> Result<Self> {
        let article = ctx
            .store
            .get_article(article_id)
            .await?
            .ok_or_else(|| Error::not_found(nr_core::storage::ARTICLES, article_id))?;
        Self::open(ctx, article).await
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub fn article(&self) -> &Article {
        &self.article
    }

    pub fn is_saved(&self) -> bool {
        self.save.is_saved()
    }

    pub async fn toggle_save(&mut self) -> Result<bool> {
        self.scope.run(self.save.toggle()).await
    }

    /// The stored AI summary, or one generated on first request and kept
    /// for the life of the screen.
    pub async fn summary(&mut self) -> Result<String> {
        if let Some(stored) = self
            .article
            .ai_summary
            .as_ref()
            .filter(|s| !s.trim().is_empty())
        {
            return Ok(stored.clone());
        }
        if let Some(cached) = &self.summary {
            return Ok(cached.clone());
        }
        let generated = self
            .scope
            .run(
                self.ctx
                    .model
                    .summarize(&self.article.content, SummaryLength::default()),
            )
            .await?;
        info!("🤖 Generated summary for {}", self.article.id);
        self.summary = Some(generated.clone());
        Ok(generated)
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub async fn load_comments(&mut self) -> Result<&[Comment]> {
        let store = &self.ctx.store;
        self.comments = self.scope.run(store.get_comments(&self.article.id)).await?;
        Ok(&self.comments)
    }

    /// Starts the live comment feed; it stops when the screen closes.
    pub async fn watch_comments(&mut self) -> Result<()> {
        let store = &self.ctx.store;
        let subscription = self
            .scope
            .run(store.subscribe_comments(&self.article.id))
            .await?;
        self.comment_feed = Some(self.scope.bind(subscription));
        Ok(())
    }

    /// Waits for the next comment snapshot. `None` once the feed has ended
    /// or was never started.
    pub async fn next_comments(&mut self) -> Option<&[Comment]> {
        let feed = self.comment_feed.as_mut()?;
        match feed.next().await {
            Some(comments) => {
                self.comments = comments;
                Some(&self.comments)
            }
            None => {
                self.comment_feed = None;
                None
            }
        }
    }

    pub async fn add_comment(&mut self, content: &str) -> Result<String> {
        let user = self.ctx.require_user("comment")?;
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation("Comment cannot be empty".to_string()));
        }
        let store = &self.ctx.store;
        let article_id = self.article.id.clone();
        let id = self
            .scope
            .run(async {
                if store.get_article(&article_id).await?.is_none() {
                    return Err(Error::not_found(nr_core::storage::ARTICLES, &article_id));
                }
                store
                    .add_comment(NewComment {
                        article_id: article_id.clone(),
                        user_id: user.id.clone(),
                        user_name: user.name.clone(),
                        user_avatar: user.avatar.clone(),
                        content: content.to_string(),
                    })
                    .await
            })
            .await?;
        debug!("Comment {} added to {}", id, article_id);
        Ok(id)
    }

    /// Deletes a comment when the signed-in user wrote it or is an admin.
    pub async fn delete_comment(&mut self, comment_id: &str) -> Result<()> {
        let user = self.ctx.require_user("delete comments")?;
        let store = &self.ctx.store;
        self.scope
            .run(async {
                let comment = store
                    .get_comment(comment_id)
                    .await?
                    .ok_or_else(|| Error::not_found(nr_core::storage::COMMENTS, comment_id))?;
                if !comment.can_be_deleted_by(&user) {
                    return Err(Error::PermissionDenied(
                        "You can only delete your own comments".to_string(),
                    ));
                }
                store.delete_comment(comment_id).await
            })
            .await?;
        self.comments.retain(|c| c.id != comment_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context_from, make_admin, sign_up, StaticModel};
    use nr_core::{ArticlePatch, UserStore};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    async fn first_article(ctx: &AppContext) -> Article {
        ctx.store.list_articles().await.unwrap().remove(0)
    }

    #[tokio::test]
    async fn test_save_toggle_requires_sign_in() {
        let ctx = context_from(Arc::new(StaticModel::failing())).await;
        let article = first_article(&ctx).await;
        let mut detail = ArticleDetail::open(ctx.clone(), article).await.unwrap();
        assert!(matches!(detail.toggle_save().await, Err(Error::PermissionDenied(_))));

        sign_up(&ctx, "a@b.co", "Ann").await;
        let article = first_article(&ctx).await;
        let mut detail = ArticleDetail::open(ctx.clone(), article).await.unwrap();
        assert!(!detail.is_saved());
        assert!(detail.toggle_save().await.unwrap());
        assert!(!detail.toggle_save().await.unwrap());
        assert!(!detail.is_saved());
    }

    #[tokio::test]
    async fn test_save_follows_session_changes() {
        let ctx = context_from(Arc::new(StaticModel::failing())).await;
        let article = first_article(&ctx).await;
        let mut detail = ArticleDetail::open(ctx.clone(), article.clone()).await.unwrap();

        let user = sign_up(&ctx, "a@b.co", "Ann").await;
        assert!(detail.toggle_save().await.unwrap());
        let record = ctx.store.get_user(&user.id).await.unwrap().unwrap();
        assert!(record.has_saved(&article.id));

        ctx.session.logout().await.unwrap();
        assert!(matches!(detail.toggle_save().await, Err(Error::PermissionDenied(_))));
        let record = ctx.store.get_user(&user.id).await.unwrap().unwrap();
        assert!(record.has_saved(&article.id));
    }

    #[tokio::test]
    async fn test_stored_summary_skips_model() {
        let model = Arc::new(StaticModel::summarizing("generated"));
        let ctx = context_from(model.clone()).await;
        let article = first_article(&ctx).await;
        let stored = article.ai_summary.clone().unwrap();

        let mut detail = ArticleDetail::open(ctx, article).await.unwrap();
        assert_eq!(detail.summary().await.unwrap(), stored);
        assert_eq!(model.summarize_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summary_generated_once() {
        let model = Arc::new(StaticModel::summarizing("generated"));
        let ctx = context_from(model.clone()).await;
        let article = first_article(&ctx).await;
        let patch = ArticlePatch {
            ai_summary: Some(String::new()),
            ..ArticlePatch::default()
        };
        ctx.store.update_article(&article.id, &patch).await.unwrap();

        let mut detail = ArticleDetail::open_by_id(ctx, &article.id).await.unwrap();
        assert_eq!(detail.summary().await.unwrap(), "generated");
        assert_eq!(detail.summary().await.unwrap(), "generated");
        assert_eq!(model.summarize_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_open_missing_article() {
        let ctx = context_from(Arc::new(StaticModel::failing())).await;
        let result = ArticleDetail::open_by_id(ctx, "nope").await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_comment_rules() {
        let ctx = context_from(Arc::new(StaticModel::failing())).await;
        let article = first_article(&ctx).await;
        let mut detail = ArticleDetail::open(ctx.clone(), article.clone()).await.unwrap();
        assert!(matches!(
            detail.add_comment("hello").await,
            Err(Error::PermissionDenied(_))
        ));

        sign_up(&ctx, "a@b.co", "Ann").await;
        assert!(matches!(detail.add_comment("   ").await, Err(Error::Validation(_))));
        let id = detail.add_comment(" First! ").await.unwrap();
        let comments = detail.load_comments().await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, id);
        assert_eq!(comments[0].content, "First!");
        assert_eq!(comments[0].user_name, "Ann");

        ctx.store.delete_article(&article.id).await.unwrap();
        assert!(matches!(detail.add_comment("late").await, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_comment_deletion_permissions() {
        let ctx = context_from(Arc::new(StaticModel::failing())).await;
        let article = first_article(&ctx).await;

        sign_up(&ctx, "author@b.co", "Author").await;
        let mut detail = ArticleDetail::open(ctx.clone(), article.clone()).await.unwrap();
        let first = detail.add_comment("one").await.unwrap();
        let second = detail.add_comment("two").await.unwrap();

        // Another user may not delete it
        ctx.session.logout().await.unwrap();
        sign_up(&ctx, "other@b.co", "Other").await;
        assert!(matches!(
            detail.delete_comment(&first).await,
            Err(Error::PermissionDenied(_))
        ));

        // The author may
        ctx.session.logout().await.unwrap();
        ctx.session.login("author@b.co", "secret1").await.unwrap();
        detail.delete_comment(&first).await.unwrap();

        // An admin may delete anyone's
        ctx.session.logout().await.unwrap();
        let admin = sign_up(&ctx, "admin@b.co", "Admin").await;
        make_admin(&ctx, &admin.id).await;
        detail.delete_comment(&second).await.unwrap();

        assert!(ctx.store.get_comments(&article.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_live_comment_feed() {
        let ctx = context_from(Arc::new(StaticModel::failing())).await;
        sign_up(&ctx, "a@b.co", "Ann").await;
        let article = first_article(&ctx).await;
        let mut detail = ArticleDetail::open(ctx, article).await.unwrap();

        detail.watch_comments().await.unwrap();
        assert_eq!(detail.next_comments().await.map(|c| c.len()), Some(0));

        detail.add_comment("hello").await.unwrap();
        let snapshot = tokio::time::timeout(Duration::from_secs(1), detail.next_comments())
            .await
            .unwrap()
            .map(|c| c.to_vec())
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "hello");

        detail.scope().close();
        assert!(detail.next_comments().await.is_none());
    }
}
