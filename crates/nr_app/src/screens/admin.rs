use nr_core::{Article, ArticlePatch, ArticleStore, Category, Error, NewArticle, Result};
use tracing::info;

use crate::context::AppContext;
use crate::scope::ScreenScope;

pub const DEFAULT_READ_TIME: u32 = 5;

/// Article form as typed by an administrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDraft {
    pub title: String,
    pub subtitle: String,
    pub content: String,
    pub author: String,
    pub image_url: String,
    pub category: Category,
    pub read_time: String,
    pub tags: String,
}

impl Default for ArticleDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            content: String::new(),
            author: String::new(),
            image_url: String::new(),
            category: Category::Technology,
            read_time: DEFAULT_READ_TIME.to_string(),
            tags: String::new(),
        }
    }
}

impl ArticleDraft {
    /// Pre-fills the form for editing an existing article.
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            subtitle: article.subtitle.clone(),
            content: article.content.clone(),
            author: article.author.clone(),
            image_url: article.image_url.clone(),
            category: article.category,
            read_time: article.read_time.to_string(),
            tags: article.tags.join(", "),
        }
    }

    pub fn validate(&self) -> Result<NewArticle> {
        let required = [
            &self.title,
            &self.subtitle,
            &self.content,
            &self.author,
            &self.image_url,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(Error::Validation("Please fill in all fields".to_string()));
        }

        let content = self.content.trim();
        // Plain text from the form becomes a paragraph; markup is kept as is
        let content = if content.starts_with('<') {
            content.to_string()
        } else {
            format!("<p>{}</p>", content)
        };

        Ok(NewArticle {
            title: self.title.trim().to_string(),
            subtitle: self.subtitle.trim().to_string(),
            content,
            ai_summary: Some(self.subtitle.trim().to_string()),
            author: self.author.trim().to_string(),
            author_avatar: None,
            category: self.category,
            image_url: self.image_url.trim().to_string(),
            published_at: None,
            read_time: self.read_time.trim().parse().unwrap_or(DEFAULT_READ_TIME),
            tags: self
                .tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            views: None,
        })
    }
}

/// Article management, open to administrators only.
pub struct AdminConsole {
    ctx: AppContext,
    scope: ScreenScope,
    articles: Vec<Article>,
}

impl AdminConsole {
    pub fn open(ctx: AppContext) -> Result<Self> {
        ctx.require_admin()?;
        Ok(Self {
            ctx,
            scope: ScreenScope::new(),
            articles: Vec::new(),
        })
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub async fn load(&mut self) -> Result<&[Article]> {
        self.ctx.require_admin()?;
        let store = &self.ctx.store;
        self.articles = self.scope.run(store.list_articles()).await?;
        Ok(&self.articles)
    }

    pub async fn create(&mut self, draft: &ArticleDraft) -> Result<String> {
        self.ctx.require_admin()?;
        let article = draft.validate()?;
        let store = &self.ctx.store;
        let id = self.scope.run(store.create_article(article)).await?;
        info!("📝 Created article {}", id);
        self.load().await?;
        Ok(id)
    }

    /// Replaces the editable fields of `id`; publish time and views are kept.
    pub async fn update(&mut self, id: &str, draft: &ArticleDraft) -> Result<()> {
        self.ctx.require_admin()?;
        let patch = ArticlePatch::from(draft.validate()?);
        let store = &self.ctx.store;
        self.scope.run(store.update_article(id, &patch)).await?;
        info!("✏️ Updated article {}", id);
        self.load().await?;
        Ok(())
    }

    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.ctx.require_admin()?;
        let store = &self.ctx.store;
        self.scope.run(store.delete_article(id)).await?;
        info!("🗑️ Deleted article {}", id);
        self.articles.retain(|a| a.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context_with, make_admin, sign_up, StaticModel};

    fn draft() -> ArticleDraft {
        ArticleDraft {
            title: "Title".to_string(),
            subtitle: "Sub".to_string(),
            content: "Body text".to_string(),
            author: "Me".to_string(),
            image_url: "https://img/1.png".to_string(),
            category: Category::Science,
            read_time: "seven".to_string(),
            tags: " space, ,rockets ,".to_string(),
        }
    }

    #[test]
    fn test_draft_normalization() {
        let article = draft().validate().unwrap();
        assert_eq!(article.content, "<p>Body text</p>");
        assert_eq!(article.ai_summary.as_deref(), Some("Sub"));
        assert_eq!(article.read_time, DEFAULT_READ_TIME);
        assert_eq!(article.tags, vec!["space".to_string(), "rockets".to_string()]);
        assert!(article.published_at.is_none());

        let mut timed = draft();
        timed.read_time = "12".to_string();
        assert_eq!(timed.validate().unwrap().read_time, 12);
    }

    #[test]
    fn test_draft_requires_fields() {
        let mut missing = draft();
        missing.image_url = " ".to_string();
        assert!(matches!(missing.validate(), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_console_is_admin_only() {
        let ctx = context_with(StaticModel::failing()).await;
        assert!(matches!(AdminConsole::open(ctx.clone()), Err(Error::PermissionDenied(_))));
        sign_up(&ctx, "a@b.co", "Ann").await;
        assert!(matches!(AdminConsole::open(ctx.clone()), Err(Error::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let ctx = context_with(StaticModel::failing()).await;
        let admin = sign_up(&ctx, "admin@b.co", "Admin").await;
        make_admin(&ctx, &admin.id).await;

        let mut console = AdminConsole::open(ctx.clone()).unwrap();
        assert_eq!(console.load().await.unwrap().len(), 5);

        let id = console.create(&draft()).await.unwrap();
        assert_eq!(console.articles().len(), 6);
        // Newest first
        assert_eq!(console.articles()[0].id, id);

        let created = ctx.store.get_article(&id).await.unwrap().unwrap();
        let mut edit = ArticleDraft::from_article(&created);
        assert_eq!(edit.tags, "space, rockets");
        edit.title = "Edited".to_string();
        console.update(&id, &edit).await.unwrap();

        let updated = ctx.store.get_article(&id).await.unwrap().unwrap();
        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.content, "<p>Body text</p>");
        assert_eq!(updated.published_at, created.published_at);

        console.delete(&id).await.unwrap();
        assert_eq!(console.articles().len(), 5);
        assert!(ctx.store.get_article(&id).await.unwrap().is_none());
    }
}
