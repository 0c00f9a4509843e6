use async_trait::async_trait;
use crate::subscription::Subscription;
use crate::types::{Article, ArticlePatch, Category, Comment, NewArticle, NewComment, User, UserPatch};
use crate::Result;

pub const USERS: &str = "users";
pub const ARTICLES: &str = "articles";
pub const COMMENTS: &str = "comments";

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Store a new article and return its generated id
    async fn create_article(&self, article: NewArticle) -> Result<String>;

    async fn update_article(&self, id: &str, patch: &ArticlePatch) -> Result<()>;

    async fn delete_article(&self, id: &str) -> Result<()>;

    async fn get_article(&self, id: &str) -> Result<Option<Article>>;

    /// All articles, newest first
    async fn list_articles(&self) -> Result<Vec<Article>>;

    /// Articles of one category, newest first
    async fn list_by_category(&self, category: Category) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn add_comment(&self, comment: NewComment) -> Result<String>;

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>>;

    async fn delete_comment(&self, id: &str) -> Result<()>;

    /// Comments of an article, newest first
    async fn get_comments(&self, article_id: &str) -> Result<Vec<Comment>>;

    /// Live view of an article's comments, newest first
    async fn subscribe_comments(&self, article_id: &str) -> Result<Subscription<Vec<Comment>>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    /// Create or overwrite a profile
    async fn put_user(&self, user: &User) -> Result<()>;

    async fn merge_user(&self, id: &str, patch: &UserPatch) -> Result<()>;

    /// Set-union of `article_id` into the saved list
    async fn add_saved_article(&self, user_id: &str, article_id: &str) -> Result<()>;

    /// Set-removal of `article_id` from the saved list
    async fn remove_saved_article(&self, user_id: &str, article_id: &str) -> Result<()>;

    /// Live view of a profile; `None` while the document does not exist
    async fn subscribe_user(&self, id: &str) -> Result<Subscription<Option<User>>>;
}

/// A backend serving all three collections.
pub trait DocumentStore: ArticleStore + CommentStore + UserStore {
    fn name(&self) -> &str;
}
