use async_trait::async_trait;
use chrono::Utc;
use nr_core::storage::{ARTICLES, USERS};
use nr_core::{
    sort_articles, sort_comments, Article, ArticlePatch, ArticleStore, Category, Comment,
    CommentStore, DocumentStore, Error, NewArticle, NewComment, Result, SnapshotSink,
    Subscription, User, UserPatch, UserStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: HashMap<String, Article>,
    comments: HashMap<String, Comment>,
    users: HashMap<String, User>,
}

impl MemoryStore {
    fn next_article_id(&self) -> String {
        let base = format!("article-{}", Utc::now().timestamp_millis());
        let mut id = base.clone();
        let mut n = 0;
        while self.articles.contains_key(&id) {
            n += 1;
            id = format!("{}-{}", base, n);
        }
        id
    }

    fn articles_where(&self, filter: impl Fn(&Article) -> bool) -> Vec<Article> {
        let mut articles: Vec<Article> = self.articles.values().filter(|a| filter(*a)).cloned().collect();
        sort_articles(&mut articles);
        articles
    }

    fn comments_for(&self, article_id: &str) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .values()
            .filter(|c| c.article_id == article_id)
            .cloned()
            .collect();
        sort_comments(&mut comments);
        comments
    }

    fn user_mut(&mut self, id: &str) -> Result<&mut User> {
        self.users.get_mut(id).ok_or_else(|| Error::not_found(USERS, id))
    }
}

/// Process-local document store. Every write bumps a version counter that
/// live queries watch to recompute their snapshot.
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
    changes: watch::Sender<u64>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            store: Arc::new(RwLock::new(MemoryStore::default())),
            changes,
        }
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    fn spawn_live<T, F>(&self, sink: SnapshotSink<T>, query: F)
    where
        T: PartialEq + Clone + Send + Sync + 'static,
        F: Fn(&MemoryStore) -> T + Send + 'static,
    {
        let store = self.store.clone();
        let mut changes = self.changes.subscribe();
        tokio::spawn(async move {
            let mut last: Option<T> = None;
            loop {
                let snapshot = {
                    let store = store.read().await;
                    query(&store)
                };
                if last.as_ref() != Some(&snapshot) {
                    if !sink.send(snapshot.clone()).await {
                        break;
                    }
                    last = Some(snapshot);
                }
                tokio::select! {
                    _ = sink.closed() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("memory live query closed");
        });
    }
}

#[async_trait]
impl ArticleStore for MemoryStorage {
    async fn create_article(&self, article: NewArticle) -> Result<String> {
        let id = {
            let mut store = self.store.write().await;
            let id = store.next_article_id();
            store.articles.insert(id.clone(), article.into_article(id.clone(), Utc::now()));
            id
        };
        self.notify();
        Ok(id)
    }

    async fn update_article(&self, id: &str, patch: &ArticlePatch) -> Result<()> {
        {
            let mut store = self.store.write().await;
            let article = store
                .articles
                .get_mut(id)
                .ok_or_else(|| Error::not_found(ARTICLES, id))?;
            patch.apply(article);
        }
        self.notify();
        Ok(())
    }

    async fn delete_article(&self, id: &str) -> Result<()> {
        let removed = self.store.write().await.articles.remove(id).is_some();
        if removed {
            self.notify();
        }
        Ok(())
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.store.read().await.articles.get(id).cloned())
    }

    async fn list_articles(&self) -> Result<Vec<Article>> {
        Ok(self.store.read().await.articles_where(|_| true))
    }

    async fn list_by_category(&self, category: Category) -> Result<Vec<Article>> {
        Ok(self.store.read().await.articles_where(|a| a.category == category))
    }
}

#[async_trait]
impl CommentStore for MemoryStorage {
    async fn add_comment(&self, comment: NewComment) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.store
            .write()
            .await
            .comments
            .insert(id.clone(), comment.into_comment(id.clone(), Utc::now()));
        self.notify();
        Ok(id)
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        Ok(self.store.read().await.comments.get(id).cloned())
    }

    async fn delete_comment(&self, id: &str) -> Result<()> {
        let removed = self.store.write().await.comments.remove(id).is_some();
        if removed {
            self.notify();
        }
        Ok(())
    }

    async fn get_comments(&self, article_id: &str) -> Result<Vec<Comment>> {
        Ok(self.store.read().await.comments_for(article_id))
    }

    async fn subscribe_comments(&self, article_id: &str) -> Result<Subscription<Vec<Comment>>> {
        let (sink, subscription) = Subscription::channel();
        let article_id = article_id.to_string();
        self.spawn_live(sink, move |store| store.comments_for(&article_id));
        Ok(subscription)
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.store.read().await.users.get(id).cloned())
    }

    async fn put_user(&self, user: &User) -> Result<()> {
        self.store.write().await.users.insert(user.id.clone(), user.clone());
        self.notify();
        Ok(())
    }

    async fn merge_user(&self, id: &str, patch: &UserPatch) -> Result<()> {
        self.store.write().await.user_mut(id)?.apply(patch);
        self.notify();
        Ok(())
    }

    async fn add_saved_article(&self, user_id: &str, article_id: &str) -> Result<()> {
        {
            let mut store = self.store.write().await;
            let user = store.user_mut(user_id)?;
            if !user.has_saved(article_id) {
                user.saved_articles.push(article_id.to_string());
            }
        }
        self.notify();
        Ok(())
    }

    async fn remove_saved_article(&self, user_id: &str, article_id: &str) -> Result<()> {
        self.store
            .write()
            .await
            .user_mut(user_id)?
            .saved_articles
            .retain(|id| id != article_id);
        self.notify();
        Ok(())
    }

    async fn subscribe_user(&self, id: &str) -> Result<Subscription<Option<User>>> {
        let (sink, subscription) = Subscription::channel();
        let id = id.to_string();
        self.spawn_live(sink, move |store| store.users.get(&id).cloned());
        Ok(subscription)
    }
}

impl DocumentStore for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }
}
