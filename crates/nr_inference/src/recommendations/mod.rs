//! Turns whatever the recommendation endpoint returned into displayable
//! articles.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use nr_core::models::DEFAULT_TOP_K;
use nr_core::{
    Article, ArticleStore, Category, ExternalArticle, InferenceModel, Recommendations, Result,
};
use tracing::{debug, info};

use crate::text::escape_html;

pub const PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1504711434969-e33886168f5c?w=800&q=80";
pub const CURATED_AUTHOR: &str = "Curated news";
pub const EXTERNAL_READ_TIME: u32 = 3;
const FALLBACK_TAG: &str = "recommended";

pub struct RecommendationResolver {
    model: Arc<dyn InferenceModel>,
    top_k: usize,
}

impl RecommendationResolver {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self {
            model,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Asks the model for recommendations and resolves them to articles.
    pub async fn recommend<S>(&self, store: &S, query: &str) -> Result<Vec<Article>>
    where
        S: ArticleStore + ?Sized,
    {
        let recommendations = self.model.recommend(query, self.top_k).await?;
        let articles = Self::resolve(store, recommendations).await?;
        info!("✨ {} recommendations for {:?}", articles.len(), query);
        Ok(articles)
    }

    /// Ids are looked up concurrently (missing ones skipped, order kept);
    /// external items are converted without touching the store.
    pub async fn resolve<S>(store: &S, recommendations: Recommendations) -> Result<Vec<Article>>
    where
        S: ArticleStore + ?Sized,
    {
        match recommendations {
            Recommendations::Ids(ids) => {
                let lookups = join_all(ids.iter().map(|id| store.get_article(id))).await;
                let mut articles = Vec::with_capacity(ids.len());
                for (id, found) in ids.iter().zip(lookups) {
                    match found? {
                        Some(article) => articles.push(article),
                        None => debug!("Recommended article {} no longer exists", id),
                    }
                }
                Ok(articles)
            }
            Recommendations::External(items) => Ok(map_external(items, Utc::now())),
        }
    }
}

pub fn map_external(items: Vec<ExternalArticle>, now: DateTime<Utc>) -> Vec<Article> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| external_article(index, item, now))
        .collect()
}

fn external_article(index: usize, item: ExternalArticle, now: DateTime<Utc>) -> Article {
    let summary = item.summary.unwrap_or_default();
    let mut content = format!("<p>{}</p>", escape_html(&summary));
    if let Some(url) = &item.url {
        let url = escape_html(url);
        content.push_str(&format!(
            "<br/><p>Read more at: <a href=\"{}\">{}</a></p>",
            url, url
        ));
    }

    let label = item
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let category = label
        .and_then(|c| Category::from_str(c).ok())
        .unwrap_or(Category::General);

    Article {
        id: item
            .url
            .clone()
            .unwrap_or_else(|| format!("ext-{}-{}", index, now.timestamp_millis())),
        title: item.title.unwrap_or_else(|| "Untitled".to_string()),
        subtitle: summary,
        content,
        ai_summary: None,
        author: CURATED_AUTHOR.to_string(),
        author_avatar: None,
        category,
        image_url: PLACEHOLDER_IMAGE.to_string(),
        published_at: now,
        read_time: EXTERNAL_READ_TIME,
        tags: vec![label.unwrap_or(FALLBACK_TAG).to_string()],
        views: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nr_core::{ArticlePatch, NewArticle};
    use nr_storage::backends::memory::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Memory store that counts lookups by id.
    struct CountingStore {
        inner: MemoryStorage,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl ArticleStore for CountingStore {
        async fn create_article(&self, article: NewArticle) -> Result<String> {
            self.inner.create_article(article).await
        }
        async fn update_article(&self, id: &str, patch: &ArticlePatch) -> Result<()> {
            self.inner.update_article(id, patch).await
        }
        async fn delete_article(&self, id: &str) -> Result<()> {
            self.inner.delete_article(id).await
        }
        async fn get_article(&self, id: &str) -> Result<Option<Article>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.get_article(id).await
        }
        async fn list_articles(&self) -> Result<Vec<Article>> {
            self.inner.list_articles().await
        }
        async fn list_by_category(&self, category: Category) -> Result<Vec<Article>> {
            self.inner.list_by_category(category).await
        }
    }

    fn new_article(title: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            subtitle: "sub".to_string(),
            content: "<p>body</p>".to_string(),
            ai_summary: None,
            author: "A".to_string(),
            author_avatar: None,
            category: Category::Technology,
            image_url: "img".to_string(),
            published_at: None,
            read_time: 4,
            tags: vec![],
            views: None,
        }
    }

    async fn store_with(titles: &[&str]) -> (CountingStore, Vec<String>) {
        let store = CountingStore {
            inner: MemoryStorage::new(),
            lookups: AtomicUsize::new(0),
        };
        let mut ids = Vec::new();
        for title in titles {
            ids.push(store.create_article(new_article(title)).await.unwrap());
        }
        (store, ids)
    }

    #[tokio::test]
    async fn test_ids_resolved_in_order_skipping_missing() {
        let (store, ids) = store_with(&["first", "second"]).await;
        let recs = Recommendations::Ids(vec![
            ids[1].clone(),
            "gone".to_string(),
            ids[0].clone(),
        ]);
        let articles = RecommendationResolver::resolve(&store, recs).await.unwrap();
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["second", "first"]);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_external_items_need_no_lookup() {
        let (store, _) = store_with(&["local"]).await;
        let recs: Recommendations =
            serde_json::from_str(r#"[{"title":"T","url":"u"}]"#).unwrap();
        let articles = RecommendationResolver::resolve(&store, recs).await.unwrap();

        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(articles.len(), 1);
        let article = &articles[0];
        assert_eq!(article.id, "u");
        assert_eq!(article.title, "T");
        assert_eq!(article.author, CURATED_AUTHOR);
        assert_eq!(article.image_url, PLACEHOLDER_IMAGE);
        assert_eq!(article.read_time, 3);
        assert_eq!(article.views, 0);
        assert_eq!(article.tags, vec!["recommended".to_string()]);
        assert!(article.content.contains("href=\"u\""));
    }

    #[test]
    fn test_external_without_url_gets_generated_id() {
        let now = Utc::now();
        let items = vec![
            ExternalArticle {
                title: Some("A".to_string()),
                url: None,
                summary: Some("Short summary".to_string()),
                category: Some("Sports".to_string()),
            },
            ExternalArticle {
                title: None,
                url: None,
                summary: None,
                category: Some("weather".to_string()),
            },
        ];
        let articles = map_external(items, now);
        assert_eq!(articles[0].id, format!("ext-0-{}", now.timestamp_millis()));
        assert_eq!(articles[0].subtitle, "Short summary");
        assert_eq!(articles[0].category, Category::Sports);
        assert_eq!(articles[0].tags, vec!["Sports".to_string()]);
        assert_eq!(articles[1].id, format!("ext-1-{}", now.timestamp_millis()));
        assert_eq!(articles[1].category, Category::General);
        assert_eq!(articles[1].tags, vec!["weather".to_string()]);
        assert!(!articles[1].content.contains("Read more"));
    }
}
