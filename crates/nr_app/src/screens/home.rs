use nr_core::{Article, ArticleStore, CategoryFilter, Result};
use nr_inference::RecommendationResolver;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::scope::ScreenScope;

/// The article feed with its category filter and a recommendation strip.
pub struct HomeFeed {
    ctx: AppContext,
    scope: ScreenScope,
    filter: CategoryFilter,
    articles: Vec<Article>,
    recommendations: Vec<Article>,
}

impl HomeFeed {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            filter: CategoryFilter::All,
            articles: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn recommendations(&self) -> &[Article] {
        &self.recommendations
    }

    /// Loads the feed for `filter`, newest first.
    pub async fn load_articles(&mut self, filter: CategoryFilter) -> Result<&[Article]> {
        let store = &self.ctx.store;
        let articles = self
            .scope
            .run(async {
                match filter {
                    CategoryFilter::All => store.list_articles().await,
                    CategoryFilter::Only(category) => store.list_by_category(category).await,
                }
            })
            .await?;
        info!("📰 Loaded {} articles", articles.len());
        self.filter = filter;
        self.articles = articles;
        Ok(&self.articles)
    }

    /// Query sent to the recommender for the current filter.
    pub fn recommendation_query(&self) -> String {
        match self.filter {
            CategoryFilter::All => self.ctx.home.general_query.clone(),
            CategoryFilter::Only(category) => category.id().to_string(),
        }
    }

    /// Fetches recommendations for the current filter. Failures and empty
    /// answers fall back to the most recent loaded articles.
    pub async fn load_recommendations(&mut self) -> Result<&[Article]> {
        let count = self.ctx.home.recommendation_count;
        let query = self.recommendation_query();
        let resolver =
            RecommendationResolver::new(self.ctx.model.clone()).with_top_k(count);
        let store = self.ctx.store.as_ref();

        let mut recommended = match self.scope.run(resolver.recommend(store, &query)).await {
            Ok(articles) if !articles.is_empty() => articles,
            Ok(_) => {
                warn!("⚠️ No recommendations for {:?}, showing recent articles", query);
                self.articles.iter().take(count).cloned().collect()
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!("⚠️ Recommendations failed ({}), showing recent articles", e);
                self.articles.iter().take(count).cloned().collect()
            }
        };
        recommended.truncate(count);
        self.recommendations = recommended;
        Ok(&self.recommendations)
    }
}
