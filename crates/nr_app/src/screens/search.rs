use nr_core::{Article, ArticleStore, CategoryFilter, Result};
use tracing::debug;

use crate::context::AppContext;
use crate::scope::ScreenScope;

/// Case-insensitive match on title, subtitle or any tag. A blank query
/// matches everything.
pub fn matches(article: &Article, query: &str, filter: CategoryFilter) -> bool {
    if !filter.matches(article.category) {
        return false;
    }
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    article.title.to_lowercase().contains(&needle)
        || article.subtitle.to_lowercase().contains(&needle)
        || article.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

pub struct SearchView {
    ctx: AppContext,
    scope: ScreenScope,
    articles: Vec<Article>,
}

impl SearchView {
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

    /// Loads the searchable catalogue.
    pub async fn load(&mut self) -> Result<usize> {
        let store = &self.ctx.store;
        self.articles = self.scope.run(store.list_articles()).await?;
        Ok(self.articles.len())
    }

    pub fn search(&self, query: &str, filter: CategoryFilter) -> Vec<&Article> {
        let results: Vec<&Article> = self
            .articles
            .iter()
            .filter(|a| matches(a, query, filter))
            .collect();
        debug!("Search {:?} matched {} articles", query, results.len());
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context_with, StaticModel};
    use nr_core::Category;

    #[tokio::test]
    async fn test_search_title_subtitle_and_tags() {
        let mut view = SearchView::new(context_with(StaticModel::failing()).await);
        assert_eq!(view.load().await.unwrap(), 5);

        assert_eq!(view.search("", CategoryFilter::All).len(), 5);

        let by_title = view.search("JAMES WEBB", CategoryFilter::All);
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].category, Category::Science);

        let by_subtitle = view.search("72%", CategoryFilter::All);
        assert_eq!(by_subtitle.len(), 1);

        let by_tag = view.search("football", CategoryFilter::All);
        assert_eq!(by_tag.len(), 1);
    }

    #[tokio::test]
    async fn test_search_respects_category() {
        let mut view = SearchView::new(context_with(StaticModel::failing()).await);
        view.load().await.unwrap();
        assert!(view
            .search("football", CategoryFilter::Only(Category::Business))
            .is_empty());
        assert_eq!(
            view.search("  ", CategoryFilter::Only(Category::Health)).len(),
            1
        );
    }
}
