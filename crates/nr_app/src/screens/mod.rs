pub mod admin;
pub mod article;
pub mod home;
pub mod profile;
pub mod saved;
pub mod search;

pub use admin::{AdminConsole, ArticleDraft};
pub use article::ArticleDetail;
pub use home::HomeFeed;
pub use profile::ProfileView;
pub use saved::SavedArticles;
pub use search::SearchView;

use futures_util::future::join_all;
use nr_core::{Article, ArticleStore, Result};

/// Looks up `ids` concurrently. Returns the articles that exist, in order,
/// and the ids that did not resolve.
pub(crate) async fn resolve_articles<S>(store: &S, ids: &[String]) -> Result<(Vec<Article>, Vec<String>)>
where
    S: ArticleStore + ?Sized,
{
    let lookups = join_all(ids.iter().map(|id| store.get_article(id))).await;
    let mut found = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();
    for (id, lookup) in ids.iter().zip(lookups) {
        match lookup? {
            Some(article) => found.push(article),
            None => missing.push(id.clone()),
        }
    }
    Ok((found, missing))
}
