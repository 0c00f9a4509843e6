use async_trait::async_trait;
use chrono::Utc;
use nr_core::storage::{ARTICLES, COMMENTS, USERS};
use nr_core::{
    sort_comments, Article, ArticlePatch, ArticleStore, Category, Comment, CommentStore,
    DocumentStore, Error, IdentityProvider, NewArticle, NewComment, Result, SnapshotSink,
    Subscription, User, UserPatch, UserStore,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub mod value;

const DEFAULT_HOST: &str = "https://firestore.googleapis.com/v1";

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: Option<String>,
    pub host: String,
    pub poll_interval: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            api_key: None,
            host: DEFAULT_HOST.to_string(),
            poll_interval: Duration::from_secs(5),
        }
    }

    fn database(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }

    fn documents_root(&self) -> String {
        format!("{}/documents", self.database())
    }
}

/// Document store backed by the hosted Firestore REST API. Live queries are
/// served by polling at `poll_interval` and emitting only changed snapshots.
#[derive(Clone)]
pub struct FirestoreStorage {
    client: Arc<Client>,
    config: FirestoreConfig,
    identity: Option<Arc<dyn IdentityProvider>>,
}

impl fmt::Debug for FirestoreStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreStorage")
            .field("client", &"<reqwest::Client>")
            .field("project_id", &self.config.project_id)
            .field("api_key", &self.config.api_key.as_deref().map(|_| "<redacted>"))
            .field("poll_interval", &self.config.poll_interval)
            .finish()
    }
}

impl FirestoreStorage {
    pub fn new(config: FirestoreConfig) -> Result<Self> {
        if config.project_id.trim().is_empty() {
            return Err(Error::Config("Firestore project id is required".to_string()));
        }
        Url::parse(&config.host)
            .map_err(|e| Error::Config(format!("Invalid Firestore host {}: {}", config.host, e)))?;
        Ok(Self {
            client: Arc::new(Client::new()),
            config,
            identity: None,
        })
    }

    /// Authenticate requests with the id token of the signed-in identity.
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}/{}", self.config.host, self.config.documents_root(), collection, id)
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}/{}", self.config.host, self.config.documents_root(), collection)
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.config.documents_root(), collection, id)
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.config.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };
        match &self.identity {
            Some(identity) => match identity.id_token().await {
                Some(token) => request.bearer_auth(token),
                None => request,
            },
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)
            .await
            .send()
            .await
            .map_err(|e| Error::Network(format!("Firestore request failed: {}", e)))?;
        Ok(response)
    }

    async fn expect_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body["error"]["message"].as_str().unwrap_or("").to_string();
        let code = body["error"]["status"].as_str().unwrap_or("").to_string();
        Err(match (status, code.as_str()) {
            (StatusCode::FORBIDDEN, _) | (_, "PERMISSION_DENIED") => Error::PermissionDenied(message),
            _ => Error::Storage(format!("{} {} {}", status, code, message).trim().to_string()),
        })
    }

    async fn get_document<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>> {
        let response = self.send(self.client.get(self.document_url(collection, id))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: Value = Self::expect_success(response).await?.json().await?;
        let plain = value::decode_document(&document)?;
        Ok(Some(serde_json::from_value(plain)?))
    }

    /// Document body without the `id` field, which lives in the name.
    fn fields_of<T: Serialize>(item: &T) -> Result<Map<String, Value>> {
        let mut plain = match serde_json::to_value(item)? {
            Value::Object(map) => map,
            other => return Err(Error::Storage(format!("Expected an object, got {}", other))),
        };
        plain.remove("id");
        Ok(value::encode_fields(&plain))
    }

    async fn create_document(&self, collection: &str, id: Option<&str>, fields: Map<String, Value>) -> Result<String> {
        let mut request = self
            .client
            .post(self.collection_url(collection))
            .json(&json!({ "fields": fields }));
        if let Some(id) = id {
            request = request.query(&[("documentId", id)]);
        }
        let document: Value = Self::expect_success(self.send(request).await?).await?.json().await?;
        let name = document["name"]
            .as_str()
            .ok_or_else(|| Error::Storage("Created document has no name".to_string()))?;
        Ok(value::document_id(name).to_string())
    }

    /// Writes only the fields listed in the mask; fails if the document is missing.
    async fn patch_document(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<()> {
        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.clone()))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));
        let request = self
            .client
            .patch(self.document_url(collection, id))
            .query(&query)
            .json(&json!({ "fields": fields }));
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(collection, id));
        }
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let response = self.send(self.client.delete(self.document_url(collection, id))).await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn run_query<T: DeserializeOwned>(&self, structured_query: Value) -> Result<Vec<T>> {
        let url = format!("{}/{}:runQuery", self.config.host, self.config.documents_root());
        let request = self.client.post(url).json(&json!({ "structuredQuery": structured_query }));
        let rows: Vec<Value> = Self::expect_success(self.send(request).await?).await?.json().await?;
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(|document| {
                let plain = value::decode_document(document)?;
                Ok(serde_json::from_value(plain)?)
            })
            .collect()
    }

    async fn transform_saved(&self, user_id: &str, article_id: &str, transform: &str) -> Result<()> {
        let url = format!("{}/{}/documents:commit", self.config.host, self.config.database());
        let mut field_transform = json!({ "fieldPath": "savedArticles" });
        field_transform[transform] = json!({ "values": [{ "stringValue": article_id }] });
        let body = json!({
            "writes": [{
                "transform": {
                    "document": self.document_name(USERS, user_id),
                    "fieldTransforms": [field_transform]
                },
                "currentDocument": { "exists": true }
            }]
        });
        let response = self.send(self.client.post(url).json(&body)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(USERS, user_id));
        }
        Self::expect_success(response).await?;
        Ok(())
    }

    fn articles_query(filter: Option<Category>) -> Value {
        let mut query = json!({
            "from": [{ "collectionId": ARTICLES }],
            "orderBy": [{ "field": { "fieldPath": "publishedAt" }, "direction": "DESCENDING" }]
        });
        if let Some(category) = filter {
            query["where"] = equals("category", category.id());
        }
        query
    }

    fn comments_query(article_id: &str) -> Value {
        json!({
            "from": [{ "collectionId": COMMENTS }],
            "where": equals("articleId", article_id)
        })
    }

    fn spawn_poll<T, F, Fut>(&self, sink: SnapshotSink<T>, fetch: F)
    where
        T: PartialEq + Clone + Send + Sync + 'static,
        F: Fn(FirestoreStorage) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send,
    {
        let storage = self.clone();
        let interval = self.config.poll_interval;
        tokio::spawn(async move {
            let mut last: Option<T> = None;
            loop {
                match fetch(storage.clone()).await {
                    Ok(snapshot) => {
                        if last.as_ref() != Some(&snapshot) {
                            if !sink.send(snapshot.clone()).await {
                                break;
                            }
                            last = Some(snapshot);
                        }
                    }
                    Err(e) => tracing::warn!("Firestore live query failed: {}", e),
                }
                tokio::select! {
                    _ = sink.closed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            tracing::debug!("Firestore live query closed");
        });
    }
}

fn equals(field: &str, value: &str) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": field },
            "op": "EQUAL",
            "value": { "stringValue": value }
        }
    })
}

#[async_trait]
impl ArticleStore for FirestoreStorage {
    async fn create_article(&self, article: NewArticle) -> Result<String> {
        let id = format!("article-{}", Utc::now().timestamp_millis());
        let article = article.into_article(id.clone(), Utc::now());
        let fields = Self::fields_of(&article)?;
        let id = self.create_document(ARTICLES, Some(&id), fields).await?;
        tracing::info!("Created article {}", id);
        Ok(id)
    }

    async fn update_article(&self, id: &str, patch: &ArticlePatch) -> Result<()> {
        let fields = Self::fields_of(patch)?;
        if fields.is_empty() {
            return Ok(());
        }
        self.patch_document(ARTICLES, id, fields).await
    }

    async fn delete_article(&self, id: &str) -> Result<()> {
        self.delete_document(ARTICLES, id).await
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        self.get_document(ARTICLES, id).await
    }

    async fn list_articles(&self) -> Result<Vec<Article>> {
        self.run_query(Self::articles_query(None)).await
    }

    async fn list_by_category(&self, category: Category) -> Result<Vec<Article>> {
        self.run_query(Self::articles_query(Some(category))).await
    }
}

#[async_trait]
impl CommentStore for FirestoreStorage {
    async fn add_comment(&self, comment: NewComment) -> Result<String> {
        let comment = comment.into_comment(String::new(), Utc::now());
        let fields = Self::fields_of(&comment)?;
        self.create_document(COMMENTS, None, fields).await
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        self.get_document(COMMENTS, id).await
    }

    async fn delete_comment(&self, id: &str) -> Result<()> {
        self.delete_document(COMMENTS, id).await
    }

    async fn get_comments(&self, article_id: &str) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self.run_query(Self::comments_query(article_id)).await?;
        sort_comments(&mut comments);
        Ok(comments)
    }

    async fn subscribe_comments(&self, article_id: &str) -> Result<Subscription<Vec<Comment>>> {
        let (sink, subscription) = Subscription::channel();
        let article_id = article_id.to_string();
        self.spawn_poll(sink, move |storage| {
            let article_id = article_id.clone();
            async move { storage.get_comments(&article_id).await }
        });
        Ok(subscription)
    }
}

#[async_trait]
impl UserStore for FirestoreStorage {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.get_document(USERS, id).await
    }

    async fn put_user(&self, user: &User) -> Result<()> {
        let request = self
            .client
            .patch(self.document_url(USERS, &user.id))
            .json(&json!({ "fields": Self::fields_of(user)? }));
        Self::expect_success(self.send(request).await?).await?;
        Ok(())
    }

    async fn merge_user(&self, id: &str, patch: &UserPatch) -> Result<()> {
        let fields = Self::fields_of(patch)?;
        if fields.is_empty() {
            return Ok(());
        }
        self.patch_document(USERS, id, fields).await
    }

    async fn add_saved_article(&self, user_id: &str, article_id: &str) -> Result<()> {
        self.transform_saved(user_id, article_id, "appendMissingElements").await
    }

    async fn remove_saved_article(&self, user_id: &str, article_id: &str) -> Result<()> {
        self.transform_saved(user_id, article_id, "removeAllFromArray").await
    }

    async fn subscribe_user(&self, id: &str) -> Result<Subscription<Option<User>>> {
        let (sink, subscription) = Subscription::channel();
        let id = id.to_string();
        self.spawn_poll(sink, move |storage| {
            let id = id.clone();
            async move { storage.get_user(&id).await }
        });
        Ok(subscription)
    }
}

impl DocumentStore for FirestoreStorage {
    fn name(&self) -> &str {
        "firestore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_project_id() {
        assert!(matches!(
            FirestoreStorage::new(FirestoreConfig::new(" ")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_urls() {
        let storage = FirestoreStorage::new(FirestoreConfig::new("news")).unwrap();
        assert_eq!(
            storage.document_url(ARTICLES, "a1"),
            "https://firestore.googleapis.com/v1/projects/news/databases/(default)/documents/articles/a1"
        );
        assert_eq!(
            storage.document_name(USERS, "u1"),
            "projects/news/databases/(default)/documents/users/u1"
        );
    }

    #[test]
    fn test_fields_drop_id() {
        let user = User::new_profile("u1", "a@b.c", "Ann");
        let fields = FirestoreStorage::fields_of(&user).unwrap();
        assert!(fields.get("id").is_none());
        assert_eq!(fields["role"], json!({ "stringValue": "user" }));
        assert_eq!(fields["savedArticles"], json!({ "arrayValue": { "values": [] } }));
    }

    #[test]
    fn test_category_query_filters_and_orders() {
        let query = FirestoreStorage::articles_query(Some(Category::Sports));
        assert_eq!(query["where"]["fieldFilter"]["value"]["stringValue"], "sports");
        assert_eq!(query["orderBy"][0]["direction"], "DESCENDING");
        assert!(FirestoreStorage::articles_query(None).get("where").is_none());
    }
}
