use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub favorite_topics: Vec<String>,
    #[serde(default)]
    pub saved_articles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A fresh profile for a newly seen identity.
    pub fn new_profile(id: &str, email: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            avatar: None,
            role: Role::User,
            favorite_topics: Vec::new(),
            saved_articles: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_saved(&self, article_id: &str) -> bool {
        self.saved_articles.iter().any(|id| id == article_id)
    }

    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(avatar) = &patch.avatar {
            self.avatar = Some(avatar.clone());
        }
        if let Some(topics) = &patch.favorite_topics {
            self.favorite_topics = topics.clone();
        }
    }
}

/// Fields a signed-in user may change on their own profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_topics: Option<Vec<String>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar.is_none() && self.favorite_topics.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Business,
    Sports,
    Health,
    Science,
    General,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Technology,
        Category::Business,
        Category::Sports,
        Category::Health,
        Category::Science,
        Category::General,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Business => "business",
            Category::Sports => "sports",
            Category::Health => "health",
            Category::Science => "science",
            Category::General => "general",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Technology => "Technology",
            Category::Business => "Business",
            Category::Sports => "Sports",
            Category::Health => "Health",
            Category::Science => "Science",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .find(|c| c.id() == needle || c.display_name().to_lowercase() == needle)
            .copied()
            .ok_or_else(|| crate::Error::Validation(format!("Unknown category: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    pub category: Category,
    pub image_url: String,
    pub published_at: DateTime<Utc>,
    pub read_time: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: u64,
}

/// An article as submitted for creation; the store assigns the id and fills
/// in the publish time and view counter when they are left unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,
    pub subtitle: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    pub category: Category,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub read_time: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

impl NewArticle {
    pub fn into_article(self, id: String, now: DateTime<Utc>) -> Article {
        Article {
            id,
            title: self.title,
            subtitle: self.subtitle,
            content: self.content,
            ai_summary: self.ai_summary,
            author: self.author,
            author_avatar: self.author_avatar,
            category: self.category,
            image_url: self.image_url,
            published_at: self.published_at.unwrap_or(now),
            read_time: self.read_time,
            tags: self.tags,
            views: self.views.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

impl ArticlePatch {
    pub fn apply(&self, article: &mut Article) {
        if let Some(v) = &self.title {
            article.title = v.clone();
        }
        if let Some(v) = &self.subtitle {
            article.subtitle = v.clone();
        }
        if let Some(v) = &self.content {
            article.content = v.clone();
        }
        if let Some(v) = &self.ai_summary {
            article.ai_summary = Some(v.clone());
        }
        if let Some(v) = &self.author {
            article.author = v.clone();
        }
        if let Some(v) = self.category {
            article.category = v;
        }
        if let Some(v) = &self.image_url {
            article.image_url = v.clone();
        }
        if let Some(v) = self.published_at {
            article.published_at = v;
        }
        if let Some(v) = self.read_time {
            article.read_time = v;
        }
        if let Some(v) = &self.tags {
            article.tags = v.clone();
        }
        if let Some(v) = self.views {
            article.views = v;
        }
    }
}

impl From<NewArticle> for ArticlePatch {
    fn from(article: NewArticle) -> Self {
        Self {
            title: Some(article.title),
            subtitle: Some(article.subtitle),
            content: Some(article.content),
            ai_summary: article.ai_summary,
            author: Some(article.author),
            category: Some(article.category),
            image_url: Some(article.image_url),
            published_at: article.published_at,
            read_time: Some(article.read_time),
            tags: Some(article.tags),
            views: article.views,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub article_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: u64,
}

impl Comment {
    /// Authors may delete their own comments; administrators may delete any.
    pub fn can_be_deleted_by(&self, user: &User) -> bool {
        user.is_admin() || self.user_id == user.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub article_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    pub content: String,
}

impl NewComment {
    pub fn into_comment(self, id: String, now: DateTime<Utc>) -> Comment {
        Comment {
            id,
            article_id: self.article_id,
            user_id: self.user_id,
            user_name: self.user_name,
            user_avatar: self.user_avatar,
            content: self.content,
            created_at: now,
            likes: 0,
        }
    }
}

/// Newest first.
pub fn sort_comments(comments: &mut [Comment]) {
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Newest first.
pub fn sort_articles(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// An article-like object returned by the recommendation endpoint when it
/// recommends content from outside the article store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// The two shapes the recommendation endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recommendations {
    Ids(Vec<String>),
    External(Vec<ExternalArticle>),
}

impl Recommendations {
    pub fn len(&self) -> usize {
        match self {
            Recommendations::Ids(ids) => ids.len(),
            Recommendations::External(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
