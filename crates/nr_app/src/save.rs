use nr_core::{Result, UserStore};
use tracing::debug;

use crate::context::AppContext;

/// Bookmark state of one article for whoever is signed in when the toggle
/// is used. Writes go straight to the store and are not rolled back locally
/// on failure.
pub struct SaveToggle {
    ctx: AppContext,
    article_id: String,
    saved: bool,
    /// User the local `saved` flag was read for.
    checked_for: Option<String>,
}

impl SaveToggle {
    pub fn new(ctx: AppContext, article_id: &str) -> Self {
        Self {
            ctx,
            article_id: article_id.to_string(),
            saved: false,
            checked_for: None,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Reads the current user's saved list from the store; signed-out users
    /// have none.
    pub async fn check(&mut self) -> Result<bool> {
        let user_id = self.ctx.current_user().map(|u| u.id);
        self.saved = match &user_id {
            Some(user_id) => self
                .ctx
                .store
                .get_user(user_id)
                .await?
                .map_or(false, |user| user.has_saved(&self.article_id)),
            None => false,
        };
        self.checked_for = user_id;
        Ok(self.saved)
    }

    pub async fn toggle(&mut self) -> Result<bool> {
        let user = self.ctx.require_user("save articles")?;
        if self.checked_for.as_deref() != Some(user.id.as_str()) {
            self.check().await?;
        }
        if self.saved {
            self.ctx.store.remove_saved_article(&user.id, &self.article_id).await?;
        } else {
            self.ctx.store.add_saved_article(&user.id, &self.article_id).await?;
        }
        self.saved = !self.saved;
        debug!("Article {} saved={} for {}", self.article_id, self.saved, user.id);
        Ok(self.saved)
    }
}
