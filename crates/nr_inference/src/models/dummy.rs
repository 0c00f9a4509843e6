use std::fmt;

use nr_core::{Error, InferenceModel, Recommendations, Result, SummaryLength};

use crate::text::strip_markup;
use crate::Config;

/// Offline stand-in for the hosted model.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub async fn new(_config: Option<Config>) -> Result<Self> {
        Ok(Self)
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    async fn summarize(&self, content: &str, length: SummaryLength) -> Result<String> {
        let text = strip_markup(content);
        if text.is_empty() {
            return Err(Error::Validation("Content cannot be empty".to_string()));
        }
        // First 20 words, cut to the max length on a char boundary
        let words: Vec<&str> = text.split_whitespace().take(20).collect();
        Ok(words
            .join(" ")
            .chars()
            .take(length.max as usize)
            .collect())
    }

    async fn recommend(&self, query: &str, _top_k: usize) -> Result<Recommendations> {
        if query.trim().is_empty() {
            return Err(Error::Validation("Query must be a non-empty string".to_string()));
        }
        Ok(Recommendations::Ids(Vec::new()))
    }

    async fn health(&self) -> Result<bool> {
        Ok(true)
    }
}
