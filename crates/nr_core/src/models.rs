use async_trait::async_trait;
use std::fmt;
use crate::types::Recommendations;
use crate::Result;

pub const DEFAULT_SUMMARY_MAX: u32 = 2048;
pub const DEFAULT_SUMMARY_MIN: u32 = 50;
pub const DEFAULT_TOP_K: usize = 5;

/// Length hints passed to the summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryLength {
    pub min: u32,
    pub max: u32,
}

impl Default for SummaryLength {
    fn default() -> Self {
        Self {
            min: DEFAULT_SUMMARY_MIN,
            max: DEFAULT_SUMMARY_MAX,
        }
    }
}

#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Summarize article text; markup is stripped before it is sent
    async fn summarize(&self, content: &str, length: SummaryLength) -> Result<String>;

    /// Recommend articles for a category or free-text query
    async fn recommend(&self, query: &str, top_k: usize) -> Result<Recommendations>;

    /// Whether the model endpoint is reachable
    async fn health(&self) -> Result<bool>;
}
