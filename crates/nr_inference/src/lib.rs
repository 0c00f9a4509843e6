use std::env;
use std::time::Duration;

use nr_core::Result;

pub mod models;
pub mod recommendations;
pub mod text;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the hosted model lives and how long a request may take.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub model_url: Option<String>,
    pub timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl InferenceConfig {
    pub fn new(model_url: impl Into<String>) -> Self {
        Self {
            model_url: Some(model_url.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub model_name: Option<String>,
    pub inference_config: InferenceConfig,
}

impl Config {
    /// Reads `NR_MODEL` and `NR_MODEL_URL`.
    pub fn from_env() -> Self {
        Self {
            model_name: env::var("NR_MODEL").ok().filter(|v| !v.trim().is_empty()),
            inference_config: InferenceConfig {
                model_url: env::var("NR_MODEL_URL").ok().filter(|v| !v.trim().is_empty()),
                ..InferenceConfig::default()
            },
        }
    }
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::recommendations::RecommendationResolver;
    pub use super::{Config, InferenceConfig};
    pub use nr_core::{Error, InferenceModel, Recommendations, Result, SummaryLength};
}

pub use models::create_model;
pub use recommendations::RecommendationResolver;
