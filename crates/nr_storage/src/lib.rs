use nr_core::{DocumentStore, Error, IdentityProvider, Result};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub mod backends;
pub mod seed;

pub use backends::*;
pub use seed::{clear_articles, seed_articles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StorageKind {
    #[default]
    Memory,
    Firestore,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub poll_interval: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            project_id: None,
            api_key: None,
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl StorageConfig {
    /// Reads `NR_STORAGE`, `FIREBASE_PROJECT_ID` and `FIREBASE_API_KEY`.
    pub fn from_env() -> Self {
        let kind = match env::var("NR_STORAGE").ok().as_deref() {
            Some("firestore") => StorageKind::Firestore,
            _ => StorageKind::Memory,
        };
        Self {
            kind,
            project_id: env::var("FIREBASE_PROJECT_ID").ok(),
            api_key: env::var("FIREBASE_API_KEY").ok(),
            ..Default::default()
        }
    }
}

pub async fn create_storage(
    config: &StorageConfig,
    identity: Option<Arc<dyn IdentityProvider>>,
) -> Result<Arc<dyn DocumentStore>> {
    match config.kind {
        StorageKind::Memory => {
            if identity.is_some() {
                debug!("In-memory storage does not authenticate requests");
            }
            Ok(Arc::new(MemoryStorage::new()))
        }
        #[cfg(feature = "firestore")]
        StorageKind::Firestore => {
            let project_id = config
                .project_id
                .clone()
                .ok_or_else(|| Error::Config("FIREBASE_PROJECT_ID is not set".to_string()))?;
            let mut firestore_config = FirestoreConfig::new(&project_id);
            firestore_config.api_key = config.api_key.clone();
            firestore_config.poll_interval = config.poll_interval;
            let mut storage = FirestoreStorage::new(firestore_config)?;
            if let Some(identity) = identity {
                storage = storage.with_identity(identity);
            }
            Ok(Arc::new(storage))
        }
        #[cfg(not(feature = "firestore"))]
        StorageKind::Firestore => Err(Error::Config(
            "Firestore support is not compiled in (enable the `firestore` feature)".to_string(),
        )),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageConfig, StorageKind};
}

#[cfg(test)]
mod tests {
    use super::*;
    use nr_core::ArticleStore;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage(&StorageConfig::default(), None).await.unwrap();
        assert_eq!(storage.name(), "memory");
        assert!(storage.list_articles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_firestore_requires_project() {
        let config = StorageConfig {
            kind: StorageKind::Firestore,
            ..Default::default()
        };
        assert!(matches!(create_storage(&config, None).await, Err(Error::Config(_))));
    }
}
