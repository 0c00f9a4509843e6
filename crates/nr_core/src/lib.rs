pub mod error;
pub mod identity;
pub mod models;
pub mod storage;
pub mod subscription;
pub mod types;

pub use error::{AuthError, Error, Result};
pub use identity::{AuthState, AuthUser, IdentityProvider, ProviderKind};
pub use models::{InferenceModel, SummaryLength};
pub use storage::{ArticleStore, CommentStore, DocumentStore, UserStore};
pub use subscription::{SnapshotSink, Subscription};
pub use types::*;
