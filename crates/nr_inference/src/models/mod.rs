use std::sync::Arc;

use nr_core::{Error, InferenceModel, Result};
use tracing::info;

use crate::Config;

pub mod dummy;
pub mod remote;

pub use dummy::DummyModel;
pub use remote::RemoteModel;

pub async fn create_model(config: Option<Config>) -> Result<Arc<dyn InferenceModel>> {
    let config = config.unwrap_or_default();
    let model: Arc<dyn InferenceModel> = match config.model_name.as_deref() {
        None | Some("remote") => Arc::new(RemoteModel::new(&config.inference_config)?),
        Some("dummy") => Arc::new(DummyModel::new(Some(config.clone())).await?),
        Some(other) => {
            return Err(Error::Config(format!(
                "Unknown model: {} (expected remote or dummy)",
                other
            )))
        }
    };
    info!("🧠 Using {} model", model.name());
    Ok(model)
}
