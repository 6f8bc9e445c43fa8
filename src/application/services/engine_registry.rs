use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use crate::application::ports::{EngineLoader, TranscriptionEngine, TranscriptionError};
use crate::domain::WhisperModel;

type EngineCell = Arc<OnceCell<Arc<dyn TranscriptionEngine>>>;

/// One engine per model identifier, loaded lazily on first use.
///
/// Concurrent callers asking for the same model wait on a single load. A failed
/// load leaves the slot empty so a later request can try again.
pub struct EngineRegistry {
    loader: Arc<dyn EngineLoader>,
    engines: Mutex<HashMap<WhisperModel, EngineCell>>,
}

impl EngineRegistry {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            engines: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_load(
        &self,
        model: WhisperModel,
    ) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError> {
        let cell = {
            let mut engines = self.engines.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(engines.entry(model).or_default())
        };

        let engine = cell
            .get_or_try_init(|| async {
                tracing::info!(model = %model, "Loading transcription engine");
                self.loader.load(model).await
            })
            .await?;

        Ok(Arc::clone(engine))
    }

    pub fn is_loaded(&self, model: WhisperModel) -> bool {
        self.engines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&model)
            .is_some_and(|cell| cell.initialized())
    }
}
