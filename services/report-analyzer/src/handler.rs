use shared::config::Settings;
use shared::db::PgReportStore;
use shared::dto::QueueMessage;
use shared::error::{InferenceError, StoreError};
use shared::inference::BedrockClient;
use thiserror::Error;

use crate::batch::process_batch;
use crate::pipeline::ReportPipeline;

/// The batch could not start; no message has been looked at.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("inference client unavailable: {0}")]
    Inference(#[from] InferenceError),
    #[error("report store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Handle one delivered batch with a fresh store connection and model client.
pub async fn handle_batch(settings: &Settings, messages: &[QueueMessage]) -> Result<(), HandlerError> {
    let inference = BedrockClient::from_settings(&settings.inference)?;
    let store = PgReportStore::connect(&settings.store).await?;
    let pipeline = ReportPipeline::new(store, inference);
    process_batch(&pipeline, messages).await;
    Ok(())
}
