//! Batch driver: every message is run through the pipeline, in delivery
//! order, whatever happened to the previous one.

use shared::db::ReportStore;
use shared::dto::QueueMessage;
use shared::inference::InferenceGateway;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::pipeline::{Outcome, PipelineError, ReportPipeline, SkipReason};

const UNKNOWN_REPORT: &str = "unknown";

#[derive(Debug, Default)]
struct Tally {
    processed: usize,
    skipped: usize,
    failed: usize,
}

pub async fn process_batch<S, I>(pipeline: &ReportPipeline<S, I>, messages: &[QueueMessage])
where
    S: ReportStore,
    I: InferenceGateway,
{
    let batch_id = Uuid::new_v4();
    info!(%batch_id, size = messages.len(), "processing batch");

    let mut tally = Tally::default();
    for message in messages {
        let outcome = pipeline.process_message(message).await;
        match &outcome {
            Outcome::Processed(_) => tally.processed += 1,
            Outcome::Skipped(_) => tally.skipped += 1,
            Outcome::Failed { .. } => tally.failed += 1,
        }
        log_outcome(message, &outcome);
    }

    info!(
        %batch_id,
        processed = tally.processed,
        skipped = tally.skipped,
        failed = tally.failed,
        "batch finished"
    );
}

fn log_outcome(message: &QueueMessage, outcome: &Outcome) {
    let message_id = message.message_id.as_str();
    let report_id = outcome
        .report_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| UNKNOWN_REPORT.to_string());

    match outcome {
        Outcome::Processed(p) => info!(
            message_id,
            %report_id,
            priority = %p.answer.priority,
            "report has been processed and recorded"
        ),
        Outcome::Skipped(reason) => match reason {
            SkipReason::MissingReportId => {
                warn!(message_id, kind = %reason.kind(), "report id not found in the message")
            }
            SkipReason::ReportNotFound(_) => {
                warn!(message_id, %report_id, kind = %reason.kind(), "report not found")
            }
        },
        Outcome::Failed { error, .. } => match error {
            PipelineError::MalformedModelOutput { raw, .. } => error!(
                message_id,
                %report_id,
                kind = %error.kind(),
                retryable = error.is_retryable(),
                %error,
                %raw,
                "incomplete model response"
            ),
            _ => error!(
                message_id,
                %report_id,
                kind = %error.kind(),
                retryable = error.is_retryable(),
                %error,
                "error processing report"
            ),
        },
    }
}
