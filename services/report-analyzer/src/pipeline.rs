//! Per-message analysis: envelope → record → prompt → model → answer → store.

use serde_json::Value;
use shared::db::ReportStore;
use shared::dto::{PersistedAnswer, QueueMessage, ReportId};
use shared::error::{InferenceError, StoreError};
use shared::inference::InferenceGateway;
use strum_macros::Display;
use thiserror::Error;
use tracing::debug;

use crate::answer::{parse_answer, AnswerError};
use crate::message::{report_id_from_body, MessageError};
use crate::prompt::build_prompt;

/// Failure taxonomy used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FailureKind {
    MalformedMessage,
    NotFound,
    InvocationError,
    MalformedModelOutput,
    StoreError,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] MessageError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("inference error: {0}")]
    Invocation(#[from] InferenceError),
    #[error("malformed model output: {source}")]
    MalformedModelOutput {
        #[source]
        source: AnswerError,
        /// Full endpoint response, kept for diagnosis.
        raw: Value,
    },
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::MalformedMessage(_) => FailureKind::MalformedMessage,
            PipelineError::Store(_) => FailureKind::StoreError,
            PipelineError::Invocation(_) => FailureKind::InvocationError,
            PipelineError::MalformedModelOutput { .. } => FailureKind::MalformedModelOutput,
        }
    }

    /// Whether a redelivery of the same message could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Store(e) => e.is_transient(),
            PipelineError::Invocation(e) => e.is_transient(),
            PipelineError::MalformedMessage(_) | PipelineError::MalformedModelOutput { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingReportId,
    ReportNotFound(ReportId),
}

impl SkipReason {
    pub fn kind(&self) -> FailureKind {
        match self {
            SkipReason::MissingReportId => FailureKind::MalformedMessage,
            SkipReason::ReportNotFound(_) => FailureKind::NotFound,
        }
    }
}

/// Result of handling one message. Nothing escapes a message except this value.
#[derive(Debug)]
pub enum Outcome {
    Processed(PersistedAnswer),
    Skipped(SkipReason),
    Failed {
        report_id: Option<ReportId>,
        error: PipelineError,
    },
}

impl Outcome {
    pub fn report_id(&self) -> Option<&ReportId> {
        match self {
            Outcome::Processed(p) => Some(&p.report_id),
            Outcome::Skipped(SkipReason::ReportNotFound(id)) => Some(id),
            Outcome::Skipped(SkipReason::MissingReportId) => None,
            Outcome::Failed { report_id, .. } => report_id.as_ref(),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Outcome::Processed(_) => None,
            Outcome::Skipped(reason) => Some(reason.kind()),
            Outcome::Failed { error, .. } => Some(error.kind()),
        }
    }
}

/// Gateways are built once per batch and shared by every message in it.
pub struct ReportPipeline<S, I> {
    store: S,
    inference: I,
}

impl<S, I> ReportPipeline<S, I>
where
    S: ReportStore,
    I: InferenceGateway,
{
    pub fn new(store: S, inference: I) -> Self {
        Self { store, inference }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn inference(&self) -> &I {
        &self.inference
    }

    pub async fn process_message(&self, message: &QueueMessage) -> Outcome {
        let report_id = match report_id_from_body(&message.body) {
            Ok(Some(id)) => id,
            Ok(None) => return Outcome::Skipped(SkipReason::MissingReportId),
            Err(e) => {
                return Outcome::Failed {
                    report_id: None,
                    error: e.into(),
                }
            }
        };

        match self.analyze(&report_id).await {
            Ok(Some(persisted)) => Outcome::Processed(persisted),
            Ok(None) => Outcome::Skipped(SkipReason::ReportNotFound(report_id)),
            Err(error) => Outcome::Failed {
                report_id: Some(report_id),
                error,
            },
        }
    }

    /// `Ok(None)` when the store has no such report.
    async fn analyze(&self, report_id: &ReportId) -> Result<Option<PersistedAnswer>, PipelineError> {
        let Some(record) = self.store.fetch_report_details(report_id).await? else {
            return Ok(None);
        };

        let prompt = build_prompt(&record);
        debug!(%report_id, fields = record.len(), prompt_chars = prompt.len(), "prompt built");

        let raw = self.inference.invoke(&prompt).await?;
        let answer = parse_answer(&raw)
            .map_err(|source| PipelineError::MalformedModelOutput { source, raw })?;

        self.store.persist_answer(report_id, &answer).await?;
        Ok(Some(PersistedAnswer {
            report_id: report_id.clone(),
            answer,
        }))
    }
}
