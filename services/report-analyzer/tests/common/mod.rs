#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::db::ReportStore;
use shared::dto::{ModelAnswer, ReportId, ReportRecord};
use shared::error::{InferenceError, StoreError};
use shared::inference::InferenceGateway;

/// In-memory store recording every call.
#[derive(Default)]
pub struct StubStore {
    pub reports: HashMap<String, ReportRecord>,
    pub fail_persist_for: Vec<String>,
    pub fetches: Mutex<Vec<String>>,
    pub persisted: Mutex<Vec<(String, ModelAnswer)>>,
}

impl StubStore {
    pub fn with_reports<I>(reports: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        let reports = reports
            .into_iter()
            .map(|(id, v)| match v {
                Value::Object(m) => (id.to_string(), m),
                _ => panic!("report fixture must be an object"),
            })
            .collect();
        Self {
            reports,
            ..Default::default()
        }
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn persisted(&self) -> Vec<(String, ModelAnswer)> {
        self.persisted.lock().unwrap().clone()
    }

    pub fn persisted_ids(&self) -> Vec<String> {
        self.persisted().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl ReportStore for StubStore {
    async fn fetch_report_details(
        &self,
        report_id: &ReportId,
    ) -> Result<Option<ReportRecord>, StoreError> {
        self.fetches.lock().unwrap().push(report_id.to_string());
        Ok(self.reports.get(report_id.as_str()).cloned())
    }

    async fn persist_answer(
        &self,
        report_id: &ReportId,
        answer: &ModelAnswer,
    ) -> Result<(), StoreError> {
        if self.fail_persist_for.iter().any(|id| id == report_id.as_str()) {
            return Err(StoreError::Decode("rejected by store".into()));
        }
        self.persisted
            .lock()
            .unwrap()
            .push((report_id.to_string(), answer.clone()));
        Ok(())
    }
}

type Responder = Box<dyn Fn(&str) -> Result<Value, InferenceError> + Send + Sync>;

/// Model stub answering through a closure over the prompt text.
pub struct StubModel {
    respond: Responder,
    pub prompts: Mutex<Vec<String>>,
}

impl StubModel {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Result<Value, InferenceError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with the same text.
    pub fn fixed(text: String) -> Self {
        Self::new(move |_| Ok(model_response(&text)))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceGateway for StubModel {
    async fn invoke(&self, prompt: &str) -> Result<Value, InferenceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt)
    }
}

/// Response body in the shape the model runtime returns.
pub fn model_response(text: &str) -> Value {
    json!({
        "output": {
            "message": {
                "role": "assistant",
                "content": [{ "text": text }]
            }
        },
        "stopReason": "end_turn",
        "usage": { "inputTokens": 812, "outputTokens": 164 }
    })
}

pub fn answer_text(priority: Value) -> String {
    json!({
        "recommendation": "Dispatch the maintenance crew and close the area until repaired.",
        "short_answer": "We have reviewed your report and will take appropriate action as soon as possible.",
        "official_summary": "Damaged railing reported at the north entrance.",
        "suggest_priority_id": priority
    })
    .to_string()
}

pub fn report(id: u64, description: &str) -> Value {
    json!({
        "report_id": id,
        "title": format!("Report {id}"),
        "description": description,
        "location": "Plaza Mayor 1"
    })
}
