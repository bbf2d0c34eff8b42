//! Queue message envelope: `{"report_id": ...}`.

use serde_json::Value;
use shared::dto::ReportId;
use thiserror::Error;

const REPORT_ID_FIELD: &str = "report_id";

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("body is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("body is not a JSON object")]
    NotAnObject,
    #[error("unsupported report_id value: {0}")]
    InvalidReportId(Value),
}

/// Pull the report id out of a message body.
///
/// `Ok(None)` when the field is absent or empty (`null`, blank, `0`, `false`).
/// String ids are kept exactly as delivered.
pub fn report_id_from_body(body: &str) -> Result<Option<ReportId>, MessageError> {
    let envelope: Value = serde_json::from_str(body).map_err(MessageError::NotJson)?;
    let Value::Object(fields) = envelope else {
        return Err(MessageError::NotAnObject);
    };

    match fields.get(REPORT_ID_FIELD) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) => Ok((!s.trim().is_empty()).then(|| ReportId::new(s.as_str()))),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok((i != 0).then(|| ReportId::new(i.to_string())))
            } else if let Some(u) = n.as_u64() {
                Ok(Some(ReportId::new(u.to_string())))
            } else if let Some(i) = n.as_f64().and_then(integral) {
                Ok((i != 0).then(|| ReportId::new(i.to_string())))
            } else {
                Err(MessageError::InvalidReportId(Value::Number(n.clone())))
            }
        }
        Some(other) => Err(MessageError::InvalidReportId(other.clone())),
    }
}

/// `17.0` → `17`; fractional or out-of-range values have no integer form.
fn integral(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}
