//! Gateway to the relational store holding the reports.
//!
//! Both operations go through stored routines with bound parameters; the
//! identifier is never spliced into SQL text.

use std::future::Future;

use async_trait::async_trait;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use serde_json::Value;
use tokio_postgres::{config::SslMode as PgSslMode, Client, Config, NoTls};
use tracing::{error, info};

use crate::config::{SslMode, StoreSettings};
use crate::dto::{ModelAnswer, ReportId, ReportRecord};
use crate::error::StoreError;

const FETCH_REPORT_SQL: &str =
    "SELECT to_jsonb(r.*) AS data FROM get_report_details_for_ai_process($1::text) r";

const PERSIST_ANSWER_SQL: &str =
    "CALL create_report_details_with_ai_answer($1::text, $2::text, $3::text, $4::text, $5::int)";

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// First record returned for `report_id`, or `None` when the store has none.
    async fn fetch_report_details(
        &self,
        report_id: &ReportId,
    ) -> Result<Option<ReportRecord>, StoreError>;

    /// Write the answer for `report_id`. Commits on its own.
    async fn persist_answer(
        &self,
        report_id: &ReportId,
        answer: &ModelAnswer,
    ) -> Result<(), StoreError>;
}

/// Postgres implementation holding a single connection.
pub struct PgReportStore {
    client: Option<Client>,
}

impl PgReportStore {
    /// A store without a connection; every operation fails with
    /// [`StoreError::NotConnected`] until [`connect_to_db`](Self::connect_to_db) succeeds.
    pub fn disconnected() -> Self {
        Self { client: None }
    }

    pub async fn connect(settings: &StoreSettings) -> Result<Self, StoreError> {
        let mut store = Self::disconnected();
        store.connect_to_db(settings).await?;
        Ok(store)
    }

    pub async fn connect_to_db(&mut self, settings: &StoreSettings) -> Result<(), StoreError> {
        let mut config = Config::new();
        config
            .host(&settings.host)
            .port(settings.port)
            .user(&settings.user)
            .password(&settings.password)
            .dbname(&settings.database)
            .ssl_mode(match settings.ssl_mode {
                SslMode::Disable => PgSslMode::Disable,
                SslMode::Prefer => PgSslMode::Prefer,
                SslMode::Require => PgSslMode::Require,
            });

        let client = if settings.ssl_mode == SslMode::Disable {
            let (client, connection) = config.connect(NoTls).await.map_err(StoreError::Connect)?;
            spawn_connection(connection);
            client
        } else {
            let tls = MakeTlsConnector::new(TlsConnector::builder().build()?);
            let (client, connection) = config.connect(tls).await.map_err(StoreError::Connect)?;
            spawn_connection(connection);
            client
        };

        info!(host = %settings.host, database = %settings.database, "connected to report store");
        self.client = Some(client);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(|c| !c.is_closed())
    }

    fn client(&self) -> Result<&Client, StoreError> {
        self.client.as_ref().ok_or(StoreError::NotConnected)
    }
}

fn spawn_connection<F>(connection: F)
where
    F: Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(%e, "report store connection ended with error");
        }
    });
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn fetch_report_details(
        &self,
        report_id: &ReportId,
    ) -> Result<Option<ReportRecord>, StoreError> {
        let rows = self
            .client()?
            .query(FETCH_REPORT_SQL, &[&report_id.as_str()])
            .await
            .map_err(StoreError::Query)?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let data: Value = row
            .try_get(0)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        match data {
            Value::Object(record) => Ok(Some(record)),
            other => Err(StoreError::Decode(format!(
                "expected a JSON object per report row, got {other}"
            ))),
        }
    }

    async fn persist_answer(
        &self,
        report_id: &ReportId,
        answer: &ModelAnswer,
    ) -> Result<(), StoreError> {
        self.client()?
            .execute(
                PERSIST_ANSWER_SQL,
                &[
                    &report_id.as_str(),
                    &answer.recommendation,
                    &answer.short_answer,
                    &answer.official_summary,
                    &answer.priority.id(),
                ],
            )
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::Priority;

    fn answer() -> ModelAnswer {
        ModelAnswer {
            recommendation: "fix it".into(),
            short_answer: "thanks".into(),
            official_summary: "broken lamp".into(),
            priority: Priority::Low,
        }
    }

    #[tokio::test]
    async fn operations_require_a_connection() {
        let store = PgReportStore::disconnected();
        assert!(!store.is_connected());

        let id = ReportId::new("42");
        let fetched = store.fetch_report_details(&id).await;
        assert!(matches!(fetched, Err(StoreError::NotConnected)));

        let persisted = store.persist_answer(&id, &answer()).await;
        assert!(matches!(persisted, Err(StoreError::NotConnected)));
    }

    #[test]
    fn identifier_is_always_bound() {
        assert!(FETCH_REPORT_SQL.contains("$1"));
        assert!(PERSIST_ANSWER_SQL.contains("$5"));
        assert!(!FETCH_REPORT_SQL.contains('\''));
    }
}
