use anyhow::Context;
use rdkafka::consumer::{CommitMode, Consumer};
use report_analyzer::handler::handle_batch;
use shared::config::Settings;
use shared::kafka;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let settings = Settings::new().context("loading configuration")?;
    let queue = &settings.queue;

    if let Err(e) = kafka::ensure_report_topic(queue).await {
        warn!(%e, topic = %queue.topic, "could not ensure report topic (continuing)");
    }

    let consumer = kafka::batch_consumer(queue).map_err(|e| {
        error!(%e, topic = %queue.topic, "failed to create kafka consumer");
        e
    })?;

    info!(
        brokers = %queue.brokers,
        topic = %queue.topic,
        batch_size = queue.batch_size,
        model = %settings.inference.model_id,
        "report-analyzer started"
    );

    loop {
        let batch = kafka::next_batch(&consumer, queue).await;
        // Offsets stay uncommitted so the batch is redelivered after restart.
        handle_batch(&settings, &batch).await.map_err(|e| {
            error!(%e, size = batch.len(), "batch aborted before processing");
            e
        })?;
        if let Err(e) = consumer.commit_consumer_state(CommitMode::Async) {
            warn!(%e, "failed to commit offsets");
        }
    }
}
