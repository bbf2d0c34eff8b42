//! Kafka plumbing feeding the batch driver: topic bootstrap, a consumer with
//! manual commits and batch assembly.

use std::time::Duration;

use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::BorrowedMessage;
use rdkafka::{ClientConfig, Message};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::config::QueueSettings;
use crate::dto::QueueMessage;

/// Whether the report topic had to be created on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicState {
    Created,
    AlreadyExists,
}

/// Create the topic carrying report ids unless the broker already has it.
/// A fresh topic gets one partition, so batches keep delivery order.
pub async fn ensure_report_topic(settings: &QueueSettings) -> Result<TopicState, KafkaError> {
    let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", &settings.brokers)
        .create()?;
    let topic = NewTopic::new(&settings.topic, 1, TopicReplication::Fixed(1));
    let results = admin.create_topics([&topic], &AdminOptions::new()).await?;

    match results.into_iter().next() {
        Some(Ok(_)) => {
            info!(topic = %settings.topic, brokers = %settings.brokers, "report topic created");
            Ok(TopicState::Created)
        }
        Some(Err((_, RDKafkaErrorCode::TopicAlreadyExists))) => {
            debug!(topic = %settings.topic, "report topic already exists");
            Ok(TopicState::AlreadyExists)
        }
        Some(Err((_, code))) => Err(KafkaError::AdminOp(code)),
        None => Err(KafkaError::AdminOpCreation(format!(
            "broker returned no result for topic {}",
            settings.topic
        ))),
    }
}

fn consumer_config(settings: &QueueSettings) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("group.id", &settings.group_id)
        .set("bootstrap.servers", &settings.brokers)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest");
    config
}

/// Consumer subscribed to the report topic. Offsets are committed by the
/// caller once a batch has been handled.
pub fn batch_consumer(settings: &QueueSettings) -> Result<StreamConsumer, KafkaError> {
    let consumer: StreamConsumer = consumer_config(settings).create()?;
    consumer.subscribe(&[settings.topic.as_str()])?;
    Ok(consumer)
}

/// Wait for the next message, then keep collecting until `batch_size`
/// messages arrived or `batch_window_ms` elapsed.
pub async fn next_batch(consumer: &StreamConsumer, settings: &QueueSettings) -> Vec<QueueMessage> {
    let max = settings.batch_size.max(1);
    let mut batch = Vec::with_capacity(max);

    loop {
        match consumer.recv().await {
            Ok(m) => {
                batch.push(to_queue_message(&m));
                break;
            }
            Err(e) => error!(%e, "kafka error"),
        }
    }

    let deadline = Instant::now() + Duration::from_millis(settings.batch_window_ms);
    while batch.len() < max {
        match timeout_at(deadline, consumer.recv()).await {
            Ok(Ok(m)) => batch.push(to_queue_message(&m)),
            Ok(Err(e)) => {
                warn!(%e, "kafka error while filling batch");
                break;
            }
            Err(_) => break,
        }
    }
    batch
}

fn to_queue_message(m: &BorrowedMessage<'_>) -> QueueMessage {
    let id = format!("{}:{}:{}", m.topic(), m.partition(), m.offset());
    let body = match m.payload_view::<str>() {
        Some(Ok(s)) => s.to_owned(),
        Some(Err(_)) => {
            warn!(message_id = %id, "payload is not valid UTF-8");
            String::from_utf8_lossy(m.payload().unwrap_or_default()).into_owned()
        }
        None => String::new(),
    };
    QueueMessage::new(id, body)
}
