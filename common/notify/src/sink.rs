use crate::model::{Alert, NotifyResult};
use async_trait::async_trait;
use tracing::debug;

#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
use crate::model::NotifyError;
#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
use rdkafka::producer::{FutureProducer, FutureRecord};
#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
use std::time::Duration;

/// Delivery seam for role-targeted alerts. Handlers only ever see this trait;
/// whether alerts land on a broker or nowhere is a deployment concern.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &Alert) -> NotifyResult<()>;
}

/// Sink used when no notification backend is configured. Accepts everything
/// so callers exercise the same code path in every environment.
pub struct NoopAlertSink;

#[async_trait]
impl AlertSink for NoopAlertSink {
    async fn deliver(&self, alert: &Alert) -> NotifyResult<()> {
        debug!(tag = alert.tag.as_str(), title = %alert.title, "alert sink not configured; dropping alert");
        Ok(())
    }
}

#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
pub struct KafkaAlertSink {
    producer: FutureProducer,
    topic: String,
}

#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
impl KafkaAlertSink {
    pub fn new(producer: FutureProducer, topic: impl Into<String>) -> Self {
        Self { producer, topic: topic.into() }
    }
}

#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
#[async_trait]
impl AlertSink for KafkaAlertSink {
    async fn deliver(&self, alert: &Alert) -> NotifyResult<()> {
        let serialized =
            serde_json::to_vec(alert).map_err(|e| NotifyError::Serialization(e.to_string()))?;
        let key = alert.tag.as_str();
        let record = FutureRecord::to(&self.topic).key(key).payload(&serialized);
        if let Err((e, _)) = self.producer.send(record, Duration::from_secs(5)).await {
            return Err(NotifyError::Transport(e.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AlertTag;
    use common_security::Actor;

    #[tokio::test]
    async fn noop_sink_accepts_alerts() {
        let alert = Alert::new(
            AlertTag::ProductAdded,
            "New product added",
            "\"Ceramic mug\" was added to the catalog.",
            Actor::default(),
            vec![],
        );
        assert!(NoopAlertSink.deliver(&alert).await.is_ok());
    }
}
