pub mod model;
pub mod sink;

pub use model::{Alert, AlertColor, AlertTag, NotifyError, NotifyResult, ALERT_SCHEMA_VERSION};
pub use sink::{AlertSink, NoopAlertSink};
#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
pub use sink::KafkaAlertSink;
