//! Telemetry recorder (C8): a bounded ring buffer of per-query records,
//! fanned out to live subscribers over a broadcast channel.

use std::collections::VecDeque;
use std::sync::Mutex;

use hybridsearch_core::config::TelemetryConfig;
use hybridsearch_core::model::TelemetryRecord;
use tokio::sync::broadcast;
use tracing::debug;

/// Retains the most recent `ring_buffer_size` records and broadcasts each
/// new one to any live subscribers. Broadcasting is lossy by design: a slow
/// or absent subscriber never applies backpressure to the request path.
pub struct TelemetryRecorder {
    buffer: Mutex<VecDeque<TelemetryRecord>>,
    capacity: usize,
    sender: broadcast::Sender<TelemetryRecord>,
}

impl TelemetryRecorder {
    pub fn new(config: &TelemetryConfig) -> Self {
        let (sender, _receiver) = broadcast::channel(config.broadcast_capacity.max(1));
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(config.ring_buffer_size.max(1))),
            capacity: config.ring_buffer_size.max(1),
            sender,
        }
    }

    /// Appends a record to the ring buffer, evicting the oldest entry if the
    /// buffer is at capacity, and broadcasts it to subscribers. Never blocks
    /// the caller on a slow subscriber.
    pub fn record(&self, record: TelemetryRecord) {
        {
            let mut buffer = self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if buffer.len() >= self.capacity {
                buffer.pop_front();
            }
            buffer.push_back(record.clone());
        }

        if self.sender.send(record).is_err() {
            debug!("telemetry broadcast has no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryRecord> {
        self.sender.subscribe()
    }

    /// Returns a snapshot of all currently-retained records, oldest first.
    pub fn snapshot(&self) -> Vec<TelemetryRecord> {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridsearch_core::config::Strategy;
    use hybridsearch_core::model::{CacheTelemetry, FusionTelemetry, Intent, LegStats, RerankTelemetry};
    use uuid::Uuid;

    fn sample_record() -> TelemetryRecord {
        TelemetryRecord {
            request_id: Uuid::new_v4(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            store: "demo".to_string(),
            query: "parse request".to_string(),
            intent: Intent::Navigational,
            strategy: Strategy::Balanced,
            sparse: LegStats::default(),
            dense: LegStats::default(),
            fusion: FusionTelemetry::default(),
            rerank: RerankTelemetry::default(),
            cache: CacheTelemetry::default(),
            total_latency_ms: 10,
            result_count: 5,
        }
    }

    #[test]
    fn records_are_retained_up_to_capacity() {
        let recorder = TelemetryRecorder::new(&TelemetryConfig {
            ring_buffer_size: 2,
            broadcast_capacity: 8,
        });
        recorder.record(sample_record());
        recorder.record(sample_record());
        recorder.record(sample_record());
        assert_eq!(recorder.len(), 2);
    }

    #[tokio::test]
    async fn subscribers_receive_recorded_entries() {
        let recorder = TelemetryRecorder::new(&TelemetryConfig::default());
        let mut receiver = recorder.subscribe();
        recorder.record(sample_record());
        let received = receiver.recv().await.unwrap();
        assert_eq!(received.store, "demo");
    }

    #[test]
    fn recording_without_subscribers_does_not_panic() {
        let recorder = TelemetryRecorder::new(&TelemetryConfig::default());
        recorder.record(sample_record());
        assert_eq!(recorder.len(), 1);
    }
}
