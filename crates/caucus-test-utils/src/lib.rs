//! Testing utilities for Caucus workspace
//!
//! Shared test fixtures, a pre-loaded registry, and a recording observer.

#![allow(missing_docs)]

use caucus_notify::{Interest, NotificationFor, Observer};
use caucus_stream::{StreamResult, Streamable, StreamableType, TypeRegistry};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestNote {
    pub title: String,
    pub created_at_ms: i64,
}

impl TestNote {
    pub fn new(title: &str, created_at_ms: i64) -> Self {
        Self {
            title: title.to_string(),
            created_at_ms,
        }
    }
}

impl Streamable for TestNote {
    fn stream_out(&self) -> StreamResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn stream_in(&mut self, data: &str) -> StreamResult<()> {
        *self = serde_json::from_str(data)?;
        Ok(())
    }
}

impl StreamableType for TestNote {
    const TYPE_NAME: &'static str = "TestNote";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestTag {
    pub label: String,
}

impl Streamable for TestTag {
    fn stream_out(&self) -> StreamResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn stream_in(&mut self, data: &str) -> StreamResult<()> {
        *self = serde_json::from_str(data)?;
        Ok(())
    }
}

impl StreamableType for TestTag {
    const TYPE_NAME: &'static str = "TestTag";
}

/// Sensor reading whose serialized form keeps only whole tens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReading {
    pub sensor: String,
    pub value: u32,
}

impl TestReading {
    pub fn new(sensor: &str, value: u32) -> Self {
        Self {
            sensor: sensor.to_string(),
            value,
        }
    }
}

impl Streamable for TestReading {
    fn stream_out(&self) -> StreamResult<String> {
        let quantized = Self {
            sensor: self.sensor.clone(),
            value: self.value - self.value % 10,
        };
        Ok(serde_json::to_string(&quantized)?)
    }

    fn stream_in(&mut self, data: &str) -> StreamResult<()> {
        *self = serde_json::from_str(data)?;
        Ok(())
    }
}

impl StreamableType for TestReading {
    const TYPE_NAME: &'static str = "TestReading";
}

pub fn test_registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    registry
        .register::<TestNote>()
        .register::<TestTag>()
        .register::<TestReading>();
    Arc::new(registry)
}

/// Ascending by `created_at_ms`
pub fn by_created_at() -> Arc<dyn Fn(&TestNote, &TestNote) -> Ordering + Send + Sync> {
    Arc::new(|a: &TestNote, b: &TestNote| a.created_at_ms.cmp(&b.created_at_ms))
}

/// Ascending by `value / 10`, so readings within one ten compare equal
pub fn by_reading_bucket() -> Arc<dyn Fn(&TestReading, &TestReading) -> Ordering + Send + Sync> {
    Arc::new(|a: &TestReading, b: &TestReading| (a.value / 10).cmp(&(b.value / 10)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub interest: Interest,
    pub key: Option<String>,
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<Recorded>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.seen.lock().clone()
    }

    pub fn keys(&self) -> Vec<Option<String>> {
        self.seen.lock().iter().map(|r| r.key.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn clear(&self) {
        self.seen.lock().clear();
    }
}

impl Observer<NotificationFor<String>> for RecordingObserver {
    fn notify(&self, interest: &Interest, notification: &NotificationFor<String>) {
        self.seen.lock().push(Recorded {
            interest: interest.clone(),
            key: notification.payload().cloned(),
        });
    }
}
