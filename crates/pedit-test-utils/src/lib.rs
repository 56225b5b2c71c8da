//! Testing utilities for the pedit workspace
//!
//! Shared fixtures and a recording transport.

#![allow(missing_docs)]

use std::sync::Arc;

use parking_lot::Mutex;
use pedit_core::{ParameterAddress, ParameterValue, Snapshot};
use pedit_panel::{
    EditorConfig, EditorSession, MemoryStore, ParameterTransport, ParameterUpdate, TransportError,
};
use serde_json::json;

/// Camera with an integer exposure and a double gain, plus a lidar node
pub fn camera_snapshot() -> Snapshot {
    Snapshot::default()
        .with("camera.exposure", json!({"type": 2, "integer_value": 120}))
        .with("camera.gain", json!({"type": 3, "double_value": 2.5}))
        .with("camera.mode", json!({"type": 4, "string_value": "auto"}))
        .with("lidar.enabled", json!({"type": 1, "bool_value": true}))
        .with("lidar.ranges", json!({"type": 8, "double_array_value": [0.5, 30.0]}))
}

/// Snapshot in the push-map shape: qualified name to plain value
pub fn push_map_snapshot() -> Snapshot {
    Snapshot::from_push_map([
        ("arm.joints", json!([0.0, 1.5, -1.5])),
        ("arm.enabled", json!(false)),
        ("arm.label", json!("left")),
    ])
}

pub fn update(node: &str, name: &str, value: ParameterValue) -> ParameterUpdate {
    ParameterUpdate::new(ParameterAddress::new(node, name), value)
}

/// Transport that records every update it is asked to send
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<ParameterUpdate>>,
    failure: Mutex<Option<TransportError>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transport whose every send fails with `error`
    pub fn failing(error: TransportError) -> Arc<Self> {
        let transport = Self::default();
        *transport.failure.lock() = Some(error);
        Arc::new(transport)
    }

    pub fn set_failure(&self, error: Option<TransportError>) {
        *self.failure.lock() = error;
    }

    /// Updates sent so far, failed ones included
    pub fn sent(&self) -> Vec<ParameterUpdate> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, address: &ParameterAddress) -> Vec<ParameterValue> {
        self.sent
            .lock()
            .iter()
            .filter(|u| &u.address == address)
            .map(|u| u.value.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl ParameterTransport for RecordingTransport {
    async fn set_parameters(&self, update: &ParameterUpdate) -> Result<(), TransportError> {
        self.sent.lock().push(update.clone());
        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Session over an in-memory store with default config
pub fn session_with(transport: Arc<RecordingTransport>) -> (EditorSession, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let session = EditorSession::new(&EditorConfig::default(), transport, store.clone());
    (session, store)
}
