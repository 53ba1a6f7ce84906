//! Edge dispatch facade.
//!
//! The Edge SDK is an external collaborator; this module only defines the
//! seam and two local implementations.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::error::ExternalError;
use crate::xdm::XdmEvent;

/// Errors that can occur when handing an event to Edge.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The Edge SDK call failed.
    #[error("Edge error: {0}")]
    External(#[from] ExternalError),

    /// The event could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Forwards built events to the Edge collector.
#[async_trait]
pub trait EdgeDispatcher: Send + Sync {
    /// Send one event. Each event is self-contained; no ordering is implied
    /// between calls.
    async fn send_event(&self, event: &XdmEvent) -> Result<(), DispatchError>;
}

/// Dispatcher that only logs what would be sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

#[async_trait]
impl EdgeDispatcher for LogDispatcher {
    #[instrument(skip_all, fields(event_id = %event.id, event_type = %event.event_type))]
    async fn send_event(&self, event: &XdmEvent) -> Result<(), DispatchError> {
        let payload = serde_json::to_vec(event)?;
        debug!(bytes = payload.len(), "Event dispatched");
        Ok(())
    }
}

/// Dispatcher that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<XdmEvent>>,
}

impl RecordingDispatcher {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events sent so far, in call order.
    pub async fn events(&self) -> Vec<XdmEvent> {
        self.events.lock().await.clone()
    }

    /// Take and clear the recorded events.
    pub async fn drain(&self) -> Vec<XdmEvent> {
        std::mem::take(&mut *self.events.lock().await)
    }
}

#[async_trait]
impl EdgeDispatcher for RecordingDispatcher {
    async fn send_event(&self, event: &XdmEvent) -> Result<(), DispatchError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}
