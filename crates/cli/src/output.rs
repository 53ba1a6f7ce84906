//! Stdout output. Logs go to stderr, so stdout stays machine readable.

use std::io::Write;

use aep_bootcamp_tracker::{DispatchError, EdgeDispatcher, ExternalError, XdmEvent};
use async_trait::async_trait;
use serde_json::Value;

/// Write a line to stdout.
pub fn line(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")
}

/// Write pretty-printed JSON to stdout.
pub fn json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    line(&serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Dispatcher that prints each event payload instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutDispatcher;

#[async_trait]
impl EdgeDispatcher for StdoutDispatcher {
    async fn send_event(&self, event: &XdmEvent) -> Result<(), DispatchError> {
        let payload = serde_json::to_string_pretty(event)?;
        line(&payload).map_err(|e| ExternalError::call("stdout", e.to_string()))?;
        Ok(())
    }
}
