//! Push payload classification.

use aep_bootcamp_tracker::{MessageRoute, PushMessage, route_message};
use serde_json::{Value, json};

use crate::output;

/// Classify a JSON push payload and print the routing decision.
///
/// # Errors
///
/// Returns an error if the payload is not JSON.
pub fn classify(payload: &str) -> Result<(), Box<dyn std::error::Error>> {
    let value: Value = serde_json::from_str(payload)?;
    let message = PushMessage::from_value(&value);
    output::json(&describe(&route_message(&message)))
}

fn describe(route: &MessageRoute) -> Value {
    match route {
        MessageRoute::Adobe => json!({"adobe": true, "route": "messaging-sdk"}),
        MessageRoute::Local(notification) => json!({
            "adobe": false,
            "route": "local-notification",
            "title": notification.title,
            "body": notification.body,
        }),
    }
}
