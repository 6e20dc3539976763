use crate::{FeedError, Result as FeedErrorResult};

use serde::Deserialize;

pub const DEFAULT_EVENT_TYPE: &str = "change";

/// Routing fields of a change notification.
///
/// Only the statement-level aggregate shape is understood. Any other fields
/// travel untouched in the raw payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangePayload {
    pub tenant_id: String,
    #[serde(rename = "type", default = "default_event_type")]
    pub event_type: String,
    #[serde(default)]
    pub count: Option<i64>,
}

fn default_event_type() -> String {
    DEFAULT_EVENT_TYPE.to_string()
}

impl ChangePayload {
    #[track_caller]
    pub fn parse(raw: &str) -> FeedErrorResult<Self> {
        let payload: Self =
            serde_json::from_str(raw).map_err(|e| FeedError::invalid_payload(e.to_string()))?;

        if payload.tenant_id.is_empty() {
            return Err(FeedError::invalid_payload("tenant_id is empty"));
        }

        Ok(payload)
    }
}
