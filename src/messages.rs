//! Panel message protocol.
//!
//! The panel sends `ViewRequest`s; the controller answers with
//! `ControllerRequest`s carrying the whole view state. Both are JSON objects
//! with camelCase keys, one per line when piped over stdio.

use crate::types::ViewState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerViewRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_start_at_block: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_block: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    #[serde(default)]
    pub retrieve_view_state: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typed_request: Option<TrackerViewRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerRequest {
    pub view_state: Arc<ViewState>,
}

impl ViewRequest {
    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim())
    }
}

impl ControllerRequest {
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let mut s = serde_json::to_string(self)?;
        s.push('\n');
        Ok(s)
    }
}
