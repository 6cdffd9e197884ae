use ops_context::{ContextResult, PageContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shortcuts::ShortcutMatch;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    /// Missing and blank messages are both rejected by the handler.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub page_context: Option<PageContext>,
    /// Opaque caller details, logged but not interpreted.
    #[serde(default)]
    pub user_context: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponse {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<ShortcutMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextResult>,
    /// Text block ready for prompt injection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_block: Option<String>,
}
