//! Wire types for the subset of the Notion REST API the client uses.

use serde::Deserialize;
use serde_json::{json, Value};

pub const NOTION_VERSION: &str = "2022-06-28";

/// `POST /databases/{id}/query`
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<PageRef>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageRef {
    pub id: String,
}

/// `GET /pages/{id}/properties/{property_id}` for title and rich text
/// properties, which Notion returns as a paginated list of text items.
#[derive(Debug, Deserialize)]
pub struct PropertyItemList {
    #[serde(default)]
    pub results: Vec<PropertyItem>,
}

#[derive(Debug, Deserialize)]
pub struct PropertyItem {
    pub title: Option<TextItem>,
    pub rich_text: Option<TextItem>,
}

#[derive(Debug, Deserialize)]
pub struct TextItem {
    #[serde(default)]
    pub plain_text: String,
}

impl PropertyItemList {
    /// Concatenated plain text; empty when the cell is empty.
    pub fn plain_text(&self) -> String {
        self.results
            .iter()
            .filter_map(|item| item.title.as_ref().or(item.rich_text.as_ref()))
            .map(|t| t.plain_text.as_str())
            .collect()
    }
}

/// Error body: `{"object": "error", "status": 400, "code": "...", "message": "..."}`
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: Option<String>,
    pub message: Option<String>,
}

pub fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError {
            code: Some(code),
            message: Some(message),
        }) => format!("{} ({})", message, code),
        Ok(ApiError {
            message: Some(message),
            ..
        }) => message,
        _ if body.chars().count() > 300 => format!("{}...", body.chars().take(300).collect::<String>()),
        _ => body.to_string(),
    }
}

fn text_items(content: &str) -> Value {
    if content.is_empty() {
        json!([])
    } else {
        json!([{ "type": "text", "text": { "content": content } }])
    }
}

pub fn title_value(content: &str) -> Value {
    json!({ "title": text_items(content) })
}

pub fn rich_text_value(content: &str) -> Value {
    json!({ "rich_text": text_items(content) })
}
