//! HTTP client for the Notion database that backs the roster.
//!
//! Notion only mutates rows by page id and only returns cell values through
//! per-property retrieval, so a listing is one (paginated) query plus one
//! request per tracked field per row.

use super::notion_types::{
    api_error_message, rich_text_value, title_value, PageRef, PropertyItemList, QueryResponse,
    NOTION_VERSION,
};
use super::{sort_by_display_name, RecordStore};
use crate::config::{Field, FieldMap, NotionConfig};
use crate::error::{StoreReadError, StoreWriteError};
use async_trait::async_trait;
use bio_roster_types::MemberRecord;
use futures_util::{stream, StreamExt, TryStreamExt};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    database_id: String,
    fields: FieldMap,
    max_in_flight_rows: usize,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            database_id: config.database_id.clone(),
            fields: config.fields.clone(),
            max_in_flight_rows: config.max_in_flight_rows.max(1),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Page ids of every row, sorted by username, following pagination.
    async fn query_page_ids(&self) -> Result<Vec<String>, StoreReadError> {
        let path = format!("/databases/{}/query", self.database_id);
        let mut page_ids = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({
                "sorts": [{
                    "property": self.fields.get(Field::Username).name,
                    "direction": "ascending",
                }]
            });
            if let Some(c) = &cursor {
                body["start_cursor"] = json!(c);
            }

            let response = self
                .request(Method::POST, &path)
                .json(&body)
                .send()
                .await
                .map_err(|e| StoreReadError::Transport(e.to_string()))?;
            let page: QueryResponse = read_json(response).await?;

            page_ids.extend(page.results.into_iter().map(|PageRef { id }| id));

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(page_ids)
    }

    async fn retrieve_text(&self, page_id: &str, field: Field) -> Result<String, StoreReadError> {
        let path = format!("/pages/{}/properties/{}", page_id, self.fields.get(field).id);
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(|e| StoreReadError::Transport(e.to_string()))?;
        let list: PropertyItemList = read_json(response).await?;
        Ok(list.plain_text())
    }

    /// All tracked fields of one row, fetched concurrently.
    async fn fetch_row(&self, page_id: String) -> Result<Option<MemberRecord>, StoreReadError> {
        let (member_id, username, discriminator, biography) = tokio::try_join!(
            self.retrieve_text(&page_id, Field::MemberId),
            self.retrieve_text(&page_id, Field::Username),
            self.retrieve_text(&page_id, Field::Discriminator),
            self.retrieve_text(&page_id, Field::Biography),
        )?;

        if member_id.trim().is_empty() {
            log::warn!("[NOTION] Skipping row {} with an empty member id", page_id);
            return Ok(None);
        }

        Ok(Some(
            MemberRecord::new(member_id.trim(), username, Some(discriminator), biography)
                .with_storage_ref(page_id),
        ))
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn create(&self, record: &MemberRecord) -> Result<String, StoreWriteError> {
        let mut properties = serde_json::Map::new();
        properties.insert(
            self.fields.get(Field::MemberId).name.clone(),
            title_value(&record.member_id),
        );
        properties.insert(
            self.fields.get(Field::Username).name.clone(),
            rich_text_value(&record.username),
        );
        properties.insert(
            self.fields.get(Field::Discriminator).name.clone(),
            rich_text_value(record.discriminator.as_deref().unwrap_or("")),
        );
        properties.insert(
            self.fields.get(Field::Biography).name.clone(),
            rich_text_value(&record.biography),
        );

        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": Value::Object(properties),
        });

        let response = self
            .request(Method::POST, "/pages")
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreWriteError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StoreWriteError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(StoreWriteError::Rejected {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let page: PageRef =
            serde_json::from_str(&text).map_err(|e| StoreWriteError::Decode(e.to_string()))?;

        log::info!(
            "[NOTION] Created row {} for member {}",
            page.id,
            record.member_id
        );
        Ok(page.id)
    }

    async fn update(&self, storage_ref: &str, biography: &str) -> Result<bool, StoreWriteError> {
        let mut properties = serde_json::Map::new();
        properties.insert(
            self.fields.get(Field::Biography).name.clone(),
            rich_text_value(biography),
        );

        let response = self
            .request(Method::PATCH, &format!("/pages/{}", storage_ref))
            .json(&json!({ "properties": Value::Object(properties) }))
            .send()
            .await
            .map_err(|e| StoreWriteError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            log::info!("[NOTION] Updated biography on row {}", storage_ref);
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        log::warn!(
            "[NOTION] Update of row {} refused ({}): {}",
            storage_ref,
            status,
            api_error_message(&body)
        );
        Ok(false)
    }

    async fn list_all(&self) -> Result<Vec<MemberRecord>, StoreReadError> {
        log::info!("[NOTION] Fetching rows from database {}", self.database_id);
        let page_ids = self.query_page_ids().await?;
        let row_count = page_ids.len();

        let rows: Vec<Option<MemberRecord>> = stream::iter(page_ids)
            .map(|page_id| self.fetch_row(page_id))
            .buffer_unordered(self.max_in_flight_rows)
            .try_collect()
            .await?;

        let mut records: Vec<MemberRecord> = rows.into_iter().flatten().collect();
        sort_by_display_name(&mut records);

        log::info!(
            "[NOTION] Listed {} members ({} rows)",
            records.len(),
            row_count
        );
        Ok(records)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreReadError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| StoreReadError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(StoreReadError::Status {
            status: status.as_u16(),
            message: api_error_message(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| StoreReadError::Decode(e.to_string()))
}
