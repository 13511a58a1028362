use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, error, info};

use fieldscope_api::{ApiError, Record};
use fieldscope_core::{
    DeleteOutcome, ExportFormat, ExportHandle, FieldChanges, WriteApi, WriteOutcome,
};

use crate::models::{
    ConflictBody, ErrorBody, ExportRequest, ExportResponse, ItemsPage, ScopeItemApi,
    UpdateItemRequest,
};

pub struct PortalClient {
    base_url: String,
    default_headers: HeaderMap,
    client: reqwest::Client,
}

impl PortalClient {
    pub fn new(base_url: &str, api_token: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", api_token)
                .parse()
                .expect("Invalid API token format"),
        );

        // 30 second timeout; anything slower surfaces as ApiError::Timeout
        // and is reported like a validation failure rather than hanging the
        // batch.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: headers,
            client,
        }
    }

    /// Shape a reqwest error into the boundary error type.
    fn map_reqwest_error(e: reqwest::Error, url: &str, operation: &str) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() {
            ApiError::Network {
                message: format!(
                    "Failed to {} for {}: connection error - check network connectivity. Error: {}",
                    operation, url, e
                ),
            }
        } else if e.is_decode() {
            ApiError::Internal {
                message: format!(
                    "Failed to {} for {}: unexpected response format from server. Error: {}",
                    operation, url, e
                ),
            }
        } else {
            ApiError::Network {
                message: format!("Failed to {} for {}: {}", operation, url, e),
            }
        }
    }

    async fn read_body(
        response: reqwest::Response,
        url: &str,
    ) -> Result<(StatusCode, String), ApiError> {
        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Network {
            message: format!("Failed to read response body from {}: {}", url, e),
        })?;
        Ok((status, text))
    }

    fn status_error(record_id: Option<&str>, status: StatusCode, url: &str, body: &str) -> ApiError {
        match (status.as_u16(), record_id) {
            (404, Some(id)) => ApiError::RecordNotFound { id: id.to_string() },
            (400 | 422, _) => ApiError::Validation {
                message: ErrorBody::message_or(body),
            },
            _ => ApiError::Internal {
                message: format!(
                    "HTTP {} error from {}: {}",
                    status.as_u16(),
                    url,
                    if body.len() > 500 {
                        format!("{}... (truncated)", &body[..500])
                    } else {
                        body.to_string()
                    }
                ),
            },
        }
    }

    /// Fetch all scope items, following pagination cursors.
    pub async fn fetch_items(&self) -> Result<Vec<Record>, ApiError> {
        let mut items: Vec<Record> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let url = match &cursor {
                Some(c) => format!("{}/scope-items?cursor={}", self.base_url, c),
                None => format!("{}/scope-items", self.base_url),
            };
            debug!(url = %url, "fetching scope items page");

            let response = self
                .client
                .get(&url)
                .headers(self.default_headers.clone())
                .send()
                .await
                .map_err(|e| Self::map_reqwest_error(e, &url, "fetch scope items"))?;

            let (status, text) = Self::read_body(response, &url).await?;
            if !status.is_success() {
                let err = Self::status_error(None, status, &url, &text);
                error!(error = %err, "scope item fetch failed");
                return Err(err);
            }

            let page: ItemsPage = serde_json::from_str(&text).map_err(|e| ApiError::Internal {
                message: format!("Failed to parse items page from {}: {}", url, e),
            })?;
            items.extend(page.items.into_iter().map(Record::from));

            match page.next_cursor {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        info!(count = items.len(), "scope items fetched");
        Ok(items)
    }
}

#[async_trait]
impl WriteApi for PortalClient {
    async fn submit_update(
        &self,
        record_id: &str,
        changes: FieldChanges,
        base_version: i64,
    ) -> Result<WriteOutcome, ApiError> {
        let url = format!("{}/scope-items/{}", self.base_url, record_id);
        let body = UpdateItemRequest {
            changes,
            base_version,
            reason: None,
        };

        debug!(record_id, base_version, "submitting update");
        let response = self
            .client
            .patch(&url)
            .headers(self.default_headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url, "submit update"))?;

        let (status, text) = Self::read_body(response, &url).await?;

        if status == StatusCode::CONFLICT {
            let conflict: ConflictBody =
                serde_json::from_str(&text).map_err(|e| ApiError::Internal {
                    message: format!("Failed to parse conflict body from {}: {}", url, e),
                })?;
            debug!(record_id, remote_version = conflict.remote.version, "update conflicted");
            return Ok(WriteOutcome::Conflict {
                remote: conflict.remote.into(),
            });
        }
        if !status.is_success() {
            return Err(Self::status_error(Some(record_id), status, &url, &text));
        }

        let item: ScopeItemApi = serde_json::from_str(&text).map_err(|e| ApiError::Internal {
            message: format!("Failed to parse updated record from {}: {}", url, e),
        })?;
        Ok(WriteOutcome::Applied {
            record: item.into(),
        })
    }

    async fn delete_record(
        &self,
        record_id: &str,
        base_version: i64,
    ) -> Result<DeleteOutcome, ApiError> {
        let url = format!(
            "{}/scope-items/{}?base_version={}",
            self.base_url, record_id, base_version
        );

        debug!(record_id, base_version, "submitting delete");
        let response = self
            .client
            .delete(&url)
            .headers(self.default_headers.clone())
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url, "delete record"))?;

        let (status, text) = Self::read_body(response, &url).await?;

        if status == StatusCode::CONFLICT {
            let conflict: ConflictBody =
                serde_json::from_str(&text).map_err(|e| ApiError::Internal {
                    message: format!("Failed to parse conflict body from {}: {}", url, e),
                })?;
            return Ok(DeleteOutcome::Conflict {
                remote: conflict.remote.into(),
            });
        }
        if !status.is_success() {
            return Err(Self::status_error(Some(record_id), status, &url, &text));
        }

        Ok(DeleteOutcome::Deleted)
    }

    async fn export_records(
        &self,
        ids: &[String],
        format: ExportFormat,
    ) -> Result<ExportHandle, ApiError> {
        let url = format!("{}/scope-items/export", self.base_url);
        let body = ExportRequest {
            ids,
            format: format.as_str(),
        };

        debug!(records = ids.len(), format = format.as_str(), "requesting export");
        let response = self
            .client
            .post(&url)
            .headers(self.default_headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url, "request export"))?;

        let (status, text) = Self::read_body(response, &url).await?;
        if !status.is_success() {
            return Err(Self::status_error(None, status, &url, &text));
        }

        let export: ExportResponse = serde_json::from_str(&text).map_err(|e| ApiError::Internal {
            message: format!("Failed to parse export response from {}: {}", url, e),
        })?;
        info!(url = %export.url, "export job accepted");
        Ok(ExportHandle { url: export.url })
    }
}
