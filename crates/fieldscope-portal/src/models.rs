use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use fieldscope_api::{Record, Value};

/// Scope line item as the portal API sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeItemApi {
    pub id: String,
    pub cost_code: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<i64>,
    pub assigned_to: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub unit_cost: Option<f64>,
    pub version: i64,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl From<ScopeItemApi> for Record {
    fn from(api: ScopeItemApi) -> Self {
        let mut fields = HashMap::new();
        if let Some(v) = api.cost_code {
            fields.insert("cost_code".to_string(), Value::String(v));
        }
        if let Some(v) = api.description {
            fields.insert("description".to_string(), Value::String(v));
        }
        if let Some(v) = api.status {
            fields.insert("status".to_string(), Value::String(v));
        }
        if let Some(v) = api.priority {
            fields.insert("priority".to_string(), Value::Integer(v));
        }
        if let Some(v) = api.assigned_to {
            fields.insert("assigned_to".to_string(), Value::String(v));
        }
        if let Some(v) = api.quantity {
            fields.insert("quantity".to_string(), Value::Float(v));
        }
        if let Some(v) = api.unit {
            fields.insert("unit".to_string(), Value::String(v));
        }
        if let Some(v) = api.unit_cost {
            fields.insert("unit_cost".to_string(), Value::Float(v));
        }

        Record {
            id: api.id,
            fields,
            version: api.version,
            updated_by: api.updated_by,
            updated_at: api.updated_at.as_deref().and_then(|s| {
                chrono::DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&chrono::Utc))
            }),
        }
    }
}

/// One page of the scope-item listing.
#[derive(Debug, Deserialize)]
pub struct ItemsPage {
    #[serde(alias = "results")]
    pub items: Vec<ScopeItemApi>,
    pub next_cursor: Option<String>,
}

/// Body of a `PATCH /scope-items/{id}` request.
#[derive(Debug, Serialize)]
pub struct UpdateItemRequest {
    pub changes: HashMap<String, Value>,
    pub base_version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Body of a 409 response: the authoritative snapshot to diff against.
#[derive(Debug, Deserialize)]
pub struct ConflictBody {
    pub remote: ScopeItemApi,
}

#[derive(Debug, Serialize)]
pub struct ExportRequest<'a> {
    pub ids: &'a [String],
    pub format: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ExportResponse {
    pub url: String,
}

/// Error envelope the portal uses for 4xx bodies.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn message_or(raw: &str) -> String {
        match serde_json::from_str::<ErrorBody>(raw) {
            Ok(body) => body
                .message
                .or(body.error)
                .unwrap_or_else(|| raw.to_string()),
            Err(_) => raw.to_string(),
        }
    }
}
