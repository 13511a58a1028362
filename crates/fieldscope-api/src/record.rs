//! Versioned domain record.
//!
//! A [`Record`] is the client-side copy of a backend-owned entity (a scope
//! line item). The backend assigns `version` on every write; the client never
//! invents versions, it only echoes the one it read when submitting changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub fields: HashMap<String, Value>,
    /// Backend-assigned sequence number, bumped on every accepted write.
    pub version: i64,
    /// Actor who made the last accepted write, when the backend reports it.
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: HashMap::new(),
            version: 0,
            updated_by: None,
            updated_at: None,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|v| v.as_string().map(String::from))
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.as_i64())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| v.as_bool())
    }

    /// Project a subset of fields into a new map, skipping names the record
    /// does not carry.
    pub fn project<'a, I>(&self, names: I) -> HashMap<String, Value>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter_map(|name| {
                self.fields
                    .get(name)
                    .map(|v| (name.to_string(), v.clone()))
            })
            .collect()
    }
}
