use serde::{Deserialize, Serialize};

use crate::types::{RecordId, Timestamp};

/// A survey outing. `date` drives export filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub date: Timestamp,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub harbor: String,
    #[serde(default)]
    pub notes: String,
    /// Station record ids, in survey order.
    #[serde(default)]
    pub stations: Vec<RecordId>,
}

impl Trip {
    pub fn new(date: Timestamp, name: impl Into<String>) -> Self {
        Self {
            id: None,
            date,
            name: name.into(),
            harbor: String::new(),
            notes: String::new(),
            stations: Vec::new(),
        }
    }
}
