//! Typed records built from raw Graph API payloads.
//!
//! The Graph API omits unset fields, returns money as strings of minor
//! units and metrics as decimal strings. Every record requires only its
//! identifier; everything else is optional and an unparseable number
//! becomes `None` rather than an error.

mod account;
mod ad;
mod adset;
mod campaign;
mod creative;
mod insights;
mod targeting;

pub use account::{account_status_name, AdAccount, Page, ACCOUNT_FIELDS, PAGE_FIELDS};
pub use ad::{Ad, AD_FIELDS};
pub use adset::{AdSet, ADSET_FIELDS};
pub use campaign::{Campaign, CAMPAIGN_FIELDS};
pub use creative::{AdCreative, AdImage, CREATIVE_FIELDS};
pub use insights::{ActionValue, InsightRow, BREAKDOWN_KEYS, INSIGHT_FIELDS};
pub use targeting::{ReachEstimate, TargetingOption};

use crate::errors::ToolError;
use crate::services::graph_client::EdgePage;
use serde::Serialize;
use serde_json::Value;

pub trait FromGraph: Sized {
    fn from_graph(value: &Value) -> Result<Self, ToolError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult<T: Serialize> {
    pub count: usize,
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T: FromGraph + Serialize> ListResult<T> {
    pub fn from_page(page: EdgePage) -> Result<Self, ToolError> {
        let items = page
            .items
            .iter()
            .map(T::from_graph)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            count: items.len(),
            items,
            has_more: page.has_more,
        })
    }
}

pub fn to_value<T: Serialize>(record: &T) -> Result<Value, ToolError> {
    serde_json::to_value(record)
        .map_err(|err| ToolError::internal(format!("Failed to serialize result: {}", err)))
}

pub(crate) fn require_id(value: &Value, record: &str) -> Result<String, ToolError> {
    if !value.is_object() {
        return Err(upstream_shape_error(record, "expected a JSON object"));
    }
    string_field(value, "id").ok_or_else(|| upstream_shape_error(record, "missing 'id'"))
}

pub(crate) fn upstream_shape_error(record: &str, problem: &str) -> ToolError {
    ToolError::new(
        crate::errors::ToolErrorKind::Internal,
        "UPSTREAM_SHAPE",
        format!("Unexpected {} payload from the ads API: {}", record, problem),
    )
}

/// Reads a string field; numeric ids are rendered as strings.
pub(crate) fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn int_field(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub(crate) fn float_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|item| item.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn nested_id(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|inner| string_field(inner, "id"))
}
