use super::{int_field, require_id, string_field, string_list, FromGraph};
use crate::errors::ToolError;
use serde::Serialize;
use serde_json::Value;

/// Interests, behaviors, demographics and geo locations share one record.
/// Geo results are keyed by `key` instead of `id`; both are accepted.
#[derive(Debug, Clone, Serialize)]
pub struct TargetingOption {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience_size_lower_bound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience_size_upper_bound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl FromGraph for TargetingOption {
    fn from_graph(value: &Value) -> Result<Self, ToolError> {
        let id = match string_field(value, "key") {
            Some(key) => key,
            None => require_id(value, "targeting option")?,
        };
        // Older API versions report a single `audience_size`.
        let legacy_size = int_field(value, "audience_size");
        Ok(Self {
            id,
            name: string_field(value, "name"),
            kind: string_field(value, "type"),
            path: string_list(value, "path"),
            description: string_field(value, "description"),
            topic: string_field(value, "topic"),
            audience_size_lower_bound: int_field(value, "audience_size_lower_bound")
                .or(legacy_size),
            audience_size_upper_bound: int_field(value, "audience_size_upper_bound")
                .or(legacy_size),
            country_code: string_field(value, "country_code"),
            region: string_field(value, "region"),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReachEstimate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_lower_bound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_upper_bound: Option<i64>,
    pub estimate_ready: bool,
}

impl ReachEstimate {
    /// Reach estimates come back either bare or wrapped in `data`.
    pub fn from_response(value: &Value) -> Self {
        let body = value
            .get("data")
            .map(|d| d.as_array().and_then(|a| a.first()).unwrap_or(d))
            .unwrap_or(value);
        Self {
            users_lower_bound: int_field(body, "users_lower_bound").or(int_field(body, "users")),
            users_upper_bound: int_field(body, "users_upper_bound").or(int_field(body, "users")),
            estimate_ready: body
                .get("estimate_ready")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }
    }
}
