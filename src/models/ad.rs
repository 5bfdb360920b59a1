use super::{nested_id, require_id, string_field, FromGraph};
use crate::errors::ToolError;
use serde::Serialize;
use serde_json::Value;

pub const AD_FIELDS: &str =
    "id,name,adset_id,campaign_id,status,effective_status,creative{id},created_time,updated_time";

#[derive(Debug, Clone, Serialize)]
pub struct Ad {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adset_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<String>,
}

impl FromGraph for Ad {
    fn from_graph(value: &Value) -> Result<Self, ToolError> {
        Ok(Self {
            id: require_id(value, "ad")?,
            name: string_field(value, "name"),
            adset_id: string_field(value, "adset_id"),
            campaign_id: string_field(value, "campaign_id"),
            status: string_field(value, "status"),
            effective_status: string_field(value, "effective_status"),
            creative_id: nested_id(value, "creative"),
            created_time: string_field(value, "created_time"),
            updated_time: string_field(value, "updated_time"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ad_flattens_creative_reference() {
        let raw = json!({"id": "9", "creative": {"id": "77"}, "status": "PAUSED"});
        let ad = Ad::from_graph(&raw).unwrap();
        assert_eq!(ad.creative_id.as_deref(), Some("77"));
        assert_eq!(ad.status.as_deref(), Some("PAUSED"));
    }
}
