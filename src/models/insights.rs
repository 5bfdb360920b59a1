use super::{float_field, int_field, string_field, upstream_shape_error, FromGraph};
use crate::errors::ToolError;
use serde::Serialize;
use serde_json::{Map, Value};

pub const INSIGHT_FIELDS: &str = "campaign_id,campaign_name,adset_id,adset_name,ad_id,ad_name,impressions,reach,frequency,clicks,spend,ctr,cpc,cpm,actions,cost_per_action_type";

pub const BREAKDOWN_KEYS: &[&str] = &[
    "age",
    "gender",
    "country",
    "region",
    "dma",
    "publisher_platform",
    "platform_position",
    "device_platform",
    "impression_device",
    "hourly_stats_aggregated_by_advertiser_time_zone",
];

#[derive(Debug, Clone, Serialize)]
pub struct ActionValue {
    pub action_type: String,
    pub value: f64,
}

/// One row of an insights report. Rows have no id; the reporting window
/// plus the object ids and breakdown values identify them.
#[derive(Debug, Clone, Serialize)]
pub struct InsightRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_stop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adset_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adset_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impressions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reach: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clicks: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spend: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    pub actions: Vec<ActionValue>,
    pub cost_per_action_type: Vec<ActionValue>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub breakdowns: Map<String, Value>,
}

impl FromGraph for InsightRow {
    fn from_graph(value: &Value) -> Result<Self, ToolError> {
        if !value.is_object() {
            return Err(upstream_shape_error("insights row", "expected a JSON object"));
        }
        let mut breakdowns = Map::new();
        for key in BREAKDOWN_KEYS {
            if let Some(v) = value.get(*key).filter(|v| !v.is_null()) {
                breakdowns.insert(key.to_string(), v.clone());
            }
        }
        Ok(Self {
            date_start: string_field(value, "date_start"),
            date_stop: string_field(value, "date_stop"),
            campaign_id: string_field(value, "campaign_id"),
            campaign_name: string_field(value, "campaign_name"),
            adset_id: string_field(value, "adset_id"),
            adset_name: string_field(value, "adset_name"),
            ad_id: string_field(value, "ad_id"),
            ad_name: string_field(value, "ad_name"),
            impressions: int_field(value, "impressions"),
            reach: int_field(value, "reach"),
            frequency: float_field(value, "frequency"),
            clicks: int_field(value, "clicks"),
            spend: float_field(value, "spend"),
            ctr: float_field(value, "ctr"),
            cpc: float_field(value, "cpc"),
            cpm: float_field(value, "cpm"),
            actions: action_values(value.get("actions")),
            cost_per_action_type: action_values(value.get("cost_per_action_type")),
            breakdowns,
        })
    }
}

fn action_values(raw: Option<&Value>) -> Vec<ActionValue> {
    raw.and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let action_type = string_field(item, "action_type")?;
                    let value = float_field(item, "value")?;
                    Some(ActionValue { action_type, value })
                })
                .collect()
        })
        .unwrap_or_default()
}
