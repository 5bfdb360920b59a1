use super::{int_field, require_id, string_field, string_list, FromGraph};
use crate::errors::ToolError;
use serde::Serialize;
use serde_json::Value;

pub const CAMPAIGN_FIELDS: &str = "id,name,objective,status,effective_status,daily_budget,lifetime_budget,budget_remaining,bid_strategy,special_ad_categories,buying_type,start_time,stop_time,created_time,updated_time";

#[derive(Debug, Clone, Serialize)]
pub struct Campaign {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime_budget: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_strategy: Option<String>,
    pub special_ad_categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buying_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<String>,
}

impl FromGraph for Campaign {
    fn from_graph(value: &Value) -> Result<Self, ToolError> {
        Ok(Self {
            id: require_id(value, "campaign")?,
            name: string_field(value, "name"),
            objective: string_field(value, "objective"),
            status: string_field(value, "status"),
            effective_status: string_field(value, "effective_status"),
            daily_budget: int_field(value, "daily_budget"),
            lifetime_budget: int_field(value, "lifetime_budget"),
            budget_remaining: int_field(value, "budget_remaining"),
            bid_strategy: string_field(value, "bid_strategy"),
            special_ad_categories: string_list(value, "special_ad_categories"),
            buying_type: string_field(value, "buying_type"),
            start_time: string_field(value, "start_time"),
            stop_time: string_field(value, "stop_time"),
            created_time: string_field(value, "created_time"),
            updated_time: string_field(value, "updated_time"),
        })
    }
}
