use super::{int_field, require_id, string_field, FromGraph};
use crate::errors::ToolError;
use serde::Serialize;
use serde_json::Value;

pub const ADSET_FIELDS: &str = "id,name,campaign_id,status,effective_status,daily_budget,lifetime_budget,budget_remaining,bid_amount,bid_strategy,optimization_goal,billing_event,targeting,start_time,end_time,created_time";

#[derive(Debug, Clone, Serialize)]
pub struct AdSet {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
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
    pub bid_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_event: Option<String>,
    /// Targeting specs are deeply nested and evolve upstream; passed through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targeting: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

impl FromGraph for AdSet {
    fn from_graph(value: &Value) -> Result<Self, ToolError> {
        Ok(Self {
            id: require_id(value, "ad set")?,
            name: string_field(value, "name"),
            campaign_id: string_field(value, "campaign_id"),
            status: string_field(value, "status"),
            effective_status: string_field(value, "effective_status"),
            daily_budget: int_field(value, "daily_budget"),
            lifetime_budget: int_field(value, "lifetime_budget"),
            budget_remaining: int_field(value, "budget_remaining"),
            bid_amount: int_field(value, "bid_amount"),
            bid_strategy: string_field(value, "bid_strategy"),
            optimization_goal: string_field(value, "optimization_goal"),
            billing_event: string_field(value, "billing_event"),
            targeting: value.get("targeting").filter(|t| t.is_object()).cloned(),
            start_time: string_field(value, "start_time"),
            end_time: string_field(value, "end_time"),
            created_time: string_field(value, "created_time"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn adset_keeps_targeting_object() {
        let raw = json!({
            "id": "2385",
            "campaign_id": 120,
            "targeting": {"geo_locations": {"countries": ["US"]}},
            "bid_amount": 150
        });
        let adset = AdSet::from_graph(&raw).unwrap();
        assert_eq!(adset.campaign_id.as_deref(), Some("120"));
        assert_eq!(adset.bid_amount, Some(150));
        assert_eq!(
            adset.targeting.unwrap()["geo_locations"]["countries"][0],
            json!("US")
        );
    }
}
