use super::{int_field, require_id, string_field, FromGraph};
use crate::errors::ToolError;
use serde::Serialize;
use serde_json::Value;

pub const ACCOUNT_FIELDS: &str = "id,account_id,name,account_status,currency,timezone_name,amount_spent,balance,spend_cap,business_name,created_time";
pub const PAGE_FIELDS: &str = "id,name,category,link";

#[derive(Debug, Clone, Serialize)]
pub struct AdAccount {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_spent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spend_cap: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

impl FromGraph for AdAccount {
    fn from_graph(value: &Value) -> Result<Self, ToolError> {
        let id = require_id(value, "ad account")?;
        let status_code = int_field(value, "account_status");
        Ok(Self {
            id,
            account_id: string_field(value, "account_id"),
            name: string_field(value, "name"),
            status: status_code.map(account_status_name),
            status_code,
            currency: string_field(value, "currency"),
            timezone: string_field(value, "timezone_name"),
            amount_spent: int_field(value, "amount_spent"),
            balance: int_field(value, "balance"),
            // "0" means no cap.
            spend_cap: int_field(value, "spend_cap").filter(|cap| *cap > 0),
            business_name: string_field(value, "business_name"),
            created_time: string_field(value, "created_time"),
        })
    }
}

pub fn account_status_name(code: i64) -> String {
    match code {
        1 => "ACTIVE".to_string(),
        2 => "DISABLED".to_string(),
        3 => "UNSETTLED".to_string(),
        7 => "PENDING_RISK_REVIEW".to_string(),
        8 => "PENDING_SETTLEMENT".to_string(),
        9 => "IN_GRACE_PERIOD".to_string(),
        100 => "PENDING_CLOSURE".to_string(),
        101 => "CLOSED".to_string(),
        201 => "ANY_ACTIVE".to_string(),
        202 => "ANY_CLOSED".to_string(),
        other => format!("UNKNOWN({})", other),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl FromGraph for Page {
    fn from_graph(value: &Value) -> Result<Self, ToolError> {
        Ok(Self {
            id: require_id(value, "page")?,
            name: string_field(value, "name"),
            category: string_field(value, "category"),
            link: string_field(value, "link"),
        })
    }
}
