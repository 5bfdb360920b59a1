use crate::errors::ToolError;
use crate::managers::fields_params;
use crate::models::{to_value, InsightRow, ListResult, BREAKDOWN_KEYS, INSIGHT_FIELDS};
use crate::services::graph_client::GraphClient;
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;

pub const INSIGHT_TOOLS: &[&str] = &["get_insights"];

const DEFAULT_DATE_PRESET: &str = "last_30d";
const LEVELS: &[&str] = &["account", "campaign", "adset", "ad"];

#[derive(Clone)]
pub struct InsightsManager {
    logger: Logger,
    validation: Validation,
    graph: Arc<GraphClient>,
}

impl InsightsManager {
    pub fn new(logger: Logger, validation: Validation, graph: Arc<GraphClient>) -> Self {
        Self {
            logger: logger.child("insights"),
            validation,
            graph,
        }
    }

    pub async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "get_insights" => self.insights(&args).await,
            _ => Err(unknown_tool_error("insights", tool, INSIGHT_TOOLS)),
        }
    }

    async fn insights(&self, args: &Value) -> Result<Value, ToolError> {
        let object_id = self
            .validation
            .ensure_object_or_account_id(args.get("object_id"), "object_id")?;
        let limit = self.validation.ensure_limit(args.get("limit"))?;
        let mut params = fields_params(INSIGHT_FIELDS);

        let date_preset = self
            .validation
            .ensure_optional_string(args.get("date_preset"), "date_preset", true)?;
        let time_range = self
            .validation
            .ensure_optional_object(args.get("time_range"), "time_range")?;
        match (date_preset, time_range) {
            (Some(_), Some(_)) => {
                return Err(ToolError::invalid_params(
                    "date_preset and time_range are mutually exclusive",
                ))
            }
            (None, Some(range)) => {
                params.insert("time_range".to_string(), parse_time_range(&range)?);
            }
            (preset, None) => {
                params.insert(
                    "date_preset".to_string(),
                    Value::String(preset.unwrap_or_else(|| DEFAULT_DATE_PRESET.to_string())),
                );
            }
        }

        if let Some(level) = self
            .validation
            .ensure_optional_string(args.get("level"), "level", true)?
        {
            let level = level.to_lowercase();
            if !LEVELS.contains(&level.as_str()) {
                return Err(ToolError::invalid_params(format!(
                    "level must be one of {}",
                    LEVELS.join(", ")
                )));
            }
            params.insert("level".to_string(), Value::String(level));
        }
        if let Some(breakdowns) = parse_breakdowns(args.get("breakdown"))? {
            params.insert("breakdowns".to_string(), Value::String(breakdowns));
        }

        let page = self
            .graph
            .get_edge(&format!("{}/insights", object_id), &params, limit)
            .await?;
        self.logger.debug(
            "Insights fetched",
            Some(&serde_json::json!({"object_id": object_id, "rows": page.items.len()})),
        );
        to_value(&ListResult::<InsightRow>::from_page(page)?)
    }
}

/// `{since, until}` as `YYYY-MM-DD`, with `since <= until`.
fn parse_time_range(range: &serde_json::Map<String, Value>) -> Result<Value, ToolError> {
    let read = |key: &str| -> Result<NaiveDate, ToolError> {
        let raw = range.get(key).and_then(|v| v.as_str()).ok_or_else(|| {
            ToolError::invalid_params(format!("time_range.{} is required (YYYY-MM-DD)", key))
        })?;
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
            ToolError::invalid_params(format!(
                "time_range.{} must be a date in YYYY-MM-DD form, got '{}'",
                key, raw
            ))
        })
    };
    let since = read("since")?;
    let until = read("until")?;
    if since > until {
        return Err(ToolError::invalid_params(
            "time_range.since must not be after time_range.until",
        ));
    }
    Ok(serde_json::json!({
        "since": since.format("%Y-%m-%d").to_string(),
        "until": until.format("%Y-%m-%d").to_string(),
    }))
}

/// One breakdown or a list, rendered as Graph's comma-separated `breakdowns`.
fn parse_breakdowns(value: Option<&Value>) -> Result<Option<String>, ToolError> {
    let items: Vec<String> = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.split(',').map(|p| p.trim().to_string()).collect(),
        Some(Value::Array(arr)) => arr
            .iter()
            .map(|v| {
                v.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| ToolError::invalid_params("breakdown entries must be strings"))
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(ToolError::invalid_params(
                "breakdown must be a string or an array of strings",
            ))
        }
    };
    let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
    if items.is_empty() {
        return Ok(None);
    }
    for item in &items {
        if !BREAKDOWN_KEYS.contains(&item.as_str()) {
            return Err(ToolError::invalid_params(format!(
                "Unsupported breakdown '{}'",
                item
            ))
            .with_hint(format!("Use one of: {}", BREAKDOWN_KEYS.join(", "))));
        }
    }
    Ok(Some(items.join(",")))
}

#[async_trait::async_trait]
impl ToolHandler for InsightsManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_tool(tool, args).await
    }
}
