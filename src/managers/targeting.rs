use crate::errors::ToolError;
use crate::models::{to_value, ListResult, ReachEstimate, TargetingOption};
use crate::services::graph_client::{GraphClient, Params};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::sync::Arc;

pub const TARGETING_TOOLS: &[&str] = &[
    "search_interests",
    "search_behaviors",
    "search_demographics",
    "search_geo_locations",
    "estimate_audience_size",
];

const DEMOGRAPHIC_CLASSES: &[&str] = &[
    "demographics",
    "life_events",
    "industries",
    "income",
    "family_statuses",
    "user_device",
    "user_os",
];

const LOCATION_TYPES: &[&str] = &[
    "country",
    "region",
    "city",
    "zip",
    "geo_market",
    "electoral_district",
];

#[derive(Clone)]
pub struct TargetingManager {
    logger: Logger,
    validation: Validation,
    graph: Arc<GraphClient>,
}

impl TargetingManager {
    pub fn new(logger: Logger, validation: Validation, graph: Arc<GraphClient>) -> Self {
        Self {
            logger: logger.child("targeting"),
            validation,
            graph,
        }
    }

    pub async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "search_interests" => self.search_interests(&args).await,
            "search_behaviors" => self.search_behaviors(&args).await,
            "search_demographics" => self.search_demographics(&args).await,
            "search_geo_locations" => self.search_geo_locations(&args).await,
            "estimate_audience_size" => self.estimate_audience(&args).await,
            _ => Err(unknown_tool_error("targeting", tool, TARGETING_TOOLS)),
        }
    }

    async fn search(&self, params: Params, args: &Value) -> Result<Value, ToolError> {
        let limit = self.validation.ensure_limit(args.get("limit"))?;
        let page = self.graph.get_edge("search", &params, limit).await?;
        self.logger.debug(
            "Targeting search",
            Some(&serde_json::json!({"type": params.get("type"), "results": page.items.len()})),
        );
        to_value(&ListResult::<TargetingOption>::from_page(page)?)
    }

    async fn search_interests(&self, args: &Value) -> Result<Value, ToolError> {
        let query = self.validation.required_string(args, "query")?;
        let mut params = search_params("adinterest");
        params.insert("q".to_string(), Value::String(query));
        self.search(params, args).await
    }

    async fn search_behaviors(&self, args: &Value) -> Result<Value, ToolError> {
        let mut params = search_params("adTargetingCategory");
        params.insert("class".to_string(), Value::String("behaviors".to_string()));
        self.search(params, args).await
    }

    async fn search_demographics(&self, args: &Value) -> Result<Value, ToolError> {
        let class = self
            .validation
            .ensure_optional_string(args.get("demographic_class"), "demographic_class", true)?
            .unwrap_or_else(|| "demographics".to_string())
            .to_lowercase();
        if !DEMOGRAPHIC_CLASSES.contains(&class.as_str()) {
            return Err(ToolError::invalid_params(format!(
                "demographic_class must be one of {}",
                DEMOGRAPHIC_CLASSES.join(", ")
            )));
        }
        let mut params = search_params("adTargetingCategory");
        params.insert("class".to_string(), Value::String(class));
        self.search(params, args).await
    }

    async fn search_geo_locations(&self, args: &Value) -> Result<Value, ToolError> {
        let query = self.validation.required_string(args, "query")?;
        let mut params = search_params("adgeolocation");
        params.insert("q".to_string(), Value::String(query));
        if let Some(types) = location_types(args.get("location_types"))? {
            params.insert("location_types".to_string(), types);
        }
        self.search(params, args).await
    }

    async fn estimate_audience(&self, args: &Value) -> Result<Value, ToolError> {
        let account_id = self.validation.ensure_account_id(args.get("account_id"))?;
        let targeting = self
            .validation
            .ensure_object(args.get("targeting").unwrap_or(&Value::Null), "targeting")?;
        let mut params = Params::new();
        params.insert("targeting_spec".to_string(), Value::Object(targeting));
        if let Some(goal) = self.validation.ensure_optional_string(
            args.get("optimization_goal"),
            "optimization_goal",
            true,
        )? {
            params.insert("optimization_goal".to_string(), Value::String(goal));
        }
        let raw = self
            .graph
            .get(&format!("{}/reachestimate", account_id), &params)
            .await?;
        to_value(&ReachEstimate::from_response(&raw))
    }
}

fn search_params(kind: &str) -> Params {
    let mut params = Params::new();
    params.insert("type".to_string(), Value::String(kind.to_string()));
    params
}

fn location_types(value: Option<&Value>) -> Result<Option<Value>, ToolError> {
    let raw: Vec<&Value> = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    };
    let mut out = Vec::new();
    for item in raw {
        let kind = item
            .as_str()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| LOCATION_TYPES.contains(&s.as_str()))
            .ok_or_else(|| {
                ToolError::invalid_params(format!(
                    "location_types entries must be one of {}",
                    LOCATION_TYPES.join(", ")
                ))
            })?;
        out.push(Value::String(kind));
    }
    if out.is_empty() {
        return Ok(None);
    }
    Ok(Some(Value::Array(out)))
}

#[async_trait::async_trait]
impl ToolHandler for TargetingManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_tool(tool, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn location_types_are_checked() {
        assert_eq!(
            location_types(Some(&json!(["City", "country"]))).unwrap(),
            Some(json!(["city", "country"]))
        );
        assert_eq!(location_types(Some(&json!("zip"))).unwrap(), Some(json!(["zip"])));
        assert!(location_types(Some(&json!(["planet"]))).is_err());
        assert_eq!(location_types(None).unwrap(), None);
    }
}
