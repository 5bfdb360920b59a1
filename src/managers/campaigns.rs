use crate::errors::ToolError;
use crate::managers::{
    collect_common_fields, created_id, creation_result, ensure_has_updates, fetch_record,
    fields_params, update_result,
};
use crate::models::{to_value, Campaign, ListResult, CAMPAIGN_FIELDS};
use crate::services::graph_client::{GraphClient, Params};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::sync::Arc;

pub const CAMPAIGN_TOOLS: &[&str] = &[
    "get_campaigns",
    "get_campaign_details",
    "create_campaign",
    "update_campaign",
];

const CAMPAIGN_UPDATABLE: &[&str] = &[
    "name",
    "status",
    "daily_budget",
    "lifetime_budget",
    "bid_strategy",
];

#[derive(Clone)]
pub struct CampaignManager {
    logger: Logger,
    validation: Validation,
    graph: Arc<GraphClient>,
}

impl CampaignManager {
    pub fn new(logger: Logger, validation: Validation, graph: Arc<GraphClient>) -> Self {
        Self {
            logger: logger.child("campaigns"),
            validation,
            graph,
        }
    }

    pub async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "get_campaigns" => self.list_campaigns(&args).await,
            "get_campaign_details" => self.campaign_details(&args).await,
            "create_campaign" => self.create_campaign(&args).await,
            "update_campaign" => self.update_campaign(&args).await,
            _ => Err(unknown_tool_error("campaigns", tool, CAMPAIGN_TOOLS)),
        }
    }

    async fn list_campaigns(&self, args: &Value) -> Result<Value, ToolError> {
        let account_id = self.validation.ensure_account_id(args.get("account_id"))?;
        let limit = self.validation.ensure_limit(args.get("limit"))?;
        let mut params = fields_params(CAMPAIGN_FIELDS);
        if let Some(statuses) = status_filter(&self.validation, args.get("status_filter"))? {
            params.insert("effective_status".to_string(), statuses);
        }
        let page = self
            .graph
            .get_edge(&format!("{}/campaigns", account_id), &params, limit)
            .await?;
        to_value(&ListResult::<Campaign>::from_page(page)?)
    }

    async fn campaign_details(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self
            .validation
            .ensure_object_id(args.get("campaign_id"), "campaign_id")?;
        fetch_record::<Campaign>(&self.graph, &id, CAMPAIGN_FIELDS).await
    }

    async fn create_campaign(&self, args: &Value) -> Result<Value, ToolError> {
        let account_id = self.validation.ensure_account_id(args.get("account_id"))?;
        let mut params = Params::new();
        params.insert(
            "name".to_string(),
            Value::String(self.validation.required_string(args, "name")?),
        );
        params.insert(
            "objective".to_string(),
            Value::String(self.validation.required_string(args, "objective")?.to_uppercase()),
        );
        collect_common_fields(
            &self.validation,
            args,
            &mut params,
            &["bid_strategy"],
            &["daily_budget", "lifetime_budget"],
        )?;
        ensure_single_budget(&params)?;
        params
            .entry("status".to_string())
            .or_insert_with(|| Value::String("PAUSED".to_string()));
        let categories = match args.get("special_ad_categories") {
            None | Some(Value::Null) => Value::Array(Vec::new()),
            Some(Value::Array(items)) if items.iter().all(|v| v.is_string()) => {
                Value::Array(items.clone())
            }
            Some(_) => {
                return Err(ToolError::invalid_params(
                    "special_ad_categories must be an array of strings",
                ))
            }
        };
        params.insert("special_ad_categories".to_string(), categories);

        let response = self
            .graph
            .post(&format!("{}/campaigns", account_id), &params)
            .await?;
        let id = created_id(&response, "campaign")?;
        self.logger.info(
            "Campaign created",
            Some(&serde_json::json!({"account_id": account_id, "campaign_id": id})),
        );
        Ok(creation_result::<Campaign>(&self.graph, id, CAMPAIGN_FIELDS).await)
    }

    async fn update_campaign(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self
            .validation
            .ensure_object_id(args.get("campaign_id"), "campaign_id")?;
        let mut params = Params::new();
        collect_common_fields(
            &self.validation,
            args,
            &mut params,
            &["name", "bid_strategy"],
            &["daily_budget", "lifetime_budget"],
        )?;
        ensure_has_updates(&params, "campaign", CAMPAIGN_UPDATABLE)?;
        ensure_single_budget(&params)?;
        let response = self.graph.post(&id, &params).await?;
        self.logger.info(
            "Campaign updated",
            Some(&serde_json::json!({"campaign_id": id, "fields": params.keys().collect::<Vec<_>>()})),
        );
        Ok(update_result(&response, &id, params.keys().cloned().collect()))
    }
}

/// Accepts a single status or a list and renders Graph's `effective_status`
/// array.
pub(crate) fn status_filter(
    validation: &Validation,
    value: Option<&Value>,
) -> Result<Option<Value>, ToolError> {
    let raw: Vec<Value> = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    };
    let mut statuses = Vec::new();
    for item in raw {
        let status = validation
            .ensure_string(&item, "status_filter", true)?
            .to_uppercase();
        statuses.push(Value::String(status));
    }
    if statuses.is_empty() {
        return Ok(None);
    }
    Ok(Some(Value::Array(statuses)))
}

pub(crate) fn ensure_single_budget(params: &Params) -> Result<(), ToolError> {
    if params.contains_key("daily_budget") && params.contains_key("lifetime_budget") {
        return Err(ToolError::invalid_params(
            "daily_budget and lifetime_budget are mutually exclusive",
        ));
    }
    Ok(())
}

#[async_trait::async_trait]
impl ToolHandler for CampaignManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_tool(tool, args).await
    }
}
