use crate::errors::ToolError;
use crate::managers::campaigns::ensure_single_budget;
use crate::managers::{
    collect_common_fields, created_id, creation_result, ensure_has_updates, fetch_record,
    fields_params, update_result,
};
use crate::models::{to_value, AdSet, ListResult, ADSET_FIELDS};
use crate::services::graph_client::{GraphClient, Params};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::sync::Arc;

pub const ADSET_TOOLS: &[&str] = &[
    "get_adsets",
    "get_adset_details",
    "create_adset",
    "update_adset",
];

const ADSET_UPDATABLE: &[&str] = &[
    "name",
    "status",
    "daily_budget",
    "lifetime_budget",
    "bid_amount",
    "targeting",
    "end_time",
];

#[derive(Clone)]
pub struct AdSetManager {
    logger: Logger,
    validation: Validation,
    graph: Arc<GraphClient>,
}

impl AdSetManager {
    pub fn new(logger: Logger, validation: Validation, graph: Arc<GraphClient>) -> Self {
        Self {
            logger: logger.child("adsets"),
            validation,
            graph,
        }
    }

    pub async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "get_adsets" => self.list_adsets(&args).await,
            "get_adset_details" => self.adset_details(&args).await,
            "create_adset" => self.create_adset(&args).await,
            "update_adset" => self.update_adset(&args).await,
            _ => Err(unknown_tool_error("adsets", tool, ADSET_TOOLS)),
        }
    }

    async fn list_adsets(&self, args: &Value) -> Result<Value, ToolError> {
        let account_id = self.validation.ensure_account_id(args.get("account_id"))?;
        let limit = self.validation.ensure_limit(args.get("limit"))?;
        let container = self
            .validation
            .ensure_optional_object_id(args.get("campaign_id"), "campaign_id")?
            .unwrap_or(account_id);
        let page = self
            .graph
            .get_edge(
                &format!("{}/adsets", container),
                &fields_params(ADSET_FIELDS),
                limit,
            )
            .await?;
        to_value(&ListResult::<AdSet>::from_page(page)?)
    }

    async fn adset_details(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self.validation.ensure_object_id(args.get("adset_id"), "adset_id")?;
        fetch_record::<AdSet>(&self.graph, &id, ADSET_FIELDS).await
    }

    async fn create_adset(&self, args: &Value) -> Result<Value, ToolError> {
        let account_id = self.validation.ensure_account_id(args.get("account_id"))?;
        let campaign_id = self
            .validation
            .ensure_object_id(args.get("campaign_id"), "campaign_id")?;
        let targeting = self
            .validation
            .ensure_object(args.get("targeting").unwrap_or(&Value::Null), "targeting")?;

        let mut params = Params::new();
        params.insert("campaign_id".to_string(), Value::String(campaign_id));
        for key in ["name", "optimization_goal", "billing_event"] {
            params.insert(
                key.to_string(),
                Value::String(self.validation.required_string(args, key)?),
            );
        }
        params.insert("targeting".to_string(), Value::Object(targeting));
        collect_common_fields(
            &self.validation,
            args,
            &mut params,
            &["start_time", "end_time", "bid_strategy"],
            &["daily_budget", "lifetime_budget", "bid_amount"],
        )?;
        ensure_single_budget(&params)?;
        params
            .entry("status".to_string())
            .or_insert_with(|| Value::String("PAUSED".to_string()));

        let response = self
            .graph
            .post(&format!("{}/adsets", account_id), &params)
            .await?;
        let id = created_id(&response, "ad set")?;
        self.logger.info(
            "Ad set created",
            Some(&serde_json::json!({"account_id": account_id, "adset_id": id})),
        );
        Ok(creation_result::<AdSet>(&self.graph, id, ADSET_FIELDS).await)
    }

    async fn update_adset(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self.validation.ensure_object_id(args.get("adset_id"), "adset_id")?;
        let mut params = Params::new();
        collect_common_fields(
            &self.validation,
            args,
            &mut params,
            &["name", "end_time"],
            &["daily_budget", "lifetime_budget", "bid_amount"],
        )?;
        if let Some(targeting) = self
            .validation
            .ensure_optional_object(args.get("targeting"), "targeting")?
        {
            params.insert("targeting".to_string(), Value::Object(targeting));
        }
        ensure_has_updates(&params, "ad set", ADSET_UPDATABLE)?;
        ensure_single_budget(&params)?;
        let response = self.graph.post(&id, &params).await?;
        self.logger.info(
            "Ad set updated",
            Some(&serde_json::json!({"adset_id": id})),
        );
        Ok(update_result(&response, &id, params.keys().cloned().collect()))
    }
}

#[async_trait::async_trait]
impl ToolHandler for AdSetManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_tool(tool, args).await
    }
}
