use crate::errors::ToolError;
use crate::managers::{fetch_record, fields_params};
use crate::models::{to_value, AdAccount, ListResult, Page, ACCOUNT_FIELDS, PAGE_FIELDS};
use crate::services::graph_client::GraphClient;
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::sync::Arc;

pub const ACCOUNT_TOOLS: &[&str] = &["get_ad_accounts", "get_account_info", "get_account_pages"];

#[derive(Clone)]
pub struct AccountManager {
    logger: Logger,
    validation: Validation,
    graph: Arc<GraphClient>,
}

impl AccountManager {
    pub fn new(logger: Logger, validation: Validation, graph: Arc<GraphClient>) -> Self {
        Self {
            logger: logger.child("accounts"),
            validation,
            graph,
        }
    }

    pub async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "get_ad_accounts" => self.list_accounts(&args).await,
            "get_account_info" => self.account_info(&args).await,
            "get_account_pages" => self.account_pages(&args).await,
            _ => Err(unknown_tool_error("accounts", tool, ACCOUNT_TOOLS)),
        }
    }

    async fn list_accounts(&self, args: &Value) -> Result<Value, ToolError> {
        let user = self
            .validation
            .ensure_optional_string(args.get("user_id"), "user_id", true)?
            .unwrap_or_else(|| "me".to_string());
        if user != "me" {
            self.validation.ensure_object_id(Some(&Value::String(user.clone())), "user_id")?;
        }
        let limit = self.validation.ensure_limit(args.get("limit"))?;
        let page = self
            .graph
            .get_edge(
                &format!("{}/adaccounts", user),
                &fields_params(ACCOUNT_FIELDS),
                limit,
            )
            .await?;
        self.logger.debug(
            "Listed ad accounts",
            Some(&serde_json::json!({"user": user, "count": page.items.len()})),
        );
        to_value(&ListResult::<AdAccount>::from_page(page)?)
    }

    async fn account_info(&self, args: &Value) -> Result<Value, ToolError> {
        let account_id = self.validation.ensure_account_id(args.get("account_id"))?;
        fetch_record::<AdAccount>(&self.graph, &account_id, ACCOUNT_FIELDS).await
    }

    async fn account_pages(&self, args: &Value) -> Result<Value, ToolError> {
        let account_id = self.validation.ensure_account_id(args.get("account_id"))?;
        let limit = self.validation.ensure_limit(args.get("limit"))?;
        let page = self
            .graph
            .get_edge(
                &format!("{}/promote_pages", account_id),
                &fields_params(PAGE_FIELDS),
                limit,
            )
            .await?;
        to_value(&ListResult::<Page>::from_page(page)?)
    }
}

#[async_trait::async_trait]
impl ToolHandler for AccountManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_tool(tool, args).await
    }
}
