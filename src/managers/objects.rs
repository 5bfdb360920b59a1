use crate::errors::ToolError;
use crate::services::graph_client::GraphClient;
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::sync::Arc;

pub const OBJECT_TOOLS: &[&str] = &["delete_object"];

#[derive(Clone)]
pub struct ObjectManager {
    logger: Logger,
    validation: Validation,
    graph: Arc<GraphClient>,
}

impl ObjectManager {
    pub fn new(logger: Logger, validation: Validation, graph: Arc<GraphClient>) -> Self {
        Self {
            logger: logger.child("objects"),
            validation,
            graph,
        }
    }

    pub async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "delete_object" => self.delete_object(&args).await,
            _ => Err(unknown_tool_error("objects", tool, OBJECT_TOOLS)),
        }
    }

    async fn delete_object(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self
            .validation
            .ensure_object_id(args.get("object_id"), "object_id")?;
        let response = self.graph.delete(&id).await?;
        let success = response
            .get("success")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        self.logger.info(
            "Object deleted",
            Some(&serde_json::json!({"object_id": id, "success": success})),
        );
        Ok(serde_json::json!({ "success": success, "id": id }))
    }
}

#[async_trait::async_trait]
impl ToolHandler for ObjectManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_tool(tool, args).await
    }
}
