use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ToolError;
use crate::mcp::catalog::strip_semantic_fields;
use crate::services::logger::Logger;
use crate::utils::redact::redact_object;
use crate::utils::suggest::suggest;

use serde_json::Value;

const MAX_RESULT_STRING_BYTES: usize = 64 * 1024;
const MAX_LOGGED_STRING_BYTES: usize = 256;

/// One manager serves several related tools; `tool` tells it which.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
    secrets: Vec<String>,
}

impl ToolExecutor {
    pub fn new(
        logger: Logger,
        handlers: HashMap<String, Arc<dyn ToolHandler>>,
        secrets: Vec<String>,
    ) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
            secrets,
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    fn strip_args_for_handler(&self, args: &Value) -> Value {
        strip_semantic_fields(args)
    }

    fn build_log_args(&self, args: &Value) -> Value {
        let mut cleaned = self.strip_args_for_handler(args);
        if let Value::Object(map) = &mut cleaned {
            if let Some(Value::String(base64)) = map.get("image_base64") {
                map.insert(
                    "image_base64".to_string(),
                    Value::String(format!("[base64:{}]", base64.len())),
                );
            }
        }
        redact_object(&cleaned, MAX_LOGGED_STRING_BYTES, Some(&self.secrets))
    }

    fn summarize_result(&self, result: &Value) -> Value {
        if result.is_null() {
            return serde_json::json!({"type": "null"});
        }
        if let Some(arr) = result.as_array() {
            return serde_json::json!({"type": "array", "length": arr.len()});
        }
        if let Some(obj) = result.as_object() {
            let keys: Vec<String> = obj.keys().take(10).cloned().collect();
            return serde_json::json!({"type": "object", "keys": keys, "key_count": obj.len()});
        }
        serde_json::json!({"type": value_type_name(result)})
    }

    fn wrap_result(&self, tool: &str, trace_id: &str, started_at: i64, result: &Value) -> Value {
        let meta = serde_json::json!({
            "tool": tool,
            "trace_id": trace_id,
            "duration_ms": chrono::Utc::now().timestamp_millis() - started_at,
        });
        serde_json::json!({
            "ok": true,
            "result": redact_object(result, MAX_RESULT_STRING_BYTES, Some(&self.secrets)),
            "meta": meta,
        })
    }

    pub async fn execute(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        let started_at = chrono::Utc::now().timestamp_millis();
        let Some(handler) = self.handlers.get(tool) else {
            let candidates: Vec<String> = self.handlers.keys().cloned().collect();
            let suggestions = suggest(tool, &candidates, 6);
            let hint = if suggestions.is_empty() {
                "Call tools/list to see the available tools".to_string()
            } else {
                format!("Did you mean: {}", suggestions.join(", "))
            };
            return Err(
                ToolError::invalid_params(format!("Unknown tool: {}", tool)).with_hint(hint)
            );
        };
        let trace_id = args
            .get("trace_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        self.logger.debug(
            tool,
            Some(&serde_json::json!({
                "trace_id": trace_id,
                "args": self.build_log_args(&args),
            })),
        );

        let cleaned_args = self.strip_args_for_handler(&args);
        let result = match handler.handle(tool, cleaned_args).await {
            Ok(result) => result,
            Err(err) => {
                self.logger.warn(
                    "Tool failed",
                    Some(&serde_json::json!({
                        "tool": tool,
                        "trace_id": trace_id,
                        "code": err.code,
                        "retryable": err.retryable,
                        "duration_ms": chrono::Utc::now().timestamp_millis() - started_at,
                    })),
                );
                return Err(err);
            }
        };

        let payload = self.wrap_result(tool, &trace_id, started_at, &result);
        self.logger.info(
            "Tool completed",
            Some(&serde_json::json!({
                "tool": tool,
                "trace_id": trace_id,
                "result": self.summarize_result(&result),
                "duration_ms": payload["meta"]["duration_ms"],
            })),
        );
        Ok(payload)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
