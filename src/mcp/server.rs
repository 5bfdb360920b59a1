use crate::app::App;
use crate::errors::{ErrorCode, McpError, ToolError, ToolErrorKind};
use crate::mcp::catalog::{list_tools, validate_tool_args};
use crate::mcp::envelope::build_generic_envelope;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::services::logger::Logger;
use crate::services::settings::Settings;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "adsbridge";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn map_tool_error(tool: &str, error: &ToolError) -> McpError {
    let mut lines = vec![
        "ToolError".to_string(),
        format!("tool: {}", tool),
        format!("kind: {:?}", error.kind).to_lowercase(),
        format!("code: {}", error.code),
        format!("retryable: {}", error.retryable),
        format!("message: {}", error.message),
    ];
    if let Some(hint) = &error.hint {
        lines.push(format!("hint: {}", hint));
    }
    if let Some(details) = &error.details {
        lines.push(format!("details: {}", details));
    }
    let message = lines.join("\n");

    match error.kind {
        ToolErrorKind::InvalidParams => McpError::new(ErrorCode::InvalidParams, message),
        ToolErrorKind::Timeout => McpError::new(ErrorCode::RequestTimeout, message),
        ToolErrorKind::Denied | ToolErrorKind::NotFound => {
            McpError::new(ErrorCode::InvalidRequest, message)
        }
        _ => McpError::new(ErrorCode::InternalError, message),
    }
}

pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub fn new(settings: Settings, logger: Logger) -> Result<Self, ToolError> {
        let app = App::initialize(settings, logger)?;
        Ok(Self { app: Arc::new(app) })
    }

    async fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    async fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": list_tools() })
    }

    async fn handle_tools_call(&self, name: &str, raw_args: Value) -> Result<Value, McpError> {
        let args = if raw_args.is_null() {
            Value::Object(Default::default())
        } else {
            raw_args
        };
        validate_tool_args(name, &args)?;

        let payload = self
            .app
            .tool_executor
            .execute(name, args)
            .await
            .map_err(|err| map_tool_error(name, &err))?;

        let meta = payload.get("meta").cloned();
        let tool_result = payload.get("result").cloned().unwrap_or(Value::Null);
        let envelope = build_generic_envelope(name, &tool_result, meta.as_ref());

        Ok(serde_json::json!({
            "content": [ { "type": "text", "text": serde_json::to_string(&envelope).unwrap_or_else(|_| "{}".to_string()) } ]
        }))
    }

    async fn handle_request(&self, request: &JsonRpcRequest) -> Result<Value, McpError> {
        match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize().await),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(self.handle_tools_list().await),
            "tools/call" => {
                let name = request.param_str("name").unwrap_or("");
                if name.is_empty() {
                    return Err(McpError::new(ErrorCode::InvalidParams, "Missing tool name"));
                }
                let args = request
                    .params
                    .get("arguments")
                    .cloned()
                    .unwrap_or(Value::Null);
                self.handle_tools_call(name, args).await
            }
            other => Err(McpError::method_not_found(other)),
        }
    }

    /// Handles one input line. `None` means nothing is written back
    /// (blank lines and notifications).
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let parsed: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(_) => return Some(JsonRpcResponse::failure(Value::Null, McpError::parse_error())),
        };
        let raw_id = parsed.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(parsed) {
            Ok(req) => req,
            Err(err) => {
                return Some(JsonRpcResponse::failure(
                    raw_id,
                    McpError::invalid_request(format!("Invalid request: {}", err)),
                ))
            }
        };

        if request.is_notification() {
            self.app.logger.debug(
                "Notification received",
                Some(&serde_json::json!({ "method": request.method })),
            );
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        Some(match self.handle_request(&request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::failure(id, err),
        })
    }

    /// One JSON-RPC message per line in, one per line out, until EOF.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ToolError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut writer = writer;

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|err| ToolError::internal(err.to_string()))?
        {
            if let Some(response) = self.handle_line(&line).await {
                let payload = serde_json::to_string(&response).unwrap_or_default();
                writer.write_all(payload.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        self.app.logger.info("stdin closed, shutting down", None);
        Ok(())
    }

    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = BufWriter::new(tokio::io::stdout());
        self.serve(reader, writer).await
    }
}

pub async fn run_stdio(settings: Settings, logger: Logger) -> Result<(), ToolError> {
    let server = McpServer::new(settings, logger)?;
    server.run_stdio().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_errors_render_as_lines() {
        let err = ToolError::invalid_params("limit must be an integer")
            .with_hint("Use 1..=500");
        let mapped = map_tool_error("get_campaigns", &err);
        assert_eq!(mapped.code, ErrorCode::InvalidParams);
        assert!(mapped.message.starts_with("ToolError\ntool: get_campaigns"));
        assert!(mapped.message.contains("kind: invalidparams"));
        assert!(mapped.message.contains("hint: Use 1..=500"));
    }

    #[test]
    fn not_found_maps_to_invalid_request() {
        let mapped = map_tool_error("get_ad_details", &ToolError::not_found("gone"));
        assert_eq!(mapped.code, ErrorCode::InvalidRequest);
        let timeout = map_tool_error("get_ads", &ToolError::timeout("slow"));
        assert_eq!(timeout.code, ErrorCode::RequestTimeout);
        let retry = map_tool_error("get_ads", &ToolError::retryable("later"));
        assert_eq!(retry.code, ErrorCode::InternalError);
    }
}
