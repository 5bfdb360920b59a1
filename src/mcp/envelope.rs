use serde_json::Value;

/// The single text part returned by `tools/call`. Results are redacted by
/// the executor before they get here.
pub fn build_generic_envelope(tool_name: &str, tool_result: &Value, meta: Option<&Value>) -> Value {
    let success = tool_result
        .get("success")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    let duration_ms = meta
        .and_then(|m| m.get("duration_ms").and_then(|v| v.as_i64()))
        .unwrap_or(0);
    let trace = serde_json::json!({
        "trace_id": meta.and_then(|m| m.get("trace_id")).cloned().unwrap_or(Value::Null),
    });
    serde_json::json!({
        "success": success,
        "tool": tool_name,
        "result": tool_result,
        "duration_ms": duration_ms,
        "trace": trace,
    })
}
