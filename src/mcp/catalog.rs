use crate::errors::{ErrorCode, McpError};
use crate::utils::suggest::suggest;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

/// Call-level fields accepted by every tool and consumed by the executor,
/// never by the handlers.
pub const TOOL_SEMANTIC_FIELDS: &[&str] = &["trace_id"];

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

pub fn tool_names() -> Vec<String> {
    TOOL_CATALOG.iter().map(|tool| tool.name.clone()).collect()
}

pub fn list_tools() -> Vec<ToolDef> {
    TOOL_CATALOG.clone()
}

pub fn strip_semantic_fields(args: &Value) -> Value {
    match args.as_object() {
        Some(obj) => {
            let mut out = obj.clone();
            for key in TOOL_SEMANTIC_FIELDS {
                out.remove(*key);
            }
            Value::Object(out)
        }
        None => args.clone(),
    }
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), McpError> {
    let Some(tool) = tool_by_name(tool_name) else {
        let suggestions = suggest(tool_name, &tool_names(), 3);
        let mut message = format!("Unknown tool: {}", tool_name);
        if !suggestions.is_empty() {
            message.push_str(&format!("\nDid you mean: {}", suggestions.join(", ")));
        }
        return Err(McpError::new(ErrorCode::InvalidParams, message));
    };
    let Some(schema) = TOOL_VALIDATORS.get(tool_name) else {
        return Ok(());
    };
    let stripped = strip_semantic_fields(args);
    if let Err(errors) = schema.validate(&stripped) {
        let message = format_schema_errors(tool_name, &stripped, errors, &tool.input_schema);
        return Err(McpError::new(ErrorCode::InvalidParams, message));
    }
    Ok(())
}

/// One line per violation (at most ten), plus a single "Did you mean" line
/// built from the closest property names or enum values.
fn format_schema_errors(
    tool_name: &str,
    args: &Value,
    errors: jsonschema::ErrorIterator,
    schema: &Value,
) -> String {
    let mut lines = vec![format!("Invalid arguments for {}", tool_name)];
    let mut hints: Vec<String> = Vec::new();

    for err in errors.take(10) {
        let pointer = err.instance_path.to_string();
        let at = if pointer.is_empty() { "(root)" } else { pointer.as_str() };
        match &err.kind {
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                let known = property_names(schema, &pointer);
                for field in unexpected {
                    lines.push(format!("- {}: unknown field '{}'", at, field));
                    let close = suggest(field, &known, 3);
                    if !close.is_empty() {
                        hints.push(format!("field '{}': {}", field, close.join(", ")));
                    }
                }
            }
            ValidationErrorKind::Enum { options } => {
                let allowed: Vec<String> = options
                    .as_array()
                    .map(|values| values.iter().map(display_value).collect())
                    .unwrap_or_default();
                let shown: Vec<&str> = allowed.iter().take(12).map(String::as_str).collect();
                lines.push(format!("- {}: expected one of {}", at, shown.join(", ")));
                let received = args.pointer(&pointer).map(display_value).unwrap_or_default();
                let close = suggest(&received, &allowed, 3);
                if !close.is_empty() {
                    hints.push(format!("{}: {}", at, close.join(", ")));
                }
            }
            ValidationErrorKind::Required { property } => {
                lines.push(format!(
                    "- {}: missing required field '{}'",
                    at,
                    display_value(property)
                ));
            }
            ValidationErrorKind::Type { kind } => {
                let expected = match kind {
                    TypeKind::Single(primitive) => primitive.to_string(),
                    TypeKind::Multiple(types) => (*types)
                        .into_iter()
                        .map(|t| t.to_string())
                        .collect::<Vec<_>>()
                        .join(" | "),
                };
                lines.push(format!("- {}: expected {}", at, expected));
            }
            _ => lines.push(format!("- {}: {}", at, err)),
        }
    }

    if !hints.is_empty() {
        hints.truncate(3);
        lines.push(format!("Did you mean: {}", hints.join(" | ")));
    }
    lines.join("\n")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Property names declared for the object at `pointer` (an instance path).
fn property_names(schema: &Value, pointer: &str) -> Vec<String> {
    let mut node = schema;
    for segment in pointer.split('/').filter(|s| !s.is_empty()) {
        node = match node.get("properties").and_then(|p| p.get(segment)) {
            Some(child) => child,
            None => return Vec::new(),
        };
    }
    node.get("properties")
        .and_then(|p| p.as_object())
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default()
}
