//! Tool handlers, one manager per family of Graph objects.
//!
//! Managers validate arguments with [`Validation`], talk to the Graph API
//! through [`GraphClient`] and reshape raw payloads into `models` records.

pub mod accounts;
pub mod ads;
pub mod adsets;
pub mod campaigns;
pub mod creatives;
pub mod images;
pub mod insights;
pub mod objects;
pub mod targeting;

use crate::errors::ToolError;
use crate::models::{to_value, FromGraph};
use crate::services::graph_client::{GraphClient, Params};
use crate::services::validation::Validation;
use serde::Serialize;
use serde_json::Value;

pub(crate) fn fields_params(fields: &str) -> Params {
    let mut params = Params::new();
    params.insert("fields".to_string(), Value::String(fields.to_string()));
    params
}

/// Reads a single object and normalizes it.
pub(crate) async fn fetch_record<T: FromGraph + Serialize>(
    graph: &GraphClient,
    id: &str,
    fields: &str,
) -> Result<Value, ToolError> {
    let raw = graph.get(id, &fields_params(fields)).await?;
    to_value(&T::from_graph(&raw)?)
}

/// POST responses for creations carry only `{ "id": ... }`.
pub(crate) fn created_id(response: &Value, label: &str) -> Result<String, ToolError> {
    response
        .get("id")
        .and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| {
            ToolError::new(
                crate::errors::ToolErrorKind::Internal,
                "UPSTREAM_SHAPE",
                format!("Creating the {} returned no id", label),
            )
            .with_details(serde_json::json!({ "response": response }))
        })
}

/// Re-reads a freshly created object. A failed re-read does not fail the
/// creation: the id is still returned with `object: null`.
pub(crate) async fn creation_result<T: FromGraph + Serialize>(
    graph: &GraphClient,
    id: String,
    fields: &str,
) -> Value {
    match fetch_record::<T>(graph, &id, fields).await {
        Ok(object) => serde_json::json!({
            "success": true,
            "id": id,
            "object": object,
        }),
        Err(err) => serde_json::json!({
            "success": true,
            "id": id,
            "object": Value::Null,
            "reread_error": {
                "code": err.code,
                "message": err.message,
            },
        }),
    }
}

/// Graph answers updates with `{ "success": true }`.
pub(crate) fn update_result(response: &Value, id: &str, updated: Vec<String>) -> Value {
    serde_json::json!({
        "success": response.get("success").and_then(|v| v.as_bool()).unwrap_or(true),
        "id": id,
        "updated_fields": updated,
    })
}

pub(crate) fn ensure_has_updates(
    params: &Params,
    id_label: &str,
    allowed: &[&str],
) -> Result<(), ToolError> {
    if params.is_empty() {
        return Err(ToolError::invalid_params(format!(
            "Nothing to update for this {}",
            id_label
        ))
        .with_hint(format!("Provide at least one of: {}", allowed.join(", "))));
    }
    Ok(())
}

/// Copies the shared optional fields used by create and update calls.
pub(crate) fn collect_common_fields(
    validation: &Validation,
    args: &Value,
    params: &mut Params,
    strings: &[&str],
    amounts: &[&str],
) -> Result<(), ToolError> {
    for key in strings {
        if let Some(value) = validation.ensure_optional_string(args.get(*key), key, true)? {
            params.insert(key.to_string(), Value::String(value));
        }
    }
    for key in amounts {
        if let Some(value) = validation.ensure_optional_amount(args.get(*key), key)? {
            params.insert(key.to_string(), Value::from(value));
        }
    }
    if let Some(status) = validation.ensure_optional_status(args.get("status"))? {
        params.insert("status".to_string(), Value::String(status));
    }
    Ok(())
}
