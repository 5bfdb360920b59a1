use crate::constants::{graph::ACCOUNT_PREFIX, limits, statuses::OBJECT_STATUSES};
use crate::errors::ToolError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("numeric id regex"));
static OBJECT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(_[0-9]+)?$").expect("object id regex"));

#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(
        &self,
        value: &Value,
        label: &str,
        trim: bool,
    ) -> Result<String, ToolError> {
        let text = value.as_str().ok_or_else(|| {
            ToolError::invalid_params(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(if trim {
            normalized.to_string()
        } else {
            text.to_string()
        })
    }

    pub fn ensure_optional_string(
        &self,
        value: Option<&Value>,
        label: &str,
        trim: bool,
    ) -> Result<Option<String>, ToolError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(val) => self.ensure_string(val, label, trim).map(Some),
        }
    }

    pub fn required_string(&self, args: &Value, key: &str) -> Result<String, ToolError> {
        self.ensure_string(args.get(key).unwrap_or(&Value::Null), key, true)
    }

    /// Accepts `123` or `act_123` and always returns `act_123`.
    pub fn ensure_account_id(&self, value: Option<&Value>) -> Result<String, ToolError> {
        let raw = self.ensure_string(value.unwrap_or(&Value::Null), "account_id", true)?;
        let digits = raw.strip_prefix(ACCOUNT_PREFIX).unwrap_or(&raw);
        if !NUMERIC_ID.is_match(digits) {
            return Err(ToolError::invalid_params(format!(
                "account_id must look like act_<digits>, got '{}'",
                raw
            )));
        }
        Ok(format!("{}{}", ACCOUNT_PREFIX, digits))
    }

    pub fn ensure_object_id(&self, value: Option<&Value>, label: &str) -> Result<String, ToolError> {
        let raw = match value {
            Some(Value::Number(num)) => num.to_string(),
            Some(other) => self.ensure_string(other, label, true)?,
            None => self.ensure_string(&Value::Null, label, true)?,
        };
        if !OBJECT_ID.is_match(&raw) {
            return Err(ToolError::invalid_params(format!(
                "{} must be a numeric Graph object id, got '{}'",
                label, raw
            )));
        }
        Ok(raw)
    }

    /// Like `ensure_object_id`, but an `act_<digits>` account id is also valid.
    pub fn ensure_object_or_account_id(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<String, ToolError> {
        if let Some(Value::String(raw)) = value {
            let trimmed = raw.trim();
            if let Some(digits) = trimmed.strip_prefix(ACCOUNT_PREFIX) {
                if NUMERIC_ID.is_match(digits) {
                    return Ok(trimmed.to_string());
                }
                return Err(ToolError::invalid_params(format!(
                    "{} must be a Graph object id or act_<digits>, got '{}'",
                    label, trimmed
                )));
            }
        }
        self.ensure_object_id(value, label)
    }

    pub fn ensure_optional_object_id(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<String>, ToolError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(val) => self.ensure_object_id(Some(val), label).map(Some),
        }
    }

    pub fn ensure_limit(&self, value: Option<&Value>) -> Result<usize, ToolError> {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return Ok(limits::DEFAULT_LIST_LIMIT);
        };
        let numeric = value.as_u64().ok_or_else(|| {
            ToolError::invalid_params(format!(
                "limit must be an integer between 1 and {}",
                limits::MAX_LIST_LIMIT
            ))
        })?;
        if numeric == 0 || numeric as usize > limits::MAX_LIST_LIMIT {
            return Err(ToolError::invalid_params(format!(
                "limit must be an integer between 1 and {}",
                limits::MAX_LIST_LIMIT
            )));
        }
        Ok(numeric as usize)
    }

    /// Budgets and bids are expressed in minor currency units (cents).
    pub fn ensure_optional_amount(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<i64>, ToolError> {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let numeric = value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
            .ok_or_else(|| {
                ToolError::invalid_params(format!(
                    "{} must be a positive integer in minor currency units",
                    label
                ))
            })?;
        if numeric <= 0 {
            return Err(ToolError::invalid_params(format!(
                "{} must be a positive integer in minor currency units",
                label
            )));
        }
        Ok(Some(numeric))
    }

    pub fn ensure_optional_status(&self, value: Option<&Value>) -> Result<Option<String>, ToolError> {
        let Some(raw) = self.ensure_optional_string(value, "status", true)? else {
            return Ok(None);
        };
        let upper = raw.to_uppercase();
        if !OBJECT_STATUSES.contains(&upper.as_str()) {
            return Err(ToolError::invalid_params(format!(
                "status must be one of {}, got '{}'",
                OBJECT_STATUSES.join(", "),
                raw
            )));
        }
        Ok(Some(upper))
    }

    pub fn ensure_object(
        &self,
        value: &Value,
        label: &str,
    ) -> Result<serde_json::Map<String, Value>, ToolError> {
        value
            .as_object()
            .cloned()
            .ok_or_else(|| ToolError::invalid_params(format!("{} must be an object", label)))
    }

    pub fn ensure_optional_object(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<serde_json::Map<String, Value>>, ToolError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(val) => self.ensure_object(val, label).map(Some),
        }
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}
