use crate::constants::{limits, retry as retry_constants};
use crate::errors::{ToolError, ToolErrorKind};
use crate::services::logger::{LogLevel, Logger};
use crate::services::settings::Settings;
use crate::utils::redact::redact_text;
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type Params = Map<String, Value>;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: f64,
    pub status_codes: Vec<u16>,
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.retry_max_attempts.max(1),
            base_delay_ms: settings.retry_base_delay_ms,
            max_delay_ms: retry_constants::MAX_DELAY_MS,
            jitter: retry_constants::JITTER,
            status_codes: retry_constants::STATUS_CODES.to_vec(),
        }
    }

    /// Creating calls are retried only when the upstream answered with a
    /// throttling or 5xx response; a transport failure may have landed.
    pub fn should_retry(&self, err: &ToolError, attempt: usize, idempotent: bool) -> bool {
        if attempt >= self.max_attempts || !err.retryable {
            return false;
        }
        if idempotent {
            return true;
        }
        let status = err
            .details
            .as_ref()
            .and_then(|d| d.get("status"))
            .and_then(|v| v.as_u64())
            .map(|s| s as u16);
        err.code == "RATE_LIMITED"
            || status.is_some_and(|s| self.status_codes.contains(&s))
    }

    pub fn compute_delay(&self, attempt: usize, err: &ToolError) -> u64 {
        let factor: f64 = 2.0;
        let mut delay =
            (self.base_delay_ms as f64) * factor.powi(attempt.saturating_sub(1) as i32);
        if delay > self.max_delay_ms as f64 {
            delay = self.max_delay_ms as f64;
        }
        if self.jitter > 0.0 {
            let delta = delay * self.jitter;
            delay = delay - delta + rand::random::<f64>() * delta * 2.0;
        }
        let retry_after_ms = err
            .details
            .as_ref()
            .and_then(|d| d.get("retry_after_s"))
            .and_then(|v| v.as_u64())
            .map(|s| s * 1000);
        if let Some(retry_after_ms) = retry_after_ms {
            if retry_after_ms as f64 > delay {
                delay = retry_after_ms.min(self.max_delay_ms * 4) as f64;
            }
        }
        delay.max(0.0) as u64
    }
}

/// One page of a Graph edge listing, already concatenated across cursors.
#[derive(Debug, Clone)]
pub struct EdgePage {
    pub items: Vec<Value>,
    pub has_more: bool,
}

#[derive(Clone)]
pub struct GraphClient {
    logger: Logger,
    settings: Arc<Settings>,
    http: Client,
    retry: RetryPolicy,
}

impl GraphClient {
    pub fn new(logger: Logger, settings: Arc<Settings>) -> Result<Self, ToolError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(settings.http_timeout_ms))
            .user_agent(concat!("adsbridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self {
            logger: logger.child("graph"),
            retry: RetryPolicy::from_settings(&settings),
            settings,
            http,
        })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub async fn get(&self, path: &str, params: &Params) -> Result<Value, ToolError> {
        self.send(Method::GET, path, params, true).await
    }

    pub async fn post(&self, path: &str, params: &Params) -> Result<Value, ToolError> {
        self.send(Method::POST, path, params, false).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ToolError> {
        self.send(Method::DELETE, path, &Params::new(), true).await
    }

    /// Reads an edge (`/act_1/campaigns`, `/123/insights`, ...) following
    /// `paging.cursors.after` until `limit` items are collected, the edge is
    /// exhausted, or the page cap is hit.
    pub async fn get_edge(
        &self,
        path: &str,
        params: &Params,
        limit: usize,
    ) -> Result<EdgePage, ToolError> {
        let mut items: Vec<Value> = Vec::new();
        let mut query = params.clone();
        query.insert(
            "limit".to_string(),
            Value::from(limit.min(limits::MAX_LIST_LIMIT) as u64),
        );
        let mut has_more = false;

        for page in 0..limits::MAX_PAGES {
            let body = self.get(path, &query).await?;
            let data = body
                .get("data")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            let fetched = data.len();
            items.extend(data);

            let after = body
                .get("paging")
                .filter(|p| p.get("next").is_some())
                .and_then(|p| p.get("cursors"))
                .and_then(|c| c.get("after"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            if items.len() >= limit {
                has_more = after.is_some() || items.len() > limit;
                items.truncate(limit);
                break;
            }
            let Some(after) = after else {
                break;
            };
            if fetched == 0 {
                break;
            }
            if page + 1 == limits::MAX_PAGES {
                has_more = true;
                break;
            }
            query.insert("after".to_string(), Value::String(after));
        }

        Ok(EdgePage { items, has_more })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        params: &Params,
        idempotent: bool,
    ) -> Result<Value, ToolError> {
        let token = self.settings.require_access_token()?.to_string();
        let url = self.object_url(path);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(&method, &url, params, &token).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !self.retry.should_retry(&err, attempt, idempotent) {
                        return Err(err);
                    }
                    let delay = self.retry.compute_delay(attempt, &err);
                    self.logger.warn(
                        "Graph request retry",
                        Some(&serde_json::json!({
                            "method": method.as_str(),
                            "path": path,
                            "attempt": attempt,
                            "code": err.code,
                            "delay_ms": delay,
                        })),
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        params: &Params,
        token: &str,
    ) -> Result<Value, ToolError> {
        let mut pairs = encode_params(params);
        // Rendered before the token is appended, for the debug line only.
        let rendered_params = if self.logger.level() == LogLevel::Debug {
            serde_urlencoded::to_string(&pairs).unwrap_or_default()
        } else {
            String::new()
        };
        pairs.push(("access_token".to_string(), token.to_string()));

        let mut req = self.http.request(method.clone(), url);
        req = if *method == Method::POST {
            req.form(&pairs)
        } else {
            req.query(&pairs)
        };

        let started = Instant::now();
        let response = req.send().await.map_err(|err| self.scrub(err.into()))?;
        let status = response.status().as_u16();
        let retry_after_s = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let text = response.text().await.map_err(|err| self.scrub(err.into()))?;

        self.logger.debug(
            "Graph response",
            Some(&serde_json::json!({
                "method": method.as_str(),
                "url": url,
                "params": redact_text(&rendered_params, 512, None),
                "status": status,
                "duration_ms": started.elapsed().as_millis() as u64,
            })),
        );

        let parsed: Option<Value> = serde_json::from_str(&text).ok();
        let graph_error = parsed.as_ref().and_then(|v| v.get("error")).is_some();
        if !(200..300).contains(&status) || graph_error {
            let body = parsed.unwrap_or_else(|| Value::String(text.clone()));
            return Err(self.scrub(classify_graph_error(status, &body, retry_after_s)));
        }
        parsed.ok_or_else(|| {
            ToolError::new(
                ToolErrorKind::Internal,
                "UPSTREAM_INVALID_JSON",
                "Graph API returned a non-JSON body",
            )
            .with_details(serde_json::json!({
                "status": status,
                "body_preview": redact_text(&text, 512, Some(&self.settings.secrets())),
            }))
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.graph_root(),
            path.trim_start_matches('/')
        )
    }

    fn scrub(&self, mut err: ToolError) -> ToolError {
        let secrets = self.settings.secrets();
        err.message = redact_text(&err.message, usize::MAX, Some(&secrets));
        err
    }
}

/// Graph API convention: scalars travel as plain strings, objects and
/// arrays as JSON text.
pub fn encode_params(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let rendered = match v {
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            (k.clone(), rendered)
        })
        .collect()
}

/// Maps a failed Graph response to a typed tool error. `body` is the parsed
/// JSON when available, otherwise the raw text as a JSON string.
pub fn classify_graph_error(status: u16, body: &Value, retry_after_s: Option<u64>) -> ToolError {
    let error = body.get("error");
    let code = error.and_then(|e| e.get("code")).and_then(|v| v.as_i64());
    let subcode = error
        .and_then(|e| e.get("error_subcode"))
        .and_then(|v| v.as_i64());
    let transient = error
        .and_then(|e| e.get("is_transient"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let upstream_message = error
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| {
            body.as_str()
                .map(|s| redact_text(s, 256, None))
                .filter(|s| !s.trim().is_empty())
        })
        .unwrap_or_else(|| format!("Graph API request failed with HTTP {}", status));

    const AUTH: (ToolErrorKind, &str, Option<&str>) = (
        ToolErrorKind::Denied,
        "AUTH_INVALID",
        Some("The access token is invalid or expired. Refresh META_ACCESS_TOKEN."),
    );
    const PERMISSION: (ToolErrorKind, &str, Option<&str>) = (
        ToolErrorKind::Denied,
        "PERMISSION_DENIED",
        Some("The token lacks a required permission (ads_management / ads_read) or access to this object."),
    );
    const THROTTLED: (ToolErrorKind, &str, Option<&str>) = (
        ToolErrorKind::Retryable,
        "RATE_LIMITED",
        Some("Rate limit reached. Wait before retrying."),
    );
    const MISSING: (ToolErrorKind, &str, Option<&str>) = (ToolErrorKind::NotFound, "NOT_FOUND", None);

    // Known Graph codes decide first; the HTTP status decides for the rest.
    let (kind, tag, hint) = match (code, status) {
        (Some(190), _) => AUTH,
        (Some(10 | 200..=299), _) => PERMISSION,
        (Some(4 | 17 | 32 | 613 | 80000..=80014), _) => THROTTLED,
        (Some(100), _) if subcode == Some(33) => MISSING,
        (Some(803), _) => MISSING,
        (Some(100), _) => (ToolErrorKind::InvalidParams, "INVALID_PARAMETER", None),
        (_, 401) => AUTH,
        (_, 403) => PERMISSION,
        (_, 404) => MISSING,
        (_, 429) => THROTTLED,
        _ if transient || status >= 500 => (
            ToolErrorKind::Retryable,
            "UPSTREAM_UNAVAILABLE",
            Some("The ads API is temporarily unavailable. Retry later."),
        ),
        _ => (ToolErrorKind::Internal, "UPSTREAM_ERROR", None),
    };

    let mut details = Map::new();
    details.insert("status".to_string(), Value::from(status));
    if let Some(code) = code {
        details.insert("graph_code".to_string(), Value::from(code));
    }
    if let Some(subcode) = subcode {
        details.insert("graph_subcode".to_string(), Value::from(subcode));
    }
    for (src, dst) in [
        ("type", "type"),
        ("fbtrace_id", "fbtrace_id"),
        ("error_user_msg", "user_message"),
        ("error_user_title", "user_title"),
    ] {
        if let Some(value) = error.and_then(|e| e.get(src)).filter(|v| !v.is_null()) {
            details.insert(dst.to_string(), value.clone());
        }
    }
    if let Some(retry_after_s) = retry_after_s {
        details.insert("retry_after_s".to_string(), Value::from(retry_after_s));
    }

    let mut err = ToolError::new(kind, tag, upstream_message).with_details(Value::Object(details));
    if let Some(hint) = hint {
        err = err.with_hint(hint);
    }
    err
}
