// ABOUTME: Response-envelope normalization for the deals API
// ABOUTME: Unwraps the handful of historical payload shapes into typed results

use dealflow_core::{AnalyticsSnapshot, Deal, PageInfo};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::api::DealPage;
use crate::error::{ApiError, ApiResult, ValidationIssue};

/// Strip the `{success, data, error}` envelope when present. Bare payloads
/// pass through untouched.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    }
}

fn take_meta(source: &Map<String, Value>) -> (Option<PageInfo>, Option<AnalyticsSnapshot>) {
    let page_info = source.get("pagination").and_then(|value| {
        serde_json::from_value(value.clone())
            .map_err(|e| debug!("ignoring malformed pagination metadata: {}", e))
            .ok()
    });
    let analytics = source.get("analytics").and_then(|value| {
        serde_json::from_value(value.clone())
            .map_err(|e| debug!("ignoring malformed analytics metadata: {}", e))
            .ok()
    });
    (page_info, analytics)
}

fn deals_from(items: Vec<Value>) -> ApiResult<Vec<Deal>> {
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<Deal>(item)
                .map_err(|e| ApiError::InvalidResponse(format!("deal payload: {}", e)))
        })
        .collect()
}

fn list_shape_error(found: &Value) -> ApiError {
    ApiError::InvalidResponse(format!(
        "expected a deal list, got {}",
        describe_value(found)
    ))
}

fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Normalize a list response.
///
/// Accepted shapes, all observed in the wild: a bare array,
/// `{data: [...]}`, `{data: {data: [...]}}`, and `{data: {deals: [...]}}`.
/// Pagination and analytics metadata are read from whichever object held the
/// list, falling back to the top level. Anything else is an
/// [`ApiError::InvalidResponse`]; a list is never silently emptied.
pub(crate) fn parse_deal_list(body: Value) -> ApiResult<DealPage> {
    match body {
        Value::Array(items) => Ok(DealPage {
            deals: deals_from(items)?,
            page_info: None,
            analytics: None,
        }),
        Value::Object(mut top) => {
            let (top_page, top_analytics) = take_meta(&top);
            match top.remove("data") {
                Some(Value::Array(items)) => Ok(DealPage {
                    deals: deals_from(items)?,
                    page_info: top_page,
                    analytics: top_analytics,
                }),
                Some(Value::Object(mut inner)) => {
                    let (inner_page, inner_analytics) = take_meta(&inner);
                    let items = match inner.remove("data").or_else(|| inner.remove("deals")) {
                        Some(Value::Array(items)) => items,
                        Some(other) => return Err(list_shape_error(&other)),
                        None => return Err(list_shape_error(&Value::Object(inner))),
                    };
                    Ok(DealPage {
                        deals: deals_from(items)?,
                        page_info: inner_page.or(top_page),
                        analytics: inner_analytics.or(top_analytics),
                    })
                }
                Some(other) => Err(list_shape_error(&other)),
                None => Err(list_shape_error(&Value::Object(top))),
            }
        }
        other => Err(list_shape_error(&other)),
    }
}

/// Normalize a single-resource response: `{data: {...}}` or a bare object.
pub(crate) fn parse_payload<T: DeserializeOwned>(body: Value, what: &str) -> ApiResult<T> {
    let payload = unwrap_data(body);
    serde_json::from_value(payload)
        .map_err(|e| ApiError::InvalidResponse(format!("{} payload: {}", what, e)))
}

/// Map a non-2xx response to the error taxonomy: 404 is [`ApiError::NotFound`],
/// 400/422 with a structured issue list is [`ApiError::Validation`], anything
/// else is [`ApiError::Http`].
pub(crate) fn error_from_status(status: u16, body: &str) -> ApiError {
    if status == 404 {
        return ApiError::NotFound(message_from(body));
    }
    if status == 400 || status == 422 {
        if let Some(issues) = validation_issues(body) {
            return ApiError::Validation(issues);
        }
    }
    ApiError::Http {
        status,
        message: message_from(body),
    }
}

/// Pull a human-readable message out of an error body, tolerating the
/// `{"error": "..."}`, `{"error": {"message": "..."}}`, and
/// `{"message": "..."}` conventions. Falls back to the raw body.
fn message_from(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "request failed".to_string()
    } else {
        trimmed.to_string()
    }
}

fn validation_issues(body: &str) -> Option<Vec<ValidationIssue>> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    let raw = value
        .get("errors")
        .or_else(|| value.pointer("/error/errors"))
        .or_else(|| value.pointer("/error/details"))
        .or_else(|| value.get("details"))?;
    let issues: Vec<ValidationIssue> = serde_json::from_value(raw.clone()).ok()?;
    if issues.is_empty() {
        None
    } else {
        Some(issues)
    }
}
