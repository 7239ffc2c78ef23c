// ABOUTME: User-facing notification sink for store outcomes
// ABOUTME: Maps errors to friendly toast text; default sink logs through tracing

use std::sync::Mutex;

use dealflow_client::{ApiError, ValidationIssue};
use tracing::{info, warn};

use crate::error::StoreError;

/// Where user-facing outcome messages go. The embedding view layer supplies
/// a toast implementation; the default logs through `tracing`.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default sink: success at info level, failures at warn level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!("{}", message);
    }

    fn error(&self, message: &str) {
        warn!("{}", message);
    }
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

/// Sink that keeps every notification. Meant for tests and for hosts that
/// render notifications on their own schedule.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                Notification::Success(message) => Some(message.clone()),
                Notification::Error(_) => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                Notification::Error(message) => Some(message.clone()),
                Notification::Success(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.lock().push(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.lock().push(Notification::Error(message.to_string()));
    }
}

/// One toast per failed field, with friendly labels for the fields users
/// actually see in the deal form.
pub(crate) fn validation_messages(issues: &[ValidationIssue]) -> Vec<String> {
    issues
        .iter()
        .map(|issue| match field_label(&issue.field) {
            Some(label) => format!("{}: {}", label, issue.message),
            None => format!("Could not save ({}): {}", issue.field, issue.message),
        })
        .collect()
}

fn field_label(field: &str) -> Option<&'static str> {
    match field {
        "title" => Some("Title"),
        "brand" | "brand.name" => Some("Brand"),
        "brand.contact.email" => Some("Contact email"),
        "value" | "value.amount" => Some("Deal value"),
        "value.currency" => Some("Currency"),
        "stage" => Some("Stage"),
        "platform" => Some("Platform"),
        "deliverables" => Some("Deliverables"),
        "deadline" => Some("Deadline"),
        "campaignStart" | "campaignEnd" => Some("Campaign dates"),
        "paymentDue" => Some("Payment due date"),
        "paymentTerms" => Some("Payment terms"),
        "tags" => Some("Tags"),
        "priority" => Some("Priority"),
        _ => None,
    }
}

/// Single friendly message for a non-validation failure
pub(crate) fn failure_message(error: &StoreError) -> String {
    match error {
        StoreError::Api(ApiError::Network(_)) => {
            "Connection problem. Check your network and try again.".to_string()
        }
        StoreError::Api(ApiError::NotFound(_)) => "This deal no longer exists.".to_string(),
        StoreError::Api(ApiError::Http { .. }) => {
            "The server could not complete the request.".to_string()
        }
        StoreError::Api(ApiError::InvalidResponse(_)) => {
            "The server sent an unexpected response.".to_string()
        }
        StoreError::Api(ApiError::Validation(_)) => "Some fields need attention.".to_string(),
        StoreError::DealNotFound(_) => "This deal is no longer available.".to_string(),
        StoreError::Io(_) | StoreError::Serialization(_) => {
            "Could not save your preferences.".to_string()
        }
    }
}
