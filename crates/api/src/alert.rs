//! Notification headers attached to entity responses.
//!
//! The client UI reads these to show a toast after a write:
//!
//! ```text
//! X-{app}-alert:  A new address is created with identifier 7
//! X-{app}-params: 7
//! X-{app}-error:  error.idexists
//! ```

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Outcome of a write that the client should be told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityEvent {
    Created,
    Updated,
    Deleted,
}

impl EntityEvent {
    fn message(self, entity_name: &str, param: &str) -> String {
        match self {
            Self::Created => format!("A new {entity_name} is created with identifier {param}"),
            Self::Updated => format!("A {entity_name} is updated with identifier {param}"),
            Self::Deleted => format!("A {entity_name} is deleted with identifier {param}"),
        }
    }
}

/// Headers announcing a successful write.
#[must_use]
pub fn entity_alert(app_name: &str, event: EntityEvent, entity_name: &str, param: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(
        &mut headers,
        app_name,
        "alert",
        &event.message(entity_name, param),
    );
    insert(&mut headers, app_name, "params", param);
    headers
}

/// Headers announcing a rejected request.
#[must_use]
pub fn failure_alert(app_name: &str, entity_name: &str, error_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(
        &mut headers,
        app_name,
        "error",
        &format!("error.{error_key}"),
    );
    insert(&mut headers, app_name, "params", entity_name);
    headers
}

/// Insert `X-{app}-{suffix}`, skipping values that are not valid header text.
fn insert(headers: &mut HeaderMap, app_name: &str, suffix: &str, value: &str) {
    let name = format!("x-{}-{suffix}", app_name.to_ascii_lowercase());
    match (
        HeaderName::try_from(name.as_str()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => tracing::warn!(header = %name, "Skipping invalid alert header"),
    }
}
