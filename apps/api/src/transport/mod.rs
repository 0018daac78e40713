//! Request/response channel between the resolution pipeline and the page.
//!
//! Messages mirror the extension wire format:
//! `{"action": "SCAN_PAGE"}` → `{"fields": [...]}` and
//! `{"action": "FILL_FIELD", "id": ..., "value": ...}` → `{"success": bool}`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::DetectedField;
use crate::scanner::document::Document;
use crate::scanner::dom::Dom;
use crate::scanner::retry::{scan_with_retry, RetryPolicy};
use crate::scanner::{Scanner, AUTOFILL_ID_ATTR};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageRequest {
    ScanPage,
    FillField { id: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageResponse {
    Fields { fields: Vec<DetectedField> },
    Fill { success: bool },
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// Nothing on the page answered: the scanner was never loaded into it.
    #[error("The page is not ready for autofill. Please reload the page and try again.")]
    NoReceiver,

    #[error("Unexpected response to {request}")]
    UnexpectedResponse { request: &'static str },
}

#[async_trait]
pub trait PageChannel: Send + Sync {
    async fn send(&self, request: PageRequest) -> Result<PageResponse, TransportError>;
}

/// Asks the page for its fields. An empty list is a valid answer, not an error.
pub async fn request_scan(channel: &dyn PageChannel) -> Result<Vec<DetectedField>, TransportError> {
    match channel.send(PageRequest::ScanPage).await? {
        PageResponse::Fields { fields } => Ok(fields),
        PageResponse::Fill { .. } => Err(TransportError::UnexpectedResponse {
            request: "SCAN_PAGE",
        }),
    }
}

/// Sends one fill command. Best-effort: the caller gets the page's success flag
/// and nothing is retried.
pub async fn request_fill(
    channel: &dyn PageChannel,
    id: &str,
    value: &str,
) -> Result<bool, TransportError> {
    let request = PageRequest::FillField {
        id: id.to_string(),
        value: value.to_string(),
    };
    match channel.send(request).await? {
        PageResponse::Fill { success } => Ok(success),
        PageResponse::Fields { .. } => Err(TransportError::UnexpectedResponse {
            request: "FILL_FIELD",
        }),
    }
}

/// What the page looks like after a batch of commands.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    /// Current value of every tagged control, keyed by autofill id.
    pub control_values: BTreeMap<String, String>,
    /// Autofill id of the control holding focus, if any.
    pub focused: Option<String>,
    pub events_dispatched: usize,
}

struct PageHost {
    document: Document,
    scanner: Scanner,
}

/// In-process channel that plays the page side over an in-memory document.
pub struct LocalChannel {
    host: Option<Mutex<PageHost>>,
    retry: RetryPolicy,
}

impl LocalChannel {
    pub fn new(document: Document, retry: RetryPolicy) -> Self {
        Self {
            host: Some(Mutex::new(PageHost {
                document,
                scanner: Scanner::new(),
            })),
            retry,
        }
    }

    /// A channel to a page that never loaded the scanner.
    #[cfg(test)]
    pub fn disconnected() -> Self {
        Self {
            host: None,
            retry: RetryPolicy::default(),
        }
    }

    pub async fn page_state(&self) -> PageState {
        let Some(host) = &self.host else {
            return PageState::default();
        };
        let guard = host.lock().await;
        let document = &guard.document;
        PageState {
            control_values: document.tagged_values(AUTOFILL_ID_ATTR),
            focused: document
                .focused()
                .and_then(|node| document.attr(node, AUTOFILL_ID_ATTR)),
            events_dispatched: document.events().len(),
        }
    }
}

#[async_trait]
impl PageChannel for LocalChannel {
    async fn send(&self, request: PageRequest) -> Result<PageResponse, TransportError> {
        let host = self.host.as_ref().ok_or(TransportError::NoReceiver)?;

        match request {
            PageRequest::ScanPage => {
                let fields = scan_with_retry(self.retry, move || async move {
                    let mut guard = host.lock().await;
                    let PageHost { document, scanner } = &mut *guard;
                    scanner.scan(document)
                })
                .await;
                info!("Page scan returned {} fields", fields.len());
                Ok(PageResponse::Fields { fields })
            }
            PageRequest::FillField { id, value } => {
                let mut guard = host.lock().await;
                let PageHost { document, scanner } = &mut *guard;
                let success = scanner.fill(document, &id, &value);
                debug!("Fill {id}: success={success}");
                Ok(PageResponse::Fill { success })
            }
        }
    }
}
