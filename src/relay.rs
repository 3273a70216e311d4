//! Command relay between the caller and the extraction worker.
//!
//! Mirrors the two-context extension shape: callers submit a [`Command`]
//! and get a [`Response`] once the worker resolves; the reply channel is
//! held open for the whole run. Commands are processed one at a time, so
//! two extraction runs never overlap. No retries, no cancellation.

use crate::config::Config;
use crate::dom::Dom;
use crate::error::{Error, Result};
use crate::extract::extract_group_members;
use crate::extract::types::ExtractionResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Commands accepted at the relay boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Run an extraction against the current page.
    ExtractGroupMembers,
    /// Passthrough alias forwarded verbatim to the page worker.
    ExtractContacts,
    /// One-way informational notice for the UI layer.
    ShowPopup { message: String },
}

/// Response shape shared by all commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(data: ExtractionResult) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    fn acknowledged() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

type Envelope = (Command, oneshot::Sender<Response>);

/// Handle to the relay task.
pub struct Relay {
    tx: mpsc::Sender<Envelope>,
}

impl Relay {
    /// Spawn the relay over a page. Returns the handle and the stream of
    /// `showPopup` status messages for the UI layer.
    pub fn spawn(dom: Arc<dyn Dom>, config: Config) -> (Self, mpsc::Receiver<String>) {
        let (tx, mut rx) = mpsc::channel::<Envelope>(8);
        let (status_tx, status_rx) = mpsc::channel(8);

        tokio::spawn(async move {
            while let Some((command, reply)) = rx.recv().await {
                debug!(?command, "relay dispatching");
                let response = match command {
                    Command::ExtractGroupMembers | Command::ExtractContacts => {
                        Response::ok(extract_group_members(dom.as_ref(), &config).await)
                    }
                    Command::ShowPopup { message } => {
                        let _ = status_tx.send(message).await;
                        Response::acknowledged()
                    }
                };
                // The caller may have given up; dropping the reply is fine.
                let _ = reply.send(response);
            }
        });

        (Self { tx }, status_rx)
    }

    /// Submit a command and wait for the worker's response.
    pub async fn send(&self, command: Command) -> Result<Response> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((command, reply_tx))
            .await
            .map_err(|_| Error::RelayClosed)?;
        reply_rx.await.map_err(|_| Error::RelayClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fake::FakeDom;

    #[test]
    fn command_wire_format_matches_the_protocol() {
        let json = serde_json::to_value(&Command::ExtractGroupMembers).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "extractGroupMembers" }));

        let parsed: Command =
            serde_json::from_value(serde_json::json!({ "action": "showPopup", "message": "hi" }))
                .unwrap();
        assert_eq!(
            parsed,
            Command::ShowPopup {
                message: "hi".into()
            }
        );
    }

    #[test]
    fn response_omits_absent_fields() {
        let json = serde_json::to_string(&Response::err("boom")).unwrap();
        assert!(json.contains("\"error\":\"boom\""));
        assert!(!json.contains("data"));
    }

    #[tokio::test(start_paused = true)]
    async fn show_popup_is_forwarded_to_the_status_stream() {
        let dom = Arc::new(FakeDom::new("<div></div>"));
        let (relay, mut status) = Relay::spawn(dom, Config::default());

        let response = relay
            .send(Command::ShowPopup {
                message: "Extracted 2 members".into(),
            })
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(status.recv().await.unwrap(), "Extracted 2 members");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_page_degrades_to_error_result() {
        // Empty page: the panel wait times out inside the worker.
        let dom = Arc::new(FakeDom::new("<div></div>"));
        let (relay, _status) = Relay::spawn(dom, Config::default());

        let response = relay.send(Command::ExtractGroupMembers).await.unwrap();
        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data.group_name, "Error");
        assert!(data.members.is_empty());
    }
}
