//! Wire-level frames sent to change-feed clients.
//!
//! Domain reactions are converted into these payloads before being
//! serialised to JSON text frames.

use serde::Serialize;
use serde_json::Value;

use crate::domain::{Alert, ChangeKind, ClientReaction, LedgerTable};

/// Outbound alert shown as a toast by the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFrame {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<Alert> for AlertFrame {
    fn from(value: Alert) -> Self {
        Self {
            message: value.message,
            kind: value.kind.as_str().to_owned(),
        }
    }
}

/// Outbound payload for one committed change the client may see.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFrame {
    /// Collection the client should refetch.
    pub table: LedgerTable,
    pub event_type: ChangeKind,
    pub new_record: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertFrame>,
}

impl From<ClientReaction> for ChangeFrame {
    fn from(value: ClientReaction) -> Self {
        Self {
            table: value.refetch,
            event_type: value.event_type,
            new_record: value.record,
            alert: value.alert.map(AlertFrame::from),
        }
    }
}
