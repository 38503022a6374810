//! Turn selected sender groups into bulk archive/trash requests.
//!
//! Only the request bodies are built here. Submitting them to the mail API
//! is the caller's job.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::group::SenderGroup;

/// Maximum number of message ids per batch-modify request.
pub const BATCH_SIZE: usize = 100;

/// Bulk action applied to every message of the selected groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BulkAction {
    /// Remove the `INBOX` label.
    Archive,
    /// Add the `TRASH` label.
    Trash,
}

impl BulkAction {
    /// Lower-case verb for logs and messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Trash => "trash",
        }
    }
}

/// Body of a Gmail `users.messages.batchModify` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchModifyRequest {
    pub ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_label_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_label_ids: Vec<String>,
}

/// Collect the message ids of every group whose address is selected.
///
/// Selection is case-insensitive. Ids keep group order, then scan order.
pub fn selected_message_ids(groups: &[SenderGroup], selected: &[String]) -> Vec<String> {
    let wanted: HashSet<String> = selected.iter().map(|s| s.trim().to_lowercase()).collect();
    groups
        .iter()
        .filter(|g| wanted.contains(&g.address))
        .flat_map(|g| g.message_ids().map(str::to_string))
        .collect()
}

/// Split ids into batch-modify requests of at most [`BATCH_SIZE`] ids.
pub fn plan(action: BulkAction, ids: &[String]) -> Vec<BatchModifyRequest> {
    ids.chunks(BATCH_SIZE)
        .map(|chunk| {
            let (add, remove) = match action {
                BulkAction::Archive => (vec![], vec!["INBOX".to_string()]),
                BulkAction::Trash => (vec!["TRASH".to_string()], vec![]),
            };
            BatchModifyRequest {
                ids: chunk.to_vec(),
                add_label_ids: add,
                remove_label_ids: remove,
            }
        })
        .collect()
}
