//! Sender analysis: grouping, ranking, and resolving selections into bulk actions.

pub mod aggregate;
pub mod rank;
pub mod select;

use crate::model::group::SenderGroup;
use crate::model::message::MessageRecord;

/// Group and rank a scan in one step.
///
/// This is what the sender list shows: groups by message count, largest first.
pub fn analyze(records: &[MessageRecord]) -> Vec<SenderGroup> {
    rank::rank(aggregate::aggregate(records).into_values())
}
