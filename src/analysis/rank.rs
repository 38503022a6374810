//! Display ordering for sender groups.

use std::cmp::Ordering;

use crate::model::group::{GroupedMessage, SenderGroup};

/// Sort groups by message count (largest first), ties by address ascending.
pub fn rank(groups: impl IntoIterator<Item = SenderGroup>) -> Vec<SenderGroup> {
    let mut ranked: Vec<SenderGroup> = groups.into_iter().collect();
    ranked.sort_by(compare);
    ranked
}

/// Total order used by [`rank`].
pub fn compare(a: &SenderGroup, b: &SenderGroup) -> Ordering {
    b.count()
        .cmp(&a.count())
        .then_with(|| a.address.cmp(&b.address))
}

/// A group's messages for the detail view, newest first.
///
/// Messages with equal dates keep their scan order.
pub fn newest_first(group: &SenderGroup) -> Vec<&GroupedMessage> {
    let mut messages: Vec<&GroupedMessage> = group.messages.iter().collect();
    messages.sort_by(|a, b| b.date.cmp(&a.date));
    messages
}
