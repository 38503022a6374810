//! Fold a flat scan into per-sender groups.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::model::address::SenderKey;
use crate::model::group::{GroupedMessage, SenderGroup};
use crate::model::message::MessageRecord;

/// Group records by normalized sender address.
///
/// Each record is visited once, in the given order. Senders that cannot be
/// parsed share the [`UNKNOWN_SENDER`](crate::model::address::UNKNOWN_SENDER)
/// group, so every input record is counted exactly once.
///
/// Count, date range, attachment sum and unsubscribe flag do not depend on
/// input order. The representative display name is the first non-empty one
/// in input order, and `newest_subject` keeps the earliest record among
/// those sharing the newest date.
pub fn aggregate(records: &[MessageRecord]) -> BTreeMap<String, SenderGroup> {
    let mut groups: BTreeMap<String, SenderGroup> = BTreeMap::new();

    for record in records {
        let sender = record.sender();
        if let SenderKey::Fallback { raw } = &sender {
            warn!(
                id = %record.id,
                from = %raw,
                "Could not parse sender; using unknown-sender group"
            );
        }

        let message = GroupedMessage {
            id: record.id.clone(),
            subject: record.subject.clone(),
            date: record.date,
        };

        match groups.get_mut(sender.key()) {
            Some(group) => absorb(group, record, sender.display_name(), message),
            None => {
                groups.insert(
                    sender.key().to_string(),
                    SenderGroup {
                        address: sender.key().to_string(),
                        display_name: sender.display_name().to_string(),
                        oldest: record.date,
                        newest: record.date,
                        newest_subject: record.subject.clone(),
                        total_attachments: u64::from(record.attachment_count),
                        has_unsubscribe: record.has_unsubscribe,
                        messages: vec![message],
                    },
                );
            }
        }
    }

    debug!(
        records = records.len(),
        senders = groups.len(),
        "Grouped messages by sender"
    );
    groups
}

/// Fold one more record into an existing group.
fn absorb(
    group: &mut SenderGroup,
    record: &MessageRecord,
    display_name: &str,
    message: GroupedMessage,
) {
    if group.display_name.is_empty() && !display_name.is_empty() {
        group.display_name = display_name.to_string();
    }
    if record.date < group.oldest {
        group.oldest = record.date;
    }
    if record.date > group.newest {
        group.newest = record.date;
        group.newest_subject = record.subject.clone();
    }
    group.total_attachments += u64::from(record.attachment_count);
    group.has_unsubscribe |= record.has_unsubscribe;
    group.messages.push(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::address::UNKNOWN_SENDER;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 9, 30, 0).unwrap()
    }

    fn record(id: &str, from: &str, d: u32, attachments: u32, unsub: bool) -> MessageRecord {
        MessageRecord {
            id: id.to_string(),
            from: from.to_string(),
            date: day(d),
            attachment_count: attachments,
            has_unsubscribe: unsub,
            subject: format!("subject {id}"),
        }
    }

    #[test]
    fn test_groups_case_insensitively() {
        let records = vec![
            record("1", "News <News@Shop.com>", 2, 0, false),
            record("2", "news@shop.com", 1, 1, true),
            record("3", "other@x.com", 3, 0, false),
        ];
        let groups = aggregate(&records);
        assert_eq!(groups.len(), 2);

        let shop = &groups["news@shop.com"];
        assert_eq!(shop.count(), 2);
        assert_eq!(shop.display_name, "News");
        assert_eq!(shop.oldest, day(1));
        assert_eq!(shop.newest, day(2));
        assert_eq!(shop.newest_subject, "subject 1");
        assert_eq!(shop.total_attachments, 1);
        assert!(shop.has_unsubscribe);
        assert_eq!(shop.message_ids().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_first_non_empty_name_wins() {
        let records = vec![
            record("1", "a@x.com", 1, 0, false),
            record("2", "Alpha <a@x.com>", 1, 0, false),
            record("3", "Another Alpha <a@x.com>", 1, 0, false),
        ];
        let groups = aggregate(&records);
        assert_eq!(groups["a@x.com"].display_name, "Alpha");
        assert_eq!(groups["a@x.com"].label(), "Alpha");
    }

    #[test]
    fn test_label_falls_back_to_address() {
        let groups = aggregate(&[record("1", "a@x.com", 1, 0, false)]);
        assert_eq!(groups["a@x.com"].label(), "a@x.com");
    }

    #[test]
    fn test_malformed_senders_share_one_group() {
        let records = vec![
            record("1", "Mailer Daemon", 1, 0, false),
            record("2", "", 2, 0, false),
            record("3", "a@x.com", 3, 0, false),
        ];
        let groups = aggregate(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[UNKNOWN_SENDER].count(), 2);
        let total: usize = groups.values().map(SenderGroup::count).sum();
        assert_eq!(total, records.len());
    }

    #[test]
    fn test_statistics_do_not_depend_on_order() {
        let mut records = vec![
            record("1", "a@x.com", 5, 2, false),
            record("2", "a@x.com", 1, 0, true),
            record("3", "a@x.com", 3, 1, false),
            record("4", "b@y.com", 4, 0, false),
        ];
        let forward = aggregate(&records);
        records.reverse();
        let backward = aggregate(&records);

        for (key, g) in &forward {
            let h = &backward[key];
            assert_eq!(g.count(), h.count());
            assert_eq!((g.oldest, g.newest), (h.oldest, h.newest));
            assert_eq!(g.total_attachments, h.total_attachments);
            assert_eq!(g.has_unsubscribe, h.has_unsubscribe);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
    }
}
