use std::collections::HashMap;

use crate::message::{Channel, Message};
use crate::resolver;

/// All messages exchanged with one client, summarised for the inbox list.
/// Derived from the message log on demand and never stored on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub client_id: String,
    /// The client's messages in store order.
    pub messages: Vec<Message>,
    pub last_message: Message,
    pub unread_count: usize,
    pub active_channel: Channel,
}

impl Conversation {
    pub fn has_unread(&self) -> bool {
        self.unread_count > 0
    }

    /// Most recent message written by the client, ignoring coach replies.
    pub fn latest_client_message(&self) -> Option<&Message> {
        resolver::newest_first(&self.messages)
            .into_iter()
            .find(|m| !m.is_from_coach())
    }
}

/// Group the log into one conversation per client, most recently active first.
pub fn index(messages: &[Message]) -> Vec<Conversation> {
    index_with_default(messages, resolver::DEFAULT_CHANNEL)
}

/// Like [`index`], with a custom channel for clients whose history carries
/// no channel tags at all.
pub fn index_with_default(messages: &[Message], fallback: Channel) -> Vec<Conversation> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<Message>> = HashMap::new();
    for msg in messages {
        let group = groups.entry(msg.client_id()).or_insert_with(|| {
            order.push(msg.client_id());
            Vec::new()
        });
        group.push(msg.clone());
    }

    let mut conversations: Vec<Conversation> = order
        .into_iter()
        .filter_map(|client_id| {
            let group = groups.remove(client_id)?;
            let last_message = resolver::newest_first(&group).first().copied()?.clone();
            let unread_count = group.iter().filter(|m| m.is_unread_from_client()).count();
            let active_channel = resolver::resolve_or(&group, fallback);
            Some(Conversation {
                client_id: client_id.to_string(),
                messages: group,
                last_message,
                unread_count,
                active_channel,
            })
        })
        .collect();

    // Stable: clients with identical last timestamps keep first-seen order.
    conversations.sort_by(|a, b| b.last_message.timestamp().cmp(&a.last_message.timestamp()));
    conversations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn from_client(client: &str, text: &str, ch: Option<Channel>, secs: i64) -> Message {
        Message::inbound(client, text, ch, at(secs)).unwrap()
    }

    fn from_coach(client: &str, text: &str, ch: Channel, secs: i64) -> Message {
        Message::outbound(client, text, ch, at(secs)).unwrap()
    }

    fn summary(conversations: &[Conversation]) -> String {
        conversations
            .iter()
            .map(|c| {
                format!(
                    "{} last={:?} unread={} via {}",
                    c.client_id,
                    c.last_message.text(),
                    c.unread_count,
                    c.active_channel
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn empty_log_has_no_conversations() {
        assert!(index(&[]).is_empty());
    }

    #[test]
    fn orders_by_most_recent_activity() {
        let msgs = vec![
            from_client("c1", "morning", Some(Channel::Telegram), 1),
            from_client("c2", "hello", Some(Channel::Whatsapp), 2),
            from_client("c1", "done with legs", Some(Channel::Telegram), 5),
            from_coach("c2", "nice work", Channel::Whatsapp, 9),
        ];
        let convs = index(&msgs);
        let ids: Vec<&str> = convs.iter().map(|c| c.client_id.as_str()).collect();
        assert_eq!(ids, ["c2", "c1"]);
    }

    #[test]
    fn last_message_is_latest_timestamp_not_last_appended() {
        let msgs = vec![
            from_client("c1", "newest", Some(Channel::Email), 10),
            from_client("c1", "late import", Some(Channel::Email), 3),
        ];
        let convs = index(&msgs);
        assert_eq!(convs[0].last_message.text(), "newest");
        assert_eq!(convs[0].messages.len(), 2);
        assert_eq!(convs[0].messages[1].text(), "late import");
    }

    #[test]
    fn counts_only_unread_client_messages() {
        let msgs = vec![
            from_client("c1", "one", None, 1),
            from_coach("c1", "reply", Channel::Telegram, 2),
            from_client("c1", "two", None, 3),
        ];
        let convs = index(&msgs);
        assert_eq!(convs[0].unread_count, 2);
        assert!(convs[0].has_unread());
    }

    #[test]
    fn latest_client_message_skips_coach() {
        let msgs = vec![
            from_client("c1", "my shoulder hurts", None, 1),
            from_coach("c1", "new PR incoming!", Channel::Telegram, 2),
        ];
        let convs = index(&msgs);
        assert_eq!(
            convs[0].latest_client_message().map(|m| m.text()),
            Some("my shoulder hurts")
        );
    }

    #[test]
    fn fallback_channel_applies_to_untagged_history() {
        let msgs = vec![from_client("c1", "legacy", None, 1)];
        assert_eq!(index(&msgs)[0].active_channel, Channel::Telegram);
        assert_eq!(
            index_with_default(&msgs, Channel::Email)[0].active_channel,
            Channel::Email
        );
    }

    #[test]
    fn summary_snapshot() {
        let msgs = vec![
            from_client("sarah", "hit a new record today", Some(Channel::Whatsapp), 4),
            from_client("mike", "skipped monday sorry", Some(Channel::Instagram), 1),
            from_coach("mike", "no worries", Channel::Email, 6),
            from_coach("sarah", "amazing", Channel::Whatsapp, 5),
            from_client("lee", "hello?", None, 2),
        ];
        insta::assert_snapshot!(summary(&index(&msgs)), @r#"
        mike last="no worries" unread=1 via instagram
        sarah last="amazing" unread=1 via whatsapp
        lee last="hello?" unread=1 via telegram
        "#);
    }

    fn any_message() -> impl Strategy<Value = Message> {
        (0usize..5, any::<bool>(), 0i64..500).prop_map(|(client, coach, secs)| {
            let id = format!("c{client}");
            if coach {
                from_coach(&id, "reply", Channel::Telegram, secs)
            } else {
                from_client(&id, "question", None, secs)
            }
        })
    }

    proptest! {
        #[test]
        fn one_conversation_per_client_in_recency_order(msgs in prop::collection::vec(any_message(), 0..40)) {
            let convs = index(&msgs);

            let distinct: HashSet<&str> = msgs.iter().map(|m| m.client_id()).collect();
            prop_assert_eq!(convs.len(), distinct.len());

            for pair in convs.windows(2) {
                prop_assert!(pair[0].last_message.timestamp() >= pair[1].last_message.timestamp());
            }

            for conv in &convs {
                let expected = msgs
                    .iter()
                    .filter(|m| m.client_id() == conv.client_id && !m.is_from_coach() && !m.is_read())
                    .count();
                prop_assert_eq!(conv.unread_count, expected);
                prop_assert_eq!(conv.unread_count == 0, !conv.messages.iter().any(|m| m.is_unread_from_client()));
                let max_ts = conv.messages.iter().map(|m| m.timestamp()).max();
                prop_assert_eq!(Some(conv.last_message.timestamp()), max_ts);
            }
        }
    }
}
