//! Infers which channel the coach's next reply to a client should use.

use crate::message::{Channel, Message};

pub const DEFAULT_CHANNEL: Channel = Channel::Telegram;

/// Channel for a reply to one client's messages, falling back to
/// [`DEFAULT_CHANNEL`] when nothing in the history is tagged.
pub fn resolve(messages: &[Message]) -> Channel {
    resolve_or(messages, DEFAULT_CHANNEL)
}

/// Two ordered passes over the history, newest first:
/// the client's own most recent channel wins; only if the client never
/// supplied one do we fall back to whatever channel was last used at all.
pub fn resolve_or(messages: &[Message], fallback: Channel) -> Channel {
    let newest_first = newest_first(messages);

    let from_client = newest_first
        .iter()
        .filter(|m| !m.is_from_coach())
        .find_map(|m| m.channel());
    if let Some(channel) = from_client {
        return channel;
    }

    let from_anyone = newest_first.iter().find_map(|m| m.channel());
    if let Some(channel) = from_anyone {
        return channel;
    }

    fallback
}

/// Messages by descending timestamp. Equal timestamps keep the later
/// store position first, since that one was appended most recently.
pub(crate) fn newest_first(messages: &[Message]) -> Vec<&Message> {
    let mut ordered: Vec<(usize, &Message)> = messages.iter().enumerate().collect();
    ordered.sort_by(|(ia, a), (ib, b)| b.timestamp().cmp(&a.timestamp()).then(ib.cmp(ia)));
    ordered.into_iter().map(|(_, m)| m).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn client(ch: Option<Channel>, secs: i64) -> Message {
        Message::inbound("c1", "from client", ch, at(secs)).unwrap()
    }

    fn coach(ch: Option<Channel>, secs: i64) -> Message {
        Message::outbound("c1", "from coach", Channel::Telegram, at(secs))
            .unwrap()
            .on_channel(ch)
    }

    #[test]
    fn empty_history_uses_default() {
        assert_eq!(resolve(&[]), Channel::Telegram);
    }

    #[test]
    fn untagged_history_uses_default() {
        let msgs = vec![client(None, 1), coach(None, 2)];
        assert_eq!(resolve(&msgs), Channel::Telegram);
        assert_eq!(resolve_or(&msgs, Channel::Email), Channel::Email);
    }

    #[test]
    fn client_channel_beats_newer_coach_channel() {
        let msgs = vec![
            client(Some(Channel::Whatsapp), 1),
            coach(Some(Channel::Email), 5),
        ];
        assert_eq!(resolve(&msgs), Channel::Whatsapp);
    }

    #[test]
    fn most_recent_client_channel_wins() {
        let msgs = vec![
            client(Some(Channel::Instagram), 1),
            client(Some(Channel::Whatsapp), 3),
            client(None, 4),
        ];
        assert_eq!(resolve(&msgs), Channel::Whatsapp);
    }

    #[test]
    fn out_of_order_storage_is_sorted_by_timestamp() {
        let msgs = vec![
            client(Some(Channel::Email), 10),
            client(Some(Channel::Instagram), 2),
        ];
        assert_eq!(resolve(&msgs), Channel::Email);
    }

    #[test]
    fn falls_back_to_coach_channel_when_client_never_tagged() {
        let msgs = vec![
            client(None, 1),
            coach(Some(Channel::Instagram), 2),
            coach(Some(Channel::Email), 3),
            coach(None, 4),
        ];
        assert_eq!(resolve(&msgs), Channel::Email);
    }

    #[test]
    fn equal_timestamps_prefer_later_append() {
        let msgs = vec![
            client(Some(Channel::Email), 5),
            client(Some(Channel::Whatsapp), 5),
        ];
        assert_eq!(resolve(&msgs), Channel::Whatsapp);
    }

    fn any_channel() -> impl Strategy<Value = Option<Channel>> {
        prop_oneof![
            Just(None),
            Just(Some(Channel::Telegram)),
            Just(Some(Channel::Whatsapp)),
            Just(Some(Channel::Email)),
            Just(Some(Channel::Instagram)),
        ]
    }

    proptest! {
        #[test]
        fn resolves_to_latest_tagged_client_message(
            entries in prop::collection::vec((any::<bool>(), any_channel(), 0i64..1_000), 1..30)
        ) {
            let msgs: Vec<Message> = entries
                .iter()
                .map(|&(from_coach, ch, secs)| if from_coach { coach(ch, secs) } else { client(ch, secs) })
                .collect();

            let expected = msgs
                .iter()
                .enumerate()
                .filter(|(_, m)| !m.is_from_coach() && m.channel().is_some())
                .max_by_key(|(i, m)| (m.timestamp(), *i))
                .and_then(|(_, m)| m.channel());

            if let Some(expected) = expected {
                prop_assert_eq!(resolve(&msgs), expected);
            }
        }
    }
}
