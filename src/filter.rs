use std::fmt;
use std::str::FromStr;

use crate::conversation::Conversation;
use crate::directory::ClientDirectory;
use crate::error::{InboxError, Result};
use crate::message::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelFilter {
    #[default]
    All,
    Only(Channel),
}

impl ChannelFilter {
    pub fn matches(self, channel: Channel) -> bool {
        match self {
            ChannelFilter::All => true,
            ChannelFilter::Only(wanted) => wanted == channel,
        }
    }
}

impl fmt::Display for ChannelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelFilter::All => f.write_str("all"),
            ChannelFilter::Only(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for ChannelFilter {
    type Err = InboxError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(ChannelFilter::All)
        } else {
            s.parse().map(ChannelFilter::Only)
        }
    }
}

/// Narrow the inbox list by client name and reply channel, keeping the
/// incoming (recency) order.
///
/// `search` is matched case-insensitively against the display name only,
/// never against message text. Clients missing from the directory have no
/// name, so they only survive an empty search.
pub fn filter<'a>(
    conversations: &'a [Conversation],
    directory: &ClientDirectory,
    search: &str,
    channel: ChannelFilter,
) -> Vec<&'a Conversation> {
    let needle = search.to_lowercase();
    conversations
        .iter()
        .filter(|conv| channel.matches(conv.active_channel))
        .filter(|conv| {
            needle.is_empty()
                || directory
                    .display_name(&conv.client_id)
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .collect()
}
