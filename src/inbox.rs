use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::conversation::{self, Conversation};
use crate::directory::ClientDirectory;
use crate::error::{InboxError, Result};
use crate::filter::{self, ChannelFilter};
use crate::message::{Channel, DeliveryStatus, Message};
use crate::resolver;
use crate::store::MessageStore;
use crate::templates::{self, Template};
use crate::typing::{Clock, TypingSimulator, TypingState, TypingTimings};

/// The inbox as a UI sees it: the message log, the derived conversation
/// list, which conversation is open, and the per-view state hanging off it
/// (search, channel filter, typing indicator).
pub struct Inbox<C: Clock> {
    store: MessageStore,
    directory: ClientDirectory,
    default_channel: Channel,
    /// Conversation index and the store version it was built from.
    cached: Option<(u64, Vec<Conversation>)>,
    active: Option<String>,
    search: String,
    channel_filter: ChannelFilter,
    typing: TypingSimulator<C>,
}

impl<C: Clock> Inbox<C> {
    pub fn new(store: MessageStore, directory: ClientDirectory, clock: C, timings: TypingTimings) -> Self {
        Self {
            store,
            directory,
            default_channel: resolver::DEFAULT_CHANNEL,
            cached: None,
            active: None,
            search: String::new(),
            channel_filter: ChannelFilter::All,
            typing: TypingSimulator::new(clock, timings),
        }
    }

    /// Channel used for clients whose history has no channel tags.
    pub fn with_default_channel(mut self, channel: Channel) -> Self {
        self.default_channel = channel;
        self.cached = None;
        self
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn directory(&self) -> &ClientDirectory {
        &self.directory
    }

    /// Display name for a client, falling back to the raw id for clients
    /// the directory does not know.
    pub fn display_name<'a>(&'a self, client_id: &'a str) -> &'a str {
        self.directory.display_name(client_id).unwrap_or(client_id)
    }

    /// All conversations, most recent first. Rebuilt only when the log changed.
    pub fn conversations(&mut self) -> &[Conversation] {
        let version = self.store.version();
        let stale = !matches!(&self.cached, Some((v, _)) if *v == version);
        if stale {
            let index = conversation::index_with_default(self.store.messages(), self.default_channel);
            self.cached = Some((version, index));
        }
        match &self.cached {
            Some((_, convs)) => convs.as_slice(),
            None => &[],
        }
    }

    /// Conversations that pass the current search and channel filter.
    pub fn visible_conversations(&mut self) -> Vec<&Conversation> {
        self.conversations();
        let convs = match &self.cached {
            Some((_, convs)) => convs.as_slice(),
            None => &[],
        };
        filter::filter(convs, &self.directory, &self.search, self.channel_filter)
    }

    pub fn conversation(&mut self, client_id: &str) -> Option<&Conversation> {
        self.conversations().iter().find(|c| c.client_id == client_id)
    }

    pub fn active_conversation(&mut self) -> Option<&Conversation> {
        let id = self.active.clone()?;
        self.conversation(&id)
    }

    pub fn active_client(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn channel_filter(&self) -> ChannelFilter {
        self.channel_filter
    }

    pub fn set_channel_filter(&mut self, filter: ChannelFilter) {
        self.channel_filter = filter;
    }

    /// Open the conversation with `client_id`. The conversation being left
    /// is marked read, since the coach has now seen it.
    pub fn open(&mut self, client_id: &str) {
        if self.active.as_deref() == Some(client_id) {
            return;
        }
        if let Some(previous) = self.active.take() {
            self.store.mark_read(&previous);
        }
        info!(client = client_id, "open conversation");
        self.active = Some(client_id.to_string());
        let has_unread = self.active_has_unread();
        self.typing.activate(client_id, has_unread);
    }

    /// Leave the open conversation, if any.
    pub fn close(&mut self) {
        if let Some(previous) = self.active.take() {
            self.store.mark_read(&previous);
        }
        self.typing.cancel();
    }

    /// Open the next visible conversation, wrapping at the end.
    pub fn next_conversation(&mut self) {
        self.step_conversation(1);
    }

    /// Open the previous visible conversation, wrapping at the start.
    pub fn prev_conversation(&mut self) {
        self.step_conversation(-1);
    }

    fn step_conversation(&mut self, delta: isize) {
        let active = self.active.clone();
        let ids: Vec<String> = self
            .visible_conversations()
            .iter()
            .map(|c| c.client_id.clone())
            .collect();
        if ids.is_empty() {
            return;
        }
        let len = ids.len() as isize;
        let idx = active
            .as_ref()
            .and_then(|id| ids.iter().position(|x| x == id))
            .map(|i| (i as isize + delta).rem_euclid(len) as usize)
            .unwrap_or(0);
        self.open(&ids[idx]);
    }

    /// Send a reply in the open conversation. Without an explicit channel
    /// the conversation's resolved active channel is used.
    pub fn send(&mut self, text: &str, channel: Option<Channel>) -> Result<Message> {
        let client_id = self.active.clone().ok_or(InboxError::NoActiveConversation)?;
        let channel = match channel {
            Some(c) => c,
            None => self.reply_channel(&client_id),
        };
        // Keep each client's timeline non-decreasing even if the local clock
        // lags behind a gateway timestamp.
        let now = Utc::now();
        let at = self
            .store
            .latest_timestamp(&client_id)
            .map_or(now, |latest| latest.max(now));
        let msg = self.store.send(&client_id, text, channel, at)?.clone();
        self.after_change();
        Ok(msg)
    }

    /// Channel a reply to `client_id` would go out on right now.
    pub fn reply_channel(&mut self, client_id: &str) -> Channel {
        let fallback = self.default_channel;
        self.conversation(client_id)
            .map_or(fallback, |c| c.active_channel)
    }

    /// Append a message delivered by a gateway.
    pub fn receive(
        &mut self,
        client_id: &str,
        text: &str,
        channel: Option<Channel>,
        at: DateTime<Utc>,
    ) -> Result<Message> {
        let msg = self.store.receive(client_id, text, channel, at)?.clone();
        self.after_change();
        Ok(msg)
    }

    /// Apply a delivery receipt. Stale or repeated receipts are no-ops.
    pub fn apply_receipt(&mut self, id: Uuid, status: DeliveryStatus) -> Result<bool> {
        let changed = self.store.apply_status(id, status)?;
        if changed {
            self.after_change();
        }
        Ok(changed)
    }

    pub fn mark_read(&mut self, client_id: &str) -> usize {
        let changed = self.store.mark_read(client_id);
        if changed > 0 {
            self.after_change();
        }
        changed
    }

    /// Quick-reply suggestion for the open conversation.
    pub fn suggestion(&mut self) -> Option<&'static Template> {
        self.active_conversation().and_then(templates::suggest_for)
    }

    /// Advance the typing indicator. Call from the event loop.
    pub fn tick(&mut self) -> TypingState {
        self.typing.tick()
    }

    pub fn typing_state(&self) -> TypingState {
        self.typing.state()
    }

    pub fn is_typing(&self, client_id: &str) -> bool {
        self.typing.is_showing_for(client_id)
    }

    pub fn total_unread(&mut self) -> usize {
        self.conversations().iter().map(|c| c.unread_count).sum()
    }

    fn active_has_unread(&mut self) -> bool {
        self.active_conversation().is_some_and(Conversation::has_unread)
    }

    fn after_change(&mut self) {
        debug!(version = self.store.version(), "message log changed");
        let has_unread = self.active_has_unread();
        self.typing.messages_changed(has_unread);
    }
}
