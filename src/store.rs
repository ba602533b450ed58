use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::delivery;
use crate::error::{InboxError, Result};
use crate::message::{Channel, DeliveryStatus, Message};

/// Append-only message log. The only place messages are created or have
/// their read/delivery state changed.
///
/// `version` goes up on every change so derived views can tell when they
/// are stale.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    version: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an existing ordered snapshot, keeping its order.
    /// Coach messages always load as read.
    pub fn from_messages(mut messages: Vec<Message>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(messages.len());
        for msg in &mut messages {
            msg.validate()?;
            if !seen.insert(msg.id()) {
                warn!(id = %msg.id(), "duplicate message id in snapshot");
                return Err(InboxError::DuplicateMessage(msg.id()));
            }
            if msg.is_from_coach() {
                msg.set_read();
            }
        }
        Ok(Self { messages, version: 0 })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    /// Newest timestamp stored for a client, if any.
    pub fn latest_timestamp(&self, client_id: &str) -> Option<DateTime<Utc>> {
        self.messages
            .iter()
            .filter(|m| m.client_id() == client_id)
            .map(|m| m.timestamp())
            .max()
    }

    /// Record a coach reply. It enters the log already `Sent`; the actual
    /// transmission happens elsewhere and is not awaited.
    pub fn send(
        &mut self,
        client_id: &str,
        text: &str,
        channel: Channel,
        at: DateTime<Utc>,
    ) -> Result<&Message> {
        let msg = Message::outbound(client_id, text, channel, at).inspect_err(|_| {
            warn!(client = client_id, "rejected empty reply");
        })?;
        Ok(self.append(msg))
    }

    /// Record a message handed over by a gateway.
    pub fn receive(
        &mut self,
        client_id: &str,
        text: &str,
        channel: Option<Channel>,
        at: DateTime<Utc>,
    ) -> Result<&Message> {
        let msg = Message::inbound(client_id, text, channel, at)?;
        Ok(self.append(msg))
    }

    pub fn append(&mut self, message: Message) -> &Message {
        debug!(
            id = %message.id(),
            client = message.client_id(),
            from_coach = message.is_from_coach(),
            channel = ?message.channel(),
            "append message"
        );
        self.messages.push(message);
        self.version += 1;
        &self.messages[self.messages.len() - 1]
    }

    /// Move an outbound message forward in its delivery lifecycle.
    /// Returns `Ok(false)` when `status` does not rank above the current one.
    pub fn apply_status(&mut self, id: Uuid, status: DeliveryStatus) -> Result<bool> {
        let msg = self
            .messages
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or(InboxError::UnknownMessage(id))?;
        if !msg.is_from_coach() {
            return Err(InboxError::NotOutbound(id));
        }
        match delivery::advance(msg.delivery_status(), status) {
            Some(next) => {
                debug!(%id, from = ?msg.delivery_status(), to = %next, "delivery status");
                msg.set_delivery_status(next);
                self.version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Mark every message from `client_id` as read. Returns how many changed.
    pub fn mark_read(&mut self, client_id: &str) -> usize {
        let changed = self
            .messages
            .iter_mut()
            .filter(|m| m.client_id() == client_id)
            .map(|m| m.set_read())
            .filter(|&changed| changed)
            .count();
        if changed > 0 {
            self.version += 1;
        }
        changed
    }

    /// Load a JSON snapshot (an array of messages in log order).
    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot from {}", path.display()))?;
        let messages: Vec<Message> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot from {}", path.display()))?;
        Self::from_messages(messages)
            .with_context(|| format!("Invalid message in snapshot {}", path.display()))
    }

    pub fn save_json(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(&self.messages)
            .context("Failed to serialize snapshot")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        Ok(())
    }
}
