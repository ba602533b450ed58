use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InboxError, Result};

/// External messaging surface a message travelled over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Telegram,
    Whatsapp,
    Email,
    Instagram,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Telegram,
        Channel::Whatsapp,
        Channel::Email,
        Channel::Instagram,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Telegram => "telegram",
            Channel::Whatsapp => "whatsapp",
            Channel::Email => "email",
            Channel::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = InboxError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| InboxError::UnknownChannel(s.to_string()))
    }
}

/// Lifecycle stage of an outbound message. Declaration order is the rank:
/// `Sending < Sent < Delivered < Read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sending,
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Sending => "sending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = InboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sending" => Ok(DeliveryStatus::Sending),
            "sent" => Ok(DeliveryStatus::Sent),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "read" => Ok(DeliveryStatus::Read),
            _ => Err(InboxError::UnknownStatus(s.to_string())),
        }
    }
}

/// A single entry in the message log.
///
/// Everything except `is_read` and `delivery_status` is fixed at creation,
/// and those two only change through [`MessageStore`](crate::store::MessageStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: Uuid,
    client_id: String,
    text: String,
    timestamp: DateTime<Utc>,
    is_from_coach: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel: Option<Channel>,
    #[serde(default)]
    is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivery_status: Option<DeliveryStatus>,
}

impl Message {
    /// A coach-authored reply. Starts out read and already `Sent`.
    pub fn outbound(
        client_id: impl Into<String>,
        text: impl Into<String>,
        channel: Channel,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        let text = validate_text(text.into())?;
        Ok(Self {
            id: Uuid::new_v4(),
            client_id: client_id.into(),
            text,
            timestamp: at,
            is_from_coach: true,
            channel: Some(channel),
            is_read: true,
            delivery_status: Some(DeliveryStatus::Sent),
        })
    }

    /// A client-authored message as handed over by a gateway. Legacy/system
    /// messages may carry no channel.
    pub fn inbound(
        client_id: impl Into<String>,
        text: impl Into<String>,
        channel: Option<Channel>,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        let text = validate_text(text.into())?;
        Ok(Self {
            id: Uuid::new_v4(),
            client_id: client_id.into(),
            text,
            timestamp: at,
            is_from_coach: false,
            channel,
            is_read: false,
            delivery_status: None,
        })
    }

    /// Replace the channel tag before the message is stored (imports of
    /// legacy coach messages that were never tagged).
    #[must_use]
    pub fn on_channel(mut self, channel: Option<Channel>) -> Self {
        self.channel = channel;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_from_coach(&self) -> bool {
        self.is_from_coach
    }

    pub fn channel(&self) -> Option<Channel> {
        self.channel
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn delivery_status(&self) -> Option<DeliveryStatus> {
        self.delivery_status
    }

    /// Client-authored and not yet seen by the coach.
    pub fn is_unread_from_client(&self) -> bool {
        !self.is_from_coach && !self.is_read
    }

    pub(crate) fn set_read(&mut self) -> bool {
        let changed = !self.is_read;
        self.is_read = true;
        changed
    }

    pub(crate) fn set_delivery_status(&mut self, status: DeliveryStatus) {
        self.delivery_status = Some(status);
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(InboxError::InvalidMessage);
        }
        if !self.is_from_coach && self.delivery_status.is_some() {
            return Err(InboxError::NotOutbound(self.id));
        }
        Ok(())
    }
}

fn validate_text(text: String) -> Result<String> {
    if text.trim().is_empty() {
        return Err(InboxError::InvalidMessage);
    }
    Ok(text)
}
