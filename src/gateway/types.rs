use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::message::{Channel, DeliveryStatus, Message};

/// Events coming back from a channel gateway
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    MessageReceived(InboundMessage),
    ReceiptReceived {
        message_id: Uuid,
        status: DeliveryStatus,
    },
    Error(String),
}

/// A client message picked up from a provider webhook
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub client_id: String,
    pub text: String,
    pub channel: Channel,
    pub timestamp: DateTime<Utc>,
}

/// Commands sent to a gateway
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCommand {
    Transmit {
        message_id: Uuid,
        client_id: String,
        channel: Channel,
        text: String,
    },
}

impl GatewayCommand {
    /// Transmission request for a stored coach reply. Client messages and
    /// untagged messages have nothing to transmit.
    pub fn transmit(message: &Message) -> Option<Self> {
        if !message.is_from_coach() {
            return None;
        }
        Some(GatewayCommand::Transmit {
            message_id: message.id(),
            client_id: message.client_id().to_string(),
            channel: message.channel()?,
            text: message.text().to_string(),
        })
    }
}
