use uuid::Uuid;

/// Errors surfaced by the inbox engine. All of them are local and
/// recoverable; nothing here is fatal.
#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    /// Empty or whitespace-only text. No message was created.
    #[error("message text must not be empty")]
    InvalidMessage,

    #[error("no message with id {0}")]
    UnknownMessage(Uuid),

    #[error("message id {0} appears more than once")]
    DuplicateMessage(Uuid),

    /// Delivery statuses only apply to coach-authored messages.
    #[error("message {0} was written by the client and has no delivery status")]
    NotOutbound(Uuid),

    #[error("no conversation is open")]
    NoActiveConversation,

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("unknown delivery status: {0}")]
    UnknownStatus(String),
}

pub type Result<T> = std::result::Result<T, InboxError>;
