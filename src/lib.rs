//! Inbox engine for a coaching CRM: one message log across Telegram,
//! WhatsApp, email and Instagram, grouped into per-client conversations
//! with reply-channel resolution, delivery receipts, quick-reply
//! suggestions and a simulated typing indicator.
//!
//! [`inbox::Inbox`] is the entry point for a UI. The `app`, `input` and `ui`
//! modules are the terminal client built on top of it.

pub mod app;
pub mod config;
pub mod conversation;
pub mod debug_log;
pub mod delivery;
pub mod demo;
pub mod directory;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod inbox;
pub mod input;
pub mod message;
pub mod resolver;
pub mod store;
pub mod templates;
pub mod typing;
pub mod ui;

pub use conversation::Conversation;
pub use directory::{ClientDirectory, ClientProfile};
pub use error::{InboxError, Result};
pub use filter::ChannelFilter;
pub use inbox::Inbox;
pub use message::{Channel, DeliveryStatus, Message};
pub use store::MessageStore;
pub use typing::{Clock, ManualClock, SystemClock, TypingState, TypingTimings};
